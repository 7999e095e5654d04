//! Custom recipes from a recipe string or an order file.

use std::path::Path;

use clap::Args;

use crate::error::Result;
use crate::menu::{parse_recipe, Order};
use crate::output::{display_path, Printer};

use super::cook::{self, CookArgs, Plan};

/// Cook with a recipe string or order file
#[derive(Args, Debug)]
pub struct CustomArgs {
    #[command(flatten)]
    pub cook: CookArgs,

    /// Steps like "sort --turns 1; quantize -n 8", or a path to an order .yaml
    pub recipe: String,
}

pub fn run(args: CustomArgs, printer: &Printer) -> Result<()> {
    let plan = Plan::from(&args.cook);
    let order_path = Path::new(&args.recipe);

    let (recipe, plan) = if Order::is_order_path(order_path) {
        let order = Order::load(order_path)?;
        printer.info("Order", &display_path(order_path));
        (order.recipe()?, plan.with_order(&order))
    } else {
        (parse_recipe(&args.recipe)?, plan)
    };

    cook::run(&args.cook.path, recipe, &plan, printer)?;
    Ok(())
}
