pub mod completions;
pub mod cook;
pub mod custom;

use clap::{ArgAction, Parser, Subcommand};

use crate::error::Result;
use crate::ingredients::{Effect, Ingredient};
use crate::kitchen::Recipe;
use crate::menu::{FlipArgs, QuantizeArgs, RectangleArgs, ResizeArgs, RotateArgs, SortArgs, ThresholdArgs};
use crate::output::Printer;

use cook::{CookArgs, Plan};

/// pierogis - image and animation effects pipeline
#[derive(Parser, Debug)]
#[command(name = "pierogis")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Suppress status output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Log more (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sort runs of pixels by intensity
    Sort {
        #[command(flatten)]
        cook: CookArgs,
        #[command(flatten)]
        args: SortArgs,
    },

    /// Reduce to a small palette with spatial dithering
    Quantize {
        #[command(flatten)]
        cook: CookArgs,
        #[command(flatten)]
        args: QuantizeArgs,
    },

    /// Black and white luma mask
    Threshold {
        #[command(flatten)]
        cook: CookArgs,
        #[command(flatten)]
        args: ThresholdArgs,
    },

    /// Change dimensions
    Resize {
        #[command(flatten)]
        cook: CookArgs,
        #[command(flatten)]
        args: ResizeArgs,
    },

    /// Rotate by quarter turns
    Rotate {
        #[command(flatten)]
        cook: CookArgs,
        #[command(flatten)]
        args: RotateArgs,
    },

    /// Cut out a rectangle
    Crop {
        #[command(flatten)]
        cook: CookArgs,
        #[command(flatten)]
        args: RectangleArgs,
    },

    /// Mirror about an axis
    Flip {
        #[command(flatten)]
        cook: CookArgs,
        #[command(flatten)]
        args: FlipArgs,
    },

    /// 2x pixel-art upscale
    Mmpx {
        #[command(flatten)]
        cook: CookArgs,
    },

    /// Re-encode frames without changing them
    Plate {
        #[command(flatten)]
        cook: CookArgs,
    },

    /// Cook with a recipe string or order file
    Custom(custom::CustomArgs),

    /// Generate shell completions
    Completions(completions::CompletionsArgs),
}

fn cook_one(cook: &CookArgs, ingredient: Ingredient, printer: &Printer) -> Result<()> {
    cook::run(&cook.path, Recipe::new(vec![ingredient]), &Plan::from(cook), printer)?;
    Ok(())
}

/// Dispatch a parsed command line.
pub fn run(cli: Cli) -> Result<()> {
    let printer = Printer::new(cli.quiet);

    match cli.command {
        Commands::Sort { cook, args } => cook_one(&cook, args.prep()?, &printer),
        Commands::Quantize { cook, args } => cook_one(&cook, args.prep()?, &printer),
        Commands::Threshold { cook, args } => cook_one(&cook, Ingredient::new(args.seasoning()?), &printer),
        Commands::Resize { cook, args } => cook_one(&cook, args.prep()?, &printer),
        Commands::Rotate { cook, args } => cook_one(&cook, args.prep()?, &printer),
        Commands::Crop { cook, args } => cook_one(&cook, args.prep_crop()?, &printer),
        Commands::Flip { cook, args } => cook_one(&cook, args.prep()?, &printer),
        Commands::Mmpx { cook } => cook_one(&cook, Ingredient::new(Effect::Mmpx), &printer),
        Commands::Plate { cook } => {
            cook::run(&cook.path, Recipe::default(), &Plan::from(&cook), &printer)?;
            Ok(())
        }
        Commands::Custom(args) => custom::run(args, &printer),
        Commands::Completions(args) => completions::run(args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_sort_command() {
        let cli = Cli::try_parse_from(["pierogis", "sort", "in.png", "-t", "1", "--lower", "20", "-q"]).unwrap();
        assert!(cli.quiet);
        match cli.command {
            Commands::Sort { cook, args } => {
                assert_eq!(cook.path.to_str(), Some("in.png"));
                assert_eq!(args.turns, 1);
                assert_eq!(args.threshold.lower, Some(20));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_custom_command() {
        let cli = Cli::try_parse_from(["pierogis", "custom", "in.gif", "sort; mmpx", "--fps", "12", "--parallel"]).unwrap();
        match cli.command {
            Commands::Custom(args) => {
                assert_eq!(args.recipe, "sort; mmpx");
                assert_eq!(args.cook.fps, Some(12.0));
                assert!(args.cook.parallel);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
