use clap::Parser;
use miette::Result;
use pierogis::cli::Cli;
use tracing_subscriber::EnvFilter;

/// Environment variable holding a tracing filter, e.g. `pierogis=debug`.
const LOG_ENV: &str = "PIEROGIS_LOG";

fn init_tracing(verbose: u8) {
    let fallback = match verbose {
        0 => "warn",
        1 => "pierogis=debug",
        _ => "pierogis=trace",
    };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(fallback));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    pierogis::cli::run(cli)?;

    Ok(())
}
