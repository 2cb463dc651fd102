use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod core;
mod parsing;

fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();

    // Initialize logging based on verbosity flag
    let filter = if cli.verbose {
        EnvFilter::new("demux_stats=debug,info")
    } else {
        EnvFilter::new("demux_stats=warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();

    match cli.command {
        cli::Commands::Conversion(args) => {
            cli::conversion::run(args, cli.format, cli.verbose)?;
        }
        cli::Commands::Metrics(args) => {
            cli::metrics::run(args, cli.format, cli.verbose)?;
        }
    }

    Ok(())
}
