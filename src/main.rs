use anyhow::Result;
use clap::Parser;
use tracing::error;

use tnfstats::dashboard::{is_missing_input, NO_LOG_MESSAGE};
use tnfstats::utils::{setup_logging, validate_args};
use tnfstats::{generate_dashboard, print_summary, Args};

fn main() -> Result<()> {
    let args = Args::parse();
    setup_logging(args.verbose);
    validate_args(&args)?;

    match generate_dashboard(&args) {
        Ok(summary) => {
            print_summary(&summary);
            Ok(())
        }
        Err(e) if is_missing_input(&e) => {
            println!("{}", NO_LOG_MESSAGE);
            Ok(())
        }
        Err(e) => {
            error!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}
