use anyhow::Result;
use clap::Parser;
use tracing::error;

use histats::browser::{print_analysis_results, print_details, report_json};
use histats::utils::{setup_logging, validate_args};
use histats::{analyze_browser_history, Args};

fn main() -> Result<()> {
    let args = Args::parse();
    setup_logging(args.verbose);

    validate_args(&args)?;

    match analyze_browser_history(&args) {
        Ok(report) => {
            if args.json {
                println!("{}", report_json(&report, &args)?);
            } else if args.details {
                print_details(&report, &args);
            } else {
                print_analysis_results(&report, &args);
            }
            Ok(())
        }
        Err(e) => {
            error!(action = "error", component = "main", error = ?e, "Analysis failed");
            std::process::exit(1);
        }
    }
}
