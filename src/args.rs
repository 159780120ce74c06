use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "histats",
    about = "Categorize recent browsing history and show visits per category, day and hour",
    version,
    long_about = None
)]
pub struct Args {
    /// Browser whose history database to read
    #[arg(short, long, default_value = "Vivaldi")]
    pub browser: String,

    /// Explicit path to a History database (overrides --browser)
    #[arg(long)]
    pub history_file: Option<PathBuf>,

    /// JSON export of history items to analyze instead of a database
    #[arg(short, long, conflicts_with = "history_file")]
    pub input: Option<PathBuf>,

    /// Number of days of history to include
    #[arg(short, long, default_value_t = 7)]
    pub days: u32,

    /// Maximum number of history entries to analyze
    #[arg(short, long, default_value_t = 10_000)]
    pub max_results: usize,

    /// Only include entries whose url or title contains this text
    #[arg(long, default_value = "")]
    pub text: String,

    /// Custom temporary file path for database copy
    #[arg(long)]
    pub temp_path: Option<PathBuf>,

    /// Bucket dates and hours in UTC instead of local time
    #[arg(long)]
    pub utc: bool,

    /// List every entry with its category instead of the overview
    #[arg(long)]
    pub details: bool,

    /// Redact URLs in the details listing
    #[arg(long)]
    pub redact: bool,

    /// Print the analysis as JSON
    #[arg(long)]
    pub json: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}
