use std::path::PathBuf;

use clap::{Parser, Subcommand};

use alert_triage::constants::{DEFAULT_HOST, DEFAULT_PORT};

#[derive(Parser)]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// JSON config file; environment variables override it
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Artifact directory, overrides config and TRIAGE_MODEL_DIR
    #[arg(long, global = true)]
    pub model_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Auto-label a batch of alerts, train, and save artifacts
    Train {
        /// Alerts as CSV (by extension), JSON, JSON Lines or a search response
        #[arg(short, long)]
        input: PathBuf,

        /// Use the `is_threat` column as-is instead of auto-labeling
        #[arg(long)]
        labeled: bool,
    },

    /// Score a batch of alerts with the saved model
    Score {
        #[arg(short, long)]
        input: PathBuf,

        /// Write per-row verdicts as JSON here instead of only logging a summary
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Serve the analyze API
    Serve {
        #[arg(long, default_value = DEFAULT_HOST)]
        host: String,

        #[arg(short, long, default_value_t = DEFAULT_PORT)]
        port: u16,
    },
}
