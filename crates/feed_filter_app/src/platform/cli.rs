use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use super::logging::LogDestination;

#[derive(Debug, Parser)]
#[command(name = "feedfilter", about = "Hide feed items whose titles match your keywords")]
pub struct Cli {
    /// Keyword store file.
    #[arg(long, global = true, default_value = ".feedfilter_settings.ron")]
    pub settings: PathBuf,

    /// Where log output goes.
    #[arg(long, global = true, value_enum, default_value_t = LogArg::Terminal)]
    pub log: LogArg,

    /// Saved feed pages to treat as open views; they are refreshed after a settings change.
    #[arg(long = "view", global = true)]
    pub views: Vec<PathBuf>,

    /// Item selector overrides (RON).
    #[arg(long, global = true)]
    pub selectors: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show keywords and whether filtering is on.
    List,
    /// Add a keyword.
    Add { keyword: String },
    /// Remove a keyword.
    Remove { keyword: String },
    /// Remove every keyword.
    Reset,
    /// Turn filtering on or off.
    Toggle,
    /// Write the keyword list as JSON.
    Export {
        /// Output file; stdout when omitted.
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Filter a saved feed page, optionally replaying inserted fragments.
    Filter {
        page: PathBuf,
        /// Fragment files appended one batch each, in order.
        #[arg(long = "insert")]
        inserts: Vec<PathBuf>,
        /// Element the fragments are appended to.
        #[arg(long, default_value = "#contents")]
        into: String,
        /// Write the filtered page here.
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogArg {
    Terminal,
    File,
    Both,
}

impl From<LogArg> for LogDestination {
    fn from(arg: LogArg) -> Self {
        match arg {
            LogArg::Terminal => LogDestination::Terminal,
            LogArg::File => LogDestination::File,
            LogArg::Both => LogDestination::Both,
        }
    }
}
