use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "pagepatch")]
#[command(about = "Inspect and replay stored webpage edits", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Data directory (defaults to PAGEPATCH_HOME, then the platform data dir)
    #[arg(long, global = true, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List stored edits
    #[command(alias = "ls")]
    List {
        /// Only show edits for this page address
        #[arg(short, long)]
        page: Option<String>,
    },

    /// Remove every stored edit for every page
    Clear,

    /// Show or change preferences (text-editing, image-editing, show-edits)
    Prefs {
        /// Preference key
        key: Option<String>,

        /// New value (on/off)
        value: Option<String>,
    },

    /// Apply stored edits to a JSON page snapshot
    Replay {
        /// Snapshot file
        snapshot: PathBuf,

        /// Page address the edits were stored under
        #[arg(short, long)]
        page: String,

        /// Write the patched snapshot here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Resolve a locator path against a JSON page snapshot
    Locate {
        /// Snapshot file
        snapshot: PathBuf,

        /// Locator path, e.g. body/div[2]/p[1] or id("hero")/h1[1]
        path: String,
    },
}
