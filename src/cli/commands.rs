use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "gift-registry")]
#[command(about = "Gift registry server: guests claim items, the host gets notified")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to an extra configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP server
    Serve {
        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,

        /// Directory with the guest form (overrides config)
        #[arg(long)]
        public_dir: Option<PathBuf>,

        /// Skip the notification channel check at startup
        #[arg(long)]
        skip_verify: bool,
    },

    /// Show current claims
    List {
        /// Output format: table or json
        #[arg(short, long, default_value = "table")]
        format: String,

        /// Hide items nobody has claimed yet
        #[arg(long)]
        claimed_only: bool,
    },

    /// Claim an item on behalf of a guest
    Claim {
        /// Registry item
        item: String,

        /// Guest name
        name: String,

        /// Notify the host as a web claim would
        #[arg(long)]
        notify: bool,
    },

    /// Add items to the registry so guests see them as available
    AddItem {
        /// Registry items
        #[arg(required = true)]
        items: Vec<String>,
    },

    /// Create the claim store and show the configuration
    Init,

    /// Seed the configured store from a legacy names.json file
    Import {
        /// JSON document of item -> [name]
        path: PathBuf,
    },
}
