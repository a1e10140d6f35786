use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "eth-block-window", version, about = "Rolling block window and gas statistics")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Follow the chain head and log every published snapshot
    Watch,
    /// Follow the chain head and serve snapshots over HTTP
    Serve {
        /// Override bind address, e.g. 0.0.0.0:8080
        #[arg(long)]
        addr: Option<String>,
    },
    /// Build a single window and print it as JSON
    Window {
        /// Upper bound of the window (defaults to the current head)
        #[arg(long)]
        latest: Option<u64>,
    },
}
