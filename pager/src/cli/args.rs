//! CLI argument definitions.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Pager - append inbound text messages to per-sender session documents
#[derive(Parser, Debug)]
#[command(name = "pager")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file (defaults to ~/.pager/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the webhook server
    Serve {
        /// Address to listen on (overrides config)
        #[arg(short, long)]
        bind: Option<SocketAddr>,
    },

    /// Create an empty session and print its identifier
    Provision {
        /// Number of sessions to create
        #[arg(short = 'n', long, default_value = "1")]
        count: usize,
    },

    /// Print a session document as JSON
    Show {
        /// Six-character session identifier
        id: String,
    },

    /// Send a message to a running server, as the SMS provider would
    Send {
        /// Sender identifier (e.g. a phone number)
        #[arg(short, long)]
        from: String,

        /// Server base URL (defaults to the configured bind address)
        #[arg(long)]
        url: Option<String>,

        /// Message body
        #[arg(trailing_var_arg = true, required = true)]
        body: Vec<String>,
    },
}
