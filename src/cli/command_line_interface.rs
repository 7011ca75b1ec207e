// Command line interface definition.
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "p2p-node")]
#[command(about = "A peer-to-peer messaging and file-transfer node")]
#[command(version)]
pub struct CommandLineInterface {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose (info-level) logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Enable debug logging (implies verbose)
    #[arg(short, long, global = true)]
    pub debug: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start a node: listen for peers and print events until Ctrl-C
    Start {
        /// Port to bind the TCP listener and UDP socket on
        #[arg(short, long)]
        port: Option<u16>,

        /// Deliver UDP broadcasts that originated from this node's own IP
        #[arg(long)]
        forward_all: bool,
    },
    /// Send one or more files to a peer
    Send {
        /// Target peer IPv4 address
        #[arg(short, long)]
        target: String,

        /// Port to bind this node's own socket on
        #[arg(short, long)]
        port: Option<u16>,

        /// Bytes per FilePartObj
        #[arg(short, long, default_value = "102400")]
        buffer_size: u32,

        /// Files to send
        files: Vec<PathBuf>,
    },
    /// Start transport only, broadcast once, and print discovered peers for a fixed window
    Peers {
        /// Port to bind the discovery socket on
        #[arg(short, long)]
        port: Option<u16>,

        /// How long to listen for replies, in seconds
        #[arg(short, long, default_value = "5")]
        window_secs: u64,
    },
}
