//! CLI argument parsing

use clap::{Parser, ValueEnum};
use ringdump_capture::Direction;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "ringdump")]
#[command(version, about = "Capture packets from a network interface into a pcap file", long_about = None)]
pub struct Cli {
    /// Network interface to capture from
    #[arg(short = 'i', long)]
    pub interface: Option<String>,

    /// pcap dump file path
    #[arg(short = 'w', long = "write", value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// BPF filter expression
    #[arg(short = 'f', long)]
    pub filter: Option<String>,

    /// Traffic direction to observe
    #[arg(short = 'e', long, value_enum, default_value = "rx-tx")]
    pub direction: DirectionArg,

    /// Packet capture length (snaplen)
    #[arg(short = 's', long, default_value_t = 128)]
    pub snaplen: i32,

    /// Active packet wait: busy-poll instead of blocking on the receive
    #[arg(short = 'a', long = "active-wait")]
    pub active_wait: bool,

    /// Periodic stats line interval in seconds
    #[arg(short = 't', long = "stats-interval", value_name = "SECONDS", default_value_t = 1)]
    pub stats_interval: u64,

    /// Maximum capture duration in seconds, anchored to the first packet
    /// (0 = unlimited)
    #[arg(short = 'c', long = "duration", value_name = "SECONDS", default_value_t = 0)]
    pub duration: i64,

    /// List capture-capable interfaces and exit
    #[arg(short = 'l', long)]
    pub list_interfaces: bool,

    /// Verbose output (-v, -vv for increasing verbosity)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// CLI spelling of the capture direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DirectionArg {
    /// Received and transmitted traffic
    RxTx,
    /// Received traffic only
    Rx,
    /// Transmitted traffic only
    Tx,
}

impl From<DirectionArg> for Direction {
    fn from(arg: DirectionArg) -> Self {
        match arg {
            DirectionArg::RxTx => Direction::RxAndTx,
            DirectionArg::Rx => Direction::RxOnly,
            DirectionArg::Tx => Direction::TxOnly,
        }
    }
}
