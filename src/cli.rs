//! CLI argument parsing

use crate::buses;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use wk2132_core::{ChannelId, UartMode};

/// Crystal fitted on most WK2132 breakout boards
pub const DEFAULT_FREQUENCY_HZ: u32 = 11_059_200;

/// Parse a string as a hex or decimal u32
fn parse_hex_u32(s: &str) -> Result<u32, String> {
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u32::from_str_radix(hex, 16).map_err(|e| format!("Invalid hex value: {}", e))
    } else {
        s.parse::<u32>().map_err(|e| format!("Invalid number: {}", e))
    }
}

/// Parse a channel index (0 or 1)
fn parse_channel(s: &str) -> Result<ChannelId, String> {
    let index: u8 = s
        .parse()
        .map_err(|e| format!("Invalid channel: {}", e))?;
    ChannelId::from_index(index).ok_or_else(|| format!("Channel {} does not exist (0 or 1)", index))
}

/// Parse a mode such as `8N1`
fn parse_mode(s: &str) -> Result<UartMode, String> {
    s.parse::<UartMode>()
        .map_err(|_| format!("Invalid mode '{}' (expected e.g. 8N1)", s))
}

/// Generate dynamic help text for the bus argument
fn bus_help() -> String {
    format!("Bus to use [available: {}]", buses::bus_names_short())
}

#[derive(Parser)]
#[command(name = "wk2132")]
#[command(author, version, about = "WK2132 dual UART bridge tool", long_about = None)]
pub struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

/// Options describing how the bridge is wired
#[derive(clap::Args, Debug, Clone)]
pub struct BridgeArgs {
    /// Bus to use
    #[arg(short, long, help = bus_help())]
    pub bus: String,

    /// Crystal frequency in Hz (hex or decimal)
    #[arg(long, value_parser = parse_hex_u32, default_value_t = DEFAULT_FREQUENCY_HZ)]
    pub frequency: u32,

    /// IA0 strap pin is tied high
    #[arg(long)]
    pub ia0: bool,

    /// IA1 strap pin is tied high
    #[arg(long)]
    pub ia1: bool,

    /// Sub-UART (0 or 1)
    #[arg(short, long, value_parser = parse_channel, default_value = "0")]
    pub channel: ChannelId,
}

/// Line settings for commands that start the channel
#[derive(clap::Args, Debug, Clone)]
pub struct LineArgs {
    /// Baud rate
    #[arg(long, default_value_t = 115_200)]
    pub baud: u32,

    /// Character format (only 8N1 is supported by the driver)
    #[arg(long, value_parser = parse_mode, default_value = "8N1")]
    pub mode: UartMode,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List available bus backends
    ListBuses,

    /// Compute the baud divisor registers without touching hardware
    Baud {
        /// Crystal frequency in Hz (hex or decimal)
        #[arg(long, value_parser = parse_hex_u32, default_value_t = DEFAULT_FREQUENCY_HZ)]
        frequency: u32,

        /// Requested baud rate
        #[arg(long)]
        baud: u32,
    },

    /// Dump global and channel registers
    Status {
        #[command(flatten)]
        bridge: BridgeArgs,
    },

    /// Start a channel and transmit data
    Send {
        #[command(flatten)]
        bridge: BridgeArgs,

        #[command(flatten)]
        line: LineArgs,

        /// Literal data to send
        #[arg(short, long, conflicts_with = "input", required_unless_present = "input")]
        data: Option<String>,

        /// File whose contents are sent
        #[arg(short, long)]
        input: Option<PathBuf>,
    },

    /// Start a channel and read received data
    Recv {
        #[command(flatten)]
        bridge: BridgeArgs,

        #[command(flatten)]
        line: LineArgs,

        /// Wait for exactly this many bytes instead of draining the FIFO
        #[arg(short = 'n', long)]
        count: Option<usize>,

        /// Give up waiting for --count bytes after this many milliseconds
        #[arg(long, default_value_t = 5000)]
        timeout: u64,

        /// Read from a channel that is already running instead of
        /// restarting it (a restart empties the receive FIFO)
        #[arg(long)]
        no_begin: bool,

        /// Write received bytes to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Disable a channel
    End {
        #[command(flatten)]
        bridge: BridgeArgs,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_hex_u32() {
        assert_eq!(parse_hex_u32("0xA8C000"), Ok(11_059_200));
        assert_eq!(parse_hex_u32("14745600"), Ok(14_745_600));
        assert!(parse_hex_u32("0xZZ").is_err());
    }

    #[test]
    fn test_send_arguments() {
        let cli = Cli::try_parse_from([
            "wk2132", "send", "-b", "dummy", "--channel", "1", "--baud", "9600", "--data", "hi",
        ])
        .unwrap();
        match cli.command {
            Commands::Send {
                bridge, line, data, ..
            } => {
                assert_eq!(bridge.channel, ChannelId::Uart1);
                assert_eq!(bridge.frequency, DEFAULT_FREQUENCY_HZ);
                assert_eq!(line.baud, 9600);
                assert_eq!(line.mode, UartMode::MODE_8N1);
                assert_eq!(data.as_deref(), Some("hi"));
            }
            _ => panic!("expected send"),
        }
    }

    #[test]
    fn test_recv_no_begin() {
        let cli = Cli::try_parse_from(["wk2132", "recv", "-b", "dummy", "--no-begin"]).unwrap();
        match cli.command {
            Commands::Recv {
                no_begin, count, ..
            } => {
                assert!(no_begin);
                assert_eq!(count, None);
            }
            _ => panic!("expected recv"),
        }
    }

    #[test]
    fn test_rejects_missing_channel() {
        assert!(Cli::try_parse_from(["wk2132", "end", "-b", "dummy", "--channel", "2"]).is_err());
        assert!(Cli::try_parse_from(["wk2132", "send", "-b", "dummy"]).is_err());
    }
}
