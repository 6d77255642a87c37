//! wk2132 - command line tool for the WK2132 dual UART bridge
//!
//! The WK2132 hangs two UARTs off a single I2C bus. This tool opens a bus
//! backend (a Linux i2c-dev adapter or the in-memory emulator), configures
//! the bridge and then drives one of its channels.

mod buses;
mod cli;
mod commands;

use std::time::Duration;

use clap::Parser;
use cli::{Cli, Commands};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // Set log level based on verbosity
    match cli.verbose {
        0 => {} // default (info)
        1 => log::set_max_level(log::LevelFilter::Debug),
        _ => log::set_max_level(log::LevelFilter::Trace),
    }

    let result = match cli.command {
        Commands::ListBuses => {
            commands::list_buses();
            Ok(())
        }
        Commands::Baud { frequency, baud } => commands::run_baud(frequency, baud),
        Commands::Status { bridge } => commands::run_status(&bridge),
        Commands::Send {
            bridge,
            line,
            data,
            input,
        } => commands::run_send(&bridge, &line, data.as_deref(), input.as_deref()),
        Commands::Recv {
            bridge,
            line,
            count,
            timeout,
            no_begin,
            output,
        } => commands::run_recv(
            &bridge,
            &line,
            count,
            Duration::from_millis(timeout),
            !no_begin,
            output.as_deref(),
        ),
        Commands::End { bridge } => commands::run_end(&bridge),
    };

    result
}
