//! Bus backend registration and dispatch
//!
//! This module provides a centralized registry for all bus backends, with
//! support for feature-gated inclusion and dynamic help text generation.

use std::collections::HashMap;

use thiserror::Error;
use wk2132_core::bus::{BusInfo, I2cMaster};

/// Boxed bus handed to the driver
pub type BoxedBus = Box<dyn I2cMaster + Send>;

/// Errors raised while selecting or opening a bus backend
#[derive(Debug, Error)]
pub enum BusError {
    /// No backend with this name was compiled in
    #[error("Unknown bus '{0}'. Run `wk2132 list-buses` for the available backends")]
    Unknown(String),

    /// Malformed `key=value` option
    #[error("Invalid parameter format: '{0}' (expected key=value)")]
    InvalidParam(String),

    /// Backend rejected its options or failed to open
    #[error("{name}: {message}")]
    Backend {
        /// Backend name
        name: &'static str,
        /// Backend error text
        message: String,
    },
}

/// Parsed `name:key=value,...` bus string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusParams {
    /// Backend name
    pub name: String,
    /// Key-value options
    pub params: HashMap<String, String>,
}

impl BusParams {
    /// Options as borrowed pairs, sorted by key for stable handling
    pub fn options(&self) -> Vec<(&str, &str)> {
        let mut options: Vec<(&str, &str)> = self
            .params
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        options.sort_unstable();
        options
    }
}

/// Parse a bus string such as `linux_i2c:dev=/dev/i2c-1,chunk=16`
pub fn parse_bus_params(s: &str) -> Result<BusParams, BusError> {
    let (name, opts_str) = s.split_once(':').unwrap_or((s, ""));

    let mut params = HashMap::new();
    if !opts_str.is_empty() {
        for opt in opts_str.split(',') {
            if let Some((key, value)) = opt.split_once('=') {
                params.insert(key.to_string(), value.to_string());
            } else {
                return Err(BusError::InvalidParam(opt.to_string()));
            }
        }
    }

    Ok(BusParams {
        name: name.to_string(),
        params,
    })
}

/// Get information about all available buses (enabled at compile time)
#[allow(unused_mut, clippy::vec_init_then_push)]
pub fn available_buses() -> Vec<BusInfo> {
    let mut buses = Vec::new();

    #[cfg(feature = "dummy")]
    buses.push(BusInfo {
        name: "dummy",
        aliases: &["emulator"],
        description: "In-memory WK2132 emulator (loopback=1, hold_tx=1, chunk=<n>)",
        requires_root: false,
    });

    #[cfg(feature = "linux-i2c")]
    buses.push(BusInfo {
        name: "linux_i2c",
        aliases: &["linux-i2c", "i2cdev"],
        description: "Linux i2c-dev adapter (dev=/dev/i2c-N, chunk=<n>)",
        requires_root: true,
    });

    buses
}

/// Comma-separated names for short help text
pub fn bus_names_short() -> String {
    let buses = available_buses();
    let names: Vec<&str> = buses.iter().map(|b| b.name).collect();
    names.join(", ")
}

/// Resolve a name or alias to the canonical backend name
pub fn find_bus(name: &str) -> Option<&'static str> {
    available_buses()
        .into_iter()
        .find(|b| b.name == name || b.aliases.contains(&name))
        .map(|b| b.name)
}

/// Open the bus described by `bus`
///
/// The strap pins are passed through so the emulator answers on the same
/// address the driver will compute.
#[allow(unused_variables)]
pub fn open_bus(bus: &str, ia0: bool, ia1: bool) -> Result<BoxedBus, BusError> {
    let params = parse_bus_params(bus)?;
    let name = find_bus(&params.name).ok_or_else(|| BusError::Unknown(params.name.clone()))?;
    let options = params.options();

    log::debug!("Opening bus {} with {} option(s)", name, options.len());

    match name {
        #[cfg(feature = "dummy")]
        "dummy" => {
            let mut config = wk2132_dummy::parse_options(&options)
                .map_err(|message| BusError::Backend { name, message })?;
            config.ia0 = ia0;
            config.ia1 = ia1;
            Ok(Box::new(wk2132_dummy::DummyBridge::new(config)))
        }
        #[cfg(feature = "linux-i2c")]
        "linux_i2c" => wk2132_linux_i2c::open_linux_i2c(&options).map_err(|e| BusError::Backend {
            name,
            message: e.to_string(),
        }),
        _ => Err(BusError::Unknown(params.name.clone())),
    }
}
