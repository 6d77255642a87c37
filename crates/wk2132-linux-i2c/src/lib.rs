//! wk2132-linux-i2c - Linux i2c-dev support
//!
//! This crate lets the WK2132 driver run on any Linux host that exposes
//! its I2C controller through `/dev/i2c-N`.
//!
//! # Example
//!
//! ```no_run
//! use wk2132_linux_i2c::{LinuxI2c, LinuxI2cConfig};
//! use wk2132_core::{ChannelId, UartMode, Wk2132};
//!
//! let bus = LinuxI2c::open(&LinuxI2cConfig::new("/dev/i2c-1"))?;
//! let bridge = Wk2132::with_config(bus, 11_059_200, false, false)?;
//! let mut uart = bridge.channel(ChannelId::Uart0)?;
//! uart.begin(115_200, UartMode::MODE_8N1)?;
//! println!("{} bytes waiting", uart.available()?);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Usage with the wk2132 CLI
//!
//! ```bash
//! wk2132 status -b linux_i2c:dev=/dev/i2c-1 --channel 0
//! wk2132 send -b linux_i2c:dev=/dev/i2c-1,chunk=16 --channel 1 --baud 9600 --data hello
//! ```
//!
//! # System Requirements
//!
//! - Linux kernel with `CONFIG_I2C_CHARDEV`
//! - Read/write access to `/dev/i2c-N` (often the `i2c` group)

pub mod device;
pub mod error;

// Re-exports
pub use device::{parse_options, LinuxI2c, LinuxI2cConfig};
pub use error::{LinuxI2cError, Result};

/// Open a Linux I2C adapter and return a boxed I2cMaster
///
/// This is a convenience function for use in the CLI bus dispatch.
///
/// # Example Options
///
/// - `dev=/dev/i2c-1` - Required: device path
/// - `chunk=32` - Optional: bytes per transaction (default: 32)
pub fn open_linux_i2c(
    options: &[(&str, &str)],
) -> std::result::Result<
    Box<dyn wk2132_core::bus::I2cMaster + Send>,
    Box<dyn std::error::Error>,
> {
    let config = parse_options(options)?;
    let bus = LinuxI2c::open(&config)?;
    Ok(Box::new(bus))
}
