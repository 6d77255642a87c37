//! wk2132-core - Driver core for the WK2132 dual UART-over-I2C bridge
//!
//! The WK2132 exposes two independent UARTs behind a single I2C slave
//! address range. This crate turns its paged, bit-packed registers into two
//! byte-stream endpoints. It is `no_std` compatible and only needs an
//! implementation of [`bus::I2cMaster`] to talk to the chip.
//!
//! # Features
//!
//! - `std` - Enable standard library support (includes `alloc`)
//! - `alloc` - Allow boxed buses (`Box<dyn I2cMaster + Send>`)
//!
//! # Example
//!
//! ```ignore
//! use wk2132_core::{ChannelId, UartMode, Wk2132};
//!
//! fn echo<B: wk2132_core::bus::I2cMaster>(bus: B) -> wk2132_core::Result<()> {
//!     let mut bridge = Wk2132::new(bus);
//!     bridge.configure(11_059_200, false, true)?;
//!
//!     let mut uart = bridge.channel(ChannelId::Uart0)?;
//!     uart.begin(115_200, UartMode::MODE_8N1)?;
//!     while uart.available()? > 0 {
//!         let byte = uart.read_byte()?;
//!         uart.write_byte(byte);
//!     }
//!     Ok(())
//! }
//! ```

#![no_std]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

#[cfg(feature = "alloc")]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

pub mod addressing;
pub mod baud;
pub mod bus;
pub mod channel;
pub mod device;
pub mod error;
pub mod mode;
pub mod register;
pub mod stream;

#[cfg(test)]
mod mock;

pub use addressing::{Access, ChannelId};
pub use baud::BaudDivisor;
pub use channel::Channel;
pub use device::{BridgeConfig, Wk2132};
pub use error::{Error, Result};
pub use mode::{Parity, StopBits, UartMode};
pub use register::Page;
pub use stream::ByteStream;
