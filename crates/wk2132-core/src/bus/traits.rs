//! Bus transport trait definitions
//!
//! The driver never talks to hardware directly. Every register access and
//! FIFO transfer is expressed as start/stop delimited I2C transactions on an
//! [`I2cMaster`].

use crate::error::{Error, Result};

/// I2C bus master used to reach the bridge
///
/// Each call is one complete transaction: START, 7-bit address with the
/// direction bit, payload, STOP. Implementations must not retry on their
/// own; retry policy belongs to the caller of the driver.
pub trait I2cMaster {
    /// Largest payload a single transaction may carry
    fn max_transfer_len(&self) -> usize;

    /// Write `data` to the device at `address`
    ///
    /// Any NACK, arbitration loss or host-side failure is reported as
    /// [`Error::Bus`].
    fn write(&mut self, address: u8, data: &[u8]) -> Result<()>;

    /// Read up to `buf.len()` bytes from the device at `address`
    ///
    /// Returns the number of bytes actually received. A short count is not
    /// an error at this level.
    fn read(&mut self, address: u8, buf: &mut [u8]) -> Result<usize>;
}

impl<T: I2cMaster + ?Sized> I2cMaster for &mut T {
    fn max_transfer_len(&self) -> usize {
        (**self).max_transfer_len()
    }

    fn write(&mut self, address: u8, data: &[u8]) -> Result<()> {
        (**self).write(address, data)
    }

    fn read(&mut self, address: u8, buf: &mut [u8]) -> Result<usize> {
        (**self).read(address, buf)
    }
}

// Blanket impl for boxed buses so the CLI can select one at run time
#[cfg(feature = "alloc")]
impl I2cMaster for alloc::boxed::Box<dyn I2cMaster + Send> {
    fn max_transfer_len(&self) -> usize {
        (**self).max_transfer_len()
    }

    fn write(&mut self, address: u8, data: &[u8]) -> Result<()> {
        (**self).write(address, data)
    }

    fn read(&mut self, address: u8, buf: &mut [u8]) -> Result<usize> {
        (**self).read(address, buf)
    }
}

/// Read one register: select it with a write, then read a single byte back
///
/// Shared by the global and the per-channel register paths, which differ
/// only in the bus address.
pub fn read_register<M: I2cMaster + ?Sized>(bus: &mut M, address: u8, reg: u8) -> Result<u8> {
    bus.write(address, &[reg])?;

    let mut buf = [0u8; 1];
    match bus.read(address, &mut buf)? {
        1 => {
            log::trace!("i2c 0x{:02X}: reg 0x{:02X} -> 0x{:02X}", address, reg, buf[0]);
            Ok(buf[0])
        }
        n => {
            log::debug!(
                "i2c 0x{:02X}: short register read of 0x{:02X} ({} bytes)",
                address,
                reg,
                n
            );
            Err(Error::Bus)
        }
    }
}

/// Write one register in a single transaction
pub fn write_register<M: I2cMaster + ?Sized>(
    bus: &mut M,
    address: u8,
    reg: u8,
    value: u8,
) -> Result<()> {
    log::trace!("i2c 0x{:02X}: reg 0x{:02X} <- 0x{:02X}", address, reg, value);
    bus.write(address, &[reg, value])
}

/// Information about a bus backend
#[derive(Debug, Clone)]
pub struct BusInfo {
    /// Name of the backend
    pub name: &'static str,
    /// Alternative names/aliases
    pub aliases: &'static [&'static str],
    /// Description
    pub description: &'static str,
    /// Whether this backend requires elevated privileges
    pub requires_root: bool,
}
