//! Linux I2C device implementation
//!
//! This module provides the `LinuxI2c` struct that implements the
//! `I2cMaster` trait using Linux's i2c-dev interface.

use crate::error::{LinuxI2cError, Result};

use wk2132_core::bus::I2cMaster;
use wk2132_core::error::{Error as CoreError, Result as CoreResult};

use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::os::unix::io::AsRawFd;

/// Largest transfer accepted by i2c-dev read/write
const I2C_DEV_MAX_TRANSFER: usize = 8192;

/// Default transaction size (matches common MCU I2C buffers)
const DEFAULT_CHUNK: usize = 32;

/// Linux i2c-dev ioctl constants
mod ioctl {
    use nix::{ioctl_read_bad, ioctl_write_int_bad};

    const I2C_SLAVE: u16 = 0x0703;
    const I2C_FUNCS: u16 = 0x0705;

    /// Adapter can do plain I2C-level commands
    pub const I2C_FUNC_I2C: libc::c_ulong = 0x0000_0001;

    ioctl_write_int_bad!(i2c_set_slave, I2C_SLAVE);
    ioctl_read_bad!(i2c_get_funcs, I2C_FUNCS, libc::c_ulong);
}

/// Configuration for opening a Linux I2C adapter
#[derive(Debug, Clone)]
pub struct LinuxI2cConfig {
    /// Device path (e.g., "/dev/i2c-1")
    pub device: String,
    /// Largest payload per transaction
    pub chunk: usize,
}

impl Default for LinuxI2cConfig {
    fn default() -> Self {
        Self {
            device: String::new(),
            chunk: DEFAULT_CHUNK,
        }
    }
}

impl LinuxI2cConfig {
    /// Create a new configuration with the given device path
    pub fn new(device: impl Into<String>) -> Self {
        Self {
            device: device.into(),
            ..Default::default()
        }
    }

    /// Set the transaction size
    pub fn with_chunk(mut self, chunk: usize) -> Self {
        self.chunk = chunk;
        self
    }
}

/// I2C bus master on a Linux i2c-dev adapter
///
/// The kernel keeps one slave address per file descriptor, so the address
/// is only re-selected when a transaction targets a different one.
pub struct LinuxI2c {
    /// File handle for the i2c-dev device
    file: File,
    /// Transaction size limit
    chunk: usize,
    /// Slave address currently selected on the descriptor
    current: Option<u8>,
}

impl LinuxI2c {
    /// Open a Linux I2C adapter with the given configuration
    pub fn open(config: &LinuxI2cConfig) -> Result<Self> {
        if config.device.is_empty() {
            return Err(LinuxI2cError::NoDevice);
        }

        log::debug!("linux_i2c: Opening device {}", config.device);

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&config.device)
            .map_err(|e| LinuxI2cError::OpenFailed {
                path: config.device.clone(),
                source: e,
            })?;

        let mut funcs: libc::c_ulong = 0;
        unsafe {
            ioctl::i2c_get_funcs(file.as_raw_fd(), &mut funcs).map_err(|e| {
                LinuxI2cError::FuncsFailed(std::io::Error::from_raw_os_error(e as i32))
            })?;
        }
        if funcs & ioctl::I2C_FUNC_I2C == 0 {
            return Err(LinuxI2cError::NotI2cCapable);
        }

        let chunk = config.chunk.clamp(1, I2C_DEV_MAX_TRANSFER);
        log::info!(
            "linux_i2c: Opened {} (chunk={} bytes)",
            config.device,
            chunk
        );

        Ok(Self {
            file,
            chunk,
            current: None,
        })
    }

    /// Open a device with default settings
    pub fn open_device(device: &str) -> Result<Self> {
        Self::open(&LinuxI2cConfig::new(device))
    }

    fn select(&mut self, address: u8) -> Result<()> {
        if self.current == Some(address) {
            return Ok(());
        }
        unsafe {
            ioctl::i2c_set_slave(self.file.as_raw_fd(), address as libc::c_int).map_err(|e| {
                LinuxI2cError::SetSlaveFailed {
                    address,
                    source: std::io::Error::from_raw_os_error(e as i32),
                }
            })?;
        }
        self.current = Some(address);
        Ok(())
    }

    fn i2c_write(&mut self, address: u8, data: &[u8]) -> Result<()> {
        self.select(address)?;
        let written = self
            .file
            .write(data)
            .map_err(|source| LinuxI2cError::TransferFailed { address, source })?;
        if written != data.len() {
            return Err(LinuxI2cError::TransferFailed {
                address,
                source: std::io::Error::new(
                    std::io::ErrorKind::WriteZero,
                    format!("short write {}/{}", written, data.len()),
                ),
            });
        }
        Ok(())
    }

    fn i2c_read(&mut self, address: u8, buf: &mut [u8]) -> Result<usize> {
        self.select(address)?;
        self.file
            .read(buf)
            .map_err(|source| LinuxI2cError::TransferFailed { address, source })
    }
}

impl I2cMaster for LinuxI2c {
    fn max_transfer_len(&self) -> usize {
        self.chunk
    }

    fn write(&mut self, address: u8, data: &[u8]) -> CoreResult<()> {
        self.i2c_write(address, data).map_err(|e| {
            log::debug!("linux_i2c: {}", e);
            CoreError::Bus
        })
    }

    fn read(&mut self, address: u8, buf: &mut [u8]) -> CoreResult<usize> {
        self.i2c_read(address, buf).map_err(|e| {
            log::debug!("linux_i2c: {}", e);
            CoreError::Bus
        })
    }
}

/// Parse bus options from a list of key-value pairs
pub fn parse_options(options: &[(&str, &str)]) -> std::result::Result<LinuxI2cConfig, String> {
    let mut config = LinuxI2cConfig::default();

    for (key, value) in options {
        match *key {
            "dev" => {
                config.device = value.to_string();
            }
            "chunk" => {
                let chunk: usize = value
                    .parse()
                    .map_err(|_| format!("Invalid chunk value: {}", value))?;
                if chunk == 0 || chunk > I2C_DEV_MAX_TRANSFER {
                    return Err(format!(
                        "Invalid chunk: {} (must be 1-{})",
                        chunk, I2C_DEV_MAX_TRANSFER
                    ));
                }
                config.chunk = chunk;
            }
            _ => {
                log::warn!("linux_i2c: Unknown option: {}={}", key, value);
            }
        }
    }

    if config.device.is_empty() {
        return Err("No device specified. Use dev=/dev/i2c-N".to_string());
    }

    Ok(config)
}
