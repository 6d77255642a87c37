//! Error types for Linux I2C operations

use thiserror::Error;

/// Linux I2C specific errors
#[derive(Debug, Error)]
pub enum LinuxI2cError {
    /// Failed to open device
    #[error("Failed to open {path}: {source}")]
    OpenFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to select the slave address
    #[error("Failed to select slave address 0x{address:02X}: {source}")]
    SetSlaveFailed {
        address: u8,
        #[source]
        source: std::io::Error,
    },

    /// Failed to query adapter functionality
    #[error("Failed to query adapter functionality: {0}")]
    FuncsFailed(#[source] std::io::Error),

    /// Adapter cannot do plain I2C transfers
    #[error("Adapter does not support plain I2C transfers")]
    NotI2cCapable,

    /// Transfer failed
    #[error("I2C transfer to 0x{address:02X} failed: {source}")]
    TransferFailed {
        address: u8,
        #[source]
        source: std::io::Error,
    },

    /// Device not specified
    #[error("No device specified. Use dev=/dev/i2c-N")]
    NoDevice,
}

/// Result type for Linux I2C operations
pub type Result<T> = std::result::Result<T, LinuxI2cError>;
