//! Error types for wk2132-core
//!
//! This module provides a no_std compatible error type that can be used
//! throughout the crate.

use core::fmt;

/// Core error type - no_std compatible, Copy for efficiency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    // Argument errors (detected before any bus access)
    /// Crystal frequency outside the supported range
    FrequencyOutOfRange,
    /// Register address does not fit in the 4-bit channel register space
    InvalidRegister,
    /// Requested line mode is not supported by the driver
    UnsupportedMode,
    /// Baud rate cannot be produced by the configured crystal
    InvalidBaudRate,

    // Lifecycle errors
    /// The bridge has not been configured yet
    NotConfigured,
    /// The bridge has already been configured
    AlreadyConfigured,
    /// A handle for this channel is already held elsewhere
    ChannelInUse,

    // Bus errors
    /// A bus transaction failed or moved fewer bytes than required
    Bus,
    /// The chip did not reach the expected state in time
    Timeout,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FrequencyOutOfRange => write!(
                f,
                "crystal frequency out of range ({}..={} Hz)",
                crate::device::MIN_FREQUENCY_HZ,
                crate::device::MAX_FREQUENCY_HZ
            ),
            Self::InvalidRegister => write!(f, "register address wider than 4 bits"),
            Self::UnsupportedMode => write!(f, "unsupported UART line mode"),
            Self::InvalidBaudRate => write!(f, "baud rate not attainable with this crystal"),
            Self::NotConfigured => write!(f, "bridge not configured"),
            Self::AlreadyConfigured => write!(f, "bridge already configured"),
            Self::ChannelInUse => write!(f, "channel handle already in use"),
            Self::Bus => write!(f, "I2C bus transaction failed"),
            Self::Timeout => write!(f, "operation timed out"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

impl embedded_io::Error for Error {
    fn kind(&self) -> embedded_io::ErrorKind {
        match self {
            Self::FrequencyOutOfRange
            | Self::InvalidRegister
            | Self::UnsupportedMode
            | Self::InvalidBaudRate => embedded_io::ErrorKind::InvalidInput,
            Self::NotConfigured | Self::AlreadyConfigured => embedded_io::ErrorKind::Unsupported,
            Self::ChannelInUse => embedded_io::ErrorKind::AddrInUse,
            Self::Bus => embedded_io::ErrorKind::Other,
            Self::Timeout => embedded_io::ErrorKind::TimedOut,
        }
    }
}

/// Result type alias using the core Error type
pub type Result<T> = core::result::Result<T, Error>;
