//! UART line mode
//!
//! The chip always moves 8 data bits; parity and stop bits are encoded in
//! LCR. The driver currently programs 8N1 only and rejects every other
//! combination before touching the bus.

use core::fmt;
use core::str::FromStr;

use crate::error::{Error, Result};

/// Parity setting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parity {
    /// No parity bit
    None,
    /// Odd parity
    Odd,
    /// Even parity
    Even,
    /// Parity bit forced to 1
    Mark,
    /// Parity bit forced to 0
    Space,
}

impl Parity {
    const fn letter(self) -> char {
        match self {
            Self::None => 'N',
            Self::Odd => 'O',
            Self::Even => 'E',
            Self::Mark => 'M',
            Self::Space => 'S',
        }
    }
}

/// Number of stop bits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopBits {
    /// One stop bit
    One,
    /// Two stop bits
    Two,
}

/// Line configuration of a channel (8 data bits implied)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UartMode {
    /// Parity setting
    pub parity: Parity,
    /// Stop bits
    pub stop_bits: StopBits,
}

impl UartMode {
    /// 8 data bits, no parity, 1 stop bit
    pub const MODE_8N1: UartMode = UartMode {
        parity: Parity::None,
        stop_bits: StopBits::One,
    };

    /// LCR value for this mode
    ///
    /// Only 8N1 is supported; anything else is [`Error::UnsupportedMode`].
    pub const fn lcr(&self) -> Result<u8> {
        match (self.parity, self.stop_bits) {
            (Parity::None, StopBits::One) => Ok(0x00),
            _ => Err(Error::UnsupportedMode),
        }
    }
}

impl Default for UartMode {
    fn default() -> Self {
        Self::MODE_8N1
    }
}

impl fmt::Display for UartMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stop = match self.stop_bits {
            StopBits::One => 1,
            StopBits::Two => 2,
        };
        write!(f, "8{}{}", self.parity.letter(), stop)
    }
}

impl FromStr for UartMode {
    type Err = Error;

    /// Parse the usual `8N1` notation (case-insensitive)
    fn from_str(s: &str) -> Result<Self> {
        let bytes = s.as_bytes();
        if bytes.len() != 3 || bytes[0] != b'8' {
            return Err(Error::UnsupportedMode);
        }

        let parity = match bytes[1].to_ascii_uppercase() {
            b'N' => Parity::None,
            b'O' => Parity::Odd,
            b'E' => Parity::Even,
            b'M' => Parity::Mark,
            b'S' => Parity::Space,
            _ => return Err(Error::UnsupportedMode),
        };
        let stop_bits = match bytes[2] {
            b'1' => StopBits::One,
            b'2' => StopBits::Two,
            _ => return Err(Error::UnsupportedMode),
        };

        Ok(Self { parity, stop_bits })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        assert_eq!("8N1".parse::<UartMode>(), Ok(UartMode::MODE_8N1));
        assert_eq!(
            "8e2".parse::<UartMode>(),
            Ok(UartMode {
                parity: Parity::Even,
                stop_bits: StopBits::Two
            })
        );
        assert_eq!("7N1".parse::<UartMode>(), Err(Error::UnsupportedMode));
        assert_eq!("8X1".parse::<UartMode>(), Err(Error::UnsupportedMode));
        assert_eq!("8N".parse::<UartMode>(), Err(Error::UnsupportedMode));
    }

    #[test]
    fn test_lcr() {
        assert_eq!(UartMode::MODE_8N1.lcr(), Ok(0x00));
        let odd = UartMode {
            parity: Parity::Odd,
            stop_bits: StopBits::One,
        };
        assert_eq!(odd.lcr(), Err(Error::UnsupportedMode));
    }
}
