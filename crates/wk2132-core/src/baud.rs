//! Baud rate divisor calculation
//!
//! The chip divides the crystal by `16 * (BAUD + 1 + PRES / 10)`, where
//! `BAUD` is the 16-bit value spread over BAUD1/BAUD0 and `PRES` is a
//! decimal fraction in tenths. Given `raw = f / (16 * baud)`:
//!
//! - `BAUD = floor(raw) - 1`
//! - `PRES = round(frac(raw) * 10)`
//!
//! Everything is computed with integer arithmetic so the result is exact
//! and available without floating point support.

use crate::error::{Error, Result};

/// Oversampling factor of the UART receiver
pub const OVERSAMPLING: u32 = 16;

/// Deviation above which `begin` logs a warning, in parts per million
pub const WARN_DEVIATION_PPM: u32 = 20_000;

/// Baud rate register values for one channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BaudDivisor {
    /// BAUD1 - divisor high byte
    pub high: u8,
    /// BAUD0 - divisor low byte
    pub low: u8,
    /// PRES - fractional part in tenths
    pub fraction: u8,
}

impl BaudDivisor {
    /// Compute the register values for `baud` with a crystal of
    /// `frequency_hz`
    ///
    /// Fails with [`Error::InvalidBaudRate`] for a zero baud rate or when
    /// the integer divisor does not fit the 16-bit register pair.
    pub fn compute(frequency_hz: u32, baud: u32) -> Result<Self> {
        if baud == 0 {
            return Err(Error::InvalidBaudRate);
        }

        let denom = baud as u64 * OVERSAMPLING as u64;
        let whole = frequency_hz as u64 / denom;
        let rem = frequency_hz as u64 % denom;

        if whole == 0 || whole - 1 > u16::MAX as u64 {
            log::debug!(
                "baud {} not attainable from {} Hz (raw divisor {})",
                baud,
                frequency_hz,
                whole
            );
            return Err(Error::InvalidBaudRate);
        }

        let divisor = (whole - 1) as u16;
        // round(rem / denom * 10), halves rounded up
        let fraction = ((rem * 20 + denom) / (denom * 2)) as u8;

        Ok(Self {
            high: (divisor >> 8) as u8,
            low: divisor as u8,
            fraction,
        })
    }

    /// The 16-bit divisor written to BAUD1:BAUD0
    pub const fn divisor(&self) -> u16 {
        ((self.high as u16) << 8) | self.low as u16
    }

    /// Baud rate the hardware will actually produce
    pub fn actual_baud(&self, frequency_hz: u32) -> u32 {
        let tenths = (self.divisor() as u64 + 1) * 10 + self.fraction as u64;
        let denom = tenths * OVERSAMPLING as u64;
        ((frequency_hz as u64 * 10 + denom / 2) / denom) as u32
    }

    /// Deviation of the achieved rate from `requested`, in parts per million
    pub fn deviation_ppm(&self, frequency_hz: u32, requested: u32) -> u32 {
        if requested == 0 {
            return u32::MAX;
        }
        let actual = self.actual_baud(frequency_hz) as u64;
        let diff = actual.abs_diff(requested as u64);
        (diff * 1_000_000 / requested as u64).min(u32::MAX as u64) as u32
    }
}
