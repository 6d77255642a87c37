//! Byte-stream capability
//!
//! [`ByteStream`] is the conventional serial-port contract (begin, end,
//! available, peek, read, write) that code can program against without
//! knowing it is talking to a bridge channel. [`Channel`] also implements
//! the `embedded-io` traits so it plugs into the wider embedded ecosystem.

use crate::bus::I2cMaster;
use crate::channel::Channel;
use crate::error::{Error, Result};
use crate::mode::UartMode;

/// Serial-port style access to a byte stream
pub trait ByteStream {
    /// Configure and enable the port
    fn begin(&mut self, baud: u32, mode: UartMode) -> Result<()>;

    /// Disable the port
    fn end(&mut self) -> Result<()>;

    /// Bytes that can be read without blocking
    fn available(&mut self) -> Result<usize>;

    /// Next byte, left in place for the following read
    fn peek(&mut self) -> Result<u8>;

    /// Take the next byte
    fn read_byte(&mut self) -> Result<u8>;

    /// Queue one byte, returning how many were accepted (0 or 1)
    fn write_byte(&mut self, byte: u8) -> usize;

    /// Wait until everything written has left the port
    fn flush(&mut self) -> Result<()>;

    /// Queue as much of `data` as is accepted byte by byte
    fn write_bytes(&mut self, data: &[u8]) -> usize {
        let mut written = 0;
        for &byte in data {
            if self.write_byte(byte) == 0 {
                break;
            }
            written += 1;
        }
        written
    }
}

impl<B: I2cMaster> ByteStream for Channel<'_, B> {
    fn begin(&mut self, baud: u32, mode: UartMode) -> Result<()> {
        Channel::begin(self, baud, mode)
    }

    fn end(&mut self) -> Result<()> {
        Channel::end(self)
    }

    fn available(&mut self) -> Result<usize> {
        Channel::available(self)
    }

    fn peek(&mut self) -> Result<u8> {
        Channel::peek(self)
    }

    fn read_byte(&mut self) -> Result<u8> {
        Channel::read_byte(self)
    }

    fn write_byte(&mut self, byte: u8) -> usize {
        Channel::write_byte(self, byte)
    }

    fn flush(&mut self) -> Result<()> {
        Channel::flush(self)
    }
}

impl<B: I2cMaster> embedded_io::ErrorType for Channel<'_, B> {
    type Error = Error;
}

impl<B: I2cMaster> embedded_io::Read for Channel<'_, B> {
    /// Blocks (by polling RFCNT) until at least one byte is available
    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        // The peeked byte already left the FIFO, so topping up after it
        // must not turn into an error that drops it
        if let Some(byte) = self.take_peeked() {
            buf[0] = byte;
            let more = match Channel::available(self) {
                Ok(n) => n.min(buf.len() - 1),
                Err(e) => {
                    log::debug!("{}: read after peek: {}", self.id(), e);
                    0
                }
            };
            let got = if more > 0 {
                self.fifo_read(&mut buf[1..1 + more])
            } else {
                0
            };
            return Ok(1 + got);
        }

        let available = loop {
            let n = Channel::available(self)?;
            if n > 0 {
                break n;
            }
        };

        let want = available.min(buf.len());
        match self.fifo_read(&mut buf[..want]) {
            0 => Err(Error::Bus),
            n => Ok(n),
        }
    }
}

impl<B: I2cMaster> embedded_io::ReadReady for Channel<'_, B> {
    fn read_ready(&mut self) -> Result<bool> {
        if self.has_peeked() {
            return Ok(true);
        }
        Ok(Channel::available(self)? > 0)
    }
}

impl<B: I2cMaster> embedded_io::Write for Channel<'_, B> {
    /// Blocks (by polling TFCNT) until the transmit FIFO has room
    fn write(&mut self, buf: &[u8]) -> Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        let free = loop {
            let n = self.transmit_free()?;
            if n > 0 {
                break n;
            }
        };

        match self.fifo_write(&buf[..free.min(buf.len())]) {
            0 => Err(Error::Bus),
            n => Ok(n),
        }
    }

    fn flush(&mut self) -> Result<()> {
        Channel::flush(self)
    }
}

impl<B: I2cMaster> embedded_io::WriteReady for Channel<'_, B> {
    fn write_ready(&mut self) -> Result<bool> {
        Ok(self.transmit_free()? > 0)
    }
}
