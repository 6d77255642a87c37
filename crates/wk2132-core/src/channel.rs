//! Channel handle
//!
//! A [`Channel`] drives one of the two sub-UARTs. Every operation that
//! depends on a register page selects it first: the page remembered here
//! is only a hint for diagnostics, never a reason to skip the SPAGE write.
//!
//! The receive counter RFCNT is 8 bits wide for a 256-byte FIFO, so a value
//! of zero means either "empty" or "full". [`Channel::available`] resolves
//! this with the RDAT bit of FSR.

use crate::addressing::{self, Access, ChannelId};
use crate::baud::{BaudDivisor, WARN_DEVIATION_PPM};
use crate::bus::{self, I2cMaster};
use crate::device::Wk2132;
use crate::error::{Error, Result};
use crate::mode::UartMode;
use crate::register::{
    is_valid_channel_register, ChannelRegister, Fsr, Lsr, Page, Scr, Spage, FCR_BEGIN, FIFO_DEPTH,
    SCR_BEGIN,
};

/// Number of FSR polls `flush` performs before giving up
pub const FLUSH_POLL_LIMIT: u32 = 10_000;

/// Register contents of one channel, for diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RegisterSnapshot {
    /// SPAGE
    pub spage: u8,
    /// SCR
    pub scr: u8,
    /// LCR
    pub lcr: u8,
    /// FCR
    pub fcr: u8,
    /// TFCNT
    pub tfcnt: u8,
    /// RFCNT
    pub rfcnt: u8,
    /// FSR
    pub fsr: u8,
    /// LSR
    pub lsr: u8,
    /// BAUD1
    pub baud1: u8,
    /// BAUD0
    pub baud0: u8,
    /// PRES
    pub pres: u8,
}

/// Handle to one UART channel of a [`Wk2132`]
pub struct Channel<'a, B: I2cMaster> {
    device: &'a Wk2132<B>,
    id: ChannelId,
    page: Page,
    /// At most one byte read ahead by `peek`
    peeked: Option<u8>,
    active: bool,
}

impl<'a, B: I2cMaster> Channel<'a, B> {
    pub(crate) fn new(device: &'a Wk2132<B>, id: ChannelId) -> Self {
        Self {
            device,
            id,
            page: Page::Page0,
            peeked: None,
            active: false,
        }
    }

    /// Which channel this handle drives
    pub fn id(&self) -> ChannelId {
        self.id
    }

    /// Page this handle selected last
    pub fn page(&self) -> Page {
        self.page
    }

    /// Whether `begin` succeeded and `end` has not been called since
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Whether a peeked byte is waiting to be returned by `read_byte`
    pub fn has_peeked(&self) -> bool {
        self.peeked.is_some()
    }

    /// Bus address used for the given kind of access
    pub fn bus_address(&self, access: Access) -> Result<u8> {
        let base = self.device.base_address()?;
        Ok(addressing::channel_address(base, self.id, access))
    }

    // ---------------------------------------------------------------------
    // Register access
    // ---------------------------------------------------------------------

    /// Read a channel register by raw 4-bit address
    ///
    /// The current page is used as is.
    pub fn register_read_raw(&mut self, addr: u8) -> Result<u8> {
        if !is_valid_channel_register(addr) {
            return Err(Error::InvalidRegister);
        }
        let address = self.bus_address(Access::Register)?;
        self.device
            .with_bus(|bus| bus::read_register(bus, address, addr))
    }

    /// Write a channel register by raw 4-bit address
    ///
    /// The current page is used as is.
    pub fn register_write_raw(&mut self, addr: u8, value: u8) -> Result<()> {
        if !is_valid_channel_register(addr) {
            return Err(Error::InvalidRegister);
        }
        let address = self.bus_address(Access::Register)?;
        self.device
            .with_bus(|bus| bus::write_register(bus, address, addr, value))
    }

    /// Read a channel register on the current page
    pub fn register_read(&mut self, reg: ChannelRegister) -> Result<u8> {
        self.register_read_raw(reg.addr())
    }

    /// Write a channel register on the current page
    pub fn register_write(&mut self, reg: ChannelRegister, value: u8) -> Result<()> {
        self.register_write_raw(reg.addr(), value)
    }

    /// Select a register page
    ///
    /// SPAGE is always read back and rewritten so its other bits are kept.
    pub fn page_set(&mut self, page: Page) -> Result<()> {
        let current = Spage::from_bits_retain(self.register_read(ChannelRegister::Spage)?);
        let next = match page {
            Page::Page0 => current.difference(Spage::PAGE),
            Page::Page1 => current.union(Spage::PAGE),
        };
        self.register_write(ChannelRegister::Spage, next.bits())?;
        self.page = page;
        Ok(())
    }

    /// Select the page a register lives on, then read it
    pub fn read_paged(&mut self, reg: ChannelRegister) -> Result<u8> {
        if let Some(page) = reg.page() {
            self.page_set(page)?;
        }
        self.register_read(reg)
    }

    /// Select the page a register lives on, then write it
    pub fn write_paged(&mut self, reg: ChannelRegister, value: u8) -> Result<()> {
        if let Some(page) = reg.page() {
            self.page_set(page)?;
        }
        self.register_write(reg, value)
    }

    // ---------------------------------------------------------------------
    // Lifecycle
    // ---------------------------------------------------------------------

    /// Bring the channel up at `baud` with line mode `mode`
    ///
    /// Arguments are validated before any bus traffic. Afterwards the
    /// sequence is: enable and reset the channel globally, enable the
    /// FIFOs, program the baud divisor on page 1, enable RX/TX and set the
    /// line mode on page 0. The first failing step aborts; nothing is
    /// rolled back, so the whole sequence should be retried.
    pub fn begin(&mut self, baud: u32, mode: UartMode) -> Result<()> {
        let lcr = mode.lcr()?;
        let frequency = self.device.frequency_hz()?;
        let divisor = BaudDivisor::compute(frequency, baud)?;

        let deviation = divisor.deviation_ppm(frequency, baud);
        if deviation > WARN_DEVIATION_PPM {
            log::warn!(
                "{}: requested {} baud, hardware will run at {} ({}.{}% off)",
                self.id,
                baud,
                divisor.actual_baud(frequency),
                deviation / 10_000,
                deviation / 1_000 % 10
            );
        }

        self.active = false;
        // The FIFO reset below discards anything read ahead
        self.peeked = None;

        self.device.enable_channel(self.id)?;
        self.device.reset_channel(self.id)?;

        self.page_set(Page::Page0)?;
        self.register_write(ChannelRegister::Fcr, FCR_BEGIN.bits())?;

        self.page_set(Page::Page1)?;
        self.register_write(ChannelRegister::Baud1, divisor.high)?;
        self.register_write(ChannelRegister::Baud0, divisor.low)?;
        self.register_write(ChannelRegister::Pres, divisor.fraction)?;

        self.page_set(Page::Page0)?;
        self.register_write(ChannelRegister::Scr, SCR_BEGIN.bits())?;
        self.register_write(ChannelRegister::Lcr, lcr)?;

        self.active = true;
        log::info!(
            "{}: up at {} baud {} (BAUD=0x{:04X}, PRES={})",
            self.id,
            baud,
            mode,
            divisor.divisor(),
            divisor.fraction
        );
        Ok(())
    }

    /// Disable the channel's receiver and transmitter
    ///
    /// The global enable bit and the FIFOs are left alone. Safe to call on
    /// an inactive channel.
    pub fn end(&mut self) -> Result<()> {
        self.page_set(Page::Page0)?;
        self.register_write(ChannelRegister::Scr, Scr::empty().bits())?;
        self.active = false;
        log::info!("{}: disabled", self.id);
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Status
    // ---------------------------------------------------------------------

    /// Read FSR
    pub fn fifo_status(&mut self) -> Result<Fsr> {
        self.page_set(Page::Page0)?;
        Ok(Fsr::from_bits_retain(self.register_read(ChannelRegister::Fsr)?))
    }

    /// Read LSR
    pub fn line_status(&mut self) -> Result<Lsr> {
        self.page_set(Page::Page0)?;
        Ok(Lsr::from_bits_retain(self.register_read(ChannelRegister::Lsr)?))
    }

    /// Number of bytes waiting in the receive FIFO
    ///
    /// A zero RFCNT is checked against RDAT: no data means empty; data
    /// pending means either bytes arrived meanwhile (RFCNT is re-read) or
    /// the FIFO is full and the counter wrapped to zero. A byte already
    /// taken by `peek` is not included.
    pub fn available(&mut self) -> Result<usize> {
        self.page_set(Page::Page0)?;

        let count = self.register_read(ChannelRegister::Rfcnt)?;
        if count != 0 {
            return Ok(count as usize);
        }

        let fsr = Fsr::from_bits_retain(self.register_read(ChannelRegister::Fsr)?);
        if !fsr.contains(Fsr::RDAT) {
            return Ok(0);
        }

        match self.register_read(ChannelRegister::Rfcnt)? {
            0 => {
                log::trace!("{}: RFCNT wrapped, receive FIFO full", self.id);
                Ok(FIFO_DEPTH)
            }
            count => Ok(count as usize),
        }
    }

    /// Number of bytes queued in the transmit FIFO
    ///
    /// Resolves the zero TFCNT ambiguity with TFULL.
    pub fn transmit_fifo_level(&mut self) -> Result<usize> {
        self.page_set(Page::Page0)?;

        let count = self.register_read(ChannelRegister::Tfcnt)?;
        if count != 0 {
            return Ok(count as usize);
        }

        let fsr = Fsr::from_bits_retain(self.register_read(ChannelRegister::Fsr)?);
        if fsr.contains(Fsr::TFULL) {
            Ok(FIFO_DEPTH)
        } else {
            Ok(0)
        }
    }

    /// Free space in the transmit FIFO
    pub fn transmit_free(&mut self) -> Result<usize> {
        Ok(FIFO_DEPTH - self.transmit_fifo_level()?)
    }

    /// Read every readable register except FDAT, leaving page 0 selected
    pub fn register_snapshot(&mut self) -> Result<RegisterSnapshot> {
        let mut snap = RegisterSnapshot::default();

        self.page_set(Page::Page1)?;
        snap.baud1 = self.register_read(ChannelRegister::Baud1)?;
        snap.baud0 = self.register_read(ChannelRegister::Baud0)?;
        snap.pres = self.register_read(ChannelRegister::Pres)?;

        self.page_set(Page::Page0)?;
        snap.spage = self.register_read(ChannelRegister::Spage)?;
        snap.scr = self.register_read(ChannelRegister::Scr)?;
        snap.lcr = self.register_read(ChannelRegister::Lcr)?;
        snap.fcr = self.register_read(ChannelRegister::Fcr)?;
        snap.tfcnt = self.register_read(ChannelRegister::Tfcnt)?;
        snap.rfcnt = self.register_read(ChannelRegister::Rfcnt)?;
        snap.fsr = self.register_read(ChannelRegister::Fsr)?;
        snap.lsr = self.register_read(ChannelRegister::Lsr)?;

        Ok(snap)
    }

    // ---------------------------------------------------------------------
    // Single-byte access
    // ---------------------------------------------------------------------

    fn read_fdat(&mut self) -> Result<u8> {
        self.page_set(Page::Page0)?;
        self.register_read(ChannelRegister::Fdat)
    }

    /// Look at the next received byte without consuming it
    ///
    /// The byte is taken out of the hardware FIFO and cached; repeated
    /// peeks return it without touching the bus. The cache is not checked
    /// against later arrivals.
    pub fn peek(&mut self) -> Result<u8> {
        if let Some(byte) = self.peeked {
            return Ok(byte);
        }

        let byte = self.read_fdat()?;
        self.peeked = Some(byte);
        Ok(byte)
    }

    /// Read one received byte
    ///
    /// A peeked byte is returned first, without bus access.
    pub fn read_byte(&mut self) -> Result<u8> {
        if let Some(byte) = self.peeked.take() {
            return Ok(byte);
        }
        self.read_fdat()
    }

    /// Queue one byte for transmission
    ///
    /// Returns `Ok(false)` without writing when the transmit FIFO is full.
    pub fn try_write_byte(&mut self, byte: u8) -> Result<bool> {
        let fsr = self.fifo_status()?;
        if fsr.contains(Fsr::TFULL) {
            return Ok(false);
        }
        self.register_write(ChannelRegister::Fdat, byte)?;
        Ok(true)
    }

    /// Queue one byte for transmission, returning the number written
    ///
    /// Returns 0 both when the FIFO is full and when the bus fails; use
    /// [`Channel::try_write_byte`] to tell the two apart. Never blocks.
    pub fn write_byte(&mut self, byte: u8) -> usize {
        match self.try_write_byte(byte) {
            Ok(true) => 1,
            Ok(false) => 0,
            Err(e) => {
                log::debug!("{}: write_byte failed: {}", self.id, e);
                0
            }
        }
    }

    /// Wait until the transmitter has sent everything queued
    ///
    /// Polls FSR at most [`FLUSH_POLL_LIMIT`] times.
    pub fn flush(&mut self) -> Result<()> {
        self.page_set(Page::Page0)?;
        for _ in 0..FLUSH_POLL_LIMIT {
            let fsr = Fsr::from_bits_retain(self.register_read(ChannelRegister::Fsr)?);
            if !fsr.intersects(Fsr::TDAT | Fsr::TBUSY) {
                return Ok(());
            }
        }
        log::warn!("{}: transmit FIFO did not drain", self.id);
        Err(Error::Timeout)
    }

    // ---------------------------------------------------------------------
    // Bulk FIFO access
    // ---------------------------------------------------------------------

    /// Read up to `buf.len()` bytes straight from the receive FIFO
    ///
    /// Transfers are split to the bus's transaction size. Stops early when
    /// the bus delivers nothing or fails and returns how many bytes landed
    /// in `buf`; callers compare against the requested length. A peeked
    /// byte is not included.
    pub fn fifo_read(&mut self, buf: &mut [u8]) -> usize {
        if buf.is_empty() {
            return 0;
        }
        let address = match self.bus_address(Access::Fifo) {
            Ok(address) => address,
            Err(e) => {
                log::debug!("{}: fifo_read: {}", self.id, e);
                return 0;
            }
        };

        let result = self.device.with_bus(|bus| {
            let max = bus.max_transfer_len().max(1);
            let mut done = 0;
            while done < buf.len() {
                let chunk = (buf.len() - done).min(max);
                match bus.read(address, &mut buf[done..done + chunk]) {
                    Ok(0) => break,
                    Ok(n) => done += n.min(chunk),
                    Err(e) => {
                        log::debug!("i2c 0x{:02X}: fifo read failed: {}", address, e);
                        break;
                    }
                }
            }
            Ok(done)
        });

        let done = result.unwrap_or(0);
        if done < buf.len() {
            log::debug!("{}: short FIFO read {}/{}", self.id, done, buf.len());
        }
        done
    }

    /// Write `data` straight into the transmit FIFO
    ///
    /// Returns the number of bytes accepted by the bus before a failure.
    /// There is no check for FIFO space; bytes beyond it are lost by the
    /// chip.
    pub fn fifo_write(&mut self, data: &[u8]) -> usize {
        if data.is_empty() {
            return 0;
        }
        let address = match self.bus_address(Access::Fifo) {
            Ok(address) => address,
            Err(e) => {
                log::debug!("{}: fifo_write: {}", self.id, e);
                return 0;
            }
        };

        let result = self.device.with_bus(|bus| {
            let max = bus.max_transfer_len().max(1);
            let mut done = 0;
            for chunk in data.chunks(max) {
                if let Err(e) = bus.write(address, chunk) {
                    log::debug!("i2c 0x{:02X}: fifo write failed: {}", address, e);
                    break;
                }
                done += chunk.len();
            }
            Ok(done)
        });

        let done = result.unwrap_or(0);
        if done < data.len() {
            log::debug!("{}: short FIFO write {}/{}", self.id, done, data.len());
        }
        done
    }

    pub(crate) fn take_peeked(&mut self) -> Option<u8> {
        self.peeked.take()
    }
}

impl<B: I2cMaster> Drop for Channel<'_, B> {
    fn drop(&mut self) {
        self.device.release_channel(self.id);
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use crate::mock::{MockBus, Op};
    use crate::mode::{Parity, StopBits};
    use std::vec;

    // IA1=1, IA0=0 -> base 0x50; uart1 registers at 0x52, FIFO at 0x53
    const FREQ: u32 = 7_372_800;

    fn bridge() -> Wk2132<MockBus> {
        Wk2132::with_config(MockBus::new(), FREQ, false, true).unwrap()
    }

    #[test]
    fn test_bus_addresses() {
        let bridge = bridge();
        let uart1 = bridge.channel(ChannelId::Uart1).unwrap();
        assert_eq!(uart1.bus_address(Access::Register), Ok(0x52));
        assert_eq!(uart1.bus_address(Access::Fifo), Ok(0x53));
    }

    #[test]
    fn test_invalid_register_rejected_without_bus_access() {
        let bridge = bridge();
        let mut uart = bridge.channel(ChannelId::Uart0).unwrap();
        assert_eq!(uart.register_read_raw(0x10), Err(Error::InvalidRegister));
        assert_eq!(uart.register_write_raw(0xF3, 0), Err(Error::InvalidRegister));
        drop(uart);
        assert!(bridge.bus().ops.is_empty());
    }

    #[test]
    fn test_page_set_preserves_other_bits() {
        let mut bridge = bridge();
        bridge.bus_mut().respond(&[0xA4]).respond(&[0xA5]);

        let mut uart = bridge.channel(ChannelId::Uart1).unwrap();
        uart.page_set(Page::Page1).unwrap();
        assert_eq!(uart.page(), Page::Page1);
        uart.page_set(Page::Page0).unwrap();
        assert_eq!(uart.page(), Page::Page0);
        drop(uart);

        assert_eq!(
            bridge.bus().ops,
            [
                Op::write(0x52, &[0x03]),
                Op::read(0x52, 1),
                Op::write(0x52, &[0x03, 0xA5]),
                Op::write(0x52, &[0x03]),
                Op::read(0x52, 1),
                Op::write(0x52, &[0x03, 0xA4]),
            ]
        );
    }

    #[test]
    fn test_page_set_failure_keeps_hint() {
        let mut bridge = bridge();
        bridge.bus_mut().fail_read();

        let mut uart = bridge.channel(ChannelId::Uart0).unwrap();
        assert_eq!(uart.page_set(Page::Page1), Err(Error::Bus));
        assert_eq!(uart.page(), Page::Page0);
    }

    #[test]
    fn test_begin_sequence() {
        let mut bridge = Wk2132::with_config(MockBus::new(), 11_059_200, false, true).unwrap();
        bridge
            .bus_mut()
            .respond(&[0x01]) // GENA: uart0 already on
            .respond(&[0x00]) // GRST
            .respond(&[0x00]) // SPAGE
            .respond(&[0x00]) // SPAGE
            .respond(&[0x01]); // SPAGE

        let mut uart = bridge.channel(ChannelId::Uart1).unwrap();
        uart.begin(9600, UartMode::MODE_8N1).unwrap();
        assert!(uart.is_active());
        drop(uart);

        // 11.0592 MHz / (16 * 9600) = 72 -> BAUD = 71
        assert_eq!(
            bridge.bus().writes(),
            [
                (0x50, vec![0x00]),
                (0x50, vec![0x00, 0x03]),
                (0x50, vec![0x01]),
                (0x50, vec![0x01, 0x02]),
                (0x52, vec![0x03]),
                (0x52, vec![0x03, 0x00]),
                (0x52, vec![0x06, 0x0D]),
                (0x52, vec![0x03]),
                (0x52, vec![0x03, 0x01]),
                (0x52, vec![0x04, 0x00]),
                (0x52, vec![0x05, 71]),
                (0x52, vec![0x06, 0x00]),
                (0x52, vec![0x03]),
                (0x52, vec![0x03, 0x00]),
                (0x52, vec![0x04, 0x03]),
                (0x52, vec![0x05, 0x00]),
            ]
        );
    }

    #[test]
    fn test_begin_unsupported_mode_no_bus_access() {
        let bridge = bridge();
        let mut uart = bridge.channel(ChannelId::Uart0).unwrap();
        let mode = UartMode {
            parity: Parity::Even,
            stop_bits: StopBits::One,
        };
        assert_eq!(uart.begin(9600, mode), Err(Error::UnsupportedMode));
        assert!(!uart.is_active());
        drop(uart);
        assert!(bridge.bus().ops.is_empty());
    }

    #[test]
    fn test_begin_requires_configuration() {
        let bridge = Wk2132::new(MockBus::new());
        let mut uart = bridge.channel(ChannelId::Uart0).unwrap();
        assert_eq!(uart.begin(9600, UartMode::MODE_8N1), Err(Error::NotConfigured));
    }

    #[test]
    fn test_begin_aborts_on_bus_error() {
        let mut bridge = bridge();
        // GENA read succeeds, GENA write fails
        bridge.bus_mut().respond(&[0x00]).fail_write(1);

        let mut uart = bridge.channel(ChannelId::Uart0).unwrap();
        assert_eq!(uart.begin(9600, UartMode::MODE_8N1), Err(Error::Bus));
        assert!(!uart.is_active());
        drop(uart);
        assert_eq!(bridge.bus().ops.len(), 3);
    }

    #[test]
    fn test_end() {
        let mut bridge = bridge();
        bridge.bus_mut().respond(&[0x00]);

        let mut uart = bridge.channel(ChannelId::Uart0).unwrap();
        uart.end().unwrap();
        assert!(!uart.is_active());
        drop(uart);

        assert_eq!(bridge.bus().writes().last().unwrap(), &(0x50, vec![0x04, 0x00]));
    }

    #[test]
    fn test_available_nonzero_count() {
        let mut bridge = bridge();
        bridge.bus_mut().respond(&[0x00]).respond(&[5]);

        let mut uart = bridge.channel(ChannelId::Uart0).unwrap();
        assert_eq!(uart.available(), Ok(5));
        drop(uart);

        // SPAGE read plus a single RFCNT read
        let bus = bridge.bus();
        assert_eq!(bus.reads(), 2);
        assert_eq!(bus.ops[3], Op::write(0x50, &[0x0A]));
    }

    #[test]
    fn test_available_empty() {
        let mut bridge = bridge();
        bridge
            .bus_mut()
            .respond(&[0x00])
            .respond(&[0])
            .respond(&[Fsr::TDAT.bits()]);

        let mut uart = bridge.channel(ChannelId::Uart0).unwrap();
        assert_eq!(uart.available(), Ok(0));
        drop(uart);
        assert_eq!(bridge.bus().reads(), 3);
    }

    #[test]
    fn test_available_full_wraparound() {
        let mut bridge = bridge();
        bridge
            .bus_mut()
            .respond(&[0x00])
            .respond(&[0])
            .respond(&[Fsr::RDAT.bits()])
            .respond(&[0]);

        let mut uart = bridge.channel(ChannelId::Uart0).unwrap();
        assert_eq!(uart.available(), Ok(256));
    }

    #[test]
    fn test_available_bytes_arrived_between_samples() {
        let mut bridge = bridge();
        bridge
            .bus_mut()
            .respond(&[0x00])
            .respond(&[0])
            .respond(&[Fsr::RDAT.bits()])
            .respond(&[3]);

        let mut uart = bridge.channel(ChannelId::Uart0).unwrap();
        assert_eq!(uart.available(), Ok(3));
    }

    #[test]
    fn test_available_propagates_bus_error() {
        let mut bridge = bridge();
        bridge.bus_mut().respond(&[0x00]).respond(&[0]).fail_read();

        let mut uart = bridge.channel(ChannelId::Uart0).unwrap();
        assert_eq!(uart.available(), Err(Error::Bus));
    }

    #[test]
    fn test_peek_then_read() {
        let mut bridge = bridge();
        bridge.bus_mut().respond(&[0x00]).respond(&[b'X']);

        let mut uart = bridge.channel(ChannelId::Uart0).unwrap();
        assert_eq!(uart.peek(), Ok(b'X'));
        assert_eq!(uart.peek(), Ok(b'X'));
        assert!(uart.has_peeked());
        assert_eq!(uart.read_byte(), Ok(b'X'));
        assert!(!uart.has_peeked());
        drop(uart);

        // One SPAGE read and one FDAT read, nothing for the second peek or the read
        let bus = bridge.bus();
        assert_eq!(bus.reads(), 2);
        assert_eq!(bus.ops.len(), 5);
    }

    #[test]
    fn test_read_byte_without_peek() {
        let mut bridge = bridge();
        bridge
            .bus_mut()
            .respond(&[0x00])
            .respond(&[0x41])
            .respond(&[0x00])
            .respond(&[0x42]);

        let mut uart = bridge.channel(ChannelId::Uart0).unwrap();
        assert_eq!(uart.read_byte(), Ok(0x41));
        assert!(!uart.has_peeked());
        assert_eq!(uart.read_byte(), Ok(0x42));
    }

    #[test]
    fn test_write_byte_fifo_full() {
        let mut bridge = bridge();
        bridge
            .bus_mut()
            .respond(&[0x00])
            .respond(&[(Fsr::TFULL | Fsr::TDAT).bits()]);

        let mut uart = bridge.channel(ChannelId::Uart0).unwrap();
        assert_eq!(uart.write_byte(0x55), 0);
        drop(uart);

        let writes = bridge.bus().writes();
        assert!(writes.iter().all(|(_, data)| data[0] != 0x0D));
    }

    #[test]
    fn test_write_byte() {
        let mut bridge = bridge();
        bridge.bus_mut().respond(&[0x00]).respond(&[0x00]);

        let mut uart = bridge.channel(ChannelId::Uart0).unwrap();
        assert_eq!(uart.write_byte(0x55), 1);
        drop(uart);

        assert_eq!(bridge.bus().writes().last().unwrap(), &(0x50, vec![0x0D, 0x55]));
    }

    #[test]
    fn test_write_byte_bus_error_collapses_to_zero() {
        let mut bridge = bridge();
        bridge.bus_mut().fail_read();

        let mut uart = bridge.channel(ChannelId::Uart0).unwrap();
        assert_eq!(uart.write_byte(0x55), 0);
    }

    #[test]
    fn test_try_write_byte_distinguishes_full() {
        let mut bridge = bridge();
        bridge
            .bus_mut()
            .respond(&[0x00])
            .respond(&[Fsr::TFULL.bits()])
            .fail_read();

        let mut uart = bridge.channel(ChannelId::Uart0).unwrap();
        assert_eq!(uart.try_write_byte(0x55), Ok(false));
        assert_eq!(uart.try_write_byte(0x55), Err(Error::Bus));
    }

    #[test]
    fn test_fifo_zero_length() {
        let bridge = bridge();
        let mut uart = bridge.channel(ChannelId::Uart1).unwrap();
        assert_eq!(uart.fifo_read(&mut []), 0);
        assert_eq!(uart.fifo_write(&[]), 0);
        drop(uart);
        assert!(bridge.bus().ops.is_empty());
    }

    #[test]
    fn test_fifo_read_chunks() {
        let mut bridge = bridge();
        bridge.bus_mut().max_len = 4;
        bridge
            .bus_mut()
            .respond(&[1, 2, 3, 4])
            .respond(&[5, 6, 7, 8])
            .respond(&[9, 10]);

        let mut uart = bridge.channel(ChannelId::Uart1).unwrap();
        let mut buf = [0u8; 10];
        assert_eq!(uart.fifo_read(&mut buf), 10);
        assert_eq!(buf, [1, 2, 3, 4, 5, 6, 7, 8, 9, 10]);
        drop(uart);

        assert_eq!(
            bridge.bus().ops,
            [Op::read(0x53, 4), Op::read(0x53, 4), Op::read(0x53, 2)]
        );
    }

    #[test]
    fn test_fifo_read_short() {
        let mut bridge = bridge();
        bridge.bus_mut().respond(&[1, 2, 3]);

        let mut uart = bridge.channel(ChannelId::Uart1).unwrap();
        let mut buf = [0u8; 8];
        // Second read gets nothing back
        assert_eq!(uart.fifo_read(&mut buf), 3);
        assert_eq!(&buf[..3], &[1, 2, 3]);
    }

    #[test]
    fn test_fifo_write_chunks_and_short() {
        let mut bridge = bridge();
        bridge.bus_mut().max_len = 3;
        bridge.bus_mut().fail_write(2);

        let mut uart = bridge.channel(ChannelId::Uart1).unwrap();
        assert_eq!(uart.fifo_write(&[1, 2, 3, 4, 5, 6, 7]), 6);
        drop(uart);

        assert_eq!(
            bridge.bus().writes(),
            [
                (0x53, vec![1, 2, 3]),
                (0x53, vec![4, 5, 6]),
                (0x53, vec![7]),
            ]
        );
    }

    #[test]
    fn test_transmit_fifo_level() {
        let mut bridge = bridge();
        bridge
            .bus_mut()
            .respond(&[0x00])
            .respond(&[0])
            .respond(&[Fsr::TFULL.bits()])
            .respond(&[0x00])
            .respond(&[0])
            .respond(&[0x00])
            .respond(&[0x00])
            .respond(&[10]);

        let mut uart = bridge.channel(ChannelId::Uart0).unwrap();
        assert_eq!(uart.transmit_fifo_level(), Ok(256));
        assert_eq!(uart.transmit_fifo_level(), Ok(0));
        assert_eq!(uart.transmit_free(), Ok(246));
    }

    #[test]
    fn test_flush() {
        let mut bridge = bridge();
        bridge
            .bus_mut()
            .respond(&[0x00])
            .respond(&[(Fsr::TDAT | Fsr::TBUSY).bits()])
            .respond(&[Fsr::TBUSY.bits()])
            .respond(&[Fsr::RDAT.bits()]);

        let mut uart = bridge.channel(ChannelId::Uart0).unwrap();
        assert_eq!(uart.flush(), Ok(()));
        drop(uart);
        assert_eq!(bridge.bus().reads(), 4);
    }

    #[test]
    fn test_channels_interleave() {
        let mut bridge = bridge();
        bridge
            .bus_mut()
            .respond(&[0x00])
            .respond(&[7])
            .respond(&[0x00])
            .respond(&[9]);

        let (mut uart0, mut uart1) = bridge.split().unwrap();
        assert_eq!(uart0.available(), Ok(7));
        assert_eq!(uart1.available(), Ok(9));
        drop((uart0, uart1));

        let bus = bridge.bus();
        assert_eq!(bus.ops[0], Op::write(0x50, &[0x03]));
        assert_eq!(bus.ops[5], Op::write(0x52, &[0x03]));
    }
}
