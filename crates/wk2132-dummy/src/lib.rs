//! wk2132-dummy - In-memory WK2132 emulator for testing
//!
//! This crate provides a bus that answers like a WK2132 bridge: global and
//! paged channel registers, 256-byte FIFOs with the real 8-bit counters,
//! and a "wire" behind each transmitter. It's useful for testing and
//! development without real hardware.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

use alloc::vec::Vec;
use heapless::Deque;

use wk2132_core::addressing::{self, ChannelId};
use wk2132_core::bus::I2cMaster;
use wk2132_core::error::{Error, Result};
use wk2132_core::register::{Fcr, Fsr, Scr, Spage, FIFO_DEPTH};

/// Configuration for the dummy bridge
#[derive(Debug, Clone)]
pub struct DummyConfig {
    /// Level of the IA0 strapping pin
    pub ia0: bool,
    /// Level of the IA1 strapping pin
    pub ia1: bool,
    /// Feed every transmitted byte back into the same channel's receiver
    pub loopback: bool,
    /// Keep transmitted bytes in the FIFO until `transmit` is called
    pub hold_tx: bool,
    /// Largest payload per transaction
    pub max_transfer_len: usize,
}

impl Default for DummyConfig {
    fn default() -> Self {
        Self {
            ia0: false,
            ia1: false,
            loopback: false,
            hold_tx: false,
            max_transfer_len: 32,
        }
    }
}

/// Transaction counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BusStats {
    /// Write transactions addressed to the bridge
    pub writes: usize,
    /// Read transactions addressed to the bridge
    pub reads: usize,
    /// Transactions nobody acknowledged
    pub nacks: usize,
}

impl BusStats {
    /// All transactions seen
    pub fn total(&self) -> usize {
        self.writes + self.reads + self.nacks
    }
}

/// State of one emulated sub-UART
struct DummyUart {
    spage: u8,
    scr: u8,
    lcr: u8,
    fcr: u8,
    baud1: u8,
    baud0: u8,
    pres: u8,
    lsr: u8,
    rx_overrun: bool,
    rx: Deque<u8, FIFO_DEPTH>,
    tx: Deque<u8, FIFO_DEPTH>,
    /// Bytes that left the transmitter
    wire: Vec<u8>,
}

impl DummyUart {
    fn new() -> Self {
        Self {
            spage: 0,
            scr: 0,
            lcr: 0,
            fcr: 0,
            baud1: 0,
            baud0: 0,
            pres: 0,
            lsr: 0,
            rx_overrun: false,
            rx: Deque::new(),
            tx: Deque::new(),
            wire: Vec::new(),
        }
    }

    fn page1(&self) -> bool {
        Spage::from_bits_retain(self.spage).contains(Spage::PAGE)
    }

    fn rx_enabled(&self) -> bool {
        Scr::from_bits_retain(self.scr).contains(Scr::RXEN)
    }

    fn tx_enabled(&self) -> bool {
        Scr::from_bits_retain(self.scr).contains(Scr::TXEN)
    }

    fn fsr(&self) -> Fsr {
        let mut fsr = Fsr::empty();
        fsr.set(Fsr::TFULL, self.tx.is_full());
        fsr.set(Fsr::TDAT, !self.tx.is_empty());
        fsr.set(Fsr::RDAT, !self.rx.is_empty());
        fsr.set(Fsr::RFOE, self.rx_overrun);
        fsr
    }

    fn receive(&mut self, byte: u8) {
        if self.rx.push_back(byte).is_err() {
            self.rx_overrun = true;
        }
    }

    fn read_reg(&mut self, reg: u8) -> u8 {
        match (reg, self.page1()) {
            (0x3, _) => self.spage,
            (0x4, false) => self.scr,
            (0x5, false) => self.lcr,
            (0x6, false) => self.fcr,
            // 8-bit counters wrap at a full FIFO
            (0x9, false) => self.tx.len() as u8,
            (0xA, false) => self.rx.len() as u8,
            (0xB, false) => self.fsr().bits(),
            (0xC, false) => self.lsr,
            (0xD, false) => {
                let byte = self.rx.pop_front().unwrap_or(0);
                if self.rx.is_empty() {
                    self.rx_overrun = false;
                }
                byte
            }
            (0x4, true) => self.baud1,
            (0x5, true) => self.baud0,
            (0x6, true) => self.pres,
            _ => 0,
        }
    }

    fn write_reg(&mut self, reg: u8, value: u8) {
        match (reg, self.page1()) {
            (0x3, _) => self.spage = value,
            (0x4, false) => self.scr = value,
            (0x5, false) => self.lcr = value,
            (0x6, false) => {
                let fcr = Fcr::from_bits_retain(value);
                if fcr.contains(Fcr::RFRST) {
                    self.rx.clear();
                    self.rx_overrun = false;
                }
                if fcr.contains(Fcr::TFRST) {
                    self.tx.clear();
                }
                // Reset bits clear themselves
                self.fcr = fcr.difference(Fcr::RFRST | Fcr::TFRST).bits();
            }
            (0xD, false) => self.queue_tx(value),
            (0x4, true) => self.baud1 = value,
            (0x5, true) => self.baud0 = value,
            (0x6, true) => self.pres = value,
            _ => log::trace!("dummy: write to read-only register 0x{:X} ignored", reg),
        }
    }

    fn queue_tx(&mut self, byte: u8) {
        if !self.tx_enabled() {
            return;
        }
        // A full FIFO drops the byte like the hardware does
        let _ = self.tx.push_back(byte);
    }

    /// Move everything in the transmit FIFO onto the wire
    fn transmit(&mut self, loopback: bool) {
        while let Some(byte) = self.tx.pop_front() {
            self.wire.push(byte);
            if loopback && self.rx_enabled() {
                self.receive(byte);
            }
        }
    }
}

/// Register picked by the last register-select write
#[derive(Debug, Clone, Copy)]
enum Selected {
    Global(u8),
    Channel(u8),
}

/// Emulated WK2132 bridge
///
/// Implements [`I2cMaster`] so the real driver can run against it.
pub struct DummyBridge {
    config: DummyConfig,
    base: u8,
    gena: u8,
    gmut: u8,
    gier: u8,
    gifr: u8,
    selected: Selected,
    uarts: [DummyUart; 2],
    stats: BusStats,
    fail_next: bool,
}

impl DummyBridge {
    /// Create a dummy bridge with the given configuration
    pub fn new(config: DummyConfig) -> Self {
        let base = addressing::base_address(config.ia0, config.ia1);
        Self {
            config,
            base,
            gena: 0,
            gmut: 0,
            gier: 0,
            gifr: 0,
            selected: Selected::Global(0),
            uarts: [DummyUart::new(), DummyUart::new()],
            stats: BusStats::default(),
            fail_next: false,
        }
    }

    /// Create a dummy bridge with default configuration (address 0x10)
    pub fn new_default() -> Self {
        Self::new(DummyConfig::default())
    }

    /// Get the configuration
    pub fn config(&self) -> &DummyConfig {
        &self.config
    }

    /// Transaction counters
    pub fn stats(&self) -> BusStats {
        self.stats
    }

    /// Make the next transaction fail as if it was not acknowledged
    pub fn fail_next_transaction(&mut self) {
        self.fail_next = true;
    }

    /// Simulate bytes arriving on a channel's RX line
    ///
    /// Bytes are dropped (and overrun flagged) when the receiver is
    /// disabled or the FIFO is full. Returns the number accepted.
    pub fn inject_rx(&mut self, channel: ChannelId, data: &[u8]) -> usize {
        let uart = &mut self.uarts[channel.index() as usize];
        if !uart.rx_enabled() {
            return 0;
        }
        let before = uart.rx.len();
        for &byte in data {
            uart.receive(byte);
        }
        uart.rx.len() - before
    }

    /// Let a channel's transmitter send everything queued
    pub fn transmit(&mut self, channel: ChannelId) {
        let loopback = self.config.loopback;
        self.uarts[channel.index() as usize].transmit(loopback);
    }

    /// Take the bytes a channel has put on its TX line so far
    pub fn take_wire(&mut self, channel: ChannelId) -> Vec<u8> {
        core::mem::take(&mut self.uarts[channel.index() as usize].wire)
    }

    /// Bytes waiting in a channel's receive FIFO
    pub fn rx_len(&self, channel: ChannelId) -> usize {
        self.uarts[channel.index() as usize].rx.len()
    }

    /// Bytes waiting in a channel's transmit FIFO
    pub fn tx_len(&self, channel: ChannelId) -> usize {
        self.uarts[channel.index() as usize].tx.len()
    }

    /// Whether GENA has the channel's clock enabled
    pub fn is_enabled(&self, channel: ChannelId) -> bool {
        self.gena & channel.global_bit() != 0
    }

    /// Raw SPAGE of a channel
    pub fn spage(&self, channel: ChannelId) -> u8 {
        self.uarts[channel.index() as usize].spage
    }

    /// Force SPAGE of a channel (reserved bits included)
    pub fn set_spage(&mut self, channel: ChannelId, value: u8) {
        self.uarts[channel.index() as usize].spage = value;
    }

    /// Baud registers (BAUD1, BAUD0, PRES) of a channel
    pub fn baud_registers(&self, channel: ChannelId) -> (u8, u8, u8) {
        let uart = &self.uarts[channel.index() as usize];
        (uart.baud1, uart.baud0, uart.pres)
    }

    /// SCR of a channel
    pub fn scr(&self, channel: ChannelId) -> u8 {
        self.uarts[channel.index() as usize].scr
    }

    /// Decode a bus address into (channel, fifo access)
    fn decode(&self, address: u8) -> Option<(usize, bool)> {
        if address & !0x03 != self.base {
            return None;
        }
        Some((((address >> 1) & 1) as usize, address & 1 != 0))
    }

    fn is_global(reg: u8) -> bool {
        reg < 0x3 || reg >= 0x10
    }

    fn read_global(&self, reg: u8) -> u8 {
        match reg {
            0x00 => self.gena,
            // Channel resets complete immediately
            0x01 => 0,
            0x02 => self.gmut,
            0x10 => self.gier,
            0x11 => self.gifr,
            _ => 0,
        }
    }

    fn write_global(&mut self, reg: u8, value: u8) {
        match reg {
            0x00 => self.gena = value & 0x03,
            0x01 => {
                for id in ChannelId::ALL {
                    if value & id.global_bit() != 0 {
                        log::debug!("dummy: reset {}", id);
                        let wire = core::mem::take(&mut self.uarts[id.index() as usize].wire);
                        self.uarts[id.index() as usize] = DummyUart::new();
                        self.uarts[id.index() as usize].wire = wire;
                    }
                }
            }
            0x02 => self.gmut = value,
            0x10 => self.gier = value,
            0x11 => self.gifr &= !value,
            _ => {}
        }
    }

    fn accept(&mut self, address: u8) -> Result<(usize, bool)> {
        if self.fail_next {
            self.fail_next = false;
            self.stats.nacks += 1;
            return Err(Error::Bus);
        }
        match self.decode(address) {
            Some(target) => Ok(target),
            None => {
                log::trace!("dummy: NACK for address 0x{:02X}", address);
                self.stats.nacks += 1;
                Err(Error::Bus)
            }
        }
    }

    fn settle(&mut self, channel: usize) {
        if !self.config.hold_tx {
            let loopback = self.config.loopback;
            self.uarts[channel].transmit(loopback);
        }
    }
}

impl I2cMaster for DummyBridge {
    fn max_transfer_len(&self) -> usize {
        self.config.max_transfer_len
    }

    fn write(&mut self, address: u8, data: &[u8]) -> Result<()> {
        let (channel, fifo) = self.accept(address)?;
        self.stats.writes += 1;

        if fifo {
            for &byte in data {
                self.uarts[channel].queue_tx(byte);
            }
        } else if let Some((&reg, values)) = data.split_first() {
            if Self::is_global(reg) {
                self.selected = Selected::Global(reg);
                for &value in values {
                    self.write_global(reg, value);
                }
            } else {
                let reg = reg & 0x0F;
                self.selected = Selected::Channel(reg);
                for &value in values {
                    self.uarts[channel].write_reg(reg, value);
                }
            }
        }

        self.settle(channel);
        Ok(())
    }

    fn read(&mut self, address: u8, buf: &mut [u8]) -> Result<usize> {
        let (channel, fifo) = self.accept(address)?;
        self.stats.reads += 1;

        if fifo {
            let uart = &mut self.uarts[channel];
            let mut n = 0;
            while n < buf.len() {
                match uart.rx.pop_front() {
                    Some(byte) => {
                        buf[n] = byte;
                        n += 1;
                    }
                    None => break,
                }
            }
            return Ok(n);
        }

        for slot in buf.iter_mut() {
            *slot = match self.selected {
                Selected::Global(reg) => self.read_global(reg),
                Selected::Channel(reg) => self.uarts[channel].read_reg(reg),
            };
        }
        Ok(buf.len())
    }
}

/// Parse dummy bus options from a list of key-value pairs
///
/// Recognised keys: `loopback`, `hold_tx`, `chunk` (transaction size).
pub fn parse_options(
    options: &[(&str, &str)],
) -> core::result::Result<DummyConfig, alloc::string::String> {
    use alloc::format;

    fn flag(key: &str, value: &str) -> core::result::Result<bool, alloc::string::String> {
        match value {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(format!("Invalid {} value: {}", key, value)),
        }
    }

    let mut config = DummyConfig::default();
    for (key, value) in options {
        match *key {
            "loopback" => config.loopback = flag(key, value)?,
            "hold_tx" => config.hold_tx = flag(key, value)?,
            "chunk" => {
                let chunk: usize = value
                    .parse()
                    .map_err(|_| format!("Invalid chunk value: {}", value))?;
                if chunk == 0 {
                    return Err("chunk must be at least 1".into());
                }
                config.max_transfer_len = chunk;
            }
            _ => log::warn!("dummy: Unknown option: {}={}", key, value),
        }
    }
    Ok(config)
}
