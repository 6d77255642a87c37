//! Bridge device
//!
//! [`Wk2132`] owns the bus and the device-wide configuration. Channels are
//! handed out as [`Channel`] handles that borrow the device, so a channel
//! can never outlive the bridge it belongs to. All transactions of both
//! channels serialize on the single bus held here.

use core::cell::{Cell, Ref, RefCell};

use crate::addressing::{self, ChannelId};
use crate::bus::{self, I2cMaster};
use crate::channel::Channel;
use crate::error::{Error, Result};
use crate::register::GlobalRegister;

/// Lowest supported crystal frequency
pub const MIN_FREQUENCY_HZ: u32 = 1_843_200;

/// Highest supported crystal frequency
pub const MAX_FREQUENCY_HZ: u32 = 14_745_600;

/// Device-wide configuration, fixed once set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BridgeConfig {
    /// Crystal frequency in Hz
    pub frequency_hz: u32,
    /// 7-bit base address (global registers)
    pub base_address: u8,
}

impl BridgeConfig {
    /// Validate the frequency and derive the base address from the
    /// address-select pins
    pub fn new(frequency_hz: u32, ia0: bool, ia1: bool) -> Result<Self> {
        if !(MIN_FREQUENCY_HZ..=MAX_FREQUENCY_HZ).contains(&frequency_hz) {
            return Err(Error::FrequencyOutOfRange);
        }

        Ok(Self {
            frequency_hz,
            base_address: addressing::base_address(ia0, ia1),
        })
    }
}

/// WK2132 bridge on an I2C bus
pub struct Wk2132<B: I2cMaster> {
    bus: RefCell<B>,
    config: Option<BridgeConfig>,
    /// Bitmask of channels with a live handle
    claimed: Cell<u8>,
}

impl<B: I2cMaster> Wk2132<B> {
    /// Create an unconfigured bridge on `bus`
    ///
    /// No bus traffic happens until a channel is used.
    pub fn new(bus: B) -> Self {
        Self {
            bus: RefCell::new(bus),
            config: None,
            claimed: Cell::new(0),
        }
    }

    /// Create and configure in one step
    pub fn with_config(bus: B, frequency_hz: u32, ia0: bool, ia1: bool) -> Result<Self> {
        let mut bridge = Self::new(bus);
        bridge.configure(frequency_hz, ia0, ia1)?;
        Ok(bridge)
    }

    /// Set the crystal frequency and address-select pins
    ///
    /// The frequency must lie in `MIN_FREQUENCY_HZ..=MAX_FREQUENCY_HZ`.
    /// Configuration happens once; a second call fails with
    /// [`Error::AlreadyConfigured`]. Nothing is sent on the bus.
    pub fn configure(&mut self, frequency_hz: u32, ia0: bool, ia1: bool) -> Result<()> {
        let config = BridgeConfig::new(frequency_hz, ia0, ia1)?;
        if self.config.is_some() {
            return Err(Error::AlreadyConfigured);
        }

        log::debug!(
            "wk2132: configured at 0x{:02X}, crystal {} Hz",
            config.base_address,
            config.frequency_hz
        );
        self.config = Some(config);
        Ok(())
    }

    /// Current configuration, if any
    pub fn config(&self) -> Option<BridgeConfig> {
        self.config
    }

    /// Crystal frequency in Hz
    pub fn frequency_hz(&self) -> Result<u32> {
        self.config
            .map(|c| c.frequency_hz)
            .ok_or(Error::NotConfigured)
    }

    /// Base address (global registers)
    pub fn base_address(&self) -> Result<u8> {
        self.config
            .map(|c| c.base_address)
            .ok_or(Error::NotConfigured)
    }

    /// Read a device-global register
    pub fn read_global(&self, reg: GlobalRegister) -> Result<u8> {
        let address = self.base_address()?;
        self.with_bus(|bus| bus::read_register(bus, address, reg.addr()))
    }

    /// Write a device-global register
    pub fn write_global(&self, reg: GlobalRegister, value: u8) -> Result<()> {
        let address = self.base_address()?;
        self.with_bus(|bus| bus::write_register(bus, address, reg.addr(), value))
    }

    /// Read-modify-write a device-global register, returning the new value
    pub fn modify_global<F>(&self, reg: GlobalRegister, f: F) -> Result<u8>
    where
        F: FnOnce(u8) -> u8,
    {
        let value = f(self.read_global(reg)?);
        self.write_global(reg, value)?;
        Ok(value)
    }

    /// Turn on a channel's clock, leaving the other channel untouched
    pub fn enable_channel(&self, id: ChannelId) -> Result<()> {
        let gena = self.modify_global(GlobalRegister::Gena, |v| v | id.global_bit())?;
        log::debug!("wk2132: {} enabled (GENA=0x{:02X})", id, gena);
        Ok(())
    }

    /// Soft-reset a channel, leaving the other channel untouched
    ///
    /// The reset bit clears itself once the chip has finished.
    pub fn reset_channel(&self, id: ChannelId) -> Result<()> {
        let grst = self.modify_global(GlobalRegister::Grst, |v| v | id.global_bit())?;
        log::debug!("wk2132: {} reset (GRST=0x{:02X})", id, grst);
        Ok(())
    }

    /// Read all global registers, for diagnostics
    pub fn dump_globals(&self) -> Result<[(GlobalRegister, u8); 5]> {
        let regs = [
            GlobalRegister::Gena,
            GlobalRegister::Grst,
            GlobalRegister::Gmut,
            GlobalRegister::Gier,
            GlobalRegister::Gifr,
        ];
        let mut out = [(GlobalRegister::Gena, 0u8); 5];
        for (slot, reg) in out.iter_mut().zip(regs) {
            *slot = (reg, self.read_global(reg)?);
        }
        Ok(out)
    }

    /// Claim the handle for one channel
    ///
    /// Fails with [`Error::ChannelInUse`] while another handle for the same
    /// channel is alive.
    pub fn channel(&self, id: ChannelId) -> Result<Channel<'_, B>> {
        let claimed = self.claimed.get();
        if claimed & id.global_bit() != 0 {
            return Err(Error::ChannelInUse);
        }
        self.claimed.set(claimed | id.global_bit());
        Ok(Channel::new(self, id))
    }

    /// Claim both channels at once
    pub fn split(&self) -> Result<(Channel<'_, B>, Channel<'_, B>)> {
        let uart0 = self.channel(ChannelId::Uart0)?;
        let uart1 = self.channel(ChannelId::Uart1)?;
        Ok((uart0, uart1))
    }

    /// Shared view of the bus
    ///
    /// Channel operations made while the view is held fail with
    /// [`Error::Bus`].
    pub fn bus(&self) -> Ref<'_, B> {
        self.bus.borrow()
    }

    /// Exclusive access to the bus (no channel handles may be alive)
    pub fn bus_mut(&mut self) -> &mut B {
        self.bus.get_mut()
    }

    /// Tear down the driver and give the bus back
    pub fn release(self) -> B {
        self.bus.into_inner()
    }

    /// Run one or more transactions with exclusive bus access
    ///
    /// The borrow never outlives the closure, so both channels can
    /// interleave operations freely on a single thread.
    pub(crate) fn with_bus<R, F>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&mut B) -> Result<R>,
    {
        let mut bus = self.bus.try_borrow_mut().map_err(|_| {
            log::debug!("wk2132: bus is borrowed elsewhere");
            Error::Bus
        })?;
        f(&mut bus)
    }

    pub(crate) fn release_channel(&self, id: ChannelId) {
        self.claimed.set(self.claimed.get() & !id.global_bit());
    }
}
