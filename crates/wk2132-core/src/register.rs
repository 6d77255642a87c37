//! WK2132 register map
//!
//! Global registers are reached at the device base address. Channel
//! registers share a 4-bit address space that is split into two pages by
//! bit 0 of `SPAGE`.

use bitflags::bitflags;

/// Mask of the bits a channel register address may use
pub const CHANNEL_REGISTER_MASK: u8 = 0x0F;

/// Depth of each hardware FIFO in bytes
pub const FIFO_DEPTH: usize = 256;

/// Device-global registers (affect both channels)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum GlobalRegister {
    /// GENA - global channel clock enable
    Gena = 0x00,
    /// GRST - global channel soft reset
    Grst = 0x01,
    /// GMUT - global master UART control
    Gmut = 0x02,
    /// GIER - global interrupt enable
    Gier = 0x10,
    /// GIFR - global interrupt flags
    Gifr = 0x11,
}

impl GlobalRegister {
    /// Register address on the bus
    pub const fn addr(self) -> u8 {
        self as u8
    }

    /// Short datasheet name
    pub const fn name(self) -> &'static str {
        match self {
            Self::Gena => "GENA",
            Self::Grst => "GRST",
            Self::Gmut => "GMUT",
            Self::Gier => "GIER",
            Self::Gifr => "GIFR",
        }
    }
}

/// Register page of a channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Page {
    /// Runtime status and control registers
    #[default]
    Page0,
    /// Baud rate configuration registers
    Page1,
}

/// Per-channel registers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelRegister {
    /// SPAGE - page select (visible on both pages)
    Spage,
    /// SCR - channel control (page 0)
    Scr,
    /// LCR - line configuration (page 0)
    Lcr,
    /// FCR - FIFO control (page 0)
    Fcr,
    /// TFCNT - transmit FIFO count (page 0)
    Tfcnt,
    /// RFCNT - receive FIFO count (page 0)
    Rfcnt,
    /// FSR - FIFO status (page 0)
    Fsr,
    /// LSR - line status (page 0)
    Lsr,
    /// FDAT - FIFO data (page 0)
    Fdat,
    /// BAUD1 - baud divisor high byte (page 1)
    Baud1,
    /// BAUD0 - baud divisor low byte (page 1)
    Baud0,
    /// PRES - baud divisor fraction (page 1)
    Pres,
}

impl ChannelRegister {
    /// Page 0 registers in address order, for dumps
    pub const PAGE0: [ChannelRegister; 8] = [
        Self::Scr,
        Self::Lcr,
        Self::Fcr,
        Self::Tfcnt,
        Self::Rfcnt,
        Self::Fsr,
        Self::Lsr,
        Self::Fdat,
    ];

    /// Register address within the channel's 4-bit space
    pub const fn addr(self) -> u8 {
        match self {
            Self::Spage => 0x3,
            Self::Scr => 0x4,
            Self::Lcr => 0x5,
            Self::Fcr => 0x6,
            Self::Tfcnt => 0x9,
            Self::Rfcnt => 0xA,
            Self::Fsr => 0xB,
            Self::Lsr => 0xC,
            Self::Fdat => 0xD,
            Self::Baud1 => 0x4,
            Self::Baud0 => 0x5,
            Self::Pres => 0x6,
        }
    }

    /// Page the register lives on, or `None` for SPAGE itself
    pub const fn page(self) -> Option<Page> {
        match self {
            Self::Spage => None,
            Self::Baud1 | Self::Baud0 | Self::Pres => Some(Page::Page1),
            _ => Some(Page::Page0),
        }
    }

    /// Short datasheet name
    pub const fn name(self) -> &'static str {
        match self {
            Self::Spage => "SPAGE",
            Self::Scr => "SCR",
            Self::Lcr => "LCR",
            Self::Fcr => "FCR",
            Self::Tfcnt => "TFCNT",
            Self::Rfcnt => "RFCNT",
            Self::Fsr => "FSR",
            Self::Lsr => "LSR",
            Self::Fdat => "FDAT",
            Self::Baud1 => "BAUD1",
            Self::Baud0 => "BAUD0",
            Self::Pres => "PRES",
        }
    }

    /// Whether reading this register has side effects on the FIFO
    pub const fn is_destructive_read(self) -> bool {
        matches!(self, Self::Fdat)
    }
}

/// Check that a raw address fits the channel register space
pub const fn is_valid_channel_register(addr: u8) -> bool {
    addr & !CHANNEL_REGISTER_MASK == 0
}

bitflags! {
    /// SPAGE register bits
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Spage: u8 {
        /// Select page 1 when set
        const PAGE = 1 << 0;
    }
}

bitflags! {
    /// SCR - channel control register
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Scr: u8 {
        /// Receiver enable
        const RXEN    = 1 << 0;
        /// Transmitter enable
        const TXEN    = 1 << 1;
        /// Sleep enable
        const SLEEPEN = 1 << 2;
    }
}

bitflags! {
    /// FCR - FIFO control register
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Fcr: u8 {
        /// Reset the receive FIFO
        const RFRST = 1 << 0;
        /// Reset the transmit FIFO
        const TFRST = 1 << 1;
        /// Enable the receive FIFO
        const RFEN  = 1 << 2;
        /// Enable the transmit FIFO
        const TFEN  = 1 << 3;
    }
}

bitflags! {
    /// FSR - FIFO status register
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Fsr: u8 {
        /// Transmitter busy shifting out a byte
        const TBUSY = 1 << 0;
        /// Transmit FIFO full
        const TFULL = 1 << 1;
        /// Transmit FIFO not empty
        const TDAT  = 1 << 2;
        /// Receive FIFO not empty
        const RDAT  = 1 << 3;
        /// Parity error in receive FIFO
        const RFPE  = 1 << 4;
        /// Framing error in receive FIFO
        const RFFE  = 1 << 5;
        /// Line break in receive FIFO
        const RFBI  = 1 << 6;
        /// Receive FIFO overrun
        const RFOE  = 1 << 7;

        /// Any receive error flag
        const RX_ERRORS = Self::RFPE.bits() | Self::RFFE.bits()
            | Self::RFBI.bits() | Self::RFOE.bits();
    }
}

bitflags! {
    /// LSR - line status register
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Lsr: u8 {
        /// Overrun error
        const OE = 1 << 0;
        /// Break detected
        const BI = 1 << 1;
        /// Framing error
        const FE = 1 << 2;
        /// Parity error
        const PE = 1 << 3;
    }
}

/// FCR value written by `begin`: reset RX FIFO, enable both FIFOs
pub const FCR_BEGIN: Fcr = Fcr::RFRST.union(Fcr::RFEN).union(Fcr::TFEN);

/// SCR value written by `begin`: receiver and transmitter on
pub const SCR_BEGIN: Scr = Scr::RXEN.union(Scr::TXEN);
