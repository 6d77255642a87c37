//! Bus address derivation
//!
//! The WK2132 answers on a small block of 7-bit addresses:
//!
//! ```text
//!   bit  6    5    4    3    2    1    0
//!       IA1  IA0   1    0    0   CH  FIFO
//! ```
//!
//! `IA1`/`IA0` are strapping pins, bit 4 is the fixed device-class code,
//! `CH` selects the channel and `FIFO` switches between the control
//! registers and the data FIFO. Global registers live at the base address
//! with both low bits clear.

use core::fmt;

/// Fixed device-class bits of every WK2132 address
pub const DEVICE_CLASS_CODE: u8 = 0x10;

/// Mask of the address bits that depend on the strapping pins
pub const STRAP_MASK: u8 = 0x60;

/// One of the two UART channels of the bridge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ChannelId {
    /// First channel (sub-UART 1 in the datasheet)
    Uart0 = 0,
    /// Second channel (sub-UART 2 in the datasheet)
    Uart1 = 1,
}

impl ChannelId {
    /// Both channels, in index order
    pub const ALL: [ChannelId; 2] = [ChannelId::Uart0, ChannelId::Uart1];

    /// Numeric index (0 or 1)
    pub const fn index(self) -> u8 {
        self as u8
    }

    /// Look up a channel by numeric index
    pub const fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(Self::Uart0),
            1 => Some(Self::Uart1),
            _ => None,
        }
    }

    /// This channel's bit in the global enable and reset registers
    pub const fn global_bit(self) -> u8 {
        1 << self.index()
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "uart{}", self.index())
    }
}

/// Which of a channel's two addresses a transaction targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Control/status registers (page selected via SPAGE)
    Register,
    /// Bulk data FIFO
    Fifo,
}

/// Compute the base address from the two address-select pins
pub const fn base_address(ia0: bool, ia1: bool) -> u8 {
    ((ia1 as u8) << 6) | ((ia0 as u8) << 5) | DEVICE_CLASS_CODE
}

/// Compute the address a channel transaction must be sent to
///
/// This is evaluated for every transaction: global registers, channel
/// registers and the FIFO all share the same base.
pub const fn channel_address(base: u8, channel: ChannelId, access: Access) -> u8 {
    let address = base | (channel.index() << 1);
    match access {
        Access::Register => address,
        Access::Fifo => address | 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_address() {
        assert_eq!(base_address(false, false), 0x10);
        assert_eq!(base_address(true, false), 0x30);
        assert_eq!(base_address(false, true), 0x50);
        assert_eq!(base_address(true, true), 0x70);
    }

    #[test]
    fn test_base_address_keeps_class_code() {
        for ia0 in [false, true] {
            for ia1 in [false, true] {
                let base = base_address(ia0, ia1);
                assert_eq!(base & !STRAP_MASK, DEVICE_CLASS_CODE);
            }
        }
    }

    #[test]
    fn test_channel_address() {
        assert_eq!(channel_address(0x50, ChannelId::Uart0, Access::Register), 0x50);
        assert_eq!(channel_address(0x50, ChannelId::Uart0, Access::Fifo), 0x51);
        assert_eq!(channel_address(0x50, ChannelId::Uart1, Access::Register), 0x52);
        assert_eq!(channel_address(0x50, ChannelId::Uart1, Access::Fifo), 0x53);
    }

    #[test]
    fn test_channel_index_round_trip() {
        for id in ChannelId::ALL {
            assert_eq!(ChannelId::from_index(id.index()), Some(id));
        }
        assert_eq!(ChannelId::from_index(2), None);
        assert_eq!(ChannelId::Uart1.global_bit(), 0b10);
    }
}
