//! Register dump

use super::open_bridge;
use crate::cli::BridgeArgs;
use wk2132_core::register::{Fsr, Lsr};
use wk2132_core::BaudDivisor;

/// Dump the global registers and the selected channel's registers
pub fn run_status(args: &BridgeArgs) -> Result<(), Box<dyn std::error::Error>> {
    let bridge = open_bridge(args)?;

    println!("Global registers:");
    for (reg, value) in bridge.dump_globals()? {
        println!("  {:5} (0x{:02X}) = 0x{:02X}", reg.name(), reg.addr(), value);
    }

    let mut uart = bridge.channel(args.channel)?;
    let snap = uart.register_snapshot()?;

    println!();
    println!("Channel {}:", args.channel);
    println!("  SPAGE = 0x{:02X}", snap.spage);
    println!("  SCR   = 0x{:02X}", snap.scr);
    println!("  LCR   = 0x{:02X}", snap.lcr);
    println!("  FCR   = 0x{:02X}", snap.fcr);
    println!("  TFCNT = 0x{:02X}", snap.tfcnt);
    println!("  RFCNT = 0x{:02X}", snap.rfcnt);
    println!("  FSR   = 0x{:02X} {:?}", snap.fsr, Fsr::from_bits_truncate(snap.fsr));
    println!("  LSR   = 0x{:02X} {:?}", snap.lsr, Lsr::from_bits_truncate(snap.lsr));

    let div = BaudDivisor {
        high: snap.baud1,
        low: snap.baud0,
        fraction: snap.pres,
    };
    println!(
        "  BAUD1:BAUD0.PRES = 0x{:02X}:0x{:02X}.{} (~{} baud)",
        snap.baud1,
        snap.baud0,
        snap.pres,
        div.actual_baud(args.frequency)
    );
    Ok(())
}
