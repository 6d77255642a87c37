//! Baud divisor calculator

use wk2132_core::baud::WARN_DEVIATION_PPM;
use wk2132_core::BaudDivisor;

/// Print the divisor registers for `baud` without touching any bus
pub fn run_baud(frequency: u32, baud: u32) -> Result<(), Box<dyn std::error::Error>> {
    let div = BaudDivisor::compute(frequency, baud)?;
    let ppm = div.deviation_ppm(frequency, baud);

    println!("Crystal:   {} Hz", frequency);
    println!("Requested: {} baud", baud);
    println!(
        "Registers: BAUD1=0x{:02X} BAUD0=0x{:02X} PRES=0x{:02X}",
        div.high, div.low, div.fraction
    );
    println!("Divisor:   {}.{}", div.divisor(), div.fraction);
    println!(
        "Actual:    {} baud ({}.{:02}% error)",
        div.actual_baud(frequency),
        ppm / 10_000,
        (ppm % 10_000) / 100
    );
    if ppm > WARN_DEVIATION_PPM {
        log::warn!("Deviation is above {} ppm, the link may be unreliable", WARN_DEVIATION_PPM);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_baud() {
        assert!(run_baud(11_059_200, 115_200).is_ok());
        assert!(run_baud(11_059_200, 0).is_err());
        assert!(run_baud(11_059_200, 1_000_000).is_err());
    }
}
