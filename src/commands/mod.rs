//! CLI command implementations
//!
//! Every command that talks to hardware opens the bus named on the command
//! line, wraps it in a configured [`Wk2132`] and claims one channel.

mod baud;
mod list;
mod status;
mod transfer;

pub use baud::run_baud;
pub use list::list_buses;
pub use status::run_status;
pub use transfer::{run_end, run_recv, run_send};

use crate::buses::{self, BoxedBus};
use crate::cli::BridgeArgs;
use wk2132_core::Wk2132;

/// Open the bus and configure the bridge described by `args`
pub fn open_bridge(args: &BridgeArgs) -> Result<Wk2132<BoxedBus>, Box<dyn std::error::Error>> {
    let bus = buses::open_bus(&args.bus, args.ia0, args.ia1)?;
    let bridge = Wk2132::with_config(bus, args.frequency, args.ia0, args.ia1)?;
    log::info!(
        "Bridge on {} at 0x{:02X} ({} Hz crystal)",
        args.bus,
        bridge.base_address()?,
        args.frequency
    );
    Ok(bridge)
}
