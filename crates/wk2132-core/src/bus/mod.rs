//! Bus transport abstractions
//!
//! This module defines the trait the driver uses to reach the bridge chip,
//! plus helpers shared by the register-level code.

mod traits;

pub use traits::*;
