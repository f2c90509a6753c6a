//! NOMAD math utilities.

pub mod math;

pub use math::polyfit::*;
pub use math::roots::*;
pub use math::stable::*;
