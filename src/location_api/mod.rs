//! Sources of location fixes. [LocationProvider] is the contract a sensor integration has to
//! implement. Only a simulated provider exists for now.

pub mod simulated;

use anyhow::Result;

use crate::inference::sample::RawFix;

#[cfg_attr(test, mockall::automock)]
pub trait LocationProvider {
    /// Latest fix. Fields the provider couldn't determine stay empty, validation happens later.
    fn get_fix(&mut self) -> Result<RawFix>;
}
