//! Things around the tracked day that come from outside sources: the weather driven color theme
//! and alarm based wake/sleep times. Both sources are stubs for now.

pub mod alarms;
pub mod weather;
