//! Daemon and cli that track where you spend your day. The daemon samples your location, infers
//! stays at known places and running segments, and records stays as activities. Everything can be
//! inspected through a terminal.
//!

pub mod cli;
pub mod context;
pub mod daemon;
pub mod inference;
pub mod location_api;
pub mod settings;
pub mod utils;
