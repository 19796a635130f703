//! Storage of the daemon's output.
//!  - `activities.json` holds every recorded stay as an [entities::ActivityEntity]. It's a single
//!    JSON document that gets rewritten on each change under an exclusive file lock.
//!  - `status.json` holds the latest [entities::StatusEntity], a snapshot of the tracking board
//!    that the cli reads.

pub mod activity_storage;
pub mod entities;
pub mod record_event;
pub mod status_storage;
