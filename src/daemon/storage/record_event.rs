use std::sync::Arc;

use chrono::{DateTime, Utc};

/// A stay that should end up in the activity log. Sent from the collection module to the
/// processing module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StayRecordEvent {
    pub location: Arc<str>,
    pub event_type: Arc<str>,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
}
