use anyhow::Result;

use crate::daemon::storage::{
    activity_storage::ActivityStorage, entities::ActivityEntity, record_event::StayRecordEvent,
};

use super::module::EventProcessor;

/// Bridges [ProcessingModule](super::ProcessingModule) and [ActivityStorage]. Every record is
/// written right away, so there's nothing to flush on shutdown.
pub struct ActivitySaver<S: ActivityStorage> {
    storage: S,
}

impl<S: ActivityStorage> ActivitySaver<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }
}

impl<S: ActivityStorage> EventProcessor for ActivitySaver<S> {
    async fn process_next(&mut self, message: StayRecordEvent) -> Result<()> {
        self.storage
            .append(ActivityEntity::new(
                message.location,
                message.event_type,
                message.started_at,
                message.ended_at,
            ))
            .await
    }

    async fn finalize(&mut self) -> Result<()> {
        Ok(())
    }
}
