use anyhow::Result;

use crate::daemon::storage::record_event::StayRecordEvent;

/// Represents an event processor. Abstracts over where recorded stays end up.
pub trait EventProcessor {
    fn process_next(
        &mut self,
        message: StayRecordEvent,
    ) -> impl std::future::Future<Output = Result<()>>;

    fn finalize(&mut self) -> impl std::future::Future<Output = Result<()>>;
}
