use super::events::DerivedEvent;

/// Receiver of everything the pipeline produces.
///
/// Implementations must not block, the pipeline calls them inline for every sample. A sink that
/// can't deliver right now should drop the event and log it.
pub trait EventSink: Send {
    fn on_event(&mut self, event: &DerivedEvent);

    /// Instantaneous speed of every ingested sample. Most sinks don't care.
    fn on_speed(&mut self, _speed: f64) {}
}

impl<F> EventSink for F
where
    F: FnMut(&DerivedEvent) + Send,
{
    fn on_event(&mut self, event: &DerivedEvent) {
        self(event)
    }
}
