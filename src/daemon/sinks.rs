//! Sinks the daemon attaches to the ingestion pipeline.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{error, warn};

use crate::inference::{events::DerivedEvent, sink::EventSink};

use super::{board::TrackingBoard, storage::record_event::StayRecordEvent};

/// Publishes speed and a readable log of events to the [TrackingBoard].
pub struct BoardSink(pub Arc<TrackingBoard>);

impl EventSink for BoardSink {
    fn on_event(&mut self, event: &DerivedEvent) {
        self.0.record(event);
    }

    fn on_speed(&mut self, speed: f64) {
        self.0.set_speed(speed);
    }
}

/// Forwards stay records to the processing module.
///
/// Sample timestamps are seconds since the session start, `epoch` is the wall time of that
/// start.
pub struct ScheduleSink {
    next: mpsc::Sender<StayRecordEvent>,
    epoch: DateTime<Utc>,
}

impl ScheduleSink {
    pub fn new(next: mpsc::Sender<StayRecordEvent>, epoch: DateTime<Utc>) -> Self {
        Self { next, epoch }
    }

    fn wall_time(&self, timestamp: f64) -> DateTime<Utc> {
        self.epoch + Duration::milliseconds((timestamp * 1000.).round() as i64)
    }
}

impl EventSink for ScheduleSink {
    fn on_event(&mut self, event: &DerivedEvent) {
        let DerivedEvent::StayRecorded {
            place,
            started_at,
            duration_seconds,
            event_label,
            ..
        } = event
        else {
            return;
        };
        let record = StayRecordEvent {
            location: place.name.clone(),
            event_type: event_label.clone(),
            started_at: self.wall_time(*started_at),
            ended_at: self.wall_time(started_at + duration_seconds),
        };
        match self.next.try_send(record) {
            Ok(()) => {}
            Err(TrySendError::Full(record)) => {
                warn!("Processing is falling behind, dropping {record:?}")
            }
            Err(TrySendError::Closed(record)) => {
                error!("Processing module is gone, dropping {record:?}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{Duration, TimeZone, Utc};
    use tokio::sync::mpsc;

    use crate::inference::{
        events::{DerivedEvent, StayPhase},
        geo::Coordinate,
        places::Place,
        sink::EventSink,
    };

    use super::ScheduleSink;

    fn stay(duration_seconds: f64) -> DerivedEvent {
        DerivedEvent::StayRecorded {
            place: Arc::new(Place::new("home", "Home", Coordinate::new(31.0258, 121.4376))),
            started_at: 30.,
            duration_seconds,
            event_label: "stay".into(),
            phase: StayPhase::Reached,
        }
    }

    #[test]
    fn test_stay_is_forwarded_with_wall_times() {
        let epoch = Utc.with_ymd_and_hms(2018, 7, 4, 8, 0, 0).unwrap();
        let (sender, mut receiver) = mpsc::channel(4);
        let mut sink = ScheduleSink::new(sender, epoch);

        sink.on_event(&DerivedEvent::RunStarted { speed: 4. });
        sink.on_event(&stay(90.));

        let record = receiver.try_recv().unwrap();
        assert_eq!(&*record.location, "Home");
        assert_eq!(&*record.event_type, "stay");
        assert_eq!(record.started_at, epoch + Duration::seconds(30));
        assert_eq!(record.ended_at, epoch + Duration::seconds(120));
        assert!(receiver.try_recv().is_err());
    }

    #[test]
    fn test_full_or_closed_channel_drops_records() {
        let (sender, mut receiver) = mpsc::channel(1);
        let mut sink = ScheduleSink::new(sender, Utc::now());
        sink.on_event(&stay(60.));
        sink.on_event(&stay(70.));
        assert!(receiver.try_recv().is_ok());
        assert!(receiver.try_recv().is_err());

        drop(receiver);
        sink.on_event(&stay(80.));
    }
}
