use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Mutex, PoisonError,
    },
};

use chrono::Duration;

use crate::{
    context::weather::Theme,
    inference::events::DerivedEvent,
    utils::{clock::Clock, time::format_duration},
};

use super::storage::entities::{StatusEntity, TrackingLogEntry};

pub const TRACKING_LOG_CAPACITY: usize = 20;

/// Live view of the tracking session. Written by the collection module through
/// [super::sinks::BoardSink], read by the status writer.
pub struct TrackingBoard {
    speed: AtomicU64,
    log: Mutex<VecDeque<TrackingLogEntry>>,
    clock: Arc<dyn Clock>,
}

impl TrackingBoard {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            speed: AtomicU64::new(0f64.to_bits()),
            log: Mutex::new(VecDeque::with_capacity(TRACKING_LOG_CAPACITY)),
            clock,
        }
    }

    pub fn speed(&self) -> f64 {
        f64::from_bits(self.speed.load(Ordering::Relaxed))
    }

    pub fn set_speed(&self, speed: f64) {
        self.speed.store(speed.to_bits(), Ordering::Relaxed);
    }

    pub fn record(&self, event: &DerivedEvent) {
        let Some((title, duration, detail)) = describe(event) else {
            return;
        };
        let entry = TrackingLogEntry {
            moment: self.clock.time(),
            title,
            duration,
            detail,
        };
        let mut log = self.log.lock().unwrap_or_else(PoisonError::into_inner);
        if log.len() == TRACKING_LOG_CAPACITY {
            log.pop_front();
        }
        log.push_back(entry);
    }

    pub fn entries(&self) -> Vec<TrackingLogEntry> {
        let log = self.log.lock().unwrap_or_else(PoisonError::into_inner);
        log.iter().cloned().collect()
    }

    pub fn snapshot(&self, speed_threshold: f64, theme: Theme) -> StatusEntity {
        StatusEntity {
            updated_at: self.clock.time(),
            speed: self.speed(),
            speed_threshold,
            theme,
            log: self.entries(),
        }
    }
}

fn seconds(v: f64) -> Duration {
    Duration::milliseconds((v * 1000.).round() as i64)
}

fn describe(event: &DerivedEvent) -> Option<(String, Option<String>, String)> {
    match event {
        DerivedEvent::ArrivedStay { place, .. } => {
            Some((format!("Arrived at {}", place.name), None, String::new()))
        }
        DerivedEvent::StayRecorded {
            place,
            duration_seconds,
            event_label,
            ..
        } => Some((
            format!("At {}", place.name),
            Some(format_duration(seconds(*duration_seconds))),
            event_label.to_string(),
        )),
        DerivedEvent::RunStarted { speed } => Some((
            "Start running".into(),
            None,
            format!("speed: {speed:.2} m/s"),
        )),
        DerivedEvent::RunEnded {
            duration_seconds,
            avg_speed,
            ..
        } => Some((
            "Finish running".into(),
            Some(format!("duration: {duration_seconds:.0}s")),
            format!("average speed: {avg_speed:.2} m/s"),
        )),
    }
}
