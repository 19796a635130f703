use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::places::Place;

/// Whether a stay record was produced while still at the place or when leaving it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StayPhase {
    Reached,
    Left,
}

/// Events derived from the sample stream. Times are sample timestamps in seconds.
#[derive(Debug, Clone, PartialEq)]
pub enum DerivedEvent {
    ArrivedStay {
        place: Arc<Place>,
        start_time: f64,
    },
    StayRecorded {
        place: Arc<Place>,
        started_at: f64,
        duration_seconds: f64,
        event_label: Arc<str>,
        phase: StayPhase,
    },
    RunStarted {
        speed: f64,
    },
    RunEnded {
        duration_seconds: f64,
        /// Time weighted mean speed over the whole segment.
        avg_speed: f64,
        /// Speed of the sample that ended the segment.
        end_speed: f64,
    },
}

impl DerivedEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            DerivedEvent::ArrivedStay { .. } => "arrived",
            DerivedEvent::StayRecorded { .. } => "stay",
            DerivedEvent::RunStarted { .. } => "run_started",
            DerivedEvent::RunEnded { .. } => "run_ended",
        }
    }
}
