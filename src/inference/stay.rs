use std::sync::Arc;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{
    events::{DerivedEvent, StayPhase},
    places::Place,
};

pub const DEFAULT_STAY_THRESHOLD_S: f64 = 60.;

/// Controls how often a stay that's longer than the threshold gets reported while the user is
/// still there. Leaving always produces one final record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum StayEmission {
    /// Report once when the threshold is crossed.
    #[default]
    Once,
    /// Report on every sample past the threshold.
    EverySample,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum StayState {
    #[default]
    Idle,
    Staying {
        place: Arc<Place>,
        since: f64,
        reported: bool,
    },
}

impl StayState {
    pub fn place(&self) -> Option<&Arc<Place>> {
        match self {
            StayState::Idle => None,
            StayState::Staying { place, .. } => Some(place),
        }
    }

    pub fn since(&self) -> Option<f64> {
        match self {
            StayState::Idle => None,
            StayState::Staying { since, .. } => Some(*since),
        }
    }
}

/// Tracks which place the user currently is at and for how long.
#[derive(Debug, Clone)]
pub struct StayDetector {
    state: StayState,
    threshold: f64,
    emission: StayEmission,
    report_arrivals: bool,
}

impl StayDetector {
    pub fn new(threshold: f64, emission: StayEmission) -> Self {
        Self {
            state: StayState::Idle,
            threshold,
            emission,
            report_arrivals: false,
        }
    }

    /// Emit [DerivedEvent::ArrivedStay] when a new stay begins.
    pub fn with_arrivals(self, report_arrivals: bool) -> Self {
        Self {
            report_arrivals,
            ..self
        }
    }

    pub fn state(&self) -> &StayState {
        &self.state
    }

    pub fn set_threshold(&mut self, threshold: f64) {
        self.threshold = threshold;
    }

    pub fn set_emission(&mut self, emission: StayEmission) {
        self.emission = emission;
    }

    /// Advances the state machine with the place resolved for the sample at `now`.
    pub fn observe(&mut self, place: Option<&Arc<Place>>, now: f64, events: &mut Vec<DerivedEvent>) {
        if let (
            StayState::Staying {
                place: current,
                since,
                reported,
            },
            Some(place),
        ) = (&mut self.state, place)
        {
            if current.id == place.id {
                let dwell = now - *since;
                if dwell < self.threshold || (*reported && self.emission == StayEmission::Once) {
                    return;
                }
                *reported = true;
                events.push(DerivedEvent::StayRecorded {
                    place: current.clone(),
                    started_at: *since,
                    duration_seconds: dwell,
                    event_label: current.default_label(),
                    phase: StayPhase::Reached,
                });
                return;
            }
        }

        self.leave(now, events);
        if let Some(place) = place {
            self.arrive(place.clone(), now, events);
        }
    }

    fn leave(&mut self, now: f64, events: &mut Vec<DerivedEvent>) {
        let StayState::Staying { place, since, .. } = std::mem::take(&mut self.state) else {
            return;
        };
        let dwell = now - since;
        debug!("Left {} after {dwell:.0}s", place.name);
        if dwell >= self.threshold {
            events.push(DerivedEvent::StayRecorded {
                event_label: place.default_label(),
                place,
                started_at: since,
                duration_seconds: dwell,
                phase: StayPhase::Left,
            });
        }
    }

    fn arrive(&mut self, place: Arc<Place>, now: f64, events: &mut Vec<DerivedEvent>) {
        debug!("Arrived at {}", place.name);
        if self.report_arrivals {
            events.push(DerivedEvent::ArrivedStay {
                place: place.clone(),
                start_time: now,
            });
        }
        self.state = StayState::Staying {
            place,
            since: now,
            reported: false,
        };
    }
}
