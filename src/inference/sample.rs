use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::geo::Coordinate;

pub const DEFAULT_HISTORY_CAPACITY: usize = 1000;

/// Unvalidated reading coming from a location provider. Any field may be missing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RawFix {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Meters per second. Providers that don't report speed are treated as stationary.
    pub speed: Option<f64>,
}

impl RawFix {
    pub fn new(latitude: f64, longitude: f64, speed: f64) -> Self {
        Self {
            latitude: Some(latitude),
            longitude: Some(longitude),
            speed: Some(speed),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum InvalidSample {
    #[error("Fix has no {0}")]
    MissingCoordinate(&'static str),
    #[error("Fix has a non-finite {field}: {value}")]
    NonFinite { field: &'static str, value: f64 },
    #[error("Fix has a negative speed: {0}")]
    NegativeSpeed(f64),
}

/// A validated location sample. `timestamp` is monotonic and measured in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub latitude: f64,
    pub longitude: f64,
    pub speed: f64,
    pub timestamp: f64,
}

impl Sample {
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }

    /// Validates a raw fix. This is the only way samples enter the pipeline from the outside.
    pub fn try_from_fix(fix: RawFix, timestamp: f64) -> Result<Self, InvalidSample> {
        let latitude = fix
            .latitude
            .ok_or(InvalidSample::MissingCoordinate("latitude"))?;
        let longitude = fix
            .longitude
            .ok_or(InvalidSample::MissingCoordinate("longitude"))?;
        let speed = fix.speed.unwrap_or(0.);

        for (field, value) in [
            ("latitude", latitude),
            ("longitude", longitude),
            ("speed", speed),
            ("timestamp", timestamp),
        ] {
            if !value.is_finite() {
                return Err(InvalidSample::NonFinite { field, value });
            }
        }
        if speed < 0. {
            return Err(InvalidSample::NegativeSpeed(speed));
        }

        Ok(Self {
            latitude,
            longitude,
            speed,
            timestamp,
        })
    }
}

/// Most recent samples in arrival order. Once full, pushing drops the oldest one.
#[derive(Debug, Clone)]
pub struct SampleHistory {
    samples: VecDeque<Sample>,
    capacity: usize,
}

impl Default for SampleHistory {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }
}

impl SampleHistory {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, sample: Sample) {
        if self.capacity == 0 {
            return;
        }
        while self.samples.len() >= self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn latest(&self) -> Option<&Sample> {
        self.samples.back()
    }

    /// Oldest first.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Sample> {
        self.samples.iter()
    }
}
