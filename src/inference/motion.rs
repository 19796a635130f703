use tracing::debug;

use super::events::DerivedEvent;

pub const DEFAULT_RUNNING_THRESHOLD: f64 = 3.0;

/// Bookkeeping for an active running segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunSegment {
    pub since: f64,
    last_timestamp: f64,
    last_speed: f64,
    /// Integral of speed over time, i.e. the distance covered according to speed readings.
    distance: f64,
}

impl RunSegment {
    fn start(speed: f64, now: f64) -> Self {
        Self {
            since: now,
            last_timestamp: now,
            last_speed: speed,
            distance: 0.,
        }
    }

    /// Each reading holds until the next one arrives.
    fn advance(&mut self, speed: f64, now: f64) {
        self.close(now);
        self.last_speed = speed;
    }

    fn close(&mut self, now: f64) {
        let elapsed = now - self.last_timestamp;
        if elapsed > 0. {
            self.distance += self.last_speed * elapsed;
            self.last_timestamp = now;
        }
    }

    fn average_speed(&self, now: f64) -> f64 {
        let duration = now - self.since;
        if duration > 0. {
            self.distance / duration
        } else {
            self.last_speed
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MotionState {
    pub running: Option<RunSegment>,
}

impl MotionState {
    pub fn running_since(&self) -> Option<f64> {
        self.running.map(|v| v.since)
    }
}

/// Splits the speed stream into running and not running segments.
#[derive(Debug, Clone)]
pub struct MotionClassifier {
    state: MotionState,
    threshold: f64,
}

impl MotionClassifier {
    pub fn new(threshold: f64) -> Self {
        Self {
            state: MotionState::default(),
            threshold,
        }
    }

    pub fn state(&self) -> &MotionState {
        &self.state
    }

    pub fn set_threshold(&mut self, threshold: f64) {
        self.threshold = threshold;
    }

    pub fn observe(&mut self, speed: f64, now: f64) -> Option<DerivedEvent> {
        let is_running = speed > self.threshold;
        if self.state.running.is_none() {
            if !is_running {
                return None;
            }
            debug!("Running started at {speed:.1} m/s");
            self.state.running = Some(RunSegment::start(speed, now));
            return Some(DerivedEvent::RunStarted { speed });
        }

        let segment = self.state.running.as_mut()?;
        if is_running {
            segment.advance(speed, now);
            return None;
        }

        segment.close(now);
        let event = DerivedEvent::RunEnded {
            duration_seconds: now - segment.since,
            avg_speed: segment.average_speed(now),
            end_speed: speed,
        };
        debug!("Running ended {event:?}");
        self.state.running = None;
        Some(event)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use crate::inference::events::DerivedEvent;

    use super::MotionClassifier;

    fn feed(classifier: &mut MotionClassifier, speeds: &[f64]) -> Vec<(f64, DerivedEvent)> {
        speeds
            .iter()
            .enumerate()
            .filter_map(|(i, speed)| {
                let now = i as f64 * 10.;
                classifier.observe(*speed, now).map(|v| (now, v))
            })
            .collect()
    }

    #[test]
    fn test_single_run_segment() {
        let mut classifier = MotionClassifier::new(3.0);
        let events = feed(&mut classifier, &[1., 2., 4., 4., 4., 2., 1.]);

        assert_eq!(events.len(), 2);
        assert_eq!(events[0], (20., DerivedEvent::RunStarted { speed: 4. }));
        let (at, DerivedEvent::RunEnded {
            duration_seconds,
            avg_speed,
            end_speed,
        }) = &events[1]
        else {
            panic!("Expected run end, got {:?}", events[1]);
        };
        assert_eq!(*at, 50.);
        assert_eq!(*duration_seconds, 30.);
        assert_relative_eq!(*avg_speed, 4.);
        assert_eq!(*end_speed, 2.);
        assert!(classifier.state().running.is_none());
    }

    #[test]
    fn test_average_is_time_weighted() {
        let mut classifier = MotionClassifier::new(3.0);
        classifier.observe(4., 0.);
        classifier.observe(6., 10.);
        let ended = classifier.observe(1., 40.);
        // 4 m/s for 10 s and 6 m/s for 30 s
        let Some(DerivedEvent::RunEnded { avg_speed, .. }) = ended else {
            panic!("Expected run end, got {ended:?}");
        };
        assert_relative_eq!(avg_speed, 220. / 40.);
    }

    #[test]
    fn test_threshold_speed_is_not_running() {
        let mut classifier = MotionClassifier::new(3.0);
        assert!(feed(&mut classifier, &[3., 3., 3.]).is_empty());
    }

    #[test]
    fn test_running_since() {
        let mut classifier = MotionClassifier::new(3.0);
        classifier.observe(5., 12.);
        classifier.observe(5., 22.);
        assert_eq!(classifier.state().running_since(), Some(12.));
    }

    #[test]
    fn test_zero_length_segment_reports_running_speed() {
        let mut classifier = MotionClassifier::new(3.0);
        classifier.observe(5., 10.);
        let Some(DerivedEvent::RunEnded {
            duration_seconds,
            avg_speed,
            ..
        }) = classifier.observe(1., 10.)
        else {
            panic!("Expected run end");
        };
        assert_eq!(duration_seconds, 0.);
        assert_eq!(avg_speed, 5.);
    }
}
