use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use super::{
    events::DerivedEvent,
    motion::{MotionClassifier, MotionState, DEFAULT_RUNNING_THRESHOLD},
    places::PlaceCatalog,
    sample::{InvalidSample, RawFix, Sample, SampleHistory},
    sink::EventSink,
    stay::{StayDetector, StayEmission, StayState, DEFAULT_STAY_THRESHOLD_S},
};

pub const DEFAULT_SPEED_THRESHOLD: f64 = 5.0;

/// Tunable values of the pipeline. Can be replaced between samples.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    /// Speed above which the live display highlights the current speed.
    pub speed: f64,
    /// Speed above which the user is considered to be running.
    pub running: f64,
    /// Seconds the user has to remain at a place for a stay to be recorded.
    pub stay: f64,
    pub stay_emission: StayEmission,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            speed: DEFAULT_SPEED_THRESHOLD,
            running: DEFAULT_RUNNING_THRESHOLD,
            stay: DEFAULT_STAY_THRESHOLD_S,
            stay_emission: StayEmission::default(),
        }
    }
}

/// Entry point of the inference engine. Consumes samples one at a time and hands whatever the
/// detectors derive to the registered sinks.
pub struct IngestionPipeline {
    catalog: PlaceCatalog,
    history: SampleHistory,
    stay: StayDetector,
    motion: MotionClassifier,
    thresholds: Thresholds,
    sinks: Vec<Box<dyn EventSink>>,
}

impl IngestionPipeline {
    pub fn new(catalog: PlaceCatalog, thresholds: Thresholds) -> Self {
        if catalog.is_empty() {
            warn!("Place catalog is empty, no stays will be recorded");
        }
        Self {
            catalog,
            history: SampleHistory::default(),
            stay: StayDetector::new(thresholds.stay, thresholds.stay_emission),
            motion: MotionClassifier::new(thresholds.running),
            thresholds,
            sinks: vec![],
        }
    }

    pub fn with_arrivals(mut self, report_arrivals: bool) -> Self {
        self.stay = self.stay.with_arrivals(report_arrivals);
        self
    }

    pub fn with_sink(mut self, sink: impl EventSink + 'static) -> Self {
        self.add_sink(Box::new(sink));
        self
    }

    pub fn add_sink(&mut self, sink: Box<dyn EventSink>) {
        self.sinks.push(sink);
    }

    pub fn thresholds(&self) -> Thresholds {
        self.thresholds
    }

    pub fn set_thresholds(&mut self, thresholds: Thresholds) {
        debug!("Updating thresholds to {thresholds:?}");
        self.stay.set_threshold(thresholds.stay);
        self.stay.set_emission(thresholds.stay_emission);
        self.motion.set_threshold(thresholds.running);
        self.thresholds = thresholds;
    }

    pub fn history(&self) -> &SampleHistory {
        &self.history
    }

    pub fn stay_state(&self) -> &StayState {
        self.stay.state()
    }

    pub fn motion_state(&self) -> &MotionState {
        self.motion.state()
    }

    /// Validates a raw fix and ingests it. Invalid fixes never reach the detectors.
    pub fn ingest_fix(
        &mut self,
        fix: RawFix,
        timestamp: f64,
    ) -> Result<Vec<DerivedEvent>, InvalidSample> {
        let sample = Sample::try_from_fix(fix, timestamp)?;
        Ok(self.ingest(sample))
    }

    /// Runs one sample through the detectors. Returns the events that were dispatched.
    pub fn ingest(&mut self, sample: Sample) -> Vec<DerivedEvent> {
        trace!("Ingesting {sample:?}");
        self.history.push(sample);

        for sink in self.sinks.iter_mut() {
            sink.on_speed(sample.speed);
        }

        let mut events = vec![];
        let place = self
            .catalog
            .nearest(&sample.coordinate())
            .map(|(place, _)| place);
        self.stay.observe(place, sample.timestamp, &mut events);
        events.extend(self.motion.observe(sample.speed, sample.timestamp));

        for event in events.iter() {
            debug!("Derived {event:?}");
            for sink in self.sinks.iter_mut() {
                sink.on_event(event);
            }
        }

        events
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    };

    use crate::inference::{
        events::DerivedEvent,
        geo::Coordinate,
        places::{Place, PlaceCatalog},
        sample::{InvalidSample, RawFix, Sample},
        sink::EventSink,
        stay::StayEmission,
    };

    use super::{IngestionPipeline, Thresholds};

    const HOME: Coordinate = Coordinate {
        latitude: 31.0258,
        longitude: 121.4376,
    };

    fn catalog() -> PlaceCatalog {
        PlaceCatalog::new([
            Place::new("home", "Home", HOME).with_events(["Rest"]),
            Place::new("sports", "Sports Field", Coordinate::new(31.0268, 121.4390))
                .with_events(["Exercise", "Running"]),
        ])
    }

    fn sample(coordinate: Coordinate, speed: f64, timestamp: f64) -> Sample {
        Sample {
            latitude: coordinate.latitude,
            longitude: coordinate.longitude,
            speed,
            timestamp,
        }
    }

    #[derive(Default, Clone)]
    struct Recorder {
        events: Arc<Mutex<Vec<DerivedEvent>>>,
        speeds: Arc<Mutex<Vec<f64>>>,
    }

    impl EventSink for Recorder {
        fn on_event(&mut self, event: &DerivedEvent) {
            self.events.lock().unwrap().push(event.clone());
        }

        fn on_speed(&mut self, speed: f64) {
            self.speeds.lock().unwrap().push(speed);
        }
    }

    #[test]
    fn test_stay_is_recorded_after_threshold() {
        let recorder = Recorder::default();
        let mut pipeline =
            IngestionPipeline::new(catalog(), Thresholds::default()).with_sink(recorder.clone());

        for step in 0..=7 {
            let now = step as f64 * 10.;
            let events = pipeline.ingest(sample(HOME, 0.5, now));
            let recorded = events
                .iter()
                .any(|v| matches!(v, DerivedEvent::StayRecorded { .. }));
            assert_eq!(recorded, now >= 60. && now < 70., "at {now}");
        }

        let events = recorder.events.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert!(matches!(
            &events[0],
            DerivedEvent::StayRecorded { place, event_label, duration_seconds, .. }
                if &*place.id == "home" && &**event_label == "Rest" && *duration_seconds == 60.
        ));
    }

    #[test]
    fn test_speed_is_published_for_every_sample() {
        let recorder = Recorder::default();
        let mut pipeline =
            IngestionPipeline::new(catalog(), Thresholds::default()).with_sink(recorder.clone());
        for (i, speed) in [0., 1.5, 7.].into_iter().enumerate() {
            pipeline.ingest(sample(Coordinate::new(0., 0.), speed, i as f64));
        }
        assert_eq!(*recorder.speeds.lock().unwrap(), vec![0., 1.5, 7.]);
    }

    #[test]
    fn test_running_and_staying_are_independent() {
        let mut pipeline = IngestionPipeline::new(catalog(), Thresholds::default());
        let mut all = vec![];
        for (i, speed) in [1., 2., 4., 4., 4., 2., 1., 1.].into_iter().enumerate() {
            all.extend(pipeline.ingest(sample(HOME, speed, i as f64 * 10.)));
        }

        let started = all
            .iter()
            .filter(|v| matches!(v, DerivedEvent::RunStarted { .. }))
            .count();
        let ended = all
            .iter()
            .filter(|v| matches!(v, DerivedEvent::RunEnded { .. }))
            .count();
        let stays = all
            .iter()
            .filter(|v| matches!(v, DerivedEvent::StayRecorded { .. }))
            .count();
        assert_eq!((started, ended, stays), (1, 1, 1));
    }

    #[test]
    fn test_motion_state_follows_running_segment() {
        let mut pipeline = IngestionPipeline::new(catalog(), Thresholds::default());
        pipeline.ingest(sample(HOME, 1., 0.));
        assert_eq!(pipeline.motion_state().running_since(), None);

        pipeline.ingest(sample(HOME, 4., 10.));
        pipeline.ingest(sample(HOME, 4.5, 20.));
        assert_eq!(pipeline.motion_state().running_since(), Some(10.));

        pipeline.ingest(sample(HOME, 1., 30.));
        assert_eq!(pipeline.motion_state().running_since(), None);
    }

    #[test]
    fn test_every_sink_gets_events() {
        let first = Recorder::default();
        let second = Recorder::default();
        let closure_count = Arc::new(AtomicUsize::new(0));
        let counter = closure_count.clone();
        let mut pipeline = IngestionPipeline::new(catalog(), Thresholds::default())
            .with_sink(first.clone())
            .with_sink(second.clone())
            .with_sink(move |_: &DerivedEvent| {
                counter.fetch_add(1, Ordering::SeqCst);
            });

        pipeline.ingest(sample(HOME, 5., 0.));

        assert_eq!(first.events.lock().unwrap().len(), 1);
        assert_eq!(second.events.lock().unwrap().len(), 1);
        assert_eq!(closure_count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_empty_catalog_never_stays() {
        let mut pipeline = IngestionPipeline::new(PlaceCatalog::default(), Thresholds::default());
        for step in 0..20 {
            let events = pipeline.ingest(sample(HOME, 0., step as f64 * 10.));
            assert!(events.is_empty());
        }
        assert!(pipeline.stay_state().place().is_none());
    }

    #[test]
    fn test_invalid_fix_is_rejected_without_side_effects() {
        let recorder = Recorder::default();
        let mut pipeline =
            IngestionPipeline::new(catalog(), Thresholds::default()).with_sink(recorder.clone());

        let result = pipeline.ingest_fix(RawFix::new(f64::NAN, 121.4376, 0.), 0.);
        assert!(matches!(result, Err(InvalidSample::NonFinite { .. })));
        assert!(pipeline.history().is_empty());
        assert!(recorder.speeds.lock().unwrap().is_empty());

        assert!(pipeline
            .ingest_fix(RawFix::new(HOME.latitude, HOME.longitude, 0.), 0.)
            .is_ok());
        assert_eq!(pipeline.history().len(), 1);
    }

    #[test]
    fn test_replayed_sample_keeps_stay_start() {
        let mut pipeline = IngestionPipeline::new(catalog(), Thresholds::default());
        pipeline.ingest(sample(HOME, 0., 10.));
        pipeline.ingest(sample(HOME, 0., 20.));
        let before = pipeline.stay_state().since();
        pipeline.ingest(sample(HOME, 0., 20.));
        assert_eq!(pipeline.stay_state().since(), before);
        assert_eq!(before, Some(10.));
    }

    #[test]
    fn test_threshold_update_takes_effect_on_next_sample() {
        let mut pipeline = IngestionPipeline::new(catalog(), Thresholds::default());
        pipeline.ingest(sample(HOME, 0., 0.));
        assert!(pipeline.ingest(sample(HOME, 0., 20.)).is_empty());

        pipeline.set_thresholds(Thresholds {
            stay: 25.,
            running: 10.,
            stay_emission: StayEmission::EverySample,
            ..Thresholds::default()
        });

        assert_eq!(pipeline.thresholds().stay, 25.);

        // 8 m/s is no longer running, but 30 s is now a stay.
        let events = pipeline.ingest(sample(HOME, 8., 30.));
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], DerivedEvent::StayRecorded { .. }));
        assert_eq!(pipeline.ingest(sample(HOME, 8., 40.)).len(), 1);
    }

    #[test]
    fn test_history_is_bounded() {
        let mut pipeline = IngestionPipeline::new(catalog(), Thresholds::default());
        for i in 0..1500 {
            pipeline.ingest(sample(Coordinate::new(0., 0.), 0., i as f64));
        }
        assert_eq!(pipeline.history().len(), 1000);
        assert_eq!(pipeline.history().iter().next().unwrap().timestamp, 500.);
    }
}
