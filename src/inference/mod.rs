//! Location and activity inference engine.
//!
//! Samples enter through [pipeline::IngestionPipeline]. For every sample the pipeline:
//!  - appends it to a bounded [sample::SampleHistory],
//!  - resolves the nearest [places::Place] within its capture radius,
//!  - feeds the [stay::StayDetector] and the [motion::MotionClassifier],
//!  - hands derived [events::DerivedEvent]s to every registered [sink::EventSink].
//!
//! Everything in here is synchronous and free of I/O.

pub mod events;
pub mod geo;
pub mod motion;
pub mod pipeline;
pub mod places;
pub mod sample;
pub mod sink;
pub mod stay;
