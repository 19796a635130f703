use std::time::Duration;

use anyhow::Result;
use tokio::{sync::watch, time::Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info_span, warn};

use crate::{
    inference::pipeline::{IngestionPipeline, Thresholds},
    location_api::LocationProvider,
    utils::clock::Clock,
};

/// Pulls a fix from the location provider on every tick and runs it through the pipeline. The
/// pipeline and its sinks live as long as this module does.
pub struct SampleCollectionModule {
    pipeline: IngestionPipeline,
    producer: Box<dyn LocationProvider>,
    shutdown: CancellationToken,
    collection_frequency: Duration,
    time_provider: Box<dyn Clock>,
    thresholds: watch::Receiver<Thresholds>,
    origin: Instant,
}

impl SampleCollectionModule {
    pub fn new(
        pipeline: IngestionPipeline,
        producer: Box<dyn LocationProvider>,
        shutdown: CancellationToken,
        collection_frequency: Duration,
        time_provider: Box<dyn Clock>,
        thresholds: watch::Receiver<Thresholds>,
    ) -> Self {
        let origin = time_provider.instant();
        Self {
            pipeline,
            producer,
            shutdown,
            collection_frequency,
            time_provider,
            thresholds,
            origin,
        }
    }

    fn apply_threshold_changes(&mut self) {
        if !self.thresholds.has_changed().unwrap_or(false) {
            return;
        }
        let thresholds = *self.thresholds.borrow_and_update();
        self.pipeline.set_thresholds(thresholds);
    }

    fn collect_sample(&mut self) -> Result<()> {
        let fix = self.producer.get_fix()?;
        let timestamp = self.time_provider.seconds_since(self.origin);
        let _span = info_span!("Processing sample", timestamp).entered();
        match self.pipeline.ingest_fix(fix, timestamp) {
            Ok(events) => debug!("Sample produced {} events", events.len()),
            Err(e) => warn!("Dropping invalid sample {fix:?}: {e}"),
        }
        Ok(())
    }

    /// Executes the collector event loop.
    pub async fn run(mut self) -> Result<()> {
        let mut collection_point = self.origin;
        loop {
            collection_point += self.collection_frequency;

            self.apply_threshold_changes();
            if let Err(e) = self.collect_sample() {
                error!("Encountered an error during collection {:?}", e)
            }

            tokio::select! {
                // Returning drops the pipeline along with the schedule sink, which lets the
                // processing module finish.
                _ = self.shutdown.cancelled() => {
                    return Ok(())
                }
                _ = self.time_provider.sleep_until(collection_point) => ()
            }
        }
    }
}
