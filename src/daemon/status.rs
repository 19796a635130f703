use std::{sync::Arc, time::Duration};

use anyhow::Result;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::error;

use crate::{context::weather::Theme, inference::pipeline::Thresholds, utils::clock::Clock};

use super::{board::TrackingBoard, storage::status_storage::StatusStorage};

/// Periodically persists the [TrackingBoard] so that `daytrack status` can show it.
pub struct StatusWriter {
    board: Arc<TrackingBoard>,
    storage: StatusStorage,
    thresholds: watch::Receiver<Thresholds>,
    theme: Theme,
    shutdown: CancellationToken,
    frequency: Duration,
    time_provider: Box<dyn Clock>,
}

impl StatusWriter {
    pub fn new(
        board: Arc<TrackingBoard>,
        storage: StatusStorage,
        thresholds: watch::Receiver<Thresholds>,
        theme: Theme,
        shutdown: CancellationToken,
        frequency: Duration,
        time_provider: Box<dyn Clock>,
    ) -> Self {
        Self {
            board,
            storage,
            thresholds,
            theme,
            shutdown,
            frequency,
            time_provider,
        }
    }

    async fn write(&self) -> Result<()> {
        let speed_threshold = self.thresholds.borrow().speed;
        self.storage
            .save(&self.board.snapshot(speed_threshold, self.theme))
            .await
    }

    pub async fn run(self) -> Result<()> {
        let mut write_point = self.time_provider.instant();
        loop {
            write_point += self.frequency;
            if let Err(e) = self.write().await {
                error!("Failed to write status {e:?}");
            }
            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    // Last state before exiting.
                    return self.write().await
                }
                _ = self.time_provider.sleep_until(write_point) => ()
            }
        }
    }
}
