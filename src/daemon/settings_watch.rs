use std::time::Duration;

use anyhow::Result;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{inference::pipeline::Thresholds, settings::SettingsStore, utils::clock::Clock};

pub const SETTINGS_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Rereads the settings file and publishes threshold edits to the running pipeline.
pub struct SettingsWatcher {
    store: SettingsStore,
    next: watch::Sender<Thresholds>,
    shutdown: CancellationToken,
    poll_interval: Duration,
    time_provider: Box<dyn Clock>,
}

impl SettingsWatcher {
    pub fn new(
        store: SettingsStore,
        next: watch::Sender<Thresholds>,
        shutdown: CancellationToken,
        poll_interval: Duration,
        time_provider: Box<dyn Clock>,
    ) -> Self {
        Self {
            store,
            next,
            shutdown,
            poll_interval,
            time_provider,
        }
    }

    /// Returns whether the thresholds changed.
    async fn poll(&self) -> bool {
        let settings = match self.store.load().await {
            Ok(settings) => settings,
            Err(e) => {
                // Half written files are common while someone edits them.
                debug!("Skipping unreadable settings {e:?}");
                return false;
            }
        };
        let thresholds = match settings.validated_thresholds() {
            Ok(thresholds) => thresholds,
            Err(e) => {
                warn!("Ignoring threshold change: {e}");
                return false;
            }
        };
        self.next.send_if_modified(|current| {
            if *current == thresholds {
                return false;
            }
            info!("Thresholds changed to {thresholds:?}");
            *current = thresholds;
            true
        })
    }

    pub async fn run(self) -> Result<()> {
        let mut poll_point = self.time_provider.instant();
        loop {
            poll_point += self.poll_interval;
            tokio::select! {
                _ = self.shutdown.cancelled() => {
                    return Ok(())
                }
                _ = self.time_provider.sleep_until(poll_point) => ()
            }
            self.poll().await;
        }
    }
}
