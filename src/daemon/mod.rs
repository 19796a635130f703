use std::{
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use anyhow::Result;
use board::TrackingBoard;
use collection::collector::SampleCollectionModule;
use processing::{activity_save::ActivitySaver, ProcessingModule};
use settings_watch::{SettingsWatcher, SETTINGS_POLL_INTERVAL};
use sinks::{BoardSink, ScheduleSink};
use status::StatusWriter;
use storage::{
    activity_storage::JsonActivityStorage, record_event::StayRecordEvent,
    status_storage::StatusStorage,
};
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::{
    context::{
        alarms::{refresh_schedule, StubAlarmReader},
        weather::{current_theme, StubWeatherProvider, DEFAULT_WEATHER_LOCATION},
    },
    inference::{
        geo::Coordinate,
        pipeline::{IngestionPipeline, Thresholds},
        places::PlaceCatalog,
    },
    location_api::{
        simulated::{SimulatedLocationProvider, SimulationPlan},
        LocationProvider,
    },
    settings::{SettingsStore, UserSettings},
    utils::clock::{Clock, DefaultClock},
};

pub mod args;
pub mod board;
pub mod collection;
pub mod processing;
pub mod settings_watch;
pub mod shutdown;
pub mod sinks;
pub mod status;
pub mod storage;

pub const DEFAULT_COLLECTION_INTERVAL: Duration = Duration::from_secs(10);
const RECORD_CHANNEL_CAPACITY: usize = 32;

/// Represents the starting point for the daemon
pub async fn start_daemon(dir: PathBuf, interval: Duration) -> Result<()> {
    let dir = tokio::fs::canonicalize(&dir).await?;
    std::env::set_current_dir("/")?;

    let settings = load_settings(&dir).await?;
    let catalog = settings.catalog();
    let producer = SimulatedLocationProvider::through_catalog(
        &catalog,
        weather_location(&catalog),
        SimulationPlan::default(),
    );

    let shutdown_token = CancellationToken::new();
    info!(
        "Tracking {} places every {}s",
        catalog.len(),
        interval.as_secs_f64()
    );

    let (_, result) = tokio::join!(
        shutdown::detect_shutdown(shutdown_token.clone()),
        run_daemon(
            &dir,
            &settings,
            producer,
            shutdown_token.clone(),
            interval,
            DefaultClock
        ),
    );
    result
}

async fn load_settings(dir: &Path) -> Result<UserSettings> {
    let store = SettingsStore::in_dir(dir);
    let mut settings = store.load_or_create().await?;
    // A file that failed to parse is left for the user to fix.
    if refresh_schedule(&mut settings, &StubAlarmReader) && store.load().await.is_ok() {
        store.save(&settings).await?;
    }
    Ok(settings)
}

fn weather_location(catalog: &PlaceCatalog) -> Coordinate {
    catalog
        .iter()
        .next()
        .map(|place| place.coordinate)
        .unwrap_or(DEFAULT_WEATHER_LOCATION)
}

/// Runs every module until `shutdown` is cancelled.
async fn run_daemon(
    dir: &Path,
    settings: &UserSettings,
    producer: impl LocationProvider + 'static,
    shutdown: CancellationToken,
    interval: Duration,
    clock: impl Clock + Clone,
) -> Result<()> {
    let catalog = settings.catalog();
    let theme = current_theme(&StubWeatherProvider, weather_location(&catalog));

    let (sender, receiver) = mpsc::channel::<StayRecordEvent>(RECORD_CHANNEL_CAPACITY);
    let (thresholds_sender, thresholds) = watch::channel(settings.thresholds());
    let board = Arc::new(TrackingBoard::new(Arc::new(clock.clone())));

    let pipeline = create_pipeline(
        catalog,
        settings.thresholds(),
        settings.report_arrivals,
        sender,
        board.clone(),
        &clock,
    );
    let collector = create_collector(
        pipeline,
        producer,
        thresholds.clone(),
        &shutdown,
        interval,
        clock.clone(),
    );
    let processor = create_processor(dir, receiver);
    let watcher = SettingsWatcher::new(
        SettingsStore::in_dir(dir),
        thresholds_sender,
        shutdown.clone(),
        SETTINGS_POLL_INTERVAL,
        Box::new(clock.clone()),
    );
    let status = StatusWriter::new(
        board,
        StatusStorage::in_dir(dir),
        thresholds,
        theme,
        shutdown.clone(),
        interval,
        Box::new(clock),
    );

    let (collection_result, processing_result, watcher_result, status_result) = tokio::join!(
        collector.run(),
        processor.run(),
        watcher.run(),
        status.run(),
    );

    if let Err(collection_result) = collection_result {
        error!("Collection module got an error {:?}", collection_result);
    }

    if let Err(processing_result) = processing_result {
        error!("Processing module got an error {:?}", processing_result);
    }

    if let Err(watcher_result) = watcher_result {
        error!("Settings watcher got an error {:?}", watcher_result);
    }

    if let Err(status_result) = status_result {
        error!("Status writer got an error {:?}", status_result);
    }

    Ok(())
}

fn create_pipeline(
    catalog: PlaceCatalog,
    thresholds: Thresholds,
    report_arrivals: bool,
    sender: mpsc::Sender<StayRecordEvent>,
    board: Arc<TrackingBoard>,
    clock: &impl Clock,
) -> IngestionPipeline {
    IngestionPipeline::new(catalog, thresholds)
        .with_arrivals(report_arrivals)
        .with_sink(BoardSink(board))
        .with_sink(ScheduleSink::new(sender, clock.time()))
}

fn create_collector(
    pipeline: IngestionPipeline,
    producer: impl LocationProvider + 'static,
    thresholds: watch::Receiver<Thresholds>,
    shutdown_token: &CancellationToken,
    interval: Duration,
    clock: impl Clock,
) -> SampleCollectionModule {
    SampleCollectionModule::new(
        pipeline,
        Box::new(producer),
        shutdown_token.clone(),
        interval,
        Box::new(clock),
        thresholds,
    )
}

fn create_processor(
    dir: &Path,
    receiver: mpsc::Receiver<StayRecordEvent>,
) -> ProcessingModule<ActivitySaver<JsonActivityStorage>> {
    let saver = ActivitySaver::new(JsonActivityStorage::in_dir(dir));
    ProcessingModule::new(receiver, saver)
}
