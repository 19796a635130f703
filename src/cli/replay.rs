use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Deserialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::warn;

use crate::{
    inference::{
        events::DerivedEvent, pipeline::IngestionPipeline, sample::RawFix, stay::StayEmission,
    },
    settings::SettingsStore,
};

#[derive(Debug, Parser)]
pub struct ReplayCommand {
    #[arg(help = "File with one JSON sample per line: {latitude, longitude, speed, timestamp}")]
    file: PathBuf,
    #[arg(long, help = "Overrides the stay threshold from settings")]
    stay_threshold: Option<f64>,
    #[arg(long, help = "Overrides the running threshold from settings")]
    running_threshold: Option<f64>,
    #[arg(long, help = "Record stays on every sample past the threshold")]
    every_sample: bool,
}

#[derive(Debug, Deserialize)]
struct TraceLine {
    #[serde(flatten)]
    fix: RawFix,
    timestamp: f64,
}

#[derive(Debug, Default, PartialEq)]
pub struct ReplaySummary {
    pub samples: usize,
    pub rejected: usize,
    pub events: Vec<(f64, DerivedEvent)>,
}

/// Feeds every line of `trace` through `pipeline`. Lines that can't be parsed or hold invalid
/// samples are counted and skipped.
pub async fn replay_trace(
    trace: impl AsyncBufRead + Unpin,
    pipeline: &mut IngestionPipeline,
) -> Result<ReplaySummary> {
    let mut summary = ReplaySummary::default();
    let mut lines = trace.lines();
    let mut line_number = 0;
    while let Some(line) = lines.next_line().await? {
        line_number += 1;
        if line.trim().is_empty() {
            continue;
        }
        let sample = match serde_json::from_str::<TraceLine>(&line) {
            Ok(v) => pipeline
                .ingest_fix(v.fix, v.timestamp)
                .map(|events| (v.timestamp, events))
                .map_err(anyhow::Error::from),
            Err(e) => Err(e.into()),
        };
        match sample {
            Ok((timestamp, events)) => {
                summary.samples += 1;
                summary
                    .events
                    .extend(events.into_iter().map(|event| (timestamp, event)));
            }
            Err(e) => {
                warn!("Skipping line {line_number}: {e}");
                summary.rejected += 1;
            }
        }
    }
    Ok(summary)
}

pub async fn process_replay_command(
    store: &SettingsStore,
    ReplayCommand {
        file,
        stay_threshold,
        running_threshold,
        every_sample,
    }: ReplayCommand,
) -> Result<()> {
    let mut settings = store.load_or_create().await?;
    settings.update_thresholds(None, running_threshold, stay_threshold)?;
    let mut thresholds = settings.thresholds();
    if every_sample {
        thresholds.stay_emission = StayEmission::EverySample;
    }
    let mut pipeline = IngestionPipeline::new(settings.catalog(), thresholds)
        .with_arrivals(settings.report_arrivals);

    let trace = tokio::fs::File::open(&file)
        .await
        .with_context(|| format!("Can't open trace {file:?}"))?;
    let summary = replay_trace(BufReader::new(trace), &mut pipeline).await?;

    for (timestamp, event) in summary.events.iter() {
        println!("{timestamp:>10.1}\t{}", describe(event));
    }
    println!();
    println!(
        "{} samples, {} rejected, {} events",
        summary.samples,
        summary.rejected,
        summary.events.len()
    );
    Ok(())
}

fn describe(event: &DerivedEvent) -> String {
    match event {
        DerivedEvent::ArrivedStay { place, .. } => format!("arrived\t{}", place.name),
        DerivedEvent::StayRecorded {
            place,
            started_at,
            duration_seconds,
            event_label,
            ..
        } => format!(
            "stay\t{}\t{event_label}\tsince {started_at:.1}\t{duration_seconds:.0}s",
            place.name
        ),
        DerivedEvent::RunStarted { speed } => format!("run started\t{speed:.2} m/s"),
        DerivedEvent::RunEnded {
            duration_seconds,
            avg_speed,
            end_speed,
        } => format!(
            "run ended\t{duration_seconds:.0}s\taverage {avg_speed:.2} m/s\tend {end_speed:.2} m/s"
        ),
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;

    use crate::inference::{
        events::DerivedEvent,
        geo::Coordinate,
        pipeline::{IngestionPipeline, Thresholds},
        places::{Place, PlaceCatalog},
    };

    use super::replay_trace;

    #[tokio::test]
    async fn test_replay_reports_events_and_rejects() -> Result<()> {
        let catalog = PlaceCatalog::new([Place::new(
            "home",
            "Home",
            Coordinate::new(31.0258, 121.4376),
        )]);
        let mut pipeline = IngestionPipeline::new(catalog, Thresholds::default());
        let mut trace = String::new();
        for (i, speed) in [0.5, 0.5, 4., 4., 0.5, 0.5, 0.5, 0.5].into_iter().enumerate() {
            trace.push_str(&format!(
                "{{\"latitude\": 31.0258, \"longitude\": 121.4376, \"speed\": {speed}, \"timestamp\": {}}}\n",
                i * 10
            ));
        }
        trace.push_str("\n{\"latitude\": 31.0258, \"timestamp\": 80}\nnot json\n");
        trace.push_str("{\"latitude\": 0, \"longitude\": 0, \"timestamp\": 90}\n");

        let summary = replay_trace(trace.as_bytes(), &mut pipeline).await?;
        assert_eq!(summary.samples, 9);
        assert_eq!(summary.rejected, 2);

        let kinds = summary
            .events
            .iter()
            .map(|(at, event)| (*at, event.kind()))
            .collect::<Vec<_>>();
        assert_eq!(
            kinds,
            vec![
                (20., "run_started"),
                (40., "run_ended"),
                (60., "stay"),
                (90., "stay"),
            ]
        );
        assert!(matches!(
            summary.events[3].1,
            DerivedEvent::StayRecorded { duration_seconds, .. } if duration_seconds == 90.
        ));
        Ok(())
    }
}
