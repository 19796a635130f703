use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::{
    context::{
        alarms::{wake_and_sleep, AlarmReader, StubAlarmReader},
        weather::{current_theme, StubWeatherProvider, DEFAULT_WEATHER_LOCATION},
    },
    daemon::storage::activity_storage::{ActivityStorage, JsonActivityStorage},
    inference::stay::StayEmission,
    settings::{SettingsStore, UserSettings},
};

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    #[command(about = "Print current settings")]
    Show {},
    #[command(about = "Change thresholds. The running daemon picks changes up within a minute")]
    Set(SetCommand),
    #[command(about = "Restore default settings and remove every recorded activity")]
    Reset {},
}

#[derive(Debug, Parser)]
pub struct SetCommand {
    #[arg(long, help = "Speed in m/s above which the status is highlighted")]
    speed_threshold: Option<f64>,
    #[arg(long, help = "Speed in m/s above which you're considered to be running")]
    running_threshold: Option<f64>,
    #[arg(long, help = "Seconds spent at a place before the stay gets recorded")]
    stay_threshold: Option<f64>,
    #[arg(long, help = "Record a stay once, or on every sample past the threshold")]
    stay_reporting: Option<StayEmission>,
    #[arg(long, help = "Log arrivals at places on the tracking board")]
    report_arrivals: Option<bool>,
}

pub async fn process_config_command(
    store: &SettingsStore,
    activities: &JsonActivityStorage,
    command: ConfigCommand,
) -> Result<()> {
    match command {
        ConfigCommand::Show {} => {
            let settings = store.load_or_create().await?;
            println!("{}", serde_json::to_string_pretty(&settings)?);
        }
        ConfigCommand::Set(SetCommand {
            speed_threshold,
            running_threshold,
            stay_threshold,
            stay_reporting,
            report_arrivals,
        }) => {
            // Editing goes through a strict load so that a broken file is never replaced.
            let mut settings = store.load().await?;
            settings.update_thresholds(speed_threshold, running_threshold, stay_threshold)?;
            if let Some(stay_reporting) = stay_reporting {
                settings.stay_reporting = stay_reporting;
            }
            if let Some(report_arrivals) = report_arrivals {
                settings.report_arrivals = report_arrivals;
            }
            settings.reset_invalid_thresholds();
            store.save(&settings).await?;
            println!("Settings updated");
        }
        ConfigCommand::Reset {} => {
            store.save(&UserSettings::default()).await?;
            activities.clear().await?;
            println!("Settings restored to defaults");
        }
    }
    Ok(())
}

pub async fn process_places_command(store: &SettingsStore) -> Result<()> {
    let settings = store.load_or_create().await?;
    let catalog = settings.catalog();
    if catalog.is_empty() {
        println!("No places configured in {:?}", store.path());
        return Ok(());
    }
    for place in catalog.iter() {
        println!(
            "{}\t{}\t{:.6}, {:.6}\t{}m\t{}",
            place.id,
            place.name,
            place.coordinate.latitude,
            place.coordinate.longitude,
            place.capture_radius_m,
            place
                .events
                .iter()
                .map(|v| v.as_ref())
                .collect::<Vec<&str>>()
                .join(", ")
        );
    }
    Ok(())
}

pub async fn process_today_command(store: &SettingsStore) -> Result<()> {
    let settings = store.load_or_create().await?;
    let (wake, sleep) = StubAlarmReader
        .alarms()
        .ok()
        .and_then(|alarms| wake_and_sleep(&alarms))
        .unwrap_or((settings.wake_time, settings.sleep_time));
    println!("Wake up\t{}", wake.format("%H:%M"));
    println!("Sleep\t{}", sleep.format("%H:%M"));

    let location = settings
        .catalog()
        .iter()
        .next()
        .map(|place| place.coordinate)
        .unwrap_or(DEFAULT_WEATHER_LOCATION);
    let theme = current_theme(&StubWeatherProvider, location);
    let colors = theme.colors();
    println!(
        "Theme\t{theme} ({} {} {})",
        colors.primary, colors.secondary, colors.background
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use chrono::{TimeZone, Utc};
    use tempfile::tempdir;

    use crate::{
        daemon::storage::{
            activity_storage::{ActivityStorage, JsonActivityStorage},
            entities::ActivityEntity,
        },
        inference::stay::StayEmission,
        settings::{SettingsStore, UserSettings},
    };

    use super::{process_config_command, ConfigCommand, SetCommand};

    #[tokio::test]
    async fn test_set_and_reset() -> Result<()> {
        let dir = tempdir()?;
        let store = SettingsStore::in_dir(dir.path());
        let activities = JsonActivityStorage::in_dir(dir.path());
        store.save(&UserSettings::default()).await?;
        let started_at = Utc.with_ymd_and_hms(2018, 7, 4, 8, 0, 0).unwrap();
        activities
            .append(ActivityEntity::new(
                "Home".into(),
                "Rest".into(),
                started_at,
                started_at + chrono::Duration::minutes(3),
            ))
            .await?;

        let set = ConfigCommand::Set(SetCommand {
            speed_threshold: None,
            running_threshold: Some(2.),
            stay_threshold: None,
            stay_reporting: Some(StayEmission::EverySample),
            report_arrivals: None,
        });
        process_config_command(&store, &activities, set).await?;
        let settings = store.load().await?;
        assert_eq!(settings.running_threshold, 2.);
        assert_eq!(settings.stay_reporting, StayEmission::EverySample);

        let invalid = ConfigCommand::Set(SetCommand {
            speed_threshold: Some(0.),
            running_threshold: None,
            stay_threshold: None,
            stay_reporting: None,
            report_arrivals: None,
        });
        assert!(process_config_command(&store, &activities, invalid)
            .await
            .is_err());
        assert_eq!(store.load().await?.speed_threshold, 5.);

        process_config_command(&store, &activities, ConfigCommand::Reset {}).await?;
        assert_eq!(store.load().await?, UserSettings::default());
        assert!(activities.load().await?.is_empty());
        Ok(())
    }
}
