//! User settings stored as a JSON document in the application directory. The same file holds
//! the place catalog and the thresholds of the inference engine.

use std::{
    collections::BTreeMap,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use anyhow::Result;
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::{
    inference::{
        geo::Coordinate,
        motion::DEFAULT_RUNNING_THRESHOLD,
        pipeline::{Thresholds, DEFAULT_SPEED_THRESHOLD},
        places::{Place, PlaceCatalog, DEFAULT_CAPTURE_RADIUS_M},
        stay::{StayEmission, DEFAULT_STAY_THRESHOLD_S},
    },
    utils::time::hour_minute,
};

pub const SETTINGS_FILE: &str = "settings.json";

#[derive(Debug, Error, PartialEq)]
pub enum SettingsError {
    #[error("{name} must be a positive number, got {value}")]
    InvalidThreshold { name: &'static str, value: f64 },
    #[error("Location {0} has invalid coordinates")]
    InvalidCoordinates(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationSettings {
    pub name: String,
    #[serde(default)]
    pub events: Vec<String>,
    /// Latitude and longitude in degrees.
    pub coords: [f64; 2],
    #[serde(default = "default_radius")]
    pub radius: f64,
}

fn default_radius() -> f64 {
    DEFAULT_CAPTURE_RADIUS_M
}

impl LocationSettings {
    fn new(name: &str, events: &[&str], coords: [f64; 2]) -> Self {
        Self {
            name: name.into(),
            events: events.iter().map(|v| v.to_string()).collect(),
            coords,
            radius: DEFAULT_CAPTURE_RADIUS_M,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserSettings {
    #[serde(with = "hour_minute")]
    pub sleep_time: NaiveTime,
    #[serde(with = "hour_minute")]
    pub wake_time: NaiveTime,
    pub locations: BTreeMap<String, LocationSettings>,
    pub speed_threshold: f64,
    pub running_threshold: f64,
    pub stay_threshold: f64,
    pub stay_reporting: StayEmission,
    pub report_arrivals: bool,
}

impl Default for UserSettings {
    fn default() -> Self {
        let locations = [
            (
                "home",
                LocationSettings::new("Home", &["Rest", "Sleep", "Gaming"], [31.0258, 121.4376]),
            ),
            (
                "canteen",
                LocationSettings::new("Cafeteria", &["Eating"], [31.0260, 121.4380]),
            ),
            (
                "classroom",
                LocationSettings::new("Classroom", &["Studying"], [31.0255, 121.4370]),
            ),
            (
                "library",
                LocationSettings::new("Library", &["Learning", "Rest"], [31.0262, 121.4378]),
            ),
            (
                "sports",
                LocationSettings::new("Sports Field", &["Exercise", "Running"], [31.0268, 121.4390]),
            ),
        ]
        .into_iter()
        .map(|(id, location)| (id.to_string(), location))
        .collect();

        Self {
            sleep_time: NaiveTime::from_hms_opt(23, 0, 0).unwrap_or_default(),
            wake_time: NaiveTime::from_hms_opt(7, 0, 0).unwrap_or_default(),
            locations,
            speed_threshold: DEFAULT_SPEED_THRESHOLD,
            running_threshold: DEFAULT_RUNNING_THRESHOLD,
            stay_threshold: DEFAULT_STAY_THRESHOLD_S,
            stay_reporting: StayEmission::default(),
            report_arrivals: false,
        }
    }
}

impl UserSettings {
    pub fn thresholds(&self) -> Thresholds {
        Thresholds {
            speed: self.speed_threshold,
            running: self.running_threshold,
            stay: self.stay_threshold,
            stay_emission: self.stay_reporting,
        }
    }

    /// Builds the place catalog. Locations with unusable coordinates are skipped.
    pub fn catalog(&self) -> PlaceCatalog {
        PlaceCatalog::new(self.locations.iter().filter_map(|(id, location)| {
            let [latitude, longitude] = location.coords;
            if !latitude.is_finite() || !longitude.is_finite() {
                warn!("{}", SettingsError::InvalidCoordinates(id.clone()));
                return None;
            }
            let radius = if location.radius > 0. {
                location.radius
            } else {
                DEFAULT_CAPTURE_RADIUS_M
            };
            Some(
                Place::new(id.as_str(), location.name.as_str(), Coordinate::from(location.coords))
                    .with_events(location.events.iter().map(String::as_str))
                    .with_capture_radius(radius),
            )
        }))
    }

    /// Thresholds for the pipeline, if every one of them is usable.
    pub fn validated_thresholds(&self) -> Result<Thresholds, SettingsError> {
        check_threshold("speed", self.speed_threshold)?;
        check_threshold("running", self.running_threshold)?;
        check_threshold("stay", self.stay_threshold)?;
        Ok(self.thresholds())
    }

    /// Puts defaults in place of thresholds that can't be used. Returns whether anything changed.
    pub fn reset_invalid_thresholds(&mut self) -> bool {
        let mut replaced = false;
        for (name, value, default) in [
            ("speed", &mut self.speed_threshold, DEFAULT_SPEED_THRESHOLD),
            ("running", &mut self.running_threshold, DEFAULT_RUNNING_THRESHOLD),
            ("stay", &mut self.stay_threshold, DEFAULT_STAY_THRESHOLD_S),
        ] {
            if let Err(e) = check_threshold(name, *value) {
                warn!("{e}, using {default} instead");
                *value = default;
                replaced = true;
            }
        }
        replaced
    }

    /// Applies threshold changes after validating all of them.
    pub fn update_thresholds(
        &mut self,
        speed: Option<f64>,
        running: Option<f64>,
        stay: Option<f64>,
    ) -> Result<(), SettingsError> {
        for (name, value) in [("speed", speed), ("running", running), ("stay", stay)] {
            if let Some(value) = value {
                check_threshold(name, value)?;
            }
        }
        self.speed_threshold = speed.unwrap_or(self.speed_threshold);
        self.running_threshold = running.unwrap_or(self.running_threshold);
        self.stay_threshold = stay.unwrap_or(self.stay_threshold);
        Ok(())
    }
}

fn check_threshold(name: &'static str, value: f64) -> Result<(), SettingsError> {
    if value.is_finite() && value > 0. {
        Ok(())
    } else {
        Err(SettingsError::InvalidThreshold { name, value })
    }
}

/// Loads and saves [UserSettings].
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(SETTINGS_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn load(&self) -> Result<UserSettings> {
        let content = tokio::fs::read_to_string(&self.path).await?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Loads settings, creating the default file if there's none. A malformed file is left
    /// untouched and defaults are used instead, the same goes for individual thresholds that
    /// aren't positive numbers.
    pub async fn load_or_create(&self) -> Result<UserSettings> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => match serde_json::from_str::<UserSettings>(&content) {
                Ok(mut settings) => {
                    settings.reset_invalid_thresholds();
                    Ok(settings)
                }
                Err(e) => {
                    warn!("Settings in {:?} are malformed, using defaults: {e}", self.path);
                    Ok(UserSettings::default())
                }
            },
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("Creating default settings in {:?}", self.path);
                let settings = UserSettings::default();
                self.save(&settings).await?;
                Ok(settings)
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn save(&self, settings: &UserSettings) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let content = serde_json::to_string_pretty(settings)?;
        tokio::fs::write(&self.path, content).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use chrono::NaiveTime;
    use tempfile::tempdir;

    use crate::inference::stay::StayEmission;

    use super::{SettingsError, SettingsStore, UserSettings};

    #[tokio::test]
    async fn test_load_or_create_writes_defaults() -> Result<()> {
        let dir = tempdir()?;
        let store = SettingsStore::in_dir(dir.path());

        let settings = store.load_or_create().await?;
        assert_eq!(settings, UserSettings::default());
        assert!(store.path().exists());
        assert_eq!(store.load().await?, settings);
        Ok(())
    }

    #[tokio::test]
    async fn test_legacy_document_loads() -> Result<()> {
        let dir = tempdir()?;
        let store = SettingsStore::in_dir(dir.path());
        tokio::fs::write(
            store.path(),
            r#"{
              "sleep_time": "23:30",
              "wake_time": "06:45",
              "locations": {
                "gym": { "name": "Gym", "events": ["Lifting"], "coords": [31.0, 121.0] }
              },
              "speed_threshold": 4.0,
              "running_threshold": 2.5,
              "stay_threshold": 120,
              "personalization": {},
              "notes": [],
              "activities": []
            }"#,
        )
        .await?;

        let settings = store.load_or_create().await?;
        assert_eq!(settings.wake_time, NaiveTime::from_hms_opt(6, 45, 0).unwrap());
        assert_eq!(settings.stay_threshold, 120.);
        assert_eq!(settings.stay_reporting, StayEmission::Once);

        let catalog = settings.catalog();
        assert_eq!(catalog.len(), 1);
        let gym = catalog.get("gym").unwrap();
        assert_eq!(&*gym.default_label(), "Lifting");
        assert_eq!(gym.capture_radius_m, 100.);
        Ok(())
    }

    #[tokio::test]
    async fn test_malformed_settings_are_not_overwritten() -> Result<()> {
        let dir = tempdir()?;
        let store = SettingsStore::in_dir(dir.path());
        tokio::fs::write(store.path(), "{ not json").await?;

        assert_eq!(store.load_or_create().await?, UserSettings::default());
        assert_eq!(tokio::fs::read_to_string(store.path()).await?, "{ not json");
        Ok(())
    }

    #[tokio::test]
    async fn test_unusable_thresholds_fall_back_to_defaults() -> Result<()> {
        let dir = tempdir()?;
        let store = SettingsStore::in_dir(dir.path());
        tokio::fs::write(
            store.path(),
            r#"{"speed_threshold": 7.5, "running_threshold": -1, "stay_threshold": 0}"#,
        )
        .await?;

        let settings = store.load_or_create().await?;
        assert_eq!(settings.speed_threshold, 7.5);
        assert_eq!(settings.running_threshold, 3.);
        assert_eq!(settings.stay_threshold, 60.);
        assert!(settings.validated_thresholds().is_ok());

        let strict = store.load().await?;
        assert_eq!(
            strict.validated_thresholds(),
            Err(SettingsError::InvalidThreshold {
                name: "running",
                value: -1.
            })
        );
        Ok(())
    }

    #[test]
    fn test_reset_invalid_thresholds() {
        let mut settings = UserSettings {
            stay_threshold: f64::NAN,
            ..UserSettings::default()
        };
        assert!(settings.validated_thresholds().is_err());
        assert!(settings.reset_invalid_thresholds());
        assert_eq!(settings.stay_threshold, 60.);
        assert!(!settings.reset_invalid_thresholds());
    }

    #[test]
    fn test_default_catalog() {
        let catalog = UserSettings::default().catalog();
        assert_eq!(catalog.len(), 5);
        assert_eq!(&*catalog.get("canteen").unwrap().name, "Cafeteria");
    }

    #[test]
    fn test_update_thresholds_is_all_or_nothing() {
        let mut settings = UserSettings::default();
        let result = settings.update_thresholds(Some(4.), None, Some(-1.));
        assert_eq!(
            result,
            Err(SettingsError::InvalidThreshold {
                name: "stay",
                value: -1.
            })
        );
        assert_eq!(settings.speed_threshold, 5.);

        settings.update_thresholds(None, Some(2.), Some(30.)).unwrap();
        let thresholds = settings.thresholds();
        assert_eq!(thresholds.running, 2.);
        assert_eq!(thresholds.stay, 30.);
        assert_eq!(thresholds.speed, 5.);
    }
}
