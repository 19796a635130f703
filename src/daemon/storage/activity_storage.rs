use std::{
    future::Future,
    io::SeekFrom,
    ops::Deref,
    path::{Path, PathBuf},
};

use anyhow::Result;
use chrono::{Duration, NaiveDate};
use fs4::tokio::AsyncFileExt;
use tokio::{
    fs::File,
    io::{AsyncReadExt, AsyncSeekExt, AsyncWriteExt},
};
use tracing::{debug, warn};

use crate::utils::time::format_record_date;

use super::entities::{ActivityEntity, ActivityLogDocument};

pub const ACTIVITIES_FILE: &str = "activities.json";

/// Interface for abstracting storage of activities.
pub trait ActivityStorage {
    /// Adds an activity. A repeated record of the last stored stay replaces it instead.
    fn append(&self, activity: ActivityEntity) -> impl Future<Output = Result<()>>;

    /// Every stored activity in the order it was recorded.
    fn load(&self) -> impl Future<Output = Result<Vec<ActivityEntity>>> + Send;

    fn clear(&self) -> impl Future<Output = Result<()>>;
}

impl<T: Deref> ActivityStorage for T
where
    T::Target: ActivityStorage,
{
    fn append(&self, activity: ActivityEntity) -> impl Future<Output = Result<()>> {
        self.deref().append(activity)
    }

    fn load(&self) -> impl Future<Output = Result<Vec<ActivityEntity>>> + Send {
        self.deref().load()
    }

    fn clear(&self) -> impl Future<Output = Result<()>> {
        self.deref().clear()
    }
}

/// The main realization of [ActivityStorage].
pub struct JsonActivityStorage {
    path: PathBuf,
}

impl JsonActivityStorage {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(ACTIVITIES_FILE))
    }

    pub async fn load_for(&self, date: NaiveDate) -> Result<Vec<ActivityEntity>> {
        let date = format_record_date(date);
        Ok(self
            .load()
            .await?
            .into_iter()
            .filter(|v| v.date == date)
            .collect())
    }

    async fn open_for_update(&self) -> Result<File> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(File::options()
            .write(true)
            .create(true)
            .read(true)
            .truncate(false)
            .open(&self.path)
            .await?)
    }

    /// Rewrites the document under an exclusive lock.
    async fn update(&self, modify: impl FnOnce(&mut Vec<ActivityEntity>)) -> Result<()> {
        let mut file = self.open_for_update().await?;
        // Semi-safe acquire-release for a file
        file.lock_exclusive()?;
        let result = Self::update_with_file(&mut file, modify).await;
        file.unlock_async().await?;
        result
    }

    async fn update_with_file(
        file: &mut File,
        modify: impl FnOnce(&mut Vec<ActivityEntity>),
    ) -> Result<()> {
        let mut content = String::new();
        file.read_to_string(&mut content).await?;
        let mut document = parse_document(&content);

        modify(&mut document.activities);

        let buffer = serde_json::to_vec_pretty(&document)?;
        file.seek(SeekFrom::Start(0)).await?;
        file.set_len(0).await?;
        file.write_all(&buffer).await?;
        file.flush().await?;
        file.sync_data().await?;
        Ok(())
    }
}

impl ActivityStorage for JsonActivityStorage {
    async fn append(&self, activity: ActivityEntity) -> Result<()> {
        debug!("Saving {activity:?}");
        self.update(move |activities| collapse_activity(activities, activity))
            .await
    }

    async fn load(&self) -> Result<Vec<ActivityEntity>> {
        let mut file = match File::open(&self.path).await {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(vec![]),
            Err(e) => Err(e)?,
        };
        file.lock_shared()?;
        let mut content = String::new();
        let result = file.read_to_string(&mut content).await;
        file.unlock_async().await?;
        result?;
        Ok(parse_document(&content).activities)
    }

    async fn clear(&self) -> Result<()> {
        self.update(|activities| activities.clear()).await
    }
}

fn parse_document(content: &str) -> ActivityLogDocument {
    if content.trim().is_empty() {
        return ActivityLogDocument::default();
    }
    match serde_json::from_str(content) {
        Ok(v) => v,
        Err(e) => {
            // Best effort storage, a broken log is started over.
            warn!("Activity log is corrupted, starting a new one {e}");
            ActivityLogDocument::default()
        }
    }
}

/// Records of one stay can start at slightly different seconds because every record derives its
/// start from the current time and the stay duration.
const MAX_START_DRIFT: Duration = Duration::seconds(2);

/// Adds `activity` to the log. When the last activity is an earlier record of the same stay it's
/// replaced, so that a stay always ends up as a single entry with its latest duration.
fn collapse_activity(activities: &mut Vec<ActivityEntity>, activity: ActivityEntity) {
    match activities.last_mut() {
        Some(last)
            if last.location == activity.location
                && last.event_type == activity.event_type
                && matches!(
                    (last.started_at, activity.started_at),
                    (Some(a), Some(b)) if (a - b).abs() <= MAX_START_DRIFT
                ) =>
        {
            *last = activity;
        }
        _ => activities.push(activity),
    }
}
