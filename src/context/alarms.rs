use anyhow::Result;
use chrono::NaiveTime;
use tracing::{info, warn};

use crate::settings::UserSettings;

pub trait AlarmReader {
    fn alarms(&self) -> Result<Vec<NaiveTime>>;
}

/// Reading the alarm clock requires platform support that doesn't exist yet. Returns a fixed
/// set of alarms.
pub struct StubAlarmReader;

impl AlarmReader for StubAlarmReader {
    fn alarms(&self) -> Result<Vec<NaiveTime>> {
        Ok([(7, 0), (8, 30), (23, 0)]
            .into_iter()
            .filter_map(|(h, m)| NaiveTime::from_hms_opt(h, m, 0))
            .collect())
    }
}

/// Earliest alarm is the wake time, latest one is the sleep time.
pub fn wake_and_sleep(alarms: &[NaiveTime]) -> Option<(NaiveTime, NaiveTime)> {
    let wake = alarms.iter().min()?;
    let sleep = alarms.iter().max()?;
    Some((*wake, *sleep))
}

/// Updates wake and sleep time from the alarms. Returns whether anything changed.
pub fn refresh_schedule(settings: &mut UserSettings, reader: &dyn AlarmReader) -> bool {
    let alarms = match reader.alarms() {
        Ok(alarms) => alarms,
        Err(e) => {
            warn!("Failed to read alarms {e:?}");
            return false;
        }
    };
    let Some((wake, sleep)) = wake_and_sleep(&alarms) else {
        return false;
    };
    if settings.wake_time == wake && settings.sleep_time == sleep {
        return false;
    }
    info!("Alarm data updated: wake up {wake}, sleep {sleep}");
    settings.wake_time = wake;
    settings.sleep_time = sleep;
    true
}
