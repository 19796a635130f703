use std::fmt::Display;

use anyhow::Result;
use chrono::{Local, NaiveDate};
use chrono_english::parse_date_string;
use clap::{CommandFactory, Parser, ValueEnum};

use crate::{
    daemon::storage::{
        activity_storage::{ActivityStorage, JsonActivityStorage},
        entities::ActivityEntity,
    },
    utils::time::{format_duration, format_record_date},
};

use super::Args;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum DateStyle {
    Uk,
    Us,
}

impl From<DateStyle> for chrono_english::Dialect {
    fn from(value: DateStyle) -> Self {
        match value {
            DateStyle::Uk => Self::Uk,
            DateStyle::Us => Self::Us,
        }
    }
}

impl Display for DateStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DateStyle::Uk => write!(f, "uk"),
            DateStyle::Us => write!(f, "us"),
        }
    }
}

const DEFAULT_SHOWN_ACTIVITIES: usize = 10;

#[derive(Debug, Parser)]
pub struct ActivitiesCommand {
    #[arg(
        long,
        short,
        help = "Day to show. Examples are \"today\", \"yesterday\", \"15/03/2025\". Defaults to today"
    )]
    date: Option<String>,
    #[arg(long, default_value_t = DateStyle::Uk, help = "Style of dates used during parsing. For Uk it's day/month/year. For Us it's month/day/year")]
    date_style: DateStyle,
    #[arg(long, short, default_value_t = DEFAULT_SHOWN_ACTIVITIES, help = "Maximum number of activities to show")]
    limit: usize,
}

/// Prints activities of a single day, newest first.
pub async fn process_activities_command(
    storage: &JsonActivityStorage,
    ActivitiesCommand {
        date,
        date_style,
        limit,
    }: ActivitiesCommand,
) -> Result<()> {
    let day = parse_day(date, date_style)?;
    let activities = storage.load_for(day).await?;
    let shown = latest_activities(&activities, limit);

    if shown.is_empty() {
        println!("No activities recorded on {}", format_record_date(day));
        return Ok(());
    }
    for activity in shown {
        println!(
            "{} {}-{}\t{}\t{}\t{}",
            activity.date,
            activity.start_time,
            activity.end_time,
            format_duration(chrono::Duration::seconds(activity.duration)),
            activity.location,
            activity.event_type
        );
    }
    Ok(())
}

pub async fn process_clear_command(storage: &JsonActivityStorage) -> Result<()> {
    let count = storage.load().await?.len();
    storage.clear().await?;
    println!("Removed {count} activities");
    Ok(())
}

fn parse_day(date: Option<String>, date_style: DateStyle) -> Result<NaiveDate> {
    let now = Local::now();
    match date.map(|s| parse_date_string(&s, now, date_style.into())) {
        Some(Ok(v)) => Ok(v.date_naive()),
        Some(Err(e)) => Err(Args::command()
            .error(
                clap::error::ErrorKind::ValueValidation,
                format!("Failed to validate date {e}"),
            )
            .into()),
        None => Ok(now.date_naive()),
    }
}

/// Newest `limit` activities, newest first. The log is in recording order.
fn latest_activities(activities: &[ActivityEntity], limit: usize) -> Vec<&ActivityEntity> {
    activities.iter().rev().take(limit).collect()
}
