use ansi_term::Colour;
use anyhow::Result;
use chrono::{Duration, Local, Utc};

use crate::daemon::storage::{entities::StatusEntity, status_storage::StatusStorage};

/// Status older than this most likely means the daemon isn't running.
const STALE_AFTER: Duration = Duration::minutes(2);

pub async fn process_status_command(storage: &StatusStorage) -> Result<()> {
    let Some(status) = storage.load().await? else {
        println!("The daemon hasn't reported anything yet. Start it with `daytrack init`");
        return Ok(());
    };
    print_status(&status);
    Ok(())
}

fn speed_colour(speed: f64, threshold: f64) -> Colour {
    if speed > threshold {
        Colour::Red
    } else {
        Colour::Green
    }
}

fn print_status(status: &StatusEntity) {
    let updated = status.updated_at.with_timezone(&Local);
    if Utc::now() - status.updated_at > STALE_AFTER {
        println!(
            "{}",
            Colour::Yellow.paint(format!(
                "Last update at {}, the daemon might not be running",
                updated.format("%x %H:%M:%S")
            ))
        );
    }

    let colour = speed_colour(status.speed, status.speed_threshold);
    println!(
        "Speed\t{}",
        colour.paint(format!("{:.2} m/s", status.speed))
    );
    let colors = status.theme.colors();
    println!(
        "Theme\t{} ({} {} {})",
        status.theme, colors.primary, colors.secondary, colors.background
    );

    if status.log.is_empty() {
        return;
    }
    println!();
    for entry in status.log.iter().rev() {
        println!(
            "{}\t{}\t{}\t{}",
            entry.moment.with_timezone(&Local).format("%H:%M:%S"),
            entry.title,
            entry.duration.as_deref().unwrap_or(""),
            entry.detail
        );
    }
}
