pub mod activities;
pub mod config;
pub mod process;
pub mod replay;
pub mod status;

use std::{path::PathBuf, time::Duration};

use activities::{process_activities_command, process_clear_command, ActivitiesCommand};
use anyhow::Result;
use clap::{Parser, Subcommand};
use config::{
    process_config_command, process_places_command, process_today_command, ConfigCommand,
};
use process::{daemon_path, kill_previous_servers, restart_server};
use replay::{process_replay_command, ReplayCommand};
use status::process_status_command;
use tracing::level_filters::LevelFilter;

use crate::{
    daemon::{
        start_daemon,
        storage::{activity_storage::JsonActivityStorage, status_storage::StatusStorage},
        DEFAULT_COLLECTION_INTERVAL,
    },
    settings::SettingsStore,
    utils::{
        dir::application_dir,
        logging::{enable_logging, CLI_PREFIX, DAEMON_PREFIX},
    },
};

#[derive(Parser, Debug)]
#[command(name = "daytrack", version, long_about = None)]
#[command(about = "Tracks where you spend your day", long_about = None)]
struct Args {
    #[command(subcommand)]
    commands: Commands,
    #[arg(
        long,
        global = true,
        help = "Application directory. By default tries to save into $XDG_STATE_HOME or $HOME/.local/state"
    )]
    dir: Option<PathBuf>,
    #[arg(long, global = true, help = "Enable logging")]
    log: bool,
}

#[derive(Subcommand, Debug)]
#[command(version, about, long_about = None)]
enum Commands {
    #[command(about = "Starts a daemon for the application")]
    Init {
        #[arg(long, help = "Seconds between location samples")]
        interval: Option<u64>,
    },
    #[command(about = "Run a daemon directly in current console. Used for debugging")]
    Serve {
        #[arg(long, default_value_t = DEFAULT_COLLECTION_INTERVAL.as_secs(), help = "Seconds between location samples")]
        interval: u64,
    },
    #[command(about = "Stop currently running daemon.")]
    Stop {},
    #[command(about = "Show live speed and the tracking log")]
    Status {},
    #[command(about = "Show recorded activities of a day")]
    Activities {
        #[command(flatten)]
        command: ActivitiesCommand,
    },
    #[command(about = "Remove every recorded activity")]
    ClearActivities {},
    #[command(about = "List known places")]
    Places {},
    #[command(about = "Show or change settings")]
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
    #[command(about = "Show wake up and sleep time along with the weather theme")]
    Today {},
    #[command(about = "Run a recorded trace through the tracker and print what it detects")]
    Replay {
        #[command(flatten)]
        command: ReplayCommand,
    },
}

pub async fn run_cli() -> Result<()> {
    let args = Args::parse();
    let dir = application_dir(args.dir)?;

    let logging_level = if args.log {
        Some(LevelFilter::TRACE)
    } else {
        None
    };
    let prefix = if matches!(args.commands, Commands::Serve { .. }) {
        DAEMON_PREFIX
    } else {
        CLI_PREFIX
    };
    enable_logging(prefix, &dir, logging_level, args.log)?;

    let settings = SettingsStore::in_dir(&dir);
    let activities = JsonActivityStorage::in_dir(&dir);

    match args.commands {
        Commands::Init { interval } => restart_server(&dir, interval.map(Duration::from_secs)),
        Commands::Stop {} => {
            let killed = kill_previous_servers(&daemon_path()?)?;
            println!("Stopped {killed} daemons");
            Ok(())
        }
        Commands::Serve { interval } => {
            start_daemon(dir, Duration::from_secs(interval.max(1))).await
        }
        Commands::Status {} => process_status_command(&StatusStorage::in_dir(&dir)).await,
        Commands::Activities { command } => process_activities_command(&activities, command).await,
        Commands::ClearActivities {} => process_clear_command(&activities).await,
        Commands::Places {} => process_places_command(&settings).await,
        Commands::Config { command } => {
            process_config_command(&settings, &activities, command).await
        }
        Commands::Today {} => process_today_command(&settings).await,
        Commands::Replay { command } => process_replay_command(&settings, command).await,
    }
}
