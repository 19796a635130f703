use std::{
    env,
    path::{Path, PathBuf},
    process::Stdio,
    time::Duration,
};

use anyhow::{anyhow, Result};
use sysinfo::{get_current_pid, Signal, System};
use tracing::info;

const DAEMON_EXECUTABLE: &str = "daytrack-daemon";

/// The daemon binary is installed next to the cli.
pub fn to_daemon_path(mut path: PathBuf) -> PathBuf {
    path.set_file_name(DAEMON_EXECUTABLE);
    #[cfg(windows)]
    {
        path.set_extension("exe");
    }
    path
}

pub fn daemon_path() -> Result<PathBuf> {
    Ok(to_daemon_path(env::current_exe()?))
}

/// Stops every other process started from `name`. Returns how many were stopped.
pub fn kill_previous_servers(name: &Path) -> Result<usize> {
    let system = System::new_all();
    let current_id = get_current_pid().map_err(|e| anyhow!("Can't determine own pid: {e}"))?;
    let mut killed = 0;
    for (pid, process) in system.processes().iter() {
        if *pid == current_id {
            continue;
        }
        if matches!(process.parent(), Some(p) if p == current_id) {
            continue;
        }

        if process
            .exe()
            .filter(|v| v.exists())
            .filter(|v| name == *v)
            .is_some()
        {
            info!("Stopping {pid}");
            // This will forcefully terminate the process on Windows. Anything better will require a
            // lot more work.
            if process.kill_with(Signal::Term).is_none() {
                process.kill();
            }
            process.wait();
            killed += 1;
        }
    }
    Ok(killed)
}

/// Shuts down previous daemons and starts a new one. The daemon detaches itself.
pub fn restart_server(dir: &Path, interval: Option<Duration>) -> Result<()> {
    let daemon = daemon_path()?;
    if !daemon.exists() {
        return Err(anyhow!("Daemon executable {daemon:?} is missing"));
    }
    kill_previous_servers(&daemon)?;

    let mut command = std::process::Command::new(daemon);
    command.arg("--dir").arg(dir);
    if let Some(interval) = interval {
        command.arg("--interval").arg(interval.as_secs().to_string());
    }
    command.stdin(Stdio::null());
    command.stdout(Stdio::null());

    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        command.process_group(0);
    }

    println!("Spawning");
    let status = command.status()?;
    if !status.success() {
        return Err(anyhow!("Daemon failed to start: {status}"));
    }
    println!("Success");
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::to_daemon_path;

    #[test]
    fn test_daemon_is_next_to_cli() {
        let path = to_daemon_path(PathBuf::from("/usr/local/bin/daytrack"));
        assert_eq!(path.parent(), Some(PathBuf::from("/usr/local/bin").as_path()));
        assert!(path
            .file_name()
            .and_then(|v| v.to_str())
            .is_some_and(|v| v.starts_with("daytrack-daemon")));
    }
}
