use std::{env, io, path::PathBuf};

use anyhow::{anyhow, Result};

const APPLICATION_DIR: &str = "daytrack";

cfg_if::cfg_if! {
    if #[cfg(windows)] {
        fn platform_state_dir() -> Result<PathBuf> {
            env::var("APPDATA")
                .map(PathBuf::from)
                .map_err(|_| anyhow!("APPDATA should be present on Windows"))
        }
    } else if #[cfg(target_os = "macos")] {
        use std::path::Path;

        fn platform_state_dir() -> Result<PathBuf> {
            env::var("HOME")
                .map(|home| Path::new(&home).join("Library/Application Support"))
                .map_err(|_| anyhow!("Couldn't find HOME"))
        }
    } else {
        use std::path::Path;

        fn platform_state_dir() -> Result<PathBuf> {
            env::var("XDG_STATE_HOME")
                .map(PathBuf::from)
                .or_else(|_| env::var("HOME").map(|home| Path::new(&home).join(".local/state")))
                .map_err(|_| anyhow!("Couldn't find neither XDG_STATE_HOME nor HOME"))
        }
    }
}

/// Resolves the directory holding settings, activities, status and logs, creating it when
/// needed. `dir` overrides the platform default.
pub fn application_dir(dir: Option<PathBuf>) -> Result<PathBuf> {
    let path = match dir {
        Some(dir) => dir,
        None => platform_state_dir()?.join(APPLICATION_DIR),
    };

    match std::fs::create_dir_all(&path) {
        Ok(_) => Ok(path),
        Err(v) if v.kind() == io::ErrorKind::AlreadyExists => Ok(path),
        Err(v) => Err(v.into()),
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;
    use tempfile::tempdir;

    use super::application_dir;

    #[test]
    fn test_explicit_dir_is_created() -> Result<()> {
        let root = tempdir()?;
        let dir = root.path().join("nested/app");
        assert_eq!(application_dir(Some(dir.clone()))?, dir);
        assert!(dir.is_dir());
        Ok(())
    }
}
