//! Path and directory management.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;

use crate::error::{Error, Result};
use crate::fs::naming::sanitize_path_component;
use crate::media::MediaKind;

/// File name of the persisted session inside the data directory.
pub const SESSION_FILE_NAME: &str = "session.json";

/// File name of the config inside the config directory.
pub const CONFIG_FILE_NAME: &str = "config.toml";

fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("com", "instagram-private", "instagram-private")
        .ok_or_else(|| Error::Config("Could not determine a home directory".into()))
}

/// Where `save()` writes the session when no path is configured.
pub fn default_session_path() -> Result<PathBuf> {
    Ok(project_dirs()?.data_dir().join(SESSION_FILE_NAME))
}

/// Config file looked up when `--config` is not given.
pub fn default_config_path() -> Result<PathBuf> {
    Ok(project_dirs()?.config_dir().join(CONFIG_FILE_NAME))
}

/// Folder a downloaded item of the given kind lands in.
pub fn media_folder(base: &Path, kind: MediaKind) -> PathBuf {
    base.join(kind.folder_name())
}

/// Per-owner download folder under `base`. Items with no owner name go to `unknown`.
pub fn user_folder(base: &Path, username: &str) -> Result<PathBuf> {
    let username = username.trim().trim_start_matches('@');
    if username.is_empty() {
        return Ok(base.join("unknown"));
    }
    Ok(base.join(sanitize_path_component(username)?))
}

fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}

/// Create the parent directory of a file path.
pub fn ensure_parent(path: &Path) -> Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => ensure_dir(parent),
        _ => Ok(()),
    }
}
