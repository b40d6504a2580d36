use std::path::{Path, PathBuf};
use anyhow::{anyhow, Result};
use directories::ProjectDirs;

/// Directory holding the manifest, the workspaces and the version report by default.
pub fn get_global_config_dir() -> Result<PathBuf> {
    let proj_dirs = ProjectDirs::from("", "", "gotools")
        .ok_or_else(|| anyhow!("Could not determine the user config directory"))?;
    Ok(proj_dirs.config_dir().to_path_buf())
}

/// Default manifest location.
pub fn default_manifest(config_dir: &Path) -> PathBuf {
    config_dir.join("config")
}

/// Default workspace root.
pub fn default_workspaces(config_dir: &Path) -> PathBuf {
    config_dir.join("mods")
}

/// Default version report location.
pub fn default_report(config_dir: &Path) -> PathBuf {
    config_dir.join("versions")
}

/// Optional settings file inside the config directory.
pub fn default_settings_file(config_dir: &Path) -> PathBuf {
    config_dir.join("settings.toml")
}
