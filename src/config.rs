use std::path::{Path, PathBuf};
use anyhow::{Context, Result};
use serde::Deserialize;
use crate::global::utils::{default_manifest, default_report, default_workspaces};
use crate::installer::InstallOptions;
use crate::scheduler::default_workers;

/// Contents of the optional `settings.toml`.
///
/// Relative paths are resolved against the directory holding the file.
#[derive(Deserialize, Debug, Default, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct SettingsFile {
    pub manifest: Option<PathBuf>,
    pub workspaces: Option<PathBuf>,
    pub report: Option<PathBuf>,
    pub workers: Option<usize>,
    pub copy_replace: Option<bool>,
    pub go: Option<PathBuf>,
}

impl SettingsFile {
    /// Loads the settings file, or the empty settings if it does not exist.
    ///
    /// # Errors
    /// Returns an error if the file exists but can't be read or parsed.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<SettingsFile> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(SettingsFile::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("error reading settings {}", path.display()))?;
        let mut file: SettingsFile = toml::from_str(&content)
            .with_context(|| format!("error parsing settings {}", path.display()))?;
        if let Some(base) = path.parent() {
            for p in [&mut file.manifest, &mut file.workspaces, &mut file.report] {
                if let Some(p) = p.as_mut() {
                    if p.is_relative() {
                        *p = base.join(&*p);
                    }
                }
            }
        }
        Ok(file)
    }
}

/// Values given on the command line or through the environment.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub manifest: Option<PathBuf>,
    pub workspaces: Option<PathBuf>,
    pub report: Option<PathBuf>,
    pub workers: Option<usize>,
    pub copy_replace: Option<bool>,
    pub go: Option<PathBuf>,
    pub update: bool,
    pub strict: bool,
}

/// The complete configuration of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub manifest: PathBuf,
    pub workspaces: PathBuf,
    pub report: PathBuf,
    pub update: bool,
    pub copy_replace: bool,
    pub workers: usize,
    pub go: PathBuf,
    /// Refuse manifests where several declarations share a workspace.
    pub strict: bool,
}

impl Settings {
    /// Layers overrides over the settings file over the defaults below `config_dir`.
    pub fn resolve(config_dir: &Path, file: SettingsFile, overrides: Overrides) -> Settings {
        Settings {
            manifest: overrides
                .manifest
                .or(file.manifest)
                .unwrap_or_else(|| default_manifest(config_dir)),
            workspaces: overrides
                .workspaces
                .or(file.workspaces)
                .unwrap_or_else(|| default_workspaces(config_dir)),
            report: overrides
                .report
                .or(file.report)
                .unwrap_or_else(|| default_report(config_dir)),
            update: overrides.update,
            copy_replace: overrides.copy_replace.or(file.copy_replace).unwrap_or(true),
            workers: overrides.workers.or(file.workers).unwrap_or_else(default_workers),
            go: overrides.go.or(file.go).unwrap_or_else(|| PathBuf::from("go")),
            strict: overrides.strict,
        }
    }

    pub fn install_options(&self) -> InstallOptions {
        InstallOptions {
            workspaces: self.workspaces.clone(),
            update: self.update,
            copy_replace: self.copy_replace,
        }
    }
}
