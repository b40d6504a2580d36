#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use gotools::manifest::VersionReq;
use gotools::modfile::Replace;
use gotools::toolchain::{CommandError, PackageManager};

const VERSION_FILE: &str = ".version";

/// A package manager that records every call instead of running `go`.
#[derive(Default)]
pub struct FakeToolchain {
    pub calls: Mutex<Vec<String>>,
    pub versions: Mutex<HashMap<String, String>>,
    pub failing: HashSet<String>,
    pub panicking: HashSet<String>,
    pub module_files: HashMap<String, PathBuf>,
    pub install_delay: Option<Duration>,
    /// Keep the fetched version in the workspace instead of the `versions` map.
    pub workspace_versions: bool,
    active: AtomicUsize,
    pub max_active: AtomicUsize,
}

impl FakeToolchain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_fetch(mut self, module: &str) -> Self {
        self.failing.insert(module.to_string());
        self
    }

    pub fn panicking_install(mut self, module: &str) -> Self {
        self.panicking.insert(module.to_string());
        self
    }

    pub fn with_module_file(mut self, module: &str, path: &Path) -> Self {
        self.module_files.insert(module.to_string(), path.to_path_buf());
        self
    }

    pub fn with_install_delay(mut self, delay: Duration) -> Self {
        self.install_delay = Some(delay);
        self
    }

    pub fn with_workspace_versions(mut self) -> Self {
        self.workspace_versions = true;
        self
    }

    pub fn set_version(&self, module: &str, version: &str) {
        self.versions.lock().unwrap().insert(module.to_string(), version.to_string());
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn take_calls(&self) -> Vec<String> {
        std::mem::take(&mut *self.calls.lock().unwrap())
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn fail(what: &str) -> CommandError {
        CommandError::Spawn {
            command: what.to_string(),
            source: std::io::Error::other("fake failure"),
        }
    }
}

impl PackageManager for FakeToolchain {
    fn init(&self, dir: &Path) -> Result<(), CommandError> {
        self.record("init".to_string());
        std::fs::write(dir.join("go.mod"), "module tmpmod\n").map_err(|e| CommandError::Spawn {
            command: "init".to_string(),
            source: e,
        })
    }

    fn fetch(&self, dir: &Path, module: &str, version: &VersionReq) -> Result<(), CommandError> {
        self.record(format!("fetch {module}@{version}"));
        if self.failing.contains(module) {
            return Err(Self::fail("fetch"));
        }
        if self.workspace_versions {
            let resolved = match version {
                VersionReq::Pinned(v) => v.clone(),
                VersionReq::Upgrade => "v1.0.0".to_string(),
            };
            std::fs::write(dir.join(VERSION_FILE), resolved).map_err(|_| Self::fail("fetch"))?;
        }
        Ok(())
    }

    fn module_file(&self, _dir: &Path, module: &str) -> Result<Option<PathBuf>, CommandError> {
        self.record(format!("module_file {module}"));
        Ok(self.module_files.get(module).cloned())
    }

    fn module_version(&self, dir: &Path, module: &str) -> Result<String, CommandError> {
        self.record(format!("version {module}"));
        if self.workspace_versions {
            return std::fs::read_to_string(dir.join(VERSION_FILE)).map_err(|_| Self::fail("version"));
        }
        Ok(self
            .versions
            .lock()
            .unwrap()
            .get(module)
            .cloned()
            .unwrap_or_else(|| "v1.0.0".to_string()))
    }

    fn replace(&self, _dir: &Path, replace: &Replace) -> Result<(), CommandError> {
        self.record(format!("replace {}", replace.edit_arg()));
        Ok(())
    }

    fn tidy(&self, _dir: &Path) -> Result<(), CommandError> {
        self.record("tidy".to_string());
        Ok(())
    }

    fn install(&self, _dir: &Path, module: &str, tags: &str) -> Result<(), CommandError> {
        self.record(format!("install [{tags}] {module}"));
        if self.panicking.contains(module) {
            panic!("install of {module} blew up");
        }
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(now, Ordering::SeqCst);
        if let Some(delay) = self.install_delay {
            std::thread::sleep(delay);
        }
        self.active.fetch_sub(1, Ordering::SeqCst);
        Ok(())
    }
}
