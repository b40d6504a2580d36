use std::path::Path;
use anyhow::{Context, Result};

/// The resolved version of one declared tool. `version` is empty if it failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportEntry {
    pub name: String,
    pub version: String,
}

/// The versions of all tools, in manifest order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    pub entries: Vec<ReportEntry>,
}

impl Report {
    /// One `name version` line per tool.
    pub fn render(&self) -> String {
        self.entries
            .iter()
            .map(|e| format!("{} {}\n", e.name, e.version))
            .collect()
    }

    /// Overwrites the report file at `path`, creating its directory if needed.
    ///
    /// # Errors
    /// Returns an error if the file can't be written.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("error creating version file directory {}", parent.display()))?;
        }
        std::fs::write(path, self.render())
            .with_context(|| format!("error writing version file {}", path.display()))
    }

    /// Names of the tools that did not resolve to a version.
    pub fn failed(&self) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|e| e.version.is_empty())
            .map(|e| e.name.as_str())
            .collect()
    }
}
