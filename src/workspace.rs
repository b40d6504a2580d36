use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use anyhow::{Context, Result};
use crate::manifest::Tool;

/// Module metadata written by the package manager when a workspace is initialized.
pub const MODULE_FILE: &str = "go.mod";
/// Lock file holding checksums of the resolved dependencies.
pub const SUM_FILE: &str = "go.sum";
/// Files removed before a workspace is initialized again.
pub const INIT_FILES: [&str; 2] = [MODULE_FILE, SUM_FILE];

/// The isolated module directory of one tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    dir: PathBuf,
}

impl Workspace {
    /// The workspace of `tool` below `root`. Nothing is created on disk.
    pub fn for_tool(root: &Path, tool: &Tool) -> Workspace {
        Workspace { dir: tool.workspace_path(root) }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Creates the workspace directory if it does not exist yet.
    ///
    /// On Unix the directory is only accessible by the current user.
    pub fn ensure(&self) -> Result<()> {
        let mut builder = std::fs::DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            builder.mode(0o700);
        }
        builder
            .create(&self.dir)
            .with_context(|| format!("could not create workspace {}", self.dir.display()))
    }

    /// Checks whether `file` exists inside the workspace.
    pub fn contains(&self, file: &str) -> bool {
        self.dir.join(file).exists()
    }

    /// Removes the given files, ignoring those that are already gone.
    pub fn reset(&self, files: &[&str]) -> Result<()> {
        for file in files {
            let path = self.dir.join(file);
            match std::fs::remove_file(&path) {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => {
                    return Err(e).with_context(|| format!("could not remove {}", path.display()));
                }
            }
        }
        Ok(())
    }

    /// Writes `content` to `file` unless the file already exists.
    ///
    /// Returns `true` when the file was written.
    pub fn write_if_absent(&self, file: &str, content: &str) -> Result<bool> {
        if self.contains(file) {
            return Ok(false);
        }
        let path = self.dir.join(file);
        std::fs::write(&path, content)
            .with_context(|| format!("could not write {}", path.display()))?;
        Ok(true)
    }
}
