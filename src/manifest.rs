use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use anyhow::{Context, Result};

/// Version requirement passed to the fetch step when a declaration has no `@`.
pub const UPGRADE: &str = "upgrade";

const COMMENT_MARKER: char = '#';

/// The version constraint of a tool declaration.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum VersionReq {
    /// No constraint was given; resolve the newest available version.
    #[default]
    Upgrade,
    /// A constraint passed through verbatim (e.g. `v1.2.3`, `master`, `latest`).
    Pinned(String),
}

impl VersionReq {
    fn parse(s: &str) -> VersionReq {
        match s.trim() {
            "" => VersionReq::Upgrade,
            v => VersionReq::Pinned(v.to_string()),
        }
    }
}

impl fmt::Display for VersionReq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionReq::Upgrade => f.write_str(UPGRADE),
            VersionReq::Pinned(v) => f.write_str(v),
        }
    }
}

/// One tool declared in the manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tool {
    /// The module/import path of the tool, e.g. `golang.org/x/tools/cmd/goimports`.
    pub name: String,
    pub version: VersionReq,
    /// Space separated build tags, empty when none were declared.
    pub tags: String,
    /// Shell command lines run once whenever the workspace is (re)initialized.
    pub setup: Vec<String>,
}

impl Tool {
    /// Opens a declaration from a `<name>[@<version>]` line.
    pub fn from_declaration(line: &str) -> Tool {
        let (name, version) = match line.split_once('@') {
            Some((name, version)) => (name, VersionReq::parse(version)),
            None => (line, VersionReq::Upgrade),
        };
        Tool {
            name: name.trim().to_string(),
            version,
            tags: String::new(),
            setup: Vec::new(),
        }
    }

    /// The directory name of this tool's workspace below the workspace root.
    pub fn workspace_name(&self) -> String {
        self.name.replace(['/', '\\'], "_")
    }

    /// The workspace directory of this tool below `root`.
    pub fn workspace_path(&self, root: &Path) -> PathBuf {
        root.join(self.workspace_name())
    }

    /// Why this declaration can't be installed, if it can't.
    pub fn invalid_reason(&self) -> Option<&'static str> {
        if self.name.is_empty() {
            return Some("empty tool name");
        }
        match self.workspace_name().as_str() {
            "." | ".." => Some("name does not map to its own workspace"),
            _ => None,
        }
    }

    /// Applies a directive line to this declaration.
    ///
    /// Returns `false` when the line is not a directive, in which case it
    /// starts the next declaration.
    fn apply_directive(&mut self, line: &str) -> bool {
        let (keyword, args) = match line.split_once(char::is_whitespace) {
            Some((keyword, args)) => (keyword, args.trim()),
            None => (line, ""),
        };
        match keyword {
            "tags" => self.tags = args.to_string(),
            "run" => self.setup.push(args.to_string()),
            _ => return false,
        }
        true
    }
}

/// The ordered tool declarations of a manifest file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    pub tools: Vec<Tool>,
}

/// Declarations that share a single workspace directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collision {
    pub workspace: String,
    /// Manifest positions of the colliding declarations, ascending.
    pub indices: Vec<usize>,
}

impl fmt::Display for Collision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let positions: Vec<String> = self.indices.iter().map(|i| (i + 1).to_string()).collect();
        write!(
            f,
            "declarations #{} share workspace '{}'",
            positions.join(", #"),
            self.workspace
        )
    }
}

/// A declaration removed from the manifest because it can't be installed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejected {
    /// Manifest position of the declaration.
    pub index: usize,
    pub tool: Tool,
    pub reason: &'static str,
}

impl fmt::Display for Rejected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "declaration #{} '{}@{}' skipped: {}",
            self.index + 1,
            self.tool.name,
            self.tool.version,
            self.reason
        )
    }
}

impl Manifest {
    /// Parses manifest text line by line.
    ///
    /// Blank lines and `#` comments are ignored anywhere. `tags` and `run`
    /// lines belong to the declaration currently open; any other line opens a
    /// new declaration.
    pub fn parse<'a, I>(lines: I) -> Manifest
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut tools = Vec::new();
        let mut current: Option<Tool> = None;

        for line in lines {
            let line = line.trim();
            if line.is_empty() || line.starts_with(COMMENT_MARKER) {
                continue;
            }
            if let Some(tool) = current.as_mut() {
                if tool.apply_directive(line) {
                    continue;
                }
            }
            if let Some(done) = current.replace(Tool::from_declaration(line)) {
                tools.push(done);
            }
        }
        tools.extend(current);

        Manifest { tools }
    }

    /// Reads and parses the manifest at `path`.
    ///
    /// # Errors
    /// Returns an error if the file can't be read.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Manifest> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("error opening manifest {}", path.display()))?;
        Ok(Manifest::parse(content.lines()))
    }

    /// Removes declarations that can't be installed and returns them.
    ///
    /// Indices refer to positions before the removal.
    pub fn remove_invalid(&mut self) -> Vec<Rejected> {
        let mut rejected = Vec::new();
        let mut kept = Vec::with_capacity(self.tools.len());
        for (index, tool) in std::mem::take(&mut self.tools).into_iter().enumerate() {
            match tool.invalid_reason() {
                Some(reason) => rejected.push(Rejected { index, tool, reason }),
                None => kept.push(tool),
            }
        }
        self.tools = kept;
        rejected
    }

    /// Groups of declarations that would install into the same workspace.
    pub fn collisions(&self) -> Vec<Collision> {
        let mut by_workspace: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        for (i, tool) in self.tools.iter().enumerate() {
            by_workspace.entry(tool.workspace_name()).or_default().push(i);
        }
        let mut collisions: Vec<Collision> = by_workspace
            .into_iter()
            .filter(|(_, indices)| indices.len() > 1)
            .map(|(workspace, indices)| Collision { workspace, indices })
            .collect();
        collisions.sort_by_key(|c| c.indices[0]);
        collisions
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
