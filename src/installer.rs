use std::path::PathBuf;
use anyhow::{Context, Result};
use colored::Colorize;
use crate::manifest::Tool;
use crate::modfile::parse_replaces;
use crate::toolchain::{run_shell, PackageManager};
use crate::workspace::{Workspace, INIT_FILES, MODULE_FILE};

/// The stub source file that makes the workspace module depend on the tool.
pub const STUB_FILE: &str = "tools.go";

/// Options of the installation protocol that are shared by all tools.
#[derive(Debug, Clone)]
pub struct InstallOptions {
    /// Directory holding one workspace per tool.
    pub workspaces: PathBuf,
    /// Re-initialize every workspace, picking up new versions.
    pub update: bool,
    /// Copy `replace` directives from each tool's own `go.mod`.
    pub copy_replace: bool,
}

/// What a successful installation resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Installed {
    /// The version before this run, empty for a fresh workspace.
    pub previous: String,
    pub version: String,
}

impl Installed {
    /// The progress line printed for this tool.
    pub fn progress_line(&self, name: &str) -> String {
        if self.previous.is_empty() || self.previous == self.version {
            format!("{} {}", name, self.version)
        } else {
            format!("{} {} -> {}", name, self.previous, self.version.as_str().green())
        }
    }
}

/// Installs single tools into their workspaces.
#[derive(Debug)]
pub struct Installer<P> {
    toolchain: P,
    options: InstallOptions,
}

impl<P: PackageManager> Installer<P> {
    pub fn new(toolchain: P, options: InstallOptions) -> Self {
        Self { toolchain, options }
    }

    pub fn toolchain(&self) -> &P {
        &self.toolchain
    }

    /// Installs or upgrades `tool` and prints its progress line.
    ///
    /// A workspace that was never initialized, or any workspace in update
    /// mode, is initialized from scratch first; otherwise the existing module
    /// is rebuilt as is. On failure the workspace is left as it is so the
    /// next run can pick up from there.
    pub fn install(&self, tool: &Tool) -> Result<Installed> {
        let ws = Workspace::for_tool(&self.options.workspaces, tool);
        ws.ensure()?;

        let initialized = ws.contains(MODULE_FILE);
        let previous = if initialized {
            self.toolchain
                .module_version(ws.dir(), &tool.name)
                .with_context(|| format!("{}: could not read installed version", tool.name))?
        } else {
            String::new()
        };

        ws.write_if_absent(STUB_FILE, &stub_source(&tool.name))?;

        if self.options.update || !initialized {
            self.initialize(tool, &ws)?;
        }

        self.toolchain
            .install(ws.dir(), &tool.name, &tool.tags)
            .with_context(|| format!("{}: install failed", tool.name))?;

        let version = self
            .toolchain
            .module_version(ws.dir(), &tool.name)
            .with_context(|| format!("{}: could not read version", tool.name))?;

        let installed = Installed { previous, version };
        println!("{}", installed.progress_line(&tool.name));
        Ok(installed)
    }

    fn initialize(&self, tool: &Tool, ws: &Workspace) -> Result<()> {
        let dir = ws.dir();
        tracing::info!(tool = %tool.name, version = %tool.version, "initializing workspace");

        ws.reset(&INIT_FILES)?;
        self.toolchain
            .init(dir)
            .with_context(|| format!("{}: module init failed", tool.name))?;
        self.toolchain
            .fetch(dir, &tool.name, &tool.version)
            .with_context(|| format!("{}: fetch of {}@{} failed", tool.name, tool.name, tool.version))?;

        if self.options.copy_replace {
            self.copy_replaces(tool, ws)?;
        }

        for cmdline in &tool.setup {
            tracing::debug!(tool = %tool.name, "setup: {cmdline}");
            run_shell(dir, cmdline)
                .with_context(|| format!("{}: setup command failed: {}", tool.name, cmdline))?;
        }

        self.toolchain
            .tidy(dir)
            .with_context(|| format!("{}: tidy failed", tool.name))?;
        Ok(())
    }

    /// Applies the tool's own replace directives to the workspace module.
    ///
    /// Replacements through `..` point at paths next to the tool's sources
    /// and are skipped.
    fn copy_replaces(&self, tool: &Tool, ws: &Workspace) -> Result<()> {
        let dir = ws.dir();
        let Some(module_file) = self
            .toolchain
            .module_file(dir, &tool.name)
            .with_context(|| format!("{}: could not locate module file", tool.name))?
        else {
            return Ok(());
        };

        let content = std::fs::read_to_string(&module_file)
            .with_context(|| format!("{}: could not read {}", tool.name, module_file.display()))?;
        let replaces = parse_replaces(&content)
            .with_context(|| format!("{}: could not parse {}", tool.name, module_file.display()))?;

        for replace in replaces {
            if replace.is_relative() {
                tracing::warn!(tool = %tool.name, "skipping relative replace {replace}");
                continue;
            }
            self.toolchain
                .replace(dir, &replace)
                .with_context(|| format!("{}: could not apply replace {}", tool.name, replace))?;
        }
        Ok(())
    }
}

/// Source of the stub file importing `name`.
pub fn stub_source(name: &str) -> String {
    format!("//go:build tools\n// +build tools\n\npackage tools\n\nimport _ \"{name}\"\n")
}
