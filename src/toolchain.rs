use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};
use thiserror::Error;
use crate::manifest::VersionReq;
use crate::modfile::Replace;

/// Module name used when initializing a workspace.
pub const WORKSPACE_MODULE: &str = "tmpmod";

/// A subprocess that could not be run or exited unsuccessfully.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("could not start `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("`{command}` failed ({status})")]
    Failed {
        command: String,
        status: ExitStatus,
        stdout: String,
        stderr: String,
    },
}

/// A command line with a mandatory working directory.
#[derive(Debug, Clone)]
pub struct Invocation {
    program: OsString,
    args: Vec<OsString>,
    dir: PathBuf,
}

impl Invocation {
    pub fn new<S: Into<OsString>>(program: S, dir: &Path) -> Invocation {
        Invocation {
            program: program.into(),
            args: Vec::new(),
            dir: dir.to_path_buf(),
        }
    }

    pub fn arg<S: Into<OsString>>(mut self, arg: S) -> Invocation {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Invocation
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Runs the command to completion and returns its trimmed stdout.
    ///
    /// On a non-zero exit the command line, its stdout and its stderr are
    /// logged before the error is returned.
    pub fn run(&self) -> Result<String, CommandError> {
        let command = self.to_string();
        tracing::debug!(dir = %self.dir.display(), "running {command}");

        let output = Command::new(&self.program)
            .args(&self.args)
            .current_dir(&self.dir)
            .output()
            .map_err(|source| CommandError::Spawn { command: command.clone(), source })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
            tracing::error!(
                dir = %self.dir.display(),
                "{command}\nSTDOUT\n{stdout}\nSTDERR\n{stderr}"
            );
            return Err(CommandError::Failed { command, status: output.status, stdout, stderr });
        }
        Ok(stdout.trim().to_string())
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.to_string_lossy())?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

/// Runs a free-form command line through the platform shell in `dir`.
pub fn run_shell(dir: &Path, cmdline: &str) -> Result<String, CommandError> {
    #[cfg(windows)]
    let invocation = Invocation::new("cmd", dir).arg("/C").arg(cmdline);
    #[cfg(not(windows))]
    let invocation = Invocation::new("sh", dir).arg("-c").arg(cmdline);
    invocation.run()
}

/// The package manager that resolves, fetches and builds tools.
///
/// Every operation takes the workspace directory explicitly; implementations
/// must never depend on the process working directory.
pub trait PackageManager: Send + Sync {
    /// Initializes a fresh module in `dir`.
    fn init(&self, dir: &Path) -> Result<(), CommandError>;
    /// Adds `module` at `version` to the module in `dir` without building it.
    fn fetch(&self, dir: &Path, module: &str, version: &VersionReq) -> Result<(), CommandError>;
    /// The path of `module`'s own `go.mod`, if it has one.
    fn module_file(&self, dir: &Path, module: &str) -> Result<Option<PathBuf>, CommandError>;
    /// The version `module` currently resolves to in `dir`.
    fn module_version(&self, dir: &Path, module: &str) -> Result<String, CommandError>;
    fn replace(&self, dir: &Path, replace: &Replace) -> Result<(), CommandError>;
    /// Reconciles the module requirements with the sources in `dir`.
    fn tidy(&self, dir: &Path) -> Result<(), CommandError>;
    /// Builds and installs `module`. `tags` is omitted when empty.
    fn install(&self, dir: &Path, module: &str, tags: &str) -> Result<(), CommandError>;
}

/// The `go` command.
#[derive(Debug, Clone)]
pub struct GoToolchain {
    binary: PathBuf,
}

impl GoToolchain {
    pub fn new<P: Into<PathBuf>>(binary: P) -> GoToolchain {
        GoToolchain { binary: binary.into() }
    }

    fn go(&self, dir: &Path) -> Invocation {
        Invocation::new(self.binary.as_os_str(), dir)
    }

    fn list(&self, dir: &Path, format: &str, module: &str) -> Result<String, CommandError> {
        self.go(dir).args(["list", "-f", format, module]).run()
    }
}

impl PackageManager for GoToolchain {
    fn init(&self, dir: &Path) -> Result<(), CommandError> {
        self.go(dir).args(["mod", "init", WORKSPACE_MODULE]).run()?;
        Ok(())
    }

    fn fetch(&self, dir: &Path, module: &str, version: &VersionReq) -> Result<(), CommandError> {
        self.go(dir).args(["get", "-d"]).arg(format!("{module}@{version}")).run()?;
        Ok(())
    }

    fn module_file(&self, dir: &Path, module: &str) -> Result<Option<PathBuf>, CommandError> {
        let path = self.list(dir, "{{.Module.GoMod}}", module)?;
        Ok((!path.is_empty()).then(|| PathBuf::from(path)))
    }

    fn module_version(&self, dir: &Path, module: &str) -> Result<String, CommandError> {
        self.list(dir, "{{.Module.Version}}", module)
    }

    fn replace(&self, dir: &Path, replace: &Replace) -> Result<(), CommandError> {
        self.go(dir).args(["mod", "edit", "-replace"]).arg(replace.edit_arg()).run()?;
        Ok(())
    }

    fn tidy(&self, dir: &Path) -> Result<(), CommandError> {
        self.go(dir).args(["mod", "tidy"]).run()?;
        Ok(())
    }

    fn install(&self, dir: &Path, module: &str, tags: &str) -> Result<(), CommandError> {
        let mut invocation = self.go(dir).arg("install");
        if !tags.is_empty() {
            invocation = invocation.args(["-tags", tags]);
        }
        invocation.arg(module).run()?;
        Ok(())
    }
}
