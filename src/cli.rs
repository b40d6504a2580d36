use std::path::PathBuf;
use clap::{ArgAction, Parser};
use gotools::config::Overrides;

/// Installs and upgrades the Go tools listed in the manifest, each in its own module.
#[derive(Debug, Parser, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct CLI {
    /// Re-initialize every workspace to pick up new versions instead of just installing
    #[clap(short, long)]
    pub(crate) update: bool,

    /// Manifest file listing the tools [default: <config dir>/config]
    #[clap(long, env = "GOTOOLS_CONFIG")]
    pub(crate) config: Option<PathBuf>,

    /// Directory holding one module per tool [default: <config dir>/mods]
    #[clap(long, env = "GOTOOLS_MODS")]
    pub(crate) mods: Option<PathBuf>,

    /// Version report written after the run [default: <config dir>/versions]
    #[clap(long, env = "GOTOOLS_VERSIONS")]
    pub(crate) versions: Option<PathBuf>,

    /// Copy replace directives from each tool's own go.mod [default: true]
    #[clap(long, env = "GOTOOLS_COPY_REPLACE", action = ArgAction::Set)]
    pub(crate) copy_replace: Option<bool>,

    /// Number of concurrent installs [default: available parallelism + 1]
    #[clap(short, long, env = "GOTOOLS_WORKERS", value_parser = clap::value_parser!(u32).range(1..))]
    pub(crate) workers: Option<u32>,

    /// The go command to use [default: go]
    #[clap(long, env = "GOTOOLS_GO")]
    pub(crate) go: Option<PathBuf>,

    /// Settings file [default: <config dir>/settings.toml]
    #[clap(long, env = "GOTOOLS_SETTINGS")]
    pub(crate) settings: Option<PathBuf>,

    /// Fail when several manifest entries map to the same workspace
    #[clap(long)]
    pub(crate) strict: bool,

    /// Only parse and validate the manifest, then list its entries
    #[clap(long)]
    pub(crate) check: bool,
}

impl CLI {
    pub(crate) fn overrides(&self) -> Overrides {
        Overrides {
            manifest: self.config.clone(),
            workspaces: self.mods.clone(),
            report: self.versions.clone(),
            workers: self.workers.map(|w| w as usize),
            copy_replace: self.copy_replace,
            go: self.go.clone(),
            update: self.update,
            strict: self.strict,
        }
    }
}
