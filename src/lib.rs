//! # gotools Core Library
//!
//! This crate contains the core logic of the `gotools` command, which keeps a fleet of Go
//! command-line tools installed and up to date.
//!
//! Every tool listed in the manifest gets its own module directory (a *workspace*), so tools
//! never share or fight over dependency versions. After a run, the resolved version of every
//! tool is written to a version report in manifest order.
//!
//! ## Modules Overview
//! - [`manifest`] – Parsing the line-oriented tool manifest
//! - [`workspace`] – Per-tool module directories
//! - [`toolchain`] – Running the `go` command and other subprocesses
//! - [`modfile`] – Reading `replace` directives from a `go.mod`
//! - [`installer`] – Installing or upgrading one tool
//! - [`scheduler`] – Installing many tools concurrently
//! - [`report`] – The version report
//! - [`config`] – Layered settings
//! - [`global`] – Default directories


pub mod manifest;
pub mod workspace;
pub mod toolchain;
pub mod modfile;
pub mod installer;
pub mod scheduler;
pub mod report;
pub mod config;
pub mod global;

pub use manifest::*;
pub use workspace::*;
pub use toolchain::*;
pub use installer::*;
pub use scheduler::*;
pub use report::*;
pub use config::*;
