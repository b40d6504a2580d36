use std::sync::Arc;
use anyhow::{bail, Result};
use gotools::config::{Settings, SettingsFile};
use gotools::global::utils::{default_settings_file, get_global_config_dir};
use gotools::installer::Installer;
use gotools::manifest::Manifest;
use gotools::scheduler::Scheduler;
use gotools::toolchain::GoToolchain;
use crate::cli::CLI;

pub async fn execute(cli: CLI) -> Result<()> {
    let config_dir = get_global_config_dir()?;
    let settings_path = cli.settings.clone().unwrap_or_else(|| default_settings_file(&config_dir));
    let file = SettingsFile::load_or_default(&settings_path)?;
    let settings = Settings::resolve(&config_dir, file, cli.overrides());
    tracing::debug!(?settings, "resolved settings");

    let mut manifest = Manifest::load(&settings.manifest)?;
    validate(&mut manifest, settings.strict)?;

    if cli.check {
        execute_check(&manifest);
        return Ok(());
    }
    execute_install(&settings, manifest).await
}

/// Drops uninstallable declarations and reports shared workspaces.
///
/// Under `strict` either problem is fatal.
fn validate(manifest: &mut Manifest, strict: bool) -> Result<()> {
    let rejected = manifest.remove_invalid();
    for declaration in &rejected {
        tracing::warn!("{declaration}");
    }
    if strict && !rejected.is_empty() {
        bail!("{} invalid declaration(s) in manifest", rejected.len());
    }

    let collisions = manifest.collisions();
    for collision in &collisions {
        tracing::warn!("{collision}");
    }
    if strict && !collisions.is_empty() {
        bail!("{} workspace collision(s) in manifest", collisions.len());
    }
    Ok(())
}

pub fn execute_check(manifest: &Manifest) {
    if manifest.is_empty() {
        println!("No tools");
        return;
    }
    for tool in &manifest.tools {
        println!("{}@{}", tool.name, tool.version);
        if !tool.tags.is_empty() {
            println!("  tags: {}", tool.tags);
        }
        if !tool.setup.is_empty() {
            println!("  setup commands: {}", tool.setup.len());
        }
    }
}

pub async fn execute_install(settings: &Settings, manifest: Manifest) -> Result<()> {
    let scheduler = Scheduler::new(settings.workers)?;
    let installer = Arc::new(Installer::new(
        GoToolchain::new(&settings.go),
        settings.install_options(),
    ));
    tracing::info!(
        tools = manifest.len(),
        workers = scheduler.workers(),
        update = settings.update,
        "installing tools"
    );

    let report = scheduler.run(&manifest.tools, installer).await?;
    report.save(&settings.report)?;

    let failed = report.failed();
    tracing::info!(
        "installed {} of {} tools",
        report.entries.len() - failed.len(),
        report.entries.len()
    );
    if !failed.is_empty() {
        tracing::warn!("failed: {}", failed.join(", "));
    }
    Ok(())
}
