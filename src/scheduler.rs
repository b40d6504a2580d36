use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, OnceLock};
use anyhow::{Context, Result};
use tokio::sync::Semaphore;
use crate::installer::Installer;
use crate::manifest::Tool;
use crate::report::{Report, ReportEntry};
use crate::toolchain::PackageManager;

/// Default number of concurrent installations: one more than the available parallelism.
pub fn default_workers() -> usize {
    std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1) + 1
}

/// Runs installations for many tools with at most `workers` at a time.
#[derive(Debug)]
pub struct Scheduler {
    workers: u32,
    permits: Arc<Semaphore>,
}

impl Scheduler {
    /// # Errors
    /// Returns an error if `workers` is zero or too large.
    pub fn new(workers: usize) -> Result<Scheduler> {
        let workers = u32::try_from(workers)
            .ok()
            .filter(|w| *w > 0 && (*w as usize) <= Semaphore::MAX_PERMITS)
            .with_context(|| format!("invalid number of workers: {workers}"))?;
        Ok(Scheduler {
            workers,
            permits: Arc::new(Semaphore::new(workers as usize)),
        })
    }

    pub fn workers(&self) -> u32 {
        self.workers
    }

    /// Installs every tool and returns the report in manifest order.
    ///
    /// Tools are dispatched in order as permits become free. Declarations that
    /// share a workspace form one job and install one after another in
    /// manifest order. A failed tool is logged and keeps an empty version; it
    /// never affects the other tools. The report is only assembled after every
    /// installation has finished.
    pub async fn run<P>(&self, tools: &[Tool], installer: Arc<Installer<P>>) -> Result<Report>
    where
        P: PackageManager + 'static,
    {
        let slots: Arc<Vec<OnceLock<String>>> =
            Arc::new(tools.iter().map(|_| OnceLock::new()).collect());

        for group in workspace_groups(tools) {
            let permit = Arc::clone(&self.permits)
                .acquire_owned()
                .await
                .context("worker pool closed")?;
            let installer = Arc::clone(&installer);
            let slots = Arc::clone(&slots);
            let jobs: Vec<(usize, Tool)> = group.into_iter().map(|i| (i, tools[i].clone())).collect();

            tokio::task::spawn_blocking(move || {
                let _permit = permit;
                for (index, tool) in jobs {
                    match panic::catch_unwind(AssertUnwindSafe(|| installer.install(&tool))) {
                        Ok(Ok(installed)) => {
                            let stored = slots[index].set(installed.version);
                            debug_assert!(stored.is_ok(), "report slot {index} written twice");
                        }
                        Ok(Err(e)) => tracing::error!(tool = %tool.name, "{e:#}"),
                        Err(_) => tracing::error!(tool = %tool.name, "installation panicked"),
                    }
                }
            });
        }

        self.drain().await?;

        let entries = tools
            .iter()
            .zip(slots.iter())
            .map(|(tool, slot)| ReportEntry {
                name: tool.name.clone(),
                version: slot.get().cloned().unwrap_or_default(),
            })
            .collect();
        Ok(Report { entries })
    }

    /// Waits until every dispatched installation has released its permit.
    async fn drain(&self) -> Result<()> {
        let all = self
            .permits
            .acquire_many(self.workers)
            .await
            .context("worker pool closed")?;
        drop(all);
        Ok(())
    }
}

/// Manifest positions grouped by workspace, ordered by first appearance.
fn workspace_groups(tools: &[Tool]) -> Vec<Vec<usize>> {
    let mut groups: Vec<Vec<usize>> = Vec::new();
    let mut by_workspace: HashMap<String, usize> = HashMap::new();
    for (index, tool) in tools.iter().enumerate() {
        match by_workspace.get(&tool.workspace_name()) {
            Some(&group) => groups[group].push(index),
            None => {
                by_workspace.insert(tool.workspace_name(), groups.len());
                groups.push(vec![index]);
            }
        }
    }
    groups
}
