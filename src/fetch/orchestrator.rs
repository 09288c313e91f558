//! Concurrent fan-out over a set of fetchers.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use tokio::sync::mpsc;
use tracing::debug;

use super::error::FetchError;
use super::fetcher::{Fetcher, Outcome};

/// Runs every fetcher in its own task and collects all outcomes.
///
/// Failures are isolated per fetcher: a unit that errors or times out is
/// reported as an [`Outcome`] carrying the error while its siblings run to
/// completion. The orchestrator itself only fails when it has nothing to
/// do.
pub struct Orchestrator {
    fetchers: Vec<Arc<dyn Fetcher>>,
}

impl Orchestrator {
    pub fn new(fetchers: Vec<Arc<dyn Fetcher>>) -> Self {
        Self { fetchers }
    }

    /// Execute one orchestration pass.
    ///
    /// Spawns one task per fetcher, each bounded by `deadline` when given,
    /// and returns exactly one outcome per fetcher in arrival order.
    /// Ordering across fetchers is unspecified; callers get the full set,
    /// nothing more. A fetcher that outlives the deadline yields a
    /// timeout-classified outcome without delaying the rest.
    pub async fn run(&self, deadline: Option<Duration>) -> Result<Vec<Outcome>> {
        if self.fetchers.is_empty() {
            bail!("no fetchers configured");
        }

        debug!(count = self.fetchers.len(), "starting orchestration pass");

        // Sized to hold every outcome so producers never block on send.
        let (tx, mut rx) = mpsc::channel(self.fetchers.len());

        for fetcher in &self.fetchers {
            let fetcher = Arc::clone(fetcher);
            let tx = tx.clone();

            tokio::spawn(async move {
                let key = fetcher.key();
                let result = match deadline {
                    Some(budget) => match tokio::time::timeout(budget, fetcher.fetch()).await {
                        Ok(result) => result,
                        Err(_) => Err(FetchError::timeout("orchestration deadline exceeded")),
                    },
                    None => fetcher.fetch().await,
                };

                let _ = tx.send(Outcome { key, result }).await;
            });
        }

        // Receiving ends once every task has sent and hung up.
        drop(tx);

        let mut outcomes = Vec::with_capacity(self.fetchers.len());
        while let Some(outcome) = rx.recv().await {
            outcomes.push(outcome);
        }

        Ok(outcomes)
    }
}
