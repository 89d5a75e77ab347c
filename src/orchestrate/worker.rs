//! Threaded build run over a batch of pages.
//!
//! This module provides a worker pool that drains a page queue and runs
//! each page through the orchestrator, rebuilding only what is stale.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use crate::error::StoreError;
use crate::page_id::PageId;

use super::encoder::{CancelFlag, Encoder};
use super::orchestrator::{BuildOutcome, Orchestrator};

/// Statistics from a build run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BuildStats {
    pub rebuilt: usize,
    pub reused: usize,
    pub failed: usize,
}

impl BuildStats {
    fn merge(&mut self, other: BuildStats) {
        self.rebuilt += other.rebuilt;
        self.reused += other.reused;
        self.failed += other.failed;
    }
}

/// A pool of worker threads processing a fixed batch of pages.
///
/// Workers pull pages off a shared queue one at a time, so a slow encode
/// on one thread never stalls the rest of the batch.
///
/// ## Example
///
/// ```ignore
/// use pagedict::{BuildRun, CancelFlag};
///
/// let run = BuildRun::spawn(orchestrator, encoder, pages, 4);
///
/// // ... a UI may call run.cancel() at any point ...
///
/// let stats = run.join();
/// println!("rebuilt {} pages, reused {}", stats.rebuilt, stats.reused);
/// ```
pub struct BuildRun {
    cancel: CancelFlag,
    handles: Vec<JoinHandle<BuildStats>>,
}

impl BuildRun {
    /// Spawn `workers` threads over the given pages.
    ///
    /// The orchestrator is a cheap handle; each thread gets its own clone
    /// backed by the same stores. Page order in the queue is preserved,
    /// but completion order across threads is not.
    pub fn spawn(
        orchestrator: Orchestrator,
        encoder: Arc<dyn Encoder>,
        pages: Vec<PageId>,
        workers: usize,
    ) -> Self {
        let queue = Arc::new(Mutex::new(VecDeque::from(pages)));
        let cancel = CancelFlag::new();
        let workers = workers.max(1);

        let handles = (0..workers)
            .map(|_| {
                let orchestrator = orchestrator.clone();
                let encoder = encoder.clone();
                let queue = queue.clone();
                let cancel = cancel.clone();

                thread::spawn(move || {
                    let mut stats = BuildStats::default();

                    loop {
                        let page = {
                            let Ok(mut queue) = queue.lock() else {
                                break;
                            };
                            match queue.pop_front() {
                                Some(page) => page,
                                None => break,
                            }
                        };

                        match orchestrator.process_page(&page, encoder.as_ref(), &cancel) {
                            Ok(BuildOutcome::Rebuilt(_)) => stats.rebuilt += 1,
                            Ok(BuildOutcome::UpToDate) => stats.reused += 1,
                            Err(StoreError::Interrupted(_)) => break,
                            Err(_) => stats.failed += 1,
                        }
                    }

                    stats
                })
            })
            .collect();

        Self { cancel, handles }
    }

    /// Ask every worker to stop after its current page.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Handle to the run's cancellation flag.
    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    /// Wait for the queue to drain (or cancellation to take effect) and
    /// return the merged statistics.
    pub fn join(self) -> BuildStats {
        let mut stats = BuildStats::default();
        for handle in self.handles {
            stats.merge(handle.join().unwrap_or_default());
        }
        stats
    }

    /// Cancel and wait in one step.
    pub fn stop(self) -> BuildStats {
        self.cancel.cancel();
        self.join()
    }
}
