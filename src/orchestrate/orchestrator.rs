use crate::error::StoreError;
use crate::fingerprint::{ArtifactStamp, BuildRecord, BuildState};
use crate::invalidate::Invalidator;
#[cfg(feature = "emitter")]
use crate::notify::{BuildNotifier, BUILD_FAILED, PAGE_REBUILT, PAGE_UP_TO_DATE};
use crate::page_id::PageId;

use super::encoder::{CancelFlag, EncodeError, EncodeJob, Encoder};

/// Result of one processing pass over a page.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BuildOutcome {
    /// Cached output was still valid; nothing ran.
    UpToDate,
    /// The page was re-encoded and its build snapshot recorded.
    Rebuilt(ArtifactStamp),
}

/// Drives actual (non-cache-only) processing of pages.
///
/// This is the only component allowed to write the recorded-build-snapshot
/// half of a fingerprint. The encoder runs outside every lock; only its
/// completion re-acquires the store lock to record the snapshot.
#[derive(Clone)]
pub struct Orchestrator {
    invalidator: Invalidator,
    #[cfg(feature = "emitter")]
    notifier: Option<BuildNotifier>,
}

impl Orchestrator {
    pub fn new(invalidator: Invalidator) -> Self {
        Orchestrator {
            invalidator,
            #[cfg(feature = "emitter")]
            notifier: None,
        }
    }

    #[cfg(feature = "emitter")]
    pub fn with_notifier(mut self, notifier: BuildNotifier) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn invalidator(&self) -> &Invalidator {
        &self.invalidator
    }

    fn notify(&self, event: &str, page: &PageId) {
        #[cfg(feature = "emitter")]
        if let Some(notifier) = &self.notifier {
            notifier.emit_page(event, page);
        }
        #[cfg(not(feature = "emitter"))]
        let _ = (event, page);
    }

    /// One processing pass: assign, decide, encode, record.
    ///
    /// The group revision recorded on success is the one observed right
    /// after assignment. A rebalance cannot start while the snapshot is
    /// taken (it needs the table write lock), so a build never records a
    /// revision from a repartition that began after it.
    pub fn process_page(
        &self,
        page: &PageId,
        encoder: &dyn Encoder,
        cancel: &CancelFlag,
    ) -> Result<BuildOutcome, StoreError> {
        let dispatcher = self.invalidator.dispatcher();
        let store = self.invalidator.store();

        let group_id = dispatcher.assign(page)?;

        if !self.invalidator.needs_reprocess(page)? {
            self.notify(PAGE_UP_TO_DATE, page);
            return Ok(BuildOutcome::UpToDate);
        }

        let group = dispatcher
            .snapshot_group(&group_id)?
            .ok_or_else(|| StoreError::MissingGroup {
                page: page.clone(),
                group_id: group_id.clone(),
            })?;

        // stamp the group observation into the page's own configuration
        // and capture exactly what the encoder will see
        let config = store.update(page, |fp| {
            fp.config.group_id = group_id.clone();
            fp.config.group_revision = group.revision();
            fp.config.clone()
        })?;

        let job = EncodeJob {
            page: page.clone(),
            artifact_path: config.artifact_path(&self.invalidator.defaults().pages_subfolder),
            dict_params: group.params().clone(),
            config,
        };

        if cancel.is_canceled() {
            self.notify(BUILD_FAILED, page);
            return Err(StoreError::Interrupted(page.clone()));
        }

        // off the critical path: no locks held while the encoder runs
        let artifact = match encoder.encode(&job, cancel) {
            Ok(artifact) => artifact,
            Err(EncodeError::Interrupted) => {
                self.notify(BUILD_FAILED, page);
                return Err(StoreError::Interrupted(page.clone()));
            }
            Err(EncodeError::Failed(message)) => {
                self.notify(BUILD_FAILED, page);
                return Err(StoreError::Encode {
                    page: page.clone(),
                    message,
                });
            }
        };

        let record = BuildRecord {
            config: job.config,
            group_id,
            group_revision: group.revision(),
            dict_params: job.dict_params,
            artifact,
        };
        store.update(page, |fp| {
            fp.build = BuildState::BuiltWith(Box::new(record.clone()));
        })?;

        self.notify(PAGE_REBUILT, page);
        Ok(BuildOutcome::Rebuilt(artifact))
    }
}

#[cfg(not(feature = "emitter"))]
const PAGE_UP_TO_DATE: &str = "page_up_to_date";
#[cfg(not(feature = "emitter"))]
const PAGE_REBUILT: &str = "page_rebuilt";
#[cfg(not(feature = "emitter"))]
const BUILD_FAILED: &str = "build_failed";
