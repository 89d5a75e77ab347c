use std::fs;
use std::path::Path;
use std::sync::Arc;

use crate::defaults::Defaults;
use crate::error::StoreError;
use crate::fingerprint::{ArtifactStamp, FingerprintStore, SourceImage};
use crate::group::{Dispatcher, GroupTable};
use crate::page_id::PageId;
use crate::relink::Relinker;

/// Read-only view of an artifact's on-disk metadata.
///
/// `None` covers both "file does not exist" and "metadata unreadable";
/// either way the artifact cannot be trusted and reads as stale, never as
/// an error.
pub trait ArtifactProbe: Send + Sync {
    fn stat(&self, path: &Path) -> Option<ArtifactStamp>;
}

/// Production probe backed by `fs::metadata`.
#[derive(Debug, Default)]
pub struct FsProbe;

impl ArtifactProbe for FsProbe {
    fn stat(&self, path: &Path) -> Option<ArtifactStamp> {
        let meta = fs::metadata(path).ok()?;
        let modified = meta.modified().ok()?;
        Some(ArtifactStamp::new(meta.len(), modified))
    }
}

/// Decides whether previously produced output is still valid.
///
/// Holds handles to both stores plus the artifact probe. Lock discipline:
/// where both stores are consulted, the fingerprint lock is taken first
/// and the group lock inside it, never the other way around.
#[derive(Clone)]
pub struct Invalidator {
    store: FingerprintStore,
    dispatcher: Dispatcher,
    probe: Arc<dyn ArtifactProbe>,
    defaults: Defaults,
}

impl Invalidator {
    pub fn new(store: FingerprintStore, dispatcher: Dispatcher, defaults: Defaults) -> Self {
        Invalidator::with_probe(store, dispatcher, defaults, Arc::new(FsProbe))
    }

    pub fn with_probe(
        store: FingerprintStore,
        dispatcher: Dispatcher,
        defaults: Defaults,
        probe: Arc<dyn ArtifactProbe>,
    ) -> Self {
        Invalidator {
            store,
            dispatcher,
            probe,
            defaults,
        }
    }

    pub fn store(&self) -> &FingerprintStore {
        &self.store
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    pub fn defaults(&self) -> &Defaults {
        &self.defaults
    }

    /// Create or refresh a page's fingerprint for its source image.
    ///
    /// A page seen for the first time picks up the project default dpi;
    /// a later source swap keeps whatever dpi the page was tuned to.
    pub fn register_source(&self, page: &PageId, source: SourceImage) -> Result<(), StoreError> {
        let dpi = self.defaults.dpi;
        self.store.update(page, |fp| {
            if fp.config.source.path.is_empty() {
                fp.config.dpi = dpi;
            }
            fp.config.source = source;
        })
    }

    /// Rewrite source paths everywhere after the underlying files moved.
    ///
    /// Migrates the fingerprint store first, then the group table's
    /// page index, neither bumping revisions, so a folder move does not
    /// orphan assignments or invalidate anything. Returns the number of
    /// migrated pages.
    pub fn relink(&self, relinker: &dyn Relinker) -> Result<usize, StoreError> {
        let changed = self.store.relink(relinker)?;
        self.dispatcher.relink(relinker)?;
        Ok(changed)
    }

    /// Whether this page's own output is stale.
    ///
    /// Checks in order: the full-regeneration force bit (consumed exactly
    /// once), the existence of a recorded build snapshot, the snapshot
    /// against current configuration and current group id/revision/params,
    /// and finally the artifact's on-disk size and modification time
    /// against the recorded stamp.
    pub fn is_page_stale(&self, page: &PageId) -> Result<bool, StoreError> {
        let forced = self.store.update(page, |fp| fp.regen.take_page())?;
        if forced {
            return Ok(true);
        }
        self.snapshot_is_stale(page)
    }

    /// Same decision without consuming the force bit.
    ///
    /// The group scan uses this: a sibling's pending bit must make the
    /// group stale, but only the sibling's own pass may clear it. A scan
    /// that consumed it would lose the rebuild the user asked for.
    fn is_page_stale_peek(&self, page: &PageId) -> Result<bool, StoreError> {
        let forced = self.store.with(page, |fp| fp.map_or(false, |fp| fp.regen.page))?;
        if forced {
            return Ok(true);
        }
        self.snapshot_is_stale(page)
    }

    fn snapshot_is_stale(&self, page: &PageId) -> Result<bool, StoreError> {
        self.store.with(page, |fp| -> Result<bool, StoreError> {
            let Some(fp) = fp else {
                return Ok(true);
            };
            let Some(record) = fp.build.record() else {
                return Ok(true);
            };

            let mismatch = self.dispatcher.with(|table| -> Result<bool, StoreError> {
                let Some(group_id) = table.group_for_page(page) else {
                    return Err(StoreError::UnassignedPage(page.clone()));
                };
                let Some(group) = table.group(group_id) else {
                    return Err(StoreError::MissingGroup {
                        page: page.clone(),
                        group_id: group_id.to_string(),
                    });
                };
                Ok(!record.matches(&fp.config, group_id, group.revision(), group.params()))
            })??;
            if mismatch {
                return Ok(true);
            }

            let path = record.config.artifact_path(&self.defaults.pages_subfolder);
            match self.probe.stat(&path) {
                Some(stamp) => Ok(stamp != record.artifact),
                None => Ok(true),
            }
        })?
    }

    /// Whether the group's shared dictionary is stale because of a member
    /// other than `exclude`.
    ///
    /// Only meaningful for non-sentinel groups: a shared dictionary is a
    /// joint function of all member pages, so one stale member poisons it.
    /// Member checks do not consume force bits; those belong to each
    /// member's own pass.
    pub fn is_group_stale(
        &self,
        group_id: &str,
        exclude: Option<&PageId>,
    ) -> Result<bool, StoreError> {
        if GroupTable::is_sentinel(group_id) {
            return Ok(false);
        }
        // snapshot membership, then release the group lock before the
        // per-page checks re-acquire locks
        let members = match self.dispatcher.snapshot_group(group_id)? {
            Some(group) => group.pages().clone(),
            None => return Ok(false),
        };
        for member in &members {
            if Some(member) == exclude {
                continue;
            }
            if self.is_page_stale_peek(member)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Top-level decision for both the real build path and the cache-only
    /// inspection path: does this page need reprocessing?
    ///
    /// The page itself is excluded from the group scan: it was already
    /// checked directly and must not invalidate itself through the group.
    pub fn needs_reprocess(&self, page: &PageId) -> Result<bool, StoreError> {
        if self.is_page_stale(page)? {
            return Ok(true);
        }
        let group_id = self
            .dispatcher
            .group_for_page(page)?
            .ok_or_else(|| StoreError::UnassignedPage(page.clone()))?;
        if GroupTable::is_sentinel(&group_id) {
            return Ok(false);
        }
        self.is_group_stale(&group_id, Some(page))
    }

    /// Presentation-only decision: should a quick preview fall back to a
    /// placeholder rendered from the raw source instead of the finished
    /// artifact?
    ///
    /// Evaluated independently of [`needs_reprocess`](Self::needs_reprocess);
    /// a preview may legitimately lag behind a pending group-wide rebuild.
    /// Consumes the thumbnail force bit.
    pub fn needs_placeholder_preview(&self, page: &PageId) -> Result<bool, StoreError> {
        let existed = self.store.with(page, |fp| fp.is_some())?;
        if !existed {
            return Ok(true);
        }

        let forced = self.store.update(page, |fp| fp.regen.take_thumbnail())?;
        if forced {
            return Ok(true);
        }

        self.store.with(page, |fp| {
            let Some(fp) = fp else {
                return true;
            };
            let Some(record) = fp.build.record() else {
                return true;
            };
            if record.config != fp.config {
                return true;
            }
            let path = record.config.artifact_path(&self.defaults.pages_subfolder);
            match self.probe.stat(&path) {
                Some(stamp) => stamp != record.artifact,
                None => true,
            }
        })
    }
}
