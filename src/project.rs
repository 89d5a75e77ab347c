//! Whole-project persistence.
//!
//! A [`ProjectState`] is the serializable aggregate of everything the
//! engine tracks: the defaults, the group table (minus membership), and
//! every page fingerprint. Group membership is deliberately not part of
//! the saved table; restore replays each fingerprint's recorded group id
//! back through the table with revision bumps suppressed, so saving and
//! reloading a project invalidates nothing.

use serde::{Deserialize, Serialize};

use crate::defaults::Defaults;
use crate::error::StoreError;
use crate::fingerprint::{FingerprintStore, PageFingerprint};
use crate::group::{Dispatcher, GroupTable, SavedGroupTable};
use crate::page_id::PageId;

/// One page's persisted entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PageEntry {
    pub page: PageId,
    pub fingerprint: PageFingerprint,
}

/// Serializable snapshot of the whole engine state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProjectState {
    #[serde(default)]
    pub defaults: Defaults,
    #[serde(default)]
    pub groups: SavedGroupTable,
    #[serde(default)]
    pub pages: Vec<PageEntry>,
}

/// Live engine state rebuilt from a [`ProjectState`].
pub struct RestoredProject {
    pub store: FingerprintStore,
    pub dispatcher: Dispatcher,
    pub defaults: Defaults,
}

impl ProjectState {
    /// Snapshot the live stores.
    ///
    /// Locks are taken one at a time, so the capture is consistent per
    /// store; callers wanting a fully quiescent snapshot should capture
    /// between build runs.
    pub fn capture(
        store: &FingerprintStore,
        dispatcher: &Dispatcher,
        defaults: &Defaults,
    ) -> Result<ProjectState, StoreError> {
        let mut pages = Vec::new();
        for page in store.pages()? {
            if let Some(fingerprint) = store.get(&page)? {
                pages.push(PageEntry { page, fingerprint });
            }
        }
        Ok(ProjectState {
            defaults: defaults.clone(),
            groups: dispatcher.to_saved()?,
            pages,
        })
    }

    /// Rebuild live stores from this snapshot.
    ///
    /// Pages whose configuration carries a group id are re-registered
    /// into the table without bumping revisions; pages without one (never
    /// assigned before the save) are left for the next `assign` call.
    pub fn restore(&self) -> Result<RestoredProject, StoreError> {
        let table = GroupTable::from_saved(&self.groups, self.defaults.dict_params.clone());
        let dispatcher = Dispatcher::from_table(table);
        let store = FingerprintStore::new();

        for entry in &self.pages {
            store.set(entry.page.clone(), entry.fingerprint.clone())?;
            let group_id = &entry.fingerprint.config.group_id;
            if !group_id.is_empty() {
                dispatcher.register_loaded(entry.page.clone(), group_id)?;
            }
        }

        Ok(RestoredProject {
            store,
            dispatcher,
            defaults: self.defaults.clone(),
        })
    }

    /// Human-readable project form.
    pub fn to_json(&self) -> Result<String, StoreError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| StoreError::Malformed(format!("project encode: {}", e)))
    }

    pub fn from_json(data: &str) -> Result<ProjectState, StoreError> {
        serde_json::from_str(data)
            .map_err(|e| StoreError::Malformed(format!("project decode: {}", e)))
    }

    /// Compact binary project form.
    pub fn to_bytes(&self) -> Result<Vec<u8>, StoreError> {
        bitcode::serialize(self).map_err(|e| StoreError::Malformed(format!("project encode: {}", e)))
    }

    pub fn from_bytes(data: &[u8]) -> Result<ProjectState, StoreError> {
        bitcode::deserialize(data)
            .map_err(|e| StoreError::Malformed(format!("project decode: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_project_round_trips_through_json() {
        let state = ProjectState {
            defaults: Defaults::default(),
            groups: SavedGroupTable::default(),
            pages: Vec::new(),
        };
        let json = state.to_json().unwrap();
        assert_eq!(ProjectState::from_json(&json).unwrap(), state);
    }

    #[test]
    fn garbage_input_is_malformed_not_a_panic() {
        assert!(matches!(
            ProjectState::from_json("{ nope"),
            Err(StoreError::Malformed(_))
        ));
        assert!(matches!(
            ProjectState::from_bytes(&[0xFF, 0x00, 0x13]),
            Err(StoreError::Malformed(_))
        ));
    }

    #[test]
    fn restore_reassigns_pages_to_their_saved_groups() {
        let defaults = Defaults::default();
        let store = FingerprintStore::new();
        let dispatcher = Dispatcher::new(&defaults);

        let page = PageId::new("scans/a.tif");
        let group_id = dispatcher.assign(&page).unwrap();
        store
            .update(&page, |fp| {
                fp.config.group_id = group_id.clone();
                fp.config.group_revision = 1;
            })
            .unwrap();

        let state = ProjectState::capture(&store, &dispatcher, &defaults).unwrap();
        let restored = state.restore().unwrap();

        assert_eq!(
            restored.dispatcher.group_for_page(&page).unwrap().as_deref(),
            Some(group_id.as_str())
        );
    }
}
