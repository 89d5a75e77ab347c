use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use crate::error::StoreError;
use crate::page_id::PageId;
use crate::relink::Relinker;

use super::fingerprint::PageFingerprint;

/// Shared, lock-guarded map of page fingerprints.
///
/// Cloning produces another handle to the same storage, so worker threads
/// and the interactive thread all observe one map. Every multi-field read
/// or read-modify-write happens inside a single lock acquisition via
/// [`with`](FingerprintStore::with) / [`update`](FingerprintStore::update),
/// which is what keeps staleness checks from seeing a half-written
/// fingerprint.
#[derive(Clone, Default)]
pub struct FingerprintStore {
    storage: Arc<RwLock<BTreeMap<PageId, PageFingerprint>>>,
}

impl FingerprintStore {
    pub fn new() -> Self {
        FingerprintStore::default()
    }

    /// Clone out the fingerprint for a page, if one exists.
    pub fn get(&self, page: &PageId) -> Result<Option<PageFingerprint>, StoreError> {
        let storage = self
            .storage
            .read()
            .map_err(|_| StoreError::LockPoisoned("read"))?;
        Ok(storage.get(page).cloned())
    }

    /// Overwrite (or create) the fingerprint for a page.
    pub fn set(&self, page: PageId, fingerprint: PageFingerprint) -> Result<(), StoreError> {
        let mut storage = self
            .storage
            .write()
            .map_err(|_| StoreError::LockPoisoned("write"))?;
        storage.insert(page, fingerprint);
        Ok(())
    }

    /// Run a closure over the fingerprint under a single read lock.
    pub fn with<T>(
        &self,
        page: &PageId,
        f: impl FnOnce(Option<&PageFingerprint>) -> T,
    ) -> Result<T, StoreError> {
        let storage = self
            .storage
            .read()
            .map_err(|_| StoreError::LockPoisoned("read"))?;
        Ok(f(storage.get(page)))
    }

    /// Mutate the fingerprint for a page under a single write lock,
    /// creating a default one first if the page was never touched.
    ///
    /// This is the only safe way to consume a force-reprocess bit: the
    /// observe-and-clear step must not interleave with another checker.
    pub fn update<T>(
        &self,
        page: &PageId,
        f: impl FnOnce(&mut PageFingerprint) -> T,
    ) -> Result<T, StoreError> {
        let mut storage = self
            .storage
            .write()
            .map_err(|_| StoreError::LockPoisoned("write"))?;
        let fingerprint = storage.entry(page.clone()).or_default();
        Ok(f(fingerprint))
    }

    /// Drop the fingerprint of a page removed from the project.
    pub fn remove(&self, page: &PageId) -> Result<bool, StoreError> {
        let mut storage = self
            .storage
            .write()
            .map_err(|_| StoreError::LockPoisoned("write"))?;
        Ok(storage.remove(page).is_some())
    }

    pub fn clear(&self) -> Result<(), StoreError> {
        let mut storage = self
            .storage
            .write()
            .map_err(|_| StoreError::LockPoisoned("write"))?;
        storage.clear();
        Ok(())
    }

    pub fn pages(&self) -> Result<Vec<PageId>, StoreError> {
        let storage = self
            .storage
            .read()
            .map_err(|_| StoreError::LockPoisoned("read"))?;
        Ok(storage.keys().cloned().collect())
    }

    pub fn len(&self) -> Result<usize, StoreError> {
        let storage = self
            .storage
            .read()
            .map_err(|_| StoreError::LockPoisoned("read"))?;
        Ok(storage.len())
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }

    /// Rewrite source paths after the underlying files moved.
    ///
    /// A pure key migration done while holding the write lock: the page
    /// key, the current config's source path and the recorded build
    /// snapshot's source path all move together; every other field is
    /// preserved, so a folder move does not invalidate anything.
    /// [`Invalidator::relink`](crate::Invalidator::relink) pairs this
    /// with the group table's own index migration.
    ///
    /// Returns the number of pages whose path changed.
    pub fn relink(&self, relinker: &dyn Relinker) -> Result<usize, StoreError> {
        let mut storage = self
            .storage
            .write()
            .map_err(|_| StoreError::LockPoisoned("relink"))?;

        let mut migrated = BTreeMap::new();
        let mut changed = 0;
        for (page, mut fingerprint) in std::mem::take(&mut *storage) {
            match relinker.substitute(page.path()) {
                Some(new_path) => {
                    fingerprint.config.source.path = new_path.clone();
                    if let crate::fingerprint::BuildState::BuiltWith(record) =
                        &mut fingerprint.build
                    {
                        record.config.source.path = new_path.clone();
                    }
                    migrated.insert(PageId::new(new_path), fingerprint);
                    changed += 1;
                }
                None => {
                    migrated.insert(page, fingerprint);
                }
            }
        }
        *storage = migrated;
        Ok(changed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fingerprint::config::PageConfig;
    use crate::fingerprint::source::{ColorMode, SourceImage};
    use crate::relink::PathMapRelinker;

    fn fingerprint_for(path: &str) -> PageFingerprint {
        PageFingerprint::new(PageConfig::new(SourceImage::new(
            path,
            vec![7],
            ColorMode::BlackAndWhite,
        )))
    }

    #[test]
    fn update_creates_lazily() {
        let store = FingerprintStore::new();
        let page = PageId::new("a.tif");
        assert!(store.get(&page).unwrap().is_none());

        store.update(&page, |fp| fp.regen.page = true).unwrap();
        assert!(store.get(&page).unwrap().unwrap().regen.page);
    }

    #[test]
    fn clone_shares_storage() {
        let store = FingerprintStore::new();
        let handle = store.clone();
        store
            .set(PageId::new("a.tif"), fingerprint_for("a.tif"))
            .unwrap();
        assert_eq!(handle.len().unwrap(), 1);
    }

    #[test]
    fn relink_migrates_key_and_paths_only() {
        let store = FingerprintStore::new();
        let old = PageId::new("old/a.tif");
        let mut fp = fingerprint_for("old/a.tif");
        fp.regen.thumbnail = true;
        store.set(old.clone(), fp.clone()).unwrap();

        let relinker = PathMapRelinker::new().map("old/a.tif", "new/a.tif");
        assert_eq!(store.relink(&relinker).unwrap(), 1);

        assert!(store.get(&old).unwrap().is_none());
        let moved = store.get(&PageId::new("new/a.tif")).unwrap().unwrap();
        assert_eq!(moved.config.source.path, "new/a.tif");
        assert_eq!(moved.config.source.content_hash, vec![7]);
        assert!(moved.regen.thumbnail);
    }
}
