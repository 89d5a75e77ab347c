use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, RwLock};

use crate::defaults::Defaults;
use crate::error::StoreError;
use crate::page_id::PageId;

use super::params::DictParams;
use super::table::{DictGroup, GroupKind, GroupTable, RevisionBump, SavedGroupTable};

/// Shared, lock-guarded handle to the [`GroupTable`].
///
/// Cloning produces another handle to the same table. All mutating
/// operations take the write lock; `rebalance` therefore excludes every
/// concurrent assign/move/staleness query for its whole duration, which
/// is the stop-the-world property the group identity space rewrite needs.
#[derive(Clone)]
pub struct Dispatcher {
    table: Arc<RwLock<GroupTable>>,
}

impl Dispatcher {
    pub fn new(defaults: &Defaults) -> Self {
        Dispatcher::from_table(GroupTable::new(
            defaults.pages_per_dict,
            defaults.dict_params.clone(),
        ))
    }

    pub fn from_table(table: GroupTable) -> Self {
        Dispatcher {
            table: Arc::new(RwLock::new(table)),
        }
    }

    /// Run a closure under the read lock for a consistent multi-field view.
    pub fn with<T>(&self, f: impl FnOnce(&GroupTable) -> T) -> Result<T, StoreError> {
        let table = self
            .table
            .read()
            .map_err(|_| StoreError::LockPoisoned("group read"))?;
        Ok(f(&table))
    }

    fn with_mut<T>(&self, f: impl FnOnce(&mut GroupTable) -> T) -> Result<T, StoreError> {
        let mut table = self
            .table
            .write()
            .map_err(|_| StoreError::LockPoisoned("group write"))?;
        Ok(f(&mut table))
    }

    pub fn assign(&self, page: &PageId) -> Result<String, StoreError> {
        self.with_mut(|table| table.assign(page))
    }

    pub fn remove(&self, page: &PageId, bump: RevisionBump) -> Result<bool, StoreError> {
        self.with_mut(|table| table.remove(page, bump))?
    }

    pub fn move_to(
        &self,
        page: &PageId,
        group_id: &str,
        bump: RevisionBump,
    ) -> Result<(), StoreError> {
        self.with_mut(|table| table.move_to(page, group_id, bump))?
    }

    pub fn create_group(
        &self,
        id: impl Into<String>,
        kind: GroupKind,
        capacity: usize,
        params: DictParams,
    ) -> Result<(), StoreError> {
        let id = id.into();
        self.with_mut(|table| table.create_group(id, kind, capacity, params))?
    }

    pub fn set_group_params(&self, group_id: &str, params: DictParams) -> Result<bool, StoreError> {
        self.with_mut(|table| table.set_group_params(group_id, params))?
    }

    pub fn rebalance(&self, pages: &[PageId], capacity: usize) -> Result<(), StoreError> {
        self.with_mut(|table| table.rebalance(pages, capacity))
    }

    pub fn group_for_page(&self, page: &PageId) -> Result<Option<String>, StoreError> {
        self.with(|table| table.group_for_page(page).map(str::to_string))
    }

    /// Clone out a consistent snapshot of one group.
    pub fn snapshot_group(&self, id: &str) -> Result<Option<DictGroup>, StoreError> {
        self.with(|table| table.group(id).cloned())
    }

    pub fn list(&self) -> Result<Vec<String>, StoreError> {
        self.with(|table| table.list())
    }

    pub fn sizes(&self) -> Result<BTreeMap<String, usize>, StoreError> {
        self.with(|table| table.sizes())
    }

    pub fn members_for_page(&self, page: &PageId) -> Result<Option<BTreeSet<PageId>>, StoreError> {
        self.with(|table| table.members_for_page(page))
    }

    pub fn to_saved(&self) -> Result<SavedGroupTable, StoreError> {
        self.with(|table| table.to_saved())
    }

    pub(crate) fn register_loaded(&self, page: PageId, group_id: &str) -> Result<(), StoreError> {
        self.with_mut(|table| table.register_loaded(page, group_id))
    }

    pub(crate) fn relink(&self, relinker: &dyn crate::relink::Relinker) -> Result<usize, StoreError> {
        self.with_mut(|table| table.relink(relinker))
    }
}
