use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::page_id::PageId;
use crate::relink::Relinker;

use super::params::DictParams;

/// Reserved id of the sentinel "no shared dictionary" group.
///
/// Generated group ids are purely numeric and zero-padded, so this value
/// can never collide with one.
pub const SENTINEL_GROUP_ID: &str = "<none>";

/// How a group acquires and loses members.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum GroupKind {
    /// The table may add pages up to capacity.
    #[default]
    #[serde(rename = "auto")]
    AutoFill,
    /// Only explicit user action changes membership.
    #[serde(rename = "locked")]
    Locked,
    /// The sentinel: members are encoded standalone.
    #[serde(rename = "no_dict")]
    NoDict,
}

/// Whether a membership change advances the group revision.
///
/// `Suppress` is a narrow escape hatch for bulk migrations that must not
/// invalidate anything (project restore rebuilding membership); it is
/// never the default and callers spell it out explicitly.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RevisionBump {
    Bump,
    Suppress,
}

/// One dictionary group: membership, capacity, parameters and the
/// monotonically advancing revision used as the invalidation token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DictGroup {
    kind: GroupKind,
    capacity: usize,
    revision: u64,
    params: DictParams,
    pages: BTreeSet<PageId>,
}

impl DictGroup {
    pub fn new(kind: GroupKind, capacity: usize, params: DictParams) -> Self {
        DictGroup {
            kind,
            capacity,
            revision: 0,
            params,
            pages: BTreeSet::new(),
        }
    }

    pub fn kind(&self) -> GroupKind {
        self.kind
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn params(&self) -> &DictParams {
        &self.params
    }

    pub fn pages(&self) -> &BTreeSet<PageId> {
        &self.pages
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn contains(&self, page: &PageId) -> bool {
        self.pages.contains(page)
    }

    /// Whether `assign` may place another page here.
    pub fn has_room(&self) -> bool {
        self.kind == GroupKind::AutoFill && self.pages.len() < self.capacity
    }

    /// Add a member. Capacity grows to match membership if exceeded
    /// (never shrinks back). Returns whether the page was new.
    ///
    /// The sentinel's revision never advances: nothing is ever built
    /// against it, and bumping it would invalidate standalone pages
    /// whenever an unrelated page joins.
    pub(crate) fn insert_page(&mut self, page: PageId, bump: RevisionBump) -> bool {
        if !self.pages.insert(page) {
            return false;
        }
        if self.kind != GroupKind::NoDict && self.pages.len() > self.capacity {
            self.capacity = self.pages.len();
        }
        if bump == RevisionBump::Bump && self.kind != GroupKind::NoDict {
            self.revision += 1;
        }
        true
    }

    /// Swap one member's identity for another, keeping the revision: a
    /// rename changes nothing about the built dictionary.
    pub(crate) fn rename_page(&mut self, old: &PageId, new: PageId) -> bool {
        if !self.pages.remove(old) {
            return false;
        }
        self.pages.insert(new);
        true
    }

    pub(crate) fn remove_page(&mut self, page: &PageId, bump: RevisionBump) -> bool {
        if !self.pages.remove(page) {
            return false;
        }
        if bump == RevisionBump::Bump && self.kind != GroupKind::NoDict {
            self.revision += 1;
        }
        true
    }

    /// Replace the dictionary parameters, bumping the revision only when
    /// they actually change.
    pub(crate) fn set_params(&mut self, params: DictParams) -> bool {
        if self.params == params {
            return false;
        }
        self.params = params;
        self.revision += 1;
        true
    }
}

/// Persisted form of one group: everything except membership, which is
/// rebuilt from the page fingerprints on restore.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedGroup {
    pub id: String,
    #[serde(default)]
    pub kind: GroupKind,
    #[serde(default)]
    pub capacity: usize,
    #[serde(default)]
    pub revision: u64,
    #[serde(default)]
    pub params: DictParams,
}

/// Persisted form of the whole table.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedGroupTable {
    #[serde(default)]
    pub default_capacity: usize,
    #[serde(default)]
    pub groups: Vec<SavedGroup>,
}

/// The dictionary group table: group lifecycle plus the page→group index.
///
/// Both directions of the page↔group relation are mutated together inside
/// every operation; the index never disagrees with the membership sets.
/// This type is plain data; [`Dispatcher`](super::Dispatcher) provides
/// the shared, lock-guarded handle.
#[derive(Clone, Debug)]
pub struct GroupTable {
    default_capacity: usize,
    default_params: DictParams,
    groups: BTreeMap<String, DictGroup>,
    page_to_group: BTreeMap<PageId, String>,
    next_id: u64,
}

impl GroupTable {
    pub fn new(default_capacity: usize, default_params: DictParams) -> Self {
        let mut groups = BTreeMap::new();
        groups.insert(
            SENTINEL_GROUP_ID.to_string(),
            DictGroup::new(GroupKind::NoDict, 0, default_params.clone()),
        );
        GroupTable {
            default_capacity,
            default_params,
            groups,
            page_to_group: BTreeMap::new(),
            next_id: 1,
        }
    }

    pub fn default_capacity(&self) -> usize {
        self.default_capacity
    }

    pub fn set_default_capacity(&mut self, capacity: usize) {
        self.default_capacity = capacity;
    }

    pub fn is_sentinel(id: &str) -> bool {
        id == SENTINEL_GROUP_ID
    }

    /// Next free generated id: monotonic counter, zero-padded, checked
    /// against every existing id so it can never collide with a locked
    /// group that survived a rebalance.
    fn next_group_id(&mut self) -> String {
        loop {
            let id = format!("{:04}", self.next_id);
            self.next_id += 1;
            if !self.groups.contains_key(&id) {
                return id;
            }
        }
    }

    /// Group the page is currently mapped to, if any. Every page must be
    /// assigned before the invalidation engine is asked about it.
    pub fn group_for_page(&self, page: &PageId) -> Option<&str> {
        self.page_to_group.get(page).map(String::as_str)
    }

    pub fn group(&self, id: &str) -> Option<&DictGroup> {
        self.groups.get(id)
    }

    pub fn list(&self) -> Vec<String> {
        self.groups.keys().cloned().collect()
    }

    /// Group id → member count, for UI display.
    pub fn sizes(&self) -> BTreeMap<String, usize> {
        self.groups
            .iter()
            .map(|(id, group)| (id.clone(), group.len()))
            .collect()
    }

    /// Members sharing a dictionary with this page.
    ///
    /// Sentinel membership never implies sharing, so a sentinel page gets
    /// a singleton set of itself. `None` for unmapped pages.
    pub fn members_for_page(&self, page: &PageId) -> Option<BTreeSet<PageId>> {
        let group_id = self.page_to_group.get(page)?;
        if Self::is_sentinel(group_id) {
            let mut single = BTreeSet::new();
            single.insert(page.clone());
            return Some(single);
        }
        self.groups.get(group_id).map(|group| group.pages().clone())
    }

    /// Place a page into a group, creating one if none has room.
    ///
    /// Idempotent: an already-mapped page keeps its group. With sharing
    /// disabled (default capacity below 2) the page goes to the sentinel.
    pub fn assign(&mut self, page: &PageId) -> String {
        if let Some(group_id) = self.page_to_group.get(page) {
            return group_id.clone();
        }

        if self.default_capacity < 2 {
            self.insert_into(SENTINEL_GROUP_ID.to_string(), page.clone(), RevisionBump::Bump);
            return SENTINEL_GROUP_ID.to_string();
        }

        let found = self
            .groups
            .iter()
            .find(|(_, group)| group.has_room())
            .map(|(id, _)| id.clone());

        let group_id = match found {
            Some(id) => id,
            None => {
                let id = self.next_group_id();
                self.groups.insert(
                    id.clone(),
                    DictGroup::new(
                        GroupKind::AutoFill,
                        self.default_capacity,
                        self.default_params.clone(),
                    ),
                );
                id
            }
        };

        self.insert_into(group_id.clone(), page.clone(), RevisionBump::Bump);
        group_id
    }

    fn insert_into(&mut self, group_id: String, page: PageId, bump: RevisionBump) {
        if let Some(group) = self.groups.get_mut(&group_id) {
            group.insert_page(page.clone(), bump);
        }
        self.page_to_group.insert(page, group_id);
    }

    /// Remove a page from its group and clear the index entry.
    ///
    /// Returns whether the page was mapped at all. A mapped page whose
    /// group entry is missing is a broken invariant and aborts the
    /// operation.
    pub fn remove(&mut self, page: &PageId, bump: RevisionBump) -> Result<bool, StoreError> {
        let Some(group_id) = self.page_to_group.get(page).cloned() else {
            return Ok(false);
        };
        let Some(group) = self.groups.get_mut(&group_id) else {
            return Err(StoreError::MissingGroup {
                page: page.clone(),
                group_id,
            });
        };
        group.remove_page(page, bump);
        self.page_to_group.remove(page);
        Ok(true)
    }

    /// Create a group with an explicit (usually user-chosen) id.
    pub fn create_group(
        &mut self,
        id: impl Into<String>,
        kind: GroupKind,
        capacity: usize,
        params: DictParams,
    ) -> Result<(), StoreError> {
        let id = id.into();
        if self.groups.contains_key(&id) {
            return Err(StoreError::Malformed(format!(
                "group {} already exists",
                id
            )));
        }
        self.groups.insert(id, DictGroup::new(kind, capacity, params));
        Ok(())
    }

    /// Map a page into a specific existing group.
    pub fn set_membership(
        &mut self,
        page: &PageId,
        group_id: &str,
        bump: RevisionBump,
    ) -> Result<(), StoreError> {
        if self.page_to_group.get(page).map(String::as_str) == Some(group_id) {
            return Ok(());
        }
        if !self.groups.contains_key(group_id) {
            return Err(StoreError::MissingGroup {
                page: page.clone(),
                group_id: group_id.to_string(),
            });
        }
        self.remove(page, bump)?;
        self.insert_into(group_id.to_string(), page.clone(), bump);
        Ok(())
    }

    /// Atomic remove-then-insert into a specific group.
    pub fn move_to(
        &mut self,
        page: &PageId,
        group_id: &str,
        bump: RevisionBump,
    ) -> Result<(), StoreError> {
        self.set_membership(page, group_id, bump)
    }

    /// Replace a group's dictionary parameters; bumps the revision when
    /// they actually change. Returns whether anything changed.
    pub fn set_group_params(
        &mut self,
        group_id: &str,
        params: DictParams,
    ) -> Result<bool, StoreError> {
        match self.groups.get_mut(group_id) {
            Some(group) => Ok(group.set_params(params)),
            None => Err(StoreError::Malformed(format!("no such group: {}", group_id))),
        }
    }

    /// Full repartition of every non-locked page.
    ///
    /// `Locked` groups survive verbatim: members, parameters and
    /// revisions untouched. All `AutoFill` groups are discarded, the
    /// sentinel is re-created, the generated-id counter starts over
    /// (collision-checked against surviving locked ids), and the given
    /// pages are distributed in input order into fresh `AutoFill` groups
    /// of `capacity`. With `capacity < 2` every non-locked page lands in
    /// the sentinel instead.
    pub fn rebalance(&mut self, pages: &[PageId], capacity: usize) {
        self.default_capacity = capacity;

        let locked: BTreeMap<String, DictGroup> = self
            .groups
            .iter()
            .filter(|(_, group)| group.kind() == GroupKind::Locked)
            .map(|(id, group)| (id.clone(), group.clone()))
            .collect();

        self.groups = locked;
        self.page_to_group.clear();
        self.next_id = 1;

        for (id, group) in &self.groups {
            for page in group.pages() {
                self.page_to_group.insert(page.clone(), id.clone());
            }
        }

        self.groups.insert(
            SENTINEL_GROUP_ID.to_string(),
            DictGroup::new(GroupKind::NoDict, 0, self.default_params.clone()),
        );

        let free_pages: Vec<PageId> = pages
            .iter()
            .filter(|page| !self.page_to_group.contains_key(page))
            .cloned()
            .collect();

        if capacity < 2 {
            for page in free_pages {
                self.insert_into(SENTINEL_GROUP_ID.to_string(), page, RevisionBump::Bump);
            }
            return;
        }

        let mut current: Option<String> = None;
        let mut filled = 0;
        for page in free_pages {
            let id = match current.take() {
                Some(id) if filled < capacity => id,
                _ => {
                    let id = self.next_group_id();
                    self.groups.insert(
                        id.clone(),
                        DictGroup::new(GroupKind::AutoFill, capacity, self.default_params.clone()),
                    );
                    filled = 0;
                    id
                }
            };
            self.insert_into(id.clone(), page, RevisionBump::Bump);
            filled += 1;
            current = Some(id);
        }
    }

    /// Re-register a page loaded from a persisted project.
    ///
    /// Membership is not part of the persisted table, so restore replays
    /// each fingerprint's recorded group id through here with bump
    /// suppression, since a round-trip must not invalidate anything. A group
    /// id the table has never heard of (older or damaged project) is
    /// recreated as an `AutoFill` group on the spot.
    pub(crate) fn register_loaded(&mut self, page: PageId, group_id: &str) {
        if !self.groups.contains_key(group_id) {
            self.groups.insert(
                group_id.to_string(),
                DictGroup::new(
                    GroupKind::AutoFill,
                    self.default_capacity,
                    self.default_params.clone(),
                ),
            );
        }
        self.insert_into(group_id.to_string(), page, RevisionBump::Suppress);
    }

    /// Rewrite page identities after the underlying files moved.
    ///
    /// Pure key migration over the index and the member sets; no
    /// revision bumps, since a rename changes nothing a dictionary was
    /// built from. Returns the number of pages whose path changed.
    pub(crate) fn relink(&mut self, relinker: &dyn Relinker) -> usize {
        let mut changed = 0;
        let old_index = std::mem::take(&mut self.page_to_group);
        for (page, group_id) in old_index {
            match relinker.substitute(page.path()) {
                Some(new_path) => {
                    let new_page = PageId::new(new_path);
                    if let Some(group) = self.groups.get_mut(&group_id) {
                        group.rename_page(&page, new_page.clone());
                    }
                    self.page_to_group.insert(new_page, group_id);
                    changed += 1;
                }
                None => {
                    self.page_to_group.insert(page, group_id);
                }
            }
        }
        changed
    }

    /// Strip to the persisted form (membership intentionally omitted).
    pub fn to_saved(&self) -> SavedGroupTable {
        SavedGroupTable {
            default_capacity: self.default_capacity,
            groups: self
                .groups
                .iter()
                .map(|(id, group)| SavedGroup {
                    id: id.clone(),
                    kind: group.kind(),
                    capacity: group.capacity(),
                    revision: group.revision(),
                    params: group.params().clone(),
                })
                .collect(),
        }
    }

    /// Rebuild from the persisted form.
    ///
    /// The sentinel is re-created unconditionally even when absent from
    /// the data, to tolerate projects written by older schema versions.
    pub fn from_saved(saved: &SavedGroupTable, default_params: DictParams) -> Self {
        let default_capacity = if saved.default_capacity == 0 {
            crate::defaults::Defaults::default().pages_per_dict
        } else {
            saved.default_capacity
        };
        let mut table = GroupTable::new(default_capacity, default_params);
        for entry in &saved.groups {
            if GroupTable::is_sentinel(&entry.id) {
                continue;
            }
            let mut group = DictGroup::new(entry.kind, entry.capacity, entry.params.clone());
            group.revision = entry.revision;
            table.groups.insert(entry.id.clone(), group);
        }
        table
    }
}
