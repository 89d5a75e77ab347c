//! Dictionary groups: parameters, the group table, and the shared
//! dispatcher handle that owns page↔group membership.

mod dispatcher;
mod params;
mod table;

pub use dispatcher::Dispatcher;
pub use params::{Classifier, DictParams};
pub use table::{
    DictGroup, GroupKind, GroupTable, RevisionBump, SavedGroup, SavedGroupTable,
    SENTINEL_GROUP_ID,
};
