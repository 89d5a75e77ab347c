use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use crate::group::DictParams;

use super::config::PageConfig;

/// On-disk metadata of an encoded artifact, captured right after a build.
///
/// Size and modification time together stand in for the file content: if
/// either differs from what was recorded, somebody replaced or truncated
/// the artifact behind our back and it can no longer be trusted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactStamp {
    pub size: u64,
    pub modified: SystemTime,
}

impl ArtifactStamp {
    pub fn new(size: u64, modified: SystemTime) -> Self {
        ArtifactStamp { size, modified }
    }
}

/// The exact combination of inputs that produced the last known-good
/// output for a page.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildRecord {
    /// The page's own configuration in effect when the build ran.
    pub config: PageConfig,
    /// Dictionary group the page was encoded against.
    pub group_id: String,
    /// Group revision at the moment the build started.
    pub group_revision: u64,
    /// Dictionary parameters the group carried at that revision.
    pub dict_params: DictParams,
    /// Metadata of the artifact the build produced.
    pub artifact: ArtifactStamp,
}

impl BuildRecord {
    /// Whether this record still describes the given current state.
    ///
    /// Every field except the artifact stamp participates; the stamp is
    /// checked separately against the file system.
    pub fn matches(
        &self,
        config: &PageConfig,
        group_id: &str,
        group_revision: u64,
        dict_params: &DictParams,
    ) -> bool {
        self.config == *config
            && self.group_id == group_id
            && self.group_revision == group_revision
            && self.dict_params == *dict_params
    }
}

/// Build history of a page, made exhaustive on purpose: a page either has
/// never been built (always stale) or was built with a known record.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildState {
    #[default]
    NeverBuilt,
    BuiltWith(Box<BuildRecord>),
}

impl BuildState {
    pub fn record(&self) -> Option<&BuildRecord> {
        match self {
            BuildState::NeverBuilt => None,
            BuildState::BuiltWith(record) => Some(record),
        }
    }

    pub fn is_built(&self) -> bool {
        matches!(self, BuildState::BuiltWith(_))
    }
}
