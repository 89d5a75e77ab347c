use serde::{Deserialize, Serialize};

use super::config::PageConfig;
use super::flags::RegenFlags;
use super::record::BuildState;

/// Everything the cache knows about one page.
///
/// Created lazily the first time a page is touched; absence from the store
/// means "never processed". Only the build orchestrator writes the `build`
/// half; every other component treats it as read-only.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageFingerprint {
    pub config: PageConfig,
    #[serde(default)]
    pub build: BuildState,
    #[serde(default)]
    pub regen: RegenFlags,
}

impl PageFingerprint {
    pub fn new(config: PageConfig) -> Self {
        PageFingerprint {
            config,
            build: BuildState::NeverBuilt,
            regen: RegenFlags::default(),
        }
    }
}
