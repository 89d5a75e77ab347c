use serde::{Deserialize, Serialize};

/// Explicit force-reprocess bits on a page.
///
/// Each bit is independent and consumed exactly once: the first check that
/// observes a set bit clears it and reports stale; an immediately repeated
/// check falls through to the recorded-snapshot comparison.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegenFlags {
    /// Force full regeneration of the page output.
    #[serde(default)]
    pub page: bool,
    /// Force regeneration of the thumbnail/preview only.
    #[serde(default)]
    pub thumbnail: bool,
}

impl RegenFlags {
    pub fn force_all() -> Self {
        RegenFlags {
            page: true,
            thumbnail: true,
        }
    }

    /// Consume the full-regeneration bit.
    pub fn take_page(&mut self) -> bool {
        std::mem::take(&mut self.page)
    }

    /// Consume the thumbnail bit.
    pub fn take_thumbnail(&mut self) -> bool {
        std::mem::take(&mut self.thumbnail)
    }

    pub fn is_clear(&self) -> bool {
        !self.page && !self.thumbnail
    }
}
