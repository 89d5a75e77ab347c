use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::source::SourceImage;

/// Output resolution of the encoded page.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dpi {
    pub horizontal: u32,
    pub vertical: u32,
}

impl Dpi {
    pub fn new(horizontal: u32, vertical: u32) -> Self {
        Dpi {
            horizontal,
            vertical,
        }
    }
}

impl Default for Dpi {
    fn default() -> Self {
        Dpi::new(600, 600)
    }
}

/// A page's current build configuration.
///
/// This is the "own configuration" half of the fingerprint: everything the
/// page itself contributes to its encoded output, plus the group id and
/// group revision observed when the page was last (re)configured. The
/// invalidation engine compares it field for field against the
/// configuration recorded at build time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageConfig {
    #[serde(default)]
    pub dpi: Dpi,
    #[serde(default)]
    pub clean: bool,
    #[serde(default)]
    pub erosion: bool,
    #[serde(default = "default_smooth")]
    pub smooth: bool,
    #[serde(default)]
    pub source: SourceImage,
    /// Dictionary group this page was last assigned to; empty when the
    /// page has never been assigned.
    #[serde(default)]
    pub group_id: String,
    #[serde(default)]
    pub group_revision: u64,
}

fn default_smooth() -> bool {
    true
}

impl Default for PageConfig {
    fn default() -> Self {
        PageConfig {
            dpi: Dpi::default(),
            clean: false,
            erosion: false,
            smooth: true,
            source: SourceImage::default(),
            group_id: String::new(),
            group_revision: 0,
        }
    }
}

impl PageConfig {
    pub fn new(source: SourceImage) -> Self {
        PageConfig {
            source,
            ..PageConfig::default()
        }
    }

    /// Whether the page carries enough information to be encoded at all.
    pub fn is_complete(&self) -> bool {
        self.source.is_complete()
    }

    /// Path of the encoded page artifact derived from the source path:
    /// `{source dir}/{pages_subfolder}/{stem}.djv`.
    pub fn artifact_path(&self, pages_subfolder: &str) -> PathBuf {
        let source = Path::new(&self.source.path);
        let dir = source.parent().unwrap_or_else(|| Path::new(""));
        let stem = source
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        dir.join(pages_subfolder).join(format!("{}.djv", stem))
    }
}
