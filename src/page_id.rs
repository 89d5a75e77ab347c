use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Stable identity of one document page: the path of its source image.
///
/// The path is the page's key everywhere in the crate: the fingerprint
/// store, the group table index, and persisted project state. Relinking
/// (moving the project folder) rewrites it in one migration pass; nothing
/// else ever changes it.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PageId(String);

impl PageId {
    pub fn new(path: impl Into<String>) -> Self {
        PageId(path.into())
    }

    pub fn path(&self) -> &str {
        &self.0
    }

    pub fn as_path(&self) -> &Path {
        Path::new(&self.0)
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PageId {
    fn from(path: &str) -> Self {
        PageId(path.to_string())
    }
}

impl From<String> for PageId {
    fn from(path: String) -> Self {
        PageId(path)
    }
}
