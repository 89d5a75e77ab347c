use serde::{Deserialize, Serialize};

use crate::fingerprint::Dpi;
use crate::group::DictParams;

/// Project-wide defaults, the fallback source for any field missing from
/// persisted data.
///
/// A fresh group gets `dict_params`; a fresh page gets `dpi`; `assign`
/// sizes new groups at `pages_per_dict` (below 2 disables sharing
/// entirely). `pages_subfolder` is where encoded page artifacts live,
/// relative to each page's source directory.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Defaults {
    #[serde(default = "default_pages_per_dict")]
    pub pages_per_dict: usize,
    #[serde(default = "default_pages_subfolder")]
    pub pages_subfolder: String,
    #[serde(default)]
    pub dict_params: DictParams,
    #[serde(default)]
    pub dpi: Dpi,
}

fn default_pages_per_dict() -> usize {
    10
}

fn default_pages_subfolder() -> String {
    "djvu".to_string()
}

impl Default for Defaults {
    fn default() -> Self {
        Defaults {
            pages_per_dict: default_pages_per_dict(),
            pages_subfolder: default_pages_subfolder(),
            dict_params: DictParams::default(),
            dpi: Dpi::default(),
        }
    }
}
