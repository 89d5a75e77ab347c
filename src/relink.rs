use std::collections::HashMap;

/// Path substitution applied when the underlying source files move.
///
/// Returning `None` leaves a path untouched, so an implementation only has
/// to know about the paths it actually rewrites.
pub trait Relinker: Send + Sync {
    fn substitute(&self, path: &str) -> Option<String>;
}

/// Relinker backed by an explicit old-path → new-path map.
#[derive(Debug, Default)]
pub struct PathMapRelinker {
    substitutions: HashMap<String, String>,
}

impl PathMapRelinker {
    pub fn new() -> Self {
        PathMapRelinker::default()
    }

    pub fn map(mut self, old: impl Into<String>, new: impl Into<String>) -> Self {
        self.substitutions.insert(old.into(), new.into());
        self
    }
}

impl Relinker for PathMapRelinker {
    fn substitute(&self, path: &str) -> Option<String> {
        self.substitutions.get(path).cloned()
    }
}

/// Relinker that replaces a directory prefix, the common case when a whole
/// project folder is moved.
#[derive(Debug)]
pub struct PrefixRelinker {
    old_prefix: String,
    new_prefix: String,
}

impl PrefixRelinker {
    pub fn new(old_prefix: impl Into<String>, new_prefix: impl Into<String>) -> Self {
        PrefixRelinker {
            old_prefix: old_prefix.into(),
            new_prefix: new_prefix.into(),
        }
    }
}

impl Relinker for PrefixRelinker {
    fn substitute(&self, path: &str) -> Option<String> {
        path.strip_prefix(&self.old_prefix)
            .map(|rest| format!("{}{}", self.new_prefix, rest))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_relinker_leaves_unknown_paths_alone() {
        let relinker = PathMapRelinker::new().map("old/a.tif", "new/a.tif");
        assert_eq!(relinker.substitute("old/a.tif").as_deref(), Some("new/a.tif"));
        assert_eq!(relinker.substitute("old/b.tif"), None);
    }

    #[test]
    fn prefix_relinker_rewrites_directory() {
        let relinker = PrefixRelinker::new("/mnt/old/", "/mnt/new/");
        assert_eq!(
            relinker.substitute("/mnt/old/scans/p1.tif").as_deref(),
            Some("/mnt/new/scans/p1.tif")
        );
        assert_eq!(relinker.substitute("/elsewhere/p1.tif"), None);
    }
}
