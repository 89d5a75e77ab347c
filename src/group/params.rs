use serde::{Deserialize, Serialize};

/// Pattern-classifier strictness used when building a shared dictionary.
///
/// Levels are ordered: `Legacy` is the historical single-pass classifier,
/// `Normal` the default full scan, `Maximal` the most thorough (and most
/// expensive) one.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Classifier {
    Legacy,
    #[default]
    Normal,
    Maximal,
}

impl Classifier {
    /// Numeric level as persisted by older project files.
    pub fn level(self) -> u8 {
        match self {
            Classifier::Legacy => 1,
            Classifier::Normal => 2,
            Classifier::Maximal => 3,
        }
    }

    pub fn from_level(level: u8) -> Self {
        match level {
            1 => Classifier::Legacy,
            2 => Classifier::Normal,
            _ => Classifier::Maximal,
        }
    }
}

/// Dictionary-build configuration shared by every page of a group.
///
/// Any change to these values invalidates the group's encoded dictionary,
/// so [`DictGroup::set_params`](super::DictGroup::set_params) bumps the
/// group revision whenever the new value differs from the old one.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DictParams {
    /// Enable pattern matching across pages at all.
    pub matching: bool,
    /// Substitute matched shapes with a shared prototype.
    pub prototypes: bool,
    /// Average matched shapes instead of picking one representative.
    pub averaging: bool,
    /// Erode shape borders before classification.
    pub erosion: bool,
    /// Match aggression level; higher trades fidelity for size.
    pub aggression: i32,
    pub classifier: Classifier,
    /// File extension of the emitted dictionary artifact.
    pub extension: String,
}

impl Default for DictParams {
    fn default() -> Self {
        DictParams {
            matching: true,
            prototypes: true,
            averaging: false,
            erosion: false,
            aggression: 100,
            classifier: Classifier::default(),
            extension: "djbz".to_string(),
        }
    }
}
