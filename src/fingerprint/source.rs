use serde::{Deserialize, Serialize};

/// Color interpretation of the source image at scan time.
///
/// `Unknown` marks a page whose source has not been inspected yet; a
/// config carrying it is never considered complete.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorMode {
    #[default]
    Unknown,
    BlackAndWhite,
    Grayscale,
    Color,
}

/// Identity of a page's source image: path, content hash, and color mode.
///
/// The content hash is what actually detects a swapped-out scan; the path
/// alone survives relinking and the modification time is not trusted for
/// sources.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceImage {
    pub path: String,
    #[serde(with = "hash_serde")]
    pub content_hash: Vec<u8>,
    pub color_mode: ColorMode,
}

mod hash_serde {
    use base64::{engine::general_purpose::STANDARD, Engine};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(hash: &Vec<u8>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        STANDARD.encode(hash).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s: String = String::deserialize(deserializer)?;
        STANDARD.decode(&s).map_err(serde::de::Error::custom)
    }
}

impl SourceImage {
    pub fn new(path: impl Into<String>, content_hash: Vec<u8>, color_mode: ColorMode) -> Self {
        SourceImage {
            path: path.into(),
            content_hash,
            color_mode,
        }
    }

    /// A source is complete once it names a file and a known color mode.
    pub fn is_complete(&self) -> bool {
        !self.path.is_empty() && self.color_mode != ColorMode::Unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_incomplete() {
        assert!(!SourceImage::default().is_complete());
    }

    #[test]
    fn hash_survives_json_round_trip() {
        let src = SourceImage::new("scans/p1.tif", vec![0xde, 0xad, 0xbe, 0xef], ColorMode::Color);
        let json = serde_json::to_string(&src).unwrap();
        let back: SourceImage = serde_json::from_str(&json).unwrap();
        assert_eq!(back, src);
        // hash is stored as text, not a byte array
        assert!(json.contains("\"content_hash\":\""));
    }
}
