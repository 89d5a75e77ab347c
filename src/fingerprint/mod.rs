//! Per-page fingerprints: current configuration, the recorded snapshot
//! that backed the last build, and the store that owns them.

mod config;
mod fingerprint;
mod flags;
mod record;
mod source;
mod store;

pub use config::{Dpi, PageConfig};
pub use fingerprint::PageFingerprint;
pub use flags::RegenFlags;
pub use record::{ArtifactStamp, BuildRecord, BuildState};
pub use source::{ColorMode, SourceImage};
pub use store::FingerprintStore;
