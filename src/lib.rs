mod defaults;
mod error;
mod fingerprint;
mod group;
mod invalidate;
#[cfg(feature = "emitter")]
mod notify;
mod orchestrate;
mod page_id;
mod project;
mod relink;

pub use defaults::Defaults;
pub use error::StoreError;
pub use fingerprint::{
    ArtifactStamp, BuildRecord, BuildState, ColorMode, Dpi, FingerprintStore, PageConfig,
    PageFingerprint, RegenFlags, SourceImage,
};
pub use group::{
    Classifier, DictGroup, DictParams, Dispatcher, GroupKind, GroupTable, RevisionBump,
    SavedGroup, SavedGroupTable, SENTINEL_GROUP_ID,
};
pub use invalidate::{ArtifactProbe, FsProbe, Invalidator};
pub use orchestrate::{
    BuildOutcome, BuildRun, BuildStats, CancelFlag, EncodeError, EncodeJob, Encoder, Orchestrator,
};
pub use page_id::PageId;
pub use project::{PageEntry, ProjectState, RestoredProject};
pub use relink::{PathMapRelinker, PrefixRelinker, Relinker};

#[cfg(feature = "emitter")]
pub use notify::{BuildNotifier, BUILD_FAILED, PAGE_REBUILT, PAGE_UP_TO_DATE};

// Re-export the EventEmitter from the event_emitter_rs crate
#[cfg(feature = "emitter")]
pub use event_emitter_rs::EventEmitter;
