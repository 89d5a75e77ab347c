use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::fingerprint::{ArtifactStamp, PageConfig};
use crate::group::DictParams;
use crate::page_id::PageId;

/// Failure modes of an external encoder invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    /// The encoder ran and reported failure.
    Failed(String),
    /// The encoder observed the cancellation flag and stopped early;
    /// any partial artifact was discarded.
    Interrupted,
}

impl fmt::Display for EncodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EncodeError::Failed(message) => write!(f, "encoder failed: {}", message),
            EncodeError::Interrupted => write!(f, "encoder interrupted"),
        }
    }
}

impl std::error::Error for EncodeError {}

/// Cooperative cancellation shared between a build run and its encoders.
///
/// Encoders are expected to check it between discrete steps of a
/// multi-step command sequence, not preempt mid-step.
#[derive(Clone, Debug, Default)]
pub struct CancelFlag {
    flag: Arc<AtomicBool>,
}

impl CancelFlag {
    pub fn new() -> Self {
        CancelFlag::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_canceled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// Everything an encoder needs to produce one page artifact.
#[derive(Clone, Debug)]
pub struct EncodeJob {
    pub page: PageId,
    /// The page configuration being encoded, exactly as it will be
    /// recorded in the build snapshot on success.
    pub config: PageConfig,
    /// Effective dictionary parameters of the page's group.
    pub dict_params: DictParams,
    /// Where the finished artifact must land.
    pub artifact_path: PathBuf,
}

/// Narrow seam to the external encoder process.
///
/// Implementations run entirely outside the crate's locks. On success
/// they return the stamp of the artifact they wrote; on cancellation they
/// discard partial output and return [`EncodeError::Interrupted`].
pub trait Encoder: Send + Sync {
    fn encode(&self, job: &EncodeJob, cancel: &CancelFlag) -> Result<ArtifactStamp, EncodeError>;
}
