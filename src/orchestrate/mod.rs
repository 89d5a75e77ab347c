//! Build execution: the encoder seam, single-page orchestration, and the
//! threaded batch runner.

mod encoder;
mod orchestrator;
mod worker;

pub use encoder::{CancelFlag, EncodeError, EncodeJob, Encoder};
pub use orchestrator::{BuildOutcome, Orchestrator};
pub use worker::{BuildRun, BuildStats};
