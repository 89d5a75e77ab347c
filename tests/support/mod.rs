//! Shared fixtures for the integration tests: an in-memory artifact
//! probe, a stub encoder writing into it, and a ready-made engine.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};

use pagedict::{
    ArtifactProbe, ArtifactStamp, CancelFlag, Defaults, Dispatcher, EncodeError, EncodeJob,
    Encoder, FingerprintStore, Invalidator, Orchestrator, PageId,
};

/// In-memory stand-in for the artifact directory.
#[derive(Default)]
pub struct FakeDisk {
    files: Mutex<HashMap<PathBuf, ArtifactStamp>>,
}

impl FakeDisk {
    pub fn put(&self, path: impl Into<PathBuf>, stamp: ArtifactStamp) {
        self.files.lock().unwrap().insert(path.into(), stamp);
    }

    pub fn delete(&self, path: &Path) {
        self.files.lock().unwrap().remove(path);
    }
}

impl ArtifactProbe for FakeDisk {
    fn stat(&self, path: &Path) -> Option<ArtifactStamp> {
        self.files.lock().unwrap().get(path).copied()
    }
}

/// Encoder that "writes" a stamp to the fake disk, counting invocations.
pub struct StubEncoder {
    disk: Arc<FakeDisk>,
    calls: AtomicUsize,
}

impl StubEncoder {
    pub fn new(disk: Arc<FakeDisk>) -> Self {
        StubEncoder {
            disk,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Encoder for StubEncoder {
    fn encode(&self, job: &EncodeJob, cancel: &CancelFlag) -> Result<ArtifactStamp, EncodeError> {
        if cancel.is_canceled() {
            return Err(EncodeError::Interrupted);
        }
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        let stamp = ArtifactStamp::new(
            4096,
            SystemTime::UNIX_EPOCH + Duration::from_secs(call as u64),
        );
        self.disk.put(job.artifact_path.clone(), stamp);
        Ok(stamp)
    }
}

/// A complete engine over the fake disk.
pub struct Engine {
    pub orchestrator: Orchestrator,
    pub disk: Arc<FakeDisk>,
    pub encoder: Arc<StubEncoder>,
}

impl Engine {
    pub fn new(defaults: Defaults) -> Self {
        let store = FingerprintStore::new();
        let dispatcher = Dispatcher::new(&defaults);
        let disk = Arc::new(FakeDisk::default());
        let invalidator = Invalidator::with_probe(
            store,
            dispatcher,
            defaults,
            disk.clone() as Arc<dyn ArtifactProbe>,
        );
        Engine {
            orchestrator: Orchestrator::new(invalidator),
            encoder: Arc::new(StubEncoder::new(disk.clone())),
            disk,
        }
    }

    pub fn invalidator(&self) -> &Invalidator {
        self.orchestrator.invalidator()
    }

    pub fn store(&self) -> &FingerprintStore {
        self.invalidator().store()
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        self.invalidator().dispatcher()
    }

    /// Register a source image for a page without building it.
    pub fn seed(&self, path: &str) -> PageId {
        let page = PageId::new(path);
        self.invalidator()
            .register_source(
                &page,
                pagedict::SourceImage::new(
                    path,
                    path.as_bytes().to_vec(),
                    pagedict::ColorMode::BlackAndWhite,
                ),
            )
            .unwrap();
        page
    }

    /// Seed and run one page to a fresh, recorded build.
    pub fn build(&self, path: &str) -> PageId {
        let page = self.seed(path);
        self.orchestrator
            .process_page(&page, self.encoder.as_ref(), &CancelFlag::new())
            .unwrap();
        page
    }

    pub fn process(&self, page: &PageId) -> pagedict::BuildOutcome {
        self.orchestrator
            .process_page(page, self.encoder.as_ref(), &CancelFlag::new())
            .unwrap()
    }

    pub fn artifact_path(&self, page: &PageId) -> PathBuf {
        self.store()
            .get(page)
            .unwrap()
            .unwrap()
            .config
            .artifact_path(&self.invalidator().defaults().pages_subfolder)
    }
}
