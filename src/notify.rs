//! In-process build notifications over an
//! [`EventEmitter`](event_emitter_rs::EventEmitter), for UI layers that
//! want to refresh thumbnails or progress as pages finish.

use std::sync::{Arc, Mutex};

use event_emitter_rs::EventEmitter;

use crate::page_id::PageId;

/// Emitted after a page was re-encoded and its build snapshot recorded.
pub const PAGE_REBUILT: &str = "page_rebuilt";
/// Emitted when a processing pass found the cached output still valid.
pub const PAGE_UP_TO_DATE: &str = "page_up_to_date";
/// Emitted when the encoder failed or was interrupted; the page keeps its
/// previous (stale) state.
pub const BUILD_FAILED: &str = "build_failed";

/// Shared emitter handle; events carry the page path as payload.
#[derive(Clone, Default)]
pub struct BuildNotifier {
    emitter: Arc<Mutex<EventEmitter>>,
}

impl BuildNotifier {
    pub fn new() -> Self {
        BuildNotifier::default()
    }

    /// Subscribe to one of the event constants; returns the listener id.
    pub fn on<F>(&self, event: &str, callback: F) -> String
    where
        F: Fn(String) + Send + Sync + 'static,
    {
        match self.emitter.lock() {
            Ok(mut emitter) => emitter.on(event, callback),
            Err(_) => String::new(),
        }
    }

    pub fn remove_listener(&self, listener_id: &str) {
        if let Ok(mut emitter) = self.emitter.lock() {
            emitter.remove_listener(listener_id);
        }
    }

    pub(crate) fn emit_page(&self, event: &str, page: &PageId) {
        let handles = match self.emitter.lock() {
            Ok(mut emitter) => emitter.emit(event, page.path().to_string()),
            Err(_) => return,
        };
        // Join outside the lock so a callback that re-enters `on` or
        // `remove_listener` cannot deadlock.
        for handle in handles {
            let _ = handle.join();
        }
    }
}
