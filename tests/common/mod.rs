//! Shared test utilities and recording doubles.

#![allow(dead_code, unused_imports)]

use countersync::dispatch::{RequestDispatcher, SwapRequest};
use countersync::prefetch::LinkFetcher;
use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use url::Url;

/// Dispatcher that records every request instead of sending it.
#[derive(Default)]
pub struct RecordingDispatcher {
    requests: Mutex<Vec<SwapRequest>>,
}

impl RecordingDispatcher {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn requests(&self) -> Vec<SwapRequest> {
        self.requests.lock().clone()
    }

    /// `count` field of every recorded flush, in dispatch order.
    pub fn counts(&self) -> Vec<u64> {
        self.requests
            .lock()
            .iter()
            .map(|r| {
                r.field("count")
                    .expect("flush without count")
                    .parse()
                    .expect("non-numeric count")
            })
            .collect()
    }
}

impl RequestDispatcher for RecordingDispatcher {
    fn dispatch(&self, request: SwapRequest) {
        self.requests.lock().push(request);
    }
}

/// Link fetcher that records prefetched URLs.
#[derive(Default)]
pub struct RecordingFetcher {
    urls: Mutex<Vec<String>>,
}

impl RecordingFetcher {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn urls(&self) -> Vec<String> {
        self.urls.lock().clone()
    }
}

impl LinkFetcher for RecordingFetcher {
    fn head(&self, url: Url) {
        self.urls.lock().push(url.to_string());
    }
}

/// Write `content` to a config.toml inside a fresh temp dir.
pub fn temp_config(content: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_path = temp_dir.path().join("config.toml");
    std::fs::write(&config_path, content).expect("Failed to write config");
    (temp_dir, config_path)
}

/// Poll `check` every 10ms until it holds or `timeout` passes.
pub async fn wait_until<F: Fn() -> bool>(check: F, timeout: Duration) -> bool {
    let start = std::time::Instant::now();
    while start.elapsed() < timeout {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    check()
}
