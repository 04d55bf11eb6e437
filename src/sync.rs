//! Debounced counter synchronisation.
//!
//! [`CounterSync`] keeps a local counter and pushes it to the server no
//! sooner than a quiet period after the last change. Each `bump` restarts
//! the countdown; `reset` flushes immediately.

use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::config::SyncConfig;
use crate::dispatch::{RequestDispatcher, SwapRequest};

/// Payload field carrying the counter value.
pub const COUNT_FIELD: &str = "count";

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("CounterSync must be created inside a Tokio runtime")]
    NoRuntime,
}

/// Whether a flush is waiting on the quiet period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPhase {
    Idle,
    Pending,
}

#[derive(Debug, Clone)]
pub struct SyncOptions {
    pub quiet_period: Duration,
    pub path: String,
    pub target: String,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self::from(&SyncConfig::default())
    }
}

impl From<&SyncConfig> for SyncOptions {
    fn from(config: &SyncConfig) -> Self {
        Self {
            quiet_period: Duration::from_millis(config.quiet_period_ms),
            path: config.path.clone(),
            target: config.target.clone(),
        }
    }
}

struct PendingFlush {
    generation: u64,
    handle: JoinHandle<()>,
}

/// Counter value plus the scheduled flush, if any.
///
/// `pending` is `Some` exactly while a bump is waiting to be flushed.
struct CounterState {
    count: u64,
    pending: Option<PendingFlush>,
    generation: u64,
}

impl CounterState {
    fn new() -> Self {
        Self {
            count: 0,
            pending: None,
            generation: 0,
        }
    }

    fn cancel_pending(&mut self) {
        if let Some(pending) = self.pending.take() {
            pending.handle.abort();
        }
    }

    fn next_generation(&mut self) -> u64 {
        self.generation = self.generation.wrapping_add(1);
        self.generation
    }
}

struct Flusher {
    dispatcher: Arc<dyn RequestDispatcher>,
    path: String,
    target: String,
}

impl Flusher {
    fn flush(&self, count: u64) {
        tracing::debug!(count, path = %self.path, "Flushing counter");
        let request = SwapRequest::post(&self.path, &self.target).with_field(COUNT_FIELD, count);
        self.dispatcher.dispatch(request);
    }
}

pub struct CounterSync {
    state: Arc<Mutex<CounterState>>,
    flusher: Arc<Flusher>,
    quiet_period: Duration,
    runtime: Handle,
}

impl CounterSync {
    pub fn new(
        dispatcher: Arc<dyn RequestDispatcher>,
        options: SyncOptions,
    ) -> Result<Self, SyncError> {
        let runtime = Handle::try_current().map_err(|_| SyncError::NoRuntime)?;
        Ok(Self {
            state: Arc::new(Mutex::new(CounterState::new())),
            flusher: Arc::new(Flusher {
                dispatcher,
                path: options.path,
                target: options.target,
            }),
            quiet_period: options.quiet_period,
            runtime,
        })
    }

    /// Increment the counter and restart the quiet period.
    pub fn bump(&self) {
        let mut state = self.state.lock();
        state.count += 1;
        state.cancel_pending();

        let generation = state.next_generation();
        let shared = Arc::clone(&self.state);
        let flusher = Arc::clone(&self.flusher);
        let deadline = Instant::now() + self.quiet_period;

        let handle = self.runtime.spawn(async move {
            tokio::time::sleep_until(deadline).await;
            let count = {
                let mut state = shared.lock();
                // A newer bump, a reset or a drop superseded this timer.
                match &state.pending {
                    Some(pending) if pending.generation == generation => {}
                    _ => return,
                }
                state.pending = None;
                state.count
            };
            flusher.flush(count);
        });

        state.pending = Some(PendingFlush { generation, handle });
    }

    /// Zero the counter and flush immediately, cancelling any pending flush.
    pub fn reset(&self) {
        {
            let mut state = self.state.lock();
            state.cancel_pending();
            state.next_generation();
            state.count = 0;
        }
        self.flusher.flush(0);
    }

    pub fn count(&self) -> u64 {
        self.state.lock().count
    }

    pub fn is_pending(&self) -> bool {
        self.state.lock().pending.is_some()
    }

    pub fn phase(&self) -> SyncPhase {
        if self.is_pending() {
            SyncPhase::Pending
        } else {
            SyncPhase::Idle
        }
    }

    pub fn quiet_period(&self) -> Duration {
        self.quiet_period
    }
}

impl Drop for CounterSync {
    fn drop(&mut self) {
        let mut state = self.state.lock();
        state.cancel_pending();
        state.next_generation();
    }
}
