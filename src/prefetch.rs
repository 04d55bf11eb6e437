//! Opportunistic same-origin link prefetching on hover/focus intent.

use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use url::Url;

use crate::config::PrefetchConfig;

/// Opt-in attribute value (`data-prefetch="1"`).
const OPT_IN: &str = "1";

/// A link the pointer or focus landed on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Anchor {
    pub href: Option<String>,
    pub prefetch: bool,
}

impl Anchor {
    /// Build from raw `href` and `data-prefetch` attribute values.
    pub fn from_attrs(href: Option<&str>, data_prefetch: Option<&str>) -> Self {
        Self {
            href: href.map(str::to_string),
            prefetch: data_prefetch == Some(OPT_IN),
        }
    }
}

/// Resolve the URL to prefetch for `anchor`, if it qualifies.
pub fn prefetch_target(anchor: &Anchor, origin: &Url) -> Option<Url> {
    if !anchor.prefetch {
        return None;
    }
    let href = anchor.href.as_deref()?;
    if href.is_empty()
        || href.starts_with('#')
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
    {
        return None;
    }

    let url = origin.join(href).ok()?;
    (url.origin() == origin.origin()).then_some(url)
}

/// Issues the prefetch request. Fire-and-forget.
pub trait LinkFetcher: Send + Sync {
    fn head(&self, url: Url);
}

#[derive(Default)]
struct IntentState {
    primed: HashSet<String>,
    pending: Option<(u64, JoinHandle<()>)>,
    generation: u64,
}

impl IntentState {
    fn cancel_pending(&mut self) {
        if let Some((_, handle)) = self.pending.take() {
            handle.abort();
        }
    }
}

/// Debounces hover intent and fetches each URL at most once.
pub struct Prefetcher {
    origin: Url,
    delay: Duration,
    fetcher: Arc<dyn LinkFetcher>,
    state: Arc<Mutex<IntentState>>,
    runtime: Handle,
}

impl Prefetcher {
    /// Returns `None` outside a Tokio runtime.
    pub fn new(origin: Url, delay: Duration, fetcher: Arc<dyn LinkFetcher>) -> Option<Self> {
        let runtime = Handle::try_current().ok()?;
        Some(Self {
            origin,
            delay,
            fetcher,
            state: Arc::new(Mutex::new(IntentState::default())),
            runtime,
        })
    }

    pub fn from_config(
        origin: Url,
        config: &PrefetchConfig,
        fetcher: Arc<dyn LinkFetcher>,
    ) -> Option<Self> {
        Self::new(origin, Duration::from_millis(config.intent_delay_ms), fetcher)
    }

    /// Schedule a prefetch for `anchor`, replacing any earlier intent.
    ///
    /// Returns `false` when the anchor does not qualify; a pending intent
    /// is left alone in that case.
    pub fn on_intent(&self, anchor: &Anchor) -> bool {
        let Some(url) = prefetch_target(anchor, &self.origin) else {
            return false;
        };

        let mut state = self.state.lock();
        state.cancel_pending();
        state.generation = state.generation.wrapping_add(1);
        let generation = state.generation;

        let shared = Arc::clone(&self.state);
        let fetcher = Arc::clone(&self.fetcher);
        let deadline = Instant::now() + self.delay;
        let handle = self.runtime.spawn(async move {
            tokio::time::sleep_until(deadline).await;
            {
                let mut state = shared.lock();
                match &state.pending {
                    Some((current, _)) if *current == generation => {}
                    _ => return,
                }
                state.pending = None;
                if !state.primed.insert(url.to_string()) {
                    return;
                }
            }
            tracing::debug!(url = %url, "Prefetching link");
            fetcher.head(url);
        });

        state.pending = Some((generation, handle));
        true
    }

    pub fn is_primed(&self, url: &Url) -> bool {
        self.state.lock().primed.contains(url.as_str())
    }
}

impl Drop for Prefetcher {
    fn drop(&mut self) {
        let mut state = self.state.lock();
        state.cancel_pending();
        state.generation = state.generation.wrapping_add(1);
    }
}
