use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use crate::dispatch::Swap;

/// Named content regions that responses are swapped into.
///
/// Cloning shares the same underlying map.
#[derive(Clone, Default)]
pub struct RegionStore {
    inner: Arc<RwLock<HashMap<String, String>>>,
}

impl RegionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply `body` to `target` according to `swap`.
    pub fn apply(&self, target: &str, swap: Swap, body: String) {
        match swap {
            Swap::InnerHtml => {
                self.inner.write().insert(target.to_string(), body);
            }
            Swap::None => {}
        }
    }

    pub fn get(&self, target: &str) -> Option<String> {
        self.inner.read().get(target).cloned()
    }
}
