//! Request dispatch and region swapping.
//!
//! A dispatcher takes a [`SwapRequest`], performs it asynchronously and
//! replaces the content of the request's target region with the response
//! body. Callers never wait for completion.

pub mod error;
pub mod http;
pub mod regions;

use reqwest::Method;

pub use error::DispatchError;
pub use http::HttpDispatcher;
pub use regions::RegionStore;

/// How a response body is applied to its target region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Swap {
    /// Replace the region's content with the response body.
    #[default]
    InnerHtml,
    /// Discard the response body.
    None,
}

/// One request to perform and where its response goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapRequest {
    pub method: Method,
    pub path: String,
    pub payload: Vec<(String, String)>,
    pub target: String,
    pub swap: Swap,
}

impl SwapRequest {
    pub fn post(path: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            method: Method::POST,
            path: path.into(),
            payload: Vec::new(),
            target: target.into(),
            swap: Swap::InnerHtml,
        }
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.payload.push((key.into(), value.to_string()));
        self
    }

    /// Value of the first payload field named `key`.
    pub fn field(&self, key: &str) -> Option<&str> {
        self.payload
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Fire-and-forget request execution.
///
/// `dispatch` must return without waiting on the network. Failures are
/// the implementation's to log; nothing is reported back.
pub trait RequestDispatcher: Send + Sync {
    fn dispatch(&self, request: SwapRequest);
}
