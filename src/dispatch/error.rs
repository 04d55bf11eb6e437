use thiserror::Error;

/// Errors from building a dispatcher or executing a request.
///
/// Execution errors never reach the code that called `dispatch`; they are
/// only logged.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Endpoint in configuration is not a URL
    #[error("Invalid endpoint '{url}': {source}")]
    InvalidEndpoint {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// CSRF header name is not a valid HTTP header name
    #[error("Invalid CSRF header name '{name}'")]
    InvalidHeaderName { name: String },

    /// HTTP client could not be constructed
    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    /// Constructed outside a Tokio runtime
    #[error("No Tokio runtime available")]
    NoRuntime,

    /// Request path could not be joined onto the base URL
    #[error("Invalid request path '{path}': {source}")]
    InvalidPath {
        path: String,
        #[source]
        source: url::ParseError,
    },

    /// Transport-level failure
    #[error("Request to '{url}' failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Server answered with a non-success status
    #[error("Server returned {status} for '{url}'")]
    Status { url: String, status: u16 },
}
