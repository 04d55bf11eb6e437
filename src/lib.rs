pub mod config;
pub mod csrf;
pub mod dispatch;
pub mod driver;
pub mod logging;
pub mod prefetch;
pub mod server;
pub mod shutdown;
pub mod sync;

pub use dispatch::{RequestDispatcher, SwapRequest};
pub use sync::{CounterSync, SyncOptions, SyncPhase};
