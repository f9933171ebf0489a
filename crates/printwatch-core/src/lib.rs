//! printwatch-core: status model, normalization, backoff and configuration.
//! Pure library: no async runtime, no network, no clock reads.

pub mod backoff;
pub mod config;
pub mod display;
pub mod error;
pub mod normalize;
pub mod types;

pub use backoff::{BackoffPolicy, BackoffTracker};
pub use config::{AppConfig, AuthMode, Backend};
pub use error::{ConfigError, FailureKind, FetchError};
pub use normalize::{clamp, normalize_state};
pub use types::{PollRecord, PrinterStatus, StatusSnapshot};
