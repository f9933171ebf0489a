//! The backend seam the poll engine drives.

use async_trait::async_trait;
use printwatch_core::{FetchError, StatusSnapshot};

/// One printer backend. Enables fake injection for engine tests.
///
/// `fetch` performs exactly one status request. It must not retry or sleep
/// on its own; the engine owns timing. Dropping the returned future cancels
/// the request.
#[async_trait]
pub trait PrinterAdapter: Send + Sync {
    /// Short backend name used in logs.
    fn name(&self) -> &'static str;

    async fn fetch(&self) -> Result<StatusSnapshot, FetchError>;
}
