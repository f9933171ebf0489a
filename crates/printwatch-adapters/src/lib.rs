//! printwatch-adapters: one adapter per printer backend, plus the factory
//! that picks one from configuration.
//!
//! Every adapter answers a single `fetch()` with a normalized
//! [`StatusSnapshot`](printwatch_core::StatusSnapshot) or a classified
//! [`FetchError`](printwatch_core::FetchError). Scheduling, retries and
//! cancellation live in the engine crate.

pub mod adapter;
pub mod credentials;
pub mod demo;
pub mod factory;
pub mod http;
pub mod octoprint;
pub mod prusaconnect;
pub mod prusalink;
mod wire;

pub use adapter::PrinterAdapter;
pub use credentials::{CredentialStore, EnvCredentials, StaticCredentials};
pub use demo::DemoAdapter;
pub use factory::create_adapter;
pub use http::{AuthScheme, HttpJsonClient};
pub use octoprint::OctoPrintAdapter;
pub use prusaconnect::PrusaConnectAdapter;
pub use prusalink::PrusaLinkAdapter;
