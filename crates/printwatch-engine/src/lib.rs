//! printwatch-engine: schedules fetches against one adapter at a time.
//!
//! A single tokio task owns all scheduling state (backoff, the in-flight
//! fetch, the current adapter and its generation). Consumers talk to it
//! through [`PollEngine`] and receive [`StatusUpdate`]s on a channel.

pub mod config;
pub mod engine;
pub mod update;

pub use config::EngineConfig;
pub use engine::PollEngine;
pub use update::{EngineCommand, EnginePhase, StatusUpdate};
