//! Library facade for the `phicore-node` binary.
//!
//! Config loading, the scoring service and event sinks live here so
//! integration tests can drive a node without going through the CLI.

pub mod config;
pub mod events;
pub mod service;

pub use config::{load_config, parse_config, Config, ConfigError, ConfigFormat, NodeSection};
pub use events::{
    BroadcastEventSink, CompositeEventSink, EngineEvent, EventSink, NoopEventSink,
};
pub use service::{ScoreOutcome, ScoringService, ServiceError};
