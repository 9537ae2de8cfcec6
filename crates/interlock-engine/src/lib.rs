//! Safety verification engine for station interlocking.
//!
//! Provides the [`SafetyVerifier`] that decides every command against a
//! twin-state simulation, the three resource controllers that own live
//! state, and the [`Station`] aggregate that ties them to a train source
//! and an audit sink. [`SharedStation`] serializes multiple callers.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod audit;
pub mod config;
pub mod gate_controller;
pub mod metrics;
pub mod shared;
pub mod signal_controller;
pub mod station;
pub mod track_manager;
pub mod verifier;

pub use audit::{
    AuditError, AuditEvent, AuditSink, ChannelSink, Controller, ControllerNotice, MemorySink,
    NoticePhase, NullSink,
};
pub use config::{ConfigError, GateConfig, SignalConfig, StationConfig, TrackConfig};
pub use gate_controller::GateController;
pub use metrics::VerificationStats;
pub use shared::SharedStation;
pub use signal_controller::SignalController;
pub use station::{GateStatus, ResourceSnapshot, Station, StationError};
pub use track_manager::TrackManager;
pub use verifier::{Decision, LogFilter, SafetyVerifier};
