//! Interlock: railway station interlocking with twin-state safety
//! verification.
//!
//! This is the top-level facade crate that re-exports the public API from
//! all interlock sub-crates.
//!
//! # Quick start
//!
//! ```rust
//! use interlock::prelude::*;
//!
//! let mut station = Station::new(&StationConfig::default())
//!     .unwrap()
//!     .with_train_source(vec![Train::new("T001", 300.0)]);
//!
//! // GREEN needs a reserved track.
//! let refused = station.set_signal("S1", Aspect::Green, CommandMode::Verified).unwrap();
//! assert_eq!(refused.violation(), Some(ViolationKind::SignalPrecondition));
//!
//! assert!(station.request_track_allocation("P1", "T001").unwrap().is_safe());
//! assert!(station.set_signal("S1", Aspect::Green, CommandMode::Verified).unwrap().is_safe());
//!
//! // T001 is 300 units from gate G1, inside the danger radius.
//! let refused = station.set_gate("G1", GatePosition::Open, CommandMode::Verified).unwrap();
//! assert_eq!(refused.violation(), Some(ViolationKind::GateDangerZone));
//!
//! assert_eq!(station.stats().total, 4);
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `interlock-core` | IDs, resource state machines, commands, outcomes, records |
//! | [`twin`] | `interlock-twin` | Twin-state snapshots, safety policy, conflict detection |
//! | [`engine`] | `interlock-engine` | Verifier, controllers, station, audit sinks, config |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core types (`interlock-core`).
///
/// Identifiers, the Track/Signal/Gate state machines, [`types::Command`],
/// [`types::Outcome`] and [`types::VerificationRecord`].
pub use interlock_core as types;

/// Twin-state simulation (`interlock-twin`).
///
/// [`twin::TwinState`], [`twin::SafetyPolicy`] and the
/// [`twin::ConflictDetector`].
pub use interlock_twin as twin;

/// Verification engine (`interlock-engine`).
///
/// [`engine::Station`] for single-threaded use, [`engine::SharedStation`]
/// for multiple callers.
pub use interlock_engine as engine;

/// Common imports for typical interlock usage.
///
/// ```rust
/// use interlock::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use interlock_core::{
        Aspect, Command, CommandMode, DecidedBy, EntityRef, GateId, GatePosition, Outcome,
        SignalId, StationTime, TrackId, TrackState, Train, TrainId, TrainSource,
        VerificationRecord, ViolationKind,
    };

    // Policy
    pub use interlock_twin::{GreenPolicy, SafetyPolicy};

    // Engine
    pub use interlock_engine::{
        AuditSink, LogFilter, MemorySink, SharedStation, Station, StationConfig, StationError,
        VerificationStats,
    };
}
