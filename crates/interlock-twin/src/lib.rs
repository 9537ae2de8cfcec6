//! Twin-state simulation substrate for station interlocking.
//!
//! A [`TwinState`] is a value copy of every track, signal, gate and train at
//! one instant. Commands are applied to a twin rather than to live state,
//! and the [`ConflictDetector`] inspects the result before anything is
//! committed.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod detector;
pub mod policy;
pub mod twin;

pub use detector::{Conflict, ConflictDetector, Conflicts};
pub use policy::{
    GreenPolicy, SafetyPolicy, DEFAULT_ARRIVAL_SEPARATION_SECS, DEFAULT_DANGER_RADIUS,
};
pub use twin::{ApplyError, GateTable, LiveView, SignalTable, TrackTable, TwinState};
