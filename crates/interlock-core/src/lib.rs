//! Core types for station interlocking.
//!
//! This is the leaf crate with zero internal dependencies. It defines the
//! resource state machines (tracks, signals, level-crossing gates), the
//! train reference data consumed from a simulator, and the command,
//! outcome and verification-record types shared by the twin and engine
//! crates.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod command;
pub mod error;
pub mod gate;
pub mod id;
pub mod record;
pub mod signal;
pub mod track;
pub mod train;

pub use command::{Command, CommandMode, Effect};
pub use error::{SnapshotError, TransitionError, ViolationKind};
pub use gate::{Gate, GatePosition};
pub use id::{EntityRef, GateId, Seq, SignalId, StationTime, TrackId, TrainId};
pub use record::{DecidedBy, Outcome, OutcomeKind, VerificationRecord};
pub use signal::{Aspect, Signal};
pub use track::{Occupancy, Track, TrackState};
pub use train::{Train, TrainCategory, TrainSource};
