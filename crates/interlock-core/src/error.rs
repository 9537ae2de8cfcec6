//! Violation kinds and error types.
//!
//! Rejections are not errors: a command refused by the verifier produces an
//! [`Outcome::Unsafe`](crate::Outcome::Unsafe) tagged with a
//! [`ViolationKind`]. The error types here cover structural transition
//! failures (folded into `InvalidTransition` outcomes by the verifier) and
//! the one fatal condition, an inconsistent live state found while taking a
//! snapshot.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::gate::GatePosition;
use crate::id::{GateId, SignalId, TrackId, TrainId};
use crate::track::TrackState;

/// Why a command was judged unsafe.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    /// The command is not a legal edge of the resource's state machine.
    InvalidTransition,
    /// A track would be claimed by two trains, or a train would hold two tracks.
    TrackExclusivity,
    /// A signal aspect is not permitted by the state of its track.
    SignalPrecondition,
    /// A gate would open with a train inside the danger radius.
    GateDangerZone,
    /// A track would be occupied before its clearance duration has elapsed.
    ClearanceTiming,
    /// The command names a track, signal, gate or train that does not exist.
    UnknownEntity,
}

impl ViolationKind {
    /// Every kind, in declaration order.
    pub const ALL: [ViolationKind; 6] = [
        Self::InvalidTransition,
        Self::TrackExclusivity,
        Self::SignalPrecondition,
        Self::GateDangerZone,
        Self::ClearanceTiming,
        Self::UnknownEntity,
    ];
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::InvalidTransition => "invalid transition",
            Self::TrackExclusivity => "track exclusivity violation",
            Self::SignalPrecondition => "signal precondition violation",
            Self::GateDangerZone => "gate danger-zone violation",
            Self::ClearanceTiming => "clearance timing violation",
            Self::UnknownEntity => "unknown entity",
        };
        f.write_str(s)
    }
}

/// A structurally illegal state-machine edge.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum TransitionError {
    /// The track cannot take the requested edge from its current state.
    #[error("track {track} cannot {edge} while {from}")]
    Track {
        /// The track.
        track: TrackId,
        /// Its state when the edge was attempted.
        from: TrackState,
        /// The attempted edge (`reserve`, `occupy`, `start clearing`, `release`).
        edge: &'static str,
    },
    /// The gate cannot move directly between these positions.
    #[error("gate {gate} cannot move from {from} to {to}")]
    Gate {
        /// The gate.
        gate: GateId,
        /// Its current position.
        from: GatePosition,
        /// The requested position.
        to: GatePosition,
    },
}

/// The live station state is internally inconsistent.
///
/// Raised while building a twin snapshot. This indicates a bug or a corrupt
/// train feed; the operation aborts and nothing is committed or recorded.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SnapshotError {
    /// A signal protects a track that is not in the track table.
    #[error("signal {signal} protects unknown track {track}")]
    SignalTrackMissing {
        /// The signal.
        signal: SignalId,
        /// The missing track.
        track: TrackId,
    },
    /// The train source reported the same train twice.
    #[error("train {train} reported more than once by the train source")]
    DuplicateTrain {
        /// The duplicated train.
        train: TrainId,
    },
    /// The train source assigned a train to a track that does not exist.
    #[error("train {train} is assigned to unknown track {track}")]
    TrainTrackMissing {
        /// The train.
        train: TrainId,
        /// The missing track.
        track: TrackId,
    },
    /// A train reported a position or speed that is not a finite number.
    #[error("train {train} has a non-finite position or speed")]
    NonFiniteTrain {
        /// The train.
        train: TrainId,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transition_error_messages_name_the_resource() {
        let err = TransitionError::Track {
            track: TrackId::from("P1"),
            from: TrackState::Occupied,
            edge: "reserve",
        };
        assert_eq!(err.to_string(), "track P1 cannot reserve while OCCUPIED");

        let err = TransitionError::Gate {
            gate: GateId::from("G1"),
            from: GatePosition::Open,
            to: GatePosition::Closed,
        };
        assert_eq!(err.to_string(), "gate G1 cannot move from OPEN to CLOSED");
    }

    #[test]
    fn violation_kinds_are_distinct() {
        let kinds: std::collections::BTreeSet<_> = ViolationKind::ALL.into_iter().collect();
        assert_eq!(kinds.len(), ViolationKind::ALL.len());
    }
}
