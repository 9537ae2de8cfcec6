//! Commands, command modes and committed effects.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::gate::{Gate, GatePosition};
use crate::id::{EntityRef, GateId, SignalId, TrackId, TrainId};
use crate::signal::{Aspect, Signal};
use crate::track::Track;

/// A proposed change to one station resource.
///
/// Every command touches exactly one track, signal or gate. Cross-resource
/// requirements (a GREEN signal needing a RESERVED track) are conflict
/// detector preconditions, never side effects of a command.
///
/// # Examples
///
/// ```
/// use interlock_core::{Command, EntityRef, TrackId};
///
/// let cmd = Command::ReserveTrack {
///     track: TrackId::from("P1"),
///     train: "T001".into(),
///     eta_secs: Some(180),
/// };
/// assert_eq!(cmd.subject(), EntityRef::Track(TrackId::from("P1")));
/// assert_eq!(cmd.to_string(), "reserve track P1 for T001");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Command {
    /// Allocate a FREE track to an approaching train.
    ReserveTrack {
        /// The track to allocate.
        track: TrackId,
        /// The train it is allocated to.
        train: TrainId,
        /// Expected arrival countdown in seconds, if known.
        eta_secs: Option<u64>,
    },
    /// The reserved train has arrived on the platform.
    OccupyTrack {
        /// The track being occupied.
        track: TrackId,
    },
    /// The occupying train has departed.
    StartClearing {
        /// The track to clear.
        track: TrackId,
    },
    /// Return a track to FREE, cancelling a reservation or completing a
    /// clearance.
    ReleaseTrack {
        /// The track to release.
        track: TrackId,
    },
    /// Change a signal aspect.
    SetSignal {
        /// The signal.
        signal: SignalId,
        /// The requested aspect.
        aspect: Aspect,
    },
    /// Move a level-crossing gate.
    SetGate {
        /// The gate.
        gate: GateId,
        /// The requested barrier position.
        position: GatePosition,
    },
}

impl Command {
    /// The resource this command would change.
    pub fn subject(&self) -> EntityRef {
        match self {
            Self::ReserveTrack { track, .. }
            | Self::OccupyTrack { track }
            | Self::StartClearing { track }
            | Self::ReleaseTrack { track } => EntityRef::Track(track.clone()),
            Self::SetSignal { signal, .. } => EntityRef::Signal(signal.clone()),
            Self::SetGate { gate, .. } => EntityRef::Gate(gate.clone()),
        }
    }

    /// The track this command targets, for track commands.
    pub fn track(&self) -> Option<&TrackId> {
        match self {
            Self::ReserveTrack { track, .. }
            | Self::OccupyTrack { track }
            | Self::StartClearing { track }
            | Self::ReleaseTrack { track } => Some(track),
            Self::SetSignal { .. } | Self::SetGate { .. } => None,
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReserveTrack { track, train, .. } => {
                write!(f, "reserve track {track} for {train}")
            }
            Self::OccupyTrack { track } => write!(f, "occupy track {track}"),
            Self::StartClearing { track } => write!(f, "start clearing track {track}"),
            Self::ReleaseTrack { track } => write!(f, "release track {track}"),
            Self::SetSignal { signal, aspect } => write!(f, "set signal {signal} to {aspect}"),
            Self::SetGate { gate, position } => write!(f, "set gate {gate} to {position}"),
        }
    }
}

/// How a command is to be authorized.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "reason", rename_all = "snake_case")]
pub enum CommandMode {
    /// Simulate against the twin and commit only if safe.
    #[default]
    Verified,
    /// Commit unconditionally under emergency authority. The reason is
    /// stored in the verification record.
    Override(String),
}

impl CommandMode {
    /// An override carrying `reason`.
    pub fn override_with(reason: impl Into<String>) -> Self {
        Self::Override(reason.into())
    }
}

/// The post-command record of the single resource a command changed.
///
/// Produced by the verifier from its twin simulation and adopted verbatim by
/// the owning controller on commit, so live state always equals what was
/// verified.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "resource", rename_all = "snake_case")]
pub enum Effect {
    /// New track record.
    Track(Track),
    /// New signal record.
    Signal(Signal),
    /// New gate record.
    Gate(Gate),
}

impl Effect {
    /// The resource this effect replaces.
    pub fn subject(&self) -> EntityRef {
        match self {
            Self::Track(t) => EntityRef::Track(t.id().clone()),
            Self::Signal(s) => EntityRef::Signal(s.id().clone()),
            Self::Gate(g) => EntityRef::Gate(g.id().clone()),
        }
    }
}
