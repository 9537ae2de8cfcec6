//! Strongly-typed identifiers, the record sequence counter and station time.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            /// The identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(v: &str) -> Self {
                Self(v.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(v: String) -> Self {
                Self(v)
            }
        }
    };
}

string_id!(
    /// Identifies a platform track (e.g. `"P1"`).
    TrackId
);

string_id!(
    /// Identifies a signal (e.g. `"S1"`). Every signal protects exactly one track.
    SignalId
);

string_id!(
    /// Identifies a level-crossing gate (e.g. `"G1"`).
    GateId
);

string_id!(
    /// Identifies a train supplied by the train source (e.g. `"T001"`).
    TrainId
);

/// Logical timestamp of a verification record.
///
/// Assigned by the verifier from a monotonic counter starting at 1. Record
/// order in the log is exactly `Seq` order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Seq(pub u64);

impl fmt::Display for Seq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u64> for Seq {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

/// Logical station clock, in seconds.
///
/// Advanced only by the caller. Used for clearance timing and arrival
/// countdowns; it carries no wall-clock meaning.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct StationTime(pub u64);

impl StationTime {
    /// Seconds elapsed since `earlier`, saturating at zero.
    pub fn since(self, earlier: StationTime) -> u64 {
        self.0.saturating_sub(earlier.0)
    }

    /// This time advanced by `secs` seconds.
    pub fn plus(self, secs: u64) -> StationTime {
        StationTime(self.0.saturating_add(secs))
    }
}

impl fmt::Display for StationTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t={}s", self.0)
    }
}

impl From<u64> for StationTime {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

/// A reference to one station entity, used as the subject of records.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum EntityRef {
    /// A platform track.
    Track(TrackId),
    /// A signal.
    Signal(SignalId),
    /// A level-crossing gate.
    Gate(GateId),
    /// A train.
    Train(TrainId),
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Track(id) => write!(f, "track {id}"),
            Self::Signal(id) => write!(f, "signal {id}"),
            Self::Gate(id) => write!(f, "gate {id}"),
            Self::Train(id) => write!(f, "train {id}"),
        }
    }
}

impl From<TrackId> for EntityRef {
    fn from(v: TrackId) -> Self {
        Self::Track(v)
    }
}

impl From<SignalId> for EntityRef {
    fn from(v: SignalId) -> Self {
        Self::Signal(v)
    }
}

impl From<GateId> for EntityRef {
    fn from(v: GateId) -> Self {
        Self::Gate(v)
    }
}

impl From<TrainId> for EntityRef {
    fn from(v: TrainId) -> Self {
        Self::Train(v)
    }
}
