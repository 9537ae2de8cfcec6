//! Signals and their aspects.
//!
//! Any aspect may follow any other structurally. Whether GREEN is allowed
//! depends on the protected track and is decided by the conflict detector.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::id::{SignalId, TrackId};

/// A signal aspect.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Aspect {
    /// Stop. The fail-safe aspect.
    #[default]
    Red,
    /// Caution.
    Yellow,
    /// Proceed.
    Green,
}

impl Aspect {
    /// Whether this aspect lets a train move past the signal.
    pub fn is_proceed(self) -> bool {
        !matches!(self, Self::Red)
    }
}

impl fmt::Display for Aspect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Red => "RED",
            Self::Yellow => "YELLOW",
            Self::Green => "GREEN",
        };
        f.write_str(s)
    }
}

/// A signal protecting one track.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signal {
    id: SignalId,
    track: TrackId,
    aspect: Aspect,
}

impl Signal {
    /// A signal showing RED.
    pub fn new(id: impl Into<SignalId>, track: impl Into<TrackId>) -> Self {
        Self {
            id: id.into(),
            track: track.into(),
            aspect: Aspect::Red,
        }
    }

    /// The signal identifier.
    pub fn id(&self) -> &SignalId {
        &self.id
    }

    /// The protected track.
    pub fn track(&self) -> &TrackId {
        &self.track
    }

    /// Current aspect.
    pub fn aspect(&self) -> Aspect {
        self.aspect
    }

    /// Show `aspect`. Always structurally legal.
    pub fn set_aspect(&mut self, aspect: Aspect) {
        self.aspect = aspect;
    }
}
