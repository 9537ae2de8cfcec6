//! Level-crossing gates.
//!
//! Legal moves are OPEN ↔ CLOSING ↔ CLOSED plus CLOSED → OPEN.
//! Re-asserting the current position is a no-op. OPEN → CLOSED is
//! refused: barriers always pass through CLOSING on the way down.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::TransitionError;
use crate::id::GateId;

/// Barrier position of a gate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GatePosition {
    /// Road traffic may cross.
    Open,
    /// Barriers are coming down.
    Closing,
    /// Road closed. The fail-safe position.
    #[default]
    Closed,
}

impl GatePosition {
    /// Whether the gate may move from `self` to `to` directly.
    pub fn can_move_to(self, to: GatePosition) -> bool {
        use GatePosition::*;
        matches!(
            (self, to),
            (Open, Open)
                | (Closing, Closing)
                | (Closed, Closed)
                | (Open, Closing)
                | (Closing, Closed)
                | (Closing, Open)
                | (Closed, Closing)
                | (Closed, Open)
        )
    }
}

impl fmt::Display for GatePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Open => "OPEN",
            Self::Closing => "CLOSING",
            Self::Closed => "CLOSED",
        };
        f.write_str(s)
    }
}

/// A level-crossing gate at a fixed point on the line.
///
/// The distance to the nearest train is derived from train positions at
/// verification time and never stored on the gate.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Gate {
    id: GateId,
    location: f64,
    position: GatePosition,
}

impl Gate {
    /// A CLOSED gate at `location` (distance units along the line).
    pub fn new(id: impl Into<GateId>, location: f64) -> Self {
        Self {
            id: id.into(),
            location,
            position: GatePosition::Closed,
        }
    }

    /// The gate identifier.
    pub fn id(&self) -> &GateId {
        &self.id
    }

    /// Where the crossing sits on the line.
    pub fn location(&self) -> f64 {
        self.location
    }

    /// Current barrier position.
    pub fn position(&self) -> GatePosition {
        self.position
    }

    /// Distance from this crossing to a point on the line.
    pub fn distance_to(&self, point: f64) -> f64 {
        (point - self.location).abs()
    }

    /// Move the barriers along a legal edge.
    pub fn move_to(&mut self, to: GatePosition) -> Result<(), TransitionError> {
        if !self.position.can_move_to(to) {
            return Err(TransitionError::Gate {
                gate: self.id.clone(),
                from: self.position,
                to,
            });
        }
        self.position = to;
        Ok(())
    }

    /// Set the barriers to `to` regardless of the current position.
    ///
    /// Only the override path uses this.
    pub fn force(&mut self, to: GatePosition) {
        self.position = to;
    }
}
