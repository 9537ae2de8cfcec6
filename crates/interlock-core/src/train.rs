//! Train reference data and the [`TrainSource`] seam.
//!
//! Trains are owned by an external simulator or a loaded schedule. The
//! interlocking only reads them when it builds a snapshot.

use serde::{Deserialize, Serialize};

use crate::id::{TrackId, TrainId};

/// Whether a train calls at the station.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrainCategory {
    /// Stops at a platform.
    #[default]
    Stopping,
    /// Runs through without stopping.
    NonStopping,
}

/// A train as reported by the train source.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Train {
    /// Train identifier.
    pub id: TrainId,
    /// Position along the line, in the same distance units as gate locations.
    pub position: f64,
    /// Current speed. Sign and units are the simulator's business.
    pub speed: f64,
    /// Stopping or non-stopping service.
    #[serde(default)]
    pub category: TrainCategory,
    /// The platform the simulator believes the train is heading for.
    #[serde(default)]
    pub assigned_track: Option<TrackId>,
}

impl Train {
    /// A stationary stopping train at `position` with no assigned track.
    pub fn new(id: impl Into<TrainId>, position: f64) -> Self {
        Self {
            id: id.into(),
            position,
            speed: 0.0,
            category: TrainCategory::Stopping,
            assigned_track: None,
        }
    }

    /// Builder-style speed setter.
    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = speed;
        self
    }

    /// Builder-style category setter.
    pub fn with_category(mut self, category: TrainCategory) -> Self {
        self.category = category;
        self
    }

    /// Builder-style assigned-track setter.
    pub fn with_track(mut self, track: impl Into<TrackId>) -> Self {
        self.assigned_track = Some(track.into());
        self
    }
}

/// Supplies the current set of trains on demand.
///
/// Implemented by the train simulator or schedule replay. The returned
/// records are copied into every snapshot; implementations must not expect
/// the interlocking to write back.
pub trait TrainSource {
    /// The trains currently known, in any order.
    fn trains(&self) -> Vec<Train>;
}

impl TrainSource for Vec<Train> {
    fn trains(&self) -> Vec<Train> {
        self.clone()
    }
}

/// A station with no train feed.
impl TrainSource for () {
    fn trains(&self) -> Vec<Train> {
        Vec::new()
    }
}
