//! Platform tracks and their occupancy state machine.
//!
//! ```text
//! FREE ──reserve──▶ RESERVED ──occupy──▶ OCCUPIED ──start clearing──▶ CLEARING
//!  ▲                   │                                                  │
//!  └────release────────┘◀─────────────────────release─────────────────────┘
//! ```
//!
//! The assigned train lives inside [`Occupancy`], so a track holds a train
//! exactly when it is not FREE.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::TransitionError;
use crate::id::{StationTime, TrackId, TrainId};

/// The fieldless state of a track, used for display and policy checks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrackState {
    /// No train assigned.
    Free,
    /// Allocated to an approaching train.
    Reserved,
    /// The assigned train is on the platform.
    Occupied,
    /// The train has departed; the track is being cleared.
    Clearing,
}

impl fmt::Display for TrackState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Free => "FREE",
            Self::Reserved => "RESERVED",
            Self::Occupied => "OCCUPIED",
            Self::Clearing => "CLEARING",
        };
        f.write_str(s)
    }
}

/// Track occupancy with the assigned train carried in the variant.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "train", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Occupancy {
    /// No train assigned.
    Free,
    /// Allocated to the given train.
    Reserved(TrainId),
    /// The given train is on the platform.
    Occupied(TrainId),
    /// The given train has departed and the track is clearing.
    Clearing(TrainId),
}

impl Occupancy {
    /// The fieldless state.
    pub fn state(&self) -> TrackState {
        match self {
            Self::Free => TrackState::Free,
            Self::Reserved(_) => TrackState::Reserved,
            Self::Occupied(_) => TrackState::Occupied,
            Self::Clearing(_) => TrackState::Clearing,
        }
    }

    /// The assigned train, if any.
    pub fn train(&self) -> Option<&TrainId> {
        match self {
            Self::Free => None,
            Self::Reserved(t) | Self::Occupied(t) | Self::Clearing(t) => Some(t),
        }
    }
}

/// A platform track.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Track {
    id: TrackId,
    occupancy: Occupancy,
    eta_secs: Option<u64>,
    min_clearance_secs: u64,
    clear_since: Option<StationTime>,
}

impl Track {
    /// A FREE track with the given minimum clearance duration.
    pub fn new(id: impl Into<TrackId>, min_clearance_secs: u64) -> Self {
        Self {
            id: id.into(),
            occupancy: Occupancy::Free,
            eta_secs: None,
            min_clearance_secs,
            clear_since: None,
        }
    }

    /// The track identifier.
    pub fn id(&self) -> &TrackId {
        &self.id
    }

    /// Current occupancy.
    pub fn occupancy(&self) -> &Occupancy {
        &self.occupancy
    }

    /// Current fieldless state.
    pub fn state(&self) -> TrackState {
        self.occupancy.state()
    }

    /// The train holding this track, if any.
    pub fn assigned_train(&self) -> Option<&TrainId> {
        self.occupancy.train()
    }

    /// Seconds until the reserved train is expected, if known.
    pub fn eta_secs(&self) -> Option<u64> {
        self.eta_secs
    }

    /// Minimum time after clearing before the track may be occupied again.
    pub fn min_clearance_secs(&self) -> u64 {
        self.min_clearance_secs
    }

    /// When the last occupant finished clearing.
    pub fn clear_since(&self) -> Option<StationTime> {
        self.clear_since
    }

    /// Seconds of clearance still owed at `now`. Zero when the track may be
    /// occupied.
    pub fn clearance_remaining(&self, now: StationTime) -> u64 {
        match self.clear_since {
            Some(since) => self.min_clearance_secs.saturating_sub(now.since(since)),
            None => 0,
        }
    }

    /// FREE → RESERVED for `train`.
    pub fn reserve(
        &mut self,
        train: TrainId,
        eta_secs: Option<u64>,
    ) -> Result<(), TransitionError> {
        match self.occupancy {
            Occupancy::Free => {
                self.occupancy = Occupancy::Reserved(train);
                self.eta_secs = eta_secs;
                Ok(())
            }
            _ => Err(self.illegal("reserve")),
        }
    }

    /// RESERVED → OCCUPIED by the reserved train.
    pub fn occupy(&mut self) -> Result<(), TransitionError> {
        match &self.occupancy {
            Occupancy::Reserved(t) => {
                self.occupancy = Occupancy::Occupied(t.clone());
                self.eta_secs = None;
                Ok(())
            }
            _ => Err(self.illegal("occupy")),
        }
    }

    /// OCCUPIED → CLEARING once the train departs.
    pub fn start_clearing(&mut self) -> Result<(), TransitionError> {
        match &self.occupancy {
            Occupancy::Occupied(t) => {
                self.occupancy = Occupancy::Clearing(t.clone());
                Ok(())
            }
            _ => Err(self.illegal("start clearing")),
        }
    }

    /// RESERVED → FREE (cancellation) or CLEARING → FREE (completion).
    ///
    /// Completing a clearance stamps `clear_since` with `now`; cancelling a
    /// reservation leaves it untouched since no train occupied the track.
    pub fn release(&mut self, now: StationTime) -> Result<(), TransitionError> {
        match self.occupancy {
            Occupancy::Reserved(_) => {
                self.occupancy = Occupancy::Free;
                self.eta_secs = None;
                Ok(())
            }
            Occupancy::Clearing(_) => {
                self.occupancy = Occupancy::Free;
                self.eta_secs = None;
                self.clear_since = Some(now);
                Ok(())
            }
            _ => Err(self.illegal("release")),
        }
    }

    /// Count the arrival estimate down by `secs`.
    pub fn count_down(&mut self, secs: u64) {
        if let Some(eta) = self.eta_secs.as_mut() {
            *eta = eta.saturating_sub(secs);
        }
    }

    fn illegal(&self, edge: &'static str) -> TransitionError {
        TransitionError::Track {
            track: self.id.clone(),
            from: self.state(),
            edge,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(id: &str) -> TrainId {
        TrainId::from(id)
    }

    #[test]
    fn full_lifecycle_returns_to_free() {
        let mut track = Track::new("P1", 120);
        track.reserve(t("T001"), Some(180)).unwrap();
        assert_eq!(track.state(), TrackState::Reserved);
        assert_eq!(track.assigned_train(), Some(&t("T001")));
        assert_eq!(track.eta_secs(), Some(180));

        track.occupy().unwrap();
        assert_eq!(track.state(), TrackState::Occupied);
        assert_eq!(track.eta_secs(), None);

        track.start_clearing().unwrap();
        assert_eq!(track.assigned_train(), Some(&t("T001")));

        track.release(StationTime(500)).unwrap();
        assert_eq!(track.state(), TrackState::Free);
        assert_eq!(track.assigned_train(), None);
        assert_eq!(track.clear_since(), Some(StationTime(500)));
    }

    #[test]
    fn cancellation_does_not_stamp_clearance() {
        let mut track = Track::new("P1", 120);
        track.reserve(t("T001"), None).unwrap();
        track.release(StationTime(10)).unwrap();
        assert_eq!(track.state(), TrackState::Free);
        assert_eq!(track.clear_since(), None);
    }

    #[test]
    fn illegal_edges_leave_track_unchanged() {
        let mut track = Track::new("P1", 120);
        assert!(track.occupy().is_err());
        assert!(track.start_clearing().is_err());
        assert!(track.release(StationTime(0)).is_err());

        track.reserve(t("T001"), None).unwrap();
        let before = track.clone();
        let err = track.reserve(t("T002"), None).unwrap_err();
        assert!(matches!(
            err,
            TransitionError::Track {
                from: TrackState::Reserved,
                edge: "reserve",
                ..
            }
        ));
        assert!(track.start_clearing().is_err());
        assert_eq!(track, before);

        track.occupy().unwrap();
        assert!(track.release(StationTime(0)).is_err());
    }

    #[test]
    fn clearance_remaining_counts_down() {
        let mut track = Track::new("P1", 120);
        assert_eq!(track.clearance_remaining(StationTime(0)), 0);
        track.reserve(t("T001"), None).unwrap();
        track.occupy().unwrap();
        track.start_clearing().unwrap();
        track.release(StationTime(100)).unwrap();
        assert_eq!(track.clearance_remaining(StationTime(100)), 120);
        assert_eq!(track.clearance_remaining(StationTime(190)), 30);
        assert_eq!(track.clearance_remaining(StationTime(220)), 0);
        assert_eq!(track.clearance_remaining(StationTime(999)), 0);
    }

    #[test]
    fn count_down_saturates() {
        let mut track = Track::new("P1", 120);
        track.reserve(t("T001"), Some(30)).unwrap();
        track.count_down(20);
        assert_eq!(track.eta_secs(), Some(10));
        track.count_down(20);
        assert_eq!(track.eta_secs(), Some(0));
    }

    #[test]
    fn occupancy_train_matches_state() {
        assert_eq!(Occupancy::Free.train(), None);
        assert_eq!(Occupancy::Clearing(t("T9")).train(), Some(&t("T9")));
        assert_eq!(Occupancy::Occupied(t("T9")).state(), TrackState::Occupied);
    }
}
