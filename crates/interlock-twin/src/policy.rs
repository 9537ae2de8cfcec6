//! Safety policy knobs consulted by the conflict detector.

use serde::{Deserialize, Serialize};

use interlock_core::{Aspect, TrackState};

/// Minimum permitted distance between a train and an OPEN gate.
pub const DEFAULT_DANGER_RADIUS: f64 = 500.0;

/// Minimum gap between the expected arrivals of two reserved trains.
pub const DEFAULT_ARRIVAL_SEPARATION_SECS: u64 = 120;

/// Which track states permit a proceed aspect.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GreenPolicy {
    /// GREEN only while the track is RESERVED. A signal protecting an
    /// OCCUPIED track must show RED.
    #[default]
    ReservedOnly,
    /// GREEN while RESERVED or OCCUPIED, so a stopped train can be given
    /// an authorized departure.
    ReservedOrOccupied,
}

impl GreenPolicy {
    /// Whether a signal may show `aspect` while its track is in `state`.
    pub fn permits(self, aspect: Aspect, state: TrackState) -> bool {
        let occupied_ok = matches!(self, Self::ReservedOrOccupied);
        match (aspect, state) {
            (Aspect::Red, _) => true,
            (Aspect::Green, TrackState::Reserved) => true,
            (Aspect::Green, TrackState::Occupied) => occupied_ok,
            (Aspect::Green, _) => false,
            (Aspect::Yellow, TrackState::Occupied) => occupied_ok,
            (Aspect::Yellow, _) => true,
        }
    }
}

/// Parameters of the conflict rules.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SafetyPolicy {
    /// Gates may not open with a train closer than this. Default: 500.
    pub danger_radius: f64,
    /// Track states that permit proceed aspects. Default: RESERVED only.
    pub green_policy: GreenPolicy,
    /// Refuse GREEN while any gate is OPEN, and OPEN while any signal is
    /// GREEN. Default: off.
    pub signal_gate_interlock: bool,
    /// A reservation with an ETA is refused when another RESERVED track
    /// expects its train less than this many seconds apart. Default: 120.
    pub min_arrival_separation_secs: u64,
}

impl Default for SafetyPolicy {
    fn default() -> Self {
        Self {
            danger_radius: DEFAULT_DANGER_RADIUS,
            green_policy: GreenPolicy::default(),
            signal_gate_interlock: false,
            min_arrival_separation_secs: DEFAULT_ARRIVAL_SEPARATION_SECS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn red_is_always_permitted() {
        for state in [
            TrackState::Free,
            TrackState::Reserved,
            TrackState::Occupied,
            TrackState::Clearing,
        ] {
            assert!(GreenPolicy::ReservedOnly.permits(Aspect::Red, state));
            assert!(GreenPolicy::ReservedOrOccupied.permits(Aspect::Red, state));
        }
    }

    #[test]
    fn green_requires_reservation() {
        let p = GreenPolicy::ReservedOnly;
        assert!(p.permits(Aspect::Green, TrackState::Reserved));
        assert!(!p.permits(Aspect::Green, TrackState::Free));
        assert!(!p.permits(Aspect::Green, TrackState::Occupied));
        assert!(!p.permits(Aspect::Green, TrackState::Clearing));
    }

    #[test]
    fn occupied_policy_allows_departure_aspects() {
        let p = GreenPolicy::ReservedOrOccupied;
        assert!(p.permits(Aspect::Green, TrackState::Occupied));
        assert!(p.permits(Aspect::Yellow, TrackState::Occupied));
        assert!(!p.permits(Aspect::Green, TrackState::Clearing));
        assert!(!GreenPolicy::ReservedOnly.permits(Aspect::Yellow, TrackState::Occupied));
    }

    #[test]
    fn default_policy_values() {
        let p = SafetyPolicy::default();
        assert_eq!(p.danger_radius, 500.0);
        assert_eq!(p.green_policy, GreenPolicy::ReservedOnly);
        assert!(!p.signal_gate_interlock);
        assert_eq!(p.min_arrival_separation_secs, 120);
    }
}
