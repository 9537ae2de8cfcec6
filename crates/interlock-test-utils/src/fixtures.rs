//! Scenario helpers that drive a station into a known state.
//!
//! Every helper goes through verified commands and panics if any step is
//! refused, so a fixture can never leave the station in a state the
//! verifier would not reach on its own.

use interlock_core::{Outcome, TrackId, TrackState};
use interlock_engine::{Station, StationError};

fn expect_safe(step: &str, result: Result<Outcome, StationError>) {
    match result {
        Ok(Outcome::Safe) => {}
        other => panic!("fixture step `{step}` failed: {other:?}"),
    }
}

/// `track` RESERVED for `train`.
pub fn reserved(station: &mut Station, track: &str, train: &str) {
    expect_safe("reserve", station.request_track_allocation(track, train));
}

/// `track` OCCUPIED by `train`.
pub fn occupied(station: &mut Station, track: &str, train: &str) {
    reserved(station, track, train);
    expect_safe("occupy", station.occupy_track(track));
}

/// `track` CLEARING after `train` departed.
pub fn clearing(station: &mut Station, track: &str, train: &str) {
    occupied(station, track, train);
    expect_safe("start clearing", station.start_clearing(track));
}

/// `track` FREE again after a full visit by `train`, with its clearance
/// window starting now.
pub fn visited(station: &mut Station, track: &str, train: &str) {
    clearing(station, track, train);
    expect_safe("release", station.release_track(track));
}

/// Number of records in the verification log.
pub fn log_len(station: &Station) -> usize {
    station.verifier().log().len()
}

/// Current state of `track`. Panics if the track is unknown.
pub fn track_state(station: &Station, track: &str) -> TrackState {
    station
        .tracks()
        .track(&TrackId::from(track))
        .unwrap_or_else(|| panic!("no track {track}"))
        .state()
}
