//! End-to-end station scenarios through the public entry points.

use interlock_core::{
    Aspect, CommandMode, DecidedBy, GateId, GatePosition, Outcome, SignalId, TrackId, TrackState,
    Train, TrainId, ViolationKind,
};
use interlock_engine::LogFilter;
use interlock_test_utils::fixtures::{log_len, occupied, reserved, track_state, visited};
use interlock_test_utils::TestStation;

fn aspect(ts: &TestStation, id: &str) -> Aspect {
    ts.station
        .signals()
        .signal(&SignalId::from(id))
        .unwrap()
        .aspect()
}

fn gate_position(ts: &TestStation, id: &str) -> GatePosition {
    ts.station.gates().gate(&GateId::from(id)).unwrap().position()
}

#[test]
fn free_track_is_allocated() {
    let mut ts = TestStation::new();
    let outcome = ts.station.request_track_allocation("P1", "T001").unwrap();
    assert_eq!(outcome, Outcome::Safe);
    let p1 = ts.station.tracks().track(&TrackId::from("P1")).unwrap();
    assert_eq!(p1.state(), TrackState::Reserved);
    assert_eq!(p1.assigned_train(), Some(&TrainId::from("T001")));
}

#[test]
fn occupied_track_cannot_be_reallocated() {
    let mut ts = TestStation::new();
    occupied(&mut ts.station, "P1", "T002");
    let outcome = ts.station.request_track_allocation("P1", "T003").unwrap();
    assert_eq!(outcome.violation(), Some(ViolationKind::TrackExclusivity));
    assert!(outcome.reason().contains("T002"), "{outcome}");

    let p1 = ts.station.tracks().track(&TrackId::from("P1")).unwrap();
    assert_eq!(p1.state(), TrackState::Occupied);
    assert_eq!(p1.assigned_train(), Some(&TrainId::from("T002")));
}

#[test]
fn green_on_free_track_is_refused() {
    let mut ts = TestStation::new();
    let before = aspect(&ts, "S1");
    let outcome = ts
        .station
        .set_signal("S1", Aspect::Green, CommandMode::Verified)
        .unwrap();
    assert_eq!(outcome.violation(), Some(ViolationKind::SignalPrecondition));
    assert_eq!(aspect(&ts, "S1"), before);
}

#[test]
fn green_on_reserved_track_is_granted() {
    let mut ts = TestStation::new();
    reserved(&mut ts.station, "P1", "T001");
    let outcome = ts
        .station
        .set_signal("S1", Aspect::Green, CommandMode::Verified)
        .unwrap();
    assert!(outcome.is_safe());
    assert_eq!(aspect(&ts, "S1"), Aspect::Green);
}

#[test]
fn gate_refuses_to_open_with_train_at_300() {
    let mut ts = TestStation::new();
    ts.trains.set_position("T001", 300.0);
    let outcome = ts
        .station
        .set_gate("G1", GatePosition::Open, CommandMode::Verified)
        .unwrap();
    assert_eq!(outcome.violation(), Some(ViolationKind::GateDangerZone));
    assert_eq!(gate_position(&ts, "G1"), GatePosition::Closed);
}

#[test]
fn gate_opens_with_train_at_600() {
    let mut ts = TestStation::new();
    ts.trains.set_position("T001", 600.0);
    let outcome = ts
        .station
        .set_gate("G1", GatePosition::Open, CommandMode::Verified)
        .unwrap();
    assert!(outcome.is_safe());
    assert_eq!(gate_position(&ts, "G1"), GatePosition::Open);
}

#[test]
fn override_commits_green_on_free_track() {
    let mut ts = TestStation::new();
    let outcome = ts
        .station
        .set_signal(
            "S1",
            Aspect::Green,
            CommandMode::override_with("emergency"),
        )
        .unwrap();
    assert!(outcome.is_committed());
    assert_eq!(aspect(&ts, "S1"), Aspect::Green);

    let log = ts.station.verification_log(&LogFilter::all());
    let last = log.last().unwrap();
    assert_eq!(
        last.outcome,
        Outcome::Overridden {
            reason: "emergency".into()
        }
    );
    assert_eq!(last.decided_by, DecidedBy::Override);
    assert_eq!(last.reason(), "emergency");
}

#[test]
fn override_violation_does_not_block_unrelated_commands() {
    let mut ts = TestStation::new();
    let _ = ts
        .station
        .set_signal("S2", Aspect::Green, CommandMode::override_with("test"))
        .unwrap();
    assert!(ts
        .station
        .request_track_allocation("P1", "T001")
        .unwrap()
        .is_safe());
    assert!(ts
        .station
        .set_signal("S1", Aspect::Green, CommandMode::Verified)
        .unwrap()
        .is_safe());
}

#[test]
fn gate_must_pass_through_closing() {
    let mut ts = TestStation::new();
    let _ = ts
        .station
        .set_gate("G1", GatePosition::Open, CommandMode::Verified)
        .unwrap();
    let direct = ts
        .station
        .set_gate("G1", GatePosition::Closed, CommandMode::Verified)
        .unwrap();
    assert_eq!(direct.violation(), Some(ViolationKind::InvalidTransition));
    assert_eq!(gate_position(&ts, "G1"), GatePosition::Open);

    for step in [GatePosition::Closing, GatePosition::Closed] {
        assert!(ts
            .station
            .set_gate("G1", step, CommandMode::Verified)
            .unwrap()
            .is_safe());
    }
}

#[test]
fn unknown_entities_are_reported_and_logged() {
    let mut ts = TestStation::new();
    let cases = [
        ts.station.request_track_allocation("P9", "T001").unwrap(),
        ts.station.request_track_allocation("P1", "T999").unwrap(),
        ts.station
            .set_signal("S9", Aspect::Red, CommandMode::Verified)
            .unwrap(),
        ts.station
            .set_gate("G9", GatePosition::Open, CommandMode::override_with("x"))
            .unwrap(),
    ];
    for outcome in &cases {
        assert_eq!(outcome.violation(), Some(ViolationKind::UnknownEntity));
    }
    assert_eq!(log_len(&ts.station), 4);
    assert_eq!(track_state(&ts.station, "P1"), TrackState::Free);
}

#[test]
fn arrival_under_green_is_refused_until_red() {
    let mut ts = TestStation::new();
    reserved(&mut ts.station, "P1", "T001");
    let _ = ts
        .station
        .set_signal("S1", Aspect::Green, CommandMode::Verified)
        .unwrap();
    let arrival = ts.station.occupy_track("P1").unwrap();
    assert_eq!(arrival.violation(), Some(ViolationKind::SignalPrecondition));

    let _ = ts
        .station
        .set_signal("S1", Aspect::Red, CommandMode::Verified)
        .unwrap();
    assert!(ts.station.occupy_track("P1").unwrap().is_safe());
}

#[test]
fn audit_stream_matches_log() {
    let mut ts = TestStation::new();
    occupied(&mut ts.station, "P2", "T003");
    let _ = ts
        .station
        .set_signal("S2", Aspect::Green, CommandMode::Verified)
        .unwrap();
    assert_eq!(
        ts.audit.records(),
        ts.station.verification_log(&LogFilter::all())
    );
    assert_eq!(ts.station.stats().rejected, 1);
}

#[test]
fn second_arrival_within_two_minutes_is_refused() {
    let mut ts = TestStation::new();
    let first = ts
        .station
        .request_track_allocation_with_eta("P1", "T001", Some(100))
        .unwrap();
    assert!(first.is_safe());

    let close = ts
        .station
        .request_track_allocation_with_eta("P2", "T002", Some(180))
        .unwrap();
    assert_eq!(close.violation(), Some(ViolationKind::ClearanceTiming));
    assert!(close.reason().contains("T001"), "{close}");
    assert_eq!(track_state(&ts.station, "P2"), TrackState::Free);
    assert!(ts.station.track_for_train("T002").is_none());

    let spaced = ts
        .station
        .request_track_allocation_with_eta("P2", "T002", Some(240))
        .unwrap();
    assert!(spaced.is_safe());
    let p2 = ts.station.track_for_train("T002").unwrap();
    assert_eq!(p2.id(), &TrackId::from("P2"));
    assert_eq!(p2.eta_secs(), Some(240));
    assert_eq!(ts.station.free_track_count(), 1);
}

#[test]
fn revisited_track_waits_out_clearance() {
    let mut ts = TestStation::new();
    visited(&mut ts.station, "P1", "T001");
    assert!(ts.station.track_for_train("T001").is_none());
    assert_eq!(ts.station.free_track_count(), 3);

    reserved(&mut ts.station, "P1", "T002");
    let early = ts.station.occupy_track("P1").unwrap();
    assert_eq!(early.violation(), Some(ViolationKind::ClearanceTiming));
    assert_eq!(track_state(&ts.station, "P1"), TrackState::Reserved);

    ts.station.advance_clock(120);
    assert!(ts.station.occupy_track("P1").unwrap().is_safe());
    assert_eq!(track_state(&ts.station, "P1"), TrackState::Occupied);
}

#[test]
fn train_joining_the_feed_is_seen_by_the_gate_check() {
    let mut ts = TestStation::new();
    assert!(ts
        .station
        .set_gate("G1", GatePosition::Open, CommandMode::Verified)
        .unwrap()
        .is_safe());
    assert!(ts
        .station
        .set_gate("G1", GatePosition::Closing, CommandMode::Verified)
        .unwrap()
        .is_safe());

    ts.trains.push(Train::new("T005", -250.0));
    let outcome = ts
        .station
        .set_gate("G1", GatePosition::Open, CommandMode::Verified)
        .unwrap();
    assert_eq!(outcome.violation(), Some(ViolationKind::GateDangerZone));
    assert!(outcome.reason().contains("T005"), "{outcome}");
    assert_eq!(gate_position(&ts, "G1"), GatePosition::Closing);
}
