//! Property tests for the track and gate state machines.

use interlock_core::{Gate, GatePosition, StationTime, Track, TrackState, TrainId};
use proptest::prelude::*;

#[derive(Clone, Debug)]
enum Edge {
    Reserve(u8),
    Occupy,
    StartClearing,
    Release,
}

fn arb_edge() -> impl Strategy<Value = Edge> {
    prop_oneof![
        (0u8..3).prop_map(Edge::Reserve),
        Just(Edge::Occupy),
        Just(Edge::StartClearing),
        Just(Edge::Release),
    ]
}

fn arb_position() -> impl Strategy<Value = GatePosition> {
    prop_oneof![
        Just(GatePosition::Open),
        Just(GatePosition::Closing),
        Just(GatePosition::Closed)
    ]
}

proptest! {
    #[test]
    fn track_holds_a_train_exactly_when_not_free(
        edges in prop::collection::vec(arb_edge(), 0..64),
    ) {
        let mut track = Track::new("P1", 120);
        for (now, edge) in edges.iter().enumerate() {
            let before = track.clone();
            let result = match edge {
                Edge::Reserve(n) => track.reserve(TrainId::from(format!("T00{n}")), None),
                Edge::Occupy => track.occupy(),
                Edge::StartClearing => track.start_clearing(),
                Edge::Release => track.release(StationTime(now as u64)),
            };
            if result.is_err() {
                prop_assert_eq!(&track, &before);
            }
            prop_assert_eq!(
                track.assigned_train().is_some(),
                track.state() != TrackState::Free
            );
            if track.state() == TrackState::Occupied {
                prop_assert_eq!(track.eta_secs(), None);
            }
        }
    }

    #[test]
    fn gate_never_skips_closing(moves in prop::collection::vec(arb_position(), 0..64)) {
        let mut gate = Gate::new("G1", 0.0);
        for to in moves {
            let from = gate.position();
            match gate.move_to(to) {
                Ok(()) => {
                    prop_assert_eq!(gate.position(), to);
                    prop_assert!(!(from == GatePosition::Open && to == GatePosition::Closed));
                }
                Err(_) => prop_assert_eq!(gate.position(), from),
            }
        }
    }
}
