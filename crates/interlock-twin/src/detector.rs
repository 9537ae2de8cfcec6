//! Conflict detection over twin states.
//!
//! Four rules, each with its own [`ViolationKind`]:
//!
//! 1. **Track exclusivity**: a train holds at most one track, and a track
//!    being reserved must be FREE beforehand.
//! 2. **Signal–track consistency**: an aspect must be permitted by the
//!    protected track's state under the [`GreenPolicy`](crate::GreenPolicy).
//! 3. **Gate danger zone**: a gate may not open with a train inside the
//!    danger radius.
//! 4. **Clearance timing**: a track may not be occupied until its clearance
//!    duration has elapsed since the last clearing completed, and a
//!    reservation with an ETA may not expect its train within the arrival
//!    separation of another reserved train.
//!
//! [`ConflictDetector::check`] inspects only the footprint of the command
//! that produced the twin (the commanded resource and whatever its rule
//! reads), so a violation left elsewhere by an override does not block
//! unrelated commands. [`ConflictDetector::scan`] audits everything.

use smallvec::SmallVec;
use std::collections::HashMap;
use std::fmt;

use interlock_core::{
    Aspect, Command, EntityRef, Gate, GatePosition, Occupancy, Outcome, Signal, TrackId,
    TrackState, TrainId, ViolationKind,
};

use crate::policy::SafetyPolicy;
use crate::twin::TwinState;

/// A detected safety-rule violation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Conflict {
    /// Which rule was violated.
    pub kind: ViolationKind,
    /// The resource the violation is reported against.
    pub subject: EntityRef,
    /// Human-readable explanation.
    pub message: String,
}

impl Conflict {
    fn new(kind: ViolationKind, subject: impl Into<EntityRef>, message: String) -> Self {
        Self {
            kind,
            subject: subject.into(),
            message,
        }
    }
}

impl fmt::Display for Conflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl From<Conflict> for Outcome {
    fn from(c: Conflict) -> Self {
        Outcome::Unsafe {
            kind: c.kind,
            message: c.message,
        }
    }
}

/// Every violation found by a full scan. Usually empty.
pub type Conflicts = SmallVec<[Conflict; 4]>;

/// Pure rule evaluation over twin states.
#[derive(Clone, Debug, Default)]
pub struct ConflictDetector {
    policy: SafetyPolicy,
}

impl ConflictDetector {
    /// A detector enforcing `policy`.
    pub fn new(policy: SafetyPolicy) -> Self {
        Self { policy }
    }

    /// The policy in force.
    pub fn policy(&self) -> &SafetyPolicy {
        &self.policy
    }

    /// Claims screening, run against the prior twin before the command is
    /// applied.
    ///
    /// A reservation of a track that already holds a train is an
    /// exclusivity violation, reported ahead of the structural transition
    /// check so the caller learns who holds the track.
    pub fn screen(&self, prior: &TwinState, command: &Command) -> Result<(), Conflict> {
        if let Command::ReserveTrack { track, train, .. } = command {
            self.claim_is_free(prior, track, train)?;
        }
        Ok(())
    }

    /// Inspect `proposed`, the twin produced by applying `command` to
    /// `prior`. Returns the first violation found.
    pub fn check(
        &self,
        prior: &TwinState,
        proposed: &TwinState,
        command: &Command,
    ) -> Result<(), Conflict> {
        // 1. Track exclusivity, for the trains holding the commanded track.
        if let Some(track) = command.track() {
            let holders = [prior.track(track), proposed.track(track)]
                .into_iter()
                .flatten()
                .filter_map(|t| t.assigned_train());
            for train in holders {
                let mut held = proposed.tracks_held_by(train);
                if let (Some(first), Some(second)) = (held.next(), held.next()) {
                    return Err(Conflict::new(
                        ViolationKind::TrackExclusivity,
                        track.clone(),
                        format!(
                            "train {train} holds both track {} and track {}",
                            first.id(),
                            second.id()
                        ),
                    ));
                }
            }
        }
        if let Command::ReserveTrack { track, train, .. } = command {
            self.claim_is_free(prior, track, train)?;
        }

        // 2. Signal–track consistency over the command's footprint.
        match command {
            Command::SetSignal { signal, aspect } => {
                if let Some(s) = proposed.signal(signal) {
                    self.signal_consistent(proposed, s)?;
                }
                if *aspect == Aspect::Green && self.policy.signal_gate_interlock {
                    if let Some(g) = proposed
                        .gates()
                        .find(|g| g.position() == GatePosition::Open)
                    {
                        return Err(Conflict::new(
                            ViolationKind::SignalPrecondition,
                            signal.clone(),
                            format!(
                                "signal {signal} cannot show GREEN while gate {} is OPEN",
                                g.id()
                            ),
                        ));
                    }
                }
            }
            _ => {
                if let Some(track) = command.track() {
                    for s in proposed.signals_protecting(track) {
                        self.signal_consistent(proposed, s)?;
                    }
                }
            }
        }

        // 3. Gate danger zone.
        if let Command::SetGate {
            gate,
            position: GatePosition::Open,
        } = command
        {
            if let Some(g) = proposed.gate(gate) {
                self.gate_clear(proposed, g)?;
            }
        }

        // 4. Clearance and arrival timing.
        if let Command::ReserveTrack {
            track,
            train,
            eta_secs: Some(eta),
        } = command
        {
            self.arrivals_separated(prior, track, train, *eta)?;
        }
        if let Command::OccupyTrack { track } = command {
            if let Some(t) = prior.track(track) {
                let owed = t.clearance_remaining(proposed.now());
                if owed > 0 {
                    return Err(Conflict::new(
                        ViolationKind::ClearanceTiming,
                        track.clone(),
                        format!(
                            "track {track} needs {owed}s more clearance \
                             ({}s minimum since last clearing)",
                            t.min_clearance_secs()
                        ),
                    ));
                }
            }
        }

        Ok(())
    }

    /// Audit a whole twin and return every violation present.
    ///
    /// Clearance timing is a property of transitions, not of states, and is
    /// not part of a scan.
    pub fn scan(&self, twin: &TwinState) -> Conflicts {
        let mut found = duplicate_holders(twin);
        for s in twin.signals() {
            if let Err(c) = self.signal_consistent(twin, s) {
                found.push(c);
            }
        }
        for g in twin.gates().filter(|g| g.position() == GatePosition::Open) {
            if let Err(c) = self.gate_clear(twin, g) {
                found.push(c);
            }
        }
        found
    }

    fn claim_is_free(
        &self,
        prior: &TwinState,
        track: &TrackId,
        train: &TrainId,
    ) -> Result<(), Conflict> {
        if let Some(t) = prior.track(track) {
            if let Some(holder) = t.assigned_train() {
                return Err(Conflict::new(
                    ViolationKind::TrackExclusivity,
                    track.clone(),
                    format!("track {track} is {} by {holder}, not FREE", t.state()),
                ));
            }
        }
        if let Some(held) = prior.tracks_held_by(train).next() {
            return Err(Conflict::new(
                ViolationKind::TrackExclusivity,
                track.clone(),
                format!("train {train} already holds track {}", held.id()),
            ));
        }
        Ok(())
    }

    fn arrivals_separated(
        &self,
        prior: &TwinState,
        track: &TrackId,
        train: &TrainId,
        eta: u64,
    ) -> Result<(), Conflict> {
        let gap = self.policy.min_arrival_separation_secs;
        let clash = prior.tracks().find_map(|t| {
            let other = match t.occupancy() {
                Occupancy::Reserved(other) if other != train && t.id() != track => other,
                _ => return None,
            };
            let other_eta = t.eta_secs()?;
            (eta.abs_diff(other_eta) < gap).then_some((t, other, other_eta))
        });
        match clash {
            Some((t, other, other_eta)) => Err(Conflict::new(
                ViolationKind::ClearanceTiming,
                track.clone(),
                format!(
                    "train {train} expected in {eta}s is within {gap}s of train {other} \
                     expected at track {} in {other_eta}s",
                    t.id()
                ),
            )),
            None => Ok(()),
        }
    }

    fn signal_consistent(&self, twin: &TwinState, signal: &Signal) -> Result<(), Conflict> {
        let Some(track) = twin.track(signal.track()) else {
            // Snapshots refuse signals without a track.
            return Ok(());
        };
        let state = track.state();
        if self.policy.green_policy.permits(signal.aspect(), state) {
            return Ok(());
        }
        let message = if state == TrackState::Occupied {
            format!(
                "signal {} must show RED while track {} is OCCUPIED",
                signal.id(),
                track.id()
            )
        } else {
            format!(
                "signal {} cannot show {} while track {} is {state}",
                signal.id(),
                signal.aspect(),
                track.id()
            )
        };
        Err(Conflict::new(
            ViolationKind::SignalPrecondition,
            signal.id().clone(),
            message,
        ))
    }

    fn gate_clear(&self, twin: &TwinState, gate: &Gate) -> Result<(), Conflict> {
        let radius = self.policy.danger_radius;
        if let Some(train) = twin
            .trains()
            .find(|t| gate.distance_to(t.position) < radius)
        {
            return Err(Conflict::new(
                ViolationKind::GateDangerZone,
                gate.id().clone(),
                format!(
                    "train {} is {} units from gate {} (danger radius {radius})",
                    train.id,
                    gate.distance_to(train.position),
                    gate.id()
                ),
            ));
        }
        if self.policy.signal_gate_interlock {
            if let Some(s) = twin.signals().find(|s| s.aspect() == Aspect::Green) {
                return Err(Conflict::new(
                    ViolationKind::GateDangerZone,
                    gate.id().clone(),
                    format!(
                        "gate {} cannot be OPEN while signal {} shows GREEN",
                        gate.id(),
                        s.id()
                    ),
                ));
            }
        }
        Ok(())
    }
}

fn duplicate_holders(twin: &TwinState) -> Conflicts {
    let mut seen: HashMap<&TrainId, &TrackId> = HashMap::new();
    let mut found = Conflicts::new();
    for t in twin.tracks() {
        if let Some(train) = t.assigned_train() {
            if let Some(first) = seen.insert(train, t.id()) {
                found.push(Conflict::new(
                    ViolationKind::TrackExclusivity,
                    t.id().clone(),
                    format!("train {train} holds both track {first} and track {}", t.id()),
                ));
            }
        }
    }
    found
}
