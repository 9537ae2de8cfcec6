//! The safety verifier: snapshot, simulate, detect, decide.
//!
//! Every [`verify`](SafetyVerifier::verify) or
//! [`commit_override`](SafetyVerifier::commit_override) call appends exactly
//! one [`VerificationRecord`] to an append-only log and returns a
//! [`Decision`]. The verifier never touches live state; the owning
//! controller commits a committed decision by adopting its
//! [`Effect`].
//!
//! A verified command is decided in this order:
//!
//! 1. Snapshot the live view. An inconsistent view is a fatal
//!    [`SnapshotError`]; nothing is recorded.
//! 2. Resolve every named entity (`UnknownEntity`).
//! 3. Screen claims against the prior twin (`TrackExclusivity`).
//! 4. Apply along the state machine (`InvalidTransition`).
//! 5. Run the conflict rules on the proposed twin.

use tracing::{debug, error, warn};

use interlock_core::{
    Command, DecidedBy, Effect, EntityRef, Outcome, OutcomeKind, Seq, SnapshotError,
    VerificationRecord, ViolationKind,
};
use interlock_twin::{ApplyError, ConflictDetector, LiveView, SafetyPolicy, TwinState};

use crate::metrics::VerificationStats;

/// Result of one verification or override.
#[must_use]
#[derive(Clone, Debug, PartialEq)]
pub struct Decision {
    /// Sequence number of the record this decision appended.
    pub seq: Seq,
    /// What happened.
    pub outcome: Outcome,
    /// The commanded resource's new record. `Some` exactly when the outcome
    /// is committed.
    pub effect: Option<Effect>,
}

/// Selects records from the verification log.
///
/// An empty filter matches everything.
///
/// # Examples
///
/// ```
/// use interlock_core::{OutcomeKind, SignalId};
/// use interlock_engine::LogFilter;
///
/// let rejected_s1 = LogFilter::all()
///     .subject(SignalId::from("S1"))
///     .outcome(OutcomeKind::Unsafe);
/// # let _ = rejected_s1;
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LogFilter {
    subject: Option<EntityRef>,
    outcome: Option<OutcomeKind>,
    decided_by: Option<DecidedBy>,
    since: Option<Seq>,
}

impl LogFilter {
    /// Matches every record.
    pub fn all() -> Self {
        Self::default()
    }

    /// Only records about `subject`.
    pub fn subject(mut self, subject: impl Into<EntityRef>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Only records with this outcome kind.
    pub fn outcome(mut self, kind: OutcomeKind) -> Self {
        self.outcome = Some(kind);
        self
    }

    /// Only records decided by this path.
    pub fn decided_by(mut self, by: DecidedBy) -> Self {
        self.decided_by = Some(by);
        self
    }

    /// Only records with `seq >= since`.
    pub fn since(mut self, since: Seq) -> Self {
        self.since = Some(since);
        self
    }

    /// Whether `record` passes.
    pub fn matches(&self, record: &VerificationRecord) -> bool {
        self.subject.as_ref().is_none_or(|s| *s == record.subject)
            && self.outcome.is_none_or(|k| k == record.outcome.kind())
            && self.decided_by.is_none_or(|d| d == record.decided_by)
            && self.since.is_none_or(|s| record.seq >= s)
    }
}

/// Arbitrates every station command and keeps the verification log.
#[derive(Debug)]
pub struct SafetyVerifier {
    detector: ConflictDetector,
    log: Vec<VerificationRecord>,
}

impl SafetyVerifier {
    /// A verifier enforcing `policy`, with an empty log.
    pub fn new(policy: SafetyPolicy) -> Self {
        Self {
            detector: ConflictDetector::new(policy),
            log: Vec::new(),
        }
    }

    /// The conflict detector in use.
    pub fn detector(&self) -> &ConflictDetector {
        &self.detector
    }

    /// Decide `command` against `live` without recording anything.
    ///
    /// Returns the outcome and, when safe, the commanded resource's new
    /// record. Calling this any number of times with the same inputs gives
    /// the same answer.
    pub fn evaluate(
        &self,
        live: &LiveView<'_>,
        command: &Command,
    ) -> Result<(Outcome, Option<Effect>), SnapshotError> {
        let prior = snapshot(live, command)?;
        Ok(match self.simulate(&prior, command) {
            Ok(next) => (Outcome::Safe, next.effect_of(command)),
            Err(outcome) => (outcome, None),
        })
    }

    /// Verify `command` against `live` and record the decision.
    ///
    /// # Errors
    ///
    /// [`SnapshotError`] if the live view is internally inconsistent. The
    /// operation is aborted and no record is appended.
    pub fn verify(
        &mut self,
        live: &LiveView<'_>,
        command: &Command,
    ) -> Result<Decision, SnapshotError> {
        let (outcome, effect) = self.evaluate(live, command)?;
        match &outcome {
            Outcome::Unsafe { kind, message } => {
                warn!(%command, %kind, %message, "command rejected");
            }
            _ => debug!(%command, "command verified safe"),
        }
        let seq = self.record(live, command, outcome.clone(), DecidedBy::Verifier);
        Ok(Decision {
            seq,
            outcome,
            effect,
        })
    }

    /// Commit `command` without conflict detection and record the override.
    ///
    /// Signals and gates are forced to the requested state. A command that
    /// names an unknown entity, or a track edge the state machine cannot
    /// represent, commits nothing and is recorded as unsafe with
    /// [`DecidedBy::Override`].
    ///
    /// # Errors
    ///
    /// [`SnapshotError`] as for [`verify`](Self::verify).
    pub fn commit_override(
        &mut self,
        live: &LiveView<'_>,
        command: &Command,
        reason: &str,
    ) -> Result<Decision, SnapshotError> {
        let prior = snapshot(live, command)?;
        let reason = if reason.trim().is_empty() {
            warn!(%command, "override without a reason");
            "no reason given".to_owned()
        } else {
            reason.to_owned()
        };

        let (outcome, effect) = match prior.apply_forced(command) {
            Ok(next) => {
                if let Err(bypassed) = self.detector.check(&prior, &next, command) {
                    warn!(%command, %reason, conflict = %bypassed, "override bypassed conflict");
                } else {
                    warn!(%command, %reason, "override committed");
                }
                let effect = next.effect_of(command);
                (Outcome::Overridden { reason }, effect)
            }
            Err(e) => {
                let outcome = rejection(e);
                warn!(%command, %outcome, "override could not commit");
                (outcome, None)
            }
        };
        let seq = self.record(live, command, outcome.clone(), DecidedBy::Override);
        Ok(Decision {
            seq,
            outcome,
            effect,
        })
    }

    /// The whole log, oldest first.
    pub fn log(&self) -> &[VerificationRecord] {
        &self.log
    }

    /// Records passing `filter`, oldest first.
    pub fn records<'a>(
        &'a self,
        filter: &'a LogFilter,
    ) -> impl Iterator<Item = &'a VerificationRecord> + 'a {
        self.log.iter().filter(move |r| filter.matches(r))
    }

    /// Statistics recomputed from the log.
    pub fn stats(&self) -> VerificationStats {
        VerificationStats::from_records(&self.log)
    }

    fn simulate(&self, prior: &TwinState, command: &Command) -> Result<TwinState, Outcome> {
        prior.resolve(command).map_err(rejection)?;
        self.detector.screen(prior, command).map_err(Outcome::from)?;
        let next = prior.apply(command).map_err(rejection)?;
        self.detector
            .check(prior, &next, command)
            .map_err(Outcome::from)?;
        Ok(next)
    }

    fn record(
        &mut self,
        live: &LiveView<'_>,
        command: &Command,
        outcome: Outcome,
        decided_by: DecidedBy,
    ) -> Seq {
        let seq = Seq(self.log.len() as u64 + 1);
        self.log.push(VerificationRecord {
            seq,
            at: live.now,
            subject: command.subject(),
            command: command.clone(),
            outcome,
            decided_by,
        });
        seq
    }
}

fn snapshot(live: &LiveView<'_>, command: &Command) -> Result<TwinState, SnapshotError> {
    TwinState::snapshot(live).inspect_err(|e| {
        error!(%command, error = %e, "live state inconsistent; command aborted");
    })
}

fn rejection(e: ApplyError) -> Outcome {
    let kind = match e {
        ApplyError::UnknownEntity(_) => ViolationKind::UnknownEntity,
        ApplyError::Transition(_) => ViolationKind::InvalidTransition,
    };
    Outcome::Unsafe {
        kind,
        message: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use interlock_core::{
        Aspect, Gate, GateId, GatePosition, Signal, SignalId, StationTime, Track, TrackId, Train,
        TrainId,
    };
    use interlock_twin::{GateTable, SignalTable, TrackTable};

    struct Live {
        tracks: TrackTable,
        signals: SignalTable,
        gates: GateTable,
        trains: Vec<Train>,
    }

    impl Live {
        fn new() -> Self {
            Self {
                tracks: [(TrackId::from("P1"), Track::new("P1", 120))]
                    .into_iter()
                    .collect(),
                signals: [(SignalId::from("S1"), Signal::new("S1", "P1"))]
                    .into_iter()
                    .collect(),
                gates: [(GateId::from("G1"), Gate::new("G1", 0.0))]
                    .into_iter()
                    .collect(),
                trains: vec![Train::new("T001", 2_000.0)],
            }
        }

        fn view(&self) -> LiveView<'_> {
            LiveView {
                tracks: &self.tracks,
                signals: &self.signals,
                gates: &self.gates,
                trains: &self.trains,
                now: StationTime(0),
            }
        }
    }

    fn green() -> Command {
        Command::SetSignal {
            signal: SignalId::from("S1"),
            aspect: Aspect::Green,
        }
    }

    #[test]
    fn every_call_appends_one_record() {
        let live = Live::new();
        let mut v = SafetyVerifier::new(SafetyPolicy::default());
        let d1 = v.verify(&live.view(), &green()).unwrap();
        let d2 = v
            .commit_override(&live.view(), &green(), "emergency")
            .unwrap();
        assert_eq!((d1.seq, d2.seq), (Seq(1), Seq(2)));
        assert_eq!(v.log().len(), 2);
        assert_eq!(v.log()[1].decided_by, DecidedBy::Override);
    }

    #[test]
    fn unknown_entity_is_unsafe() {
        let live = Live::new();
        let mut v = SafetyVerifier::new(SafetyPolicy::default());
        let d = v
            .verify(
                &live.view(),
                &Command::OccupyTrack {
                    track: TrackId::from("P4"),
                },
            )
            .unwrap();
        assert_eq!(d.outcome.violation(), Some(ViolationKind::UnknownEntity));
        assert!(d.effect.is_none());
    }

    #[test]
    fn structural_failure_is_invalid_transition() {
        let live = Live::new();
        let mut v = SafetyVerifier::new(SafetyPolicy::default());
        let d = v
            .verify(
                &live.view(),
                &Command::StartClearing {
                    track: TrackId::from("P1"),
                },
            )
            .unwrap();
        assert_eq!(d.outcome.violation(), Some(ViolationKind::InvalidTransition));
        assert_eq!(
            d.outcome.reason(),
            "track P1 cannot start clearing while FREE"
        );
    }

    #[test]
    fn safe_decision_carries_effect() {
        let live = Live::new();
        let mut v = SafetyVerifier::new(SafetyPolicy::default());
        let cmd = Command::ReserveTrack {
            track: TrackId::from("P1"),
            train: TrainId::from("T001"),
            eta_secs: Some(60),
        };
        let d = v.verify(&live.view(), &cmd).unwrap();
        assert_eq!(d.outcome, Outcome::Safe);
        match d.effect {
            Some(Effect::Track(t)) => {
                assert_eq!(t.assigned_train(), Some(&TrainId::from("T001")));
                assert_eq!(t.eta_secs(), Some(60));
            }
            other => panic!("unexpected effect {other:?}"),
        }
    }

    #[test]
    fn evaluate_is_idempotent_and_unrecorded() {
        let live = Live::new();
        let v = SafetyVerifier::new(SafetyPolicy::default());
        let a = v.evaluate(&live.view(), &green()).unwrap();
        let b = v.evaluate(&live.view(), &green()).unwrap();
        assert_eq!(a, b);
        assert!(v.log().is_empty());
    }

    #[test]
    fn override_forces_gate_and_records_reason() {
        let mut live = Live::new();
        live.trains[0].position = 10.0;
        let mut v = SafetyVerifier::new(SafetyPolicy::default());
        let cmd = Command::SetGate {
            gate: GateId::from("G1"),
            position: GatePosition::Open,
        };
        let d = v.commit_override(&live.view(), &cmd, "maintenance").unwrap();
        assert_eq!(
            d.outcome,
            Outcome::Overridden {
                reason: "maintenance".into()
            }
        );
        assert!(
            matches!(d.effect, Some(Effect::Gate(ref g)) if g.position() == GatePosition::Open)
        );
    }

    #[test]
    fn override_cannot_invent_track_edges() {
        let live = Live::new();
        let mut v = SafetyVerifier::new(SafetyPolicy::default());
        let d = v
            .commit_override(
                &live.view(),
                &Command::OccupyTrack {
                    track: TrackId::from("P1"),
                },
                "test",
            )
            .unwrap();
        assert_eq!(d.outcome.violation(), Some(ViolationKind::InvalidTransition));
        assert!(d.effect.is_none());
        assert_eq!(v.log()[0].decided_by, DecidedBy::Override);
    }

    #[test]
    fn blank_override_reason_is_replaced() {
        let live = Live::new();
        let mut v = SafetyVerifier::new(SafetyPolicy::default());
        let d = v.commit_override(&live.view(), &green(), "  ").unwrap();
        assert_eq!(d.outcome.reason(), "no reason given");
    }

    #[test]
    fn snapshot_failure_records_nothing() {
        let mut live = Live::new();
        live.trains.push(Train::new("T001", 0.0));
        let mut v = SafetyVerifier::new(SafetyPolicy::default());
        assert!(v.verify(&live.view(), &green()).is_err());
        assert!(v.commit_override(&live.view(), &green(), "x").is_err());
        assert!(v.log().is_empty());
    }

    #[test]
    fn log_filter_selects() {
        let live = Live::new();
        let mut v = SafetyVerifier::new(SafetyPolicy::default());
        let _ = v.verify(&live.view(), &green()).unwrap();
        let _ = v.commit_override(&live.view(), &green(), "drill").unwrap();
        let _ = v
            .verify(
                &live.view(),
                &Command::SetGate {
                    gate: GateId::from("G1"),
                    position: GatePosition::Open,
                },
            )
            .unwrap();

        let s1 = LogFilter::all().subject(SignalId::from("S1"));
        assert_eq!(v.records(&s1).count(), 2);
        let overrides = LogFilter::all().decided_by(DecidedBy::Override);
        assert_eq!(v.records(&overrides).count(), 1);
        let rejected = LogFilter::all().outcome(OutcomeKind::Unsafe);
        assert_eq!(v.records(&rejected).count(), 1);
        let late = LogFilter::all().since(Seq(2));
        let seqs: Vec<_> = v.records(&late).map(|r| r.seq).collect();
        assert_eq!(seqs, [Seq(2), Seq(3)]);

        let stats = v.stats();
        assert_eq!((stats.total, stats.safe, stats.rejected, stats.overridden), (3, 1, 1, 1));
    }

    #[test]
    fn overridden_double_reservation_does_not_block_unrelated_gate() {
        let mut live = Live::new();
        live.tracks
            .insert(TrackId::from("P2"), Track::new("P2", 120));
        live.trains[0].position = 9_000.0;
        let mut v = SafetyVerifier::new(SafetyPolicy::default());
        let reserve = |track: &str| Command::ReserveTrack {
            track: TrackId::from(track),
            train: TrainId::from("T001"),
            eta_secs: None,
        };

        let adopt = |live: &mut Live, d: Decision| {
            assert!(d.outcome.is_committed(), "{}", d.outcome);
            let Some(Effect::Track(t)) = d.effect else {
                panic!("no track effect");
            };
            live.tracks.insert(t.id().clone(), t);
        };

        let d = v.verify(&live.view(), &reserve("P1")).unwrap();
        adopt(&mut live, d);
        let d = v
            .commit_override(&live.view(), &reserve("P2"), "test")
            .unwrap();
        adopt(&mut live, d);

        let open = Command::SetGate {
            gate: GateId::from("G1"),
            position: GatePosition::Open,
        };
        let d = v.verify(&live.view(), &open).unwrap();
        assert_eq!(d.outcome, Outcome::Safe);
    }
}
