//! The station aggregate: controllers, verifier, clock and collaborators.
//!
//! [`Station`] is the only place live state changes. Each entry point builds
//! one [`Command`], has the [`SafetyVerifier`] decide it against a
//! consistent view of all three tables, and on commit hands the resulting
//! [`Effect`] to the controller that owns the resource. All entry points
//! take `&mut self`, so verify-then-commit is atomic by construction.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use interlock_core::{
    Aspect, Command, CommandMode, Effect, Gate, GateId, GatePosition, Outcome, Signal, SignalId,
    SnapshotError, StationTime, Track, TrackId, Train, TrainId, TrainSource, VerificationRecord,
};
use interlock_twin::{Conflicts, LiveView, SafetyPolicy, TwinState};

use crate::audit::{AuditSink, Controller, ControllerNotice, NoticePhase, NullSink};
use crate::config::{ConfigError, StationConfig};
use crate::gate_controller::GateController;
use crate::metrics::VerificationStats;
use crate::signal_controller::SignalController;
use crate::track_manager::TrackManager;
use crate::verifier::{LogFilter, SafetyVerifier};

/// Fatal station errors. Rejected commands are not errors.
#[derive(Debug, Error)]
pub enum StationError {
    /// The configuration is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Live state was found inconsistent while snapshotting.
    #[error("live state invariant breached: {0}")]
    Snapshot(#[from] SnapshotError),
}

/// A gate record with its derived nearest-train distance.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GateStatus {
    /// The gate record.
    pub gate: Gate,
    /// The closest train, if any trains are known.
    pub nearest_train: Option<TrainId>,
    /// Distance to that train.
    pub distance: Option<f64>,
}

/// Read-only copy of every live resource.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResourceSnapshot {
    /// Station clock.
    pub now: StationTime,
    /// Tracks in table order.
    pub tracks: Vec<Track>,
    /// Signals in table order.
    pub signals: Vec<Signal>,
    /// Gates in table order.
    pub gates: Vec<GateStatus>,
}

/// One station's interlocking.
pub struct Station {
    name: String,
    now: StationTime,
    tracks: TrackManager,
    signals: SignalController,
    gates: GateController,
    verifier: SafetyVerifier,
    trains: Box<dyn TrainSource + Send>,
    audit: Box<dyn AuditSink + Send>,
}

impl std::fmt::Debug for Station {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Station")
            .field("name", &self.name)
            .field("now", &self.now)
            .field("tracks", &self.tracks)
            .field("signals", &self.signals)
            .field("gates", &self.gates)
            .field("records", &self.verifier.log().len())
            .finish_non_exhaustive()
    }
}

impl Station {
    /// Build a station from `config`, with no trains and no audit sink.
    pub fn new(config: &StationConfig) -> Result<Self, StationError> {
        config.validate()?;
        info!(
            station = %config.name,
            tracks = config.tracks.len(),
            signals = config.signals.len(),
            gates = config.gates.len(),
            "station constructed"
        );
        Ok(Self {
            name: config.name.clone(),
            now: StationTime::default(),
            tracks: TrackManager::new(config.build_tracks()),
            signals: SignalController::new(config.build_signals()),
            gates: GateController::new(config.build_gates()),
            verifier: SafetyVerifier::new(config.policy.clone()),
            trains: Box::new(()),
            audit: Box::new(NullSink),
        })
    }

    /// Replace the train source.
    pub fn with_train_source(mut self, source: impl TrainSource + Send + 'static) -> Self {
        self.trains = Box::new(source);
        self
    }

    /// Replace the audit sink.
    pub fn with_audit_sink(mut self, sink: impl AuditSink + Send + 'static) -> Self {
        self.audit = Box::new(sink);
        self
    }

    // ── Track manager ────────────────────────────────────────────

    /// Reserve `track` for `train`.
    pub fn request_track_allocation(
        &mut self,
        track: impl Into<TrackId>,
        train: impl Into<TrainId>,
    ) -> Result<Outcome, StationError> {
        self.request_track_allocation_with_eta(track, train, None)
    }

    /// Reserve `track` for `train`, recording an arrival countdown.
    pub fn request_track_allocation_with_eta(
        &mut self,
        track: impl Into<TrackId>,
        train: impl Into<TrainId>,
        eta_secs: Option<u64>,
    ) -> Result<Outcome, StationError> {
        self.submit(
            Command::ReserveTrack {
                track: track.into(),
                train: train.into(),
                eta_secs,
            },
            CommandMode::Verified,
        )
    }

    /// Reserve the first FREE track for `train`.
    ///
    /// Returns `None` without recording anything when no track is FREE.
    pub fn allocate_first_free(
        &mut self,
        train: impl Into<TrainId>,
        eta_secs: Option<u64>,
    ) -> Result<Option<(TrackId, Outcome)>, StationError> {
        let Some(track) = self.tracks.first_free().map(|t| t.id().clone()) else {
            return Ok(None);
        };
        let outcome = self.request_track_allocation_with_eta(track.clone(), train, eta_secs)?;
        Ok(Some((track, outcome)))
    }

    /// The reserved train has arrived on `track`.
    pub fn occupy_track(&mut self, track: impl Into<TrackId>) -> Result<Outcome, StationError> {
        self.submit(
            Command::OccupyTrack {
                track: track.into(),
            },
            CommandMode::Verified,
        )
    }

    /// The train on `track` has departed.
    pub fn start_clearing(&mut self, track: impl Into<TrackId>) -> Result<Outcome, StationError> {
        self.submit(
            Command::StartClearing {
                track: track.into(),
            },
            CommandMode::Verified,
        )
    }

    /// Cancel a reservation, or complete a clearance.
    pub fn release_track(&mut self, track: impl Into<TrackId>) -> Result<Outcome, StationError> {
        self.submit(
            Command::ReleaseTrack {
                track: track.into(),
            },
            CommandMode::Verified,
        )
    }

    // ── Signal controller ────────────────────────────────────────

    /// Change a signal aspect.
    pub fn set_signal(
        &mut self,
        signal: impl Into<SignalId>,
        aspect: Aspect,
        mode: CommandMode,
    ) -> Result<Outcome, StationError> {
        self.submit(
            Command::SetSignal {
                signal: signal.into(),
                aspect,
            },
            mode,
        )
    }

    // ── Gate controller ──────────────────────────────────────────

    /// Move a level-crossing gate.
    pub fn set_gate(
        &mut self,
        gate: impl Into<GateId>,
        position: GatePosition,
        mode: CommandMode,
    ) -> Result<Outcome, StationError> {
        self.submit(
            Command::SetGate {
                gate: gate.into(),
                position,
            },
            mode,
        )
    }

    /// Command every OPEN gate with a train inside the danger radius to
    /// CLOSING. Each is an ordinary verified command.
    pub fn auto_close_gates(&mut self) -> Result<Vec<(GateId, Outcome)>, StationError> {
        let trains = self.trains.trains();
        let radius = self.policy().danger_radius;
        let endangered: Vec<GateId> = self
            .gates
            .endangered(&trains, radius)
            .map(|g| g.id().clone())
            .collect();

        let mut results = Vec::with_capacity(endangered.len());
        for gate in endangered {
            let outcome =
                self.set_gate(gate.clone(), GatePosition::Closing, CommandMode::Verified)?;
            results.push((gate, outcome));
        }
        Ok(results)
    }

    // ── Clock ────────────────────────────────────────────────────

    /// Advance the station clock, counting arrival estimates down.
    pub fn advance_clock(&mut self, secs: u64) {
        self.now = self.now.plus(secs);
        self.tracks.count_down(secs);
        debug!(now = %self.now, "clock advanced");
    }

    // ── Queries ──────────────────────────────────────────────────

    /// Station name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Station clock.
    pub fn now(&self) -> StationTime {
        self.now
    }

    /// The policy the verifier enforces.
    pub fn policy(&self) -> &SafetyPolicy {
        self.verifier.detector().policy()
    }

    /// Live track table.
    pub fn tracks(&self) -> &TrackManager {
        &self.tracks
    }

    /// The track currently held by `train`, if any.
    pub fn track_for_train(&self, train: impl Into<TrainId>) -> Option<&Track> {
        self.tracks.track_for_train(&train.into())
    }

    /// Number of FREE tracks.
    pub fn free_track_count(&self) -> usize {
        self.tracks.free_count()
    }

    /// Live signal table.
    pub fn signals(&self) -> &SignalController {
        &self.signals
    }

    /// Live gate table.
    pub fn gates(&self) -> &GateController {
        &self.gates
    }

    /// The verifier and its log.
    pub fn verifier(&self) -> &SafetyVerifier {
        &self.verifier
    }

    /// A copy of every live resource, with derived gate distances.
    pub fn resource_snapshot(&self) -> ResourceSnapshot {
        let trains = self.trains.trains();
        let gates = self
            .gates
            .gates()
            .map(|g| {
                let nearest = trains
                    .iter()
                    .map(|t| (t, g.distance_to(t.position)))
                    .min_by(|a, b| a.1.total_cmp(&b.1));
                GateStatus {
                    gate: g.clone(),
                    nearest_train: nearest.map(|(t, _)| t.id.clone()),
                    distance: nearest.map(|(_, d)| d),
                }
            })
            .collect();
        ResourceSnapshot {
            now: self.now,
            tracks: self.tracks.tracks().cloned().collect(),
            signals: self.signals.signals().cloned().collect(),
            gates,
        }
    }

    /// Verification records passing `filter`, oldest first.
    pub fn verification_log(&self, filter: &LogFilter) -> Vec<VerificationRecord> {
        self.verifier.records(filter).cloned().collect()
    }

    /// Statistics derived from the verification log.
    pub fn stats(&self) -> VerificationStats {
        self.verifier.stats()
    }

    /// Every conflict present in live state. Empty unless an override left
    /// the station in a state the detector would refuse.
    pub fn audit_live(&self) -> Result<Conflicts, StationError> {
        let trains = self.trains.trains();
        let twin = TwinState::snapshot(&self.live_view(&trains))?;
        Ok(self.verifier.detector().scan(&twin))
    }

    // ── Internals ────────────────────────────────────────────────

    fn live_view<'a>(&'a self, trains: &'a [Train]) -> LiveView<'a> {
        LiveView {
            tracks: self.tracks.table(),
            signals: self.signals.table(),
            gates: self.gates.table(),
            trains,
            now: self.now,
        }
    }

    fn submit(&mut self, command: Command, mode: CommandMode) -> Result<Outcome, StationError> {
        let controller = Controller::for_command(&command);
        self.notify(NoticePhase::Attempted, controller, &command, String::new());

        let trains = self.trains.trains();
        let live = LiveView {
            tracks: self.tracks.table(),
            signals: self.signals.table(),
            gates: self.gates.table(),
            trains: &trains,
            now: self.now,
        };
        let decision = match &mode {
            CommandMode::Verified => self.verifier.verify(&live, &command)?,
            CommandMode::Override(reason) => {
                self.verifier.commit_override(&live, &command, reason)?
            }
        };

        if let Some(effect) = decision.effect {
            self.commit(effect);
        }
        if let Some(record) = self.verifier.log().last() {
            if let Err(e) = self.audit.append(record) {
                warn!(seq = %record.seq, error = %e, "audit sink rejected record");
            }
        }

        let phase = if decision.outcome.is_committed() {
            NoticePhase::Succeeded
        } else {
            NoticePhase::Blocked
        };
        self.notify(phase, controller, &command, decision.outcome.to_string());
        Ok(decision.outcome)
    }

    fn commit(&mut self, effect: Effect) {
        match effect {
            Effect::Track(t) => self.tracks.adopt(t),
            Effect::Signal(s) => self.signals.adopt(s),
            Effect::Gate(g) => self.gates.adopt(g),
        }
    }

    fn notify(
        &mut self,
        phase: NoticePhase,
        controller: Controller,
        command: &Command,
        detail: String,
    ) {
        let notice = ControllerNotice {
            phase,
            controller,
            command: command.clone(),
            at: self.now,
            detail,
        };
        if let Err(e) = self.audit.notice(&notice) {
            warn!(error = %e, "audit sink rejected notice");
        }
    }
}
