//! Point-in-time value snapshots of the whole station.
//!
//! [`TwinState::snapshot`] copies every record out of a borrowed
//! [`LiveView`]; afterwards the twin and the live tables share nothing.
//! [`TwinState::apply`] returns a new twin reflecting one command and never
//! touches its input, so a verifier can simulate, inspect and discard.
//!
//! Records are kept in insertion-ordered maps keyed by id, so the twin is
//! an arena of plain structs with no pointers between them.

use indexmap::IndexMap;
use thiserror::Error;

use interlock_core::{
    Command, Effect, EntityRef, Gate, GateId, Signal, SignalId, SnapshotError, StationTime, Track,
    TrackId, Train, TrainId, TransitionError,
};

/// Live track table, keyed by id.
pub type TrackTable = IndexMap<TrackId, Track>;
/// Live signal table, keyed by id.
pub type SignalTable = IndexMap<SignalId, Signal>;
/// Live gate table, keyed by id.
pub type GateTable = IndexMap<GateId, Gate>;

/// Borrowed view of the live station, the input to [`TwinState::snapshot`].
///
/// All tables are borrowed together so a snapshot is always taken from one
/// consistent instant.
#[derive(Clone, Copy, Debug)]
pub struct LiveView<'a> {
    /// Track table owned by the track manager.
    pub tracks: &'a TrackTable,
    /// Signal table owned by the signal controller.
    pub signals: &'a SignalTable,
    /// Gate table owned by the gate controller.
    pub gates: &'a GateTable,
    /// Trains as last reported by the train source.
    pub trains: &'a [Train],
    /// Station clock.
    pub now: StationTime,
}

/// Why a command could not be applied to a twin.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ApplyError {
    /// The command names an entity that is not in the twin.
    #[error("{0} does not exist")]
    UnknownEntity(EntityRef),
    /// The command is not a legal edge of the resource's state machine.
    #[error(transparent)]
    Transition(#[from] TransitionError),
}

/// An immutable value snapshot of every station record.
#[derive(Clone, Debug, PartialEq)]
pub struct TwinState {
    now: StationTime,
    tracks: TrackTable,
    signals: SignalTable,
    gates: GateTable,
    trains: IndexMap<TrainId, Train>,
}

impl TwinState {
    /// Deep-copy the live station.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError`] if the live state is internally
    /// inconsistent. The caller must abort the operation.
    pub fn snapshot(live: &LiveView<'_>) -> Result<Self, SnapshotError> {
        for signal in live.signals.values() {
            if !live.tracks.contains_key(signal.track()) {
                return Err(SnapshotError::SignalTrackMissing {
                    signal: signal.id().clone(),
                    track: signal.track().clone(),
                });
            }
        }

        let mut trains = IndexMap::with_capacity(live.trains.len());
        for train in live.trains {
            if !train.position.is_finite() || !train.speed.is_finite() {
                return Err(SnapshotError::NonFiniteTrain {
                    train: train.id.clone(),
                });
            }
            if let Some(track) = &train.assigned_track {
                if !live.tracks.contains_key(track) {
                    return Err(SnapshotError::TrainTrackMissing {
                        train: train.id.clone(),
                        track: track.clone(),
                    });
                }
            }
            if trains.insert(train.id.clone(), train.clone()).is_some() {
                return Err(SnapshotError::DuplicateTrain {
                    train: train.id.clone(),
                });
            }
        }

        Ok(Self {
            now: live.now,
            tracks: live.tracks.clone(),
            signals: live.signals.clone(),
            gates: live.gates.clone(),
            trains,
        })
    }

    /// Station clock at snapshot time.
    pub fn now(&self) -> StationTime {
        self.now
    }

    /// All tracks in table order.
    pub fn tracks(&self) -> impl Iterator<Item = &Track> {
        self.tracks.values()
    }

    /// All signals in table order.
    pub fn signals(&self) -> impl Iterator<Item = &Signal> {
        self.signals.values()
    }

    /// All gates in table order.
    pub fn gates(&self) -> impl Iterator<Item = &Gate> {
        self.gates.values()
    }

    /// All trains in source order.
    pub fn trains(&self) -> impl Iterator<Item = &Train> {
        self.trains.values()
    }

    /// Look up a track.
    pub fn track(&self, id: &TrackId) -> Option<&Track> {
        self.tracks.get(id)
    }

    /// Look up a signal.
    pub fn signal(&self, id: &SignalId) -> Option<&Signal> {
        self.signals.get(id)
    }

    /// Look up a gate.
    pub fn gate(&self, id: &GateId) -> Option<&Gate> {
        self.gates.get(id)
    }

    /// Look up a train.
    pub fn train(&self, id: &TrainId) -> Option<&Train> {
        self.trains.get(id)
    }

    /// Signals protecting `track`.
    pub fn signals_protecting<'s>(
        &'s self,
        track: &'s TrackId,
    ) -> impl Iterator<Item = &'s Signal> + 's {
        self.signals.values().filter(move |s| s.track() == track)
    }

    /// Tracks currently held by `train`.
    pub fn tracks_held_by<'s>(
        &'s self,
        train: &'s TrainId,
    ) -> impl Iterator<Item = &'s Track> + 's {
        self.tracks
            .values()
            .filter(move |t| t.assigned_train() == Some(train))
    }

    /// The train closest to `gate` and its distance.
    pub fn nearest_train(&self, gate: &GateId) -> Option<(&Train, f64)> {
        let gate = self.gates.get(gate)?;
        self.trains
            .values()
            .map(|t| (t, gate.distance_to(t.position)))
            .min_by(|a, b| a.1.total_cmp(&b.1))
    }

    /// Check that every entity `command` names exists in this twin.
    pub fn resolve(&self, command: &Command) -> Result<(), ApplyError> {
        let missing = match command {
            Command::ReserveTrack { track, train, .. } => {
                if !self.tracks.contains_key(track) {
                    Some(EntityRef::Track(track.clone()))
                } else if !self.trains.contains_key(train) {
                    Some(EntityRef::Train(train.clone()))
                } else {
                    None
                }
            }
            Command::OccupyTrack { track }
            | Command::StartClearing { track }
            | Command::ReleaseTrack { track } => (!self.tracks.contains_key(track))
                .then(|| EntityRef::Track(track.clone())),
            Command::SetSignal { signal, .. } => (!self.signals.contains_key(signal))
                .then(|| EntityRef::Signal(signal.clone())),
            Command::SetGate { gate, .. } => {
                (!self.gates.contains_key(gate)).then(|| EntityRef::Gate(gate.clone()))
            }
        };
        match missing {
            Some(entity) => Err(ApplyError::UnknownEntity(entity)),
            None => Ok(()),
        }
    }

    /// A new twin with `command` applied along its state machine.
    ///
    /// `self` is left untouched.
    pub fn apply(&self, command: &Command) -> Result<TwinState, ApplyError> {
        self.apply_with(command, false)
    }

    /// A new twin with `command` applied under override authority.
    ///
    /// Signals and gates take the requested state unconditionally. Tracks
    /// still need a legal edge because an occupancy outside the state
    /// machine is not representable.
    pub fn apply_forced(&self, command: &Command) -> Result<TwinState, ApplyError> {
        self.apply_with(command, true)
    }

    fn apply_with(&self, command: &Command, forced: bool) -> Result<TwinState, ApplyError> {
        self.resolve(command)?;
        let mut next = self.clone();
        let now = next.now;
        match command {
            Command::ReserveTrack {
                track,
                train,
                eta_secs,
            } => next.track_mut(track)?.reserve(train.clone(), *eta_secs)?,
            Command::OccupyTrack { track } => next.track_mut(track)?.occupy()?,
            Command::StartClearing { track } => next.track_mut(track)?.start_clearing()?,
            Command::ReleaseTrack { track } => next.track_mut(track)?.release(now)?,
            Command::SetSignal { signal, aspect } => next
                .signals
                .get_mut(signal)
                .ok_or_else(|| ApplyError::UnknownEntity(EntityRef::Signal(signal.clone())))?
                .set_aspect(*aspect),
            Command::SetGate { gate, position } => {
                let g = next
                    .gates
                    .get_mut(gate)
                    .ok_or_else(|| ApplyError::UnknownEntity(EntityRef::Gate(gate.clone())))?;
                if forced {
                    g.force(*position);
                } else {
                    g.move_to(*position)?;
                }
            }
        }
        Ok(next)
    }

    /// The record of the resource `command` targets, as it stands in this
    /// twin.
    pub fn effect_of(&self, command: &Command) -> Option<Effect> {
        match command.subject() {
            EntityRef::Track(id) => self.tracks.get(&id).cloned().map(Effect::Track),
            EntityRef::Signal(id) => self.signals.get(&id).cloned().map(Effect::Signal),
            EntityRef::Gate(id) => self.gates.get(&id).cloned().map(Effect::Gate),
            EntityRef::Train(_) => None,
        }
    }

    fn track_mut(&mut self, id: &TrackId) -> Result<&mut Track, ApplyError> {
        self.tracks
            .get_mut(id)
            .ok_or_else(|| ApplyError::UnknownEntity(EntityRef::Track(id.clone())))
    }
}
