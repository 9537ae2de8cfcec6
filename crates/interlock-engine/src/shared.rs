//! Multi-caller access to one station.

use std::sync::Arc;

use parking_lot::Mutex;

use interlock_core::{
    Aspect, CommandMode, GateId, GatePosition, Outcome, SignalId, TrackId, TrainId,
    VerificationRecord,
};

use crate::metrics::VerificationStats;
use crate::station::{ResourceSnapshot, Station, StationError};
use crate::verifier::LogFilter;

/// A cloneable handle serializing all callers through one lock.
///
/// Each entry point holds the lock for its whole verify-then-commit
/// sequence, so records are totally ordered in the order callers acquired
/// the lock, and no caller observes a half-committed command.
#[derive(Clone, Debug)]
pub struct SharedStation {
    inner: Arc<Mutex<Station>>,
}

impl SharedStation {
    /// Share `station`.
    pub fn new(station: Station) -> Self {
        Self {
            inner: Arc::new(Mutex::new(station)),
        }
    }

    /// Run `f` with exclusive access, for sequences that must not
    /// interleave with other callers.
    pub fn with<R>(&self, f: impl FnOnce(&mut Station) -> R) -> R {
        f(&mut self.inner.lock())
    }

    /// See [`Station::request_track_allocation`].
    pub fn request_track_allocation(
        &self,
        track: impl Into<TrackId>,
        train: impl Into<TrainId>,
    ) -> Result<Outcome, StationError> {
        self.inner.lock().request_track_allocation(track, train)
    }

    /// See [`Station::release_track`].
    pub fn release_track(&self, track: impl Into<TrackId>) -> Result<Outcome, StationError> {
        self.inner.lock().release_track(track)
    }

    /// See [`Station::set_signal`].
    pub fn set_signal(
        &self,
        signal: impl Into<SignalId>,
        aspect: Aspect,
        mode: CommandMode,
    ) -> Result<Outcome, StationError> {
        self.inner.lock().set_signal(signal, aspect, mode)
    }

    /// See [`Station::set_gate`].
    pub fn set_gate(
        &self,
        gate: impl Into<GateId>,
        position: GatePosition,
        mode: CommandMode,
    ) -> Result<Outcome, StationError> {
        self.inner.lock().set_gate(gate, position, mode)
    }

    /// See [`Station::resource_snapshot`].
    pub fn resource_snapshot(&self) -> ResourceSnapshot {
        self.inner.lock().resource_snapshot()
    }

    /// See [`Station::verification_log`].
    pub fn verification_log(&self, filter: &LogFilter) -> Vec<VerificationRecord> {
        self.inner.lock().verification_log(filter)
    }

    /// See [`Station::stats`].
    pub fn stats(&self) -> VerificationStats {
        self.inner.lock().stats()
    }
}

impl From<Station> for SharedStation {
    fn from(station: Station) -> Self {
        Self::new(station)
    }
}
