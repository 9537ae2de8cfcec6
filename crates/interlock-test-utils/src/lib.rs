//! Test utilities and mock types for interlock development.
//!
//! Provides a mutable [`SharedTrains`] feed, a [`TestStation`] bundle that
//! keeps handles to a station's train feed and audit sink, and the
//! scenario helpers in [`fixtures`].

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

use std::sync::Arc;

use parking_lot::Mutex;

use interlock_core::{Train, TrainId, TrainSource};
use interlock_engine::{MemorySink, Station, StationConfig};

/// A train feed that tests can move trains around in after handing it to a
/// station. Clones share the same trains.
#[derive(Clone, Debug, Default)]
pub struct SharedTrains {
    trains: Arc<Mutex<Vec<Train>>>,
}

impl SharedTrains {
    pub fn new(trains: impl IntoIterator<Item = Train>) -> Self {
        Self {
            trains: Arc::new(Mutex::new(trains.into_iter().collect())),
        }
    }

    pub fn push(&self, train: Train) {
        self.trains.lock().push(train);
    }

    pub fn replace(&self, trains: impl IntoIterator<Item = Train>) {
        *self.trains.lock() = trains.into_iter().collect();
    }

    /// Move `train` to `position`. Panics if the train is unknown.
    pub fn set_position(&self, train: &str, position: f64) {
        let id = TrainId::from(train);
        let mut trains = self.trains.lock();
        let t = trains
            .iter_mut()
            .find(|t| t.id == id)
            .unwrap_or_else(|| panic!("no train {train} in feed"));
        t.position = position;
    }
}

impl TrainSource for SharedTrains {
    fn trains(&self) -> Vec<Train> {
        self.trains.lock().clone()
    }
}

/// A station together with handles to its train feed and audit sink.
pub struct TestStation {
    pub station: Station,
    pub trains: SharedTrains,
    pub audit: MemorySink,
}

impl TestStation {
    /// The default three-platform station with trains T001–T004 parked far
    /// from the gate.
    pub fn new() -> Self {
        Self::with_config(&StationConfig::default())
    }

    pub fn with_config(config: &StationConfig) -> Self {
        let trains = SharedTrains::new(
            ["T001", "T002", "T003", "T004"]
                .into_iter()
                .enumerate()
                .map(|(i, id)| Train::new(id, 10_000.0 + 1_000.0 * i as f64)),
        );
        let audit = MemorySink::new();
        let station = Station::new(config)
            .unwrap_or_else(|e| panic!("invalid test config: {e}"))
            .with_train_source(trains.clone())
            .with_audit_sink(audit.clone());
        Self {
            station,
            trains,
            audit,
        }
    }
}

impl Default for TestStation {
    fn default() -> Self {
        Self::new()
    }
}
