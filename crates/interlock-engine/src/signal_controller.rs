//! Live signal table.

use interlock_core::{Signal, SignalId};
use interlock_twin::SignalTable;

/// Owns the live signal records.
#[derive(Clone, Debug, Default)]
pub struct SignalController {
    signals: SignalTable,
}

impl SignalController {
    /// A controller over `signals`, in iteration order.
    pub fn new(signals: impl IntoIterator<Item = Signal>) -> Self {
        Self {
            signals: signals.into_iter().map(|s| (s.id().clone(), s)).collect(),
        }
    }

    /// The full table.
    pub fn table(&self) -> &SignalTable {
        &self.signals
    }

    /// Look up one signal.
    pub fn signal(&self, id: &SignalId) -> Option<&Signal> {
        self.signals.get(id)
    }

    /// All signals in table order.
    pub fn signals(&self) -> impl Iterator<Item = &Signal> {
        self.signals.values()
    }

    pub(crate) fn adopt(&mut self, signal: Signal) {
        debug_assert!(self.signals.contains_key(signal.id()));
        self.signals.insert(signal.id().clone(), signal);
    }
}
