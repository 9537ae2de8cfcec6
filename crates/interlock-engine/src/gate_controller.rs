//! Live level-crossing gate table.

use interlock_core::{Gate, GateId, GatePosition, Train};
use interlock_twin::GateTable;

/// Owns the live gate records.
#[derive(Clone, Debug, Default)]
pub struct GateController {
    gates: GateTable,
}

impl GateController {
    /// A controller over `gates`, in iteration order.
    pub fn new(gates: impl IntoIterator<Item = Gate>) -> Self {
        Self {
            gates: gates.into_iter().map(|g| (g.id().clone(), g)).collect(),
        }
    }

    /// The full table.
    pub fn table(&self) -> &GateTable {
        &self.gates
    }

    /// Look up one gate.
    pub fn gate(&self, id: &GateId) -> Option<&Gate> {
        self.gates.get(id)
    }

    /// All gates in table order.
    pub fn gates(&self) -> impl Iterator<Item = &Gate> {
        self.gates.values()
    }

    /// OPEN gates with at least one of `trains` closer than `radius`.
    pub fn endangered<'a>(
        &'a self,
        trains: &'a [Train],
        radius: f64,
    ) -> impl Iterator<Item = &'a Gate> + 'a {
        self.gates.values().filter(move |g| {
            g.position() == GatePosition::Open
                && trains.iter().any(|t| g.distance_to(t.position) < radius)
        })
    }

    pub(crate) fn adopt(&mut self, gate: Gate) {
        debug_assert!(self.gates.contains_key(gate.id()));
        self.gates.insert(gate.id().clone(), gate);
    }
}
