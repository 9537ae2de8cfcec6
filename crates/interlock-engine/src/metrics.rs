//! Aggregate verification statistics.
//!
//! [`VerificationStats`] is recomputed from the verification log on every
//! request. Nothing here is stored alongside the log.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use interlock_core::{Outcome, VerificationRecord, ViolationKind};

/// Counts over a verification log.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct VerificationStats {
    /// Records in the log.
    pub total: u64,
    /// Commands verified safe and committed.
    pub safe: u64,
    /// Commands refused, including overrides that could not commit.
    pub rejected: u64,
    /// Commands committed under override.
    pub overridden: u64,
    /// Refusals broken down by violation kind.
    pub by_kind: BTreeMap<ViolationKind, u64>,
}

impl VerificationStats {
    /// Fold a sequence of records.
    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a VerificationRecord>) -> Self {
        let mut stats = Self::default();
        for r in records {
            stats.total += 1;
            match &r.outcome {
                Outcome::Safe => stats.safe += 1,
                Outcome::Overridden { .. } => stats.overridden += 1,
                Outcome::Unsafe { kind, .. } => {
                    stats.rejected += 1;
                    *stats.by_kind.entry(*kind).or_default() += 1;
                }
            }
        }
        stats
    }

    /// `safe / total`, in `[0, 1]`. Zero for an empty log.
    pub fn safety_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.safe as f64 / self.total as f64
        }
    }

    /// Refusals of one kind.
    pub fn rejected_for(&self, kind: ViolationKind) -> u64 {
        self.by_kind.get(&kind).copied().unwrap_or(0)
    }
}

impl fmt::Display for VerificationStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} verifications: {} safe, {} rejected, {} overridden ({:.1}% safe)",
            self.total,
            self.safe,
            self.rejected,
            self.overridden,
            self.safety_rate() * 100.0
        )
    }
}
