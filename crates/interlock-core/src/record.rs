//! Verification outcomes and the append-only record type.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::command::Command;
use crate::error::ViolationKind;
use crate::id::{EntityRef, Seq, StationTime};

/// Result of submitting one command.
///
/// Callers must match on this: there is no side channel that reports a
/// rejection separately.
///
/// # Examples
///
/// ```
/// use interlock_core::{Outcome, ViolationKind};
///
/// let outcome = Outcome::Unsafe {
///     kind: ViolationKind::GateDangerZone,
///     message: "train T001 is 300 units from gate G1".into(),
/// };
/// assert!(!outcome.is_committed());
/// assert_eq!(outcome.violation(), Some(ViolationKind::GateDangerZone));
/// ```
#[must_use]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    /// Verified against the twin and committed.
    Safe,
    /// Refused; live state is unchanged.
    Unsafe {
        /// The violated rule.
        kind: ViolationKind,
        /// Human-readable explanation.
        message: String,
    },
    /// Committed without verification under emergency authority.
    Overridden {
        /// The justification supplied by the caller.
        reason: String,
    },
}

impl Outcome {
    /// Whether the command took effect.
    pub fn is_committed(&self) -> bool {
        matches!(self, Self::Safe | Self::Overridden { .. })
    }

    /// Whether the command was verified safe.
    pub fn is_safe(&self) -> bool {
        matches!(self, Self::Safe)
    }

    /// The violation, for unsafe outcomes.
    pub fn violation(&self) -> Option<ViolationKind> {
        match self {
            Self::Unsafe { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// The fieldless kind of this outcome.
    pub fn kind(&self) -> OutcomeKind {
        match self {
            Self::Safe => OutcomeKind::Safe,
            Self::Unsafe { .. } => OutcomeKind::Unsafe,
            Self::Overridden { .. } => OutcomeKind::Overridden,
        }
    }

    /// The rejection message or override justification; empty when safe.
    pub fn reason(&self) -> &str {
        match self {
            Self::Safe => "",
            Self::Unsafe { message, .. } => message,
            Self::Overridden { reason } => reason,
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Safe => f.write_str("SAFE"),
            Self::Unsafe { kind, message } => write!(f, "UNSAFE ({kind}): {message}"),
            Self::Overridden { reason } => write!(f, "OVERRIDDEN: {reason}"),
        }
    }
}

/// Fieldless outcome discriminant, for filtering and statistics.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeKind {
    /// See [`Outcome::Safe`].
    Safe,
    /// See [`Outcome::Unsafe`].
    Unsafe,
    /// See [`Outcome::Overridden`].
    Overridden,
}

/// Which path decided an outcome.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecidedBy {
    /// Twin simulation and conflict detection.
    Verifier,
    /// Emergency override; verification was skipped.
    Override,
}

/// One entry of the verification log.
///
/// Appended once per verify or override call and never mutated afterwards.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationRecord {
    /// Logical timestamp; strictly increasing through the log.
    pub seq: Seq,
    /// Station clock when the command was decided.
    pub at: StationTime,
    /// The resource the command targeted.
    pub subject: EntityRef,
    /// The requested transition.
    pub command: Command,
    /// What happened.
    pub outcome: Outcome,
    /// Which path decided.
    pub decided_by: DecidedBy,
}

impl VerificationRecord {
    /// The rejection message or override justification; empty when safe.
    pub fn reason(&self) -> &str {
        self.outcome.reason()
    }
}

impl fmt::Display for VerificationRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}: {}", self.seq, self.at, self.command, self.outcome)
    }
}
