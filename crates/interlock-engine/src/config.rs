//! Station configuration, validation, and error types.
//!
//! [`StationConfig`] is the input to [`Station::new`](crate::Station::new).
//! It can be built in code, or loaded from a TOML, JSON or YAML file with
//! [`StationConfig::load`], in which case `INTERLOCK__*` environment
//! variables override file values (`INTERLOCK__POLICY__DANGER_RADIUS=750`).

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use interlock_core::{Gate, GateId, Signal, SignalId, Track, TrackId};
use interlock_twin::SafetyPolicy;

/// Clearance applied to tracks that do not set their own. Default: 120 s.
pub const DEFAULT_MIN_CLEARANCE_SECS: u64 = 120;

/// Environment prefix for configuration overrides.
pub const ENV_PREFIX: &str = "INTERLOCK";

// ── Resource configs ──────────────────────────────────────────────

/// One platform track.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackConfig {
    /// Track identifier.
    pub id: TrackId,
    /// Per-track clearance. `None` uses the station default.
    #[serde(default)]
    pub min_clearance_secs: Option<u64>,
}

impl TrackConfig {
    /// A track using the station default clearance.
    pub fn new(id: impl Into<TrackId>) -> Self {
        Self {
            id: id.into(),
            min_clearance_secs: None,
        }
    }
}

/// One signal and the track it protects.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignalConfig {
    /// Signal identifier.
    pub id: SignalId,
    /// The protected track.
    pub track: TrackId,
}

/// One level-crossing gate.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GateConfig {
    /// Gate identifier.
    pub id: GateId,
    /// Position along the line, in train position units.
    #[serde(default)]
    pub location: f64,
}

// ── StationConfig ─────────────────────────────────────────────────

/// Everything needed to construct a [`Station`](crate::Station).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StationConfig {
    /// Display name used in log output.
    pub name: String,
    /// Conflict rule parameters.
    pub policy: SafetyPolicy,
    /// Clearance for tracks that do not set their own. Default: 120.
    pub min_clearance_secs: u64,
    /// Platform tracks, in table order.
    pub tracks: Vec<TrackConfig>,
    /// Signals, in table order.
    pub signals: Vec<SignalConfig>,
    /// Level-crossing gates, in table order.
    pub gates: Vec<GateConfig>,
}

impl Default for StationConfig {
    /// Three platforms P1–P3, each protected by one signal S1–S3, and a
    /// single gate G1 at line position 0.
    fn default() -> Self {
        let tracks = ["P1", "P2", "P3"];
        Self {
            name: "station".into(),
            policy: SafetyPolicy::default(),
            min_clearance_secs: DEFAULT_MIN_CLEARANCE_SECS,
            tracks: tracks.iter().map(|&t| TrackConfig::new(t)).collect(),
            signals: tracks
                .iter()
                .enumerate()
                .map(|(i, &t)| SignalConfig {
                    id: SignalId(format!("S{}", i + 1)),
                    track: TrackId::from(t),
                })
                .collect(),
            gates: vec![GateConfig {
                id: GateId::from("G1"),
                location: 0.0,
            }],
        }
    }
}

impl StationConfig {
    /// Read a configuration file, apply environment overrides and validate.
    ///
    /// The format is inferred from the file extension.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let settings = ::config::Config::builder()
            .add_source(::config::File::from(path.as_ref()))
            .add_source(
                ::config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        let cfg: StationConfig = settings.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Check structural invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tracks.is_empty() {
            return Err(ConfigError::NoTracks);
        }
        let r = self.policy.danger_radius;
        if !r.is_finite() || r <= 0.0 {
            return Err(ConfigError::InvalidDangerRadius { value: r });
        }

        let mut track_ids = HashSet::new();
        for t in &self.tracks {
            if !track_ids.insert(&t.id) {
                return Err(ConfigError::DuplicateId {
                    kind: "track",
                    id: t.id.to_string(),
                });
            }
        }
        let mut signal_ids = HashSet::new();
        for s in &self.signals {
            if !signal_ids.insert(&s.id) {
                return Err(ConfigError::DuplicateId {
                    kind: "signal",
                    id: s.id.to_string(),
                });
            }
            if !track_ids.contains(&s.track) {
                return Err(ConfigError::SignalTrackUnknown {
                    signal: s.id.clone(),
                    track: s.track.clone(),
                });
            }
        }
        let mut gate_ids = HashSet::new();
        for g in &self.gates {
            if !gate_ids.insert(&g.id) {
                return Err(ConfigError::DuplicateId {
                    kind: "gate",
                    id: g.id.to_string(),
                });
            }
            if !g.location.is_finite() {
                return Err(ConfigError::InvalidGateLocation { gate: g.id.clone() });
            }
        }
        Ok(())
    }

    /// Fresh track records in their initial FREE state.
    pub(crate) fn build_tracks(&self) -> impl Iterator<Item = Track> + '_ {
        self.tracks.iter().map(|t| {
            Track::new(
                t.id.clone(),
                t.min_clearance_secs.unwrap_or(self.min_clearance_secs),
            )
        })
    }

    /// Fresh signal records showing RED.
    pub(crate) fn build_signals(&self) -> impl Iterator<Item = Signal> + '_ {
        self.signals
            .iter()
            .map(|s| Signal::new(s.id.clone(), s.track.clone()))
    }

    /// Fresh gate records, CLOSED.
    pub(crate) fn build_gates(&self) -> impl Iterator<Item = Gate> + '_ {
        self.gates.iter().map(|g| Gate::new(g.id.clone(), g.location))
    }
}

// ── ConfigError ───────────────────────────────────────────────────

/// Errors from loading or validating a [`StationConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read or deserialized.
    #[error("failed to load station config: {0}")]
    Load(#[from] ::config::ConfigError),
    /// No tracks are configured.
    #[error("station has no tracks")]
    NoTracks,
    /// Two resources of the same kind share an id.
    #[error("duplicate {kind} id {id}")]
    DuplicateId {
        /// `track`, `signal` or `gate`.
        kind: &'static str,
        /// The repeated id.
        id: String,
    },
    /// A signal protects a track that is not configured.
    #[error("signal {signal} protects unknown track {track}")]
    SignalTrackUnknown {
        /// The signal.
        signal: SignalId,
        /// The missing track.
        track: TrackId,
    },
    /// The danger radius is NaN, infinite, zero or negative.
    #[error("danger radius must be finite and positive, got {value}")]
    InvalidDangerRadius {
        /// The invalid value.
        value: f64,
    },
    /// A gate location is NaN or infinite.
    #[error("gate {gate} has a non-finite location")]
    InvalidGateLocation {
        /// The gate.
        gate: GateId,
    },
}
