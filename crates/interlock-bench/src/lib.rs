//! Benchmark profiles for the interlock verification engine.
//!
//! - [`reference_profile`]: the default three-platform station
//! - [`large_profile`]: a terminus with many platforms and crossings
//! - [`train_feed`]: deterministic train placement along the line

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use interlock_core::Train;
use interlock_engine::{GateConfig, SignalConfig, StationConfig, TrackConfig};

/// The default station: P1–P3, S1–S3, gate G1.
pub fn reference_profile() -> StationConfig {
    StationConfig {
        name: "reference".into(),
        ..StationConfig::default()
    }
}

/// `platforms` tracks, two signals per track, and a gate every 2 000 units.
pub fn large_profile(platforms: usize, gates: usize) -> StationConfig {
    let tracks: Vec<TrackConfig> = (1..=platforms)
        .map(|i| TrackConfig::new(format!("P{i}")))
        .collect();
    let signals = tracks
        .iter()
        .flat_map(|t| {
            ["A", "B"].map(|side| SignalConfig {
                id: format!("S{}{side}", t.id).into(),
                track: t.id.clone(),
            })
        })
        .collect();
    StationConfig {
        name: "terminus".into(),
        tracks,
        signals,
        gates: (0..gates)
            .map(|i| GateConfig {
                id: format!("G{}", i + 1).into(),
                location: 2_000.0 * i as f64,
            })
            .collect(),
        ..StationConfig::default()
    }
}

/// `count` trains spread deterministically along the line, clear of every
/// gate's default danger radius at the even positions.
pub fn train_feed(count: usize) -> Vec<Train> {
    (0..count)
        .map(|i| {
            // Offsets alternate between mid-span and near a crossing.
            let offset = if i % 2 == 0 { 1_000.0 } else { 150.0 };
            Train::new(format!("T{:03}", i + 1), 2_000.0 * (i / 2) as f64 + offset)
        })
        .collect()
}
