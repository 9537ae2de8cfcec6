//! Walk one train through the default three-platform station.
//!
//! Run with `RUST_LOG=debug cargo run --example quickstart` to see the
//! verifier's decisions as they are made. Pass a config file path to load
//! a different station.

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use interlock_core::{Aspect, CommandMode, GatePosition, Train};
use interlock_engine::{ChannelSink, LogFilter, Station, StationConfig};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => StationConfig::load(path)?,
        None => StationConfig::default(),
    };

    let (sink, events) = ChannelSink::unbounded();
    let mut station = Station::new(&config)?
        .with_train_source(vec![
            Train::new("T001", 2_400.0).with_speed(-20.0),
            Train::new("T002", 350.0).with_speed(15.0),
        ])
        .with_audit_sink(sink);

    let p1 = config
        .tracks
        .first()
        .map(|t| t.id.clone())
        .ok_or_else(|| anyhow::anyhow!("station has no tracks"))?;
    let s1 = config
        .signals
        .iter()
        .find(|s| s.track == p1)
        .map(|s| s.id.clone());

    println!("{}", station.request_track_allocation_with_eta(p1.clone(), "T001", Some(120))?);
    if let Some(s1) = &s1 {
        let green = station.set_signal(s1.clone(), Aspect::Green, CommandMode::Verified)?;
        println!("{green}");
    }
    if let Some(gate) = config.gates.first() {
        // T002 is inside the danger radius; this is refused.
        println!(
            "{}",
            station.set_gate(gate.id.clone(), GatePosition::Open, CommandMode::Verified)?
        );
    }

    station.advance_clock(120);
    if let Some(s1) = &s1 {
        println!(
            "{}",
            station.set_signal(s1.clone(), Aspect::Red, CommandMode::Verified)?
        );
    }
    println!("{}", station.occupy_track(p1.clone())?);
    println!("{}", station.start_clearing(p1.clone())?);
    println!("{}", station.release_track(p1)?);
    println!("free tracks: {}", station.free_track_count());

    println!("\nverification log:");
    for record in station.verification_log(&LogFilter::all()) {
        println!("  {record}");
    }
    println!("\n{}", station.stats());
    println!("audit events delivered: {}", events.try_iter().count());

    let snapshot = serde_json::to_string_pretty(&station.resource_snapshot())?;
    println!("\n{snapshot}");
    Ok(())
}
