//! # nQuester Sim
//!
//! Headless entry point that plays one scripted nQuester session.
//!
//! The run:
//! - loads `SessionConfig` from `$NQUESTER_CONFIG` (or `nquester.toml`)
//! - registers random pass/fail minigame and boss providers
//! - walks the NPC roster on a fixed timestep while random events tick
//! - logs a JSON summary and optionally writes a snapshot to `$NQUESTER_SAVE`

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

mod script;
mod timing;

use anyhow::Result;
use nquester_gameplay::{Session, SessionConfig, CONFIG_FILE};
use script::{register_random_providers, Driver};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Chance a scripted minigame attempt passes.
const PASS_RATE: f32 = 0.7;

/// Main entry point.
fn main() -> Result<()> {
    let filter = EnvFilter::from_default_env().add_directive("nquester=info".parse()?);
    if std::env::var("NQUESTER_LOG_FORMAT").is_ok_and(|format| format == "json") {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer())
            .with(filter)
            .init();
    }

    info!("nQuester sim starting...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let config_path =
        std::env::var_os("NQUESTER_CONFIG").map_or_else(|| PathBuf::from(CONFIG_FILE), PathBuf::from);
    let config = SessionConfig::load_from(&config_path);
    let seed = config.rng_seed.unwrap_or_else(|| fastrand::u64(..));
    info!("Seed: {seed}");

    let mut session = Session::with_default_content(SessionConfig {
        rng_seed: Some(seed),
        ..config
    });
    register_random_providers(&mut session, seed, PASS_RATE);

    let mut driver = Driver::new(session);
    driver.play_roster()?;

    let summary = driver.summary();
    info!("Summary: {}", serde_json::to_string_pretty(&summary)?);

    if let Some(path) = std::env::var_os("NQUESTER_SAVE") {
        driver.session().snapshot().save_to(PathBuf::from(path))?;
    }

    info!("nQuester sim finished in {:?} mode", summary.mode);
    Ok(())
}
