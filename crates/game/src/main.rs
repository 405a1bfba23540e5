use std::path::PathBuf;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use game::session;
use game::tuning;
use sim::TICRATE;

const SEED_ENV_VAR: &str = "OVERSPIN_SEED";
const TICKS_ENV_VAR: &str = "OVERSPIN_TICKS";
const PLAYERS_ENV_VAR: &str = "OVERSPIN_PLAYERS";
const TUNING_ENV_VAR: &str = "OVERSPIN_TUNING";

const DEFAULT_SEED: u32 = 0xC0FF_EE01;
const DEFAULT_TICKS: u64 = 60 * TICRATE as u64;
const DEFAULT_PLAYERS: usize = 2;
const MAX_PLAYERS: usize = 8;

fn main() {
    init_tracing();
    info!("=== Overspin Headless Session ===");

    let seed = env_or(SEED_ENV_VAR, DEFAULT_SEED);
    let ticks = env_or(TICKS_ENV_VAR, DEFAULT_TICKS);
    let players = env_or(PLAYERS_ENV_VAR, DEFAULT_PLAYERS).clamp(1, MAX_PLAYERS);

    let mut kind_table = game::kinds::kind_table();
    if let Ok(path) = std::env::var(TUNING_ENV_VAR) {
        tuning::apply_tuning_file(&mut kind_table, &PathBuf::from(path));
    }
    let mut world = session::build_world_with_kinds(seed, players, kind_table);

    info!(seed, ticks, players, "session_start");
    session::run_session(&mut world, ticks);
    info!(
        tick = world.current_tick(),
        entities = world.live_entity_count(),
        digest = %world.digest_hex(),
        "session_complete"
    );
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

fn env_or<T: std::str::FromStr + Copy>(var: &str, fallback: T) -> T {
    match std::env::var(var) {
        Ok(raw) => match raw.parse::<T>() {
            Ok(value) => value,
            Err(_) => {
                warn!(env_var = var, value = raw.as_str(), "invalid env var; using default");
                fallback
            }
        },
        Err(_) => fallback,
    }
}
