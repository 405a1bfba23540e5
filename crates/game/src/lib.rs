pub mod ambient;
pub mod behavior;
pub mod kinds;
pub mod player;
pub mod session;
pub mod states;
pub mod tuning;

pub use session::{
    build_config, build_world, build_world_with_kinds, demo_level, run_session, scripted_command,
};
