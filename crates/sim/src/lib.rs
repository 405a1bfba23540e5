pub mod command;
pub mod driver;
pub mod entity;
pub mod fixed;
pub mod hooks;
pub mod level;
mod physics;
pub mod pool;
pub mod rng;
pub mod scheduler;
pub mod state;
pub mod world;

pub use command::{Buttons, InputCommand};
pub use driver::run_tick;
pub use entity::{
    Entity, EntityFlags, KindId, KindInfo, ObjectFlags, RelationSlot, Relations, RELATION_SLOTS,
};
pub use fixed::{approx_dist, Angle, FVec3, Fixed, FRAC_BITS};
pub use hooks::{
    EffectId, EffectSink, HookOutcome, NoHooks, NullEffects, RecordingEffects, SimHooks,
};
pub use level::{ExtraLayer, LayerKind, LevelError, LevelMap, Sector, SectorFlags, Slope, SpawnPoint};
pub use pool::Handle;
pub use rng::SimRng;
pub use scheduler::{AmbientThinker, ThinkList};
pub use state::{set_player_state, set_state, ActionFn, PlayerAnim, SpriteTag, StateDef, StateId};
pub use world::{
    BehaviorFn, EntityView, FreeCamera, Player, PlayerThinkFn, SimulationWorld, SpawnError,
    WorldConfig, WorldPassFn,
};

/// Fixed simulation rate: ticks per second.
pub const TICRATE: u32 = 35;
