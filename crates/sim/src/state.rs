use tracing::warn;

use crate::pool::Handle;
use crate::world::SimulationWorld;

/// Index into the world's state table. `NULL` is the terminal identifier:
/// transitioning into it removes the entity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StateId(pub u16);

impl StateId {
    pub const NULL: StateId = StateId(0);

    pub fn is_null(self) -> bool {
        self == StateId::NULL
    }
}

/// Visual tag: which sprite sheet the presentation layer should show.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct SpriteTag(pub u16);

/// Action callback invoked on state entry. Actions may remove the entity,
/// spawn others, or call `set_state` recursively; every caller re-checks
/// liveness afterwards.
pub type ActionFn = fn(&mut SimulationWorld, Handle);

/// One immutable row of the state table.
#[derive(Debug, Clone, Copy)]
pub struct StateDef {
    pub sprite: SpriteTag,
    pub frame: u8,
    /// Duration in tics; 0 chains straight to `next`, negative never expires.
    pub tics: i32,
    pub action: Option<ActionFn>,
    pub next: StateId,
    pub var1: i32,
    pub var2: i32,
}

impl StateDef {
    pub const fn simple(sprite: SpriteTag, frame: u8, tics: i32, next: StateId) -> StateDef {
        StateDef {
            sprite,
            frame,
            tics,
            action: None,
            next,
            var1: 0,
            var2: 0,
        }
    }
}

/// Coarse animation category the presentation layer keys player sprites on.
/// Derived as a side effect of player state transitions and nowhere else.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PlayerAnim {
    #[default]
    Idle,
    Drive,
    Drift,
    Spin,
    Hurt,
    Dead,
}

/// Transition an entity to `state`, per the state-machine contract:
/// terminal id removes and reports not-alive; the entering state's action
/// runs immediately; zero-duration states chain within the call; a per-call
/// seen table breaks cycles with one diagnostic instead of hanging.
///
/// Returns whether the entity is still alive. Every call site must check.
pub fn set_state(world: &mut SimulationWorld, entity: Handle, state: StateId) -> bool {
    set_state_inner(world, entity, state, false)
}

/// Player-controlled variant: identical behavior, plus deriving the coarse
/// animation category for the presentation boundary.
pub fn set_player_state(world: &mut SimulationWorld, entity: Handle, state: StateId) -> bool {
    set_state_inner(world, entity, state, true)
}

fn set_state_inner(
    world: &mut SimulationWorld,
    entity: Handle,
    first: StateId,
    classify: bool,
) -> bool {
    let table_len = world.config().states.len();
    let mut seen = vec![false; table_len];
    let mut state = first;

    loop {
        if state.is_null() {
            world.remove(entity);
            return false;
        }

        let Some(def) = world.state_def(state) else {
            // Recoverable content error: unknown id leaves the entity in its
            // current state rather than corrupting the transition chain.
            warn!(state = state.0, "unknown_state_id");
            return world.is_live(entity);
        };

        let index = state.0 as usize;
        if seen[index] {
            // A zero-duration cycle; park the entity here instead of looping.
            warn!(state = state.0, "state_cycle_broken");
            if let Some(e) = world.entity_mut(entity) {
                e.state = state;
                e.tics = -1;
                e.sprite = def.sprite;
                e.frame = def.frame;
            }
            return world.is_live(entity);
        }
        seen[index] = true;

        let Some(e) = world.entity_mut(entity) else {
            return false;
        };
        e.state = state;
        e.tics = def.tics;
        e.sprite = def.sprite;
        e.frame = def.frame;

        if classify {
            let anim = (world.config().player_anim)(state);
            world.set_player_anim(entity, anim);
        }

        let vetoed = world.hook_state_entry(entity, state);
        if !world.is_live(entity) {
            return false;
        }
        if !vetoed {
            if let Some(action) = def.action {
                action(world, entity);
                if !world.is_live(entity) {
                    return false;
                }
            }
        }

        // The action may itself have transitioned; continue from whatever
        // state the entity actually holds now.
        let Some(e) = world.entity(entity) else {
            return false;
        };
        if e.tics != 0 {
            return true;
        }
        let current = e.state;
        state = match world.state_def(current) {
            Some(def) => def.next,
            None => StateId::NULL,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{KindId, KindInfo};
    use crate::fixed::{Angle, FVec3, Fixed};
    use crate::level::{LevelMap, Sector};
    use crate::world::WorldConfig;

    const SPR: SpriteTag = SpriteTag(1);

    fn action_spawn_marker(world: &mut SimulationWorld, _entity: Handle) {
        world.spawn(
            KindId(0),
            FVec3::new(Fixed::from_int(10), Fixed::from_int(10), Fixed::ZERO),
            Angle::ZERO,
        );
    }

    fn action_remove_self(world: &mut SimulationWorld, entity: Handle) {
        world.remove(entity);
    }

    fn test_states() -> Vec<StateDef> {
        vec![
            // 0: null placeholder, never entered
            StateDef::simple(SpriteTag(0), 0, -1, StateId::NULL),
            // 1: plain 5-tic state looping to itself
            StateDef::simple(SPR, 0, 5, StateId(1)),
            // 2 -> 3 -> 4: zero-duration chain ending in a timed state
            StateDef::simple(SPR, 1, 0, StateId(3)),
            StateDef::simple(SPR, 2, 0, StateId(4)),
            StateDef::simple(SPR, 3, 8, StateId(1)),
            // 5 <-> 6: zero-duration cycle
            StateDef::simple(SPR, 4, 0, StateId(6)),
            StateDef::simple(SPR, 5, 0, StateId(5)),
            // 7: action state that spawns a marker then rests
            StateDef {
                sprite: SPR,
                frame: 6,
                tics: 4,
                action: Some(action_spawn_marker),
                next: StateId(1),
                var1: 0,
                var2: 0,
            },
            // 8: action removes the entity mid-transition
            StateDef {
                sprite: SPR,
                frame: 7,
                tics: 4,
                action: Some(action_remove_self),
                next: StateId(1),
                var1: 0,
                var2: 0,
            },
            // 9: terminal hand-off
            StateDef::simple(SPR, 8, 0, StateId::NULL),
        ]
    }

    fn test_world() -> SimulationWorld {
        let kinds = vec![KindInfo {
            spawn_state: StateId(1),
            ..KindInfo::placeholder("marker")
        }];
        let level = LevelMap::flat(
            4,
            4,
            Fixed::from_int(64),
            Sector::room(Fixed::ZERO, Fixed::from_int(256)),
        );
        SimulationWorld::new(WorldConfig::minimal(test_states(), kinds, level), 1)
    }

    fn spawn_one(world: &mut SimulationWorld) -> Handle {
        world.spawn(
            KindId(0),
            FVec3::new(Fixed::from_int(32), Fixed::from_int(32), Fixed::ZERO),
            Angle::ZERO,
        )
    }

    #[test]
    fn set_state_applies_duration_and_visual_tag() {
        let mut world = test_world();
        let entity = spawn_one(&mut world);
        assert!(set_state(&mut world, entity, StateId(1)));
        let e = world.entity(entity).expect("entity");
        assert_eq!(e.state, StateId(1));
        assert_eq!(e.tics, 5);
        assert_eq!(e.sprite, SPR);
        assert_eq!(e.frame, 0);
    }

    #[test]
    fn null_state_removes_and_reports_not_alive() {
        let mut world = test_world();
        let entity = spawn_one(&mut world);
        assert!(!set_state(&mut world, entity, StateId::NULL));
        assert!(!world.is_live(entity));
    }

    #[test]
    fn zero_duration_states_chain_within_one_call() {
        let mut world = test_world();
        let entity = spawn_one(&mut world);
        assert!(set_state(&mut world, entity, StateId(2)));
        let e = world.entity(entity).expect("entity");
        assert_eq!(e.state, StateId(4));
        assert_eq!(e.tics, 8);
        assert_eq!(e.frame, 3);
    }

    #[test]
    fn zero_duration_chain_into_terminal_removes() {
        let mut world = test_world();
        let entity = spawn_one(&mut world);
        assert!(!set_state(&mut world, entity, StateId(9)));
        assert!(!world.is_live(entity));
    }

    #[test]
    fn zero_duration_cycle_terminates_and_parks() {
        let mut world = test_world();
        let entity = spawn_one(&mut world);
        // Must return rather than hang; the entity parks in the cycle.
        assert!(set_state(&mut world, entity, StateId(5)));
        let e = world.entity(entity).expect("entity");
        assert!(e.state == StateId(5) || e.state == StateId(6));
        assert_eq!(e.tics, -1);
    }

    #[test]
    fn self_looping_zero_state_is_also_cycle_guarded() {
        let mut world = test_world();
        let entity = spawn_one(&mut world);
        assert!(set_state(&mut world, entity, StateId(6)));
        assert_eq!(world.entity(entity).expect("entity").tics, -1);
    }

    #[test]
    fn entry_action_runs_immediately() {
        let mut world = test_world();
        let entity = spawn_one(&mut world);
        let before = world.live_entity_count();
        assert!(set_state(&mut world, entity, StateId(7)));
        assert_eq!(world.live_entity_count(), before + 1);
    }

    #[test]
    fn action_removing_the_entity_reports_not_alive() {
        let mut world = test_world();
        let entity = spawn_one(&mut world);
        assert!(!set_state(&mut world, entity, StateId(8)));
        assert!(!world.is_live(entity));
    }

    #[test]
    fn unknown_state_id_is_recoverable() {
        let mut world = test_world();
        let entity = spawn_one(&mut world);
        assert!(set_state(&mut world, entity, StateId(1)));
        assert!(set_state(&mut world, entity, StateId(999)));
        // Entity keeps its previous state.
        assert_eq!(world.entity(entity).expect("entity").state, StateId(1));
    }

    #[test]
    fn player_variant_matches_plain_variant_apart_from_anim() {
        let mut world = test_world();
        let plain = spawn_one(&mut world);
        let player = spawn_one(&mut world);
        world.add_player(player);

        assert!(set_state(&mut world, plain, StateId(2)));
        assert!(set_player_state(&mut world, player, StateId(2)));

        let plain_entity = world.entity(plain).expect("plain").clone();
        let player_entity = world.entity(player).expect("player").clone();
        assert_eq!(plain_entity.state, player_entity.state);
        assert_eq!(plain_entity.tics, player_entity.tics);
        assert_eq!(plain_entity.frame, player_entity.frame);
    }
}
