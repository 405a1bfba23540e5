use crate::command::InputCommand;
use crate::physics;
use crate::pool::Handle;
use crate::state::{self, StateId};
use crate::world::SimulationWorld;

/// One entity's scheduler execution: scale stepping, behavior dispatch,
/// horizontal then vertical physics, then the state duration countdown.
/// Liveness is re-checked after every stage that can trigger removal; a
/// frozen entity is skipped entirely (while its hit-lag window still ticks
/// down, or it would never thaw).
pub(crate) fn entity_think(world: &mut SimulationWorld, handle: Handle) {
    {
        let Some(entity) = world.entity_mut(handle) else {
            return;
        };
        if entity.hit_lag > 0 {
            entity.hit_lag -= 1;
        }
    }
    if world.entity_frozen(handle) {
        return;
    }

    if let Some(entity) = world.entity_mut(handle) {
        entity.step_scale();
    }

    let behavior = world.config().behavior;
    if !behavior(world, handle) || !world.is_live(handle) {
        return;
    }

    if !physics::xy_movement(world, handle) {
        return;
    }
    if !physics::z_movement(world, handle) {
        return;
    }

    let expired_state = {
        let Some(entity) = world.entity_mut(handle) else {
            return;
        };
        if entity.tics > 0 {
            entity.tics -= 1;
        }
        if entity.tics == 0 {
            Some(entity.state)
        } else {
            None
        }
    };
    if let Some(current) = expired_state {
        let next = world
            .state_def(current)
            .map(|def| def.next)
            .unwrap_or(StateId::NULL);
        let is_player = world
            .entity(handle)
            .map(|entity| entity.player.is_some())
            .unwrap_or(false);
        let alive = if is_player {
            state::set_player_state(world, handle, next)
        } else {
            state::set_state(world, handle, next)
        };
        let _ = alive;
    }
}

/// One fixed-rate tick, in macro-phase order:
/// 1. pre-think hooks,
/// 2. player think (consumes the captured commands),
/// 3. the scheduler pass over every list,
/// 4. post-think hooks and after-all-entities passes,
/// 5. ambient systems not modeled as scheduler nodes,
/// 6. the global tick counter,
/// 7. the interpolation snapshot.
///
/// A global pause suspends everything except camera-only movement.
pub fn run_tick(world: &mut SimulationWorld, commands: &[InputCommand]) {
    world.hook_pre_tick();

    // Commands land on their players and drive the free cameras. This is
    // the one piece of movement that survives a pause.
    for (index, cmd) in commands.iter().enumerate() {
        if let Some(player) = world.player_mut(index as u8) {
            player.cmd = *cmd;
            player.camera.apply(*cmd);
        }
    }
    if world.paused() {
        return;
    }

    // Previous transforms captured before anything moves; the presentation
    // boundary interpolates between these and the post-tick positions.
    for handle in world.entity_handles() {
        if let Some(entity) = world.entity_mut(handle) {
            entity.prev_pos = entity.pos;
        }
    }

    let player_think = world.config().player_think;
    let roster: Vec<(Handle, InputCommand)> = world
        .players()
        .iter()
        .map(|player| (player.entity, player.cmd))
        .collect();
    for (entity, cmd) in roster {
        if world.is_live(entity) && !world.entity_frozen(entity) {
            let _ = player_think(world, entity, cmd);
        }
    }

    world.run_scheduler_pass();

    world.hook_post_tick();
    if let Some(pass) = world.config().post_think {
        pass(world);
    }
    world.process_respawn_queue();
    world.tick_countdown();

    let ambient = world.config().ambient_systems.clone();
    for system in ambient {
        system(world);
    }

    world.advance_tick();
    world.rebuild_frame_views();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{KindId, KindInfo, ObjectFlags};
    use crate::fixed::{Angle, FVec3, Fixed};
    use crate::level::{LevelMap, Sector};
    use crate::state::{SpriteTag, StateDef};
    use crate::world::WorldConfig;

    fn counting_behavior(world: &mut SimulationWorld, handle: Handle) -> bool {
        if let Some(entity) = world.entity_mut(handle) {
            entity.extra1 += 1;
        }
        true
    }

    fn remove_self_after_two(world: &mut SimulationWorld, handle: Handle) -> bool {
        let count = {
            let Some(entity) = world.entity_mut(handle) else {
                return false;
            };
            entity.extra1 += 1;
            entity.extra1
        };
        if count >= 2 {
            world.remove(handle);
            return false;
        }
        true
    }

    fn test_states() -> Vec<StateDef> {
        vec![
            StateDef::simple(SpriteTag(0), 0, -1, StateId::NULL),
            StateDef::simple(SpriteTag(1), 0, -1, StateId(1)),
            // 2 -> 3 -> 2: a two-tic blinker
            StateDef::simple(SpriteTag(1), 0, 2, StateId(3)),
            StateDef::simple(SpriteTag(1), 1, 2, StateId(2)),
        ]
    }

    fn test_kinds() -> Vec<KindInfo> {
        vec![KindInfo {
            spawn_state: StateId(1),
            flags: ObjectFlags::NO_GRAVITY,
            ..KindInfo::placeholder("drone")
        }]
    }

    fn world_with_behavior(behavior: crate::world::BehaviorFn) -> SimulationWorld {
        let level = LevelMap::flat(
            8,
            8,
            Fixed::from_int(64),
            Sector::room(Fixed::ZERO, Fixed::from_int(512)),
        );
        let mut config = WorldConfig::minimal(test_states(), test_kinds(), level);
        config.behavior = behavior;
        SimulationWorld::new(config, 11)
    }

    fn spawn_drone(world: &mut SimulationWorld) -> Handle {
        world.spawn(
            KindId(0),
            FVec3::new(Fixed::from_int(100), Fixed::from_int(100), Fixed::ZERO),
            Angle::ZERO,
        )
    }

    #[test]
    fn tick_advances_counter_and_snapshots_views() {
        let mut world = world_with_behavior(counting_behavior);
        let handle = spawn_drone(&mut world);
        world.entity_mut(handle).expect("drone").momentum.x = Fixed::from_int(4);

        run_tick(&mut world, &[]);
        assert_eq!(world.current_tick(), 1);
        let views = world.frame_views();
        assert_eq!(views.len(), 1);
        // Previous and current positions straddle the move.
        assert_eq!(views[0].prev_pos.x, Fixed::from_int(100));
        assert!(views[0].pos.x > Fixed::from_int(100));
    }

    #[test]
    fn paused_tick_advances_no_entity_but_moves_the_camera() {
        let mut world = world_with_behavior(counting_behavior);
        let handle = spawn_drone(&mut world);
        world.entity_mut(handle).expect("drone").momentum.x = Fixed::from_int(4);
        world.add_player(handle);
        world.set_paused(true);

        let cmd = InputCommand {
            throttle: 64,
            ..InputCommand::neutral()
        };
        run_tick(&mut world, &[cmd]);

        assert_eq!(world.current_tick(), 0);
        let entity = world.entity(handle).expect("drone");
        assert_eq!(entity.pos.x, Fixed::from_int(100));
        assert_eq!(entity.extra1, 0);
        assert_eq!(entity.state, StateId(1));
        // Camera-only movement still ran.
        let camera = world.player(0).expect("player").camera;
        assert!(camera.pos.x > Fixed::ZERO);

        world.set_paused(false);
        run_tick(&mut world, &[InputCommand::neutral()]);
        assert_eq!(world.current_tick(), 1);
        assert!(world.entity(handle).expect("drone").pos.x > Fixed::from_int(100));
    }

    #[test]
    fn frozen_entity_is_walked_but_not_executed() {
        let mut world = world_with_behavior(counting_behavior);
        let frozen = spawn_drone(&mut world);
        let live = spawn_drone(&mut world);
        world.entity_mut(frozen).expect("frozen").frozen = true;

        run_tick(&mut world, &[]);
        run_tick(&mut world, &[]);

        assert_eq!(world.entity(frozen).expect("frozen").extra1, 0);
        assert_eq!(world.entity(live).expect("live").extra1, 2);
    }

    #[test]
    fn hit_lag_freezes_then_thaws() {
        let mut world = world_with_behavior(counting_behavior);
        let handle = spawn_drone(&mut world);
        world.entity_mut(handle).expect("drone").hit_lag = 2;

        run_tick(&mut world, &[]);
        run_tick(&mut world, &[]);
        assert_eq!(world.entity(handle).expect("drone").extra1, 0);

        run_tick(&mut world, &[]);
        assert_eq!(world.entity(handle).expect("drone").extra1, 1);
    }

    #[test]
    fn global_freeze_skips_execution_but_bookkeeping_continues() {
        let mut world = world_with_behavior(counting_behavior);
        let doomed = spawn_drone(&mut world);
        let watcher = spawn_drone(&mut world);
        world.set_global_freeze(true);
        world.remove(doomed);
        let allocated = world.allocated_slots();

        run_tick(&mut world, &[]);

        // Nobody executed, but the deferred removal was still processed.
        assert_eq!(world.entity(watcher).expect("watcher").extra1, 0);
        assert_eq!(world.allocated_slots(), allocated - 1);
    }

    #[test]
    fn removed_entity_never_executes_again() {
        let mut world = world_with_behavior(remove_self_after_two);
        let handle = spawn_drone(&mut world);

        run_tick(&mut world, &[]);
        assert_eq!(world.entity(handle).expect("drone").extra1, 1);

        run_tick(&mut world, &[]);
        // Removed itself on its second execution.
        assert!(!world.is_live(handle));

        let husk_count = world.husk(handle).map(|entity| entity.extra1);
        run_tick(&mut world, &[]);
        run_tick(&mut world, &[]);
        // The count never moved again (and the husk is gone entirely).
        assert!(husk_count == Some(2));
        assert!(world.husk(handle).is_none());
    }

    #[test]
    fn state_durations_count_down_and_transition() {
        let mut world = world_with_behavior(counting_behavior);
        let handle = spawn_drone(&mut world);
        assert!(state::set_state(&mut world, handle, StateId(2)));
        assert_eq!(world.entity(handle).expect("drone").tics, 2);

        run_tick(&mut world, &[]);
        assert_eq!(world.entity(handle).expect("drone").state, StateId(2));
        run_tick(&mut world, &[]);
        assert_eq!(world.entity(handle).expect("drone").state, StateId(3));
        run_tick(&mut world, &[]);
        run_tick(&mut world, &[]);
        assert_eq!(world.entity(handle).expect("drone").state, StateId(2));
    }

    #[test]
    fn identical_runs_produce_identical_digests() {
        let build = || {
            let mut world = world_with_behavior(counting_behavior);
            let a = spawn_drone(&mut world);
            let b = spawn_drone(&mut world);
            world
                .entity_mut(a)
                .expect("a")
                .momentum = FVec3::new(Fixed::from_int(3), Fixed::from_int(1), Fixed::ZERO);
            world.entity_mut(b).expect("b").momentum.y = Fixed::from_int(-2);
            world.add_player(a);
            world
        };
        let mut first = build();
        let mut second = build();
        let cmd = InputCommand {
            throttle: 50,
            steer: -10,
            ..InputCommand::neutral()
        };
        for tick in 0..50 {
            run_tick(&mut first, &[cmd]);
            run_tick(&mut second, &[cmd]);
            assert_eq!(first.digest(), second.digest(), "diverged at tick {tick}");
        }
    }

    #[test]
    fn player_think_runs_before_scheduler_pass() {
        fn mark_player(world: &mut SimulationWorld, handle: Handle, _cmd: InputCommand) -> bool {
            if let Some(entity) = world.entity_mut(handle) {
                // Behavior later doubles; order proves player think ran first.
                entity.extra2 = 1;
            }
            true
        }
        fn doubling_behavior(world: &mut SimulationWorld, handle: Handle) -> bool {
            if let Some(entity) = world.entity_mut(handle) {
                entity.extra2 *= 2;
            }
            true
        }
        let level = LevelMap::flat(
            8,
            8,
            Fixed::from_int(64),
            Sector::room(Fixed::ZERO, Fixed::from_int(512)),
        );
        let mut config = WorldConfig::minimal(test_states(), test_kinds(), level);
        config.behavior = doubling_behavior;
        config.player_think = mark_player;
        let mut world = SimulationWorld::new(config, 3);
        let handle = spawn_drone(&mut world);
        world.add_player(handle);

        run_tick(&mut world, &[InputCommand::neutral()]);
        assert_eq!(world.entity(handle).expect("drone").extra2, 2);
    }
}
