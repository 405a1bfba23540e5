use super::*;
use crate::session;
use sim::{InputCommand, RecordingEffects, SimulationWorld};

fn neutral_ticks(world: &mut SimulationWorld, ticks: u32) {
    let commands: Vec<InputCommand> = world
        .players()
        .iter()
        .map(|_| InputCommand::neutral())
        .collect();
    for _ in 0..ticks {
        sim::run_tick(world, &commands);
    }
}

fn count_kind(world: &SimulationWorld, kind: KindId) -> usize {
    world
        .entity_handles()
        .iter()
        .filter(|handle| {
            world
                .entity(**handle)
                .map(|entity| entity.kind == kind)
                .unwrap_or(false)
        })
        .count()
}

fn find_kind(world: &SimulationWorld, kind: KindId) -> Option<Handle> {
    world.entity_handles().into_iter().find(|handle| {
        world
            .entity(*handle)
            .map(|entity| entity.kind == kind)
            .unwrap_or(false)
    })
}

fn spawn_shell_moving(
    world: &mut SimulationWorld,
    x: i32,
    y: i32,
    z: i32,
    momentum: FVec3,
) -> Handle {
    let shell = world.spawn(
        kinds::GREEN_SHELL,
        FVec3::new(Fixed::from_int(x), Fixed::from_int(y), Fixed::from_int(z)),
        Angle::ZERO,
    );
    if let Some(entity) = world.entity_mut(shell) {
        entity.momentum = momentum;
        entity.fuse = 10_000;
    }
    shell
}

#[test]
fn missile_against_arena_wall_detonates_with_explosion() {
    let mut world = session::build_world(3, 1);
    let effects = RecordingEffects::new();
    world.set_effect_sink(Box::new(effects.clone()));
    let before = count_kind(&world, kinds::EXPLOSION);
    let shell = spawn_shell_moving(
        &mut world,
        90,
        640,
        8,
        FVec3::new(Fixed::from_int(-48), Fixed::ZERO, Fixed::ZERO),
    );

    neutral_ticks(&mut world, 3);

    assert!(!world.is_live(shell));
    assert!(count_kind(&world, kinds::EXPLOSION) > before);
    assert!(effects.count_of(FX_BOOM) > 0);
}

#[test]
fn sky_exposed_missile_vanishes_without_explosion() {
    let mut world = session::build_world(3, 1);
    let effects = RecordingEffects::new();
    world.set_effect_sink(Box::new(effects.clone()));
    // Under the sky strip: ceiling 256 opens to sky.
    let shell = spawn_shell_moving(
        &mut world,
        200,
        860,
        180,
        FVec3::new(Fixed::ZERO, Fixed::ZERO, Fixed::from_int(60)),
    );

    neutral_ticks(&mut world, 3);

    assert!(!world.is_live(shell));
    assert_eq!(count_kind(&world, kinds::EXPLOSION), 0);
    assert_eq!(effects.count_of(FX_BOOM), 0);
}

#[test]
fn shell_fuse_expiry_detonates_in_place() {
    let mut world = session::build_world(3, 1);
    let shell = spawn_shell_moving(&mut world, 640, 640, 8, FVec3::ZERO);
    if let Some(entity) = world.entity_mut(shell) {
        entity.fuse = 3;
    }
    neutral_ticks(&mut world, 4);
    assert!(!world.is_live(shell));
    assert!(count_kind(&world, kinds::EXPLOSION) > 0);
}

#[test]
fn item_box_pops_on_contact_and_queues_its_respawn() {
    let mut world = session::build_world(3, 1);
    let box_handle = find_kind(&world, kinds::ITEM_BOX).expect("item box");
    let kart = world.players()[0].entity;
    let box_pos = world.entity(box_handle).expect("box").pos;
    if let Some(entity) = world.entity_mut(kart) {
        entity.pos = box_pos;
    }
    let boxes_before = count_kind(&world, kinds::ITEM_BOX);
    let queued_before = world.respawn_queue_len();

    neutral_ticks(&mut world, 12);

    assert!(count_kind(&world, kinds::ITEM_BOX) < boxes_before);
    assert!(world.respawn_queue_len() > queued_before);
    assert!(!world.is_live(box_handle));

    // Clear the landing spot, then the queued descriptor brings the box
    // back after its delay.
    if let Some(entity) = world.entity_mut(kart) {
        entity.pos.x = Fixed::from_int(160);
        entity.pos.y = Fixed::from_int(160);
    }
    neutral_ticks(&mut world, ITEM_BOX_RESPAWN_TICS + 4);
    assert_eq!(count_kind(&world, kinds::ITEM_BOX), boxes_before);
}

#[test]
fn banana_spins_out_the_kart_and_is_consumed() {
    let mut world = session::build_world(3, 1);
    let effects = RecordingEffects::new();
    world.set_effect_sink(Box::new(effects.clone()));
    let banana = find_kind(&world, kinds::BANANA).expect("banana");
    let kart = world.players()[0].entity;
    let banana_pos = world.entity(banana).expect("banana").pos;
    if let Some(entity) = world.entity_mut(kart) {
        entity.pos = banana_pos;
        entity.momentum.x = Fixed::from_int(12);
    }

    neutral_ticks(&mut world, 2);

    assert!(!world.is_live(banana));
    let state = world.entity(kart).expect("kart").state;
    assert!(matches!(
        state,
        states::S_KART_SPIN1 | states::S_KART_SPIN2 | states::S_KART_SPIN3 | states::S_KART_SPIN4
    ));
    assert!(effects.count_of(FX_SPIN) > 0);
    assert_eq!(world.players()[0].anim, sim::PlayerAnim::Spin);
}

#[test]
fn spring_launches_the_kart() {
    let mut world = session::build_world(3, 1);
    let spring = find_kind(&world, kinds::SPRING).expect("spring");
    let kart = world.players()[0].entity;
    let spring_pos = world.entity(spring).expect("spring").pos;
    if let Some(entity) = world.entity_mut(kart) {
        entity.pos = spring_pos;
    }

    neutral_ticks(&mut world, 1);

    let entity = world.entity(kart).expect("kart");
    assert!(entity.momentum.z > Fixed::ZERO);
    assert_eq!(
        world.entity(spring).expect("spring").state,
        states::S_SPRING_BOUNCE1
    );
}

#[test]
fn checkpoint_latches_one_lap_per_crossing() {
    let mut world = session::build_world(3, 1);
    let checkpoint = find_kind(&world, kinds::CHECKPOINT).expect("checkpoint");
    let kart = world.players()[0].entity;
    let checkpoint_pos = world.entity(checkpoint).expect("checkpoint").pos;

    if let Some(entity) = world.entity_mut(kart) {
        entity.pos = checkpoint_pos;
    }
    neutral_ticks(&mut world, 5);
    assert_eq!(world.players()[0].laps, 1);

    // Still inside: no double count.
    neutral_ticks(&mut world, 5);
    assert_eq!(world.players()[0].laps, 1);

    // Leave and re-enter: second lap.
    if let Some(entity) = world.entity_mut(kart) {
        entity.pos.x = checkpoint_pos.x + Fixed::from_int(200);
    }
    neutral_ticks(&mut world, 2);
    if let Some(entity) = world.entity_mut(kart) {
        entity.pos = checkpoint_pos;
    }
    neutral_ticks(&mut world, 2);
    assert_eq!(world.players()[0].laps, 2);
}

#[test]
fn boss_core_acquires_and_pins_a_target() {
    let mut world = session::build_world(3, 1);
    let core = find_kind(&world, kinds::BOSS_CORE).expect("core");
    let kart = world.players()[0].entity;

    neutral_ticks(&mut world, 2);

    assert_eq!(world.relation(core, RelationSlot::Target), Some(kart));
    assert!(world.ref_count(kart) > 0);
}

#[test]
fn boss_turrets_orbit_their_core() {
    let mut world = session::build_world(3, 1);
    let core = find_kind(&world, kinds::BOSS_CORE).expect("core");

    neutral_ticks(&mut world, 20);

    let core_pos = world.entity(core).expect("core").pos;
    for handle in world.entity_handles() {
        let Some(entity) = world.entity(handle) else {
            continue;
        };
        if entity.kind != kinds::BOSS_TURRET {
            continue;
        }
        let dist = approx_dist(entity.pos.x - core_pos.x, entity.pos.y - core_pos.y);
        assert!(
            dist < TURRET_ORBIT_RADIUS + Fixed::from_int(48),
            "turret strayed to {dist}"
        );
    }
}

#[test]
fn turrets_do_not_outlive_their_core() {
    let mut world = session::build_world(3, 1);
    let core = find_kind(&world, kinds::BOSS_CORE).expect("core");
    world.remove(core);

    neutral_ticks(&mut world, 3);

    assert_eq!(count_kind(&world, kinds::BOSS_TURRET), 0);
}

#[test]
fn boss_death_plays_out_through_the_state_table() {
    let mut world = session::build_world(3, 1);
    let core = find_kind(&world, kinds::BOSS_CORE).expect("core");
    let _ = world.damage(core, Handle::NULL, 1_000);

    let state = world.entity(core).expect("core").state;
    assert!(matches!(
        state,
        states::S_BOSS_DIE1 | states::S_BOSS_DIE2 | states::S_BOSS_DIE3
    ));
    assert!(count_kind(&world, kinds::EXPLOSION) > 0);

    // The death chain finishes in the terminal state and the carcass goes
    // back to the pool.
    neutral_ticks(&mut world, 40);
    assert!(!world.is_live(core));
}

#[test]
fn dead_player_kart_revives_at_its_grid_slot() {
    let mut world = session::build_world(3, 1);
    let kart = world.players()[0].entity;
    let home = (
        world.entity(kart).expect("kart").extra1,
        world.entity(kart).expect("kart").extra2,
    );
    if let Some(entity) = world.entity_mut(kart) {
        entity.pos.x = Fixed::from_int(600);
        entity.pos.y = Fixed::from_int(600);
    }
    let _ = world.damage(kart, Handle::NULL, 1_000);
    assert_eq!(world.entity(kart).expect("kart").state, states::S_KART_DEAD);

    neutral_ticks(&mut world, DEATH_LINGER_TICS as u32 + 8);

    let entity = world.entity(kart).expect("kart");
    assert!(entity.health > 0);
    assert_eq!(entity.pos.x, Fixed::from_int(home.0));
    assert_eq!(entity.pos.y, Fixed::from_int(home.1));
    assert_eq!(entity.state, states::S_KART_IDLE);
}

#[test]
fn kart_bottoming_out_in_the_pit_dies_and_revives() {
    let mut world = session::build_world(3, 1);
    let kart = world.players()[0].entity;
    // Drop the kart into the lethal pit patch.
    if let Some(entity) = world.entity_mut(kart) {
        entity.pos.x = Fixed::from_int(800);
        entity.pos.y = Fixed::from_int(800);
        entity.pos.z = Fixed::from_int(32);
    }

    neutral_ticks(&mut world, 16);
    assert!(world.is_live(kart), "pit exemption keeps the roster entity");
    assert!(world.entity(kart).expect("kart").health <= 0);

    neutral_ticks(&mut world, DEATH_LINGER_TICS as u32 + 8);
    let entity = world.entity(kart).expect("kart");
    assert!(entity.health > 0);
    assert_eq!(entity.pos.x, Fixed::from_int(entity.extra1));
}

#[test]
fn crate_takes_momentum_from_a_shoving_kart() {
    let mut world = session::build_world(3, 1);
    let crate_handle = find_kind(&world, kinds::CRATE).expect("crate");
    let kart = world.players()[0].entity;
    let crate_pos = world.entity(crate_handle).expect("crate").pos;
    if let Some(entity) = world.entity_mut(kart) {
        entity.pos.x = crate_pos.x - Fixed::from_int(20);
        entity.pos.y = crate_pos.y;
        entity.momentum.x = Fixed::from_int(10);
    }

    neutral_ticks(&mut world, 2);

    assert!(world.entity(crate_handle).expect("crate").momentum.x > Fixed::ZERO);
}

#[test]
fn broken_crate_pops_into_smoke() {
    let mut world = session::build_world(3, 1);
    let crate_handle = find_kind(&world, kinds::CRATE).expect("crate");
    let _ = world.damage(crate_handle, Handle::NULL, 100);

    neutral_ticks(&mut world, 2);

    assert!(!world.is_live(crate_handle));
    assert!(count_kind(&world, kinds::SMOKE) > 0);
}

#[test]
fn red_shell_homes_toward_a_kart() {
    let mut world = session::build_world(3, 1);
    let kart = world.players()[0].entity;
    let kart_pos = world.entity(kart).expect("kart").pos;
    let shell = world.spawn(
        kinds::RED_SHELL,
        FVec3::new(
            kart_pos.x + Fixed::from_int(300),
            kart_pos.y,
            kart_pos.z + Fixed::from_int(8),
        ),
        Angle::ZERO,
    );
    if let Some(entity) = world.entity_mut(shell) {
        entity.fuse = 10_000;
    }

    neutral_ticks(&mut world, 2);
    assert_eq!(world.relation(shell, RelationSlot::Tracer), Some(kart));

    let before = world.entity(shell).expect("shell").pos;
    neutral_ticks(&mut world, 10);
    match world.entity(shell) {
        Some(entity) => {
            // Still flying: it must have closed the gap.
            let gap_before = (before.x - kart_pos.x).abs();
            let gap_after = (entity.pos.x - kart_pos.x).abs();
            assert!(gap_after < gap_before);
        }
        None => {
            // Already connected: the hit spun the kart.
            assert!(world.entity(kart).expect("kart").hit_lag > 0 || count_kind(&world, kinds::EXPLOSION) > 0);
        }
    }
}

#[test]
fn blast_spins_out_karts_in_range() {
    let mut world = session::build_world(3, 1);
    let kart = world.players()[0].entity;
    let kart_pos = world.entity(kart).expect("kart").pos;
    let _ = world.spawn(kinds::EXPLOSION, kart_pos, Angle::ZERO);

    // The blast frame is the explosion's second state.
    neutral_ticks(&mut world, 8);

    let state = world.entity(kart).expect("kart").state;
    assert!(matches!(
        state,
        states::S_KART_SPIN1 | states::S_KART_SPIN2 | states::S_KART_SPIN3 | states::S_KART_SPIN4
    ));
}

#[test]
fn removal_timelines_are_identical_across_runs() {
    let run = || {
        let mut world = session::build_world(41, 2);
        let mut timeline = Vec::new();
        for tick in 0..400u64 {
            let commands: Vec<InputCommand> = (0..2)
                .map(|player| session::scripted_command(tick, player))
                .collect();
            sim::run_tick(&mut world, &commands);
            timeline.push((tick, world.live_entity_count(), world.allocated_slots()));
        }
        (timeline, world.digest_hex())
    };
    let (first_timeline, first_digest) = run();
    let (second_timeline, second_digest) = run();
    assert_eq!(first_timeline, second_timeline);
    assert_eq!(first_digest, second_digest);
}
