use sim::{
    Angle, Buttons, ExtraLayer, FVec3, Fixed, InputCommand, LayerKind, LevelMap, RelationSlot,
    Sector, SectorFlags, SimulationWorld, Slope, ThinkList, WorldConfig,
};
use tracing::info;

use crate::ambient::{self, OverlayDrifter};
use crate::behavior;
use crate::kinds;
use crate::player;
use crate::states;

const CELL: Fixed = Fixed::from_int(64);
const GRID: u32 = 16;

const SECTOR_ROAD: u16 = 0;
const SECTOR_WALL: u16 = 1;
const SECTOR_WATER: u16 = 2;
const SECTOR_PIT: u16 = 3;
const SECTOR_RAMP: u16 = 4;
const SECTOR_SKY: u16 = 5;
const SECTOR_PLATFORM: u16 = 6;

/// The built-in demo track: a walled 1024x1024 arena with a water pool, a
/// lethal pit, a ramp, a sky strip, and a stacked platform. In production
/// the map-data component hands the driver one of these; the demo builds
/// its own.
pub fn demo_level() -> LevelMap {
    let road = Sector::room(Fixed::ZERO, Fixed::from_int(512));
    let wall = Sector::room(Fixed::ZERO, Fixed::ZERO);
    let water = Sector {
        flags: SectorFlags::LIQUID,
        ..Sector::room(Fixed::ZERO, Fixed::from_int(512))
    };
    let pit = Sector {
        flags: SectorFlags::LETHAL_PIT,
        ..Sector::room(Fixed::ZERO, Fixed::from_int(512))
    };
    let ramp = Sector {
        floor_slope: Some(Slope {
            z_origin: Fixed::from_int(-160),
            dzdx: Fixed::from_raw(16_384), // 1/4
            dzdy: Fixed::ZERO,
        }),
        ..Sector::room(Fixed::ZERO, Fixed::from_int(512))
    };
    let sky = Sector {
        flags: SectorFlags::SKY_CEILING,
        ..Sector::room(Fixed::ZERO, Fixed::from_int(256))
    };
    let platform = Sector {
        layers: vec![ExtraLayer {
            bottom: Fixed::from_int(56),
            top: Fixed::from_int(64),
            kind: LayerKind::Solid,
        }],
        ..Sector::room(Fixed::ZERO, Fixed::from_int(512))
    };

    let mut cells = vec![SECTOR_ROAD; (GRID * GRID) as usize];
    let mut set = |x: u32, y: u32, sector: u16| {
        cells[(y * GRID + x) as usize] = sector;
    };
    for i in 0..GRID {
        set(i, 0, SECTOR_WALL);
        set(i, GRID - 1, SECTOR_WALL);
        set(0, i, SECTOR_WALL);
        set(GRID - 1, i, SECTOR_WALL);
    }
    for y in 3..=4 {
        for x in 3..=4 {
            set(x, y, SECTOR_WATER);
        }
    }
    for y in 12..=13 {
        for x in 12..=13 {
            set(x, y, SECTOR_PIT);
        }
    }
    for y in 2..=5 {
        set(10, y, SECTOR_RAMP);
    }
    for x in 2..=6 {
        set(x, 13, SECTOR_SKY);
    }
    set(7, 7, SECTOR_PLATFORM);

    LevelMap::new(
        GRID,
        GRID,
        CELL,
        Fixed::ZERO,
        Fixed::ZERO,
        cells,
        vec![road, wall, water, pit, ramp, sky, platform],
        LevelMap::DEFAULT_GRAVITY,
    )
    .expect("demo level shape is valid by construction")
}

/// Wire the content tables and strategies into a kernel configuration.
pub fn build_config(kind_table: Vec<sim::KindInfo>) -> WorldConfig {
    WorldConfig {
        states: states::state_table(),
        kinds: kind_table,
        level: demo_level(),
        behavior: behavior::run_entity,
        player_think: player::player_think,
        player_anim: states::player_anim_for,
        ambient_systems: vec![ambient::precipitation_system],
        post_think: Some(ambient::rank_pass),
        splash_kind: Some(kinds::SPLASH),
        fallback_kind: kinds::UNKNOWN,
        max_entities: 2_048,
    }
}

/// Build a ready-to-tick world: karts on the grid, props on the track, the
/// boss composite, and the overlay's ambient node.
pub fn build_world(seed: u32, player_count: usize) -> SimulationWorld {
    build_world_with_kinds(seed, player_count, kinds::kind_table())
}

/// Same, over an already-tuned kind table.
pub fn build_world_with_kinds(
    seed: u32,
    player_count: usize,
    kind_table: Vec<sim::KindInfo>,
) -> SimulationWorld {
    let mut world = SimulationWorld::new(build_config(kind_table), seed);

    for index in 0..player_count {
        let x = 160 + 48 * index as i32;
        let y = 160;
        let kart = world.spawn_on_floor(
            kinds::KART,
            Fixed::from_int(x),
            Fixed::from_int(y),
            Angle::from_degrees(45),
        );
        if let Some(entity) = world.entity_mut(kart) {
            entity.extra1 = x;
            entity.extra2 = y;
        }
        world.add_player(kart);
    }

    for index in 0..3i32 {
        let _ = world.spawn(
            kinds::ITEM_BOX,
            FVec3::new(
                Fixed::from_int(320 + 64 * index),
                Fixed::from_int(320),
                Fixed::from_int(24),
            ),
            Angle::ZERO,
        );
    }
    for (x, y) in [(500, 200), (520, 260)] {
        let _ = world.spawn_on_floor(kinds::CONE, Fixed::from_int(x), Fixed::from_int(y), Angle::ZERO);
    }
    let _ = world.spawn_on_floor(
        kinds::CRATE,
        Fixed::from_int(600),
        Fixed::from_int(400),
        Angle::ZERO,
    );
    let _ = world.spawn_on_floor(
        kinds::SPRING,
        Fixed::from_int(700),
        Fixed::from_int(420),
        Angle::ZERO,
    );
    let _ = world.spawn_on_floor(
        kinds::BANANA,
        Fixed::from_int(400),
        Fixed::from_int(500),
        Angle::ZERO,
    );
    let _ = world.spawn_on_floor(
        kinds::CHECKPOINT,
        Fixed::from_int(160),
        Fixed::from_int(280),
        Angle::ZERO,
    );

    // Boss composite in the far corner: parts spawn after the core, so list
    // order guarantees they think after it.
    let core = world.spawn(
        kinds::BOSS_CORE,
        FVec3::new(Fixed::from_int(832), Fixed::from_int(192), Fixed::from_int(64)),
        Angle::from_degrees(180),
    );
    for (slot, phase) in [(0i32, 0), (1, 128)] {
        let turret = world.spawn(
            kinds::BOSS_TURRET,
            FVec3::new(
                Fixed::from_int(832 + 56 * (1 - 2 * slot)),
                Fixed::from_int(192),
                Fixed::from_int(88),
            ),
            Angle::ZERO,
        );
        world.set_relation(turret, RelationSlot::ChainPrev, Some(core));
        if let Some(entity) = world.entity_mut(turret) {
            entity.extra1 = phase;
        }
    }

    let overlay = world.spawn(
        kinds::OVERLAY,
        FVec3::new(Fixed::from_int(160), Fixed::from_int(160), Fixed::from_int(96)),
        Angle::ZERO,
    );
    world.add_ambient(ThinkList::Ambient, Box::new(OverlayDrifter { overlay }));

    info!(
        seed,
        players = player_count,
        entities = world.live_entity_count(),
        "world_built"
    );
    world
}

/// Deterministic demo input: everyone accelerates, weaving and drifting on
/// a fixed cadence, with an occasional shell from the lead player.
pub fn scripted_command(tick: u64, player: usize) -> InputCommand {
    let phase = (tick / 64 + player as u64) % 4;
    let steer = match phase {
        0 => 0,
        1 => -60,
        2 => 0,
        _ => 60,
    };
    let mut buttons = Buttons::ACCELERATE;
    if phase == 3 {
        buttons |= Buttons::DRIFT;
    }
    if player == 0 && tick % 280 == 140 {
        buttons |= Buttons::ITEM;
    }
    InputCommand {
        throttle: 0,
        steer,
        aim: 0,
        buttons,
    }
}

/// Run a scripted session to completion.
pub fn run_session(world: &mut SimulationWorld, ticks: u64) {
    for _ in 0..ticks {
        let tick = world.current_tick();
        let commands: Vec<InputCommand> = (0..world.players().len())
            .map(|player| scripted_command(tick, player))
            .collect();
        sim::run_tick(world, &commands);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_level_places_special_sectors() {
        let level = demo_level();
        assert!(level
            .sector_at(Fixed::from_int(224), Fixed::from_int(224))
            .flags
            .contains(SectorFlags::LIQUID));
        assert!(level
            .sector_at(Fixed::from_int(800), Fixed::from_int(800))
            .flags
            .contains(SectorFlags::LETHAL_PIT));
        assert!(level
            .sector_at(Fixed::from_int(200), Fixed::from_int(870))
            .flags
            .contains(SectorFlags::SKY_CEILING));
        assert!(level
            .sector_at(Fixed::from_int(672), Fixed::from_int(200))
            .floor_slope
            .is_some());
    }

    #[test]
    fn build_world_populates_the_grid() {
        let world = build_world(1, 2);
        assert_eq!(world.players().len(), 2);
        let count_kind = |kind| {
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
        };
        assert_eq!(count_kind(kinds::KART), 2);
        assert_eq!(count_kind(kinds::ITEM_BOX), 3);
        assert_eq!(count_kind(kinds::BOSS_CORE), 1);
        assert_eq!(count_kind(kinds::BOSS_TURRET), 2);
        assert_eq!(count_kind(kinds::OVERLAY), 1);
    }

    #[test]
    fn scripted_sessions_are_deterministic() {
        let mut first = build_world(77, 2);
        let mut second = build_world(77, 2);
        run_session(&mut first, 300);
        run_session(&mut second, 300);
        assert_eq!(first.digest_hex(), second.digest_hex());
    }

    #[test]
    fn different_seeds_diverge() {
        let mut first = build_world(1, 2);
        let mut second = build_world(2, 2);
        run_session(&mut first, 300);
        run_session(&mut second, 300);
        assert_ne!(first.digest_hex(), second.digest_hex());
    }

    #[test]
    fn long_session_survives_without_leaking_slots() {
        let mut world = build_world(123, 2);
        run_session(&mut world, 1_000);
        // Population stays bounded: effects expire, drops recycle.
        assert!(world.allocated_slots() < 500);
        assert!(world.live_entity_count() > 0);
    }
}
