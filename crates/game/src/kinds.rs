use sim::{Fixed, KindId, KindInfo, ObjectFlags, StateId};

use crate::states;

// Closed kind set. Indices are the KindId values; the table below must stay
// in this order.
pub const UNKNOWN: KindId = KindId(0);
pub const KART: KindId = KindId(1);
pub const ITEM_BOX: KindId = KindId(2);
pub const GREEN_SHELL: KindId = KindId(3);
pub const RED_SHELL: KindId = KindId(4);
pub const BANANA: KindId = KindId(5);
pub const EXPLOSION: KindId = KindId(6);
pub const SPLASH: KindId = KindId(7);
pub const DRIFT_SPARK: KindId = KindId(8);
pub const SMOKE: KindId = KindId(9);
pub const BOSS_CORE: KindId = KindId(10);
pub const BOSS_TURRET: KindId = KindId(11);
pub const CRATE: KindId = KindId(12);
pub const CONE: KindId = KindId(13);
pub const SPRING: KindId = KindId(14);
pub const RAIN_DROP: KindId = KindId(15);
pub const CHECKPOINT: KindId = KindId(16);
pub const OVERLAY: KindId = KindId(17);

pub const KIND_COUNT: usize = 18;

/// Category defaults for every kind, in `KindId` order. Numeric fields may
/// be adjusted afterwards by the tuning file; flags and state wiring may
/// not.
pub fn kind_table() -> Vec<KindInfo> {
    let table = vec![
        KindInfo::placeholder("unknown"),
        KindInfo {
            name: "kart",
            spawn_state: states::S_KART_IDLE,
            death_state: states::S_KART_DEAD,
            spawn_health: 12,
            radius: Fixed::from_int(16),
            height: Fixed::from_int(32),
            speed: Fixed::from_int(28),
            damage: 0,
            flags: ObjectFlags::SOLID
                | ObjectFlags::SHOOTABLE
                | ObjectFlags::WALL_KICK
                | ObjectFlags::PIT_IMMUNE,
            gravity_factor: Fixed::ONE,
            death_kind: None,
        },
        KindInfo {
            name: "item_box",
            spawn_state: states::S_ITEM_BOX_SPIN1,
            death_state: states::S_ITEM_BOX_POP,
            spawn_health: 1,
            radius: Fixed::from_int(12),
            height: Fixed::from_int(24),
            speed: Fixed::ZERO,
            damage: 0,
            flags: ObjectFlags::SHOOTABLE | ObjectFlags::NO_GRAVITY,
            gravity_factor: Fixed::ONE,
            death_kind: None,
        },
        KindInfo {
            name: "green_shell",
            spawn_state: states::S_GREEN_SHELL_SPIN1,
            death_state: StateId::NULL,
            spawn_health: 1,
            radius: Fixed::from_int(8),
            height: Fixed::from_int(12),
            speed: Fixed::from_int(32),
            damage: 2,
            flags: ObjectFlags::MISSILE | ObjectFlags::NO_GRAVITY,
            gravity_factor: Fixed::ONE,
            death_kind: Some(EXPLOSION),
        },
        KindInfo {
            name: "red_shell",
            spawn_state: states::S_RED_SHELL_SPIN1,
            death_state: StateId::NULL,
            spawn_health: 1,
            radius: Fixed::from_int(8),
            height: Fixed::from_int(12),
            speed: Fixed::from_int(26),
            damage: 2,
            flags: ObjectFlags::MISSILE | ObjectFlags::NO_GRAVITY,
            gravity_factor: Fixed::ONE,
            death_kind: Some(EXPLOSION),
        },
        KindInfo {
            name: "banana",
            spawn_state: states::S_BANANA,
            death_state: StateId::NULL,
            spawn_health: 1,
            radius: Fixed::from_int(10),
            height: Fixed::from_int(8),
            speed: Fixed::ZERO,
            damage: 1,
            flags: ObjectFlags::SHOOTABLE,
            gravity_factor: Fixed::ONE,
            death_kind: None,
        },
        KindInfo {
            name: "explosion",
            spawn_state: states::S_EXPLOSION1,
            death_state: StateId::NULL,
            spawn_health: 1,
            radius: Fixed::from_int(16),
            height: Fixed::from_int(32),
            speed: Fixed::ZERO,
            damage: 1,
            flags: ObjectFlags::SCENERY | ObjectFlags::NO_GRAVITY | ObjectFlags::NO_CLIP,
            gravity_factor: Fixed::ONE,
            death_kind: None,
        },
        KindInfo {
            name: "splash",
            spawn_state: states::S_SPLASH1,
            death_state: StateId::NULL,
            spawn_health: 1,
            radius: Fixed::from_int(8),
            height: Fixed::from_int(8),
            speed: Fixed::ZERO,
            damage: 0,
            flags: ObjectFlags::SCENERY | ObjectFlags::NO_GRAVITY | ObjectFlags::NO_CLIP,
            gravity_factor: Fixed::ONE,
            death_kind: None,
        },
        KindInfo {
            name: "drift_spark",
            spawn_state: states::S_DRIFT_SPARK,
            death_state: StateId::NULL,
            spawn_health: 1,
            radius: Fixed::from_int(4),
            height: Fixed::from_int(4),
            speed: Fixed::ZERO,
            damage: 0,
            flags: ObjectFlags::SCENERY | ObjectFlags::NO_GRAVITY | ObjectFlags::NO_CLIP,
            gravity_factor: Fixed::ONE,
            death_kind: None,
        },
        KindInfo {
            name: "smoke",
            spawn_state: states::S_SMOKE1,
            death_state: StateId::NULL,
            spawn_health: 1,
            radius: Fixed::from_int(6),
            height: Fixed::from_int(8),
            speed: Fixed::ZERO,
            damage: 0,
            flags: ObjectFlags::SCENERY | ObjectFlags::NO_GRAVITY | ObjectFlags::NO_CLIP,
            gravity_factor: Fixed::ONE,
            death_kind: None,
        },
        KindInfo {
            name: "boss_core",
            spawn_state: states::S_BOSS_HOVER1,
            death_state: states::S_BOSS_DIE1,
            spawn_health: 20,
            radius: Fixed::from_int(24),
            height: Fixed::from_int(48),
            speed: Fixed::from_int(6),
            damage: 2,
            flags: ObjectFlags::SOLID
                | ObjectFlags::SHOOTABLE
                | ObjectFlags::BOSS
                | ObjectFlags::NO_GRAVITY,
            gravity_factor: Fixed::ONE,
            death_kind: Some(EXPLOSION),
        },
        KindInfo {
            name: "boss_turret",
            spawn_state: states::S_TURRET,
            death_state: StateId::NULL,
            spawn_health: 4,
            radius: Fixed::from_int(10),
            height: Fixed::from_int(16),
            speed: Fixed::ZERO,
            damage: 1,
            flags: ObjectFlags::SHOOTABLE | ObjectFlags::BOSS | ObjectFlags::NO_GRAVITY,
            gravity_factor: Fixed::ONE,
            death_kind: Some(EXPLOSION),
        },
        KindInfo {
            name: "crate",
            spawn_state: states::S_CRATE,
            // Non-terminal so the pushable strategy gets one tick to break
            // the crate apart itself.
            death_state: states::S_SMOKE1,
            spawn_health: 3,
            radius: Fixed::from_int(14),
            height: Fixed::from_int(28),
            speed: Fixed::ZERO,
            damage: 0,
            flags: ObjectFlags::SOLID | ObjectFlags::SHOOTABLE | ObjectFlags::PUSHABLE,
            gravity_factor: Fixed::ONE,
            death_kind: None,
        },
        KindInfo {
            name: "cone",
            spawn_state: states::S_CONE,
            death_state: StateId::NULL,
            spawn_health: 1,
            radius: Fixed::from_int(8),
            height: Fixed::from_int(16),
            speed: Fixed::ZERO,
            damage: 0,
            flags: ObjectFlags::SOLID | ObjectFlags::SCENERY,
            gravity_factor: Fixed::ONE,
            death_kind: None,
        },
        KindInfo {
            name: "spring",
            spawn_state: states::S_SPRING_IDLE,
            death_state: StateId::NULL,
            spawn_health: 1,
            radius: Fixed::from_int(12),
            height: Fixed::from_int(8),
            speed: Fixed::from_int(24),
            damage: 0,
            flags: ObjectFlags::SCENERY,
            gravity_factor: Fixed::ONE,
            death_kind: None,
        },
        KindInfo {
            name: "rain_drop",
            spawn_state: states::S_RAIN,
            death_state: StateId::NULL,
            spawn_health: 1,
            radius: Fixed::from_int(1),
            height: Fixed::from_int(4),
            speed: Fixed::ZERO,
            damage: 0,
            flags: ObjectFlags::SCENERY | ObjectFlags::PRECIPITATION,
            gravity_factor: Fixed::HALF,
            death_kind: None,
        },
        KindInfo {
            name: "checkpoint",
            spawn_state: states::S_CHECKPOINT,
            death_state: StateId::NULL,
            spawn_health: 1,
            radius: Fixed::from_int(48),
            height: Fixed::from_int(64),
            speed: Fixed::ZERO,
            damage: 0,
            flags: ObjectFlags::SCENERY | ObjectFlags::NO_GRAVITY,
            gravity_factor: Fixed::ONE,
            death_kind: None,
        },
        KindInfo {
            name: "overlay",
            spawn_state: states::S_OVERLAY,
            death_state: StateId::NULL,
            spawn_health: 1,
            radius: Fixed::from_int(32),
            height: Fixed::from_int(4),
            speed: Fixed::ZERO,
            damage: 0,
            flags: ObjectFlags::SCENERY
                | ObjectFlags::NO_GRAVITY
                | ObjectFlags::NO_CLIP
                | ObjectFlags::NO_CLIP_HEIGHT,
            gravity_factor: Fixed::ONE,
            death_kind: None,
        },
    ];
    debug_assert_eq!(table.len(), KIND_COUNT);
    table
}

pub fn kind_by_name(name: &str) -> Option<KindId> {
    kind_table()
        .iter()
        .position(|info| info.name == name)
        .map(|index| KindId(index as u16))
}
