use sim::{
    approx_dist, Angle, EffectId, EntityFlags, FVec3, Fixed, Handle, KindId, ObjectFlags,
    RelationSlot, SimulationWorld, SpawnPoint,
};
use tracing::debug;

use crate::kinds;
use crate::states;

pub const FX_BOOM: EffectId = EffectId(1);
pub const FX_SPLASH: EffectId = EffectId(2);
pub const FX_SPRING: EffectId = EffectId(3);
pub const FX_ITEM_POP: EffectId = EffectId(4);
pub const FX_SPIN: EffectId = EffectId(5);
pub const FX_LAP: EffectId = EffectId(6);

const SHELL_FUSE_TICS: i32 = 245;
const ITEM_BOX_RESPAWN_TICS: u32 = 350;
const BLAST_RADIUS: Fixed = Fixed::from_int(96);
const BOSS_RETARGET_TICS: i32 = 35;
const BOSS_FIRE_COOLDOWN_TICS: i32 = 70;
const BOSS_HOVER_HEIGHT: Fixed = Fixed::from_int(48);
const BOSS_AWAKE_RANGE: Fixed = Fixed::from_int(400);
const DEATH_LINGER_TICS: i32 = 70;
const TURRET_ORBIT_RADIUS: Fixed = Fixed::from_int(56);
const SPIN_MOMENTUM_KEPT: Fixed = Fixed::HALF;
const CRATE_PUSH_TRANSFER: Fixed = Fixed::HALF;
const CRATE_EXTRA_FRICTION: Fixed = Fixed::from_raw(55_706); // ~0.85
const DEATH_DRAG: Fixed = Fixed::from_raw(55_706);
const RED_SHELL_TURN: Fixed = Fixed::from_raw(16_384); // steering blend per tick

include!("actions.rs");
include!("dispatch.rs");
include!("regular.rs");
include!("boss.rs");
include!("dead.rs");
include!("pushable.rs");

/// Horizontal bounding-box overlap with vertical range intersection; the
/// same test the integrator uses for solid blocking.
fn touching(world: &SimulationWorld, a: Handle, b: Handle) -> bool {
    let (Some(first), Some(second)) = (world.entity(a), world.entity(b)) else {
        return false;
    };
    let reach = first.scaled_radius() + second.scaled_radius();
    if (first.pos.x - second.pos.x).abs() >= reach {
        return false;
    }
    if (first.pos.y - second.pos.y).abs() >= reach {
        return false;
    }
    first.pos.z < second.top_z() && first.top_z() > second.pos.z
}

fn find_touching_kart(world: &SimulationWorld, handle: Handle) -> Option<Handle> {
    world
        .entity_handles()
        .into_iter()
        .find(|other| {
            *other != handle
                && world
                    .entity(*other)
                    .map(|entity| entity.kind == kinds::KART)
                    .unwrap_or(false)
                && touching(world, handle, *other)
        })
}

/// Nearest live kart by the approximate-distance metric; deterministic
/// because entity walk order is deterministic.
fn nearest_kart(world: &SimulationWorld, from: Handle, exclude: Handle) -> Option<Handle> {
    let origin = world.entity(from)?.pos;
    let mut best: Option<(Fixed, Handle)> = None;
    for other in world.entity_handles() {
        if other == from || other == exclude {
            continue;
        }
        let Some(entity) = world.entity(other) else {
            continue;
        };
        if entity.kind != kinds::KART {
            continue;
        }
        let dist = approx_dist(entity.pos.x - origin.x, entity.pos.y - origin.y);
        match best {
            Some((best_dist, _)) if best_dist <= dist => {}
            _ => best = Some((dist, other)),
        }
    }
    best.map(|(_, handle)| handle)
}

/// Yaw from one point toward another, quantized to sixteen headings so the
/// result is stable under fixed-point rounding.
fn coarse_yaw_toward(from: FVec3, to: FVec3) -> Angle {
    let dx = to.x - from.x;
    let dy = to.y - from.y;
    let mut best = Angle::ZERO;
    let mut best_score = Fixed::MIN;
    for step in 0..16u32 {
        let candidate = Angle(step.wrapping_mul(1 << 28));
        let (cx, cy) = candidate.unit_vector();
        let score = cx.mul(dx) + cy.mul(dy);
        if score > best_score {
            best_score = score;
            best = candidate;
        }
    }
    best
}

/// Spin a kart out: damage, momentum cut, spin animation, one-shot effect.
/// Returns the kart's liveness.
fn spin_out_kart(world: &mut SimulationWorld, kart: Handle, source: Handle) -> bool {
    if !world.damage(kart, source, 1) {
        return false;
    }
    if let Some(entity) = world.entity_mut(kart) {
        entity.momentum.x = entity.momentum.x.mul(SPIN_MOMENTUM_KEPT);
        entity.momentum.y = entity.momentum.y.mul(SPIN_MOMENTUM_KEPT);
    }
    world.play_effect(kart, FX_SPIN);
    let is_player = world
        .entity(kart)
        .map(|entity| entity.player.is_some())
        .unwrap_or(false);
    if is_player {
        sim::set_player_state(world, kart, states::S_KART_SPIN1)
    } else {
        sim::set_state(world, kart, states::S_KART_SPIN1)
    }
}
