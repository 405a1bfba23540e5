use tracing::debug;

use crate::entity::{EntityFlags, ObjectFlags};
use crate::fixed::{approx_dist, FVec3, Fixed};
use crate::level::{LayerKind, Sector, SectorFlags, Slope};
use crate::pool::Handle;
use crate::world::SimulationWorld;

/// Tallest ledge a grounded entity steps up without being blocked, at
/// scale 1.
const MAX_STEP_UP: Fixed = Fixed::from_int(24);

/// Energy retained by a bounce off a wall or floor.
const BOUNCE_FACTOR: Fixed = Fixed::from_raw(45_875); // ~0.70

/// Momentum below this magnitude snaps to zero instead of creeping.
const STOP_THRESHOLD: Fixed = Fixed::from_raw(4_096); // 1/16

/// Ground friction applied once per tick to grounded movers.
const GROUND_FRICTION: Fixed = Fixed::from_raw(59_392); // ~0.90625

/// Gravity multiplier while underwater.
const LIQUID_GRAVITY_DAMP: Fixed = Fixed::from_raw(21_845); // ~1/3

/// Horizontal speed fraction converted to lift by a wall kick.
const WALL_KICK_FACTOR: Fixed = Fixed::HALF;

/// Depth of the liquid volume implied by `SectorFlags::LIQUID`.
const LIQUID_SURFACE_DEPTH: Fixed = Fixed::from_int(24);

/// Combined plane gradient above which a floor counts as a real slope for
/// ascent tracking.
const SLOPE_STEEP_THRESHOLD: Fixed = Fixed::from_raw(16_384); // 1/4

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MoveOutcome {
    Moved,
    BlockedWall { sky: bool },
    BlockedEntity(Handle),
}

/// Effective floor under a probe height: the base floor, or the highest
/// solid stacked layer whose top is at or below the probe.
fn floor_at(sector: &Sector, x: Fixed, y: Fixed, probe_z: Fixed) -> (Fixed, Option<Slope>) {
    let mut best = sector.floor_z_at(x, y);
    let mut slope = sector.floor_slope;
    for layer in &sector.layers {
        if layer.kind == LayerKind::Solid && layer.top <= probe_z && layer.top > best {
            best = layer.top;
            slope = None;
        }
    }
    (best, slope)
}

/// Effective ceiling above a probe height: the base ceiling, or the lowest
/// solid stacked layer bottom strictly above the probe.
fn ceiling_at(sector: &Sector, x: Fixed, y: Fixed, probe_z: Fixed) -> Fixed {
    let mut best = sector.ceiling_z_at(x, y);
    for layer in &sector.layers {
        if layer.kind == LayerKind::Solid && layer.bottom > probe_z && layer.bottom < best {
            best = layer.bottom;
        }
    }
    best
}

/// Liquid surface covering a height, if any: the sector liquid volume or a
/// stacked liquid layer.
fn liquid_top_covering(sector: &Sector, z: Fixed) -> Option<Fixed> {
    if sector.flags.contains(SectorFlags::LIQUID) {
        let floor = sector.floor_height;
        let top = floor + LIQUID_SURFACE_DEPTH;
        if z >= floor && z <= top {
            return Some(top);
        }
    }
    for layer in &sector.layers {
        if layer.kind == LayerKind::Liquid && z >= layer.bottom && z <= layer.top {
            return Some(layer.top);
        }
    }
    None
}

/// Recompute the floor/ceiling/slope/cell caches and surface-derived flags
/// from the entity's current position. Runs at spawn and whenever the
/// entity crosses into a new horizontal cell.
pub(crate) fn refresh_position_caches(world: &mut SimulationWorld, handle: Handle) {
    let Some(entity) = world.entity(handle) else {
        return;
    };
    let (x, y, z) = (entity.pos.x, entity.pos.y, entity.pos.z);
    let height = entity.scaled_height();
    let sector = world.sector_snapshot(x, y);
    let (floor, slope) = floor_at(&sector, x, y, z);
    let ceiling = ceiling_at(&sector, x, y, z);
    let cell = world.level().cell_at(x, y);
    let reversed = sector.flags.contains(SectorFlags::REVERSED_GRAVITY);
    let mid_z = z + Fixed(height.raw() >> 1);
    let underwater = liquid_top_covering(&sector, mid_z).is_some();

    let Some(entity) = world.entity_mut(handle) else {
        return;
    };
    entity.floor_z = floor;
    entity.ceiling_z = ceiling;
    entity.floor_slope = slope;
    entity.cell = cell;
    entity.eflags.set(EntityFlags::VERTICAL_FLIP, reversed);
    entity.eflags.set(EntityFlags::UNDERWATER, underwater);
    let grounded = if reversed {
        entity.pos.z + height >= ceiling
    } else {
        entity.pos.z <= floor
    };
    entity.eflags.set(EntityFlags::ON_GROUND, grounded);
}

/// The per-tick gravity delta for one entity: base level gravity, sector
/// multiplier and reversal, liquid damping, and per-category modifiers
/// (kind factor, current scale). Computed fresh every tick; surface
/// context can change between any two ticks, so nothing here is cached.
pub(crate) fn gravity_for(world: &SimulationWorld, handle: Handle) -> Fixed {
    let Some(entity) = world.entity(handle) else {
        return Fixed::ZERO;
    };
    if entity.flags.contains(ObjectFlags::NO_GRAVITY) {
        return Fixed::ZERO;
    }
    let sector = world.level().sector_at(entity.pos.x, entity.pos.y);
    let factor = world
        .kind_info(entity.kind)
        .map(|info| info.gravity_factor)
        .unwrap_or(Fixed::ONE);
    let mut gravity = world
        .level()
        .base_gravity()
        .mul(sector.gravity_mult)
        .mul(factor)
        .mul(entity.scale);
    if entity.eflags.contains(EntityFlags::UNDERWATER) {
        gravity = gravity.mul(LIQUID_GRAVITY_DAMP);
    }
    if sector.flags.contains(SectorFlags::REVERSED_GRAVITY) {
        gravity
    } else {
        -gravity
    }
}

/// Project momentum onto a slope plane, removing the component along the
/// plane normal. Movement along a slope then carries no spurious vertical
/// speed of its own.
fn quantize_to_slope(momentum: FVec3, slope: &Slope) -> FVec3 {
    let (nx, ny, nz) = slope.normal();
    let dot = nx.mul(momentum.x) + ny.mul(momentum.y) + nz.mul(momentum.z);
    let norm_sq = nx.mul(nx) + ny.mul(ny) + nz.mul(nz);
    if norm_sq.is_zero() {
        return momentum;
    }
    let k = dot.div(norm_sq);
    FVec3 {
        x: momentum.x - nx.mul(k),
        y: momentum.y - ny.mul(k),
        z: momentum.z - nz.mul(k),
    }
}

/// Attempt to place the entity at (nx, ny), honoring fit, step height, and
/// solid-entity blocking. Commits position and refreshes caches on success.
fn try_move(world: &mut SimulationWorld, handle: Handle, nx: Fixed, ny: Fixed) -> MoveOutcome {
    let Some(entity) = world.entity(handle) else {
        return MoveOutcome::BlockedWall { sky: false };
    };
    let flags = entity.flags;
    let z = entity.pos.z;
    let height = entity.scaled_height();
    let radius = entity.scaled_radius();
    let max_step = MAX_STEP_UP.mul(entity.scale);
    let top = entity.top_z();
    let owner = entity.relations.owner;

    if !flags.contains(ObjectFlags::NO_CLIP) {
        let sector = world.sector_snapshot(nx, ny);
        let (dest_floor, _) = floor_at(&sector, nx, ny, z + max_step);
        let dest_ceiling = ceiling_at(&sector, nx, ny, z);
        let sky = sector.flags.contains(SectorFlags::SKY_CEILING) && top > dest_ceiling;

        if dest_ceiling - dest_floor < height {
            return MoveOutcome::BlockedWall { sky };
        }
        if dest_floor - z > max_step {
            return MoveOutcome::BlockedWall { sky };
        }
        if top > dest_ceiling {
            return MoveOutcome::BlockedWall { sky };
        }

        if flags.contains(ObjectFlags::SOLID) || flags.contains(ObjectFlags::MISSILE) {
            for other in world.entity_handles() {
                if other == handle || other == owner {
                    continue;
                }
                let Some(blocker) = world.entity(other) else {
                    continue;
                };
                if !blocker.flags.contains(ObjectFlags::SOLID) {
                    continue;
                }
                let reach = radius + blocker.scaled_radius();
                if (nx - blocker.pos.x).abs() >= reach || (ny - blocker.pos.y).abs() >= reach {
                    continue;
                }
                if z >= blocker.top_z() || top <= blocker.pos.z {
                    continue;
                }
                return MoveOutcome::BlockedEntity(other);
            }
        }
    }

    let old_cell = world.entity(handle).map(|e| e.cell);
    if let Some(entity) = world.entity_mut(handle) {
        entity.pos.x = nx;
        entity.pos.y = ny;
    }
    let new_cell = world.level().cell_at(nx, ny);
    if old_cell != Some(new_cell) {
        refresh_position_caches(world, handle);
    } else {
        // Same cell, but sloped floors still change height under us.
        let sector = world.sector_snapshot(nx, ny);
        let (floor, slope) = floor_at(&sector, nx, ny, z + max_step);
        let ceiling = ceiling_at(&sector, nx, ny, z);
        if let Some(entity) = world.entity_mut(handle) {
            entity.floor_z = floor;
            entity.ceiling_z = ceiling;
            entity.floor_slope = slope;
        }
    }
    MoveOutcome::Moved
}

/// Horizontal movement resolution: stepping, per-category obstruction
/// response, slope quantization, ground friction. Returns liveness.
pub(crate) fn xy_movement(world: &mut SimulationWorld, handle: Handle) -> bool {
    let Some(entity) = world.entity(handle) else {
        return false;
    };
    let momentum = entity.momentum;
    let on_slope = entity.floor_slope.map(|s| !s.is_flat()).unwrap_or(false);
    if momentum.horizontal_is_zero() && !on_slope {
        return true;
    }
    let radius = entity.scaled_radius().max(Fixed::ONE);
    let flags = entity.flags;
    let eflags = entity.eflags;

    // Split fast moves so a thin wall cannot be tunneled through.
    let largest = momentum.x.abs().max(momentum.y.abs());
    let steps = if largest > radius { 2 } else { 1 };
    let step_x = Fixed(momentum.x.raw() / steps);
    let step_y = Fixed(momentum.y.raw() / steps);

    for _ in 0..steps {
        let Some(entity) = world.entity(handle) else {
            return false;
        };
        let (x, y) = (entity.pos.x, entity.pos.y);
        match try_move(world, handle, x + step_x, y + step_y) {
            MoveOutcome::Moved => {}
            MoveOutcome::BlockedWall { sky } => {
                if flags.contains(ObjectFlags::MISSILE) {
                    if sky {
                        if let Some(entity) = world.entity_mut(handle) {
                            entity.eflags.insert(EntityFlags::SKY_EXPOSED);
                        }
                    }
                    explode_missile(world, handle);
                    return false;
                }
                if flags.contains(ObjectFlags::BOUNCE) {
                    bounce_off_wall(world, handle, x, y, step_x, step_y);
                    return world.is_live(handle);
                }
                if flags.contains(ObjectFlags::WALL_KICK)
                    && eflags.contains(EntityFlags::ASCENDING_SLOPE)
                {
                    wall_kick(world, handle);
                    return world.is_live(handle);
                }
                slide_along_wall(world, handle, x, y, step_x, step_y);
                break;
            }
            MoveOutcome::BlockedEntity(target) => {
                if flags.contains(ObjectFlags::MISSILE) {
                    let damage = world
                        .entity(handle)
                        .and_then(|e| world.kind_info(e.kind))
                        .map(|info| info.damage)
                        .unwrap_or(0);
                    if damage > 0 {
                        let _ = world.damage(target, handle, damage);
                    }
                    explode_missile(world, handle);
                    return false;
                }
                if flags.contains(ObjectFlags::BOUNCE) {
                    if let Some(entity) = world.entity_mut(handle) {
                        entity.momentum.x = -entity.momentum.x.mul(BOUNCE_FACTOR);
                        entity.momentum.y = -entity.momentum.y.mul(BOUNCE_FACTOR);
                    }
                    return true;
                }
                // Shoving a pushable hands it half the mover's momentum.
                let pushable = world
                    .entity(target)
                    .map(|e| e.flags.contains(ObjectFlags::PUSHABLE))
                    .unwrap_or(false);
                if pushable {
                    let (shove_x, shove_y) = world
                        .entity(handle)
                        .map(|e| (e.momentum.x, e.momentum.y))
                        .unwrap_or((Fixed::ZERO, Fixed::ZERO));
                    if let Some(blocker) = world.entity_mut(target) {
                        blocker.momentum.x += shove_x.mul(Fixed::HALF);
                        blocker.momentum.y += shove_y.mul(Fixed::HALF);
                    }
                    if let Some(entity) = world.entity_mut(handle) {
                        entity.momentum.x = entity.momentum.x.mul(Fixed::HALF);
                        entity.momentum.y = entity.momentum.y.mul(Fixed::HALF);
                    }
                    break;
                }
                // Blocked dead: drop horizontal momentum.
                if let Some(entity) = world.entity_mut(handle) {
                    entity.momentum.x = Fixed::ZERO;
                    entity.momentum.y = Fixed::ZERO;
                }
                break;
            }
        }
    }

    if !world.is_live(handle) {
        return false;
    }
    apply_slope_and_friction(world, handle);
    true
}

fn bounce_off_wall(
    world: &mut SimulationWorld,
    handle: Handle,
    x: Fixed,
    y: Fixed,
    step_x: Fixed,
    step_y: Fixed,
) {
    // Axis-probe to find which component hit: whichever single-axis move
    // fails is the one that reflects.
    let x_clear = try_move(world, handle, x + step_x, y) == MoveOutcome::Moved;
    let y_clear = if x_clear {
        false
    } else {
        try_move(world, handle, x, y + step_y) == MoveOutcome::Moved
    };
    if let Some(entity) = world.entity_mut(handle) {
        if x_clear {
            entity.momentum.y = -entity.momentum.y.mul(BOUNCE_FACTOR);
        } else if y_clear {
            entity.momentum.x = -entity.momentum.x.mul(BOUNCE_FACTOR);
        } else {
            entity.momentum.x = -entity.momentum.x.mul(BOUNCE_FACTOR);
            entity.momentum.y = -entity.momentum.y.mul(BOUNCE_FACTOR);
        }
    }
}

fn slide_along_wall(
    world: &mut SimulationWorld,
    handle: Handle,
    x: Fixed,
    y: Fixed,
    step_x: Fixed,
    step_y: Fixed,
) {
    if try_move(world, handle, x + step_x, y) == MoveOutcome::Moved {
        if let Some(entity) = world.entity_mut(handle) {
            entity.momentum.y = Fixed::ZERO;
        }
        return;
    }
    if try_move(world, handle, x, y + step_y) == MoveOutcome::Moved {
        if let Some(entity) = world.entity_mut(handle) {
            entity.momentum.x = Fixed::ZERO;
        }
        return;
    }
    if let Some(entity) = world.entity_mut(handle) {
        entity.momentum.x = Fixed::ZERO;
        entity.momentum.y = Fixed::ZERO;
    }
}

/// Convert horizontal speed into a vertical launch off a near-vertical wall
/// met while climbing a slope.
fn wall_kick(world: &mut SimulationWorld, handle: Handle) {
    let Some(entity) = world.entity_mut(handle) else {
        return;
    };
    let speed = approx_dist(entity.momentum.x, entity.momentum.y);
    let lift = speed.mul(WALL_KICK_FACTOR);
    if entity.eflags.contains(EntityFlags::VERTICAL_FLIP) {
        entity.momentum.z -= lift;
    } else {
        entity.momentum.z += lift;
    }
    entity.momentum.x = Fixed::ZERO;
    entity.momentum.y = Fixed::ZERO;
    entity.eflags.remove(EntityFlags::ASCENDING_SLOPE);
    debug!(lift = %lift, "wall_kick");
}

fn apply_slope_and_friction(world: &mut SimulationWorld, handle: Handle) {
    let Some(entity) = world.entity_mut(handle) else {
        return;
    };
    let grounded = entity.eflags.contains(EntityFlags::ON_GROUND);

    if grounded {
        if let Some(slope) = entity.floor_slope {
            if !slope.is_flat() {
                entity.momentum = quantize_to_slope(entity.momentum, &slope);
                let steep = slope.dzdx.abs() + slope.dzdy.abs() >= SLOPE_STEEP_THRESHOLD;
                let climbing = slope.dzdx.mul(entity.momentum.x)
                    + slope.dzdy.mul(entity.momentum.y)
                    > Fixed::ZERO;
                entity
                    .eflags
                    .set(EntityFlags::ASCENDING_SLOPE, steep && climbing);
            } else {
                entity.eflags.remove(EntityFlags::ASCENDING_SLOPE);
            }
        } else {
            entity.eflags.remove(EntityFlags::ASCENDING_SLOPE);
        }
    }

    if grounded && !entity.flags.contains(ObjectFlags::MISSILE) {
        entity.momentum.x = entity.momentum.x.mul(GROUND_FRICTION);
        entity.momentum.y = entity.momentum.y.mul(GROUND_FRICTION);
        if entity.momentum.x.abs() < STOP_THRESHOLD {
            entity.momentum.x = Fixed::ZERO;
        }
        if entity.momentum.y.abs() < STOP_THRESHOLD {
            entity.momentum.y = Fixed::ZERO;
        }
    }
}

/// Vertical movement resolution: integrate vertical momentum, clip against
/// the cached floor/ceiling (stacked layers included), apply category
/// landing rules, lethal-pit removal, liquid transitions, and gravity.
/// Returns liveness.
pub(crate) fn z_movement(world: &mut SimulationWorld, handle: Handle) -> bool {
    let Some(entity) = world.entity(handle) else {
        return false;
    };
    let flags = entity.flags;

    if flags.contains(ObjectFlags::NO_CLIP_HEIGHT) {
        // Skips all floor/ceiling interaction; still integrates and falls.
        let airborne = entity.is_airborne();
        let momz = entity.momentum.z;
        let gravity = gravity_for(world, handle);
        if let Some(entity) = world.entity_mut(handle) {
            entity.pos.z += momz;
            if airborne && !gravity.is_zero() {
                if entity.momentum.z.is_zero() {
                    entity.momentum.z = gravity.scale_int(2);
                } else {
                    entity.momentum.z += gravity;
                }
            }
        }
        return true;
    }

    let was_underwater = entity.eflags.contains(EntityFlags::UNDERWATER);
    let flipped = entity.eflags.contains(EntityFlags::VERTICAL_FLIP);
    let momz = entity.momentum.z;

    if let Some(entity) = world.entity_mut(handle) {
        entity.pos.z += momz;
    }

    // Ground contact (floor normally, ceiling under reversed gravity).
    let Some(entity) = world.entity(handle) else {
        return false;
    };
    let height = entity.scaled_height();
    let floor = entity.floor_z;
    let ceiling = entity.ceiling_z;
    let z = entity.pos.z;
    let sector_flags = world
        .level()
        .sector_at(entity.pos.x, entity.pos.y)
        .flags;

    let touching_ground = if flipped {
        z + height >= ceiling
    } else {
        z <= floor
    };
    let moving_into_ground = if flipped {
        momz > Fixed::ZERO
    } else {
        momz < Fixed::ZERO
    };

    if touching_ground {
        if sector_flags.contains(SectorFlags::LETHAL_PIT)
            && !flags.contains(ObjectFlags::PIT_IMMUNE)
            && !flipped
        {
            // Lethal zone: unconditional removal unless the category is
            // exempt.
            world.remove(handle);
            return false;
        }

        if let Some(entity) = world.entity_mut(handle) {
            entity.pos.z = if flipped { ceiling - height } else { floor };
        }

        if moving_into_ground {
            if flags.contains(ObjectFlags::MISSILE) && !flags.contains(ObjectFlags::NO_CLIP) {
                explode_missile(world, handle);
                return false;
            }
            if let Some(entity) = world.entity_mut(handle) {
                entity.eflags.insert(EntityFlags::JUST_LANDED);
                entity.eflags.insert(EntityFlags::ON_GROUND);
                if flags.contains(ObjectFlags::BOUNCE) {
                    let reflected = -entity.momentum.z.mul(BOUNCE_FACTOR);
                    entity.momentum.z = if reflected.abs() < STOP_THRESHOLD {
                        Fixed::ZERO
                    } else {
                        reflected
                    };
                } else {
                    entity.momentum.z = Fixed::ZERO;
                }
            }
            // Landing on a slope folds remaining momentum into the plane.
            let slope = world.entity(handle).and_then(|e| e.floor_slope);
            if let Some(slope) = slope {
                if !slope.is_flat() {
                    if let Some(entity) = world.entity_mut(handle) {
                        entity.momentum = quantize_to_slope(entity.momentum, &slope);
                    }
                }
            }
        } else if let Some(entity) = world.entity_mut(handle) {
            // Resting contact: the landing edge flag lasts one tick only.
            entity.eflags.insert(EntityFlags::ON_GROUND);
            entity.eflags.remove(EntityFlags::JUST_LANDED);
        }
    } else if let Some(entity) = world.entity_mut(handle) {
        entity.eflags.remove(EntityFlags::ON_GROUND);
        entity.eflags.remove(EntityFlags::JUST_LANDED);
    }

    // Ceiling bonk for the non-reversed case (and floor bonk when flipped).
    let Some(entity) = world.entity(handle) else {
        return false;
    };
    let z = entity.pos.z;
    let bonking = if flipped {
        z < entity.floor_z
    } else {
        z + height > entity.ceiling_z
    };
    let moving_into_bonk = if flipped {
        entity.momentum.z < Fixed::ZERO
    } else {
        entity.momentum.z > Fixed::ZERO
    };
    if bonking {
        let ceiling = entity.ceiling_z;
        let floor = entity.floor_z;
        let sky = sector_flags.contains(SectorFlags::SKY_CEILING) && !flipped;
        if moving_into_bonk && flags.contains(ObjectFlags::MISSILE) {
            if sky {
                if let Some(entity) = world.entity_mut(handle) {
                    entity.eflags.insert(EntityFlags::SKY_EXPOSED);
                }
            }
            explode_missile(world, handle);
            return false;
        }
        if let Some(entity) = world.entity_mut(handle) {
            entity.pos.z = if flipped { floor } else { ceiling - height };
            if moving_into_bonk {
                if flags.contains(ObjectFlags::BOUNCE) {
                    entity.momentum.z = -entity.momentum.z.mul(BOUNCE_FACTOR);
                } else {
                    entity.momentum.z = Fixed::ZERO;
                }
            }
        }
    }

    // Liquid transition: crossing into water spawns a surface splash.
    update_water_state(world, handle, was_underwater);
    if !world.is_live(handle) {
        return false;
    }

    // Gravity, fresh each tick. An airborne entity at exactly zero vertical
    // speed takes a doubled impulse so it never hangs for a visible frame.
    let Some(entity) = world.entity(handle) else {
        return false;
    };
    if entity.is_airborne() {
        let gravity = gravity_for(world, handle);
        if !gravity.is_zero() {
            if let Some(entity) = world.entity_mut(handle) {
                if entity.momentum.z.is_zero() {
                    entity.momentum.z = gravity.scale_int(2);
                } else {
                    entity.momentum.z += gravity;
                }
            }
        }
    }
    true
}

fn update_water_state(world: &mut SimulationWorld, handle: Handle, was_underwater: bool) {
    let Some(entity) = world.entity(handle) else {
        return;
    };
    let (x, y, z) = (entity.pos.x, entity.pos.y, entity.pos.z);
    let mid_z = z + Fixed(entity.scaled_height().raw() >> 1);
    let yaw = entity.yaw;
    let precip = entity.flags.contains(ObjectFlags::PRECIPITATION);
    let sector = world.sector_snapshot(x, y);
    let surface = liquid_top_covering(&sector, mid_z);
    let underwater = surface.is_some();

    if let Some(entity) = world.entity_mut(handle) {
        entity.eflags.set(EntityFlags::UNDERWATER, underwater);
    }

    if underwater && !was_underwater && !precip {
        if let (Some(kind), Some(top)) = (world.config().splash_kind, surface) {
            let splash = world.spawn(kind, FVec3::new(x, y, top), yaw);
            let _ = splash;
        }
    }
}

/// Detonate a missile: removed always; an explosion entity spawns at the
/// contact point unless the missile's sky-exposure flag is set.
pub(crate) fn explode_missile(world: &mut SimulationWorld, handle: Handle) {
    let Some(entity) = world.entity(handle) else {
        return;
    };
    let sky = entity.eflags.contains(EntityFlags::SKY_EXPOSED);
    let pos = entity.pos;
    let yaw = entity.yaw;
    let death_kind = world
        .kind_info(entity.kind)
        .and_then(|info| info.death_kind);

    if !sky {
        if let Some(kind) = death_kind {
            let explosion = world.spawn(kind, pos, yaw);
            let _ = explosion;
        }
    }
    world.remove(handle);
}
