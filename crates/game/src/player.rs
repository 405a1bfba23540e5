use sim::{
    approx_dist, Angle, Buttons, EntityFlags, FVec3, Fixed, Handle, InputCommand, RelationSlot,
    SimulationWorld,
};

use crate::behavior;
use crate::kinds;
use crate::states;

/// Yaw change per tick at full steering deflection (binary-angle units).
const TURN_PER_STEER_UNIT: u32 = 900_000;
const DRIFT_TURN_BONUS_NUM: u32 = 3;
const DRIFT_TURN_BONUS_DEN: u32 = 2;
const BRAKE_FRICTION: Fixed = Fixed::from_raw(55_706); // ~0.85
const THROW_COOLDOWN_TICS: i32 = 24;
const SHELL_FUSE_TICS: i32 = 245;
const DRIFT_MIN_SPEED: Fixed = Fixed::from_int(6);
const DRIVE_ANIM_MIN_SPEED: Fixed = Fixed::from_int(2);

/// High-level player think: consumes one captured input command per tick
/// and turns it into acceleration, steering, drifting, and item throws.
/// Runs in the driver's player phase, before the scheduler pass.
pub fn player_think(world: &mut SimulationWorld, handle: Handle, cmd: InputCommand) -> bool {
    let Some(entity) = world.entity(handle) else {
        return false;
    };
    // No control while spinning out or dead; the state machine owns those.
    let uncontrolled = matches!(
        entity.state,
        states::S_KART_SPIN1
            | states::S_KART_SPIN2
            | states::S_KART_SPIN3
            | states::S_KART_SPIN4
            | states::S_KART_DEAD
    );
    if uncontrolled {
        return true;
    }

    let top_speed = world
        .kind_info(kinds::KART)
        .map(|info| info.speed)
        .unwrap_or(Fixed::from_int(24));
    let grounded = entity.eflags.contains(EntityFlags::ON_GROUND);
    let drifting = grounded
        && cmd.is_pressed(Buttons::DRIFT)
        && approx_dist(entity.momentum.x, entity.momentum.y) > DRIFT_MIN_SPEED;

    steer(world, handle, cmd, drifting);
    accelerate(world, handle, cmd, top_speed);
    if cmd.is_pressed(Buttons::BRAKE) {
        if let Some(entity) = world.entity_mut(handle) {
            entity.momentum.x = entity.momentum.x.mul(BRAKE_FRICTION);
            entity.momentum.y = entity.momentum.y.mul(BRAKE_FRICTION);
        }
    }

    if drifting && world.current_tick() % 4 == 0 {
        spawn_drift_spark(world, handle);
        if !world.is_live(handle) {
            return false;
        }
    }

    if !item_throw(world, handle, cmd) {
        return false;
    }
    if cmd.is_pressed(Buttons::RESPAWN) {
        return manual_respawn(world, handle);
    }
    update_drive_anim(world, handle, drifting)
}

fn steer(world: &mut SimulationWorld, handle: Handle, cmd: InputCommand, drifting: bool) {
    if cmd.steer == 0 {
        return;
    }
    let Some(entity) = world.entity_mut(handle) else {
        return;
    };
    let mut turn = (cmd.steer.unsigned_abs() as u32).wrapping_mul(TURN_PER_STEER_UNIT);
    if drifting {
        turn = turn / DRIFT_TURN_BONUS_DEN * DRIFT_TURN_BONUS_NUM;
    }
    // Positive steer is clockwise (to the right).
    if cmd.steer > 0 {
        entity.yaw = entity.yaw.turned_back(Angle(turn));
    } else {
        entity.yaw = entity.yaw.turned(Angle(turn));
    }
}

fn accelerate(world: &mut SimulationWorld, handle: Handle, cmd: InputCommand, top_speed: Fixed) {
    let throttle = if cmd.is_pressed(Buttons::ACCELERATE) {
        127
    } else {
        cmd.throttle as i32
    };
    if throttle == 0 {
        return;
    }
    let Some(entity) = world.entity_mut(handle) else {
        return;
    };
    let (dir_x, dir_y) = entity.yaw.unit_vector();
    // Thrust reaches top speed over roughly a second of full throttle.
    let thrust = top_speed
        .div(Fixed::from_int(32))
        .scale_int(throttle)
        .div(Fixed::from_int(128));
    entity.momentum.x += dir_x.mul(thrust);
    entity.momentum.y += dir_y.mul(thrust);

    let speed = approx_dist(entity.momentum.x, entity.momentum.y);
    if speed > top_speed {
        let scale_back = top_speed.div(speed);
        entity.momentum.x = entity.momentum.x.mul(scale_back);
        entity.momentum.y = entity.momentum.y.mul(scale_back);
    }
}

fn spawn_drift_spark(world: &mut SimulationWorld, handle: Handle) {
    let Some(entity) = world.entity(handle) else {
        return;
    };
    let behind = entity.yaw.reversed();
    let (back_x, back_y) = behind.unit_vector();
    let pos = FVec3::new(
        entity.pos.x + back_x.mul(entity.scaled_radius()),
        entity.pos.y + back_y.mul(entity.scaled_radius()),
        entity.pos.z + Fixed::from_int(2),
    );
    let _ = world.spawn(kinds::DRIFT_SPARK, pos, behind);
}

fn item_throw(world: &mut SimulationWorld, handle: Handle, cmd: InputCommand) -> bool {
    let ready = {
        let Some(entity) = world.entity_mut(handle) else {
            return false;
        };
        if entity.threshold > 0 {
            entity.threshold -= 1;
        }
        entity.threshold == 0 && cmd.is_pressed(Buttons::ITEM)
    };
    if !ready {
        return true;
    }
    let (pos, yaw, radius) = {
        let Some(entity) = world.entity(handle) else {
            return false;
        };
        (entity.pos, entity.yaw, entity.scaled_radius())
    };
    let aim = if cmd.is_pressed(Buttons::LOOK_BACK) {
        yaw.reversed()
    } else {
        yaw
    };
    let (dir_x, dir_y) = aim.unit_vector();
    let speed = world
        .kind_info(kinds::GREEN_SHELL)
        .map(|info| info.speed)
        .unwrap_or(Fixed::from_int(24));
    let muzzle = FVec3::new(
        pos.x + dir_x.mul(radius + Fixed::from_int(12)),
        pos.y + dir_y.mul(radius + Fixed::from_int(12)),
        pos.z + Fixed::from_int(8),
    );
    let shell = world.spawn(kinds::GREEN_SHELL, muzzle, aim);
    if world.is_live(shell) {
        world.set_relation(shell, RelationSlot::Owner, Some(handle));
        if let Some(entity) = world.entity_mut(shell) {
            entity.momentum.x = dir_x.mul(speed);
            entity.momentum.y = dir_y.mul(speed);
            entity.fuse = SHELL_FUSE_TICS;
        }
    }
    if let Some(entity) = world.entity_mut(handle) {
        entity.threshold = THROW_COOLDOWN_TICS;
    }
    world.is_live(handle)
}

/// Respawn button: snap back to the recorded starting slot.
fn manual_respawn(world: &mut SimulationWorld, handle: Handle) -> bool {
    {
        let Some(entity) = world.entity_mut(handle) else {
            return false;
        };
        entity.pos.x = Fixed::from_int(entity.extra1);
        entity.pos.y = Fixed::from_int(entity.extra2);
        entity.momentum = FVec3::ZERO;
        entity.hit_lag = 10;
    }
    sim::set_player_state(world, handle, states::S_KART_IDLE)
}

fn update_drive_anim(world: &mut SimulationWorld, handle: Handle, drifting: bool) -> bool {
    let Some(entity) = world.entity(handle) else {
        return false;
    };
    let speed = approx_dist(entity.momentum.x, entity.momentum.y);
    let state = entity.state;

    if entity.eflags.contains(EntityFlags::JUST_LANDED) {
        world.play_effect(handle, behavior::FX_SPIN);
    }

    if drifting {
        if state != states::S_KART_DRIFT {
            return sim::set_player_state(world, handle, states::S_KART_DRIFT);
        }
        return true;
    }
    if speed > DRIVE_ANIM_MIN_SPEED {
        if state == states::S_KART_IDLE || state == states::S_KART_DRIFT {
            return sim::set_player_state(world, handle, states::S_KART_DRIVE1);
        }
        return true;
    }
    if state != states::S_KART_IDLE {
        return sim::set_player_state(world, handle, states::S_KART_IDLE);
    }
    true
}
