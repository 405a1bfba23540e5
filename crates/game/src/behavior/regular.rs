/// Default strategy: bespoke per-kind logic over the closed kind set. Every
/// arm re-checks liveness after any call that can remove an entity, and no
/// arm touches a removed entity's fields afterwards.
fn regular_think(world: &mut SimulationWorld, handle: Handle) -> bool {
    let Some(entity) = world.entity(handle) else {
        return false;
    };
    match entity.kind {
        kinds::KART => kart_regular(world, handle),
        kinds::ITEM_BOX => item_box_regular(world, handle),
        kinds::GREEN_SHELL => shell_fuse_tick(world, handle),
        kinds::RED_SHELL => red_shell_regular(world, handle),
        kinds::BANANA => banana_regular(world, handle),
        kinds::SPRING => spring_regular(world, handle),
        kinds::RAIN_DROP => rain_drop_regular(world, handle),
        kinds::CHECKPOINT => checkpoint_regular(world, handle),
        // Pure state-machine kinds: animation and expiry need no behavior.
        _ => true,
    }
}

fn kart_regular(world: &mut SimulationWorld, handle: Handle) -> bool {
    let Some(entity) = world.entity(handle) else {
        return false;
    };
    let pos = entity.pos;
    let yaw = entity.yaw;
    let landed = entity.eflags.contains(EntityFlags::JUST_LANDED);
    let grounded = entity.eflags.contains(EntityFlags::ON_GROUND);
    let healthy = entity.health > 0;
    if landed {
        let _ = world.spawn(kinds::SMOKE, pos, yaw);
    }
    // Karts are pit-exempt so the roster entry survives; bottoming out in a
    // lethal sector kills them instead, and the dead strategy revives them.
    if healthy
        && grounded
        && world
            .level()
            .sector_at(pos.x, pos.y)
            .flags
            .contains(sim::SectorFlags::LETHAL_PIT)
    {
        return world.damage(handle, Handle::NULL, 1_000);
    }
    true
}

fn item_box_regular(world: &mut SimulationWorld, handle: Handle) -> bool {
    let Some(entity) = world.entity(handle) else {
        return false;
    };
    if entity.state == states::S_ITEM_BOX_POP {
        return true;
    }
    // Slow hover bob, flipping direction on a fixed cadence.
    let phase = entity.move_count;
    if let Some(entity) = world.entity_mut(handle) {
        entity.move_count = (phase + 1) % 32;
        entity.momentum.z = if phase < 16 {
            Fixed::from_raw(8_192)
        } else {
            Fixed::from_raw(-8_192)
        };
    }
    if let Some(kart) = find_touching_kart(world, handle) {
        world.play_effect(kart, FX_ITEM_POP);
        return sim::set_state(world, handle, states::S_ITEM_BOX_POP);
    }
    true
}

/// Shared shell timer: thrown shells detonate when their fuse runs dry.
fn shell_fuse_tick(world: &mut SimulationWorld, handle: Handle) -> bool {
    let expired = {
        let Some(entity) = world.entity_mut(handle) else {
            return false;
        };
        if entity.fuse > 0 {
            entity.fuse -= 1;
        }
        entity.fuse == 1
    };
    if expired {
        let (pos, yaw) = {
            let Some(entity) = world.entity(handle) else {
                return false;
            };
            (entity.pos, entity.yaw)
        };
        let _ = world.spawn(kinds::EXPLOSION, pos, yaw);
        world.remove(handle);
        return false;
    }
    true
}

fn red_shell_regular(world: &mut SimulationWorld, handle: Handle) -> bool {
    // Acquire a homing target once; removed targets read as absent and are
    // silently re-acquired next tick.
    if world.relation(handle, RelationSlot::Tracer).is_none() {
        let owner = world
            .entity(handle)
            .map(|entity| entity.relations.owner)
            .unwrap_or(Handle::NULL);
        if let Some(quarry) = nearest_kart(world, handle, owner) {
            world.set_relation(handle, RelationSlot::Tracer, Some(quarry));
        }
    }
    if let Some(quarry) = world.relation(handle, RelationSlot::Tracer) {
        let (Some(shell), Some(target)) = (world.entity(handle), world.entity(quarry)) else {
            return world.is_live(handle);
        };
        let speed = world
            .kind_info(kinds::RED_SHELL)
            .map(|info| info.speed)
            .unwrap_or(Fixed::from_int(24));
        let aim = coarse_yaw_toward(shell.pos, target.pos);
        let (dir_x, dir_y) = aim.unit_vector();
        let blend = RED_SHELL_TURN;
        let keep = Fixed::ONE - blend;
        if let Some(entity) = world.entity_mut(handle) {
            entity.momentum.x = entity.momentum.x.mul(keep) + dir_x.mul(speed).mul(blend);
            entity.momentum.y = entity.momentum.y.mul(keep) + dir_y.mul(speed).mul(blend);
            entity.yaw = aim;
        }
    }
    shell_fuse_tick(world, handle)
}

fn banana_regular(world: &mut SimulationWorld, handle: Handle) -> bool {
    if let Some(kart) = find_touching_kart(world, handle) {
        let _ = spin_out_kart(world, kart, handle);
        if !world.is_live(handle) {
            return false;
        }
        world.remove(handle);
        return false;
    }
    true
}

fn spring_regular(world: &mut SimulationWorld, handle: Handle) -> bool {
    let Some(entity) = world.entity(handle) else {
        return false;
    };
    if entity.state != states::S_SPRING_IDLE {
        return true;
    }
    let launch = world
        .kind_info(kinds::SPRING)
        .map(|info| info.speed)
        .unwrap_or(Fixed::from_int(24));
    if let Some(kart) = find_touching_kart(world, handle) {
        if let Some(target) = world.entity_mut(kart) {
            target.momentum.z = launch;
            target.eflags.remove(EntityFlags::ON_GROUND);
        }
        world.play_effect(handle, FX_SPRING);
        return sim::set_state(world, handle, states::S_SPRING_BOUNCE1);
    }
    true
}

fn rain_drop_regular(world: &mut SimulationWorld, handle: Handle) -> bool {
    let Some(entity) = world.entity(handle) else {
        return false;
    };
    if entity.eflags.contains(EntityFlags::ON_GROUND) || entity.pos.z <= entity.floor_z {
        world.remove(handle);
        return false;
    }
    true
}

fn checkpoint_regular(world: &mut SimulationWorld, handle: Handle) -> bool {
    let karts: Vec<Handle> = world
        .entity_handles()
        .into_iter()
        .filter(|other| {
            world
                .entity(*other)
                .map(|entity| entity.kind == kinds::KART && entity.player.is_some())
                .unwrap_or(false)
        })
        .collect();
    for kart in karts {
        let inside = touching(world, handle, kart);
        let Some(entity) = world.entity(kart) else {
            continue;
        };
        let latched = entity.move_count != 0;
        let player = entity.player;
        if inside && !latched {
            if let Some(entity) = world.entity_mut(kart) {
                entity.move_count = 1;
            }
            if let Some(index) = player {
                if let Some(player) = world.player_mut(index) {
                    player.laps = player.laps.saturating_add(1);
                }
                world.play_effect(kart, FX_LAP);
            }
        } else if !inside && latched {
            if let Some(entity) = world.entity_mut(kart) {
                entity.move_count = 0;
            }
        }
    }
    true
}
