/// Dead strategy: death-animation momentum decay, then cleanup. Player
/// karts restore at their starting slot after the linger window; anything
/// else is removed outright.
fn dead_think(world: &mut SimulationWorld, handle: Handle) -> bool {
    let lingering = {
        let Some(entity) = world.entity_mut(handle) else {
            return false;
        };
        // Death momentum bleeds off instead of stopping dead.
        entity.momentum.x = entity.momentum.x.mul(DEATH_DRAG);
        entity.momentum.y = entity.momentum.y.mul(DEATH_DRAG);
        if entity.fuse == 0 {
            entity.fuse = DEATH_LINGER_TICS;
        } else {
            entity.fuse -= 1;
        }
        entity.fuse > 1
    };
    if lingering {
        return true;
    }

    let player = world.entity(handle).and_then(|entity| entity.player);
    if player.is_some() {
        revive_player_kart(world, handle)
    } else {
        world.remove(handle);
        false
    }
}

/// Put a dead player kart back on track at its recorded starting slot. The
/// roster entry survives; only the entity state is reset.
fn revive_player_kart(world: &mut SimulationWorld, handle: Handle) -> bool {
    let spawn_health = world
        .entity(handle)
        .and_then(|entity| world.kind_info(entity.kind))
        .map(|info| info.spawn_health)
        .unwrap_or(1);
    {
        let Some(entity) = world.entity_mut(handle) else {
            return false;
        };
        entity.pos.x = Fixed::from_int(entity.extra1);
        entity.pos.y = Fixed::from_int(entity.extra2);
        entity.momentum = FVec3::ZERO;
        entity.health = spawn_health;
        entity.fuse = 0;
        entity.hit_lag = 10;
        entity
            .flags
            .insert(ObjectFlags::SOLID | ObjectFlags::SHOOTABLE);
    }
    debug!(entity = handle.index(), "player_kart_revived");
    sim::set_player_state(world, handle, states::S_KART_IDLE)
}
