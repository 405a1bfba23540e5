/// Pushable strategy: soak momentum from whoever is shoving, with heavier
/// friction than a freely rolling object. A broken pushable (health gone)
/// pops into smoke here, because the pushable route outranks the dead
/// route.
fn pushable_think(world: &mut SimulationWorld, handle: Handle) -> bool {
    let Some(entity) = world.entity(handle) else {
        return false;
    };
    if entity.health <= 0 {
        let (pos, yaw) = (entity.pos, entity.yaw);
        let _ = world.spawn(kinds::SMOKE, pos, yaw);
        world.remove(handle);
        return false;
    }

    // The integrator already transfers shove momentum from whoever bumped
    // us; a kart still pressed flush against the crate keeps feeding it.
    if let Some(pusher) = find_touching_kart(world, handle) {
        let shove = world
            .entity(pusher)
            .map(|kart| (kart.momentum.x, kart.momentum.y))
            .unwrap_or((Fixed::ZERO, Fixed::ZERO));
        if let Some(entity) = world.entity_mut(handle) {
            entity.momentum.x += shove.0.mul(CRATE_PUSH_TRANSFER);
            entity.momentum.y += shove.1.mul(CRATE_PUSH_TRANSFER);
        }
    }

    let Some(entity) = world.entity_mut(handle) else {
        return false;
    };
    if entity.eflags.contains(EntityFlags::ON_GROUND) {
        entity.momentum.x = entity.momentum.x.mul(CRATE_EXTRA_FRICTION);
        entity.momentum.y = entity.momentum.y.mul(CRATE_EXTRA_FRICTION);
    }
    true
}
