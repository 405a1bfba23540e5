/// Per-tick behavior routing, in strict priority order: pushable category,
/// then boss category, then dead (health gone), then the per-kind regular
/// strategy. Exactly one strategy runs per entity per tick, and every
/// strategy reports liveness back to the scheduler.
pub fn run_entity(world: &mut SimulationWorld, handle: Handle) -> bool {
    let Some(entity) = world.entity(handle) else {
        return false;
    };
    let flags = entity.flags;
    let health = entity.health;

    if flags.contains(ObjectFlags::PUSHABLE) {
        return pushable_think(world, handle);
    }
    if flags.contains(ObjectFlags::BOSS) {
        return boss_think(world, handle);
    }
    if health <= 0 {
        return dead_think(world, handle);
    }
    regular_think(world, handle)
}
