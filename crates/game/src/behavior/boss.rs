/// Boss strategy: the core retargets, hovers toward its quarry, and fires
/// on a cooldown; turret parts orbit the core through the chain relation.
/// Boss kinds handle their own death here because the boss route outranks
/// the dead route.
fn boss_think(world: &mut SimulationWorld, handle: Handle) -> bool {
    let Some(entity) = world.entity(handle) else {
        return false;
    };
    let kind = entity.kind;
    let health = entity.health;

    if health <= 0 {
        return boss_dying(world, handle, kind);
    }
    match kind {
        kinds::BOSS_CORE => boss_core_think(world, handle),
        kinds::BOSS_TURRET => boss_turret_think(world, handle),
        _ => true,
    }
}

fn boss_dying(world: &mut SimulationWorld, handle: Handle, kind: KindId) -> bool {
    if kind != kinds::BOSS_CORE {
        // Turret parts go out with a single blast.
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
    let Some(entity) = world.entity_mut(handle) else {
        return false;
    };
    entity.momentum = FVec3::ZERO;
    let in_death_anim = matches!(
        entity.state,
        states::S_BOSS_DIE1 | states::S_BOSS_DIE2 | states::S_BOSS_DIE3
    );
    if in_death_anim {
        return true;
    }
    sim::set_state(world, handle, states::S_BOSS_DIE1)
}

fn boss_core_think(world: &mut SimulationWorld, handle: Handle) -> bool {
    // Retarget on a fixed cadence; a removed target reads as absent and is
    // replaced on the next retarget tick.
    let retarget = {
        let Some(entity) = world.entity_mut(handle) else {
            return false;
        };
        if entity.threshold > 0 {
            entity.threshold -= 1;
            false
        } else {
            entity.threshold = BOSS_RETARGET_TICS;
            true
        }
    };
    if retarget || world.relation(handle, RelationSlot::Target).is_none() {
        let quarry = nearest_kart(world, handle, Handle::NULL);
        world.set_relation(handle, RelationSlot::Target, quarry);
    }

    // Dormant until a kart wanders into range; a sleeping boss keeps its
    // target bookkeeping but neither moves nor fires.
    let awake = match world.relation(handle, RelationSlot::Target) {
        Some(quarry) => {
            let (Some(core), Some(target)) = (world.entity(handle), world.entity(quarry)) else {
                return world.is_live(handle);
            };
            approx_dist(target.pos.x - core.pos.x, target.pos.y - core.pos.y)
                <= BOSS_AWAKE_RANGE
        }
        None => false,
    };
    if !awake {
        if let Some(entity) = world.entity_mut(handle) {
            entity.momentum = FVec3::ZERO;
        }
        return true;
    }

    if let Some(quarry) = world.relation(handle, RelationSlot::Target) {
        let (Some(core), Some(target)) = (world.entity(handle), world.entity(quarry)) else {
            return world.is_live(handle);
        };
        let speed = world
            .kind_info(kinds::BOSS_CORE)
            .map(|info| info.speed)
            .unwrap_or(Fixed::from_int(6));
        let aim = coarse_yaw_toward(core.pos, target.pos);
        let (dir_x, dir_y) = aim.unit_vector();
        let hover_goal = target.pos.z + BOSS_HOVER_HEIGHT;
        let climb = Fixed((hover_goal - core.pos.z).raw() >> 4);
        if let Some(entity) = world.entity_mut(handle) {
            entity.momentum.x = dir_x.mul(speed);
            entity.momentum.y = dir_y.mul(speed);
            entity.momentum.z = climb;
            entity.yaw = aim;
        }
    }

    // Fire on cooldown; the shoot state's entry action spawns the shell.
    let fire = {
        let Some(entity) = world.entity_mut(handle) else {
            return false;
        };
        if entity.move_count > 0 {
            entity.move_count -= 1;
            false
        } else {
            entity.move_count = BOSS_FIRE_COOLDOWN_TICS;
            entity.state != states::S_BOSS_SHOOT
        }
    };
    if fire {
        return sim::set_state(world, handle, states::S_BOSS_SHOOT);
    }
    true
}

fn boss_turret_think(world: &mut SimulationWorld, handle: Handle) -> bool {
    // Composite ordering contract: turrets always spawn after their core,
    // so they think after it and may read its position from this tick.
    let Some(core) = world.relation(handle, RelationSlot::ChainPrev) else {
        // Core gone: the part does not outlive the whole.
        world.remove(handle);
        return false;
    };
    let (Some(part), Some(anchor)) = (world.entity(handle), world.entity(core)) else {
        return world.is_live(handle);
    };
    let phase = Angle((part.extra1 as u32).wrapping_mul(1 << 24))
        .turned(Angle((world.current_tick() as u32).wrapping_mul(1 << 25)));
    let (orbit_x, orbit_y) = phase.unit_vector();
    let desired = FVec3::new(
        anchor.pos.x + orbit_x.mul(TURRET_ORBIT_RADIUS),
        anchor.pos.y + orbit_y.mul(TURRET_ORBIT_RADIUS),
        anchor.pos.z + Fixed::from_int(24),
    );
    let current = part.pos;
    if let Some(entity) = world.entity_mut(handle) {
        entity.momentum = desired - current;
        entity.yaw = phase;
    }
    true
}
