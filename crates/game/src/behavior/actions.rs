// State-entry action callbacks. Every one of these can run mid-transition,
// so anything they touch is re-checked for liveness by the state machine
// before it continues.

/// Explosion entry: one-shot boom, then blast damage to every kart in
/// range.
pub fn a_boom(world: &mut SimulationWorld, handle: Handle) {
    world.play_effect(handle, FX_BOOM);
    let Some(entity) = world.entity(handle) else {
        return;
    };
    let center = entity.pos;
    let karts: Vec<Handle> = world
        .entity_handles()
        .into_iter()
        .filter(|other| {
            world
                .entity(*other)
                .map(|e| e.kind == kinds::KART)
                .unwrap_or(false)
        })
        .collect();
    for kart in karts {
        let Some(target) = world.entity(kart) else {
            continue;
        };
        let dist = approx_dist(target.pos.x - center.x, target.pos.y - center.y);
        if dist <= BLAST_RADIUS {
            let _ = spin_out_kart(world, kart, handle);
            if !world.is_live(handle) {
                return;
            }
        }
    }
}

/// Item box pop: sparks, a pop sound, and the box queues its own respawn
/// before its state chain removes it.
pub fn a_item_pop(world: &mut SimulationWorld, handle: Handle) {
    world.play_effect(handle, FX_ITEM_POP);
    let Some(entity) = world.entity(handle) else {
        return;
    };
    let pos = entity.pos;
    let yaw = entity.yaw;
    let kind = entity.kind;
    for index in 0..3u32 {
        let spread_x = Fixed::from_int(world.rng_mut().spread(12));
        let spread_y = Fixed::from_int(world.rng_mut().spread(12));
        let spark = world.spawn(
            kinds::DRIFT_SPARK,
            FVec3::new(pos.x + spread_x, pos.y + spread_y, pos.z + Fixed::from_int(8)),
            yaw.turned(Angle(index.wrapping_mul(0x5555_5555))),
        );
        if let Some(entity) = world.entity_mut(spark) {
            entity.momentum.z = Fixed::from_int(3);
        }
    }
    world.queue_respawn(
        SpawnPoint {
            kind: kind.0,
            x: pos.x,
            y: pos.y,
            z: pos.z,
            angle: yaw,
        },
        ITEM_BOX_RESPAWN_TICS,
    );
}

/// Boss shoot frame: lob a shell at the current target.
pub fn a_boss_fire(world: &mut SimulationWorld, handle: Handle) {
    let Some(target) = world.relation(handle, RelationSlot::Target) else {
        return;
    };
    let (Some(boss), Some(victim)) = (world.entity(handle), world.entity(target)) else {
        return;
    };
    let origin = boss.pos;
    let aim = coarse_yaw_toward(origin, victim.pos);
    let (dir_x, dir_y) = aim.unit_vector();
    let speed = world
        .kind_info(kinds::GREEN_SHELL)
        .map(|info| info.speed)
        .unwrap_or(Fixed::from_int(24));
    let muzzle = FVec3::new(
        origin.x + dir_x.mul(Fixed::from_int(40)),
        origin.y + dir_y.mul(Fixed::from_int(40)),
        origin.z + Fixed::from_int(16),
    );
    let shell = world.spawn(kinds::GREEN_SHELL, muzzle, aim);
    if !world.is_live(shell) {
        return;
    }
    world.set_relation(shell, RelationSlot::Owner, Some(handle));
    if let Some(entity) = world.entity_mut(shell) {
        entity.momentum.x = dir_x.mul(speed);
        entity.momentum.y = dir_y.mul(speed);
        entity.fuse = SHELL_FUSE_TICS;
    }
    debug!(target = target.index(), "boss_fired");
}

/// Boss death frames: scatter explosions around the carcass.
pub fn a_boss_death_blast(world: &mut SimulationWorld, handle: Handle) {
    let Some(entity) = world.entity(handle) else {
        return;
    };
    let pos = entity.pos;
    let yaw = entity.yaw;
    let offset_x = Fixed::from_int(world.rng_mut().spread(40));
    let offset_y = Fixed::from_int(world.rng_mut().spread(40));
    let _ = world.spawn(
        kinds::EXPLOSION,
        FVec3::new(pos.x + offset_x, pos.y + offset_y, pos.z + Fixed::from_int(16)),
        yaw,
    );
}

/// Splash entry: just the fizz.
pub fn a_splash_fizz(world: &mut SimulationWorld, handle: Handle) {
    world.play_effect(handle, FX_SPLASH);
}
