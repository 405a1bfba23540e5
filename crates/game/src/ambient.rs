use sim::{
    AmbientThinker, FVec3, Fixed, Handle, SimulationWorld, TICRATE,
};
use tracing::debug;

use crate::kinds;

const DROPS_PER_PLAYER: usize = 24;
const MAX_DROP_SPAWNS_PER_TICK: usize = 4;
const DROP_SPREAD: u32 = 220;
const DROP_HEIGHT: Fixed = Fixed::from_int(160);
const DROP_FALL_SPEED: Fixed = Fixed::from_int(-4);
const OVERLAY_HEIGHT: Fixed = Fixed::from_int(96);
const LAPS_TO_FINISH: u16 = 3;
const OVERTIME_TICS: u32 = 10 * TICRATE;

/// Driver-phase ambient system: keep a bounded cloud of precipitation
/// around the players. Drops remove themselves on landing; this pass tops
/// the population back up, a few per tick so spawn cost stays flat.
pub fn precipitation_system(world: &mut SimulationWorld) {
    let anchors: Vec<FVec3> = world
        .players()
        .iter()
        .filter_map(|player| world.entity(player.entity).map(|entity| entity.pos))
        .collect();
    if anchors.is_empty() {
        return;
    }
    let target = DROPS_PER_PLAYER * anchors.len();
    let current = world
        .entity_handles()
        .iter()
        .filter(|handle| {
            world
                .entity(**handle)
                .map(|entity| entity.kind == kinds::RAIN_DROP)
                .unwrap_or(false)
        })
        .count();
    if current >= target {
        return;
    }
    let missing = (target - current).min(MAX_DROP_SPAWNS_PER_TICK);
    for index in 0..missing {
        let anchor = anchors[index % anchors.len()];
        let offset_x = Fixed::from_int(world.rng_mut().spread(DROP_SPREAD));
        let offset_y = Fixed::from_int(world.rng_mut().spread(DROP_SPREAD));
        let drop = world.spawn(
            kinds::RAIN_DROP,
            FVec3::new(anchor.x + offset_x, anchor.y + offset_y, anchor.z + DROP_HEIGHT),
            sim::Angle::ZERO,
        );
        if let Some(entity) = world.entity_mut(drop) {
            entity.momentum.z = DROP_FALL_SPEED;
        }
    }
}

/// Scheduler-resident ambient node: repositions a decorative overlay above
/// whichever kart currently leads. Runs on the early ambient list so the
/// overlay trails the leader's previous tick, not a half-moved one.
pub struct OverlayDrifter {
    pub overlay: Handle,
}

impl AmbientThinker for OverlayDrifter {
    fn think(&mut self, world: &mut SimulationWorld, _me: Handle) {
        let leader = world
            .players()
            .iter()
            .min_by_key(|player| player.rank)
            .map(|player| player.entity);
        let Some(leader) = leader else {
            return;
        };
        let Some(goal) = world.entity(leader).map(|entity| entity.pos) else {
            return;
        };
        if !world.is_live(self.overlay) {
            return;
        }
        if let Some(entity) = world.entity_mut(self.overlay) {
            let desired = FVec3::new(goal.x, goal.y, goal.z + OVERLAY_HEIGHT);
            // Eighth-per-tick chase keeps the drift readable.
            entity.pos.x += Fixed((desired.x - entity.pos.x).raw() >> 3);
            entity.pos.y += Fixed((desired.y - entity.pos.y).raw() >> 3);
            entity.pos.z += Fixed((desired.z - entity.pos.z).raw() >> 3);
        }
    }
}

/// After-all-entities pass: standings. Runs only once every entity has
/// moved this tick, so ranks are computed from settled positions.
pub fn rank_pass(world: &mut SimulationWorld) {
    let mut order: Vec<(u8, u16, i64)> = world
        .players()
        .iter()
        .enumerate()
        .map(|(index, player)| {
            let progress = world
                .entity(player.entity)
                .map(|entity| entity.pos.x.raw() as i64 + entity.pos.y.raw() as i64)
                .unwrap_or(i64::MIN);
            (index as u8, player.laps, progress)
        })
        .collect();
    order.sort_by(|a, b| b.1.cmp(&a.1).then(b.2.cmp(&a.2)).then(a.0.cmp(&b.0)));

    let mut all_finished = !order.is_empty();
    for (rank, (index, laps, _)) in order.iter().enumerate() {
        let finished = *laps >= LAPS_TO_FINISH;
        if let Some(player) = world.player_mut(*index) {
            player.rank = rank as u8;
            if finished && !player.finished {
                player.finished = true;
                debug!(player = *index, rank, "player_finished");
            }
        }
        all_finished &= finished;
    }

    // Everyone home: start the end-of-round countdown exactly once.
    if all_finished && world.countdown().is_none() {
        world.set_countdown(OVERTIME_TICS);
    }
}
