use std::collections::VecDeque;

use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{info, warn};

use crate::command::InputCommand;
use crate::entity::{Entity, KindId, KindInfo, ObjectFlags, RelationSlot, RELATION_SLOTS};
use crate::fixed::{Angle, FVec3, Fixed};
use crate::hooks::{EffectId, EffectSink, HookOutcome, NoHooks, NullEffects, SimHooks};
use crate::level::{LevelMap, Sector, SpawnPoint};
use crate::physics;
use crate::pool::{Arena, Handle, ThinkKind};
use crate::rng::SimRng;
use crate::scheduler::{self, AmbientThinker, ThinkList};
use crate::state::{self, PlayerAnim, SpriteTag, StateDef, StateId};

const DAMAGE_HIT_LAG_TICS: i32 = 6;

/// Per-tick behavior entry point installed by the content crate. Returns
/// whether the entity survived its own behavior.
pub type BehaviorFn = fn(&mut SimulationWorld, Handle) -> bool;

/// High-level player think; consumes one input command. Returns liveness.
pub type PlayerThinkFn = fn(&mut SimulationWorld, Handle, InputCommand) -> bool;

/// A driver-phase pass over the whole world (ambient systems, post-think).
pub type WorldPassFn = fn(&mut SimulationWorld);

fn no_behavior(_world: &mut SimulationWorld, _entity: Handle) -> bool {
    true
}

fn no_player_think(_world: &mut SimulationWorld, _entity: Handle, _cmd: InputCommand) -> bool {
    true
}

fn default_player_anim(_state: StateId) -> PlayerAnim {
    PlayerAnim::Idle
}

/// Everything the kernel needs from the content crate, bundled so multiple
/// independent worlds can run side by side (and so tests can swap in tiny
/// tables).
pub struct WorldConfig {
    pub states: Vec<StateDef>,
    pub kinds: Vec<KindInfo>,
    pub level: LevelMap,
    pub behavior: BehaviorFn,
    pub player_think: PlayerThinkFn,
    pub player_anim: fn(StateId) -> PlayerAnim,
    pub ambient_systems: Vec<WorldPassFn>,
    pub post_think: Option<WorldPassFn>,
    /// Spawned when an entity enters a liquid surface.
    pub splash_kind: Option<KindId>,
    /// Substitute for unknown kind identifiers at spawn.
    pub fallback_kind: KindId,
    pub max_entities: u32,
}

impl WorldConfig {
    pub fn minimal(states: Vec<StateDef>, kinds: Vec<KindInfo>, level: LevelMap) -> WorldConfig {
        WorldConfig {
            states,
            kinds,
            level,
            behavior: no_behavior,
            player_think: no_player_think,
            player_anim: default_player_anim,
            ambient_systems: Vec::new(),
            post_think: None,
            splash_kind: None,
            fallback_kind: KindId(0),
            max_entities: 2_048,
        }
    }
}

#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum SpawnError {
    #[error("unknown kind identifier {kind}")]
    UnknownKind { kind: u16 },
}

/// Free camera attached to a player. Camera-only movement is the single
/// thing that still advances while the driver is paused.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FreeCamera {
    pub pos: FVec3,
    pub yaw: Angle,
}

impl FreeCamera {
    pub(crate) fn apply(&mut self, cmd: InputCommand) {
        // Aim swings the camera; steering drifts it sideways a touch.
        self.yaw = self
            .yaw
            .turned(Angle((cmd.aim as i32 as u32).wrapping_mul(65_536)));
        let (dir_x, dir_y) = self.yaw.unit_vector();
        let forward = Fixed::from_int(cmd.throttle as i32).div(Fixed::from_int(32));
        self.pos.x += dir_x.mul(forward);
        self.pos.y += dir_y.mul(forward);
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Player {
    pub entity: Handle,
    pub cmd: InputCommand,
    pub anim: PlayerAnim,
    pub camera: FreeCamera,
    pub rank: u8,
    pub laps: u16,
    pub finished: bool,
}

#[derive(Debug, Clone, Copy)]
struct QueuedSpawn {
    point: SpawnPoint,
    delay: u32,
}

/// Previous/current transform pair exposed to the presentation boundary
/// after every tick; the renderer interpolates between the two.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityView {
    pub handle: Handle,
    pub kind: KindId,
    pub prev_pos: FVec3,
    pub pos: FVec3,
    pub yaw: Angle,
    pub scale: Fixed,
    pub sprite: SpriteTag,
    pub frame: u8,
}

/// The whole simulation: arena, scheduler lists, level, RNG, players, and
/// every per-tick singleton the source kept global. One logical thread of
/// control mutates it; passing it explicitly is what lets independent
/// simulations coexist.
pub struct SimulationWorld {
    config: WorldConfig,
    arena: Arena,
    rng: SimRng,
    tick: u64,
    paused: bool,
    global_freeze: bool,
    players: Vec<Player>,
    respawn_queue: VecDeque<QueuedSpawn>,
    countdown: Option<u32>,
    hooks: Box<dyn SimHooks>,
    effects: Box<dyn EffectSink>,
    frame_views: Vec<EntityView>,
}

impl SimulationWorld {
    pub fn new(config: WorldConfig, seed: u32) -> SimulationWorld {
        let arena = Arena::new(config.max_entities);
        SimulationWorld {
            config,
            arena,
            rng: SimRng::new(seed),
            tick: 0,
            paused: false,
            global_freeze: false,
            players: Vec::new(),
            respawn_queue: VecDeque::new(),
            countdown: None,
            hooks: Box::new(NoHooks),
            effects: Box::new(NullEffects),
            frame_views: Vec::new(),
        }
    }

    pub fn set_hooks(&mut self, hooks: Box<dyn SimHooks>) {
        self.hooks = hooks;
    }

    pub fn set_effect_sink(&mut self, effects: Box<dyn EffectSink>) {
        self.effects = effects;
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    pub fn level(&self) -> &LevelMap {
        &self.config.level
    }

    /// Cloned sector snapshot; lets physics read geometry while mutating
    /// the entity it is moving.
    pub(crate) fn sector_snapshot(&self, x: Fixed, y: Fixed) -> Sector {
        self.config.level.sector_at(x, y).clone()
    }

    pub fn current_tick(&self) -> u64 {
        self.tick
    }

    pub(crate) fn advance_tick(&mut self) {
        self.tick = self.tick.saturating_add(1);
    }

    pub fn rng_mut(&mut self) -> &mut SimRng {
        &mut self.rng
    }

    pub fn state_def(&self, id: StateId) -> Option<StateDef> {
        self.config.states.get(id.0 as usize).copied()
    }

    pub fn kind_info(&self, kind: KindId) -> Option<KindInfo> {
        self.config.kinds.get(kind.0 as usize).copied()
    }

    pub(crate) fn arena(&self) -> &Arena {
        &self.arena
    }

    pub(crate) fn arena_mut(&mut self) -> &mut Arena {
        &mut self.arena
    }

    // -------------------------------------------------- lifecycle

    /// Spawn with category defaults. Unknown kinds are a recoverable content
    /// error: warn and substitute the configured fallback. The spawn hook
    /// runs last and may remove the new entity, so re-check liveness.
    pub fn spawn(&mut self, kind: KindId, pos: FVec3, yaw: Angle) -> Handle {
        match self.try_spawn(kind, pos, yaw) {
            Ok(handle) => handle,
            Err(error) => {
                warn!(kind = kind.0, error = %error, "spawn_unknown_kind");
                let fallback = self.config.fallback_kind;
                let info = self
                    .kind_info(fallback)
                    .unwrap_or_else(|| KindInfo::placeholder("fallback"));
                self.spawn_with_info(fallback, info, pos, yaw)
            }
        }
    }

    pub fn try_spawn(
        &mut self,
        kind: KindId,
        pos: FVec3,
        yaw: Angle,
    ) -> Result<Handle, SpawnError> {
        let info = self
            .kind_info(kind)
            .ok_or(SpawnError::UnknownKind { kind: kind.0 })?;
        Ok(self.spawn_with_info(kind, info, pos, yaw))
    }

    /// Spawn resting on the sector floor under (x, y).
    pub fn spawn_on_floor(&mut self, kind: KindId, x: Fixed, y: Fixed, yaw: Angle) -> Handle {
        let floor = self.config.level.sector_at(x, y).floor_z_at(x, y);
        self.spawn(kind, FVec3::new(x, y, floor), yaw)
    }

    fn spawn_with_info(
        &mut self,
        kind: KindId,
        info: KindInfo,
        pos: FVec3,
        yaw: Angle,
    ) -> Handle {
        let mut entity = Entity::from_kind(kind, &info, pos, yaw);
        // State fields are copied directly: the entry action of the spawn
        // state does not run at spawn time (the spawn hook covers that).
        if !info.spawn_state.is_null() {
            if let Some(def) = self.config.states.get(info.spawn_state.0 as usize) {
                entity.tics = def.tics;
                entity.sprite = def.sprite;
                entity.frame = def.frame;
            }
        }
        let handle = self.arena.allocate_entity(entity);
        let list = if info.flags.contains(ObjectFlags::PRECIPITATION) {
            ThinkList::Precipitation
        } else {
            ThinkList::Entity
        };
        scheduler::link_tail(&mut self.arena, handle.index(), list);
        physics::refresh_position_caches(self, handle);
        self.hook_spawn(handle);
        handle
    }

    /// Mark an entity removed. Deferred: the slot is excised by the next
    /// scheduler walk and pooled once its reference count drains. After this
    /// call the entity is dead to every accessor; only `husk` still sees it.
    pub fn remove(&mut self, handle: Handle) {
        if !self.arena.matches(handle) {
            return;
        }
        if let Some(entity) = self.arena.entity_raw(handle) {
            if entity.removed {
                return;
            }
        } else {
            return;
        }
        if let Some(entity) = self.arena.entity_raw_mut(handle) {
            entity.removed = true;
        }
        // A husk must not pin other entities: drop outgoing references now.
        for slot in RELATION_SLOTS {
            self.set_relation(handle, slot, None);
        }
        self.arena.slot_mut(handle.index()).think = ThinkKind::RemovalPending;
        self.hook_removal(handle);
    }

    /// Mark an ambient scheduler node for deferred removal.
    pub fn remove_thinker(&mut self, handle: Handle) {
        if !self.arena.matches(handle) {
            return;
        }
        let slot = self.arena.slot_mut(handle.index());
        if slot.think == ThinkKind::Ambient {
            slot.think = ThinkKind::RemovalPending;
        }
    }

    pub fn add_ambient(&mut self, list: ThinkList, thinker: Box<dyn AmbientThinker>) -> Handle {
        let handle = self.arena.allocate_ambient(thinker);
        scheduler::link_tail(&mut self.arena, handle.index(), list);
        handle
    }

    // -------------------------------------------------- access

    pub fn is_live(&self, handle: Handle) -> bool {
        self.entity(handle).is_some()
    }

    pub fn entity(&self, handle: Handle) -> Option<&Entity> {
        self.arena
            .entity_raw(handle)
            .filter(|entity| !entity.removed)
    }

    pub fn entity_mut(&mut self, handle: Handle) -> Option<&mut Entity> {
        self.arena
            .entity_raw_mut(handle)
            .filter(|entity| !entity.removed)
    }

    /// Removed-entity husk access, for hooks and diagnostics only.
    pub fn husk(&self, handle: Handle) -> Option<&Entity> {
        self.arena.entity_raw(handle)
    }

    pub fn ref_count(&self, handle: Handle) -> u32 {
        if self.arena.matches(handle) {
            self.arena.ref_count(handle.index())
        } else {
            0
        }
    }

    /// Live entity handles in scheduler walk order.
    pub fn entity_handles(&self) -> Vec<Handle> {
        let mut handles = Vec::new();
        for list in [ThinkList::Entity, ThinkList::Precipitation] {
            for handle in scheduler::list_handles(&self.arena, list) {
                if self.is_live(handle) {
                    handles.push(handle);
                }
            }
        }
        handles
    }

    pub fn live_entity_count(&self) -> usize {
        self.entity_handles().len()
    }

    /// Occupied pool slots, removed-but-referenced husks included.
    pub fn allocated_slots(&self) -> u32 {
        self.arena.allocated()
    }

    // -------------------------------------------------- relations

    /// Reassign a named relation. Decrements the old target's count (exactly
    /// once), increments the new one's; a no-op when old and new are the
    /// same, so repeated assignment cannot double-count. The counts are the
    /// sole mechanism keeping removed targets allocated.
    pub fn set_relation(&mut self, holder: Handle, slot: RelationSlot, target: Option<Handle>) {
        let new = target.unwrap_or(Handle::NULL);
        let old = match self.arena.entity_raw(holder) {
            Some(entity) => entity.relations.get(slot),
            None => return,
        };
        if old == new {
            return;
        }
        if !old.is_null() {
            if !self.arena.matches(old) {
                // The count should have kept the slot alive; a stale handle
                // here means the invariant is already broken.
                panic!("relation slot held a stale handle (index {})", old.index());
            }
            let remaining = self.arena.ref_dec(old.index());
            if remaining == 0 {
                let slot_state = self.arena.slot(old.index());
                if slot_state.think == ThinkKind::RemovalPending && slot_state.list.is_none() {
                    // Unlinked husk just lost its last reference; the next
                    // scheduler pass returns it to the pool.
                    self.arena.pending_reap.push(old.index());
                }
            }
        }
        if !new.is_null() {
            if !self.arena.matches(new) {
                panic!("relation target is a stale handle (index {})", new.index());
            }
            self.arena.ref_inc(new.index());
        }
        if let Some(entity) = self.arena.entity_raw_mut(holder) {
            entity.relations.set(slot, new);
        }
    }

    /// Resolve a relation to a live entity. Removed targets read as absent;
    /// the soft-skip path for behaviors whose interest died this tick.
    pub fn relation(&self, holder: Handle, slot: RelationSlot) -> Option<Handle> {
        let entity = self.entity(holder)?;
        let target = entity.relations.get(slot);
        if target.is_null() || !self.is_live(target) {
            None
        } else {
            Some(target)
        }
    }

    // -------------------------------------------------- combat

    /// Apply damage through the hook boundary. Returns whether the target is
    /// still alive afterwards; callers must branch on it.
    pub fn damage(&mut self, target: Handle, source: Handle, amount: i32) -> bool {
        let Some(entity) = self.entity(target) else {
            return false;
        };
        if !entity.flags.contains(ObjectFlags::SHOOTABLE) {
            return true;
        }
        if self.hook_damage(target, source, amount) {
            return self.is_live(target);
        }
        if !self.is_live(target) {
            return false;
        }
        let remaining = {
            let Some(entity) = self.entity_mut(target) else {
                return false;
            };
            entity.health -= amount;
            entity.health
        };
        if remaining <= 0 {
            self.kill(target)
        } else {
            if let Some(entity) = self.entity_mut(target) {
                entity.hit_lag = DAMAGE_HIT_LAG_TICS;
            }
            true
        }
    }

    fn kill(&mut self, target: Handle) -> bool {
        let death_state = self
            .entity(target)
            .and_then(|entity| self.kind_info(entity.kind))
            .map(|info| info.death_state)
            .unwrap_or(StateId::NULL);
        let is_player = self
            .entity(target)
            .map(|entity| entity.player.is_some())
            .unwrap_or(false);
        if let Some(entity) = self.entity_mut(target) {
            entity
                .flags
                .remove(ObjectFlags::SOLID | ObjectFlags::SHOOTABLE);
        }
        if death_state.is_null() {
            self.remove(target);
            false
        } else if is_player {
            state::set_player_state(self, target, death_state)
        } else {
            state::set_state(self, target, death_state)
        }
    }

    pub fn play_effect(&mut self, source: Handle, effect: EffectId) {
        self.effects.play(source, effect);
    }

    // -------------------------------------------------- players

    pub fn add_player(&mut self, entity: Handle) -> u8 {
        let index = self.players.len() as u8;
        if let Some(e) = self.entity_mut(entity) {
            e.player = Some(index);
            e.flags.insert(ObjectFlags::PLAYER);
        }
        self.players.push(Player {
            entity,
            cmd: InputCommand::neutral(),
            anim: PlayerAnim::Idle,
            camera: FreeCamera::default(),
            rank: 0,
            laps: 0,
            finished: false,
        });
        index
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn players_mut(&mut self) -> &mut [Player] {
        &mut self.players
    }

    pub fn player(&self, index: u8) -> Option<&Player> {
        self.players.get(index as usize)
    }

    pub fn player_mut(&mut self, index: u8) -> Option<&mut Player> {
        self.players.get_mut(index as usize)
    }

    pub(crate) fn set_player_anim(&mut self, entity: Handle, anim: PlayerAnim) {
        let player_index = self.entity(entity).and_then(|e| e.player);
        if let Some(index) = player_index {
            if let Some(player) = self.players.get_mut(index as usize) {
                player.anim = anim;
            }
        }
    }

    // -------------------------------------------------- pause / freeze

    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    pub fn paused(&self) -> bool {
        self.paused
    }

    pub fn set_global_freeze(&mut self, frozen: bool) {
        self.global_freeze = frozen;
    }

    pub fn global_freeze(&self) -> bool {
        self.global_freeze
    }

    /// The per-entity frozen predicate: manual flag, hit-reaction window, or
    /// the global freeze override. Frozen entities are still walked by the
    /// scheduler: their execution is skipped, not their bookkeeping.
    pub fn entity_frozen(&self, handle: Handle) -> bool {
        if self.global_freeze {
            return true;
        }
        self.entity(handle)
            .map(|entity| entity.frozen || entity.hit_lag > 0)
            .unwrap_or(false)
    }

    // -------------------------------------------------- respawn / countdown

    pub fn queue_respawn(&mut self, point: SpawnPoint, delay_tics: u32) {
        self.respawn_queue.push_back(QueuedSpawn {
            point,
            delay: delay_tics,
        });
    }

    pub fn respawn_queue_len(&self) -> usize {
        self.respawn_queue.len()
    }

    pub(crate) fn process_respawn_queue(&mut self) {
        let mut ready = Vec::new();
        for queued in self.respawn_queue.iter_mut() {
            if queued.delay == 0 {
                ready.push(queued.point);
            } else {
                queued.delay -= 1;
            }
        }
        self.respawn_queue.retain(|queued| queued.delay > 0);
        for point in ready {
            let pos = FVec3::new(point.x, point.y, point.z);
            let handle = self.spawn(KindId(point.kind), pos, point.angle);
            if self.is_live(handle) {
                info!(kind = point.kind, "respawned");
            }
        }
    }

    pub fn set_countdown(&mut self, tics: u32) {
        self.countdown = Some(tics);
    }

    pub fn countdown(&self) -> Option<u32> {
        self.countdown
    }

    pub fn countdown_expired(&self) -> bool {
        self.countdown == Some(0)
    }

    pub(crate) fn tick_countdown(&mut self) {
        if let Some(remaining) = self.countdown {
            if remaining > 0 {
                let next = remaining - 1;
                self.countdown = Some(next);
                if next == 0 {
                    info!("countdown_expired");
                }
            }
        }
    }

    // -------------------------------------------------- scheduler

    pub fn run_scheduler_pass(&mut self) {
        scheduler::run_all(self);
    }

    // -------------------------------------------------- hooks

    fn with_hooks<R>(
        &mut self,
        f: impl FnOnce(&mut dyn SimHooks, &mut SimulationWorld) -> R,
    ) -> R {
        let mut hooks = std::mem::replace(&mut self.hooks, Box::new(NoHooks));
        let result = f(hooks.as_mut(), self);
        self.hooks = hooks;
        result
    }

    pub(crate) fn hook_pre_tick(&mut self) {
        self.with_hooks(|hooks, world| hooks.pre_tick(world));
    }

    pub(crate) fn hook_post_tick(&mut self) {
        self.with_hooks(|hooks, world| hooks.post_tick(world));
    }

    fn hook_spawn(&mut self, entity: Handle) {
        self.with_hooks(|hooks, world| hooks.on_spawn(world, entity));
    }

    pub(crate) fn hook_state_entry(&mut self, entity: Handle, state: StateId) -> bool {
        self.with_hooks(|hooks, world| hooks.on_state_entry(world, entity, state))
            == HookOutcome::Veto
    }

    fn hook_damage(&mut self, target: Handle, source: Handle, amount: i32) -> bool {
        self.with_hooks(|hooks, world| hooks.on_damage(world, target, source, amount))
            == HookOutcome::Veto
    }

    fn hook_removal(&mut self, entity: Handle) {
        self.with_hooks(|hooks, world| hooks.on_removal(world, entity));
    }

    // -------------------------------------------------- presentation

    pub(crate) fn rebuild_frame_views(&mut self) {
        let handles = self.entity_handles();
        self.frame_views.clear();
        for handle in handles {
            if let Some(entity) = self.entity(handle) {
                self.frame_views.push(EntityView {
                    handle,
                    kind: entity.kind,
                    prev_pos: entity.prev_pos,
                    pos: entity.pos,
                    yaw: entity.yaw,
                    scale: entity.scale,
                    sprite: entity.sprite,
                    frame: entity.frame,
                });
            }
        }
    }

    pub fn frame_views(&self) -> &[EntityView] {
        &self.frame_views
    }

    // -------------------------------------------------- digest

    /// Canonical hash of all simulated state. Two worlds fed the same
    /// command stream must produce identical digests at every tick; the
    /// replay verifier and the determinism tests both lean on this.
    pub fn digest(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(self.tick.to_le_bytes());
        hasher.update(self.rng.state().to_le_bytes());
        hasher.update(self.rng.draw_count().to_le_bytes());
        for handle in self.entity_handles() {
            if let Some(entity) = self.entity(handle) {
                hasher.update(entity.kind.0.to_le_bytes());
                hasher.update(entity.flags.bits().to_le_bytes());
                hasher.update(entity.eflags.bits().to_le_bytes());
                for value in [
                    entity.pos.x,
                    entity.pos.y,
                    entity.pos.z,
                    entity.momentum.x,
                    entity.momentum.y,
                    entity.momentum.z,
                    entity.scale,
                ] {
                    hasher.update(value.raw().to_le_bytes());
                }
                hasher.update(entity.yaw.raw().to_le_bytes());
                hasher.update(entity.health.to_le_bytes());
                hasher.update(entity.state.0.to_le_bytes());
                hasher.update(entity.tics.to_le_bytes());
                hasher.update(entity.fuse.to_le_bytes());
                hasher.update(entity.threshold.to_le_bytes());
                hasher.update(entity.move_count.to_le_bytes());
                hasher.update(entity.extra1.to_le_bytes());
                hasher.update(entity.extra2.to_le_bytes());
            }
        }
        hasher.finalize().into()
    }

    pub fn digest_hex(&self) -> String {
        use std::fmt::Write;
        let digest = self.digest();
        let mut out = String::with_capacity(64);
        for byte in digest {
            let _ = write!(out, "{byte:02x}");
        }
        out
    }

    /// Per-tick gravity delta for an entity, computed fresh every time it is
    /// needed; surface context can change between any two ticks.
    pub fn gravity_for(&self, handle: Handle) -> Fixed {
        physics::gravity_for(self, handle)
    }
}
