use bitflags::bitflags;

use crate::fixed::{Angle, FVec3, Fixed};
use crate::level::Slope;
use crate::pool::Handle;
use crate::state::{SpriteTag, StateId};

/// Closed object-kind identifier. The content crate owns the enumeration;
/// the kernel only ever indexes the kind table with it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct KindId(pub u16);

bitflags! {
    /// Capability flags fixed at spawn (per kind, though behaviors may flip
    /// individual bits, e.g. dropping SOLID on death).
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    pub struct ObjectFlags: u32 {
        const SOLID          = 1 << 0;
        const SHOOTABLE      = 1 << 1;
        const MISSILE        = 1 << 2;
        const PUSHABLE       = 1 << 3;
        const SCENERY        = 1 << 4;
        const BOSS           = 1 << 5;
        const NO_GRAVITY     = 1 << 6;
        const NO_CLIP        = 1 << 7;
        /// Skips all floor/ceiling interaction, not horizontal blocking.
        const NO_CLIP_HEIGHT = 1 << 8;
        /// Horizontal obstruction reflects momentum instead of stopping it.
        const BOUNCE         = 1 << 9;
        /// Running into a near-vertical wall while ascending a slope
        /// converts horizontal speed into a vertical launch.
        const WALL_KICK      = 1 << 10;
        /// Exempt from lethal-pit removal.
        const PIT_IMMUNE     = 1 << 11;
        /// Lives on the precipitation scheduler list.
        const PRECIPITATION  = 1 << 12;
        /// Player-controlled; thinks in the player phase before the
        /// scheduler pass.
        const PLAYER         = 1 << 13;
    }
}

bitflags! {
    /// Transient per-tick condition flags; physics rewrites these as the
    /// entity moves through the level.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
    pub struct EntityFlags: u32 {
        const ON_GROUND       = 1 << 0;
        const UNDERWATER      = 1 << 1;
        /// Gravity is currently pulling this entity toward the ceiling.
        const VERTICAL_FLIP   = 1 << 2;
        /// Set for the tick in which the entity touched down.
        const JUST_LANDED     = 1 << 3;
        /// Moving uphill along a sloped floor this tick.
        const ASCENDING_SLOPE = 1 << 4;
        /// Last surface contact bordered open sky; a missile carrying this
        /// vanishes quietly instead of detonating.
        const SKY_EXPOSED     = 1 << 5;
    }
}

/// Named counted references an entity can hold to other entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelationSlot {
    /// Primary interest: homing target, boss focus, pickup owner-to-be.
    Target,
    /// Secondary interest: trail anchor, homing beacon.
    Tracer,
    /// Composite-object chain link.
    ChainNext,
    ChainPrev,
    /// The entity responsible for this one (projectile shooter etc).
    Owner,
}

pub const RELATION_SLOTS: [RelationSlot; 5] = [
    RelationSlot::Target,
    RelationSlot::Tracer,
    RelationSlot::ChainNext,
    RelationSlot::ChainPrev,
    RelationSlot::Owner,
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Relations {
    pub target: Handle,
    pub tracer: Handle,
    pub chain_next: Handle,
    pub chain_prev: Handle,
    pub owner: Handle,
}

impl Relations {
    pub fn get(&self, slot: RelationSlot) -> Handle {
        match slot {
            RelationSlot::Target => self.target,
            RelationSlot::Tracer => self.tracer,
            RelationSlot::ChainNext => self.chain_next,
            RelationSlot::ChainPrev => self.chain_prev,
            RelationSlot::Owner => self.owner,
        }
    }

    pub fn set(&mut self, slot: RelationSlot, value: Handle) {
        match slot {
            RelationSlot::Target => self.target = value,
            RelationSlot::Tracer => self.tracer = value,
            RelationSlot::ChainNext => self.chain_next = value,
            RelationSlot::ChainPrev => self.chain_prev = value,
            RelationSlot::Owner => self.owner = value,
        }
    }
}

/// Per-kind defaults applied at spawn. The content crate builds the table;
/// tuning overrides may adjust the numeric fields before the world starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KindInfo {
    pub name: &'static str,
    pub spawn_state: StateId,
    /// Entered on kill; the terminal state removes the entity outright.
    pub death_state: StateId,
    pub spawn_health: i32,
    pub radius: Fixed,
    pub height: Fixed,
    pub speed: Fixed,
    pub damage: i32,
    pub flags: ObjectFlags,
    /// Per-kind gravity multiplier on top of level and sector gravity.
    pub gravity_factor: Fixed,
    /// Spawned at the contact point when a missile of this kind detonates.
    pub death_kind: Option<KindId>,
}

impl KindInfo {
    /// Inert placeholder row; also the recoverable substitute for unknown
    /// kind identifiers at spawn.
    pub const fn placeholder(name: &'static str) -> KindInfo {
        KindInfo {
            name,
            spawn_state: StateId::NULL,
            death_state: StateId::NULL,
            spawn_health: 1,
            radius: Fixed::from_int(8),
            height: Fixed::from_int(16),
            speed: Fixed::ZERO,
            damage: 0,
            flags: ObjectFlags::SCENERY,
            gravity_factor: Fixed::ONE,
            death_kind: None,
        }
    }
}

/// A simulated dynamic object. Everything the integrator, dispatcher, and
/// state machine touch lives here; presentation reads `prev_pos`/`pos` pairs
/// through the frame snapshot and nothing else.
#[derive(Debug, Clone)]
pub struct Entity {
    pub kind: KindId,
    pub flags: ObjectFlags,
    pub eflags: EntityFlags,
    pub pos: FVec3,
    pub prev_pos: FVec3,
    pub momentum: FVec3,
    pub yaw: Angle,
    pub pitch: Angle,
    pub roll: Angle,
    pub radius: Fixed,
    pub height: Fixed,
    pub scale: Fixed,
    pub dest_scale: Fixed,
    pub scale_step: Fixed,
    pub health: i32,
    pub state: StateId,
    /// Remaining tics in the current state; negative means "stay forever".
    pub tics: i32,
    pub sprite: SpriteTag,
    pub frame: u8,
    pub floor_z: Fixed,
    pub ceiling_z: Fixed,
    pub floor_slope: Option<Slope>,
    pub cell: (u32, u32),
    pub relations: Relations,
    /// Once set, no behavior or physics ever runs for this entity again;
    /// the slot lives on only while counted references pin it.
    pub removed: bool,
    /// Manual freeze flag; behaviors set and clear it.
    pub frozen: bool,
    /// Hit-reaction pause window, in tics.
    pub hit_lag: i32,
    /// Player index when this entity is player-controlled.
    pub player: Option<u8>,
    pub fuse: i32,
    pub threshold: i32,
    pub move_count: i32,
    pub extra1: i32,
    pub extra2: i32,
}

impl Entity {
    pub(crate) fn from_kind(kind: KindId, info: &KindInfo, pos: FVec3, yaw: Angle) -> Entity {
        Entity {
            kind,
            flags: info.flags,
            eflags: EntityFlags::default(),
            pos,
            prev_pos: pos,
            momentum: FVec3::ZERO,
            yaw,
            pitch: Angle::ZERO,
            roll: Angle::ZERO,
            radius: info.radius,
            height: info.height,
            scale: Fixed::ONE,
            dest_scale: Fixed::ONE,
            scale_step: Fixed::ZERO,
            health: info.spawn_health,
            state: info.spawn_state,
            tics: 0,
            sprite: SpriteTag::default(),
            frame: 0,
            floor_z: Fixed::ZERO,
            ceiling_z: Fixed::ZERO,
            floor_slope: None,
            cell: (0, 0),
            relations: Relations::default(),
            removed: false,
            frozen: false,
            hit_lag: 0,
            player: None,
            fuse: 0,
            threshold: 0,
            move_count: 0,
            extra1: 0,
            extra2: 0,
        }
    }

    pub fn is_airborne(&self) -> bool {
        !self.eflags.contains(EntityFlags::ON_GROUND)
    }

    /// Scaled bounding radius/height; scale applies to collision extent.
    pub fn scaled_radius(&self) -> Fixed {
        self.radius.mul(self.scale)
    }

    pub fn scaled_height(&self) -> Fixed {
        self.height.mul(self.scale)
    }

    pub fn top_z(&self) -> Fixed {
        self.pos.z + self.scaled_height()
    }

    /// Step toward `dest_scale` by `scale_step` per tick, clamping at the
    /// destination so grow and shrink both settle exactly.
    pub(crate) fn step_scale(&mut self) {
        if self.scale == self.dest_scale || self.scale_step.is_zero() {
            return;
        }
        if self.scale < self.dest_scale {
            self.scale = (self.scale + self.scale_step).min(self.dest_scale);
        } else {
            self.scale = (self.scale - self.scale_step).max(self.dest_scale);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_info() -> KindInfo {
        KindInfo {
            name: "test",
            spawn_state: StateId(3),
            death_state: StateId::NULL,
            spawn_health: 40,
            radius: Fixed::from_int(12),
            height: Fixed::from_int(24),
            speed: Fixed::from_int(4),
            damage: 0,
            flags: ObjectFlags::SOLID | ObjectFlags::SHOOTABLE,
            gravity_factor: Fixed::ONE,
            death_kind: None,
        }
    }

    #[test]
    fn from_kind_applies_category_defaults() {
        let info = test_info();
        let pos = FVec3::new(Fixed::from_int(10), Fixed::from_int(20), Fixed::ZERO);
        let entity = Entity::from_kind(KindId(5), &info, pos, Angle::from_degrees(90));
        assert_eq!(entity.kind, KindId(5));
        assert_eq!(entity.health, 40);
        assert_eq!(entity.radius, Fixed::from_int(12));
        assert_eq!(entity.state, StateId(3));
        assert_eq!(entity.prev_pos, pos);
        assert!(entity.flags.contains(ObjectFlags::SOLID));
        assert!(!entity.removed);
    }

    #[test]
    fn scaled_extents_follow_scale() {
        let mut entity = Entity::from_kind(
            KindId(0),
            &test_info(),
            FVec3::ZERO,
            Angle::ZERO,
        );
        entity.scale = Fixed::HALF;
        assert_eq!(entity.scaled_radius(), Fixed::from_int(6));
        assert_eq!(entity.scaled_height(), Fixed::from_int(12));
    }

    #[test]
    fn step_scale_grows_and_clamps_at_destination() {
        let mut entity = Entity::from_kind(KindId(0), &test_info(), FVec3::ZERO, Angle::ZERO);
        entity.dest_scale = Fixed::from_int(2);
        entity.scale_step = Fixed::from_raw(3 << 15); // 1.5 per tick
        entity.step_scale();
        assert_eq!(entity.scale, Fixed::from_int(2));
        entity.step_scale();
        assert_eq!(entity.scale, Fixed::from_int(2));
    }

    #[test]
    fn step_scale_shrinks_toward_destination() {
        let mut entity = Entity::from_kind(KindId(0), &test_info(), FVec3::ZERO, Angle::ZERO);
        entity.scale = Fixed::from_int(2);
        entity.dest_scale = Fixed::ONE;
        entity.scale_step = Fixed::HALF;
        entity.step_scale();
        assert_eq!(entity.scale, Fixed::ONE + Fixed::HALF);
        entity.step_scale();
        entity.step_scale();
        assert_eq!(entity.scale, Fixed::ONE);
    }

    #[test]
    fn relations_get_set_round_trip() {
        let mut relations = Relations::default();
        let handle = Handle::from_parts(9, 2);
        for slot in RELATION_SLOTS {
            assert!(relations.get(slot).is_null());
            relations.set(slot, handle);
            assert_eq!(relations.get(slot), handle);
        }
    }
}
