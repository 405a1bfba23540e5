use crate::entity::Entity;
use crate::scheduler::{AmbientThinker, ThinkList};

/// Generation-counted reference to an arena slot. A handle goes stale the
/// moment its slot is returned to the pool; stale handles resolve to `None`
/// everywhere instead of aliasing the slot's next occupant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle {
    index: u32,
    generation: u32,
}

impl Handle {
    pub const NULL: Handle = Handle {
        index: u32::MAX,
        generation: 0,
    };

    pub const fn from_parts(index: u32, generation: u32) -> Handle {
        Handle { index, generation }
    }

    pub const fn index(self) -> u32 {
        self.index
    }

    pub const fn generation(self) -> u32 {
        self.generation
    }

    pub const fn is_null(self) -> bool {
        self.index == u32::MAX
    }
}

impl Default for Handle {
    fn default() -> Handle {
        Handle::NULL
    }
}

/// What the scheduler does when it reaches a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ThinkKind {
    /// List head marker; never executed, never freed.
    Sentinel,
    /// Run the entity think sequence.
    Entity,
    /// Run the boxed ambient procedure.
    Ambient,
    /// Deferred-removal marker: excise on the next walk, free when the
    /// reference count is zero.
    RemovalPending,
}

pub(crate) struct Slot {
    pub(crate) generation: u32,
    pub(crate) ref_count: u32,
    pub(crate) prev: u32,
    pub(crate) next: u32,
    pub(crate) list: Option<ThinkList>,
    pub(crate) think: ThinkKind,
    pub(crate) entity: Option<Box<Entity>>,
    pub(crate) ambient: Option<Box<dyn AmbientThinker>>,
    pub(crate) occupied: bool,
}

impl Slot {
    fn vacant() -> Slot {
        Slot {
            generation: 0,
            ref_count: 0,
            prev: u32::MAX,
            next: u32::MAX,
            list: None,
            think: ThinkKind::Sentinel,
            entity: None,
            ambient: None,
            occupied: false,
        }
    }
}

pub(crate) const SENTINEL_COUNT: u32 = ThinkList::COUNT as u32;

/// Slot arena backing every scheduler node (entities and ambient thinkers).
/// Freed slots return to a LIFO cache rather than the allocator; slot count
/// is bounded by session configuration and exhaustion is fatal.
pub(crate) struct Arena {
    slots: Vec<Slot>,
    free: Vec<u32>,
    max_slots: u32,
    live: u32,
    /// Husks whose last counted reference drained between scheduler passes;
    /// the next pass frees them (the scheduler is the only deallocation
    /// site).
    pub(crate) pending_reap: Vec<u32>,
}

impl Arena {
    pub(crate) fn new(max_slots: u32) -> Arena {
        let mut slots = Vec::new();
        for index in 0..SENTINEL_COUNT {
            let mut sentinel = Slot::vacant();
            sentinel.occupied = true;
            sentinel.prev = index;
            sentinel.next = index;
            slots.push(sentinel);
        }
        Arena {
            slots,
            free: Vec::new(),
            max_slots,
            live: 0,
            pending_reap: Vec::new(),
        }
    }

    pub(crate) fn sentinel(list: ThinkList) -> u32 {
        list as u32
    }

    fn take_slot(&mut self) -> u32 {
        if let Some(index) = self.free.pop() {
            return index;
        }
        if self.slots.len() as u32 - SENTINEL_COUNT >= self.max_slots {
            // The slot bound comes from session configuration; blowing through
            // it would desync every peer, so stop the process here.
            panic!(
                "entity pool exhausted: all {} slots in use",
                self.max_slots
            );
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot::vacant());
        index
    }

    pub(crate) fn allocate_entity(&mut self, entity: Entity) -> Handle {
        let index = self.take_slot();
        let slot = &mut self.slots[index as usize];
        slot.occupied = true;
        slot.ref_count = 0;
        slot.think = ThinkKind::Entity;
        slot.entity = Some(Box::new(entity));
        slot.ambient = None;
        slot.list = None;
        self.live += 1;
        Handle {
            index,
            generation: slot.generation,
        }
    }

    pub(crate) fn allocate_ambient(&mut self, thinker: Box<dyn AmbientThinker>) -> Handle {
        let index = self.take_slot();
        let slot = &mut self.slots[index as usize];
        slot.occupied = true;
        slot.ref_count = 0;
        slot.think = ThinkKind::Ambient;
        slot.entity = None;
        slot.ambient = Some(thinker);
        slot.list = None;
        self.live += 1;
        Handle {
            index,
            generation: slot.generation,
        }
    }

    /// Clear the block and hand the slot back to the LIFO cache. Only legal
    /// once nothing references the slot and it is unlinked from every list.
    pub(crate) fn release(&mut self, index: u32) {
        let slot = &mut self.slots[index as usize];
        debug_assert!(slot.occupied, "releasing a vacant slot");
        debug_assert_eq!(slot.ref_count, 0, "releasing a referenced slot");
        slot.occupied = false;
        slot.entity = None;
        slot.ambient = None;
        slot.list = None;
        slot.think = ThinkKind::Sentinel;
        slot.prev = u32::MAX;
        slot.next = u32::MAX;
        slot.generation = slot.generation.wrapping_add(1);
        self.live -= 1;
        self.free.push(index);
    }

    pub(crate) fn handle(&self, index: u32) -> Handle {
        Handle {
            index,
            generation: self.slots[index as usize].generation,
        }
    }

    pub(crate) fn matches(&self, handle: Handle) -> bool {
        if handle.is_null() {
            return false;
        }
        self.slots
            .get(handle.index as usize)
            .map(|slot| slot.occupied && slot.generation == handle.generation)
            .unwrap_or(false)
    }

    pub(crate) fn slot(&self, index: u32) -> &Slot {
        &self.slots[index as usize]
    }

    pub(crate) fn slot_mut(&mut self, index: u32) -> &mut Slot {
        &mut self.slots[index as usize]
    }

    /// Entity payload regardless of removal flag; liveness filtering is the
    /// world's job.
    pub(crate) fn entity_raw(&self, handle: Handle) -> Option<&Entity> {
        if !self.matches(handle) {
            return None;
        }
        self.slots[handle.index as usize].entity.as_deref()
    }

    pub(crate) fn entity_raw_mut(&mut self, handle: Handle) -> Option<&mut Entity> {
        if !self.matches(handle) {
            return None;
        }
        self.slots[handle.index as usize].entity.as_deref_mut()
    }

    pub(crate) fn ref_inc(&mut self, index: u32) {
        let slot = &mut self.slots[index as usize];
        slot.ref_count = slot.ref_count.saturating_add(1);
    }

    pub(crate) fn ref_dec(&mut self, index: u32) -> u32 {
        let slot = &mut self.slots[index as usize];
        debug_assert!(slot.ref_count > 0, "reference count underflow");
        slot.ref_count = slot.ref_count.saturating_sub(1);
        slot.ref_count
    }

    pub(crate) fn ref_count(&self, index: u32) -> u32 {
        self.slots[index as usize].ref_count
    }

    /// Occupied non-sentinel slots, husks included.
    pub(crate) fn allocated(&self) -> u32 {
        self.live
    }

    pub(crate) fn free_cached(&self) -> usize {
        self.free.len()
    }
}
