use tracing::warn;

use crate::driver::entity_think;
use crate::pool::{Arena, Handle, ThinkKind};
use crate::world::SimulationWorld;

/// The scheduler's ordered lists. A node lives in exactly one; lists run in
/// `LIST_ORDER` every tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum ThinkList {
    /// Global/ambient procedures that must run before any entity moves
    /// (moving platforms, dynamic overlays).
    Ambient = 0,
    /// Ambient procedures with no before/after requirement.
    Main = 1,
    /// All simulated entities.
    Entity = 2,
    /// Precipitation entities; cheap thinkers walked after everything else.
    Precipitation = 3,
}

impl ThinkList {
    pub(crate) const COUNT: usize = 4;
}

pub(crate) const LIST_ORDER: [ThinkList; ThinkList::COUNT] = [
    ThinkList::Ambient,
    ThinkList::Main,
    ThinkList::Entity,
    ThinkList::Precipitation,
];

/// An ambient per-tick procedure scheduled alongside entities. Implementors
/// carry their own state; the scheduler owns the box.
pub trait AmbientThinker {
    fn think(&mut self, world: &mut SimulationWorld, me: Handle);
}

pub(crate) fn link_tail(arena: &mut Arena, index: u32, list: ThinkList) {
    let sentinel = Arena::sentinel(list);
    let tail = arena.slot(sentinel).prev;
    {
        let slot = arena.slot_mut(index);
        slot.prev = tail;
        slot.next = sentinel;
        slot.list = Some(list);
    }
    arena.slot_mut(tail).next = index;
    arena.slot_mut(sentinel).prev = index;
}

pub(crate) fn unlink(arena: &mut Arena, index: u32) {
    let (prev, next) = {
        let slot = arena.slot(index);
        (slot.prev, slot.next)
    };
    arena.slot_mut(prev).next = next;
    arena.slot_mut(next).prev = prev;
    let slot = arena.slot_mut(index);
    slot.prev = u32::MAX;
    slot.next = u32::MAX;
    slot.list = None;
}

/// Snapshot of a list's membership in walk order.
pub(crate) fn list_handles(arena: &Arena, list: ThinkList) -> Vec<Handle> {
    let sentinel = Arena::sentinel(list);
    let mut handles = Vec::new();
    let mut cursor = arena.slot(sentinel).next;
    while cursor != sentinel {
        handles.push(arena.handle(cursor));
        cursor = arena.slot(cursor).next;
    }
    handles
}

/// One full scheduler pass: drain the reap queue, then walk every list in
/// fixed order. Nodes may remove themselves or any other node mid-pass; a
/// marked node stays linked (and therefore walkable) until the cursor
/// reaches it, at which point it is excised, and freed iff nothing still
/// references it.
pub(crate) fn run_all(world: &mut SimulationWorld) {
    reap_drained(world);
    for list in LIST_ORDER {
        run_list(world, list);
    }
}

/// Husks whose last counted reference drained since the previous pass. The
/// scheduler is the only place slots physically return to the pool, so the
/// relation bookkeeping queues them here rather than freeing inline.
fn reap_drained(world: &mut SimulationWorld) {
    let pending = std::mem::take(&mut world.arena_mut().pending_reap);
    for index in pending {
        let arena = world.arena_mut();
        let slot = arena.slot(index);
        if slot.occupied
            && slot.think == ThinkKind::RemovalPending
            && slot.ref_count == 0
            && slot.list.is_none()
        {
            arena.release(index);
        }
    }
}

fn run_list(world: &mut SimulationWorld, list: ThinkList) {
    let sentinel = Arena::sentinel(list);
    let mut cursor = world.arena().slot(sentinel).next;
    while cursor != sentinel {
        let think = world.arena().slot(cursor).think;
        match think {
            ThinkKind::RemovalPending => {
                // Retreat to the predecessor before unlinking so the walk
                // resumes from a node that is still on the list.
                let prev = world.arena().slot(cursor).prev;
                let arena = world.arena_mut();
                unlink(arena, cursor);
                if arena.slot(cursor).ref_count == 0 {
                    arena.release(cursor);
                }
                cursor = prev;
            }
            ThinkKind::Entity => {
                let handle = world.arena().handle(cursor);
                entity_think(world, handle);
            }
            ThinkKind::Ambient => {
                let handle = world.arena().handle(cursor);
                let thinker = world.arena_mut().slot_mut(cursor).ambient.take();
                if let Some(mut thinker) = thinker {
                    thinker.think(world, handle);
                    let slot = world.arena_mut().slot_mut(cursor);
                    if slot.occupied {
                        slot.ambient = Some(thinker);
                    }
                }
            }
            ThinkKind::Sentinel => {
                warn!(index = cursor, "sentinel_linked_mid_list");
            }
        }
        cursor = world.arena().slot(cursor).next;
    }
}
