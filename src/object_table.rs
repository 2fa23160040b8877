//! Object allocation, root tracking and mark-sweep garbage collection.
//!
//! The interpreter loop, call frames and opcode dispatch are out of scope
//!; what lives here is the minimal slice of the object table
//! the four core metaclasses need: id allocation, per-object flags, the root
//! set, and the GC hooks (`mark_refs`, `remove_stale_weak_refs`,
//! `notify_delete`) that metaclass instances must participate in.

use std::collections::HashMap;

use bitflags::bitflags;

use crate::error::{Result, VmError};
use crate::value::ObjectId;

bitflags! {
    /// Per-object flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ObjectFlags: u8 {
        /// Object is a member of the root set (never collected).
        const IN_ROOT_SET = 0b0000_0001;
        /// Set by the GC mark phase; cleared at the start of each collection.
        const REACHABLE = 0b0000_0010;
        /// Object's extension may hold references to other objects.
        const CAN_HAVE_REFS = 0b0000_0100;
        /// `notify_delete` must run a finalizer when this object is swept.
        const FINALIZE_ON_GC = 0b0000_1000;
        /// `post_load_init` has been requested but not yet run this load.
        const POST_LOAD_INIT_REQUESTED = 0b0001_0000;
    }
}

/// Per-instance GC and lifecycle participation every metaclass instance
/// implements. This is the subset of the metaclass vtable
/// the object table itself drives; property dispatch is handled by the
/// registry (see [`crate::registry`]).
pub trait Collectible {
    /// Visit every strong reference this instance holds, via `visit`.
    /// Called during the GC mark phase for every reachable object.
    fn mark_refs(&self, visit: &mut dyn FnMut(ObjectId));

    /// Called once per collection, before sweep, for every instance that
    /// holds weak references, so it may drop references to about-to-be-freed
    /// objects before they become dangling. `is_dying` reports whether a
    /// given id is slated for collection.
    fn remove_stale_weak_refs(&mut self, _is_dying: &dyn Fn(ObjectId) -> bool) {}

    /// Called exactly once when the object is actually deleted (finalizer
    /// hook); default is a no-op for metaclasses with no external resources.
    fn notify_delete(&mut self) {}

    /// Called at most once per object per load/restore/reset cycle, after
    /// the object graph has been fully reconstructed, so an instance may
    /// resolve references that weren't available while it was being loaded
    /// in isolation.
    fn post_load_init(&mut self) {}
}

struct Slot {
    flags: ObjectFlags,
    post_load_done: bool,
}

/// Owns object id allocation, per-object flags and the root set, and drives
/// mark-sweep GC over a caller-supplied reachability closure.
///
/// Extension storage (the actual `BigNumber`/`Date`/… payloads) is owned by
/// the embedding VM, keyed by the same [`ObjectId`]; the table here only
/// owns allocation and deletion of object identity and flags, without
/// prescribing how extensions are stored.
#[derive(Default)]
pub struct ObjectTable {
    slots: HashMap<ObjectId, Slot>,
    next_id: u32,
}

impl ObjectTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self {
            slots: HashMap::new(),
            next_id: 1,
        }
    }

    /// Allocate a fresh id. Ids are never reused within a session, even
    /// after deletion.
    pub fn new_id(&mut self, in_root_set: bool, can_have_refs: bool, finalize_on_gc: bool) -> ObjectId {
        let raw = self.next_id;
        self.next_id = self.next_id.checked_add(1).expect("object id space exhausted");
        let id = ObjectId::new(raw).expect("id allocator never yields zero");

        let mut flags = ObjectFlags::empty();
        flags.set(ObjectFlags::IN_ROOT_SET, in_root_set);
        flags.set(ObjectFlags::CAN_HAVE_REFS, can_have_refs);
        flags.set(ObjectFlags::FINALIZE_ON_GC, finalize_on_gc);

        self.slots.insert(
            id,
            Slot {
                flags,
                post_load_done: false,
            },
        );
        id
    }

    /// Register an id with a fixed value, as used when reconstructing
    /// objects from an image file or a save file at a known id.
    pub fn alloc_obj_with_id(&mut self, id: ObjectId, can_have_refs: bool) {
        let mut flags = ObjectFlags::empty();
        flags.set(ObjectFlags::CAN_HAVE_REFS, can_have_refs);
        self.slots.entry(id).or_insert(Slot {
            flags,
            post_load_done: false,
        });
    }

    /// Whether `id` is currently allocated.
    pub fn is_valid(&self, id: ObjectId) -> bool {
        self.slots.contains_key(&id)
    }

    /// Current flags for `id`.
    pub fn flags(&self, id: ObjectId) -> Option<ObjectFlags> {
        self.slots.get(&id).map(|s| s.flags)
    }

    /// Add `id` to the root set.
    pub fn add_to_globals(&mut self, id: ObjectId) -> Result<()> {
        let slot = self.slots.get_mut(&id).ok_or(VmError::BadTypeBif)?;
        slot.flags.insert(ObjectFlags::IN_ROOT_SET);
        Ok(())
    }

    /// True if `id` is a candidate for collection (not rooted).
    pub fn is_obj_deletable(&self, id: ObjectId) -> bool {
        self.slots
            .get(&id)
            .map(|s| !s.flags.contains(ObjectFlags::IN_ROOT_SET))
            .unwrap_or(false)
    }

    /// True if `id` is permanently retained (in the root set).
    pub fn is_obj_persistent(&self, id: ObjectId) -> bool {
        self.slots
            .get(&id)
            .map(|s| s.flags.contains(ObjectFlags::IN_ROOT_SET))
            .unwrap_or(false)
    }

    /// Mark `id` reachable this collection. Returns `true` the first time
    /// `id` is marked so callers can recurse only on first visit.
    fn mark(&mut self, id: ObjectId) -> bool {
        if let Some(slot) = self.slots.get_mut(&id) {
            if slot.flags.contains(ObjectFlags::REACHABLE) {
                false
            } else {
                slot.flags.insert(ObjectFlags::REACHABLE);
                true
            }
        } else {
            false
        }
    }

    /// Run a full mark-sweep collection.
    ///
    /// `instances` maps every live id to its [`Collectible`] so refs can be
    /// traced and weak refs trimmed before sweep; `roots` seeds the mark
    /// phase in addition to the table's own root set (machine globals,
    /// stack/register contents).
    pub fn collect(&mut self, instances: &mut HashMap<ObjectId, Box<dyn Collectible>>, extra_roots: &[ObjectId]) {
        for slot in self.slots.values_mut() {
            slot.flags.remove(ObjectFlags::REACHABLE);
        }

        let mut worklist: Vec<ObjectId> = self
            .slots
            .iter()
            .filter(|(_, s)| s.flags.contains(ObjectFlags::IN_ROOT_SET))
            .map(|(id, _)| *id)
            .chain(extra_roots.iter().copied())
            .collect();

        while let Some(id) = worklist.pop() {
            if !self.mark(id) {
                continue;
            }
            if let Some(instance) = instances.get(&id) {
                let mut children = Vec::new();
                instance.mark_refs(&mut |child| children.push(child));
                worklist.extend(children);
            }
        }

        let dying: Vec<ObjectId> = self
            .slots
            .iter()
            .filter(|(_, s)| !s.flags.contains(ObjectFlags::REACHABLE))
            .map(|(id, _)| *id)
            .collect();
        let dying_set: std::collections::HashSet<ObjectId> = dying.iter().copied().collect();
        let is_dying = |id: ObjectId| dying_set.contains(&id);

        for (id, instance) in instances.iter_mut() {
            if !dying_set.contains(id) {
                instance.remove_stale_weak_refs(&is_dying);
            }
        }

        for id in dying {
            if let Some(instance) = instances.get_mut(&id) {
                instance.notify_delete();
            }
            instances.remove(&id);
            self.slots.remove(&id);
        }
    }

    /// Invoke `post_load_init` for `id` at most once per load/restore/reset
    /// cycle.
    pub fn run_post_load_init(&mut self, id: ObjectId, instance: &mut dyn Collectible) {
        if let Some(slot) = self.slots.get_mut(&id) {
            if !slot.post_load_done {
                slot.post_load_done = true;
                instance.post_load_init();
            }
        }
    }

    /// Clear the post-load-init-done marker for every object, called at the
    /// start of a fresh load/restore/reset cycle.
    pub fn reset_post_load_markers(&mut self) {
        for slot in self.slots.values_mut() {
            slot.post_load_done = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Leaf;
    impl Collectible for Leaf {
        fn mark_refs(&self, _visit: &mut dyn FnMut(ObjectId)) {}
    }

    struct Node(Vec<ObjectId>);
    impl Collectible for Node {
        fn mark_refs(&self, visit: &mut dyn FnMut(ObjectId)) {
            for &id in &self.0 {
                visit(id);
            }
        }
    }

    #[test]
    fn unreachable_objects_are_swept() {
        let mut table = ObjectTable::new();
        let root = table.new_id(true, true, false);
        let reachable = table.new_id(false, false, false);
        let garbage = table.new_id(false, false, false);

        let mut instances: HashMap<ObjectId, Box<dyn Collectible>> = HashMap::new();
        instances.insert(root, Box::new(Node(vec![reachable])));
        instances.insert(reachable, Box::new(Leaf));
        instances.insert(garbage, Box::new(Leaf));

        table.collect(&mut instances, &[]);

        assert!(table.is_valid(root));
        assert!(table.is_valid(reachable));
        assert!(!table.is_valid(garbage));
        assert!(!instances.contains_key(&garbage));
    }

    #[test]
    fn ids_are_never_reused() {
        let mut table = ObjectTable::new();
        let a = table.new_id(false, false, false);
        let mut instances: HashMap<ObjectId, Box<dyn Collectible>> = HashMap::new();
        instances.insert(a, Box::new(Leaf));
        table.collect(&mut instances, &[]);
        assert!(!table.is_valid(a));

        let b = table.new_id(false, false, false);
        assert_ne!(a, b);
    }
}
