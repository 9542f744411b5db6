// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-function property access inline caches.
//!
//! ## Lifecycle
//!
//! 1. [`InlineCache::init`] when compilation of a function starts.
//! 2. [`InlineCache::reserve_slot`] for every property key the compiler
//!    plants a cache site for. Reserving a key twice is a no-op.
//! 3. [`InlineCache::freeze`] once compilation is done. Every key gets a
//!    dense ring index and one ring of [`RING_CAPACITY`] items.
//! 4. [`InlineCache::lookup`] and [`InlineCache::fill`] while the function
//!    runs.
//! 5. [`InlineCache::destroy`] when the function is destroyed.

pub mod access;
mod hash_index;
pub(crate) mod ring;

pub use ring::{CacheHit, RING_CAPACITY, RingItemState};

use crate::{
    error::{AllocationSite, IcError, IcResult, ProtocolViolation},
    execution::Agent,
    heap::{CreateHeapData, Heap, indexes::heap_handle},
    object_model::PropertyKey,
};

use self::{hash_index::HashIndex, ring::RingSlot};

heap_handle!(
    /// Property access inline cache of one compiled function.
    InlineCache
);

/// Hit and miss counters of one inline cache.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IcStats {
    pub hits: u64,
    pub misses: u64,
    pub fills: u64,
    /// Fills that replaced a bound item.
    pub evictions: u64,
    /// Items reset by a fired watchpoint.
    pub invalidations: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotReservation {
    Reserved,
    /// The key already has a slot. Not an error.
    AlreadyPresent,
}

#[derive(Debug)]
pub(crate) struct InlineCacheRecord {
    hash_index: HashIndex,
    /// One ring per reserved key, allocated by freeze. `None` while not
    /// frozen and for caches without any reserved key.
    pub(crate) rings: Option<Box<[RingSlot]>>,
    /// Keys by ring index. Not owned: the hash index holds the references.
    slot_keys: Box<[PropertyKey]>,
    frozen: bool,
    pub(crate) stats: IcStats,
}

impl CreateHeapData<InlineCacheRecord, InlineCache> for Heap {
    fn create(&mut self, data: InlineCacheRecord) -> InlineCache {
        InlineCache(self.inline_caches.push(data))
    }
}

impl InlineCacheRecord {
    fn check_ring_index(&self, ring_index: u32) -> IcResult<usize> {
        if !self.frozen {
            return Err(ProtocolViolation::NotFrozen.into());
        }
        if ring_index as usize >= self.slot_keys.len() {
            return Err(ProtocolViolation::UnreservedSlot {
                ring_index,
                ring_count: self.slot_keys.len() as u32,
            }
            .into());
        }
        Ok(ring_index as usize)
    }

    fn ring(&self, ring_index: u32) -> IcResult<&RingSlot> {
        let index = self.check_ring_index(ring_index)?;
        Ok(&self.rings.as_deref().unwrap_or_default()[index])
    }

    pub(crate) fn ring_mut(&mut self, ring_index: u32) -> IcResult<(&mut RingSlot, &mut IcStats)> {
        let index = self.check_ring_index(ring_index)?;
        let rings = self.rings.as_deref_mut().unwrap_or_default();
        Ok((&mut rings[index], &mut self.stats))
    }
}

impl InlineCache {
    /// Create an empty, unfrozen inline cache.
    pub fn init(agent: &mut Agent) -> IcResult<Self> {
        let hash_index = HashIndex::new()?;
        Ok(agent.heap.create(InlineCacheRecord {
            hash_index,
            rings: None,
            slot_keys: Box::default(),
            frozen: false,
            stats: IcStats::default(),
        }))
    }

    /// Reserve a ring slot for `key`.
    ///
    /// Indexes are only assigned by [`InlineCache::freeze`]; use
    /// [`InlineCache::ring_index_of`] afterwards to find the slot of a key.
    pub fn reserve_slot(self, agent: &mut Agent, key: PropertyKey) -> IcResult<SlotReservation> {
        let record = &mut agent.heap.inline_caches[self.0];
        if record.frozen {
            return Err(ProtocolViolation::AlreadyFrozen.into());
        }
        if record.hash_index.contains(key) {
            return Ok(SlotReservation::AlreadyPresent);
        }
        record.hash_index.insert(key)?;
        log::trace!("reserved {key:?} in {self:?} ({} keys)", record.hash_index.len());
        key.dup(agent);
        Ok(SlotReservation::Reserved)
    }

    /// Assign ring indexes and allocate the rings. Returns the number of
    /// rings.
    ///
    /// Indexes are assigned walking the hash index bucket by bucket, and each
    /// bucket in insertion order, so the same sequence of reservations always
    /// yields the same indexes.
    pub fn freeze(self, agent: &mut Agent) -> IcResult<u32> {
        let record = &mut agent.heap.inline_caches[self.0];
        if record.frozen {
            return Err(ProtocolViolation::AlreadyFrozen.into());
        }
        let keys = record.hash_index.assign_ring_indexes()?;
        let count = keys.len();
        if count > 0 {
            let mut rings = Vec::new();
            rings
                .try_reserve_exact(count)
                .map_err(IcError::allocation(AllocationSite::RingCache))?;
            rings.resize_with(count, RingSlot::default);
            record.rings = Some(rings.into_boxed_slice());
        }
        record.slot_keys = keys.into_boxed_slice();
        record.frozen = true;
        log::debug!("froze {self:?} with {count} ring slots");
        if agent.options.print_internals {
            for (index, key) in agent.heap.inline_caches[self.0].slot_keys.iter().enumerate() {
                log::debug!("  {index}: {:?}", key.name(agent));
            }
        }
        Ok(count as u32)
    }

    pub fn is_frozen(self, agent: &Agent) -> bool {
        agent.heap.inline_caches[self.0].frozen
    }

    pub fn ring_count(self, agent: &Agent) -> u32 {
        agent.heap.inline_caches[self.0].slot_keys.len() as u32
    }

    /// Ring index of `key`, if it was reserved and the cache is frozen.
    pub fn ring_index_of(self, agent: &Agent, key: PropertyKey) -> Option<u32> {
        let record = &agent.heap.inline_caches[self.0];
        if !record.frozen {
            return None;
        }
        record.hash_index.ring_index_of(key)
    }

    /// The key a ring slot was reserved for.
    pub fn key_for_slot(self, agent: &Agent, ring_index: u32) -> IcResult<PropertyKey> {
        let record = &agent.heap.inline_caches[self.0];
        let index = record.check_ring_index(ring_index)?;
        Ok(record.slot_keys[index])
    }

    pub fn stats(self, agent: &Agent) -> IcStats {
        agent.heap.inline_caches[self.0].stats
    }

    pub fn item_state(
        self,
        agent: &Agent,
        ring_index: u32,
        position: usize,
    ) -> IcResult<RingItemState> {
        let ring = agent.heap.inline_caches[self.0].ring(ring_index)?;
        Ok(ring.state_at(position))
    }

    /// Number of bound items in a ring.
    pub fn occupancy(self, agent: &Agent, ring_index: u32) -> IcResult<usize> {
        Ok(agent.heap.inline_caches[self.0].ring(ring_index)?.occupancy())
    }

    /// Number of items bound to a prototype, across all rings.
    pub fn bound_inherited_count(self, agent: &Agent) -> usize {
        let Some(rings) = agent.heap.inline_caches[self.0].rings.as_deref() else {
            return 0;
        };
        rings
            .iter()
            .flat_map(|ring| (0..RING_CAPACITY).map(move |i| ring.state_at(i)))
            .filter(|state| *state == RingItemState::BoundInherited)
            .count()
    }

    /// Tear the cache down: ring items first, then the hash index.
    ///
    /// Watchpoints of the ring items are unlinked without firing. This is
    /// not a property mutation.
    pub fn destroy(self, agent: &mut Agent) {
        let ring_count = agent.heap.inline_caches[self.0]
            .rings
            .as_deref()
            .map_or(0, <[RingSlot]>::len);
        for slot in 0..ring_count {
            for position in 0..RING_CAPACITY {
                let Some(rings) = agent.heap.inline_caches[self.0].rings.as_deref_mut() else {
                    break;
                };
                let item = rings[slot].take_item(position);
                ring::release_item(agent, item);
            }
        }
        let Some(mut record) = agent.heap.inline_caches.remove(self.0) else {
            return;
        };
        for key in record.hash_index.drain_keys() {
            key.release(agent);
        }
        log::debug!("destroyed {self:?}: {:?}", record.stats);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object_model::{Object, ObjectShape, Value};

    fn frozen_cache(agent: &mut Agent, names: &[&str]) -> (InlineCache, Vec<PropertyKey>) {
        let cache = InlineCache::init(agent).unwrap();
        let keys: Vec<PropertyKey> = names
            .iter()
            .map(|name| PropertyKey::intern(agent, name))
            .collect();
        for key in keys.iter() {
            cache.reserve_slot(agent, *key).unwrap();
        }
        cache.freeze(agent).unwrap();
        (cache, keys)
    }

    /// A fresh object whose own shape is distinct from every other test
    /// shape: it owns the given keys, in order.
    fn object_with(agent: &mut Agent, prototype: Option<Object>, keys: &[PropertyKey]) -> Object {
        let object = Object::create(agent, prototype);
        for (i, key) in keys.iter().enumerate() {
            object.define_property(agent, *key, Value::Integer(i as i64));
        }
        object
    }

    #[test]
    fn polymorphic_site_keeps_both_shapes() {
        let mut agent = Agent::default();
        let (cache, keys) = frozen_cache(&mut agent, &["x", "y"]);
        assert_eq!(cache.ring_count(&agent), 2);
        let x = keys[0];
        let slot_x = cache.ring_index_of(&agent, x).unwrap();
        let pad = PropertyKey::intern(&mut agent, "pad");
        let s1 = object_with(&mut agent, None, &[x]).shape(&agent);
        let s2 = object_with(&mut agent, None, &[pad, x]).shape(&agent);

        cache.fill(&mut agent, slot_x, x, s1, 0, None).unwrap();
        assert_eq!(
            cache.lookup(&mut agent, slot_x, s1).unwrap(),
            Some(CacheHit {
                offset: 0,
                prototype: None,
            })
        );
        assert_eq!(cache.lookup(&mut agent, slot_x, s2).unwrap(), None);
        cache.fill(&mut agent, slot_x, x, s2, 4, None).unwrap();
        assert_eq!(cache.occupancy(&agent, slot_x).unwrap(), 2);
        assert_eq!(
            cache.lookup(&mut agent, slot_x, s1).unwrap().map(|hit| hit.offset),
            Some(0)
        );
        assert_eq!(
            cache.lookup(&mut agent, slot_x, s2).unwrap().map(|hit| hit.offset),
            Some(4)
        );
        let stats = cache.stats(&agent);
        assert_eq!(stats.hits, 3);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.fills, 2);
        assert_eq!(stats.evictions, 0);
    }

    #[test]
    fn deleting_from_the_prototype_invalidates() {
        let mut agent = Agent::default();
        let (cache, keys) = frozen_cache(&mut agent, &["x", "y"]);
        let y = keys[1];
        let slot_y = cache.ring_index_of(&agent, y).unwrap();
        let pad = PropertyKey::intern(&mut agent, "pad");
        let p1 = object_with(&mut agent, None, &[pad, y]);
        let receiver = Object::create(&mut agent, Some(p1));
        let s3 = receiver.shape(&agent);

        cache.fill(&mut agent, slot_y, y, s3, 1, Some(p1)).unwrap();
        assert_eq!(
            cache.lookup(&mut agent, slot_y, s3).unwrap(),
            Some(CacheHit {
                offset: 1,
                prototype: Some(p1),
            })
        );
        assert_eq!(cache.bound_inherited_count(&agent), 1);
        assert_eq!(agent.live_watchpoint_count(), 1);

        assert!(p1.delete_property(&mut agent, y));
        assert_eq!(cache.lookup(&mut agent, slot_y, s3).unwrap(), None);
        assert_eq!(cache.bound_inherited_count(&agent), 0);
        assert_eq!(agent.live_watchpoint_count(), 0);
        assert_eq!(cache.item_state(&agent, slot_y, 0).unwrap(), RingItemState::Empty);
        assert_eq!(cache.stats(&agent).invalidations, 1);
    }

    #[test]
    fn eviction_is_round_robin() {
        let mut agent = Agent::default();
        let (cache, keys) = frozen_cache(&mut agent, &["x"]);
        let x = keys[0];
        let shapes: Vec<ObjectShape> = (0..6)
            .map(|i| {
                let pads: Vec<PropertyKey> = (0..i)
                    .map(|j| PropertyKey::intern(&mut agent, &format!("pad{j}")))
                    .collect();
                let mut layout = pads;
                layout.push(x);
                object_with(&mut agent, None, &layout).shape(&agent)
            })
            .collect();
        for (i, shape) in shapes.iter().take(5).enumerate() {
            cache.fill(&mut agent, 0, x, *shape, i as u32, None).unwrap();
            assert!(cache.occupancy(&agent, 0).unwrap() <= RING_CAPACITY);
        }
        // The fifth fill wrapped around onto the first item.
        assert_eq!(cache.lookup(&mut agent, 0, shapes[0]).unwrap(), None);
        assert_eq!(cache.stats(&agent).evictions, 1);
        // The next victim is the second item.
        cache.fill(&mut agent, 0, x, shapes[5], 5, None).unwrap();
        assert_eq!(cache.lookup(&mut agent, 0, shapes[1]).unwrap(), None);
        for (i, shape) in shapes.iter().enumerate().skip(2) {
            assert_eq!(
                cache.lookup(&mut agent, 0, *shape).unwrap().map(|hit| hit.offset),
                Some(i as u32)
            );
        }
        assert_eq!(cache.occupancy(&agent, 0).unwrap(), RING_CAPACITY);
    }

    #[test]
    fn hits_do_not_protect_items_from_eviction() {
        let mut agent = Agent::default();
        let (cache, keys) = frozen_cache(&mut agent, &["x"]);
        let x = keys[0];
        let shapes: Vec<ObjectShape> = (0..=RING_CAPACITY)
            .map(|i| {
                let pad = PropertyKey::intern(&mut agent, &format!("pad{i}"));
                object_with(&mut agent, None, &[pad, x]).shape(&agent)
            })
            .collect();
        for shape in shapes.iter().take(RING_CAPACITY) {
            cache.fill(&mut agent, 0, x, *shape, 1, None).unwrap();
        }
        assert!(cache.lookup(&mut agent, 0, shapes[0]).unwrap().is_some());
        cache
            .fill(&mut agent, 0, x, shapes[RING_CAPACITY], 1, None)
            .unwrap();
        assert_eq!(cache.lookup(&mut agent, 0, shapes[0]).unwrap(), None);
        for shape in shapes.iter().skip(1) {
            assert!(cache.lookup(&mut agent, 0, *shape).unwrap().is_some());
        }
    }

    #[test]
    fn refilling_a_bound_shape_updates_the_offset() {
        let mut agent = Agent::default();
        let (cache, keys) = frozen_cache(&mut agent, &["x"]);
        let x = keys[0];
        let s1 = object_with(&mut agent, None, &[x]).shape(&agent);
        cache.fill(&mut agent, 0, x, s1, 0, None).unwrap();
        let refcount = s1.refcount(&agent);
        cache.fill(&mut agent, 0, x, s1, 7, None).unwrap();
        assert_eq!(s1.refcount(&agent), refcount);
        assert_eq!(cache.occupancy(&agent, 0).unwrap(), 1);
        assert_eq!(
            cache.lookup(&mut agent, 0, s1).unwrap().map(|hit| hit.offset),
            Some(7)
        );
    }

    #[test]
    fn rebinding_to_another_holder_goes_through_empty() {
        let mut agent = Agent::default();
        let (cache, keys) = frozen_cache(&mut agent, &["x"]);
        let x = keys[0];
        let proto = object_with(&mut agent, None, &[x]);
        let receiver = Object::create(&mut agent, Some(proto));
        let shape = receiver.shape(&agent);
        cache.fill(&mut agent, 0, x, shape, 0, None).unwrap();
        assert_eq!(cache.item_state(&agent, 0, 0).unwrap(), RingItemState::BoundDirect);
        cache.fill(&mut agent, 0, x, shape, 0, Some(proto)).unwrap();
        assert_eq!(cache.item_state(&agent, 0, 0).unwrap(), RingItemState::BoundInherited);
        assert_eq!(cache.occupancy(&agent, 0).unwrap(), 1);
        assert_eq!(agent.live_watchpoint_count(), 1);
        assert_eq!(cache.stats(&agent).evictions, 1);
    }

    #[test]
    fn evicting_an_inherited_item_unlinks_its_watchpoint() {
        let mut agent = Agent::default();
        let (cache, keys) = frozen_cache(&mut agent, &["x"]);
        let x = keys[0];
        let proto = object_with(&mut agent, None, &[x]);
        let proto_refcount = proto.refcount(&agent);
        let receiver = Object::create(&mut agent, Some(proto));
        let shape = receiver.shape(&agent);
        cache.fill(&mut agent, 0, x, shape, 0, Some(proto)).unwrap();
        assert_eq!(proto.refcount(&agent), proto_refcount + 2);
        let pads: Vec<PropertyKey> = (0..RING_CAPACITY)
            .map(|i| PropertyKey::intern(&mut agent, &format!("pad{i}")))
            .collect();
        for i in 0..RING_CAPACITY {
            let mut layout = pads[..=i].to_vec();
            layout.push(x);
            let shape = object_with(&mut agent, None, &layout).shape(&agent);
            cache.fill(&mut agent, 0, x, shape, i as u32 + 1, None).unwrap();
        }
        assert_eq!(cache.bound_inherited_count(&agent), 0);
        assert_eq!(agent.live_watchpoint_count(), 0);
        // The cache no longer holds the prototype.
        assert_eq!(proto.refcount(&agent), proto_refcount + 1);
    }

    #[test]
    fn shadowing_fires_watchpoints_up_the_chain() {
        let mut agent = Agent::default();
        let (cache, keys) = frozen_cache(&mut agent, &["x"]);
        let x = keys[0];
        let p2 = object_with(&mut agent, None, &[x]);
        let p1 = Object::create(&mut agent, Some(p2));
        let receiver = Object::create(&mut agent, Some(p1));
        let shape = receiver.shape(&agent);
        cache.fill(&mut agent, 0, x, shape, 0, Some(p2)).unwrap();
        assert!(cache.lookup(&mut agent, 0, shape).unwrap().is_some());

        p1.define_property(&mut agent, x, Value::Integer(10));
        assert_eq!(receiver.shape(&agent), shape);
        assert_eq!(cache.lookup(&mut agent, 0, shape).unwrap(), None);
        assert_eq!(agent.live_watchpoint_count(), 0);
    }

    #[test]
    fn growing_the_prototype_keeps_the_cache_valid() {
        let mut agent = Agent::default();
        let (cache, keys) = frozen_cache(&mut agent, &["x", "y", "z"]);
        let (x, y, z) = (keys[0], keys[1], keys[2]);
        let slot_y = cache.ring_index_of(&agent, y).unwrap();
        let proto = object_with(&mut agent, None, &[x, y]);
        let receiver = Object::create(&mut agent, Some(proto));
        let shape = receiver.shape(&agent);
        let old_proto_shape = proto.shape(&agent);
        cache.fill(&mut agent, slot_y, y, shape, 1, Some(proto)).unwrap();

        proto.define_property(&mut agent, z, Value::Integer(2));
        let new_proto_shape = proto.shape(&agent);
        assert_ne!(old_proto_shape, new_proto_shape);
        assert_eq!(new_proto_shape.watchpoint_count(&agent), 1);
        assert_eq!(cache.lookup(&mut agent, slot_y, shape).unwrap().map(|h| h.offset), Some(1));

        // Removing a later property leaves `y` where it was.
        assert!(proto.delete_property(&mut agent, z));
        assert_eq!(cache.lookup(&mut agent, slot_y, shape).unwrap().map(|h| h.offset), Some(1));

        // Removing an earlier one moves it.
        assert!(proto.delete_property(&mut agent, x));
        assert_eq!(cache.lookup(&mut agent, slot_y, shape).unwrap(), None);
        assert_eq!(agent.live_watchpoint_count(), 0);
    }

    #[test]
    fn guards_follow_only_their_own_prototype() {
        let mut agent = Agent::default();
        let (cache, keys) = frozen_cache(&mut agent, &["x"]);
        let x = keys[0];
        // Two prototypes sharing one Object Shape.
        let a = object_with(&mut agent, None, &[x]);
        let b = object_with(&mut agent, None, &[x]);
        assert_eq!(a.shape(&agent), b.shape(&agent));
        let from_a = Object::create(&mut agent, Some(a));
        let from_b = Object::create(&mut agent, Some(b));
        let shape_a = from_a.shape(&agent);
        let shape_b = from_b.shape(&agent);
        cache.fill(&mut agent, 0, x, shape_a, 0, Some(a)).unwrap();
        cache.fill(&mut agent, 0, x, shape_b, 0, Some(b)).unwrap();
        assert_eq!(agent.live_watchpoint_count(), 2);

        assert!(a.delete_property(&mut agent, x));
        assert_eq!(cache.lookup(&mut agent, 0, shape_a).unwrap(), None);
        assert_eq!(
            cache.lookup(&mut agent, 0, shape_b).unwrap(),
            Some(CacheHit {
                offset: 0,
                prototype: Some(b),
            })
        );
        assert_eq!(agent.live_watchpoint_count(), 1);
    }

    #[test]
    fn reservations_are_deduplicated() {
        let mut agent = Agent::default();
        let cache = InlineCache::init(&mut agent).unwrap();
        let x = PropertyKey::intern(&mut agent, "x");
        assert_eq!(cache.reserve_slot(&mut agent, x).unwrap(), SlotReservation::Reserved);
        assert_eq!(
            cache.reserve_slot(&mut agent, x).unwrap(),
            SlotReservation::AlreadyPresent
        );
        assert_eq!(x.refcount(&agent), 2);
        assert_eq!(cache.freeze(&mut agent).unwrap(), 1);
        assert_eq!(cache.key_for_slot(&agent, 0).unwrap(), x);
    }

    #[test]
    fn ring_indexes_are_reproducible() {
        let names: Vec<String> = (0..17).map(|i| format!("key{i}")).collect();
        let mut agent = Agent::default();
        let keys: Vec<PropertyKey> = names
            .iter()
            .map(|name| PropertyKey::intern(&mut agent, name))
            .collect();
        let first = InlineCache::init(&mut agent).unwrap();
        let second = InlineCache::init(&mut agent).unwrap();
        for cache in [first, second] {
            for key in keys.iter().chain(keys.iter().rev()) {
                cache.reserve_slot(&mut agent, *key).unwrap();
            }
            assert_eq!(cache.freeze(&mut agent).unwrap(), keys.len() as u32);
        }
        for key in keys.iter() {
            let index = first.ring_index_of(&agent, *key);
            assert!(index.is_some());
            assert_eq!(index, second.ring_index_of(&agent, *key));
            assert_eq!(first.key_for_slot(&agent, index.unwrap()).unwrap(), *key);
        }
    }

    #[test]
    fn protocol_violations_are_reported() {
        let mut agent = Agent::default();
        let cache = InlineCache::init(&mut agent).unwrap();
        let x = PropertyKey::intern(&mut agent, "x");
        let shape = ObjectShape::root_for_prototype(&mut agent, None);
        assert_eq!(
            cache.lookup(&mut agent, 0, shape),
            Err(IcError::CacheProtocol(ProtocolViolation::NotFrozen))
        );
        cache.reserve_slot(&mut agent, x).unwrap();
        cache.freeze(&mut agent).unwrap();
        assert_eq!(
            cache.freeze(&mut agent),
            Err(IcError::CacheProtocol(ProtocolViolation::AlreadyFrozen))
        );
        assert_eq!(
            cache.reserve_slot(&mut agent, x),
            Err(IcError::CacheProtocol(ProtocolViolation::AlreadyFrozen))
        );
        assert_eq!(
            cache.fill(&mut agent, 1, x, shape, 0, None),
            Err(IcError::CacheProtocol(ProtocolViolation::UnreservedSlot {
                ring_index: 1,
                ring_count: 1,
            }))
        );
        assert_eq!(shape.refcount(&agent), 1);
    }

    #[test]
    fn caches_without_sites_have_no_rings() {
        let mut agent = Agent::default();
        let cache = InlineCache::init(&mut agent).unwrap();
        assert_eq!(cache.freeze(&mut agent).unwrap(), 0);
        assert!(agent.heap.inline_caches[cache.0].rings.is_none());
        assert!(cache.is_frozen(&agent));
        assert!(cache.key_for_slot(&agent, 0).is_err());
        assert_eq!(cache.bound_inherited_count(&agent), 0);
        cache.destroy(&mut agent);
        assert_eq!(agent.live_inline_cache_count(), 0);
    }

    #[test]
    fn destroy_releases_everything() {
        let mut agent = Agent::default();
        let (cache, keys) = frozen_cache(&mut agent, &["x", "y"]);
        let (x, y) = (keys[0], keys[1]);
        let proto = object_with(&mut agent, None, &[x, y]);
        let receiver = object_with(&mut agent, Some(proto), &[x]);
        let inherited = Object::create(&mut agent, Some(proto));
        let slot_x = cache.ring_index_of(&agent, x).unwrap();
        let slot_y = cache.ring_index_of(&agent, y).unwrap();
        let receiver_shape = receiver.shape(&agent);
        let inherited_shape = inherited.shape(&agent);
        let shape_refcounts = (
            receiver_shape.refcount(&agent),
            inherited_shape.refcount(&agent),
        );
        let proto_refcount = proto.refcount(&agent);
        cache.fill(&mut agent, slot_x, x, receiver_shape, 0, None).unwrap();
        cache.fill(&mut agent, slot_y, y, inherited_shape, 1, Some(proto)).unwrap();
        cache.fill(&mut agent, slot_y, y, receiver_shape, 1, Some(proto)).unwrap();
        assert_eq!(agent.live_watchpoint_count(), 2);

        cache.destroy(&mut agent);
        assert_eq!(agent.live_watchpoint_count(), 0);
        assert_eq!(agent.live_inline_cache_count(), 0);
        // What is left is held by the interning calls and by Object Shapes.
        assert_eq!(x.refcount(&agent), 1 + 3);
        assert_eq!(y.refcount(&agent), 1 + 1);
        assert_eq!(
            (
                receiver_shape.refcount(&agent),
                inherited_shape.refcount(&agent),
            ),
            shape_refcounts
        );
        assert_eq!(proto.refcount(&agent), proto_refcount);

        receiver.release(&mut agent);
        inherited.release(&mut agent);
        proto.release(&mut agent);
        assert_eq!(agent.live_object_count(), 0);
        assert_eq!(agent.live_shape_count(), 0);
        x.release(&mut agent);
        y.release(&mut agent);
        assert_eq!(agent.live_key_count(), 0);
    }
}
