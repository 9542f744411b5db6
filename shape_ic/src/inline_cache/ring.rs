// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-slot polymorphic caches and their watchpoint handlers.

use crate::{
    error::IcResult,
    execution::Agent,
    object_model::{
        Object, ObjectShape, PropertyKey,
        watchpoint::{self, WatchpointEvent, WatchpointHandle, WatchpointObserver},
    },
};

use super::InlineCache;

/// Number of Object Shapes a single ring remembers.
pub const RING_CAPACITY: usize = 4;

/// Integer token naming one ring item of one inline cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RingItemRef {
    pub(crate) cache: InlineCache,
    pub(crate) slot: u32,
    pub(crate) position: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RingItemState {
    Empty,
    /// The property was found on the receiver.
    BoundDirect,
    /// The property was found on a prototype, and a watchpoint guards it.
    BoundInherited,
}

/// Result of a successful [`InlineCache::lookup`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheHit {
    pub offset: u32,
    /// Holder of the property if it is not the receiver.
    pub prototype: Option<Object>,
}

#[derive(Debug, Default)]
pub(crate) struct RingItem {
    /// Owned duplicate of the key; only held alongside a watchpoint.
    key: Option<PropertyKey>,
    /// Owned reference to the receiver Object Shape. `None` means empty.
    shape: Option<ObjectShape>,
    /// Owned reference to the prototype the property was found on.
    prototype: Option<Object>,
    offset: u32,
    watchpoint: Option<WatchpointHandle>,
}

impl RingItem {
    fn state(&self) -> RingItemState {
        match (self.shape, self.prototype) {
            (None, _) => RingItemState::Empty,
            (Some(_), None) => RingItemState::BoundDirect,
            (Some(_), Some(_)) => RingItemState::BoundInherited,
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct RingSlot {
    items: [RingItem; RING_CAPACITY],
    /// Position of the last hit. Lookups start scanning here.
    last_hit: u8,
    /// Next item replaced by a fill, in round-robin order.
    victim: u8,
}

impl RingSlot {
    /// Scan from the last hit for `shape`, remembering where it was found.
    fn find(&mut self, shape: ObjectShape) -> Option<usize> {
        let position = self.position_of(shape)?;
        self.last_hit = position as u8;
        Some(position)
    }

    fn position_of(&self, shape: ObjectShape) -> Option<usize> {
        let start = self.last_hit as usize;
        (0..RING_CAPACITY)
            .map(|i| (start + i) % RING_CAPACITY)
            .find(|&position| self.items[position].shape == Some(shape))
    }

    fn advance_victim(&mut self) {
        self.victim = ((self.victim as usize + 1) % RING_CAPACITY) as u8;
    }

    pub(crate) fn occupancy(&self) -> usize {
        self.items
            .iter()
            .filter(|item| item.shape.is_some())
            .count()
    }

    pub(crate) fn state_at(&self, position: usize) -> RingItemState {
        self.items[position].state()
    }

    pub(crate) fn take_item(&mut self, position: usize) -> RingItem {
        core::mem::take(&mut self.items[position])
    }
}

impl InlineCache {
    /// Look for a cached lookup of this slot's key on objects of `shape`.
    ///
    /// Scans at most [`RING_CAPACITY`] items starting at the last hit. A miss
    /// is not an error: the caller resolves the property the slow way and
    /// hands the result to [`InlineCache::fill`].
    pub fn lookup(
        self,
        agent: &mut Agent,
        ring_index: u32,
        shape: ObjectShape,
    ) -> IcResult<Option<CacheHit>> {
        let (slot, stats) = agent.heap.inline_caches[self.0].ring_mut(ring_index)?;
        let hit = slot.find(shape).map(|position| {
            let item = &slot.items[position];
            CacheHit {
                offset: item.offset,
                prototype: item.prototype,
            }
        });
        if hit.is_some() {
            stats.hits += 1;
        } else {
            stats.misses += 1;
        }
        Ok(hit)
    }

    /// Remember that `key` was found at `offset` for receivers of `shape`,
    /// on `prototype` if it is `Some`.
    ///
    /// An item already bound to `shape` is refreshed in place. Otherwise the
    /// next victim is evicted. The victim position moves by one either way,
    /// which makes replacement round-robin; hits never move it. Lookups on a
    /// prototype register a watchpoint for `key` on the prototype's current
    /// Object Shape.
    ///
    /// The caller must hold references to `shape` and `prototype` for the
    /// duration of the call.
    pub fn fill(
        self,
        agent: &mut Agent,
        ring_index: u32,
        key: PropertyKey,
        shape: ObjectShape,
        offset: u32,
        prototype: Option<Object>,
    ) -> IcResult<()> {
        let (slot, stats) = agent.heap.inline_caches[self.0].ring_mut(ring_index)?;
        stats.fills += 1;
        let position = match slot.position_of(shape) {
            Some(position) if slot.items[position].prototype == prototype => {
                slot.items[position].offset = offset;
                slot.advance_victim();
                return Ok(());
            }
            // Same receiver shape but a different holder: the item goes
            // through Empty before it is bound again.
            Some(position) => position,
            None => slot.victim as usize,
        };
        slot.advance_victim();
        let evicted = slot.take_item(position);
        if evicted.shape.is_some() {
            stats.evictions += 1;
        }
        // Take the new references before dropping the old ones: releasing
        // the evicted item can free arbitrary objects and shapes.
        shape.dup(agent);
        if let Some(prototype) = prototype {
            prototype.dup(agent);
            key.dup(agent);
        }
        release_item(agent, evicted);

        let mut item = RingItem {
            key: None,
            shape: Some(shape),
            prototype: None,
            offset,
            watchpoint: None,
        };
        if let Some(prototype) = prototype {
            let token = RingItemRef {
                cache: self,
                slot: ring_index,
                position: position as u8,
            };
            let prototype_shape = prototype.shape(agent);
            match watchpoint::register(
                agent,
                prototype_shape,
                key,
                WatchpointObserver::RingItem(token),
            ) {
                Ok(handle) => {
                    item.key = Some(key);
                    item.prototype = Some(prototype);
                    item.watchpoint = Some(handle);
                }
                Err(err) => {
                    key.release(agent);
                    prototype.release(agent);
                    shape.release(agent);
                    return Err(err);
                }
            }
        }
        let (slot, _) = agent.heap.inline_caches[self.0].ring_mut(ring_index)?;
        debug_assert_eq!(slot.items[position].state(), RingItemState::Empty);
        slot.items[position] = item;
        Ok(())
    }
}

/// Drop every reference held by an item taken out of its ring. Its
/// watchpoint, if any, is unlinked without being fired.
pub(crate) fn release_item(agent: &mut Agent, item: RingItem) {
    if let Some(handle) = item.watchpoint {
        let watchpoint = watchpoint::detach(agent, handle);
        watchpoint.key.release(agent);
    }
    release_references(agent, item);
}

fn release_references(agent: &mut Agent, item: RingItem) {
    let RingItem {
        key,
        shape,
        prototype,
        offset: _,
        watchpoint: _,
    } = item;
    if let Some(key) = key {
        key.release(agent);
    }
    if let Some(prototype) = prototype {
        prototype.release(agent);
    }
    if let Some(shape) = shape {
        shape.release(agent);
    }
}

fn item_mut(agent: &mut Agent, item: RingItemRef) -> Option<&mut RingItem> {
    agent
        .heap
        .inline_caches
        .get_mut(item.cache.0)?
        .rings
        .as_deref_mut()?
        .get_mut(item.slot as usize)?
        .items
        .get_mut(item.position as usize)
}

pub(crate) fn guarded_prototype(agent: &Agent, item: RingItemRef) -> Option<Object> {
    agent
        .heap
        .inline_caches
        .get(item.cache.0)?
        .rings
        .as_deref()?
        .get(item.slot as usize)?
        .items
        .get(item.position as usize)?
        .prototype
}

/// The watchpoint guarding `item` moved to `handle`.
pub(crate) fn repoint_watchpoint(agent: &mut Agent, item: RingItemRef, handle: WatchpointHandle) {
    let Some(item) = item_mut(agent, item) else {
        debug_assert!(false, "watchpoint observer outlived its inline cache");
        return;
    };
    debug_assert!(item.watchpoint.is_some());
    item.watchpoint = Some(handle);
}

/// Reset the ring item guarded by a fired watchpoint.
///
/// The watchpoint has already been unlinked by the Object Shape side, and
/// is freed by the caller once this returns.
pub(crate) fn on_watchpoint_event(
    agent: &mut Agent,
    item: RingItemRef,
    key: PropertyKey,
    event: WatchpointEvent,
) {
    let Some(record) = agent.heap.inline_caches.get_mut(item.cache.0) else {
        debug_assert!(false, "watchpoint observer outlived its inline cache");
        return;
    };
    let Some(slot) = record
        .rings
        .as_deref_mut()
        .and_then(|rings| rings.get_mut(item.slot as usize))
    else {
        debug_assert!(false, "watchpoint observer points outside of its ring cache");
        return;
    };
    let reset = slot.take_item(item.position as usize);
    debug_assert_eq!(reset.state(), RingItemState::BoundInherited);
    debug_assert_eq!(reset.key, Some(key));
    record.stats.invalidations += 1;
    log::trace!("{event:?} reset {item:?} watching {key:?}");
    release_references(agent, reset);
}
