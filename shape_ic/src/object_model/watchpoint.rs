// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Invalidation callbacks linked into Object Shapes.
//!
//! A watchpoint says "somebody cached a property lookup that depends on
//! `key` resolving through an object of this shape". When the property goes
//! away or the shape itself is destroyed, the watchpoint is unlinked from the
//! shape and its observer is told why. Unlinking and notifying always happen
//! together: a watchpoint is never found in a list after its observer was
//! reset, and an observer never points at a watchpoint that left its list.

use crate::{
    error::{AllocationSite, IcError, IcResult},
    execution::Agent,
    inline_cache::ring::{self, RingItemRef},
};

use super::{Object, ObjectShape, PropertyKey};

/// Position of a watchpoint in its Object Shape's watchpoint list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct WatchpointHandle {
    pub(crate) shape: ObjectShape,
    pub(crate) index: u32,
}

/// What a watchpoint guards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WatchpointObserver {
    RingItem(RingItemRef),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WatchpointEvent {
    /// The given property was deleted from the guarded object. The watched
    /// property is either that one or one stored after it.
    Delete(PropertyKey),
    /// The watched Object Shape is being destroyed, the watched lookup became
    /// shadowed further down the prototype chain, or the watchpoint could not
    /// follow the guarded object to its new Object Shape.
    Free,
}

#[derive(Debug)]
pub(crate) struct Watchpoint {
    /// Owned duplicate of the watched key.
    pub(crate) key: PropertyKey,
    pub(crate) observer: WatchpointObserver,
}

impl WatchpointObserver {
    /// The prototype object whose layout the observer depends on.
    fn guarded_object(self, agent: &Agent) -> Option<Object> {
        match self {
            WatchpointObserver::RingItem(item) => ring::guarded_prototype(agent, item),
        }
    }

    fn repoint(self, agent: &mut Agent, handle: WatchpointHandle) {
        match self {
            WatchpointObserver::RingItem(item) => ring::repoint_watchpoint(agent, item, handle),
        }
    }

    fn handle_event(self, agent: &mut Agent, key: PropertyKey, event: WatchpointEvent) {
        match self {
            WatchpointObserver::RingItem(item) => {
                ring::on_watchpoint_event(agent, item, key, event)
            }
        }
    }
}

/// Link a new watchpoint for `key` into `shape`.
///
/// The watchpoint holds its own reference to `key`. References to the
/// guarded object are the observer's business.
pub(crate) fn register(
    agent: &mut Agent,
    shape: ObjectShape,
    key: PropertyKey,
    observer: WatchpointObserver,
) -> IcResult<WatchpointHandle> {
    let list = &mut agent.heap.object_shapes[shape.0].watchpoints;
    list.try_reserve(1)
        .map_err(IcError::allocation(AllocationSite::Watchpoint))?;
    list.push(Watchpoint { key, observer });
    let handle = WatchpointHandle {
        shape,
        index: (list.len() - 1) as u32,
    };
    key.dup(agent);
    log::trace!("registered watchpoint {handle:?} on {key:?} for {observer:?}");
    Ok(handle)
}

/// Unlink the watchpoint at `handle` without notifying its observer.
///
/// The last watchpoint of the list takes the freed position and its
/// observer is re-pointed, keeping the removal O(1).
pub(crate) fn detach(agent: &mut Agent, handle: WatchpointHandle) -> Watchpoint {
    let list = &mut agent.heap.object_shapes[handle.shape.0].watchpoints;
    let watchpoint = list.swap_remove(handle.index as usize);
    if let Some(moved) = list.get(handle.index as usize) {
        let observer = moved.observer;
        observer.repoint(agent, handle);
    }
    watchpoint
}

/// Deliver `event` to an already unlinked watchpoint and free it.
pub(crate) fn notify(agent: &mut Agent, watchpoint: Watchpoint, event: WatchpointEvent) {
    let Watchpoint { key, observer } = watchpoint;
    log::trace!("watchpoint on {key:?} fired {event:?} for {observer:?}");
    observer.handle_event(agent, key, event);
    key.release(agent);
}

/// Move the watchpoint at `handle` to the list of `to`.
///
/// Returns false if `to` could not make room for it, in which case the
/// watchpoint was left untouched.
fn migrate(agent: &mut Agent, handle: WatchpointHandle, to: ObjectShape) -> bool {
    if agent.heap.object_shapes[to.0]
        .watchpoints
        .try_reserve(1)
        .is_err()
    {
        return false;
    }
    let watchpoint = detach(agent, handle);
    let observer = watchpoint.observer;
    let list = &mut agent.heap.object_shapes[to.0].watchpoints;
    list.push(watchpoint);
    let new_handle = WatchpointHandle {
        shape: to,
        index: (list.len() - 1) as u32,
    };
    observer.repoint(agent, new_handle);
    true
}

/// Fire-as-free every watchpoint on `key` linked into the Object Shapes of
/// `shape`'s prototype chain.
///
/// Used when an object of `shape` starts to own `key`: lookups that found
/// `key` further up the chain may now be shadowed.
pub(crate) fn sweep_prototype_chain(agent: &mut Agent, shape: ObjectShape, key: PropertyKey) {
    let mut prototype = shape.prototype(agent);
    while let Some(object) = prototype {
        let ancestor = object.shape(agent);
        while let Some(index) = agent.heap.object_shapes[ancestor.0]
            .watchpoints
            .iter()
            .position(|w| w.key == key)
        {
            let watchpoint = detach(
                agent,
                WatchpointHandle {
                    shape: ancestor,
                    index: index as u32,
                },
            );
            notify(agent, watchpoint, WatchpointEvent::Free);
        }
        prototype = ancestor.prototype(agent);
    }
}

/// Carry the watchpoints guarding `object` over from `from` to `to` after
/// the object changed its shape.
///
/// When the transition removed a property (`removed` holds its key and old
/// offset), watchpoints on that key and on every key stored after it fire
/// [`WatchpointEvent::Delete`]: their cached offsets are no longer valid.
/// Everything else moves to `to`, where the cached offsets still hold, or
/// fires [`WatchpointEvent::Free`] if `to` cannot take it.
pub(crate) fn transfer_guards(
    agent: &mut Agent,
    object: Object,
    from: ObjectShape,
    to: ObjectShape,
    removed: Option<(PropertyKey, u32)>,
) {
    debug_assert_ne!(from, to);
    let mut index = 0;
    loop {
        let Some(watchpoint) = agent.heap.object_shapes[from.0].watchpoints.get(index) else {
            break;
        };
        let key = watchpoint.key;
        if watchpoint.observer.guarded_object(agent) != Some(object) {
            index += 1;
            continue;
        }
        let handle = WatchpointHandle {
            shape: from,
            index: index as u32,
        };
        // Migrated or fired, the watchpoint leaves `index` to the next one.
        let event = match removal_event(agent, from, key, removed) {
            Some(event) => event,
            None if migrate(agent, handle, to) => continue,
            None => WatchpointEvent::Free,
        };
        let watchpoint = detach(agent, handle);
        notify(agent, watchpoint, event);
    }
}

/// Event for a watchpoint on `key` when `removed` leaves objects of `shape`.
/// The removed key and every key stored after it move or vanish.
fn removal_event(
    agent: &Agent,
    shape: ObjectShape,
    key: PropertyKey,
    removed: Option<(PropertyKey, u32)>,
) -> Option<WatchpointEvent> {
    let (removed_key, removed_offset) = removed?;
    let invalidated = key == removed_key
        || shape
            .property_offset(agent, key)
            .is_some_and(|offset| offset > removed_offset);
    invalidated.then_some(WatchpointEvent::Delete(removed_key))
}
