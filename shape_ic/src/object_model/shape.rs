// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use ahash::AHashMap;

use crate::{
    execution::Agent,
    heap::{CreateHeapData, Heap, indexes::heap_handle},
};

use super::{
    Object, PropertyKey,
    watchpoint::{self, Watchpoint, WatchpointEvent},
};

heap_handle!(
    /// Data structure describing the shape of an object.
    ///
    /// Object Shapes are shared: all objects with the same prototype and the
    /// same keys added in the same order have the same Object Shape, so
    /// comparing shapes by identity is enough to know that a property lives
    /// at the same offset.
    ObjectShape
);

/// Data structure describing the shape of an object.
///
/// ## Ownership
///
/// A shape holds one reference on its prototype, on each of its keys and on
/// its parent shape. The transition table and the root shape table are weak:
/// a child removes itself from its parent when it is destroyed.
///
/// ## Watchpoints
///
/// Inline caches that found a property on an object using this shape as a
/// prototype register a [`Watchpoint`] here. The list is owned by the
/// shape; the guarded ring item only remembers the watchpoint's position.
#[derive(Debug)]
pub(crate) struct ObjectShapeRecord {
    pub(crate) prototype: Option<Object>,
    pub(crate) keys: Vec<PropertyKey>,
    pub(crate) parent: Option<ObjectShape>,
    pub(crate) transitions: AHashMap<PropertyKey, ObjectShape>,
    pub(crate) refcount: u32,
    pub(crate) watchpoints: Vec<Watchpoint>,
}

impl CreateHeapData<ObjectShapeRecord, ObjectShape> for Heap {
    fn create(&mut self, data: ObjectShapeRecord) -> ObjectShape {
        ObjectShape(self.object_shapes.push(data))
    }
}

impl ObjectShape {
    /// Get the root Object Shape for objects with the given prototype,
    /// creating it if needed. Returns a new reference.
    pub fn root_for_prototype(agent: &mut Agent, prototype: Option<Object>) -> Self {
        if let Some(shape) = agent.heap.root_shapes.get(&prototype).copied() {
            return shape.dup(agent);
        }
        if let Some(prototype) = prototype {
            prototype.dup(agent);
        }
        let shape = agent.heap.create(ObjectShapeRecord {
            prototype,
            keys: Vec::new(),
            parent: None,
            transitions: AHashMap::new(),
            refcount: 1,
            watchpoints: Vec::new(),
        });
        agent.heap.root_shapes.insert(prototype, shape);
        log::trace!("created root {shape:?} for prototype {prototype:?}");
        shape
    }

    /// Get the Object Shape that is reached by adding `key` to this Object
    /// Shape, creating it if no such transition exists yet. Returns a new
    /// reference.
    pub fn get_or_create_child(self, agent: &mut Agent, key: PropertyKey) -> Self {
        let record = &agent.heap.object_shapes[self.0];
        debug_assert!(!record.keys.contains(&key));
        if let Some(child) = record.transitions.get(&key).copied() {
            return child.dup(agent);
        }
        let prototype = record.prototype;
        let mut keys = Vec::with_capacity(record.keys.len() + 1);
        keys.extend_from_slice(&record.keys);
        keys.push(key);
        for key in keys.iter() {
            key.dup(agent);
        }
        if let Some(prototype) = prototype {
            prototype.dup(agent);
        }
        self.dup(agent);
        let child = agent.heap.create(ObjectShapeRecord {
            prototype,
            keys,
            parent: Some(self),
            transitions: AHashMap::new(),
            refcount: 1,
            watchpoints: Vec::new(),
        });
        agent.heap.object_shapes[self.0]
            .transitions
            .insert(key, child);
        log::trace!("created {child:?} from {self:?} + {key:?}");
        child
    }

    /// Get the Object Shape with the same prototype and keys as this one,
    /// minus `key`. Returns a new reference.
    pub fn without_key(self, agent: &mut Agent, key: PropertyKey) -> Self {
        let record = &agent.heap.object_shapes[self.0];
        let prototype = record.prototype;
        let keys: Vec<PropertyKey> = record.keys.iter().copied().filter(|k| *k != key).collect();
        let mut shape = Self::root_for_prototype(agent, prototype);
        for k in keys {
            let next = shape.get_or_create_child(agent, k);
            shape.release(agent);
            shape = next;
        }
        shape
    }

    pub fn prototype(self, agent: &Agent) -> Option<Object> {
        agent.heap.object_shapes[self.0].prototype
    }

    pub fn parent(self, agent: &Agent) -> Option<ObjectShape> {
        agent.heap.object_shapes[self.0].parent
    }

    pub fn keys(self, agent: &Agent) -> &[PropertyKey] {
        &agent.heap.object_shapes[self.0].keys
    }

    pub fn len(self, agent: &Agent) -> u32 {
        agent.heap.object_shapes[self.0].keys.len() as u32
    }

    pub fn is_empty(self, agent: &Agent) -> bool {
        self.len(agent) == 0
    }

    /// Offset of `key` in objects of this Object Shape.
    pub fn property_offset(self, agent: &Agent, key: PropertyKey) -> Option<u32> {
        agent.heap.object_shapes[self.0]
            .keys
            .iter()
            .position(|k| *k == key)
            .map(|i| i as u32)
    }

    pub fn refcount(self, agent: &Agent) -> u32 {
        agent.heap.object_shapes[self.0].refcount
    }

    /// Number of watchpoints linked into this Object Shape.
    pub fn watchpoint_count(self, agent: &Agent) -> usize {
        agent.heap.object_shapes[self.0].watchpoints.len()
    }

    pub fn is_alive(self, agent: &Agent) -> bool {
        agent.heap.object_shapes.get(self.0).is_some()
    }

    pub fn dup(self, agent: &mut Agent) -> Self {
        agent.heap.object_shapes[self.0].refcount += 1;
        self
    }

    pub fn release(self, agent: &mut Agent) {
        let record = &mut agent.heap.object_shapes[self.0];
        debug_assert!(record.refcount > 0);
        record.refcount -= 1;
        log::trace!("{self:?} refcount -> {}", record.refcount);
        if record.refcount == 0 {
            self.destroy(agent);
        }
    }

    fn destroy(self, agent: &mut Agent) {
        // Watchpoints go first, while the record is still in place. Their
        // handlers only touch the guarded ring items, never this shape.
        let watchpoints = core::mem::take(&mut agent.heap.object_shapes[self.0].watchpoints);
        for watchpoint in watchpoints {
            watchpoint::notify(agent, watchpoint, WatchpointEvent::Free);
        }
        let Some(record) = agent.heap.object_shapes.remove(self.0) else {
            return;
        };
        log::trace!("freeing {self:?}");
        debug_assert!(record.watchpoints.is_empty());
        debug_assert!(record.transitions.is_empty());
        match record.parent {
            Some(parent) => {
                if let Some(last) = record.keys.last() {
                    let transitions = &mut agent.heap.object_shapes[parent.0].transitions;
                    if transitions.get(last) == Some(&self) {
                        transitions.remove(last);
                    }
                }
            }
            None => {
                if agent.heap.root_shapes.get(&record.prototype) == Some(&self) {
                    agent.heap.root_shapes.remove(&record.prototype);
                }
            }
        }
        for key in record.keys {
            key.release(agent);
        }
        if let Some(parent) = record.parent {
            parent.release(agent);
        }
        if let Some(prototype) = record.prototype {
            prototype.release(agent);
        }
    }
}
