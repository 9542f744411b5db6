// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::{
    execution::Agent,
    heap::{CreateHeapData, Heap, indexes::heap_handle},
};

use super::{ObjectShape, PropertyKey, Value, watchpoint};

heap_handle!(
    /// An ordinary object with a fixed prototype.
    Object
);

#[derive(Debug)]
pub(crate) struct ObjectRecord {
    /// Owned reference to the current Object Shape.
    shape: ObjectShape,
    /// Property values, indexed by the offsets of `shape`.
    values: Vec<Value>,
    refcount: u32,
}

impl CreateHeapData<ObjectRecord, Object> for Heap {
    fn create(&mut self, data: ObjectRecord) -> Object {
        Object(self.objects.push(data))
    }
}

/// Where the slow path found a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertyLocation {
    pub offset: u32,
    /// The prototype holding the property, or `None` if the receiver itself
    /// holds it.
    pub prototype: Option<Object>,
}

impl Object {
    /// Create an empty object. Returns the only reference to it.
    pub fn create(agent: &mut Agent, prototype: Option<Object>) -> Self {
        let shape = ObjectShape::root_for_prototype(agent, prototype);
        agent.heap.create(ObjectRecord {
            shape,
            values: Vec::new(),
            refcount: 1,
        })
    }

    pub fn shape(self, agent: &Agent) -> ObjectShape {
        agent.heap.objects[self.0].shape
    }

    pub fn prototype(self, agent: &Agent) -> Option<Object> {
        self.shape(agent).prototype(agent)
    }

    pub fn refcount(self, agent: &Agent) -> u32 {
        agent.heap.objects[self.0].refcount
    }

    pub fn is_alive(self, agent: &Agent) -> bool {
        agent.heap.objects.get(self.0).is_some()
    }

    pub fn dup(self, agent: &mut Agent) -> Self {
        agent.heap.objects[self.0].refcount += 1;
        self
    }

    pub fn release(self, agent: &mut Agent) {
        let record = &mut agent.heap.objects[self.0];
        debug_assert!(record.refcount > 0);
        record.refcount -= 1;
        if record.refcount > 0 {
            return;
        }
        let Some(record) = agent.heap.objects.remove(self.0) else {
            return;
        };
        log::trace!("freeing {self:?}");
        for value in record.values {
            value.release(agent);
        }
        record.shape.release(agent);
    }

    /// Read the own property stored at `offset`.
    pub fn get_value_at(self, agent: &Agent, offset: u32) -> Value {
        agent.heap.objects[self.0].values[offset as usize]
    }

    /// Overwrite the own property stored at `offset`.
    pub fn set_value_at(self, agent: &mut Agent, offset: u32, value: Value) {
        value.dup(agent);
        let previous = core::mem::replace(
            &mut agent.heap.objects[self.0].values[offset as usize],
            value,
        );
        previous.release(agent);
    }

    /// Create or overwrite the own property `key`. Returns its offset.
    ///
    /// Adding a property moves the object to a child Object Shape. Cached
    /// lookups that relied on this object as a prototype follow it to the new
    /// shape, while cached lookups that found `key` further up this object's
    /// prototype chain are invalidated as they are now shadowed.
    pub fn define_property(self, agent: &mut Agent, key: PropertyKey, value: Value) -> u32 {
        let old_shape = self.shape(agent);
        if let Some(offset) = old_shape.property_offset(agent, key) {
            self.set_value_at(agent, offset, value);
            return offset;
        }
        let new_shape = old_shape.get_or_create_child(agent, key);
        value.dup(agent);
        let record = &mut agent.heap.objects[self.0];
        record.shape = new_shape;
        record.values.push(value);
        let offset = (record.values.len() - 1) as u32;
        watchpoint::transfer_guards(agent, self, old_shape, new_shape, None);
        old_shape.release(agent);
        watchpoint::sweep_prototype_chain(agent, new_shape, key);
        offset
    }

    /// Delete the own property `key`. Returns false if there was none.
    pub fn delete_property(self, agent: &mut Agent, key: PropertyKey) -> bool {
        let old_shape = self.shape(agent);
        let Some(offset) = old_shape.property_offset(agent, key) else {
            return false;
        };
        let new_shape = old_shape.without_key(agent, key);
        let record = &mut agent.heap.objects[self.0];
        record.shape = new_shape;
        let removed = record.values.remove(offset as usize);
        watchpoint::transfer_guards(agent, self, old_shape, new_shape, Some((key, offset)));
        removed.release(agent);
        old_shape.release(agent);
        true
    }

    /// Find `key` on this object or along its prototype chain.
    pub fn find_property(self, agent: &Agent, key: PropertyKey) -> Option<PropertyLocation> {
        let shape = self.shape(agent);
        if let Some(offset) = shape.property_offset(agent, key) {
            return Some(PropertyLocation {
                offset,
                prototype: None,
            });
        }
        let mut prototype = shape.prototype(agent);
        while let Some(object) = prototype {
            let shape = object.shape(agent);
            if let Some(offset) = shape.property_offset(agent, key) {
                return Some(PropertyLocation {
                    offset,
                    prototype: Some(object),
                });
            }
            prototype = shape.prototype(agent);
        }
        None
    }

    /// Get the value of `key` without consulting any inline cache.
    pub fn get_property(self, agent: &Agent, key: PropertyKey) -> Value {
        match self.find_property(agent, key) {
            Some(PropertyLocation { offset, prototype }) => {
                prototype.unwrap_or(self).get_value_at(agent, offset)
            }
            None => Value::Undefined,
        }
    }
}
