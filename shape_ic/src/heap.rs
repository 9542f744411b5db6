// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

pub(crate) mod arena;
pub(crate) mod indexes;

use core::hash::BuildHasher;

use ahash::{AHashMap, RandomState};
use hashbrown::HashTable;

use crate::{
    inline_cache::InlineCacheRecord,
    object_model::{
        Object, ObjectShape, PropertyKey, object::ObjectRecord,
        property_key::PropertyKeyRecord, shape::ObjectShapeRecord,
    },
};

use self::arena::Arena;

/// All records owned by one [`Agent`](crate::Agent).
///
/// Records refer to each other only through handles; ownership between
/// them is expressed with reference counts kept in the records themselves.
#[derive(Debug)]
pub(crate) struct Heap {
    pub(crate) keys: Arena<PropertyKeyRecord>,
    /// Intern table from key name to key. Holds no references.
    pub(crate) key_lookup_table: HashTable<PropertyKey>,
    pub(crate) key_hasher: RandomState,
    pub(crate) object_shapes: Arena<ObjectShapeRecord>,
    /// Root Object Shape of every prototype, including `None`. Weakly held.
    pub(crate) root_shapes: AHashMap<Option<Object>, ObjectShape>,
    pub(crate) objects: Arena<ObjectRecord>,
    pub(crate) inline_caches: Arena<InlineCacheRecord>,
}

impl Heap {
    pub(crate) fn new() -> Self {
        Self {
            keys: Arena::with_capacity(64),
            key_lookup_table: HashTable::with_capacity(64),
            key_hasher: RandomState::new(),
            object_shapes: Arena::with_capacity(64),
            root_shapes: AHashMap::with_capacity(16),
            objects: Arena::with_capacity(256),
            inline_caches: Arena::with_capacity(16),
        }
    }

    pub(crate) fn hash_key_name(&self, name: &str) -> u64 {
        BuildHasher::hash_one(&self.key_hasher, name)
    }
}

pub(crate) trait CreateHeapData<T, F> {
    /// Moves the record into the heap and returns its handle. The record
    /// starts out with the reference count it was created with.
    fn create(&mut self, data: T) -> F;
}
