// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use hashbrown::hash_table::Entry;

use crate::{execution::Agent, heap::indexes::heap_handle};

heap_handle!(
    /// Interned property name.
    ///
    /// Keys compare by identity: two keys are equal exactly when they were
    /// interned from the same name while the first one was still alive.
    PropertyKey
);

#[derive(Debug)]
pub(crate) struct PropertyKeyRecord {
    name: Box<str>,
    refcount: u32,
}

impl PropertyKey {
    /// Intern `name`, returning a key that holds one reference.
    pub fn intern(agent: &mut Agent, name: &str) -> Self {
        let hash = agent.heap.hash_key_name(name);
        let heap = &mut agent.heap;
        let keys = &heap.keys;
        let hasher = &heap.key_hasher;
        let entry = heap.key_lookup_table.entry(
            hash,
            |k| &*keys[k.0].name == name,
            |k| core::hash::BuildHasher::hash_one(hasher, &*keys[k.0].name),
        );
        match entry {
            Entry::Occupied(e) => {
                let key = *e.get();
                let record = &mut heap.keys[key.0];
                record.refcount += 1;
                log::trace!("key {name:?} refcount -> {}", record.refcount);
                key
            }
            Entry::Vacant(e) => {
                let key = PropertyKey(heap.keys.push(PropertyKeyRecord {
                    name: name.into(),
                    refcount: 1,
                }));
                e.insert(key);
                log::trace!("interned key {name:?} as {key:?}");
                key
            }
        }
    }

    /// Numeric identity of the key, never zero.
    #[inline(always)]
    pub fn id(self) -> u32 {
        self.0.get()
    }

    pub fn name(self, agent: &Agent) -> &str {
        &agent.heap.keys[self.0].name
    }

    pub fn refcount(self, agent: &Agent) -> u32 {
        agent.heap.keys[self.0].refcount
    }

    pub fn dup(self, agent: &mut Agent) -> Self {
        let record = &mut agent.heap.keys[self.0];
        record.refcount += 1;
        self
    }

    pub fn release(self, agent: &mut Agent) {
        let heap = &mut agent.heap;
        let record = &mut heap.keys[self.0];
        debug_assert!(record.refcount > 0);
        record.refcount -= 1;
        if record.refcount > 0 {
            return;
        }
        let Some(record) = heap.keys.remove(self.0) else {
            return;
        };
        log::trace!("freeing key {:?}", record.name);
        let hash = heap.hash_key_name(&record.name);
        if let Ok(entry) = heap.key_lookup_table.find_entry(hash, |k| *k == self) {
            entry.remove();
        }
    }
}
