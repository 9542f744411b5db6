// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Compile-time index from property key to ring slot.

use crate::{
    error::{AllocationSite, IcError, IcResult},
    object_model::PropertyKey,
};

const INITIAL_HASH_BITS: u32 = 2;
const HASH_MULTIPLIER: u32 = 0x9e37_0001;

#[derive(Debug)]
struct HashEntry {
    /// Owned duplicate of the key.
    key: PropertyKey,
    /// Ring index. Meaningless until the index is frozen.
    index: u32,
    next: Option<u32>,
}

/// Open-chaining hash table over a power-of-two bucket array.
///
/// Entries live in a vector in insertion order and are chained by position.
/// The table only ever grows.
#[derive(Debug)]
pub(crate) struct HashIndex {
    bits: u32,
    buckets: Vec<Option<u32>>,
    entries: Vec<HashEntry>,
}

#[inline(always)]
fn bucket_of(key: PropertyKey, bits: u32) -> usize {
    (key.id().wrapping_mul(HASH_MULTIPLIER) >> (32 - bits)) as usize
}

impl HashIndex {
    pub(crate) fn new() -> IcResult<Self> {
        let mut buckets = Vec::new();
        buckets
            .try_reserve_exact(1 << INITIAL_HASH_BITS)
            .map_err(IcError::allocation(AllocationSite::HashBuckets))?;
        buckets.resize(1 << INITIAL_HASH_BITS, None);
        Ok(Self {
            bits: INITIAL_HASH_BITS,
            buckets,
            entries: Vec::new(),
        })
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn capacity(&self) -> usize {
        self.buckets.len()
    }

    fn find(&self, key: PropertyKey) -> Option<&HashEntry> {
        let mut cursor = self.buckets[bucket_of(key, self.bits)];
        while let Some(i) = cursor {
            let entry = &self.entries[i as usize];
            if entry.key == key {
                return Some(entry);
            }
            cursor = entry.next;
        }
        None
    }

    pub(crate) fn contains(&self, key: PropertyKey) -> bool {
        self.find(key).is_some()
    }

    /// Ring index assigned to `key`. Only meaningful after
    /// [`HashIndex::assign_ring_indexes`].
    pub(crate) fn ring_index_of(&self, key: PropertyKey) -> Option<u32> {
        self.find(key).map(|entry| entry.index)
    }

    /// Insert `key`, which must not be present yet. The caller transfers one
    /// reference of `key` to the index on success.
    pub(crate) fn insert(&mut self, key: PropertyKey) -> IcResult<()> {
        debug_assert!(!self.contains(key));
        if self.entries.len() + 1 >= self.capacity() {
            self.grow()?;
        }
        self.entries
            .try_reserve(1)
            .map_err(IcError::allocation(AllocationSite::HashEntry))?;
        self.entries.push(HashEntry {
            key,
            index: 0,
            next: None,
        });
        self.link_at_tail((self.entries.len() - 1) as u32);
        Ok(())
    }

    /// Double the bucket array and rehash every entry.
    ///
    /// Entries are relinked in insertion order, so each chain stays in
    /// insertion order.
    fn grow(&mut self) -> IcResult<()> {
        let bits = self.bits + 1;
        let mut buckets = Vec::new();
        buckets
            .try_reserve_exact(1 << bits)
            .map_err(IcError::allocation(AllocationSite::HashBuckets))?;
        buckets.resize(1 << bits, None);
        self.bits = bits;
        self.buckets = buckets;
        for i in 0..self.entries.len() {
            self.entries[i].next = None;
            self.link_at_tail(i as u32);
        }
        Ok(())
    }

    fn link_at_tail(&mut self, entry: u32) {
        let bucket = bucket_of(self.entries[entry as usize].key, self.bits);
        let Some(mut cursor) = self.buckets[bucket] else {
            self.buckets[bucket] = Some(entry);
            return;
        };
        while let Some(next) = self.entries[cursor as usize].next {
            cursor = next;
        }
        self.entries[cursor as usize].next = Some(entry);
    }

    /// Entries in bucket-major, then chain order.
    fn chain_order(&self) -> impl Iterator<Item = usize> + '_ {
        self.buckets.iter().flat_map(move |head| {
            core::iter::successors(head.map(|i| i as usize), move |&i| {
                self.entries[i].next.map(|next| next as usize)
            })
        })
    }

    /// Assign dense ring indexes in bucket-major, then chain order and return
    /// the keys by ring index.
    pub(crate) fn assign_ring_indexes(&mut self) -> IcResult<Vec<PropertyKey>> {
        let mut keys = Vec::new();
        keys.try_reserve_exact(self.entries.len())
            .map_err(IcError::allocation(AllocationSite::RingCache))?;
        let order: Vec<usize> = self.chain_order().collect();
        for (index, entry) in order.into_iter().enumerate() {
            let entry = &mut self.entries[entry];
            entry.index = index as u32;
            keys.push(entry.key);
        }
        debug_assert_eq!(keys.len(), self.entries.len());
        Ok(keys)
    }

    /// Hand back the owned keys in bucket-major, then chain order, emptying
    /// the index.
    pub(crate) fn drain_keys(&mut self) -> Vec<PropertyKey> {
        let keys = self
            .chain_order()
            .map(|i| self.entries[i].key)
            .collect();
        self.entries.clear();
        self.buckets.iter_mut().for_each(|head| *head = None);
        keys
    }
}
