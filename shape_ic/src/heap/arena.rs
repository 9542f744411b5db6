// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use core::{
    num::NonZeroU32,
    ops::{Index, IndexMut},
};

use super::indexes::{handle_from_index, index_from_handle};

/// Vector of heap records addressed by one-based handles.
///
/// Removed records leave a hole that is recycled by the next push. A handle
/// identifies a record only while that record is alive; holders keep records
/// alive through the record's own reference count.
#[derive(Debug)]
pub(crate) struct Arena<T> {
    records: Vec<Option<T>>,
    free: Vec<u32>,
    live: usize,
}

impl<T> Default for Arena<T> {
    fn default() -> Self {
        Self::with_capacity(0)
    }
}

impl<T> Arena<T> {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            records: Vec::with_capacity(capacity),
            free: Vec::new(),
            live: 0,
        }
    }

    pub(crate) fn push(&mut self, record: T) -> NonZeroU32 {
        self.live += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.records[index as usize];
            debug_assert!(slot.is_none());
            *slot = Some(record);
            return handle_from_index(index as usize);
        }
        self.records.push(Some(record));
        handle_from_index(self.records.len() - 1)
    }

    pub(crate) fn get(&self, handle: NonZeroU32) -> Option<&T> {
        self.records
            .get(index_from_handle(handle))
            .and_then(Option::as_ref)
    }

    pub(crate) fn get_mut(&mut self, handle: NonZeroU32) -> Option<&mut T> {
        self.records
            .get_mut(index_from_handle(handle))
            .and_then(Option::as_mut)
    }

    pub(crate) fn remove(&mut self, handle: NonZeroU32) -> Option<T> {
        let index = index_from_handle(handle);
        let record = self.records.get_mut(index)?.take()?;
        self.live -= 1;
        self.free.push(index as u32);
        Some(record)
    }

    /// Number of live records.
    pub(crate) fn len(&self) -> usize {
        self.live
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (NonZeroU32, &T)> {
        self.records
            .iter()
            .enumerate()
            .filter_map(|(i, record)| record.as_ref().map(|r| (handle_from_index(i), r)))
    }
}

impl<T> Index<NonZeroU32> for Arena<T> {
    type Output = T;

    fn index(&self, handle: NonZeroU32) -> &T {
        self.get(handle).expect("use of a freed heap record")
    }
}

impl<T> IndexMut<NonZeroU32> for Arena<T> {
    fn index_mut(&mut self, handle: NonZeroU32) -> &mut T {
        self.get_mut(handle).expect("use of a freed heap record")
    }
}
