// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::heap::Heap;

/// Runtime switches of an [`Agent`].
#[derive(Debug, Default, Clone, Copy)]
pub struct Options {
    /// Resolve every cached access through the slow path. Lookups and fills
    /// are skipped entirely, which turns the caches into pure bookkeeping
    /// and gives a reference result to compare cached execution against.
    pub disable_inline_caches: bool,
    /// Log the full key to ring index assignment when a cache is frozen.
    pub print_internals: bool,
}

/// Owner of all objects, shapes, property keys and inline caches.
///
/// Everything in this crate is single threaded: the agent is only ever
/// mutated by the thread executing on it.
#[derive(Debug)]
pub struct Agent {
    pub(crate) heap: Heap,
    pub options: Options,
}

impl Agent {
    pub fn new(options: Options) -> Self {
        Self {
            heap: Heap::new(),
            options,
        }
    }

    /// Number of watchpoints currently linked into any Object Shape.
    pub fn live_watchpoint_count(&self) -> usize {
        self.heap
            .object_shapes
            .iter()
            .map(|(_, shape)| shape.watchpoints.len())
            .sum()
    }

    pub fn live_object_count(&self) -> usize {
        self.heap.objects.len()
    }

    pub fn live_shape_count(&self) -> usize {
        self.heap.object_shapes.len()
    }

    pub fn live_key_count(&self) -> usize {
        self.heap.keys.len()
    }

    pub fn live_inline_cache_count(&self) -> usize {
        self.heap.inline_caches.len()
    }
}

impl Default for Agent {
    fn default() -> Self {
        Self::new(Options::default())
    }
}
