// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Property access inline caches for a shape-based object model.
//!
//! A compiled function owns one [`InlineCache`]. While compiling, every
//! distinct property key that gets a cache site reserves a slot in the
//! cache's hash index; [`InlineCache::freeze`] then turns the index into a
//! ring cache with one ring per key. At runtime each access first tries
//! [`InlineCache::lookup`] and, on a miss, resolves the property through the
//! slow path and records the result with [`InlineCache::fill`].
//!
//! Entries found on a prototype are guarded by watchpoints registered on the
//! prototype's shape, so that deleting the property or destroying the shape
//! lazily resets the cached entry.

pub mod error;
pub mod execution;
pub(crate) mod heap;
pub mod inline_cache;
pub mod object_model;

pub use error::{AllocationSite, IcError, IcResult, ProtocolViolation};
pub use execution::{Agent, Options};
pub use inline_cache::{
    CacheHit, IcStats, InlineCache, RING_CAPACITY, RingItemState, SlotReservation,
    access::{get_property_cached, set_property_cached},
};
pub use object_model::{Object, ObjectShape, PropertyKey, PropertyLocation, Value};
