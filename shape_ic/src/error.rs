// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use core::fmt;
use std::collections::TryReserveError;

use thiserror::Error;

pub type IcResult<T> = Result<T, IcError>;

/// Failures of the inline cache subsystem.
///
/// Cache misses and duplicate slot reservations are not errors; they are
/// reported through the normal return values of the respective operations.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum IcError {
    /// An allocation needed by the cache failed. Fatal to compiling or running
    /// the owning function.
    #[error("failed to allocate {0}")]
    Allocation(AllocationSite),
    /// The compiler and the runtime disagree about the cache layout.
    #[error("inline cache protocol violation: {0}")]
    CacheProtocol(#[from] ProtocolViolation),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllocationSite {
    HashBuckets,
    HashEntry,
    RingCache,
    Watchpoint,
}

impl fmt::Display for AllocationSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            AllocationSite::HashBuckets => "hash index buckets",
            AllocationSite::HashEntry => "hash index entry",
            AllocationSite::RingCache => "ring cache",
            AllocationSite::Watchpoint => "watchpoint",
        })
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolViolation {
    #[error("ring index {ring_index} is outside of the {ring_count} reserved slots")]
    UnreservedSlot { ring_index: u32, ring_count: u32 },
    #[error("the cache is already frozen")]
    AlreadyFrozen,
    #[error("the cache has not been frozen")]
    NotFrozen,
}

impl IcError {
    /// Adapter for `try_reserve` failures: `.map_err(IcError::allocation(site))`.
    pub(crate) fn allocation(site: AllocationSite) -> impl FnOnce(TryReserveError) -> Self {
        move |_| IcError::Allocation(site)
    }
}
