// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use core::num::NonZeroU32;

/// Declares a heap handle: a non-zero index into one of the [`Heap`]
/// arenas. Due to the non-zero value, the offset in the arena is offset by
/// one.
///
/// [`Heap`]: crate::heap::Heap
macro_rules! heap_handle {
    ($(#[$attr:meta])* $name:ident) => {
        $(#[$attr])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[repr(transparent)]
        pub struct $name(pub(crate) core::num::NonZeroU32);

        impl $name {
            /// Get the implied usize index of the handle.
            #[inline(always)]
            pub fn get_index(self) -> usize {
                self.0.get().wrapping_sub(1) as usize
            }
        }

        impl core::fmt::Debug for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, concat!(stringify!($name), "({:?})"), self.get_index())
            }
        }
    };
}

pub(crate) use heap_handle;

/// Converts a zero-based arena index into its one-based handle value.
#[inline(always)]
pub(crate) fn handle_from_index(index: usize) -> NonZeroU32 {
    u32::try_from(index)
        .ok()
        .and_then(|index| index.checked_add(1))
        .and_then(NonZeroU32::new)
        .expect("heap arena index overflow")
}

#[inline(always)]
pub(crate) fn index_from_handle(handle: NonZeroU32) -> usize {
    (handle.get() - 1) as usize
}
