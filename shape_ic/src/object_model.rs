// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Minimal object model the inline caches are built on: interned property
//! keys, shared Object Shapes, objects with a fixed prototype, and the
//! watchpoints that Object Shapes carry.

pub(crate) mod object;
pub(crate) mod property_key;
pub(crate) mod shape;
mod value;
pub(crate) mod watchpoint;

pub use object::{Object, PropertyLocation};
pub use property_key::PropertyKey;
pub use shape::ObjectShape;
pub use value::Value;
