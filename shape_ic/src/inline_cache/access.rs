// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Cached property access as the interpreter loop performs it.

use crate::{
    error::IcResult,
    execution::Agent,
    object_model::{Object, PropertyLocation, Value},
};

use super::{CacheHit, InlineCache};

/// `object[key]` where `key` is the key reserved for `ring_index`.
pub fn get_property_cached(
    agent: &mut Agent,
    cache: InlineCache,
    ring_index: u32,
    object: Object,
) -> IcResult<Value> {
    let key = cache.key_for_slot(agent, ring_index)?;
    if agent.options.disable_inline_caches {
        return Ok(object.get_property(agent, key));
    }
    let shape = object.shape(agent);
    if let Some(CacheHit { offset, prototype }) = cache.lookup(agent, ring_index, shape)? {
        return Ok(prototype.unwrap_or(object).get_value_at(agent, offset));
    }
    let Some(PropertyLocation { offset, prototype }) = object.find_property(agent, key) else {
        return Ok(Value::Undefined);
    };
    cache.fill(agent, ring_index, key, shape, offset, prototype)?;
    Ok(prototype.unwrap_or(object).get_value_at(agent, offset))
}

/// `object[key] = value` where `key` is the key reserved for `ring_index`.
///
/// Only own properties are written; a property found on a prototype is
/// shadowed by a new own property.
pub fn set_property_cached(
    agent: &mut Agent,
    cache: InlineCache,
    ring_index: u32,
    object: Object,
    value: Value,
) -> IcResult<()> {
    let key = cache.key_for_slot(agent, ring_index)?;
    if agent.options.disable_inline_caches {
        object.define_property(agent, key, value);
        return Ok(());
    }
    let shape = object.shape(agent);
    if let Some(CacheHit {
        offset,
        prototype: None,
    }) = cache.lookup(agent, ring_index, shape)?
    {
        object.set_value_at(agent, offset, value);
        return Ok(());
    }
    let offset = object.define_property(agent, key, value);
    let shape = object.shape(agent);
    cache.fill(agent, ring_index, key, shape, offset, None)
}
