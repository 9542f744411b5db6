// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use crate::execution::Agent;

use super::Object;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Value {
    #[default]
    Undefined,
    Null,
    Boolean(bool),
    Integer(i64),
    Object(Object),
}

impl Value {
    pub(crate) fn dup(self, agent: &mut Agent) -> Self {
        if let Value::Object(o) = self {
            o.dup(agent);
        }
        self
    }

    pub(crate) fn release(self, agent: &mut Agent) {
        if let Value::Object(o) = self {
            o.release(agent);
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<Object> for Value {
    fn from(value: Object) -> Self {
        Value::Object(value)
    }
}
