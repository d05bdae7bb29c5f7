//! Return-value strategies for calls nothing was configured for.

use std::fmt;

use tracing::debug;

use crate::value::{Value, ValueType};
use crate::Double;

/// Deepest nesting level [MockDefault] grows a double tree to.
pub const MAX_NESTING_DEPTH: usize = 8;

/// Produces the value of an unconfigured call, given the member's declared
/// type and the double that received the call.
pub trait DefaultValueProvider: fmt::Debug + Send + Sync {
    fn default_value(&self, ty: &ValueType, double: &Double) -> Value;
}

/// Zero, false, empty text and lists, and null for reference-like types.
#[derive(Clone, Copy, Debug, Default)]
pub struct EmptyDefault;

impl DefaultValueProvider for EmptyDefault {
    fn default_value(&self, ty: &ValueType, _double: &Double) -> Value {
        ty.empty_value()
    }
}

/// Like [EmptyDefault], except that fakeable object types, optional or not, get
/// a nested double, so chains of unconfigured getters resolve down to an empty
/// leaf value.
///
/// Nested doubles are memoized per double tree by declared type, and the tree
/// stops growing at [MAX_NESTING_DEPTH], past which `Null` is returned.
#[derive(Clone, Copy, Debug, Default)]
pub struct MockDefault;

impl DefaultValueProvider for MockDefault {
    fn default_value(&self, ty: &ValueType, double: &Double) -> Value {
        let Some(object) = ty.object_type() else {
            return ty.empty_value();
        };
        let Some(capability) = object.capability() else {
            return Value::Null;
        };
        match double.nested(capability) {
            Some(nested) => Value::Double(nested),
            None => {
                debug!(double = %double, ty = %ty, "no nested double, falling back to null");
                Value::Null
            }
        }
    }
}
