//! Values passed to and returned from invoked members.

use std::{fmt, sync::Arc};

use crate::{metadata::typesystem::Constant, runtime::ObjectRef};

/// A value flowing through an [`crate::runtime::Invocation`].
///
/// `Value` covers the primitive types of the runtime type model plus object references.
///
/// | Signature | Variant |
/// |-----------|---------|
/// | `Void` | [`Value::Void`] |
/// | `Boolean` | [`Value::Bool`] |
/// | `Char` | [`Value::Char`] |
/// | `Int32` | [`Value::I4`] |
/// | `Int64` | [`Value::I8`] |
/// | `Double` | [`Value::R8`] |
/// | `String` | [`Value::String`] |
/// | Interfaces, classes, value types | [`Value::Object`] |
/// | `null` | [`Value::Null`] |
///
/// Equality on [`Value::Object`] is reference identity: two values are equal only if they
/// point to the same object.
#[derive(Clone, Default)]
pub enum Value {
    /// No value, returned by `void` members.
    #[default]
    Void,

    /// Null reference.
    ///
    /// Also the placeholder for an `out` argument before the callee assigns it.
    Null,

    /// Boolean value.
    Bool(bool),

    /// Unicode character.
    Char(char),

    /// 32-bit signed integer.
    I4(i32),

    /// 64-bit signed integer.
    I8(i64),

    /// 64-bit floating point.
    R8(f64),

    /// String value.
    String(String),

    /// Reference to an object.
    Object(ObjectRef),
}

impl Value {
    /// Returns `true` for [`Value::Null`]
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns `true` for [`Value::Void`]
    #[must_use]
    pub fn is_void(&self) -> bool {
        matches!(self, Value::Void)
    }

    /// The boolean, if this is one
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(value) => Some(*value),
            _ => None,
        }
    }

    /// The 32-bit integer, if this is one
    #[must_use]
    pub fn as_i4(&self) -> Option<i32> {
        match self {
            Value::I4(value) => Some(*value),
            _ => None,
        }
    }

    /// The 64-bit integer, if this is one (32-bit integers are widened)
    #[must_use]
    pub fn as_i8(&self) -> Option<i64> {
        match self {
            Value::I4(value) => Some(i64::from(*value)),
            Value::I8(value) => Some(*value),
            _ => None,
        }
    }

    /// The double, if this is one
    #[must_use]
    pub fn as_r8(&self) -> Option<f64> {
        match self {
            Value::R8(value) => Some(*value),
            _ => None,
        }
    }

    /// The string, if this is one
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(value) => Some(value),
            _ => None,
        }
    }

    /// The object reference, if this is one
    #[must_use]
    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(object) => Some(object),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Void, Value::Void) | (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Char(a), Value::Char(b)) => a == b,
            (Value::I4(a), Value::I4(b)) => a == b,
            (Value::I8(a), Value::I8(b)) => a == b,
            (Value::R8(a), Value::R8(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => {
                std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
            }
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Void => write!(f, "Void"),
            Value::Null => write!(f, "Null"),
            Value::Bool(value) => write!(f, "Bool({value})"),
            Value::Char(value) => write!(f, "Char({value:?})"),
            Value::I4(value) => write!(f, "I4({value})"),
            Value::I8(value) => write!(f, "I8({value})"),
            Value::R8(value) => write!(f, "R8({value})"),
            Value::String(value) => write!(f, "String({value:?})"),
            Value::Object(object) => write!(f, "Object({})", object.type_name()),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<char> for Value {
    fn from(value: char) -> Self {
        Value::Char(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::I4(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::I8(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::R8(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<ObjectRef> for Value {
    fn from(value: ObjectRef) -> Self {
        Value::Object(value)
    }
}

impl From<&Constant> for Value {
    fn from(constant: &Constant) -> Self {
        match constant {
            Constant::Null => Value::Null,
            Constant::Bool(value) => Value::Bool(*value),
            Constant::I4(value) => Value::I4(*value),
            Constant::I8(value) => Value::I8(*value),
            Constant::R8(value) => Value::R8(*value),
            Constant::String(value) => Value::String(value.clone()),
        }
    }
}
