//! Dynamic values crossing the dispatch boundary of a [Double].
//!
//! Every argument and every result of an intercepted call travels as a [Value].
//! Native Rust types are converted with [IntoValue] and [FromValue]; the latter
//! also reports the [ValueType] a member declares, which is what default value
//! strategies key on.

use std::fmt;

use crate::{Capability, Double, Failure};

/// A dynamically typed argument or result.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// Absence marker for reference-like types.
    Null,
    Unit,
    Bool(bool),
    Int(i64),
    /// Unsigned integer above `i64::MAX`. Smaller unsigned values are `Int`,
    /// so every integer has exactly one representation.
    UInt(u64),
    Float(f64),
    Text(String),
    List(Vec<Value>),
    /// A nested double, compared by identity.
    Double(Double),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Short name of the variant, used in mismatch messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Unit => "unit",
            Value::Bool(_) => "bool",
            Value::Int(_) | Value::UInt(_) => "int",
            Value::Float(_) => "float",
            Value::Text(_) => "text",
            Value::List(_) => "list",
            Value::Double(_) => "double",
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_double(&self) -> Option<&Double> {
        match self {
            Value::Double(double) => Some(double),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Unit => f.write_str("()"),
            Value::Bool(value) => write!(f, "{value}"),
            Value::Int(value) => write!(f, "{value}"),
            Value::UInt(value) => write!(f, "{value}"),
            Value::Float(value) => write!(f, "{value:?}"),
            Value::Text(value) => write!(f, "{value:?}"),
            Value::List(values) => {
                f.write_str("[")?;
                write_joined(f, values)?;
                f.write_str("]")
            }
            Value::Double(double) => write!(f, "{double}"),
        }
    }
}

pub(crate) fn write_joined<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T]) -> fmt::Result {
    for (index, item) in items.iter().enumerate() {
        if index > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

pub(crate) fn join<T: fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// The declared type of a parameter, property or return value.
#[derive(Clone, Debug)]
pub enum ValueType {
    Any,
    Unit,
    Bool,
    Int,
    Float,
    Text,
    List(Box<ValueType>),
    Object(ObjectType),
    /// A value that may be absent, declared by `Option<T>`.
    Optional(Box<ValueType>),
}

/// A reference-like declared type.
///
/// An object type carrying a capability factory can itself be faked, which is
/// what lets [crate::MockDefault] grow a tree of nested doubles.
#[derive(Clone, Copy)]
pub struct ObjectType {
    name: &'static str,
    capability: Option<fn() -> Capability>,
}

impl ObjectType {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_fakeable(&self) -> bool {
        self.capability.is_some()
    }

    pub fn capability(&self) -> Option<Capability> {
        self.capability.map(|factory| factory())
    }
}

impl fmt::Debug for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectType")
            .field("name", &self.name)
            .field("fakeable", &self.is_fakeable())
            .finish()
    }
}

impl ValueType {
    /// A fakeable object type. The factory is only called when a nested double
    /// is needed, so self-referential capabilities are fine.
    pub fn object(name: &'static str, capability: fn() -> Capability) -> Self {
        ValueType::Object(ObjectType {
            name,
            capability: Some(capability),
        })
    }

    /// An object type that cannot be faked.
    pub fn opaque(name: &'static str) -> Self {
        ValueType::Object(ObjectType {
            name,
            capability: None,
        })
    }

    pub fn list(element: ValueType) -> Self {
        ValueType::List(Box::new(element))
    }

    pub fn optional(inner: ValueType) -> Self {
        ValueType::Optional(Box::new(inner))
    }

    /// The object type behind this type, looking through `Optional`.
    pub fn object_type(&self) -> Option<&ObjectType> {
        match self {
            ValueType::Object(object) => Some(object),
            ValueType::Optional(inner) => inner.object_type(),
            _ => None,
        }
    }

    /// The "empty" value of this type: zero, false, empty text or list, and the
    /// absence marker for reference-like types.
    pub fn empty_value(&self) -> Value {
        match self {
            ValueType::Any | ValueType::Object(_) | ValueType::Optional(_) => Value::Null,
            ValueType::Unit => Value::Unit,
            ValueType::Bool => Value::Bool(false),
            ValueType::Int => Value::Int(0),
            ValueType::Float => Value::Float(0.0),
            ValueType::Text => Value::Text(String::new()),
            ValueType::List(_) => Value::List(Vec::new()),
        }
    }

    /// Whether `value` can be passed where this type is declared.
    pub fn admits(&self, value: &Value) -> bool {
        match (self, value) {
            (ValueType::Any, _) => true,
            (ValueType::Unit, Value::Unit) => true,
            (ValueType::Bool, Value::Bool(_)) => true,
            (ValueType::Int, Value::Int(_) | Value::UInt(_)) => true,
            (ValueType::Float, Value::Float(_) | Value::Int(_) | Value::UInt(_)) => true,
            (
                ValueType::Text | ValueType::List(_) | ValueType::Object(_) | ValueType::Optional(_),
                Value::Null,
            ) => true,
            (ValueType::Optional(inner), value) => inner.admits(value),
            (ValueType::Text, Value::Text(_)) => true,
            (ValueType::List(element), Value::List(values)) => {
                values.iter().all(|value| element.admits(value))
            }
            (ValueType::Object(object), Value::Double(double)) => {
                double.type_name() == object.name
            }
            _ => false,
        }
    }
}

impl PartialEq for ValueType {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (ValueType::List(a), ValueType::List(b)) => a == b,
            (ValueType::Optional(a), ValueType::Optional(b)) => a == b,
            (ValueType::Object(a), ValueType::Object(b)) => a.name == b.name,
            _ => std::mem::discriminant(self) == std::mem::discriminant(other),
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueType::Any => f.write_str("any"),
            ValueType::Unit => f.write_str("()"),
            ValueType::Bool => f.write_str("bool"),
            ValueType::Int => f.write_str("int"),
            ValueType::Float => f.write_str("float"),
            ValueType::Text => f.write_str("text"),
            ValueType::List(element) => write!(f, "[{element}]"),
            ValueType::Object(object) => f.write_str(object.name),
            ValueType::Optional(inner) => write!(f, "{inner}?"),
        }
    }
}

/// Conversion of a native argument or result into a [Value].
pub trait IntoValue {
    fn into_value(self) -> Value;
}

/// Conversion of a [Value] back into a native type.
pub trait FromValue: Sized {
    /// The type a member declares when it returns `Self`.
    fn declared() -> ValueType;

    fn from_value(value: Value) -> Result<Self, Failure>;
}

impl IntoValue for Value {
    fn into_value(self) -> Value {
        self
    }
}

impl FromValue for Value {
    fn declared() -> ValueType {
        ValueType::Any
    }

    fn from_value(value: Value) -> Result<Self, Failure> {
        Ok(value)
    }
}

impl IntoValue for () {
    fn into_value(self) -> Value {
        Value::Unit
    }
}

impl FromValue for () {
    fn declared() -> ValueType {
        ValueType::Unit
    }

    fn from_value(value: Value) -> Result<Self, Failure> {
        match value {
            Value::Unit | Value::Null => Ok(()),
            other => Err(Failure::type_mismatch(ValueType::Unit, &other)),
        }
    }
}

impl IntoValue for bool {
    fn into_value(self) -> Value {
        Value::Bool(self)
    }
}

impl FromValue for bool {
    fn declared() -> ValueType {
        ValueType::Bool
    }

    fn from_value(value: Value) -> Result<Self, Failure> {
        match value {
            Value::Bool(value) => Ok(value),
            other => Err(Failure::type_mismatch(ValueType::Bool, &other)),
        }
    }
}

macro_rules! integer_values {
    ($($ty:ty),*) => {
        $(
            impl IntoValue for $ty {
                #[allow(clippy::cast_sign_loss)]
                fn into_value(self) -> Value {
                    match i64::try_from(self) {
                        Ok(int) => Value::Int(int),
                        // only unsigned values above i64::MAX end up here
                        Err(_) => Value::UInt(self as u64),
                    }
                }
            }

            impl FromValue for $ty {
                fn declared() -> ValueType {
                    ValueType::Int
                }

                fn from_value(value: Value) -> Result<Self, Failure> {
                    match value {
                        Value::Int(int) => <$ty>::try_from(int)
                            .map_err(|_| Failure::type_mismatch(stringify!($ty), &Value::Int(int))),
                        Value::UInt(uint) => <$ty>::try_from(uint)
                            .map_err(|_| Failure::type_mismatch(stringify!($ty), &Value::UInt(uint))),
                        other => Err(Failure::type_mismatch(stringify!($ty), &other)),
                    }
                }
            }

            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    value.into_value()
                }
            }
        )*
    };
}

integer_values!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

macro_rules! float_values {
    ($($ty:ty),*) => {
        $(
            impl IntoValue for $ty {
                fn into_value(self) -> Value {
                    Value::Float(f64::from(self))
                }
            }

            impl FromValue for $ty {
                fn declared() -> ValueType {
                    ValueType::Float
                }

                #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
                fn from_value(value: Value) -> Result<Self, Failure> {
                    match value {
                        Value::Float(float) => Ok(float as $ty),
                        Value::Int(int) => Ok(int as $ty),
                        Value::UInt(uint) => Ok(uint as $ty),
                        other => Err(Failure::type_mismatch(stringify!($ty), &other)),
                    }
                }
            }

            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    value.into_value()
                }
            }
        )*
    };
}

float_values!(f32, f64);

impl IntoValue for String {
    fn into_value(self) -> Value {
        Value::Text(self)
    }
}

impl IntoValue for &str {
    fn into_value(self) -> Value {
        Value::Text(self.to_owned())
    }
}

impl FromValue for String {
    fn declared() -> ValueType {
        ValueType::Text
    }

    fn from_value(value: Value) -> Result<Self, Failure> {
        match value {
            Value::Text(text) => Ok(text),
            other => Err(Failure::type_mismatch(ValueType::Text, &other)),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_owned())
    }
}

impl From<Double> for Value {
    fn from(double: Double) -> Self {
        Value::Double(double)
    }
}

impl<T: IntoValue> IntoValue for Vec<T> {
    fn into_value(self) -> Value {
        Value::List(self.into_iter().map(IntoValue::into_value).collect())
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    fn declared() -> ValueType {
        ValueType::list(T::declared())
    }

    fn from_value(value: Value) -> Result<Self, Failure> {
        match value {
            Value::List(values) => values.into_iter().map(T::from_value).collect(),
            other => Err(Failure::type_mismatch(Self::declared(), &other)),
        }
    }
}

impl<T: IntoValue> IntoValue for Option<T> {
    fn into_value(self) -> Value {
        match self {
            Some(value) => value.into_value(),
            None => Value::Null,
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn declared() -> ValueType {
        ValueType::optional(T::declared())
    }

    fn from_value(value: Value) -> Result<Self, Failure> {
        match value {
            Value::Null => Ok(None),
            value => T::from_value(value).map(Some),
        }
    }
}

impl IntoValue for Double {
    fn into_value(self) -> Value {
        Value::Double(self)
    }
}

impl FromValue for Double {
    fn declared() -> ValueType {
        ValueType::Any
    }

    fn from_value(value: Value) -> Result<Self, Failure> {
        match value {
            Value::Double(double) => Ok(double),
            other => Err(Failure::type_mismatch("double", &other)),
        }
    }
}
