//! Values bound into queries and stored in entity rows.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Error::CannotConvert, Result};

/// Enumeration of the types a [`Value`] may take.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum ValueType {
    /// Boolean.
    Bool,
    /// 4 bytes.
    Int,
    /// 8 bytes.
    BigInt,
    /// 8 byte float.
    Real,
    /// String.
    Text,
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use ValueType::*;
        match &self {
            Bool => "bool",
            Int => "int",
            BigInt => "big int",
            Real => "float",
            Text => "string",
        }
        .fmt(f)
    }
}

/// A property value: stored in an entity row or bound to a query
/// placeholder.
///
/// For conversion between `Value` and other types, see [`ToValue`] and
/// [`FromValue`].
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// Absent value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// 4 byte integer value.
    Int(i32),
    /// 8 byte integer value.
    BigInt(i64),
    /// 8 byte float value.
    Real(f64),
    /// String value.
    Text(String),
}

impl Value {
    /// Tests whether this value is `Null`.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// The contained boolean.
    pub fn bool(&self) -> Result<bool> {
        match self {
            Value::Bool(val) => Ok(*val),
            _ => Err(CannotConvert(ValueType::Bool, self.clone())),
        }
    }

    /// The contained 4 byte integer.
    pub fn integer(&self) -> Result<i32> {
        match self {
            Value::Int(val) => Ok(*val),
            _ => Err(CannotConvert(ValueType::Int, self.clone())),
        }
    }

    /// The contained integer, widening `Int` to 8 bytes.
    pub fn bigint(&self) -> Result<i64> {
        match self {
            Value::Int(val) => Ok(*val as i64),
            Value::BigInt(val) => Ok(*val),
            _ => Err(CannotConvert(ValueType::BigInt, self.clone())),
        }
    }

    /// The contained float.
    pub fn real(&self) -> Result<f64> {
        match self {
            Value::Real(val) => Ok(*val),
            _ => Err(CannotConvert(ValueType::Real, self.clone())),
        }
    }

    /// The contained string, borrowed.
    pub fn text(&self) -> Result<&str> {
        match self {
            Value::Text(val) => Ok(val),
            _ => Err(CannotConvert(ValueType::Text, self.clone())),
        }
    }

    /// The contained string, owned.
    pub fn owned_text(self) -> Result<String> {
        match self {
            Value::Text(val) => Ok(val),
            _ => Err(CannotConvert(ValueType::Text, self)),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use Value::*;
        match &self {
            Value::Null => f.write_str("NULL"),
            Bool(val) => val.fmt(f),
            Int(val) => val.fmt(f),
            BigInt(val) => val.fmt(f),
            Real(val) => val.fmt(f),
            Text(val) => val.fmt(f),
        }
    }
}

/// Used to convert another type to a [`Value`]. The value is not consumed.
pub trait ToValue {
    /// Render as a [`Value`].
    fn to_value(&self) -> Value;
}

/// Used to convert a [`Value`] into another type.
pub trait FromValue: Sized {
    /// Construct from a [`Value`], failing with
    /// [`Error::CannotConvert`][crate::Error::CannotConvert] on a type
    /// mismatch.
    fn from_value(val: Value) -> Result<Self>;
}

impl ToValue for Value {
    fn to_value(&self) -> Value {
        self.clone()
    }
}

impl FromValue for Value {
    fn from_value(val: Value) -> Result<Self> {
        Ok(val)
    }
}

impl<T> ToValue for Option<T>
where
    T: ToValue,
{
    fn to_value(&self) -> Value {
        match self {
            Some(val) => val.to_value(),
            None => Value::Null,
        }
    }
}

impl<T> FromValue for Option<T>
where
    T: FromValue,
{
    fn from_value(val: Value) -> Result<Self> {
        match val {
            Value::Null => Ok(None),
            _ => Ok(Some(T::from_value(val)?)),
        }
    }
}

macro_rules! impl_value_conversions {
    ($prim:ty, $variant:ident, $accessor:ident) => {
        impl ToValue for $prim {
            fn to_value(&self) -> Value {
                Value::$variant(self.clone().into())
            }
        }
        impl FromValue for $prim {
            fn from_value(val: Value) -> Result<Self> {
                Ok(val.$accessor()?.into())
            }
        }
    };
}

impl_value_conversions!(bool, Bool, bool);
impl_value_conversions!(i32, Int, integer);
impl_value_conversions!(i64, BigInt, bigint);
impl_value_conversions!(f64, Real, real);
impl_value_conversions!(String, Text, owned_text);

impl ToValue for &str {
    fn to_value(&self) -> Value {
        Value::Text((*self).to_string())
    }
}
