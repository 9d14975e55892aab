use crate::{Error, Result, Value};
use rust_decimal::{Decimal, prelude::FromPrimitive};
use std::any;
use time::{Date, OffsetDateTime, PrimitiveDateTime, Time};
use uuid::Uuid;

/// Conversion between native Rust types and the dynamically typed [`Value`].
///
/// Record fields must implement it: extraction uses [`AsValue::as_value`] to build statement
/// arguments and materialization uses [`AsValue::try_from_value`] to decode cells.
///
/// # Conversion contract
/// - The canonical variant for the type is always accepted.
/// - Integer types also accept the other integer widths, range checked.
/// - NULL is accepted only by `Option<T>`.
///
/// ```rust
/// use sluice_core::{AsValue, Value};
/// let v = 42i32.as_value();
/// assert_eq!(v, Value::Int32(Some(42)));
/// let n: i64 = AsValue::try_from_value(v).unwrap();
/// assert_eq!(n, 42);
/// ```
pub trait AsValue {
    /// The typed NULL of this type.
    fn as_empty_value() -> Value;
    fn as_value(self) -> Value;
    fn try_from_value(value: Value) -> Result<Self>
    where
        Self: Sized;
}

impl<T: AsValue> From<T> for Value {
    fn from(value: T) -> Self {
        value.as_value()
    }
}

impl<'a> From<&'a str> for Value {
    fn from(value: &'a str) -> Self {
        Value::Varchar(Some(value.into()))
    }
}

fn mismatch<T>(value: &Value) -> Error {
    if value.is_null() {
        return Error::msg(format!(
            "Cannot decode NULL into non nullable {}",
            any::type_name::<T>()
        ));
    }
    Error::msg(format!(
        "Cannot decode {} {:?} into {}",
        value.kind_name(),
        value,
        any::type_name::<T>()
    ))
}

macro_rules! impl_as_value {
    ($source:ty, $variant:path $(, $accepted:path)* $(,)?) => {
        impl AsValue for $source {
            fn as_empty_value() -> Value {
                $variant(None)
            }
            fn as_value(self) -> Value {
                $variant(Some(self))
            }
            fn try_from_value(value: Value) -> Result<Self> {
                match value {
                    $variant(Some(v)) => Ok(v),
                    $($accepted(Some(v)) => <$source>::try_from(v).map_err(|_| {
                        Error::msg(format!(
                            "Value {} is out of range for {}",
                            v,
                            any::type_name::<Self>()
                        ))
                    }),)*
                    v => Err(mismatch::<Self>(&v)),
                }
            }
        }
    };
}

impl_as_value!(i8, Value::Int8, Value::Int16, Value::Int32, Value::Int64, Value::UInt8, Value::UInt16, Value::UInt32, Value::UInt64);
impl_as_value!(i16, Value::Int16, Value::Int8, Value::Int32, Value::Int64, Value::UInt8, Value::UInt16, Value::UInt32, Value::UInt64);
impl_as_value!(i32, Value::Int32, Value::Int8, Value::Int16, Value::Int64, Value::UInt8, Value::UInt16, Value::UInt32, Value::UInt64);
impl_as_value!(i64, Value::Int64, Value::Int8, Value::Int16, Value::Int32, Value::UInt8, Value::UInt16, Value::UInt32, Value::UInt64);
impl_as_value!(u8, Value::UInt8, Value::Int8, Value::Int16, Value::Int32, Value::Int64, Value::UInt16, Value::UInt32, Value::UInt64);
impl_as_value!(u16, Value::UInt16, Value::Int8, Value::Int16, Value::Int32, Value::Int64, Value::UInt8, Value::UInt32, Value::UInt64);
impl_as_value!(u32, Value::UInt32, Value::Int8, Value::Int16, Value::Int32, Value::Int64, Value::UInt8, Value::UInt16, Value::UInt64);
impl_as_value!(u64, Value::UInt64, Value::Int8, Value::Int16, Value::Int32, Value::Int64, Value::UInt8, Value::UInt16, Value::UInt32);
impl_as_value!(String, Value::Varchar);
impl_as_value!(Date, Value::Date);
impl_as_value!(Time, Value::Time);
impl_as_value!(PrimitiveDateTime, Value::Timestamp);
impl_as_value!(OffsetDateTime, Value::TimestampWithTimezone);

impl AsValue for bool {
    fn as_empty_value() -> Value {
        Value::Boolean(None)
    }
    fn as_value(self) -> Value {
        Value::Boolean(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Boolean(Some(v)) => Ok(v),
            Value::Int8(Some(v)) => Ok(v != 0),
            Value::Int32(Some(v)) => Ok(v != 0),
            Value::Int64(Some(v)) => Ok(v != 0),
            v => Err(mismatch::<Self>(&v)),
        }
    }
}

impl AsValue for f32 {
    fn as_empty_value() -> Value {
        Value::Float32(None)
    }
    fn as_value(self) -> Value {
        Value::Float32(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Float32(Some(v)) => Ok(v),
            Value::Float64(Some(v)) if v.is_nan() || (v as f32) as f64 == v => Ok(v as f32),
            v => Err(mismatch::<Self>(&v)),
        }
    }
}

impl AsValue for f64 {
    fn as_empty_value() -> Value {
        Value::Float64(None)
    }
    fn as_value(self) -> Value {
        Value::Float64(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Float64(Some(v)) => Ok(v),
            Value::Float32(Some(v)) => Ok(v.into()),
            Value::Int32(Some(v)) => Ok(v.into()),
            Value::Decimal(Some(v)) => {
                f64::try_from(v).map_err(|e| Error::new(e).context("Cannot convert decimal"))
            }
            v => Err(mismatch::<Self>(&v)),
        }
    }
}

impl AsValue for Decimal {
    fn as_empty_value() -> Value {
        Value::Decimal(None)
    }
    fn as_value(self) -> Value {
        Value::Decimal(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Decimal(Some(v)) => Ok(v),
            Value::Int64(Some(v)) => Ok(v.into()),
            Value::Int32(Some(v)) => Ok(v.into()),
            Value::Float64(Some(v)) => Decimal::from_f64(v)
                .ok_or_else(|| Error::msg(format!("Value {v} cannot be represented as a decimal"))),
            Value::Varchar(Some(v)) => Decimal::from_str_exact(&v)
                .map_err(|e| Error::new(e).context(format!("Cannot parse `{v}` as a decimal"))),
            v => Err(mismatch::<Self>(&v)),
        }
    }
}

impl AsValue for Box<[u8]> {
    fn as_empty_value() -> Value {
        Value::Blob(None)
    }
    fn as_value(self) -> Value {
        Value::Blob(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Blob(Some(v)) => Ok(v),
            v => Err(mismatch::<Self>(&v)),
        }
    }
}

impl AsValue for Vec<u8> {
    fn as_empty_value() -> Value {
        Value::Blob(None)
    }
    fn as_value(self) -> Value {
        Value::Blob(Some(self.into_boxed_slice()))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        <Box<[u8]>>::try_from_value(value).map(Into::into)
    }
}

impl AsValue for Uuid {
    fn as_empty_value() -> Value {
        Value::Uuid(None)
    }
    fn as_value(self) -> Value {
        Value::Uuid(Some(self))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Uuid(Some(v)) => Ok(v),
            Value::Varchar(Some(v)) => Uuid::parse_str(&v)
                .map_err(|e| Error::new(e).context(format!("Cannot parse `{v}` as a uuid"))),
            Value::Blob(Some(v)) => Uuid::from_slice(&v).map_err(Error::new),
            v => Err(mismatch::<Self>(&v)),
        }
    }
}

impl<T: AsValue> AsValue for Option<T> {
    fn as_empty_value() -> Value {
        T::as_empty_value()
    }
    fn as_value(self) -> Value {
        match self {
            Some(v) => v.as_value(),
            None => T::as_empty_value(),
        }
    }
    fn try_from_value(value: Value) -> Result<Self> {
        if value.is_null() {
            return Ok(None);
        }
        T::try_from_value(value).map(Some)
    }
}
