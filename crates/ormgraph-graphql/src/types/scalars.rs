//! Custom scalar implementations.
//!
//! Bounded integer scalars accept integers, floats (truncated) and numeric
//! strings, and reject anything outside the range of their column width.
//! Each scalar has a static [`ScalarType`] implementation used for parsing
//! and a dynamic registration whose validator delegates to it.

use async_graphql::dynamic::{self, SchemaBuilder};
use async_graphql::{InputValueError, InputValueResult, Scalar, ScalarType, Value};
use ormgraph_model::IntWidth;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime};

use super::{DATE_TIME, JSON_STRING};

/// Coerces a GraphQL value into an integer within the range of `width`.
///
/// Integers are taken as is, floats are truncated and strings are parsed as
/// integers or floats.
///
/// # Errors
///
/// Returns a message when the value is not numeric or out of range.
pub fn coerce_int(value: &Value, width: IntWidth, unsigned: bool) -> Result<i64, String> {
    let num = match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.trunc() as i64))
            .ok_or_else(|| format!("{n} is not an integer"))?,
        Value::String(s) => {
            let s = s.trim();
            match s.parse::<i64>() {
                Ok(num) => num,
                Err(_) => s
                    .parse::<f64>()
                    .ok()
                    .filter(|f| f.is_finite())
                    .map(|f| f.trunc() as i64)
                    .ok_or_else(|| format!("'{s}' is not a number"))?,
            }
        }
        other => return Err(format!("expected a number, got {other}")),
    };

    let (min, max) = width.range(unsigned);
    if (min..=max).contains(&num) {
        Ok(num)
    } else {
        Err(format!("{num} is outside the range {min}..={max}"))
    }
}

macro_rules! bounded_int_scalar {
    ($ty:ident, $name:tt, $width:expr, $unsigned:literal, $doc:literal) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub struct $ty(pub i64);

        #[Scalar(name = $name)]
        impl ScalarType for $ty {
            fn parse(value: Value) -> InputValueResult<Self> {
                coerce_int(&value, $width, $unsigned)
                    .map($ty)
                    .map_err(|msg| InputValueError::custom(format!("Invalid {}: {msg}", $name)))
            }

            fn to_value(&self) -> Value {
                Value::Number(self.0.into())
            }
        }
    };
}

bounded_int_scalar!(
    SignedInt8,
    "SignedInt8",
    IntWidth::Int8,
    false,
    "Whole numbers between -(2^7) and 2^7 - 1."
);
bounded_int_scalar!(
    SignedInt16,
    "SignedInt16",
    IntWidth::Int16,
    false,
    "Whole numbers between -(2^15) and 2^15 - 1."
);
bounded_int_scalar!(
    SignedInt24,
    "SignedInt24",
    IntWidth::Int24,
    false,
    "Whole numbers between -(2^23) and 2^23 - 1."
);
bounded_int_scalar!(
    SignedInt32,
    "SignedInt32",
    IntWidth::Int32,
    false,
    "Whole numbers between -(2^31) and 2^31 - 1."
);
bounded_int_scalar!(
    UnsignedInt8,
    "UnsignedInt8",
    IntWidth::Int8,
    true,
    "Whole numbers between 0 and 2^8 - 1."
);
bounded_int_scalar!(
    UnsignedInt16,
    "UnsignedInt16",
    IntWidth::Int16,
    true,
    "Whole numbers between 0 and 2^16 - 1."
);
bounded_int_scalar!(
    UnsignedInt24,
    "UnsignedInt24",
    IntWidth::Int24,
    true,
    "Whole numbers between 0 and 2^24 - 1."
);
bounded_int_scalar!(
    UnsignedInt32,
    "UnsignedInt32",
    IntWidth::Int32,
    true,
    "Whole numbers between 0 and 2^32 - 1."
);

/// An ISO-8601 date-time.
///
/// Accepts RFC 3339 timestamps (`2024-01-15T10:30:00Z`) and naive
/// timestamps without offset (`2024-01-15T10:30:00`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateTime(pub String);

impl DateTime {
    fn is_valid(s: &str) -> bool {
        OffsetDateTime::parse(s, &Rfc3339).is_ok()
            || PrimitiveDateTime::parse(
                s,
                format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
            )
            .is_ok()
            || PrimitiveDateTime::parse(
                s,
                format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond]"),
            )
            .is_ok()
    }
}

#[Scalar(name = "DateTime")]
impl ScalarType for DateTime {
    fn parse(value: Value) -> InputValueResult<Self> {
        match value {
            Value::String(s) => {
                if Self::is_valid(&s) {
                    Ok(DateTime(s))
                } else {
                    Err(InputValueError::custom(format!(
                        "Invalid DateTime: '{s}'. Expected YYYY-MM-DDThh:mm:ss with optional offset"
                    )))
                }
            }
            _ => Err(InputValueError::expected_type(value)),
        }
    }

    fn to_value(&self) -> Value {
        Value::String(self.0.clone())
    }
}

/// A JSON document serialized to a string.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonString(pub serde_json::Value);

#[Scalar(name = "JSONString")]
impl ScalarType for JsonString {
    fn parse(value: Value) -> InputValueResult<Self> {
        match value {
            Value::String(s) => serde_json::from_str(&s)
                .map(JsonString)
                .map_err(|e| InputValueError::custom(format!("Invalid JSONString: {e}"))),
            _ => Err(InputValueError::expected_type(value)),
        }
    }

    fn to_value(&self) -> Value {
        Value::String(self.0.to_string())
    }
}

/// Registers the custom scalars with a dynamic schema.
pub fn register_scalars(builder: SchemaBuilder) -> SchemaBuilder {
    fn scalar<T: ScalarType + 'static>(name: &str, description: &str) -> dynamic::Scalar {
        dynamic::Scalar::new(name)
            .description(description)
            .validator(|value| T::parse(value.clone()).is_ok())
    }

    let scalars = [
        scalar::<SignedInt8>("SignedInt8", "Whole numbers between -(2^7) and 2^7 - 1"),
        scalar::<SignedInt16>("SignedInt16", "Whole numbers between -(2^15) and 2^15 - 1"),
        scalar::<SignedInt24>("SignedInt24", "Whole numbers between -(2^23) and 2^23 - 1"),
        scalar::<SignedInt32>("SignedInt32", "Whole numbers between -(2^31) and 2^31 - 1"),
        scalar::<UnsignedInt8>("UnsignedInt8", "Whole numbers between 0 and 2^8 - 1"),
        scalar::<UnsignedInt16>("UnsignedInt16", "Whole numbers between 0 and 2^16 - 1"),
        scalar::<UnsignedInt24>("UnsignedInt24", "Whole numbers between 0 and 2^24 - 1"),
        scalar::<UnsignedInt32>("UnsignedInt32", "Whole numbers between 0 and 2^32 - 1"),
        scalar::<DateTime>(DATE_TIME, "An ISO-8601 date-time"),
        scalar::<JsonString>(JSON_STRING, "A JSON document serialized to a string"),
    ];

    scalars
        .into_iter()
        .fold(builder, |builder, scalar| builder.register(scalar))
}
