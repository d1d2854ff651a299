//! SQL column types.
//!
//! `SqlType` is the closed set of database types the generator knows about.
//! Dialect-specific spellings (MySQL `TINYINT`, PostgreSQL `JSONB`, ...) are
//! separate variants so that conversion rules can target them individually.
//! User-defined types are expressed as [`SqlType::Custom`] with an optional
//! `base`, which forms the declared hierarchy walked when no rule targets the
//! custom type directly.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// A database column type.
///
/// Serialized in snake case; unit variants are plain strings
/// (`type = "integer"`), the others are single-key tables
/// (`type = { array = "text" }`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SqlType {
    // Booleans
    Boolean,
    /// MySQL `BIT`.
    Bit,

    // Floating point
    Float,
    Numeric,

    // Integers
    /// MySQL `TINYINT` (8 bit).
    TinyInt,
    /// `SMALLINT` (16 bit).
    SmallInt,
    /// MySQL `MEDIUMINT` (24 bit).
    MediumInt,
    /// `INTEGER` (32 bit).
    Integer,
    /// `BIGINT`. Exposed as a string since it does not fit a GraphQL `Int`.
    BigInteger,

    // Strings
    Time,
    String,
    Text,
    Unicode,
    UnicodeText,
    /// PostgreSQL `UUID`.
    Uuid,
    /// PostgreSQL `INET`.
    Inet,
    /// PostgreSQL `CIDR`.
    Cidr,
    /// PostgreSQL `TSVECTOR`.
    TsVector,

    DateTime,

    /// A database enum. `name` is the database-level type name, if any.
    Enum {
        #[serde(default)]
        name: Option<String>,
        variants: Vec<String>,
    },

    /// A choice column storing one of a fixed set of `(value, label)` pairs.
    Choice { choices: Vec<(String, String)> },

    /// A delimited list of strings stored in one column.
    ScalarList,

    /// PostgreSQL `ARRAY` of the item type.
    Array(Box<SqlType>),

    // JSON
    Json,
    /// PostgreSQL `JSONB`.
    Jsonb,
    /// PostgreSQL `HSTORE`.
    Hstore,

    // Types without a built-in conversion
    Date,
    LargeBinary,
    Interval,

    /// A user-defined type, optionally decorating a base type.
    Custom {
        name: String,
        #[serde(default)]
        base: Option<Box<SqlType>>,
    },
}

/// Groups of SQL types that share a conversion rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeClass {
    BoolLike,
    FloatLike,
    Int8Like,
    Int16Like,
    Int24Like,
    Int32Like,
    StringLike,
    JsonLike,
}

/// Width of a bounded integer column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntWidth {
    Int8,
    Int16,
    Int24,
    Int32,
}

impl IntWidth {
    /// Number of bits.
    #[must_use]
    pub fn bits(self) -> u32 {
        match self {
            Self::Int8 => 8,
            Self::Int16 => 16,
            Self::Int24 => 24,
            Self::Int32 => 32,
        }
    }

    /// Inclusive value range for the signed or unsigned variant.
    #[must_use]
    pub fn range(self, unsigned: bool) -> (i64, i64) {
        let bits = self.bits();
        if unsigned {
            (0, (1_i64 << bits) - 1)
        } else {
            (-(1_i64 << (bits - 1)), (1_i64 << (bits - 1)) - 1)
        }
    }
}

impl SqlType {
    /// Built-in type keys belonging to each type class.
    pub const BOOL_LIKE: &'static [&'static str] = &["boolean", "bit"];
    pub const FLOAT_LIKE: &'static [&'static str] = &["float", "numeric"];
    pub const INT_LIKE: &'static [&'static str] =
        &["tiny_int", "small_int", "medium_int", "integer"];
    pub const STRING_LIKE: &'static [&'static str] = &[
        "big_integer",
        "time",
        "string",
        "text",
        "unicode",
        "unicode_text",
        "uuid",
        "inet",
        "cidr",
        "ts_vector",
    ];
    pub const JSON_LIKE: &'static [&'static str] = &["json", "jsonb", "hstore"];

    /// Returns the key conversion rules are registered under.
    ///
    /// Built-in variants use their snake case name; custom types use their
    /// declared name.
    #[must_use]
    pub fn key(&self) -> Cow<'_, str> {
        let key = match self {
            Self::Boolean => "boolean",
            Self::Bit => "bit",
            Self::Float => "float",
            Self::Numeric => "numeric",
            Self::TinyInt => "tiny_int",
            Self::SmallInt => "small_int",
            Self::MediumInt => "medium_int",
            Self::Integer => "integer",
            Self::BigInteger => "big_integer",
            Self::Time => "time",
            Self::String => "string",
            Self::Text => "text",
            Self::Unicode => "unicode",
            Self::UnicodeText => "unicode_text",
            Self::Uuid => "uuid",
            Self::Inet => "inet",
            Self::Cidr => "cidr",
            Self::TsVector => "ts_vector",
            Self::DateTime => "date_time",
            Self::Enum { .. } => "enum",
            Self::Choice { .. } => "choice",
            Self::ScalarList => "scalar_list",
            Self::Array(_) => "array",
            Self::Json => "json",
            Self::Jsonb => "jsonb",
            Self::Hstore => "hstore",
            Self::Date => "date",
            Self::LargeBinary => "large_binary",
            Self::Interval => "interval",
            Self::Custom { name, .. } => return Cow::Borrowed(name.as_str()),
        };
        Cow::Borrowed(key)
    }

    /// Returns this type followed by its declared bases, most derived first.
    #[must_use]
    pub fn ancestry(&self) -> Vec<&SqlType> {
        let mut chain = vec![self];
        let mut current = self;
        while let Self::Custom {
            base: Some(base), ..
        } = current
        {
            chain.push(base);
            current = base;
        }
        chain
    }

    /// Returns the innermost built-in type, following custom bases.
    #[must_use]
    pub fn storage_type(&self) -> &SqlType {
        self.ancestry().last().copied().unwrap_or(self)
    }

    /// Returns the type class of this type, following custom bases.
    #[must_use]
    pub fn class(&self) -> Option<TypeClass> {
        match self.storage_type() {
            Self::Boolean | Self::Bit => Some(TypeClass::BoolLike),
            Self::Float | Self::Numeric => Some(TypeClass::FloatLike),
            Self::TinyInt => Some(TypeClass::Int8Like),
            Self::SmallInt => Some(TypeClass::Int16Like),
            Self::MediumInt => Some(TypeClass::Int24Like),
            Self::Integer => Some(TypeClass::Int32Like),
            Self::BigInteger
            | Self::Time
            | Self::String
            | Self::Text
            | Self::Unicode
            | Self::UnicodeText
            | Self::Uuid
            | Self::Inet
            | Self::Cidr
            | Self::TsVector => Some(TypeClass::StringLike),
            Self::Json | Self::Jsonb | Self::Hstore => Some(TypeClass::JsonLike),
            _ => None,
        }
    }

    /// Returns the integer width for bounded integer types.
    #[must_use]
    pub fn int_width(&self) -> Option<IntWidth> {
        match self.class()? {
            TypeClass::Int8Like => Some(IntWidth::Int8),
            TypeClass::Int16Like => Some(IntWidth::Int16),
            TypeClass::Int24Like => Some(IntWidth::Int24),
            TypeClass::Int32Like => Some(IntWidth::Int32),
            _ => None,
        }
    }

    /// Returns whether values of this type are stored as integers.
    #[must_use]
    pub fn is_integer(&self) -> bool {
        self.int_width().is_some()
    }
}

impl std::fmt::Display for SqlType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Array(item) => write!(f, "array<{item}>"),
            other => f.write_str(&other.key()),
        }
    }
}
