//! Dynamic values flowing through the serialization registry.

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use indexmap::IndexMap;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::error::FieldError;
use crate::serial::registry::Entity;

/// A dynamically typed value: either a native JSON shape, a scalar that
/// needs a tagged wrapper (bytes, decimals, dates and times), or a
/// registered entity.
pub enum Item {
    Null,
    Bool(bool),
    Int(i64),
    /// A JSON integer above `i64::MAX`.
    Uint(u64),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
    Decimal(Decimal),
    Date(NaiveDate),
    Time(NaiveTime),
    DateTime(NaiveDateTime),
    List(Vec<Item>),
    Map(IndexMap<String, Item>),
    Entity(Box<dyn Entity>),
}

impl Item {
    /// Returns a short name for the kind of item, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Item::Null => "null",
            Item::Bool(_) => "bool",
            Item::Int(_) => "int",
            Item::Uint(_) => "uint",
            Item::Float(_) => "float",
            Item::Str(_) => "string",
            Item::Bytes(_) => "bytes",
            Item::Decimal(_) => "decimal",
            Item::Date(_) => "date",
            Item::Time(_) => "time",
            Item::DateTime(_) => "datetime",
            Item::List(_) => "list",
            Item::Map(_) => "mapping",
            Item::Entity(_) => "entity",
        }
    }

    pub fn entity(value: impl Entity + 'static) -> Item {
        Item::Entity(Box::new(value))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Item::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_entity(&self) -> Option<&dyn Entity> {
        match self {
            Item::Entity(e) => Some(e.as_ref()),
            _ => None,
        }
    }

    // Typed extraction used by field setters.

    pub fn into_string(self) -> Result<String, FieldError> {
        match self {
            Item::Str(s) => Ok(s),
            other => Err(other.wrong_kind("string")),
        }
    }

    pub fn into_bool(self) -> Result<bool, FieldError> {
        match self {
            Item::Bool(b) => Ok(b),
            other => Err(other.wrong_kind("bool")),
        }
    }

    pub fn into_u64(self) -> Result<u64, FieldError> {
        match self {
            Item::Int(v) => u64::try_from(v).map_err(|_| FieldError::Invalid {
                reason: format!("{} is negative", v),
            }),
            Item::Uint(v) => Ok(v),
            other => Err(other.wrong_kind("int")),
        }
    }

    /// Extracts an unsigned integer that may arrive as a decimal string or
    /// a tagged decimal when it exceeds the JSON integer range.
    pub fn into_u128(self) -> Result<u128, FieldError> {
        match self {
            Item::Int(v) => u128::try_from(v).map_err(|_| FieldError::Invalid {
                reason: format!("{} is negative", v),
            }),
            Item::Uint(v) => Ok(u128::from(v)),
            Item::Str(s) => s.parse::<u128>().map_err(|e| FieldError::Invalid {
                reason: format!("{:?} is not an unsigned integer: {}", s, e),
            }),
            Item::Decimal(d) if d.fract().is_zero() => d.to_u128().ok_or_else(|| FieldError::Invalid {
                reason: format!("{} is not an unsigned integer", d),
            }),
            other => Err(other.wrong_kind("int")),
        }
    }

    /// Extracts an entity of a concrete type.
    pub fn into_entity<T: Entity + 'static>(self) -> Result<T, FieldError> {
        match self {
            Item::Entity(e) => {
                let found = e.type_tag();
                e.into_any().downcast::<T>().map(|b| *b).map_err(|_| FieldError::Invalid {
                    reason: format!("unexpected entity type {:?}", found),
                })
            }
            other => Err(other.wrong_kind("entity")),
        }
    }

    fn wrong_kind(&self, expected: &'static str) -> FieldError {
        FieldError::WrongKind { expected, found: self.kind_name() }
    }
}

impl Clone for Item {
    fn clone(&self) -> Self {
        match self {
            Item::Null => Item::Null,
            Item::Bool(b) => Item::Bool(*b),
            Item::Int(v) => Item::Int(*v),
            Item::Uint(v) => Item::Uint(*v),
            Item::Float(v) => Item::Float(*v),
            Item::Str(s) => Item::Str(s.clone()),
            Item::Bytes(b) => Item::Bytes(b.clone()),
            Item::Decimal(d) => Item::Decimal(*d),
            Item::Date(d) => Item::Date(*d),
            Item::Time(t) => Item::Time(*t),
            Item::DateTime(dt) => Item::DateTime(*dt),
            Item::List(items) => Item::List(items.clone()),
            Item::Map(map) => Item::Map(map.clone()),
            Item::Entity(e) => Item::Entity(e.clone_entity()),
        }
    }
}

impl fmt::Debug for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Item::Null => f.write_str("Null"),
            Item::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            Item::Int(v) => f.debug_tuple("Int").field(v).finish(),
            Item::Uint(v) => f.debug_tuple("Uint").field(v).finish(),
            Item::Float(v) => f.debug_tuple("Float").field(v).finish(),
            Item::Str(s) => f.debug_tuple("Str").field(s).finish(),
            Item::Bytes(b) => f.debug_tuple("Bytes").field(b).finish(),
            Item::Decimal(d) => f.debug_tuple("Decimal").field(d).finish(),
            Item::Date(d) => f.debug_tuple("Date").field(d).finish(),
            Item::Time(t) => f.debug_tuple("Time").field(t).finish(),
            Item::DateTime(dt) => f.debug_tuple("DateTime").field(dt).finish(),
            Item::List(items) => f.debug_tuple("List").field(items).finish(),
            Item::Map(map) => f.debug_tuple("Map").field(map).finish(),
            Item::Entity(e) => f.debug_tuple("Entity").field(e).finish(),
        }
    }
}

/// Entities compare equal when their tags and declared field values match.
impl PartialEq for Item {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Item::Null, Item::Null) => true,
            (Item::Bool(a), Item::Bool(b)) => a == b,
            (Item::Int(a), Item::Int(b)) => a == b,
            (Item::Uint(a), Item::Uint(b)) => a == b,
            (Item::Float(a), Item::Float(b)) => a == b,
            (Item::Str(a), Item::Str(b)) => a == b,
            (Item::Bytes(a), Item::Bytes(b)) => a == b,
            (Item::Decimal(a), Item::Decimal(b)) => a == b && a.scale() == b.scale(),
            (Item::Date(a), Item::Date(b)) => a == b,
            (Item::Time(a), Item::Time(b)) => a == b,
            (Item::DateTime(a), Item::DateTime(b)) => a == b,
            (Item::List(a), Item::List(b)) => a == b,
            (Item::Map(a), Item::Map(b)) => a == b,
            (Item::Entity(a), Item::Entity(b)) => {
                a.type_tag() == b.type_tag() && a.get_state() == b.get_state()
            }
            _ => false,
        }
    }
}

impl From<bool> for Item {
    fn from(v: bool) -> Self {
        Item::Bool(v)
    }
}

impl From<i64> for Item {
    fn from(v: i64) -> Self {
        Item::Int(v)
    }
}

impl From<f64> for Item {
    fn from(v: f64) -> Self {
        Item::Float(v)
    }
}

impl From<&str> for Item {
    fn from(v: &str) -> Self {
        Item::Str(v.to_string())
    }
}

impl From<String> for Item {
    fn from(v: String) -> Self {
        Item::Str(v)
    }
}

impl From<Vec<u8>> for Item {
    fn from(v: Vec<u8>) -> Self {
        Item::Bytes(v)
    }
}

impl From<Decimal> for Item {
    fn from(v: Decimal) -> Self {
        Item::Decimal(v)
    }
}

impl From<u64> for Item {
    fn from(v: u64) -> Self {
        match i64::try_from(v) {
            Ok(v) => Item::Int(v),
            Err(_) => Item::Uint(v),
        }
    }
}

impl From<u128> for Item {
    /// Integers beyond the unsigned 64-bit range become decimal strings.
    fn from(v: u128) -> Self {
        match u64::try_from(v) {
            Ok(v) => Item::from(v),
            Err(_) => Item::Str(v.to_string()),
        }
    }
}
