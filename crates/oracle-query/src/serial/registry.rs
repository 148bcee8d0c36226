//! Tag-dispatched registry of serializable entity types.
//!
//! Every serializable type declares its tag and an explicit list of fields
//! with typed accessors. The registry maps tags to constructors so that a
//! state document can be turned back into live values.
//!
//! ```text
//! {"type": "<tag>", "<field>": <state>, ...}
//! ```
//!
//! Scalars with no native JSON shape are wrapped in mappings whose tag
//! carries the reserved `py_` prefix:
//!
//! ```text
//! {"type": "py_bytes", "bytes": "<base64>"}
//! {"type": "py_decimal", "value": "<decimal string>"}
//! {"type": "py_datetime.date", "year": .., "month": .., "day": ..}
//! {"type": "py_datetime.time", "hour": .., "minute": .., "second": .., "microsecond": ..}
//! {"type": "py_datetime.datetime", "year": .., .., "microsecond": ..}
//! ```
//!
//! Owned values cannot form reference cycles, so serialization always
//! terminates.

use std::any::Any;
use std::fmt::Debug;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use indexmap::IndexMap;
use serde_json::{Map, Number, Value};
use tracing::{debug, error, warn};

use crate::error::{FieldError, FieldFailure, RegistryError};
use crate::limits::{RESERVED_TAG_PREFIX, TYPE_KEY};
use crate::serial::item::Item;

const BYTES_TAG: &str = "py_bytes";
const DECIMAL_TAG: &str = "py_decimal";
const DATE_TAG: &str = "py_datetime.date";
const TIME_TAG: &str = "py_datetime.time";
const DATETIME_TAG: &str = "py_datetime.datetime";

/// A declared field of a serializable type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    pub name: &'static str,
    /// A required field must be present in restored state.
    pub required: bool,
}

impl Field {
    pub const fn required(name: &'static str) -> Field {
        Field { name, required: true }
    }

    pub const fn optional(name: &'static str) -> Field {
        Field { name, required: false }
    }
}

/// A type that can be stored in and restored from tagged state.
///
/// `Default` provides the blank instance a restore starts from.
pub trait Serializable: Clone + Default + Debug + Send + Sync + 'static {
    /// The tag written under the `"type"` key.
    const TYPE: &'static str;

    /// Declared fields, in state order.
    const FIELDS: &'static [Field];

    /// Returns the current value of a declared field.
    fn get(&self, field: &str) -> Option<Item>;

    /// Assigns a declared field, validating the value.
    fn set(&mut self, field: &str, value: Item) -> Result<(), FieldError>;
}

/// Object-safe view of a [`Serializable`] value.
pub trait Entity: Debug + Send + Sync {
    fn type_tag(&self) -> &'static str;
    fn fields(&self) -> &'static [Field];
    fn field(&self, name: &str) -> Option<Item>;
    fn set_field(&mut self, name: &str, value: Item) -> Result<(), FieldError>;
    fn clone_entity(&self) -> Box<dyn Entity>;
    fn as_any(&self) -> &dyn Any;
    fn into_any(self: Box<Self>) -> Box<dyn Any>;

    /// Returns the declared fields and their values, in declaration order.
    fn get_state(&self) -> IndexMap<String, Item> {
        self.fields()
            .iter()
            .map(|f| (f.name.to_string(), self.field(f.name).unwrap_or(Item::Null)))
            .collect()
    }
}

impl<T: Serializable> Entity for T {
    fn type_tag(&self) -> &'static str {
        T::TYPE
    }

    fn fields(&self) -> &'static [Field] {
        T::FIELDS
    }

    fn field(&self, name: &str) -> Option<Item> {
        self.get(name)
    }

    fn set_field(&mut self, name: &str, value: Item) -> Result<(), FieldError> {
        self.set(name, value)
    }

    fn clone_entity(&self) -> Box<dyn Entity> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

type Factory = fn() -> Box<dyn Entity>;

fn construct<T: Serializable>() -> Box<dyn Entity> {
    Box::new(T::default())
}

/// Maps type tags to constructors.
///
/// Built once at startup, then shared read-only.
#[derive(Default, Clone)]
pub struct Registry {
    types: IndexMap<String, Factory>,
}

impl Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry").field("tags", &self.types.keys().collect::<Vec<_>>()).finish()
    }
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `T` under its own tag.
    pub fn register<T: Serializable>(&mut self) -> Result<(), RegistryError> {
        self.register_as::<T>(T::TYPE)
    }

    /// Registers `T` under an additional tag. A type may have several tags;
    /// a tag names exactly one type.
    pub fn register_as<T: Serializable>(&mut self, tag: &str) -> Result<(), RegistryError> {
        if tag.starts_with(RESERVED_TAG_PREFIX) || self.types.contains_key(tag) {
            return Err(RegistryError::DuplicateTag { tag: tag.to_string() });
        }
        debug!(tag, type_name = std::any::type_name::<T>(), "registered type");
        self.types.insert(tag.to_string(), construct::<T>);
        Ok(())
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.types.contains_key(tag)
    }

    /// Registered tags, in registration order.
    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }

    /// Constructs a blank instance of the type registered under `tag`.
    pub fn create(&self, tag: &str) -> Result<Box<dyn Entity>, RegistryError> {
        self.types
            .get(tag)
            .map(|factory| factory())
            .ok_or_else(|| RegistryError::UnknownTag { tag: tag.to_string() })
    }

    /// Converts an item into its state document.
    pub fn serialize(&self, item: &Item) -> Result<Value, RegistryError> {
        serialize(item)
    }

    /// Reconstructs an item from a state document.
    ///
    /// Any field that fails to restore, at any depth, fails the whole call.
    pub fn deserialize(&self, value: &Value) -> Result<Item, RegistryError> {
        match value {
            Value::Null => Ok(Item::Null),
            Value::Bool(b) => Ok(Item::Bool(*b)),
            Value::Number(n) => Ok(number_item(n)),
            Value::String(s) => Ok(Item::Str(s.clone())),
            Value::Array(items) => items.iter().map(|v| self.deserialize(v)).collect::<Result<_, _>>().map(Item::List),
            Value::Object(map) => match map.get(TYPE_KEY) {
                Some(Value::String(tag)) if tag.starts_with(RESERVED_TAG_PREFIX) => {
                    match coerce_scalar(tag, map)? {
                        Some(item) => Ok(item),
                        None => {
                            warn!(tag = %tag, "unknown scalar tag, treating as plain mapping");
                            self.deserialize_map(map)
                        }
                    }
                }
                Some(Value::String(tag)) => {
                    let mut entity = self.create(tag)?;
                    self.restore_fields(entity.as_mut(), map)?;
                    Ok(Item::Entity(entity))
                }
                _ => self.deserialize_map(map),
            },
        }
    }

    /// Reconstructs a concrete registered type from a state document.
    pub fn deserialize_as<T: Serializable>(&self, value: &Value) -> Result<T, RegistryError> {
        let item = self.deserialize(value)?;
        match item {
            Item::Entity(e) => {
                let found = e.type_tag();
                e.into_any().downcast::<T>().map(|b| *b).map_err(|_| RegistryError::TypeMismatch {
                    expected: T::TYPE.to_string(),
                    found: found.to_string(),
                })
            }
            other => Err(RegistryError::TypeMismatch {
                expected: T::TYPE.to_string(),
                found: other.kind_name().to_string(),
            }),
        }
    }

    /// Restores an entity's fields from state, best effort.
    ///
    /// Fails immediately if the state names a different type. Otherwise
    /// every declared field is attempted; failures are logged and returned
    /// together as [`RegistryError::Restore`] while the entity keeps every
    /// field that did restore.
    pub fn restore_state(&self, entity: &mut dyn Entity, state: &Value) -> Result<(), RegistryError> {
        let map = state.as_object().ok_or_else(|| RegistryError::NotAMapping {
            context: entity.type_tag().to_string(),
        })?;
        if let Some(found) = map.get(TYPE_KEY) {
            let found = found.as_str().unwrap_or_default();
            if found != entity.type_tag() {
                return Err(RegistryError::TypeMismatch {
                    expected: entity.type_tag().to_string(),
                    found: found.to_string(),
                });
            }
        }
        self.restore_fields(entity, map)
    }

    fn restore_fields(&self, entity: &mut dyn Entity, map: &Map<String, Value>) -> Result<(), RegistryError> {
        let type_tag = entity.type_tag();
        let mut failures = Vec::new();

        for field in entity.fields() {
            let result = match map.get(field.name) {
                Some(value) => self
                    .deserialize(value)
                    .map_err(|e| e.to_string())
                    .and_then(|item| entity.set_field(field.name, item).map_err(|e| e.to_string())),
                None if field.required => Err("missing required field".to_string()),
                None => Ok(()),
            };
            if let Err(reason) = result {
                error!(type_tag, field = field.name, %reason, "failed to restore field");
                failures.push(FieldFailure { field: field.name, reason });
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(RegistryError::Restore { type_tag: type_tag.to_string(), failures })
        }
    }

    fn deserialize_map(&self, map: &Map<String, Value>) -> Result<Item, RegistryError> {
        let mut out = IndexMap::with_capacity(map.len());
        for (key, value) in map {
            out.insert(key.clone(), self.deserialize(value)?);
        }
        Ok(Item::Map(out))
    }
}

// =============================================================================
// SERIALIZE
// =============================================================================

/// Converts an item into its state document.
///
/// Serialization needs no registry: entities carry their own tag.
pub fn serialize(item: &Item) -> Result<Value, RegistryError> {
    Ok(match item {
        Item::Null => Value::Null,
        Item::Bool(b) => Value::Bool(*b),
        Item::Int(v) => Value::Number(Number::from(*v)),
        Item::Uint(v) => Value::Number(Number::from(*v)),
        Item::Float(v) => Value::Number(Number::from_f64(*v).ok_or_else(|| RegistryError::MalformedScalar {
            tag: "float",
            reason: format!("{} is not finite", v),
        })?),
        Item::Str(s) => Value::String(s.clone()),
        Item::Bytes(bytes) => tagged(BYTES_TAG, [("bytes", Value::String(BASE64.encode(bytes)))]),
        Item::Decimal(d) => tagged(DECIMAL_TAG, [("value", Value::String(d.to_string()))]),
        Item::Date(d) => tagged(DATE_TAG, date_fields(d)),
        Item::Time(t) => tagged(TIME_TAG, time_fields(t)),
        Item::DateTime(dt) => {
            let fields = date_fields(&dt.date()).into_iter().chain(time_fields(&dt.time()));
            tagged(DATETIME_TAG, fields)
        }
        Item::List(items) => Value::Array(items.iter().map(serialize).collect::<Result<_, _>>()?),
        Item::Map(map) => {
            let mut out = Map::with_capacity(map.len());
            for (key, value) in map {
                out.insert(key.clone(), serialize(value)?);
            }
            Value::Object(out)
        }
        Item::Entity(entity) => entity_state(entity.as_ref())?,
    })
}

/// Builds the tagged state of an entity: the tag first, then declared fields.
pub fn entity_state<E: Entity + ?Sized>(entity: &E) -> Result<Value, RegistryError> {
    let mut out = Map::new();
    out.insert(TYPE_KEY.to_string(), Value::String(entity.type_tag().to_string()));
    for (name, value) in entity.get_state() {
        out.insert(name, serialize(&value)?);
    }
    Ok(Value::Object(out))
}

fn tagged(tag: &str, fields: impl IntoIterator<Item = (&'static str, Value)>) -> Value {
    let mut out = Map::new();
    out.insert(TYPE_KEY.to_string(), Value::String(tag.to_string()));
    for (key, value) in fields {
        out.insert(key.to_string(), value);
    }
    Value::Object(out)
}

fn date_fields(d: &NaiveDate) -> [(&'static str, Value); 3] {
    [
        ("year", Value::from(d.year())),
        ("month", Value::from(d.month())),
        ("day", Value::from(d.day())),
    ]
}

fn time_fields(t: &NaiveTime) -> [(&'static str, Value); 4] {
    [
        ("hour", Value::from(t.hour())),
        ("minute", Value::from(t.minute())),
        ("second", Value::from(t.second())),
        ("microsecond", Value::from(t.nanosecond() / 1_000)),
    ]
}

// =============================================================================
// DESERIALIZE HELPERS
// =============================================================================

/// Integers keep their exact value; only non-integral numbers become floats.
fn number_item(n: &Number) -> Item {
    if let Some(v) = n.as_i64() {
        Item::Int(v)
    } else if let Some(v) = n.as_u64() {
        Item::Uint(v)
    } else {
        Item::Float(n.as_f64().unwrap_or(f64::NAN))
    }
}

/// Coerces a `py_*` tagged mapping. Returns `None` for an unknown tag.
fn coerce_scalar(tag: &str, map: &Map<String, Value>) -> Result<Option<Item>, RegistryError> {
    let item = match tag {
        BYTES_TAG => {
            let encoded = str_field(map, BYTES_TAG, "bytes")?;
            let bytes = BASE64.decode(encoded).map_err(|e| RegistryError::MalformedScalar {
                tag: BYTES_TAG,
                reason: e.to_string(),
            })?;
            Item::Bytes(bytes)
        }
        DECIMAL_TAG => {
            let raw = str_field(map, DECIMAL_TAG, "value")?;
            let d = raw.parse().map_err(|e: rust_decimal::Error| RegistryError::MalformedScalar {
                tag: DECIMAL_TAG,
                reason: e.to_string(),
            })?;
            Item::Decimal(d)
        }
        DATE_TAG => Item::Date(parse_date(map, DATE_TAG)?),
        TIME_TAG => Item::Time(parse_time(map, TIME_TAG)?),
        DATETIME_TAG => Item::DateTime(NaiveDateTime::new(
            parse_date(map, DATETIME_TAG)?,
            parse_time(map, DATETIME_TAG)?,
        )),
        _ => return Ok(None),
    };
    Ok(Some(item))
}

fn str_field<'a>(map: &'a Map<String, Value>, tag: &'static str, key: &str) -> Result<&'a str, RegistryError> {
    map.get(key).and_then(Value::as_str).ok_or_else(|| RegistryError::MalformedScalar {
        tag,
        reason: format!("missing string field {:?}", key),
    })
}

fn int_field(map: &Map<String, Value>, tag: &'static str, key: &str) -> Result<i64, RegistryError> {
    map.get(key).and_then(Value::as_i64).ok_or_else(|| RegistryError::MalformedScalar {
        tag,
        reason: format!("missing integer field {:?}", key),
    })
}

fn u32_field(map: &Map<String, Value>, tag: &'static str, key: &str) -> Result<u32, RegistryError> {
    let v = int_field(map, tag, key)?;
    u32::try_from(v).map_err(|_| RegistryError::MalformedScalar {
        tag,
        reason: format!("{} = {} is out of range", key, v),
    })
}

fn parse_date(map: &Map<String, Value>, tag: &'static str) -> Result<NaiveDate, RegistryError> {
    let year = int_field(map, tag, "year")?;
    let year = i32::try_from(year).map_err(|_| RegistryError::MalformedScalar {
        tag,
        reason: format!("year {} is out of range", year),
    })?;
    let month = u32_field(map, tag, "month")?;
    let day = u32_field(map, tag, "day")?;
    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| RegistryError::MalformedScalar {
        tag,
        reason: format!("invalid date {}-{}-{}", year, month, day),
    })
}

fn parse_time(map: &Map<String, Value>, tag: &'static str) -> Result<NaiveTime, RegistryError> {
    let hour = u32_field(map, tag, "hour")?;
    let minute = u32_field(map, tag, "minute")?;
    let second = u32_field(map, tag, "second")?;
    let micro = match map.get("microsecond") {
        Some(_) => u32_field(map, tag, "microsecond")?,
        None => 0,
    };
    NaiveTime::from_hms_micro_opt(hour, minute, second, micro).ok_or_else(|| RegistryError::MalformedScalar {
        tag,
        reason: format!("invalid time {}:{}:{}.{}", hour, minute, second, micro),
    })
}
