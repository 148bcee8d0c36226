//! Legacy requests identified by a small pre-assigned integer.

use crate::codec::{ResponseType, UnsignedFloatType};
use crate::error::{FieldError, QueryError};
use crate::query::{OracleQuery, QueryEncoding};
use crate::serial::{Field, Item, Serializable};
use crate::validate::{self, field_error, param_error};

/// Legacy ids whose responses carry 18 decimals instead of 6.
const EIGHTEEN_DECIMAL_IDS: &[u64] = &[10, 41];

/// A request whose query id is its legacy id, not a hash.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LegacyRequest {
    legacy_id: u64,
}

impl LegacyRequest {
    pub fn new(legacy_id: u64) -> Result<LegacyRequest, QueryError> {
        Ok(LegacyRequest {
            legacy_id: validate::legacy_id(legacy_id).map_err(param_error(Self::TYPE, "legacy_id"))?,
        })
    }

    /// Builds a request from an id known to be in range.
    pub(crate) const fn known(legacy_id: u64) -> LegacyRequest {
        LegacyRequest { legacy_id }
    }
}

impl Serializable for LegacyRequest {
    const TYPE: &'static str = "LegacyRequest";
    const FIELDS: &'static [Field] = &[Field::required("legacy_id")];

    fn get(&self, field: &str) -> Option<Item> {
        match field {
            "legacy_id" => Some(Item::from(self.legacy_id)),
            _ => None,
        }
    }

    fn set(&mut self, field: &str, value: Item) -> Result<(), FieldError> {
        match field {
            "legacy_id" => self.legacy_id = validate::legacy_id(value.into_u64()?).map_err(field_error)?,
            _ => return Err(FieldError::Unknown { field: field.to_string() }),
        }
        Ok(())
    }
}

impl OracleQuery for LegacyRequest {
    fn validate(&self) -> Result<(), QueryError> {
        validate::legacy_id(self.legacy_id).map_err(param_error(Self::TYPE, "legacy_id"))?;
        Ok(())
    }

    fn value_type(&self) -> ResponseType {
        let decimals = if EIGHTEEN_DECIMAL_IDS.contains(&self.legacy_id) { 18 } else { 6 };
        ResponseType::UnsignedFloat(UnsignedFloatType::builtin(256, decimals, false))
    }

    fn encoding(&self) -> QueryEncoding {
        QueryEncoding::Json
    }

    fn legacy_id(&self) -> Option<u64> {
        Some(self.legacy_id)
    }
}
