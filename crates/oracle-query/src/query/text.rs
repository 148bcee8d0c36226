//! Free-text question query.

use crate::codec::{ResponseType, ValueType};
use crate::error::{FieldError, QueryError};
use crate::model::AbiType;
use crate::query::{OracleQuery, QueryEncoding};
use crate::serial::{Field, Item, Serializable};
use crate::validate::{self, field_error, param_error};

/// A question asked in plain text, answered with a string.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StringQuery {
    text: String,
}

impl StringQuery {
    pub fn new(text: &str) -> Result<StringQuery, QueryError> {
        Ok(StringQuery { text: validate::text(text).map_err(param_error(Self::TYPE, "text"))? })
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

impl Serializable for StringQuery {
    const TYPE: &'static str = "StringQuery";
    const FIELDS: &'static [Field] = &[Field::required("text")];

    fn get(&self, field: &str) -> Option<Item> {
        match field {
            "text" => Some(Item::from(self.text.as_str())),
            _ => None,
        }
    }

    fn set(&mut self, field: &str, value: Item) -> Result<(), FieldError> {
        match field {
            "text" => self.text = validate::text(&value.into_string()?).map_err(field_error)?,
            _ => return Err(FieldError::Unknown { field: field.to_string() }),
        }
        Ok(())
    }
}

impl OracleQuery for StringQuery {
    fn validate(&self) -> Result<(), QueryError> {
        validate::text(&self.text).map_err(param_error(Self::TYPE, "text"))?;
        Ok(())
    }

    fn value_type(&self) -> ResponseType {
        ResponseType::Value(ValueType::from_parsed(AbiType::String, false))
    }

    fn encoding(&self) -> QueryEncoding {
        QueryEncoding::Json
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::ResponseValue;
    use crate::model::AbiValue;

    #[test]
    fn test_identity() {
        let q = StringQuery::new("What is the meaning of life").unwrap();
        assert_eq!(q.descriptor().unwrap(), r#"{"type":"StringQuery","text":"What is the meaning of life"}"#);
        assert_eq!(
            q.query_id().unwrap().to_hex(),
            "67be43857be976c19c9c54c1fb9423206bc207fcfacd330ed0dbd29beeb8c6e3"
        );
    }

    #[test]
    fn test_non_ascii_text_is_escaped() {
        let q = StringQuery::new("café").unwrap();
        assert_eq!(q.descriptor().unwrap(), r#"{"type":"StringQuery","text":"caf\u00e9"}"#);
        assert_eq!(
            q.query_id().unwrap().to_hex(),
            "82b1016bcaab2663ba0c6456bc3f7381b01ff4471a1fd3e0249727f2e5d356a6"
        );
        assert_eq!(q.text(), "café");
    }

    #[test]
    fn test_string_response() {
        let vt = StringQuery::new("q").unwrap().value_type();
        let answer = ResponseValue::Abi(AbiValue::from("42"));
        let bytes = vt.encode(&answer).unwrap();
        assert_eq!(bytes.len(), 64);
        assert_eq!(vt.decode(&bytes).unwrap(), answer);
    }

    #[test]
    fn test_empty_text_rejected() {
        assert!(StringQuery::new("").is_err());
    }
}
