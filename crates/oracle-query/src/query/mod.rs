//! Oracle queries.
//!
//! A query is an immutable, parameterized request. Its identity is derived
//! from its parameters on demand:
//!
//! ```text
//! descriptor = canonical JSON {"type": tag, <params in declaration order>}
//! query_data = descriptor                                  (JSON kinds)
//!            | abi((string,bytes), (tag, abi(params)))     (ABI kinds)
//! query_id   = keccak256(query_data)
//!            | legacy id as 32-byte big-endian integer     (legacy kinds)
//! ```

pub mod abi;
pub mod legacy;
pub mod price;
pub mod text;

pub use abi::{AwsSpotPrice, DivaProtocolPolygon, Morphware, Snapshot};
pub use legacy::LegacyRequest;
pub use price::{CoinPrice, SpotPrice, TokenSpotPrice};
pub use text::StringQuery;

use std::any::Any;

use crate::codec::{decode_params, encode_params, ResponseType};
use crate::error::{EncodeError, FieldError, QueryError, RegistryError};
use crate::model::{format_hex, parse_hex, AbiType, AbiValue, QueryId};
use crate::serial::{entity_state, to_canonical_string, Entity, Field, Item, Registry};

/// A declared ABI parameter of a query kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AbiParam {
    /// Field name; matches the serialized field.
    pub name: &'static str,
    pub abi_type: &'static str,
}

/// How a query kind turns its parameters into query data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryEncoding {
    /// Query data is the descriptor text.
    Json,
    /// Query data is the ABI encoding of the tag and these parameters.
    Abi(&'static [AbiParam]),
}

/// Common behavior of every query kind.
pub trait OracleQuery: Entity {
    /// Codec for values submitted in response to this query.
    fn value_type(&self) -> ResponseType;

    fn encoding(&self) -> QueryEncoding;

    /// Pre-assigned integer identity, for legacy requests only.
    fn legacy_id(&self) -> Option<u64> {
        None
    }

    /// Checks the parameters against the constructor's rules.
    ///
    /// A default-constructed kind holds placeholder values and fails here.
    fn validate(&self) -> Result<(), QueryError> {
        Ok(())
    }

    /// Canonical JSON of the query state.
    fn descriptor(&self) -> Result<String, QueryError> {
        self.validate()?;
        let state = entity_state(self)?;
        Ok(to_canonical_string(&state)?)
    }

    fn query_data(&self) -> Result<Vec<u8>, QueryError> {
        match self.encoding() {
            QueryEncoding::Json => Ok(self.descriptor()?.into_bytes()),
            QueryEncoding::Abi(params) => {
                self.validate()?;
                let mut types = Vec::with_capacity(params.len());
                let mut values = Vec::with_capacity(params.len());
                for param in params {
                    let ty = AbiType::parse(param.abi_type)?;
                    let item = self.field(param.name).unwrap_or(Item::Null);
                    values.push(item_to_abi(&item, &ty)?);
                    types.push(ty);
                }
                let args = encode_params(&types, &values)?;
                let envelope = encode_params(
                    &[AbiType::String, AbiType::Bytes],
                    &[AbiValue::from(self.type_tag()), AbiValue::Bytes(args)],
                )?;
                Ok(envelope)
            }
        }
    }

    /// Recomputed from the parameters on every call.
    fn query_id(&self) -> Result<QueryId, QueryError> {
        match self.legacy_id() {
            Some(id) => {
                self.validate()?;
                Ok(QueryId::from_legacy(id))
            }
            None => Ok(QueryId::from_query_data(&self.query_data()?)),
        }
    }
}

/// Converts a field value to the ABI value of a declared parameter.
fn item_to_abi(item: &Item, ty: &AbiType) -> Result<AbiValue, EncodeError> {
    let mismatch = || EncodeError::TypeMismatch { abi_type: ty.to_string(), found: item.kind_name() };
    match (ty, item) {
        (AbiType::String, Item::Str(s)) => Ok(AbiValue::String(s.clone())),
        (AbiType::Bytes, Item::Bytes(b)) => Ok(AbiValue::Bytes(b.clone())),
        (AbiType::Bool, Item::Bool(b)) => Ok(AbiValue::Bool(*b)),
        (AbiType::Uint(_), Item::Int(v)) => {
            u128::try_from(*v).map(AbiValue::Uint).map_err(|_| EncodeError::Negative { abi_type: ty.to_string() })
        }
        (AbiType::Uint(_), Item::Uint(v)) => Ok(AbiValue::Uint(u128::from(*v))),
        (AbiType::Uint(_), Item::Str(s)) => s.parse().map(AbiValue::Uint).map_err(|_| mismatch()),
        (AbiType::Int(_), Item::Int(v)) => Ok(AbiValue::Int(i128::from(*v))),
        (AbiType::Address, Item::Str(s)) => {
            let bytes = s.strip_prefix("0x").and_then(parse_hex).ok_or_else(mismatch)?;
            let addr: [u8; 20] = bytes.try_into().map_err(|_| mismatch())?;
            Ok(AbiValue::Address(addr))
        }
        _ => Err(mismatch()),
    }
}

/// Converts a decoded parameter back to a field value.
fn abi_to_item(value: AbiValue) -> Result<Item, FieldError> {
    match value {
        AbiValue::String(s) => Ok(Item::Str(s)),
        AbiValue::Bytes(b) => Ok(Item::Bytes(b)),
        AbiValue::Bool(b) => Ok(Item::Bool(b)),
        AbiValue::Uint(v) => Ok(Item::from(v)),
        AbiValue::Int(v) => i64::try_from(v).map(Item::Int).map_err(|_| FieldError::Invalid {
            reason: format!("{} does not fit a 64-bit field", v),
        }),
        AbiValue::Address(addr) => Ok(Item::Str(format!("0x{}", format_hex(&addr)))),
        other => Err(FieldError::WrongKind { expected: "scalar parameter", found: other.kind_name() }),
    }
}

macro_rules! query_kinds {
    ($($variant:ident($ty:ty)),* $(,)?) => {
        /// Any built-in query kind.
        #[derive(Debug, Clone, PartialEq)]
        pub enum Query {
            $($variant($ty),)*
        }

        impl Query {
            /// Takes ownership of a restored entity that is a query kind.
            pub fn from_entity(entity: Box<dyn Entity>) -> Result<Query, QueryError> {
                let tag = entity.type_tag();
                $(
                    if entity.as_any().is::<$ty>() {
                        return entity
                            .into_any()
                            .downcast::<$ty>()
                            .map(|query| Query::$variant(*query))
                            .map_err(|_| QueryError::NotAQuery { tag: tag.to_string() });
                    }
                )*
                Err(QueryError::NotAQuery { tag: tag.to_string() })
            }

            fn inner(&self) -> &dyn OracleQuery {
                match self {
                    $(Query::$variant(query) => query,)*
                }
            }

            fn inner_mut(&mut self) -> &mut dyn OracleQuery {
                match self {
                    $(Query::$variant(query) => query,)*
                }
            }

            fn into_inner_any(self) -> Box<dyn Any> {
                match self {
                    $(Query::$variant(query) => Box::new(query),)*
                }
            }
        }

        $(
            impl From<$ty> for Query {
                fn from(query: $ty) -> Self {
                    Query::$variant(query)
                }
            }
        )*

        /// Registers every built-in query kind.
        pub fn register_queries(registry: &mut Registry) -> Result<(), RegistryError> {
            $(registry.register::<$ty>()?;)*
            Ok(())
        }
    };
}

query_kinds! {
    CoinPrice(CoinPrice),
    SpotPrice(SpotPrice),
    TokenSpotPrice(TokenSpotPrice),
    StringQuery(StringQuery),
    LegacyRequest(LegacyRequest),
    Snapshot(Snapshot),
    DivaProtocolPolygon(DivaProtocolPolygon),
    Morphware(Morphware),
    AwsSpotPrice(AwsSpotPrice),
}

impl Query {
    /// Reconstructs a query from its query data.
    ///
    /// Data starting with `{` is a JSON descriptor. Anything else is the ABI
    /// envelope `(string tag, bytes params)`. The reconstructed query must
    /// derive exactly `data` again, so non-canonical input is rejected.
    pub fn from_query_data(registry: &Registry, data: &[u8]) -> Result<Query, QueryError> {
        let query = Query::parse_query_data(registry, data)?;
        if query.query_data()? != data {
            return Err(QueryError::NonCanonical { tag: query.type_tag() });
        }
        Ok(query)
    }

    fn parse_query_data(registry: &Registry, data: &[u8]) -> Result<Query, QueryError> {
        match data.first() {
            None => Err(QueryError::EmptyQueryData),
            Some(b'{') => {
                let state: serde_json::Value = serde_json::from_slice(data)?;
                match registry.deserialize(&state)? {
                    Item::Entity(entity) => Query::from_entity(entity),
                    other => Err(QueryError::NotAQuery { tag: other.kind_name().to_string() }),
                }
            }
            Some(_) => {
                let envelope = decode_params(&[AbiType::String, AbiType::Bytes], data)?;
                let mut parts = envelope.into_iter();
                let (Some(AbiValue::String(tag)), Some(AbiValue::Bytes(args))) = (parts.next(), parts.next()) else {
                    return Err(QueryError::UnknownQueryType { tag: String::new() });
                };

                let entity = registry.create(&tag).map_err(|_| QueryError::UnknownQueryType { tag: tag.clone() })?;
                let mut query = Query::from_entity(entity)?;
                let QueryEncoding::Abi(params) = query.encoding() else {
                    return Err(QueryError::UnknownQueryType { tag });
                };

                let types = params
                    .iter()
                    .map(|p| AbiType::parse(p.abi_type))
                    .collect::<Result<Vec<_>, _>>()?;
                let values = decode_params(&types, &args)?;
                for (param, value) in params.iter().zip(values) {
                    let item = abi_to_item(value).map_err(|e| invalid(param, e))?;
                    query.set_field(param.name, item).map_err(|e| invalid(param, e))?;
                }
                Ok(query)
            }
        }
    }

    /// The query as a registered entity item.
    pub fn to_item(&self) -> Item {
        Item::entity(self.clone())
    }
}

fn invalid(param: &AbiParam, err: FieldError) -> QueryError {
    QueryError::InvalidParameter { query: "query data", field: param.name, reason: err.to_string() }
}

impl Entity for Query {
    fn type_tag(&self) -> &'static str {
        self.inner().type_tag()
    }

    fn fields(&self) -> &'static [Field] {
        self.inner().fields()
    }

    fn field(&self, name: &str) -> Option<Item> {
        self.inner().field(name)
    }

    fn set_field(&mut self, name: &str, value: Item) -> Result<(), FieldError> {
        self.inner_mut().set_field(name, value)
    }

    fn clone_entity(&self) -> Box<dyn Entity> {
        self.inner().clone_entity()
    }

    fn as_any(&self) -> &dyn Any {
        self.inner().as_any()
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        (*self).into_inner_any()
    }
}

impl OracleQuery for Query {
    fn value_type(&self) -> ResponseType {
        self.inner().value_type()
    }

    fn encoding(&self) -> QueryEncoding {
        self.inner().encoding()
    }

    fn legacy_id(&self) -> Option<u64> {
        self.inner().legacy_id()
    }

    fn descriptor(&self) -> Result<String, QueryError> {
        self.inner().descriptor()
    }

    fn query_data(&self) -> Result<Vec<u8>, QueryError> {
        self.inner().query_data()
    }

    fn query_id(&self) -> Result<QueryId, QueryError> {
        self.inner().query_id()
    }

    fn validate(&self) -> Result<(), QueryError> {
        self.inner().validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn registry() -> Registry {
        let mut reg = Registry::new();
        register_queries(&mut reg).unwrap();
        reg
    }

    fn all_queries() -> Vec<Query> {
        vec![
            CoinPrice::new("btc", "usd", "current").unwrap().into(),
            SpotPrice::new("btc", "usd").unwrap().into(),
            TokenSpotPrice::new("0x88df592f8eb5d7bd38bfef7deb0fbc02cf3778a0", 1, "usd").unwrap().into(),
            StringQuery::new("What is the meaning of life").unwrap().into(),
            LegacyRequest::new(10).unwrap().into(),
            Snapshot::new("QmbZ6cYVvfoKvkDX14jRcN86z6bfV135npUfhxmENjHnQ1").unwrap().into(),
            DivaProtocolPolygon::new(156).into(),
            Morphware::new(1).into(),
            AwsSpotPrice::new("us-east-1f", "i3.16xlarge").unwrap().into(),
        ]
    }

    #[test]
    fn test_query_data_roundtrip_for_every_kind() {
        let reg = registry();
        for query in all_queries() {
            let data = query.query_data().unwrap();
            let back = Query::from_query_data(&reg, &data).unwrap();
            assert_eq!(back, query, "{}", query.type_tag());
            assert_eq!(back.query_id().unwrap(), query.query_id().unwrap());
        }
    }

    #[test]
    fn test_state_roundtrip_for_every_kind() {
        let reg = registry();
        for query in all_queries() {
            let state = reg.serialize(&query.to_item()).unwrap();
            let Item::Entity(entity) = reg.deserialize(&state).unwrap() else {
                panic!("expected entity");
            };
            assert_eq!(Query::from_entity(entity).unwrap(), query);
        }
    }

    #[test]
    fn test_query_ids_are_distinct() {
        let ids: std::collections::HashSet<_> =
            all_queries().iter().map(|q| q.query_id().unwrap()).collect();
        assert_eq!(ids.len(), all_queries().len());
    }

    #[test]
    fn test_abi_envelope_dispatch() {
        let query = Query::from(Morphware::new(1));
        let data = query.query_data().unwrap();
        assert_eq!(
            format_hex(&data),
            concat!(
                "0000000000000000000000000000000000000000000000000000000000000040",
                "0000000000000000000000000000000000000000000000000000000000000080",
                "0000000000000000000000000000000000000000000000000000000000000009",
                "4d6f727068776172650000000000000000000000000000000000000000000000",
                "0000000000000000000000000000000000000000000000000000000000000020",
                "0000000000000000000000000000000000000000000000000000000000000001",
            )
        );
        assert_eq!(
            query.query_id().unwrap().to_hex(),
            "bf7f9942188d84961cf2a01ec68c42ef000d5b0fb5ca7dc0fcf1ceee5164811c"
        );
    }

    #[test]
    fn test_from_query_data_errors() {
        let reg = registry();
        assert!(matches!(Query::from_query_data(&reg, b""), Err(QueryError::EmptyQueryData)));
        assert!(matches!(
            Query::from_query_data(&reg, br#"{"type":"Nope"}"#),
            Err(QueryError::Registry(RegistryError::UnknownTag { .. }))
        ));
        assert!(matches!(
            Query::from_query_data(&reg, br#"{"type":"ValueType","abi_type":"uint"}"#),
            Err(QueryError::Registry(RegistryError::UnknownTag { .. }))
        ));
        assert!(matches!(Query::from_query_data(&reg, b"{not json"), Err(QueryError::Json(_))));

        let unknown = encode_params(
            &[AbiType::String, AbiType::Bytes],
            &[AbiValue::from("Nope"), AbiValue::Bytes(vec![])],
        )
        .unwrap();
        assert!(matches!(
            Query::from_query_data(&reg, &unknown),
            Err(QueryError::UnknownQueryType { tag }) if tag == "Nope"
        ));
    }

    #[test]
    fn test_non_query_entity_rejected() {
        let mut reg = registry();
        reg.register::<crate::codec::ValueType>().unwrap();
        let err = Query::from_query_data(&reg, br#"{"type":"ValueType","abi_type":"uint"}"#).unwrap_err();
        assert!(matches!(err, QueryError::NotAQuery { tag } if tag == "ValueType"));
    }

    #[test]
    fn test_non_canonical_query_data_rejected() {
        let reg = registry();
        let upper = br#"{"type":"CoinPrice","coin":"BTC","currency":"usd","price_type":"current"}"#;
        assert!(matches!(
            Query::from_query_data(&reg, upper),
            Err(QueryError::NonCanonical { tag: "CoinPrice" })
        ));
        let spaced = br#"{"type": "SpotPrice", "asset": "btc", "currency": "usd"}"#;
        assert!(matches!(
            Query::from_query_data(&reg, spaced),
            Err(QueryError::NonCanonical { tag: "SpotPrice" })
        ));
        let reordered = br#"{"type":"SpotPrice","currency":"usd","asset":"btc"}"#;
        assert!(matches!(Query::from_query_data(&reg, reordered), Err(QueryError::NonCanonical { .. })));

        let mut padded = Morphware::new(1).query_data().unwrap();
        padded.extend_from_slice(&[0u8; 32]);
        assert!(Query::from_query_data(&reg, &padded).is_err());

        let canonical = br#"{"type":"SpotPrice","asset":"btc","currency":"usd"}"#;
        assert_eq!(
            Query::from_query_data(&reg, canonical).unwrap(),
            Query::from(SpotPrice::new("btc", "usd").unwrap())
        );
    }

    #[test]
    fn test_from_entity_unwraps_kinds() {
        let wrapped: Box<dyn Entity> = Box::new(Query::from(LegacyRequest::new(2).unwrap()));
        assert_eq!(Query::from_entity(wrapped).unwrap(), Query::from(LegacyRequest::new(2).unwrap()));

        let direct: Box<dyn Entity> = Box::new(Snapshot::new("proposal").unwrap());
        assert!(matches!(Query::from_entity(direct).unwrap(), Query::Snapshot(_)));

        let other: Box<dyn Entity> = Box::new(crate::codec::ValueType::default());
        assert!(matches!(
            Query::from_entity(other),
            Err(QueryError::NotAQuery { tag }) if tag == "ValueType"
        ));
    }

    #[test]
    fn test_default_queries_have_no_identity() {
        let legacy = Query::from(LegacyRequest::default());
        assert!(matches!(
            legacy.query_id(),
            Err(QueryError::InvalidParameter { query: "LegacyRequest", field: "legacy_id", .. })
        ));
        assert!(matches!(
            Query::from(CoinPrice::default()).descriptor(),
            Err(QueryError::InvalidParameter { query: "CoinPrice", field: "coin", .. })
        ));
        assert!(Query::from(Snapshot::default()).query_data().is_err());
        assert!(Query::from(StringQuery::default()).query_id().is_err());
        assert!(Query::from(AwsSpotPrice::default()).validate().is_err());

        // Kinds whose parameters are plain integers accept any value.
        assert!(Query::from(Morphware::default()).query_id().is_ok());
        assert!(DivaProtocolPolygon::default().query_id().is_ok());
    }

    proptest! {
        #[test]
        fn prop_identity_is_deterministic(coin in "[a-z]{1,8}", currency in "[a-z]{1,5}") {
            let a = CoinPrice::new(&coin, &currency, "current").unwrap();
            let b = CoinPrice::new(&coin.to_uppercase(), &currency, "current").unwrap();
            prop_assert_eq!(a.query_id().unwrap(), b.query_id().unwrap());

            let other = CoinPrice::new(&coin, &currency, "eod").unwrap();
            prop_assert_ne!(a.query_id().unwrap(), other.query_id().unwrap());
        }

        #[test]
        fn prop_string_query_roundtrip(text in "\\PC{1,40}") {
            let reg = registry();
            let query = Query::from(StringQuery::new(&text).unwrap());
            let descriptor = query.descriptor().unwrap();
            prop_assert!(descriptor.is_ascii());
            let back = Query::from_query_data(&reg, &query.query_data().unwrap()).unwrap();
            prop_assert_eq!(back, query);
        }
    }
}
