//! Oracle queries: canonical query data, query ids and response codecs.
//!
//! A query is a typed, parameterized request published to an on-chain
//! oracle. This crate derives its canonical query data and 32-byte query id,
//! and encodes and decodes the values reporters submit in response.
//!
//! # Quick Start
//!
//! ```rust
//! use oracle_query::{CoinPrice, OracleQuery, ResponseValue};
//!
//! let query = CoinPrice::new("BTC", "USD", "current").unwrap();
//! assert_eq!(
//!     query.descriptor().unwrap(),
//!     r#"{"type":"CoinPrice","coin":"btc","currency":"usd","price_type":"current"}"#
//! );
//!
//! // Reporters submit 2.1234567; the oracle stores it with 6 decimals
//! let value_type = query.value_type();
//! let bytes = value_type.encode(&ResponseValue::Float(2.1234567)).unwrap();
//! assert_eq!(value_type.decode(&bytes).unwrap(), ResponseValue::Float(2.123457));
//! ```
//!
//! # Modules
//!
//! - [`model`]: Query ids, ABI types and ABI values
//! - [`codec`]: ABI encoding/decoding and response value types
//! - [`serial`]: Tagged-state serialization and the type registry
//! - [`query`]: Query kinds and identity derivation
//! - [`catalog`]: Well-known queries published under stable tags
//! - [`validate`]: Parameter validation
//! - [`error`]: Error types
//! - [`limits`]: Security limits for decoding
//!
//! # Security
//!
//! Response bytes come from untrusted reporters:
//! - Lengths and offsets are checked against the input before use
//! - Array, bytes and nesting sizes are bounded by [`limits`]
//! - Padding must be zero and packed input must have the exact width

pub mod catalog;
pub mod codec;
pub mod error;
pub mod limits;
pub mod model;
pub mod query;
pub mod serial;
pub mod validate;

// Re-export commonly used types at crate root
pub use catalog::{builtin, Catalog, CatalogEntry, CatalogFilter};
pub use codec::{EncodedFloat, Quantized, ResponseType, ResponseValue, UnsignedFloatType, ValueType};
pub use error::{
    CatalogError, DecodeError, EncodeError, FieldError, FieldFailure, GrammarError, QueryError, RegistryError,
};
pub use model::{AbiType, AbiValue, QueryId};
pub use query::{
    AwsSpotPrice, CoinPrice, DivaProtocolPolygon, LegacyRequest, Morphware, OracleQuery, Query, Snapshot, SpotPrice,
    StringQuery, TokenSpotPrice,
};
pub use serial::{Entity, Item, Registry, Serializable};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
