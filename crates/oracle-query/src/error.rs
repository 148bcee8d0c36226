//! Error types for grammar parsing, value encoding/decoding, the
//! serialization registry and the query model.

use thiserror::Error;

/// Errors raised while parsing an ABI type string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GrammarError {
    #[error("empty type string")]
    Empty,

    #[error("unexpected character {found:?} at position {pos} in {input:?}")]
    UnexpectedChar { input: String, pos: usize, found: char },

    #[error("unexpected end of type string {input:?}")]
    UnexpectedEnd { input: String },

    #[error("unknown base type {base:?}")]
    UnknownBase { base: String },

    #[error("{base} must not have a size suffix")]
    UnexpectedSuffix { base: String },

    #[error("{base}{bits}: bit width must be a multiple of 8 in 8..=256")]
    InvalidBits { base: &'static str, bits: u32 },

    #[error("decimal count {decimals} must be in 1..=80")]
    InvalidDecimals { decimals: u32 },

    #[error("bytes{size}: size must be in 1..=32")]
    InvalidBytesSize { size: u32 },

    #[error("fixed array dimension must be positive")]
    ZeroLengthArray,

    #[error("fixed-size type has {slots} slots, exceeding the limit of {max}")]
    TooManySlots { slots: usize, max: usize },

    #[error("type nesting exceeds {max} levels")]
    TooDeep { max: usize },

    #[error("expected an unsigned fixed-point type (ufixed<M>x<N>), got {abi_type}")]
    NotUnsignedFixed { abi_type: String },
}

/// Errors raised while encoding a value against a declared type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    #[error("type mismatch: {abi_type} cannot encode a {found} value")]
    TypeMismatch { abi_type: String, found: &'static str },

    #[error("integer out of range for {abi_type}")]
    IntegerOutOfRange { abi_type: String },

    #[error("array length mismatch: expected {expected}, got {found}")]
    ArrayLengthMismatch { expected: usize, found: usize },

    #[error("tuple arity mismatch: expected {expected}, got {found}")]
    TupleArityMismatch { expected: usize, found: usize },

    #[error("bytes{expected} requires exactly {expected} bytes, got {found}")]
    FixedBytesLength { expected: usize, found: usize },

    #[error("value has more than {decimals} decimal places")]
    TooManyDecimals { decimals: u8 },

    #[error("value cannot be represented with {decimals} decimals")]
    PrecisionOverflow { decimals: u8 },

    #[error("unsigned type {abi_type} cannot encode a negative value")]
    Negative { abi_type: String },

    #[error("float value is not finite")]
    NotFinite,

    #[error("packed encoding does not support dynamic element type {abi_type}")]
    DynamicInPacked { abi_type: String },
}

/// Errors raised while decoding bytes against a declared type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("unexpected end of input while reading {context}")]
    UnexpectedEof { context: &'static str },

    #[error("length mismatch: expected {expected} bytes, got {found}")]
    LengthMismatch { expected: usize, found: usize },

    #[error("{field} length {len} exceeds limit {max}")]
    LengthExceedsLimit { field: &'static str, len: usize, max: usize },

    #[error("invalid bool word value")]
    InvalidBool,

    #[error("invalid UTF-8 in string")]
    InvalidUtf8,

    #[error("integer does not fit 128 bits")]
    IntegerOverflow,

    #[error("value out of range for {abi_type}")]
    OutOfRange { abi_type: String },

    #[error("offset {offset} out of bounds (input is {len} bytes)")]
    OffsetOutOfBounds { offset: usize, len: usize },

    #[error("non-zero padding in {context}")]
    NonZeroPadding { context: &'static str },

    #[error("packed decoding is not supported for {abi_type}")]
    UnsupportedPacked { abi_type: String },

    #[error("fixed-point value cannot be carried with {decimals} decimals")]
    PrecisionOverflow { decimals: u8 },
}

/// A single field that failed to restore.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldFailure {
    pub field: &'static str,
    pub reason: String,
}

/// Errors raised by the serialization registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("cannot register type: duplicate tag {tag:?}")]
    DuplicateTag { tag: String },

    #[error("unknown type tag {tag:?}")]
    UnknownTag { tag: String },

    #[error("trying to use {found} state for {expected} object")]
    TypeMismatch { expected: String, found: String },

    #[error("state for {context} is not a mapping")]
    NotAMapping { context: String },

    #[error("malformed {tag} value: {reason}")]
    MalformedScalar { tag: &'static str, reason: String },

    #[error("failed to restore {} field(s) of {type_tag}", .failures.len())]
    Restore { type_tag: String, failures: Vec<FieldFailure> },
}

/// Error assigning one field of a registered entity.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("unknown field {field:?}")]
    Unknown { field: String },

    #[error("expected {expected}, got {found}")]
    WrongKind { expected: &'static str, found: &'static str },

    #[error("invalid value: {reason}")]
    Invalid { reason: String },
}

/// Errors raised by the query model.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("{query}.{field}: {reason}")]
    InvalidParameter { query: &'static str, field: &'static str, reason: String },

    #[error("unknown query type {tag:?}")]
    UnknownQueryType { tag: String },

    #[error("entity {tag:?} is not an oracle query")]
    NotAQuery { tag: String },

    #[error("{tag} query data is not in canonical form")]
    NonCanonical { tag: &'static str },

    #[error("query data is empty")]
    EmptyQueryData,

    #[error("invalid query id: {reason}")]
    InvalidQueryId { reason: String },

    #[error("grammar error: {0}")]
    Grammar(#[from] GrammarError),

    #[error("encode error: {0}")]
    Encode(#[from] EncodeError),

    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised by the query catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("duplicate catalog tag {tag:?}")]
    DuplicateTag { tag: String },

    #[error("catalog state is malformed: {reason}")]
    Malformed { reason: String },

    #[error("query error: {0}")]
    Query(#[from] QueryError),

    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[cfg(feature = "yaml")]
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
