//! Runtime values carried by the ABI codec.

use rust_decimal::Decimal;

/// A value that can be encoded against an [`AbiType`](crate::model::AbiType).
///
/// Integers are carried in 128 bits. Wider declared types (up to 256 bits)
/// still encode into a full 32-byte word, but decoding rejects magnitudes
/// that do not fit.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AbiValue {
    Uint(u128),
    Int(i128),
    Bool(bool),
    Address([u8; 20]),
    /// Contents of a `bytes<N>` value; length must equal N.
    FixedBytes(Vec<u8>),
    Bytes(Vec<u8>),
    String(String),
    /// A fixed-point number, for `ufixed`/`fixed` types.
    Fixed(Decimal),
    /// Elements of a dynamic or fixed-length array.
    Array(Vec<AbiValue>),
    Tuple(Vec<AbiValue>),
}

impl AbiValue {
    /// Returns a short name for the kind of value, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            AbiValue::Uint(_) => "uint",
            AbiValue::Int(_) => "int",
            AbiValue::Bool(_) => "bool",
            AbiValue::Address(_) => "address",
            AbiValue::FixedBytes(_) => "fixed bytes",
            AbiValue::Bytes(_) => "bytes",
            AbiValue::String(_) => "string",
            AbiValue::Fixed(_) => "fixed",
            AbiValue::Array(_) => "array",
            AbiValue::Tuple(_) => "tuple",
        }
    }

    pub fn as_uint(&self) -> Option<u128> {
        match self {
            AbiValue::Uint(v) => Some(*v),
            AbiValue::Int(v) => u128::try_from(*v).ok(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AbiValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            AbiValue::Bytes(b) | AbiValue::FixedBytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_decimal(&self) -> Option<Decimal> {
        match self {
            AbiValue::Fixed(d) => Some(*d),
            _ => None,
        }
    }
}

impl From<u128> for AbiValue {
    fn from(v: u128) -> Self {
        AbiValue::Uint(v)
    }
}

impl From<u64> for AbiValue {
    fn from(v: u64) -> Self {
        AbiValue::Uint(u128::from(v))
    }
}

impl From<i128> for AbiValue {
    fn from(v: i128) -> Self {
        AbiValue::Int(v)
    }
}

impl From<bool> for AbiValue {
    fn from(v: bool) -> Self {
        AbiValue::Bool(v)
    }
}

impl From<&str> for AbiValue {
    fn from(v: &str) -> Self {
        AbiValue::String(v.to_string())
    }
}

impl From<String> for AbiValue {
    fn from(v: String) -> Self {
        AbiValue::String(v)
    }
}

impl From<Decimal> for AbiValue {
    fn from(v: Decimal) -> Self {
        AbiValue::Fixed(v)
    }
}
