//! Limits and fixed constants for query encoding/decoding.
//!
//! The decode limits protect against resource exhaustion
//! when processing untrusted response values.

/// Size of one ABI word in bytes.
pub const WORD_SIZE: usize = 32;

/// Size of a query id in bytes.
pub const QUERY_ID_LEN: usize = 32;

/// Highest legacy request id. Legacy ids are small pre-assigned integers.
pub const LEGACY_ID_MAX: u64 = 100;

/// Lowest legacy request id.
pub const LEGACY_ID_MIN: u64 = 1;

/// Maximum input accepted by any decoder (16 MB).
pub const MAX_DECODE_LEN: usize = 16 * 1024 * 1024;

/// Maximum element count of a decoded dynamic array.
pub const MAX_ARRAY_LEN: usize = 65_536;

/// Maximum number of slots in a fixed-size type: the product of its
/// fixed array dimensions, with tuple members counted individually.
pub const MAX_STATIC_SLOTS: usize = 65_536;

/// Maximum length of a decoded `string` or `bytes` value (4 MB).
pub const MAX_BYTES_LEN: usize = 4 * 1024 * 1024;

/// Maximum nesting of tuples and arrays in a type string.
pub const MAX_TYPE_DEPTH: usize = 32;

/// Maximum decimal count accepted by the grammar (`fixed<M>x<N>`).
pub const MAX_FIXED_DECIMALS: u8 = 80;

/// Maximum decimal count a fixed-point value can actually carry.
///
/// Values are held as `rust_decimal::Decimal`, whose scale tops out at 28.
pub const MAX_DECIMAL_SCALE: u32 = 28;

/// Reserved prefix for scalar wrapper tags in serialized state.
pub const RESERVED_TAG_PREFIX: &str = "py_";

/// Reserved key carrying the type tag in serialized state.
pub const TYPE_KEY: &str = "type";
