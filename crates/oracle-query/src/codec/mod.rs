//! Binary encoding and decoding.
//!
//! - `primitives`: 32-byte word reader and writer
//! - `value`: ABI value codec, standard and packed layouts
//! - `value_type`: response codecs built on top of the value codec

pub mod primitives;
pub mod value;
pub mod value_type;

pub use primitives::{Reader, Writer};
pub use value::{decode_packed, decode_params, decode_value, encode_packed, encode_params, encode_value};
pub use value_type::{EncodedFloat, Quantized, ResponseType, ResponseValue, UnsignedFloatType, ValueType};
