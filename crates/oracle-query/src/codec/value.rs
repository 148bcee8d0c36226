//! Value encoding/decoding for the contract ABI wire format.
//!
//! Two layouts are supported:
//! - standard: every value is built from 32-byte words. Tuples and arrays
//!   use a head/tail layout where dynamic members are referenced by offset.
//!   A top-level dynamic value is written without a leading offset word.
//! - packed: minimal widths with no padding, except that array elements
//!   stay word-padded.

use rust_decimal::Decimal;

use crate::codec::primitives::{be_to_i128, be_to_u128, Reader, Writer};
use crate::error::{DecodeError, EncodeError};
use crate::limits::{MAX_ARRAY_LEN, MAX_BYTES_LEN, MAX_DECIMAL_SCALE, MAX_DECODE_LEN, MAX_STATIC_SLOTS, WORD_SIZE};
use crate::model::{AbiType, AbiValue};

// =============================================================================
// ENCODING
// =============================================================================

/// Encodes a single value in the standard layout.
pub fn encode_value(ty: &AbiType, value: &AbiValue) -> Result<Vec<u8>, EncodeError> {
    let mut writer = Writer::new();
    encode_into(&mut writer, ty, value)?;
    Ok(writer.into_bytes())
}

/// Encodes a parameter list as a tuple.
///
/// This is the layout used for function arguments: one head slot per
/// parameter, dynamic parameters referenced by offset.
pub fn encode_params(types: &[AbiType], values: &[AbiValue]) -> Result<Vec<u8>, EncodeError> {
    if types.len() != values.len() {
        return Err(EncodeError::TupleArityMismatch { expected: types.len(), found: values.len() });
    }
    let mut writer = Writer::new();
    encode_sequence(&mut writer, types.iter(), values)?;
    Ok(writer.into_bytes())
}

fn encode_into(writer: &mut Writer, ty: &AbiType, value: &AbiValue) -> Result<(), EncodeError> {
    match (ty, value) {
        (AbiType::Uint(bits), _) => {
            let v = uint_operand(ty, value)?;
            check_uint_range(ty, *bits, v)?;
            writer.write_uint_word(v);
        }
        (AbiType::Int(bits), _) => {
            let v = int_operand(ty, value)?;
            check_int_range(ty, *bits, v)?;
            writer.write_int_word(v);
        }
        (AbiType::Ufixed { bits, decimals }, _) => {
            let scaled = fixed_operand(ty, value, *decimals)?;
            if scaled < 0 {
                return Err(EncodeError::Negative { abi_type: ty.to_string() });
            }
            let scaled = scaled as u128;
            check_uint_range(ty, *bits, scaled)?;
            writer.write_uint_word(scaled);
        }
        (AbiType::Fixed { bits, decimals }, _) => {
            let scaled = fixed_operand(ty, value, *decimals)?;
            check_int_range(ty, *bits, scaled)?;
            writer.write_int_word(scaled);
        }
        (AbiType::Bool, AbiValue::Bool(v)) => writer.write_uint_word(u128::from(*v)),
        (AbiType::Address, AbiValue::Address(addr)) => writer.write_left_padded(addr),
        (AbiType::FixedBytes(size), AbiValue::FixedBytes(bytes) | AbiValue::Bytes(bytes)) => {
            check_fixed_bytes(*size, bytes)?;
            writer.write_right_padded(bytes);
        }
        (AbiType::Bytes, AbiValue::Bytes(bytes)) => {
            writer.write_len_word(bytes.len());
            writer.write_right_padded(bytes);
        }
        (AbiType::String, AbiValue::String(s)) => {
            writer.write_len_word(s.len());
            writer.write_right_padded(s.as_bytes());
        }
        (AbiType::Array(inner), AbiValue::Array(elems)) => {
            writer.write_len_word(elems.len());
            encode_sequence(writer, std::iter::repeat_n(inner.as_ref(), elems.len()), elems)?;
        }
        (AbiType::FixedArray(inner, len), AbiValue::Array(elems)) => {
            if elems.len() != *len {
                return Err(EncodeError::ArrayLengthMismatch { expected: *len, found: elems.len() });
            }
            encode_sequence(writer, std::iter::repeat_n(inner.as_ref(), *len), elems)?;
        }
        (AbiType::Tuple(members), AbiValue::Tuple(values)) => {
            if members.len() != values.len() {
                return Err(EncodeError::TupleArityMismatch {
                    expected: members.len(),
                    found: values.len(),
                });
            }
            encode_sequence(writer, members.iter(), values)?;
        }
        _ => return Err(mismatch(ty, value)),
    }
    Ok(())
}

/// Writes a head/tail sequence. Offsets are relative to the sequence start.
fn encode_sequence<'t>(
    writer: &mut Writer,
    types: impl Iterator<Item = &'t AbiType> + Clone,
    values: &[AbiValue],
) -> Result<(), EncodeError> {
    let head_len = types.clone().fold(0usize, |acc, ty| acc.saturating_add(ty.head_size()));
    let mut heads = Writer::new();
    let mut tails = Writer::new();

    for (ty, value) in types.zip(values) {
        if ty.is_dynamic() {
            heads.write_len_word(head_len + tails.len());
            encode_into(&mut tails, ty, value)?;
        } else {
            encode_into(&mut heads, ty, value)?;
        }
    }

    writer.write_bytes(heads.as_bytes());
    writer.write_bytes(tails.as_bytes());
    Ok(())
}

/// Encodes a single value in the packed layout.
pub fn encode_packed(ty: &AbiType, value: &AbiValue) -> Result<Vec<u8>, EncodeError> {
    let mut writer = Writer::new();
    encode_packed_into(&mut writer, ty, value)?;
    Ok(writer.into_bytes())
}

fn encode_packed_into(writer: &mut Writer, ty: &AbiType, value: &AbiValue) -> Result<(), EncodeError> {
    match (ty, value) {
        (AbiType::Uint(bits), _) => {
            let v = uint_operand(ty, value)?;
            check_uint_range(ty, *bits, v)?;
            writer.write_uint_packed(v, usize::from(*bits) / 8);
        }
        (AbiType::Int(bits), _) => {
            let v = int_operand(ty, value)?;
            check_int_range(ty, *bits, v)?;
            writer.write_int_packed(v, usize::from(*bits) / 8);
        }
        (AbiType::Ufixed { bits, decimals }, _) => {
            let scaled = fixed_operand(ty, value, *decimals)?;
            if scaled < 0 {
                return Err(EncodeError::Negative { abi_type: ty.to_string() });
            }
            let scaled = scaled as u128;
            check_uint_range(ty, *bits, scaled)?;
            writer.write_uint_packed(scaled, usize::from(*bits) / 8);
        }
        (AbiType::Fixed { bits, decimals }, _) => {
            let scaled = fixed_operand(ty, value, *decimals)?;
            check_int_range(ty, *bits, scaled)?;
            writer.write_int_packed(scaled, usize::from(*bits) / 8);
        }
        (AbiType::Bool, AbiValue::Bool(v)) => writer.write_bytes(&[u8::from(*v)]),
        (AbiType::Address, AbiValue::Address(addr)) => writer.write_bytes(addr),
        (AbiType::FixedBytes(size), AbiValue::FixedBytes(bytes) | AbiValue::Bytes(bytes)) => {
            check_fixed_bytes(*size, bytes)?;
            writer.write_bytes(bytes);
        }
        (AbiType::Bytes, AbiValue::Bytes(bytes)) => writer.write_bytes(bytes),
        (AbiType::String, AbiValue::String(s)) => writer.write_bytes(s.as_bytes()),
        (AbiType::Array(inner), AbiValue::Array(elems)) => {
            encode_packed_elements(writer, inner, elems)?;
        }
        (AbiType::FixedArray(inner, len), AbiValue::Array(elems)) => {
            if elems.len() != *len {
                return Err(EncodeError::ArrayLengthMismatch { expected: *len, found: elems.len() });
            }
            encode_packed_elements(writer, inner, elems)?;
        }
        (AbiType::Tuple(members), AbiValue::Tuple(values)) => {
            if members.len() != values.len() {
                return Err(EncodeError::TupleArityMismatch {
                    expected: members.len(),
                    found: values.len(),
                });
            }
            for (member, v) in members.iter().zip(values) {
                encode_packed_into(writer, member, v)?;
            }
        }
        _ => return Err(mismatch(ty, value)),
    }
    Ok(())
}

/// Array elements are written in their word-padded standard form.
fn encode_packed_elements(writer: &mut Writer, inner: &AbiType, elems: &[AbiValue]) -> Result<(), EncodeError> {
    if inner.is_dynamic() {
        return Err(EncodeError::DynamicInPacked { abi_type: inner.to_string() });
    }
    for elem in elems {
        encode_into(writer, inner, elem)?;
    }
    Ok(())
}

fn mismatch(ty: &AbiType, value: &AbiValue) -> EncodeError {
    EncodeError::TypeMismatch { abi_type: ty.to_string(), found: value.kind_name() }
}

fn uint_operand(ty: &AbiType, value: &AbiValue) -> Result<u128, EncodeError> {
    match value {
        AbiValue::Uint(v) => Ok(*v),
        AbiValue::Int(v) if *v < 0 => Err(EncodeError::Negative { abi_type: ty.to_string() }),
        AbiValue::Int(v) => Ok(*v as u128),
        _ => Err(mismatch(ty, value)),
    }
}

fn int_operand(ty: &AbiType, value: &AbiValue) -> Result<i128, EncodeError> {
    match value {
        AbiValue::Int(v) => Ok(*v),
        AbiValue::Uint(v) => {
            i128::try_from(*v).map_err(|_| EncodeError::IntegerOutOfRange { abi_type: ty.to_string() })
        }
        _ => Err(mismatch(ty, value)),
    }
}

/// Converts a fixed-point operand to its scaled integer `value * 10^decimals`.
///
/// Integers are accepted as whole numbers. A decimal with more fractional
/// digits than the type carries is rejected rather than rounded.
fn fixed_operand(ty: &AbiType, value: &AbiValue, decimals: u8) -> Result<i128, EncodeError> {
    let decimal = match value {
        AbiValue::Fixed(d) => *d,
        AbiValue::Uint(v) => i128::try_from(*v)
            .ok()
            .and_then(|v| Decimal::try_from_i128_with_scale(v, 0).ok())
            .ok_or(EncodeError::IntegerOutOfRange { abi_type: ty.to_string() })?,
        AbiValue::Int(v) => Decimal::try_from_i128_with_scale(*v, 0)
            .map_err(|_| EncodeError::IntegerOutOfRange { abi_type: ty.to_string() })?,
        _ => return Err(mismatch(ty, value)),
    };
    scale_decimal(ty, decimal, decimals)
}

pub(crate) fn scale_decimal(ty: &AbiType, decimal: Decimal, decimals: u8) -> Result<i128, EncodeError> {
    if u32::from(decimals) > MAX_DECIMAL_SCALE {
        return Err(EncodeError::PrecisionOverflow { decimals });
    }
    let normalized = decimal.normalize();
    let scale = normalized.scale();
    if scale > u32::from(decimals) {
        return Err(EncodeError::TooManyDecimals { decimals });
    }
    let factor = 10i128
        .checked_pow(u32::from(decimals) - scale)
        .ok_or(EncodeError::PrecisionOverflow { decimals })?;
    normalized
        .mantissa()
        .checked_mul(factor)
        .ok_or(EncodeError::IntegerOutOfRange { abi_type: ty.to_string() })
}

fn check_uint_range(ty: &AbiType, bits: u16, v: u128) -> Result<(), EncodeError> {
    if bits < 128 && v >> bits != 0 {
        return Err(EncodeError::IntegerOutOfRange { abi_type: ty.to_string() });
    }
    Ok(())
}

fn check_int_range(ty: &AbiType, bits: u16, v: i128) -> Result<(), EncodeError> {
    if bits < 128 {
        let min = -(1i128 << (bits - 1));
        let max = (1i128 << (bits - 1)) - 1;
        if v < min || v > max {
            return Err(EncodeError::IntegerOutOfRange { abi_type: ty.to_string() });
        }
    }
    Ok(())
}

fn check_fixed_bytes(size: u8, bytes: &[u8]) -> Result<(), EncodeError> {
    if bytes.len() != usize::from(size) {
        return Err(EncodeError::FixedBytesLength { expected: usize::from(size), found: bytes.len() });
    }
    Ok(())
}

// =============================================================================
// DECODING
// =============================================================================

/// Decodes a single value in the standard layout.
pub fn decode_value(ty: &AbiType, data: &[u8]) -> Result<AbiValue, DecodeError> {
    check_input_len(data)?;
    decode_at(ty, data, 0)
}

/// Decodes a parameter list encoded as a tuple.
pub fn decode_params(types: &[AbiType], data: &[u8]) -> Result<Vec<AbiValue>, DecodeError> {
    check_input_len(data)?;
    decode_sequence(types.iter(), data, 0)
}

fn check_input_len(data: &[u8]) -> Result<(), DecodeError> {
    if data.len() > MAX_DECODE_LEN {
        return Err(DecodeError::LengthExceedsLimit { field: "input", len: data.len(), max: MAX_DECODE_LEN });
    }
    Ok(())
}

fn reader_at<'a>(data: &'a [u8], offset: usize) -> Result<Reader<'a>, DecodeError> {
    let tail = data
        .get(offset..)
        .ok_or(DecodeError::OffsetOutOfBounds { offset, len: data.len() })?;
    Ok(Reader::new(tail))
}

/// Decodes the value of type `ty` whose encoding starts at `offset`.
fn decode_at(ty: &AbiType, data: &[u8], offset: usize) -> Result<AbiValue, DecodeError> {
    match ty {
        AbiType::Bytes => {
            let mut reader = reader_at(data, offset)?;
            let len = read_bounded_len(&mut reader, "bytes.len", MAX_BYTES_LEN)?;
            Ok(AbiValue::Bytes(reader.read_right_padded(len, "bytes")?.to_vec()))
        }
        AbiType::String => {
            let mut reader = reader_at(data, offset)?;
            let len = read_bounded_len(&mut reader, "string.len", MAX_BYTES_LEN)?;
            let raw = reader.read_right_padded(len, "string")?;
            let s = std::str::from_utf8(raw).map_err(|_| DecodeError::InvalidUtf8)?;
            Ok(AbiValue::String(s.to_string()))
        }
        AbiType::Array(inner) => {
            let mut reader = reader_at(data, offset)?;
            let len = read_bounded_len(&mut reader, "array.len", MAX_ARRAY_LEN)?;
            let elems = decode_sequence(std::iter::repeat_n(inner.as_ref(), len), data, offset + WORD_SIZE)?;
            Ok(AbiValue::Array(elems))
        }
        AbiType::FixedArray(inner, len) => {
            check_slots(ty)?;
            let elems = decode_sequence(std::iter::repeat_n(inner.as_ref(), *len), data, offset)?;
            Ok(AbiValue::Array(elems))
        }
        AbiType::Tuple(members) => Ok(AbiValue::Tuple(decode_sequence(members.iter(), data, offset)?)),
        _ => {
            let mut reader = reader_at(data, offset)?;
            let word = reader.read_word("word")?;
            decode_word(ty, word)
        }
    }
}

/// Rejects fixed-size types built without the grammar's slot limit.
fn check_slots(ty: &AbiType) -> Result<(), DecodeError> {
    let slots = ty.slot_count();
    if slots > MAX_STATIC_SLOTS {
        return Err(DecodeError::LengthExceedsLimit { field: "fixed array", len: slots, max: MAX_STATIC_SLOTS });
    }
    Ok(())
}

fn read_bounded_len(reader: &mut Reader<'_>, field: &'static str, max: usize) -> Result<usize, DecodeError> {
    let word = reader.read_word(field)?;
    let len = be_to_u128(word)?;
    match usize::try_from(len) {
        Ok(len) if len <= max => Ok(len),
        _ => Err(DecodeError::LengthExceedsLimit {
            field,
            len: usize::try_from(len).unwrap_or(usize::MAX),
            max,
        }),
    }
}

fn decode_sequence<'t>(
    types: impl Iterator<Item = &'t AbiType>,
    data: &[u8],
    base: usize,
) -> Result<Vec<AbiValue>, DecodeError> {
    let mut values = Vec::new();
    let mut cursor = base;
    for ty in types {
        if ty.is_dynamic() {
            let mut reader = reader_at(data, cursor)?;
            let relative = reader.read_len_word("offset")?;
            let target = base
                .checked_add(relative)
                .filter(|t| *t <= data.len())
                .ok_or(DecodeError::OffsetOutOfBounds { offset: relative, len: data.len() })?;
            values.push(decode_at(ty, data, target)?);
            cursor += WORD_SIZE;
        } else {
            values.push(decode_at(ty, data, cursor)?);
            cursor = cursor.saturating_add(ty.head_size());
        }
    }
    Ok(values)
}

/// Decodes one static word.
fn decode_word(ty: &AbiType, word: &[u8; WORD_SIZE]) -> Result<AbiValue, DecodeError> {
    match ty {
        AbiType::Uint(bits) => {
            let v = be_to_u128(word)?;
            check_decoded_uint(ty, *bits, v)?;
            Ok(AbiValue::Uint(v))
        }
        AbiType::Int(bits) => {
            let v = be_to_i128(word)?;
            check_decoded_int(ty, *bits, v)?;
            Ok(AbiValue::Int(v))
        }
        AbiType::Ufixed { bits, decimals } => {
            let v = be_to_u128(word)?;
            check_decoded_uint(ty, *bits, v)?;
            let v = i128::try_from(v).map_err(|_| DecodeError::PrecisionOverflow { decimals: *decimals })?;
            Ok(AbiValue::Fixed(unscale(v, *decimals)?))
        }
        AbiType::Fixed { bits, decimals } => {
            let v = be_to_i128(word)?;
            check_decoded_int(ty, *bits, v)?;
            Ok(AbiValue::Fixed(unscale(v, *decimals)?))
        }
        AbiType::Bool => match be_to_u128(word) {
            Ok(0) => Ok(AbiValue::Bool(false)),
            Ok(1) => Ok(AbiValue::Bool(true)),
            _ => Err(DecodeError::InvalidBool),
        },
        AbiType::Address => {
            if word[..12].iter().any(|b| *b != 0) {
                return Err(DecodeError::NonZeroPadding { context: "address" });
            }
            let mut addr = [0u8; 20];
            addr.copy_from_slice(&word[12..]);
            Ok(AbiValue::Address(addr))
        }
        AbiType::FixedBytes(size) => {
            let size = usize::from(*size);
            if word[size..].iter().any(|b| *b != 0) {
                return Err(DecodeError::NonZeroPadding { context: "fixed bytes" });
            }
            Ok(AbiValue::FixedBytes(word[..size].to_vec()))
        }
        _ => Err(DecodeError::OutOfRange { abi_type: ty.to_string() }),
    }
}

fn check_decoded_uint(ty: &AbiType, bits: u16, v: u128) -> Result<(), DecodeError> {
    if bits < 128 && v >> bits != 0 {
        return Err(DecodeError::OutOfRange { abi_type: ty.to_string() });
    }
    Ok(())
}

fn check_decoded_int(ty: &AbiType, bits: u16, v: i128) -> Result<(), DecodeError> {
    if bits < 128 {
        let min = -(1i128 << (bits - 1));
        let max = (1i128 << (bits - 1)) - 1;
        if v < min || v > max {
            return Err(DecodeError::OutOfRange { abi_type: ty.to_string() });
        }
    }
    Ok(())
}

/// Converts a scaled integer back to a decimal with `decimals` places.
pub(crate) fn unscale(v: i128, decimals: u8) -> Result<Decimal, DecodeError> {
    if u32::from(decimals) > MAX_DECIMAL_SCALE {
        return Err(DecodeError::PrecisionOverflow { decimals });
    }
    Decimal::try_from_i128_with_scale(v, u32::from(decimals))
        .map_err(|_| DecodeError::PrecisionOverflow { decimals })
}

/// Decodes a single value in the packed layout.
///
/// Types with a fixed packed width require input of exactly that width.
/// `bytes` and `string` consume the whole input. A dynamic array of static
/// elements consumes whole words.
pub fn decode_packed(ty: &AbiType, data: &[u8]) -> Result<AbiValue, DecodeError> {
    check_input_len(data)?;
    check_slots(ty)?;
    if let Some(width) = ty.packed_width() {
        if data.len() != width {
            return Err(DecodeError::LengthMismatch { expected: width, found: data.len() });
        }
        return decode_packed_static(ty, data);
    }

    match ty {
        AbiType::Bytes => {
            if data.len() > MAX_BYTES_LEN {
                return Err(DecodeError::LengthExceedsLimit { field: "bytes", len: data.len(), max: MAX_BYTES_LEN });
            }
            Ok(AbiValue::Bytes(data.to_vec()))
        }
        AbiType::String => {
            if data.len() > MAX_BYTES_LEN {
                return Err(DecodeError::LengthExceedsLimit { field: "string", len: data.len(), max: MAX_BYTES_LEN });
            }
            let s = std::str::from_utf8(data).map_err(|_| DecodeError::InvalidUtf8)?;
            Ok(AbiValue::String(s.to_string()))
        }
        AbiType::Array(inner) if !inner.is_dynamic() && inner.head_size() > 0 => {
            check_slots(inner)?;
            let size = inner.head_size();
            if data.len() % size != 0 {
                return Err(DecodeError::LengthMismatch {
                    expected: data.len() - data.len() % size,
                    found: data.len(),
                });
            }
            let len = data.len() / size;
            if len > MAX_ARRAY_LEN {
                return Err(DecodeError::LengthExceedsLimit { field: "array.len", len, max: MAX_ARRAY_LEN });
            }
            let elems = decode_sequence(std::iter::repeat_n(inner.as_ref(), len), data, 0)?;
            Ok(AbiValue::Array(elems))
        }
        _ => Err(DecodeError::UnsupportedPacked { abi_type: ty.to_string() }),
    }
}

/// Decodes a packed value whose input has exactly the type's packed width.
fn decode_packed_static(ty: &AbiType, data: &[u8]) -> Result<AbiValue, DecodeError> {
    match ty {
        AbiType::Uint(_) => Ok(AbiValue::Uint(be_to_u128(data)?)),
        AbiType::Int(_) => Ok(AbiValue::Int(be_to_i128(data)?)),
        AbiType::Ufixed { decimals, .. } => {
            let v = be_to_u128(data)?;
            let v = i128::try_from(v).map_err(|_| DecodeError::PrecisionOverflow { decimals: *decimals })?;
            Ok(AbiValue::Fixed(unscale(v, *decimals)?))
        }
        AbiType::Fixed { decimals, .. } => Ok(AbiValue::Fixed(unscale(be_to_i128(data)?, *decimals)?)),
        AbiType::Bool => match data {
            [0] => Ok(AbiValue::Bool(false)),
            [1] => Ok(AbiValue::Bool(true)),
            _ => Err(DecodeError::InvalidBool),
        },
        AbiType::Address => {
            let mut addr = [0u8; 20];
            addr.copy_from_slice(data);
            Ok(AbiValue::Address(addr))
        }
        AbiType::FixedBytes(_) => Ok(AbiValue::FixedBytes(data.to_vec())),
        AbiType::FixedArray(inner, len) => {
            check_slots(ty)?;
            let elems = decode_sequence(std::iter::repeat_n(inner.as_ref(), *len), data, 0)?;
            Ok(AbiValue::Array(elems))
        }
        AbiType::Tuple(members) => {
            let mut values = Vec::with_capacity(members.len());
            let mut rest = data;
            for member in members {
                let width = member
                    .packed_width()
                    .ok_or_else(|| DecodeError::UnsupportedPacked { abi_type: member.to_string() })?;
                let (head, tail) = rest.split_at(width);
                values.push(decode_packed_static(member, head)?);
                rest = tail;
            }
            Ok(AbiValue::Tuple(values))
        }
        _ => Err(DecodeError::UnsupportedPacked { abi_type: ty.to_string() }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::format_hex;

    fn ty(s: &str) -> AbiType {
        AbiType::parse(s).unwrap()
    }

    fn word(v: u128) -> String {
        format!("{:064x}", v)
    }

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn test_uint_word() {
        let bytes = encode_value(&ty("uint256"), &AbiValue::Uint(156)).unwrap();
        assert_eq!(format_hex(&bytes), word(156));
        assert_eq!(decode_value(&ty("uint256"), &bytes).unwrap(), AbiValue::Uint(156));
    }

    #[test]
    fn test_top_level_string_has_no_offset() {
        let bytes = encode_value(&ty("string"), &AbiValue::from("Morphware")).unwrap();
        let expected = format!("{}{}", word(9), "4d6f72706877617265".to_string() + &"00".repeat(23));
        assert_eq!(format_hex(&bytes), expected);
        assert_eq!(decode_value(&ty("string"), &bytes).unwrap(), AbiValue::from("Morphware"));
    }

    #[test]
    fn test_params_layout() {
        let types = vec![ty("uint256")];
        let bytes = encode_params(&types, &[AbiValue::Uint(1)]).unwrap();
        assert_eq!(format_hex(&bytes), word(1));

        let types = vec![ty("string"), ty("bytes")];
        let values = vec![AbiValue::from("Morphware"), AbiValue::Bytes(encode_params(&[ty("uint256")], &[AbiValue::Uint(1)]).unwrap())];
        let bytes = encode_params(&types, &values).unwrap();
        let hex = format_hex(&bytes);
        assert_eq!(&hex[..64], word(0x40));
        assert_eq!(&hex[64..128], word(0x80));
        assert_eq!(&hex[128..192], word(9));
        assert_eq!(&hex[256..320], word(32));
        assert_eq!(&hex[320..384], word(1));
        assert_eq!(bytes.len(), 192);
        assert_eq!(decode_params(&types, &bytes).unwrap(), values);
    }

    #[test]
    fn test_complex_nested_roundtrip() {
        let t = ty("(int8,bytes,ufixed32x9,bool[])[2]");
        let value = AbiValue::Array(vec![
            AbiValue::Tuple(vec![
                AbiValue::Int(1),
                AbiValue::Bytes(b"hello".to_vec()),
                AbiValue::Fixed(dec("1.123456789")),
                AbiValue::Array(vec![AbiValue::Bool(true), AbiValue::Bool(false)]),
            ]),
            AbiValue::Tuple(vec![
                AbiValue::Int(-5),
                AbiValue::Bytes(vec![]),
                AbiValue::Fixed(dec("0.5")),
                AbiValue::Array(vec![]),
            ]),
        ]);
        let bytes = encode_value(&t, &value).unwrap();
        let decoded = decode_value(&t, &bytes).unwrap();

        let AbiValue::Array(elems) = &decoded else { panic!("expected array") };
        let AbiValue::Tuple(first) = &elems[0] else { panic!("expected tuple") };
        assert_eq!(first[0], AbiValue::Int(1));
        assert_eq!(first[1], AbiValue::Bytes(b"hello".to_vec()));
        assert_eq!(first[2].as_decimal().unwrap(), dec("1.123456789"));
        let AbiValue::Tuple(second) = &elems[1] else { panic!("expected tuple") };
        assert_eq!(second[0], AbiValue::Int(-5));
        assert_eq!(second[2].as_decimal().unwrap(), dec("0.5"));
        assert_eq!(second[3], AbiValue::Array(vec![]));
    }

    #[test]
    fn test_uint_array() {
        let t = ty("uint256[]");
        let value = AbiValue::Array(vec![AbiValue::Uint(3), AbiValue::Uint(7)]);
        let bytes = encode_value(&t, &value).unwrap();
        assert_eq!(format_hex(&bytes), format!("{}{}{}", word(2), word(3), word(7)));
        assert_eq!(decode_value(&t, &bytes).unwrap(), value);
    }

    #[test]
    fn test_fixed_strict_decimals() {
        let t = ty("ufixed256x9");
        let bytes = encode_value(&t, &AbiValue::Fixed(Decimal::ONE)).unwrap();
        assert!(format_hex(&bytes).ends_with("3b9aca00"));

        let err = encode_value(&ty("ufixed64x2"), &AbiValue::Fixed(dec("1.234"))).unwrap_err();
        assert_eq!(err, EncodeError::TooManyDecimals { decimals: 2 });

        // Trailing zeros do not count as extra precision.
        assert!(encode_value(&ty("ufixed64x2"), &AbiValue::Fixed(dec("1.2300"))).is_ok());

        let err = encode_value(&ty("ufixed64x2"), &AbiValue::Fixed(dec("-1"))).unwrap_err();
        assert!(matches!(err, EncodeError::Negative { .. }));

        let err = encode_value(&ty("ufixed256x40"), &AbiValue::Fixed(Decimal::ONE)).unwrap_err();
        assert_eq!(err, EncodeError::PrecisionOverflow { decimals: 40 });
    }

    #[test]
    fn test_signed_fixed() {
        let t = ty("fixed128x4");
        let bytes = encode_value(&t, &AbiValue::Fixed(dec("-2.5"))).unwrap();
        assert_eq!(decode_value(&t, &bytes).unwrap().as_decimal().unwrap(), dec("-2.5"));
    }

    #[test]
    fn test_integer_ranges() {
        assert!(matches!(
            encode_value(&ty("uint8"), &AbiValue::Uint(256)),
            Err(EncodeError::IntegerOutOfRange { .. })
        ));
        assert!(matches!(
            encode_value(&ty("int8"), &AbiValue::Int(-129)),
            Err(EncodeError::IntegerOutOfRange { .. })
        ));
        assert!(encode_value(&ty("int8"), &AbiValue::Int(-128)).is_ok());
        assert!(matches!(
            encode_value(&ty("uint8"), &AbiValue::Int(-1)),
            Err(EncodeError::Negative { .. })
        ));

        // A word that is valid uint256 but does not fit uint8.
        let bytes = encode_value(&ty("uint256"), &AbiValue::Uint(300)).unwrap();
        assert!(matches!(decode_value(&ty("uint8"), &bytes), Err(DecodeError::OutOfRange { .. })));

        let mut wide = [0u8; 32];
        wide[0] = 1;
        assert_eq!(decode_value(&ty("uint256"), &wide), Err(DecodeError::IntegerOverflow));
    }

    #[test]
    fn test_type_mismatch() {
        let err = encode_value(&ty("string"), &AbiValue::Uint(1)).unwrap_err();
        assert_eq!(err, EncodeError::TypeMismatch { abi_type: "string".into(), found: "uint" });

        let err = encode_value(&ty("uint8[2]"), &AbiValue::Array(vec![AbiValue::Uint(1)])).unwrap_err();
        assert_eq!(err, EncodeError::ArrayLengthMismatch { expected: 2, found: 1 });

        let err = encode_value(&ty("bytes4"), &AbiValue::FixedBytes(vec![1, 2])).unwrap_err();
        assert_eq!(err, EncodeError::FixedBytesLength { expected: 4, found: 2 });
    }

    #[test]
    fn test_address_and_fixed_bytes() {
        let addr = [0x88u8; 20];
        let bytes = encode_value(&ty("address"), &AbiValue::Address(addr)).unwrap();
        assert_eq!(&bytes[..12], &[0u8; 12]);
        assert_eq!(decode_value(&ty("address"), &bytes).unwrap(), AbiValue::Address(addr));

        let bytes = encode_value(&ty("bytes3"), &AbiValue::FixedBytes(vec![1, 2, 3])).unwrap();
        assert_eq!(&bytes[..4], &[1, 2, 3, 0]);
        assert_eq!(decode_value(&ty("bytes3"), &bytes).unwrap(), AbiValue::FixedBytes(vec![1, 2, 3]));
    }

    #[test]
    fn test_decode_bounds() {
        assert!(matches!(decode_value(&ty("uint256"), &[0u8; 31]), Err(DecodeError::UnexpectedEof { .. })));

        // String claiming more bytes than present.
        let mut data = Vec::new();
        data.extend_from_slice(&encode_value(&ty("uint256"), &AbiValue::Uint(64)).unwrap());
        data.extend_from_slice(&[0u8; 32]);
        assert!(matches!(decode_value(&ty("string"), &data), Err(DecodeError::UnexpectedEof { .. })));

        // Offset pointing past the end.
        let data = encode_value(&ty("uint256"), &AbiValue::Uint(4096)).unwrap();
        assert!(matches!(
            decode_params(&[ty("string")], &data),
            Err(DecodeError::OffsetOutOfBounds { .. })
        ));

        let huge = encode_value(&ty("uint256"), &AbiValue::Uint(u128::from(u32::MAX))).unwrap();
        assert!(matches!(decode_value(&ty("bytes"), &huge), Err(DecodeError::LengthExceedsLimit { .. })));

        let bad_bool = encode_value(&ty("uint256"), &AbiValue::Uint(2)).unwrap();
        assert_eq!(decode_value(&ty("bool"), &bad_bool), Err(DecodeError::InvalidBool));
    }

    #[test]
    fn test_packed_scalars() {
        let bytes = encode_packed(&ty("ufixed64x6"), &AbiValue::Fixed(dec("2.123457"))).unwrap();
        assert_eq!(format_hex(&bytes), "00000000002066c1");
        assert_eq!(
            decode_packed(&ty("ufixed64x6"), &bytes).unwrap().as_decimal().unwrap(),
            dec("2.123457")
        );

        assert_eq!(encode_packed(&ty("bool"), &AbiValue::Bool(true)).unwrap(), vec![1]);
        assert_eq!(encode_packed(&ty("int16"), &AbiValue::Int(-2)).unwrap(), vec![0xff, 0xfe]);
        assert_eq!(decode_packed(&ty("int16"), &[0xff, 0xfe]).unwrap(), AbiValue::Int(-2));
        assert_eq!(encode_packed(&ty("string"), &AbiValue::from("ab")).unwrap(), b"ab".to_vec());
        assert_eq!(decode_packed(&ty("string"), b"ab").unwrap(), AbiValue::from("ab"));
    }

    #[test]
    fn test_packed_length_checked() {
        let err = decode_packed(&ty("ufixed64x6"), &[0u8; 32]).unwrap_err();
        assert_eq!(err, DecodeError::LengthMismatch { expected: 8, found: 32 });
        let err = decode_packed(&ty("(uint8,bool)"), &[0u8; 3]).unwrap_err();
        assert_eq!(err, DecodeError::LengthMismatch { expected: 2, found: 3 });
    }

    #[test]
    fn test_packed_composites() {
        let t = ty("(uint8,bool,bytes2)");
        let value = AbiValue::Tuple(vec![AbiValue::Uint(7), AbiValue::Bool(true), AbiValue::FixedBytes(vec![9, 9])]);
        let bytes = encode_packed(&t, &value).unwrap();
        assert_eq!(bytes, vec![7, 1, 9, 9]);
        assert_eq!(decode_packed(&t, &bytes).unwrap(), value);

        let t = ty("uint8[]");
        let value = AbiValue::Array(vec![AbiValue::Uint(1), AbiValue::Uint(2)]);
        let bytes = encode_packed(&t, &value).unwrap();
        assert_eq!(bytes.len(), 64);
        assert_eq!(decode_packed(&t, &bytes).unwrap(), value);

        let err = encode_packed(&ty("string[]"), &AbiValue::Array(vec![])).unwrap_err();
        assert!(matches!(err, EncodeError::DynamicInPacked { .. }));
        assert!(matches!(
            decode_packed(&ty("(uint8,string)"), b"xx"),
            Err(DecodeError::UnsupportedPacked { .. })
        ));
    }

    #[test]
    fn test_oversized_fixed_arrays_fail_cleanly() {
        let huge = AbiType::FixedArray(Box::new(AbiType::Uint(256)), u32::MAX as usize);
        let err = encode_value(&huge, &AbiValue::Array(vec![])).unwrap_err();
        assert_eq!(err, EncodeError::ArrayLengthMismatch { expected: u32::MAX as usize, found: 0 });
        assert!(matches!(decode_value(&huge, &[]), Err(DecodeError::LengthExceedsLimit { .. })));

        let empty_tuples = AbiType::FixedArray(Box::new(AbiType::Tuple(vec![])), u32::MAX as usize);
        assert!(matches!(decode_value(&empty_tuples, &[]), Err(DecodeError::LengthExceedsLimit { .. })));

        let nested = AbiType::FixedArray(Box::new(huge.clone()), u32::MAX as usize);
        assert!(matches!(decode_packed(&nested, &[0u8; 4]), Err(DecodeError::LengthExceedsLimit { .. })));
        assert!(matches!(
            decode_packed(&ty("()[]"), &[0u8; 4]),
            Err(DecodeError::UnsupportedPacked { .. })
        ));
    }
}
