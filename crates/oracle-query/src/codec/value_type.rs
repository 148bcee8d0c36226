//! Response codecs.
//!
//! A [`ValueType`] pairs an ABI type with a packed flag and encodes values
//! of that type. An [`UnsignedFloatType`] specializes `ufixed<M>x<N>` for
//! plain floats: the float is quantized to N decimal places (round half to
//! even on the exact binary value) and sent as the integer `value * 10^N`.

use rust_decimal::Decimal;

use crate::codec::primitives::{be_to_u128, Writer};
use crate::codec::value::{decode_packed, decode_value, encode_packed, encode_value};
use crate::error::{DecodeError, EncodeError, FieldError, GrammarError};
use crate::limits::{MAX_DECIMAL_SCALE, WORD_SIZE};
use crate::model::{AbiType, AbiValue};
use crate::serial::{Field, Item, Serializable};

/// An ABI type together with its wire layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValueType {
    abi_type: AbiType,
    packed: bool,
}

impl Default for ValueType {
    fn default() -> Self {
        ValueType { abi_type: AbiType::Uint(256), packed: false }
    }
}

impl ValueType {
    /// Parses and normalizes `abi_type`.
    pub fn new(abi_type: &str, packed: bool) -> Result<ValueType, GrammarError> {
        Ok(ValueType { abi_type: AbiType::parse(abi_type)?, packed })
    }

    pub fn from_parsed(abi_type: AbiType, packed: bool) -> ValueType {
        ValueType { abi_type, packed }
    }

    /// The canonical type string.
    pub fn abi_type(&self) -> String {
        self.abi_type.to_string()
    }

    pub fn parsed(&self) -> &AbiType {
        &self.abi_type
    }

    pub fn packed(&self) -> bool {
        self.packed
    }

    pub fn encode(&self, value: &AbiValue) -> Result<Vec<u8>, EncodeError> {
        if self.packed {
            encode_packed(&self.abi_type, value)
        } else {
            encode_value(&self.abi_type, value)
        }
    }

    pub fn decode(&self, bytes: &[u8]) -> Result<AbiValue, DecodeError> {
        if self.packed {
            decode_packed(&self.abi_type, bytes)
        } else {
            decode_value(&self.abi_type, bytes)
        }
    }
}

impl Serializable for ValueType {
    const TYPE: &'static str = "ValueType";
    const FIELDS: &'static [Field] = &[Field::required("abi_type"), Field::optional("packed")];

    fn get(&self, field: &str) -> Option<Item> {
        match field {
            "abi_type" => Some(Item::Str(self.abi_type())),
            "packed" => Some(Item::Bool(self.packed)),
            _ => None,
        }
    }

    fn set(&mut self, field: &str, value: Item) -> Result<(), FieldError> {
        match field {
            "abi_type" => {
                let raw = value.into_string()?;
                self.abi_type = AbiType::parse(&raw).map_err(|e| FieldError::Invalid { reason: e.to_string() })?;
            }
            "packed" => self.packed = value.into_bool()?,
            _ => return Err(FieldError::Unknown { field: field.to_string() }),
        }
        Ok(())
    }
}

/// A float quantized to a fixed number of decimals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quantized {
    /// The float times `10^decimals`, rounded half to even.
    pub scaled: u128,
    pub decimals: u8,
    /// True if quantization changed the float's exact value.
    pub rounded: bool,
}

impl Quantized {
    /// The quantized value as a decimal, if its mantissa fits 96 bits.
    pub fn to_decimal(&self) -> Option<Decimal> {
        let mantissa = i128::try_from(self.scaled).ok()?;
        Decimal::try_from_i128_with_scale(mantissa, u32::from(self.decimals)).ok()
    }
}

/// Result of encoding a float.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedFloat {
    pub bytes: Vec<u8>,
    /// The value actually encoded.
    pub quantized: Quantized,
    /// True if the input lost precision.
    pub rounded: bool,
}

/// Codec for non-negative floats over a `ufixed<M>x<N>` type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnsignedFloatType {
    value_type: ValueType,
    bits: u16,
    decimals: u8,
}

impl Default for UnsignedFloatType {
    fn default() -> Self {
        UnsignedFloatType {
            value_type: ValueType::from_parsed(AbiType::Ufixed { bits: 256, decimals: 6 }, false),
            bits: 256,
            decimals: 6,
        }
    }
}

impl UnsignedFloatType {
    /// Parses `abi_type`, which must be an unsigned fixed-point type.
    pub fn new(abi_type: &str, packed: bool) -> Result<UnsignedFloatType, GrammarError> {
        let value_type = ValueType::new(abi_type, packed)?;
        let (bits, decimals) = value_type
            .parsed()
            .ufixed_params()
            .ok_or_else(|| GrammarError::NotUnsignedFixed { abi_type: value_type.abi_type() })?;
        Ok(UnsignedFloatType { value_type, bits, decimals })
    }

    pub(crate) const fn builtin(bits: u16, decimals: u8, packed: bool) -> UnsignedFloatType {
        UnsignedFloatType {
            value_type: ValueType { abi_type: AbiType::Ufixed { bits, decimals }, packed },
            bits,
            decimals,
        }
    }

    /// The underlying value type.
    pub fn value_type(&self) -> &ValueType {
        &self.value_type
    }

    pub fn bits(&self) -> u16 {
        self.bits
    }

    pub fn decimals(&self) -> u8 {
        self.decimals
    }

    /// Quantizes `value` without encoding it.
    ///
    /// Rounding is exact: the float is split into `mantissa * 2^exponent`
    /// and `mantissa * 10^N` is shifted in integer arithmetic, so ties are
    /// broken on the float's true binary value.
    pub fn quantize(&self, value: f64) -> Result<Quantized, EncodeError> {
        if !value.is_finite() {
            return Err(EncodeError::NotFinite);
        }
        if value < 0.0 {
            return Err(EncodeError::Negative { abi_type: self.value_type.abi_type() });
        }
        let decimals = self.decimals;
        if u32::from(decimals) > MAX_DECIMAL_SCALE {
            return Err(EncodeError::PrecisionOverflow { decimals });
        }
        let out_of_range = || EncodeError::IntegerOutOfRange { abi_type: self.value_type.abi_type() };

        // mantissa < 2^53 and 5^28 < 2^66, so the product fits.
        let (mantissa, exponent) = decompose(value);
        let numerator = u128::from(mantissa) * 5u128.pow(u32::from(decimals));
        let shift = exponent + i32::from(decimals);

        let (scaled, rounded) = if numerator == 0 {
            (0, false)
        } else if shift >= 0 {
            let shift = shift.unsigned_abs();
            if shift >= 128 || numerator.leading_zeros() < shift {
                return Err(out_of_range());
            }
            (numerator << shift, false)
        } else {
            shift_right_half_even(numerator, shift.unsigned_abs())
        };

        if self.bits < 128 && scaled >> self.bits != 0 {
            return Err(out_of_range());
        }
        Ok(Quantized { scaled, decimals, rounded })
    }

    pub fn encode(&self, value: f64) -> Result<EncodedFloat, EncodeError> {
        let quantized = self.quantize(value)?;
        let mut w = Writer::new();
        if self.value_type.packed {
            w.write_uint_packed(quantized.scaled, usize::from(self.bits) / 8);
        } else {
            w.write_uint_word(quantized.scaled);
        }
        Ok(EncodedFloat { bytes: w.into_bytes(), quantized, rounded: quantized.rounded })
    }

    /// Decodes the scaled integer and divides by `10^decimals`.
    pub fn decode(&self, bytes: &[u8]) -> Result<f64, DecodeError> {
        let expected = if self.value_type.packed { usize::from(self.bits) / 8 } else { WORD_SIZE };
        if bytes.len() != expected {
            return Err(DecodeError::LengthMismatch { expected, found: bytes.len() });
        }
        let scaled = be_to_u128(bytes)?;
        Ok(scaled as f64 / 10f64.powi(i32::from(self.decimals)))
    }
}

/// Splits a finite, non-negative float into `(mantissa, exponent)` with
/// `value == mantissa * 2^exponent` exactly.
fn decompose(value: f64) -> (u64, i32) {
    let bits = value.to_bits();
    let biased = ((bits >> 52) & 0x7ff) as i32;
    let fraction = bits & ((1u64 << 52) - 1);
    if biased == 0 {
        (fraction, -1074)
    } else {
        (fraction | (1u64 << 52), biased - 1075)
    }
}

/// `value / 2^shift` rounded half to even, and whether a remainder was dropped.
///
/// `value` must be below `2^127`.
fn shift_right_half_even(value: u128, shift: u32) -> (u128, bool) {
    if shift >= 128 {
        return (0, value != 0);
    }
    let quotient = value >> shift;
    let remainder = value & ((1u128 << shift) - 1);
    let half = 1u128 << (shift - 1);
    let round_up = remainder > half || (remainder == half && quotient & 1 == 1);
    (quotient + u128::from(round_up), remainder != 0)
}

impl Serializable for UnsignedFloatType {
    const TYPE: &'static str = "UnsignedFloatType";
    const FIELDS: &'static [Field] = ValueType::FIELDS;

    fn get(&self, field: &str) -> Option<Item> {
        self.value_type.get(field)
    }

    fn set(&mut self, field: &str, value: Item) -> Result<(), FieldError> {
        match field {
            "abi_type" => {
                let raw = value.into_string()?;
                let parsed = UnsignedFloatType::new(&raw, self.value_type.packed)
                    .map_err(|e| FieldError::Invalid { reason: e.to_string() })?;
                *self = parsed;
                Ok(())
            }
            _ => self.value_type.set(field, value),
        }
    }
}

/// A value submitted in response to a query.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseValue {
    Float(f64),
    Abi(AbiValue),
}

/// The declared response codec of a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseType {
    Value(ValueType),
    UnsignedFloat(UnsignedFloatType),
}

impl ResponseType {
    pub fn value_type(&self) -> &ValueType {
        match self {
            ResponseType::Value(vt) => vt,
            ResponseType::UnsignedFloat(uf) => uf.value_type(),
        }
    }

    pub fn abi_type(&self) -> String {
        self.value_type().abi_type()
    }

    pub fn packed(&self) -> bool {
        self.value_type().packed()
    }

    /// Encodes a response. Float codecs also accept exact ABI values.
    pub fn encode(&self, value: &ResponseValue) -> Result<Vec<u8>, EncodeError> {
        match (self, value) {
            (ResponseType::UnsignedFloat(uf), ResponseValue::Float(v)) => Ok(uf.encode(*v)?.bytes),
            (ResponseType::UnsignedFloat(uf), ResponseValue::Abi(v)) => uf.value_type().encode(v),
            (ResponseType::Value(vt), ResponseValue::Abi(v)) => vt.encode(v),
            (ResponseType::Value(vt), ResponseValue::Float(_)) => {
                Err(EncodeError::TypeMismatch { abi_type: vt.abi_type(), found: "float" })
            }
        }
    }

    pub fn decode(&self, bytes: &[u8]) -> Result<ResponseValue, DecodeError> {
        match self {
            ResponseType::Value(vt) => vt.decode(bytes).map(ResponseValue::Abi),
            ResponseType::UnsignedFloat(uf) => uf.decode(bytes).map(ResponseValue::Float),
        }
    }

    /// The codec as a registered entity.
    pub fn to_item(&self) -> Item {
        match self {
            ResponseType::Value(vt) => Item::entity(vt.clone()),
            ResponseType::UnsignedFloat(uf) => Item::entity(uf.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::format_hex;
    use crate::serial::{serialize, Registry};
    use proptest::prelude::*;
    use rust_decimal::RoundingStrategy;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn test_value_type_normalizes() {
        let vt = ValueType::new(" UINT[] ", false).unwrap();
        assert_eq!(vt.abi_type(), "uint256[]");
        assert!(ValueType::new("uint7", false).is_err());
        assert!(matches!(
            ValueType::new("uint256[4294967295]", false),
            Err(GrammarError::TooManySlots { .. })
        ));
    }

    #[test]
    fn test_unsigned_float_requires_ufixed() {
        let err = UnsignedFloatType::new("fixed64x6", false).unwrap_err();
        assert_eq!(err, GrammarError::NotUnsignedFixed { abi_type: "fixed64x6".into() });
        let uf = UnsignedFloatType::new("ufixed", true).unwrap();
        assert_eq!((uf.bits(), uf.decimals()), (128, 18));
    }

    #[test]
    fn test_quantize_half_even() {
        let uf = UnsignedFloatType::new("ufixed256x2", false).unwrap();
        assert_eq!(uf.quantize(0.125).unwrap().to_decimal(), Some(dec("0.12")));
        assert_eq!(uf.quantize(0.375).unwrap().to_decimal(), Some(dec("0.38")));

        let q = uf.quantize(0.5).unwrap();
        assert_eq!(q.scaled, 50);
        assert!(!q.rounded);
    }

    #[test]
    fn test_encode_reports_rounding() {
        let uf = UnsignedFloatType::new("ufixed256x6", false).unwrap();
        let out = uf.encode(2.1234567).unwrap();
        assert_eq!(out.quantized.to_decimal(), Some(dec("2.123457")));
        assert!(out.rounded);
        assert!(format_hex(&out.bytes).ends_with("2066c1"));
        assert_eq!(out.bytes.len(), 32);
        assert_eq!(uf.decode(&out.bytes).unwrap(), 2.123457);

        let out = uf.encode(99.99).unwrap();
        assert_eq!(out.quantized.scaled, 99_990_000);
        assert!(format_hex(&out.bytes).ends_with("5f5b9f0"));
    }

    #[test]
    fn test_exact_binary_value_is_rounded() {
        let uf = UnsignedFloatType::new("ufixed256x18", false).unwrap();
        assert_eq!(uf.quantize(2819.35).unwrap().to_decimal(), Some(dec("2819.349999999999909051")));
        assert_eq!(uf.quantize(0.9996).unwrap().scaled, 999_600_000_000_000_044);

        let out = uf.encode(116.7).unwrap();
        assert_eq!(
            format_hex(&out.bytes),
            "0000000000000000000000000000000000000000000000065389afb268160b1a"
        );
    }

    #[test]
    fn test_ties_break_on_binary_value() {
        let uf = UnsignedFloatType::new("ufixed256x18", false).unwrap();
        // 5e-19 is slightly above the half-way point between 0 and 1e-18.
        let q = uf.quantize(5e-19).unwrap();
        assert_eq!((q.scaled, q.rounded), (1, true));
        // The float nearest 2.5e-18 is above it; the one nearest 3.5e-18 is below.
        assert_eq!(uf.quantize(2.5e-18).unwrap().scaled, 3);
        assert_eq!(uf.quantize(3.5e-18).unwrap().scaled, 3);

        let uf = UnsignedFloatType::new("ufixed256x6", false).unwrap();
        let q = uf.quantize(1e-30).unwrap();
        assert_eq!((q.scaled, q.rounded), (0, true));
        let q = uf.quantize(0.0).unwrap();
        assert_eq!((q.scaled, q.rounded), (0, false));
        let q = uf.quantize(f64::from_bits(1)).unwrap();
        assert_eq!((q.scaled, q.rounded), (0, true));
    }

    #[test]
    fn test_wide_values_exceed_decimal() {
        let uf = UnsignedFloatType::new("ufixed256x18", false).unwrap();
        let q = uf.quantize(1.0e12).unwrap();
        assert_eq!(q.scaled, 1_000_000_000_000 * 10u128.pow(18));
        assert!(!q.rounded);
        assert_eq!(q.to_decimal(), None);
        assert_eq!(uf.decode(&uf.encode(1.0e12).unwrap().bytes).unwrap(), 1.0e12);

        // 2^128 does not fit the integer range the codec carries.
        assert!(matches!(uf.quantize(4.0e20).unwrap_err(), EncodeError::IntegerOutOfRange { .. }));
    }

    #[test]
    fn test_packed_float() {
        let uf = UnsignedFloatType::new("ufixed64x6", true).unwrap();
        let out = uf.encode(2.1234567).unwrap();
        assert_eq!(format_hex(&out.bytes), "00000000002066c1");
        assert_eq!(uf.decode(&out.bytes).unwrap(), 2.123457);
        assert_eq!(
            uf.decode(&[0u8; 32]),
            Err(DecodeError::LengthMismatch { expected: 8, found: 32 })
        );

        let unpacked = UnsignedFloatType::new("ufixed64x6", false).unwrap();
        assert_eq!(
            unpacked.decode(&out.bytes),
            Err(DecodeError::LengthMismatch { expected: 32, found: 8 })
        );
    }

    #[test]
    fn test_float_rejections() {
        let uf = UnsignedFloatType::new("ufixed64x6", false).unwrap();
        assert_eq!(uf.encode(f64::NAN).unwrap_err(), EncodeError::NotFinite);
        assert_eq!(uf.encode(f64::INFINITY).unwrap_err(), EncodeError::NotFinite);
        assert!(matches!(uf.encode(-1.0).unwrap_err(), EncodeError::Negative { .. }));
        // 2^64 / 10^6 does not fit 64 bits once scaled.
        assert!(matches!(uf.encode(2.0e13).unwrap_err(), EncodeError::IntegerOutOfRange { .. }));

        let wide = UnsignedFloatType::new("ufixed256x40", false).unwrap();
        assert_eq!(wide.encode(1.0).unwrap_err(), EncodeError::PrecisionOverflow { decimals: 40 });
    }

    #[test]
    fn test_response_type_dispatch() {
        let floats = ResponseType::UnsignedFloat(UnsignedFloatType::new("ufixed256x6", false).unwrap());
        let bytes = floats.encode(&ResponseValue::Float(1.5)).unwrap();
        assert_eq!(floats.decode(&bytes).unwrap(), ResponseValue::Float(1.5));

        let strings = ResponseType::Value(ValueType::new("string", false).unwrap());
        let bytes = strings.encode(&ResponseValue::Abi(AbiValue::from("ok"))).unwrap();
        assert_eq!(strings.decode(&bytes).unwrap(), ResponseValue::Abi(AbiValue::from("ok")));
        assert!(strings.encode(&ResponseValue::Float(1.0)).is_err());
    }

    #[test]
    fn test_codecs_are_registered_entities() {
        let mut reg = Registry::new();
        reg.register::<ValueType>().unwrap();
        reg.register::<UnsignedFloatType>().unwrap();

        let uf = UnsignedFloatType::new("ufixed64x6", true).unwrap();
        let state = serialize(&Item::entity(uf.clone())).unwrap();
        assert_eq!(
            serde_json::to_string(&state).unwrap(),
            r#"{"type":"UnsignedFloatType","abi_type":"ufixed64x6","packed":true}"#
        );
        assert_eq!(reg.deserialize_as::<UnsignedFloatType>(&state).unwrap(), uf);

        let bad = serde_json::json!({"type": "UnsignedFloatType", "abi_type": "string"});
        assert!(reg.deserialize(&bad).is_err());

        let vt: ValueType = reg
            .deserialize_as(&serde_json::json!({"type": "ValueType", "abi_type": "uint"}))
            .unwrap();
        assert_eq!(vt, ValueType::default());
    }

    /// Fixed-point types with the decimal counts exercised by the exact check.
    const FLOAT_TYPES: &[(&str, u32)] = &[
        ("ufixed256x1", 1),
        ("ufixed128x2", 2),
        ("ufixed64x6", 6),
        ("ufixed256x9", 9),
        ("ufixed256x18", 18),
        ("ufixed256x20", 20),
    ];

        proptest! {
        #[test]
        fn prop_quantize_error_bounded(v in 0.0f64..1.0e6) {
            let uf = UnsignedFloatType::new("ufixed256x6", false).unwrap();
            let out = uf.encode(v).unwrap();
            let back = uf.decode(&out.bytes).unwrap();
            prop_assert!((back - v).abs() <= 0.5e-6 + v * 1e-15);
            prop_assert_eq!(out.quantized.to_decimal().map(|d| d.scale()), Some(6));
        }

        #[test]
        fn prop_quantize_idempotent(v in 0.0f64..1.0e6) {
            let uf = UnsignedFloatType::new("ufixed64x6", true).unwrap();
            let first = uf.encode(v).unwrap();
            let again = uf.encode(uf.decode(&first.bytes).unwrap()).unwrap();
            prop_assert_eq!(first.bytes, again.bytes);
        }

        #[test]
        fn prop_quantize_matches_decimal_rounding(
            index in 0..FLOAT_TYPES.len(),
            numerator in 0i64..(1 << 20),
            power in 0u32..=20,
        ) {
            // numerator / 2^power is exact in both f64 and decimal.
            let (abi_type, decimals) = FLOAT_TYPES[index];
            let uf = UnsignedFloatType::new(abi_type, false).unwrap();
            let value = numerator as f64 / (1u64 << power) as f64;
            let exact = Decimal::from_i128_with_scale(i128::from(numerator) * 5i128.pow(power), power);

            let mut expected = exact.round_dp_with_strategy(decimals, RoundingStrategy::MidpointNearestEven);
            expected.rescale(decimals);
            let q = uf.quantize(value).unwrap();
            prop_assert_eq!(q.scaled, u128::try_from(expected.mantissa()).unwrap());
            prop_assert_eq!(q.rounded, expected != exact);

            let back = uf.decode(&uf.encode(value).unwrap().bytes).unwrap();
            let step = 10f64.powi(-(decimals as i32));
            prop_assert!((back - value).abs() <= step / 2.0 + value * 1e-15);
        }
    }
}
