//! ABI type grammar.
//!
//! Type strings follow the contract ABI grammar: a base keyword with an
//! optional width (`uint64`), an optional decimal count for fixed-point
//! types (`ufixed64x6`), array suffixes (`[]`, `[3]`) and parenthesised
//! tuples (`(int8,bytes)[2]`).
//!
//! Parsing normalizes the string: whitespace is dropped, letters are
//! lower-cased and aliases are expanded (`uint` → `uint256`,
//! `ufixed` → `ufixed128x18`, `byte` → `bytes1`, `function` → `bytes24`).

use std::fmt;
use std::str::FromStr;

use crate::error::GrammarError;
use crate::limits::{MAX_FIXED_DECIMALS, MAX_STATIC_SLOTS, MAX_TYPE_DEPTH, WORD_SIZE};

/// A parsed, validated ABI type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AbiType {
    /// Unsigned integer of the given bit width.
    Uint(u16),
    /// Signed two's-complement integer of the given bit width.
    Int(u16),
    /// Unsigned fixed-point number: `value = integer / 10^decimals`.
    Ufixed { bits: u16, decimals: u8 },
    /// Signed fixed-point number.
    Fixed { bits: u16, decimals: u8 },
    /// 20-byte account address.
    Address,
    Bool,
    /// Fixed-size byte string (1..=32 bytes).
    FixedBytes(u8),
    /// Dynamic byte string.
    Bytes,
    /// Dynamic UTF-8 string.
    String,
    /// Dynamic-length array.
    Array(Box<AbiType>),
    /// Fixed-length array.
    FixedArray(Box<AbiType>, usize),
    Tuple(Vec<AbiType>),
}

impl AbiType {
    /// Parses and validates a type string.
    pub fn parse(input: &str) -> Result<AbiType, GrammarError> {
        let normalized: String = input
            .chars()
            .filter(|c| !c.is_whitespace())
            .map(|c| c.to_ascii_lowercase())
            .collect();
        if normalized.is_empty() {
            return Err(GrammarError::Empty);
        }

        let mut parser = Parser { input: &normalized, pos: 0 };
        let ty = parser.parse_type(0)?;
        match parser.peek() {
            None => Ok(ty),
            Some(found) => Err(parser.unexpected(found)),
        }
    }

    /// Returns true if the encoding of this type has no fixed size.
    pub fn is_dynamic(&self) -> bool {
        match self {
            AbiType::Bytes | AbiType::String | AbiType::Array(_) => true,
            AbiType::FixedArray(inner, _) => inner.is_dynamic(),
            AbiType::Tuple(members) => members.iter().any(AbiType::is_dynamic),
            _ => false,
        }
    }

    /// Returns the number of bytes this type occupies in the head section
    /// of an enclosing tuple or array.
    pub fn head_size(&self) -> usize {
        if self.is_dynamic() {
            return WORD_SIZE;
        }
        match self {
            AbiType::FixedArray(inner, len) => inner.head_size().saturating_mul(*len),
            AbiType::Tuple(members) => members.iter().fold(0, |acc, m| acc.saturating_add(m.head_size())),
            _ => WORD_SIZE,
        }
    }

    /// Counts the slots of a static type: scalars and empty tuples count
    /// one, fixed arrays multiply, tuples add.
    pub fn slot_count(&self) -> usize {
        match self {
            AbiType::FixedArray(inner, len) => inner.slot_count().saturating_mul(*len),
            AbiType::Tuple(members) => members.iter().fold(0usize, |acc, m| acc.saturating_add(m.slot_count())).max(1),
            _ => 1,
        }
    }

    /// Returns the exact width of the packed encoding, if it is fixed.
    ///
    /// Array elements are word-padded in packed form, so a fixed-length
    /// array of static elements has a known width while `bytes`, `string`
    /// and dynamic arrays do not.
    pub fn packed_width(&self) -> Option<usize> {
        match self {
            AbiType::Uint(bits)
            | AbiType::Int(bits)
            | AbiType::Ufixed { bits, .. }
            | AbiType::Fixed { bits, .. } => Some(usize::from(*bits) / 8),
            AbiType::Address => Some(20),
            AbiType::Bool => Some(1),
            AbiType::FixedBytes(size) => Some(usize::from(*size)),
            AbiType::Bytes | AbiType::String | AbiType::Array(_) => None,
            AbiType::FixedArray(inner, len) => {
                if inner.is_dynamic() {
                    None
                } else {
                    inner.head_size().checked_mul(*len)
                }
            }
            AbiType::Tuple(members) => {
                members.iter().try_fold(0usize, |acc, m| acc.checked_add(m.packed_width()?))
            }
        }
    }

    /// Returns `(bits, decimals)` for `ufixed<M>x<N>` types.
    pub fn ufixed_params(&self) -> Option<(u16, u8)> {
        match self {
            AbiType::Ufixed { bits, decimals } => Some((*bits, *decimals)),
            _ => None,
        }
    }

    /// Returns a short name for the kind of type, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            AbiType::Uint(_) => "uint",
            AbiType::Int(_) => "int",
            AbiType::Ufixed { .. } => "ufixed",
            AbiType::Fixed { .. } => "fixed",
            AbiType::Address => "address",
            AbiType::Bool => "bool",
            AbiType::FixedBytes(_) => "bytesN",
            AbiType::Bytes => "bytes",
            AbiType::String => "string",
            AbiType::Array(_) => "array",
            AbiType::FixedArray(..) => "fixed array",
            AbiType::Tuple(_) => "tuple",
        }
    }
}

impl fmt::Display for AbiType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AbiType::Uint(bits) => write!(f, "uint{}", bits),
            AbiType::Int(bits) => write!(f, "int{}", bits),
            AbiType::Ufixed { bits, decimals } => write!(f, "ufixed{}x{}", bits, decimals),
            AbiType::Fixed { bits, decimals } => write!(f, "fixed{}x{}", bits, decimals),
            AbiType::Address => f.write_str("address"),
            AbiType::Bool => f.write_str("bool"),
            AbiType::FixedBytes(size) => write!(f, "bytes{}", size),
            AbiType::Bytes => f.write_str("bytes"),
            AbiType::String => f.write_str("string"),
            AbiType::Array(inner) => write!(f, "{}[]", inner),
            AbiType::FixedArray(inner, len) => write!(f, "{}[{}]", inner, len),
            AbiType::Tuple(members) => {
                f.write_str("(")?;
                for (i, member) in members.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{}", member)?;
                }
                f.write_str(")")
            }
        }
    }
}

impl FromStr for AbiType {
    type Err = GrammarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AbiType::parse(s)
    }
}

// =============================================================================
// PARSER
// =============================================================================

struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn bump(&mut self) {
        if let Some(c) = self.peek() {
            self.pos += c.len_utf8();
        }
    }

    fn expect(&mut self, want: char) -> Result<(), GrammarError> {
        match self.peek() {
            Some(c) if c == want => {
                self.bump();
                Ok(())
            }
            Some(c) => Err(self.unexpected(c)),
            None => Err(self.end()),
        }
    }

    fn unexpected(&self, found: char) -> GrammarError {
        GrammarError::UnexpectedChar {
            input: self.input.to_string(),
            pos: self.pos,
            found,
        }
    }

    fn end(&self) -> GrammarError {
        GrammarError::UnexpectedEnd { input: self.input.to_string() }
    }

    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &str {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if !pred(c) {
                break;
            }
            self.bump();
        }
        &self.input[start..self.pos]
    }

    fn take_number(&mut self) -> Result<Option<u32>, GrammarError> {
        let start = self.pos;
        let digits = self.take_while(|c| c.is_ascii_digit());
        if digits.is_empty() {
            return Ok(None);
        }
        digits.parse::<u32>().map(Some).map_err(|_| GrammarError::UnexpectedChar {
            input: self.input.to_string(),
            pos: start,
            found: self.input[start..].chars().next().unwrap_or('0'),
        })
    }

    fn parse_type(&mut self, depth: usize) -> Result<AbiType, GrammarError> {
        if depth > MAX_TYPE_DEPTH {
            return Err(GrammarError::TooDeep { max: MAX_TYPE_DEPTH });
        }

        let mut ty = match self.peek() {
            Some('(') => self.parse_tuple(depth)?,
            Some(c) if c.is_ascii_lowercase() => self.parse_basic()?,
            Some(c) => return Err(self.unexpected(c)),
            None => return Err(self.end()),
        };

        let mut dims = 0;
        while self.peek() == Some('[') {
            dims += 1;
            if depth + dims > MAX_TYPE_DEPTH {
                return Err(GrammarError::TooDeep { max: MAX_TYPE_DEPTH });
            }
            self.bump();
            let len = self.take_number()?;
            self.expect(']')?;
            ty = match len {
                None => AbiType::Array(Box::new(ty)),
                Some(0) => return Err(GrammarError::ZeroLengthArray),
                Some(n) => AbiType::FixedArray(Box::new(ty), n as usize),
            };
            let slots = ty.slot_count();
            if slots > MAX_STATIC_SLOTS {
                return Err(GrammarError::TooManySlots { slots, max: MAX_STATIC_SLOTS });
            }
        }

        Ok(ty)
    }

    fn parse_tuple(&mut self, depth: usize) -> Result<AbiType, GrammarError> {
        self.expect('(')?;
        let mut members = Vec::new();
        if self.peek() == Some(')') {
            self.bump();
            return Ok(AbiType::Tuple(members));
        }
        loop {
            members.push(self.parse_type(depth + 1)?);
            match self.peek() {
                Some(',') => self.bump(),
                Some(')') => {
                    self.bump();
                    return Ok(AbiType::Tuple(members));
                }
                Some(c) => return Err(self.unexpected(c)),
                None => return Err(self.end()),
            }
        }
    }

    fn parse_basic(&mut self) -> Result<AbiType, GrammarError> {
        let base = self.take_while(|c| c.is_ascii_lowercase()).to_string();
        let bits = self.take_number()?;
        let decimals = if bits.is_some() && self.peek() == Some('x') {
            self.bump();
            match self.take_number()? {
                Some(n) => Some(n),
                None => {
                    return match self.peek() {
                        Some(c) => Err(self.unexpected(c)),
                        None => Err(self.end()),
                    };
                }
            }
        } else {
            None
        };

        let no_suffix = |ty: AbiType| {
            if bits.is_some() {
                Err(GrammarError::UnexpectedSuffix { base: base.clone() })
            } else {
                Ok(ty)
            }
        };

        match base.as_str() {
            "uint" | "int" => {
                if decimals.is_some() {
                    return Err(GrammarError::UnexpectedSuffix { base });
                }
                let name = if base == "uint" { "uint" } else { "int" };
                let bits = validate_bits(name, bits.unwrap_or(256))?;
                Ok(if name == "uint" { AbiType::Uint(bits) } else { AbiType::Int(bits) })
            }
            "ufixed" | "fixed" => {
                let name = if base == "ufixed" { "ufixed" } else { "fixed" };
                let (bits, decimals) = match (bits, decimals) {
                    (None, _) => (128, 18),
                    (Some(_), None) => return Err(GrammarError::InvalidDecimals { decimals: 0 }),
                    (Some(m), Some(n)) => (m, n),
                };
                let bits = validate_bits(name, bits)?;
                if decimals == 0 || decimals > u32::from(MAX_FIXED_DECIMALS) {
                    return Err(GrammarError::InvalidDecimals { decimals });
                }
                let decimals = decimals as u8;
                Ok(if name == "ufixed" {
                    AbiType::Ufixed { bits, decimals }
                } else {
                    AbiType::Fixed { bits, decimals }
                })
            }
            "bytes" => {
                if decimals.is_some() {
                    return Err(GrammarError::UnexpectedSuffix { base });
                }
                match bits {
                    None => Ok(AbiType::Bytes),
                    Some(size @ 1..=32) => Ok(AbiType::FixedBytes(size as u8)),
                    Some(size) => Err(GrammarError::InvalidBytesSize { size }),
                }
            }
            "byte" => no_suffix(AbiType::FixedBytes(1)),
            "function" => no_suffix(AbiType::FixedBytes(24)),
            "address" => no_suffix(AbiType::Address),
            "bool" => no_suffix(AbiType::Bool),
            "string" => no_suffix(AbiType::String),
            _ => Err(GrammarError::UnknownBase { base }),
        }
    }
}

fn validate_bits(base: &'static str, bits: u32) -> Result<u16, GrammarError> {
    if bits == 0 || bits > 256 || bits % 8 != 0 {
        return Err(GrammarError::InvalidBits { base, bits });
    }
    Ok(bits as u16)
}
