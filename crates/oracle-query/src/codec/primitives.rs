//! Word-level primitives for the ABI wire format.
//!
//! ABI encoding works in 32-byte words: integers are left-padded big-endian
//! (sign-extended for signed types), byte strings are right-padded with
//! zeros to a word boundary.

use crate::error::DecodeError;
use crate::limits::WORD_SIZE;

/// Number of zero bytes needed to pad `len` to a word boundary.
pub fn padding_for(len: usize) -> usize {
    (WORD_SIZE - len % WORD_SIZE) % WORD_SIZE
}

// =============================================================================
// WRITER
// =============================================================================

/// Append-only output buffer.
#[derive(Debug, Default, Clone)]
pub struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self { buf: Vec::with_capacity(capacity) }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    /// Writes raw bytes with no padding.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Writes an unsigned integer as one left-padded word.
    pub fn write_uint_word(&mut self, value: u128) {
        self.buf.extend_from_slice(&[0u8; WORD_SIZE - 16]);
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    /// Writes a signed integer as one sign-extended word.
    pub fn write_int_word(&mut self, value: i128) {
        let fill = if value < 0 { 0xff } else { 0x00 };
        self.buf.extend_from_slice(&[fill; WORD_SIZE - 16]);
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    /// Writes a length or offset word.
    pub fn write_len_word(&mut self, len: usize) {
        self.write_uint_word(len as u128);
    }

    /// Writes bytes right-padded with zeros to a word boundary.
    pub fn write_right_padded(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
        self.buf.resize(self.buf.len() + padding_for(bytes.len()), 0);
    }

    /// Writes bytes left-padded with zeros to a full word.
    ///
    /// `bytes` must not exceed one word.
    pub fn write_left_padded(&mut self, bytes: &[u8]) {
        let pad = WORD_SIZE.saturating_sub(bytes.len());
        self.buf.resize(self.buf.len() + pad, 0);
        self.buf.extend_from_slice(bytes);
    }

    /// Writes the low `width` bytes of an unsigned integer, big-endian.
    pub fn write_uint_packed(&mut self, value: u128, width: usize) {
        write_be_packed(&mut self.buf, &value.to_be_bytes(), 0x00, width);
    }

    /// Writes the low `width` bytes of a two's-complement integer, big-endian.
    pub fn write_int_packed(&mut self, value: i128, width: usize) {
        let fill = if value < 0 { 0xff } else { 0x00 };
        write_be_packed(&mut self.buf, &value.to_be_bytes(), fill, width);
    }
}

fn write_be_packed(buf: &mut Vec<u8>, be: &[u8; 16], fill: u8, width: usize) {
    if width > be.len() {
        buf.resize(buf.len() + (width - be.len()), fill);
        buf.extend_from_slice(be);
    } else {
        buf.extend_from_slice(&be[be.len() - width..]);
    }
}

// =============================================================================
// READER
// =============================================================================

/// Cursor over an input slice.
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Reads `len` bytes.
    pub fn read_bytes(&mut self, len: usize, context: &'static str) -> Result<&'a [u8], DecodeError> {
        if self.remaining() < len {
            return Err(DecodeError::UnexpectedEof { context });
        }
        let out = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(out)
    }

    /// Reads one 32-byte word.
    pub fn read_word(&mut self, context: &'static str) -> Result<&'a [u8; WORD_SIZE], DecodeError> {
        let bytes = self.read_bytes(WORD_SIZE, context)?;
        bytes.try_into().map_err(|_| DecodeError::UnexpectedEof { context })
    }

    /// Reads a word holding a length or offset.
    pub fn read_len_word(&mut self, context: &'static str) -> Result<usize, DecodeError> {
        let word = self.read_word(context)?;
        word_to_usize(word, self.data.len())
    }

    /// Reads `len` bytes followed by zero padding to a word boundary.
    pub fn read_right_padded(&mut self, len: usize, context: &'static str) -> Result<&'a [u8], DecodeError> {
        let out = self.read_bytes(len, context)?;
        let pad = self.read_bytes(padding_for(len), context)?;
        if pad.iter().any(|b| *b != 0) {
            return Err(DecodeError::NonZeroPadding { context });
        }
        Ok(out)
    }
}

// =============================================================================
// WORD CONVERSIONS
// =============================================================================

/// Interprets a big-endian unsigned integer of any width.
///
/// Fails with `IntegerOverflow` if the value needs more than 128 bits.
pub fn be_to_u128(bytes: &[u8]) -> Result<u128, DecodeError> {
    let split = bytes.len().saturating_sub(16);
    let (high, low) = bytes.split_at(split);
    if high.iter().any(|b| *b != 0) {
        return Err(DecodeError::IntegerOverflow);
    }
    let mut buf = [0u8; 16];
    buf[16 - low.len()..].copy_from_slice(low);
    Ok(u128::from_be_bytes(buf))
}

/// Interprets a big-endian two's-complement integer of any width.
///
/// Fails with `IntegerOverflow` if the value needs more than 128 bits.
pub fn be_to_i128(bytes: &[u8]) -> Result<i128, DecodeError> {
    let negative = bytes.first().is_some_and(|b| b & 0x80 != 0);
    let fill = if negative { 0xff } else { 0x00 };
    let split = bytes.len().saturating_sub(16);
    let (high, low) = bytes.split_at(split);
    if high.iter().any(|b| *b != fill) {
        return Err(DecodeError::IntegerOverflow);
    }
    let mut buf = [fill; 16];
    buf[16 - low.len()..].copy_from_slice(low);
    let value = i128::from_be_bytes(buf);
    // Truncation must not flip the sign.
    if !high.is_empty() && (value < 0) != negative {
        return Err(DecodeError::IntegerOverflow);
    }
    Ok(value)
}

/// Interprets a length/offset word, bounding it by the input size.
fn word_to_usize(word: &[u8; WORD_SIZE], input_len: usize) -> Result<usize, DecodeError> {
    let value = be_to_u128(word)?;
    usize::try_from(value)
        .ok()
        .filter(|v| *v <= input_len)
        .ok_or(DecodeError::OffsetOutOfBounds {
            offset: usize::try_from(value).unwrap_or(usize::MAX),
            len: input_len,
        })
}
