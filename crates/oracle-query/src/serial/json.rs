//! Canonical JSON text.
//!
//! Canonical form is compact (`,` and `:` separators, no whitespace) with
//! keys in insertion order. Every character outside printable ASCII
//! (0x20..=0x7E) is escaped as `\uXXXX`, characters above the BMP as a
//! UTF-16 surrogate pair, so the UTF-8 bytes of the text are pure ASCII.

use std::io;

use serde::Serialize;
use serde_json::ser::{Formatter, Serializer};

/// Compact formatter that escapes non-ASCII and DEL.
#[derive(Debug, Default, Clone, Copy)]
pub struct AsciiFormatter;

impl Formatter for AsciiFormatter {
    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        let mut start = 0;
        for (i, c) in fragment.char_indices() {
            if (' '..='~').contains(&c) {
                continue;
            }
            writer.write_all(fragment[start..i].as_bytes())?;
            let mut units = [0u16; 2];
            for unit in c.encode_utf16(&mut units) {
                write!(writer, "\\u{:04x}", unit)?;
            }
            start = i + c.len_utf8();
        }
        writer.write_all(fragment[start..].as_bytes())
    }
}

/// Renders a value as canonical JSON text.
pub fn to_canonical_string<T: ?Sized + Serialize>(value: &T) -> Result<String, serde_json::Error> {
    let mut out = Vec::new();
    let mut ser = Serializer::with_formatter(&mut out, AsciiFormatter);
    value.serialize(&mut ser)?;
    // The formatter only emits ASCII.
    Ok(out.into_iter().map(char::from).collect())
}
