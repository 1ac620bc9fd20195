//! Restricted string types: per-type alphabet validation plus the
//! fixed-width UniversalString (UCS-4) and BMPString (UCS-2) codecs.
//!
//! Segmentation of constructed encodings (CER's 1000-octet chunking) is
//! handled by the element layer; this module covers a single already-
//! assembled value's character-level validity.

use alloc::string::{String, ToString};
use alloc::vec::Vec;

use crate::error::{self, Result};
use crate::tag::Tag;

/// Every restricted string type named in the specification, used to select
/// the alphabet/encoding checked by [`validate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringKind {
    NumericString,
    PrintableString,
    IA5String,
    UTF8String,
    UniversalString,
    BMPString,
    TeletexString,
    VideotexString,
    GraphicString,
    VisibleString,
    GeneralString,
}

impl StringKind {
    pub fn tag(self) -> Tag {
        match self {
            StringKind::NumericString => Tag::NUMERIC_STRING,
            StringKind::PrintableString => Tag::PRINTABLE_STRING,
            StringKind::IA5String => Tag::IA5_STRING,
            StringKind::UTF8String => Tag::UTF8_STRING,
            StringKind::UniversalString => Tag::UNIVERSAL_STRING,
            StringKind::BMPString => Tag::BMP_STRING,
            StringKind::TeletexString => Tag::TELETEX_STRING,
            StringKind::VideotexString => Tag::VIDEOTEX_STRING,
            StringKind::GraphicString => Tag::GRAPHIC_STRING,
            StringKind::VisibleString => Tag::VISIBLE_STRING,
            StringKind::GeneralString => Tag::GENERAL_STRING,
        }
    }

    /// True for the types whose content octets are checked against a
    /// restricted alphabet; the "transparent-bytes" types (TeletexString
    /// and friends) accept any octet sequence.
    fn is_transparent(self) -> bool {
        matches!(
            self,
            StringKind::TeletexString
                | StringKind::VideotexString
                | StringKind::GraphicString
                | StringKind::VisibleString
                | StringKind::GeneralString
        )
    }
}

fn is_printable_char(c: u8) -> bool {
    c.is_ascii_alphanumeric()
        || c == b' '
        || matches!(c, b'\'' | b'(' | b')' | b'+' | b',' | b'-' | b'.' | b'/' | b':' | b'=' | b'?')
}

/// Validates `content` against `kind`'s alphabet. For `UTF8String`, `content`
/// must additionally be well-formed UTF-8 (checked by the caller via
/// [`core::str::from_utf8`] before reaching here in practice, but re-checked
/// here for a single entry point).
pub fn validate(kind: StringKind, content: &[u8]) -> Result<()> {
    match kind {
        StringKind::NumericString => {
            for (i, &b) in content.iter().enumerate() {
                if !(b.is_ascii_digit() || b == b' ') {
                    return error::ValueCharactersSnafu { character: b as u32, position: i }.fail();
                }
            }
            Ok(())
        }
        StringKind::PrintableString => {
            for (i, &b) in content.iter().enumerate() {
                if !is_printable_char(b) {
                    return error::ValueCharactersSnafu { character: b as u32, position: i }.fail();
                }
            }
            Ok(())
        }
        StringKind::IA5String => {
            for (i, &b) in content.iter().enumerate() {
                if b > 0x7f {
                    return error::ValueCharactersSnafu { character: b as u32, position: i }.fail();
                }
            }
            Ok(())
        }
        StringKind::UTF8String => core::str::from_utf8(content)
            .map(|_| ())
            .map_err(|e| error::ValueCharactersSnafu { character: 0xFFFDu32, position: e.valid_up_to() }.build()),
        StringKind::UniversalString => {
            if content.len() % 4 != 0 {
                return error::ValueSizeSnafu {
                    tag: kind.tag(),
                    reason: "UniversalString content length must be a multiple of 4".to_string(),
                }
                .fail();
            }
            for (i, chunk) in content.chunks_exact(4).enumerate() {
                let scalar = u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
                if char::from_u32(scalar).is_none() {
                    return error::ValueCharactersSnafu { character: scalar, position: i * 4 }.fail();
                }
            }
            Ok(())
        }
        StringKind::BMPString => {
            if content.len() % 2 != 0 {
                return error::ValueSizeSnafu {
                    tag: kind.tag(),
                    reason: "BMPString content length must be a multiple of 2".to_string(),
                }
                .fail();
            }
            Ok(())
        }
        k if k.is_transparent() => Ok(()),
        _ => Ok(()),
    }
}

/// Decodes a `UniversalString` (UCS-4 big-endian) into a `String`.
pub fn decode_universal_string(content: &[u8]) -> Result<String> {
    validate(StringKind::UniversalString, content)?;
    let mut out = String::with_capacity(content.len() / 4);
    for chunk in content.chunks_exact(4) {
        let scalar = u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        out.push(char::from_u32(scalar).expect("validated above"));
    }
    Ok(out)
}

/// Encodes a `String` as `UniversalString` (UCS-4 big-endian) content.
pub fn encode_universal_string(value: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(value.chars().count() * 4);
    for c in value.chars() {
        out.extend_from_slice(&(c as u32).to_be_bytes());
    }
    out
}

/// Decodes a `BMPString` (UCS-2 big-endian, no surrogate pairs) into a
/// `String`.
pub fn decode_bmp_string(content: &[u8]) -> Result<String> {
    validate(StringKind::BMPString, content)?;
    let mut units = Vec::with_capacity(content.len() / 2);
    for (i, chunk) in content.chunks_exact(2).enumerate() {
        let unit = u16::from_be_bytes([chunk[0], chunk[1]]);
        if (0xd800..=0xdfff).contains(&unit) {
            return error::ValueCharactersSnafu { character: unit as u32, position: i * 2 }.fail();
        }
        units.push(unit);
    }
    String::from_utf16(&units)
        .map_err(|_| error::ValueCharactersSnafu { character: 0xFFFDu32, position: 0usize }.build())
}

/// Encodes a `String` as `BMPString` (UCS-2 big-endian) content.
pub fn encode_bmp_string(value: &str) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(value.len() * 2);
    for unit in value.encode_utf16() {
        out.extend_from_slice(&unit.to_be_bytes());
    }
    Ok(out)
}
