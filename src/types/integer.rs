//! INTEGER / ENUMERATED: two's-complement big-endian content octets backed
//! by an arbitrary-precision [`BigInt`].

use alloc::string::ToString;
use alloc::vec::Vec;

use num_bigint::BigInt;
use num_traits::{Signed, Zero};

use crate::error::{self, Result};
use crate::rules::EncodingRules;
use crate::tag::Tag;

/// Encodes `value` as minimum-length two's-complement big-endian content
/// octets. `num_bigint::BigInt::to_signed_bytes_be` already produces the
/// shortest two's-complement form, so this holds for every rule variant:
/// BER, CER, and DER all emit the same minimal octets for INTEGER/
/// ENUMERATED on encode (only decode-side tolerance differs).
pub fn encode(value: &BigInt) -> Vec<u8> {
    if value.is_zero() {
        return alloc::vec![0x00];
    }
    value.to_signed_bytes_be()
}

/// Decodes two's-complement big-endian content octets into a [`BigInt`],
/// enforcing minimum encoding (no redundant leading `0x00`/`0xFF` octet)
/// under CER/DER.
pub fn decode(tag: Tag, content: &[u8], rules: EncodingRules) -> Result<BigInt> {
    if content.is_empty() {
        return error::ValueSizeSnafu {
            tag,
            reason: "INTEGER/ENUMERATED content must not be empty".to_string(),
        }
        .fail();
    }

    if rules.requires_minimal_integer() && content.len() > 1 {
        let first = content[0];
        let second = content[1];
        let redundant = (first == 0x00 && second & 0x80 == 0) || (first == 0xff && second & 0x80 != 0);
        if redundant {
            return error::ValuePaddingSnafu { tag }.fail();
        }
    }

    Ok(BigInt::from_signed_bytes_be(content))
}

/// Decodes content octets into a fixed-width signed target, failing with
/// [`crate::error::Error::ValueOverflow`] if the value does not fit.
pub fn decode_i64(tag: Tag, content: &[u8], rules: EncodingRules) -> Result<i64> {
    let value = decode(tag, content, rules)?;
    value_to_i64(&value)
}

pub(crate) fn value_to_i64(value: &BigInt) -> Result<i64> {
    let bytes = value.to_signed_bytes_be();
    if bytes.len() > 8 {
        return error::ValueOverflowSnafu { max_width: 64u32 }.fail();
    }
    let negative = value.is_negative();
    let mut buf = if negative { [0xffu8; 8] } else { [0u8; 8] };
    let offset = 8 - bytes.len();
    buf[offset..].copy_from_slice(&bytes);
    Ok(i64::from_be_bytes(buf))
}
