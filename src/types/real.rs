//! REAL: binary, decimal (ISO 6093 character form), and special-value
//! encodings, selected on the wire by the two high bits of the first
//! content octet.

use alloc::string::{String, ToString};
use alloc::vec::Vec;

use num_bigint::BigUint;
use num_traits::{ToPrimitive, Zero};

use crate::error::{self, Result};
use crate::rules::EncodingRules;
use crate::tag::Tag;

/// The base a binary REAL's mantissa/exponent are expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Base {
    Two,
    Eight,
    Sixteen,
}

impl Base {
    fn from_bits(bits: u8) -> Result<Self> {
        match bits {
            0b00 => Ok(Base::Two),
            0b01 => Ok(Base::Eight),
            0b10 => Ok(Base::Sixteen),
            _ => error::ValueUndefinedSnafu {
                tag: Tag::REAL,
                reason: "reserved REAL base selector 11".to_string(),
            }
            .fail(),
        }
    }

    fn bits(self) -> u8 {
        match self {
            Base::Two => 0b00,
            Base::Eight => 0b01,
            Base::Sixteen => 0b10,
        }
    }

    fn radix(self) -> u32 {
        match self {
            Base::Two => 2,
            Base::Eight => 8,
            Base::Sixteen => 16,
        }
    }

    /// `log2(radix)`: how many base-2 exponent units one unit of this base's
    /// exponent is worth, used to fold base 8/16 into the base-2-only
    /// canonical form CER/DER require.
    fn log2_factor(self) -> i64 {
        match self {
            Base::Two => 1,
            Base::Eight => 3,
            Base::Sixteen => 4,
        }
    }
}

/// A binary-form REAL: `sign * mantissa * base^exponent * 2^scale`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryReal {
    pub negative: bool,
    pub base: Base,
    /// Scale factor F, 0..=3. CER/DER require this to be zero.
    pub scale: u8,
    pub exponent: i64,
    /// Non-negative mantissa magnitude.
    pub mantissa: BigUint,
}

impl BinaryReal {
    /// Best-effort conversion to `f64` for display/arithmetic purposes.
    pub fn to_f64(&self) -> f64 {
        let mantissa = self.mantissa.to_f64().unwrap_or(f64::INFINITY);
        let base = self.base.radix() as f64;
        let mut value = mantissa * base.powi(self.exponent as i32) * 2f64.powi(self.scale as i32);
        if self.negative {
            value = -value;
        }
        value
    }

    /// Normalizes into the CER/DER canonical binary form: base 2, zero scale
    /// factor, and an odd mantissa (or a zero mantissa, though zero values
    /// are always encoded via the dedicated empty-content form instead).
    fn canonicalize(mut self) -> Self {
        while self.scale > 0 {
            self.mantissa <<= 1usize;
            self.scale -= 1;
        }
        if !matches!(self.base, Base::Two) {
            self.exponent = self.exponent.saturating_mul(self.base.log2_factor());
            self.base = Base::Two;
        }
        while !self.mantissa.is_zero() && (&self.mantissa & BigUint::from(1u8)).is_zero() {
            self.mantissa >>= 1usize;
            self.exponent += 1;
        }
        self
    }
}

/// A decoded REAL value.
#[derive(Debug, Clone, PartialEq)]
pub enum Real {
    /// Zero, encoded as zero-length content.
    Zero,
    /// `-0`, one of the four special-value encodings.
    NegativeZero,
    PlusInfinity,
    MinusInfinity,
    NotANumber,
    /// Binary form (base 2/8/16, explicit mantissa/exponent/scale).
    Binary(BinaryReal),
    /// ISO 6093 character form, stored verbatim in its validated NR1/NR2/NR3
    /// representation.
    Decimal(String),
}

impl Real {
    pub fn to_f64(&self) -> f64 {
        match self {
            Real::Zero => 0.0,
            Real::NegativeZero => -0.0,
            Real::PlusInfinity => f64::INFINITY,
            Real::MinusInfinity => f64::NEG_INFINITY,
            Real::NotANumber => f64::NAN,
            Real::Binary(b) => b.to_f64(),
            Real::Decimal(s) => s.replace(',', ".").parse().unwrap_or(f64::NAN),
        }
    }
}

/// Encodes a REAL value per `rules`' canonicalization requirements.
pub fn encode(value: &Real, rules: EncodingRules) -> Result<Vec<u8>> {
    match value {
        Real::Zero => Ok(Vec::new()),
        Real::NegativeZero => Ok(alloc::vec![0x43]),
        Real::PlusInfinity => Ok(alloc::vec![0x40]),
        Real::MinusInfinity => Ok(alloc::vec![0x41]),
        Real::NotANumber => Ok(alloc::vec![0x42]),
        Real::Binary(binary) => encode_binary(binary, rules),
        Real::Decimal(s) => encode_decimal(s, rules),
    }
}

fn encode_binary(binary: &BinaryReal, rules: EncodingRules) -> Result<Vec<u8>> {
    let binary = if rules.requires_odd_real_mantissa() || rules.requires_zero_real_scale() {
        binary.clone().canonicalize()
    } else {
        binary.clone()
    };

    if binary.mantissa.is_zero() {
        // A canonical zero is always the empty-content encoding; reject
        // callers that hand us a degenerate binary-form zero under CER/DER.
        if rules.requires_odd_real_mantissa() {
            return error::ValueUndefinedSnafu {
                tag: Tag::REAL,
                reason: "zero REAL must use the empty-content form under CER/DER".to_string(),
            }
            .fail();
        }
    }

    if rules.requires_zero_real_scale() && binary.scale != 0 {
        return error::ValueUndefinedSnafu {
            tag: Tag::REAL,
            reason: "nonzero REAL scale factor forbidden under CER/DER".to_string(),
        }
        .fail();
    }

    let mut exponent_octets = encode_signed_minimal(binary.exponent);
    if !rules.requires_minimal_real_exponent() {
        // BER tolerates (but this encoder never emits) non-minimal forms;
        // nothing further to do, minimal is always a valid BER exponent.
    }
    let exponent_len_field = match exponent_octets.len() {
        1 => 0b00,
        2 => 0b01,
        3 => 0b10,
        n => {
            exponent_octets.insert(0, n as u8);
            0b11
        }
    };

    let mut out = Vec::new();
    let first = 0x80
        | ((binary.negative as u8) << 6)
        | (binary.base.bits() << 4)
        | (binary.scale << 2)
        | exponent_len_field;
    out.push(first);
    out.extend_from_slice(&exponent_octets);
    out.extend_from_slice(&binary.mantissa.to_bytes_be());
    Ok(out)
}

fn encode_signed_minimal(value: i64) -> Vec<u8> {
    if value == 0 {
        return alloc::vec![0];
    }
    let mut bytes = value.to_be_bytes().to_vec();
    while bytes.len() > 1 {
        let redundant = (bytes[0] == 0x00 && bytes[1] & 0x80 == 0)
            || (bytes[0] == 0xff && bytes[1] & 0x80 != 0);
        if redundant {
            bytes.remove(0);
        } else {
            break;
        }
    }
    bytes
}

fn encode_decimal(value: &str, rules: EncodingRules) -> Result<Vec<u8>> {
    let nr_form = if rules.requires_nr3_real() {
        validate_nr3_strict(value)?;
        3u8
    } else {
        validate_iso6093(value)?;
        classify_nr(value)
    };
    let mut out = alloc::vec![nr_form];
    out.extend_from_slice(value.as_bytes());
    Ok(out)
}

/// Classifies an already-`validate_iso6093`-checked string as NR1
/// (integer), NR2 (decimal, no exponent), or NR3 (exponential).
fn classify_nr(value: &str) -> u8 {
    if value.contains(['e', 'E']) {
        3
    } else if value.contains(['.', ',']) {
        2
    } else {
        1
    }
}

/// Decodes REAL content octets.
pub fn decode(content: &[u8], rules: EncodingRules) -> Result<Real> {
    if content.is_empty() {
        return Ok(Real::Zero);
    }

    let first = content[0];
    if first & 0xc0 == 0x40 {
        return match first {
            0x40 => Ok(Real::PlusInfinity),
            0x41 => Ok(Real::MinusInfinity),
            0x42 => Ok(Real::NotANumber),
            0x43 => Ok(Real::NegativeZero),
            other => error::ValueUndefinedSnafu {
                tag: Tag::REAL,
                reason: alloc::format!("unknown REAL special-value octet {other:#x}"),
            }
            .fail(),
        };
    }

    if first & 0x80 != 0 {
        return decode_binary(content, rules).map(Real::Binary);
    }

    // Character (decimal) form: first octet's low 6 bits select NR1/2/3.
    let text = core::str::from_utf8(&content[1..]).map_err(|_| {
        error::ValueCharactersSnafu { character: 0xFFFDu32, position: 1usize }.build()
    })?;
    if rules.requires_nr3_real() {
        validate_nr3_strict(text)?;
    } else {
        validate_iso6093(text)?;
    }
    Ok(Real::Decimal(text.to_string()))
}

fn decode_binary(content: &[u8], rules: EncodingRules) -> Result<BinaryReal> {
    let first = content[0];
    let negative = first & 0x40 != 0;
    let base = Base::from_bits((first >> 4) & 0b11)?;
    let scale = (first >> 2) & 0b11;
    if rules.requires_zero_real_scale() && scale != 0 {
        return error::ValueUndefinedSnafu {
            tag: Tag::REAL,
            reason: "nonzero REAL scale factor forbidden under CER/DER".to_string(),
        }
        .fail();
    }
    if rules.requires_zero_real_scale() && !matches!(base, Base::Two) {
        return error::ValueUndefinedSnafu {
            tag: Tag::REAL,
            reason: "REAL base must be 2 under CER/DER".to_string(),
        }
        .fail();
    }

    let mut cursor = 1usize;
    let exponent_octet_count = match first & 0b11 {
        0b00 => 1,
        0b01 => 2,
        0b10 => 3,
        _ => {
            let n = *content
                .get(cursor)
                .ok_or(error::TruncatedSnafu { offset: cursor }.build())? as usize;
            cursor += 1;
            n
        }
    };

    let exponent_bytes = content
        .get(cursor..cursor + exponent_octet_count)
        .ok_or(error::TruncatedSnafu { offset: cursor }.build())?;
    if exponent_bytes.is_empty() {
        return error::ValueSizeSnafu { tag: Tag::REAL, reason: "empty REAL exponent".to_string() }.fail();
    }
    if rules.requires_minimal_real_exponent() && exponent_bytes.len() > 1 {
        let redundant = (exponent_bytes[0] == 0x00 && exponent_bytes[1] & 0x80 == 0)
            || (exponent_bytes[0] == 0xff && exponent_bytes[1] & 0x80 != 0);
        if redundant {
            return error::ValuePaddingSnafu { tag: Tag::REAL }.fail();
        }
    }
    let exponent = decode_signed(exponent_bytes)?;
    cursor += exponent_octet_count;

    let mantissa_bytes = &content[cursor..];
    let mantissa = BigUint::from_bytes_be(mantissa_bytes);

    if rules.requires_odd_real_mantissa() && !mantissa.is_zero() {
        let is_even = (&mantissa & BigUint::from(1u8)).is_zero();
        if is_even {
            return error::ValuePaddingSnafu { tag: Tag::REAL }.fail();
        }
    }

    Ok(BinaryReal { negative, base, scale, exponent, mantissa })
}

fn decode_signed(bytes: &[u8]) -> Result<i64> {
    if bytes.len() > 8 {
        return error::ValueOverflowSnafu { max_width: 64u32 }.fail();
    }
    let negative = bytes[0] & 0x80 != 0;
    let mut buf = if negative { [0xffu8; 8] } else { [0u8; 8] };
    let offset = 8 - bytes.len();
    buf[offset..].copy_from_slice(bytes);
    Ok(i64::from_be_bytes(buf))
}

/// Accepts ISO 6093 NR1 (integer), NR2 (decimal), or NR3 (exponential)
/// forms, as BER permits any of the three.
fn validate_iso6093(s: &str) -> Result<()> {
    let bad = || {
        error::ValueCharactersSnafu { character: 0u32, position: 0usize }.build()
    };
    let bytes = s.as_bytes();
    if bytes.is_empty() {
        return Err(bad());
    }
    let mut i = 0;
    if bytes[i] == b'+' || bytes[i] == b'-' {
        i += 1;
    }
    let digits_start = i;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    if i == digits_start {
        return Err(bad());
    }
    if i < bytes.len() && (bytes[i] == b'.' || bytes[i] == b',') {
        i += 1;
        let frac_start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        if i == frac_start {
            return Err(bad());
        }
    }
    if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
        i += 1;
        if i < bytes.len() && (bytes[i] == b'+' || bytes[i] == b'-') {
            i += 1;
        }
        let exp_start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        if i == exp_start {
            return Err(bad());
        }
    }
    if i != bytes.len() {
        return Err(bad());
    }
    Ok(())
}

/// Validates the strict CER/DER NR3 form: `<mantissa>.<fraction>E<exponent>`,
/// explicit capital `E`, no leading zeros on the integer part (unless it is
/// exactly `0`), no trailing zeros on the fraction, and `+0` exponent
/// permitted only in the exact terminal form of an otherwise-normalized
/// value.
fn validate_nr3_strict(s: &str) -> Result<()> {
    let bad = || error::ValueCharactersSnafu { character: 0u32, position: 0usize }.build();
    let bytes = s.as_bytes();
    let mut i = 0;
    let negative = bytes.first() == Some(&b'-');
    if negative {
        i += 1;
    }
    let int_start = i;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    let int_part = &bytes[int_start..i];
    if int_part.is_empty() {
        return Err(bad());
    }
    if int_part.len() > 1 && int_part[0] == b'0' {
        return Err(bad());
    }
    if bytes.get(i) != Some(&b'.') {
        return Err(bad());
    }
    i += 1;
    let frac_start = i;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    let frac_part = &bytes[frac_start..i];
    if frac_part.is_empty() {
        return Err(bad());
    }
    if frac_part.last() == Some(&b'0') {
        return Err(bad());
    }
    if bytes.get(i) != Some(&b'E') {
        return Err(bad());
    }
    i += 1;
    let exp_negative = bytes.get(i) == Some(&b'-');
    let exp_plus = bytes.get(i) == Some(&b'+');
    if exp_negative || exp_plus {
        i += 1;
    }
    let exp_start = i;
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    let exp_part = &bytes[exp_start..i];
    if exp_part.is_empty() || i != bytes.len() {
        return Err(bad());
    }
    if exp_part.len() > 1 && exp_part[0] == b'0' {
        return Err(bad());
    }
    if exp_plus && exp_part != b"0" {
        return Err(bad());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_is_empty_content() {
        assert_eq!(encode(&Real::Zero, EncodingRules::Der).unwrap(), Vec::<u8>::new());
        assert_eq!(decode(&[], EncodingRules::Der).unwrap(), Real::Zero);
    }

    #[test]
    fn special_values_roundtrip() {
        for (value, byte) in [
            (Real::PlusInfinity, 0x40),
            (Real::MinusInfinity, 0x41),
            (Real::NotANumber, 0x42),
            (Real::NegativeZero, 0x43),
        ] {
            let encoded = encode(&value, EncodingRules::Der).unwrap();
            assert_eq!(encoded, alloc::vec![byte]);
            assert_eq!(decode(&encoded, EncodingRules::Der).unwrap(), value);
        }
    }

    #[test]
    fn unknown_special_byte_is_undefined() {
        assert!(decode(&[0x44], EncodingRules::Ber).is_err());
    }

    #[test]
    fn binary_roundtrip_and_canonicalization() {
        let value = BinaryReal {
            negative: false,
            base: Base::Two,
            scale: 2,
            exponent: 3,
            mantissa: BigUint::from(6u8),
        };
        let encoded = encode(&Real::Binary(value), EncodingRules::Der).unwrap();
        let decoded = decode(&encoded, EncodingRules::Der).unwrap();
        match decoded {
            Real::Binary(b) => {
                assert_eq!(b.scale, 0);
                assert_eq!(&b.mantissa & BigUint::from(1u8), BigUint::from(1u8));
            }
            _ => panic!("expected binary"),
        }
    }

    #[test]
    fn der_canonicalizes_non_base_2_to_base_2() {
        // 3 * 8^1 == 24 == 3 * 2^3; canonical DER form must report base 2.
        let value = BinaryReal { negative: false, base: Base::Eight, scale: 0, exponent: 1, mantissa: BigUint::from(3u8) };
        let encoded = encode(&Real::Binary(value.clone()), EncodingRules::Der).unwrap();
        let decoded = decode(&encoded, EncodingRules::Der).unwrap();
        match decoded {
            Real::Binary(b) => {
                assert_eq!(b.base, Base::Two);
                assert_eq!(b.to_f64(), value.to_f64());
            }
            _ => panic!("expected binary"),
        }
    }

    #[test]
    fn der_rejects_non_base_2_on_decode() {
        // base=Eight (bits 01), scale 0, 1-octet exponent 0x01, mantissa 0x03.
        assert!(decode(&[0x90, 0x01, 0x03], EncodingRules::Der).is_err());
        assert!(decode(&[0x90, 0x01, 0x03], EncodingRules::Ber).is_ok());
    }

    #[test]
    fn der_rejects_even_mantissa() {
        // 2 << 0 with scale 0, exponent 0: first=0x80, exp=0x00, mantissa=0x02.
        assert!(decode(&[0x80, 0x00, 0x02], EncodingRules::Der).is_err());
        assert!(decode(&[0x80, 0x00, 0x03], EncodingRules::Der).is_ok());
    }

    #[test]
    fn nr3_strict_accepts_and_rejects() {
        assert!(validate_nr3_strict("1.5E+0").is_ok());
        assert!(validate_nr3_strict("123.45E1").is_ok());
        assert!(validate_nr3_strict("01.5E1").is_err());
        assert!(validate_nr3_strict("1.50E1").is_err());
        assert!(validate_nr3_strict("1.5e1").is_err());
        assert!(validate_nr3_strict("1.5E+1").is_err());
        assert!(validate_nr3_strict("1.5E01").is_err());
    }

    #[test]
    fn iso6093_accepts_nr1_nr2_nr3() {
        assert!(validate_iso6093("123").is_ok());
        assert!(validate_iso6093("-123.45").is_ok());
        assert!(validate_iso6093("1.5E+10").is_ok());
        assert!(validate_iso6093("abc").is_err());
    }
}
