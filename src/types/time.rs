//! UTCTime and GeneralizedTime: manual X.690 §11.7/§11.8-aware parsing and
//! formatting layered over [`chrono`]'s calendar types, since `chrono`'s own
//! string parser is more permissive than the wire grammar these types
//! require (and CER/DER additionally forbid forms BER allows).

use alloc::string::{String, ToString};
use alloc::vec::Vec;

use chrono::{Datelike, NaiveDate, NaiveTime, Timelike};

use crate::error::{self, Result};
use crate::rules::EncodingRules;
use crate::tag::Tag;

/// The time-zone suffix carried by a decoded time value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeZone {
    /// `Z`: Coordinated Universal Time.
    Utc,
    /// `+hhmm` / `-hhmm` offset from UTC, in minutes (may be negative).
    Offset(i32),
    /// No zone suffix at all (BER-only; local/unspecified time).
    Unspecified,
}

/// A decoded `UTCTime` value: `YYMMDDhhmm[ss]` plus a zone suffix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UtcTime {
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub zone: TimeZone,
}

/// A decoded `GeneralizedTime` value: `YYYYMMDDhhmm[ss[.f...]]` plus a zone
/// suffix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneralizedTime {
    pub date: NaiveDate,
    pub time: NaiveTime,
    /// Fractional-second digits after the decimal point, verbatim (empty if
    /// absent). CER/DER forbid a present-but-all-zero fraction and forbid
    /// trailing zero digits.
    pub fraction: String,
    pub zone: TimeZone,
}

fn digits(bytes: &[u8], tag: Tag) -> Result<()> {
    if bytes.iter().any(|b| !b.is_ascii_digit()) {
        return error::ValueCharactersSnafu { character: bytes.first().copied().unwrap_or(0) as u32, position: 0usize }
            .fail();
    }
    let _ = tag;
    Ok(())
}

fn parse_u32(bytes: &[u8]) -> u32 {
    bytes.iter().fold(0u32, |acc, b| acc * 10 + (b - b'0') as u32)
}

/// Decodes a `UTCTime` value. `YY` is interpreted per X.690 §11.7: 00-49 ->
/// 20xx, 50-99 -> 19xx.
pub fn decode_utc_time(content: &[u8], rules: EncodingRules) -> Result<UtcTime> {
    let tag = Tag::UTC_TIME;
    let size_err = |reason: &str| error::ValueSizeSnafu { tag, reason: reason.to_string() }.fail();
    if content.len() < 11 {
        return size_err("UTCTime too short");
    }

    digits(&content[0..10], tag)?;
    let yy = parse_u32(&content[0..2]);
    let year = if yy < 50 { 2000 + yy } else { 1900 + yy };
    let month = parse_u32(&content[2..4]);
    let day = parse_u32(&content[4..6]);
    let hour = parse_u32(&content[6..8]);
    let minute = parse_u32(&content[8..10]);

    let mut cursor = 10;
    let mut second = 0u32;
    let has_seconds = content.get(cursor).is_some_and(u8::is_ascii_digit);
    if has_seconds {
        digits(&content[cursor..cursor + 2], tag)?;
        second = parse_u32(&content[cursor..cursor + 2]);
        cursor += 2;
    } else if rules.requires_strict_time() {
        return error::ValueUndefinedSnafu { tag, reason: "CER/DER UTCTime requires seconds".to_string() }.fail();
    }

    let zone = parse_zone(&content[cursor..], tag, rules)?;

    let date = NaiveDate::from_ymd_opt(year as i32, month, day)
        .ok_or(error::ValueSizeSnafu { tag, reason: "invalid calendar date".to_string() }.build())?;
    let time = NaiveTime::from_hms_opt(hour, minute, second)
        .ok_or(error::ValueSizeSnafu { tag, reason: "invalid time of day".to_string() }.build())?;

    Ok(UtcTime { date, time, zone })
}

fn parse_zone(rest: &[u8], tag: Tag, rules: EncodingRules) -> Result<TimeZone> {
    if rest.is_empty() {
        if rules.requires_strict_time() {
            return error::ValueUndefinedSnafu { tag, reason: "CER/DER require a Z zone suffix".to_string() }.fail();
        }
        return Ok(TimeZone::Unspecified);
    }
    if rest == b"Z" {
        return Ok(TimeZone::Utc);
    }
    if rules.requires_strict_time() {
        return error::ValueUndefinedSnafu { tag, reason: "CER/DER forbid explicit zone offsets".to_string() }.fail();
    }
    if rest.len() == 5 && (rest[0] == b'+' || rest[0] == b'-') {
        digits(&rest[1..], tag)?;
        let hh = parse_u32(&rest[1..3]) as i32;
        let mm = parse_u32(&rest[3..5]) as i32;
        let minutes = hh * 60 + mm;
        return Ok(TimeZone::Offset(if rest[0] == b'-' { -minutes } else { minutes }));
    }
    error::ValueUndefinedSnafu { tag, reason: "unrecognized time-zone suffix".to_string() }.fail()
}

/// Encodes a `UTCTime` value.
pub fn encode_utc_time(value: &UtcTime, rules: EncodingRules) -> Result<Vec<u8>> {
    if rules.requires_strict_time() && !matches!(value.zone, TimeZone::Utc) {
        return error::ValueUndefinedSnafu {
            tag: Tag::UTC_TIME,
            reason: "CER/DER UTCTime must carry a Z zone suffix".to_string(),
        }
        .fail();
    }
    let yy = (value.date.year().rem_euclid(100)) as u32;
    let mut out = alloc::format!(
        "{:02}{:02}{:02}{:02}{:02}{:02}",
        yy,
        value.date.month(),
        value.date.day(),
        value.time.hour(),
        value.time.minute(),
        value.time.second()
    );
    out.push_str(&zone_suffix(value.zone));
    Ok(out.into_bytes())
}

fn zone_suffix(zone: TimeZone) -> String {
    match zone {
        TimeZone::Utc => "Z".to_string(),
        TimeZone::Unspecified => String::new(),
        TimeZone::Offset(minutes) => {
            let sign = if minutes < 0 { '-' } else { '+' };
            let minutes = minutes.unsigned_abs();
            alloc::format!("{sign}{:02}{:02}", minutes / 60, minutes % 60)
        }
    }
}

/// Decodes a `GeneralizedTime` value.
pub fn decode_generalized_time(content: &[u8], rules: EncodingRules) -> Result<GeneralizedTime> {
    let tag = Tag::GENERALIZED_TIME;
    if content.len() < 10 {
        return error::ValueSizeSnafu { tag, reason: "GeneralizedTime too short".to_string() }.fail();
    }
    digits(&content[0..8], tag)?;
    let year = parse_u32(&content[0..4]);
    let month = parse_u32(&content[4..6]);
    let day = parse_u32(&content[6..8]);
    let hour = parse_u32(&content[8..10]);

    let mut cursor = 10;
    let mut minute = 0u32;
    let mut second = 0u32;
    if content.get(cursor).is_some_and(u8::is_ascii_digit) {
        digits(&content[cursor..cursor + 2], tag)?;
        minute = parse_u32(&content[cursor..cursor + 2]);
        cursor += 2;
        if content.get(cursor).is_some_and(u8::is_ascii_digit) {
            digits(&content[cursor..cursor + 2], tag)?;
            second = parse_u32(&content[cursor..cursor + 2]);
            cursor += 2;
        } else if rules.requires_strict_time() {
            return error::ValueUndefinedSnafu { tag, reason: "CER/DER GeneralizedTime requires full seconds".to_string() }.fail();
        }
    } else if rules.requires_strict_time() {
        return error::ValueUndefinedSnafu { tag, reason: "CER/DER GeneralizedTime requires full seconds".to_string() }.fail();
    }

    let mut fraction = String::new();
    if content.get(cursor) == Some(&b'.') || content.get(cursor) == Some(&b',') {
        cursor += 1;
        let start = cursor;
        while content.get(cursor).is_some_and(u8::is_ascii_digit) {
            cursor += 1;
        }
        if cursor == start {
            return error::ValueSizeSnafu { tag, reason: "empty fractional-seconds component".to_string() }.fail();
        }
        fraction = String::from_utf8_lossy(&content[start..cursor]).into_owned();
        if rules.requires_strict_time() {
            if fraction.ends_with('0') {
                return error::ValueUndefinedSnafu {
                    tag,
                    reason: "CER/DER forbid trailing zeros in the fractional-seconds component".to_string(),
                }
                .fail();
            }
            if fraction.chars().all(|c| c == '0') {
                return error::ValueUndefinedSnafu {
                    tag,
                    reason: "CER/DER forbid an all-zero fractional-seconds component".to_string(),
                }
                .fail();
            }
        }
    }

    let zone = parse_zone(&content[cursor..], tag, rules)?;

    let date = NaiveDate::from_ymd_opt(year as i32, month, day)
        .ok_or(error::ValueSizeSnafu { tag, reason: "invalid calendar date".to_string() }.build())?;
    let time = NaiveTime::from_hms_opt(hour, minute, second)
        .ok_or(error::ValueSizeSnafu { tag, reason: "invalid time of day".to_string() }.build())?;

    Ok(GeneralizedTime { date, time, fraction, zone })
}

/// Encodes a `GeneralizedTime` value.
pub fn encode_generalized_time(value: &GeneralizedTime, rules: EncodingRules) -> Result<Vec<u8>> {
    let tag = Tag::GENERALIZED_TIME;
    if rules.requires_strict_time() {
        if !matches!(value.zone, TimeZone::Utc) {
            return error::ValueUndefinedSnafu { tag, reason: "CER/DER GeneralizedTime must carry a Z zone suffix".to_string() }.fail();
        }
        if value.fraction.ends_with('0') || value.fraction.chars().all(|c| c == '0') && !value.fraction.is_empty() {
            return error::ValueUndefinedSnafu {
                tag,
                reason: "CER/DER forbid trailing/all-zero fractional seconds".to_string(),
            }
            .fail();
        }
    }

    let mut out = alloc::format!(
        "{:04}{:02}{:02}{:02}{:02}{:02}",
        value.date.year(),
        value.date.month(),
        value.date.day(),
        value.time.hour(),
        value.time.minute(),
        value.time.second()
    );
    if !value.fraction.is_empty() {
        out.push('.');
        out.push_str(&value.fraction);
    }
    out.push_str(&zone_suffix(value.zone));
    Ok(out.into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn utc_time_roundtrip() {
        let content = b"920223235959Z";
        let decoded = decode_utc_time(content, EncodingRules::Der).unwrap();
        assert_eq!(decoded.date.year(), 1992);
        assert_eq!(decoded.zone, TimeZone::Utc);
        let encoded = encode_utc_time(&decoded, EncodingRules::Der).unwrap();
        assert_eq!(encoded, content);
    }

    #[test]
    fn der_rejects_missing_seconds() {
        assert!(decode_utc_time(b"9202232359Z", EncodingRules::Ber).is_ok());
        assert!(decode_utc_time(b"920223235Z", EncodingRules::Der).is_err());
    }

    #[test]
    fn der_rejects_offset_zone() {
        assert!(decode_utc_time(b"9202232359+0100", EncodingRules::Ber).is_ok());
        assert!(decode_utc_time(b"9202232359+0100", EncodingRules::Der).is_err());
    }

    #[test]
    fn generalized_time_strict_fraction_rules() {
        assert!(decode_generalized_time(b"19920223235959.5Z", EncodingRules::Der).is_ok());
        assert!(decode_generalized_time(b"19920223235959.50Z", EncodingRules::Der).is_err());
        assert!(decode_generalized_time(b"19920223235959.0Z", EncodingRules::Der).is_err());
        assert!(decode_generalized_time(b"19920223235959.50Z", EncodingRules::Ber).is_ok());
    }
}
