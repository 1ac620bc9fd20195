//! Low-level tag/length octet codec (§4.1).
//!
//! Tag-number and length parsing is implemented with [`nom`]'s streaming
//! combinators, matching the teacher's `ber::de::parser` module, but every
//! `nom` error is mapped to this crate's own [`Error`] before it escapes
//! this module.

use alloc::vec::Vec;

use nom::IResult;

use crate::error::{self, Error, Result};
use crate::identifier::Identifier;
use crate::rules::EncodingRules;
use crate::tag::{Class, Tag};

/// The decoded length of an element's value octets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Length {
    Definite(usize),
    Indefinite,
}

fn map_nom_err(offset: usize, e: nom::Err<nom::error::Error<&[u8]>>) -> Error {
    match e {
        nom::Err::Incomplete(_) => error::TruncatedSnafu { offset }.build(),
        nom::Err::Error(_) => error::TruncatedSnafu { offset }.build(),
        nom::Err::Failure(inner) => match inner.code {
            nom::error::ErrorKind::TooLarge => error::TagTooLargeSnafu { offset }.build(),
            _ => error::MalformedTagSnafu {
                offset,
                reason: "non-minimal multi-byte tag number (leading 0x80 continuation octet)".to_string(),
            }
            .build(),
        },
    }
}

/// Decodes one identifier octet sequence from `input`, returning the
/// identifier and the number of octets consumed.
pub fn decode_identifier(input: &[u8], offset: usize) -> Result<(Identifier, usize)> {
    let (rest, identifier) =
        parse_identifier_octet(input).map_err(|e| map_nom_err(offset, e))?;
    Ok((identifier, input.len() - rest.len()))
}

fn parse_initial_octet(input: &[u8]) -> IResult<&[u8], Identifier> {
    let (input, octet) = nom::bytes::streaming::take(1usize)(input)?;
    let initial_octet = octet[0];

    let class = Class::from_u8((initial_octet & 0xC0) >> 6);
    let constructed = (initial_octet & 0x20) != 0;
    let tag = (initial_octet & 0x1f) as u32;

    Ok((input, Identifier::new(class, constructed, tag)))
}

fn parse_identifier_octet(input: &[u8]) -> IResult<&[u8], Identifier> {
    let (input, identifier) = parse_initial_octet(input)?;

    if identifier.tag.value < 0x1f {
        return Ok((input, identifier));
    }

    let (input, first) = nom::bytes::streaming::take(1usize)(input)?;
    if first[0] == 0x80 {
        // Non-minimal multi-byte tag number: leading continuation octet
        // encodes a redundant high zero digit.
        return Err(nom::Err::Failure(nom::error::Error::new(
            input,
            nom::error::ErrorKind::Verify,
        )));
    }

    let mut value: u64 = (first[0] & 0x7f) as u64;
    let mut rest = input;
    let mut continues = first[0] & 0x80 != 0;
    while continues {
        let (next_rest, byte) = nom::bytes::streaming::take(1usize)(rest)?;
        rest = next_rest;
        value = value
            .checked_shl(7)
            .and_then(|v| v.checked_add((byte[0] & 0x7f) as u64))
            .ok_or_else(|| {
                nom::Err::Failure(nom::error::Error::new(rest, nom::error::ErrorKind::TooLarge))
            })?;
        continues = byte[0] & 0x80 != 0;
    }

    let value: u32 = value
        .try_into()
        .map_err(|_| nom::Err::Failure(nom::error::Error::new(rest, nom::error::ErrorKind::TooLarge)))?;

    if value < 31 {
        // Tag numbers below 31 must use the single-octet short form.
        return Err(nom::Err::Failure(nom::error::Error::new(
            rest,
            nom::error::ErrorKind::Verify,
        )));
    }

    Ok((rest, identifier.tag(value)))
}

/// Encodes the identifier octets for `identifier` into `out`.
pub fn encode_identifier(identifier: Identifier, out: &mut Vec<u8>) {
    const FIVE_BITS: u32 = (1 << 5) - 1;

    let mut tag_byte = identifier.tag.class as u8;
    tag_byte <<= 1;
    tag_byte |= identifier.is_constructed() as u8;
    tag_byte <<= 5;

    let tag_number = identifier.tag.value;
    if identifier.tag.is_short_form() {
        out.push(tag_byte | tag_number as u8);
    } else {
        out.push(tag_byte | FIVE_BITS as u8);
        encode_base128(tag_number, out);
    }
}

/// Encodes `number` as a minimum-length base-128 big-endian sequence with
/// high-bit continuation, per X.690 8.1.2.4.2 / 8.19.
pub fn encode_base128(number: u32, out: &mut Vec<u8>) {
    if number < 0x80 {
        out.push(number as u8);
        return;
    }

    let mut digits = alloc::vec::Vec::new();
    let mut n = number;
    while n > 0 {
        digits.push((n & 0x7f) as u8);
        n >>= 7;
    }
    digits.reverse();

    let last = digits.len() - 1;
    for (i, digit) in digits.into_iter().enumerate() {
        out.push(if i == last { digit } else { digit | 0x80 });
    }
}

/// Decodes a minimum-length base-128 big-endian subidentifier, used by the
/// OBJECT IDENTIFIER codec. Returns the parsed value plus bytes consumed.
pub fn decode_base128(input: &[u8], offset: usize) -> Result<(u64, usize)> {
    if input.is_empty() {
        return error::TruncatedSnafu { offset }.fail();
    }
    if input[0] == 0x80 {
        return error::ValuePaddingSnafu { tag: Tag::OBJECT_IDENTIFIER }.fail();
    }

    let mut value: u64 = 0;
    let mut consumed = 0;
    loop {
        let byte = *input
            .get(consumed)
            .ok_or(error::TruncatedSnafu { offset: offset + consumed }.build())?;
        value = value
            .checked_shl(7)
            .and_then(|v| v.checked_add((byte & 0x7f) as u64))
            .ok_or(error::ValueOverflowSnafu { max_width: 64u32 }.build())?;
        consumed += 1;
        if byte & 0x80 == 0 {
            break;
        }
    }

    Ok((value, consumed))
}

/// Decodes the length octets following an identifier, returning the length
/// and bytes consumed. `is_constructed` and `rules` select the CER/DER
/// restrictions: DER rejects everything but the shortest definite form;
/// CER rejects definite length on constructed elements and rejects
/// definite-long where definite-short would do.
pub fn decode_length(
    input: &[u8],
    offset: usize,
    is_constructed: bool,
    rules: EncodingRules,
) -> Result<(Length, usize)> {
    let first = *input
        .first()
        .ok_or(error::TruncatedSnafu { offset }.build())?;

    if first == 0xff {
        return error::MalformedLengthSnafu {
            offset,
            reason: "reserved length octet 0xFF".to_string(),
        }
        .fail();
    }

    if first == 0x80 {
        if is_constructed && rules.allows_indefinite_length() || rules.requires_indefinite_constructed() && is_constructed {
            return Ok((Length::Indefinite, 1));
        }
        if !is_constructed {
            return error::MalformedLengthSnafu {
                offset,
                reason: "indefinite length on a primitive element".to_string(),
            }
            .fail();
        }
        return error::MalformedLengthSnafu {
            offset,
            reason: "indefinite length not permitted under this encoding rule".to_string(),
        }
        .fail();
    }

    if first & 0x80 == 0 {
        // Definite-short.
        if rules.requires_indefinite_constructed() && is_constructed {
            return error::MalformedLengthSnafu {
                offset,
                reason: "constructed element must use indefinite length under CER".to_string(),
            }
            .fail();
        }
        return Ok((Length::Definite(first as usize), 1));
    }

    // Definite-long.
    if rules.requires_indefinite_constructed() && is_constructed {
        return error::MalformedLengthSnafu {
            offset,
            reason: "constructed element must use indefinite length under CER".to_string(),
        }
        .fail();
    }

    let octet_count = (first & 0x7f) as usize;
    let length_octets = input
        .get(1..1 + octet_count)
        .ok_or(error::TruncatedSnafu { offset: offset + 1 }.build())?;

    if length_octets.first() == Some(&0) {
        return error::MalformedLengthSnafu {
            offset,
            reason: "non-minimal long length form (leading zero octet)".to_string(),
        }
        .fail();
    }

    let mut value: u64 = 0;
    for byte in length_octets {
        value = value
            .checked_shl(8)
            .and_then(|v| v.checked_add(*byte as u64))
            .ok_or(error::ValueOverflowSnafu { max_width: 64u32 }.build())?;
    }
    let value: usize = value
        .try_into()
        .map_err(|_| error::ValueOverflowSnafu { max_width: 64u32 }.build())?;

    if (rules.requires_definite_minimal_length() || rules.is_cer()) && value <= 127 {
        return error::MalformedLengthSnafu {
            offset,
            reason: "definite-long length that fits in definite-short form".to_string(),
        }
        .fail();
    }

    Ok((Length::Definite(value), 1 + octet_count))
}

/// Encodes `len` using the shortest valid definite form. BER/CER both use
/// this for primitives; DER uses it for everything definite.
pub fn encode_definite_length(len: usize, out: &mut Vec<u8>) {
    if len <= 127 {
        out.push(len as u8);
        return;
    }

    let mut digits = alloc::vec::Vec::new();
    let mut n = len as u64;
    while n > 0 {
        digits.push((n & 0xff) as u8);
        n >>= 8;
    }
    digits.reverse();
    out.push(0x80 | digits.len() as u8);
    out.extend_from_slice(&digits);
}

use alloc::string::ToString;
