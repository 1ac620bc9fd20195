//! The flat error taxonomy shared by every decode and encode operation.

use alloc::string::String;
use snafu::Snafu;

use crate::tag::Tag;

/// Every failure a decode or encode operation can surface. Decoding never
/// produces a partially-populated element on error; encoding never emits
/// partial output on error.
#[derive(Debug, Snafu, PartialEq, Eq, Clone)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    /// The input buffer ended before a complete tag, length, or value could
    /// be read.
    #[snafu(display("truncated input: needed more bytes at offset {offset}"))]
    Truncated { offset: usize },

    /// A strict decode was handed more bytes than a single element occupies.
    #[snafu(display(
        "length mismatch: element consumed {consumed} of {total} supplied bytes"
    ))]
    LengthMismatch { consumed: usize, total: usize },

    /// A reserved tag-octet bit pattern, or a non-minimal multi-byte tag
    /// number.
    #[snafu(display("malformed tag at offset {offset}: {reason}"))]
    MalformedTag { offset: usize, reason: String },

    /// A multi-byte tag number exceeded the implementation's ceiling.
    #[snafu(display("tag number at offset {offset} exceeds the implementation ceiling"))]
    TagTooLarge { offset: usize },

    /// Reserved length octet `0xFF`, a non-minimal long form under CER/DER,
    /// or an indefinite length on a primitive element.
    #[snafu(display("malformed length at offset {offset}: {reason}"))]
    MalformedLength { offset: usize, reason: String },

    /// An accessor was invoked against an element whose construction bit
    /// (primitive/constructed) does not match what the universal type
    /// requires.
    #[snafu(display(
        "construction mismatch for tag {tag:?}: expected constructed={expected_constructed}"
    ))]
    ConstructionMismatch { tag: Tag, expected_constructed: bool },

    /// Value octets below or above the valid bound for the type (e.g. an
    /// empty INTEGER, or a non-empty NULL).
    #[snafu(display("invalid value size for tag {tag:?}: {reason}"))]
    ValueSize { tag: Tag, reason: String },

    /// Leading-zero or leading-0xFF padding forbidden by CER/DER.
    #[snafu(display("disallowed value padding for tag {tag:?}"))]
    ValuePadding { tag: Tag },

    /// A restricted-string character fell outside the type's alphabet.
    #[snafu(display("character {character:#x} at position {position} is outside the permitted alphabet"))]
    ValueCharacters { character: u32, position: usize },

    /// A reserved or unspecified sub-encoding, such as an unknown REAL
    /// special-value octet.
    #[snafu(display("undefined value encoding for tag {tag:?}: {reason}"))]
    ValueUndefined { tag: Tag, reason: String },

    /// A decoded value does not fit the caller's requested fixed-width
    /// target.
    #[snafu(display("value overflows the requested {max_width}-bit target"))]
    ValueOverflow { max_width: u32 },

    /// The first or second OBJECT IDENTIFIER arc is out of range.
    #[snafu(display("invalid OBJECT IDENTIFIER: {reason}"))]
    InvalidOid { reason: String },

    /// Nesting of constructed elements exceeded the configured ceiling.
    #[snafu(display("recursion limit of {limit} exceeded"))]
    Recursion { limit: usize },
}

pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Result alias used throughout decode-side code; identical to [`Result`].
/// Kept distinct in name for readability at call sites, matching the
/// spec's description of decode/encode as two directions sharing one
/// taxonomy.
pub type DecodeResult<T> = Result<T>;
/// Result alias used throughout encode-side code; identical to [`Result`].
pub type EncodeResult<T> = Result<T>;

#[cfg(feature = "std")]
impl std::error::Error for Error {}
