//! BIT STRING: a bit-addressable string backed by [`bitvec`].
//!
//! Segmentation into CER's 1000-octet constructed chunks, and the
//! primitive/constructed construction-bit choice generally, are handled by
//! the element layer (`crate::element`); this module only covers the
//! per-segment octet <-> bit conversion and the unused-bits invariant.

use alloc::vec::Vec;
use bitvec::prelude::*;

use crate::error::{self, Result};
use crate::rules::EncodingRules;
use crate::tag::Tag;

/// An ASN.1 BIT STRING value: an ordered sequence of bits, most significant
/// bit of each octet first.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BitString(BitVec<u8, Msb0>);

impl BitString {
    pub fn from_bitvec(bits: BitVec<u8, Msb0>) -> Self {
        Self(bits)
    }

    pub fn bits(&self) -> &BitSlice<u8, Msb0> {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Decodes one primitive BIT STRING segment: a leading unused-bits count
    /// octet followed by the packed bits.
    pub fn decode_segment(tag: Tag, content: &[u8], rules: EncodingRules) -> Result<Self> {
        let unused = *content
            .first()
            .ok_or(error::ValueSizeSnafu { tag, reason: "BIT STRING missing unused-bits octet".into() }.build())?;
        if unused > 7 {
            return error::ValueSizeSnafu { tag, reason: "unused-bits count exceeds 7".into() }.fail();
        }
        let octets = &content[1..];
        if unused > 0 && octets.is_empty() {
            return error::ValueSizeSnafu {
                tag,
                reason: "nonzero unused-bits count with no content octets".into(),
            }
            .fail();
        }

        if unused > 0 && rules.requires_zero_unused_bits() {
            // CER/DER: trailing unused bits of the last octet must be zero.
            if let Some(&last) = octets.last() {
                let mask = (1u8 << unused) - 1;
                if last & mask != 0 {
                    return error::ValuePaddingSnafu { tag }.fail();
                }
            }
        }

        let mut bits = BitVec::<u8, Msb0>::from_slice(octets);
        bits.truncate(bits.len() - unused as usize);
        Ok(Self(bits))
    }

    /// Encodes this value as one primitive segment: unused-bits octet plus
    /// packed content. `rules` controls whether trailing unused bits are
    /// forced to zero (always done here; BER tolerates but never requires
    /// non-zero trailing bits, so zeroing is always a valid choice).
    pub fn encode_segment(&self) -> Vec<u8> {
        let unused = (8 - (self.0.len() % 8)) % 8;
        let mut padded = self.0.clone();
        padded.resize(padded.len() + unused, false);
        let mut out = alloc::vec![unused as u8];
        out.extend_from_slice(padded.as_raw_slice());
        out
    }
}

impl From<BitVec<u8, Msb0>> for BitString {
    fn from(bits: BitVec<u8, Msb0>) -> Self {
        Self(bits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_segment() {
        let mut bits = BitVec::<u8, Msb0>::new();
        bits.extend([true, false, true, true, false]);
        let value = BitString::from_bitvec(bits.clone());
        let encoded = value.encode_segment();
        let decoded = BitString::decode_segment(Tag::BIT_STRING, &encoded, EncodingRules::Ber).unwrap();
        assert_eq!(decoded.bits(), bits.as_bitslice());
    }

    #[test]
    fn der_rejects_nonzero_trailing_bits() {
        // unused=3, octet=0b1010_0111 -> low 3 bits (111) nonzero: invalid under DER.
        assert!(BitString::decode_segment(Tag::BIT_STRING, &[3, 0b1010_0111], EncodingRules::Der).is_err());
        assert!(BitString::decode_segment(Tag::BIT_STRING, &[3, 0b1010_0000], EncodingRules::Der).is_ok());
    }

    #[test]
    fn rejects_unused_without_octets() {
        assert!(BitString::decode_segment(Tag::BIT_STRING, &[3], EncodingRules::Ber).is_err());
        assert!(BitString::decode_segment(Tag::BIT_STRING, &[0], EncodingRules::Ber).is_ok());
    }
}
