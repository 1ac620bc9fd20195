//! The single dispatch point distinguishing BER, CER, and DER behavior.
//!
//! Every row of the canonicalization table in the specification collapses
//! to a handful of predicates on this enum; the element and codec layers
//! never match on `Ber`/`Cer`/`Der` directly outside of this module.

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EncodingRules {
    Ber,
    Cer,
    Der,
}

impl EncodingRules {
    pub fn is_ber(self) -> bool {
        matches!(self, Self::Ber)
    }

    pub fn is_cer(self) -> bool {
        matches!(self, Self::Cer)
    }

    pub fn is_der(self) -> bool {
        matches!(self, Self::Der)
    }

    /// BER alone permits primitive *or* constructed encoding of BIT STRING,
    /// OCTET STRING, and the restricted string types.
    pub fn allows_constructed_strings(self) -> bool {
        matches!(self, Self::Ber)
    }

    /// CER mandates indefinite length for every constructed encoding; DER
    /// forbids indefinite length outright. Only BER permits either.
    pub fn allows_indefinite_length(self) -> bool {
        matches!(self, Self::Ber)
    }

    /// CER mandates indefinite length for constructed elements: it is the
    /// only encoding rule whose constructed encodings do *not* use definite
    /// length.
    pub fn requires_indefinite_constructed(self) -> bool {
        matches!(self, Self::Cer)
    }

    /// DER (and DER alone) requires the shortest-possible definite length
    /// form, and forbids indefinite length.
    pub fn requires_definite_minimal_length(self) -> bool {
        matches!(self, Self::Der)
    }

    /// CER segments BIT STRING / OCTET STRING / restricted-string values
    /// over this many octets into indefinite-length constructed chunks.
    pub fn max_string_length(self) -> usize {
        match self {
            Self::Cer => 1000,
            _ => usize::MAX,
        }
    }

    /// CER and DER both reject any non-0xFF non-zero BOOLEAN `true` octet on
    /// decode; BER accepts any non-zero octet.
    pub fn requires_ff_boolean(self) -> bool {
        !matches!(self, Self::Ber)
    }

    /// CER and DER reject INTEGER/ENUMERATED leading-octet padding.
    pub fn requires_minimal_integer(self) -> bool {
        !matches!(self, Self::Ber)
    }

    /// CER and DER require a minimum-octet REAL binary exponent.
    pub fn requires_minimal_real_exponent(self) -> bool {
        !matches!(self, Self::Ber)
    }

    /// CER and DER require an odd REAL binary mantissa (or zero).
    pub fn requires_odd_real_mantissa(self) -> bool {
        !matches!(self, Self::Ber)
    }

    /// CER and DER forbid nonzero REAL binary scale-factor bits.
    pub fn requires_zero_real_scale(self) -> bool {
        !matches!(self, Self::Ber)
    }

    /// CER and DER require the unused bits of a BIT STRING's final octet to
    /// be zero, on both decode and encode.
    pub fn requires_zero_unused_bits(self) -> bool {
        !matches!(self, Self::Ber)
    }

    /// CER and DER require NR3-only REAL character-form encodings.
    pub fn requires_nr3_real(self) -> bool {
        !matches!(self, Self::Ber)
    }

    /// CER and DER forbid UTCTime/GeneralizedTime zone offsets, fractional
    /// trailing zeros, and omitted seconds.
    pub fn requires_strict_time(self) -> bool {
        !matches!(self, Self::Ber)
    }

    /// Ordering discipline applied to the children of a SET on encode.
    pub fn set_ordering(self) -> SetOrdering {
        match self {
            Self::Ber => SetOrdering::Unordered,
            Self::Cer => SetOrdering::ByTagBytes,
            Self::Der => SetOrdering::ByEncodedValue,
        }
    }

    /// Ordering discipline applied to the children of a SET OF on encode.
    pub fn set_of_ordering(self) -> SetOrdering {
        match self {
            Self::Ber => SetOrdering::Unordered,
            Self::Cer | Self::Der => SetOrdering::ByEncodedValue,
        }
    }
}

/// How the children of a SET or SET OF must be ordered on encode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOrdering {
    /// No ordering is enforced (BER).
    Unordered,
    /// Ascending order of the identifier (tag class/number) octets (CER SET).
    ByTagBytes,
    /// Ascending lexicographic order of the complete element encoding,
    /// shorter encodings padded with trailing zero octets for comparison
    /// (CER SET OF, DER SET / SET OF).
    ByEncodedValue,
}

/// Lexicographically compares two encoded octet strings the way DER/CER
/// orders SET OF elements: as octet strings, the shorter one padded at its
/// trailing end with zero octets for the comparison.
///
/// ISO/IEC 8825-1:2021, 11.6: "The encodings of the component values of a
/// set-of value shall appear in ascending order, the encodings being
/// compared as octet strings with the shorter components being padded at
/// their trailing end with 0-octets."
pub(crate) fn octet_string_ascending(a: &[u8], b: &[u8]) -> core::cmp::Ordering {
    let max_length = a.len().max(b.len());
    for i in 0..max_length {
        let ai = a.get(i).copied().unwrap_or(0);
        let bi = b.get(i).copied().unwrap_or(0);
        match ai.cmp(&bi) {
            core::cmp::Ordering::Equal => continue,
            ord => return ord,
        }
    }
    core::cmp::Ordering::Equal
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn predicates_split_ber_from_cer_der() {
        assert!(!EncodingRules::Ber.requires_ff_boolean());
        assert!(EncodingRules::Cer.requires_ff_boolean());
        assert!(EncodingRules::Der.requires_ff_boolean());
    }

    #[test]
    fn only_cer_requires_indefinite_constructed() {
        assert!(!EncodingRules::Ber.requires_indefinite_constructed());
        assert!(EncodingRules::Cer.requires_indefinite_constructed());
        assert!(!EncodingRules::Der.requires_indefinite_constructed());
    }

    #[test]
    fn set_ordering_differs_by_rule() {
        assert_eq!(EncodingRules::Ber.set_ordering(), SetOrdering::Unordered);
        assert_eq!(EncodingRules::Cer.set_ordering(), SetOrdering::ByTagBytes);
        assert_eq!(EncodingRules::Der.set_ordering(), SetOrdering::ByEncodedValue);
    }

    #[test]
    fn octet_string_ascending_pads_shorter() {
        // [0x01] padded with a trailing zero equals [0x01, 0x00] exactly.
        assert_eq!(
            octet_string_ascending(&[0x01], &[0x01, 0x00]),
            core::cmp::Ordering::Equal
        );
        // [0x01] padded is [0x01, 0x00], which sorts before [0x01, 0x01].
        assert_eq!(
            octet_string_ascending(&[0x01], &[0x01, 0x01]),
            core::cmp::Ordering::Less
        );
        assert_eq!(
            octet_string_ascending(&[0x02], &[0x01, 0xff]),
            core::cmp::Ordering::Greater
        );
    }
}
