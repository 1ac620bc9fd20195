//! EXTERNAL, EMBEDDED PDV, and CHARACTER STRING: the context-switching
//! record types, each an identification CHOICE plus a data-value octet
//! sequence.
//!
//! These structs model the abstract value only; encoding them as the
//! underlying SEQUENCE (and decoding that SEQUENCE back) is the element
//! layer's job (`crate::element`), since it requires building/walking a
//! tree of [`crate::element::Element`]s.

use alloc::string::String;
use alloc::vec::Vec;
use num_bigint::BigInt;

use crate::error::{self, Result};
use crate::rules::EncodingRules;
use crate::types::oid::ObjectIdentifier;

/// The `identification` CHOICE shared by EMBEDDED PDV and CHARACTER STRING,
/// and (in restricted form) by EXTERNAL's pre-1994 compatibility fields.
#[derive(Debug, Clone, PartialEq)]
pub enum Identification {
    /// `syntaxes [0]`: an (abstract, transfer) OID pair. BER only.
    Syntaxes {
        abstract_id: ObjectIdentifier,
        transfer_id: ObjectIdentifier,
    },
    /// `syntax [1]`: a single OID naming the abstract syntax directly.
    Syntax(ObjectIdentifier),
    /// `presentation-context-id [2]`: an index into a negotiated table.
    PresentationContextId(BigInt),
    /// `context-negotiation [3]`.
    ContextNegotiation {
        presentation_context_id: BigInt,
        transfer_syntax: ObjectIdentifier,
    },
    /// `transfer-syntax [4]`: an OID naming the transfer syntax.
    TransferSyntax(ObjectIdentifier),
    /// `fixed [5]`: a fixed, out-of-band-agreed encoding. BER only.
    Fixed,
}

impl Identification {
    /// Validates that this alternative is legal under `rules` for EMBEDDED
    /// PDV / CHARACTER STRING (`restrict_external = false`) or for
    /// EXTERNAL's identification fields (`restrict_external = true`, which
    /// additionally forbids `presentation-context-id` and
    /// `context-negotiation`).
    pub fn validate(&self, rules: EncodingRules, restrict_external: bool) -> Result<()> {
        let forbidden = match self {
            Identification::Syntaxes { .. } | Identification::Fixed => !rules.is_ber(),
            Identification::PresentationContextId(_) | Identification::ContextNegotiation { .. } => {
                restrict_external && !rules.is_ber()
            }
            Identification::Syntax(_) | Identification::TransferSyntax(_) => false,
        };
        if forbidden {
            return error::ValueUndefinedSnafu {
                tag: crate::tag::Tag::EXTERNAL,
                reason: "this identification alternative is forbidden under CER/DER".into(),
            }
            .fail();
        }
        Ok(())
    }
}

/// EXTERNAL's `encoding` CHOICE: which alternative carries the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExternalEncoding {
    /// `single-ASN1-type [0]`: the data-value octets are a complete encoded
    /// element.
    SingleAsn1Type,
    /// `octet-aligned [1]`: the data-value octets are an OCTET STRING.
    OctetAligned,
    /// `arbitrary [2]`: the data-value octets are a BIT STRING.
    ArbitraryBits,
}

/// A decoded EXTERNAL value (pre-1994 wire-compatible form).
#[derive(Debug, Clone, PartialEq)]
pub struct External {
    pub direct_reference: Option<ObjectIdentifier>,
    pub indirect_reference: Option<BigInt>,
    pub data_value_descriptor: Option<String>,
    pub encoding: ExternalEncoding,
    pub data: Vec<u8>,
}

/// A decoded EMBEDDED PDV value.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddedPdv {
    pub identification: Identification,
    pub data_value_descriptor: Option<String>,
    pub data_value: Vec<u8>,
}

/// A decoded CHARACTER STRING value.
#[derive(Debug, Clone, PartialEq)]
pub struct CharacterString {
    pub identification: Identification,
    pub string_value: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn syntaxes_forbidden_outside_ber() {
        let id = Identification::Syntaxes {
            abstract_id: ObjectIdentifier::new(alloc::vec![1, 2]).unwrap(),
            transfer_id: ObjectIdentifier::new(alloc::vec![1, 3]).unwrap(),
        };
        assert!(id.validate(EncodingRules::Ber, false).is_ok());
        assert!(id.validate(EncodingRules::Der, false).is_err());
    }

    #[test]
    fn presentation_context_id_allowed_outside_external() {
        let id = Identification::PresentationContextId(BigInt::from(1));
        assert!(id.validate(EncodingRules::Der, false).is_ok());
        assert!(id.validate(EncodingRules::Der, true).is_err());
    }
}
