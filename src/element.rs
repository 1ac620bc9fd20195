//! The element abstraction (specification §4.2-4.4): a tagged element
//! record carrying identifier + value octets, with a typed accessor family
//! that interprets those octets per universal type, and the decode state
//! machine `READ_TAG -> READ_LENGTH -> READ_VALUE -> DONE`.
//!
//! This single [`Element`] serves all three encoding rules; the
//! `BerElement`/`CerElement`/`DerElement` façades in [`crate::rule_facade`]
//! pin an [`EncodingRules`] value at construction and `Deref`/`DerefMut` to
//! this type, matching the teacher's single codec core with variant-keyed
//! dispatch.

use alloc::string::{String, ToString};
use alloc::vec::Vec;

use num_bigint::BigInt;

use crate::error::{self, Error, Result};
use crate::identifier::Identifier;
use crate::parser::{self, Length};
use crate::rules::{EncodingRules, SetOrdering};
use crate::tag::{Class, Tag};
use crate::types::{
    bitstring::BitString,
    external::{CharacterString, EmbeddedPdv, External, ExternalEncoding, Identification},
    integer,
    oid::ObjectIdentifier,
    real::{self, Real},
    strings::{self, StringKind},
    time::{self, GeneralizedTime, UtcTime},
};

/// Caller-tunable decode limits. Only the recursion ceiling is exposed
/// today; see specification §5.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeConfig {
    /// Maximum constructed-element nesting depth. Default 256.
    pub max_depth: usize,
}

impl Default for DecodeConfig {
    fn default() -> Self {
        Self { max_depth: 256 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Content {
    Primitive(Vec<u8>),
    Constructed(Vec<Element>),
}

/// A decoded or to-be-encoded BER/CER/DER element: identifier plus value
/// octets (primitive) or child elements (constructed).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    identifier: Identifier,
    rules: EncodingRules,
    content: Content,
}

impl Element {
    /// The default-empty constructor from specification §6: a primitive
    /// universal-0 (end-of-content) placeholder.
    pub fn new_empty(rules: EncodingRules) -> Self {
        Self {
            identifier: Identifier::from_tag(Tag::EOC, false),
            rules,
            content: Content::Primitive(Vec::new()),
        }
    }

    pub fn new_primitive(identifier: Identifier, rules: EncodingRules, value: Vec<u8>) -> Self {
        Self { identifier, rules, content: Content::Primitive(value) }
    }

    pub fn new_constructed(identifier: Identifier, rules: EncodingRules, children: Vec<Element>) -> Self {
        Self { identifier, rules, content: Content::Constructed(children) }
    }

    pub fn rules(&self) -> EncodingRules {
        self.rules
    }

    pub fn identifier(&self) -> Identifier {
        self.identifier
    }

    pub fn tag(&self) -> Tag {
        self.identifier.tag
    }

    pub fn set_tag(&mut self, tag: Tag) {
        self.identifier = Identifier::from_tag(tag, self.identifier.is_constructed());
    }

    pub fn set_class(&mut self, class: Class) {
        self.identifier = Identifier::new(class, self.identifier.is_constructed(), self.identifier.tag.value);
    }

    pub fn is_constructed(&self) -> bool {
        self.identifier.is_constructed()
    }

    pub fn children(&self) -> Option<&[Element]> {
        match &self.content {
            Content::Constructed(c) => Some(c),
            Content::Primitive(_) => None,
        }
    }

    pub fn into_children(self) -> Result<Vec<Element>> {
        match self.content {
            Content::Constructed(c) => Ok(c),
            Content::Primitive(_) => error::ConstructionMismatchSnafu { tag: self.identifier.tag, expected_constructed: true }.fail(),
        }
    }

    fn require_primitive(&self) -> Result<&[u8]> {
        match &self.content {
            Content::Primitive(v) => Ok(v),
            Content::Constructed(_) => {
                error::ConstructionMismatchSnafu { tag: self.identifier.tag, expected_constructed: false }.fail()
            }
        }
    }

    fn require_constructed(&self) -> Result<&[Element]> {
        match &self.content {
            Content::Constructed(c) => Ok(c),
            Content::Primitive(_) => {
                error::ConstructionMismatchSnafu { tag: self.identifier.tag, expected_constructed: true }.fail()
            }
        }
    }

    /// Reconstructs a scalar value's content octets, recursing through any
    /// constructed segmentation (BER constructed strings, CER's 1000-octet
    /// chunking). Used by BIT STRING/OCTET STRING/restricted-string
    /// accessors, which are the only types where "constructed" means
    /// "segmented scalar" rather than "has children of its own type".
    fn reconstruct_segments(&self, rules_check: bool) -> Result<Vec<u8>> {
        match &self.content {
            Content::Primitive(v) => Ok(v.clone()),
            Content::Constructed(children) => {
                if rules_check && self.rules.is_der() {
                    return error::ConstructionMismatchSnafu { tag: self.identifier.tag, expected_constructed: false }.fail();
                }
                let mut out = Vec::new();
                for child in children {
                    out.extend(child.reconstruct_segments(rules_check)?);
                }
                Ok(out)
            }
        }
    }

    // ---- decode -----------------------------------------------------

    /// Decodes exactly one complete element from `buf`. Fails with
    /// [`Error::LengthMismatch`] if bytes remain afterward (strict mode).
    pub fn from_bytes(buf: &[u8], rules: EncodingRules) -> Result<Self> {
        Self::from_bytes_with_config(buf, rules, DecodeConfig::default())
    }

    pub fn from_bytes_with_config(buf: &[u8], rules: EncodingRules, config: DecodeConfig) -> Result<Self> {
        let (element, consumed) = decode_one(buf, 0, rules, 0, &config, false)?;
        if consumed != buf.len() {
            return error::LengthMismatchSnafu { consumed, total: buf.len() }.fail();
        }
        Ok(element)
    }

    /// Decodes exactly one element beginning at `cursor_in`, returning the
    /// element and the cursor advanced past it (streaming mode).
    pub fn from_bytes_with_cursor(buf: &[u8], cursor_in: usize, rules: EncodingRules) -> Result<(Self, usize)> {
        Self::from_bytes_with_cursor_config(buf, cursor_in, rules, DecodeConfig::default())
    }

    pub fn from_bytes_with_cursor_config(
        buf: &[u8],
        cursor_in: usize,
        rules: EncodingRules,
        config: DecodeConfig,
    ) -> Result<(Self, usize)> {
        let slice = buf.get(cursor_in..).ok_or(error::TruncatedSnafu { offset: cursor_in }.build())?;
        let (element, consumed) = decode_one(slice, cursor_in, rules, 0, &config, false)?;
        Ok((element, cursor_in + consumed))
    }

    // ---- encode -------------------------------------------------------

    /// Emits a self-contained encoding obeying `self.rules`'s
    /// canonicalization.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        parser::encode_identifier(self.identifier, &mut out);
        match &self.content {
            Content::Primitive(bytes) => {
                parser::encode_definite_length(bytes.len(), &mut out);
                out.extend_from_slice(bytes);
            }
            Content::Constructed(children) => {
                if self.rules.requires_indefinite_constructed() {
                    out.push(0x80);
                    for child in children {
                        out.extend(child.to_bytes());
                    }
                    out.extend_from_slice(&[0x00, 0x00]);
                } else {
                    let mut value = Vec::new();
                    for child in children {
                        value.extend(child.to_bytes());
                    }
                    parser::encode_definite_length(value.len(), &mut out);
                    out.extend_from_slice(&value);
                }
            }
        }
        out
    }

    // ---- BOOLEAN --------------------------------------------------------

    pub fn get_boolean(&self) -> Result<bool> {
        let content = self.require_primitive()?;
        if content.len() != 1 {
            return error::ValueSizeSnafu { tag: Tag::BOOL, reason: "BOOLEAN content must be exactly one octet".to_string() }.fail();
        }
        let octet = content[0];
        if self.rules.requires_ff_boolean() && octet != 0x00 && octet != 0xff {
            return error::ValuePaddingSnafu { tag: Tag::BOOL }.fail();
        }
        Ok(octet != 0x00)
    }

    pub fn set_boolean(&mut self, value: bool) {
        self.content = Content::Primitive(alloc::vec![if value { 0xff } else { 0x00 }]);
    }

    // ---- INTEGER / ENUMERATED ------------------------------------------

    pub fn get_integer(&self) -> Result<BigInt> {
        let content = self.require_primitive()?;
        integer::decode(self.identifier.tag, content, self.rules)
    }

    pub fn get_integer_i64(&self) -> Result<i64> {
        let content = self.require_primitive()?;
        integer::decode_i64(self.identifier.tag, content, self.rules)
    }

    pub fn set_integer(&mut self, value: &BigInt) {
        self.content = Content::Primitive(integer::encode(value));
    }

    pub fn set_integer_i64(&mut self, value: i64) {
        self.set_integer(&BigInt::from(value));
    }

    /// ENUMERATED shares INTEGER's two's-complement content encoding and
    /// padding rules; this accessor exists only so every universal type in
    /// the data model has its own named `get_T`/`set_T` pair.
    pub fn get_enumerated(&self) -> Result<BigInt> {
        self.get_integer()
    }

    pub fn set_enumerated(&mut self, value: &BigInt) {
        self.set_integer(value)
    }

    // ---- NULL -----------------------------------------------------------

    pub fn get_null(&self) -> Result<()> {
        let content = self.require_primitive()?;
        if !content.is_empty() {
            return error::ValueSizeSnafu { tag: Tag::NULL, reason: "NULL content must be empty".to_string() }.fail();
        }
        Ok(())
    }

    pub fn set_null(&mut self) {
        self.content = Content::Primitive(Vec::new());
    }

    // ---- OBJECT IDENTIFIER -----------------------------------------------

    pub fn get_object_identifier(&self) -> Result<ObjectIdentifier> {
        let content = self.require_primitive()?;
        if content.is_empty() {
            return error::ValueSizeSnafu { tag: Tag::OBJECT_IDENTIFIER, reason: "empty OBJECT IDENTIFIER content".to_string() }.fail();
        }
        let (first, mut cursor) = parser::decode_base128(content, 0)?;
        let (node0, node1) = crate::types::oid::split_first_subidentifier(first)?;
        let mut arcs = alloc::vec![node0, node1];
        while cursor < content.len() {
            let (value, consumed) = parser::decode_base128(&content[cursor..], cursor)?;
            let value: u32 = value.try_into().map_err(|_| error::ValueOverflowSnafu { max_width: 32u32 }.build())?;
            arcs.push(value);
            cursor += consumed;
        }
        ObjectIdentifier::new(arcs)
    }

    pub fn set_object_identifier(&mut self, oid: &ObjectIdentifier) -> Result<()> {
        let arcs = oid.arcs();
        if arcs.len() < 2 {
            return error::InvalidOidSnafu { reason: "an OBJECT IDENTIFIER requires at least two arcs".to_string() }.fail();
        }
        let mut out = Vec::new();
        let combined = crate::types::oid::combine_first_subidentifier(arcs[0], arcs[1]);
        parser::encode_base128(combined as u32, &mut out);
        for &arc in &arcs[2..] {
            parser::encode_base128(arc, &mut out);
        }
        self.content = Content::Primitive(out);
        Ok(())
    }

    // ---- REAL -------------------------------------------------------------

    pub fn get_real(&self) -> Result<Real> {
        let content = self.require_primitive()?;
        real::decode(content, self.rules)
    }

    pub fn set_real(&mut self, value: &Real) -> Result<()> {
        self.content = Content::Primitive(real::encode(value, self.rules)?);
        Ok(())
    }

    // ---- BIT STRING ---------------------------------------------------

    pub fn get_bit_string(&self) -> Result<BitString> {
        match &self.content {
            Content::Primitive(bytes) => BitString::decode_segment(self.identifier.tag, bytes, self.rules),
            Content::Constructed(children) => {
                if self.rules.is_der() {
                    return error::ConstructionMismatchSnafu { tag: self.identifier.tag, expected_constructed: false }.fail();
                }
                let mut bits = bitvec::vec::BitVec::<u8, bitvec::order::Msb0>::new();
                let last = children.len().saturating_sub(1);
                for (i, child) in children.iter().enumerate() {
                    let segment = child.get_bit_string()?;
                    if i != last && segment.len() % 8 != 0 {
                        return error::ValuePaddingSnafu { tag: self.identifier.tag }.fail();
                    }
                    bits.extend_from_bitslice(segment.bits());
                }
                Ok(BitString::from_bitvec(bits))
            }
        }
    }

    pub fn set_bit_string(&mut self, value: &BitString) {
        let max = self.rules.max_string_length() * 8;
        if value.len() <= max {
            self.content = Content::Primitive(value.encode_segment());
            return;
        }
        let mut children = Vec::new();
        let bits = value.bits();
        let mut start = 0usize;
        let chunk_bits = self.rules.max_string_length() * 8;
        while start < bits.len() {
            let end = (start + chunk_bits).min(bits.len());
            let segment = BitString::from_bitvec(bits[start..end].to_bitvec());
            let child_id = Identifier::from_tag(Tag::BIT_STRING, false);
            children.push(Element::new_primitive(child_id, self.rules, segment.encode_segment()));
            start = end;
        }
        self.content = Content::Constructed(children);
    }

    // ---- OCTET STRING -------------------------------------------------

    pub fn get_octet_string(&self) -> Result<Vec<u8>> {
        self.reconstruct_segments(true)
    }

    pub fn set_octet_string(&mut self, value: &[u8]) {
        self.content = segment_octets(self.identifier.tag, self.rules, value);
    }

    // ---- restricted strings ---------------------------------------------

    pub fn get_restricted_string(&self, kind: StringKind) -> Result<Vec<u8>> {
        let content = self.reconstruct_segments(true)?;
        strings::validate(kind, &content)?;
        Ok(content)
    }

    pub fn set_restricted_string(&mut self, kind: StringKind, content: &[u8]) -> Result<()> {
        strings::validate(kind, content)?;
        self.content = segment_octets(kind.tag(), self.rules, content);
        Ok(())
    }

    pub fn get_utf8_string(&self) -> Result<String> {
        let bytes = self.get_restricted_string(StringKind::UTF8String)?;
        String::from_utf8(bytes).map_err(|_| {
            error::ValueCharactersSnafu { character: 0xFFFDu32, position: 0usize }.build()
        })
    }

    pub fn set_utf8_string(&mut self, value: &str) -> Result<()> {
        self.set_restricted_string(StringKind::UTF8String, value.as_bytes())
    }

    pub fn get_universal_string(&self) -> Result<String> {
        let bytes = self.reconstruct_segments(true)?;
        strings::decode_universal_string(&bytes)
    }

    pub fn set_universal_string(&mut self, value: &str) {
        let content = strings::encode_universal_string(value);
        self.content = segment_octets(Tag::UNIVERSAL_STRING, self.rules, &content);
    }

    pub fn get_bmp_string(&self) -> Result<String> {
        let bytes = self.reconstruct_segments(true)?;
        strings::decode_bmp_string(&bytes)
    }

    pub fn set_bmp_string(&mut self, value: &str) -> Result<()> {
        let content = strings::encode_bmp_string(value)?;
        self.content = segment_octets(Tag::BMP_STRING, self.rules, &content);
        Ok(())
    }

    pub fn get_numeric_string(&self) -> Result<Vec<u8>> {
        self.get_restricted_string(StringKind::NumericString)
    }

    pub fn set_numeric_string(&mut self, value: &[u8]) -> Result<()> {
        self.set_restricted_string(StringKind::NumericString, value)
    }

    pub fn get_printable_string(&self) -> Result<Vec<u8>> {
        self.get_restricted_string(StringKind::PrintableString)
    }

    pub fn set_printable_string(&mut self, value: &[u8]) -> Result<()> {
        self.set_restricted_string(StringKind::PrintableString, value)
    }

    pub fn get_ia5_string(&self) -> Result<Vec<u8>> {
        self.get_restricted_string(StringKind::IA5String)
    }

    pub fn set_ia5_string(&mut self, value: &[u8]) -> Result<()> {
        self.set_restricted_string(StringKind::IA5String, value)
    }

    pub fn get_visible_string(&self) -> Result<Vec<u8>> {
        self.get_restricted_string(StringKind::VisibleString)
    }

    pub fn set_visible_string(&mut self, value: &[u8]) -> Result<()> {
        self.set_restricted_string(StringKind::VisibleString, value)
    }

    pub fn get_teletex_string(&self) -> Result<Vec<u8>> {
        self.get_restricted_string(StringKind::TeletexString)
    }

    pub fn set_teletex_string(&mut self, value: &[u8]) -> Result<()> {
        self.set_restricted_string(StringKind::TeletexString, value)
    }

    pub fn get_videotex_string(&self) -> Result<Vec<u8>> {
        self.get_restricted_string(StringKind::VideotexString)
    }

    pub fn set_videotex_string(&mut self, value: &[u8]) -> Result<()> {
        self.set_restricted_string(StringKind::VideotexString, value)
    }

    pub fn get_graphic_string(&self) -> Result<Vec<u8>> {
        self.get_restricted_string(StringKind::GraphicString)
    }

    pub fn set_graphic_string(&mut self, value: &[u8]) -> Result<()> {
        self.set_restricted_string(StringKind::GraphicString, value)
    }

    pub fn get_general_string(&self) -> Result<Vec<u8>> {
        self.get_restricted_string(StringKind::GeneralString)
    }

    pub fn set_general_string(&mut self, value: &[u8]) -> Result<()> {
        self.set_restricted_string(StringKind::GeneralString, value)
    }

    // ---- time -------------------------------------------------------------

    pub fn get_utc_time(&self) -> Result<UtcTime> {
        let content = self.require_primitive()?;
        time::decode_utc_time(content, self.rules)
    }

    pub fn set_utc_time(&mut self, value: &UtcTime) -> Result<()> {
        self.content = Content::Primitive(time::encode_utc_time(value, self.rules)?);
        Ok(())
    }

    pub fn get_generalized_time(&self) -> Result<GeneralizedTime> {
        let content = self.require_primitive()?;
        time::decode_generalized_time(content, self.rules)
    }

    pub fn set_generalized_time(&mut self, value: &GeneralizedTime) -> Result<()> {
        self.content = Content::Primitive(time::encode_generalized_time(value, self.rules)?);
        Ok(())
    }

    // ---- SEQUENCE / SET --------------------------------------------------

    pub fn get_sequence(&self) -> Result<&[Element]> {
        self.require_constructed()
    }

    pub fn set_sequence(&mut self, children: Vec<Element>) {
        self.content = Content::Constructed(children);
    }

    pub fn get_set(&self) -> Result<&[Element]> {
        self.require_constructed()
    }

    /// Sets this element's children as a SET, applying CER/DER's ordering
    /// discipline (BER: unordered; CER: ascending identifier-octet order;
    /// DER: ascending encoded-value order).
    pub fn set_set(&mut self, mut children: Vec<Element>) {
        order_children(&mut children, self.rules.set_ordering());
        self.content = Content::Constructed(children);
    }

    /// Sets this element's children as a SET OF, applying CER/DER's
    /// ordering discipline (BER: unordered; CER/DER: ascending
    /// encoded-value order).
    pub fn set_set_of(&mut self, mut children: Vec<Element>) {
        order_children(&mut children, self.rules.set_of_ordering());
        self.content = Content::Constructed(children);
    }

    // ---- EXTERNAL / EMBEDDED PDV / CHARACTER STRING ----------------------

    pub fn get_external(&self) -> Result<External> {
        let children = self.require_constructed()?;
        let mut idx = 0;
        let direct_reference = if children.get(idx).map(|c| c.tag()) == Some(Tag::OBJECT_IDENTIFIER) {
            let oid = children[idx].get_object_identifier()?;
            idx += 1;
            Some(oid)
        } else {
            None
        };
        let indirect_reference = if children.get(idx).map(|c| c.tag()) == Some(Tag::INTEGER) {
            let n = children[idx].get_integer()?;
            idx += 1;
            Some(n)
        } else {
            None
        };
        external_identification(direct_reference.as_ref(), indirect_reference.as_ref()).validate(self.rules, true)?;
        let data_value_descriptor = if children.get(idx).map(|c| c.tag()) == Some(Tag::OBJECT_DESCRIPTOR) {
            let s = children[idx].get_restricted_string(StringKind::GraphicString)?;
            idx += 1;
            Some(String::from_utf8_lossy(&s).into_owned())
        } else {
            None
        };
        let encoding_elem = children.get(idx).ok_or(
            error::ValueSizeSnafu { tag: Tag::EXTERNAL, reason: "EXTERNAL missing encoding alternative".to_string() }.build(),
        )?;
        let (encoding, data) = match encoding_elem.tag().value {
            0 => (ExternalEncoding::SingleAsn1Type, encoding_elem.reconstruct_segments(false)?),
            1 => (ExternalEncoding::OctetAligned, encoding_elem.reconstruct_segments(true)?),
            2 => (ExternalEncoding::ArbitraryBits, encoding_elem.get_bit_string()?.encode_segment()),
            other => {
                return error::ValueUndefinedSnafu { tag: Tag::EXTERNAL, reason: alloc::format!("unknown EXTERNAL encoding alternative [{other}]") }.fail()
            }
        };
        Ok(External { direct_reference, indirect_reference, data_value_descriptor, encoding, data })
    }

    pub fn set_external(&mut self, value: &External) -> Result<()> {
        external_identification(value.direct_reference.as_ref(), value.indirect_reference.as_ref())
            .validate(self.rules, true)?;
        let mut children = Vec::new();
        if let Some(oid) = &value.direct_reference {
            let mut e = Element::new_primitive(Identifier::from_tag(Tag::OBJECT_IDENTIFIER, false), self.rules, Vec::new());
            e.set_object_identifier(oid)?;
            children.push(e);
        }
        if let Some(n) = &value.indirect_reference {
            let mut e = Element::new_primitive(Identifier::from_tag(Tag::INTEGER, false), self.rules, Vec::new());
            e.set_integer(n);
            children.push(e);
        }
        if let Some(descriptor) = &value.data_value_descriptor {
            let mut e = Element::new_primitive(Identifier::from_tag(Tag::OBJECT_DESCRIPTOR, false), self.rules, Vec::new());
            e.set_restricted_string(StringKind::GraphicString, descriptor.as_bytes())?;
            children.push(e);
        }
        let tag_number = match value.encoding {
            ExternalEncoding::SingleAsn1Type => 0,
            ExternalEncoding::OctetAligned => 1,
            ExternalEncoding::ArbitraryBits => 2,
        };
        let is_constructed = matches!(value.encoding, ExternalEncoding::SingleAsn1Type);
        let encoding_elem = Element::new_primitive(
            Identifier::new(Class::Context, is_constructed, tag_number),
            self.rules,
            value.data.clone(),
        );
        children.push(encoding_elem);
        self.content = Content::Constructed(children);
        Ok(())
    }

    pub fn get_embedded_pdv(&self) -> Result<EmbeddedPdv> {
        let children = self.require_constructed()?;
        let id_elem = children.first().ok_or(
            error::ValueSizeSnafu { tag: Tag::EMBEDDED_PDV, reason: "EMBEDDED PDV missing identification".to_string() }.build(),
        )?;
        let identification = decode_identification(id_elem, self.rules)?;
        identification.validate(self.rules, false)?;
        let mut idx = 1;
        let data_value_descriptor = if children.get(idx).map(|c| c.tag()) == Some(Tag::OBJECT_DESCRIPTOR) {
            let s = children[idx].get_restricted_string(StringKind::GraphicString)?;
            idx += 1;
            Some(String::from_utf8_lossy(&s).into_owned())
        } else {
            None
        };
        let data_value = children
            .get(idx)
            .ok_or(error::ValueSizeSnafu { tag: Tag::EMBEDDED_PDV, reason: "EMBEDDED PDV missing data-value".to_string() }.build())?
            .reconstruct_segments(true)?;
        Ok(EmbeddedPdv { identification, data_value_descriptor, data_value })
    }

    pub fn set_embedded_pdv(&mut self, value: &EmbeddedPdv) -> Result<()> {
        value.identification.validate(self.rules, false)?;
        let mut children = alloc::vec![encode_identification(&value.identification, self.rules)?];
        if let Some(descriptor) = &value.data_value_descriptor {
            let mut e = Element::new_primitive(Identifier::from_tag(Tag::OBJECT_DESCRIPTOR, false), self.rules, Vec::new());
            e.set_restricted_string(StringKind::GraphicString, descriptor.as_bytes())?;
            children.push(e);
        }
        let mut data = Element::new_primitive(Identifier::from_tag(Tag::OCTET_STRING, false), self.rules, Vec::new());
        data.set_octet_string(&value.data_value);
        children.push(data);
        self.content = Content::Constructed(children);
        Ok(())
    }

    pub fn get_character_string(&self) -> Result<CharacterString> {
        let children = self.require_constructed()?;
        let id_elem = children.first().ok_or(
            error::ValueSizeSnafu { tag: Tag::CHARACTER_STRING, reason: "CHARACTER STRING missing identification".to_string() }.build(),
        )?;
        let identification = decode_identification(id_elem, self.rules)?;
        identification.validate(self.rules, false)?;
        let string_value = children
            .get(1)
            .ok_or(error::ValueSizeSnafu { tag: Tag::CHARACTER_STRING, reason: "CHARACTER STRING missing string-value".to_string() }.build())?
            .reconstruct_segments(true)?;
        Ok(CharacterString { identification, string_value })
    }

    pub fn set_character_string(&mut self, value: &CharacterString) -> Result<()> {
        value.identification.validate(self.rules, false)?;
        let mut data = Element::new_primitive(Identifier::from_tag(Tag::OCTET_STRING, false), self.rules, Vec::new());
        data.set_octet_string(&value.string_value);
        self.content = Content::Constructed(alloc::vec![encode_identification(&value.identification, self.rules)?, data]);
        Ok(())
    }
}

/// EXTERNAL's pre-1994 `direct-reference`/`indirect-reference` pair maps
/// onto the unified `Identification` CHOICE per X.690 Annex C.3, so the
/// same CER/DER identification-alternative restriction applies to it.
fn external_identification(direct: Option<&ObjectIdentifier>, indirect: Option<&BigInt>) -> Identification {
    match (direct, indirect) {
        (Some(oid), Some(n)) => Identification::ContextNegotiation {
            presentation_context_id: n.clone(),
            transfer_syntax: oid.clone(),
        },
        (Some(oid), None) => Identification::Syntax(oid.clone()),
        (None, Some(n)) => Identification::PresentationContextId(n.clone()),
        (None, None) => Identification::Fixed,
    }
}

fn decode_identification(element: &Element, _rules: EncodingRules) -> Result<Identification> {
    match element.tag().value {
        0 => {
            let children = element.require_constructed()?;
            let abstract_id = children.first().ok_or(error::ValueSizeSnafu { tag: Tag::EXTERNAL, reason: "missing abstract syntax".to_string() }.build())?.get_object_identifier()?;
            let transfer_id = children.get(1).ok_or(error::ValueSizeSnafu { tag: Tag::EXTERNAL, reason: "missing transfer syntax".to_string() }.build())?.get_object_identifier()?;
            Ok(Identification::Syntaxes { abstract_id, transfer_id })
        }
        1 => Ok(Identification::Syntax(element.get_object_identifier()?)),
        2 => Ok(Identification::PresentationContextId(element.get_integer()?)),
        3 => {
            let children = element.require_constructed()?;
            let presentation_context_id = children.first().ok_or(error::ValueSizeSnafu { tag: Tag::EXTERNAL, reason: "missing presentation-context-id".to_string() }.build())?.get_integer()?;
            let transfer_syntax = children.get(1).ok_or(error::ValueSizeSnafu { tag: Tag::EXTERNAL, reason: "missing transfer-syntax".to_string() }.build())?.get_object_identifier()?;
            Ok(Identification::ContextNegotiation { presentation_context_id, transfer_syntax })
        }
        4 => Ok(Identification::TransferSyntax(element.get_object_identifier()?)),
        5 => Ok(Identification::Fixed),
        other => error::ValueUndefinedSnafu { tag: Tag::EXTERNAL, reason: alloc::format!("unknown identification alternative [{other}]") }.fail(),
    }
}

fn encode_identification(identification: &Identification, rules: EncodingRules) -> Result<Element> {
    Ok(match identification {
        Identification::Syntaxes { abstract_id, transfer_id } => {
            let mut a = Element::new_primitive(Identifier::from_tag(Tag::OBJECT_IDENTIFIER, false), rules, Vec::new());
            a.set_object_identifier(abstract_id)?;
            let mut t = Element::new_primitive(Identifier::from_tag(Tag::OBJECT_IDENTIFIER, false), rules, Vec::new());
            t.set_object_identifier(transfer_id)?;
            Element::new_constructed(Identifier::new(Class::Context, true, 0), rules, alloc::vec![a, t])
        }
        Identification::Syntax(oid) => {
            let mut e = Element::new_primitive(Identifier::new(Class::Context, false, 1), rules, Vec::new());
            e.set_object_identifier(oid)?;
            e
        }
        Identification::PresentationContextId(n) => {
            let mut e = Element::new_primitive(Identifier::new(Class::Context, false, 2), rules, Vec::new());
            e.set_integer(n);
            e
        }
        Identification::ContextNegotiation { presentation_context_id, transfer_syntax } => {
            let mut p = Element::new_primitive(Identifier::from_tag(Tag::INTEGER, false), rules, Vec::new());
            p.set_integer(presentation_context_id);
            let mut t = Element::new_primitive(Identifier::from_tag(Tag::OBJECT_IDENTIFIER, false), rules, Vec::new());
            t.set_object_identifier(transfer_syntax)?;
            Element::new_constructed(Identifier::new(Class::Context, true, 3), rules, alloc::vec![p, t])
        }
        Identification::TransferSyntax(oid) => {
            let mut e = Element::new_primitive(Identifier::new(Class::Context, false, 4), rules, Vec::new());
            e.set_object_identifier(oid)?;
            e
        }
        Identification::Fixed => Element::new_primitive(Identifier::new(Class::Context, false, 5), rules, Vec::new()),
    })
}

fn segment_octets(tag: Tag, rules: EncodingRules, content: &[u8]) -> Content {
    let max = rules.max_string_length();
    if content.len() <= max {
        return Content::Primitive(content.to_vec());
    }
    let children = content
        .chunks(max)
        .map(|chunk| Element::new_primitive(Identifier::from_tag(tag, false), rules, chunk.to_vec()))
        .collect();
    Content::Constructed(children)
}

fn order_children(children: &mut [Element], ordering: SetOrdering) {
    match ordering {
        SetOrdering::Unordered => {}
        SetOrdering::ByTagBytes => {
            children.sort_by(|a, b| {
                let mut ab = Vec::new();
                parser::encode_identifier(a.identifier, &mut ab);
                let mut bb = Vec::new();
                parser::encode_identifier(b.identifier, &mut bb);
                crate::rules::octet_string_ascending(&ab, &bb)
            });
        }
        SetOrdering::ByEncodedValue => {
            children.sort_by(|a, b| crate::rules::octet_string_ascending(&a.to_bytes(), &b.to_bytes()));
        }
    }
}

// ---- decode state machine --------------------------------------------

fn decode_one(
    input: &[u8],
    offset: usize,
    rules: EncodingRules,
    depth: usize,
    config: &DecodeConfig,
    allow_eoc: bool,
) -> Result<(Element, usize)> {
    if depth > config.max_depth {
        return error::RecursionSnafu { limit: config.max_depth }.fail();
    }

    let (identifier, tag_len) = parser::decode_identifier(input, offset)?;
    if identifier.tag == Tag::EOC && !allow_eoc {
        return error::MalformedTagSnafu {
            offset,
            reason: "end-of-content marker outside an indefinite-length terminator position".to_string(),
        }
        .fail();
    }
    if identifier.tag.class.is_universal()
        && crate::tag::is_always_constructed(identifier.tag)
        && !identifier.is_constructed()
    {
        return error::ConstructionMismatchSnafu { tag: identifier.tag, expected_constructed: true }.fail();
    }
    let rest = &input[tag_len..];
    let (length, len_len) = parser::decode_length(rest, offset + tag_len, identifier.is_constructed(), rules)?;
    let value_start = tag_len + len_len;

    match length {
        Length::Definite(n) => {
            let value = input
                .get(value_start..value_start + n)
                .ok_or(error::TruncatedSnafu { offset: offset + value_start }.build())?;
            if identifier.is_constructed() {
                let children = decode_children_definite(value, offset + value_start, rules, depth + 1, config)?;
                Ok((Element { identifier, rules, content: Content::Constructed(children) }, value_start + n))
            } else {
                Ok((Element { identifier, rules, content: Content::Primitive(value.to_vec()) }, value_start + n))
            }
        }
        Length::Indefinite => {
            let value_input = &input[value_start..];
            let (children, consumed) = decode_children_indefinite(value_input, offset + value_start, rules, depth + 1, config)?;
            Ok((Element { identifier, rules, content: Content::Constructed(children) }, value_start + consumed))
        }
    }
}

fn decode_children_definite(
    mut input: &[u8],
    mut offset: usize,
    rules: EncodingRules,
    depth: usize,
    config: &DecodeConfig,
) -> Result<Vec<Element>> {
    let mut children = Vec::new();
    while !input.is_empty() {
        let (child, consumed) = decode_one(input, offset, rules, depth, config, false)?;
        children.push(child);
        input = &input[consumed..];
        offset += consumed;
    }
    Ok(children)
}

fn decode_children_indefinite(
    mut input: &[u8],
    mut offset: usize,
    rules: EncodingRules,
    depth: usize,
    config: &DecodeConfig,
) -> Result<(Vec<Element>, usize)> {
    let mut children = Vec::new();
    let mut total = 0usize;
    loop {
        let (child, consumed) = decode_one(input, offset, rules, depth, config, true)?;
        total += consumed;
        if child.tag() == Tag::EOC && !child.is_constructed() {
            match &child.content {
                Content::Primitive(v) if v.is_empty() => return Ok((children, total)),
                _ => return error::MalformedLengthSnafu { offset, reason: "non-empty end-of-content marker".to_string() }.fail(),
            }
        }
        children.push(child);
        input = &input[consumed..];
        offset += consumed;
        if input.is_empty() {
            return error::TruncatedSnafu { offset }.fail();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identifier::Identifier;

    fn prim(tag: Tag, rules: EncodingRules, value: Vec<u8>) -> Element {
        Element::new_primitive(Identifier::from_tag(tag, false), rules, value)
    }

    #[test]
    fn boolean_true_der() {
        let mut e = prim(Tag::BOOL, EncodingRules::Der, Vec::new());
        e.set_boolean(true);
        assert_eq!(e.to_bytes(), alloc::vec![0x01, 0x01, 0xff]);
        assert!(e.get_boolean().unwrap());
    }

    #[test]
    fn der_rejects_non_ff_true() {
        let e = prim(Tag::BOOL, EncodingRules::Der, alloc::vec![0x01]);
        assert!(e.get_boolean().is_err());
        let e = prim(Tag::BOOL, EncodingRules::Ber, alloc::vec![0x01]);
        assert!(e.get_boolean().unwrap());
    }

    #[test]
    fn integer_roundtrip_1433() {
        let mut e = prim(Tag::INTEGER, EncodingRules::Der, Vec::new());
        e.set_integer_i64(1433);
        assert_eq!(e.to_bytes(), alloc::vec![0x02, 0x02, 0x05, 0x99]);
        let (decoded, consumed) = Element::from_bytes_with_cursor(&e.to_bytes(), 0, EncodingRules::Ber).unwrap();
        assert_eq!(consumed, 4);
        assert_eq!(decoded.get_integer_i64().unwrap(), 1433);
    }

    #[test]
    fn null_roundtrip() {
        let decoded = Element::from_bytes(&[0x05, 0x00], EncodingRules::Der).unwrap();
        assert!(decoded.get_null().is_ok());
        assert!(Element::from_bytes(&[0x05, 0x01, 0x00], EncodingRules::Der).unwrap().get_null().is_err());
    }

    #[test]
    fn length_mismatch_on_trailing_bytes() {
        assert!(matches!(
            Element::from_bytes(&[0x05, 0x00, 0xff], EncodingRules::Der),
            Err(Error::LengthMismatch { .. })
        ));
    }

    #[test]
    fn recursion_limit_enforced() {
        let mut buf = Vec::new();
        for _ in 0..10 {
            buf.push(0x30);
            buf.push(0x02);
        }
        buf.push(0x05);
        buf.push(0x00);
        let config = DecodeConfig { max_depth: 3 };
        assert!(matches!(
            Element::from_bytes_with_config(&buf, EncodingRules::Ber, config),
            Err(Error::Recursion { .. })
        ));
    }

    #[test]
    fn cer_octet_string_segmentation_example() {
        // CER `24 80 04 03 01 02 03 04 02 05 06 00 00`.
        let input = [0x24, 0x80, 0x04, 0x03, 0x01, 0x02, 0x03, 0x04, 0x02, 0x05, 0x06, 0x00, 0x00];
        let decoded = Element::from_bytes(&input, EncodingRules::Cer).unwrap();
        assert_eq!(decoded.get_octet_string().unwrap(), alloc::vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn sequence_with_integer_and_octet_string() {
        let mut int_elem = prim(Tag::INTEGER, EncodingRules::Der, Vec::new());
        int_elem.set_integer_i64(1);
        let mut os_elem = prim(Tag::OCTET_STRING, EncodingRules::Der, Vec::new());
        os_elem.set_octet_string(b"A");
        let mut seq = Element::new_constructed(Identifier::from_tag(Tag::SEQUENCE, true), EncodingRules::Der, alloc::vec![int_elem, os_elem]);
        let bytes = seq.to_bytes();
        assert_eq!(bytes, alloc::vec![0x30, 0x06, 0x02, 0x01, 0x01, 0x04, 0x01, 0x41]);
        let decoded = Element::from_bytes(&bytes, EncodingRules::Der).unwrap();
        let children = decoded.get_sequence().unwrap();
        assert_eq!(children.len(), 2);
        assert_eq!(children[0].get_integer_i64().unwrap(), 1);
        assert_eq!(children[1].get_octet_string().unwrap(), b"A");
        let _ = &mut seq;
    }

    #[test]
    fn oid_rsa_example() {
        let mut e = prim(Tag::OBJECT_IDENTIFIER, EncodingRules::Der, Vec::new());
        let oid = ObjectIdentifier::new(alloc::vec![1, 2, 840, 113549]).unwrap();
        e.set_object_identifier(&oid).unwrap();
        assert_eq!(e.to_bytes(), alloc::vec![0x06, 0x06, 0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d]);
        let decoded = Element::from_bytes(&e.to_bytes(), EncodingRules::Ber).unwrap();
        assert_eq!(decoded.get_object_identifier().unwrap().arcs(), &[1, 2, 840, 113549]);
    }

    #[test]
    fn indefinite_length_at_top_level_must_close() {
        assert!(Element::from_bytes(&[0x30, 0x80, 0x00, 0x00], EncodingRules::Ber).is_ok());
        assert!(Element::from_bytes(&[0x30, 0x80, 0x00], EncodingRules::Ber).is_err());
    }

    #[test]
    fn standalone_eoc_is_rejected_everywhere_but_its_terminator_position() {
        // A bare EOC at the top level is not a real element.
        assert!(matches!(
            Element::from_bytes(&[0x00, 0x00], EncodingRules::Ber),
            Err(Error::MalformedTag { .. })
        ));
        // Nor as a child of a definite-length constructed element.
        assert!(matches!(
            Element::from_bytes(&[0x30, 0x02, 0x00, 0x00], EncodingRules::Ber),
            Err(Error::MalformedTag { .. })
        ));
        // It is only legal as the terminator of an indefinite-length value.
        assert!(Element::from_bytes(&[0x30, 0x80, 0x00, 0x00], EncodingRules::Ber).is_ok());
    }

    #[test]
    fn universal_sequence_tag_rejects_primitive_wire_form() {
        // Tag number 16 (SEQUENCE), universal class, but construction bit clear.
        assert!(matches!(
            Element::from_bytes(&[0x10, 0x00], EncodingRules::Ber),
            Err(Error::ConstructionMismatch { expected_constructed: true, .. })
        ));
        // A context-specific tag reusing number 16 is unaffected.
        assert!(Element::from_bytes(&[0x90, 0x00], EncodingRules::Ber).is_ok());
    }

    #[test]
    fn numeric_string_named_accessor_roundtrip() {
        let mut e = prim(Tag::NUMERIC_STRING, EncodingRules::Der, Vec::new());
        e.set_numeric_string(b"12 34").unwrap();
        let decoded = Element::from_bytes(&e.to_bytes(), EncodingRules::Ber).unwrap();
        assert_eq!(decoded.get_numeric_string().unwrap(), b"12 34");
        assert!(e.set_numeric_string(b"12a").is_err());
    }

    #[test]
    fn printable_string_named_accessor_roundtrip() {
        let mut e = prim(Tag::PRINTABLE_STRING, EncodingRules::Der, Vec::new());
        e.set_printable_string(b"Hello, World.").unwrap();
        let decoded = Element::from_bytes(&e.to_bytes(), EncodingRules::Ber).unwrap();
        assert_eq!(decoded.get_printable_string().unwrap(), b"Hello, World.");
        assert!(e.set_printable_string(b"100%").is_err());
    }

    #[test]
    fn ia5_string_named_accessor_roundtrip() {
        let mut e = prim(Tag::IA5_STRING, EncodingRules::Der, Vec::new());
        e.set_ia5_string(b"ascii only").unwrap();
        let decoded = Element::from_bytes(&e.to_bytes(), EncodingRules::Ber).unwrap();
        assert_eq!(decoded.get_ia5_string().unwrap(), b"ascii only");
        assert!(e.set_ia5_string(&[0xff]).is_err());
    }

    #[test]
    fn visible_string_named_accessor_roundtrip() {
        let mut e = prim(Tag::VISIBLE_STRING, EncodingRules::Der, Vec::new());
        e.set_visible_string(&[0x00, 0xff, 0x80]).unwrap();
        let decoded = Element::from_bytes(&e.to_bytes(), EncodingRules::Ber).unwrap();
        assert_eq!(decoded.get_visible_string().unwrap(), &[0x00, 0xff, 0x80]);
    }

    #[test]
    fn teletex_string_named_accessor_roundtrip() {
        let mut e = prim(Tag::TELETEX_STRING, EncodingRules::Der, Vec::new());
        e.set_teletex_string(&[0x00, 0xff, 0x80]).unwrap();
        let decoded = Element::from_bytes(&e.to_bytes(), EncodingRules::Ber).unwrap();
        assert_eq!(decoded.get_teletex_string().unwrap(), &[0x00, 0xff, 0x80]);
    }

    #[test]
    fn videotex_string_named_accessor_roundtrip() {
        let mut e = prim(Tag::VIDEOTEX_STRING, EncodingRules::Der, Vec::new());
        e.set_videotex_string(&[0x00, 0xff, 0x80]).unwrap();
        let decoded = Element::from_bytes(&e.to_bytes(), EncodingRules::Ber).unwrap();
        assert_eq!(decoded.get_videotex_string().unwrap(), &[0x00, 0xff, 0x80]);
    }

    #[test]
    fn graphic_string_named_accessor_roundtrip() {
        let mut e = prim(Tag::GRAPHIC_STRING, EncodingRules::Der, Vec::new());
        e.set_graphic_string(&[0x00, 0xff, 0x80]).unwrap();
        let decoded = Element::from_bytes(&e.to_bytes(), EncodingRules::Ber).unwrap();
        assert_eq!(decoded.get_graphic_string().unwrap(), &[0x00, 0xff, 0x80]);
    }

    #[test]
    fn general_string_named_accessor_roundtrip() {
        let mut e = prim(Tag::GENERAL_STRING, EncodingRules::Der, Vec::new());
        e.set_general_string(&[0x00, 0xff, 0x80]).unwrap();
        let decoded = Element::from_bytes(&e.to_bytes(), EncodingRules::Ber).unwrap();
        assert_eq!(decoded.get_general_string().unwrap(), &[0x00, 0xff, 0x80]);
    }

    #[test]
    fn external_context_negotiation_rejected_under_der() {
        let value = External {
            direct_reference: Some(ObjectIdentifier::new(alloc::vec![1, 2, 3]).unwrap()),
            indirect_reference: Some(BigInt::from(7)),
            data_value_descriptor: None,
            encoding: ExternalEncoding::OctetAligned,
            data: alloc::vec![0xaa],
        };
        let mut e = Element::new_constructed(Identifier::from_tag(Tag::EXTERNAL, true), EncodingRules::Der, Vec::new());
        assert!(matches!(e.set_external(&value), Err(Error::ValueUndefined { .. })));

        let mut e = Element::new_constructed(Identifier::from_tag(Tag::EXTERNAL, true), EncodingRules::Ber, Vec::new());
        e.set_external(&value).unwrap();
        let decoded = Element::from_bytes(&e.to_bytes(), EncodingRules::Ber).unwrap();
        assert_eq!(decoded.get_external().unwrap(), value);

        // A BER-encoded context-negotiation EXTERNAL must still be rejected
        // when decoded under DER.
        assert!(matches!(
            Element::from_bytes(&e.to_bytes(), EncodingRules::Der),
            Err(Error::ValueUndefined { .. })
        ));
    }
}
