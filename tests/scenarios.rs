//! Concrete end-to-end scenarios from specification §8.

use pretty_assertions::assert_eq;

use num_bigint::BigInt;
use x690::identifier::Identifier;
use x690::rules::EncodingRules;
use x690::tag::{Class, Tag};
use x690::types::oid::ObjectIdentifier;
use x690::Element;

fn primitive(tag: Tag, rules: EncodingRules) -> Element {
    Element::new_primitive(Identifier::from_tag(tag, false), rules, Vec::new())
}

#[test]
fn scenario_1_boolean_true() {
    let mut e = primitive(Tag::BOOL, EncodingRules::Der);
    e.set_boolean(true);
    assert_eq!(e.to_bytes(), vec![0x01, 0x01, 0xff]);

    for rules in [EncodingRules::Ber, EncodingRules::Cer, EncodingRules::Der] {
        let decoded = Element::from_bytes(&e.to_bytes(), rules).unwrap();
        assert!(decoded.get_boolean().unwrap());
    }
}

#[test]
fn scenario_2_integer_1433() {
    let mut e = primitive(Tag::INTEGER, EncodingRules::Der);
    e.set_integer_i64(1433);
    assert_eq!(e.to_bytes(), vec![0x02, 0x02, 0x05, 0x99]);

    let decoded = Element::from_bytes(&e.to_bytes(), EncodingRules::Ber).unwrap();
    assert_eq!(decoded.get_integer_i64().unwrap(), 1433);
}

#[test]
fn scenario_3_rsa_oid() {
    let mut e = primitive(Tag::OBJECT_IDENTIFIER, EncodingRules::Der);
    let oid = ObjectIdentifier::new(vec![1, 2, 840, 113549]).unwrap();
    e.set_object_identifier(&oid).unwrap();
    assert_eq!(e.to_bytes(), vec![0x06, 0x06, 0x2a, 0x86, 0x48, 0x86, 0xf7, 0x0d]);

    let decoded = Element::from_bytes(&e.to_bytes(), EncodingRules::Ber).unwrap();
    assert_eq!(decoded.get_object_identifier().unwrap().arcs(), &[1, 2, 840, 113549]);
}

#[test]
fn scenario_4_null_and_malformed_null() {
    let decoded = Element::from_bytes(&[0x05, 0x00], EncodingRules::Der).unwrap();
    assert!(decoded.get_null().is_ok());

    let decoded = Element::from_bytes(&[0x05, 0x01, 0x00], EncodingRules::Der).unwrap();
    assert!(decoded.get_null().is_err());
}

#[test]
fn scenario_5_cer_segmented_octet_string() {
    let input = [0x24, 0x80, 0x04, 0x03, 0x01, 0x02, 0x03, 0x04, 0x02, 0x05, 0x06, 0x00, 0x00];
    let decoded = Element::from_bytes(&input, EncodingRules::Cer).unwrap();
    assert_eq!(decoded.get_octet_string().unwrap(), vec![1, 2, 3, 4, 5, 6]);
}

#[test]
fn scenario_6_sequence_with_integer_and_octet_string() {
    let mut int_elem = primitive(Tag::INTEGER, EncodingRules::Der);
    int_elem.set_integer_i64(1);
    let mut os_elem = primitive(Tag::OCTET_STRING, EncodingRules::Der);
    os_elem.set_octet_string(b"A");
    let seq = Element::new_constructed(
        Identifier::from_tag(Tag::SEQUENCE, true),
        EncodingRules::Der,
        vec![int_elem, os_elem],
    );
    let bytes = seq.to_bytes();
    assert_eq!(bytes, vec![0x30, 0x06, 0x02, 0x01, 0x01, 0x04, 0x01, 0x41]);

    let decoded = Element::from_bytes(&bytes, EncodingRules::Der).unwrap();
    let children = decoded.get_sequence().unwrap();
    assert_eq!(children.len(), 2);
    assert_eq!(children[0].get_integer_i64().unwrap(), 1);
    assert_eq!(children[1].get_octet_string().unwrap(), b"A");
}

#[test]
fn der_output_decodes_under_ber_and_cer() {
    let mut e = primitive(Tag::INTEGER, EncodingRules::Der);
    e.set_integer(&BigInt::from(-70000));
    let bytes = e.to_bytes();
    assert!(Element::from_bytes(&bytes, EncodingRules::Ber).is_ok());
    assert!(Element::from_bytes(&bytes, EncodingRules::Cer).is_ok());
}

#[test]
fn integer_zero_length_content_fails() {
    let decoded = Element::from_bytes(&[0x02, 0x00], EncodingRules::Ber).unwrap();
    assert!(decoded.get_integer().is_err());
}

#[test]
fn integer_redundant_padding_fails_under_cer_der_but_not_ber() {
    let encoded = [0x02, 0x02, 0x00, 0x7f];
    assert!(Element::from_bytes(&encoded, EncodingRules::Ber).unwrap().get_integer().is_ok());
    assert!(Element::from_bytes(&encoded, EncodingRules::Cer).unwrap().get_integer().is_err());
    assert!(Element::from_bytes(&encoded, EncodingRules::Der).unwrap().get_integer().is_err());
}

#[test]
fn oid_subidentifier_leading_continuation_is_padding_error() {
    // second subidentifier octet 0x80 with a following continuation octet.
    let encoded = [0x06, 0x03, 0x2a, 0x80, 0x01];
    let decoded = Element::from_bytes(&encoded, EncodingRules::Ber).unwrap();
    assert!(decoded.get_object_identifier().is_err());
}

#[test]
fn real_unknown_special_octet_is_undefined() {
    let encoded = [0x09, 0x01, 0x44];
    let decoded = Element::from_bytes(&encoded, EncodingRules::Ber).unwrap();
    assert!(decoded.get_real().is_err());
}

#[test]
fn cer_rejects_definite_long_that_fits_short_form() {
    // OCTET STRING, definite-long length field encoding 5 (should be short form).
    let encoded = [0x04, 0x81, 0x05, 0x01, 0x02, 0x03, 0x04, 0x05];
    assert!(Element::from_bytes(&encoded, EncodingRules::Cer).is_err());
    assert!(Element::from_bytes(&encoded, EncodingRules::Der).is_err());
    assert!(Element::from_bytes(&encoded, EncodingRules::Ber).is_ok());
}

#[test]
fn set_of_ordering_is_applied_on_encode() {
    let mut a = primitive(Tag::INTEGER, EncodingRules::Der);
    a.set_integer_i64(2);
    let mut b = primitive(Tag::INTEGER, EncodingRules::Der);
    b.set_integer_i64(1);

    let mut set_elem = Element::new_constructed(Identifier::from_tag(Tag::SET, true), EncodingRules::Der, Vec::new());
    set_elem.set_set_of(vec![a, b]);
    let children = set_elem.get_set().unwrap();
    assert_eq!(children[0].get_integer_i64().unwrap(), 1);
    assert_eq!(children[1].get_integer_i64().unwrap(), 2);
}

#[test]
fn well_known_rule_oids_are_distinct() {
    assert_eq!(x690::types::oid::ber().arcs(), &[2, 1, 1]);
    assert_eq!(x690::types::oid::cer().arcs(), &[2, 1, 2, 0]);
    assert_eq!(x690::types::oid::der().arcs(), &[2, 1, 2, 1]);
}

#[test]
fn class_is_preserved_through_round_trip() {
    let identifier = Identifier::new(Class::Context, false, 3);
    let mut e = Element::new_primitive(identifier, EncodingRules::Der, Vec::new());
    e.set_integer_i64(7);
    let decoded = Element::from_bytes(&e.to_bytes(), EncodingRules::Der).unwrap();
    assert_eq!(decoded.tag().class, Class::Context);
    assert_eq!(decoded.tag().value, 3);
}
