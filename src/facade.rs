//! The three public, rule-pinned façades over the shared [`Element`] core
//! (specification §6, Design Notes option (a) reconciled with option (b):
//! callers get compile-time-distinct `BerElement`/`CerElement`/`DerElement`
//! types; the engine underneath is one generically-dispatched
//! implementation keyed on [`EncodingRules`]).

use alloc::vec::Vec;

use crate::element::{DecodeConfig, Element};
use crate::error::Result;
use crate::identifier::Identifier;
use crate::rules::EncodingRules;
use crate::tag::{Class, Tag};

macro_rules! rule_element {
    ($name:ident, $rules:expr, $doc:literal) => {
        #[doc = $doc]
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub struct $name(Element);

        impl $name {
            /// The fixed [`EncodingRules`] this façade pins.
            pub const RULES: EncodingRules = $rules;

            /// The default-empty constructor: a primitive universal-0
            /// (end-of-content) placeholder.
            pub fn new() -> Self {
                Self(Element::new_empty(Self::RULES))
            }

            /// Builds a primitive element with tag `class`/`number` and the
            /// given raw value octets.
            pub fn new_primitive(class: Class, number: u32, value: Vec<u8>) -> Self {
                let identifier = Identifier::new(class, false, number);
                Self(Element::new_primitive(identifier, Self::RULES, value))
            }

            /// Builds a constructed element with tag `class`/`number` and
            /// the given children.
            pub fn new_constructed(class: Class, number: u32, children: Vec<$name>) -> Self {
                let identifier = Identifier::new(class, true, number);
                let inner = children.into_iter().map(|c| c.0).collect();
                Self(Element::new_constructed(identifier, Self::RULES, inner))
            }

            /// Decodes exactly one complete element from `buf` (strict
            /// mode: fails if bytes remain afterward).
            pub fn from_bytes(buf: &[u8]) -> Result<Self> {
                Element::from_bytes(buf, Self::RULES).map(Self)
            }

            /// Decodes exactly one complete element from `buf` using a
            /// caller-supplied [`DecodeConfig`] (e.g. a non-default
            /// recursion ceiling).
            pub fn from_bytes_with_config(buf: &[u8], config: DecodeConfig) -> Result<Self> {
                Element::from_bytes_with_config(buf, Self::RULES, config).map(Self)
            }

            /// Decodes exactly one element beginning at `cursor_in`,
            /// returning the element and the cursor advanced past it.
            pub fn from_bytes_with_cursor(buf: &[u8], cursor_in: usize) -> Result<(Self, usize)> {
                Element::from_bytes_with_cursor(buf, cursor_in, Self::RULES).map(|(e, c)| (Self(e), c))
            }

            /// Unwraps the façade, returning the shared [`Element`] core.
            pub fn into_inner(self) -> Element {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::ops::Deref for $name {
            type Target = Element;
            fn deref(&self) -> &Element {
                &self.0
            }
        }

        impl core::ops::DerefMut for $name {
            fn deref_mut(&mut self) -> &mut Element {
                &mut self.0
            }
        }
    };
}

rule_element!(BerElement, EncodingRules::Ber, "A BER-ruled element: the permissive variant.");
rule_element!(CerElement, EncodingRules::Cer, "A CER-ruled element: canonical, streaming-friendly.");
rule_element!(DerElement, EncodingRules::Der, "A DER-ruled element: canonical, uniquely determined.");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn der_boolean_round_trip() {
        let mut e = DerElement::new_primitive(Class::Universal, Tag::BOOL.value, Vec::new());
        e.set_boolean(true);
        assert_eq!(e.to_bytes(), alloc::vec![0x01, 0x01, 0xff]);
    }

    #[test]
    fn facade_types_are_distinct() {
        fn takes_der(_: &DerElement) {}
        let e = DerElement::new();
        takes_der(&e);
    }
}
