//! `x690`: an ITU-T X.690 BER/CER/DER codec core.
//!
//! This crate implements the tag-length-value wire format shared by the
//! Basic, Canonical, and Distinguished Encoding Rules, and the three
//! progressively stricter canonicalization disciplines those variants
//! enforce. It transforms structured abstract values (booleans,
//! arbitrary-precision integers, reals, object identifiers, bit/octet
//! strings, restricted character strings, time values, and nested
//! sequences/sets) into self-describing byte streams and back.
//!
//! The three rule variants are exposed as distinct, zero-cost façade types
//! over one shared [`element::Element`] core:
//!
//! ```
//! use x690::DerElement;
//! use x690::tag::{Class, Tag};
//!
//! let mut integer = DerElement::new_primitive(Class::Universal, Tag::INTEGER.value, Vec::new());
//! integer.set_integer_i64(1433);
//! assert_eq!(integer.to_bytes(), vec![0x02, 0x02, 0x05, 0x99]);
//!
//! let decoded = DerElement::from_bytes(&integer.to_bytes()).unwrap();
//! assert_eq!(decoded.get_integer_i64().unwrap(), 1433);
//! ```
//!
//! Schema compilation (a module-definition parser), PER/XER/JER/OER and
//! other non-X.690 encoding rules, constraint checking beyond what the
//! encoding rules themselves require, and streaming (partial) decode of a
//! single element are all out of scope; see the crate's design
//! documentation for the full rationale.

#![cfg_attr(not(any(test, feature = "std")), no_std)]

extern crate alloc;

pub mod element;
pub mod error;
pub mod facade;
pub mod identifier;
pub mod parser;
pub mod rules;
pub mod tag;
pub mod types;

pub use element::{DecodeConfig, Element};
pub use error::{DecodeResult, EncodeResult, Error, Result};
pub use facade::{BerElement, CerElement, DerElement};
pub use rules::EncodingRules;
