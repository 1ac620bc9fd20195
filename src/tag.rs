//! Tag classes and the abstract `(class, number)` pair identifying a type.

/// The four ASN.1 tag classes, packed into the top two bits of an identifier
/// octet.
#[derive(Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug)]
pub enum Class {
    Universal = 0,
    Application = 1,
    Context = 2,
    Private = 3,
}

impl Class {
    /// Instantiates a `Class` from its two-bit wire value.
    ///
    /// # Panics
    /// If `value` is greater than 3.
    pub fn from_u8(value: u8) -> Self {
        match value {
            0 => Class::Universal,
            1 => Class::Application,
            2 => Class::Context,
            3 => Class::Private,
            num => panic!("'{num}' is not a valid tag class."),
        }
    }

    pub fn is_universal(self) -> bool {
        self == Class::Universal
    }
}

/// A `(class, number)` pair identifying an element's type in context. Does
/// not carry the construction bit; see [`crate::identifier::Identifier`].
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub struct Tag {
    pub class: Class,
    pub value: u32,
}

impl Tag {
    pub const fn new(class: Class, value: u32) -> Self {
        Self { class, value }
    }

    pub fn set_value(mut self, value: u32) -> Self {
        self.value = value;
        self
    }

    /// True when `value` requires the short (single-octet) tag-number form.
    pub fn is_short_form(&self) -> bool {
        self.value < 0x1f
    }
}

macro_rules! universal_tags {
    ($($name:ident = $value:expr),+ $(,)?) => {
        $(
            pub const $name: Tag = Tag::new(Class::Universal, $value);
        )+
    }
}

impl Tag {
    universal_tags! {
        EOC = 0,
        BOOL = 1,
        INTEGER = 2,
        BIT_STRING = 3,
        OCTET_STRING = 4,
        NULL = 5,
        OBJECT_IDENTIFIER = 6,
        OBJECT_DESCRIPTOR = 7,
        EXTERNAL = 8,
        REAL = 9,
        ENUMERATED = 10,
        EMBEDDED_PDV = 11,
        UTF8_STRING = 12,
        RELATIVE_OID = 13,
        SEQUENCE = 16,
        SET = 17,
        NUMERIC_STRING = 18,
        PRINTABLE_STRING = 19,
        TELETEX_STRING = 20,
        VIDEOTEX_STRING = 21,
        IA5_STRING = 22,
        UTC_TIME = 23,
        GENERALIZED_TIME = 24,
        GRAPHIC_STRING = 25,
        VISIBLE_STRING = 26,
        GENERAL_STRING = 27,
        UNIVERSAL_STRING = 28,
        CHARACTER_STRING = 29,
        BMP_STRING = 30,
    }
}

/// Universal-type tag numbers that are always constructed on the wire,
/// regardless of what a caller passes to [`crate::element::Element::new`].
pub(crate) fn is_always_constructed(tag: Tag) -> bool {
    matches!(
        tag,
        Tag::SEQUENCE | Tag::SET | Tag::EXTERNAL | Tag::EMBEDDED_PDV | Tag::CHARACTER_STRING
    )
}
