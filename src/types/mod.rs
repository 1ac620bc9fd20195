//! The universal ASN.1 value-type model (specification §3): in-memory
//! representations for every built-in type, independent of any one encoding
//! rule's wire discipline.

pub mod bitstring;
pub mod external;
pub mod integer;
pub mod oid;
pub mod real;
pub mod strings;
pub mod time;

pub use bitstring::BitString;
pub use external::{CharacterString, EmbeddedPdv, External, ExternalEncoding, Identification};
pub use oid::ObjectIdentifier;
pub use real::Real;
pub use strings::StringKind;
pub use time::{GeneralizedTime, TimeZone, UtcTime};
