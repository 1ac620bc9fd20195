//! OBJECT IDENTIFIER: an ordered sequence of arc numbers, optionally paired
//! with human-readable descriptors.

use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

use crate::error::{self, Result};

/// The largest value the first arc (`node0`) may take.
pub const MAX_FIRST_ARC: u32 = 2;
/// The largest value the second arc may take when `node0 ∈ {0, 1}`.
pub const MAX_SECOND_ARC_LOW: u32 = 39;
/// The largest value the second arc may take when `node0 == 2`, per the
/// X.660 joint-iso-itu-t allocation range fixed by the specification.
pub const MAX_SECOND_ARC_HIGH: u32 = 175;

/// An OBJECT IDENTIFIER: at least two non-negative arc numbers, each
/// optionally paired with a graphical-ASCII descriptor.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct ObjectIdentifier {
    arcs: Vec<u32>,
    descriptors: Vec<Option<String>>,
}

impl ObjectIdentifier {
    /// Builds an `ObjectIdentifier` from raw arc numbers, validating the
    /// first/second-arc constraints.
    pub fn new(arcs: Vec<u32>) -> Result<Self> {
        validate_arcs(&arcs)?;
        let len = arcs.len();
        Ok(Self {
            arcs,
            descriptors: alloc::vec![None; len],
        })
    }

    /// Builds an `ObjectIdentifier` from `(arc, descriptor)` pairs.
    pub fn with_descriptors(nodes: Vec<(u32, Option<String>)>) -> Result<Self> {
        let (arcs, descriptors): (Vec<u32>, Vec<Option<String>>) = nodes.into_iter().unzip();
        validate_arcs(&arcs)?;
        for descriptor in descriptors.iter().flatten() {
            if !descriptor.is_ascii() || descriptor.chars().any(|c| c.is_ascii_control()) {
                return error::InvalidOidSnafu {
                    reason: format!("descriptor {descriptor:?} is not graphical ASCII"),
                }
                .fail();
            }
        }
        Ok(Self { arcs, descriptors })
    }

    pub fn arcs(&self) -> &[u32] {
        &self.arcs
    }

    pub fn descriptor(&self, index: usize) -> Option<&str> {
        self.descriptors.get(index)?.as_deref()
    }

    /// Renders the OID in dotted-decimal form, optionally interleaving each
    /// node's descriptor in parentheses. This is the sole effect of the
    /// opt-in "display descriptors" setting described in the
    /// specification's concurrency model — a per-call argument, never a
    /// process-wide toggle.
    pub fn to_display_string(&self, show_descriptors: bool) -> String {
        let mut out = String::new();
        for (i, arc) in self.arcs.iter().enumerate() {
            if i > 0 {
                out.push('.');
            }
            out.push_str(&arc.to_string());
            if show_descriptors {
                if let Some(d) = self.descriptor(i) {
                    out.push_str(&format!("({d})"));
                }
            }
        }
        out
    }
}

impl AsRef<[u32]> for ObjectIdentifier {
    fn as_ref(&self) -> &[u32] {
        &self.arcs
    }
}

impl core::fmt::Display for ObjectIdentifier {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.to_display_string(false))
    }
}

fn validate_arcs(arcs: &[u32]) -> Result<()> {
    if arcs.len() < 2 {
        return error::InvalidOidSnafu {
            reason: "an OBJECT IDENTIFIER requires at least two arcs".to_string(),
        }
        .fail();
    }
    let node0 = arcs[0];
    let node1 = arcs[1];
    if node0 > MAX_FIRST_ARC {
        return error::InvalidOidSnafu {
            reason: format!("first arc {node0} exceeds {MAX_FIRST_ARC}"),
        }
        .fail();
    }
    let max_second = if node0 == 2 { MAX_SECOND_ARC_HIGH } else { MAX_SECOND_ARC_LOW };
    if node1 > max_second {
        return error::InvalidOidSnafu {
            reason: format!("second arc {node1} exceeds {max_second} for first arc {node0}"),
        }
        .fail();
    }
    Ok(())
}

/// Splits the combined first subidentifier `40 * node0 + node1` back into
/// its two arcs, choosing `node0` as the largest value in `{0, 1, 2}`
/// satisfying the second-arc range for that choice.
pub fn split_first_subidentifier(value: u64) -> Result<(u32, u32)> {
    const THRESHOLD: u64 = (MAX_SECOND_ARC_LOW as u64 + 1) * 2;
    let (node0, node1) = if value >= THRESHOLD {
        (2u64, value - THRESHOLD)
    } else {
        (value / (MAX_SECOND_ARC_LOW as u64 + 1), value % (MAX_SECOND_ARC_LOW as u64 + 1))
    };

    let node0: u32 = node0
        .try_into()
        .map_err(|_| error::InvalidOidSnafu { reason: "first arc overflow".to_string() }.build())?;
    let node1: u32 = node1
        .try_into()
        .map_err(|_| error::ValueOverflowSnafu { max_width: 32u32 }.build())?;

    Ok((node0, node1))
}

/// Combines the first two arcs into the single wire subidentifier value.
pub fn combine_first_subidentifier(node0: u32, node1: u32) -> u64 {
    (node0 as u64) * (MAX_SECOND_ARC_LOW as u64 + 1) + node1 as u64
}

/// The well-known BER registration OID `{2 1 1}`, as its raw arcs. A true
/// `const ObjectIdentifier` isn't possible: the type is backed by `Vec<u32>`/
/// `Vec<Option<String>>`, neither of which is const-constructible on stable
/// Rust, so the arcs are published as the const value and [`ber`] builds the
/// owned type from them on demand.
pub const BER_ARCS: [u32; 3] = [2, 1, 1];
/// The well-known CER registration OID `{2 1 2 0}`, as its raw arcs.
pub const CER_ARCS: [u32; 4] = [2, 1, 2, 0];
/// The well-known DER registration OID `{2 1 2 1}`, as its raw arcs.
pub const DER_ARCS: [u32; 4] = [2, 1, 2, 1];

/// The well-known BER registration OID `{2 1 1}`.
pub fn ber() -> ObjectIdentifier {
    ObjectIdentifier::new(BER_ARCS.to_vec()).expect("well-known OID is valid")
}

/// The well-known CER registration OID `{2 1 2 0}`.
pub fn cer() -> ObjectIdentifier {
    ObjectIdentifier::new(CER_ARCS.to_vec()).expect("well-known OID is valid")
}

/// The well-known DER registration OID `{2 1 2 1}`.
pub fn der() -> ObjectIdentifier {
    ObjectIdentifier::new(DER_ARCS.to_vec()).expect("well-known OID is valid")
}

use alloc::string::ToString;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_short_oid() {
        assert!(ObjectIdentifier::new(alloc::vec![1]).is_err());
    }

    #[test]
    fn rejects_bad_second_arc_for_low_first_arc() {
        assert!(ObjectIdentifier::new(alloc::vec![0, 40]).is_err());
        assert!(ObjectIdentifier::new(alloc::vec![1, 39]).is_ok());
    }

    #[test]
    fn allows_high_second_arc_for_joint_iso_itu_t() {
        assert!(ObjectIdentifier::new(alloc::vec![2, 175]).is_ok());
        assert!(ObjectIdentifier::new(alloc::vec![2, 176]).is_err());
    }

    #[test]
    fn first_subidentifier_roundtrip() {
        for &(n0, n1) in &[(0u32, 0u32), (1, 39), (2, 999), (2, 5)] {
            let combined = combine_first_subidentifier(n0, n1);
            assert_eq!(split_first_subidentifier(combined).unwrap(), (n0, n1));
        }
    }

    #[test]
    fn rsa_example_splits_correctly() {
        // {1 2 840 113549}: first subidentifier is 40*1+2 = 42.
        assert_eq!(combine_first_subidentifier(1, 2), 42);
        assert_eq!(split_first_subidentifier(42).unwrap(), (1, 2));
    }

    #[test]
    fn well_known_constants() {
        assert_eq!(BER_ARCS, [2, 1, 1]);
        assert_eq!(CER_ARCS, [2, 1, 2, 0]);
        assert_eq!(DER_ARCS, [2, 1, 2, 1]);
        assert_eq!(ber().arcs(), &[2, 1, 1]);
        assert_eq!(cer().arcs(), &[2, 1, 2, 0]);
        assert_eq!(der().arcs(), &[2, 1, 2, 1]);
    }
}
