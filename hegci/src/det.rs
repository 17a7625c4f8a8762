//! Compact occupied-orbital representations for one and for both spin
//! channels.

use std::cmp::Ordering;

/// The occupied orbitals of a single spin channel, kept sorted ascending.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct SpinDet {
    orbs: Vec<u16>,
}

impl SpinDet {
    /// Creates an empty channel.
    #[must_use]
    pub const fn new() -> Self {
        Self { orbs: Vec::new() }
    }

    /// Occupies the `n` lowest orbitals.
    #[must_use]
    pub fn lowest(n: u16) -> Self {
        Self {
            orbs: (0..n).collect(),
        }
    }

    /// Returns `true` if orbital `orb` is occupied.
    #[must_use]
    pub fn occupied(&self, orb: u16) -> bool {
        self.orbs.binary_search(&orb).is_ok()
    }

    /// Occupies or vacates orbital `orb`, preserving the sort order.
    pub fn set_orb(&mut self, orb: u16, occ: bool) {
        match self.orbs.binary_search(&orb) {
            Ok(position) => {
                if !occ {
                    self.orbs.remove(position);
                }
            }
            Err(position) => {
                if occ {
                    self.orbs.insert(position, orb);
                }
            }
        }
    }

    /// Number of occupied orbitals.
    #[must_use]
    pub fn n_elecs(&self) -> usize {
        self.orbs.len()
    }

    /// The occupied orbitals in ascending order.
    #[must_use]
    pub fn orbs(&self) -> &[u16] {
        &self.orbs
    }

    /// Builds the symmetric difference of two channels by a sorted merge.
    #[must_use]
    pub fn from_eor(lhs: &Self, rhs: &Self) -> Self {
        let mut orbs = Vec::with_capacity(lhs.orbs.len() + rhs.orbs.len());
        let (mut i, mut j) = (0, 0);
        while i < lhs.orbs.len() && j < rhs.orbs.len() {
            match lhs.orbs[i].cmp(&rhs.orbs[j]) {
                Ordering::Less => {
                    orbs.push(lhs.orbs[i]);
                    i += 1;
                }
                Ordering::Greater => {
                    orbs.push(rhs.orbs[j]);
                    j += 1;
                }
                Ordering::Equal => {
                    i += 1;
                    j += 1;
                }
            }
        }
        orbs.extend_from_slice(&lhs.orbs[i..]);
        orbs.extend_from_slice(&rhs.orbs[j..]);
        Self { orbs }
    }

    /// Encodes as the first orbital followed by successive gaps, which keeps
    /// the code words small for the low-index-heavy determinants selected
    /// configuration interaction produces.
    #[must_use]
    pub fn encode(&self) -> Vec<u16> {
        let mut code = Vec::with_capacity(self.orbs.len());
        let mut previous = 0;
        for &orb in &self.orbs {
            code.push(orb - previous);
            previous = orb;
        }
        code
    }

    /// Inverse of [`Self::encode`].
    #[must_use]
    pub fn decode(code: &[u16]) -> Self {
        let mut orbs = Vec::with_capacity(code.len());
        let mut previous = 0;
        for &delta in code {
            previous += delta;
            orbs.push(previous);
        }
        Self { orbs }
    }
}

/// A Slater determinant: one [`SpinDet`] per spin channel.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct Det {
    /// Spin-up channel.
    pub up: SpinDet,
    /// Spin-down channel.
    pub dn: SpinDet,
}

impl Det {
    /// The determinant occupying the lowest orbitals of each channel.
    #[must_use]
    pub fn hartree_fock(n_up: u16, n_dn: u16) -> Self {
        Self {
            up: SpinDet::lowest(n_up),
            dn: SpinDet::lowest(n_dn),
        }
    }

    /// Occupancy in the combined orbital space: indices below `dn_offset`
    /// address the up channel, the rest address the down channel shifted by
    /// `dn_offset`.
    #[must_use]
    pub fn occupied(&self, orb: u16, dn_offset: u16) -> bool {
        if orb < dn_offset {
            self.up.occupied(orb)
        } else {
            self.dn.occupied(orb - dn_offset)
        }
    }

    /// Occupies or vacates an orbital in the combined orbital space.
    pub fn set_orb(&mut self, orb: u16, dn_offset: u16, occ: bool) {
        if orb < dn_offset {
            self.up.set_orb(orb, occ);
        } else {
            self.dn.set_orb(orb - dn_offset, occ);
        }
    }

    /// Layout-independent key for hash maps and deterministic tie-breaks.
    #[must_use]
    pub fn encode(&self) -> DetCode {
        DetCode {
            up: self.up.encode(),
            dn: self.dn.encode(),
        }
    }

    /// Inverse of [`Self::encode`].
    #[must_use]
    pub fn decode(code: &DetCode) -> Self {
        Self {
            up: SpinDet::decode(&code.up),
            dn: SpinDet::decode(&code.dn),
        }
    }
}

/// Encoded form of a [`Det`]. Equality, hashing and ordering depend only on
/// the code words, never on memory layout.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct DetCode {
    up: Vec<u16>,
    dn: Vec<u16>,
}
