// cell/mod.rs
// A single lattice site: an unbounded multiset of signed unit charges

use rand::Rng;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Unit charge carried by a particle on the lattice.
pub type Charge = i8;

pub const POSITIVE: Charge = 1;
pub const NEGATIVE: Charge = -1;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChargeCell {
    pub charges: SmallVec<[Charge; 4]>,
}

impl ChargeCell {
    /// Populate with `occupancy` charges, each +1 or -1 with equal
    /// probability. Non-positive occupancy gives an empty cell.
    pub fn new<R: Rng + ?Sized>(occupancy: i64, rng: &mut R) -> Self {
        let mut cell = Self::empty();
        if occupancy > 0 {
            cell.charges.reserve(occupancy as usize);
            for _ in 0..occupancy {
                cell.charges
                    .push(if rng.random_bool(0.5) { POSITIVE } else { NEGATIVE });
            }
        }
        cell
    }

    pub fn empty() -> Self {
        Self {
            charges: SmallVec::new(),
        }
    }

    /// Deterministic population: `positive` (+1) charges followed by
    /// `negative` (-1) charges.
    pub fn with_counts(positive: usize, negative: usize) -> Self {
        let mut cell = Self::empty();
        cell.deposit(positive, negative);
        cell
    }

    pub fn add_charge(&mut self, q: Charge) {
        debug_assert!(q == POSITIVE || q == NEGATIVE, "charge {q} is not a unit charge");
        self.charges.push(q);
    }

    pub(crate) fn deposit(&mut self, positive: usize, negative: usize) {
        self.charges.reserve(positive + negative);
        self.charges
            .extend(std::iter::repeat(POSITIVE).take(positive));
        self.charges
            .extend(std::iter::repeat(NEGATIVE).take(negative));
    }

    pub fn total_charge(&self) -> i64 {
        self.charges.iter().map(|&q| q as i64).sum()
    }

    pub fn population(&self) -> usize {
        self.charges.len()
    }

    pub fn positive_count(&self) -> usize {
        self.charges.iter().filter(|&&q| q > 0).count()
    }

    pub fn negative_count(&self) -> usize {
        self.charges.iter().filter(|&&q| q < 0).count()
    }

    pub fn is_empty(&self) -> bool {
        self.charges.is_empty()
    }

    /// Drop every charge but keep the allocation for the next step.
    pub fn clear(&mut self) {
        self.charges.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = Charge> + '_ {
        self.charges.iter().copied()
    }
}

#[cfg(test)]
mod tests;
