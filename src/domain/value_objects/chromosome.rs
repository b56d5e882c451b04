//! Chromosome value object module
//!
//! A chromosome is a complete permutation of batch indices defining the
//! decoding order. The newtype makes the "every batch exactly once"
//! invariant total: every constructor and genetic operator goes through
//! `repair`, so no chromosome with missing or duplicated batches can exist.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// A complete permutation of `0..len` batch indices
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Chromosome(Vec<usize>);

impl Chromosome {
    /// Creates the identity permutation of the given length
    pub fn identity(len: usize) -> Self {
        Self((0..len).collect())
    }

    /// Creates a uniformly random permutation of the given length
    pub fn shuffled<R: Rng>(len: usize, rng: &mut R) -> Self {
        let mut genes: Vec<usize> = (0..len).collect();
        genes.shuffle(rng);
        Self(genes)
    }

    /// Rebuilds a valid permutation from possibly broken gene material
    ///
    /// Keeps the first occurrence of every in-range index, drops duplicates
    /// and out-of-range values, then appends whatever indices are missing in
    /// ascending order. The result is always a complete permutation of
    /// `0..len`.
    pub fn repair(genes: Vec<usize>, len: usize) -> Self {
        let mut seen = vec![false; len];
        let mut fixed = Vec::with_capacity(len);
        for gene in genes {
            if gene < len && !seen[gene] {
                seen[gene] = true;
                fixed.push(gene);
            }
        }
        for (gene, used) in seen.iter().enumerate() {
            if !used {
                fixed.push(gene);
            }
        }
        Self(fixed)
    }

    /// The batch indices in decoding order
    pub fn genes(&self) -> &[usize] {
        &self.0
    }

    /// Number of batches in the permutation
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Checks for the zero-batch degenerate case
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Order-preserving crossover (OX) with another parent
    ///
    /// Copies a random cut slice from `self` into the child at the same
    /// positions, then fills the remaining positions by scanning the other
    /// parent starting after the second cut with wraparound, skipping
    /// indices already used.
    pub fn order_crossover<R: Rng>(&self, other: &Chromosome, rng: &mut R) -> Chromosome {
        let len = self.0.len();
        if len < 2 {
            return self.clone();
        }

        let mut a = rng.gen_range(0..len);
        let mut b = rng.gen_range(0..len);
        if a > b {
            std::mem::swap(&mut a, &mut b);
        }

        let mut child: Vec<Option<usize>> = vec![None; len];
        let mut used = vec![false; len];
        for pos in a..=b {
            let gene = self.0[pos];
            child[pos] = Some(gene);
            used[gene] = true;
        }

        // Fill positions after the slice first, wrapping around, with the
        // other parent's genes scanned from after the slice as well.
        let mut source = (b + 1) % len;
        for offset in 1..=len {
            let pos = (b + offset) % len;
            if child[pos].is_some() {
                continue;
            }
            while used[other.0[source]] {
                source = (source + 1) % len;
            }
            let gene = other.0[source];
            child[pos] = Some(gene);
            used[gene] = true;
        }

        Chromosome::repair(child.into_iter().flatten().collect(), len)
    }

    /// Swap mutation scaled by rate
    ///
    /// Performs `max(1, floor(rate * len))` random position swaps in place.
    pub fn swap_mutate<R: Rng>(&mut self, rate: f64, rng: &mut R) {
        let len = self.0.len();
        if len < 2 {
            return;
        }
        let swaps = ((rate * len as f64).floor() as usize).max(1);
        for _ in 0..swaps {
            let i = rng.gen_range(0..len);
            // Offset in 1..len keeps the second position distinct
            let j = (i + rng.gen_range(1..len)) % len;
            self.0.swap(i, j);
        }
    }
}
