//! The Curl sponge: a 729-trit state permuted over 27 rounds.
//!
//! Each round rebuilds the state through a fixed index permutation and a
//! two-trit S-box. The permutation table is generated at compile time from
//! the canonical recurrence.

use crate::constants::HASH_TRINARY_SIZE;
use crate::trinary::{trits_to_trytes, trytes_to_trits, Trit, Trytes};
use crate::Result;

/// Number of trits in the sponge state (three hash lengths).
pub const STATE_SIZE: usize = HASH_TRINARY_SIZE * 3;
/// Rounds of the permutation.
pub const NUMBER_OF_ROUNDS: usize = 27;

/// The round permutation: state position `j` reads from `INDICES[j]` and
/// `INDICES[j + 1]`.
pub const INDICES: [usize; STATE_SIZE + 1] = generate_indices();

/// S-box lookup, indexed by `a + 3b + 4` for trit inputs `a` and `b`.
const TRUTH_TABLE: [Trit; 9] = [1, 0, -1, 1, -1, 0, -1, 1, 0];

const fn generate_indices() -> [usize; STATE_SIZE + 1] {
    let mut indices = [0usize; STATE_SIZE + 1];
    let mut i = 0;
    while i < STATE_SIZE {
        indices[i + 1] = if indices[i] < 365 {
            indices[i] + 364
        } else {
            indices[i] - 365
        };
        i += 1;
    }
    indices
}

/// The sponge. Created zeroed; [`absorb`](Curl::absorb) folds tryte blocks
/// into the state and [`squeeze`](Curl::squeeze) reads hashes back out.
#[derive(Clone)]
pub struct Curl {
    pub(crate) state: [Trit; STATE_SIZE],
}

impl Curl {
    /// A fresh sponge with an all-zero state.
    pub fn new() -> Self {
        Curl {
            state: [0; STATE_SIZE],
        }
    }

    /// Zeroes the state for reuse.
    pub fn reset(&mut self) {
        self.state = [0; STATE_SIZE];
    }

    /// Absorbs `trytes` block-wise: each 243-trit block is copied into the
    /// head of the state and permuted. A trailing partial block is
    /// right-padded with zero trits.
    pub fn absorb(&mut self, trytes: &str) -> Result<()> {
        let trits = trytes_to_trits(trytes)?;
        for block in trits.chunks(HASH_TRINARY_SIZE) {
            self.state[..block.len()].copy_from_slice(block);
            self.state[block.len()..HASH_TRINARY_SIZE].fill(0);
            self.transform();
        }
        Ok(())
    }

    /// Reads the hash at the head of the state, permuting afterwards so the
    /// sponge can be squeezed again.
    pub fn squeeze(&mut self) -> [Trit; HASH_TRINARY_SIZE] {
        let mut hash = [0; HASH_TRINARY_SIZE];
        hash.copy_from_slice(&self.state[..HASH_TRINARY_SIZE]);
        self.transform();
        hash
    }

    pub(crate) fn transform(&mut self) {
        let mut scratch = [0 as Trit; STATE_SIZE];
        for _ in 0..NUMBER_OF_ROUNDS {
            scratch.copy_from_slice(&self.state);
            for (j, slot) in self.state.iter_mut().enumerate() {
                let a = scratch[INDICES[j]];
                let b = scratch[INDICES[j + 1]];
                *slot = TRUTH_TABLE[(a + b * 3 + 4) as usize];
            }
        }
    }
}

impl Default for Curl {
    fn default() -> Self {
        Self::new()
    }
}

/// Curl-hashes a tryte string and returns the 81-tryte hash.
pub fn hash_trytes(trytes: &str) -> Result<Trytes> {
    let mut curl = Curl::new();
    curl.absorb(trytes)?;
    trits_to_trytes(&curl.squeeze())
}
