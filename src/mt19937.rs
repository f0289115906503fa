//! The 32 bit Mersenne Twister, MT19937.

pub mod recovery;
pub mod stream;

use rand::{RngCore, SeedableRng};

use crate::{Error, Result};

pub use recovery::{clone_from_outputs, untemper};

/// The MT19937 parameter set.
pub mod params {
    /// Word size in bits.
    pub const W: u32 = 32;
    /// Degree of recurrence, the number of words of state.
    pub const N: usize = 624;
    /// Middle word offset.
    pub const M: usize = 397;
    /// Separation point of one word.
    pub const R: u32 = 31;
    /// Twist matrix coefficients.
    pub const A: u32 = 0x9908_B0DF;

    // tempering
    pub const U: u32 = 11;
    pub const D: u32 = 0xFFFF_FFFF;
    pub const S: u32 = 7;
    pub const B: u32 = 0x9D2C_5680;
    pub const T: u32 = 15;
    pub const C: u32 = 0xEFC6_0000;
    pub const L: u32 = 18;

    /// Seeding multiplier.
    pub const F: u32 = 0x6C07_8965;

    pub const LOWER_MASK: u32 = (1 << R) - 1;
    pub const UPPER_MASK: u32 = !LOWER_MASK;
}

use params::{A, B, C, D, F, L, LOWER_MASK, M, N, S, T, U, UPPER_MASK, W};

/// Generator state: 624 words and a cursor into them. When the cursor reaches the end, the next
/// extraction twists the whole state first.
#[derive(Clone, PartialEq, Eq)]
pub struct Mt19937 {
    mt: [u32; N],
    index: usize,
}

impl Mt19937 {
    pub fn new(seed: u32) -> Self {
        let mut mt = [0; N];
        mt[0] = seed;
        for i in 1..N {
            let prev = mt[i - 1];
            #[allow(clippy::cast_possible_truncation)]
            let i_word = i as u32;
            mt[i] = F
                .wrapping_mul(prev ^ (prev >> (W - 2)))
                .wrapping_add(i_word);
        }

        // twist before the first extraction
        Mt19937 { mt, index: N }
    }

    /// Rebuild a generator from raw (untempered) state words and a cursor in `0..=624`.
    pub fn from_state(mt: [u32; N], index: usize) -> Result<Self> {
        if index > N {
            return Err(Error::StateIndex(index));
        }
        Ok(Mt19937 { mt, index })
    }

    pub fn state(&self) -> &[u32; N] {
        &self.mt
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn twist(&mut self) {
        for i in 0..N {
            let x = (self.mt[i] & UPPER_MASK) + (self.mt[(i + 1) % N] & LOWER_MASK);
            let mut x_a = x >> 1;
            if x % 2 == 1 {
                x_a ^= A;
            }
            self.mt[i] = self.mt[(i + M) % N] ^ x_a;
        }
        self.index = 0;
    }

    pub fn extract(&mut self) -> u32 {
        if self.index >= N {
            self.twist();
        }

        let y = temper(self.mt[self.index]);
        self.index += 1;
        y
    }
}

/// The output transform applied to each state word as it is extracted.
pub fn temper(x: u32) -> u32 {
    let mut y = x;
    y ^= (y >> U) & D;
    y ^= (y << S) & B;
    y ^= (y << T) & C;
    y ^= y >> L;
    y
}

impl std::fmt::Debug for Mt19937 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mt19937")
            .field("index", &self.index)
            .finish_non_exhaustive()
    }
}

/// Bytes are filled from successive outputs, each written little endian.
impl RngCore for Mt19937 {
    fn next_u32(&mut self) -> u32 {
        self.extract()
    }

    fn next_u64(&mut self) -> u64 {
        let low = u64::from(self.extract());
        let high = u64::from(self.extract());
        (high << 32) | low
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(4) {
            let word = self.extract().to_le_bytes();
            chunk.copy_from_slice(&word[..chunk.len()]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> std::result::Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

/// The seed is a little endian `u32`. `seed_from_u64` keeps rand's default expansion, so only
/// `from_seed` (or [`Mt19937::new`]) reproduces the reference sequence for a given seed.
impl SeedableRng for Mt19937 {
    type Seed = [u8; 4];

    fn from_seed(seed: Self::Seed) -> Self {
        Self::new(u32::from_le_bytes(seed))
    }
}
