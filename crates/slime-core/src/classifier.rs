//! Slime chunk predicate.
//!
//! Must stay bit-identical to the game: coordinates are mixed with 32-bit
//! wrapping multiplies before widening, then the mixed seed drives a 48-bit
//! linear congruential generator whose first draw out of 10 decides.

const LCG_MULTIPLIER: i64 = 0x5_DEEC_E66D;
const LCG_ADDEND: i64 = 0xB;
const LCG_MASK: i64 = (1 << 48) - 1;
const SLIME_SALT: i64 = 987_234_911;

/// Whether the chunk at `(chunk_x, chunk_z)` is a slime chunk in the world
/// with the given seed. Roughly one chunk in ten is.
#[inline]
pub fn is_slime_chunk(seed: i64, chunk_x: i32, chunk_z: i32) -> bool {
    let mixed = seed
        .wrapping_add(i64::from(
            chunk_x.wrapping_mul(chunk_x).wrapping_mul(4_987_142),
        ))
        .wrapping_add(i64::from(chunk_x.wrapping_mul(5_947_611)))
        .wrapping_add(i64::from(chunk_z.wrapping_mul(chunk_z)).wrapping_mul(4_392_871))
        .wrapping_add(i64::from(chunk_z.wrapping_mul(389_711)));
    Lcg48::new(mixed ^ SLIME_SALT).next_bounded(10) == 0
}

struct Lcg48 {
    state: i64,
}

impl Lcg48 {
    #[inline]
    fn new(seed: i64) -> Self {
        Self {
            state: (seed ^ LCG_MULTIPLIER) & LCG_MASK,
        }
    }

    #[inline]
    fn next_bits(&mut self, bits: u32) -> i32 {
        self.state = self
            .state
            .wrapping_mul(LCG_MULTIPLIER)
            .wrapping_add(LCG_ADDEND)
            & LCG_MASK;
        (self.state >> (48 - bits)) as i32
    }

    /// Uniform draw from `0..bound` with rejection of the biased tail.
    /// Only bounds that are not powers of two are supported.
    #[inline]
    fn next_bounded(&mut self, bound: i32) -> i32 {
        debug_assert!(bound > 1 && bound & (bound - 1) != 0);
        loop {
            let bits = self.next_bits(31);
            let value = bits % bound;
            if bits.wrapping_sub(value).wrapping_add(bound - 1) >= 0 {
                return value;
            }
        }
    }
}
