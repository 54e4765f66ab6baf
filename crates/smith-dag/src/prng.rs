// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Seeded pseudo-random stream shared by the DAG builder and the table generator.

/// Stateful `xoroshiro128+` pseudo-random number generator for reproducible generation runs.
///
/// * Not cryptographically secure; use only for program synthesis.
/// * Matching seeds yield identical sequences across supported platforms, so a
///   run is reproducible from its reported seed as long as every consumer draws
///   numbers in the same order.
#[derive(Debug, Clone)]
pub struct Prng {
    state: [u64; 2],
}

const ZERO_STATE_REPLACEMENT: u64 = 0x9e37_79b9_7f4a_7c15;

impl Prng {
    /// Constructs a PRNG from two 64-bit state words.
    pub fn from_state(seed0: u64, seed1: u64) -> Self {
        let mut state = [seed0, seed1];
        if state[0] == 0 && state[1] == 0 {
            state[0] = ZERO_STATE_REPLACEMENT;
        }
        Self { state }
    }

    /// Constructs a PRNG from a single 64-bit seed via SplitMix64 expansion.
    pub fn from_seed(seed: u64) -> Self {
        fn splitmix64(state: &mut u64) -> u64 {
            *state = state.wrapping_add(0x9e37_79b9_7f4a_7c15);
            let mut z = *state;
            z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
            z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
            z ^ (z >> 31)
        }

        let mut sm_state = seed;
        let s0 = splitmix64(&mut sm_state);
        let s1 = splitmix64(&mut sm_state);
        Self::from_state(s0, s1)
    }

    /// Returns the next raw 64-bit output.
    pub fn next_u64(&mut self) -> u64 {
        let s0 = self.state[0];
        let mut s1 = self.state[1];
        let result = s0.wrapping_add(s1);

        s1 ^= s0;
        self.state[0] = s0.rotate_left(55) ^ s1 ^ (s1 << 14);
        self.state[1] = s1.rotate_left(36);

        result
    }

    /// Returns the next float in `[0, 1)`.
    ///
    /// Uses the high 53 bits of the output so every representable step of an
    /// `f64` mantissa is reachable.
    pub fn next_f64(&mut self) -> f64 {
        let raw = self.next_u64() >> 11;
        raw as f64 * (1.0 / (1u64 << 53) as f64)
    }

    /// Returns the next integer in the inclusive range `[min, max]`.
    ///
    /// Uses rejection sampling to avoid modulo bias. Bounds are swapped when
    /// given in the wrong order.
    pub fn next_int(&mut self, min: u64, max: u64) -> u64 {
        let (lo, hi) = if min <= max { (min, max) } else { (max, min) };
        let Some(span) = (hi - lo).checked_add(1) else {
            return self.next_u64();
        };
        if span == 1 {
            return lo;
        }

        let value = if span.is_power_of_two() {
            self.next_u64() & (span - 1)
        } else {
            let bound = u64::MAX - u64::MAX % span;
            loop {
                let candidate = self.next_u64();
                if candidate < bound {
                    break candidate % span;
                }
            }
        };
        lo + value
    }

    /// Returns a uniformly chosen index in `0..len`, or `None` when `len == 0`.
    pub fn next_index(&mut self, len: usize) -> Option<usize> {
        if len == 0 {
            return None;
        }
        Some(self.next_int(0, len as u64 - 1) as usize)
    }

    /// Returns `true` with probability `p`.
    ///
    /// `p <= 0` never fires and `p >= 1` always fires; one value is consumed
    /// from the stream either way.
    pub fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }

    /// Draws an index with probability proportional to `weights[index]`.
    ///
    /// Returns `None` when the weights are empty or sum to zero.
    pub fn pick_weighted(&mut self, weights: &[u32]) -> Option<usize> {
        let total: u64 = weights.iter().map(|w| u64::from(*w)).sum();
        if total == 0 {
            return None;
        }
        let mut roll = self.next_int(0, total - 1);
        for (index, weight) in weights.iter().enumerate() {
            let weight = u64::from(*weight);
            if roll < weight {
                return Some(index);
            }
            roll -= weight;
        }
        None
    }

    /// Returns a uniformly chosen element of `items`.
    pub fn choose<'a, T>(&mut self, items: &'a [T]) -> Option<&'a T> {
        self.next_index(items.len()).and_then(|i| items.get(i))
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn next_int_returns_single_value_for_equal_bounds() {
        let mut prng = Prng::from_state(42, 99);
        assert_eq!(prng.next_int(7, 7), 7);
    }

    #[test]
    fn next_int_stays_in_bounds() {
        let mut prng = Prng::from_seed(7);
        for _ in 0..1_000 {
            let v = prng.next_int(3, 9);
            assert!((3..=9).contains(&v));
        }
    }

    #[test]
    fn next_int_accepts_swapped_bounds() {
        let mut prng = Prng::from_seed(11);
        for _ in 0..100 {
            let v = prng.next_int(5, 1);
            assert!((1..=5).contains(&v));
        }
    }

    #[test]
    fn next_int_handles_full_u64_range() {
        let mut a = Prng::from_seed(5);
        let mut b = Prng::from_seed(5);
        assert_eq!(a.next_int(0, u64::MAX), b.next_u64());
    }

    #[test]
    fn next_f64_is_half_open_unit_interval() {
        let mut prng = Prng::from_seed(1234);
        for _ in 0..10_000 {
            let v = prng.next_f64();
            assert!((0.0..1.0).contains(&v));
        }
    }

    #[test]
    fn chance_extremes_are_absolute() {
        let mut prng = Prng::from_seed(99);
        for _ in 0..1_000 {
            assert!(!prng.chance(0.0));
            assert!(prng.chance(1.0));
        }
    }

    #[test]
    fn pick_weighted_skips_zero_weights() {
        let mut prng = Prng::from_seed(3);
        for _ in 0..500 {
            assert_eq!(prng.pick_weighted(&[0, 5, 0]), Some(1));
        }
        assert_eq!(prng.pick_weighted(&[0, 0]), None);
        assert_eq!(prng.pick_weighted(&[]), None);
    }

    #[test]
    fn next_index_of_empty_is_none() {
        let mut prng = Prng::from_seed(3);
        assert_eq!(prng.next_index(0), None);
        assert_eq!(prng.choose::<u8>(&[]), None);
    }

    #[test]
    fn zero_state_is_replaced() {
        let mut prng = Prng::from_state(0, 0);
        assert_ne!(prng.next_u64(), 0);
    }

    #[test]
    fn identical_seeds_produce_identical_streams() {
        let mut a = Prng::from_seed(0xDEAD_BEEF);
        let mut b = Prng::from_seed(0xDEAD_BEEF);
        let xs: Vec<u64> = (0..32).map(|_| a.next_u64()).collect();
        let ys: Vec<u64> = (0..32).map(|_| b.next_u64()).collect();
        assert_eq!(xs, ys);
    }
}
