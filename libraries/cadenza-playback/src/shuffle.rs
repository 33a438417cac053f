//! Shuffle selection
//!
//! Shuffle never reorders the queue. "Next" under shuffle picks a uniformly
//! random index over the whole queue; the current entry may be picked again.

use rand::Rng;

/// Pick a uniformly random index in `0..len`
///
/// Returns `None` for an empty range.
pub fn random_index<R: Rng>(len: usize, rng: &mut R) -> Option<usize> {
    if len == 0 {
        return None;
    }
    Some(rng.gen_range(0..len))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn empty_range_has_no_index() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(random_index(0, &mut rng), None);
    }

    #[test]
    fn single_entry_always_picks_it() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..20 {
            assert_eq!(random_index(1, &mut rng), Some(0));
        }
    }

    #[test]
    fn every_index_is_reachable() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut seen = [0usize; 5];
        for _ in 0..1000 {
            seen[random_index(5, &mut rng).unwrap()] += 1;
        }

        // Roughly uniform: each bucket near 200
        for count in seen {
            assert!(count > 120, "bucket too small: {:?}", seen);
        }
    }
}
