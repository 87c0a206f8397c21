use rand::seq::SliceRandom;
use rand::Rng;

/// Draws `num_indexes` distinct indices out of `0..pool_size`.
///
/// When the pool is larger than the requested count, indices are sampled
/// without replacement and sorted ascending iff `sorted` is set. When the
/// pool is not larger, every index is returned exactly once, shuffled unless
/// `sorted` was requested.
///
/// This is the single bounded-cardinality randomness source shared by the
/// mutation strategies.
pub fn select_indexes<R: Rng>(
    rng: &mut R,
    num_indexes: usize,
    pool_size: usize,
    sorted: bool,
) -> Vec<usize> {
    if pool_size > num_indexes {
        let mut selected = Vec::with_capacity(num_indexes);
        while selected.len() < num_indexes {
            let index = rng.random_range(0..pool_size);
            if !selected.contains(&index) {
                selected.push(index);
            }
        }

        if sorted {
            selected.sort_unstable();
        }
        selected
    } else {
        let mut selected: Vec<usize> = (0..pool_size).collect();
        if !sorted {
            selected.shuffle(rng);
        }
        selected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn it_returns_the_whole_pool_when_not_larger_than_the_request() {
        let mut rng = StdRng::seed_from_u64(42);

        let mut selected = select_indexes(&mut rng, 8, 5, false);
        selected.sort_unstable();
        assert_eq!(selected, vec![0, 1, 2, 3, 4]);

        // Equal sizes behave the same
        let mut selected = select_indexes(&mut rng, 5, 5, false);
        selected.sort_unstable();
        assert_eq!(selected, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn it_keeps_the_whole_pool_ordered_when_sorting_is_requested() {
        let mut rng = StdRng::seed_from_u64(42);

        let selected = select_indexes(&mut rng, 10, 6, true);
        assert_eq!(selected, vec![0, 1, 2, 3, 4, 5]);
    }

    #[test]
    fn it_samples_distinct_indexes_from_larger_pools() {
        let mut rng = StdRng::seed_from_u64(42);

        for _ in 0..100 {
            let selected = select_indexes(&mut rng, 4, 20, false);

            assert_eq!(selected.len(), 4);
            for (position, index) in selected.iter().enumerate() {
                assert!(*index < 20);
                assert!(!selected[..position].contains(index));
            }
        }
    }

    #[test]
    fn it_sorts_sampled_indexes_when_requested() {
        let mut rng = StdRng::seed_from_u64(42);

        for _ in 0..100 {
            let selected = select_indexes(&mut rng, 4, 20, true);
            assert!(selected.windows(2).all(|pair| pair[0] < pair[1]));
        }
    }
}
