use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::error::{Result, SubsetError};

/// Select `n` rows without replacement using a generator seeded from `seed`.
///
/// `n` is clamped to the table size. Identical inputs always yield the same
/// rows in the same order; no shared generator state is touched.
pub fn sample<T: Clone>(rows: &[T], n: i64, seed: u64) -> Result<Vec<T>> {
    if n < 0 {
        return Err(SubsetError::InvalidSampleSize(n));
    }

    let amount = usize::try_from(n).unwrap_or(usize::MAX).min(rows.len());
    let mut rng = StdRng::seed_from_u64(seed);

    Ok(rows.choose_multiple(&mut rng, amount).cloned().collect())
}
