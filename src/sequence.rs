//! Round-order generation for a session.

use rand::Rng;

/// Produce the traversal order over `[0..n-1]` for a session.
///
/// Without shuffling this is the identity order. With shuffling it is an
/// unbiased Fisher–Yates permutation: walk from the last index down to 1 and
/// swap each position with a uniformly chosen index at or below it. An empty
/// input yields an empty sequence; rejecting a zero-length selection is the
/// caller's job.
pub fn generate<R: Rng + ?Sized>(n: usize, shuffle: bool, rng: &mut R) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..n).collect();

    if shuffle {
        for i in (1..indices.len()).rev() {
            let j = rng.random_range(0..=i);
            indices.swap(i, j);
        }
    }

    indices
}
