//! Uniform sampling without replacement.
//!
//! A partial Fisher–Yates shuffle: position `i` (for `i < k`) is swapped with
//! a uniformly chosen position in `[i, n)`. Given a uniform `next_u32_range`,
//! every `k`-subset of the pool is equally likely.

use waitlist_core::rng::DeterministicRng;

/// Returns `min(k, pool.len())` distinct members of `pool`, chosen uniformly.
#[allow(clippy::cast_possible_truncation)]
pub fn sample_uniform<T: Clone>(pool: &[T], k: usize, rng: &mut dyn DeterministicRng) -> Vec<T> {
    let n = pool.len();
    let k = k.min(n);
    let mut indices: Vec<usize> = (0..n).collect();

    for i in 0..k {
        // Pool sizes are bounded by the u32 attendee counters.
        let j = rng.next_u32_range(i as u32, (n - 1) as u32) as usize;
        indices.swap(i, j);
    }

    indices[..k].iter().map(|&i| pool[i].clone()).collect()
}
