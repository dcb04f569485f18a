use rand::Rng;
use rand_chacha::ChaCha8Rng;

use crate::config::ITER;
use crate::points::PointSet;

/// Sample candidate facility indices, weight-proportionally.
///
/// The sample size is `min(n, floor(ITER * kmin * ln kmin))`; when every
/// point fits, the identity list is returned. Duplicates are permitted.
/// Sequential on purpose: the draw order is part of the fixed-seed
/// reproducibility contract.
pub(crate) fn select_feasible(
    points: &PointSet,
    kmin: usize,
    rng: &mut ChaCha8Rng,
) -> Vec<usize> {
    let n = points.len();
    let target = (ITER as f64 * kmin as f64 * (kmin as f64).ln()) as usize;
    let m = n.min(target);

    if m == n {
        return (0..n).collect();
    }

    let mut accum = Vec::with_capacity(n);
    let mut sum = 0.0f32;
    for i in 0..n {
        sum += points.weight(i);
        accum.push(sum);
    }
    let total = accum[n - 1];

    let mut feasible = Vec::with_capacity(m);
    for _ in 0..m {
        let w = rng.gen::<f32>() * total;
        // smallest index whose running weight exceeds the draw
        let idx = accum.partition_point(|&a| a <= w).min(n - 1);
        feasible.push(idx);
    }
    feasible
}
