use log::debug;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use rayon::ThreadPool;

use crate::distance::dist;
use crate::par::{ranges, split_ranges};
use crate::points::PointSet;

/// Build an initial solution by probabilistic facility opening.
///
/// Point 0 always opens; every later point opens with probability
/// `cost / z`, where `cost` is its assignment cost under the facilities
/// opened so far. The open decision is inherently serial; each opening
/// triggers one parallel reassignment sweep over the whole set.
///
/// Returns `(z * k + total_assignment_cost, k)`.
pub(crate) fn speedy(
    points: &mut PointSet,
    z: f64,
    rng: &mut ChaCha8Rng,
    pool: &ThreadPool,
    workers: usize,
) -> (f64, usize) {
    let n = points.len();
    let rs = ranges(n, workers);

    // seed: everything assigned to point 0
    {
        let coords = &points.coords;
        let weights = &points.weights;
        let cost_slices = split_ranges(&mut points.costs[..n], &rs);
        let assign_slices = split_ranges(&mut points.assign[..n], &rs);
        pool.install(|| {
            cost_slices
                .into_par_iter()
                .zip(assign_slices)
                .zip(rs.par_iter())
                .for_each(|((costs, assigns), r)| {
                    for ((c, a), i) in costs.iter_mut().zip(assigns.iter_mut()).zip(r.clone()) {
                        *c = dist(coords.row(i), coords.row(0)) * weights[i];
                        *a = 0;
                    }
                });
        });
    }

    let mut k = 1usize;
    for i in 1..n {
        let to_open = rng.gen::<f64>() < f64::from(points.costs[i]) / z;
        if !to_open {
            continue;
        }
        k += 1;

        let coords = &points.coords;
        let weights = &points.weights;
        let cost_slices = split_ranges(&mut points.costs[..n], &rs);
        let assign_slices = split_ranges(&mut points.assign[..n], &rs);
        pool.install(|| {
            cost_slices
                .into_par_iter()
                .zip(assign_slices)
                .zip(rs.par_iter())
                .for_each(|((costs, assigns), r)| {
                    for ((c, a), j) in costs.iter_mut().zip(assigns.iter_mut()).zip(r.clone()) {
                        let candidate = dist(coords.row(i), coords.row(j)) * weights[j];
                        if candidate < *c {
                            *c = candidate;
                            *a = i;
                        }
                    }
                });
        });
    }

    let costs = &points.costs;
    let partials: Vec<f64> = pool.install(|| {
        rs.par_iter()
            .map(|r| r.clone().map(|i| f64::from(costs[i])).sum::<f64>())
            .collect()
    });
    let total = z * k as f64 + partials.iter().sum::<f64>();
    debug!("speedy opened {k} facilities, solution cost {total:.4}");
    (total, k)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::Array2;
    use ndarray_rand::rand_distr::Uniform;
    use ndarray_rand::RandomExt;
    use rand::SeedableRng;

    fn pool(workers: usize) -> ThreadPool {
        rayon::ThreadPoolBuilder::new()
            .num_threads(workers)
            .build()
            .unwrap()
    }

    fn random_points(n: usize, dim: usize) -> PointSet {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let coords = Array2::random_using((n, dim), Uniform::new(0.0f32, 1.0), &mut rng);
        PointSet::from_coords(coords, vec![1.0; n])
    }

    #[test]
    fn test_speedy_postconditions() {
        let mut points = random_points(60, 4);
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let pool = pool(2);

        let (total, k) = speedy(&mut points, 0.5, &mut rng, &pool, 2);

        assert!(k >= 1);
        let mut cost_sum = 0.0f64;
        for i in 0..points.len() {
            let a = points.assignment(i);
            // a center serves itself at zero cost
            assert_eq!(points.assignment(a), a);
            let expected = dist(points.point(i), points.point(a)) * points.weight(i);
            assert_relative_eq!(points.cost(i), expected, epsilon = 1e-5);
            cost_sum += f64::from(points.cost(i));
        }
        assert_relative_eq!(total, 0.5 * k as f64 + cost_sum, epsilon = 1e-6);

        let centers: std::collections::HashSet<usize> =
            (0..points.len()).map(|i| points.assignment(i)).collect();
        assert_eq!(centers.len(), k);
    }

    #[test]
    fn test_speedy_assignments_match_across_worker_counts() {
        let mut a = random_points(50, 3);
        let mut b = random_points(50, 3);
        let mut rng_a = ChaCha8Rng::seed_from_u64(7);
        let mut rng_b = ChaCha8Rng::seed_from_u64(7);

        let (_, ka) = speedy(&mut a, 0.3, &mut rng_a, &pool(1), 1);
        let (_, kb) = speedy(&mut b, 0.3, &mut rng_b, &pool(3), 3);

        assert_eq!(ka, kb);
        assert_eq!(a.assign, b.assign);
    }

    #[test]
    fn test_speedy_never_opens_on_coincident_points() {
        // all points identical: every cost is 0, the open test never fires,
        // even with z == 0 (0/0 compares false)
        let coords = Array2::zeros((10, 2));
        let mut points = PointSet::from_coords(coords, vec![1.0; 10]);
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        let (total, k) = speedy(&mut points, 0.0, &mut rng, &pool(2), 2);
        assert_eq!(k, 1);
        assert_eq!(total, 0.0);
    }
}
