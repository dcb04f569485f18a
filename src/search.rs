use log::debug;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use rayon::ThreadPool;

use crate::config::{ITER, SP};
use crate::distance::dist;
use crate::feasible::select_feasible;
use crate::gain::{pgain, Scratch};
use crate::par::ranges;
use crate::points::PointSet;
use crate::speedy::speedy;

const TOL_COARSE: f64 = 0.1;
const TOL_FINE: f64 = 0.001;
const BAND_HI: f64 = 1.1;
const BAND_LO: f64 = 0.9;
const STUCK: f64 = 0.999;

/// Facility-location local search: sweep shuffled feasible candidates through
/// [`pgain`] until one full pass improves the solution by less than `e`
/// relative to its cost.
///
/// The feasible array is reshuffled once per outer pass. An empty feasible
/// array (possible when `kmin == 1`) makes the whole search a no-op.
#[allow(clippy::too_many_arguments)]
fn local_search(
    points: &mut PointSet,
    feasible: &mut [usize],
    z: f64,
    k: &mut usize,
    cost: f64,
    iter: usize,
    e: f64,
    scratch: &mut Scratch,
    rng: &mut ChaCha8Rng,
    pool: &ThreadPool,
    workers: usize,
) -> f64 {
    if feasible.is_empty() {
        return cost;
    }
    let mut cost = cost;
    let mut change = cost;
    while change / cost > e {
        change = 0.0;
        feasible.shuffle(rng);
        for i in 0..iter {
            let x = feasible[i % feasible.len()];
            change += pgain(x, points, z, k, scratch, pool, workers);
        }
        cost -= change;
    }
    cost
}

/// Approximate k-median with the center count forced into `[kmin, kmax]` by
/// binary search on the facility cost `z`.
///
/// Returns `(cost, kfinal)`. The trivial case `n <= kmax` self-assigns every
/// point at zero cost. Otherwise: seed with [`speedy`] (lowering `z` until at
/// least `kmin` facilities open), pick the feasible candidates once, then
/// alternate coarse and fine local search while steering `z`; give up once
/// the bracket has collapsed.
pub(crate) fn kmedian(
    points: &mut PointSet,
    kmin: usize,
    kmax: usize,
    scratch: &mut Scratch,
    rng: &mut ChaCha8Rng,
    pool: &ThreadPool,
    workers: usize,
) -> (f64, usize) {
    let n = points.len();

    if n <= kmax {
        for i in 0..n {
            points.assign[i] = i;
            points.costs[i] = 0.0;
        }
        return (0.0, n);
    }

    // weight-scaled spread of the data, an upper bracket for z
    let rs = ranges(n, workers);
    let mut hiz: f64 = {
        let coords = &points.coords;
        let weights = &points.weights;
        let partials: Vec<f64> = pool.install(|| {
            rs.par_iter()
                .map(|r| {
                    r.clone()
                        .map(|i| f64::from(dist(coords.row(i), coords.row(0)) * weights[i]))
                        .sum::<f64>()
                })
                .collect()
        });
        partials.iter().sum()
    };
    let mut loz = 0.0f64;
    let mut z = (hiz + loz) / 2.0;

    points.shuffle(rng);
    let (mut cost, mut k) = speedy(points, z, rng, pool, workers);

    // a few chances at this z, then start lowering it
    let mut tries = 0;
    while k < kmin && tries < SP {
        let (c, kc) = speedy(points, z, rng, pool, workers);
        cost = c;
        k = kc;
        tries += 1;
    }
    while k < kmin {
        if tries >= SP {
            if z == 0.0 {
                // coincident points: every facility is free and speedy can
                // never open another; k cannot grow
                break;
            }
            hiz = z;
            z = (hiz + loz) / 2.0;
            tries = 0;
        }
        points.shuffle(rng);
        let (c, kc) = speedy(points, z, rng, pool, workers);
        cost = c;
        k = kc;
        tries += 1;
    }

    // fix the candidate facilities once; keeps successive searches consistent
    let mut feasible = select_feasible(points, kmin, rng);
    for i in 0..n {
        scratch.is_center[points.assign[i]] = true;
    }

    let iter = (ITER as f64 * kmax as f64 * (kmax as f64).ln()) as usize;
    loop {
        debug!("facility cost {z:.6}: k={k}, cost={cost:.4}");
        cost = local_search(
            points, &mut feasible, z, &mut k, cost, iter, TOL_COARSE, scratch, rng, pool, workers,
        );

        let near_band = (k as f64 <= BAND_HI * kmax as f64 && k as f64 >= BAND_LO * kmin as f64)
            || (k <= kmax + 2 && k + 2 >= kmin);
        if near_band {
            cost = local_search(
                points, &mut feasible, z, &mut k, cost, iter, TOL_FINE, scratch, rng, pool,
                workers,
            );
        }

        if k > kmax {
            // facilities too cheap
            loz = z;
            z = (hiz + loz) / 2.0;
            cost += (z - loz) * k as f64;
        }
        if k < kmin {
            // facilities too expensive
            hiz = z;
            z = (hiz + loz) / 2.0;
            cost += (z - hiz) * k as f64;
        }

        if (kmin..=kmax).contains(&k) || loz >= STUCK * hiz {
            break;
        }
    }

    (cost, k)
}
