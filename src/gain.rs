use rayon::prelude::*;
use rayon::ThreadPool;

use crate::distance::dist;
use crate::par::{ranges, split_ranges};
use crate::points::PointSet;

/// Doubles per cache line; work-memory strips are padded to this so each
/// worker's strip starts on its own line.
const STRIDE_ALIGN: usize = 8;

fn round_up(v: usize, align: usize) -> usize {
    (v + align - 1) / align * align
}

/// Per-chunk solver scratch: the three auxiliary per-point arrays.
///
/// `switch_membership` is meaningful only inside one [`pgain`] call.
/// `is_center` marks open facilities. `center_table` maps each open facility
/// to its compact index in `[0, k)`, in point order, and is rebuilt at the
/// start of every [`pgain`] call.
pub(crate) struct Scratch {
    pub(crate) switch_membership: Vec<bool>,
    pub(crate) is_center: Vec<bool>,
    pub(crate) center_table: Vec<usize>,
}

impl Scratch {
    pub(crate) fn new() -> Self {
        Self {
            switch_membership: Vec::new(),
            is_center: Vec::new(),
            center_table: Vec::new(),
        }
    }

    /// Resize for a chunk of `n` points and clear every flag.
    pub(crate) fn reset(&mut self, n: usize) {
        self.switch_membership.clear();
        self.switch_membership.resize(n, false);
        self.is_center.clear();
        self.is_center.resize(n, false);
        self.center_table.clear();
        self.center_table.resize(n, 0);
    }
}

/// Evaluate the compound move "open a facility at `x`, reassign every point
/// that benefits, close facilities left dominated", and commit it iff the
/// net change is negative.
///
/// Returns the (nonnegative) cost saved; `0.0` means nothing was committed
/// and, apart from scratch, nothing was mutated. On commit, `assign`,
/// `costs`, `is_center`, and `k` are updated together so that the usual
/// consistency holds: `costs[i] = weights[i] * dist(i, assign[i])`,
/// `is_center` is exactly the image of `assign`, and `k` counts it.
///
/// Work memory is one `(workers + 1) x stride` matrix of doubles. Rows
/// `0..workers` are per-worker strips: the first `k` slots accumulate "what
/// closing each facility would save if its members moved to `x`", the last
/// slot the worker's share of the cost of opening `x`. The final row holds
/// the reduced per-facility closing balance, written by the worker owning
/// each facility (compact indices owned by one worker are contiguous).
pub(crate) fn pgain(
    x: usize,
    points: &mut PointSet,
    z: f64,
    k: &mut usize,
    scratch: &mut Scratch,
    pool: &ThreadPool,
    workers: usize,
) -> f64 {
    let n = points.len();
    let rs = ranges(n, workers);
    let stride = round_up(*k + 2, STRIDE_ALIGN);
    let cost_slot = stride - 1;

    // Phase A: rebuild center_table. Count per block, prefix-sum the counts,
    // then number each block's centers from its offset.
    let counts: Vec<usize> = {
        let is_center = &scratch.is_center;
        pool.install(|| {
            rs.par_iter()
                .map(|r| r.clone().filter(|&i| is_center[i]).count())
                .collect()
        })
    };
    let mut offsets = vec![0usize; workers];
    let mut acc = 0usize;
    for (off, &c) in offsets.iter_mut().zip(&counts) {
        *off = acc;
        acc += c;
    }
    debug_assert_eq!(acc, *k);

    {
        let is_center = &scratch.is_center;
        let ct_slices = split_ranges(&mut scratch.center_table[..n], &rs);
        pool.install(|| {
            ct_slices
                .into_par_iter()
                .zip(rs.par_iter())
                .zip(offsets.par_iter())
                .for_each(|((ct, r), &off)| {
                    let mut next = off;
                    for (slot, i) in ct.iter_mut().zip(r.clone()) {
                        if is_center[i] {
                            *slot = next;
                            next += 1;
                        }
                    }
                });
        });
    }

    // Phase B: fresh work memory is already zeroed; clear the switch flags.
    let mut work_mem = vec![0.0f64; stride * (workers + 1)];
    {
        let sm_slices = split_ranges(&mut scratch.switch_membership[..n], &rs);
        pool.install(|| sm_slices.into_par_iter().for_each(|s| s.fill(false)));
    }

    let (strips, gl_lower) = work_mem.split_at_mut(workers * stride);

    // Phase C: accumulate, per worker, the savings each facility would see
    // from shipping its members to x, and the direct gain of the points that
    // would rather switch to x.
    {
        let coords = &points.coords;
        let weights = &points.weights;
        let assign = &points.assign;
        let costs = &points.costs;
        let center_table = &scratch.center_table;
        let sm_slices = split_ranges(&mut scratch.switch_membership[..n], &rs);
        pool.install(|| {
            strips
                .par_chunks_mut(stride)
                .zip(sm_slices)
                .zip(rs.par_iter())
                .for_each(|((strip, sm), r)| {
                    let mut open_cost = 0.0f64;
                    for (flag, i) in sm.iter_mut().zip(r.clone()) {
                        let x_cost = dist(coords.row(i), coords.row(x)) * weights[i];
                        let current = costs[i];
                        if x_cost < current {
                            // i switches to x no matter what closes
                            *flag = true;
                            open_cost += f64::from(x_cost) - f64::from(current);
                        } else {
                            // i's own facility could save this by closing,
                            // were its members shipped to x
                            strip[center_table[assign[i]]] +=
                                f64::from(current) - f64::from(x_cost);
                        }
                    }
                    strip[cost_slot] = open_cost;
                });
        });
    }

    // Phase D: per facility, reduce the strips into its closing balance
    // (z saved by closing minus the reassignment overhead) and tally, per
    // worker, how many facilities would close and what that contributes.
    let strips_ro: &[f64] = strips;
    let center_ranges: Vec<std::ops::Range<usize>> = offsets
        .iter()
        .zip(&counts)
        .map(|(&o, &c)| o..o + c)
        .collect();
    let close_stats: Vec<(usize, f64)> = {
        let is_center = &scratch.is_center;
        let center_table = &scratch.center_table;
        let gl_slices = split_ranges(&mut gl_lower[..*k], &center_ranges);
        pool.install(|| {
            gl_slices
                .into_par_iter()
                .zip(rs.par_iter())
                .zip(offsets.par_iter())
                .map(|((gl, r), &off)| {
                    let mut to_close = 0usize;
                    let mut adjust = 0.0f64;
                    for i in r.clone() {
                        if !is_center[i] {
                            continue;
                        }
                        let slot = center_table[i];
                        let mut low = z;
                        for t in 0..workers {
                            low += strips_ro[t * stride + slot];
                        }
                        gl[slot - off] = low;
                        if low > 0.0 {
                            to_close += 1;
                            adjust -= low;
                        }
                    }
                    (to_close, adjust)
                })
                .collect()
        })
    };

    let mut to_close_total = 0usize;
    let mut open_cost_total = z;
    for (t, &(c, adjust)) in close_stats.iter().enumerate() {
        to_close_total += c;
        open_cost_total += strips_ro[t * stride + cost_slot] + adjust;
    }

    if open_cost_total >= 0.0 {
        return 0.0;
    }

    // Phase E: commit. Reassign every switcher and every member of a closing
    // facility, drop the closed facilities, open x.
    {
        let coords = &points.coords;
        let weights = &points.weights;
        let sm = &scratch.switch_membership;
        let center_table = &scratch.center_table;
        let gl: &[f64] = gl_lower;
        let assign_slices = split_ranges(&mut points.assign[..n], &rs);
        let cost_slices = split_ranges(&mut points.costs[..n], &rs);
        pool.install(|| {
            assign_slices
                .into_par_iter()
                .zip(cost_slices)
                .zip(rs.par_iter())
                .for_each(|((assigns, costs), r)| {
                    for ((a, c), i) in assigns.iter_mut().zip(costs.iter_mut()).zip(r.clone()) {
                        let closing = gl[center_table[*a]] > 0.0;
                        if sm[i] || closing {
                            *c = dist(coords.row(i), coords.row(x)) * weights[i];
                            *a = x;
                        }
                    }
                });
        });
    }
    {
        let center_table = &scratch.center_table;
        let gl: &[f64] = gl_lower;
        let ic_slices = split_ranges(&mut scratch.is_center[..n], &rs);
        pool.install(|| {
            ic_slices
                .into_par_iter()
                .zip(rs.par_iter())
                .for_each(|(ic, r)| {
                    for (flag, i) in ic.iter_mut().zip(r.clone()) {
                        if *flag && gl[center_table[i]] > 0.0 {
                            *flag = false;
                        }
                    }
                });
        });
    }
    scratch.is_center[x] = true;
    *k = *k + 1 - to_close_total;

    -open_cost_total
}
