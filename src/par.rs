//! Index-range partitioning for the worker pool.
//!
//! Every parallel phase of the solver sweeps `[0, n)` split into one block
//! per worker, with the last worker absorbing the remainder. Keeping the
//! partition explicit (rather than letting the scheduler pick split points)
//! makes per-worker reductions deterministic for a fixed worker count.

use std::ops::Range;

/// Block partition of `[0, n)` into `workers` ranges.
pub(crate) fn ranges(n: usize, workers: usize) -> Vec<Range<usize>> {
    let bsize = n / workers;
    (0..workers)
        .map(|t| {
            let start = t * bsize;
            let end = if t == workers - 1 { n } else { start + bsize };
            start..end
        })
        .collect()
}

/// Split `data` into disjoint mutable slices matching `ranges`.
///
/// The ranges must be contiguous and ascending from 0, as produced by
/// [`ranges`]; `data` must cover at least the last range's end.
pub(crate) fn split_ranges<'a, T>(
    mut data: &'a mut [T],
    ranges: &[Range<usize>],
) -> Vec<&'a mut [T]> {
    let mut out = Vec::with_capacity(ranges.len());
    let mut consumed = 0;
    for r in ranges {
        let (head, tail) = data.split_at_mut(r.end - consumed);
        out.push(head);
        data = tail;
        consumed = r.end;
    }
    out
}
