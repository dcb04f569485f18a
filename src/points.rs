use ndarray::{Array2, ArrayView1};
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;

/// A bundle of weighted points sharing one flat coordinate buffer.
///
/// Storage is struct-of-arrays: one `capacity x dim` coordinate matrix plus
/// parallel per-point vectors. Only the first `len` rows are live; the
/// streaming driver reuses one `PointSet` per chunk and grows a second one
/// as the intermediate center store.
///
/// `assign[i]` names the point currently serving as `i`'s center (self for a
/// center) and `costs[i]` caches `weights[i] * dist(i, assign[i])`.
pub struct PointSet {
    pub(crate) coords: Array2<f32>,
    pub(crate) weights: Vec<f32>,
    pub(crate) ids: Vec<u64>,
    pub(crate) assign: Vec<usize>,
    pub(crate) costs: Vec<f32>,
    len: usize,
}

impl PointSet {
    pub(crate) fn with_capacity(capacity: usize, dim: usize) -> Self {
        Self {
            coords: Array2::zeros((capacity, dim)),
            weights: vec![0.0; capacity],
            ids: vec![0; capacity],
            assign: vec![0; capacity],
            costs: vec![0.0; capacity],
            len: 0,
        }
    }

    /// Number of live points
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Point dimensionality
    pub fn dim(&self) -> usize {
        self.coords.ncols()
    }

    pub(crate) fn capacity(&self) -> usize {
        self.coords.nrows()
    }

    pub(crate) fn set_len(&mut self, len: usize) {
        debug_assert!(len <= self.capacity());
        self.len = len;
    }

    /// Coordinates of point `i`
    pub fn point(&self, i: usize) -> ArrayView1<f32> {
        self.coords.row(i)
    }

    /// Weight of point `i`
    pub fn weight(&self, i: usize) -> f32 {
        self.weights[i]
    }

    /// Global stream ID of point `i`
    pub fn id(&self, i: usize) -> u64 {
        self.ids[i]
    }

    /// Index of the center point `i` is assigned to
    pub fn assignment(&self, i: usize) -> usize {
        self.assign[i]
    }

    /// Cached assignment cost of point `i`
    pub fn cost(&self, i: usize) -> f32 {
        self.costs[i]
    }

    /// The full coordinate buffer, for the input stream to fill
    pub(crate) fn coords_buffer_mut(&mut self) -> &mut [f32] {
        self.coords.as_slice_mut().unwrap()
    }

    /// Stamp every live point with its cumulative stream index.
    pub(crate) fn stamp_ids(&mut self, offset: u64) {
        for (i, id) in self.ids[..self.len].iter_mut().enumerate() {
            *id = offset + i as u64;
        }
    }

    pub(crate) fn reset_weights(&mut self) {
        for w in &mut self.weights[..self.len] {
            *w = 1.0;
        }
    }

    /// Permute the live points into a random order.
    ///
    /// Every per-point array moves together, IDs included; stale `assign`
    /// values are rebuilt by the next solver pass.
    pub(crate) fn shuffle(&mut self, rng: &mut ChaCha8Rng) {
        let n = self.len;
        let mut perm: Vec<usize> = (0..n).collect();
        perm.shuffle(rng);

        let mut coords = self.coords.clone();
        let mut weights = self.weights.clone();
        let mut ids = self.ids.clone();
        let mut assign = self.assign.clone();
        let mut costs = self.costs.clone();
        for (dst, &src) in perm.iter().enumerate() {
            coords.row_mut(dst).assign(&self.coords.row(src));
            weights[dst] = self.weights[src];
            ids[dst] = self.ids[src];
            assign[dst] = self.assign[src];
            costs[dst] = self.costs[src];
        }
        self.coords = coords;
        self.weights = weights;
        self.ids = ids;
        self.assign = assign;
        self.costs = costs;
    }

    /// Replace each center's coordinates by the weighted mean of its members
    /// and fold the member weights into it.
    ///
    /// Members are folded in point order, which is deterministic. A folded
    /// member's weight is zeroed, so repeating the pass is a no-op; member
    /// weights are never read again once their center absorbed them.
    pub(crate) fn finalize_centers(&mut self) {
        let dim = self.dim();
        for i in 0..self.len {
            let c = self.assign[i];
            if c == i {
                continue;
            }
            let combined = self.weights[c] + self.weights[i];
            if combined == 0.0 {
                continue;
            }
            let rel = self.weights[i] / combined;
            for d in 0..dim {
                let blended = self.coords[[c, d]] * (1.0 - rel) + self.coords[[i, d]] * rel;
                self.coords[[c, d]] = blended;
            }
            self.weights[c] = combined;
            self.weights[i] = 0.0;
        }
    }

    /// Append every center of `chunk` (the image of its `assign` array) to
    /// this set, carrying coordinates, folded weight, and stream ID.
    pub(crate) fn append_centers_from(&mut self, chunk: &PointSet) {
        let mut is_median = vec![false; chunk.len];
        for i in 0..chunk.len {
            is_median[chunk.assign[i]] = true;
        }
        for i in 0..chunk.len {
            if !is_median[i] {
                continue;
            }
            let dst = self.len;
            debug_assert!(dst < self.capacity());
            self.coords.row_mut(dst).assign(&chunk.coords.row(i));
            self.weights[dst] = chunk.weights[i];
            self.ids[dst] = chunk.ids[i];
            self.len += 1;
        }
    }

    #[cfg(test)]
    pub(crate) fn from_coords(coords: Array2<f32>, weights: Vec<f32>) -> Self {
        let n = coords.nrows();
        assert_eq!(weights.len(), n);
        Self {
            coords,
            weights,
            ids: (0..n as u64).collect(),
            assign: vec![0; n],
            costs: vec![0.0; n],
            len: n,
        }
    }
}
