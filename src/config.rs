use crate::error::StreamError;

/// Seed for every deterministic RNG stream in a run.
pub const SEED: u64 = 1;

/// Number of extra chances `speedy` gets to reach `kmin` centers before the
/// facility cost is lowered.
pub const SP: usize = 1;

/// Scale factor for the feasible sample size and the local-search iteration
/// count (`ITER * k * ln k`).
pub const ITER: usize = 3;

/// Configuration for the streaming k-median engine
#[derive(Debug, Clone)]
pub struct StreamConfig {
    /// Minimum number of centers allowed in the final solution
    pub kmin: usize,

    /// Maximum number of centers allowed in the final solution
    pub kmax: usize,

    /// Dimensionality of the input points
    pub dim: usize,

    /// Number of points clustered per streaming step
    pub chunk_size: usize,

    /// Maximum number of accumulated intermediate centers. Exceeding this is
    /// a fatal error; size it to hold `kmax` centers per chunk.
    pub center_capacity: usize,

    /// Number of worker threads for the parallel solver phases
    pub n_workers: usize,

    /// Seed for the solver RNG
    pub seed: u64,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            kmin: 10,
            kmax: 20,
            dim: 32,
            chunk_size: 10_000,
            center_capacity: 1_000,
            n_workers: 1,
            seed: SEED,
        }
    }
}

impl StreamConfig {
    /// Create a configuration with the given center-count band
    pub fn new(kmin: usize, kmax: usize) -> Self {
        Self {
            kmin,
            kmax,
            ..Default::default()
        }
    }

    /// Set the point dimensionality
    pub fn with_dim(mut self, dim: usize) -> Self {
        self.dim = dim;
        self
    }

    /// Set the number of points per streaming chunk
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Set the capacity of the intermediate center store
    pub fn with_center_capacity(mut self, center_capacity: usize) -> Self {
        self.center_capacity = center_capacity;
        self
    }

    /// Set the worker thread count
    pub fn with_workers(mut self, n_workers: usize) -> Self {
        self.n_workers = n_workers;
        self
    }

    /// Set the solver RNG seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Check every parameter range; called by [`crate::StreamClusterer::new`].
    pub fn validate(&self) -> Result<(), StreamError> {
        if self.kmin < 1 {
            return Err(StreamError::InvalidConfig(
                "kmin must be at least 1".to_string(),
            ));
        }
        if self.kmax < self.kmin {
            return Err(StreamError::InvalidConfig(format!(
                "kmax ({}) must be at least kmin ({})",
                self.kmax, self.kmin
            )));
        }
        if self.dim < 1 {
            return Err(StreamError::InvalidConfig(
                "dim must be at least 1".to_string(),
            ));
        }
        if self.chunk_size < 1 {
            return Err(StreamError::InvalidConfig(
                "chunk_size must be at least 1".to_string(),
            ));
        }
        if self.center_capacity < 1 {
            return Err(StreamError::InvalidConfig(
                "center_capacity must be at least 1".to_string(),
            ));
        }
        if self.n_workers < 1 {
            return Err(StreamError::InvalidConfig(
                "n_workers must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
