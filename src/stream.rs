use std::io::Write;

use log::{debug, info};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::ThreadPool;

use crate::config::StreamConfig;
use crate::error::StreamError;
use crate::gain::Scratch;
use crate::io::{write_centers, PointStream};
use crate::points::PointSet;
use crate::search::kmedian;

/// Two-level streaming k-median engine.
///
/// Clusters the input chunk by chunk, promotes each chunk's weighted centers
/// into an accumulated center set, and re-clusters that set once the stream
/// ends. Owns the worker pool; one instance can cluster several streams.
pub struct StreamClusterer {
    config: StreamConfig,
    pool: ThreadPool,
}

impl StreamClusterer {
    /// Validate the configuration and build the dedicated worker pool.
    pub fn new(config: StreamConfig) -> Result<Self, StreamError> {
        config.validate()?;
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.n_workers)
            .build()
            .map_err(|e| StreamError::WorkerPool(e.to_string()))?;
        Ok(Self { config, pool })
    }

    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    /// Consume `stream` and return the final weighted centers.
    ///
    /// Fails fatally if the accumulated intermediate centers would exceed
    /// `center_capacity`, or on any stream error.
    pub fn cluster(&self, stream: &mut dyn PointStream) -> Result<ClusterResult, StreamError> {
        let cfg = &self.config;
        let mut rng = ChaCha8Rng::seed_from_u64(cfg.seed);
        let mut chunk = PointSet::with_capacity(cfg.chunk_size, cfg.dim);
        let mut centers = PointSet::with_capacity(cfg.center_capacity, cfg.dim);
        let mut scratch = Scratch::new();
        let mut id_offset = 0u64;

        loop {
            let num_read = stream.read(chunk.coords_buffer_mut(), cfg.dim, cfg.chunk_size)?;
            debug!("read {num_read} points");
            chunk.set_len(num_read);
            chunk.stamp_ids(id_offset);
            chunk.reset_weights();
            scratch.reset(num_read);

            let (cost, kfinal) = kmedian(
                &mut chunk,
                cfg.kmin,
                cfg.kmax,
                &mut scratch,
                &mut rng,
                &self.pool,
                cfg.n_workers,
            );
            chunk.finalize_centers();

            if kfinal + centers.len() > cfg.center_capacity {
                return Err(StreamError::CenterOverflow {
                    needed: kfinal + centers.len(),
                    capacity: cfg.center_capacity,
                });
            }
            centers.append_centers_from(&chunk);
            id_offset += num_read as u64;
            info!(
                "chunk clustered: {kfinal} centers (cost {cost:.4}), {} accumulated",
                centers.len()
            );

            if stream.eof() {
                break;
            }
        }

        scratch.reset(centers.len());
        let (cost, kfinal) = kmedian(
            &mut centers,
            cfg.kmin,
            cfg.kmax,
            &mut scratch,
            &mut rng,
            &self.pool,
            cfg.n_workers,
        );
        centers.finalize_centers();
        info!("final pass: {kfinal} centers (cost {cost:.4})");

        Ok(ClusterResult { centers })
    }
}

/// Final centers produced by [`StreamClusterer::cluster`].
pub struct ClusterResult {
    centers: PointSet,
}

impl ClusterResult {
    /// The final center point set. Only points listed by [`Self::medians`]
    /// are actual centers; the rest are absorbed members.
    pub fn centers(&self) -> &PointSet {
        &self.centers
    }

    /// Indices of the final centers (the image of the assignment array)
    pub fn medians(&self) -> Vec<usize> {
        let n = self.centers.len();
        let mut is_median = vec![false; n];
        for i in 0..n {
            is_median[self.centers.assignment(i)] = true;
        }
        (0..n).filter(|&i| is_median[i]).collect()
    }

    /// Number of final centers
    pub fn num_centers(&self) -> usize {
        self.medians().len()
    }

    /// Write the centers in the text dump format (ID line, `%weight` line,
    /// coordinate line, blank line).
    pub fn write_to<W: Write>(&self, w: &mut W) -> std::io::Result<()> {
        write_centers(&self.centers, w)
    }
}
