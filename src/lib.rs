//! # stream-kmedian
//!
//! Streaming k-median clustering with a parallel local-search solver.
//!
//! Unbounded streams of weighted points are clustered chunk by chunk: each
//! chunk is solved by facility-location local search, its centers are
//! promoted (with folded weights) into a bounded intermediate set, and that
//! set is re-clustered once the stream ends. The number of centers is forced
//! into a caller-supplied band `[kmin, kmax]` by binary search on the
//! facility opening cost.
//!
//! ## Features
//!
//! - **Two-level streaming**: constant memory in the stream length; only one
//!   chunk plus the intermediate centers are ever resident
//! - **Parallel local search**: every solver phase is a partitioned sweep
//!   over a dedicated rayon pool with a fixed worker count
//! - **Deterministic**: fixed seed and worker count reproduce the same
//!   centers, move for move
//! - **Pluggable input**: a [`PointStream`] trait with synthetic and raw
//!   binary file implementations
//!
//! ## Example
//!
//! ```rust
//! use stream_kmedian::{StreamClusterer, StreamConfig, SyntheticStream};
//!
//! let config = StreamConfig::new(2, 5)
//!     .with_dim(4)
//!     .with_chunk_size(100)
//!     .with_center_capacity(50)
//!     .with_workers(2);
//!
//! let clusterer = StreamClusterer::new(config).unwrap();
//! let mut stream = SyntheticStream::new(200, 1);
//! let result = clusterer.cluster(&mut stream).unwrap();
//!
//! assert!(result.num_centers() >= 1);
//! let mut dump = Vec::new();
//! result.write_to(&mut dump).unwrap();
//! ```

mod config;
mod distance;
mod error;
mod feasible;
mod gain;
mod io;
mod par;
mod points;
mod search;
mod speedy;
mod stream;

pub use config::{StreamConfig, ITER, SEED, SP};
pub use distance::dist;
pub use error::StreamError;
pub use io::{FileStream, PointStream, SyntheticStream};
pub use points::PointSet;
pub use stream::{ClusterResult, StreamClusterer};
