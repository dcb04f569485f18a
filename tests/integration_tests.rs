use std::io::Write;

use approx::assert_relative_eq;
use ndarray::Array2;
use ndarray_rand::rand_distr::Uniform;
use ndarray_rand::RandomExt;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use stream_kmedian::{
    FileStream, StreamClusterer, StreamConfig, StreamError, SyntheticStream,
};

/// Write raw little-endian f32 values to a temp file, the input wire format.
fn write_f32_file(values: &[f32]) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    for v in values {
        file.write_all(&v.to_le_bytes()).unwrap();
    }
    file.flush().unwrap();
    file
}

/// Points scattered tightly around well-separated cluster seeds, flattened
/// row-major.
fn clustered_values(n: usize, dim: usize, n_clusters: usize, seed: u64) -> Vec<f32> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let seeds = Array2::random_using((n_clusters, dim), Uniform::new(0.0f32, 100.0), &mut rng);
    let noise = Array2::random_using((n, dim), Uniform::new(-0.5f32, 0.5), &mut rng);
    let mut out = Vec::with_capacity(n * dim);
    for i in 0..n {
        let c = i % n_clusters;
        for d in 0..dim {
            out.push(seeds[[c, d]] + noise[[i, d]]);
        }
    }
    out
}

fn median_weight_sum(result: &stream_kmedian::ClusterResult) -> f64 {
    result
        .medians()
        .iter()
        .map(|&i| f64::from(result.centers().weight(i)))
        .sum()
}

// ============================================================================
// Streaming Behavior
// ============================================================================

#[test]
fn test_single_chunk_weight_conservation() {
    let config = StreamConfig::new(2, 3)
        .with_dim(3)
        .with_chunk_size(50)
        .with_center_capacity(10)
        .with_workers(1);
    let clusterer = StreamClusterer::new(config).unwrap();
    let mut stream = SyntheticStream::new(50, 1);

    let result = clusterer.cluster(&mut stream).unwrap();

    let k = result.num_centers();
    assert!(k >= 1, "at least one center must survive");
    assert!(k <= 10, "centers cannot exceed the store capacity");
    assert_relative_eq!(median_weight_sum(&result), 50.0, epsilon = 1e-3);

    // every reported ID is a valid stream index
    for &m in &result.medians() {
        assert!(result.centers().id(m) < 50);
    }
}

#[test]
fn test_multi_chunk_weight_conservation() {
    let config = StreamConfig::new(2, 4)
        .with_dim(2)
        .with_chunk_size(25)
        .with_center_capacity(20)
        .with_workers(1);
    let clusterer = StreamClusterer::new(config).unwrap();
    let mut stream = SyntheticStream::new(100, 1);

    let result = clusterer.cluster(&mut stream).unwrap();

    assert!(result.num_centers() >= 1);
    assert!(result.num_centers() <= 20);
    // four chunks of 25 unit-weight points all fold into the final centers
    assert_relative_eq!(median_weight_sum(&result), 100.0, epsilon = 1e-3);
    for &m in &result.medians() {
        assert!(result.centers().id(m) < 100);
    }
}

#[test]
fn test_trivial_stream_every_point_is_a_center() {
    let config = StreamConfig::new(1, 5)
        .with_dim(2)
        .with_chunk_size(10)
        .with_center_capacity(8)
        .with_workers(2);
    let clusterer = StreamClusterer::new(config).unwrap();
    let mut stream = SyntheticStream::new(3, 1);

    let result = clusterer.cluster(&mut stream).unwrap();

    assert_eq!(result.num_centers(), 3);
    let medians = result.medians();
    let mut ids: Vec<u64> = medians.iter().map(|&i| result.centers().id(i)).collect();
    ids.sort_unstable();
    assert_eq!(ids, vec![0, 1, 2]);
    for &m in &medians {
        assert_eq!(result.centers().weight(m), 1.0);
    }
}

#[test]
fn test_center_store_overflow_is_fatal() {
    // two trivial chunks of 3 centers each against a store of 4
    let config = StreamConfig::new(1, 5)
        .with_dim(2)
        .with_chunk_size(3)
        .with_center_capacity(4)
        .with_workers(1);
    let clusterer = StreamClusterer::new(config).unwrap();
    let mut stream = SyntheticStream::new(6, 1);

    let result = clusterer.cluster(&mut stream);
    assert!(matches!(
        result,
        Err(StreamError::CenterOverflow {
            needed: 6,
            capacity: 4
        })
    ));
}

// ============================================================================
// File Input
// ============================================================================

#[test]
fn test_identical_points_collapse_to_one_center() {
    let point = [1.5f32, -2.0, 0.25];
    let values: Vec<f32> = point.iter().copied().cycle().take(8 * 3).collect();
    let file = write_f32_file(&values);

    let config = StreamConfig::new(1, 3)
        .with_dim(3)
        .with_chunk_size(8)
        .with_center_capacity(10)
        .with_workers(2);
    let clusterer = StreamClusterer::new(config).unwrap();
    let mut stream = FileStream::open(file.path()).unwrap();

    let result = clusterer.cluster(&mut stream).unwrap();

    assert_eq!(result.num_centers(), 1, "coincident points need one center");
    let m = result.medians()[0];
    assert_relative_eq!(result.centers().weight(m), 8.0, epsilon = 1e-6);
    for (d, &expected) in point.iter().enumerate() {
        assert_relative_eq!(result.centers().point(m)[d], expected, epsilon = 1e-5);
    }
}

#[test]
fn test_separated_clusters_land_in_band() {
    let values = clustered_values(60, 2, 3, 7);
    let file = write_f32_file(&values);

    let config = StreamConfig::new(2, 6)
        .with_dim(2)
        .with_chunk_size(60)
        .with_center_capacity(12)
        .with_workers(2);
    let clusterer = StreamClusterer::new(config).unwrap();
    let mut stream = FileStream::open(file.path()).unwrap();

    let result = clusterer.cluster(&mut stream).unwrap();

    let k = result.num_centers();
    assert!(
        (2..=6).contains(&k),
        "expected 2..=6 centers on separated clusters, got {k}"
    );
    assert_relative_eq!(median_weight_sum(&result), 60.0, epsilon = 1e-3);
}

#[test]
fn test_truncated_file_is_fatal() {
    // 5 full 4-float records plus half a record
    let mut values = clustered_values(5, 4, 2, 3);
    values.extend_from_slice(&[1.0, 2.0]);
    let file = write_f32_file(&values);

    let config = StreamConfig::new(1, 2)
        .with_dim(4)
        .with_chunk_size(10)
        .with_center_capacity(10)
        .with_workers(1);
    let clusterer = StreamClusterer::new(config).unwrap();
    let mut stream = FileStream::open(file.path()).unwrap();

    let result = clusterer.cluster(&mut stream);
    assert!(matches!(result, Err(StreamError::TruncatedInput)));
}

// ============================================================================
// Reproducibility
// ============================================================================

#[test]
fn test_fixed_seed_runs_are_byte_identical() {
    let dump = |n_workers: usize| -> Vec<u8> {
        let config = StreamConfig::new(2, 4)
            .with_dim(3)
            .with_chunk_size(40)
            .with_center_capacity(20)
            .with_workers(n_workers);
        let clusterer = StreamClusterer::new(config).unwrap();
        let mut stream = SyntheticStream::new(120, 1);
        let result = clusterer.cluster(&mut stream).unwrap();
        let mut out = Vec::new();
        result.write_to(&mut out).unwrap();
        out
    };

    assert_eq!(dump(1), dump(1), "same seed and worker count, same bytes");
}

#[test]
fn test_config_validation_rejects_bad_band() {
    let config = StreamConfig::new(4, 2);
    assert!(matches!(
        StreamClusterer::new(config),
        Err(StreamError::InvalidConfig(_))
    ));
}
