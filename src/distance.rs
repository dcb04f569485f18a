use ndarray::ArrayView1;

/// Squared Euclidean distance between two points of the same dimension.
///
/// Coordinates and the result are single precision; callers accumulate
/// weighted distances in `f64`.
#[inline]
pub fn dist(a: ArrayView1<f32>, b: ArrayView1<f32>) -> f32 {
    let mut acc = 0.0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        let d = x - y;
        acc += d * d;
    }
    acc
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_dist_known_values() {
        let a = array![1.0f32, 2.0, 3.0];
        let b = array![4.0f32, 6.0, 3.0];
        assert_relative_eq!(dist(a.view(), b.view()), 9.0 + 16.0, epsilon = 1e-6);
    }

    #[test]
    fn test_dist_self_is_zero() {
        let a = array![0.5f32, -1.25, 7.0, 0.0];
        assert_eq!(dist(a.view(), a.view()), 0.0);
    }

    #[test]
    fn test_dist_is_symmetric() {
        let a = array![1.0f32, -2.0];
        let b = array![3.5f32, 0.25];
        assert_eq!(dist(a.view(), b.view()), dist(b.view(), a.view()));
    }
}
