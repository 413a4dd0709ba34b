use nalgebra::{DMatrix, DVector, SymmetricEigen};
use ndarray::{Array1, Array2, Axis};

/// Sample covariance matrix of the columns of `data` (`n - 1` denominator).
///
/// Matrices with less than two rows yield a zero matrix.
pub fn covariance(data: &Array2<f64>) -> Array2<f64> {
    let (n, dim) = data.dim();
    if n < 2 {
        return Array2::zeros((dim, dim))
    }
    let mean = data.mean_axis(Axis(0)).unwrap_or_else(|| Array1::zeros(dim));
    let centered = data - &mean;
    centered.t().dot(&centered) / (n as f64 - 1.0)
}

/// First two principal axes of `data`, as unit vectors, sorted by decreasing eigenvalue.
///
/// Ties are resolved in favor of the lowest eigenvector index. A missing second axis (one-dimensional
/// data) is returned as a zero vector.
pub fn principal_axes(data: &Array2<f64>) -> (Array1<f64>, Array1<f64>) {
    let cov = covariance(data);
    let dim = cov.nrows();
    let eigen = SymmetricEigen::new(DMatrix::from_fn(dim, dim, |i, j| cov[[i, j]]));

    let mut order: Vec<usize> = (0..dim).collect();
    order.sort_by(|a, b| eigen.eigenvalues[*b].total_cmp(&eigen.eigenvalues[*a]));

    let axis = |rank: usize| -> Array1<f64> {
        order.get(rank).map_or_else(
            || Array1::zeros(dim),
            |col| to_array(&eigen.eigenvectors.column(*col).into_owned()),
        )
    };
    (axis(0), axis(1))
}

fn to_array(v: &DVector<f64>) -> Array1<f64> {
    v.iter().copied().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::approx_eq;
    use ndarray::array;

    #[test]
    fn covariance_matches_definition() {
        let data = array![[1.0, 2.0], [3.0, 6.0], [5.0, 10.0]];
        let cov = covariance(&data);
        assert_eq!(cov, array![[4.0, 8.0], [8.0, 16.0]]);
        assert_eq!(covariance(&array![[1.0, 2.0]]), Array2::<f64>::zeros((2, 2)));
    }

    #[test]
    fn dominant_axis_first() {
        // Spread along the second dimension only, then along the first one with a lower variance.
        let data = array![
            [0.0, -2.0, 0.0],
            [0.0,  2.0, 0.0],
            [1.0,  0.0, 0.0],
            [-1.0, 0.0, 0.0],
        ];
        let (pc1, pc2) = principal_axes(&data);
        assert!(approx_eq!(f64, pc1[1].abs(), 1.0, epsilon = 1e-9));
        assert!(approx_eq!(f64, pc1[0].abs() + pc1[2].abs(), 0.0, epsilon = 1e-9));
        assert!(approx_eq!(f64, pc2[0].abs(), 1.0, epsilon = 1e-9));
        assert!(approx_eq!(f64, pc2[1].abs() + pc2[2].abs(), 0.0, epsilon = 1e-9));
    }

    #[test]
    fn one_dimensional_data() {
        let (pc1, pc2) = principal_axes(&array![[1.0], [2.0]]);
        assert!(approx_eq!(f64, pc1[0].abs(), 1.0, epsilon = 1e-12));
        assert_eq!(pc2, array![0.0]);
    }
}
