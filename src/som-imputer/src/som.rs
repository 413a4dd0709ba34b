use ndarray::{Array1, Array2, Array3, ArrayView1, Axis, Zip};

use crate::pca;

/// Asymptotic decay of a training parameter: `x / (1 + t / (T/2))`
pub fn decay(x: f64, t: usize, max_iter: usize) -> f64 {
    x / (1.0 + t as f64 / (max_iter as f64 / 2.0))
}

/// `n` evenly spaced values within `[start, stop]`. A single value is set to `start`.
fn linspace(start: f64, stop: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => (0..n).map(|i| start + (stop - start) * i as f64 / (n - 1) as f64).collect(),
    }
}

/// Self-organizing map with a rectangular topology, a gaussian neighborhood and euclidean activation.
///
/// Training is deterministic: weights are initialized along the first two principal components of
/// the training data, and training samples are presented in order.
#[derive(Debug, Clone)]
pub struct Som {
    weights      : Array3<f64>,
    sigma        : f64,
    learning_rate: f64,
}

impl Som {
    pub fn new(xdim: usize, ydim: usize, input_len: usize, sigma: f64, learning_rate: f64) -> Self {
        Self { weights: Array3::zeros((xdim, ydim, input_len)), sigma, learning_rate }
    }

    pub fn shape(&self) -> (usize, usize) {
        let (x, y, _) = self.weights.dim();
        (x, y)
    }

    pub fn weights(&self) -> &Array3<f64> {
        &self.weights
    }

    /// `w[i, j] = c_i * pc1 + c_j * pc2`, with `c` linearly spaced within `[-1, 1]`
    pub fn pca_init(&mut self, data: &Array2<f64>) {
        let (pc1, pc2) = pca::principal_axes(data);
        let (xdim, ydim) = self.shape();
        for (i, c1) in linspace(-1.0, 1.0, xdim).into_iter().enumerate() {
            for (j, c2) in linspace(-1.0, 1.0, ydim).into_iter().enumerate() {
                let w: Array1<f64> = &pc1 * c1 + &pc2 * c2;
                self.weights.slice_mut(ndarray::s![i, j, ..]).assign(&w);
            }
        }
    }

    /// Coordinates of the neuron closest to `x`. Ties favor the first neuron in row-major order.
    pub fn winner(&self, x: ArrayView1<f64>) -> (usize, usize) {
        let (_, ydim) = self.shape();
        let mut best = (0, 0);
        let mut best_dist = f64::INFINITY;
        for (idx, neuron) in self.weights.lanes(Axis(2)).into_iter().enumerate() {
            let dist: f64 = neuron.iter().zip(x.iter()).map(|(w, v)| (v - w) * (v - w)).sum();
            if dist < best_dist {
                best_dist = dist;
                best = (idx / ydim, idx % ydim);
            }
        }
        best
    }

    /// Gaussian neighborhood centered on `c`
    fn neighborhood(&self, c: (usize, usize), sigma: f64) -> Array2<f64> {
        let d = 2.0 * sigma * sigma;
        let gauss = |a: usize, b: usize| (-((a as f64 - b as f64).powi(2)) / d).exp();
        Array2::from_shape_fn(self.shape(), |(i, j)| gauss(i, c.0) * gauss(j, c.1))
    }

    /// Move every neuron towards `x`, weighted by its neighborhood to the winning neuron.
    fn update(&mut self, x: ArrayView1<f64>, win: (usize, usize), t: usize, max_iter: usize) {
        let eta = decay(self.learning_rate, t, max_iter);
        let sig = decay(self.sigma, t, max_iter);
        let g = self.neighborhood(win, sig) * eta;
        Zip::from(self.weights.lanes_mut(Axis(2)))
            .and(&g)
            .for_each(|mut neuron, g| {
                Zip::from(&mut neuron).and(&x).for_each(|w, v| *w += g * (v - *w));
            });
    }

    /// Train for `iterations` steps. Step `t` presents the `t mod n`-th row of `data`.
    pub fn train(&mut self, data: &Array2<f64>, iterations: usize) {
        let n = data.nrows();
        if n == 0 {
            return
        }
        for t in 0..iterations {
            let x = data.row(t % n);
            let win = self.winner(x);
            self.update(x, win, t, iterations);
        }
    }
}
