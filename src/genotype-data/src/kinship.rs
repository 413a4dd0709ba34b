use variant::Pseudobinary;
use variant_store::KinshipRow;

/// Running sums of a single pair of samples.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct PairSums {
    rbeta_sum: f64,
    rw_num   : f64,
    rw_den   : f64,
    ru_sum   : f64,
    ru_l     : u64,
}

/// Goudet-Kay-Weir kinship accumulator, over every pair of samples `i < j`.
///
/// Pairs are stored in a flat, upper-triangular layout.
#[derive(Debug, Clone)]
pub struct KinshipAccumulator {
    n    : usize,
    pairs: Vec<PairSums>,
    loci : u64,
}

impl KinshipAccumulator {
    pub fn new(n_samples: usize) -> Self {
        let n_pairs = n_samples * n_samples.saturating_sub(1) / 2;
        Self { n: n_samples, pairs: vec![PairSums::default(); n_pairs], loci: 0 }
    }

    /// Number of loci which contributed to the sums.
    pub fn loci(&self) -> u64 {
        self.loci
    }

    fn pair_index(&self, i: usize, j: usize) -> usize {
        i * (2 * self.n - i - 1) / 2 + (j - i - 1)
    }

    /// Add a locus to the sums.
    ///
    /// Only samples with a called genotype contribute. The locus is ignored when the reference
    /// allele frequency of called samples is 0 or 1. Returns `true` if the locus contributed.
    pub fn add_locus(&mut self, codes: &[Pseudobinary]) -> bool {
        let dosages: Vec<Option<f64>> = codes.iter()
            .map(|code| code.ref_dosage().map(f64::from))
            .collect();

        let (sum, called) = dosages.iter()
            .flatten()
            .fold((0.0, 0usize), |(sum, n), x| (sum + x, n + 1));
        if called == 0 {
            return false
        }
        let p = sum / (2.0 * called as f64);
        if p <= 0.0 || p >= 1.0 {
            return false
        }
        let het = 2.0 * p * (1.0 - p);

        for i in 0..self.n {
            let Some(xi) = dosages[i] else { continue };
            for j in i + 1..self.n {
                let Some(xj) = dosages[j] else { continue };
                let idx = self.pair_index(i, j);
                let cov = (xi - 2.0 * p) * (xj - 2.0 * p);
                let sums = &mut self.pairs[idx];
                sums.rbeta_sum += (1.0 + (xi - 1.0) * (xj - 1.0)) / 2.0;
                sums.rw_num    += cov;
                sums.rw_den    += het;
                sums.ru_sum    += cov / het;
                sums.ru_l      += 1;
            }
        }
        self.loci += 1;
        true
    }

    /// Turn the running sums into one kinship row per pair of samples.
    ///
    /// `rbeta` is computed relative to the mean allele sharing `Ms = 2·Σm_ij / (N(N-1))`, where the sum
    /// runs over every pair of samples and every contributing locus.
    pub fn finalize(&self, samples: &[String]) -> Vec<KinshipRow> {
        let ms = (self.loci > 0 && !self.pairs.is_empty()).then(|| {
            let total: f64 = self.pairs.iter().map(|sums| sums.rbeta_sum).sum();
            2.0 * total / (self.n * (self.n - 1)) as f64
        });

        let mut rows = Vec::with_capacity(self.pairs.len());
        for i in 0..self.n {
            for j in i + 1..self.n {
                let idx = self.pair_index(i, j);
                let sums = &self.pairs[idx];
                let rbeta = match ms {
                    Some(ms) if ms != 1.0 => Some((sums.rbeta_sum - ms) / (1.0 - ms)),
                    _ => None,
                };
                rows.push(KinshipRow {
                    i,
                    j,
                    sample_i: samples.get(i).cloned().unwrap_or_default(),
                    sample_j: samples.get(j).cloned().unwrap_or_default(),
                    rbeta,
                    rw: (sums.rw_den > 0.0).then(|| sums.rw_num / sums.rw_den),
                    ru: (sums.ru_l > 0).then(|| sums.ru_sum / sums.ru_l as f64),
                });
            }
        }
        rows
    }
}
