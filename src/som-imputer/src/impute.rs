use log::trace;

use parser::{ImputationMethod, KinshipEstimator, SomOptions};
use variant::{Pseudobinary, VariantRecord};
use variant_store::{KinshipRow, SharedStore, VariantStore};

use crate::{SomError, context::Site, features, som::Som};

/// Most frequent called genotype. Ties favor `0/0`, then `0/1`, then `1/1`.
pub fn most_frequent<I: IntoIterator<Item = Pseudobinary>>(codes: I) -> Option<Pseudobinary> {
    let mut counts = [0usize; 3];
    for code in codes {
        if let Some(i) = Pseudobinary::CALLED.iter().position(|called| *called == code) {
            counts[i] += 1;
        }
    }
    let mut best: Option<(Pseudobinary, usize)> = None;
    for (code, count) in Pseudobinary::CALLED.into_iter().zip(counts) {
        if count > 0 && best.map_or(true, |(_, n)| count > n) {
            best = Some((code, count));
        }
    }
    best.map(|(code, _)| code)
}

fn kinship_value(estimator: KinshipEstimator, row: &KinshipRow) -> Option<f64> {
    match estimator {
        KinshipEstimator::Rbeta => row.rbeta,
        KinshipEstimator::Rw    => row.rw,
        KinshipEstimator::Ru    => row.ru,
    }
}

/// Imputes the missing calls of single variants, using the rows of a shared variant store.
pub struct SiteImputer<'a, S> {
    options  : &'a SomOptions,
    store    : &'a SharedStore<S>,
    threshold: Option<f64>,
}

impl<'a, S: VariantStore> SiteImputer<'a, S> {
    pub fn new(options: &'a SomOptions, store: &'a SharedStore<S>, threshold: Option<f64>) -> Self {
        Self { options, store, threshold }
    }

    /// Fill every missing call of `record`. Returns the number of filled calls.
    ///
    /// Records which are not listed as SNPs carrying missing data are left untouched. Only calls carrying a
    /// missing side are rewritten: imputed-md calls are kept as-is.
    pub fn impute(&self, record: &mut VariantRecord) -> Result<usize, SomError> {
        let key = record.key();
        let Some(site) = self.store.read(|s| Site::gather(s, &key, self.threshold, self.options.context_size)) else {
            return Ok(0)
        };

        let mut targets = Vec::with_capacity(site.target.missing.len());
        for col in &site.target.missing {
            let genotype = record.genotype(*col).map_err(|source| SomError::Rewrite { sample: *col, key: key.clone(), source })?;
            if genotype.has_missing() {
                targets.push(*col);
            }
        }
        if targets.is_empty() {
            return Ok(0)
        }

        let calls = self.predict(&site, &targets)?;
        let mut filled = 0;
        for (col, call) in targets.iter().zip(calls) {
            let Some(call) = call else { continue };
            let changed = record.set_genotype(*col, call.decode())
                .map_err(|source| SomError::Rewrite { sample: *col, key: key.clone(), source })?;
            if changed {
                filled += 1;
            }
        }
        trace!("{key}: {filled}/{} missing calls imputed, using {} context SNPs", targets.len(), site.context.len());
        Ok(filled)
    }

    /// Genotype of every target column. `None` when no called genotype is available at all.
    fn predict(&self, site: &Site, targets: &[usize]) -> Result<Vec<Option<Pseudobinary>>, SomError> {
        let codes = &site.target.codes;
        let fallback = most_frequent(codes.iter().copied());

        // Sample columns without missing data at the target SNP.
        let training: Vec<usize> = (0..codes.len()).filter(|i| !codes[*i].is_missing()).collect();
        if site.context.is_empty() || training.is_empty() {
            return Ok(vec![fallback; targets.len()])
        }

        let haplotypes = features::haplotypes(&site.context, codes.len())?;
        let matrix = features::one_hot(&haplotypes);
        let train = matrix.select(ndarray::Axis(0), &training);

        let options = self.options;
        let mut som = Som::new(options.xdim, options.ydim, matrix.ncols(), options.sigma, options.learning_rate);
        som.pca_init(&train);
        som.train(&train, options.iterations);

        let winners: Vec<(usize, usize)> = train.rows().into_iter().map(|row| som.winner(row)).collect();
        let mut calls = Vec::with_capacity(targets.len());
        for target in targets {
            let win = som.winner(matrix.row(*target));
            let neighbors: Vec<usize> = training.iter()
                .zip(&winners)
                .filter(|(_, w)| **w == win)
                .map(|(col, _)| *col)
                .collect();
            let call = match neighbors.is_empty() {
                true  => fallback,
                false => Some(self.from_neighbors(*target, &neighbors, codes)),
            };
            calls.push(call);
        }
        Ok(calls)
    }

    /// Neighbors are training samples: their genotype is always called.
    fn from_neighbors(&self, target: usize, neighbors: &[usize], codes: &[Pseudobinary]) -> Pseudobinary {
        let majority = || most_frequent(neighbors.iter().map(|n| codes[*n])).unwrap_or(Pseudobinary::HomRef);
        match self.options.method {
            ImputationMethod::Mf => majority(),
            ImputationMethod::Ck => {
                let estimator = self.options.estimator;
                let kinship: Vec<Option<f64>> = self.store.read(|s| neighbors.iter()
                    .map(|n| s.kinship(target, *n).and_then(|row| kinship_value(estimator, row)))
                    .collect()
                );
                let mut closest: Option<(usize, f64)> = None;
                for (n, k) in neighbors.iter().zip(kinship) {
                    let Some(k) = k.filter(|k| k.is_finite()) else { continue };
                    if closest.map_or(true, |(_, best)| k > best) {
                        closest = Some((*n, k));
                    }
                }
                closest.map_or_else(majority, |(n, _)| codes[n])
            },
        }
    }
}
