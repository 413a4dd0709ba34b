use log::{debug, trace};
use rayon::prelude::*;

use located_error::prelude::*;
use variant::Pseudobinary;
use variant_store::{LdRow, SharedStore, SnpRow, VariantStore, LD_SENTINEL};

use crate::GenotypeDataError;

/// Joint genotype counts of two SNPs, over samples called at both.
///
/// Row-major: rows are the genotype of the first SNP, columns the genotype of the second,
/// in `0/0, 0/1, 1/1` order, i.e. `n1..n9`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct GenotypeTable([u64; 9]);

impl GenotypeTable {
    pub fn new(counts: [u64; 9]) -> Self {
        Self(counts)
    }

    fn class(code: Pseudobinary) -> Option<usize> {
        match code {
            Pseudobinary::HomRef  => Some(0),
            Pseudobinary::Het     => Some(1),
            Pseudobinary::HomAlt  => Some(2),
            Pseudobinary::Missing => None,
        }
    }

    pub fn count(snp1: &[Pseudobinary], snp2: &[Pseudobinary]) -> Self {
        let mut table = Self::default();
        for (a, b) in snp1.iter().zip(snp2) {
            if let (Some(a), Some(b)) = (Self::class(*a), Self::class(*b)) {
                table.0[3 * a + b] += 1;
            }
        }
        table
    }

    /// Number of samples called at both SNPs.
    pub fn n(&self) -> u64 {
        self.0.iter().sum()
    }

    /// Reference and alternative allele frequencies of both SNPs: `(rf1, af1, rf2, af2)`
    fn frequencies(&self) -> (f64, f64, f64, f64) {
        let n = self.0.map(|x| x as f64);
        let alleles = 2.0 * self.n() as f64;
        let row = |r: usize| n[3 * r] + n[3 * r + 1] + n[3 * r + 2];
        let col = |c: usize| n[c] + n[3 + c] + n[6 + c];
        (
            (2.0 * row(0) + row(1)) / alleles,
            (2.0 * row(2) + row(1)) / alleles,
            (2.0 * col(0) + col(1)) / alleles,
            (2.0 * col(2) + col(1)) / alleles,
        )
    }

    /// Ragsdale-Gravel unbiased estimate of `D`, and the derived `r²`.
    ///
    /// `r²` is set to [`LD_SENTINEL`] whenever any allele frequency is zero. Tables counting less than two
    /// samples yield `D = 0` and a sentinel `r²`.
    pub fn estimate(&self) -> (f64, f64) {
        let n = self.n();
        if n < 2 {
            return (0.0, LD_SENTINEL)
        }
        let [n1, n2, n3, n4, n5, n6, n7, n8, n9] = self.0.map(|x| x as f64);
        let n = n as f64;

        let d = ((n1 + n2 / 2.0 + n4 / 2.0 + n5 / 4.0) * (n5 / 4.0 + n6 / 2.0 + n8 / 2.0 + n9)
            - (n2 / 2.0 + n3 + n5 / 4.0 + n6 / 2.0) * (n4 / 2.0 + n5 / 4.0 + n7 + n8 / 2.0))
            / (n * (n - 1.0));

        let (rf1, af1, rf2, af2) = self.frequencies();
        let denominator = rf1 * af1 * rf2 * af2;
        let r2 = if denominator == 0.0 { LD_SENTINEL } else { d * d / denominator };
        (d, r2)
    }
}

/// Pairwise LD of `snp1` against every other SNP in `snp2_ids`.
fn ld_rows_of<S: VariantStore>(store: &SharedStore<S>, snp1_id: &str, snp2_ids: &[String]) -> Vec<LdRow> {
    // Worker-local copy of the target row.
    let Some(snp1): Option<SnpRow> = store.read(|s| s.snp(snp1_id).cloned()) else {
        return Vec::new()
    };

    let mut rows = Vec::with_capacity(snp2_ids.len().saturating_sub(1));
    for snp2_id in snp2_ids.iter().filter(|id| *id != snp1_id) {
        let counted = store.read(|s| s.snp(snp2_id).map(|snp2| {
            (GenotypeTable::count(&snp1.codes, &snp2.codes), snp2.missing.clone())
        }));
        let Some((table, snp2_missing)) = counted else { continue };
        let (d, r2) = table.estimate();
        rows.push(LdRow { snp1: snp1.id.clone(), snp2: snp2_id.clone(), d, r2, snp2_missing });
    }
    trace!("LD of {snp1_id}: {} rows", rows.len());
    rows
}

/// Compute linkage disequilibrium between every SNP carrying missing data and every other SNP of the store.
///
/// SNPs carrying missing data are distributed among `threads` workers (capped by the number of available
/// cpus). Rows are inserted in the order of their first SNP. Returns the number of inserted rows.
pub fn compute_ld<S: VariantStore + Send>(store: &SharedStore<S>, threads: usize) -> Result<usize> {
    use GenotypeDataError::ThreadPool;
    let workers = threads.min(num_cpus::get()).max(1);
    let (targets, snp2_ids) = store.read(|s| (s.snp_ids_with_missing(), s.snp_ids()));
    debug!("Computing LD for {} SNPs with missing data, against {} SNPs, using {workers} workers",
        targets.len(), snp2_ids.len()
    );

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .build()
        .map_err(ThreadPool)
        .loc("While computing linkage disequilibrium")?;

    let per_target: Vec<Vec<LdRow>> = pool.install(|| {
        targets.par_iter()
            .map(|snp1| ld_rows_of(store, snp1, &snp2_ids))
            .collect()
    });

    let inserted = store.write(|s| {
        let mut inserted = 0;
        for row in per_target.into_iter().flatten() {
            s.insert_ld(row);
            inserted += 1;
        }
        inserted
    });
    Ok(inserted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::approx_eq;
    use variant_store::MemoryStore;
    use Pseudobinary::{HomRef, Het, HomAlt, Missing};

    #[test]
    fn two_homozygotes_two_heterozygotes() {
        let table = GenotypeTable::count(&[HomRef, HomRef, Het, Het], &[HomRef, HomRef, Het, Het]);
        assert_eq!(table, GenotypeTable::new([2, 0, 0, 0, 2, 0, 0, 0, 0]));
        assert_eq!(table.n(), 4);
        let (rf1, af1, rf2, af2) = table.frequencies();
        assert_eq!((rf1, af1, rf2, af2), (0.75, 0.25, 0.75, 0.25));

        let (d, r2) = table.estimate();
        assert!(approx_eq!(f64, d, 1.0 / 12.0, epsilon = 1e-12));
        assert!(approx_eq!(f64, r2, 16.0 / 81.0, epsilon = 1e-12));
    }

    #[test]
    fn missing_samples_are_not_counted() {
        let table = GenotypeTable::count(&[HomRef, Missing, HomAlt, Het], &[Het, HomRef, Missing, HomAlt]);
        assert_eq!(table, GenotypeTable::new([0, 1, 0, 0, 0, 1, 0, 0, 0]));
    }

    #[test]
    fn fixed_snp_yields_sentinel() {
        let table = GenotypeTable::count(&[HomRef, HomRef, HomRef], &[HomRef, Het, HomAlt]);
        let (_, r2) = table.estimate();
        assert_eq!(r2, LD_SENTINEL);
        assert_eq!(GenotypeTable::default().estimate(), (0.0, LD_SENTINEL));
        assert_eq!(GenotypeTable::new([0, 0, 0, 0, 1, 0, 0, 0, 0]).estimate(), (0.0, LD_SENTINEL));
    }

    #[test]
    fn perfect_linkage() {
        let codes = [HomRef, HomAlt, HomRef, HomAlt];
        let (d, r2) = GenotypeTable::count(&codes, &codes).estimate();
        // ((2)(2) - 0) / 12
        assert!(approx_eq!(f64, d, 1.0 / 3.0, epsilon = 1e-12));
        assert!(approx_eq!(f64, r2, (1.0 / 9.0) / 0.0625, epsilon = 1e-12));
    }

    fn snp(id: &str, codes: Vec<Pseudobinary>) -> SnpRow {
        let missing = codes.iter().enumerate().filter(|(_, c)| c.is_missing()).map(|(i, _)| i).collect();
        SnpRow {
            id: id.to_string(),
            chrom: "seq1".to_string(),
            pos: 1,
            reference: "A".to_string(),
            alt: "T".to_string(),
            codes,
            missing,
        }
    }

    #[test]
    fn rows_only_for_snps_with_missing_data() -> Result<()> {
        let mut store = MemoryStore::new();
        store.insert_snp(snp("seq1:1", vec![HomRef, Het, HomAlt, Missing]))?;
        store.insert_snp(snp("seq1:2", vec![HomRef, Het, HomAlt, HomRef]))?;
        store.insert_snp(snp("seq1:3", vec![Missing, Het, HomAlt, HomRef]))?;
        let store = SharedStore::new(store);

        assert_eq!(compute_ld(&store, 4)?, 4);
        store.read(|s| {
            let snp2: Vec<&str> = s.ld_rows("seq1:1").iter().map(|row| row.snp2.as_str()).collect();
            assert_eq!(snp2, ["seq1:2", "seq1:3"]);
            assert!(s.ld_rows("seq1:2").is_empty());
            let row = s.ld_rows("seq1:3")[0];
            assert_eq!(row.snp2, "seq1:1");
            assert_eq!(row.snp2_missing, [3]);
        });
        Ok(())
    }
}
