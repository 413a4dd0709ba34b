use ahash::AHashMap;

use crate::{KinshipRow, LdRow, SnpRow, StoreError, VariantStore};

/// In-memory variant store. Rows are kept in insertion order, and indexed by key.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    snps       : Vec<SnpRow>,
    ld         : Vec<LdRow>,
    kinship    : Vec<KinshipRow>,
    samples    : Vec<String>,
    snp_index  : AHashMap<String, usize>,
    ld_index   : AHashMap<String, Vec<usize>>,
    kin_index  : AHashMap<(usize, usize), usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store out of previously persisted rows, and index them.
    pub fn from_rows(snps: Vec<SnpRow>, ld: Vec<LdRow>, kinship: Vec<KinshipRow>) -> Result<Self, StoreError> {
        let mut store = Self { snps, ld, kinship, ..Self::default() };
        store.index()?;
        Ok(store)
    }

    pub fn snps(&self) -> &[SnpRow] {
        &self.snps
    }

    pub fn ld_table(&self) -> &[LdRow] {
        &self.ld
    }

    pub fn kinship_table(&self) -> &[KinshipRow] {
        &self.kinship
    }

    fn pair_key(i: usize, j: usize) -> (usize, usize) {
        (i.min(j), i.max(j))
    }
}

impl VariantStore for MemoryStore {
    fn reset(&mut self) {
        *self = Self::default();
    }

    fn index(&mut self) -> Result<(), StoreError> {
        use StoreError::{DuplicateSnp, DuplicateKinship};
        self.snp_index.clear();
        self.ld_index.clear();
        self.kin_index.clear();

        for (i, snp) in self.snps.iter().enumerate() {
            if self.snp_index.insert(snp.id.clone(), i).is_some() {
                return Err(DuplicateSnp(snp.id.clone()))
            }
        }
        for (i, row) in self.ld.iter().enumerate() {
            self.ld_index.entry(row.snp1.clone()).or_default().push(i);
        }
        for (i, row) in self.kinship.iter().enumerate() {
            if self.kin_index.insert(Self::pair_key(row.i, row.j), i).is_some() {
                return Err(DuplicateKinship(row.i, row.j))
            }
        }

        // Sample metadata is recoverable from the kinship table.
        if self.samples.is_empty() {
            let mut samples: Vec<(usize, &str)> = self.kinship.iter()
                .flat_map(|row| [(row.i, row.sample_i.as_str()), (row.j, row.sample_j.as_str())])
                .collect();
            samples.sort_unstable();
            samples.dedup();
            self.samples = samples.into_iter().map(|(_, id)| id.to_string()).collect();
        }
        Ok(())
    }

    fn insert_snp(&mut self, row: SnpRow) -> Result<(), StoreError> {
        if self.snp_index.contains_key(&row.id) {
            return Err(StoreError::DuplicateSnp(row.id))
        }
        self.snp_index.insert(row.id.clone(), self.snps.len());
        self.snps.push(row);
        Ok(())
    }

    fn snp(&self, id: &str) -> Option<&SnpRow> {
        self.snp_index.get(id).map(|i| &self.snps[*i])
    }

    fn snp_ids(&self) -> Vec<String> {
        self.snps.iter().map(|snp| snp.id.clone()).collect()
    }

    fn snp_ids_with_missing(&self) -> Vec<String> {
        self.snps.iter().filter(|snp| snp.has_missing()).map(|snp| snp.id.clone()).collect()
    }

    fn insert_ld(&mut self, row: LdRow) {
        self.ld_index.entry(row.snp1.clone()).or_default().push(self.ld.len());
        self.ld.push(row);
    }

    fn ld_rows(&self, snp1: &str) -> Vec<&LdRow> {
        self.ld_index.get(snp1)
            .map(|rows| rows.iter().map(|i| &self.ld[*i]).collect())
            .unwrap_or_default()
    }

    fn r2_summary(&self) -> Option<(f64, f64)> {
        let values: Vec<f64> = self.ld.iter()
            .filter(|row| !row.is_sentinel() && row.r2.is_finite())
            .map(|row| row.r2)
            .collect();
        if values.is_empty() {
            return None
        }
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let var = values.iter().map(|r2| (r2 - mean).powi(2)).sum::<f64>() / n;
        Some((mean, var.sqrt()))
    }

    fn insert_kinship(&mut self, row: KinshipRow) -> Result<(), StoreError> {
        use StoreError::{SelfPair, DuplicateKinship};
        if row.i == row.j {
            return Err(SelfPair(row.i, row.j))
        }
        let key = Self::pair_key(row.i, row.j);
        if self.kin_index.contains_key(&key) {
            return Err(DuplicateKinship(row.i, row.j))
        }
        self.kin_index.insert(key, self.kinship.len());
        self.kinship.push(row);
        Ok(())
    }

    fn kinship(&self, i: usize, j: usize) -> Option<&KinshipRow> {
        self.kin_index.get(&Self::pair_key(i, j)).map(|k| &self.kinship[*k])
    }

    fn kinship_len(&self) -> usize {
        self.kinship.len()
    }

    fn set_samples(&mut self, samples: Vec<String>) {
        self.samples = samples;
    }

    fn samples(&self) -> &[String] {
        &self.samples
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::approx_eq;
    use variant::Pseudobinary::{HomRef, Het, Missing};

    fn snp(id: &str, missing: Vec<usize>) -> SnpRow {
        SnpRow {
            id: id.to_string(), chrom: "seq1".to_string(), pos: 1, reference: "A".to_string(), alt: "T".to_string(),
            codes: vec![HomRef, Het, Missing], missing
        }
    }

    fn ld(snp1: &str, snp2: &str, r2: f64) -> LdRow {
        LdRow { snp1: snp1.to_string(), snp2: snp2.to_string(), d: 0.0, r2, snp2_missing: vec![] }
    }

    fn kin(i: usize, j: usize) -> KinshipRow {
        KinshipRow {
            i, j, sample_i: format!("S{i}"), sample_j: format!("S{j}"), rbeta: Some(0.5), rw: None, ru: Some(0.1)
        }
    }

    #[test]
    fn snp_table() -> Result<(), StoreError> {
        let mut store = MemoryStore::new();
        store.insert_snp(snp("seq1:1", vec![2]))?;
        store.insert_snp(snp("seq1:2", vec![]))?;
        assert!(store.insert_snp(snp("seq1:1", vec![])).is_err());
        assert_eq!(store.snp_ids(), ["seq1:1", "seq1:2"]);
        assert_eq!(store.snp_ids_with_missing(), ["seq1:1"]);
        assert_eq!(store.snp("seq1:2").map(|s| s.missing.len()), Some(0));
        assert!(store.snp("seq1:3").is_none());
        Ok(())
    }

    #[test]
    fn ld_table() {
        let mut store = MemoryStore::new();
        store.insert_ld(ld("a", "b", 0.2));
        store.insert_ld(ld("a", "c", 0.4));
        store.insert_ld(ld("b", "c", crate::LD_SENTINEL));
        assert_eq!(store.ld_rows("a").len(), 2);
        assert_eq!(store.ld_rows("c").len(), 0);

        let (mean, sd) = store.r2_summary().expect("two valid rows");
        assert!(approx_eq!(f64, mean, 0.3, epsilon = 1e-12));
        assert!(approx_eq!(f64, sd, 0.1, epsilon = 1e-12));
    }

    #[test]
    fn empty_r2_summary() {
        let mut store = MemoryStore::new();
        assert!(store.r2_summary().is_none());
        store.insert_ld(ld("a", "b", crate::LD_SENTINEL));
        assert!(store.r2_summary().is_none());
    }

    #[test]
    fn kinship_table() -> Result<(), StoreError> {
        let mut store = MemoryStore::new();
        store.insert_kinship(kin(0, 1))?;
        store.insert_kinship(kin(0, 2))?;
        assert!(store.insert_kinship(kin(1, 0)).is_err());
        assert!(store.insert_kinship(kin(2, 2)).is_err());
        assert_eq!(store.kinship(1, 0).and_then(|k| k.rbeta), Some(0.5));
        assert_eq!(store.kinship(2, 0).and_then(|k| k.rw), None);
        assert!(store.kinship(1, 2).is_none());
        Ok(())
    }

    #[test]
    fn reindex_is_idempotent() -> Result<(), StoreError> {
        let mut store = MemoryStore::from_rows(
            vec![snp("x", vec![0]), snp("y", vec![])],
            vec![ld("x", "y", 0.9)],
            vec![kin(0, 1), kin(0, 2), kin(1, 2)],
        )?;
        store.index()?;
        store.index()?;
        assert_eq!(store.ld_rows("x").len(), 1);
        assert_eq!(store.snp_ids_with_missing(), ["x"]);
        assert_eq!(store.samples(), ["S0", "S1", "S2"]);

        store.reset();
        assert!(store.snp_ids().is_empty());
        assert_eq!(store.kinship_len(), 0);
        Ok(())
    }

    #[test]
    fn duplicate_rows_on_load() {
        assert!(MemoryStore::from_rows(vec![snp("x", vec![]), snp("x", vec![])], vec![], vec![]).is_err());
        assert!(MemoryStore::from_rows(vec![], vec![], vec![kin(0, 1), kin(1, 0)]).is_err());
    }
}
