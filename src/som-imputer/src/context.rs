use variant_store::{LdRow, SnpRow, VariantStore};

/// Identifiers of the (at most `k`) SNPs in highest LD with the target, among those without missing data
/// and with `r² >= threshold`. Sorted by decreasing `r²`. Ties keep the order of `rows`.
pub fn select<'a>(rows: &[&'a LdRow], threshold: f64, k: usize) -> Vec<&'a str> {
    let mut candidates: Vec<&LdRow> = rows.iter()
        .copied()
        .filter(|row| !row.is_sentinel() && row.snp2_missing.is_empty() && row.r2 >= threshold)
        .collect();
    candidates.sort_by(|a, b| b.r2.total_cmp(&a.r2));
    candidates.into_iter().take(k).map(|row| row.snp2.as_str()).collect()
}

/// A SNP carrying missing data, and its context SNPs.
#[derive(Debug, Clone)]
pub struct Site {
    pub target : SnpRow,
    pub context: Vec<SnpRow>,
}

impl Site {
    /// Gather the rows required to impute SNP `id`. `None` if the SNP carries no missing data, or is unknown.
    ///
    /// Without any threshold, no context is gathered.
    pub fn gather<S: VariantStore>(store: &S, id: &str, threshold: Option<f64>, k: usize) -> Option<Self> {
        let target = store.snp(id).filter(|snp| snp.has_missing())?.clone();
        let context = match threshold {
            Some(threshold) => select(&store.ld_rows(id), threshold, k).into_iter()
                .filter_map(|snp2| store.snp(snp2).cloned())
                .collect(),
            None => Vec::new(),
        };
        Some(Self { target, context })
    }
}
