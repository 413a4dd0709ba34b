use std::{collections::BTreeMap, fmt::{self, Display, Formatter}};

/// Reason why a variant was removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Filter {
    /// `DP < min_dp`
    Depth,
    /// Adult missing data of a parental species above its ceiling.
    MissingData,
    /// At most one distinct adult genotype.
    Monomorphic,
    /// A species carries more than two distinct alleles.
    TooManyAlleles,
    /// A per-species allele frequency below `maf`.
    MinorAlleleFrequency,
    /// Scenario 0 does not tolerate imputation.
    Imputed,
    /// More than one alternative allele left on a SNP.
    Multiallelic,
}

impl Display for Filter {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Self::Depth                => "depth",
            Self::MissingData          => "missing-data",
            Self::Monomorphic          => "monomorphic",
            Self::TooManyAlleles       => "too-many-alleles",
            Self::MinorAlleleFrequency => "maf",
            Self::Imputed              => "scenario-0-imputation",
            Self::Multiallelic         => "multiallelic",
        };
        write!(f, "{reason}")
    }
}

/// Number of filtered variants, per reason.
#[derive(Debug, Default, Clone)]
pub struct FilterCounts(BTreeMap<Filter, u64>);

impl FilterCounts {
    pub fn add(&mut self, filter: Filter) {
        *self.0.entry(filter).or_insert(0) += 1;
    }

    pub fn get(&self, filter: Filter) -> u64 {
        self.0.get(&filter).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u64 {
        self.0.values().sum()
    }
}

impl Display for FilterCounts {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "none")
        }
        let mut sep = "";
        for (filter, count) in &self.0 {
            write!(f, "{sep}{filter}: {count}")?;
            sep = " | ";
        }
        Ok(())
    }
}
