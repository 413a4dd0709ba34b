use ahash::{AHashMap, AHashSet};

use pedigree::{SampleLayout, Species};
use variant::{Allele, Genotype, VariantError, VariantRecord};

/// VCF columns of a species.
#[derive(Debug, Clone)]
pub struct SpeciesColumns {
    pub species: Species,
    /// Adults and mothers.
    pub adults : Vec<usize>,
    /// Every sample, progenies included.
    pub samples: Vec<usize>,
}

impl SpeciesColumns {
    pub fn from_layout(layout: &SampleLayout) -> Vec<Self> {
        layout.species_set()
            .species()
            .into_iter()
            .map(|species| Self {
                species,
                adults : layout.adults_of(species).collect(),
                samples: layout.of_species(species).collect(),
            })
            .collect()
    }

    fn adult_genotypes<'r>(&'r self, record: &'r VariantRecord) -> impl Iterator<Item = Result<&'r Genotype, VariantError>> + 'r {
        self.adults.iter().map(|col| record.genotype(*col))
    }

    /// Fraction of adults carrying `allele` on their right side. `None` for species without adults.
    pub fn right_side_prevalence(&self, record: &VariantRecord, allele: Allele) -> Result<Option<f64>, VariantError> {
        if self.adults.is_empty() {
            return Ok(None)
        }
        let mut carriers = 0usize;
        for genotype in self.adult_genotypes(record) {
            if genotype?.right == allele {
                carriers += 1;
            }
        }
        Ok(Some(carriers as f64 / self.adults.len() as f64))
    }

    /// Fraction of adults whose genotype is fully missing (`./.`). `0.0` for species without adults.
    pub fn missing_rate(&self, record: &VariantRecord) -> Result<f64, VariantError> {
        if self.adults.is_empty() {
            return Ok(0.0)
        }
        let mut missing = 0usize;
        for genotype in self.adult_genotypes(record) {
            if genotype?.is_missing() {
                missing += 1;
            }
        }
        Ok(missing as f64 / self.adults.len() as f64)
    }

    /// Count of every genuine allele call among adults.
    pub fn allele_counts(&self, record: &VariantRecord) -> Result<AHashMap<Allele, usize>, VariantError> {
        let mut counts = AHashMap::new();
        for genotype in self.adult_genotypes(record) {
            for allele in genotype?.alleles().into_iter().filter(Allele::is_called) {
                *counts.entry(allele).or_insert(0) += 1;
            }
        }
        Ok(counts)
    }
}

/// Distinct unordered adult genotypes, among those carrying at least one genuine call.
pub fn distinct_adult_genotypes(record: &VariantRecord, adults: &[usize]) -> Result<usize, VariantError> {
    let mut distinct = AHashSet::new();
    for col in adults {
        let genotype = record.genotype(*col)?;
        if genotype.left.is_called() || genotype.right.is_called() {
            distinct.insert(*genotype);
        }
    }
    Ok(distinct.len())
}

/// Apply `f` on the genotype of every column in `columns`. Returns the number of modified genotypes.
pub fn rewrite<F>(record: &mut VariantRecord, columns: &[usize], f: F) -> Result<usize, VariantError>
where
    F: Fn(&Genotype) -> Genotype,
{
    let mut changed = 0;
    for col in columns {
        let genotype = f(record.genotype(*col)?);
        if record.set_genotype(*col, genotype)? {
            changed += 1;
        }
    }
    Ok(changed)
}
