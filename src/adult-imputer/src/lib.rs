use std::path::Path;

use log::{debug, info, trace};

use located_error::prelude::*;
use logger::{Counters, Progress};
use parser::{AdultOptions, IoOptions, Scenario};
use pedigree::{Pedigree, SampleLayout, Species};
use variant::{Allele, Genotype, VariantError, VariantRecord};
use vcf_io::{VcfReader, VcfWriter};

mod error;
pub use error::AdultError;

mod filter;
pub use filter::{Filter, FilterCounts};

mod species;
use species::{SpeciesColumns, distinct_adult_genotypes, rewrite};

/// Fate of a processed variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Variant is kept. `imputed` counts adult calls rewritten with the imputed-md allele.
    Kept{imputed: usize},
    Filtered(Filter),
}

/// Filters variants and rewrites adult genotypes, using per-species allele statistics.
#[derive(Debug)]
pub struct AdultImputer {
    options   : AdultOptions,
    groups    : Vec<SpeciesColumns>,
    adults    : Vec<usize>,
    non_adults: Vec<usize>,
}

impl AdultImputer {
    pub fn new(options: AdultOptions, layout: &SampleLayout) -> Self {
        let adults: Vec<usize> = layout.adults().collect();
        let non_adults = (0..layout.len()).filter(|col| !adults.contains(col)).collect();
        let groups = SpeciesColumns::from_layout(layout);
        for group in &groups {
            debug!("{:?}: {} adults / {} samples", group.species, group.adults.len(), group.samples.len());
        }
        Self { options, groups, adults, non_adults }
    }

    /// Run every rewrite and filter on a single variant.
    ///
    /// # Errors
    /// - if the INFO field carries no valid `DP` tag.
    /// - if any genotype refers to a sample column outside of the record.
    pub fn process(&self, record: &mut VariantRecord) -> Result<Outcome, VariantError> {
        let indel = record.is_indel();
        let depth = record.depth()?;

        if self.options.fix_ref {
            self.fix_reference(record)?;
        }
        if !indel {
            self.mask_rare_alleles(record)?;
        }
        self.collapse_half_missing(record)?;
        record.repack_alts();

        // Missing data is measured before imputation.
        let missing_rates = self.groups.iter()
            .map(|group| group.missing_rate(record))
            .collect::<Result<Vec<f64>, _>>()?;
        let flagged = self.flag_species(&missing_rates);

        let mut imputed = self.impute_missing(record, &flagged)?;
        imputed += self.rewrite_homozygotes(record, &flagged)?;

        if let Some(filter) = self.gate(record, depth, &missing_rates, imputed, indel)? {
            trace!("{}: filtered ({filter})", record.key());
            return Ok(Outcome::Filtered(filter))
        }
        Ok(Outcome::Kept{imputed})
    }

    /// Promote the first alternative allele to reference when no adult carries the reference allele.
    ///
    /// Non-adult reference calls cannot be expressed anymore, and are set to missing.
    fn fix_reference(&self, record: &mut VariantRecord) -> Result<bool, VariantError> {
        for col in &self.adults {
            if record.genotype(*col)?.contains(Allele::REF) {
                return Ok(false)
            }
        }
        if record.alts.is_empty() {
            return Ok(false)
        }
        rewrite(record, &self.non_adults, |gt| gt.map(|a| if a == Allele::REF { Allele::Missing } else { a }))?;
        debug!("{}: promoting {} as the reference allele", record.key(), record.alts[0]);
        Ok(record.rotate_reference())
    }

    /// Set alternative alleles carried by too few adults of a species to missing, within that species.
    fn mask_rare_alleles(&self, record: &mut VariantRecord) -> Result<(), VariantError> {
        let n_alts = u8::try_from(record.alts.len()).unwrap_or(u8::MAX);
        for group in &self.groups {
            for k in 1..=n_alts {
                let allele = Allele::Called(k);
                let Some(prevalence) = group.right_side_prevalence(record, allele)? else { continue };
                if prevalence < self.options.min_aa {
                    let masked = rewrite(record, &group.samples, |gt| gt.map(|a| if a == allele { Allele::Missing } else { a }))?;
                    trace!("{}: allele {k} masked in {masked} {:?} samples (prevalence: {prevalence:.3})", record.key(), group.species);
                }
            }
        }
        Ok(())
    }

    /// Half-missing calls (`a/.`) become `./.`, except for adults under scenario 3.
    fn collapse_half_missing(&self, record: &mut VariantRecord) -> Result<(), VariantError> {
        let collapse = |gt: &Genotype| if gt.is_half_missing() { Genotype::MISSING } else { *gt };
        rewrite(record, &self.non_adults, collapse)?;
        if self.options.scenario != Scenario::S3 {
            rewrite(record, &self.adults, collapse)?;
        }
        Ok(())
    }

    /// Species whose adult missing data lies above `min_md_imputation`. Hybrids inherit the flag of
    /// either parental species.
    fn flag_species(&self, missing_rates: &[f64]) -> Vec<bool> {
        let mut flagged: Vec<bool> = self.groups.iter()
            .zip(missing_rates)
            .map(|(group, md)| !group.adults.is_empty() && *md > self.options.min_md_imputation)
            .collect();
        let parental_flag = self.groups.iter()
            .zip(&flagged)
            .any(|(group, flag)| *flag && matches!(group.species, Species::Sp1 | Species::Sp2));
        for (group, flag) in self.groups.iter().zip(flagged.iter_mut()) {
            if group.species == Species::Hybrid {
                *flag |= parental_flag;
            }
        }
        flagged
    }

    /// Missing adults of flagged species become `I/I`.
    fn impute_missing(&self, record: &mut VariantRecord, flagged: &[bool]) -> Result<usize, VariantError> {
        let mut imputed = 0;
        for (group, _) in self.groups.iter().zip(flagged).filter(|(_, flag)| **flag) {
            imputed += rewrite(record, &group.adults, |gt| if gt.is_missing() { Genotype::IMPUTED } else { *gt })?;
        }
        Ok(imputed)
    }

    /// Scenarios 0 and 2: homozygous adults of flagged species become `a/I`.
    /// Scenario 3: every homozygous adult becomes `a/.`.
    ///
    /// Returns the number of calls rewritten with the imputed-md allele.
    fn rewrite_homozygotes(&self, record: &mut VariantRecord, flagged: &[bool]) -> Result<usize, VariantError> {
        let called_hom = |gt: &Genotype| gt.is_hom() && gt.left.is_called();
        match self.options.scenario {
            Scenario::S1 => Ok(0),
            Scenario::S0 | Scenario::S2 => {
                let mut imputed = 0;
                for (group, _) in self.groups.iter().zip(flagged).filter(|(_, flag)| **flag) {
                    imputed += rewrite(record, &group.adults, |gt| {
                        if called_hom(gt) { Genotype::new(gt.left, Allele::Imputed) } else { *gt }
                    })?;
                }
                Ok(imputed)
            },
            Scenario::S3 => {
                rewrite(record, &self.adults, |gt| if called_hom(gt) { Genotype::new(gt.left, Allele::Missing) } else { *gt })?;
                Ok(0)
            }
        }
    }

    fn gate(&self, record: &VariantRecord, depth: u32, missing_rates: &[f64], imputed: usize, indel: bool) -> Result<Option<Filter>, VariantError> {
        if (depth as usize) < self.options.min_dp {
            return Ok(Some(Filter::Depth))
        }

        for (group, md) in self.groups.iter().zip(missing_rates) {
            let ceiling = match group.species {
                Species::Sp1    => self.options.md_max_1,
                Species::Sp2    => self.options.md_max_2,
                Species::Hybrid => continue,
            };
            if *md > ceiling {
                return Ok(Some(Filter::MissingData))
            }
        }

        if distinct_adult_genotypes(record, &self.adults)? <= 1 {
            return Ok(Some(Filter::Monomorphic))
        }

        for group in &self.groups {
            let counts = group.allele_counts(record)?;
            if counts.len() > 2 {
                return Ok(Some(Filter::TooManyAlleles))
            }
            let total: usize = counts.values().sum();
            if total > 0 && counts.values().any(|n| (*n as f64 / total as f64) < self.options.maf) {
                return Ok(Some(Filter::MinorAlleleFrequency))
            }
        }

        if self.options.scenario == Scenario::S0 && imputed > 0 {
            return Ok(Some(Filter::Imputed))
        }

        if !indel && record.alts.len() > 1 {
            return Ok(Some(Filter::Multiallelic))
        }
        Ok(None)
    }
}

/// Stream `input` into `output`, filtering variants and rewriting adult genotypes.
///
/// `##contig` header lines of sequences without any surviving variant are removed.
pub fn run(input: &Path, output: &Path, io: &IoOptions, pedigree: &Pedigree, options: &AdultOptions) -> Result<Counters> {
    use AdultError::Process;
    let loc_msg = || format!("While running adult imputation on {}", input.display());
    info!("Adult imputation: {} -> {}", input.display(), output.display());

    let symbols = io.symbols()?;
    let mut reader = VcfReader::new(input, io.decompression_threads, symbols.clone()).with_loc(loc_msg)?;
    let layout = pedigree.bind(reader.header().samples()).with_loc(loc_msg)?;
    let imputer = AdultImputer::new(options.clone(), &layout);
    let mut writer = VcfWriter::new(output, symbols, io.threads).with_loc(loc_msg)?;

    let mut counters = Counters::default();
    let mut filters = FilterCounts::default();
    let progress = Progress::new("adult-impute");
    while let Some(mut record) = reader.next_record().with_loc(loc_msg)? {
        counters.scanned += 1;
        let outcome = imputer.process(&mut record)
            .map_err(|source| Process { chrom: record.chrom.clone(), pos: record.pos, source })
            .with_loc(loc_msg)?;
        match outcome {
            Outcome::Kept{imputed} => {
                writer.write_record(&record).with_loc(loc_msg)?;
                counters.kept += 1;
                if imputed > 0 {
                    counters.imputed += 1;
                }
            },
            Outcome::Filtered(filter) => {
                counters.filtered += 1;
                filters.add(filter);
            },
        }
        progress.tick(&counters);
    }
    writer.finish(reader.header()).with_loc(loc_msg)?;
    progress.finish(&counters);
    info!("Adult imputation done. {counters}");
    info!("Filtered variants: {filters}");
    Ok(counters)
}
