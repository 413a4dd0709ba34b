use itertools::Itertools;
use log::trace;

use located_error::prelude::*;
use logger::{Counters, Progress};
use variant::{Pseudobinary, VariantRecord};
use variant_store::{SharedStore, SnpRow, VariantStore};
use vcf_io::VcfReader;

use crate::{GenotypeDataError, kinship::KinshipAccumulator};

/// Pseudobinary codes of every sample, and the columns of samples carrying missing data.
fn encode(record: &VariantRecord) -> Result<(Vec<Pseudobinary>, Vec<usize>), GenotypeDataError> {
    use GenotypeDataError::InvalidSnp;
    let invalid = |source| InvalidSnp { chrom: record.chrom.clone(), pos: record.pos, source };
    record.require_biallelic().map_err(invalid)?;
    let codes = record.genotypes()
        .map(Pseudobinary::encode)
        .collect::<Result<Vec<_>, _>>()
        .map_err(invalid)?;
    let missing = codes.iter().positions(|code| code.is_missing()).collect();
    Ok((codes, missing))
}

/// Single pass over the VCF: insert every polymorphic SNP within the store, and accumulate kinship sums.
///
/// INDELs and sites without any alternative allele are skipped.
///
/// # Errors
/// - if a SNP carries more than one alternative allele.
/// - if a SNP id is encountered twice.
pub fn ingest<S: VariantStore>(reader: &mut VcfReader, store: &SharedStore<S>) -> Result<(Counters, KinshipAccumulator)> {
    use GenotypeDataError::InsertSnp;
    let mut kinship = KinshipAccumulator::new(reader.header().samples().len());
    let mut counters = Counters::default();
    let progress = Progress::new("genotype-data");

    while let Some(record) = reader.next_record().loc("While ingesting SNPs")? {
        counters.scanned += 1;
        progress.tick(&counters);
        if record.is_indel() || record.alts.is_empty() {
            trace!("{}: not a SNP. Skipping", record.key());
            counters.filtered += 1;
            continue
        }

        let (codes, missing) = encode(&record).loc("While ingesting SNPs")?;
        kinship.add_locus(&codes);

        if codes.iter().all_equal() {
            trace!("{}: monomorphic. Skipping", record.key());
            counters.filtered += 1;
            continue
        }

        let id = record.key();
        let row = SnpRow {
            id       : id.clone(),
            chrom    : record.chrom,
            pos      : record.pos,
            reference: record.reference,
            alt      : record.alts.into_iter().next().unwrap_or_default(),
            codes,
            missing,
        };
        store.write(|s| s.insert_snp(row))
            .map_err(|e| InsertSnp(id, e))
            .loc("While ingesting SNPs")?;
        counters.kept += 1;
    }
    progress.finish(&counters);
    Ok((counters, kinship))
}
