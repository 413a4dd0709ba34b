//! SNP table, pairwise linkage disequilibrium and pairwise kinship of a VCF.

use std::path::Path;

use log::info;

use located_error::prelude::*;
use logger::Counters;
use parser::IoOptions;
use variant_store::{SharedStore, VariantStore};
use vcf_io::VcfReader;

mod error;
pub use error::GenotypeDataError;

pub mod kinship;
pub mod ld;
mod ingest;

/// Populate `store` with the `snps`, `linkage_disequilibrium` and `kinship` tables of `input`.
///
/// The store is reset beforehand. `kept` counts inserted SNPs, `filtered` every other record.
pub fn run<S: VariantStore + Send>(input: &Path, io: &IoOptions, store: &SharedStore<S>) -> Result<Counters> {
    use GenotypeDataError::{InsertKinship, Index};
    let loc_msg = || format!("While computing genotype data of {}", input.display());
    info!("Genotype data: {}", input.display());

    let mut reader = VcfReader::new(input, io.decompression_threads, io.symbols()?).with_loc(loc_msg)?;
    let samples = reader.header().samples().to_vec();
    store.write(|s| {
        s.reset();
        s.set_samples(samples.clone());
    });

    // ---- SNP table and kinship sums.
    let (counters, kinship) = ingest::ingest(&mut reader, store).with_loc(loc_msg)?;
    info!("{} SNPs inserted. {} loci contributed to kinship estimates", counters.kept, kinship.loci());

    // ---- Kinship.
    let rows = kinship.finalize(&samples);
    let n_pairs = rows.len();
    store.write(|s| {
        for row in rows {
            let (i, j) = (row.i, row.j);
            s.insert_kinship(row).map_err(|e| InsertKinship(i, j, e))?;
        }
        s.index().map_err(Index)
    }).with_loc(loc_msg)?;
    info!("{n_pairs} kinship rows inserted");

    // ---- Linkage disequilibrium.
    let n_ld = ld::compute_ld(store, io.threads).with_loc(loc_msg)?;
    store.write(|s| s.index()).map_err(Index).with_loc(loc_msg)?;
    match store.read(|s| s.r2_summary()) {
        Some((mean, sd)) => info!("{n_ld} LD rows inserted (r² mean: {mean:.4}, sd: {sd:.4})"),
        None             => info!("{n_ld} LD rows inserted"),
    }
    Ok(counters)
}
