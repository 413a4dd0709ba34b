use std::path::Path;

use log::{debug, info, warn};
use rayon::prelude::*;

use located_error::prelude::*;
use logger::{Counters, Progress};
use parser::{IoOptions, SomOptions};
use variant::VariantRecord;
use variant_store::{SharedStore, VariantStore};
use vcf_io::{VcfReader, VcfWriter};

mod error;
pub use error::SomError;

pub mod context;
pub mod features;
pub mod impute;
pub mod pca;
pub mod som;

pub use impute::SiteImputer;

/// Minimum r² of context SNPs: either user-defined, or the mean r² of the store plus one standard deviation.
pub fn r2_threshold<S: VariantStore>(options: &SomOptions, store: &SharedStore<S>) -> Option<f64> {
    options.min_r2.or_else(|| store.read(|s| s.r2_summary()).map(|(mean, sd)| mean + sd))
}

/// Stream `input` into `output`, imputing the missing calls of every SNP listed within `store`.
///
/// Records are processed in groups of `threads` (capped by the number of available cpus), and written
/// back in input order.
pub fn run<S: VariantStore + Send>(input: &Path, output: &Path, io: &IoOptions, options: &SomOptions, store: &SharedStore<S>) -> Result<Counters> {
    use SomError::{Samples, ThreadPool};
    let loc_msg = || format!("While running SOM imputation on {}", input.display());
    info!("SOM imputation: {} -> {} (method: {}, estimator: {})", input.display(), output.display(), options.method, options.estimator);

    let symbols = io.symbols()?;
    let mut reader = VcfReader::new(input, io.decompression_threads, symbols.clone()).with_loc(loc_msg)?;
    store.read(|s| s.check_samples(reader.header().samples()))
        .map_err(Samples)
        .with_loc(loc_msg)?;
    let mut writer = VcfWriter::new(output, symbols, io.threads).with_loc(loc_msg)?;

    let threshold = r2_threshold(options, store);
    match threshold {
        Some(r2) => debug!("Context SNPs require r² >= {r2:.4}"),
        None     => warn!("No valid LD row was found. Every missing call falls back to the most frequent genotype of its SNP"),
    }

    let workers = io.threads.min(num_cpus::get()).max(1);
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .build()
        .map_err(ThreadPool)
        .with_loc(loc_msg)?;

    let imputer = SiteImputer::new(options, store, threshold);
    let mut counters = Counters::default();
    let progress = Progress::new("som-impute");
    loop {
        let group = reader.by_ref().take(workers).collect::<Result<Vec<VariantRecord>>>().with_loc(loc_msg)?;
        if group.is_empty() {
            break
        }
        let results: Vec<Result<(VariantRecord, usize), SomError>> = pool.install(|| {
            group.into_par_iter()
                .map(|mut record| imputer.impute(&mut record).map(|filled| (record, filled)))
                .collect()
        });

        for result in results {
            let (record, filled) = result.with_loc(loc_msg)?;
            counters.scanned += 1;
            counters.kept += 1;
            if filled > 0 {
                counters.imputed += 1;
            }
            writer.write_record(&record).with_loc(loc_msg)?;
            progress.tick(&counters);
        }
    }
    writer.finish(reader.header()).with_loc(loc_msg)?;
    progress.finish(&counters);
    info!("SOM imputation done. {counters}");
    Ok(counters)
}
