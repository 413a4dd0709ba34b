use std::path::Path;

use log::{debug, info};

use located_error::prelude::*;
use logger::{Counters, Progress};
use parser::{IoOptions, ProgenyOptions, Scenario};
use pedigree::{Pedigree, SampleLayout};
use variant::VariantRecord;
use vcf_io::{VcfReader, VcfWriter};

mod error;
pub use error::ProgenyError;

pub mod decoder;

/// A progeny, and the VCF column of its mother.
#[derive(Debug, Clone)]
struct Family {
    id     : String,
    progeny: usize,
    mother : usize,
}

/// Rewrites progeny genotypes according to their mother's genotype at the same variant.
#[derive(Debug)]
pub struct ProgenyImputer {
    scenario: Scenario,
    families: Vec<Family>,
}

impl ProgenyImputer {
    /// # Errors
    /// - `MotherNotInVcf` if the mother of any VCF progeny is not a column of the VCF.
    pub fn new(scenario: Scenario, layout: &SampleLayout) -> Result<Self> {
        use ProgenyError::MotherNotInVcf;
        let families = layout.progenies()
            .map(|(column, bound)| match bound.mother_column {
                Some(mother) => Ok(Family { id: bound.sample.id.clone(), progeny: column, mother }),
                None => Err(MotherNotInVcf {
                    sample: bound.sample.id.clone(),
                    mother: bound.sample.mother.clone().unwrap_or_default()
                }),
            })
            .collect::<Result<Vec<_>, _>>()
            .loc("While pairing progenies with their mother")?;
        debug!("{} progenies to process under scenario {scenario}", families.len());
        Ok(Self { scenario, families })
    }

    /// Rewrite every progeny of `record`. Returns the number of rewritten calls.
    pub fn impute(&self, record: &mut VariantRecord) -> Result<usize> {
        use ProgenyError::Rewrite;
        let (chrom, pos) = (record.chrom.clone(), record.pos);
        let mut rewritten = 0;
        for family in &self.families {
            let loc_msg = || Rewrite { sample: family.id.clone(), chrom: chrom.clone(), pos };
            let mother  = *record.genotype(family.mother).with_loc(loc_msg)?;
            let progeny = *record.genotype(family.progeny).with_loc(loc_msg)?;
            let decoded = decoder::decode(self.scenario, &mother, &progeny).with_loc(loc_msg)?;
            if record.set_genotype(family.progeny, decoded).with_loc(loc_msg)? {
                rewritten += 1;
            }
        }
        Ok(rewritten)
    }
}

/// Stream `input` into `output`, rewriting progeny genotypes.
///
/// Every record is kept. A record counts as imputed when at least one progeny call was rewritten.
pub fn run(input: &Path, output: &Path, io: &IoOptions, pedigree: &Pedigree, options: &ProgenyOptions) -> Result<Counters> {
    let loc_msg = || format!("While running progeny imputation on {}", input.display());
    info!("Progeny imputation: {} -> {}", input.display(), output.display());

    let symbols = io.symbols()?;
    let mut reader = VcfReader::new(input, io.decompression_threads, symbols.clone()).with_loc(loc_msg)?;
    let layout = pedigree.bind(reader.header().samples()).with_loc(loc_msg)?;
    let imputer = ProgenyImputer::new(options.scenario, &layout).with_loc(loc_msg)?;
    let mut writer = VcfWriter::new(output, symbols, io.threads).with_loc(loc_msg)?;

    let mut counters = Counters::default();
    let progress = Progress::new("progeny-impute");
    while let Some(mut record) = reader.next_record().with_loc(loc_msg)? {
        counters.scanned += 1;
        if imputer.impute(&mut record).with_loc(loc_msg)? > 0 {
            counters.imputed += 1;
        }
        writer.write_record(&record).with_loc(loc_msg)?;
        counters.kept += 1;
        progress.tick(&counters);
    }
    writer.finish(reader.header()).with_loc(loc_msg)?;
    progress.finish(&counters);
    info!("Progeny imputation done. {counters}");
    Ok(counters)
}
