use std::path::{Path, PathBuf};

use log::info;

use located_error::prelude::*;
use parser::{Cli, Commands::*, IoOptions, PedigreeOptions, ProgenyOptions, SomOptions};
use pedigree::{Pedigree, SpeciesSet};
use variant_store::{tsv, MemoryStore, SharedStore};
use vcf_io::parse::{can_write_file, create_parent_directory, output_vcf, vcf_stem};

/// Build the sample registry out of the user-provided pedigree definition.
fn load_pedigree(options: &PedigreeOptions) -> Result<Pedigree> {
    let species = SpeciesSet::new(&options.sp1, &options.sp2, options.hybrid.as_deref())
        .loc("While parsing species identifiers")?;
    Pedigree::from_file(&options.pedigree, species)
}

/// `{output-dir}/{stem}.{step}.vcf[.gz]`, provided it may be written.
fn step_output(io: &IoOptions, stem: &str, step: &str) -> Result<PathBuf> {
    let path = output_vcf(&io.output_dir, stem, step, io.compress);
    can_write_file(io.overwrite, &path)?;
    Ok(path)
}

/// `{output-dir}/{stem}`, provided that none of the `{output-dir}/{stem}.*.tsv` tables may be overwritten.
fn tables_prefix(io: &IoOptions, stem: &str) -> Result<PathBuf> {
    let prefix = io.output_dir.join(stem);
    for path in tsv::table_paths(&prefix) {
        can_write_file(io.overwrite, &path)?;
    }
    Ok(prefix)
}

/// Compute the genotype data of `input`, and persist the store as `{output-dir}/{stem}.*.tsv`
fn compute_tables(input: &Path, io: &IoOptions, stem: &str) -> Result<SharedStore<MemoryStore>> {
    let loc_msg = || format!("While computing genotype data tables of {}", input.display());
    let prefix = tables_prefix(io, stem).with_loc(loc_msg)?;
    create_parent_directory(&tsv::table_paths(&prefix)[0]).with_loc(loc_msg)?;

    let store = SharedStore::new(MemoryStore::new());
    let counters = genotype_data::run(input, io, &store).with_loc(loc_msg)?;
    info!("Genotype data: {counters}");
    store.read(|s| tsv::save(s, &prefix)).with_loc(loc_msg)?;
    Ok(store)
}

fn som_impute(input: &Path, io: &IoOptions, som: &SomOptions, store: &SharedStore<MemoryStore>, stem: &str) -> Result<PathBuf> {
    let output = step_output(io, stem, "som")?;
    som_imputer::run(input, &output, io, som, store)?;
    Ok(output)
}

/// Run the requested sub-command.
pub fn run(cli: Cli) -> Result<()> {
    match cli.commands {
        AdultImpute { io, pedigree, adult } => {
            let pedigree = load_pedigree(&pedigree)?;
            let output = step_output(&io, &vcf_stem(&io.vcf)?, "adult")?;
            adult_imputer::run(&io.vcf, &output, &io, &pedigree, &adult)?;
        },

        ProgenyImpute { io, pedigree, progeny } => {
            let pedigree = load_pedigree(&pedigree)?;
            let output = step_output(&io, &vcf_stem(&io.vcf)?, "progeny")?;
            progeny_imputer::run(&io.vcf, &output, &io, &pedigree, &progeny)?;
        },

        GenotypeData { io } => {
            compute_tables(&io.vcf, &io, &vcf_stem(&io.vcf)?)?;
        },

        SomImpute { io, som } => {
            let stem = vcf_stem(&io.vcf)?;
            let prefix = som.tables.clone().unwrap_or_else(|| io.output_dir.join(&stem));
            let store = SharedStore::new(tsv::load(&prefix)?);
            som_impute(&io.vcf, &io, &som, &store, &stem)?;
        },

        Pipeline { io, pedigree, adult, som } => {
            let stem = vcf_stem(&io.vcf)?;
            let pedigree = load_pedigree(&pedigree)?;

            // ---- Every output must be writable before the first step starts.
            for step in ["adult", "som", "progeny"] {
                step_output(&io, &stem, step)?;
            }
            tables_prefix(&io, &stem)?;

            let adult_vcf = step_output(&io, &stem, "adult")?;
            adult_imputer::run(&io.vcf, &adult_vcf, &io, &pedigree, &adult)?;

            let store = compute_tables(&adult_vcf, &io, &stem)?;
            let som_vcf = som_impute(&adult_vcf, &io, &som, &store, &stem)?;

            let progeny_vcf = step_output(&io, &stem, "progeny")?;
            let progeny = ProgenyOptions { scenario: adult.scenario };
            progeny_imputer::run(&som_vcf, &progeny_vcf, &io, &pedigree, &progeny)?;
            info!("Pipeline done. Final output: {}", progeny_vcf.display());
        },

        FromYaml { yaml } => {
            let cli = Cli::deserialize(&yaml)?;
            self::run(cli)?;
        },
    };
    Ok(())
}
