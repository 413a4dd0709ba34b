use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProgenyError {
    #[error("Mother genotype {genotype} is not handled under scenario {scenario}")]
    UnhandledMother{genotype: String, scenario: String},

    #[error("Progeny genotype {progeny} is not handled for a {mother} mother under scenario {scenario}")]
    UnhandledProgeny{progeny: String, mother: String, scenario: String},

    #[error("Mother '{mother}' of progeny '{sample}' is not found within the VCF")]
    MotherNotInVcf{sample: String, mother: String},

    #[error("Failed to rewrite progeny '{sample}' at {chrom}:{pos}")]
    Rewrite{sample: String, chrom: String, pos: u64},
}
