use thiserror::Error;

#[derive(Error, Debug)]
pub enum PedigreeError {
    #[error("Failed to open or read the pedigree file")]
    ReadPedigree(#[source] std::io::Error),

    #[error("Invalid pedigree line '{0}'. Expected 'sample_id;species_id;mother_id'")]
    InvalidLine(String),

    #[error("Sample '{0}' is defined multiple times within the pedigree")]
    DuplicateSample(String),

    #[error("Sample '{sample}' belongs to species '{species}', which is not part of the expected species set {expected}")]
    UnexpectedSpecies{sample: String, species: String, expected: String},

    #[error("Species '{0}' was requested but no sample of the pedigree belongs to it")]
    MissingSpecies(String),

    #[error("Species identifiers must be distinct. Found '{0}' more than once")]
    DuplicateSpecies(String),

    #[error("Mother '{mother}' of sample '{sample}' is not defined within the pedigree")]
    UnknownMother{sample: String, mother: String},

    #[error("Mother '{mother}' of sample '{sample}' is itself a progeny")]
    MotherIsProgeny{sample: String, mother: String},

    #[error("Sample '{0}' cannot be its own mother")]
    SelfMother(String),

    #[error("VCF sample '{0}' is not defined within the pedigree")]
    UnknownSample(String),
}
