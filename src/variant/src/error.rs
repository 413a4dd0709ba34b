use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum VariantError {
    #[error("Invalid allele symbol '{0}'. Expected an allele index, the imputed-md symbol or the missing symbol")]
    InvalidAllele(String),

    #[error("Unparseable genotype '{0}'. Expected two alleles separated by '/' or '|'")]
    UnparseableGenotype(String),

    #[error("Genotype '{0}' cannot be encoded as pseudobinary: only biallelic calls are allowed")]
    NotBiallelic(String),

    #[error("Invalid pseudobinary code '{0}'. Expected one of 0, 1, 3, 7")]
    InvalidPseudobinary(u8),

    #[error("Not enough fields within VCF record: found {0}, expected at least {1}")]
    MissingFields(usize, usize),

    #[error("Failed to parse the position field '{0}'")]
    InvalidPosition(String),

    #[error("GT subfield is missing from the FORMAT field '{0}'")]
    MissingGT(String),

    #[error("Missing DP tag within the INFO field")]
    MissingDepth,

    #[error("Failed to parse the DP tag '{0}' of the INFO field")]
    InvalidDepth(String),

    #[error("Sample index {0} is out of bounds (record carries {1} samples)")]
    SampleOutOfBounds(usize, usize),

    #[error("Variant carries {0} alternative alleles while a biallelic variant is required")]
    Multiallelic(usize),

    #[error("Invalid nucleotide '{0}'")]
    InvalidNucleotide(String),

    #[error("Invalid reserved symbol '{0}': symbols must be non-empty and may not contain '/', '|', ':' or tabs")]
    InvalidSymbol(String),

    #[error("Imputed-md and missing symbols must differ (both were '{0}')")]
    SymbolCollision(String),
}
