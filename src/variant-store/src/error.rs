use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("SNP '{0}' is already present within the store")]
    DuplicateSnp(String),

    #[error("Kinship pair ({0}, {1}) is already present within the store")]
    DuplicateKinship(usize, usize),

    #[error("Invalid kinship pair ({0}, {1}): a sample cannot be paired with itself")]
    SelfPair(usize, usize),

    #[error("Failed to create table '{}'", path.display())]
    CreateTable{path: PathBuf, #[source] source: csv::Error},

    #[error("Failed to write a row into table '{}'", path.display())]
    WriteRow{path: PathBuf, #[source] source: csv::Error},

    #[error("Failed to flush table '{}'", path.display())]
    FlushTable{path: PathBuf, #[source] source: std::io::Error},

    #[error("Failed to open table '{}'", path.display())]
    OpenTable{path: PathBuf, #[source] source: csv::Error},

    #[error("Failed to deserialize row n°{line} of table '{}'", path.display())]
    ReadRow{path: PathBuf, line: usize, #[source] source: csv::Error},

    #[error("Stored samples do not match the VCF samples. Expected {expected} samples, found {found}")]
    SampleMismatch{expected: usize, found: usize},
}
