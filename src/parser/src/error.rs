use thiserror::Error;
use crate::FileEntity;

#[derive(Error, Debug)]
pub enum ParserError{
    #[error("{0} {1} does not exist")]
    MissingFileEntity(FileEntity, String),

    #[error("{1} is not a {0}")]
    InvalidFileEntity(FileEntity, String),

    #[error("Failed to create output directory {0}")]
    CreateOutputDir(String, #[source] std::io::Error),

    #[error("The provided value must lie between {0} and {1}")]
    ParseRatio(f64, f64),

    #[error("Failed to parse '{0}' as a number")]
    ParseNumber(String),

    #[error("The provided value must be greater than or equal to {min}. Got {found}")]
    BelowMinimum{min: usize, found: usize},

    #[error("The provided value must be strictly positive. Got {0}")]
    NotStrictlyPositive(f64),

    #[error("Invalid scenario '{0}'. Expected one of 0, 1, 2, 3")]
    InvalidScenario(String),

    #[error("Failed to serialize command line arguments")]
    Serialize(#[source] serde_yaml::Error),

    #[error("Unable to write command line arguments into {0}")]
    WriteYaml(String, #[source] std::io::Error),

    #[error("Unable to open {0}")]
    OpenYaml(String, #[source] std::io::Error),

    #[error("Failed to deserialize command line arguments from {0}")]
    Deserialize(String, #[source] serde_yaml::Error),
}
