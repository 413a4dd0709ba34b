//! Minimal VCF record model: alleles, genotypes, pseudobinary codes and records.

mod error;
pub use error::VariantError;

mod allele;
pub use allele::{Allele, Symbols, DEFAULT_IMPUTED_MD, DEFAULT_MISSING};

mod genotype;
pub use genotype::Genotype;

mod pseudobinary;
pub use pseudobinary::Pseudobinary;

pub mod iupac;

pub mod record;
pub use record::{VariantRecord, VariantType};
