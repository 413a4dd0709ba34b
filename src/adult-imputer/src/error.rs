use thiserror::Error;

#[derive(Error, Debug)]
pub enum AdultError {
    #[error("Failed to process variant {chrom}:{pos}")]
    Process{chrom: String, pos: u64, #[source] source: variant::VariantError},
}
