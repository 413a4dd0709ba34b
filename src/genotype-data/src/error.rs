use thiserror::Error;

#[derive(Error, Debug)]
pub enum GenotypeDataError {
    #[error("Invalid SNP at {chrom}:{pos}")]
    InvalidSnp{chrom: String, pos: u64, #[source] source: variant::VariantError},

    #[error("Failed to insert SNP {0} within the variant store")]
    InsertSnp(String, #[source] variant_store::StoreError),

    #[error("Failed to insert kinship row ({0}, {1}) within the variant store")]
    InsertKinship(usize, usize, #[source] variant_store::StoreError),

    #[error("Failed to index the variant store")]
    Index(#[source] variant_store::StoreError),

    #[error("Failed to build the LD thread pool")]
    ThreadPool(#[source] rayon::ThreadPoolBuildError),
}
