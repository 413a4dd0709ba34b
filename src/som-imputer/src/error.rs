use thiserror::Error;

#[derive(Error, Debug)]
pub enum SomError {
    #[error("Failed to spell SNP {0} with IUPAC symbols")]
    Spell(String, #[source] variant::VariantError),

    #[error("Failed to impute sample {sample} at {key}")]
    Rewrite{sample: usize, key: String, #[source] source: variant::VariantError},

    #[error("The samples of the input VCF do not match those of the variant store")]
    Samples(#[source] variant_store::StoreError),

    #[error("Failed to build the SOM imputation thread pool")]
    ThreadPool(#[source] rayon::ThreadPoolBuildError),
}
