//! Keyed store of SNP, linkage disequilibrium and kinship rows.

mod error;
pub use error::StoreError;

mod rows;
pub use rows::{SnpRow, LdRow, KinshipRow, LD_SENTINEL};

mod memory;
pub use memory::MemoryStore;

mod shared;
pub use shared::SharedStore;

pub mod tsv;

/// Operations required from a variant store, on its three collections (`snps`, `linkage_disequilibrium`,
/// `kinship`) and its sample metadata.
pub trait VariantStore {
    /// Drop every collection and start anew.
    fn reset(&mut self);

    /// (Re)build the indexes of every collection. Calling this multiple times is harmless.
    fn index(&mut self) -> Result<(), StoreError>;

    // ---- snps
    fn insert_snp(&mut self, row: SnpRow) -> Result<(), StoreError>;
    fn snp(&self, id: &str) -> Option<&SnpRow>;
    fn snp_ids(&self) -> Vec<String>;
    fn snp_ids_with_missing(&self) -> Vec<String>;

    // ---- linkage_disequilibrium
    fn insert_ld(&mut self, row: LdRow);
    fn ld_rows(&self, snp1: &str) -> Vec<&LdRow>;

    /// Global mean and standard deviation of r², sentinel values excluded. `None` if no valid row exists.
    fn r2_summary(&self) -> Option<(f64, f64)>;

    // ---- kinship
    fn insert_kinship(&mut self, row: KinshipRow) -> Result<(), StoreError>;

    /// Unordered lookup: `kinship(i, j) == kinship(j, i)`
    fn kinship(&self, i: usize, j: usize) -> Option<&KinshipRow>;
    fn kinship_len(&self) -> usize;

    // ---- samples
    fn set_samples(&mut self, samples: Vec<String>);
    fn samples(&self) -> &[String];

    /// Ensure that the stored samples (if any) match `vcf_samples`.
    fn check_samples(&self, vcf_samples: &[String]) -> Result<(), StoreError> {
        let stored = self.samples();
        if stored.is_empty() || stored == vcf_samples {
            return Ok(())
        }
        Err(StoreError::SampleMismatch { expected: stored.len(), found: vcf_samples.len() })
    }
}
