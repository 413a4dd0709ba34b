use thiserror::Error;

#[derive(Error, Debug)]
pub enum VcfReaderError {
    #[error("Invalid or missing file extension. Accepted format are ['.vcf', '.vcf.gz']")]
    InvalidFileExt,

    #[error("Failed to open VCF file")]
    Open(#[source] std::io::Error),

    #[error("Failed to read the contents of the VCF")]
    FillBuffer(#[source] std::io::Error),

    #[error("Missing '#CHROM' header line within the VCF")]
    MissingHeader,

    #[error("Failed to parse record {chrom}:{pos} (line n°{line})")]
    ParseRecord{line: usize, chrom: String, pos: String, #[source] source: variant::VariantError},

    #[error("Record {chrom}:{pos} carries {found} samples while the header declares {expected}")]
    SampleCount{chrom: String, pos: u64, found: usize, expected: usize},
}
