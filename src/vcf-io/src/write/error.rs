use thiserror::Error;

#[derive(Error, Debug)]
pub enum VcfWriterError {
    #[error("Failed to create a temporary file to hold the body of the output VCF")]
    CreateBody(#[source] std::io::Error),

    #[error("Failed to write record into the output VCF body")]
    WriteRecord(#[source] std::io::Error),

    #[error("Failed to create output file")]
    CreateOutput(#[source] std::io::Error),

    #[error("Failed to assemble the output VCF")]
    Assemble(#[source] std::io::Error),

    #[error("Failed to flush BGZF compressed output")]
    Compress(#[source] gzp::GzpError),
}
