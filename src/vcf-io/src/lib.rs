pub mod header;
pub use header::VcfHeader;

pub mod read;
pub use read::{VcfReader, VcfReaderError};

pub mod write;
pub use write::{VcfWriter, VcfWriterError};

pub mod parse;
