use std::{fs, path::{Path, PathBuf}};

use log::trace;

use located_error::prelude::*;

mod error;
pub use error::ParseError;

const VCF_EXT: [&str; 3] = [".vcf.gz", ".vcf", ".gz"];

/// Attempt to create the parent directories of a path (if needed) and return an error if it failed.
pub fn create_parent_directory(path: &Path) -> Result<()> {
    use ParseError::CreateParentDirectory;
    let Some(parent_dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) else {
        return Ok(())
    };
    let loc_msg = || format!("While attempting to create output directory '{}'", parent_dir.display());
    fs::create_dir_all(parent_dir).map_err(CreateParentDirectory).with_loc(loc_msg)
}

/// Check if a given file already exists ; raise an error if such is the case, and the user did not explicitly
/// allow file overwriting.
pub fn can_write_file(overwrite: bool, path: &Path) -> Result<()> {
    if !overwrite && path.exists() {
        return Err(ParseError::OverwriteDisallowed{path: path.to_path_buf()})
            .loc("While ensuring that file permissions were appropriate")
    }
    Ok(())
}

/// File name of a VCF, stripped of its `.vcf` / `.vcf.gz` extension.
///
/// `data/run1.vcf.gz` -> `run1`
pub fn vcf_stem(path: &Path) -> Result<String> {
    let name = path.file_name()
        .and_then(|name| name.to_str())
        .loc(ParseError::InvalidFilename)?;
    let stem = VCF_EXT.iter()
        .find_map(|ext| name.strip_suffix(ext))
        .unwrap_or(name);
    Ok(stem.to_string())
}

/// Build the path of an output file: `{output_dir}/{stem}.{suffix}`.
pub fn output_file(output_dir: &Path, stem: &str, suffix: &str) -> PathBuf {
    let path = output_dir.join(format!("{stem}.{suffix}"));
    trace!("Output file: {}", path.display());
    path
}

/// Build the path of an output VCF: `{output_dir}/{stem}.{step}.vcf[.gz]`.
pub fn output_vcf(output_dir: &Path, stem: &str, step: &str, compress: bool) -> PathBuf {
    let ext = if compress { "vcf.gz" } else { "vcf" };
    output_file(output_dir, stem, &format!("{step}.{ext}"))
}
