use std::path::{Path, PathBuf};

use log::{debug, info};
use serde::{Serialize, de::DeserializeOwned};

use located_error::prelude::*;

use crate::{MemoryStore, StoreError};

pub const SNPS_SUFFIX   : &str = "snps.tsv";
pub const LD_SUFFIX     : &str = "ld.tsv";
pub const KINSHIP_SUFFIX: &str = "kinship.tsv";

/// Paths of the three tables sharing `prefix`: `{prefix}.snps.tsv`, `{prefix}.ld.tsv`, `{prefix}.kinship.tsv`
pub fn table_paths(prefix: &Path) -> [PathBuf; 3] {
    let with_suffix = |suffix: &str| {
        let mut path = prefix.as_os_str().to_owned();
        path.push(".");
        path.push(suffix);
        PathBuf::from(path)
    };
    [with_suffix(SNPS_SUFFIX), with_suffix(LD_SUFFIX), with_suffix(KINSHIP_SUFFIX)]
}

fn write_table<T: Serialize>(path: &Path, rows: &[T]) -> Result<(), StoreError> {
    use StoreError::{CreateTable, WriteRow, FlushTable};
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b'\t')
        .from_path(path)
        .map_err(|source| CreateTable { path: path.to_path_buf(), source })?;
    for row in rows {
        writer.serialize(row).map_err(|source| WriteRow { path: path.to_path_buf(), source })?;
    }
    writer.flush().map_err(|source| FlushTable { path: path.to_path_buf(), source })?;
    debug!("Wrote {} rows into {}", rows.len(), path.display());
    Ok(())
}

fn read_table<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, StoreError> {
    use StoreError::{OpenTable, ReadRow};
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .from_path(path)
        .map_err(|source| OpenTable { path: path.to_path_buf(), source })?;
    reader.deserialize()
        .enumerate()
        .map(|(i, row)| row.map_err(|source| ReadRow { path: path.to_path_buf(), line: i + 2, source }))
        .collect()
}

/// Persist every table of `store` as headed, tab-separated files.
pub fn save(store: &MemoryStore, prefix: &Path) -> Result<()> {
    let [snps, ld, kinship] = table_paths(prefix);
    let loc_msg = || format!("While saving the variant store under prefix '{}'", prefix.display());
    write_table(&snps, store.snps()).with_loc(loc_msg)?;
    write_table(&ld, store.ld_table()).with_loc(loc_msg)?;
    write_table(&kinship, store.kinship_table()).with_loc(loc_msg)?;
    info!("Variant store saved under '{}.*.tsv'", prefix.display());
    Ok(())
}

/// Reload a previously saved store, and rebuild its indexes.
pub fn load(prefix: &Path) -> Result<MemoryStore> {
    let [snps, ld, kinship] = table_paths(prefix);
    let loc_msg = || format!("While loading the variant store from prefix '{}'", prefix.display());
    let store = MemoryStore::from_rows(
        read_table(&snps).with_loc(loc_msg)?,
        read_table(&ld).with_loc(loc_msg)?,
        read_table(&kinship).with_loc(loc_msg)?,
    ).with_loc(loc_msg)?;
    info!("Loaded {} SNPs, {} LD rows and {} kinship rows from '{}.*.tsv'",
        store.snps().len(), store.ld_table().len(), store.kinship_table().len(), prefix.display()
    );
    Ok(store)
}
