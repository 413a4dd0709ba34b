use std::{
    path::Path,
    io::{BufRead, BufReader, Read},
    fs::File,
};

use located_error::prelude::*;

use crate::PedigreeError;

/// Value of the mother column marking a sample without any recorded mother.
pub const NO_MOTHER: &str = "NONE";

/// Raw pedigree definition entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PedigreeEntry {
    pub id     : String,
    pub species: String,
    pub mother : Option<String>,
}

/// Parse a pedigree definition file.
///
/// One record per line: `sample_id;species_id;mother_id`, where `mother_id` is `NONE` for adults.
/// Lines starting with `#` are comments. Blank lines are skipped.
pub fn parse_pedigree_file(path: &Path) -> Result<Vec<PedigreeEntry>> {
    use PedigreeError::ReadPedigree;
    let loc_msg = || format!("While attempting to parse {}", path.display());
    let file = File::open(path).map_err(ReadPedigree).with_loc(loc_msg)?;
    parse_pedigree(file).with_loc(loc_msg)
}

pub fn parse_pedigree<R: Read>(source: R) -> Result<Vec<PedigreeEntry>> {
    use PedigreeError::{ReadPedigree, InvalidLine};
    let reader = BufReader::new(source);
    let loc_msg = |ctxt: &str, i: usize| format!("{ctxt} while parsing line n°{} of the pedigree definition file", i + 1);

    let mut entries = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line.map_err(ReadPedigree).with_loc(|| loc_msg("Failed to convert line to string", i))?;
        let line = line.trim();
        match line.chars().next() { // Skip comments and empty lines.
            Some('#') | None => continue,
            Some(_)          => (),
        }

        let fields: Vec<&str> = line.split(';').map(str::trim).collect();
        let [id, species, mother] = fields[..] else {
            return Err(InvalidLine(line.to_string())).with_loc(|| loc_msg("Invalid number of fields", i))
        };
        if id.is_empty() || species.is_empty() || mother.is_empty() {
            return Err(InvalidLine(line.to_string())).with_loc(|| loc_msg("Empty field", i))
        }

        entries.push(PedigreeEntry {
            id     : id.to_string(),
            species: species.to_string(),
            mother : (mother != NO_MOTHER).then(|| mother.to_string()),
        });
    }
    Ok(entries)
}
