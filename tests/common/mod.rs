#![allow(dead_code)]
use std::path::Path;

use clap::Parser;

mod fixture;
pub use fixture::Fixture;

/// Parse a `hybrid-impute` command line.
pub fn cli(args: &[&str]) -> parser::Cli {
    let argv = std::iter::once("hybrid-impute").chain(args.iter().copied());
    parser::Cli::try_parse_from(argv).unwrap_or_else(|e| panic!("Invalid command line {args:?}: {e}"))
}

/// Every header line of a VCF, starting with `##`
pub fn meta_lines(path: &Path) -> Vec<String> {
    read_lines(path).into_iter().filter(|line| line.starts_with("##")).collect()
}

/// Every record of a VCF.
pub fn records(path: &Path) -> Vec<String> {
    read_lines(path).into_iter().filter(|line| !line.starts_with('#')).collect()
}

fn read_lines(path: &Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .unwrap_or_else(|e| panic!("Failed to open {}: {e}", path.display()))
        .lines()
        .map(str::to_string)
        .collect()
}
