use crate::{Pseudobinary, VariantError};

/// IUPAC symbols used to spell a diploid SNP call, in one-hot index order.
pub const ALPHABET: [u8; 10] = *b"ACGTRYSWKM";

/// Symbol for an unknown call. Encoded as an all-zero indicator.
pub const UNKNOWN: u8 = b'N';

/// IUPAC code of an unordered pair of nucleotides.
pub fn ambiguity_code(a: u8, b: u8) -> Result<u8, VariantError> {
    let (a, b) = (a.to_ascii_uppercase(), b.to_ascii_uppercase());
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    let code = match (lo, hi) {
        (x, y) if x == y && b"ACGT".contains(&x) => x,
        (b'A', b'G') => b'R',
        (b'C', b'T') => b'Y',
        (b'C', b'G') => b'S',
        (b'A', b'T') => b'W',
        (b'G', b'T') => b'K',
        (b'A', b'C') => b'M',
        _ => return Err(VariantError::InvalidNucleotide(format!("{}{}", a as char, b as char))),
    };
    Ok(code)
}

/// Spell a biallelic SNP call as a single IUPAC symbol.
pub fn symbol(reference: u8, alternate: u8, call: Pseudobinary) -> Result<u8, VariantError> {
    match call {
        Pseudobinary::HomRef  => ambiguity_code(reference, reference),
        Pseudobinary::Het     => ambiguity_code(reference, alternate),
        Pseudobinary::HomAlt  => ambiguity_code(alternate, alternate),
        Pseudobinary::Missing => Ok(UNKNOWN),
    }
}

/// Position of `symbol` within `ALPHABET`. `None` for `N`.
pub fn one_hot_index(symbol: u8) -> Option<usize> {
    ALPHABET.iter().position(|s| *s == symbol)
}
