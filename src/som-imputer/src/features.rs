use ndarray::Array2;

use variant::iupac;
use variant_store::SnpRow;

use crate::SomError;

/// Width of the one-hot indicator of a single SNP.
pub const SYMBOL_WIDTH: usize = iupac::ALPHABET.len();

/// First nucleotide of an allele. Empty alleles are spelled `N`.
fn nucleotide(allele: &str) -> u8 {
    allele.bytes().next().unwrap_or(iupac::UNKNOWN)
}

/// IUPAC spelling of every sample call of `snp`.
pub fn spell(snp: &SnpRow) -> Result<Vec<u8>, SomError> {
    let (reference, alternate) = (nucleotide(&snp.reference), nucleotide(&snp.alt));
    snp.codes.iter()
        .map(|code| iupac::symbol(reference, alternate, *code))
        .collect::<Result<Vec<u8>, _>>()
        .map_err(|e| SomError::Spell(snp.id.clone(), e))
}

/// Per-sample haplotype strings over `context` (one symbol per SNP, in context order).
pub fn haplotypes(context: &[SnpRow], n_samples: usize) -> Result<Vec<String>, SomError> {
    let spelled = context.iter().map(spell).collect::<Result<Vec<_>, _>>()?;
    Ok((0..n_samples)
        .map(|sample| spelled.iter()
            .map(|symbols| symbols.get(sample).copied().unwrap_or(iupac::UNKNOWN) as char)
            .collect()
        )
        .collect())
}

/// One-hot encode haplotypes: one row per sample, `SYMBOL_WIDTH` columns per symbol. `N` is all-zero.
pub fn one_hot(haplotypes: &[String]) -> Array2<f64> {
    let width = haplotypes.first().map_or(0, String::len) * SYMBOL_WIDTH;
    let mut features = Array2::zeros((haplotypes.len(), width));
    for (row, haplotype) in haplotypes.iter().enumerate() {
        for (pos, symbol) in haplotype.bytes().enumerate() {
            if let Some(idx) = iupac::one_hot_index(symbol) {
                features[[row, pos * SYMBOL_WIDTH + idx]] = 1.0;
            }
        }
    }
    features
}

#[cfg(test)]
mod tests {
    use super::*;
    use variant::Pseudobinary::{HomRef, Het, HomAlt, Missing};

    fn snp(reference: &str, alt: &str, codes: Vec<variant::Pseudobinary>) -> SnpRow {
        SnpRow {
            id: "seq1:1".to_string(),
            chrom: "seq1".to_string(),
            pos: 1,
            reference: reference.to_string(),
            alt: alt.to_string(),
            codes,
            missing: Vec::new(),
        }
    }

    #[test]
    fn spell_calls() -> Result<(), SomError> {
        assert_eq!(spell(&snp("A", "G", vec![HomRef, Het, HomAlt, Missing]))?, b"ARGN");
        assert_eq!(spell(&snp("c", "t", vec![Het]))?, b"Y");
        assert!(spell(&snp("A", "X", vec![Het])).is_err());
        Ok(())
    }

    #[test]
    fn haplotypes_per_sample() -> Result<(), SomError> {
        let context = [
            snp("A", "G", vec![HomRef, Het, Missing]),
            snp("C", "T", vec![HomAlt, HomAlt, HomRef]),
        ];
        assert_eq!(haplotypes(&context, 3)?, ["AT", "RT", "NC"]);
        assert_eq!(haplotypes(&[], 2)?, ["", ""]);
        Ok(())
    }

    #[test]
    fn one_hot_encoding() {
        let features = one_hot(&["AN".to_string(), "MT".to_string()]);
        assert_eq!(features.dim(), (2, 2 * SYMBOL_WIDTH));
        let ones: Vec<(usize, usize)> = features.indexed_iter()
            .filter(|(_, v)| **v == 1.0)
            .map(|(idx, _)| idx)
            .collect();
        // A -> 0, M -> 9, T -> 3 (+10)
        assert_eq!(ones, [(0, 0), (1, 9), (1, 13)]);
    }
}
