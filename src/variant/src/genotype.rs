use std::{fmt::{self, Display, Formatter}, hash::{Hash, Hasher}};

use crate::{Allele, Symbols, VariantError};

pub const UNPHASED_SEP: char = '/';
pub const PHASED_SEP  : char = '|';

/// Diploid genotype call.
///
/// Phasing is ignored: `/` and `|` are both accepted, and the separator is only kept
/// to render the call back the way it was read. Equality (and hashing) are unordered,
/// i.e. `0/1 == 1|0`.
#[derive(Debug, Clone, Copy, Eq)]
pub struct Genotype {
    pub left : Allele,
    pub right: Allele,
    sep      : char,
}

impl Genotype {
    pub const MISSING: Genotype = Genotype::new(Allele::Missing, Allele::Missing);
    pub const IMPUTED: Genotype = Genotype::new(Allele::Imputed, Allele::Imputed);

    pub const fn new(left: Allele, right: Allele) -> Self {
        Self { left, right, sep: UNPHASED_SEP }
    }

    /// Same alleles, rendered with the separator of `other`.
    pub fn with_sep_of(mut self, other: &Genotype) -> Self {
        self.sep = other.sep;
        self
    }

    /// Parse a raw `GT` subfield, e.g. `0/1`, `1|0`, `./.`, `99/99`.
    ///
    /// A lone missing symbol (`.`) is understood as `./.`.
    pub fn parse(raw: &str, symbols: &Symbols) -> Result<Self, VariantError> {
        use VariantError::UnparseableGenotype;
        if raw == symbols.missing() {
            return Ok(Self::MISSING)
        }
        let sep = if raw.contains(UNPHASED_SEP) {
            UNPHASED_SEP
        } else if raw.contains(PHASED_SEP) {
            PHASED_SEP
        } else {
            return Err(UnparseableGenotype(raw.to_string()))
        };

        let mut sides = raw.split(sep);
        let (Some(left), Some(right), None) = (sides.next(), sides.next(), sides.next()) else {
            return Err(UnparseableGenotype(raw.to_string()))
        };
        Ok(Self {
            left : Allele::parse(left, symbols)?,
            right: Allele::parse(right, symbols)?,
            sep
        })
    }

    pub fn alleles(&self) -> [Allele; 2] {
        [self.left, self.right]
    }

    pub fn contains(&self, allele: Allele) -> bool {
        self.left == allele || self.right == allele
    }

    /// Both sides carry the same allele.
    pub fn is_hom(&self) -> bool {
        self.left == self.right
    }

    /// Both sides are missing (`./.`).
    pub fn is_missing(&self) -> bool {
        self.left.is_missing() && self.right.is_missing()
    }

    /// Exactly one side is missing (e.g. `0/.`).
    pub fn is_half_missing(&self) -> bool {
        self.left.is_missing() != self.right.is_missing()
    }

    /// At least one side is missing.
    pub fn has_missing(&self) -> bool {
        self.contains(Allele::Missing)
    }

    /// Both sides are genuine allele calls.
    pub fn is_called(&self) -> bool {
        self.left.is_called() && self.right.is_called()
    }

    /// Apply `f` on both sides.
    pub fn map<F: Fn(Allele) -> Allele>(&self, f: F) -> Self {
        Self { left: f(self.left), right: f(self.right), sep: self.sep }
    }

    /// Sorted pair of alleles. Used for unordered comparisons.
    fn key(&self) -> (Allele, Allele) {
        if self.left <= self.right { (self.left, self.right) } else { (self.right, self.left) }
    }

    pub fn render<'a>(&self, symbols: &'a Symbols) -> GenotypeDisplay<'a> {
        GenotypeDisplay { genotype: *self, symbols }
    }
}

impl PartialEq for Genotype {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Hash for Genotype {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

pub struct GenotypeDisplay<'a> {
    genotype: Genotype,
    symbols : &'a Symbols,
}

impl Display for GenotypeDisplay<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}",
            self.genotype.left.render(self.symbols),
            self.genotype.sep,
            self.genotype.right.render(self.symbols)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn gt(raw: &str) -> Genotype {
        Genotype::parse(raw, &Symbols::default()).expect("valid genotype")
    }

    #[test]
    fn parse_phased_and_unphased() {
        assert_eq!(gt("0/1"), Genotype::new(Allele::REF, Allele::ALT));
        assert_eq!(gt("1|0"), Genotype::new(Allele::ALT, Allele::REF));
        assert_eq!(gt("./."), Genotype::MISSING);
        assert_eq!(gt("."),   Genotype::MISSING);
        assert_eq!(gt("99/99"), Genotype::IMPUTED);
        assert_eq!(gt("0/."), Genotype::new(Allele::REF, Allele::Missing));
    }

    #[test]
    fn parse_invalid() {
        let symbols = Symbols::default();
        for raw in ["0", "0-1", "0/1/1", "A/T", ""] {
            assert!(Genotype::parse(raw, &symbols).is_err(), "{raw}");
        }
    }

    #[test]
    fn unordered_equality_and_hash() {
        assert_eq!(gt("0/1"), gt("1/0"));
        assert_ne!(gt("0/0"), gt("0/1"));
        let set: HashSet<Genotype> = ["0/1", "1|0", "1/0", "1/1"].into_iter().map(gt).collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn render_preserves_side_order_and_separator() {
        let symbols = Symbols::default();
        for raw in ["1|0", "0/99", "./.", "2/1"] {
            assert_eq!(gt(raw).render(&symbols).to_string(), raw);
        }
        let rewritten = Genotype::IMPUTED.with_sep_of(&gt("0|1"));
        assert_eq!(rewritten.render(&symbols).to_string(), "99|99");
    }

    #[test]
    fn missing_states() {
        assert!(gt("./.").is_missing());
        assert!(gt("./1").is_half_missing());
        assert!(gt("./1").has_missing());
        assert!(!gt("99/99").has_missing());
        assert!(!gt("0/99").is_called());
        assert!(gt("0/2").is_called());
    }
}
