use std::fmt::{self, Display, Formatter};

use serde::{Serialize, Deserialize};

use crate::VariantError;

pub const DEFAULT_IMPUTED_MD: &str = "99";
pub const DEFAULT_MISSING   : &str = ".";

/// Reserved allele symbols, as configured on the command line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Symbols {
    imputed: String,
    missing: String,
}

impl Default for Symbols {
    fn default() -> Self {
        Self { imputed: DEFAULT_IMPUTED_MD.to_string(), missing: DEFAULT_MISSING.to_string() }
    }
}

impl Symbols {
    pub fn new(imputed: &str, missing: &str) -> Result<Self, VariantError> {
        use VariantError::{InvalidSymbol, SymbolCollision};
        for symbol in [imputed, missing] {
            if symbol.is_empty() || symbol.contains(['/', '|', ':', '\t']) {
                return Err(InvalidSymbol(symbol.to_string()))
            }
        }
        if imputed == missing {
            return Err(SymbolCollision(imputed.to_string()))
        }
        Ok(Self { imputed: imputed.to_string(), missing: missing.to_string() })
    }

    pub fn imputed(&self) -> &str {
        &self.imputed
    }

    pub fn missing(&self) -> &str {
        &self.missing
    }
}

/// A single genotype side.
///
/// Variant ordering is meaningful: called alleles sort before `Imputed`, which sorts before `Missing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Allele {
    Called(u8),
    Imputed,
    Missing,
}

impl Allele {
    pub const REF: Allele = Allele::Called(0);
    pub const ALT: Allele = Allele::Called(1);

    /// Parse a raw GT side. Reserved symbols take precedence over allele indices.
    pub fn parse(raw: &str, symbols: &Symbols) -> Result<Self, VariantError> {
        if raw == symbols.missing {
            Ok(Self::Missing)
        } else if raw == symbols.imputed {
            Ok(Self::Imputed)
        } else {
            raw.parse::<u8>()
                .map(Self::Called)
                .map_err(|_| VariantError::InvalidAllele(raw.to_string()))
        }
    }

    pub fn is_called(&self) -> bool {
        matches!(self, Self::Called(_))
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }

    pub fn is_imputed(&self) -> bool {
        matches!(self, Self::Imputed)
    }

    /// Allele index, if this is a genuine call.
    pub fn index(&self) -> Option<u8> {
        match self {
            Self::Called(idx) => Some(*idx),
            _                 => None,
        }
    }

    pub fn render<'a>(&self, symbols: &'a Symbols) -> AlleleDisplay<'a> {
        AlleleDisplay { allele: *self, symbols }
    }
}

/// Displayable allele, bound to a set of reserved symbols.
pub struct AlleleDisplay<'a> {
    allele : Allele,
    symbols: &'a Symbols,
}

impl Display for AlleleDisplay<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.allele {
            Allele::Called(idx) => write!(f, "{idx}"),
            Allele::Imputed     => write!(f, "{}", self.symbols.imputed),
            Allele::Missing     => write!(f, "{}", self.symbols.missing),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_reserved_symbols() {
        let symbols = Symbols::default();
        assert_eq!(Allele::parse(".", &symbols),  Ok(Allele::Missing));
        assert_eq!(Allele::parse("99", &symbols), Ok(Allele::Imputed));
        assert_eq!(Allele::parse("0", &symbols),  Ok(Allele::REF));
        assert_eq!(Allele::parse("2", &symbols),  Ok(Allele::Called(2)));
        assert!(Allele::parse("A", &symbols).is_err());
    }

    #[test]
    fn custom_symbols() -> Result<(), VariantError> {
        let symbols = Symbols::new("-1", "N")?;
        assert_eq!(Allele::parse("N", &symbols)?,  Allele::Missing);
        assert_eq!(Allele::parse("-1", &symbols)?, Allele::Imputed);
        assert_eq!(Allele::parse("99", &symbols)?, Allele::Called(99));
        assert_eq!(Allele::Imputed.render(&symbols).to_string(), "-1");
        Ok(())
    }

    #[test]
    fn invalid_symbols() {
        assert_eq!(Symbols::new("9/9", "."), Err(VariantError::InvalidSymbol("9/9".to_string())));
        assert_eq!(Symbols::new("", "."),    Err(VariantError::InvalidSymbol(String::new())));
        assert_eq!(Symbols::new(".", "."),   Err(VariantError::SymbolCollision(".".to_string())));
    }

    #[test]
    fn allele_ordering() {
        assert!(Allele::Called(3) < Allele::Imputed);
        assert!(Allele::Imputed < Allele::Missing);
    }
}
