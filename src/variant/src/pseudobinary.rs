use std::fmt::{self, Display, Formatter};

use crate::{Allele, Genotype, VariantError};

/// Compact encoding of a diploid biallelic call: `0/0 -> 0`, `0/1 -> 1`, `1/1 -> 3`, anything
/// carrying a missing or imputed-md side -> `7`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Pseudobinary {
    HomRef  = 0,
    Het     = 1,
    HomAlt  = 3,
    Missing = 7,
}

impl Pseudobinary {
    pub const CALLED: [Pseudobinary; 3] = [Self::HomRef, Self::Het, Self::HomAlt];

    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Result<Self, VariantError> {
        match code {
            0 => Ok(Self::HomRef),
            1 => Ok(Self::Het),
            3 => Ok(Self::HomAlt),
            7 => Ok(Self::Missing),
            _ => Err(VariantError::InvalidPseudobinary(code)),
        }
    }

    /// Encode a genotype.
    ///
    /// # Errors
    /// - `NotBiallelic` if any side refers to an allele index > 1
    pub fn encode(genotype: &Genotype) -> Result<Self, VariantError> {
        let index = |allele: Allele| match allele {
            Allele::Called(idx @ (0 | 1)) => Ok(Some(idx)),
            Allele::Called(_)             => Err(VariantError::NotBiallelic(format!("{genotype:?}"))),
            Allele::Imputed | Allele::Missing => Ok(None),
        };
        match (index(genotype.left)?, index(genotype.right)?) {
            (Some(0), Some(0)) => Ok(Self::HomRef),
            (Some(1), Some(1)) => Ok(Self::HomAlt),
            (Some(_), Some(_)) => Ok(Self::Het),
            _                  => Ok(Self::Missing),
        }
    }

    /// Decode back to a genotype. `Missing` decodes to `./.`
    pub fn decode(self) -> Genotype {
        match self {
            Self::HomRef  => Genotype::new(Allele::REF, Allele::REF),
            Self::Het     => Genotype::new(Allele::REF, Allele::ALT),
            Self::HomAlt  => Genotype::new(Allele::ALT, Allele::ALT),
            Self::Missing => Genotype::MISSING,
        }
    }

    pub fn is_missing(self) -> bool {
        self == Self::Missing
    }

    /// Number of reference alleles carried (`X` in kinship estimators). `None` when missing.
    pub fn ref_dosage(self) -> Option<u8> {
        match self {
            Self::HomRef  => Some(2),
            Self::Het     => Some(1),
            Self::HomAlt  => Some(0),
            Self::Missing => None,
        }
    }
}

impl Display for Pseudobinary {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl TryFrom<char> for Pseudobinary {
    type Error = VariantError;
    fn try_from(c: char) -> Result<Self, Self::Error> {
        let code = c.to_digit(10)
            .and_then(|d| u8::try_from(d).ok())
            .ok_or(VariantError::InvalidPseudobinary(u8::MAX))?;
        Self::from_code(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Symbols;

    fn encode(raw: &str) -> Result<Pseudobinary, VariantError> {
        Pseudobinary::encode(&Genotype::parse(raw, &Symbols::default())?)
    }

    #[test]
    fn encode_genotypes() -> Result<(), VariantError> {
        assert_eq!(encode("0/0")?, Pseudobinary::HomRef);
        assert_eq!(encode("0|1")?, Pseudobinary::Het);
        assert_eq!(encode("1/0")?, Pseudobinary::Het);
        assert_eq!(encode("1/1")?, Pseudobinary::HomAlt);
        assert_eq!(encode("./.")?, Pseudobinary::Missing);
        assert_eq!(encode("0/.")?, Pseudobinary::Missing);
        assert_eq!(encode("0/99")?, Pseudobinary::Missing);
        assert!(encode("0/2").is_err());
        Ok(())
    }

    #[test]
    fn bijection_on_canonical_genotypes() -> Result<(), VariantError> {
        for code in [0u8, 1, 3, 7] {
            let pb = Pseudobinary::from_code(code)?;
            assert_eq!(Pseudobinary::encode(&pb.decode())?, pb);
            assert_eq!(pb.code(), code);
        }
        assert!(Pseudobinary::from_code(2).is_err());
        Ok(())
    }

    #[test]
    fn dosage() {
        assert_eq!(Pseudobinary::HomRef.ref_dosage(), Some(2));
        assert_eq!(Pseudobinary::HomAlt.ref_dosage(), Some(0));
        assert_eq!(Pseudobinary::Missing.ref_dosage(), None);
    }
}
