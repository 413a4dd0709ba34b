use parser::Scenario::{self, S0, S1, S2, S3};
use variant::{Allele, Genotype};

use crate::ProgenyError;

/// Class of a mother's genotype. `A`, `B` are genuine allele calls, `I` is the imputed-md allele,
/// `M` is the missing allele.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotherClass {
    /// `A/A`
    Hom(Allele),
    /// `A/B`
    Het(Allele, Allele),
    /// `A/I`
    HalfImputed(Allele),
    /// `I/I`
    Imputed,
    /// `M/M`
    Missing,
    /// `A/M`
    HalfMissing(Allele),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MotherKind {AA, AB, AI, II, MM, AM}

impl MotherClass {
    /// `None` for `I/M` mothers, which no scenario handles.
    pub fn classify(genotype: &Genotype) -> Option<Self> {
        use Allele::{Called, Imputed, Missing};
        let class = match (genotype.left, genotype.right) {
            (Called(a), Called(b)) if a == b            => Self::Hom(Called(a)),
            (a @ Called(_), b @ Called(_))              => Self::Het(a, b),
            (a @ Called(_), Imputed) | (Imputed, a @ Called(_)) => Self::HalfImputed(a),
            (Imputed, Imputed)                          => Self::Imputed,
            (Missing, Missing)                          => Self::Missing,
            (a @ Called(_), Missing) | (Missing, a @ Called(_)) => Self::HalfMissing(a),
            (Imputed, Missing) | (Missing, Imputed)     => return None,
        };
        Some(class)
    }

    fn kind(&self) -> MotherKind {
        match self {
            Self::Hom(_)         => MotherKind::AA,
            Self::Het(_, _)      => MotherKind::AB,
            Self::HalfImputed(_) => MotherKind::AI,
            Self::Imputed        => MotherKind::II,
            Self::Missing        => MotherKind::MM,
            Self::HalfMissing(_) => MotherKind::AM,
        }
    }

    /// Both sides of the mother, reserved alleles included.
    fn sides(&self) -> [Allele; 2] {
        match *self {
            Self::Hom(a)         => [a, a],
            Self::Het(a, b)      => [a, b],
            Self::HalfImputed(a) => [a, Allele::Imputed],
            Self::Imputed        => [Allele::Imputed; 2],
            Self::Missing        => [Allele::Missing; 2],
            Self::HalfMissing(a) => [a, Allele::Missing],
        }
    }

    /// `allele` is a genuine call carried by the mother.
    fn transmits(&self, allele: Allele) -> bool {
        allele.is_called() && self.sides().contains(&allele)
    }

    /// `allele` is neither carried by the mother, nor missing.
    fn is_foreign(&self, allele: Allele) -> bool {
        !allele.is_missing() && !self.sides().contains(&allele)
    }
}

/// Class of a progeny genotype, relative to its mother's alleles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgenyClass {
    /// `A/#`: one maternal allele, the other side is not missing.
    Maternal,
    /// `A/A`: homozygous for a maternal allele.
    MaternalHom,
    /// `A/*`: one maternal allele, and one foreign genuine call.
    MaternalForeign,
    /// `*/*`
    ForeignHom,
    /// `*/**`
    ForeignHet,
    /// `M/M`
    Missing,
    /// `#/#`
    NonMissingHom,
    /// `#/##`
    NonMissingHet,
    /// `A/A`, whatever the mother carries.
    CalledHom,
    /// `A/B`, whatever the mother carries.
    CalledHet,
    Any,
}

impl ProgenyClass {
    pub fn matches(&self, progeny: &Genotype, mother: &MotherClass) -> bool {
        let (l, r) = (progeny.left, progeny.right);
        match self {
            Self::Maternal        => (mother.transmits(l) && !r.is_missing()) || (mother.transmits(r) && !l.is_missing()),
            Self::MaternalHom     => l == r && mother.transmits(l),
            Self::MaternalForeign => {
                let foreign_call = |a: Allele| a.is_called() && !mother.transmits(a);
                (mother.transmits(l) && foreign_call(r)) || (mother.transmits(r) && foreign_call(l))
            },
            Self::ForeignHom      => l == r && mother.is_foreign(l),
            Self::ForeignHet      => l != r && mother.is_foreign(l) && mother.is_foreign(r),
            Self::Missing         => progeny.is_missing(),
            Self::NonMissingHom   => l == r && !l.is_missing(),
            Self::NonMissingHet   => l != r && !l.is_missing() && !r.is_missing(),
            Self::CalledHom       => l == r && l.is_called(),
            Self::CalledHet       => l != r && progeny.is_called(),
            Self::Any             => true,
        }
    }
}

/// Rewrite applied on a matching progeny genotype.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rewrite {
    Keep,
    /// Replace both sides.
    Both(Allele),
    /// Replace the right side.
    Right(Allele),
}

impl Rewrite {
    pub fn apply(&self, progeny: &Genotype) -> Genotype {
        match *self {
            Self::Keep         => *progeny,
            Self::Both(allele) => Genotype::new(allele, allele),
            Self::Right(allele) => Genotype::new(progeny.left, allele),
        }
    }
}

// ---- Decoding table. Rules are tried in order, the first matching class wins.

type Rule = (ProgenyClass, Rewrite);

use ProgenyClass::{Maternal, MaternalHom, MaternalForeign, ForeignHom, ForeignHet, NonMissingHom, NonMissingHet, CalledHom, CalledHet, Any};
use Rewrite::{Keep, Both, Right};
const M: Allele = Allele::Missing;
const I: Allele = Allele::Imputed;

const CALLED_MOTHER: &[Rule] = &[
    (Maternal, Keep),
    (ForeignHom, Both(M)),
    (ForeignHet, Both(M)),
    (ProgenyClass::Missing, Keep),
];

const HALF_IMPUTED_MOTHER: &[Rule] = &[
    (MaternalHom, Right(I)),
    (MaternalForeign, Keep),
    (ForeignHom, Right(I)),
    (ForeignHet, Both(M)),
    (ProgenyClass::Missing, Both(I)),
];

const IMPUTED_MOTHER: &[Rule] = &[
    (NonMissingHom, Right(I)),
    (NonMissingHet, Both(M)),
    (ProgenyClass::Missing, Both(I)),
];

const IMPUTED_MOTHER_COLLAPSED: &[Rule] = &[
    (CalledHom, Right(I)),
    (CalledHet, Both(M)),
    (ProgenyClass::Missing, Both(I)),
];

const HALF_MISSING_MOTHER: &[Rule] = &[
    (MaternalHom, Right(M)),
    (MaternalForeign, Keep),
    (ForeignHom, Right(M)),
    (ForeignHet, Both(M)),
    (ProgenyClass::Missing, Keep),
];

const MISSING_MOTHER: &[Rule] = &[
    (Any, Keep),
];

const ALL: &[Scenario] = &[S0, S1, S2, S3];

const TABLE: &[(&[Scenario], MotherKind, &[Rule])] = &[
    (ALL,          MotherKind::AA, CALLED_MOTHER),
    (ALL,          MotherKind::AB, CALLED_MOTHER),
    (&[S0, S2],    MotherKind::AI, HALF_IMPUTED_MOTHER),
    (&[S0, S1, S2], MotherKind::II, IMPUTED_MOTHER),
    (&[S3],        MotherKind::II, IMPUTED_MOTHER_COLLAPSED),
    (ALL,          MotherKind::MM, MISSING_MOTHER),
    (&[S3],        MotherKind::AM, HALF_MISSING_MOTHER),
];

fn rules(scenario: Scenario, kind: MotherKind) -> Option<&'static [Rule]> {
    TABLE.iter()
        .find(|(scenarios, k, _)| *k == kind && scenarios.contains(&scenario))
        .map(|(_, _, rules)| *rules)
}

/// Class notation of a genotype, i.e. `0/1`, `I/I`, `0/M`
fn notation(genotype: &Genotype) -> String {
    let side = |allele: Allele| match allele {
        Allele::Called(idx) => idx.to_string(),
        Allele::Imputed     => "I".to_string(),
        Allele::Missing     => "M".to_string(),
    };
    format!("{}/{}", side(genotype.left), side(genotype.right))
}

/// Rewrite a progeny genotype, given the genotype of its mother at the same variant.
///
/// # Errors
/// - `UnhandledMother` if the mother's class has no rule under `scenario`.
/// - `UnhandledProgeny` if no rule matches the progeny's class.
pub fn decode(scenario: Scenario, mother: &Genotype, progeny: &Genotype) -> Result<Genotype, ProgenyError> {
    use ProgenyError::{UnhandledMother, UnhandledProgeny};
    let unhandled_mother = || UnhandledMother { genotype: notation(mother), scenario: scenario.to_string() };

    let class = MotherClass::classify(mother).ok_or_else(unhandled_mother)?;
    let rules = rules(scenario, class.kind()).ok_or_else(unhandled_mother)?;
    let (_, rewrite) = rules.iter()
        .find(|(pattern, _)| pattern.matches(progeny, &class))
        .ok_or_else(|| UnhandledProgeny {
            progeny : notation(progeny),
            mother  : notation(mother),
            scenario: scenario.to_string()
        })?;
    Ok(rewrite.apply(progeny))
}

#[cfg(test)]
mod tests {
    use super::*;
    use variant::Symbols;

    fn gt(raw: &str) -> Genotype {
        Genotype::parse(raw, &Symbols::default()).expect("valid genotype")
    }

    fn check(scenario: Scenario, mother: &str, cases: &[(&str, &str)]) -> Result<(), ProgenyError> {
        for (progeny, expected) in cases {
            let decoded = decode(scenario, &gt(mother), &gt(progeny))?;
            assert_eq!(notation(&decoded), notation(&gt(expected)), "scenario {scenario} | mother {mother} | progeny {progeny}");
        }
        Ok(())
    }

    #[test]
    fn classify_mothers() {
        assert_eq!(MotherClass::classify(&gt("1/1")), Some(MotherClass::Hom(Allele::ALT)));
        assert_eq!(MotherClass::classify(&gt("1|0")), Some(MotherClass::Het(Allele::ALT, Allele::REF)));
        assert_eq!(MotherClass::classify(&gt("99/0")), Some(MotherClass::HalfImputed(Allele::REF)));
        assert_eq!(MotherClass::classify(&gt("0/.")), Some(MotherClass::HalfMissing(Allele::REF)));
        assert_eq!(MotherClass::classify(&gt(".")), Some(MotherClass::Missing));
        assert_eq!(MotherClass::classify(&gt("99/.")), None);
    }

    #[test]
    fn heterozygous_mother() -> Result<(), ProgenyError> {
        let cases = [("0/0", "0/0"), ("2/2", "./."), ("./.", "./."), ("1/2", "1/2"), ("2/3", "./."), ("0/99", "0/99")];
        for scenario in [S0, S1, S2, S3] {
            check(scenario, "0/1", &cases)?;
        }
        Ok(())
    }

    #[test]
    fn homozygous_mother() -> Result<(), ProgenyError> {
        check(S1, "0/0", &[("0/1", "0/1"), ("1/0", "1/0"), ("1/1", "./."), ("99/99", "./."), ("./.", "./.")])?;
        assert!(decode(S1, &gt("0/0"), &gt("0/.")).is_err());
        assert!(decode(S1, &gt("0/0"), &gt("1/.")).is_err());
        Ok(())
    }

    #[test]
    fn half_imputed_mother() -> Result<(), ProgenyError> {
        let cases = [("0/0", "0/99"), ("0/1", "0/1"), ("1/1", "1/99"), ("1/2", "./."), ("./.", "99/99")];
        check(S2, "0/99", &cases)?;
        check(S0, "99/0", &cases)?;
        assert!(decode(S2, &gt("0/99"), &gt("0/99")).is_err());
        assert!(decode(S1, &gt("0/99"), &gt("0/0")).is_err());
        assert!(decode(S3, &gt("0/99"), &gt("0/0")).is_err());
        Ok(())
    }

    #[test]
    fn imputed_mother() -> Result<(), ProgenyError> {
        check(S1, "99/99", &[("0/0", "0/99"), ("99/99", "99/99"), ("0/1", "./."), ("0/99", "./."), ("./.", "99/99")])?;
        check(S3, "99/99", &[("1/1", "1/99"), ("0/1", "./."), ("./.", "99/99")])?;
        assert!(decode(S3, &gt("99/99"), &gt("99/99")).is_err());
        assert!(decode(S1, &gt("99/99"), &gt("0/.")).is_err());
        Ok(())
    }

    #[test]
    fn half_missing_mother() -> Result<(), ProgenyError> {
        check(S3, "0/.", &[("0/0", "0/."), ("0/1", "0/1"), ("1/1", "1/."), ("1/2", "./."), ("./.", "./.")])?;
        for scenario in [S0, S1, S2] {
            assert!(decode(scenario, &gt("0/."), &gt("0/0")).is_err());
        }
        Ok(())
    }

    #[test]
    fn missing_mother() -> Result<(), ProgenyError> {
        for scenario in [S0, S1, S2, S3] {
            check(scenario, "./.", &[("0/0", "0/0"), ("0/.", "0/."), ("2/99", "2/99"), ("./.", "./.")])?;
        }
        Ok(())
    }

    #[test]
    fn unhandled_mother() {
        for scenario in [S0, S1, S2, S3] {
            assert!(matches!(decode(scenario, &gt("99/."), &gt("0/0")), Err(ProgenyError::UnhandledMother{..})));
        }
    }

    #[test]
    fn emitted_alleles_stay_within_the_mother() -> Result<(), ProgenyError> {
        // A/A mothers may only transmit A; any homozygous progeny either carries A or is blanked out.
        for progeny in ["0/0", "1/1", "2/2", "99/99", "./."] {
            let decoded = decode(S2, &gt("0/0"), &gt(progeny))?;
            assert!(decoded.alleles().iter().all(|a| *a == Allele::REF || a.is_missing()), "{progeny}");
        }
        Ok(())
    }
}
