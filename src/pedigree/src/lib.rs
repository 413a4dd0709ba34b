use std::{fmt::{self, Display, Formatter}, path::Path};

use ahash::{AHashMap, AHashSet};
use log::{debug, warn};
use serde::{Serialize, Deserialize};

use located_error::prelude::*;

mod error;
pub use error::PedigreeError;

pub mod parser;
use parser::PedigreeEntry;

// ---- Species

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Species { Sp1, Sp2, Hybrid }

/// User-provided species identifiers: two parental species and an optional hybrid group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeciesSet {
    sp1   : String,
    sp2   : String,
    hybrid: Option<String>,
}

impl SpeciesSet {
    pub fn new(sp1: &str, sp2: &str, hybrid: Option<&str>) -> Result<Self, PedigreeError> {
        use PedigreeError::DuplicateSpecies;
        let mut seen = AHashSet::new();
        for id in [Some(sp1), Some(sp2), hybrid].into_iter().flatten() {
            if !seen.insert(id) {
                return Err(DuplicateSpecies(id.to_string()))
            }
        }
        Ok(Self { sp1: sp1.to_string(), sp2: sp2.to_string(), hybrid: hybrid.map(str::to_string) })
    }

    /// Map a raw species identifier onto its `Species`.
    pub fn resolve(&self, id: &str) -> Option<Species> {
        if id == self.sp1 {
            Some(Species::Sp1)
        } else if id == self.sp2 {
            Some(Species::Sp2)
        } else if self.hybrid.as_deref() == Some(id) {
            Some(Species::Hybrid)
        } else {
            None
        }
    }

    pub fn label(&self, species: Species) -> &str {
        match species {
            Species::Sp1    => &self.sp1,
            Species::Sp2    => &self.sp2,
            Species::Hybrid => self.hybrid.as_deref().unwrap_or("hybrid"),
        }
    }

    /// Every configured species, parental species first.
    pub fn species(&self) -> Vec<Species> {
        let mut species = vec![Species::Sp1, Species::Sp2];
        if self.hybrid.is_some() {
            species.push(Species::Hybrid);
        }
        species
    }
}

impl Display for SpeciesSet {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match &self.hybrid {
            Some(hybrid) => write!(f, "{{{}, {}, {hybrid}}}", self.sp1, self.sp2),
            None         => write!(f, "{{{}, {}}}", self.sp1, self.sp2),
        }
    }
}

// ---- Samples

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role { Adult, Mother, Progeny }

impl Role {
    /// Adults and mothers both belong to the adult generation.
    pub fn is_adult(&self) -> bool {
        matches!(self, Self::Adult | Self::Mother)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sample {
    pub id     : String,
    pub species: Species,
    pub mother : Option<String>,
    pub role   : Role,
}

/// Sample registry. Immutable once built.
#[derive(Debug, Clone)]
pub struct Pedigree {
    samples: Vec<Sample>,
    index  : AHashMap<String, usize>,
    species: SpeciesSet,
}

impl Pedigree {
    /// Parse and validate a `sample;species;mother` pedigree file.
    pub fn from_file(path: &Path, species: SpeciesSet) -> Result<Self> {
        let loc_msg = || format!("While building the sample registry from {}", path.display());
        let entries = parser::parse_pedigree_file(path).with_loc(loc_msg)?;
        Self::from_entries(entries, species).with_loc(loc_msg)
    }

    /// Validate raw entries and derive sample roles.
    ///
    /// # Errors
    /// - duplicate sample ids
    /// - species identifiers outside of `species`, or a requested species without any sample
    /// - mothers that are undefined, self-referencing, or progenies themselves.
    pub fn from_entries(entries: Vec<PedigreeEntry>, species: SpeciesSet) -> Result<Self> {
        use PedigreeError::{DuplicateSample, UnexpectedSpecies, MissingSpecies, UnknownMother, MotherIsProgeny, SelfMother};
        let loc_msg = "While validating the pedigree";

        // ---- Index samples.
        let mut index = AHashMap::with_capacity(entries.len());
        for (i, entry) in entries.iter().enumerate() {
            if index.insert(entry.id.clone(), i).is_some() {
                return Err(DuplicateSample(entry.id.clone())).loc(loc_msg)
            }
        }

        // ---- Mothers must exist and must not be progenies.
        let mut mothers = AHashSet::new();
        for entry in &entries {
            let Some(mother) = entry.mother.as_deref() else { continue };
            let (sample, mother) = (entry.id.clone(), mother.to_string());
            if mother == sample {
                return Err(SelfMother(sample)).loc(loc_msg)
            }
            match index.get(&mother).map(|i| &entries[*i]) {
                None                              => return Err(UnknownMother{sample, mother}).loc(loc_msg),
                Some(mum) if mum.mother.is_some() => return Err(MotherIsProgeny{sample, mother}).loc(loc_msg),
                Some(_)                           => { mothers.insert(mother); },
            }
        }

        // ---- Resolve species and derive roles.
        let mut samples = Vec::with_capacity(entries.len());
        let mut represented = AHashSet::new();
        for entry in entries {
            let sample_species = species.resolve(&entry.species).ok_or_else(|| UnexpectedSpecies {
                sample  : entry.id.clone(),
                species : entry.species.clone(),
                expected: species.to_string()
            }).loc(loc_msg)?;
            represented.insert(sample_species);

            let role = match (&entry.mother, mothers.contains(&entry.id)) {
                (Some(_), _)  => Role::Progeny,
                (None, true)  => Role::Mother,
                (None, false) => Role::Adult,
            };
            samples.push(Sample { id: entry.id, species: sample_species, mother: entry.mother, role });
        }

        if let Some(missing) = species.species().into_iter().find(|sp| !represented.contains(sp)) {
            return Err(MissingSpecies(species.label(missing).to_string())).loc(loc_msg)
        }

        debug!("Pedigree: {} samples ({} adults, {} progenies)",
            samples.len(),
            samples.iter().filter(|s| s.role.is_adult()).count(),
            samples.iter().filter(|s| s.role == Role::Progeny).count()
        );
        Ok(Self { samples, index, species })
    }

    pub fn get(&self, id: &str) -> Option<&Sample> {
        self.index.get(id).map(|i| &self.samples[*i])
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn species_set(&self) -> &SpeciesSet {
        &self.species
    }

    /// Bind every VCF sample column to its pedigree entry.
    ///
    /// # Errors
    /// - if a VCF sample is not defined within the pedigree.
    ///
    /// Pedigree samples that are absent from the VCF are reported, but tolerated.
    pub fn bind(&self, vcf_samples: &[String]) -> Result<SampleLayout> {
        use PedigreeError::UnknownSample;
        let columns: AHashMap<&str, usize> = vcf_samples.iter()
            .enumerate()
            .map(|(col, id)| (id.as_str(), col))
            .collect();

        let mut layout = Vec::with_capacity(vcf_samples.len());
        for id in vcf_samples {
            let sample = self.get(id).ok_or_else(|| UnknownSample(id.clone())).loc("While binding VCF samples to the pedigree")?;
            let mother_column = sample.mother.as_deref().and_then(|mother| columns.get(mother).copied());
            layout.push(BoundSample { sample: sample.clone(), mother_column });
        }

        for absent in self.samples.iter().filter(|s| !columns.contains_key(s.id.as_str())) {
            warn!("Pedigree sample '{}' is not found within the VCF header. Skipping it.", absent.id);
        }
        Ok(SampleLayout { columns: layout, species: self.species.clone() })
    }
}

// ---- VCF binding

/// A pedigree sample, bound to the VCF column of its mother (if any).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundSample {
    pub sample       : Sample,
    pub mother_column: Option<usize>,
}

/// Pedigree information of every VCF sample column, in column order.
#[derive(Debug, Clone)]
pub struct SampleLayout {
    columns: Vec<BoundSample>,
    species: SpeciesSet,
}

impl SampleLayout {
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn get(&self, column: usize) -> Option<&BoundSample> {
        self.columns.get(column)
    }

    pub fn columns(&self) -> impl Iterator<Item = (usize, &BoundSample)> + '_ {
        self.columns.iter().enumerate()
    }

    /// Columns of the adult generation (adults and mothers).
    pub fn adults(&self) -> impl Iterator<Item = usize> + '_ {
        self.columns().filter(|(_, s)| s.sample.role.is_adult()).map(|(col, _)| col)
    }

    pub fn progenies(&self) -> impl Iterator<Item = (usize, &BoundSample)> + '_ {
        self.columns().filter(|(_, s)| s.sample.role == Role::Progeny)
    }

    /// Every column belonging to `species`, regardless of role.
    pub fn of_species(&self, species: Species) -> impl Iterator<Item = usize> + '_ {
        self.columns().filter(move |(_, s)| s.sample.species == species).map(|(col, _)| col)
    }

    /// Adult columns belonging to `species`.
    pub fn adults_of(&self, species: Species) -> impl Iterator<Item = usize> + '_ {
        self.columns()
            .filter(move |(_, s)| s.sample.species == species && s.sample.role.is_adult())
            .map(|(col, _)| col)
    }

    pub fn species_set(&self) -> &SpeciesSet {
        &self.species
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, species: &str, mother: Option<&str>) -> PedigreeEntry {
        PedigreeEntry { id: id.to_string(), species: species.to_string(), mother: mother.map(str::to_string) }
    }

    fn species() -> SpeciesSet {
        SpeciesSet::new("sp1", "sp2", None).expect("distinct species")
    }

    fn pedigree() -> Result<Pedigree> {
        Pedigree::from_entries(vec![
            entry("M1", "sp1", None),
            entry("A1", "sp1", None),
            entry("A2", "sp2", None),
            entry("P1", "sp1", Some("M1")),
            entry("P2", "sp1", Some("M1")),
        ], species())
    }

    #[test]
    fn derive_roles() -> Result<()> {
        let pedigree = pedigree()?;
        assert_eq!(pedigree.get("M1").map(|s| s.role), Some(Role::Mother));
        assert_eq!(pedigree.get("A1").map(|s| s.role), Some(Role::Adult));
        assert_eq!(pedigree.get("P2").map(|s| s.role), Some(Role::Progeny));
        assert_eq!(pedigree.get("A2").map(|s| s.species), Some(Species::Sp2));
        Ok(())
    }

    #[test]
    fn invalid_pedigrees() {
        let cases = [
            vec![entry("M1", "sp1", None), entry("M1", "sp2", None)],                              // duplicate
            vec![entry("M1", "sp1", None), entry("A1", "sp3", None)],                              // unexpected species
            vec![entry("M1", "sp1", None), entry("A1", "sp1", None)],                              // sp2 missing
            vec![entry("M1", "sp1", None), entry("A1", "sp2", None), entry("P1", "sp1", Some("X"))], // unknown mother
            vec![entry("M1", "sp1", None), entry("A1", "sp2", None), entry("P1", "sp1", Some("M1")), entry("P2", "sp1", Some("P1"))],
            vec![entry("M1", "sp1", Some("M1")), entry("A1", "sp2", None)],
        ];
        for case in cases {
            let dbg = format!("{case:?}");
            assert!(Pedigree::from_entries(case, species()).is_err(), "{dbg}");
        }
    }

    #[test]
    fn hybrid_species_set() -> Result<()> {
        let set = SpeciesSet::new("sp1", "sp2", Some("hyb"))?;
        assert_eq!(set.resolve("hyb"), Some(Species::Hybrid));
        assert_eq!(set.species().len(), 3);
        assert!(SpeciesSet::new("sp1", "sp1", None).is_err());
        // hybrid requested but absent from the pedigree
        let entries = vec![entry("M1", "sp1", None), entry("A1", "sp2", None)];
        assert!(Pedigree::from_entries(entries, set).is_err());
        Ok(())
    }

    #[test]
    fn bind_vcf_columns() -> Result<()> {
        let pedigree = pedigree()?;
        let vcf: Vec<String> = ["P1", "A1", "M1", "A2"].iter().map(|s| s.to_string()).collect();
        let layout = pedigree.bind(&vcf)?;
        assert_eq!(layout.len(), 4);
        assert_eq!(layout.get(0).and_then(|s| s.mother_column), Some(2));
        assert_eq!(layout.adults().collect::<Vec<_>>(), [1, 2, 3]);
        assert_eq!(layout.adults_of(Species::Sp1).collect::<Vec<_>>(), [1, 2]);
        assert_eq!(layout.of_species(Species::Sp1).collect::<Vec<_>>(), [0, 1, 2]);
        assert_eq!(layout.progenies().count(), 1);
        Ok(())
    }

    #[test]
    fn bind_unknown_vcf_sample() -> Result<()> {
        let pedigree = pedigree()?;
        let vcf = vec!["M1".to_string(), "STRANGER".to_string()];
        assert!(pedigree.bind(&vcf).is_err());
        Ok(())
    }

    #[test]
    fn mother_absent_from_vcf() -> Result<()> {
        let pedigree = pedigree()?;
        let vcf = vec!["P1".to_string(), "A2".to_string()];
        let layout = pedigree.bind(&vcf)?;
        assert_eq!(layout.get(0).and_then(|s| s.mother_column), None);
        Ok(())
    }
}
