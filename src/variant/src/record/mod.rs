
use itertools::Itertools;

use crate::{Allele, Genotype, Symbols, VariantError};

/// 0-based column index of the INFO field.
pub const INFO_FIELD_INDEX: usize = 7;
/// 0-based column index of the FORMAT field.
pub const FORMAT_FIELD_INDEX: usize = 8;
/// 0-based column index where sample genotype entries begin.
pub const GENOTYPES_START_IDX: usize = 9;

const DEPTH_TAG: &str = "DP=";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariantType {Snp, Indel, Multiallelic, NotAvailable}

/// A sample column. The raw text is kept around so that untouched calls are re-emitted verbatim.
#[derive(Debug, Clone)]
struct SampleCall {
    raw     : String,
    genotype: Genotype,
    modified: bool,
}

/// In-memory shape of a VCF data line.
///
/// Only the `GT` subfield of each sample is interpreted. Every other field is stored as-is.
#[derive(Debug, Clone)]
pub struct VariantRecord {
    pub chrom    : String,
    pub pos      : u64,
    id           : String,
    pub reference: String,
    pub alts     : Vec<String>,
    qual         : String,
    filter       : String,
    info         : String,
    format       : String,
    gt_idx       : usize,
    calls        : Vec<SampleCall>,
}

impl VariantRecord {
    /// Parse a tab-separated VCF data line (without its trailing newline).
    pub fn parse(line: &str, symbols: &Symbols) -> Result<Self, VariantError> {
        use VariantError::{MissingFields, InvalidPosition, MissingGT};
        let fields: Vec<&str> = line.trim_end_matches(['\n', '\r']).split('\t').collect();
        if fields.len() <= FORMAT_FIELD_INDEX {
            return Err(MissingFields(fields.len(), GENOTYPES_START_IDX))
        }

        let pos = fields[1].parse::<u64>().map_err(|_| InvalidPosition(fields[1].to_string()))?;
        let format = fields[FORMAT_FIELD_INDEX];
        let gt_idx = format.split(':')
            .position(|tag| tag == "GT")
            .ok_or_else(|| MissingGT(format.to_string()))?;

        let alts = match fields[4] {
            "." => Vec::new(),
            alt => alt.split(',').map(str::to_string).collect(),
        };

        let calls = fields[GENOTYPES_START_IDX..].iter()
            .map(|raw| {
                let genotype = match raw.split(':').nth(gt_idx) {
                    Some(gt) => Genotype::parse(gt, symbols)?,
                    None     => Genotype::MISSING, // Trailing subfields may be dropped.
                };
                Ok(SampleCall { raw: (*raw).to_string(), genotype, modified: false })
            })
            .collect::<Result<Vec<_>, VariantError>>()?;

        Ok(Self {
            chrom    : fields[0].to_string(),
            pos,
            id       : fields[2].to_string(),
            reference: fields[3].to_string(),
            alts,
            qual     : fields[5].to_string(),
            filter   : fields[6].to_string(),
            info     : fields[INFO_FIELD_INDEX].to_string(),
            format   : format.to_string(),
            gt_idx,
            calls,
        })
    }

    /// `chrom:pos` identifier.
    pub fn key(&self) -> String {
        format!("{}:{}", self.chrom, self.pos)
    }

    /// Combined depth, read from the `DP=` tag of the INFO field.
    pub fn depth(&self) -> Result<u32, VariantError> {
        use VariantError::{MissingDepth, InvalidDepth};
        let tag = self.info.split(';')
            .find_map(|tag| tag.strip_prefix(DEPTH_TAG))
            .ok_or(MissingDepth)?;
        tag.parse::<u32>().map_err(|_| InvalidDepth(tag.to_string()))
    }

    pub fn variant_type(&self) -> VariantType {
        if self.is_indel() {
            VariantType::Indel
        } else {
            match self.alts.len() {
                0 => VariantType::NotAvailable,
                1 => VariantType::Snp,
                _ => VariantType::Multiallelic,
            }
        }
    }

    /// `true` if the reference or any alternative spans more than one base.
    pub fn is_indel(&self) -> bool {
        self.reference.len() > 1 || self.alts.iter().any(|alt| alt.len() > 1)
    }

    /// Ensure this variant carries exactly one alternative allele.
    pub fn require_biallelic(&self) -> Result<(), VariantError> {
        match self.alts.len() {
            1 => Ok(()),
            n => Err(VariantError::Multiallelic(n)),
        }
    }

    pub fn n_samples(&self) -> usize {
        self.calls.len()
    }

    /// Genotype of the sample found at (0-based) sample column `idx`.
    pub fn genotype(&self, idx: usize) -> Result<&Genotype, VariantError> {
        self.calls.get(idx)
            .map(|call| &call.genotype)
            .ok_or(VariantError::SampleOutOfBounds(idx, self.calls.len()))
    }

    pub fn genotypes(&self) -> impl Iterator<Item = &Genotype> + '_ {
        self.calls.iter().map(|call| &call.genotype)
    }

    /// Rewrite the genotype of sample `idx`. The original separator is kept.
    ///
    /// Returns `true` if any side actually changed.
    pub fn set_genotype(&mut self, idx: usize, genotype: Genotype) -> Result<bool, VariantError> {
        let n = self.calls.len();
        let call = self.calls.get_mut(idx).ok_or(VariantError::SampleOutOfBounds(idx, n))?;
        let changed = call.genotype.alleles() != genotype.alleles();
        if changed {
            call.genotype = genotype.with_sep_of(&call.genotype);
            call.modified = true;
        }
        Ok(changed)
    }

    /// Apply `f` on every side of every sample. Returns the number of modified samples.
    pub fn map_alleles<F: Fn(Allele) -> Allele>(&mut self, f: F) -> usize {
        let mut changed = 0;
        for call in &mut self.calls {
            let genotype = call.genotype.map(&f);
            if genotype.alleles() != call.genotype.alleles() {
                call.genotype = genotype;
                call.modified = true;
                changed += 1;
            }
        }
        changed
    }

    /// Promote the first alternative allele to reference and shift every other allele index down.
    ///
    /// Former reference calls (`0`) are left untouched. Returns `false` if there is no alternative allele.
    pub fn rotate_reference(&mut self) -> bool {
        if self.alts.is_empty() {
            return false
        }
        self.reference = self.alts.remove(0);
        self.map_alleles(|allele| match allele {
            Allele::Called(idx) if idx >= 1 => Allele::Called(idx - 1),
            other => other,
        });
        true
    }

    /// Drop alternative alleles that no sample carries anymore, and remap remaining indices densely.
    ///
    /// Returns the number of dropped alternatives.
    pub fn repack_alts(&mut self) -> usize {
        let mut carriers = vec![0usize; self.alts.len() + 1];
        for allele in self.calls.iter().flat_map(|call| call.genotype.alleles()) {
            if let Allele::Called(idx) = allele {
                if let Some(count) = carriers.get_mut(idx as usize) {
                    *count += 1;
                }
            }
        }

        // old index -> new index. Reference always stays at 0.
        let mut remap = vec![None; carriers.len()];
        remap[0] = Some(0u8);
        let mut next = 1u8;
        for (idx, count) in carriers.iter().enumerate().skip(1) {
            if *count > 0 {
                remap[idx] = Some(next);
                next += 1;
            }
        }

        let dropped = remap.iter().filter(|new| new.is_none()).count();
        if dropped == 0 {
            return 0
        }

        let mut old_alts = std::mem::take(&mut self.alts).into_iter();
        self.alts = remap[1..].iter()
            .filter_map(|new| {
                let alt = old_alts.next();
                new.and(alt)
            })
            .collect();

        self.map_alleles(|allele| match allele {
            Allele::Called(idx) => remap.get(idx as usize)
                .copied()
                .flatten()
                .map_or(allele, Allele::Called),
            other => other,
        });
        dropped
    }

    /// Render this record back into a VCF data line (without its trailing newline).
    pub fn render(&self, symbols: &Symbols) -> String {
        let alts = if self.alts.is_empty() { ".".to_string() } else { self.alts.join(",") };
        let mut line = format!("{}\t{}\t{}\t{}\t{alts}\t{}\t{}\t{}\t{}",
            self.chrom, self.pos, self.id, self.reference, self.qual, self.filter, self.info, self.format
        );
        for call in &self.calls {
            line.push('\t');
            if !call.modified {
                line.push_str(&call.raw);
                continue
            }
            let mut subfields: Vec<&str> = call.raw.split(':').collect();
            if subfields.len() <= self.gt_idx {
                subfields.resize(self.gt_idx + 1, ".");
            }
            let rendered = call.genotype.render(symbols).to_string();
            subfields[self.gt_idx] = &rendered;
            line.push_str(&subfields.iter().join(":"));
        }
        line
    }
}
