use serde::{Serialize, Deserialize};

use variant::Pseudobinary;

/// r² value recorded whenever one of the four allele frequencies of an LD pair is zero.
pub const LD_SENTINEL: f64 = -999.0;

/// A polymorphic, biallelic SNP.
///
/// # Fields
/// - `id`       : `chrom:pos` identifier.
/// - `reference`: reference nucleotide.
/// - `alt`      : alternative nucleotide.
/// - `codes`    : pseudobinary code of every sample, in VCF column order.
/// - `missing`  : VCF column of every sample carrying code `7`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnpRow {
    pub id       : String,
    pub chrom    : String,
    pub pos      : u64,
    pub reference: String,
    pub alt      : String,
    #[serde(with = "codes")]
    pub codes    : Vec<Pseudobinary>,
    #[serde(with = "columns")]
    pub missing  : Vec<usize>,
}

impl SnpRow {
    pub fn has_missing(&self) -> bool {
        !self.missing.is_empty()
    }
}

/// Pairwise linkage disequilibrium between a SNP carrying missing data (`snp1`) and any other SNP.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LdRow {
    pub snp1        : String,
    pub snp2        : String,
    pub d           : f64,
    pub r2          : f64,
    #[serde(with = "columns")]
    pub snp2_missing: Vec<usize>,
}

impl LdRow {
    pub fn is_sentinel(&self) -> bool {
        self.r2 == LD_SENTINEL
    }
}

/// Kinship estimates of a pair of samples (`i < j`, VCF columns). `None` marks an undefined estimate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KinshipRow {
    pub i       : usize,
    pub j       : usize,
    pub sample_i: String,
    pub sample_j: String,
    pub rbeta   : Option<f64>,
    pub rw      : Option<f64>,
    pub ru      : Option<f64>,
}

/// Pseudobinary codes, serialized as a compact digit string (e.g. `01377`).
mod codes {
    use serde::{Deserialize, Deserializer, Serializer, de::Error};
    use variant::Pseudobinary;

    pub fn serialize<S: Serializer>(codes: &[Pseudobinary], serializer: S) -> Result<S::Ok, S::Error> {
        let raw: String = codes.iter().map(ToString::to_string).collect();
        serializer.serialize_str(&raw)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Pseudobinary>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.chars()
            .map(|c| Pseudobinary::try_from(c).map_err(D::Error::custom))
            .collect()
    }
}

/// Sample columns, serialized as a comma-separated list. An empty list is an empty field.
mod columns {
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(columns: &[usize], serializer: S) -> Result<S::Ok, S::Error> {
        let raw = columns.iter().map(ToString::to_string).collect::<Vec<_>>().join(",");
        serializer.serialize_str(&raw)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<usize>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.split(',')
            .filter(|col| !col.is_empty())
            .map(|col| col.parse::<usize>().map_err(D::Error::custom))
            .collect()
    }
}
