use ahash::AHashSet;

use variant::record::GENOTYPES_START_IDX;

const CONTIG_PREFIX: &str = "##contig=<";
pub const COLUMNS_PREFIX: &str = "#CHROM";

/// VCF meta-information lines + column header line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VcfHeader {
    meta   : Vec<String>,
    columns: String,
    samples: Vec<String>,
}

impl VcfHeader {
    /// Build a header from its `##` lines and its `#CHROM` line.
    pub fn new(meta: Vec<String>, columns: &str) -> Self {
        let samples = columns.split('\t')
            .skip(GENOTYPES_START_IDX)
            .map(str::to_string)
            .collect();
        Self { meta, columns: columns.to_string(), samples }
    }

    /// Sample identifiers, in column order (starting from the 10th column).
    pub fn samples(&self) -> &[String] {
        &self.samples
    }

    pub fn meta(&self) -> &[String] {
        &self.meta
    }

    /// Extract the `ID` of a `##contig=<ID=...>` line.
    pub fn contig_id(line: &str) -> Option<&str> {
        line.strip_prefix(CONTIG_PREFIX)?
            .trim_end_matches('>')
            .split(',')
            .find_map(|kv| kv.strip_prefix("ID="))
    }

    pub fn contigs(&self) -> impl Iterator<Item = &str> + '_ {
        self.meta.iter().filter_map(|line| Self::contig_id(line))
    }

    /// Remove `##contig` lines whose sequence is not found within `seen`. Returns the number of removed lines.
    pub fn retain_contigs(&mut self, seen: &AHashSet<String>) -> usize {
        let before = self.meta.len();
        self.meta.retain(|line| match Self::contig_id(line) {
            Some(id) => seen.contains(id),
            None     => true,
        });
        before - self.meta.len()
    }

    /// Render the header back to text. Every line is newline-terminated.
    pub fn render(&self) -> String {
        let mut out = String::with_capacity(self.meta.iter().map(|l| l.len() + 1).sum::<usize>() + self.columns.len() + 1);
        for line in self.meta.iter().chain(std::iter::once(&self.columns)) {
            out.push_str(line);
            out.push('\n');
        }
        out
    }
}
