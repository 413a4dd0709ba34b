use std::{
    fs::File,
    path::{Path, PathBuf},
    str::FromStr,
    fmt::{self, Display, Formatter},
    ffi::OsStr
};

use located_error::prelude::*;

use clap::{Parser, Subcommand, Args, ArgEnum};
use serde::{Serialize, Deserialize};
use log::debug;

use variant::Symbols;

mod error;
pub use error::ParserError;

#[derive(Parser, Debug, Serialize, Deserialize)]
#[clap(name="hybrid-impute", author, version, about, long_about = None)]
#[clap(propagate_version = true)]
/// hybrid-impute: pedigree-aware imputation of VCF files for hybridization studies
pub struct Cli {
    ///Set the verbosity level (-v -vv -vvv)
    ///
    /// Set the verbosity level of this program. Multiple levels allowed {n}
    ///
    /// -v: Info  |  -vv: Debug  | -vvv: Trace {n}
    ///
    /// Note that the program will still output warnings by default, even when this flag is off.
    /// Use The --quiet/-q to disable them
    #[clap(short='v', long, parse(from_occurrences), global=true)]
    pub verbose: u8,

    /// Disable warnings.
    ///
    /// By default, warnings are emmited and redirected to the console, even when verbose mode is off.
    /// Use this argument to disable this. Only errors will be displayed.
    #[clap(short='q', long, global=true)]
    pub quiet: bool,

    #[clap(subcommand)]
    pub commands: Commands,
}

impl Cli {
    /// Logger verbosity, as expected by `logger::Logger::init()`
    pub fn verbosity(&self) -> u8 {
        if self.quiet { 0 } else { self.verbose.saturating_add(1) }
    }

    /// Serialize command line arguments within a `.yaml` file.
    ///
    /// # Behavior
    /// - File naming follows the convention '{current time}-{module name}.yaml'. current time follows the format
    ///   `YYYY`-`MM`-`DD`T`hhmmss`
    /// - File is written at the root of the user-provided `--output-dir` folder.
    ///
    /// Returns the path of the written file, or `None` for commands that do not write anything.
    pub fn serialize(&self) -> Result<Option<PathBuf>> {
        use ParserError::{Serialize, WriteYaml};
        let Some(io) = self.commands.io() else {
            return Ok(None)
        };

        let serialized = serde_yaml::to_string(&self).map_err(Serialize).loc("While serializing the command line")?;
        debug!("\n---- Command line args ----\n{}\n---", serialized);

        let current_time = chrono::offset::Local::now().format("%Y-%m-%dT%H%M%S").to_string();
        let output_file = io.output_dir.join(format!("{current_time}-{}.yaml", self.commands.name()));

        std::fs::write(&output_file, serialized)
            .map_err(|e| WriteYaml(output_file.display().to_string(), e))
            .loc("While serializing the command line")?;
        Ok(Some(output_file))
    }

    /// Deserialize a `.yaml` file into Command line arguments.
    pub fn deserialize(yaml: &Path) -> Result<Self> {
        use ParserError::{OpenYaml, Deserialize};
        let name = || yaml.display().to_string();
        let file = File::open(yaml).map_err(|e| OpenYaml(name(), e)).loc("While replaying a previous run")?;
        serde_yaml::from_reader(file).map_err(|e| Deserialize(name(), e)).loc("While replaying a previous run")
    }
}

#[derive(Subcommand, Debug, Serialize, Deserialize)]
pub enum Commands {
    /// Filter variants and impute missing genotypes of the adult generation.
    ///
    /// Adults (and mothers) are processed using per-species allele statistics. Variants failing the
    /// depth, allele frequency, or monomorphism filters are removed.
    AdultImpute {
        #[clap(flatten)]
        io: IoOptions,
        #[clap(flatten)]
        pedigree: PedigreeOptions,
        #[clap(flatten)]
        adult: AdultOptions,
    },

    /// Enforce mendelian compatibility between progenies and their mother.
    ProgenyImpute {
        #[clap(flatten)]
        io: IoOptions,
        #[clap(flatten)]
        pedigree: PedigreeOptions,
        #[clap(flatten)]
        progeny: ProgenyOptions,
    },

    /// Compute the SNP, linkage disequilibrium and kinship tables of a VCF.
    ///
    /// Tables are written as '{output-dir}/{vcf-stem}.{snps,ld,kinship}.tsv'
    GenotypeData {
        #[clap(flatten)]
        io: IoOptions,
    },

    /// Impute missing SNP genotypes using Self-Organizing Maps.
    SomImpute {
        #[clap(flatten)]
        io: IoOptions,
        #[clap(flatten)]
        som: SomOptions,
    },

    /// Run every step in one go: adult imputation, genotype data, SOM imputation and progeny imputation.
    ///
    /// Progeny imputation applies the same --scenario as the adult imputation step.
    Pipeline {
        #[clap(flatten)]
        io: IoOptions,
        #[clap(flatten)]
        pedigree: PedigreeOptions,
        #[clap(flatten)]
        adult: Box<AdultOptions>, // Box<T> to mitigate the large size difference between variants.
        #[clap(flatten)]
        som: Box<SomOptions>,
    },

    /// Run hybrid-impute using a previously generated .yaml configuration file.
    ///
    /// This allows users to easily re-apply a command using the exact same parameters
    /// and arguments.
    FromYaml {
        #[clap(parse(try_from_os_str=valid_input_file))]
        yaml: PathBuf,
    },
}

impl Commands {
    pub fn name(&self) -> &'static str {
        match self {
            Self::AdultImpute{..}   => "adult-impute",
            Self::ProgenyImpute{..} => "progeny-impute",
            Self::GenotypeData{..}  => "genotype-data",
            Self::SomImpute{..}     => "som-impute",
            Self::Pipeline{..}      => "pipeline",
            Self::FromYaml{..}      => "from-yaml",
        }
    }

    pub fn io(&self) -> Option<&IoOptions> {
        match self {
            Self::AdultImpute{io, ..}
            | Self::ProgenyImpute{io, ..}
            | Self::GenotypeData{io}
            | Self::SomImpute{io, ..}
            | Self::Pipeline{io, ..} => Some(io),
            Self::FromYaml{..}       => None,
        }
    }
}

// ---- Shared options

#[derive(Args, Debug, Clone, Serialize, Deserialize)]
pub struct IoOptions {
    /// Input VCF file.
    ///
    /// BGZF or gzip compressed files are accepted, provided they carry a '.gz' extension.
    #[clap(short='i', long, parse(try_from_os_str=valid_input_file))]
    pub vcf: PathBuf,

    /// Output directory where results will be written.
    ///
    /// Note that hybrid-impute will create the specified leaf directory if it is not present, but does not
    /// allow itself from creating parent directories.
    #[clap(short, long, default_value("hybrid-impute-output"), parse(try_from_os_str=valid_output_dir))]
    pub output_dir: PathBuf,

    /// Overwrite existing output files.
    ///
    /// By default, hybrid-impute does not allow itself from overwriting existing results files. Use this flag
    /// to force this behaviour.
    #[clap(short='w', long)]
    pub overwrite: bool,

    /// Number of worker threads.
    ///
    /// Used by the linkage disequilibrium and SOM imputation steps, as well as for output compression.
    /// Note that the number of workers is capped by the number of available cpus.
    #[clap(short='@', long, default_value("1"), parse(try_from_str=at_least_one))]
    pub threads: usize,

    /// Number of additional parallel decompression threads.
    ///
    /// Only applies to '.gz' input files. 0 means decompression is performed on the main thread.
    #[clap(short='#', long, default_value("0"))]
    pub decompression_threads: usize,

    /// BGZF-compress output VCF files ('.vcf.gz')
    #[clap(short='z', long)]
    pub compress: bool,

    /// Allele symbol of imputed missing data.
    #[clap(long, default_value(variant::DEFAULT_IMPUTED_MD))]
    pub imputed_md_id: String,

    /// Allele symbol of missing data.
    #[clap(long, default_value(variant::DEFAULT_MISSING))]
    pub missing_id: String,
}

impl IoOptions {
    /// Reserved allele symbols.
    pub fn symbols(&self) -> Result<Symbols> {
        Symbols::new(&self.imputed_md_id, &self.missing_id)
            .with_loc(|| format!("While validating --imputed-md-id '{}' and --missing-id '{}'", self.imputed_md_id, self.missing_id))
    }
}

impl Default for IoOptions {
    fn default() -> Self {
        Self {
            vcf                  : PathBuf::new(),
            output_dir           : PathBuf::from("hybrid-impute-output"),
            overwrite            : false,
            threads              : 1,
            decompression_threads: 0,
            compress             : false,
            imputed_md_id        : variant::DEFAULT_IMPUTED_MD.to_string(),
            missing_id           : variant::DEFAULT_MISSING.to_string(),
        }
    }
}

#[derive(Args, Debug, Clone, Default, Serialize, Deserialize)]
pub struct PedigreeOptions {
    /// Pedigree definition file.
    ///
    /// Semicolon-separated, one sample per line: 'sample_id;species_id;mother_id'. Use 'NONE' as a mother_id for
    /// samples without any recorded mother. Lines starting with '#' are ignored.
    #[clap(short='p', long, parse(try_from_os_str=valid_input_file))]
    pub pedigree: PathBuf,

    /// Identifier of the first parental species.
    #[clap(long)]
    pub sp1: String,

    /// Identifier of the second parental species.
    #[clap(long)]
    pub sp2: String,

    /// Identifier of the hybrid group (optional).
    #[clap(long, required(false))]
    pub hybrid: Option<String>,
}

// ---- Engine options

/// Imputation policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Scenario {
    /// Drop every variant requiring adult imputation.
    S0,
    /// Impute missing adults, keep homozygous calls as-is.
    S1,
    /// Impute missing adults, and flag homozygous calls of poorly covered species.
    S2,
    /// Collapse homozygous adult calls to half-missing calls.
    S3,
}

impl Default for Scenario {
    fn default() -> Self {Self::S1}
}

impl FromStr for Scenario {
    type Err = ParserError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "0" => Ok(Self::S0),
            "1" => Ok(Self::S1),
            "2" => Ok(Self::S2),
            "3" => Ok(Self::S3),
            other => Err(ParserError::InvalidScenario(other.to_string())),
        }
    }
}

impl Display for Scenario {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let code = match self {
            Self::S0 => 0,
            Self::S1 => 1,
            Self::S2 => 2,
            Self::S3 => 3,
        };
        write!(f, "{code}")
    }
}

/// Filter variants and impute adult genotypes.
///
/// Note that percentages are stored as ratios.
#[derive(Args, Debug, Clone, Serialize, Deserialize)]
pub struct AdultOptions {
    /// Imputation scenario (0, 1, 2 or 3).
    ///
    /// 0: drop variants requiring imputation{n}
    /// 1: impute missing adults{n}
    /// 2: impute missing adults and flag homozygous adults of poorly covered species (a/99){n}
    /// 3: collapse homozygous adults to half-missing calls (a/.){n}
    #[clap(short='s', long, default_value("1"))]
    pub scenario: Scenario,

    /// Promote the first alternative allele to reference, when no adult carries the reference allele.
    #[clap(long)]
    pub fix_ref: bool,

    /// Minimum per-species prevalence of an alternative allele among adults (in percentage).
    ///
    /// Alleles carried by fewer adults of a species are set to missing within that species (SNPs only).
    #[clap(long, default_value("0"), parse(try_from_str=percent_str_to_ratio))]
    pub min_aa: f64,

    /// Per-species missing data percentage above which missing adults are imputed.
    #[clap(long, default_value("100"), parse(try_from_str=percent_str_to_ratio))]
    pub min_md_imputation: f64,

    /// Maximum missing data percentage among adults of the first species.
    #[clap(long, default_value("100"), parse(try_from_str=percent_str_to_ratio))]
    pub md_max_1: f64,

    /// Maximum missing data percentage among adults of the second species.
    #[clap(long, default_value("100"), parse(try_from_str=percent_str_to_ratio))]
    pub md_max_2: f64,

    /// Minimum per-species allele frequency (in percentage).
    #[clap(long, default_value("0"), parse(try_from_str=percent_str_to_ratio))]
    pub maf: f64,

    /// Minimum combined depth (INFO 'DP' tag).
    #[clap(long, default_value("1"), parse(try_from_str=at_least_one))]
    pub min_dp: usize,
}

impl Default for AdultOptions {
    fn default() -> Self {
        Self {
            scenario         : Scenario::S1,
            fix_ref          : false,
            min_aa           : 0.0,
            min_md_imputation: 1.0,
            md_max_1         : 1.0,
            md_max_2         : 1.0,
            maf              : 0.0,
            min_dp           : 1,
        }
    }
}

#[derive(Args, Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProgenyOptions {
    /// Imputation scenario (0, 1, 2 or 3). Should match the scenario of the adult imputation step.
    #[clap(short='s', long, default_value("1"))]
    pub scenario: Scenario,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ArgEnum, Serialize, Deserialize)]
pub enum KinshipEstimator {Rbeta, Rw, Ru}

impl Default for KinshipEstimator {
    fn default() -> Self {Self::Rbeta}
}

impl Display for KinshipEstimator {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rbeta => write!(f, "beta kinship (rbeta)"),
            Self::Rw    => write!(f, "weighted kinship (rw)"),
            Self::Ru    => write!(f, "unweighted kinship (ru)"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ArgEnum, Serialize, Deserialize)]
pub enum ImputationMethod {Mf, Ck}

impl Default for ImputationMethod {
    fn default() -> Self {Self::Mf}
}

impl Display for ImputationMethod {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mf => write!(f, "most frequent genotype"),
            Self::Ck => write!(f, "closest kin"),
        }
    }
}

/// Impute missing SNP genotypes using Self-Organizing Maps.
#[derive(Args, Debug, Clone, Serialize, Deserialize)]
pub struct SomOptions {
    /// Prefix of previously computed genotype data tables.
    ///
    /// i.e. '--tables out/run1' reads 'out/run1.snps.tsv', 'out/run1.ld.tsv' and 'out/run1.kinship.tsv'.
    /// When unspecified, tables are looked for within --output-dir, using the stem of the input VCF.
    #[clap(long, required(false))]
    pub tables: Option<PathBuf>,

    /// Number of SOM rows.
    #[clap(long, default_value("3"), parse(try_from_str=at_least_one))]
    pub xdim: usize,

    /// Number of SOM columns.
    #[clap(long, default_value("3"), parse(try_from_str=at_least_one))]
    pub ydim: usize,

    /// Spread of the gaussian neighborhood function.
    #[clap(long, default_value("1.0"), parse(try_from_str=strictly_positive))]
    pub sigma: f64,

    /// Initial learning rate.
    #[clap(long, default_value("0.5"), parse(try_from_str=strictly_positive))]
    pub learning_rate: f64,

    /// Number of training iterations.
    #[clap(long, default_value("500"), parse(try_from_str=at_least_one))]
    pub iterations: usize,

    /// Minimum r² of a context SNP.
    ///
    /// Defaults to the mean r² of the linkage disequilibrium table, plus one standard deviation.
    #[clap(long, required(false), parse(try_from_str=strictly_positive))]
    pub min_r2: Option<f64>,

    /// Maximum number of context SNPs, ranked by decreasing r².
    #[clap(short='K', long, default_value("5"), parse(try_from_str=at_least_two))]
    pub context_size: usize,

    /// Kinship estimator used by the closest-kin imputation method.
    #[clap(long, arg_enum, default_value("rbeta"))]
    pub estimator: KinshipEstimator,

    /// Genotype imputation method.
    ///
    /// mf: most frequent genotype among the samples of the winning neuron.{n}
    /// ck: genotype of the closest kin among the samples of the winning neuron.
    #[clap(long, arg_enum, default_value("mf"))]
    pub method: ImputationMethod,
}

impl Default for SomOptions {
    fn default() -> Self {
        Self {
            tables       : None,
            xdim         : 3,
            ydim         : 3,
            sigma        : 1.0,
            learning_rate: 0.5,
            iterations   : 500,
            min_r2       : None,
            context_size : 5,
            estimator    : KinshipEstimator::default(),
            method       : ImputationMethod::default(),
        }
    }
}

// ---- Validation

#[derive(Debug, Clone, Copy)]
pub enum FileEntity {File, Directory}

impl Display for FileEntity {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Self::File      => write!(f, "File"),
            Self::Directory => write!(f, "Directory"),
        }
    }
}

impl FileEntity {
    fn validate(&self, path: &Path) -> Result<(), ParserError> {
        use ParserError::InvalidFileEntity;
        let valid = match self {
            Self::File      => path.is_file(),
            Self::Directory => path.is_dir()
        };

        if valid {
            Ok(())
        } else {
            Err(InvalidFileEntity(*self, path.display().to_string()))
        }
    }
}

fn assert_filesystem_entity_is_valid(s: &OsStr, entity: &FileEntity) -> Result<()> {
    use ParserError::MissingFileEntity;
    let path = Path::new(s);
    if ! path.exists() {
        return Err(MissingFileEntity(*entity, path.display().to_string()))
            .loc("While parsing arguments.")
    }

    entity.validate(path).loc("While parsing arguments.")
}

fn valid_input_file(s: &OsStr) -> Result<PathBuf> {
    assert_filesystem_entity_is_valid(s, &FileEntity::File)
        .loc("While checking for file validity")?;
    Ok(PathBuf::from(s))
}

fn valid_output_dir(s: &OsStr) -> Result<PathBuf> {
    use ParserError::CreateOutputDir;
    let path = Path::new(s);
    if ! path.exists() {
        std::fs::create_dir(path)
            .map_err(|e| CreateOutputDir(path.display().to_string(), e))
            .loc("While checking for directory validity")?;
    }
    assert_filesystem_entity_is_valid(s, &FileEntity::Directory)
        .loc("While checking for directory validity")?;
    Ok(PathBuf::from(s))
}

fn percent_str_to_ratio(s: &str) -> Result<f64>{
    use ParserError::{ParseRatio, ParseNumber};

    const MIN_PERCENT: f64 = 0.0;
    const MAX_PERCENT: f64 = 100.0;

    let percent = s.parse::<f64>().map_err(|_| ParseNumber(s.to_string())).loc("While parsing a percentage")?;

    // Ensure the user input lies between the [0% - 100%] range.
    match (MIN_PERCENT..=MAX_PERCENT).contains(&percent) {
        true  => Ok(percent/100.0),
        false => Err(ParseRatio(MIN_PERCENT, MAX_PERCENT)).with_loc(|| format!("While parsing {s}"))
    }
}

fn parse_at_least(s: &str, min: usize) -> Result<usize> {
    use ParserError::{BelowMinimum, ParseNumber};
    let found = s.parse::<usize>().map_err(|_| ParseNumber(s.to_string())).loc("While parsing an integer")?;
    if found < min {
        return Err(BelowMinimum{min, found}).with_loc(|| format!("While parsing {s}"))
    }
    Ok(found)
}

fn at_least_one(s: &str) -> Result<usize> {
    parse_at_least(s, 1)
}

fn at_least_two(s: &str) -> Result<usize> {
    parse_at_least(s, 2)
}

fn strictly_positive(s: &str) -> Result<f64> {
    use ParserError::{NotStrictlyPositive, ParseNumber};
    let value = s.parse::<f64>().map_err(|_| ParseNumber(s.to_string())).loc("While parsing a number")?;
    if value.is_nan() || value <= 0.0 {
        return Err(NotStrictlyPositive(value)).with_loc(|| format!("While parsing {s}"))
    }
    Ok(value)
}
