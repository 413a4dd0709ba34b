use std::{fmt::{self, Display, Formatter}, io::Write, time::Duration};

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use indicatif_log_bridge::LogWrapper;
use log::{Level, LevelFilter};
use env_logger::{Builder, Env, fmt::Color};
use once_cell::sync::OnceCell;

static INSTANCE: OnceCell<Logger> = OnceCell::new();

/// Environment variable overriding the command-line verbosity.
pub const LOG_ENV_VAR: &str = "HYBRID_IMPUTE_LOG";

#[derive(Debug)]
pub struct Logger {
    multi_pg: MultiProgress,
}

impl Logger {

    /// Install the global logger. Subsequent calls are no-ops.
    pub fn init(verbosity: u8) {
        if INSTANCE.get().is_some() {
            Self::set_level(verbosity);
            return
        }
        let log_level = Self::u8_to_loglevel(verbosity);
        let env = Env::default().filter(LOG_ENV_VAR);

        let logger = Builder::new().filter_level(log_level)
            .format(|buf, record| {
                let (traceback, set_intensity) = match record.level() {
                    Level::Error => (format!("(@ {}:{}) ", record.file().unwrap_or("unknown"), record.line().unwrap_or(0)), true),
                    _            => (String::new(), false),
                };

                let mut arg_style = buf.style();
                arg_style.set_intense(set_intensity);

                let mut level_style = buf.style();
                let color = match record.level() {
                    Level::Error => Color::Red,
                    Level::Warn  => Color::Yellow,
                    Level::Info  => Color::Green,
                    Level::Debug => Color::Blue,
                    Level::Trace => Color::Cyan
                };
                level_style.set_color(color).set_bold(true);

                writeln!(
                    buf,
                    "[{} {: <5} {}] {traceback}{}",
                    chrono::Local::now().format("%Y-%m-%dT%H:%M:%S"),
                    level_style.value(record.level()),
                    record.target(),
                    arg_style.value(record.args())
                )
            })
            .parse_env(env)
            .build();

        // Progress bar support.
        let multi_pg = MultiProgress::new();
        if LogWrapper::new(multi_pg.clone(), logger).try_init().is_err() {
            eprintln!("A global logger was already installed. Progress bars may interleave with log lines.");
        }
        log::set_max_level(log_level);
        let _ = INSTANCE.set(Self{multi_pg});
    }

    fn u8_to_loglevel(verbosity: u8) -> LevelFilter {
        match verbosity {
            0            => LevelFilter::Error,
            1            => LevelFilter::Warn,
            2            => LevelFilter::Info,
            3            => LevelFilter::Debug,
            4..= u8::MAX => LevelFilter::Trace
        }
    }

    pub fn set_level(verbosity: u8) {
        log::set_max_level(Self::u8_to_loglevel(verbosity));
    }

    /// Shared progress handle, or `None` if the logger was never initialized (e.g. within unit tests).
    pub fn multi() -> Option<&'static MultiProgress> {
        INSTANCE.get().map(|logger| &logger.multi_pg)
    }
}

// ---- Run counters

/// Records scanned, kept, imputed and filtered by an engine.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Counters {
    pub scanned : u64,
    pub kept    : u64,
    pub imputed : u64,
    pub filtered: u64,
}

impl Display for Counters {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "scanned: {} | kept: {} | imputed: {} | filtered: {}", self.scanned, self.kept, self.imputed, self.filtered)
    }
}

/// Spinner streaming an engine's `Counters` to stderr.
///
/// Falls back to a hidden bar whenever `Logger::init()` was not called, so that
/// library code may freely report progress.
pub struct Progress {
    bar      : ProgressBar,
    refresh  : u64,
}

impl Progress {
    const TEMPLATE: &'static str = "{spinner:.green} [{elapsed_precise}] {prefix:.bold} {msg}";

    pub fn new(prefix: &str) -> Self {
        let bar = match Logger::multi() {
            Some(multi) if log::max_level() >= LevelFilter::Info => multi.add(ProgressBar::new_spinner()),
            _ => ProgressBar::hidden(),
        };
        if let Ok(style) = ProgressStyle::with_template(Self::TEMPLATE) {
            bar.set_style(style);
        }
        bar.set_prefix(prefix.to_string());
        bar.enable_steady_tick(Duration::from_millis(200));
        Self { bar, refresh: 1000 }
    }

    /// Refresh the displayed counters every `self.refresh` scanned records.
    pub fn tick(&self, counters: &Counters) {
        if counters.scanned % self.refresh == 0 {
            self.bar.set_message(counters.to_string());
        }
    }

    pub fn finish(&self, counters: &Counters) {
        self.bar.finish_with_message(counters.to_string());
    }
}
