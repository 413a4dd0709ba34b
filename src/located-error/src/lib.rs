use std::{fmt::Display, panic::Location};

use anyhow::{Context, Result};

pub mod prelude {
    extern crate anyhow;
    pub use anyhow::{anyhow, bail, Context, Result};

    extern crate thiserror;
    pub use thiserror::Error;

    pub use super::{LocatedError, LocatedOption};
    pub use crate::loc;
}

/// Format a `[file:line:col]` tag from a caller location.
fn locate(caller: &Location) -> String {
    format!("[{}:{}:{}]", caller.file(), caller.line(), caller.column())
}

/// Early-return an `Err(anyhow::Error)` wrapping the provided error, tagged with the current location.
///
/// ```ignore
/// return loc!(VcfError::InvalidFileExt)
/// ```
#[macro_export]
macro_rules! loc {
    ($err:expr) => {
        Err(anyhow::anyhow!($err)).map_err(|e| {
            e.context(format!("[{}:{}:{}]", file!(), line!(), column!()))
        })
    };
}

pub trait LocatedError<T, E> {
    /// Wrap the error value with additional context + the location at which it was called.
    fn loc<C>(self, context: C) -> Result<T, anyhow::Error>
    where
        C: Display + Send + Sync + 'static;

    /// Wrap the error value with additional context that is evaluated lazily
    /// only once an error does occur + the location at which it was called.
    fn with_loc<C, F>(self, f: F) -> Result<T, anyhow::Error>
    where
        C: Display + Send + Sync + 'static,
        F: FnOnce() -> C;
}

impl<T, E> LocatedError<T, E> for Result<T, E>
where
    E: Display + Send + Sync + 'static,
    Result<T, E>: Context<T, E>,
{
    #[track_caller]
    fn loc<C>(self, context: C) -> Result<T, anyhow::Error>
    where
        C: Display + Send + Sync + 'static
    {
        match self {
            Ok(ok) => Ok(ok),
            Err(_) => {
                let loc = locate(Location::caller());
                self.context(format!("{loc} {context}"))
            }
        }
    }

    #[track_caller]
    fn with_loc<C, F>(self, f: F) -> Result<T, anyhow::Error>
    where
        C: Display + Send + Sync + 'static,
        F: FnOnce() -> C
    {
        let caller = Location::caller();
        self.with_context(|| format!("{} {}", locate(caller), f()))
    }
}


pub trait LocatedOption<T> {
    /// Convert a `None` into an error carrying `context` + the location at which it was called.
    fn loc<C>(self, context: C) -> Result<T, anyhow::Error>
    where
        C: Display + Send + Sync + 'static;

    /// Convert a `None` into an error carrying a lazily evaluated context + the location at which it was called.
    fn with_loc<C, F>(self, f: F) -> Result<T, anyhow::Error>
    where
        C: Display + Send + Sync + 'static,
        F: FnOnce() -> C;
}


impl<T> LocatedOption<T> for Option<T> {
    #[track_caller]
    fn loc<C>(self, context: C) -> Result<T, anyhow::Error>
    where
        C: Display + Send + Sync + 'static
    {
        match self {
            Some(ok) => Ok(ok),
            None     => {
                let loc = locate(Location::caller());
                self.context(format!("{loc} {context}"))
            }
        }
    }

    #[track_caller]
    fn with_loc<C, F>(self, f: F) -> Result<T, anyhow::Error>
    where
        C: Display + Send + Sync + 'static,
        F: FnOnce() -> C
    {
        let caller = Location::caller();
        self.with_context(|| format!("{} {}", locate(caller), f()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use thiserror::Error;
    use std::fs::File;

    #[derive(Error, Debug)]
    pub enum PedigreeFileError {
        #[error(transparent)]
        Io(#[from] anyhow::Error),

        #[error("Missing pedigree definition")]
        Missing,
    }

    fn open_pedigree(file: &str) -> Result<(), PedigreeFileError> {
        let _ = File::open(file).loc(format!("failed to open pedigree file: '{file}'"))?;
        Ok(())
    }

    fn load_registry() -> Result<()> {
        open_pedigree("not-a-pedigree/").with_loc(|| "While loading the sample registry")
    }

    fn bind_samples() -> Result<()> {
        load_registry().with_loc(|| PedigreeFileError::Missing)
    }

    fn run_engine() -> Result<()> {
        bind_samples().with_loc(|| "While running the adult imputer")
    }

    #[test]
    fn error_chain_carries_every_location() {
        let err = run_engine().expect_err("Opening a directory as a pedigree should fail");
        let mut chain = err.chain();
        let results = [run_engine(), bind_samples(), load_registry()];
        for result in results {
            assert_eq!(
                format!("{}", chain.next().expect("chain should not be exhausted")),
                format!("{}", result.expect_err("each level should fail"))
            );
        }
    }

    #[test]
    fn location_tag_points_to_this_file() {
        let err = load_registry().expect_err("Opening a directory as a pedigree should fail");
        let top = format!("{err}");
        assert!(top.starts_with(&format!("[{}:", file!())), "{top}");
        assert!(top.ends_with("While loading the sample registry"), "{top}");
    }

    #[test]
    fn ok_results_pass_through() -> Result<()> {
        let value: Result<u8, std::io::Error> = Ok(42);
        assert_eq!(value.loc("unreachable")?, 42);
        assert_eq!(Some(7usize).with_loc(|| "unreachable")?, 7);
        Ok(())
    }

    #[test]
    fn none_becomes_located_error() {
        let mother: Option<usize> = None;
        let err = mother.loc(PedigreeFileError::Missing).expect_err("None should fail");
        assert!(format!("{err}").contains("Missing pedigree definition"));
    }

    #[test]
    fn loc_macro_tags_location() {
        let result: Result<()> = loc!(PedigreeFileError::Missing);
        let err = result.expect_err("loc! always fails");
        assert!(format!("{err}").contains(file!()));
        assert!(err.chain().any(|e| e.to_string() == "Missing pedigree definition"));
    }
}
