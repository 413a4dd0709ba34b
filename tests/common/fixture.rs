use std::{io, env, fs, path::{Path, PathBuf}, ops::Deref};
use tempfile::{self, TempDir};

pub const TEST_DATA_DIR: &str = "./tests/test-data";

/// Copy of a `tests/test-data` directory, living within its own temporary directory.
pub struct Fixture {
    path: PathBuf,
    _tempdir: TempDir,
}

impl Fixture {
    pub fn copy(data_dir: &str) -> Self {
        let root_dir = env::var("CARGO_MANIFEST_DIR").expect("$CARGO_MANIFEST_DIR");
        let source = PathBuf::from(root_dir).join(TEST_DATA_DIR).join(data_dir);

        let tempdir = tempfile::tempdir().expect("Failed to generate temp directory");
        let path = tempdir.path().join(data_dir);
        copy_dir_all(&source, &path).expect("Failed to copy fixture directory");
        Fixture { path, _tempdir: tempdir }
    }

    /// Path of a file within the fixture.
    pub fn file(&self, name: &str) -> PathBuf {
        self.path.join(name)
    }

    /// Path of a file within the output directory of the fixture (which is not created).
    pub fn output(&self, name: &str) -> PathBuf {
        self.output_dir().join(name)
    }

    pub fn output_dir(&self) -> PathBuf {
        self.path.join("hybrid-impute-output")
    }
}

fn copy_dir_all(src: impl AsRef<Path>, dst: impl AsRef<Path>) -> io::Result<()> {
    fs::create_dir_all(&dst)?;
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            copy_dir_all(entry.path(), dst.as_ref().join(entry.file_name()))?;
        } else {
            fs::copy(entry.path(), dst.as_ref().join(entry.file_name()))?;
        }
    }
    Ok(())
}

impl Deref for Fixture {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        self.path.deref()
    }
}
