//! Where input headers are read from and converted headers written to.

use flathdr_config::LayoutConfig;
use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Input and output directories, already resolved against a base directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileLayout {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
}

impl FileLayout {
    /// Resolve `layout` against `base`. Absolute directories are kept.
    pub fn new(base: &Path, layout: &LayoutConfig) -> Self {
        Self {
            input_dir: base.join(&layout.input_dir),
            output_dir: base.join(&layout.output_dir),
        }
    }

    /// Resolve `layout` against the directory holding the running executable.
    pub fn beside_executable(layout: &LayoutConfig) -> io::Result<Self> {
        let exe = env::current_exe()?;
        let base = exe.parent().unwrap_or_else(|| Path::new("."));
        Ok(Self::new(base, layout))
    }

    pub fn input_path(&self, file: &Path) -> PathBuf {
        self.input_dir.join(file)
    }

    /// Output path for `file`, creating the output directory if needed.
    /// Only the file name of `file` is kept.
    pub fn output_path(&self, file: &Path) -> io::Result<PathBuf> {
        let name = file.file_name().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} does not name a file", file.display()),
            )
        })?;
        fs::create_dir_all(&self.output_dir)?;
        Ok(self.output_dir.join(name))
    }
}
