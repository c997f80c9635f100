use std::io::Write;
use std::path::{Path, PathBuf};

use graft_config::{ToolchainConfig, WorkDirMode};
use tempfile::{Builder, NamedTempFile, TempDir, TempPath};

use crate::error::GraftError;

const FILE_PREFIX: &str = "graft-";

/// File name of a static archive for the host platform.
pub fn static_archive_name(lib: &str) -> String {
  if cfg!(target_env = "msvc") {
    format!("{}.lib", lib)
  } else {
    format!("lib{}.a", lib)
  }
}

fn archive_suffix() -> &'static str {
  if cfg!(target_env = "msvc") {
    ".lib"
  } else {
    ".a"
  }
}

/// Hands out uniquely named temporary sources, artifacts and build
/// directories.
///
/// Sources are deleted when dropped. Artifact paths are deleted when dropped
/// unless handed off with [`TempFiles::hand_off`].
#[derive(Debug, Clone)]
pub struct TempFiles {
  root: PathBuf,
}

impl TempFiles {
  pub fn new(root: impl Into<PathBuf>) -> Self {
    Self { root: root.into() }
  }

  pub fn from_toolchain(toolchain: &ToolchainConfig) -> Self {
    Self::new(toolchain.temp_root())
  }

  pub fn root(&self) -> &Path {
    &self.root
  }

  /// Writes `contents` to a fresh `.rs` file.
  pub fn source_file(
    &self,
    contents: &str,
  ) -> Result<NamedTempFile, GraftError> {
    self.ensure_root()?;

    let mut file = Builder::new()
      .prefix(FILE_PREFIX)
      .suffix(".rs")
      .tempfile_in(&self.root)
      .map_err(|e| GraftError::io(&self.root, e))?;

    file
      .write_all(contents.as_bytes())
      .and_then(|_| file.flush())
      .map_err(|e| GraftError::io(file.path(), e))?;

    Ok(file)
  }

  /// Reserves a fresh archive path.
  pub fn artifact_path(&self) -> Result<TempPath, GraftError> {
    self.ensure_root()?;

    Builder::new()
      .prefix(FILE_PREFIX)
      .suffix(archive_suffix())
      .tempfile_in(&self.root)
      .map(NamedTempFile::into_temp_path)
      .map_err(|e| GraftError::io(&self.root, e))
  }

  /// Transfers ownership of the file to the caller; it is no longer deleted.
  pub fn hand_off(path: TempPath) -> Result<PathBuf, GraftError> {
    path.keep().map_err(|e| {
      let path = e.path.to_path_buf();
      GraftError::io(path, e.error)
    })
  }

  /// Moves a built archive out of a directory that is about to be removed.
  pub fn relocate(
    &self,
    built: &Path,
  ) -> Result<PathBuf, GraftError> {
    if !built.is_file() {
      return Err(GraftError::ArtifactMissing {
        path: built.to_path_buf(),
      });
    }

    let target = self.artifact_path()?;

    if std::fs::rename(built, &target).is_err() {
      // Different filesystem: copy, then drop the original.
      std::fs::copy(built, &target).map_err(|e| GraftError::io(built, e))?;
      std::fs::remove_file(built).map_err(|e| GraftError::io(built, e))?;
    }

    Self::hand_off(target)
  }

  /// Creates the working directory of a manifest build under `parent`.
  pub fn work_dir(
    &self,
    parent: &Path,
    mode: WorkDirMode,
    name: &str,
  ) -> Result<WorkDir, GraftError> {
    match mode {
      WorkDirMode::Unique => Builder::new()
        .prefix(name)
        .tempdir_in(parent)
        .map(WorkDir::Unique)
        .map_err(|e| GraftError::io(parent, e)),

      WorkDirMode::Fixed => {
        let path = parent.join(name);
        std::fs::create_dir_all(&path).map_err(|e| GraftError::io(&path, e))?;
        Ok(WorkDir::Fixed(path))
      },
    }
  }

  fn ensure_root(&self) -> Result<(), GraftError> {
    std::fs::create_dir_all(&self.root).map_err(|e| GraftError::io(&self.root, e))
  }
}

/// Working directory of a manifest build.
///
/// A unique directory is removed when dropped; a fixed one only by
/// [`WorkDir::remove`].
#[derive(Debug)]
pub enum WorkDir {
  Unique(TempDir),
  Fixed(PathBuf),
}

impl WorkDir {
  pub fn path(&self) -> &Path {
    match self {
      WorkDir::Unique(dir) => dir.path(),
      WorkDir::Fixed(path) => path,
    }
  }

  /// Recursively deletes the directory.
  pub fn remove(self) -> Result<(), GraftError> {
    match self {
      WorkDir::Unique(dir) => {
        let path = dir.path().to_path_buf();
        dir.close().map_err(|e| GraftError::io(path, e))
      },
      WorkDir::Fixed(path) => std::fs::remove_dir_all(&path).map_err(|e| GraftError::io(&path, e)),
    }
  }
}
