use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub const ENV_RUSTC: &str = "GRAFT_RUSTC";
pub const ENV_CARGO: &str = "GRAFT_CARGO";

pub const DEFAULT_WORK_DIR_NAME: &str = ".graft-quasiquote";

#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum DebugTrace {
  Registry,
  Synth,
  Build,
  Link,
}

/// How the manifest-driven build picks its working directory.
///
/// - `Unique`: a fresh directory per build, named `{work_dir_name}XXXXXX`
/// - `Fixed`: exactly `{work_dir_name}`, shared by every build in the
///   current directory
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkDirMode {
  #[default]
  Unique,
  Fixed,
}

/// The `[toolchain]` section of graft.toml.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolchainConfig {
  /// Compiler used for the direct build. Default: "rustc".
  pub rustc: String,

  /// Package tool used when dependencies are declared. Default: "cargo".
  pub cargo: String,

  /// Extra flags handed to the compiler in both build strategies.
  pub extra_args: Vec<String>,

  /// Rust edition of the synthesized crate. Default: the compiler's own.
  pub edition: Option<String>,

  /// Directory for temporary sources and artifacts. Default: system temp dir.
  pub temp_dir: Option<PathBuf>,

  pub work_dir: WorkDirMode,

  /// Name (or name prefix, in unique mode) of the manifest build directory.
  pub work_dir_name: String,
}

impl Default for ToolchainConfig {
  fn default() -> Self {
    Self {
      rustc: "rustc".to_string(),
      cargo: "cargo".to_string(),
      extra_args: Vec::new(),
      edition: None,
      temp_dir: None,
      work_dir: WorkDirMode::Unique,
      work_dir_name: DEFAULT_WORK_DIR_NAME.to_string(),
    }
  }
}

impl ToolchainConfig {
  /// Applies `GRAFT_RUSTC` / `GRAFT_CARGO` from the process environment.
  pub fn apply_env(&mut self) {
    self.apply_env_with(|key| std::env::var(key).ok());
  }

  pub fn apply_env_with<F>(
    &mut self,
    lookup: F,
  ) where
    F: Fn(&str) -> Option<String>,
  {
    if let Some(rustc) = lookup(ENV_RUSTC).filter(|v| !v.is_empty()) {
      self.rustc = rustc;
    }

    if let Some(cargo) = lookup(ENV_CARGO).filter(|v| !v.is_empty()) {
      self.cargo = cargo;
    }
  }

  pub fn temp_root(&self) -> PathBuf {
    self.temp_dir.clone().unwrap_or_else(std::env::temp_dir)
  }
}

/// Root structure of graft.toml.
///
/// ```toml
/// [toolchain]
/// rustc = "rustc"
/// cargo = "cargo"
/// extra_args = ["-C", "opt-level=2"]
/// edition = "2021"
/// work_dir = "unique"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraftConfigFile {
  #[serde(default)]
  pub toolchain: ToolchainConfig,
}

impl GraftConfigFile {
  pub fn parse(
    path: &Path,
    content: &str,
  ) -> Result<Self, ConfigError> {
    toml::from_str(content).map_err(|e| ConfigError::TomlParseError {
      path: path.to_path_buf(),
      message: e.to_string(),
    })
  }

  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::IoError {
      path: path.to_path_buf(),
      source,
    })?;

    Self::parse(path, &content)
  }
}

#[derive(Debug, Clone, Default)]
pub struct GraftConfig {
  pub debug: bool,
  pub debug_trace: Vec<DebugTrace>,
  pub quiet: bool,
  pub verbose: u8,
  pub toolchain: ToolchainConfig,
}

impl GraftConfig {
  pub fn new(
    debug: bool,
    debug_trace: Vec<DebugTrace>,
    quiet: bool,
    verbose: u8,
    toolchain: ToolchainConfig,
  ) -> Self {
    Self {
      debug,
      debug_trace,
      quiet,
      verbose,
      toolchain,
    }
  }

  pub fn new_basic(
    debug: bool,
    debug_trace: Vec<DebugTrace>,
    quiet: bool,
    verbose: u8,
  ) -> Self {
    Self {
      debug,
      debug_trace,
      quiet,
      verbose,
      ..Self::default()
    }
  }

  /// Silent configuration with default toolchain settings.
  pub fn quiet() -> Self {
    Self {
      quiet: true,
      ..Self::default()
    }
  }
}

/// Errors while loading graft.toml.
#[derive(Debug)]
pub enum ConfigError {
  IoError { path: PathBuf, source: std::io::Error },

  TomlParseError { path: PathBuf, message: String },
}

impl fmt::Display for ConfigError {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    match self {
      ConfigError::IoError { path, source } => {
        write!(f, "failed to read '{}': {}", path.display(), source)
      },

      ConfigError::TomlParseError { path, message } => {
        write!(f, "failed to parse '{}': {}", path.display(), message)
      },
    }
  }
}

impl std::error::Error for ConfigError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      ConfigError::IoError { source, .. } => Some(source),
      _ => None,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_empty_file_uses_defaults() {
    let file = GraftConfigFile::parse(Path::new("graft.toml"), "").unwrap();
    assert_eq!(file.toolchain, ToolchainConfig::default());
    assert_eq!(file.toolchain.work_dir, WorkDirMode::Unique);
    assert_eq!(file.toolchain.work_dir_name, ".graft-quasiquote");
  }

  #[test]
  fn test_partial_toolchain_section() {
    let content = r#"
[toolchain]
rustc = "/opt/rust/bin/rustc"
extra_args = ["-C", "opt-level=2"]
work_dir = "fixed"
"#;
    let file = GraftConfigFile::parse(Path::new("graft.toml"), content).unwrap();

    assert_eq!(file.toolchain.rustc, "/opt/rust/bin/rustc");
    assert_eq!(file.toolchain.cargo, "cargo");
    assert_eq!(file.toolchain.extra_args, vec!["-C", "opt-level=2"]);
    assert_eq!(file.toolchain.work_dir, WorkDirMode::Fixed);
    assert!(file.toolchain.edition.is_none());
  }

  #[test]
  fn test_parse_error_names_file() {
    let err = GraftConfigFile::parse(Path::new("bad/graft.toml"), "[toolchain\nrustc = 1").unwrap_err();
    let message = err.to_string();
    assert!(message.starts_with("failed to parse 'bad/graft.toml':"), "{}", message);
  }

  #[test]
  fn test_unknown_work_dir_mode_rejected() {
    let content = "[toolchain]\nwork_dir = \"shared\"\n";
    assert!(GraftConfigFile::parse(Path::new("graft.toml"), content).is_err());
  }

  #[test]
  fn test_load_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = GraftConfigFile::load(&dir.path().join("graft.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::IoError { .. }));
    assert!(std::error::Error::source(&err).is_some());
  }

  #[test]
  fn test_load_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("graft.toml");
    std::fs::write(&path, "[toolchain]\nedition = \"2021\"\n").unwrap();

    let file = GraftConfigFile::load(&path).unwrap();
    assert_eq!(file.toolchain.edition.as_deref(), Some("2021"));
  }

  #[test]
  fn test_env_overrides() {
    let mut toolchain = ToolchainConfig::default();
    toolchain.apply_env_with(|key| match key {
      ENV_RUSTC => Some("my-rustc".to_string()),
      ENV_CARGO => Some(String::new()),
      _ => None,
    });

    assert_eq!(toolchain.rustc, "my-rustc");
    assert_eq!(toolchain.cargo, "cargo");
  }
}
