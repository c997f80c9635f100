use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use graft_core::{GraftError, UnitRegistry};
use graft_types::TypeContext;
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FragmentEntry {
  pub code: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DependencyEntry {
  pub name: String,
  pub version: String,
}

/// A compilation unit described on disk.
///
/// ```toml
/// name = "Main"
///
/// [types]
/// Handle = "void*"
///
/// [[dependency]]
/// name = "rand"
/// version = "0.3"
///
/// [[fragment]]
/// code = "pub extern fn roll() -> u32 { 4 }"
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UnitFile {
  pub name: String,

  /// Exact mappings consulted before the basic policy.
  #[serde(default)]
  pub types: BTreeMap<String, String>,

  #[serde(default, rename = "fragment")]
  pub fragments: Vec<FragmentEntry>,

  #[serde(default, rename = "dependency")]
  pub dependencies: Vec<DependencyEntry>,
}

impl UnitFile {
  pub fn parse(
    path: &Path,
    content: &str,
  ) -> Result<Self, UnitFileError> {
    toml::from_str(content).map_err(|e| UnitFileError::Parse {
      path: path.to_path_buf(),
      message: e.to_string(),
    })
  }

  pub fn load(path: &Path) -> Result<Self, UnitFileError> {
    let content = std::fs::read_to_string(path).map_err(|source| UnitFileError::Io {
      path: path.to_path_buf(),
      source,
    })?;

    Self::parse(path, &content)
  }

  /// Policy of this unit, or `None` when it keeps the session default.
  pub fn policy(&self) -> Option<TypeContext> {
    if self.types.is_empty() {
      return None;
    }

    Some(TypeContext::from_pairs(self.types.iter()).compose(&TypeContext::basic()))
  }

  /// Feeds the unit into `registry`: policy, then dependencies, then
  /// fragments in file order.
  pub fn register(
    &self,
    registry: &mut UnitRegistry,
  ) -> Result<(), GraftError> {
    if let Some(policy) = self.policy() {
      registry.set_policy(policy)?;
    }

    for dependency in &self.dependencies {
      registry.declare_dependency(&dependency.name, &dependency.version);
    }

    for fragment in &self.fragments {
      registry.append_fragment(&fragment.code);
    }

    Ok(())
  }
}

#[derive(Debug)]
pub enum UnitFileError {
  Io { path: PathBuf, source: std::io::Error },

  Parse { path: PathBuf, message: String },
}

impl fmt::Display for UnitFileError {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    match self {
      UnitFileError::Io { path, source } => {
        write!(f, "failed to read unit '{}': {}", path.display(), source)
      },
      UnitFileError::Parse { path, message } => {
        write!(f, "invalid unit '{}': {}", path.display(), message)
      },
    }
  }
}

impl std::error::Error for UnitFileError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      UnitFileError::Io { source, .. } => Some(source),
      UnitFileError::Parse { .. } => None,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use graft_types::ForeignType;

  const UNIT: &str = r#"
name = "Main"

[types]
Handle = "void*"
i32 = "Int32"

[[dependency]]
name = "rand"
version = "0.3"

[[fragment]]
code = "pub extern fn one() -> i32 { 1 }"

[[fragment]]
code = "pub extern fn two() -> i32 { 2 }"
"#;

  #[test]
  fn test_parse_unit() {
    let unit = UnitFile::parse(Path::new("main.toml"), UNIT).unwrap();

    assert_eq!(unit.name, "Main");
    assert_eq!(unit.fragments.len(), 2);
    assert_eq!(unit.fragments[1].code, "pub extern fn two() -> i32 { 2 }");
    assert_eq!(
      unit.dependencies,
      vec![DependencyEntry {
        name: "rand".to_string(),
        version: "0.3".to_string(),
      }]
    );
  }

  #[test]
  fn test_minimal_unit() {
    let unit = UnitFile::parse(Path::new("empty.toml"), "name = \"Empty\"\n").unwrap();
    assert!(unit.fragments.is_empty());
    assert!(unit.dependencies.is_empty());
    assert!(unit.policy().is_none());
  }

  #[test]
  fn test_policy_overrides_basic() {
    let unit = UnitFile::parse(Path::new("main.toml"), UNIT).unwrap();
    let policy = unit.policy().unwrap();

    assert_eq!(policy.lookup(&ForeignType::parse("i32")).unwrap().as_str(), "Int32");
    assert_eq!(policy.lookup(&ForeignType::parse("Handle")).unwrap().as_str(), "void*");
    assert_eq!(
      policy.lookup(&ForeignType::parse("u8")),
      TypeContext::basic().lookup(&ForeignType::parse("u8"))
    );
  }

  #[test]
  fn test_missing_name_is_parse_error() {
    let err = UnitFile::parse(Path::new("bad.toml"), "[[fragment]]\ncode = \"\"\n").unwrap_err();
    assert!(matches!(err, UnitFileError::Parse { .. }));
    assert!(err.to_string().starts_with("invalid unit 'bad.toml'"));
  }

  #[test]
  fn test_load_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = UnitFile::load(&dir.path().join("nope.toml")).unwrap_err();
    assert!(matches!(err, UnitFileError::Io { .. }));
  }

  #[test]
  fn test_load_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("main.toml");
    std::fs::write(&path, UNIT).unwrap();

    let unit = UnitFile::load(&path).unwrap();
    assert_eq!(unit.name, "Main");
  }
}
