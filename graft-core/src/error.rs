use std::fmt;
use std::path::PathBuf;

use graft_types::ForeignType;

use crate::link::format_tool_error;
use crate::registry::UnitId;

/// Errors raised while collecting or building a compilation unit.
#[derive(Debug)]
pub enum GraftError {
  /// The unit's type-translation policy was set a second time.
  PolicyAlreadySet { unit: UnitId },

  /// The session already handed out a registry for this unit.
  UnitAlreadyOpen { unit: UnitId },

  /// The active policy has no mapping for a foreign type.
  UnmappedType { ty: ForeignType },

  /// The toolchain ran and exited unsuccessfully. `stderr` is kept verbatim.
  ToolchainFailed {
    tool: String,
    action: &'static str,
    stderr: String,
  },

  /// The toolchain could not be started at all.
  Spawn { tool: String, source: std::io::Error },

  Io { path: PathBuf, source: std::io::Error },

  /// The toolchain reported success but left no archive where expected.
  ArtifactMissing { path: PathBuf },
}

impl GraftError {
  pub(crate) fn io(
    path: impl Into<PathBuf>,
    source: std::io::Error,
  ) -> Self {
    GraftError::Io {
      path: path.into(),
      source,
    }
  }

  /// Misuse of the registry lifecycle by the caller.
  pub fn is_configuration(&self) -> bool {
    matches!(self, GraftError::PolicyAlreadySet { .. } | GraftError::UnitAlreadyOpen { .. })
  }

  /// Failures attributable to the external compiler or package tool.
  pub fn is_toolchain(&self) -> bool {
    matches!(
      self,
      GraftError::ToolchainFailed { .. } | GraftError::Spawn { .. } | GraftError::ArtifactMissing { .. }
    )
  }
}

impl fmt::Display for GraftError {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    match self {
      GraftError::PolicyAlreadySet { unit } => {
        write!(f, "configuration error: type translation policy of unit '{}' is already set", unit)
      },

      GraftError::UnitAlreadyOpen { unit } => {
        write!(f, "configuration error: compilation unit '{}' is already open", unit)
      },

      GraftError::UnmappedType { ty } => {
        write!(f, "unmapped foreign type: '{}'", ty)
      },

      GraftError::ToolchainFailed { tool, action, stderr } => {
        write!(f, "{}", format_tool_error(tool, action, stderr))
      },

      GraftError::Spawn { tool, source } => {
        write!(f, "failed to run {}: {}", tool, source)
      },

      GraftError::Io { path, source } => {
        write!(f, "failed to access '{}': {}", path.display(), source)
      },

      GraftError::ArtifactMissing { path } => {
        write!(f, "build finished but no archive was found at '{}'", path.display())
      },
    }
  }
}

impl std::error::Error for GraftError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      GraftError::Spawn { source, .. } | GraftError::Io { source, .. } => Some(source),
      _ => None,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_toolchain_failure_keeps_stderr_verbatim() {
    let stderr = "error: expected `;`\n --> quasiquote.rs:1:10\n";
    let err = GraftError::ToolchainFailed {
      tool: "rustc".to_string(),
      action: "compilation",
      stderr: stderr.to_string(),
    };

    let message = err.to_string();
    assert!(message.starts_with("rustc compilation failed:\n"));
    assert!(message.ends_with(stderr));
    assert!(err.is_toolchain());
    assert!(!err.is_configuration());
  }

  #[test]
  fn test_classification() {
    let err = GraftError::PolicyAlreadySet {
      unit: UnitId::new("Main"),
    };
    assert!(err.is_configuration());
    assert!(err.to_string().starts_with("configuration error:"));

    let err = GraftError::UnmappedType {
      ty: ForeignType::parse("String"),
    };
    assert!(!err.is_configuration());
    assert!(!err.is_toolchain());
    assert_eq!(err.to_string(), "unmapped foreign type: 'String'");
  }
}
