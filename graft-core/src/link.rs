use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// How the host should incorporate a produced artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ArtifactKind {
  /// Native object or static archive handed to the linker as-is.
  RawObject,
}

/// The host's object-inclusion mechanism.
pub trait ArtifactLinker {
  fn register_artifact(
    &mut self,
    kind: ArtifactKind,
    path: &Path,
  );
}

/// Artifacts collected across the units of one run, in registration order.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkPlan {
  /// Raw objects / static archives to pass to the final link.
  pub objects: Vec<PathBuf>,
}

impl LinkPlan {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn is_empty(&self) -> bool {
    self.objects.is_empty()
  }

  /// Linker arguments for the collected artifacts.
  pub fn link_args(&self) -> Vec<String> {
    self.objects.iter().map(|p| p.display().to_string()).collect()
  }

  pub fn to_json(&self) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(self)
  }
}

impl ArtifactLinker for LinkPlan {
  fn register_artifact(
    &mut self,
    kind: ArtifactKind,
    path: &Path,
  ) {
    match kind {
      ArtifactKind::RawObject => {
        if !self.objects.iter().any(|existing| existing == path) {
          self.objects.push(path.to_path_buf());
        }
      },
    }
  }
}

/// `"<tool> <action> failed:\n<stderr>"`, stderr untouched.
pub fn format_tool_error(
  tool: &str,
  action: &str,
  stderr: &str,
) -> String {
  format!("{} {} failed:\n{}", tool, action, stderr)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_link_plan_keeps_order_without_duplicates() {
    let mut plan = LinkPlan::new();
    plan.register_artifact(ArtifactKind::RawObject, Path::new("/tmp/graft-b.a"));
    plan.register_artifact(ArtifactKind::RawObject, Path::new("/tmp/graft-a.a"));
    plan.register_artifact(ArtifactKind::RawObject, Path::new("/tmp/graft-b.a"));

    assert_eq!(
      plan.objects,
      vec![PathBuf::from("/tmp/graft-b.a"), PathBuf::from("/tmp/graft-a.a")]
    );
    assert_eq!(plan.link_args(), vec!["/tmp/graft-b.a", "/tmp/graft-a.a"]);
  }

  #[test]
  fn test_link_plan_json() {
    let mut plan = LinkPlan::new();
    assert!(plan.is_empty());
    plan.register_artifact(ArtifactKind::RawObject, Path::new("/tmp/graft-x.a"));

    let json = plan.to_json().unwrap();
    let back: LinkPlan = serde_json::from_str(&json).unwrap();
    assert_eq!(back, plan);
    assert!(json.contains("/tmp/graft-x.a"));
  }

  #[test]
  fn test_format_tool_error_is_verbatim() {
    let message = format_tool_error("cargo", "build", "  error: x  \n");
    assert_eq!(message, "cargo build failed:\n  error: x  \n");
  }
}
