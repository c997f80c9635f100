//! Turns a unit's fragments and dependencies into a crate on disk.

use crate::registry::Dependency;

pub const PACKAGE_NAME: &str = "graft-quasiquote";
pub const PACKAGE_VERSION: &str = "0.1.0";
pub const LIB_NAME: &str = "quasiquote";
pub const SOURCE_FILE_NAME: &str = "quasiquote.rs";
pub const MANIFEST_FILE_NAME: &str = "Cargo.toml";

/// Concatenates fragments in registration order, one per line.
pub fn build_source_text(fragments: &[String]) -> String {
  let mut source = String::with_capacity(fragments.iter().map(|f| f.len() + 1).sum());

  for fragment in fragments {
    source.push_str(fragment);
    source.push('\n');
  }

  source
}

/// Source line that makes a dependency visible to the compiler.
pub fn dependency_fragment(name: &str) -> String {
  format!("extern crate {};", name.replace('-', "_"))
}

/// One `[name]` table of a manifest. Entries keep insertion order and
/// repeated keys.
#[derive(Debug, Clone, PartialEq)]
pub struct ManifestSection {
  pub name: String,
  pub entries: Vec<(String, toml::Value)>,
}

impl ManifestSection {
  pub fn entry(
    &mut self,
    key: impl Into<String>,
    value: impl Into<toml::Value>,
  ) -> &mut Self {
    self.entries.push((key.into(), value.into()));
    self
  }

  fn render(
    &self,
    out: &mut String,
  ) {
    out.push('[');
    out.push_str(&self.name);
    out.push_str("]\n");

    for (key, value) in &self.entries {
      out.push_str(&render_key(key));
      out.push_str(" = ");
      out.push_str(&render_value(value));
      out.push('\n');
    }
  }
}

/// Ordered sections rendered to TOML text at the boundary.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ManifestDocument {
  sections: Vec<ManifestSection>,
}

impl ManifestDocument {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn section(
    &mut self,
    name: impl Into<String>,
  ) -> &mut ManifestSection {
    self.sections.push(ManifestSection {
      name: name.into(),
      entries: Vec::new(),
    });

    let last = self.sections.len() - 1;
    &mut self.sections[last]
  }

  pub fn sections(&self) -> &[ManifestSection] {
    &self.sections
  }

  pub fn render(&self) -> String {
    let mut out = String::new();

    for (i, section) in self.sections.iter().enumerate() {
      if i > 0 {
        out.push('\n');
      }
      section.render(&mut out);
    }

    out
  }
}

/// Manifest of the synthesized crate: fixed package identity, every
/// dependency verbatim, and a static-archive library target.
pub fn build_manifest(
  dependencies: &[Dependency],
  edition: Option<&str>,
) -> ManifestDocument {
  let mut doc = ManifestDocument::new();

  let package = doc.section("package");
  package.entry("name", PACKAGE_NAME).entry("version", PACKAGE_VERSION);
  if let Some(edition) = edition {
    package.entry("edition", edition);
  }

  let deps = doc.section("dependencies");
  for dependency in dependencies {
    deps.entry(dependency.name.as_str(), dependency.version.as_str());
  }

  doc
    .section("lib")
    .entry("name", LIB_NAME)
    .entry("path", SOURCE_FILE_NAME)
    .entry("crate-type", vec![toml::Value::from("staticlib")]);

  doc
}

fn is_bare_key(key: &str) -> bool {
  !key.is_empty() && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

fn render_key(key: &str) -> String {
  if is_bare_key(key) {
    key.to_string()
  } else {
    toml::Value::from(key).to_string()
  }
}

fn render_value(value: &toml::Value) -> String {
  match value {
    toml::Value::Array(items) => {
      let items: Vec<String> = items.iter().map(render_value).collect();
      format!("[{}]", items.join(", "))
    },
    other => other.to_string(),
  }
}

#[cfg(test)]
mod tests {
  use insta::assert_snapshot;

  use super::*;

  fn fragments(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
  }

  #[test]
  fn test_source_text_one_fragment_per_line() {
    let source = build_source_text(&fragments(&[
      "extern crate rand;",
      "#[no_mangle] pub extern \"C\" fn add(a: i32, b: i32) -> i32 { a + b }",
      "fn helper() {}",
    ]));

    assert_snapshot!(source, @r#"
    extern crate rand;
    #[no_mangle] pub extern "C" fn add(a: i32, b: i32) -> i32 { a + b }
    fn helper() {}
    "#);
  }

  #[test]
  fn test_source_text_preserves_every_fragment_in_order() {
    let input = fragments(&["fn c() {}", "fn a() {}", "fn b() {}", "fn a() {}"]);
    let source = build_source_text(&input);

    let lines: Vec<&str> = source.lines().collect();
    assert_eq!(lines, vec!["fn c() {}", "fn a() {}", "fn b() {}", "fn a() {}"]);
    assert!(source.ends_with('\n'));
  }

  #[test]
  fn test_source_text_empty() {
    assert_eq!(build_source_text(&[]), "");
  }

  #[test]
  fn test_dependency_fragment_uses_crate_name() {
    assert_eq!(dependency_fragment("rand"), "extern crate rand;");
    assert_eq!(dependency_fragment("serde-json"), "extern crate serde_json;");
  }

  #[test]
  fn test_manifest_layout() {
    let deps = vec![Dependency::new("rand", "0.3"), Dependency::new("libc", "0.1")];
    let manifest = build_manifest(&deps, None).render();

    assert_snapshot!(manifest, @r#"
    [package]
    name = "graft-quasiquote"
    version = "0.1.0"

    [dependencies]
    rand = "0.3"
    libc = "0.1"

    [lib]
    name = "quasiquote"
    path = "quasiquote.rs"
    crate-type = ["staticlib"]
    "#);
  }

  #[test]
  fn test_manifest_lists_every_dependency() {
    let deps = vec![Dependency::new("libc", "0.1"), Dependency::new("rand", "0.3")];
    let manifest = build_manifest(&deps, Some("2021")).render();

    let lines: Vec<&str> = manifest.lines().collect();
    assert!(lines.contains(&"rand = \"0.3\""));
    assert!(lines.contains(&"libc = \"0.1\""));
    assert!(lines.contains(&"edition = \"2021\""));
  }

  #[test]
  fn test_manifest_escapes_special_values() {
    let deps = vec![Dependency::new("weird crate", "=1.0 \"pre\" \\ x")];
    let manifest = build_manifest(&deps, None).render();

    let parsed: toml::Table = toml::from_str(&manifest).unwrap();
    let version = parsed["dependencies"]["weird crate"].as_str().unwrap();
    assert_eq!(version, "=1.0 \"pre\" \\ x");
    assert_eq!(parsed["lib"]["crate-type"][0].as_str(), Some("staticlib"));
  }

  #[test]
  fn test_manifest_round_trips_through_toml() {
    let deps = vec![Dependency::new("rand", "0.3")];
    let parsed: toml::Table = toml::from_str(&build_manifest(&deps, Some("2018")).render()).unwrap();

    assert_eq!(parsed["package"]["name"].as_str(), Some(PACKAGE_NAME));
    assert_eq!(parsed["package"]["edition"].as_str(), Some("2018"));
    assert_eq!(parsed["lib"]["path"].as_str(), Some(SOURCE_FILE_NAME));
  }
}
