use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Characters that never need surrounding whitespace in a type expression.
const TIGHT_PUNCTUATION: &[char] = &['<', '>', ',', '(', ')', '[', ']', '&', '*', ';', ':', '='];

/// A foreign (Rust) type expression in normalised spelling.
///
/// Whitespace is collapsed and dropped next to punctuation, so `Vec < u8 >`
/// and `Vec<u8>` name the same type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct ForeignType(String);

impl ForeignType {
  pub fn parse(text: &str) -> Self {
    Self(normalize(text))
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }

  pub fn is_unit(&self) -> bool {
    self.0 == "()"
  }

  /// Splits a raw pointer type into its pointee and mutability.
  ///
  /// `*const T` yields `(T, false)`, `*mut T` yields `(T, true)`.
  pub fn pointee(&self) -> Option<(ForeignType, bool)> {
    let rest = self.0.strip_prefix('*')?;

    if let Some(inner) = strip_keyword(rest, "const") {
      return Some((ForeignType::parse(inner), false));
    }

    strip_keyword(rest, "mut").map(|inner| (ForeignType::parse(inner), true))
  }
}

/// Strips `keyword` from `text` when it stands alone. Normalization drops the
/// space before punctuation, so `*const ()` is stored as `*const()`.
fn strip_keyword<'a>(
  text: &'a str,
  keyword: &str,
) -> Option<&'a str> {
  let rest = text.strip_prefix(keyword)?;

  match rest.chars().next() {
    Some(c) if c.is_alphanumeric() || c == '_' => None,
    Some(_) => Some(rest.trim_start()),
    None => None,
  }
}

impl From<String> for ForeignType {
  fn from(value: String) -> Self {
    Self::parse(&value)
  }
}

impl From<&str> for ForeignType {
  fn from(value: &str) -> Self {
    Self::parse(value)
  }
}

impl From<ForeignType> for String {
  fn from(value: ForeignType) -> Self {
    value.0
  }
}

impl Display for ForeignType {
  fn fmt(
    &self,
    f: &mut std::fmt::Formatter<'_>,
  ) -> std::fmt::Result {
    write!(f, "{}", self.0)
  }
}

/// Host-side representation a foreign type translates to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HostType(String);

impl HostType {
  pub fn new(name: impl Into<String>) -> Self {
    Self(name.into())
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl Display for HostType {
  fn fmt(
    &self,
    f: &mut std::fmt::Formatter<'_>,
  ) -> std::fmt::Result {
    write!(f, "{}", self.0)
  }
}

fn normalize(text: &str) -> String {
  let mut out = String::with_capacity(text.len());
  let mut pending_space = false;

  for c in text.trim().chars() {
    if c.is_whitespace() {
      pending_space = true;
      continue;
    }

    if pending_space {
      let prev_tight = out.chars().last().map(|p| TIGHT_PUNCTUATION.contains(&p)).unwrap_or(true);
      if !prev_tight && !TIGHT_PUNCTUATION.contains(&c) {
        out.push(' ');
      }
      pending_space = false;
    }

    out.push(c);
  }

  out
}
