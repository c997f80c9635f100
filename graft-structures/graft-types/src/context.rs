use std::rc::Rc;

use crate::foreign::{ForeignType, HostType};

/// Primitive mappings of the basic context, foreign spelling first.
const PRIMITIVES: &[(&str, &str)] = &[
  ("i8", "int8_t"),
  ("i16", "int16_t"),
  ("i32", "int32_t"),
  ("i64", "int64_t"),
  ("u8", "uint8_t"),
  ("u16", "uint16_t"),
  ("u32", "uint32_t"),
  ("u64", "uint64_t"),
  ("isize", "ptrdiff_t"),
  ("usize", "size_t"),
  ("f32", "float"),
  ("f64", "double"),
  ("bool", "bool"),
  ("char", "uint32_t"),
  ("()", "void"),
];

/// One translation rule of a [`TypeContext`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeRule {
  /// Maps exactly one foreign type.
  Exact { foreign: ForeignType, host: HostType },
  /// Maps `*const T` / `*mut T` whenever the whole context maps `T`.
  RawPointer,
}

/// Immutable type-translation policy.
///
/// Rules are consulted in order and the first one that answers wins, which
/// makes [`TypeContext::compose`] left-biased. Clones share the rule list.
#[derive(Debug, Clone)]
pub struct TypeContext {
  rules: Rc<[TypeRule]>,
}

impl Default for TypeContext {
  fn default() -> Self {
    Self::from_rules(Vec::new())
  }
}

impl TypeContext {
  /// The context that maps nothing. Identity element of `compose`.
  pub fn empty() -> Self {
    Self::default()
  }

  /// Fixed-width numbers, `bool`, `char`, unit and raw pointers.
  pub fn basic() -> Self {
    let mut rules: Vec<TypeRule> = PRIMITIVES
      .iter()
      .map(|(foreign, host)| TypeRule::Exact {
        foreign: ForeignType::parse(foreign),
        host: HostType::new(*host),
      })
      .collect();
    rules.push(TypeRule::RawPointer);

    Self::from_rules(rules)
  }

  pub fn from_rules(rules: Vec<TypeRule>) -> Self {
    Self { rules: rules.into() }
  }

  /// Exact-match table, e.g. from a `[types]` section of a unit file.
  pub fn from_pairs<I, F, H>(pairs: I) -> Self
  where
    I: IntoIterator<Item = (F, H)>,
    F: AsRef<str>,
    H: Into<String>,
  {
    Self::from_rules(
      pairs
        .into_iter()
        .map(|(foreign, host)| TypeRule::Exact {
          foreign: ForeignType::parse(foreign.as_ref()),
          host: HostType::new(host),
        })
        .collect(),
    )
  }

  /// Combines two contexts; `self` is consulted before `other`.
  pub fn compose(
    &self,
    other: &TypeContext,
  ) -> TypeContext {
    if other.rules.is_empty() {
      return self.clone();
    }
    if self.rules.is_empty() {
      return other.clone();
    }

    Self::from_rules(self.rules.iter().chain(other.rules.iter()).cloned().collect())
  }

  pub fn lookup(
    &self,
    ty: &ForeignType,
  ) -> Option<HostType> {
    self.rules.iter().find_map(|rule| self.apply(rule, ty))
  }

  pub fn rules(&self) -> &[TypeRule] {
    &self.rules
  }

  pub fn is_empty(&self) -> bool {
    self.rules.is_empty()
  }

  fn apply(
    &self,
    rule: &TypeRule,
    ty: &ForeignType,
  ) -> Option<HostType> {
    match rule {
      TypeRule::Exact { foreign, host } => (foreign == ty).then(|| host.clone()),
      TypeRule::RawPointer => {
        let (pointee, mutable) = ty.pointee()?;
        let inner = self.lookup(&pointee)?;

        if mutable {
          Some(HostType::new(format!("{}*", inner)))
        } else {
          Some(HostType::new(format!("const {}*", inner)))
        }
      },
    }
  }
}
