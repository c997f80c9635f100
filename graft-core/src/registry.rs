//! Per-unit fragment registry.
//!
//! A registry starts `Uninitialized`. The first mutating call creates the
//! unit state (with the default policy unless one is given) and schedules
//! the finalize hook; from then on it is `Collecting`. [`UnitRegistry::finalize`]
//! consumes the registry, so a unit is finalized at most once.

use std::fmt::Display;
use std::path::PathBuf;
use std::rc::Rc;

use graft_config::{DebugTrace, GraftConfig};
use graft_log::trace_dbg;
use graft_types::{ForeignType, HostType, TypeContext};
use serde::{Deserialize, Serialize};

use crate::error::GraftError;
use crate::synth::dependency_fragment;

/// Identity of a compilation unit, usually its module name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnitId(String);

impl UnitId {
  pub fn new(name: impl Into<String>) -> Self {
    Self(name.into())
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl From<&str> for UnitId {
  fn from(value: &str) -> Self {
    Self::new(value)
  }
}

impl From<String> for UnitId {
  fn from(value: String) -> Self {
    Self(value)
  }
}

impl Display for UnitId {
  fn fmt(
    &self,
    f: &mut std::fmt::Formatter<'_>,
  ) -> std::fmt::Result {
    write!(f, "{}", self.0)
  }
}

/// A crate the synthesized source depends on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dependency {
  pub name: String,
  pub version: String,
}

impl Dependency {
  pub fn new(
    name: impl Into<String>,
    version: impl Into<String>,
  ) -> Self {
    Self {
      name: name.into(),
      version: version.into(),
    }
  }
}

/// Everything registered for one unit so far.
#[derive(Debug, Clone)]
pub struct UnitState {
  policy: TypeContext,
  fragments: Vec<String>,
  /// Declaration order; repeated names are kept as declared.
  dependencies: Vec<Dependency>,
}

impl UnitState {
  fn new(policy: TypeContext) -> Self {
    Self {
      policy,
      fragments: Vec::new(),
      dependencies: Vec::new(),
    }
  }

  pub fn policy(&self) -> &TypeContext {
    &self.policy
  }

  /// Fragments in registration order.
  pub fn fragments(&self) -> &[String] {
    &self.fragments
  }

  pub fn dependencies(&self) -> &[Dependency] {
    &self.dependencies
  }

  pub fn has_dependencies(&self) -> bool {
    !self.dependencies.is_empty()
  }
}

/// Runs once the unit is complete. Returns the registered artifact.
pub type FinalizeHook = Box<dyn FnOnce(&UnitId, UnitState) -> Result<PathBuf, GraftError>>;

/// Produces the finalize hook for a unit at the moment its state is created.
pub type HookScheduler = Rc<dyn Fn(&UnitId) -> FinalizeHook>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
  Uninitialized,
  Collecting,
}

struct Collecting {
  state: UnitState,
  on_finalize: FinalizeHook,
}

pub struct UnitRegistry {
  unit: UnitId,
  config: Rc<GraftConfig>,
  default_policy: TypeContext,
  schedule: HookScheduler,
  collecting: Option<Collecting>,
}

impl UnitRegistry {
  pub fn new(
    unit: UnitId,
    config: Rc<GraftConfig>,
    default_policy: TypeContext,
    schedule: HookScheduler,
  ) -> Self {
    Self {
      unit,
      config,
      default_policy,
      schedule,
      collecting: None,
    }
  }

  pub fn unit(&self) -> &UnitId {
    &self.unit
  }

  pub fn phase(&self) -> Phase {
    if self.collecting.is_some() {
      Phase::Collecting
    } else {
      Phase::Uninitialized
    }
  }

  pub fn state(&self) -> Option<&UnitState> {
    self.collecting.as_ref().map(|c| &c.state)
  }

  /// Returns the unit state, creating it on first use.
  ///
  /// `policy_override` fixes the policy at creation; passing one once the
  /// state exists is a configuration error.
  pub fn ensure(
    &mut self,
    policy_override: Option<TypeContext>,
  ) -> Result<&mut UnitState, GraftError> {
    if self.collecting.is_some() && policy_override.is_some() {
      return Err(GraftError::PolicyAlreadySet {
        unit: self.unit.clone(),
      });
    }

    Ok(self.collect(policy_override))
  }

  pub fn set_policy(
    &mut self,
    policy: TypeContext,
  ) -> Result<(), GraftError> {
    self.ensure(Some(policy)).map(|_| ())
  }

  pub fn append_fragment(
    &mut self,
    text: impl Into<String>,
  ) {
    let text = text.into();
    trace_dbg!(&self.config, DebugTrace::Registry, "{}: fragment of {} bytes", self.unit, text.len());

    self.collect(None).fragments.push(text);
  }

  /// Records a crate dependency and emits its `extern crate` declaration.
  pub fn declare_dependency(
    &mut self,
    name: impl Into<String>,
    version: impl Into<String>,
  ) {
    let dependency = Dependency::new(name, version);
    trace_dbg!(
      &self.config,
      DebugTrace::Registry,
      "{}: dependency {} = {}",
      self.unit,
      dependency.name,
      dependency.version
    );

    let state = self.collect(None);
    state.fragments.push(dependency_fragment(&dependency.name));
    state.dependencies.push(dependency);
  }

  pub fn query_policy(
    &mut self,
    ty: &ForeignType,
  ) -> Result<HostType, GraftError> {
    self
      .collect(None)
      .policy
      .lookup(ty)
      .ok_or_else(|| GraftError::UnmappedType { ty: ty.clone() })
  }

  /// Runs the scheduled hook on the final state.
  ///
  /// A registry that never collected anything builds nothing and yields `None`.
  pub fn finalize(self) -> Result<Option<PathBuf>, GraftError> {
    match self.collecting {
      None => {
        trace_dbg!(&self.config, DebugTrace::Registry, "{}: nothing registered", self.unit);
        Ok(None)
      },
      Some(Collecting { state, on_finalize }) => {
        trace_dbg!(
          &self.config,
          DebugTrace::Registry,
          "{}: finalizing {} fragments, {} dependencies",
          self.unit,
          state.fragments.len(),
          state.dependencies.len()
        );
        on_finalize(&self.unit, state).map(Some)
      },
    }
  }

  fn collect(
    &mut self,
    policy_override: Option<TypeContext>,
  ) -> &mut UnitState {
    let unit = &self.unit;
    let config = &self.config;
    let default_policy = &self.default_policy;
    let schedule = &self.schedule;

    let collecting = self.collecting.get_or_insert_with(|| {
      trace_dbg!(config, DebugTrace::Registry, "{}: state created", unit);

      Collecting {
        state: UnitState::new(policy_override.unwrap_or_else(|| default_policy.clone())),
        on_finalize: schedule(unit),
      }
    });

    &mut collecting.state
  }
}
