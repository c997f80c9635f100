use std::cell::RefCell;
use std::collections::HashSet;
use std::path::PathBuf;
use std::rc::Rc;

use graft_config::{DebugTrace, GraftConfig};
use graft_log::{phase_log, phase_ok, trace_dbg};
use graft_types::TypeContext;

use crate::build::{BuildInvoker, BuildJob, SystemRunner, ToolRunner};
use crate::error::GraftError;
use crate::link::{ArtifactKind, ArtifactLinker};
use crate::registry::{FinalizeHook, HookScheduler, UnitId, UnitRegistry, UnitState};

/// One run over any number of compilation units.
///
/// Each unit gets its own [`UnitRegistry`]; the session only shares the
/// configuration, the build invoker and the linker between them.
pub struct Session<L: ArtifactLinker + 'static> {
  config: Rc<GraftConfig>,
  default_policy: TypeContext,
  invoker: Rc<BuildInvoker>,
  linker: Rc<RefCell<L>>,
  opened: HashSet<UnitId>,
}

impl<L: ArtifactLinker + 'static> Session<L> {
  pub fn new(
    config: GraftConfig,
    linker: L,
  ) -> Self {
    Self::with_runner(config, linker, SystemRunner)
  }

  pub fn with_runner(
    config: GraftConfig,
    linker: L,
    runner: impl ToolRunner + 'static,
  ) -> Self {
    let config = Rc::new(config);
    let invoker = BuildInvoker::new(config.clone(), Box::new(runner));

    Self {
      config,
      default_policy: TypeContext::basic(),
      invoker: Rc::new(invoker),
      linker: Rc::new(RefCell::new(linker)),
      opened: HashSet::new(),
    }
  }

  /// Policy for units that never set their own.
  pub fn with_default_policy(
    mut self,
    policy: TypeContext,
  ) -> Self {
    self.default_policy = policy;
    self
  }

  pub fn config(&self) -> &GraftConfig {
    &self.config
  }

  /// Snapshot of the linker. The live linker is only borrowed while a unit
  /// is being finalized, so snapshots can be held across `finish_unit`.
  pub fn linker(&self) -> L
  where
    L: Clone,
  {
    self.linker.borrow().clone()
  }

  /// Hands out the registry of `unit`. Each unit can be opened once.
  pub fn open_unit(
    &mut self,
    unit: impl Into<UnitId>,
  ) -> Result<UnitRegistry, GraftError> {
    let unit = unit.into();

    if !self.opened.insert(unit.clone()) {
      return Err(GraftError::UnitAlreadyOpen { unit });
    }

    trace_dbg!(&self.config, DebugTrace::Registry, "opened unit {}", unit);

    Ok(UnitRegistry::new(
      unit,
      self.config.clone(),
      self.default_policy.clone(),
      self.scheduler(),
    ))
  }

  /// Finalizes a unit: builds its fragments and registers the archive.
  pub fn finish_unit(
    &self,
    registry: UnitRegistry,
  ) -> Result<Option<PathBuf>, GraftError> {
    registry.finalize()
  }

  fn scheduler(&self) -> HookScheduler {
    let config = self.config.clone();
    let invoker = self.invoker.clone();
    let linker = self.linker.clone();

    Rc::new(move |_unit: &UnitId| -> FinalizeHook {
      let config = config.clone();
      let invoker = invoker.clone();
      let linker = linker.clone();

      Box::new(move |unit: &UnitId, state: UnitState| -> Result<PathBuf, GraftError> {
        let mut linker = linker.borrow_mut();
        finalize_unit(&config, &invoker, &mut *linker, unit, state)
      })
    })
  }
}

/// Synthesizes, builds and links one finished unit.
pub(crate) fn finalize_unit(
  config: &GraftConfig,
  invoker: &BuildInvoker,
  linker: &mut dyn ArtifactLinker,
  unit: &UnitId,
  state: UnitState,
) -> Result<PathBuf, GraftError> {
  phase_log!(config, indent = 0, "Grafting {}", unit);

  let job = BuildJob::from_state(&state, config)?;
  let artifact = invoker.build(&job)?;

  linker.register_artifact(ArtifactKind::RawObject, &artifact);
  trace_dbg!(config, DebugTrace::Link, "{}: registered {}", unit, artifact.display());

  phase_ok!(config, "Built {}", artifact.display());

  Ok(artifact)
}
