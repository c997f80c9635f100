//! Runs the external toolchain over a synthesized crate.
//!
//! Two strategies, picked by whether the unit declared dependencies:
//!
//! ```text
//! Direct    rustc --crate-type=staticlib [extra...] <tmp>.rs -o <tmp>.a
//! Manifest  cargo rustc --release --manifest-path=<dir>/Cargo.toml -- [extra...]
//!           <dir>/target/release/libquasiquote.a  ->  <tmp>.a
//! ```

mod runner;
pub mod temp;

use std::path::PathBuf;
use std::rc::Rc;

use graft_config::{DebugTrace, GraftConfig};
use graft_log::{log_dbg, log_trc, phase_log, trace_dbg};

pub use runner::{SystemRunner, ToolCommand, ToolOutput, ToolRunner};
pub use temp::{static_archive_name, TempFiles, WorkDir};

use crate::error::GraftError;
use crate::registry::UnitState;
use crate::synth::{self, LIB_NAME, MANIFEST_FILE_NAME, SOURCE_FILE_NAME};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildStrategy {
  /// Single compiler invocation on one source file.
  Direct,
  /// Package-tool build of a generated crate with dependencies.
  Manifest,
}

/// One build of one unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildJob {
  pub source: String,
  /// Present exactly when the unit declared dependencies.
  pub manifest: Option<String>,
  pub extra_args: Vec<String>,
  /// Directory the manifest build's working directory is created in.
  pub work_root: PathBuf,
}

impl BuildJob {
  /// Synthesizes the job for a finished unit.
  pub fn from_state(
    state: &UnitState,
    config: &GraftConfig,
  ) -> Result<Self, GraftError> {
    let work_root = std::env::current_dir().map_err(|e| GraftError::io(".", e))?;
    Ok(Self::with_work_root(state, config, work_root))
  }

  pub fn with_work_root(
    state: &UnitState,
    config: &GraftConfig,
    work_root: PathBuf,
  ) -> Self {
    let toolchain = &config.toolchain;
    let source = synth::build_source_text(state.fragments());

    let manifest = state
      .has_dependencies()
      .then(|| synth::build_manifest(state.dependencies(), toolchain.edition.as_deref()).render());

    trace_dbg!(
      config,
      DebugTrace::Synth,
      "{} source lines, manifest: {}",
      state.fragments().len(),
      manifest.is_some()
    );

    Self {
      source,
      manifest,
      extra_args: toolchain.extra_args.clone(),
      work_root,
    }
  }

  pub fn strategy(&self) -> BuildStrategy {
    if self.manifest.is_some() {
      BuildStrategy::Manifest
    } else {
      BuildStrategy::Direct
    }
  }
}

pub struct BuildInvoker {
  config: Rc<GraftConfig>,
  runner: Box<dyn ToolRunner>,
  temp: TempFiles,
}

impl BuildInvoker {
  pub fn new(
    config: Rc<GraftConfig>,
    runner: Box<dyn ToolRunner>,
  ) -> Self {
    let temp = TempFiles::from_toolchain(&config.toolchain);
    Self { config, runner, temp }
  }

  pub fn temp_files(&self) -> &TempFiles {
    &self.temp
  }

  /// Builds the job and returns the path of the produced static archive.
  ///
  /// Blocks until the toolchain exits. The archive is owned by the caller.
  pub fn build(
    &self,
    job: &BuildJob,
  ) -> Result<PathBuf, GraftError> {
    log_dbg!(&self.config, "build strategy {:?}", job.strategy());

    match &job.manifest {
      None => self.build_direct(job),
      Some(manifest) => self.build_with_manifest(job, manifest),
    }
  }

  fn build_direct(
    &self,
    job: &BuildJob,
  ) -> Result<PathBuf, GraftError> {
    let toolchain = &self.config.toolchain;

    let source = self.temp.source_file(&job.source)?;
    let artifact = self.temp.artifact_path()?;

    let mut command = ToolCommand::new(&toolchain.rustc).arg("--crate-type=staticlib");
    if let Some(edition) = &toolchain.edition {
      command = command.arg(format!("--edition={}", edition));
    }
    let command = command.args(&job.extra_args).arg(source.path()).arg("-o").arg(artifact.as_os_str());

    phase_log!(
      &self.config,
      "Compiling {} -> {}",
      source.path().display(),
      artifact.display()
    );

    self.run_tool(&command, "compilation")?;

    TempFiles::hand_off(artifact)
  }

  fn build_with_manifest(
    &self,
    job: &BuildJob,
    manifest: &str,
  ) -> Result<PathBuf, GraftError> {
    let toolchain = &self.config.toolchain;

    let work = self
      .temp
      .work_dir(&job.work_root, toolchain.work_dir, &toolchain.work_dir_name)?;
    let source_path = work.path().join(SOURCE_FILE_NAME);
    let manifest_path = work.path().join(MANIFEST_FILE_NAME);
    let target_dir = work.path().join("target");

    std::fs::write(&source_path, &job.source).map_err(|e| GraftError::io(&source_path, e))?;
    std::fs::write(&manifest_path, manifest).map_err(|e| GraftError::io(&manifest_path, e))?;
    log_trc!(&self.config, "manifest {}:\n{}", manifest_path.display(), manifest);

    let command = ToolCommand::new(&toolchain.cargo)
      .arg("rustc")
      .arg("--release")
      .arg(format!("--manifest-path={}", manifest_path.display()))
      .arg("--")
      .args(&job.extra_args)
      .env("CARGO_TARGET_DIR", &target_dir);

    phase_log!(&self.config, "Building {}", manifest_path.display());

    self.run_tool(&command, "build")?;

    let built = target_dir.join("release").join(static_archive_name(LIB_NAME));
    let artifact = self.temp.relocate(&built)?;

    trace_dbg!(
      &self.config,
      DebugTrace::Build,
      "moved {} -> {}",
      built.display(),
      artifact.display()
    );

    work.remove()?;

    Ok(artifact)
  }

  fn run_tool(
    &self,
    command: &ToolCommand,
    action: &'static str,
  ) -> Result<ToolOutput, GraftError> {
    trace_dbg!(&self.config, DebugTrace::Build, "{}", command.display());

    let output = self.runner.run(command).map_err(|source| GraftError::Spawn {
      tool: command.program.clone(),
      source,
    })?;

    if !output.success {
      trace_dbg!(&self.config, DebugTrace::Build, "{} exited with {:?}", command.program, output.code);

      return Err(GraftError::ToolchainFailed {
        tool: command.program.clone(),
        action,
        stderr: output.stderr,
      });
    }

    Ok(output)
  }
}
