#![allow(dead_code)]

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use graft_config::{GraftConfig, ToolchainConfig};
use graft_core::build::static_archive_name;
use graft_core::synth::LIB_NAME;
use graft_core::{ToolCommand, ToolOutput, ToolRunner};
use tempfile::TempDir;

pub const ARCHIVE_BYTES: &[u8] = b"!<arch>\n";

/// What the stub does when invoked.
#[derive(Debug, Clone)]
pub enum StubBehavior {
  /// Exit 0 without touching the filesystem.
  Succeed,
  /// Exit 0 and write an archive where the toolchain would.
  SucceedWithArchive,
  /// Exit with `code` and print `stderr`.
  Fail { code: i32, stderr: String },
  /// The program cannot be spawned.
  Missing,
}

/// A recorded invocation, with the files the toolchain would have read.
#[derive(Debug, Clone)]
pub struct Invocation {
  pub command: ToolCommand,
  pub source: Option<String>,
  pub manifest: Option<String>,
}

#[derive(Clone)]
pub struct StubRunner {
  behavior: StubBehavior,
  pub calls: Rc<RefCell<Vec<Invocation>>>,
}

impl StubRunner {
  pub fn new(behavior: StubBehavior) -> Self {
    Self {
      behavior,
      calls: Rc::default(),
    }
  }

  pub fn failing(stderr: &str) -> Self {
    Self::new(StubBehavior::Fail {
      code: 1,
      stderr: stderr.to_string(),
    })
  }

  pub fn invocations(&self) -> Vec<Invocation> {
    self.calls.borrow().clone()
  }
}

fn manifest_path(command: &ToolCommand) -> Option<PathBuf> {
  command
    .arg_strings()
    .iter()
    .find_map(|a| a.strip_prefix("--manifest-path=").map(PathBuf::from))
}

fn target_dir(command: &ToolCommand) -> Option<PathBuf> {
  command
    .envs
    .iter()
    .find(|(key, _)| key == "CARGO_TARGET_DIR")
    .map(|(_, value)| PathBuf::from(value))
}

/// Input source of a direct compile: the `.rs` argument.
fn direct_source(command: &ToolCommand) -> Option<PathBuf> {
  command
    .arg_strings()
    .iter()
    .find(|a| a.ends_with(".rs"))
    .map(PathBuf::from)
}

impl ToolRunner for StubRunner {
  fn run(
    &self,
    command: &ToolCommand,
  ) -> std::io::Result<ToolOutput> {
    let manifest_path = manifest_path(command);

    let source_path = match &manifest_path {
      Some(manifest) => manifest.parent().map(|dir| dir.join("quasiquote.rs")),
      None => direct_source(command),
    };

    self.calls.borrow_mut().push(Invocation {
      command: command.clone(),
      source: source_path.and_then(|p| std::fs::read_to_string(p).ok()),
      manifest: manifest_path.and_then(|p| std::fs::read_to_string(p).ok()),
    });

    match &self.behavior {
      StubBehavior::Succeed => Ok(ToolOutput::success()),
      StubBehavior::SucceedWithArchive => {
        if let Some(target) = target_dir(command) {
          let release = target.join("release");
          std::fs::create_dir_all(&release)?;
          std::fs::write(release.join(static_archive_name(LIB_NAME)), ARCHIVE_BYTES)?;
        } else if let Some(out) = command.arg_after("-o") {
          std::fs::write(out, ARCHIVE_BYTES)?;
        }
        Ok(ToolOutput::success())
      },
      StubBehavior::Fail { code, stderr } => Ok(ToolOutput::failure(*code, stderr.clone())),
      StubBehavior::Missing => Err(std::io::Error::new(std::io::ErrorKind::NotFound, "program not found")),
    }
  }
}

/// Quiet config whose temporary files land in `temp`.
pub fn test_config(temp: &Path) -> GraftConfig {
  GraftConfig {
    quiet: true,
    toolchain: ToolchainConfig {
      temp_dir: Some(temp.to_path_buf()),
      ..ToolchainConfig::default()
    },
    ..GraftConfig::default()
  }
}

pub fn scratch() -> TempDir {
  TempDir::new().expect("failed to create temp dir")
}
