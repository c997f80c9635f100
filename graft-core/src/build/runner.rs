use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::Command;

/// A fully described toolchain invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
  pub program: String,
  pub args: Vec<OsString>,
  pub envs: Vec<(String, OsString)>,
  pub current_dir: Option<PathBuf>,
}

impl ToolCommand {
  pub fn new(program: impl Into<String>) -> Self {
    Self {
      program: program.into(),
      args: Vec::new(),
      envs: Vec::new(),
      current_dir: None,
    }
  }

  pub fn arg(
    mut self,
    arg: impl AsRef<OsStr>,
  ) -> Self {
    self.args.push(arg.as_ref().to_os_string());
    self
  }

  pub fn args<I, S>(
    mut self,
    args: I,
  ) -> Self
  where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
  {
    self.args.extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
    self
  }

  pub fn env(
    mut self,
    key: impl Into<String>,
    value: impl AsRef<OsStr>,
  ) -> Self {
    self.envs.push((key.into(), value.as_ref().to_os_string()));
    self
  }

  pub fn current_dir(
    mut self,
    dir: &Path,
  ) -> Self {
    self.current_dir = Some(dir.to_path_buf());
    self
  }

  /// Arguments as (lossy) strings, for logs and assertions.
  pub fn arg_strings(&self) -> Vec<String> {
    self.args.iter().map(|a| a.to_string_lossy().into_owned()).collect()
  }

  /// Value following `flag` in the argument list, e.g. the path after `-o`.
  pub fn arg_after(
    &self,
    flag: &str,
  ) -> Option<&OsStr> {
    let pos = self.args.iter().position(|a| a == flag)?;
    self.args.get(pos + 1).map(|a| a.as_os_str())
  }

  pub fn display(&self) -> String {
    let mut line = self.program.clone();
    for arg in self.arg_strings() {
      line.push(' ');
      line.push_str(&arg);
    }
    line
  }
}

/// Captured result of a finished toolchain process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutput {
  pub success: bool,
  /// `None` when the process was terminated by a signal.
  pub code: Option<i32>,
  pub stdout: String,
  pub stderr: String,
}

impl ToolOutput {
  pub fn success() -> Self {
    Self {
      success: true,
      code: Some(0),
      stdout: String::new(),
      stderr: String::new(),
    }
  }

  pub fn failure(
    code: i32,
    stderr: impl Into<String>,
  ) -> Self {
    Self {
      success: false,
      code: Some(code),
      stdout: String::new(),
      stderr: stderr.into(),
    }
  }
}

impl From<std::process::Output> for ToolOutput {
  fn from(output: std::process::Output) -> Self {
    Self {
      success: output.status.success(),
      code: output.status.code(),
      stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
      stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    }
  }
}

/// Runs a toolchain command to completion. Blocks until the process exits.
pub trait ToolRunner {
  fn run(
    &self,
    command: &ToolCommand,
  ) -> std::io::Result<ToolOutput>;
}

/// Spawns real processes.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl ToolRunner for SystemRunner {
  fn run(
    &self,
    command: &ToolCommand,
  ) -> std::io::Result<ToolOutput> {
    let mut cmd = Command::new(&command.program);
    cmd.args(&command.args);

    for (key, value) in &command.envs {
      cmd.env(key, value);
    }

    if let Some(dir) = &command.current_dir {
      cmd.current_dir(dir);
    }

    cmd.output().map(ToolOutput::from)
  }
}
