mod cli;
mod unit;

use std::fmt;
use std::path::{Path, PathBuf};

use clap::Parser as ClapParser;
use colored::Colorize;
use graft_config::{ConfigError, GraftConfig, GraftConfigFile};
use graft_core::{BuildJob, GraftError, LinkPlan, Session};
use graft_log::log_dbg;
use graft_types::ForeignType;

use cli::{BuildCommand, Cli, LookupCommand, SubCommand, SynthCommand};
use unit::{UnitFile, UnitFileError};

const CONFIG_FILE_NAME: &str = "graft.toml";

enum CliError {
  Config(ConfigError),
  Unit(UnitFileError),
  Graft(GraftError),
  LinkPlan { path: PathBuf, message: String },
}

impl fmt::Display for CliError {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    match self {
      CliError::Config(e) => write!(f, "{}", e),
      CliError::Unit(e) => write!(f, "{}", e),
      CliError::Graft(e) => write!(f, "{}", e),
      CliError::LinkPlan { path, message } => {
        write!(f, "failed to write link plan '{}': {}", path.display(), message)
      },
    }
  }
}

impl From<ConfigError> for CliError {
  fn from(e: ConfigError) -> Self {
    CliError::Config(e)
  }
}

impl From<UnitFileError> for CliError {
  fn from(e: UnitFileError) -> Self {
    CliError::Unit(e)
  }
}

impl From<GraftError> for CliError {
  fn from(e: GraftError) -> Self {
    CliError::Graft(e)
  }
}

/// Explicit `--config`, else `./graft.toml` when present, else defaults.
fn load_config_file(cli: &Cli) -> Result<GraftConfigFile, ConfigError> {
  if let Some(path) = &cli.config {
    return GraftConfigFile::load(path);
  }

  let local = Path::new(CONFIG_FILE_NAME);
  if local.exists() {
    return GraftConfigFile::load(local);
  }

  Ok(GraftConfigFile::default())
}

fn parse_cli_to_config(cli: &Cli) -> Result<GraftConfig, ConfigError> {
  let mut file = load_config_file(cli)?;
  file.toolchain.apply_env();

  Ok(GraftConfig::new(
    cli.debug,
    cli.debug_trace.iter().copied().map(Into::into).collect(),
    cli.quiet,
    cli.verbose,
    file.toolchain,
  ))
}

fn run_build(
  config: GraftConfig,
  build: &BuildCommand,
) -> Result<(), CliError> {
  let units = build
    .units
    .iter()
    .map(|path| UnitFile::load(path))
    .collect::<Result<Vec<_>, _>>()?;

  let mut session = Session::new(config, LinkPlan::new());

  for unit in &units {
    let mut registry = session.open_unit(unit.name.as_str())?;
    unit.register(&mut registry)?;

    match session.finish_unit(registry)? {
      Some(artifact) => println!("{}", artifact.display()),
      None => log_dbg!(session.config(), "{}: nothing to build", unit.name),
    }
  }

  if let Some(path) = &build.link_plan {
    let json = session.linker().to_json().map_err(|e| CliError::LinkPlan {
      path: path.clone(),
      message: e.to_string(),
    })?;

    std::fs::write(path, json).map_err(|e| CliError::LinkPlan {
      path: path.clone(),
      message: e.to_string(),
    })?;
  }

  Ok(())
}

fn run_synth(
  config: GraftConfig,
  synth: &SynthCommand,
) -> Result<(), CliError> {
  let unit = UnitFile::load(&synth.unit)?;

  let mut session = Session::new(config, LinkPlan::new());
  let mut registry = session.open_unit(unit.name.as_str())?;
  unit.register(&mut registry)?;

  // Dropping the registry unfinalized discards it without building.
  let Some(state) = registry.state() else {
    return Ok(());
  };

  let job = BuildJob::with_work_root(state, session.config(), PathBuf::new());
  print!("{}", job.source);

  if synth.manifest {
    if let Some(manifest) = &job.manifest {
      println!();
      print!("{}", manifest);
    }
  }

  Ok(())
}

fn run_lookup(
  config: GraftConfig,
  lookup: &LookupCommand,
) -> Result<(), CliError> {
  let unit = UnitFile::load(&lookup.unit)?;

  let mut session = Session::new(config, LinkPlan::new());
  let mut registry = session.open_unit(unit.name.as_str())?;
  if let Some(policy) = unit.policy() {
    registry.set_policy(policy)?;
  }

  let host = registry.query_policy(&ForeignType::parse(&lookup.ty))?;
  println!("{}", host);

  Ok(())
}

fn run(cli: &Cli) -> Result<(), CliError> {
  let config = parse_cli_to_config(cli)?;

  match &cli.subcommand {
    SubCommand::Build(build) => run_build(config, build),
    SubCommand::Synth(synth) => run_synth(config, synth),
    SubCommand::Lookup(lookup) => run_lookup(config, lookup),
  }
}

fn main() {
  let cli = Cli::parse();

  if let Err(e) = run(&cli) {
    eprintln!("{} {}", "Error:".red().bold(), e);
    std::process::exit(1);
  }
}
