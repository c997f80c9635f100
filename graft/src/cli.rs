use std::path::PathBuf;

use clap::{ColorChoice, Parser, Subcommand, ValueEnum};
use graft_config::DebugTrace;

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
pub enum DebugTraceCli {
  /// Registry lifecycle: state creation, fragments, dependencies
  Registry,
  /// Source and manifest synthesis
  Synth,
  /// Toolchain invocations
  Build,
  /// Artifact registration
  Link,
}

impl From<DebugTraceCli> for DebugTrace {
  fn from(value: DebugTraceCli) -> DebugTrace {
    match value {
      DebugTraceCli::Registry => DebugTrace::Registry,
      DebugTraceCli::Synth => DebugTrace::Synth,
      DebugTraceCli::Build => DebugTrace::Build,
      DebugTraceCli::Link => DebugTrace::Link,
    }
  }
}

#[derive(Parser, Debug, Clone, PartialEq)]
pub struct BuildCommand {
  /// Unit files to build, one compilation unit each
  #[arg(required = true)]
  pub units: Vec<PathBuf>,

  /// Write the collected artifacts as JSON to this file
  #[arg(long)]
  pub link_plan: Option<PathBuf>,
}

#[derive(Parser, Debug, Clone, PartialEq)]
pub struct SynthCommand {
  /// Unit file to synthesize
  pub unit: PathBuf,

  /// Also print the manifest (units with dependencies only)
  #[arg(long)]
  pub manifest: bool,
}

#[derive(Parser, Debug, Clone, PartialEq)]
pub struct LookupCommand {
  /// Unit file whose policy is used
  pub unit: PathBuf,

  /// Foreign type expression, e.g. "*const u8"
  #[arg(name = "TYPE")]
  pub ty: String,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum SubCommand {
  /// Build units into static archives
  Build(BuildCommand),
  /// Print the synthesized source of a unit without building it
  Synth(SynthCommand),
  /// Translate a foreign type under a unit's policy
  Lookup(LookupCommand),
}

#[derive(Parser, Debug, Clone, PartialEq)]
#[command(
  name = "graft",
  version,
  about = "Build Rust fragments into linkable static archives",
  color = ColorChoice::Auto
)]
pub struct Cli {
  #[command(subcommand)]
  pub subcommand: SubCommand,

  /// Path to graft.toml (default: ./graft.toml when present)
  #[arg(long, global = true)]
  pub config: Option<PathBuf>,

  /// Enable every debug trace
  #[arg(long, global = true)]
  pub debug: bool,

  /// Enable debug traces for specific components
  #[arg(long = "debug-trace", value_enum, global = true)]
  pub debug_trace: Vec<DebugTraceCli>,

  /// Print only errors
  #[arg(short, long, global = true)]
  pub quiet: bool,

  /// Increase verbosity (-v, -vv, -vvv)
  #[arg(short, long, action = clap::ArgAction::Count, global = true)]
  pub verbose: u8,
}
