//! Accumulates Rust fragments for a compilation unit and builds them into a
//! static archive the host links as a raw object.
//!
//! A [`Session`] hands out one [`UnitRegistry`] per compilation unit. The
//! front end appends fragments, declares crate dependencies and queries the
//! type-translation policy while it walks the unit; finalizing the registry
//! synthesizes the crate, runs `rustc` (or `cargo` when dependencies were
//! declared) and registers the produced archive with the linker.

pub mod build;
mod error;
pub mod link;
pub mod registry;
mod session;
pub mod synth;

pub use build::{BuildInvoker, BuildJob, BuildStrategy, SystemRunner, ToolCommand, ToolOutput, ToolRunner};
pub use error::GraftError;
pub use link::{ArtifactKind, ArtifactLinker, LinkPlan};
pub use registry::{Dependency, FinalizeHook, HookScheduler, Phase, UnitId, UnitRegistry, UnitState};
pub use session::Session;
