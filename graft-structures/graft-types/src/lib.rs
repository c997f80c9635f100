//! Type-translation policy shared between the front end and the build core.
//!
//! A front end hands foreign (Rust) type expressions to the core; the core
//! asks the active [`TypeContext`] which host type represents each of them.

pub mod context;
pub mod foreign;

pub use context::{TypeContext, TypeRule};
pub use foreign::{ForeignType, HostType};
