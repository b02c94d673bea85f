//! Kernel types shared by the webweft server runtime.
//!
//! The class-scanning phase of a deployment runs outside this workspace; it
//! hands over everything it found as opaque descriptors:
//!
//! - `ClassRef`: an interned class descriptor with an explicit subtype
//!   relation, replacing reflective class objects
//! - `ParameterKind`: the URL-parameter arity a navigation target declares
//! - `DeploymentContext`: per-deployment attribute storage where the
//!   registries live (first caller constructs, everyone else shares)

mod class;
mod context;

pub use class::{ClassBuilder, ClassRef, ParameterKind};
pub use context::DeploymentContext;
