//! Error types for the router layer.
//!
//! Configuration errors are fatal to deployment and name both sides of a
//! conflict; state errors are programmer-contract violations on frozen
//! structures. Lookup misses are never errors.

use thiserror::Error;
use webweft_kernel::{ClassRef, ParameterKind};

use crate::path::{PathError, RoutePath};

/// Errors raised by route registration and route-target mutation.
#[derive(Debug, Error)]
pub enum RouterError {
    /// Two unrelated classes claim the same path.
    #[error(
        "path '{path}' already maps to navigation target '{existing}'; \
         cannot also register unrelated target '{offered}'"
    )]
    AmbiguousRoute {
        path: RoutePath,
        existing: ClassRef,
        offered: ClassRef,
    },

    /// Two unrelated classes claim the same parameter slot on one path.
    #[error(
        "a {kind}-parameter navigation target '{existing}' is already \
         registered; cannot also register '{offered}'"
    )]
    AmbiguousRouteTarget {
        kind: ParameterKind,
        existing: ClassRef,
        offered: ClassRef,
    },

    /// Two unrelated classes claim to handle the same exception type.
    #[error(
        "exception '{exception}' is already handled by error target \
         '{existing}'; cannot also register unrelated target '{offered}'"
    )]
    AmbiguousErrorTarget {
        exception: ClassRef,
        existing: ClassRef,
        offered: ClassRef,
    },

    /// Mutation attempted on a published (frozen) route target.
    #[error("route target is immutable; it has been published to a registry snapshot")]
    ImmutableRouteTarget,

    /// Parent layouts set for a class never registered on the target.
    #[error("navigation target '{target}' is not registered on this route target")]
    TargetNotRegistered { target: ClassRef },

    /// Path failed validation.
    #[error(transparent)]
    Path(#[from] PathError),
}

/// Result type alias for router operations.
pub type Result<T> = std::result::Result<T, RouterError>;
