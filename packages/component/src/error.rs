//! Error types for the web component layer.

use thiserror::Error;

use crate::property::PropertyType;

/// Errors raised by web component configuration, binding and the exporter
/// registry.
#[derive(Debug, Error)]
pub enum WebComponentError {
    /// A property name was declared twice within one configuration.
    #[error("property '{name}' is already defined for tag <{tag}>")]
    DuplicateProperty { tag: String, name: String },

    /// A default value does not match the declared property type.
    #[error(
        "default value for property '{name}' has type {actual}, \
         but the property is declared as {expected}"
    )]
    DefaultTypeMismatch {
        name: String,
        expected: PropertyType,
        actual: PropertyType,
    },

    /// A delivered value does not match the declared property type.
    #[error(
        "value offered to property '{name}' has type {actual}, \
         but the property is declared as {expected}"
    )]
    PropertyTypeMismatch {
        name: String,
        expected: PropertyType,
        actual: PropertyType,
    },

    /// An update was delivered for a property the binding does not have.
    #[error("no property '{name}' is bound for tag <{tag}>")]
    NoSuchProperty { tag: String, name: String },

    /// The component instantiator produced no instance.
    #[error("failed to instantiate component for tag <{tag}>")]
    InstantiationFailed { tag: String },

    /// Two exporters claim the same custom-element tag.
    #[error("tag <{tag}> is exported by both '{first}' and '{second}'")]
    DuplicateTag {
        tag: String,
        first: String,
        second: String,
    },

    /// An application-level annotation differs between exporters.
    #[error(
        "annotation '{kind}' must be identical on every exporter; \
         '{first}' and '{second}' declare different values"
    )]
    ConflictingAnnotations {
        kind: String,
        first: String,
        second: String,
    },
}

/// Result type alias for web component operations.
pub type Result<T> = std::result::Result<T, WebComponentError>;
