//! Embedded web component support for the webweft server runtime.
//!
//! Exposes server-side components as custom elements embeddable in a
//! host page, with typed properties flowing both ways:
//!
//! - `PropertyType` / `PropertyValue`: the closed set of property types
//!   a component may expose, and their values
//! - `WebComponentDefinition`: mutable per-tag property declaration,
//!   frozen into an immutable `WebComponentConfiguration`
//! - `WebComponentExporter`: ties a custom-element tag to a backing
//!   component type; recorded as an `ExporterEntry` and constructed
//!   lazily
//! - `WebComponentConfigurationRegistry`: write-once, deployment-wide
//!   tag lookup
//! - `WebComponentBinding`: one live component instance with its bound
//!   property values and change handlers
//!
//! # Example
//!
//! ```rust
//! use webweft_component::{
//!     PropertyType, PropertyValue, Result, WebComponentDefinition,
//! };
//!
//! #[derive(Default)]
//! struct Counter {
//!     count: i32,
//! }
//!
//! let mut definition = WebComponentDefinition::<Counter>::new("my-counter");
//! definition
//!     .add_property("count", PropertyType::Integer, Some(0.into()))?
//!     .on_change(|counter, value| {
//!         if let Some(PropertyValue::Integer(n)) = value {
//!             counter.count = *n;
//!         }
//!     });
//! let configuration = definition.freeze();
//!
//! let mut binding = configuration.create_binding(|| Some(Counter::default()))?;
//! binding.update_property("count", Some(7.into()))?;
//! assert_eq!(binding.component().count, 7);
//! # Ok::<(), webweft_component::WebComponentError>(())
//! ```

mod binding;
mod config;
mod error;
mod exporter;
mod property;
mod registry;

pub use binding::{ChangeHandler, PropertyBinding, WebComponentBinding};
pub use config::{
    ErasedConfiguration, InstanceConfigurator, PropertyHandle, WebComponentConfiguration,
    WebComponentDefinition,
};
pub use error::{Result, WebComponentError};
pub use exporter::{AppAnnotation, ExporterEntry, WebComponentExporter};
pub use property::{PropertyData, PropertyType, PropertyValue};
pub use registry::WebComponentConfigurationRegistry;
