//! Exporter declarations.
//!
//! An exporter ties a custom-element tag to a backing component type and
//! declares that tag's properties. Exporters are cheap descriptors: the
//! registry records an [`ExporterEntry`] per tag and defers the actual
//! `new` + `configure` + freeze work until the tag's configuration is
//! first requested.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::{ErasedConfiguration, WebComponentDefinition};
use crate::error::Result;

/// Application-level annotation contributed by an exporter, keyed by kind.
/// Two exporters may contribute the same kind only with structurally equal
/// values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppAnnotation {
    pub kind: String,
    pub value: serde_json::Value,
}

impl AppAnnotation {
    pub fn new(kind: impl Into<String>, value: serde_json::Value) -> Self {
        AppAnnotation {
            kind: kind.into(),
            value,
        }
    }
}

/// Declares one embeddable web component.
pub trait WebComponentExporter: Send + Sync + 'static {
    /// The backing component type instantiated per embedded element.
    type Component: 'static;

    /// The custom-element tag this exporter serves.
    const TAG: &'static str;

    /// Construct the exporter. Called lazily, at most once per registry.
    fn new() -> Self;

    /// Application-level annotations this exporter contributes.
    fn app_annotations() -> Vec<AppAnnotation> {
        Vec::new()
    }

    /// Declare the tag's properties and hooks on the definition.
    fn configure(&self, definition: &mut WebComponentDefinition<Self::Component>) -> Result<()>;
}

/// Registry-side record of one exporter: the tag, its annotations, and a
/// deferred builder producing the frozen configuration.
pub struct ExporterEntry {
    tag: &'static str,
    exporter_name: &'static str,
    annotations: Vec<AppAnnotation>,
    builder: Box<dyn Fn() -> Result<Arc<dyn ErasedConfiguration>> + Send + Sync>,
}

impl ExporterEntry {
    /// Record the exporter type `E` without instantiating it.
    pub fn of<E: WebComponentExporter>() -> Self {
        ExporterEntry {
            tag: E::TAG,
            exporter_name: std::any::type_name::<E>(),
            annotations: E::app_annotations(),
            builder: Box::new(|| {
                let exporter = E::new();
                let mut definition = WebComponentDefinition::new(E::TAG);
                exporter.configure(&mut definition)?;
                Ok(Arc::new(definition.freeze()) as Arc<dyn ErasedConfiguration>)
            }),
        }
    }

    pub fn tag(&self) -> &'static str {
        self.tag
    }

    /// The exporter's type name, used in conflict diagnostics.
    pub fn exporter_name(&self) -> &'static str {
        self.exporter_name
    }

    pub fn annotations(&self) -> &[AppAnnotation] {
        &self.annotations
    }

    pub(crate) fn build(&self) -> Result<Arc<dyn ErasedConfiguration>> {
        (self.builder)()
    }
}

impl std::fmt::Debug for ExporterEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExporterEntry")
            .field("tag", &self.tag)
            .field("exporter", &self.exporter_name)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::property::PropertyType;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static CONSTRUCTED: AtomicUsize = AtomicUsize::new(0);

    #[derive(Default)]
    struct Gauge;

    struct GaugeExporter;

    impl WebComponentExporter for GaugeExporter {
        type Component = Gauge;
        const TAG: &'static str = "app-gauge";

        fn new() -> Self {
            CONSTRUCTED.fetch_add(1, Ordering::SeqCst);
            GaugeExporter
        }

        fn configure(&self, definition: &mut WebComponentDefinition<Gauge>) -> Result<()> {
            definition.add_property("level", PropertyType::Double, Some(0.0.into()))?;
            Ok(())
        }
    }

    #[test]
    fn entry_records_tag_without_constructing_the_exporter() {
        CONSTRUCTED.store(0, Ordering::SeqCst);
        let entry = ExporterEntry::of::<GaugeExporter>();
        assert_eq!(entry.tag(), "app-gauge");
        assert_eq!(CONSTRUCTED.load(Ordering::SeqCst), 0);

        let config = entry.build().unwrap();
        assert_eq!(CONSTRUCTED.load(Ordering::SeqCst), 1);
        assert_eq!(config.property_type("level"), Some(PropertyType::Double));
    }
}
