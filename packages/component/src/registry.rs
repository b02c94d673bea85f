//! Write-once registry of exported web components.
//!
//! The exporter set is installed exactly once per deployment; later
//! attempts are quietly ignored so that racing bootstrap paths cannot
//! overwrite each other. Per-tag configurations are built lazily on first
//! lookup and cached, so an exporter whose tag is never embedded is never
//! constructed.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;

use parking_lot::FairMutex;

use webweft_kernel::DeploymentContext;

use crate::config::ErasedConfiguration;
use crate::error::{Result, WebComponentError};
use crate::exporter::{AppAnnotation, ExporterEntry};

enum RegistryState {
    Unset,
    Set {
        entries: HashMap<String, ExporterEntry>,
        cache: HashMap<String, Arc<dyn ErasedConfiguration>>,
        annotations: HashMap<String, AppAnnotation>,
    },
}

/// Deployment-wide registry mapping custom-element tags to their frozen
/// configurations.
pub struct WebComponentConfigurationRegistry {
    state: FairMutex<RegistryState>,
}

impl WebComponentConfigurationRegistry {
    pub fn new() -> Self {
        WebComponentConfigurationRegistry {
            state: FairMutex::new(RegistryState::Unset),
        }
    }

    /// The registry instance stored in the deployment context, created on
    /// first access.
    pub fn get_instance(context: &DeploymentContext) -> Arc<Self> {
        context.attribute_or_insert_with(WebComponentConfigurationRegistry::new)
    }

    /// Install the exporter set. Only the first successful call takes
    /// effect; later calls return `Ok(false)` without touching the stored
    /// set. Validation failures leave the registry unset so a corrected
    /// set can still be installed.
    pub fn set_exporters(&self, exporters: Vec<ExporterEntry>) -> Result<bool> {
        let mut state = self.state.lock();
        if let RegistryState::Set { .. } = *state {
            return Ok(false);
        }

        let mut entries: HashMap<String, ExporterEntry> = HashMap::new();
        let mut annotations: HashMap<String, (AppAnnotation, &'static str)> = HashMap::new();
        for exporter in exporters {
            for annotation in exporter.annotations() {
                match annotations.entry(annotation.kind.clone()) {
                    Entry::Vacant(slot) => {
                        slot.insert((annotation.clone(), exporter.exporter_name()));
                    }
                    Entry::Occupied(slot) => {
                        let (existing, declared_by) = slot.get();
                        if existing != annotation {
                            return Err(WebComponentError::ConflictingAnnotations {
                                kind: annotation.kind.clone(),
                                first: declared_by.to_string(),
                                second: exporter.exporter_name().to_string(),
                            });
                        }
                    }
                }
            }
            match entries.entry(exporter.tag().to_string()) {
                Entry::Vacant(slot) => {
                    slot.insert(exporter);
                }
                Entry::Occupied(slot) => {
                    return Err(WebComponentError::DuplicateTag {
                        tag: exporter.tag().to_string(),
                        first: slot.get().exporter_name().to_string(),
                        second: exporter.exporter_name().to_string(),
                    });
                }
            }
        }

        tracing::debug!(tags = entries.len(), "installing web component exporters");
        *state = RegistryState::Set {
            entries,
            cache: HashMap::new(),
            annotations: annotations
                .into_iter()
                .map(|(kind, (annotation, _))| (kind, annotation))
                .collect(),
        };
        Ok(true)
    }

    /// The configuration for a tag, building and caching it on first use.
    /// `None` when the registry is unset or the tag is unknown.
    pub fn configuration(&self, tag: &str) -> Result<Option<Arc<dyn ErasedConfiguration>>> {
        let mut state = self.state.lock();
        let RegistryState::Set { entries, cache, .. } = &mut *state else {
            return Ok(None);
        };
        if let Some(config) = cache.get(tag) {
            return Ok(Some(Arc::clone(config)));
        }
        let Some(entry) = entries.get(tag) else {
            return Ok(None);
        };
        let config = entry.build()?;
        cache.insert(tag.to_string(), Arc::clone(&config));
        Ok(Some(config))
    }

    /// All configurations, forcing any not yet built. Sorted by tag.
    pub fn configurations(&self) -> Result<Vec<Arc<dyn ErasedConfiguration>>> {
        let mut state = self.state.lock();
        let RegistryState::Set { entries, cache, .. } = &mut *state else {
            return Ok(Vec::new());
        };
        let mut tags: Vec<&String> = entries.keys().collect();
        tags.sort();
        let mut configs = Vec::with_capacity(tags.len());
        for tag in tags {
            let config = match cache.get(tag) {
                Some(config) => Arc::clone(config),
                None => {
                    let built = entries[tag].build()?;
                    cache.insert(tag.clone(), Arc::clone(&built));
                    built
                }
            };
            configs.push(config);
        }
        Ok(configs)
    }

    /// Whether any exporter set has been installed.
    pub fn has_exporters(&self) -> bool {
        matches!(*self.state.lock(), RegistryState::Set { .. })
    }

    /// The application annotation of the given kind, if any exporter
    /// contributed one.
    pub fn app_annotation(&self, kind: &str) -> Option<AppAnnotation> {
        match &*self.state.lock() {
            RegistryState::Set { annotations, .. } => annotations.get(kind).cloned(),
            RegistryState::Unset => None,
        }
    }
}

impl Default for WebComponentConfigurationRegistry {
    fn default() -> Self {
        WebComponentConfigurationRegistry::new()
    }
}
