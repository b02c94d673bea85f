//! Per-tag configuration of an exported component's properties.
//!
//! An exporter fills in a mutable [`WebComponentDefinition`], which is then
//! frozen into an immutable, shareable [`WebComponentConfiguration`] — the
//! same mutate-then-publish shape the route registry uses for its
//! snapshots. The frozen configuration is what instantiates bound
//! components at embed time.

use std::any::Any;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::binding::{ChangeHandler, PropertyBinding, WebComponentBinding};
use crate::error::{Result, WebComponentError};
use crate::property::{PropertyData, PropertyType, PropertyValue};

/// One-shot hook invoked right after the backing component instance is
/// created, before any property value is delivered to it.
pub type InstanceConfigurator<C> = Arc<dyn Fn(&mut C) + Send + Sync>;

struct PropertyEntry<C> {
    data: PropertyData,
    handler: Option<ChangeHandler<C>>,
}

/// Mutable property-set declaration for one custom-element tag.
pub struct WebComponentDefinition<C> {
    tag: String,
    properties: BTreeMap<String, PropertyEntry<C>>,
    configurator: Option<InstanceConfigurator<C>>,
}

impl<C> WebComponentDefinition<C> {
    /// Start a definition for the given tag.
    pub fn new(tag: impl Into<String>) -> Self {
        WebComponentDefinition {
            tag: tag.into(),
            properties: BTreeMap::new(),
            configurator: None,
        }
    }

    /// Declare a property. Fails on a duplicate name or on a default value
    /// whose type does not match the declared one. The returned handle
    /// chains the optional change handler and read-only flag.
    pub fn add_property(
        &mut self,
        name: impl Into<String>,
        kind: PropertyType,
        default: Option<PropertyValue>,
    ) -> Result<PropertyHandle<'_, C>> {
        let name = name.into();
        if self.properties.contains_key(&name) {
            return Err(WebComponentError::DuplicateProperty {
                tag: self.tag.clone(),
                name,
            });
        }

        let data = PropertyData::new(name.clone(), kind, default)?;
        let entry = self.properties.entry(name).or_insert(PropertyEntry {
            data,
            handler: None,
        });
        Ok(PropertyHandle { entry })
    }

    /// Store the instance configurator. The last one set wins.
    pub fn set_instance_configurator(&mut self, configurator: impl Fn(&mut C) + Send + Sync + 'static) {
        self.configurator = Some(Arc::new(configurator));
    }

    /// Freeze into an immutable configuration.
    pub fn freeze(self) -> WebComponentConfiguration<C> {
        WebComponentConfiguration {
            tag: self.tag,
            properties: self.properties,
            configurator: self.configurator,
        }
    }
}

/// Builder handle for one just-declared property.
pub struct PropertyHandle<'a, C> {
    entry: &'a mut PropertyEntry<C>,
}

impl<C> PropertyHandle<'_, C> {
    /// Attach the change handler invoked with the component instance and
    /// the new value.
    pub fn on_change(
        self,
        handler: impl Fn(&mut C, Option<&PropertyValue>) + Send + Sync + 'static,
    ) -> Self {
        self.entry.handler = Some(Arc::new(handler));
        self
    }

    /// Mark the property read-only: external writes are dropped, the
    /// initial default delivery still goes through.
    pub fn read_only(self) -> Self {
        self.entry.data.make_read_only();
        self
    }
}

/// Immutable property configuration for one custom-element tag.
pub struct WebComponentConfiguration<C> {
    tag: String,
    properties: BTreeMap<String, PropertyEntry<C>>,
    configurator: Option<InstanceConfigurator<C>>,
}

impl<C> WebComponentConfiguration<C> {
    /// The custom-element tag this configuration describes.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Whether the property is declared. Unknown names are not errors.
    pub fn has_property(&self, name: &str) -> bool {
        self.properties.contains_key(name)
    }

    /// The declared type of the property, or `None` for unknown names.
    pub fn property_type(&self, name: &str) -> Option<PropertyType> {
        self.properties.get(name).map(|entry| entry.data.kind())
    }

    /// Descriptors of every declared property, in name order.
    pub fn property_data(&self) -> Vec<PropertyData> {
        self.properties
            .values()
            .map(|entry| entry.data.clone())
            .collect()
    }

    /// Instantiate the backing component and bind it.
    ///
    /// Runs the instance configurator (if any) exactly once, builds one
    /// [`PropertyBinding`] per declared property wired to this instance's
    /// change handler, and pushes every property's default once — each
    /// handler fires once during creation even when the default equals the
    /// type's natural default. Every call creates an independent binding.
    pub fn create_binding(
        &self,
        instantiator: impl FnOnce() -> Option<C>,
    ) -> Result<WebComponentBinding<C>> {
        let mut component = instantiator().ok_or_else(|| {
            WebComponentError::InstantiationFailed {
                tag: self.tag.clone(),
            }
        })?;

        if let Some(configurator) = &self.configurator {
            configurator(&mut component);
        }

        let mut binding = WebComponentBinding::new(self.tag.clone(), component);
        for entry in self.properties.values() {
            binding.insert(PropertyBinding::new(
                entry.data.clone(),
                entry.handler.clone(),
            ));
        }
        binding.deliver_initial_values();
        Ok(binding)
    }
}

/// Type-erased view of a configuration, as stored by the exporter
/// registry. Downcast with [`ErasedConfiguration::as_any`] to reach
/// [`WebComponentConfiguration::create_binding`] for the concrete
/// component type.
pub trait ErasedConfiguration: Send + Sync {
    /// The custom-element tag.
    fn tag(&self) -> &str;

    /// Whether the property is declared.
    fn has_property(&self, name: &str) -> bool;

    /// The declared type of the property, or `None` for unknown names.
    fn property_type(&self, name: &str) -> Option<PropertyType>;

    /// Descriptors of every declared property.
    fn property_data(&self) -> Vec<PropertyData>;

    /// Downcast hook.
    fn as_any(&self) -> &dyn Any;
}

impl<C: 'static> ErasedConfiguration for WebComponentConfiguration<C> {
    fn tag(&self) -> &str {
        WebComponentConfiguration::tag(self)
    }

    fn has_property(&self, name: &str) -> bool {
        WebComponentConfiguration::has_property(self, name)
    }

    fn property_type(&self, name: &str) -> Option<PropertyType> {
        WebComponentConfiguration::property_type(self, name)
    }

    fn property_data(&self) -> Vec<PropertyData> {
        WebComponentConfiguration::property_data(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
