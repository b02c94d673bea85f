//! Live property bindings between a client custom element and a
//! server-side component instance.

use std::collections::BTreeMap;

use crate::error::{Result, WebComponentError};
use crate::property::{PropertyData, PropertyValue};

/// Callback invoked with the component instance and the new value whenever
/// a bound property changes.
pub type ChangeHandler<C> = std::sync::Arc<dyn Fn(&mut C, Option<&PropertyValue>) + Send + Sync>;

/// Value holder for one property of one component instance.
///
/// Tracks the current value against the property descriptor and notifies
/// the change handler on real changes only: writing an equal value
/// (including null over null) is a no-op, writing a mismatched type is an
/// error that leaves the previous value untouched, and writing to a
/// read-only property is dropped with a warning because stale client state
/// can legitimately attempt it.
pub struct PropertyBinding<C> {
    data: PropertyData,
    value: Option<PropertyValue>,
    listener: Option<ChangeHandler<C>>,
}

impl<C> PropertyBinding<C> {
    /// Create a binding seeded with the descriptor's default value.
    pub fn new(data: PropertyData, listener: Option<ChangeHandler<C>>) -> Self {
        let value = data.default_value().cloned();
        PropertyBinding {
            data,
            value,
            listener,
        }
    }

    /// The property descriptor.
    pub fn data(&self) -> &PropertyData {
        &self.data
    }

    /// The current value; `None` is null.
    pub fn value(&self) -> Option<&PropertyValue> {
        self.value.as_ref()
    }

    /// Apply an external (client-driven) update.
    pub fn update(&mut self, component: &mut C, value: Option<PropertyValue>) -> Result<()> {
        if let Some(offered) = &value {
            if offered.kind() != self.data.kind() {
                return Err(WebComponentError::PropertyTypeMismatch {
                    name: self.data.name().to_string(),
                    expected: self.data.kind(),
                    actual: offered.kind(),
                });
            }
        }

        if self.data.is_read_only() {
            tracing::warn!(
                property = self.data.name(),
                "ignoring write to read-only property"
            );
            return Ok(());
        }

        if self.value == value {
            return Ok(());
        }

        self.value = value;
        self.notify(component);
        Ok(())
    }

    /// Deliver the initial default value, firing the change handler exactly
    /// once even when the value equals the type's natural default.
    /// Default-value initialization is accepted for read-only properties.
    pub(crate) fn notify_initial(&mut self, component: &mut C) {
        self.value = self.data.default_value().cloned();
        self.notify(component);
    }

    fn notify(&self, component: &mut C) {
        if let Some(listener) = &self.listener {
            listener(component, self.value.as_ref());
        }
    }
}

/// The bindings of one exported component instance.
///
/// Owns the live component and one [`PropertyBinding`] per configured
/// property. Created exactly once per embedded custom element; it is not
/// reusable across instances.
pub struct WebComponentBinding<C> {
    tag: String,
    component: C,
    bindings: BTreeMap<String, PropertyBinding<C>>,
}

impl<C> WebComponentBinding<C> {
    pub(crate) fn new(tag: String, component: C) -> Self {
        WebComponentBinding {
            tag,
            component,
            bindings: BTreeMap::new(),
        }
    }

    pub(crate) fn insert(&mut self, binding: PropertyBinding<C>) {
        self.bindings
            .insert(binding.data().name().to_string(), binding);
    }

    /// Push every property's default once, in name order.
    pub(crate) fn deliver_initial_values(&mut self) {
        for binding in self.bindings.values_mut() {
            binding.notify_initial(&mut self.component);
        }
    }

    /// The custom-element tag this binding serves.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Apply a client-driven property update.
    pub fn update_property(&mut self, name: &str, value: Option<PropertyValue>) -> Result<()> {
        let Some(binding) = self.bindings.get_mut(name) else {
            return Err(WebComponentError::NoSuchProperty {
                tag: self.tag.clone(),
                name: name.to_string(),
            });
        };
        binding.update(&mut self.component, value)
    }

    /// Current value of a bound property; `None` for unknown names and for
    /// null values alike — check [`WebComponentBinding::has_property`] to
    /// tell them apart.
    pub fn property_value(&self, name: &str) -> Option<&PropertyValue> {
        self.bindings.get(name).and_then(|binding| binding.value())
    }

    /// Whether the property is bound.
    pub fn has_property(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    /// The live component instance.
    pub fn component(&self) -> &C {
        &self.component
    }

    /// Mutable access to the live component instance.
    pub fn component_mut(&mut self) -> &mut C {
        &mut self.component
    }
}
