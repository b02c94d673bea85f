//! Deployment-context attribute storage.
//!
//! Registries are singletons per deployment, looked up and stored as
//! context attributes. The first caller constructs the instance; every
//! later caller gets the same `Arc`. The check-then-act runs entirely
//! under the context monitor, so two racing callers can never both
//! construct.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

/// Per-deployment attribute storage keyed by attribute type.
///
/// # Example
///
/// ```rust
/// use webweft_kernel::DeploymentContext;
///
/// struct MyRegistry;
///
/// let context = DeploymentContext::new();
/// let first = context.attribute_or_insert_with(|| MyRegistry);
/// let second = context.attribute_or_insert_with(|| MyRegistry);
/// assert!(std::sync::Arc::ptr_eq(&first, &second));
/// ```
#[derive(Default)]
pub struct DeploymentContext {
    attributes: Mutex<HashMap<TypeId, Arc<dyn Any + Send + Sync>>>,
}

impl DeploymentContext {
    /// Create an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the attribute of type `T`, if one has been stored.
    pub fn attribute<T: Send + Sync + 'static>(&self) -> Option<Arc<T>> {
        let attributes = self.attributes.lock();
        attributes
            .get(&TypeId::of::<T>())
            .cloned()
            .and_then(|attribute| attribute.downcast::<T>().ok())
    }

    /// Look up the attribute of type `T`, constructing and storing it with
    /// `init` if absent. First caller wins; `init` runs at most once per
    /// type for the lifetime of the context.
    pub fn attribute_or_insert_with<T: Send + Sync + 'static>(
        &self,
        init: impl FnOnce() -> T,
    ) -> Arc<T> {
        let mut attributes = self.attributes.lock();
        if let Some(existing) = attributes.get(&TypeId::of::<T>()) {
            if let Ok(existing) = existing.clone().downcast::<T>() {
                return existing;
            }
        }
        let created = Arc::new(init());
        attributes.insert(TypeId::of::<T>(), created.clone());
        created
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn absent_attribute_is_none() {
        let context = DeploymentContext::new();
        assert!(context.attribute::<String>().is_none());
    }

    #[test]
    fn first_caller_constructs() {
        let context = DeploymentContext::new();
        let constructed = AtomicUsize::new(0);

        let first = context.attribute_or_insert_with(|| {
            constructed.fetch_add(1, Ordering::SeqCst);
            String::from("registry")
        });
        let second = context.attribute_or_insert_with(|| {
            constructed.fetch_add(1, Ordering::SeqCst);
            String::from("other")
        });

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(constructed.load(Ordering::SeqCst), 1);
        assert_eq!(*context.attribute::<String>().unwrap(), "registry");
    }

    #[test]
    fn attributes_are_per_type() {
        let context = DeploymentContext::new();
        context.attribute_or_insert_with(|| 7u32);
        context.attribute_or_insert_with(|| String::from("seven"));

        assert_eq!(*context.attribute::<u32>().unwrap(), 7);
        assert_eq!(*context.attribute::<String>().unwrap(), "seven");
    }

    #[test]
    fn racing_callers_share_one_instance() {
        let context = Arc::new(DeploymentContext::new());
        let constructed = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let context = context.clone();
                let constructed = constructed.clone();
                std::thread::spawn(move || {
                    let instance = context.attribute_or_insert_with(|| {
                        constructed.fetch_add(1, Ordering::SeqCst);
                        Box::new(42u64)
                    });
                    Arc::as_ptr(&instance) as usize
                })
            })
            .collect();

        let pointers: Vec<usize> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(constructed.load(Ordering::SeqCst), 1);
        assert!(pointers.windows(2).all(|w| w[0] == w[1]));
    }
}
