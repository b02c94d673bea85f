//! The route registry and its concurrent update protocol.
//!
//! # Responsibilities
//! - Hold the current [`ConfiguredRoutes`] snapshot behind an atomically
//!   swappable reference, so reads never block on writers
//! - Serialize writers through one reentrant lock and give `update` blocks
//!   transactional semantics: many operations, one published snapshot, one
//!   change event
//! - Notify listeners, in registration order, after the lock is released
//!
//! The protocol is copy-on-write: a transaction copies the snapshot into a
//! mutable [`ConfigureRoutes`], applies its operations, freezes the copy
//! and swaps it in. The change event carries the symmetric difference of
//! the pre- and post-transaction snapshots, so an add and a remove of the
//! same route inside one block cancel out.

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwap;
use parking_lot::{Mutex, ReentrantMutex};
use webweft_kernel::{ClassRef, DeploymentContext};

use crate::configured::{diff_snapshots, ConfigureRoutes, ConfiguredRoutes, ErrorTargetEntry};
use crate::error::Result;
use crate::event::{RouteData, RoutesChangedEvent};
use crate::path::RoutePath;
use crate::target::RouteTarget;

type Listener = Arc<dyn Fn(&RoutesChangedEvent) + Send + Sync>;

struct ListenerEntry {
    id: u64,
    listener: Listener,
}

/// Handle for a registered change listener; dropping it leaves the
/// listener in place, calling [`ListenerRegistration::remove`] detaches it.
pub struct ListenerRegistration {
    listeners: Arc<Mutex<Vec<ListenerEntry>>>,
    id: u64,
}

impl ListenerRegistration {
    /// Detach the listener.
    pub fn remove(self) {
        self.listeners.lock().retain(|entry| entry.id != self.id);
    }
}

/// A navigation target as delivered by the class-scanning phase: the
/// canonical path plus any alias paths, each with its parent-layout chain.
#[derive(Clone, Debug)]
pub struct RouteDefinition {
    pub target: ClassRef,
    pub path: RoutePath,
    pub parent_chain: Vec<ClassRef>,
    pub aliases: Vec<(RoutePath, Vec<ClassRef>)>,
}

struct OpenBlock {
    depth: usize,
    pending: ConfigureRoutes,
}

#[derive(Default)]
struct EditSession {
    open: Option<OpenBlock>,
}

/// Mutable-but-snapshot-consistent route table.
///
/// # Example
///
/// ```rust
/// use webweft_kernel::ClassRef;
/// use webweft_router::{route_path, RouteRegistry};
///
/// let registry = RouteRegistry::new();
/// let view = ClassRef::builder("com.app.MainView").build();
///
/// registry
///     .set_route(route_path!("main"), view.clone(), Vec::new())
///     .unwrap();
///
/// assert_eq!(
///     registry.get_navigation_target(&route_path!("main")),
///     Some(view),
/// );
/// ```
pub struct RouteRegistry {
    configuration: ArcSwap<ConfiguredRoutes>,
    editor: ReentrantMutex<RefCell<EditSession>>,
    listeners: Arc<Mutex<Vec<ListenerEntry>>>,
    next_listener_id: AtomicU64,
}

impl Default for RouteRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl RouteRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        RouteRegistry {
            configuration: ArcSwap::from_pointee(ConfiguredRoutes::empty()),
            editor: ReentrantMutex::new(RefCell::new(EditSession::default())),
            listeners: Arc::new(Mutex::new(Vec::new())),
            next_listener_id: AtomicU64::new(0),
        }
    }

    /// The registry of the given deployment context; the first caller
    /// constructs it.
    pub fn get_instance(context: &DeploymentContext) -> Arc<RouteRegistry> {
        context.attribute_or_insert_with(RouteRegistry::new)
    }

    /// Register `target` at `path` with the given parent-layout chain.
    ///
    /// Replaces an existing registration of the same pair; collisions with
    /// a different class resolve most-derived-wins and fail for unrelated
    /// classes, naming both.
    pub fn set_route(
        &self,
        path: RoutePath,
        target: ClassRef,
        parent_chain: Vec<ClassRef>,
    ) -> Result<()> {
        self.configure(|config| config.set_route(path, target, parent_chain))
    }

    /// Remove every registration at the path. Aliases of the targets that
    /// lived there stay registered under their own paths.
    pub fn remove_path(&self, path: &RoutePath) -> Result<()> {
        self.configure(|config| config.remove_path(path))
    }

    /// Remove the class from every path, canonical and aliases alike.
    pub fn remove_target(&self, target: &ClassRef) -> Result<()> {
        self.configure(|config| config.remove_target(target))
    }

    /// Remove exactly the (path, target) pair.
    pub fn remove_route(&self, path: &RoutePath, target: &ClassRef) -> Result<()> {
        self.configure(|config| config.remove_route(path, target))
    }

    /// Register `target` as the error-navigation handler for the exception
    /// class. One handler per exception type; a more derived handler class
    /// replaces a less derived one, unrelated handlers conflict.
    pub fn set_error_target(&self, exception: ClassRef, target: ClassRef) -> Result<()> {
        self.configure(|config| config.set_error_target(exception, target))
    }

    /// Drop the handler registered for the exception class.
    pub fn remove_error_target(&self, exception: &ClassRef) -> Result<()> {
        self.configure(|config| {
            config.remove_error_target(exception);
            Ok(())
        })
    }

    /// The handler for the exception class, walking its superclass chain.
    pub fn get_error_target(&self, exception: &ClassRef) -> Option<ErrorTargetEntry> {
        self.configuration.load().get_error_target(exception)
    }

    /// Resolve a handler for a thrown exception from its cause chain (the
    /// exception itself first): exact matches along the chain win, then
    /// the primary exception's superclass chain is searched.
    pub fn resolve_error_target(&self, causes: &[ClassRef]) -> Option<ErrorTargetEntry> {
        self.configuration.load().resolve_error_target(causes)
    }

    /// Drop every route and error target in one transaction.
    pub fn clear(&self) -> Result<()> {
        self.configure(|config| {
            config.clear();
            Ok(())
        })
    }

    /// Register a scanned set of navigation targets in one transaction.
    /// Most-derived-wins collision handling makes the outcome independent
    /// of definition order.
    pub fn register_navigation_targets(
        &self,
        definitions: Vec<RouteDefinition>,
    ) -> Result<()> {
        self.configure(|config| {
            for definition in definitions {
                config.set_route(
                    definition.path,
                    definition.target.clone(),
                    definition.parent_chain,
                )?;
                for (alias, chain) in definition.aliases {
                    config.set_route(alias, definition.target.clone(), chain)?;
                }
            }
            Ok(())
        })
    }

    /// Run a block of registry operations as a single transaction.
    ///
    /// Every `set_route`/`remove_*` call made from inside `f` (nested
    /// `update` calls included) edits one shared working copy. When the
    /// outermost block finishes, the new snapshot is published, the lock is
    /// released and a single [`RoutesChangedEvent`] describing the net
    /// change is fired. A panic inside the block discards all pending
    /// edits; nothing is published.
    pub fn update(&self, f: impl FnOnce()) {
        let guard = self.editor.lock();
        {
            let mut session = guard.borrow_mut();
            match session.open.as_mut() {
                Some(block) => block.depth += 1,
                None => {
                    let pending = ConfigureRoutes::from(&*self.configuration.load_full());
                    session.open = Some(OpenBlock { depth: 1, pending });
                }
            }
        }

        let pending = {
            struct PanicRollback<'a>(&'a ReentrantMutex<RefCell<EditSession>>);
            impl Drop for PanicRollback<'_> {
                fn drop(&mut self) {
                    if std::thread::panicking() {
                        self.0.lock().borrow_mut().open = None;
                    }
                }
            }
            let _rollback = PanicRollback(&self.editor);
            f();

            let mut session = guard.borrow_mut();
            match session.open.take() {
                Some(mut block) if block.depth > 1 => {
                    block.depth -= 1;
                    session.open = Some(block);
                    None
                }
                Some(block) => Some(block.pending),
                None => None,
            }
        };

        let Some(pending) = pending else {
            return;
        };
        self.commit(pending, guard);
    }

    /// Register a listener called synchronously after every committed
    /// transaction, in registration order. A panicking listener propagates
    /// to the caller of the committing operation; the snapshot has already
    /// been published at that point.
    pub fn add_routes_change_listener(
        &self,
        listener: impl Fn(&RoutesChangedEvent) + Send + Sync + 'static,
    ) -> ListenerRegistration {
        let id = self.next_listener_id.fetch_add(1, Ordering::Relaxed);
        self.listeners.lock().push(ListenerEntry {
            id,
            listener: Arc::new(listener),
        });
        ListenerRegistration {
            listeners: Arc::clone(&self.listeners),
            id,
        }
    }

    /// Resolve a concrete path to its navigation-target class. Lock-free:
    /// reads the current snapshot reference atomically.
    pub fn get_navigation_target(&self, path: &RoutePath) -> Option<ClassRef> {
        self.configuration.load().get_navigation_target(path)
    }

    /// The full (frozen) route target registered at the path.
    pub fn get_route_target(&self, path: &RoutePath) -> Option<RouteTarget> {
        self.configuration.load().get_route_target(path).cloned()
    }

    /// All registered routes in the current snapshot, ordered by path.
    pub fn get_registered_routes(&self) -> Vec<RouteData> {
        self.configuration.load().route_data()
    }

    /// The canonical path registered for the class.
    pub fn get_target_path(&self, target: &ClassRef) -> Option<RoutePath> {
        self.configuration.load().get_target_path(target).cloned()
    }

    /// The alias paths registered for the class.
    pub fn alias_paths(&self, target: &ClassRef) -> BTreeSet<RoutePath> {
        self.configuration.load().alias_paths(target)
    }

    /// Whether any target is registered at the path.
    pub fn has_route(&self, path: &RoutePath) -> bool {
        self.configuration.load().has_route(path)
    }

    /// Whether the class is registered anywhere.
    pub fn has_navigation_target(&self, target: &ClassRef) -> bool {
        self.configuration.load().has_route_target(target)
    }

    /// The current snapshot. Valid at the moment it is read; a later writer
    /// swaps in a replacement without ever mutating this one.
    pub fn current_configuration(&self) -> Arc<ConfiguredRoutes> {
        self.configuration.load_full()
    }

    /// Run one write operation transactionally: inside an open update block
    /// it edits the block's working copy with the commit deferred;
    /// standalone it copies, applies, publishes and notifies on its own.
    fn configure<T>(&self, op: impl FnOnce(&mut ConfigureRoutes) -> Result<T>) -> Result<T> {
        let guard = self.editor.lock();
        {
            let mut session = guard.borrow_mut();
            if let Some(block) = session.open.as_mut() {
                return op(&mut block.pending);
            }
        }

        let mut working = ConfigureRoutes::from(&*self.configuration.load_full());
        let result = op(&mut working)?;
        self.commit(working, guard);
        Ok(result)
    }

    /// Publish the working copy, release the write lock, then notify.
    fn commit(
        &self,
        pending: ConfigureRoutes,
        guard: parking_lot::ReentrantMutexGuard<'_, RefCell<EditSession>>,
    ) {
        let before = self.configuration.load_full();
        let after = Arc::new(pending.into_snapshot());
        self.configuration.store(after.clone());
        drop(guard);

        let event = diff_snapshots(&before, &after);
        if !event.is_empty() {
            self.fire(&event);
        }
    }

    fn fire(&self, event: &RoutesChangedEvent) {
        let listeners: Vec<Listener> = self
            .listeners
            .lock()
            .iter()
            .map(|entry| entry.listener.clone())
            .collect();
        for listener in listeners {
            listener(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::route_path;

    fn class(name: &str) -> ClassRef {
        ClassRef::builder(name).build()
    }

    #[test]
    fn lookups_miss_as_none() {
        let registry = RouteRegistry::new();
        assert_eq!(registry.get_navigation_target(&route_path!("nope")), None);
        assert!(!registry.has_route(&route_path!("nope")));
    }

    #[test]
    fn standalone_operation_fires_one_event() {
        let registry = RouteRegistry::new();
        let events = Arc::new(Mutex::new(Vec::new()));

        let sink = events.clone();
        registry.add_routes_change_listener(move |event| {
            sink.lock().push((event.added().len(), event.removed().len()));
        });

        registry
            .set_route(route_path!("main"), class("com.app.View"), Vec::new())
            .unwrap();

        assert_eq!(events.lock().as_slice(), &[(1, 0)]);
    }

    #[test]
    fn failed_operation_publishes_nothing() {
        let registry = RouteRegistry::new();
        registry
            .set_route(route_path!("clash"), class("com.app.First"), Vec::new())
            .unwrap();

        let fired = Arc::new(Mutex::new(0u32));
        let sink = fired.clone();
        registry.add_routes_change_listener(move |_| *sink.lock() += 1);

        assert!(registry
            .set_route(route_path!("clash"), class("com.app.Second"), Vec::new())
            .is_err());

        assert_eq!(*fired.lock(), 0);
        assert_eq!(
            registry.get_navigation_target(&route_path!("clash")),
            Some(class("com.app.First"))
        );
    }

    #[test]
    fn listener_registration_removes() {
        let registry = RouteRegistry::new();
        let fired = Arc::new(Mutex::new(0u32));

        let sink = fired.clone();
        let registration = registry.add_routes_change_listener(move |_| *sink.lock() += 1);
        registration.remove();

        registry
            .set_route(route_path!("main"), class("com.app.View"), Vec::new())
            .unwrap();
        assert_eq!(*fired.lock(), 0);
    }

    #[test]
    fn get_instance_is_one_per_context() {
        let context = DeploymentContext::new();
        let first = RouteRegistry::get_instance(&context);
        let second = RouteRegistry::get_instance(&context);
        assert!(Arc::ptr_eq(&first, &second));
    }
}
