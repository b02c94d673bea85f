//! Immutable route-table snapshots and their mutable working copies.
//!
//! Every write transaction copies the current [`ConfiguredRoutes`] into a
//! [`ConfigureRoutes`], mutates the copy, and freezes it back into a new
//! snapshot. Readers only ever hold a snapshot, so the forward map and the
//! reverse (canonical path / alias) maps are always mutually consistent at
//! the moment of publication.

use std::collections::{BTreeSet, HashMap, HashSet};

use webweft_kernel::ClassRef;

use crate::error::{Result, RouterError};
use crate::event::{RouteData, RoutesChangedEvent};
use crate::path::RoutePath;
use crate::target::RouteTarget;

/// A registered error-navigation target: the exception class it was
/// matched on and the target class handling it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ErrorTargetEntry {
    pub handled_exception: ClassRef,
    pub target: ClassRef,
}

/// An immutable, fully-consistent view of the route table.
#[derive(Clone, Debug, Default)]
pub struct ConfiguredRoutes {
    routes: HashMap<RoutePath, RouteTarget>,
    target_paths: HashMap<ClassRef, RoutePath>,
    alias_paths: HashMap<ClassRef, BTreeSet<RoutePath>>,
    error_targets: HashMap<ClassRef, ClassRef>,
}

impl ConfiguredRoutes {
    pub(crate) fn empty() -> Self {
        Self::default()
    }

    /// The route target registered at the given path.
    pub fn get_route_target(&self, path: &RoutePath) -> Option<&RouteTarget> {
        self.routes.get(path)
    }

    /// Resolve a concrete path to its navigation-target class.
    pub fn get_navigation_target(&self, path: &RoutePath) -> Option<ClassRef> {
        self.routes
            .get(path)
            .and_then(|target| target.get_target())
            .cloned()
    }

    /// Whether any target is registered at the path.
    pub fn has_route(&self, path: &RoutePath) -> bool {
        self.routes.contains_key(path)
    }

    /// Whether the class is registered anywhere in this configuration.
    pub fn has_route_target(&self, target: &ClassRef) -> bool {
        self.target_paths.contains_key(target)
            || self
                .alias_paths
                .get(target)
                .is_some_and(|aliases| !aliases.is_empty())
    }

    /// The canonical path of a class, if it still has one. Removing the
    /// canonical path leaves aliases registered but promotes none of them.
    pub fn get_target_path(&self, target: &ClassRef) -> Option<&RoutePath> {
        self.target_paths.get(target)
    }

    /// The alias paths registered for a class.
    pub fn alias_paths(&self, target: &ClassRef) -> BTreeSet<RoutePath> {
        self.alias_paths.get(target).cloned().unwrap_or_default()
    }

    /// The error target handling the exception class, walking the
    /// exception's superclass chain until a registered handler is found.
    pub fn get_error_target(&self, exception: &ClassRef) -> Option<ErrorTargetEntry> {
        let mut current = Some(exception);
        while let Some(class) = current {
            if let Some(target) = self.error_targets.get(class) {
                return Some(ErrorTargetEntry {
                    handled_exception: class.clone(),
                    target: target.clone(),
                });
            }
            current = class.superclass();
        }
        None
    }

    /// Resolve an error target for a thrown exception, given its cause
    /// chain (the exception itself first). Exact matches along the cause
    /// chain win over supertype matches of the primary exception.
    pub fn resolve_error_target(&self, causes: &[ClassRef]) -> Option<ErrorTargetEntry> {
        for cause in causes {
            if let Some(target) = self.error_targets.get(cause) {
                return Some(ErrorTargetEntry {
                    handled_exception: cause.clone(),
                    target: target.clone(),
                });
            }
        }
        causes
            .first()
            .and_then(|primary| self.get_error_target(primary))
    }

    /// Number of registered error targets.
    pub fn error_target_count(&self) -> usize {
        self.error_targets.len()
    }

    /// Number of distinct paths in the table.
    pub fn route_count(&self) -> usize {
        self.routes.len()
    }

    /// All registered routes, ordered by path.
    pub fn route_data(&self) -> Vec<RouteData> {
        let mut data: Vec<RouteData> = self
            .routes
            .iter()
            .flat_map(|(path, target)| {
                target.routes().into_iter().map(|class| RouteData {
                    path: path.clone(),
                    parent_layouts: target.parent_layouts(&class).to_vec(),
                    target: class,
                })
            })
            .collect();
        data.sort();
        data
    }

    fn route_pairs(&self) -> HashSet<(RoutePath, ClassRef)> {
        self.routes
            .iter()
            .flat_map(|(path, target)| {
                target
                    .routes()
                    .into_iter()
                    .map(|class| (path.clone(), class))
            })
            .collect()
    }

    fn data_for(&self, path: &RoutePath, class: &ClassRef) -> RouteData {
        let parent_layouts = self
            .routes
            .get(path)
            .map(|target| target.parent_layouts(class).to_vec())
            .unwrap_or_default();
        RouteData {
            path: path.clone(),
            target: class.clone(),
            parent_layouts,
        }
    }
}

/// Compute the net change between two snapshots: the symmetric difference
/// over (path, target) pairs.
pub(crate) fn diff_snapshots(
    before: &ConfiguredRoutes,
    after: &ConfiguredRoutes,
) -> RoutesChangedEvent {
    let before_pairs = before.route_pairs();
    let after_pairs = after.route_pairs();

    let added = after_pairs
        .difference(&before_pairs)
        .map(|(path, class)| after.data_for(path, class))
        .collect();
    let removed = before_pairs
        .difference(&after_pairs)
        .map(|(path, class)| before.data_for(path, class))
        .collect();

    RoutesChangedEvent::new(added, removed)
}

/// Mutable working copy of a snapshot, alive for one write transaction.
#[derive(Debug)]
pub struct ConfigureRoutes {
    routes: HashMap<RoutePath, RouteTarget>,
    target_paths: HashMap<ClassRef, RoutePath>,
    alias_paths: HashMap<ClassRef, BTreeSet<RoutePath>>,
    error_targets: HashMap<ClassRef, ClassRef>,
}

impl From<&ConfiguredRoutes> for ConfigureRoutes {
    fn from(snapshot: &ConfiguredRoutes) -> Self {
        ConfigureRoutes {
            routes: snapshot
                .routes
                .iter()
                .map(|(path, target)| (path.clone(), target.copy(true)))
                .collect(),
            target_paths: snapshot.target_paths.clone(),
            alias_paths: snapshot.alias_paths.clone(),
            error_targets: snapshot.error_targets.clone(),
        }
    }
}

impl ConfigureRoutes {
    /// Register `target` at `path` with the given parent-layout chain.
    ///
    /// Collisions on an occupied arity slot resolve in favor of the most
    /// derived class: a subclass replaces its superclass, a superclass is
    /// ignored, and unrelated classes fail with
    /// [`RouterError::AmbiguousRoute`] naming both. Registering the same
    /// (path, target) pair again only refreshes the parent chain.
    pub fn set_route(
        &mut self,
        path: RoutePath,
        target: ClassRef,
        parent_chain: Vec<ClassRef>,
    ) -> Result<()> {
        let entry = self
            .routes
            .entry(path.clone())
            .or_insert_with(|| RouteTarget::empty(true));

        match entry.slot(target.parameter_kind()) {
            Some(existing) if *existing == target => {}
            Some(existing) if target.is_subclass_of(existing) => {
                let displaced = existing.clone();
                entry.set_slot(target.clone());
                self.unrecord_path(&displaced, &path);
            }
            Some(existing) if existing.is_subclass_of(&target) => {
                // the registered class is already the most derived one
                return Ok(());
            }
            Some(existing) => {
                return Err(RouterError::AmbiguousRoute {
                    path,
                    existing: existing.clone(),
                    offered: target,
                });
            }
            None => entry.set_slot(target.clone()),
        }

        tracing::debug!(path = %path, target = %target, "registering route");
        // the entry exists at this point; re-borrow after the reverse-map update
        if let Some(entry) = self.routes.get_mut(&path) {
            entry.set_parent_layouts(&target, parent_chain)?;
        }
        self.record_path(&target, &path);
        Ok(())
    }

    /// Drop every registration at the path. Alias paths of the classes that
    /// lived there stay registered under their own paths; none is promoted
    /// to canonical.
    pub fn remove_path(&mut self, path: &RoutePath) -> Result<()> {
        let Some(target) = self.routes.remove(path) else {
            return Ok(());
        };
        for class in target.routes() {
            self.unrecord_path(&class, path);
        }
        Ok(())
    }

    /// Remove the class from every path it is registered at, canonical and
    /// aliases alike.
    pub fn remove_target(&mut self, target: &ClassRef) -> Result<()> {
        let mut paths: BTreeSet<RoutePath> = self.alias_paths.remove(target).unwrap_or_default();
        if let Some(canonical) = self.target_paths.remove(target) {
            paths.insert(canonical);
        }

        for path in paths {
            if let Some(route_target) = self.routes.get_mut(&path) {
                route_target.remove(target)?;
                if route_target.is_empty() {
                    self.routes.remove(&path);
                }
            }
        }
        Ok(())
    }

    /// Remove exactly the (path, target) pair.
    pub fn remove_route(&mut self, path: &RoutePath, target: &ClassRef) -> Result<()> {
        let Some(route_target) = self.routes.get_mut(path) else {
            return Ok(());
        };
        route_target.remove(target)?;
        if route_target.is_empty() {
            self.routes.remove(path);
        }
        self.unrecord_path(target, path);
        Ok(())
    }

    /// Register `target` as the handler for the exception class.
    ///
    /// At most one handler per exception class: a handler subclass
    /// replaces its superclass, a superclass is ignored, and unrelated
    /// handler classes fail with [`RouterError::AmbiguousErrorTarget`]
    /// naming both.
    pub fn set_error_target(&mut self, exception: ClassRef, target: ClassRef) -> Result<()> {
        match self.error_targets.get(&exception) {
            Some(existing) if *existing == target => return Ok(()),
            Some(existing) if target.is_subclass_of(existing) => {}
            Some(existing) if existing.is_subclass_of(&target) => return Ok(()),
            Some(existing) => {
                return Err(RouterError::AmbiguousErrorTarget {
                    exception,
                    existing: existing.clone(),
                    offered: target,
                });
            }
            None => {}
        }
        tracing::debug!(exception = %exception, target = %target, "registering error target");
        self.error_targets.insert(exception, target);
        Ok(())
    }

    /// Drop the handler registered for the exception class, if any.
    pub fn remove_error_target(&mut self, exception: &ClassRef) {
        self.error_targets.remove(exception);
    }

    /// Drop every route and error target.
    pub fn clear(&mut self) {
        self.routes.clear();
        self.target_paths.clear();
        self.alias_paths.clear();
        self.error_targets.clear();
    }

    /// Freeze into an immutable snapshot ready for publication.
    pub fn into_snapshot(self) -> ConfiguredRoutes {
        ConfiguredRoutes {
            routes: self
                .routes
                .into_iter()
                .map(|(path, target)| (path, target.copy(false)))
                .collect(),
            target_paths: self.target_paths,
            alias_paths: self.alias_paths,
            error_targets: self.error_targets,
        }
    }

    /// Record `path` for the class: the first registered path becomes
    /// canonical, later ones become aliases.
    fn record_path(&mut self, target: &ClassRef, path: &RoutePath) {
        match self.target_paths.get(target) {
            None => {
                self.target_paths.insert(target.clone(), path.clone());
            }
            Some(canonical) if canonical != path => {
                self.alias_paths
                    .entry(target.clone())
                    .or_default()
                    .insert(path.clone());
            }
            Some(_) => {}
        }
    }

    /// Forget that the class is registered at `path`. The canonical slot is
    /// not backfilled from aliases.
    fn unrecord_path(&mut self, target: &ClassRef, path: &RoutePath) {
        if self.target_paths.get(target) == Some(path) {
            self.target_paths.remove(target);
        } else if let Some(aliases) = self.alias_paths.get_mut(target) {
            aliases.remove(path);
            if aliases.is_empty() {
                self.alias_paths.remove(target);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::route_path;
    use webweft_kernel::ParameterKind;

    fn class(name: &str) -> ClassRef {
        ClassRef::builder(name).build()
    }

    fn working() -> ConfigureRoutes {
        ConfigureRoutes::from(&ConfiguredRoutes::empty())
    }

    #[test]
    fn first_path_becomes_canonical_later_paths_become_aliases() {
        let view = class("com.app.View");
        let mut config = working();
        config
            .set_route(route_path!("main"), view.clone(), Vec::new())
            .unwrap();
        config
            .set_route(route_path!("alias"), view.clone(), Vec::new())
            .unwrap();

        let snapshot = config.into_snapshot();
        assert_eq!(
            snapshot.get_target_path(&view),
            Some(&route_path!("main"))
        );
        assert_eq!(
            snapshot.alias_paths(&view),
            BTreeSet::from([route_path!("alias")])
        );
    }

    #[test]
    fn idempotent_re_registration_keeps_size() {
        let view = class("com.app.View");
        let mut config = working();
        config
            .set_route(route_path!("main"), view.clone(), Vec::new())
            .unwrap();
        config
            .set_route(route_path!("main"), view.clone(), Vec::new())
            .unwrap();

        let snapshot = config.into_snapshot();
        assert_eq!(snapshot.route_count(), 1);
        assert!(snapshot.alias_paths(&view).is_empty());
    }

    #[test]
    fn subclass_displaces_superclass_on_the_same_path() {
        let base = class("com.app.View");
        let derived = ClassRef::builder("com.app.SpecialView")
            .extends(base.clone())
            .build();

        let mut config = working();
        config
            .set_route(route_path!("view"), base.clone(), Vec::new())
            .unwrap();
        config
            .set_route(route_path!("view"), derived.clone(), Vec::new())
            .unwrap();

        let snapshot = config.into_snapshot();
        assert_eq!(
            snapshot.get_navigation_target(&route_path!("view")),
            Some(derived.clone())
        );
        assert!(!snapshot.has_route_target(&base));
    }

    #[test]
    fn superclass_loses_to_registered_subclass() {
        let base = class("com.app.View");
        let derived = ClassRef::builder("com.app.SpecialView")
            .extends(base.clone())
            .build();

        let mut config = working();
        config
            .set_route(route_path!("view"), derived.clone(), Vec::new())
            .unwrap();
        config
            .set_route(route_path!("view"), base.clone(), Vec::new())
            .unwrap();

        let snapshot = config.into_snapshot();
        assert_eq!(
            snapshot.get_navigation_target(&route_path!("view")),
            Some(derived)
        );
    }

    #[test]
    fn unrelated_classes_on_one_path_fail_naming_both() {
        let first = class("com.app.First");
        let second = class("com.app.Second");

        let mut config = working();
        config
            .set_route(route_path!("clash"), first.clone(), Vec::new())
            .unwrap();
        let err = config
            .set_route(route_path!("clash"), second.clone(), Vec::new())
            .unwrap_err();

        let message = err.to_string();
        assert!(message.contains("com.app.First"));
        assert!(message.contains("com.app.Second"));
        assert!(message.contains("clash"));
    }

    #[test]
    fn removing_canonical_path_keeps_aliases_unpromoted() {
        let view = class("com.app.View");
        let mut config = working();
        for path in ["main", "alias-a", "alias-b"] {
            config
                .set_route(route_path!(path), view.clone(), Vec::new())
                .unwrap();
        }

        config.remove_path(&route_path!("main")).unwrap();
        let snapshot = config.into_snapshot();

        assert!(snapshot.get_target_path(&view).is_none());
        assert_eq!(
            snapshot.get_navigation_target(&route_path!("alias-a")),
            Some(view.clone())
        );
        assert_eq!(
            snapshot.get_navigation_target(&route_path!("alias-b")),
            Some(view.clone())
        );
        assert!(snapshot.has_route_target(&view));
    }

    #[test]
    fn removing_the_class_removes_all_aliases() {
        let view = class("com.app.View");
        let mut config = working();
        for path in ["main", "alias-a", "alias-b"] {
            config
                .set_route(route_path!(path), view.clone(), Vec::new())
                .unwrap();
        }

        config.remove_target(&view).unwrap();
        let snapshot = config.into_snapshot();

        assert_eq!(snapshot.route_count(), 0);
        assert!(!snapshot.has_route_target(&view));
    }

    #[test]
    fn removing_one_pair_leaves_other_targets_on_the_path() {
        let exact = class("com.app.Exact");
        let wild = ClassRef::builder("com.app.Wild")
            .parameter(ParameterKind::Wildcard)
            .build();

        let mut config = working();
        config
            .set_route(route_path!("docs"), exact.clone(), Vec::new())
            .unwrap();
        config
            .set_route(route_path!("docs"), wild.clone(), Vec::new())
            .unwrap();

        config.remove_route(&route_path!("docs"), &exact).unwrap();
        let snapshot = config.into_snapshot();

        assert_eq!(
            snapshot.get_navigation_target(&route_path!("docs")),
            Some(wild)
        );
        assert!(!snapshot.has_route_target(&exact));
    }

    #[test]
    fn diff_is_the_symmetric_difference() {
        let stay = class("com.app.Stay");
        let gone = class("com.app.Gone");
        let fresh = class("com.app.Fresh");

        let mut before = working();
        before
            .set_route(route_path!("stay"), stay.clone(), Vec::new())
            .unwrap();
        before
            .set_route(route_path!("gone"), gone.clone(), Vec::new())
            .unwrap();
        let before = before.into_snapshot();

        let mut after = ConfigureRoutes::from(&before);
        after.remove_path(&route_path!("gone")).unwrap();
        after
            .set_route(route_path!("fresh"), fresh.clone(), Vec::new())
            .unwrap();
        let after = after.into_snapshot();

        let event = diff_snapshots(&before, &after);
        assert_eq!(event.added().len(), 1);
        assert_eq!(event.added()[0].target, fresh);
        assert_eq!(event.removed().len(), 1);
        assert_eq!(event.removed()[0].target, gone);
        assert!(!event.is_path_added(&route_path!("stay")));
    }

    #[test]
    fn error_handler_conflicts_resolve_most_derived_in_both_orders() {
        let exception = class("java.lang.RuntimeException");
        let base = class("com.app.ErrorView");
        let derived = ClassRef::builder("com.app.DetailedErrorView")
            .extends(base.clone())
            .build();

        for (first, second) in [(base.clone(), derived.clone()), (derived.clone(), base.clone())] {
            let mut config = working();
            config.set_error_target(exception.clone(), first).unwrap();
            config.set_error_target(exception.clone(), second).unwrap();

            let snapshot = config.into_snapshot();
            assert_eq!(snapshot.error_target_count(), 1);
            assert_eq!(
                snapshot.get_error_target(&exception).map(|entry| entry.target),
                Some(derived.clone())
            );
        }
    }

    #[test]
    fn unrelated_error_handlers_for_one_exception_fail() {
        let exception = class("java.lang.RuntimeException");
        let mut config = working();
        config
            .set_error_target(exception.clone(), class("com.app.FirstErrorView"))
            .unwrap();
        let err = config
            .set_error_target(exception.clone(), class("com.app.SecondErrorView"))
            .unwrap_err();

        let message = err.to_string();
        assert!(message.contains("com.app.FirstErrorView"));
        assert!(message.contains("com.app.SecondErrorView"));
        assert!(message.contains("java.lang.RuntimeException"));
    }

    #[test]
    fn error_lookup_falls_back_to_the_exception_superclass_chain() {
        let runtime = class("java.lang.RuntimeException");
        let not_found = ClassRef::builder("com.app.NotFoundException")
            .extends(runtime.clone())
            .build();
        let handler = class("com.app.ErrorView");

        let mut config = working();
        config
            .set_error_target(runtime.clone(), handler.clone())
            .unwrap();
        let snapshot = config.into_snapshot();

        let entry = snapshot.get_error_target(&not_found).unwrap();
        assert_eq!(entry.handled_exception, runtime);
        assert_eq!(entry.target, handler);
        assert!(snapshot.get_error_target(&class("java.lang.Error")).is_none());
    }

    #[test]
    fn cause_chain_exact_matches_win_over_supertype_matches() {
        let runtime = class("java.lang.RuntimeException");
        let wrapper = ClassRef::builder("com.app.WrappedException")
            .extends(runtime.clone())
            .build();
        let io = class("java.io.IOException");

        let mut config = working();
        config
            .set_error_target(runtime.clone(), class("com.app.GenericErrorView"))
            .unwrap();
        config
            .set_error_target(io.clone(), class("com.app.IoErrorView"))
            .unwrap();
        let snapshot = config.into_snapshot();

        // the wrapper has no exact handler, but its cause does
        let entry = snapshot
            .resolve_error_target(&[wrapper.clone(), io.clone()])
            .unwrap();
        assert_eq!(entry.handled_exception, io);
        assert_eq!(entry.target, class("com.app.IoErrorView"));

        // no exact match anywhere: fall back to the primary's supertypes
        let entry = snapshot
            .resolve_error_target(&[wrapper, class("com.app.OtherCause")])
            .unwrap();
        assert_eq!(entry.handled_exception, runtime);
        assert_eq!(entry.target, class("com.app.GenericErrorView"));
    }

    #[test]
    fn snapshot_targets_are_frozen() {
        let view = class("com.app.View");
        let mut config = working();
        config
            .set_route(route_path!("main"), view.clone(), Vec::new())
            .unwrap();

        let snapshot = config.into_snapshot();
        let mut copy = snapshot
            .get_route_target(&route_path!("main"))
            .unwrap()
            .clone();
        assert!(copy.add_route(class("com.app.Other")).is_err());
    }
}
