//! Per-path storage of navigation-target classes.

use std::collections::{BTreeMap, HashMap};

use webweft_kernel::{ClassRef, ParameterKind};

use crate::error::{Result, RouterError};

/// All navigation targets registered for a single path.
///
/// A path holds at most one target per parameter arity: one plain target
/// (the primary) plus at most one mandatory-, optional- and
/// wildcard-parameter alternate. Each registered class carries its own
/// ordered parent-layout chain.
///
/// A `RouteTarget` is mutable while a configuration transaction builds it.
/// Publishing into a registry snapshot freezes it via [`RouteTarget::copy`];
/// any mutation attempt on the frozen copy fails with
/// [`RouterError::ImmutableRouteTarget`], so readers never see a target
/// change under them.
#[derive(Clone, Debug)]
pub struct RouteTarget {
    mutable: bool,
    primary: Option<ClassRef>,
    parameterized: BTreeMap<ParameterKind, ClassRef>,
    parent_layouts: HashMap<ClassRef, Vec<ClassRef>>,
}

impl RouteTarget {
    /// Create a target holding one class.
    pub fn new(target: ClassRef, mutable: bool) -> Self {
        let mut route_target = Self::empty(mutable);
        route_target.set_slot(target);
        route_target
    }

    /// Create an empty target.
    pub(crate) fn empty(mutable: bool) -> Self {
        RouteTarget {
            mutable,
            primary: None,
            parameterized: BTreeMap::new(),
            parent_layouts: HashMap::new(),
        }
    }

    /// Register a class on this path.
    ///
    /// Fails if the class's parameter slot is already held by a different
    /// class, or if this instance has been frozen. Registering the same
    /// class again is a no-op.
    pub fn add_route(&mut self, target: ClassRef) -> Result<()> {
        self.require_mutable()?;

        let kind = target.parameter_kind();
        if let Some(existing) = self.slot(kind) {
            if *existing == target {
                return Ok(());
            }
            return Err(RouterError::AmbiguousRouteTarget {
                kind,
                existing: existing.clone(),
                offered: target,
            });
        }

        self.set_slot(target);
        Ok(())
    }

    /// Remove a class from this path, along with its parent-layout chain.
    /// Absent classes are ignored.
    pub fn remove(&mut self, target: &ClassRef) -> Result<()> {
        self.require_mutable()?;

        if self.primary.as_ref() == Some(target) {
            self.primary = None;
        } else {
            self.parameterized.retain(|_, class| class != target);
        }
        self.parent_layouts.remove(target);
        Ok(())
    }

    /// Associate the ordered parent-layout chain (outermost first) with a
    /// class already registered on this path.
    pub fn set_parent_layouts(&mut self, target: &ClassRef, chain: Vec<ClassRef>) -> Result<()> {
        self.require_mutable()?;

        if !self.contains(target) {
            return Err(RouterError::TargetNotRegistered {
                target: target.clone(),
            });
        }
        self.parent_layouts.insert(target.clone(), chain);
        Ok(())
    }

    /// The parent-layout chain for a class, outermost first. Empty when the
    /// class has no parents or is not registered here.
    pub fn parent_layouts(&self, target: &ClassRef) -> &[ClassRef] {
        self.parent_layouts
            .get(target)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// The class that resolves this path: the primary if present, otherwise
    /// the alternates in mandatory, optional, wildcard order.
    pub fn get_target(&self) -> Option<&ClassRef> {
        self.primary
            .as_ref()
            .or_else(|| self.parameterized.values().next())
    }

    /// All registered classes in resolution order.
    pub fn routes(&self) -> Vec<ClassRef> {
        self.primary
            .iter()
            .chain(self.parameterized.values())
            .cloned()
            .collect()
    }

    /// Whether the class is registered on this path.
    pub fn contains(&self, target: &ClassRef) -> bool {
        self.primary.as_ref() == Some(target) || self.parameterized.values().any(|c| c == target)
    }

    /// Whether no class is registered at all.
    pub fn is_empty(&self) -> bool {
        self.primary.is_none() && self.parameterized.is_empty()
    }

    /// True when more than one class is registered, i.e. parameterized
    /// routing is in play for this path.
    pub fn is_dynamic(&self) -> bool {
        self.primary.iter().count() + self.parameterized.len() > 1
    }

    /// Whether this instance still accepts mutation.
    pub fn is_mutable(&self) -> bool {
        self.mutable
    }

    /// Deep copy with the given mutability. Snapshots are published as
    /// `copy(false)`.
    pub fn copy(&self, mutable: bool) -> Self {
        let mut copy = self.clone();
        copy.mutable = mutable;
        copy
    }

    /// Occupant of the slot for the given arity.
    pub(crate) fn slot(&self, kind: ParameterKind) -> Option<&ClassRef> {
        match kind {
            ParameterKind::None => self.primary.as_ref(),
            parameterized => self.parameterized.get(&parameterized),
        }
    }

    /// Overwrite the slot for the class's arity. Used by the configuration
    /// layer after it has resolved a collision in the new class's favor.
    pub(crate) fn set_slot(&mut self, target: ClassRef) {
        match target.parameter_kind() {
            ParameterKind::None => {
                if let Some(previous) = self.primary.replace(target) {
                    self.parent_layouts.remove(&previous);
                }
            }
            kind => {
                if let Some(previous) = self.parameterized.insert(kind, target) {
                    self.parent_layouts.remove(&previous);
                }
            }
        }
    }

    fn require_mutable(&self) -> Result<()> {
        if self.mutable {
            Ok(())
        } else {
            Err(RouterError::ImmutableRouteTarget)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn class(name: &str) -> ClassRef {
        ClassRef::builder(name).build()
    }

    fn parameterized(name: &str, kind: ParameterKind) -> ClassRef {
        ClassRef::builder(name).parameter(kind).build()
    }

    #[test]
    fn one_target_per_parameter_slot() {
        let mut target = RouteTarget::new(class("com.app.View"), true);
        target
            .add_route(parameterized("com.app.EditView", ParameterKind::Mandatory))
            .unwrap();

        let err = target
            .add_route(parameterized("com.app.OtherEdit", ParameterKind::Mandatory))
            .unwrap_err();
        assert!(matches!(
            err,
            RouterError::AmbiguousRouteTarget {
                kind: ParameterKind::Mandatory,
                ..
            }
        ));

        // a different arity still fits
        target
            .add_route(parameterized("com.app.CatchAll", ParameterKind::Wildcard))
            .unwrap();
        assert!(target.is_dynamic());
    }

    #[test]
    fn re_adding_the_same_class_is_a_noop() {
        let mut target = RouteTarget::new(class("com.app.View"), true);
        target.add_route(class("com.app.View")).unwrap();
        assert_eq!(target.routes().len(), 1);
    }

    #[test]
    fn resolution_prefers_the_primary() {
        let mut target = RouteTarget::new(
            parameterized("com.app.Optional", ParameterKind::Optional),
            true,
        );
        target.add_route(class("com.app.Exact")).unwrap();

        assert_eq!(target.get_target().unwrap().name(), "com.app.Exact");
        let routes = target.routes();
        let order: Vec<&str> = routes.iter().map(|c| c.name()).collect();
        assert_eq!(order, vec!["com.app.Exact", "com.app.Optional"]);
    }

    #[test]
    fn frozen_copy_rejects_mutation() {
        let mut target = RouteTarget::new(class("com.app.View"), true);
        target
            .set_parent_layouts(&class("com.app.View"), vec![class("com.app.MainLayout")])
            .unwrap();

        let mut frozen = target.copy(false);
        assert!(matches!(
            frozen.add_route(class("com.app.Other")),
            Err(RouterError::ImmutableRouteTarget)
        ));
        assert!(matches!(
            frozen.remove(&class("com.app.View")),
            Err(RouterError::ImmutableRouteTarget)
        ));
        assert!(matches!(
            frozen.set_parent_layouts(&class("com.app.View"), Vec::new()),
            Err(RouterError::ImmutableRouteTarget)
        ));

        // reads still work, and the original stays mutable
        assert_eq!(frozen.parent_layouts(&class("com.app.View")).len(), 1);
        assert!(target.is_mutable());
    }

    #[test]
    fn parent_layouts_require_registration() {
        let mut target = RouteTarget::new(class("com.app.View"), true);
        let err = target
            .set_parent_layouts(&class("com.app.Unknown"), Vec::new())
            .unwrap_err();
        assert!(matches!(err, RouterError::TargetNotRegistered { .. }));
    }

    #[test]
    fn remove_clears_slot_and_layouts() {
        let view = class("com.app.View");
        let mut target = RouteTarget::new(view.clone(), true);
        target
            .set_parent_layouts(&view, vec![class("com.app.MainLayout")])
            .unwrap();

        target.remove(&view).unwrap();
        assert!(target.is_empty());
        assert!(target.parent_layouts(&view).is_empty());
    }
}
