//! Change notification for committed route transactions.

use webweft_kernel::ClassRef;

use crate::path::RoutePath;

/// One registered route: a path, its navigation target and the target's
/// parent-layout chain (outermost first).
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct RouteData {
    pub path: RoutePath,
    pub target: ClassRef,
    pub parent_layouts: Vec<ClassRef>,
}

/// Event describing the net effect of one committed route transaction.
///
/// The added/removed lists are the symmetric difference of the snapshots
/// before and after the transaction, ordered by path. A route added and
/// removed again inside the same update block appears in neither list.
#[derive(Clone, Debug)]
pub struct RoutesChangedEvent {
    added: Vec<RouteData>,
    removed: Vec<RouteData>,
}

impl RoutesChangedEvent {
    pub(crate) fn new(mut added: Vec<RouteData>, mut removed: Vec<RouteData>) -> Self {
        added.sort();
        removed.sort();
        RoutesChangedEvent { added, removed }
    }

    /// Routes present after the transaction but not before it.
    pub fn added(&self) -> &[RouteData] {
        &self.added
    }

    /// Routes present before the transaction but not after it.
    pub fn removed(&self) -> &[RouteData] {
        &self.removed
    }

    /// Whether the transaction had any net effect.
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }

    /// Whether any route was added at the given path.
    pub fn is_path_added(&self, path: &RoutePath) -> bool {
        self.added.iter().any(|route| &route.path == path)
    }

    /// Whether any route was removed at the given path.
    pub fn is_path_removed(&self, path: &RoutePath) -> bool {
        self.removed.iter().any(|route| &route.path == path)
    }
}
