//! Route registry for the webweft server runtime.
//!
//! Maps URL path templates to navigation-target classes and keeps that
//! mapping safe to read while it is being rewritten:
//!
//! - `RoutePath`: normalized URL path template
//! - `RouteTarget`: every class registered for one path (one per
//!   parameter arity) plus their parent-layout chains
//! - `ConfiguredRoutes`: an immutable, fully-consistent snapshot of the
//!   whole table
//! - `RouteRegistry`: the copy-on-write registry; writers serialize on a
//!   reentrant lock and publish whole snapshots, readers follow an atomic
//!   reference and never block
//! - `RoutesChangedEvent`: the net diff of one committed transaction,
//!   delivered to listeners in registration order
//! - `ErrorTargetEntry`: an error-navigation handler resolved for a
//!   thrown exception, registered one handler per exception type
//!
//! # Example
//!
//! ```rust
//! use webweft_kernel::ClassRef;
//! use webweft_router::{route_path, RouteRegistry};
//!
//! let registry = RouteRegistry::new();
//! let list = ClassRef::builder("com.app.ListView").build();
//! let edit = ClassRef::builder("com.app.EditView").build();
//!
//! // several operations, one snapshot, one change event
//! registry.update(|| {
//!     registry
//!         .set_route(route_path!("users"), list.clone(), Vec::new())
//!         .unwrap();
//!     registry
//!         .set_route(route_path!("users/edit"), edit.clone(), Vec::new())
//!         .unwrap();
//! });
//!
//! assert_eq!(
//!     registry.get_navigation_target(&route_path!("users")),
//!     Some(list),
//! );
//! ```

mod configured;
mod error;
mod event;
mod path;
mod registry;
mod target;

pub use configured::{ConfiguredRoutes, ErrorTargetEntry};
pub use error::{Result, RouterError};
pub use event::{RouteData, RoutesChangedEvent};
pub use path::{PathError, RoutePath};
pub use registry::{ListenerRegistration, RouteDefinition, RouteRegistry};
pub use target::RouteTarget;
