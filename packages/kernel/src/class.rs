//! Opaque class descriptors with an explicit subtype relation.
//!
//! The framework core never reflects over application classes. The scanning
//! phase builds one `ClassRef` per discovered class, wiring in the
//! superclass chain and the URL-parameter arity, and the registries work
//! purely against that descriptor graph.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// URL-parameter arity a navigation-target class declares.
///
/// A path can host at most one target per arity: one plain target, one
/// mandatory-parameter target, one optional-parameter target and one
/// wildcard target.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ParameterKind {
    /// No URL parameter; the target matches its path exactly.
    None,
    /// One mandatory trailing parameter.
    Mandatory,
    /// One optional trailing parameter.
    Optional,
    /// A trailing wildcard consuming the rest of the path.
    Wildcard,
}

impl ParameterKind {
    /// Whether this kind takes part in parameterized routing at all.
    pub fn is_parameterized(self) -> bool {
        self != ParameterKind::None
    }
}

impl fmt::Display for ParameterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ParameterKind::None => "none",
            ParameterKind::Mandatory => "mandatory",
            ParameterKind::Optional => "optional",
            ParameterKind::Wildcard => "wildcard",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug)]
struct ClassInfo {
    name: String,
    superclass: Option<ClassRef>,
    parameter: ParameterKind,
}

/// An interned class descriptor.
///
/// Cheap to clone and pass around; identity is the fully-qualified class
/// name. The superclass chain is fixed at construction, so the subtype
/// relation the route-conflict algorithm needs is a plain pointer walk.
///
/// # Example
///
/// ```rust
/// use webweft_kernel::ClassRef;
///
/// let base = ClassRef::builder("com.app.BaseView").build();
/// let derived = ClassRef::builder("com.app.AdminView")
///     .extends(base.clone())
///     .build();
///
/// assert!(derived.is_subclass_of(&base));
/// assert!(!base.is_subclass_of(&derived));
/// ```
#[derive(Clone, Debug)]
pub struct ClassRef(Arc<ClassInfo>);

impl ClassRef {
    /// Start building a descriptor for the named class.
    pub fn builder(name: impl Into<String>) -> ClassBuilder {
        ClassBuilder {
            name: name.into(),
            superclass: None,
            parameter: ParameterKind::None,
        }
    }

    /// Fully-qualified class name.
    pub fn name(&self) -> &str {
        &self.0.name
    }

    /// Direct superclass, if one was declared.
    pub fn superclass(&self) -> Option<&ClassRef> {
        self.0.superclass.as_ref()
    }

    /// URL-parameter arity this class declares.
    pub fn parameter_kind(&self) -> ParameterKind {
        self.0.parameter
    }

    /// Strict subtype check: walks the superclass chain, excluding `self`.
    pub fn is_subclass_of(&self, other: &ClassRef) -> bool {
        let mut current = self.superclass();
        while let Some(class) = current {
            if class == other {
                return true;
            }
            current = class.superclass();
        }
        false
    }

    /// Same-or-subtype check, mirroring `Class.isAssignableFrom` in the
    /// original: `self` is assignable from `other` when `other` is `self`
    /// or a subclass of it.
    pub fn is_assignable_from(&self, other: &ClassRef) -> bool {
        other == self || other.is_subclass_of(self)
    }
}

impl PartialEq for ClassRef {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.0.name == other.0.name
    }
}

impl Eq for ClassRef {}

impl Hash for ClassRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.name.hash(state);
    }
}

impl PartialOrd for ClassRef {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ClassRef {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.name.cmp(&other.0.name)
    }
}

impl fmt::Display for ClassRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.name)
    }
}

/// Builder for [`ClassRef`].
pub struct ClassBuilder {
    name: String,
    superclass: Option<ClassRef>,
    parameter: ParameterKind,
}

impl ClassBuilder {
    /// Declare the direct superclass.
    pub fn extends(mut self, superclass: ClassRef) -> Self {
        self.superclass = Some(superclass);
        self
    }

    /// Declare the URL-parameter arity.
    pub fn parameter(mut self, kind: ParameterKind) -> Self {
        self.parameter = kind;
        self
    }

    /// Finish the descriptor.
    pub fn build(self) -> ClassRef {
        ClassRef(Arc::new(ClassInfo {
            name: self.name,
            superclass: self.superclass,
            parameter: self.parameter,
        }))
    }
}
