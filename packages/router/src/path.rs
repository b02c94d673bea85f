//! Route path templates with normalized segments.

use std::fmt;

use thiserror::Error;

/// Errors related to route-path parsing.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PathError {
    /// A path segment contains characters a URL template may not carry.
    #[error("invalid path segment '{segment}' at position {position}: {message}")]
    InvalidSegment {
        segment: String,
        position: usize,
        message: String,
    },
}

/// A normalized URL path template.
///
/// Segments are separated by `/`; empty segments are dropped, so leading,
/// trailing and doubled slashes normalize away. The root route is the
/// empty segment list.
///
/// # Examples
///
/// ```rust
/// use webweft_router::RoutePath;
///
/// let path = RoutePath::parse("users/list").unwrap();
/// assert_eq!(path.segments().len(), 2);
///
/// // Slash placement does not matter
/// assert_eq!(
///     RoutePath::parse("/users/list/").unwrap(),
///     RoutePath::parse("users/list").unwrap(),
/// );
///
/// assert!(RoutePath::parse("").unwrap().is_root());
/// ```
#[derive(Clone, Debug, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct RoutePath {
    segments: Vec<String>,
}

impl RoutePath {
    /// The root route (empty path).
    pub fn root() -> Self {
        RoutePath {
            segments: Vec::new(),
        }
    }

    /// Parse and normalize a path string.
    pub fn parse(s: &str) -> Result<Self, PathError> {
        let segments: Vec<String> = s
            .split('/')
            .filter(|segment| !segment.is_empty())
            .map(|segment| segment.to_string())
            .collect();

        for (position, segment) in segments.iter().enumerate() {
            Self::validate_segment(segment, position)?;
        }

        Ok(RoutePath { segments })
    }

    /// Whether this is the root route.
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// The normalized segments.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    fn validate_segment(segment: &str, position: usize) -> Result<(), PathError> {
        for c in segment.chars() {
            if c.is_whitespace() || c.is_control() || c == '?' || c == '#' {
                return Err(PathError::InvalidSegment {
                    segment: segment.to_string(),
                    position,
                    message: format!("segment may not contain '{}'", c.escape_default()),
                });
            }
        }
        Ok(())
    }
}

impl fmt::Display for RoutePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("/"))
    }
}

impl TryFrom<&str> for RoutePath {
    type Error = PathError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        RoutePath::parse(s)
    }
}

/// Construct a [`RoutePath`] from a literal, panicking on invalid input.
///
/// Intended for paths known at compile time.
#[macro_export]
macro_rules! route_path {
    ($s:expr) => {
        $crate::RoutePath::parse($s).expect("invalid route path literal")
    };
}
