//! Keyed environment of collaborator values
//!
//! [`Dependencies`] maps capability keys to values. A key is a type that
//! implements [`Dependency`]; reading a key that was never set yields the
//! key's default value, so every key is always readable.
//!
//! # Example
//!
//! ```
//! use unistore_core::dependency::{Dependencies, Dependency};
//!
//! struct ApiBaseUrl;
//!
//! impl Dependency for ApiBaseUrl {
//!     type Value = String;
//!     fn default_value() -> String {
//!         "http://localhost:8080".into()
//!     }
//! }
//!
//! let deps = Dependencies::new();
//! assert_eq!(deps.get::<ApiBaseUrl>(), "http://localhost:8080");
//!
//! let deps = deps.with::<ApiBaseUrl>("https://api.example.com".into());
//! assert_eq!(deps.get::<ApiBaseUrl>(), "https://api.example.com");
//! ```

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

/// A capability key with a declared default value
pub trait Dependency: 'static {
    /// The type of value stored under this key
    type Value: Clone + 'static;

    /// Value returned when the key was never set
    fn default_value() -> Self::Value;
}

/// Heterogeneous, key-typed environment
///
/// Cloning is cheap: values are shared, not copied.
#[derive(Clone, Default)]
pub struct Dependencies {
    values: HashMap<TypeId, Rc<dyn Any>>,
}

impl Dependencies {
    /// Create an environment where every key reads its default
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a key, falling back to its default value
    pub fn get<K: Dependency>(&self) -> K::Value {
        self.values
            .get(&TypeId::of::<K>())
            .and_then(|value| value.downcast_ref::<K::Value>())
            .cloned()
            .unwrap_or_else(K::default_value)
    }

    /// Set the value for a key
    pub fn set<K: Dependency>(&mut self, value: K::Value) {
        self.values.insert(TypeId::of::<K>(), Rc::new(value));
    }

    /// Builder form of [`set`](Self::set)
    pub fn with<K: Dependency>(mut self, value: K::Value) -> Self {
        self.set::<K>(value);
        self
    }

    /// Whether a value was set explicitly for this key
    pub fn contains<K: Dependency>(&self) -> bool {
        self.values.contains_key(&TypeId::of::<K>())
    }

    /// Number of explicitly set keys
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True if no key was set explicitly
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Flags the store reads about itself
    pub fn internal_flags(&self) -> ResolvedInternalFlags {
        self.get::<InternalFlags>()
    }
}

impl fmt::Debug for Dependencies {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dependencies")
            .field("values_count", &self.values.len())
            .finish()
    }
}

/// Key for [`ResolvedInternalFlags`]
pub enum InternalFlags {}

impl Dependency for InternalFlags {
    type Value = ResolvedInternalFlags;

    fn default_value() -> ResolvedInternalFlags {
        ResolvedInternalFlags::default()
    }
}

/// Flags the store uses internally, overridable through [`Dependencies`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolvedInternalFlags {
    /// Emit a warning when actions reach a store that has been shut down
    pub warn_actions_after_shutdown: bool,
}

impl Default for ResolvedInternalFlags {
    fn default() -> Self {
        Self {
            warn_actions_after_shutdown: true,
        }
    }
}

impl ResolvedInternalFlags {
    /// Parse flags from a JSON object. Missing fields keep their defaults.
    ///
    /// ```
    /// use unistore_core::dependency::ResolvedInternalFlags;
    ///
    /// let flags = ResolvedInternalFlags::from_json(r#"{"warn_actions_after_shutdown": false}"#)
    ///     .unwrap();
    /// assert!(!flags.warn_actions_after_shutdown);
    /// ```
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Retries;

    impl Dependency for Retries {
        type Value = u32;
        fn default_value() -> u32 {
            3
        }
    }

    struct Greeting;

    impl Dependency for Greeting {
        type Value = Rc<str>;
        fn default_value() -> Rc<str> {
            Rc::from("hello")
        }
    }

    #[test]
    fn test_defaults() {
        let deps = Dependencies::new();
        assert_eq!(deps.get::<Retries>(), 3);
        assert_eq!(&*deps.get::<Greeting>(), "hello");
        assert!(deps.is_empty());
        assert!(!deps.contains::<Retries>());
    }

    #[test]
    fn test_set_overrides_default() {
        let mut deps = Dependencies::new();
        deps.set::<Retries>(10);

        assert_eq!(deps.get::<Retries>(), 10);
        assert_eq!(&*deps.get::<Greeting>(), "hello");
        assert!(deps.contains::<Retries>());
        assert_eq!(deps.len(), 1);
    }

    #[test]
    fn test_clone_shares_values() {
        let deps = Dependencies::new().with::<Greeting>(Rc::from("hi"));
        let copy = deps.clone();
        assert!(Rc::ptr_eq(&deps.get::<Greeting>(), &copy.get::<Greeting>()));
    }

    #[test]
    fn test_internal_flags() {
        let deps = Dependencies::new();
        assert!(deps.internal_flags().warn_actions_after_shutdown);

        let deps = deps.with::<InternalFlags>(ResolvedInternalFlags {
            warn_actions_after_shutdown: false,
        });
        assert!(!deps.internal_flags().warn_actions_after_shutdown);
    }

    #[test]
    fn test_flags_from_json() {
        let flags = ResolvedInternalFlags::from_json("{}").unwrap();
        assert_eq!(flags, ResolvedInternalFlags::default());

        let flags =
            ResolvedInternalFlags::from_json(r#"{"warn_actions_after_shutdown": false}"#).unwrap();
        assert!(!flags.warn_actions_after_shutdown);

        assert!(ResolvedInternalFlags::from_json("[").is_err());
    }
}
