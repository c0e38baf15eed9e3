//! Explicit dependency injection
//!
//! Services declare the collaborators they need as [`Injected`] (or
//! [`Projected`]) fields and implement [`Injectable`] to hand those fields to
//! an [`Injector`]. The store runs one injector over every service at
//! construction, so collaborators reach deeply nested helpers without being
//! threaded through every constructor.
//!
//! Resolution is idempotent but not reactive: a slot keeps the first value it
//! was given, even if the same object is injected again later.
//!
//! # Example
//!
//! ```
//! use unistore_core::dependency::{Dependencies, Dependency};
//! use unistore_core::inject::{inject, Injectable, Injected, Injector};
//!
//! struct PageSize;
//! impl Dependency for PageSize {
//!     type Value = usize;
//!     fn default_value() -> usize { 50 }
//! }
//!
//! #[derive(Default)]
//! struct Pager {
//!     page_size: Injected<PageSize>,
//! }
//!
//! impl Injectable for Pager {
//!     fn inject(&self, injector: &mut Injector<'_>) {
//!         injector.resolve(&self.page_size);
//!     }
//! }
//!
//! let pager = Pager::default();
//! inject(&Dependencies::new().with::<PageSize>(20), &pager);
//! assert_eq!(*pager.page_size.get(), 20);
//! ```

use std::any::TypeId;
use std::cell::{OnceCell, RefCell};
use std::collections::HashSet;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::dependency::{Dependencies, Dependency};

/// A field resolved from [`Dependencies`] by key `K`
pub struct Injected<K: Dependency> {
    value: OnceCell<K::Value>,
}

impl<K: Dependency> Injected<K> {
    /// Create an unresolved slot
    pub fn new() -> Self {
        Self {
            value: OnceCell::new(),
        }
    }

    /// Resolve the slot. Does nothing if it already holds a value.
    pub fn resolve(&self, dependencies: &Dependencies) {
        self.value.get_or_init(|| dependencies.get::<K>());
    }

    /// The injected value.
    ///
    /// # Panics
    ///
    /// Panics if the owning object was never injected. That is a wiring bug:
    /// register the object with a store or call [`inject`] first.
    pub fn get(&self) -> &K::Value {
        self.value.get().unwrap_or_else(|| {
            panic!(
                "Injected<{}> read before injection",
                std::any::type_name::<K>()
            )
        })
    }

    /// The injected value, or `None` before injection
    pub fn try_get(&self) -> Option<&K::Value> {
        self.value.get()
    }

    /// Whether the slot was resolved
    pub fn is_resolved(&self) -> bool {
        self.value.get().is_some()
    }
}

impl<K: Dependency> Default for Injected<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Dependency> fmt::Debug for Injected<K>
where
    K::Value: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Injected").field(&self.value.get()).finish()
    }
}

/// A field computed from the whole environment by a read function
///
/// Useful when a service needs a part of a dependency value, or a value
/// combined from several keys.
pub struct Projected<V> {
    read: fn(&Dependencies) -> V,
    value: OnceCell<V>,
}

impl<V> Projected<V> {
    /// Create an unresolved slot reading through `read`
    pub fn new(read: fn(&Dependencies) -> V) -> Self {
        Self {
            read,
            value: OnceCell::new(),
        }
    }

    /// Resolve the slot. Does nothing if it already holds a value.
    pub fn resolve(&self, dependencies: &Dependencies) {
        self.value.get_or_init(|| (self.read)(dependencies));
    }

    /// The projected value.
    ///
    /// # Panics
    ///
    /// Panics if the owning object was never injected.
    pub fn get(&self) -> &V {
        self.value.get().unwrap_or_else(|| {
            panic!(
                "Projected<{}> read before injection",
                std::any::type_name::<V>()
            )
        })
    }

    /// The projected value, or `None` before injection
    pub fn try_get(&self) -> Option<&V> {
        self.value.get()
    }
}

impl<V: fmt::Debug> fmt::Debug for Projected<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Projected").field(&self.value.get()).finish()
    }
}

/// Objects that can receive injected collaborators
///
/// Implementations resolve their own slots and descend into sub-objects that
/// carry slots of their own. Use `#[derive(Injectable)]` to generate this
/// from `#[inject]` / `#[inject(nested)]` field attributes.
pub trait Injectable {
    /// Resolve this object's slots and visit its injectable children
    fn inject(&self, injector: &mut Injector<'_>);
}

/// Walks an object graph and resolves every slot it reaches
///
/// Each object is entered at most once, keyed by address and type, so graphs
/// that share or cycle through `Rc` terminate.
pub struct Injector<'a> {
    dependencies: &'a Dependencies,
    visited: HashSet<(usize, TypeId)>,
}

impl<'a> Injector<'a> {
    /// Create an injector over an environment snapshot
    pub fn new(dependencies: &'a Dependencies) -> Self {
        Self {
            dependencies,
            visited: HashSet::new(),
        }
    }

    /// The environment being injected
    pub fn dependencies(&self) -> &'a Dependencies {
        self.dependencies
    }

    /// Resolve a keyed slot
    pub fn resolve<K: Dependency>(&mut self, slot: &Injected<K>) {
        slot.resolve(self.dependencies);
    }

    /// Resolve a projected slot
    pub fn project<V>(&mut self, slot: &Projected<V>) {
        slot.resolve(self.dependencies);
    }

    /// Visit a child object unless it was visited already.
    ///
    /// Returns `true` if the child was entered.
    pub fn descend<T: Injectable + ?Sized + 'static>(&mut self, child: &T) -> bool {
        let key = (child as *const T as *const () as usize, TypeId::of::<T>());
        if !self.visited.insert(key) {
            return false;
        }
        child.inject(self);
        true
    }

    /// Number of distinct objects entered so far
    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }
}

impl fmt::Debug for Injector<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Injector")
            .field("visited", &self.visited.len())
            .finish()
    }
}

/// Inject `dependencies` into `object` and everything reachable from it
pub fn inject<T: Injectable + ?Sized + 'static>(dependencies: &Dependencies, object: &T) {
    Injector::new(dependencies).descend(object);
}

impl<T: Injectable + ?Sized + 'static> Injectable for Rc<T> {
    fn inject(&self, injector: &mut Injector<'_>) {
        injector.descend(&**self);
    }
}

impl<T: Injectable + 'static> Injectable for Weak<T> {
    fn inject(&self, injector: &mut Injector<'_>) {
        if let Some(target) = self.upgrade() {
            injector.descend(&*target);
        }
    }
}

impl<T: Injectable + ?Sized + 'static> Injectable for Box<T> {
    fn inject(&self, injector: &mut Injector<'_>) {
        injector.descend(&**self);
    }
}

impl<T: Injectable + ?Sized + 'static> Injectable for RefCell<T> {
    fn inject(&self, injector: &mut Injector<'_>) {
        // A value that is mutably borrowed is being worked on further up the
        // stack; it is skipped rather than aliased.
        if let Ok(inner) = self.try_borrow() {
            injector.descend(&*inner);
        }
    }
}

impl<T: Injectable + 'static> Injectable for Option<T> {
    fn inject(&self, injector: &mut Injector<'_>) {
        if let Some(inner) = self {
            injector.descend(inner);
        }
    }
}

impl<T: Injectable + 'static> Injectable for Vec<T> {
    fn inject(&self, injector: &mut Injector<'_>) {
        for item in self {
            injector.descend(item);
        }
    }
}

impl<K: Dependency> Injectable for Injected<K> {
    fn inject(&self, injector: &mut Injector<'_>) {
        injector.resolve(self);
    }
}

impl<V> Injectable for Projected<V> {
    fn inject(&self, injector: &mut Injector<'_>) {
        injector.project(self);
    }
}

impl Injectable for () {
    fn inject(&self, _injector: &mut Injector<'_>) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct Endpoint;
    impl Dependency for Endpoint {
        type Value = &'static str;
        fn default_value() -> &'static str {
            "local"
        }
    }

    struct Limit;
    impl Dependency for Limit {
        type Value = u32;
        fn default_value() -> u32 {
            1
        }
    }

    #[derive(Default)]
    struct Client {
        endpoint: Injected<Endpoint>,
        visits: Cell<u32>,
    }

    impl Injectable for Client {
        fn inject(&self, injector: &mut Injector<'_>) {
            self.visits.set(self.visits.get() + 1);
            injector.resolve(&self.endpoint);
        }
    }

    #[derive(Default)]
    struct Repository {
        limit: Injected<Limit>,
        client: Client,
    }

    impl Injectable for Repository {
        fn inject(&self, injector: &mut Injector<'_>) {
            injector.resolve(&self.limit);
            injector.descend(&self.client);
        }
    }

    #[test]
    fn test_resolves_nested_fields() {
        let repo = Repository::default();
        let deps = Dependencies::new().with::<Endpoint>("remote");

        inject(&deps, &repo);

        assert_eq!(*repo.limit.get(), 1);
        assert_eq!(*repo.client.endpoint.get(), "remote");
    }

    #[test]
    fn test_first_field_is_not_mistaken_for_parent() {
        // `client` would share its parent's address if it were laid out first;
        // the visited key includes the type, so both are entered.
        struct Wrapper {
            client: Client,
        }
        impl Injectable for Wrapper {
            fn inject(&self, injector: &mut Injector<'_>) {
                injector.descend(&self.client);
            }
        }

        let wrapper = Wrapper {
            client: Client::default(),
        };
        inject(&Dependencies::new(), &wrapper);
        assert!(wrapper.client.endpoint.is_resolved());
    }

    #[test]
    fn test_not_reactive() {
        let client = Client::default();
        inject(&Dependencies::new().with::<Endpoint>("first"), &client);
        inject(&Dependencies::new().with::<Endpoint>("second"), &client);

        assert_eq!(*client.endpoint.get(), "first");
        assert_eq!(client.visits.get(), 2);
    }

    #[test]
    fn test_shared_rc_visited_once() {
        let shared = Rc::new(Client::default());
        let holders = vec![Rc::clone(&shared), Rc::clone(&shared)];

        let deps = Dependencies::new();
        let mut injector = Injector::new(&deps);
        injector.descend(&holders);

        assert_eq!(shared.visits.get(), 1);
        assert!(shared.endpoint.is_resolved());
    }

    struct Node {
        limit: Injected<Limit>,
        next: RefCell<Option<Rc<Node>>>,
    }

    impl Injectable for Node {
        fn inject(&self, injector: &mut Injector<'_>) {
            injector.resolve(&self.limit);
            injector.descend(&self.next);
        }
    }

    #[test]
    fn test_cycle_terminates() {
        let a = Rc::new(Node {
            limit: Injected::new(),
            next: RefCell::new(None),
        });
        let b = Rc::new(Node {
            limit: Injected::new(),
            next: RefCell::new(Some(Rc::clone(&a))),
        });
        *a.next.borrow_mut() = Some(Rc::clone(&b));

        inject(&Dependencies::new().with::<Limit>(9), &a);

        assert_eq!(*a.limit.get(), 9);
        assert_eq!(*b.limit.get(), 9);

        // break the cycle so the test does not leak
        a.next.borrow_mut().take();
    }

    #[test]
    fn test_projected() {
        struct Settings {
            doubled: Projected<u32>,
        }
        impl Injectable for Settings {
            fn inject(&self, injector: &mut Injector<'_>) {
                injector.project(&self.doubled);
            }
        }

        let settings = Settings {
            doubled: Projected::new(|deps| deps.get::<Limit>() * 2),
        };
        assert!(settings.doubled.try_get().is_none());

        inject(&Dependencies::new().with::<Limit>(21), &settings);
        assert_eq!(*settings.doubled.get(), 42);
    }

    #[test]
    #[should_panic(expected = "read before injection")]
    fn test_get_before_injection_panics() {
        let client = Client::default();
        let _ = client.endpoint.get();
    }
}
