//! Services: ordered observers of the store lifecycle
//!
//! A service is registered with a store at construction and is told about
//! every lifecycle point: initialisation, the start and end of each drain,
//! each action, and shutdown. Services are the place for side effects; a
//! service reacts to the command an action emitted and may send new actions
//! through its [`StoreRef`].
//!
//! # Example
//!
//! ```
//! use unistore_core::inject::{Injectable, Injector};
//! use unistore_core::service::{Service, StoreSlot};
//! use unistore_core::{Store, StoreRef};
//!
//! #[derive(Default)]
//! struct Todos { items: Vec<String>, saved: usize }
//!
//! enum Command { Save }
//!
//! struct Saver { store: StoreSlot<Todos, Command> }
//!
//! impl Injectable for Saver {
//!     fn inject(&self, _injector: &mut Injector<'_>) {}
//! }
//!
//! impl Service<Todos, Command> for Saver {
//!     fn attach(&mut self, store: StoreRef<Todos, Command>) {
//!         self.store.attach(store);
//!     }
//!
//!     fn run(&mut self, command: Option<&Command>) {
//!         if let Some(Command::Save) = command {
//!             self.store.get().send(|t: &mut Todos| { t.saved = t.items.len(); None });
//!         }
//!     }
//! }
//!
//! let store: Store<Todos, Command> = Store::new(
//!     Todos::default(),
//!     vec![Box::new(Saver { store: StoreSlot::new() })],
//! );
//! store.send(|t: &mut Todos| { t.items.push("milk".into()); Some(Command::Save) });
//! assert_eq!(store.state().saved, 1);
//! ```

use std::fmt;

use bitflags::bitflags;

use crate::handle::StoreRef;
use crate::inject::{Injectable, Injector};

/// A participant in the store's lifecycle
///
/// Every hook defaults to a no-op. Setup hooks run in registration order;
/// `run`, `app_did_dispatch` and `app_will_shutdown` run in reverse
/// registration order.
pub trait Service<S, C = ()>: Injectable {
    /// Receive the store handle. Runs before injection.
    fn attach(&mut self, store: StoreRef<S, C>) {
        let _ = store;
    }

    /// Every service has been attached and injected
    fn app_will_init(&mut self) {}

    /// A drain is starting
    fn app_will_dispatch(&mut self) {}

    /// An action is about to run
    fn app_will_run_action(&mut self) {}

    /// An action ran and emitted `command` (`None` if it emitted nothing)
    fn run(&mut self, command: Option<&C>) {
        let _ = command;
    }

    /// A drain finished
    fn app_did_dispatch(&mut self) {}

    /// The store is shutting down
    fn app_will_shutdown(&mut self) {}

    /// Name used in logs
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Holder for the handle a service receives in [`Service::attach`]
pub struct StoreSlot<S, C = ()> {
    store: Option<StoreRef<S, C>>,
}

impl<S: 'static, C: 'static> StoreSlot<S, C> {
    /// Create an empty slot
    pub fn new() -> Self {
        Self { store: None }
    }

    /// Fill the slot. Attaching again replaces the handle.
    pub fn attach(&mut self, store: StoreRef<S, C>) {
        self.store = Some(store);
    }

    /// The attached handle.
    ///
    /// # Panics
    ///
    /// Panics if the service was never registered with a store.
    pub fn get(&self) -> &StoreRef<S, C> {
        self.store
            .as_ref()
            .unwrap_or_else(|| panic!("StoreSlot used before it was registered with a store"))
    }

    /// The attached handle, if any
    pub fn try_get(&self) -> Option<&StoreRef<S, C>> {
        self.store.as_ref()
    }

    /// Whether a handle was attached
    pub fn is_attached(&self) -> bool {
        self.store.is_some()
    }
}

impl<S: 'static, C: 'static> Default for StoreSlot<S, C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S, C> fmt::Debug for StoreSlot<S, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreSlot")
            .field("attached", &self.store.is_some())
            .finish()
    }
}

bitflags! {
    /// Lifecycle points a [`LoggingService`] reports
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct LifecycleEvents: u8 {
        const INIT = 1 << 0;
        const DISPATCH = 1 << 1;
        const ACTION = 1 << 2;
        const COMMAND = 1 << 3;
        const SHUTDOWN = 1 << 4;
    }
}

impl Default for LifecycleEvents {
    fn default() -> Self {
        Self::INIT | Self::COMMAND | Self::SHUTDOWN
    }
}

/// Service that reports lifecycle hooks as `tracing` debug events
#[derive(Debug, Clone)]
pub struct LoggingService {
    label: &'static str,
    events: LifecycleEvents,
    actions: u64,
}

impl LoggingService {
    /// Log init, commands and shutdown
    pub fn new(label: &'static str) -> Self {
        Self::with_events(label, LifecycleEvents::default())
    }

    /// Log every hook
    pub fn verbose(label: &'static str) -> Self {
        Self::with_events(label, LifecycleEvents::all())
    }

    /// Log the selected hooks
    pub fn with_events(label: &'static str, events: LifecycleEvents) -> Self {
        Self {
            label,
            events,
            actions: 0,
        }
    }

    /// Hooks this service reports
    pub fn events(&self) -> LifecycleEvents {
        self.events
    }

    /// Actions seen so far
    pub fn actions_seen(&self) -> u64 {
        self.actions
    }
}

impl Injectable for LoggingService {
    fn inject(&self, _injector: &mut Injector<'_>) {}
}

impl<S, C: fmt::Debug> Service<S, C> for LoggingService {
    fn app_will_init(&mut self) {
        if self.events.contains(LifecycleEvents::INIT) {
            tracing::debug!(store = self.label, "Store initializing");
        }
    }

    fn app_will_dispatch(&mut self) {
        if self.events.contains(LifecycleEvents::DISPATCH) {
            tracing::debug!(store = self.label, "Dispatch starting");
        }
    }

    fn app_will_run_action(&mut self) {
        self.actions += 1;
        if self.events.contains(LifecycleEvents::ACTION) {
            tracing::debug!(store = self.label, action = self.actions, "Running action");
        }
    }

    fn run(&mut self, command: Option<&C>) {
        if self.events.contains(LifecycleEvents::COMMAND) {
            if let Some(command) = command {
                tracing::debug!(store = self.label, command = ?command, "Command emitted");
            }
        }
    }

    fn app_did_dispatch(&mut self) {
        if self.events.contains(LifecycleEvents::DISPATCH) {
            tracing::debug!(
                store = self.label,
                actions_seen = self.actions,
                "Dispatch complete"
            );
        }
    }

    fn app_will_shutdown(&mut self) {
        if self.events.contains(LifecycleEvents::SHUTDOWN) {
            tracing::debug!(store = self.label, "Store shutting down");
        }
    }

    fn name(&self) -> &'static str {
        self.label
    }
}
