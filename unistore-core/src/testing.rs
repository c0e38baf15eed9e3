//! Test utilities for unistore applications
//!
//! - [`Recorder`]: a service that records every hook it receives
//! - [`EventLog`]: the shared log recorders write to, queryable by hook,
//!   service and command
//! - Assertion macros for hook order and event counts
//!
//! # Example
//!
//! ```
//! use unistore_core::testing::{EventLog, Hook, Recorder};
//! use unistore_core::{assert_hook_order, Store};
//!
//! let log = EventLog::new();
//! let store: Store<i32> = Store::new(
//!     0,
//!     vec![
//!         Box::new(Recorder::new("first", log.clone())),
//!         Box::new(Recorder::new("second", log.clone())),
//!     ],
//! );
//! store.send(|n: &mut i32| { *n += 1; None });
//!
//! assert_hook_order!(log, Hook::WillDispatch, ["first", "second"]);
//! assert_hook_order!(log, Hook::Run, ["second", "first"]);
//! ```

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use serde::Serialize;

use crate::handle::StoreRef;
use crate::inject::{Injectable, Injector};
use crate::service::Service;

/// Service lifecycle hook, as recorded by [`Recorder`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Hook {
    Attach,
    WillInit,
    WillDispatch,
    WillRunAction,
    Run,
    DidDispatch,
    WillShutdown,
}

/// One recorded hook call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LifecycleEvent<C> {
    pub service: &'static str,
    pub hook: Hook,
    /// The command passed to `run`; always `None` for other hooks
    pub command: Option<C>,
}

/// Shared, append-only log of lifecycle events
pub struct EventLog<C> {
    events: Rc<RefCell<Vec<LifecycleEvent<C>>>>,
}

impl<C> EventLog<C> {
    /// Create an empty log
    pub fn new() -> Self {
        Self {
            events: Rc::new(RefCell::new(Vec::new())),
        }
    }

    /// Append an event
    pub fn push(&self, service: &'static str, hook: Hook, command: Option<C>) {
        self.events.borrow_mut().push(LifecycleEvent {
            service,
            hook,
            command,
        });
    }

    /// Hooks in the order they were recorded
    pub fn hooks(&self) -> Vec<Hook> {
        self.events.borrow().iter().map(|e| e.hook).collect()
    }

    /// Services that received `hook`, in call order
    pub fn services_for(&self, hook: Hook) -> Vec<&'static str> {
        self.events
            .borrow()
            .iter()
            .filter(|e| e.hook == hook)
            .map(|e| e.service)
            .collect()
    }

    /// Number of recorded `hook` calls
    pub fn count(&self, hook: Hook) -> usize {
        self.events
            .borrow()
            .iter()
            .filter(|e| e.hook == hook)
            .count()
    }

    /// Number of recorded events
    pub fn len(&self) -> usize {
        self.events.borrow().len()
    }

    /// True if nothing was recorded
    pub fn is_empty(&self) -> bool {
        self.events.borrow().is_empty()
    }

    /// Forget every event
    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }
}

impl<C: Clone> EventLog<C> {
    /// Snapshot of every event
    pub fn events(&self) -> Vec<LifecycleEvent<C>> {
        self.events.borrow().clone()
    }

    /// Commands `service` received through `run`, one entry per action
    pub fn commands_for(&self, service: &str) -> Vec<Option<C>> {
        self.events
            .borrow()
            .iter()
            .filter(|e| e.hook == Hook::Run && e.service == service)
            .map(|e| e.command.clone())
            .collect()
    }
}

impl<C: Serialize> EventLog<C> {
    /// Serialize the log as a JSON array, for snapshot-style assertions
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&*self.events.borrow())
    }
}

impl<C> Clone for EventLog<C> {
    fn clone(&self) -> Self {
        Self {
            events: Rc::clone(&self.events),
        }
    }
}

impl<C> Default for EventLog<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: fmt::Debug> fmt::Debug for EventLog<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.events.borrow().iter()).finish()
    }
}

/// Service that records every hook it receives into an [`EventLog`]
#[derive(Debug)]
pub struct Recorder<C> {
    name: &'static str,
    log: EventLog<C>,
}

impl<C> Recorder<C> {
    /// Record as `name` into `log`
    pub fn new(name: &'static str, log: EventLog<C>) -> Self {
        Self { name, log }
    }

    /// The log this recorder writes to
    pub fn log(&self) -> &EventLog<C> {
        &self.log
    }
}

impl<C> Injectable for Recorder<C> {
    fn inject(&self, _injector: &mut Injector<'_>) {}
}

impl<S, C: Clone> Service<S, C> for Recorder<C> {
    fn attach(&mut self, _store: StoreRef<S, C>) {
        self.log.push(self.name, Hook::Attach, None);
    }

    fn app_will_init(&mut self) {
        self.log.push(self.name, Hook::WillInit, None);
    }

    fn app_will_dispatch(&mut self) {
        self.log.push(self.name, Hook::WillDispatch, None);
    }

    fn app_will_run_action(&mut self) {
        self.log.push(self.name, Hook::WillRunAction, None);
    }

    fn run(&mut self, command: Option<&C>) {
        self.log.push(self.name, Hook::Run, command.cloned());
    }

    fn app_did_dispatch(&mut self) {
        self.log.push(self.name, Hook::DidDispatch, None);
    }

    fn app_will_shutdown(&mut self) {
        self.log.push(self.name, Hook::WillShutdown, None);
    }

    fn name(&self) -> &'static str {
        self.name
    }
}

// ============================================================================
// Assertion Macros
// ============================================================================

/// Assert which services received a hook, in call order.
///
/// # Example
///
/// ```ignore
/// assert_hook_order!(log, Hook::WillInit, ["auth", "sync"]);
/// assert_hook_order!(log, Hook::WillShutdown, ["sync", "auth"]);
/// ```
#[macro_export]
macro_rules! assert_hook_order {
    ($log:expr, $hook:expr, [$($service:expr),* $(,)?]) => {{
        let actual = $log.services_for($hook);
        let expected: ::std::vec::Vec<&str> = ::std::vec![$($service),*];
        assert_eq!(
            actual, expected,
            "Unexpected service order for {:?}",
            $hook
        );
    }};
}

/// Count recorded events matching a pattern.
///
/// # Example
///
/// ```ignore
/// let runs = count_events!(log, LifecycleEvent { hook: Hook::Run, command: Some(_), .. });
/// assert_eq!(runs, 2);
/// ```
#[macro_export]
macro_rules! count_events {
    ($log:expr, $pattern:pat $(if $guard:expr)?) => {
        $log.events()
            .iter()
            .filter(|e| matches!(e, $pattern $(if $guard)?))
            .count()
    };
}
