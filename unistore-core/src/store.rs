//! Single-writer state store with an ordered service pipeline
//!
//! The [`Store`] owns the state and a queue of pending actions. `send`
//! appends to the queue and drains it; actions sent while a drain is running
//! (by an action, a service, or an observer) are appended to the same queue
//! and run within that same drain, in send order.
//!
//! # Lifecycle
//!
//! ```text
//! Uninitialized ──(services attached, injected, app_will_init)──▶ Initialized
//! Initialized ──(shut_down)──▶ ShutDown   (terminal)
//! ```
//!
//! # Hook order
//!
//! Setup hooks run in registration order, teardown and "after" hooks in
//! reverse registration order:
//!
//! | hook                  | order   |
//! |-----------------------|---------|
//! | `app_will_init`       | forward |
//! | `app_will_dispatch`   | forward |
//! | `app_will_run_action` | forward |
//! | `run(command)`        | reverse |
//! | `app_did_dispatch`    | reverse |
//! | `app_will_shutdown`   | reverse |
//!
//! # Example
//!
//! ```
//! use unistore_core::Store;
//!
//! #[derive(Default)]
//! struct Counter { count: i32 }
//!
//! let store: Store<Counter> = Store::new(Counter::default(), vec![]);
//! for _ in 0..3 {
//!     store.send(|s: &mut Counter| { s.count += 1; None });
//! }
//! assert_eq!(store.state().count, 3);
//! ```

use std::cell::{Cell, Ref, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use crate::action::{Action, BoxedAction, Undoable};
use crate::dependency::{Dependencies, ResolvedInternalFlags};
use crate::handle::{Dispatch, StoreRef};
use crate::inject::Injector;
use crate::lens::Lens;
use crate::module::Module;
use crate::service::Service;
use crate::undo::UndoSink;

#[cfg(feature = "inbox")]
use crate::inbox::Inbox;

/// Lifecycle phase of a [`Store`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Services are being attached, injected and initialised
    Uninitialized,
    /// Accepting and applying actions
    Initialized,
    /// Terminal: actions are discarded
    ShutDown,
}

struct Queued<S, C> {
    name: &'static str,
    action: Option<BoxedAction<S, C>>,
}

pub(crate) struct StoreInner<S, C> {
    state: RefCell<S>,
    queue: RefCell<Vec<Queued<S, C>>>,
    services: RefCell<Vec<Box<dyn Service<S, C>>>>,
    observers: RefCell<Vec<Box<dyn FnMut()>>>,
    phase: Cell<Phase>,
    // Set while services are borrowed for init, drain or shutdown hooks.
    busy: Cell<bool>,
    shutdown_requested: Cell<bool>,
    flags: ResolvedInternalFlags,
}

impl<S: 'static, C: 'static> StoreInner<S, C> {
    fn send(&self, name: &'static str, action: BoxedAction<S, C>) {
        self.queue.borrow_mut().push(Queued {
            name,
            action: Some(action),
        });
        // A queue holding only this action means no drain is in flight.
        self.dispatch_actions(1);
    }

    fn dispatch_actions(&self, expected_actions: usize) {
        if self.phase.get() == Phase::Uninitialized {
            // drained as one batch once construction completes
            return;
        }

        if self.queue.borrow().len() != expected_actions {
            // All sends happen on one thread. More actions than expected
            // means an outer drain is running and its loop will reach them.
            return;
        }

        if self.busy.get() {
            // sent from a shutdown hook; discarded once shutdown completes
            return;
        }

        if self.phase.get() == Phase::ShutDown {
            let dropped = self.queue.take();
            self.warn_after_shutdown(dropped.len());
            return;
        }

        // Actions sent from app_did_dispatch miss a batch's loop and are
        // drained as the next batch.
        loop {
            self.busy.set(true);
            self.notify_will_change();

            let mut index = 0;
            {
                let mut services = self.services.borrow_mut();
                for service in services.iter_mut() {
                    service.app_will_dispatch();
                }

                loop {
                    // re-read: actions sent during this drain extend the loop
                    if index >= self.queue.borrow().len() {
                        break;
                    }
                    let (name, action) = {
                        let mut queue = self.queue.borrow_mut();
                        let entry = &mut queue[index];
                        (entry.name, entry.action.take())
                    };

                    for service in services.iter_mut() {
                        service.app_will_run_action();
                    }

                    let command = action.and_then(|action| {
                        tracing::trace!(action = name, "Running action");
                        let mut state = self.state.borrow_mut();
                        action(&mut state)
                    });

                    for service in services.iter_mut().rev() {
                        service.run(command.as_ref());
                    }

                    index += 1;
                }

                for service in services.iter_mut().rev() {
                    service.app_did_dispatch();
                }
            }

            let late = {
                let mut queue = self.queue.borrow_mut();
                *queue = queue.split_off(index);
                queue.len()
            };
            self.busy.set(false);
            tracing::trace!(actions = index, "Dispatch complete");

            if self.shutdown_requested.take() {
                self.shut_down();
                return;
            }
            if late == 0 {
                return;
            }
        }
    }

    fn notify_will_change(&self) {
        // Observers may register further observers while being notified.
        let mut observers = self.observers.take();
        for observer in observers.iter_mut() {
            observer();
        }
        let added = self.observers.replace(Vec::new());
        observers.extend(added);
        *self.observers.borrow_mut() = observers;
    }

    fn shut_down(&self) {
        if self.phase.get() == Phase::ShutDown {
            if self.flags.warn_actions_after_shutdown {
                tracing::warn!("shut_down called on a store that is already shut down");
            }
            return;
        }

        if self.busy.get() {
            tracing::debug!("Shutdown requested during dispatch, deferring");
            self.shutdown_requested.set(true);
            return;
        }

        self.busy.set(true);
        for service in self.services.borrow_mut().iter_mut().rev() {
            service.app_will_shutdown();
        }
        self.phase.set(Phase::ShutDown);
        self.busy.set(false);

        let dropped = self.queue.take();
        if !dropped.is_empty() {
            self.warn_after_shutdown(dropped.len());
        }
        tracing::debug!("Store shut down");
    }

    fn warn_after_shutdown(&self, dropped: usize) {
        if self.flags.warn_actions_after_shutdown {
            tracing::warn!(
                dropped,
                "The store has been shut down, actions are no longer accepted. \
                 Set warn_actions_after_shutdown to false in InternalFlags to silence this warning"
            );
        }
    }
}

struct Backref<S, C>(Weak<StoreInner<S, C>>);

impl<S: 'static, C: 'static> Dispatch<S, C> for Backref<S, C> {
    fn send_boxed(&self, name: &'static str, action: BoxedAction<S, C>) {
        match self.0.upgrade() {
            Some(inner) => inner.send(name, action),
            None => tracing::debug!(action = name, "Action sent to a dropped store"),
        }
    }

    fn read(&self, f: &mut dyn FnMut(&S)) -> bool {
        let Some(inner) = self.0.upgrade() else {
            return false;
        };
        let Ok(state) = inner.state.try_borrow() else {
            return false;
        };
        f(&state);
        true
    }

    fn observe(&self, observer: Box<dyn FnMut()>) -> bool {
        match self.0.upgrade() {
            Some(inner) => {
                inner.observers.borrow_mut().push(observer);
                true
            }
            None => false,
        }
    }

    fn is_alive(&self) -> bool {
        self.0.strong_count() > 0
    }
}

/// Owner of the application state and its service pipeline
///
/// `S` is the state, `C` the command type actions may emit (`()` when
/// commands are not used). The store is single-threaded by construction;
/// async work re-enters through an [`Inbox`](crate::inbox::Inbox).
pub struct Store<S, C = ()> {
    inner: Rc<StoreInner<S, C>>,
}

impl<S: 'static, C: 'static> Store<S, C> {
    /// Create a store from a literal initial state and an empty environment
    pub fn new(state: S, services: Vec<Box<dyn Service<S, C>>>) -> Self {
        Self::initialize(Dependencies::new(), services, move |_| state)
    }

    /// Create a store whose state is built from the environment.
    ///
    /// Each service is attached and injected in registration order, then
    /// `app_will_init` runs on each in registration order. Actions sent
    /// during construction are applied as one batch at the end.
    pub fn initialize(
        dependencies: Dependencies,
        services: Vec<Box<dyn Service<S, C>>>,
        initialize: impl FnOnce(&Dependencies) -> S,
    ) -> Self {
        let inner = Rc::new(StoreInner {
            state: RefCell::new(initialize(&dependencies)),
            queue: RefCell::new(Vec::new()),
            services: RefCell::new(services),
            observers: RefCell::new(Vec::new()),
            phase: Cell::new(Phase::Uninitialized),
            busy: Cell::new(true),
            shutdown_requested: Cell::new(false),
            flags: dependencies.internal_flags(),
        });
        let store = Self { inner };

        {
            let handle = store.handle();
            let mut services = store.inner.services.borrow_mut();
            let mut injector = Injector::new(&dependencies);
            for service in services.iter_mut() {
                service.attach(handle.clone());
                injector.descend(&**service);
            }
            for service in services.iter_mut() {
                service.app_will_init();
            }
            tracing::debug!(
                services = services.len(),
                injected = injector.visited_count(),
                "Store initialized"
            );
        }

        store.inner.phase.set(Phase::Initialized);
        store.inner.busy.set(false);

        let pending = store.inner.queue.borrow().len();
        if pending > 0 {
            store.inner.dispatch_actions(pending);
        }
        if store.inner.shutdown_requested.take() {
            store.inner.shut_down();
        }

        store
    }

    /// Borrow the current state.
    ///
    /// # Panics
    ///
    /// Panics if called while an action is mutating the state.
    pub fn state(&self) -> Ref<'_, S> {
        self.inner.state.borrow()
    }

    /// Enqueue a closure action and drain the queue
    pub fn send<F>(&self, action: F)
    where
        F: FnOnce(&mut S) -> Option<C> + 'static,
    {
        self.inner.send(std::any::type_name::<F>(), Box::new(action));
    }

    /// Enqueue an [`Action`] value
    pub fn send_action<A>(&self, action: A)
    where
        A: Action<S, Command = C> + 'static,
    {
        let name = action.name();
        self.inner.send(name, action.boxed());
    }

    #[cfg_attr(not(feature = "inbox"), allow(dead_code))]
    pub(crate) fn send_named(&self, name: &'static str, action: BoxedAction<S, C>) {
        self.inner.send(name, action);
    }

    /// Enqueue a closure that mutates the part of the state `lens` points at
    pub fn send_to<P, F>(&self, lens: Lens<S, P>, change: F)
    where
        P: 'static,
        F: FnOnce(&mut P) -> Option<C> + 'static,
    {
        self.inner.send(
            std::any::type_name::<F>(),
            Box::new(move |state: &mut S| change(lens.get_mut(state))),
        );
    }

    /// Enqueue `action` and register its inverse with `sink`, computed from
    /// the state the action runs against
    pub fn send_with_undo<A, U>(&self, action: A, sink: &Rc<RefCell<U>>)
    where
        A: Undoable<S, Command = C> + 'static,
        A::Inverse: 'static,
        U: UndoSink<S, C> + ?Sized + 'static,
    {
        self.handle().send_with_undo(action, sink);
    }

    /// Run `app_will_shutdown` on every service in reverse registration
    /// order and stop accepting actions.
    ///
    /// Called from inside a dispatch, the shutdown runs once that dispatch
    /// completes. Calling it again is a no-op.
    pub fn shut_down(&self) {
        self.inner.shut_down();
    }

    /// Non-owning handle for services, modules and callbacks
    pub fn handle(&self) -> StoreRef<S, C> {
        StoreRef::from_dispatch(Backref(Rc::downgrade(&self.inner)))
    }

    /// Read/write view of a part of the state
    pub fn map<P: 'static>(&self, lens: Lens<S, P>) -> Module<S, P, C> {
        Module::new(self.handle(), lens)
    }

    /// Register an observer called once per drain, before the first action
    /// of the drain mutates the state
    pub fn on_will_change(&self, observer: impl FnMut() + 'static) {
        self.inner.observers.borrow_mut().push(Box::new(observer));
    }

    /// Send every action waiting in `inbox`, in arrival order.
    ///
    /// Returns the number of actions taken from the inbox.
    #[cfg(feature = "inbox")]
    pub fn pump(&self, inbox: &mut Inbox<S, C>) -> usize {
        let mut count = 0;
        while let Some((name, action)) = inbox.try_next() {
            self.send_named(name, action);
            count += 1;
        }
        count
    }

    /// Current lifecycle phase
    pub fn phase(&self) -> Phase {
        self.inner.phase.get()
    }

    /// Whether construction has completed
    pub fn is_initialized(&self) -> bool {
        self.phase() != Phase::Uninitialized
    }

    /// Whether [`shut_down`](Self::shut_down) has completed
    pub fn is_shut_down(&self) -> bool {
        self.phase() == Phase::ShutDown
    }

    /// Number of registered services
    pub fn service_count(&self) -> usize {
        self.inner.services.borrow().len()
    }
}

impl<S, C> fmt::Debug for Store<S, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("phase", &self.inner.phase.get())
            .field("queued", &self.inner.queue.borrow().len())
            .field("flags", &self.inner.flags)
            .finish()
    }
}
