//! Non-owning store handles
//!
//! A [`StoreRef`] is what services, modules and async glue hold on to. It
//! never keeps the store alive: once the owning [`Store`](crate::Store) is
//! dropped, reads return `None` and sends are discarded.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::action::{Action, BoxedAction, Undoable};
use crate::lens::Lens;
use crate::module::Module;
use crate::undo::UndoSink;

/// Backend of a [`StoreRef`]: the store itself, a projection, or a command
/// forwarder.
pub(crate) trait Dispatch<S, C> {
    /// Enqueue an action and drain if nothing else is draining
    fn send_boxed(&self, name: &'static str, action: BoxedAction<S, C>);

    /// Call `f` with the current state. Returns `false` if the state is
    /// unavailable (store dropped, or an action is mutating it right now).
    fn read(&self, f: &mut dyn FnMut(&S)) -> bool;

    /// Register a will-change observer
    fn observe(&self, observer: Box<dyn FnMut()>) -> bool;

    /// Whether the backing store still exists
    fn is_alive(&self) -> bool;
}

/// Cloneable, non-owning handle to a store (or a part of one)
pub struct StoreRef<S, C = ()> {
    dispatch: Rc<dyn Dispatch<S, C>>,
}

impl<S: 'static, C: 'static> StoreRef<S, C> {
    pub(crate) fn from_dispatch(dispatch: impl Dispatch<S, C> + 'static) -> Self {
        Self {
            dispatch: Rc::new(dispatch),
        }
    }

    pub(crate) fn send_named(&self, name: &'static str, action: BoxedAction<S, C>) {
        self.dispatch.send_boxed(name, action);
    }

    pub(crate) fn dispatch(&self) -> &dyn Dispatch<S, C> {
        &*self.dispatch
    }

    /// Enqueue a closure action.
    ///
    /// Inside a running dispatch this only enqueues; the running drain picks
    /// the action up before it finishes.
    pub fn send<F>(&self, action: F)
    where
        F: FnOnce(&mut S) -> Option<C> + 'static,
    {
        self.send_named(std::any::type_name::<F>(), Box::new(action));
    }

    /// Enqueue an [`Action`] value
    pub fn send_action<A>(&self, action: A)
    where
        A: Action<S, Command = C> + 'static,
    {
        let name = action.name();
        self.send_named(name, action.boxed());
    }

    /// Enqueue `action` and register its inverse with `sink`.
    ///
    /// The inverse is computed when the action runs, from the state it is
    /// about to change. Actions queued ahead of it are not part of the undo.
    pub fn send_with_undo<A, U>(&self, action: A, sink: &Rc<RefCell<U>>)
    where
        A: Undoable<S, Command = C> + 'static,
        A::Inverse: 'static,
        U: UndoSink<S, C> + ?Sized + 'static,
    {
        let name = action.name();
        let sink = Rc::clone(sink);
        self.send_named(
            name,
            Box::new(move |state: &mut S| {
                let inverse = action.inverse(state);
                match sink.try_borrow_mut() {
                    Ok(mut sink) => sink.register_undo(inverse.name(), inverse.boxed()),
                    Err(_) => {
                        tracing::debug!(action = name, "Undo sink busy, undo not registered")
                    }
                }
                action.run(state)
            }),
        );
    }

    /// Read the state. `None` if the store is gone or the state is being
    /// mutated by a running action.
    pub fn with_state<R>(&self, f: impl FnOnce(&S) -> R) -> Option<R> {
        let mut f = Some(f);
        let mut out = None;
        self.dispatch.read(&mut |state| {
            if let Some(f) = f.take() {
                out = Some(f(state));
            }
        });
        out
    }

    /// Clone of the current state
    pub fn state(&self) -> Option<S>
    where
        S: Clone,
    {
        self.with_state(S::clone)
    }

    /// Project onto a part of the state
    pub fn map<P: 'static>(&self, lens: Lens<S, P>) -> Module<S, P, C> {
        Module::new(self.clone(), lens)
    }

    /// Register an observer called once per drain, before the first action
    /// mutates the state. Returns `false` if the store is gone.
    pub fn on_will_change(&self, observer: impl FnMut() + 'static) -> bool {
        self.dispatch.observe(Box::new(observer))
    }

    /// Whether the store behind this handle still exists
    pub fn is_alive(&self) -> bool {
        self.dispatch.is_alive()
    }
}

impl<S, C> Clone for StoreRef<S, C> {
    fn clone(&self) -> Self {
        Self {
            dispatch: Rc::clone(&self.dispatch),
        }
    }
}

impl<S, C> fmt::Debug for StoreRef<S, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreRef")
            .field("alive", &self.dispatch.is_alive())
            .finish()
    }
}
