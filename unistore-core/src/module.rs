//! Read/write views of a part of a store's state
//!
//! A [`Module`] pairs a store handle with a [`Lens`]. Reads go through the
//! lens; sends are lifted onto the whole state and dispatched through the
//! parent store, so they take part in its queue and service pipeline.
//!
//! # Example
//!
//! ```
//! use unistore_core::{lens, Store};
//!
//! #[derive(Default)]
//! struct App { settings: Settings }
//!
//! #[derive(Default, Clone)]
//! struct Settings { dark_mode: bool }
//!
//! let store: Store<App> = Store::new(App::default(), vec![]);
//! let settings = store.map(lens!(App, settings));
//! settings.send(|s| { s.dark_mode = true; None });
//!
//! assert!(store.state().settings.dark_mode);
//! assert_eq!(settings.with_state(|s| s.dark_mode), Some(true));
//! ```

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::action::{Action, BoxedAction, Undoable};
use crate::handle::{Dispatch, StoreRef};
use crate::lens::Lens;
use crate::undo::UndoSink;

/// A store handle focused on the part of `W` that a lens selects
pub struct Module<W, P, C = ()> {
    parent: StoreRef<W, C>,
    lens: Lens<W, P>,
}

impl<W: 'static, P: 'static, C: 'static> Module<W, P, C> {
    /// Focus `parent` through `lens`
    pub fn new(parent: StoreRef<W, C>, lens: Lens<W, P>) -> Self {
        Self { parent, lens }
    }

    /// Read the focused part
    pub fn with_state<R>(&self, f: impl FnOnce(&P) -> R) -> Option<R> {
        let lens = &self.lens;
        self.parent.with_state(|whole| f(lens.get(whole)))
    }

    /// Clone of the focused part
    pub fn state(&self) -> Option<P>
    where
        P: Clone,
    {
        self.with_state(P::clone)
    }

    /// Send a closure that mutates the focused part
    pub fn send<F>(&self, action: F)
    where
        F: FnOnce(&mut P) -> Option<C> + 'static,
    {
        let lens = self.lens.clone();
        self.parent.send_named(
            std::any::type_name::<F>(),
            Box::new(move |whole: &mut W| action(lens.get_mut(whole))),
        );
    }

    /// Send an action on the focused part
    pub fn send_action<A>(&self, action: A)
    where
        A: Action<P, Command = C> + 'static,
    {
        self.parent.send_action(action.on(self.lens.clone()));
    }

    /// Send an action on the focused part and register its inverse
    pub fn send_with_undo<A, U>(&self, action: A, sink: &Rc<RefCell<U>>)
    where
        A: Undoable<P, Command = C> + 'static,
        A::Inverse: 'static,
        U: UndoSink<W, C> + ?Sized + 'static,
    {
        self.parent.send_with_undo(action.on(self.lens.clone()), sink);
    }

    /// Focus further into the focused part
    pub fn map<Q: 'static>(&self, lens: Lens<P, Q>) -> Module<W, Q, C> {
        Module::new(self.parent.clone(), self.lens.then(lens))
    }

    /// Handle over the focused part, for services written against `P`
    pub fn into_ref(self) -> StoreRef<P, C> {
        StoreRef::from_dispatch(self)
    }

    /// Register a will-change observer on the parent store
    pub fn on_will_change(&self, observer: impl FnMut() + 'static) -> bool {
        self.parent.on_will_change(observer)
    }

    /// Whether the parent store still exists
    pub fn is_alive(&self) -> bool {
        self.parent.is_alive()
    }
}

impl<W: 'static, P: 'static, C: 'static> Dispatch<P, C> for Module<W, P, C> {
    fn send_boxed(&self, name: &'static str, action: BoxedAction<P, C>) {
        let lens = self.lens.clone();
        self.parent
            .send_named(name, Box::new(move |whole: &mut W| action(lens.get_mut(whole))));
    }

    fn read(&self, f: &mut dyn FnMut(&P)) -> bool {
        let lens = &self.lens;
        self.parent.dispatch().read(&mut |whole| f(lens.get(whole)))
    }

    fn observe(&self, observer: Box<dyn FnMut()>) -> bool {
        self.parent.dispatch().observe(observer)
    }

    fn is_alive(&self) -> bool {
        self.parent.is_alive()
    }
}

impl<W, P, C> Clone for Module<W, P, C> {
    fn clone(&self) -> Self {
        Self {
            parent: self.parent.clone(),
            lens: self.lens.clone(),
        }
    }
}

impl<W, P, C> fmt::Debug for Module<W, P, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Module")
            .field("parent", &self.parent)
            .field("lens", &self.lens)
            .finish()
    }
}
