//! Actions: composable, optionally invertible state mutations
//!
//! An [`Action`] mutates a state in place and may emit one command. Actions
//! are plain values, so they can be chained with [`Action::then`], lifted onto
//! a larger state with [`Action::on`], and inverted for undo when they
//! implement [`Undoable`].
//!
//! # Example
//!
//! ```
//! use unistore_core::action::{Action, Undoable};
//!
//! #[derive(Clone, Default, PartialEq, Debug)]
//! struct Doc { title: String }
//!
//! struct Rename(String);
//!
//! impl Action<Doc> for Rename {
//!     type Command = ();
//!     fn run(&self, doc: &mut Doc) -> Option<()> {
//!         doc.title = self.0.clone();
//!         None
//!     }
//! }
//!
//! impl Undoable<Doc> for Rename {
//!     type Inverse = Rename;
//!     fn inverse(&self, given: &Doc) -> Rename {
//!         Rename(given.title.clone())
//!     }
//! }
//!
//! let before = Doc { title: "draft".into() };
//! let rename = Rename("v1".into()).then(Rename("v2".into()));
//! let undo = rename.inverse(&before);
//!
//! let mut doc = before.clone();
//! rename.run(&mut doc);
//! assert_eq!(doc.title, "v2");
//! undo.run(&mut doc);
//! assert_eq!(doc, before);
//! ```

use std::fmt;
use std::marker::PhantomData;

use crate::lens::Lens;

/// A type-erased action as it sits in the store's queue
pub type BoxedAction<S, C> = Box<dyn FnOnce(&mut S) -> Option<C>>;

/// A state mutation that may emit a command
pub trait Action<S> {
    /// Command type this action can emit (`()` when unused)
    type Command;

    /// Apply the action to `state`, returning the emitted command, if any
    fn run(&self, state: &mut S) -> Option<Self::Command>;

    /// Name used in logs
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Run `self`, then `next`, on the same state.
    ///
    /// Only `next`'s command is emitted: a dispatched step has one command slot.
    fn then<B>(self, next: B) -> Chain<Self, B>
    where
        Self: Sized,
        B: Action<S, Command = Self::Command>,
    {
        Chain::new(self, next)
    }

    /// Lift this action onto a larger state through `lens`
    fn on<W>(self, lens: Lens<W, S>) -> Bound<W, S, Self>
    where
        Self: Sized,
    {
        Bound::new(lens, self)
    }

    /// Erase the action's type for queueing
    fn boxed(self) -> BoxedAction<S, Self::Command>
    where
        Self: Sized + 'static,
        S: 'static,
    {
        Box::new(move |state: &mut S| self.run(state))
    }
}

/// An action that can compute its own undo
pub trait Undoable<S>: Action<S> {
    /// The action that undoes `self`
    type Inverse: Action<S, Command = Self::Command>;

    /// Compute the inverse from the state as it is *before* `self` runs.
    ///
    /// Running `self` on `given` and then the returned action must restore
    /// `given`.
    fn inverse(&self, given: &S) -> Self::Inverse;
}

// ============================================================================
// Closure adapters
// ============================================================================

/// An action backed by a closure
pub struct FnAction<S, C, F> {
    f: F,
    _marker: PhantomData<fn(&mut S) -> Option<C>>,
}

/// Turn a closure into an [`Action`]
///
/// ```
/// use unistore_core::action::{action_fn, Action};
///
/// let increment = action_fn(|n: &mut i32| {
///     *n += 1;
///     None::<()>
/// });
///
/// let mut n = 0;
/// increment.then(action_fn(|n: &mut i32| { *n *= 10; None })).run(&mut n);
/// assert_eq!(n, 10);
/// ```
pub fn action_fn<S, C, F>(f: F) -> FnAction<S, C, F>
where
    F: Fn(&mut S) -> Option<C>,
{
    FnAction {
        f,
        _marker: PhantomData,
    }
}

impl<S, C, F> Action<S> for FnAction<S, C, F>
where
    F: Fn(&mut S) -> Option<C>,
{
    type Command = C;

    fn run(&self, state: &mut S) -> Option<C> {
        (self.f)(state)
    }
}

impl<S, C, F: Clone> Clone for FnAction<S, C, F> {
    fn clone(&self) -> Self {
        Self {
            f: self.f.clone(),
            _marker: PhantomData,
        }
    }
}

impl<S, C, F> fmt::Debug for FnAction<S, C, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnAction")
            .field("f", &std::any::type_name::<F>())
            .finish()
    }
}

/// A closure action paired with a closure that builds its inverse
pub struct Invertible<S, C, F, G, I> {
    forward: F,
    inverse: G,
    _marker: PhantomData<fn(&mut S) -> (Option<C>, I)>,
}

/// Pair a forward closure with an inverse factory
///
/// `inverse` receives the state before `forward` runs.
pub fn invertible<S, C, F, G, I>(forward: F, inverse: G) -> Invertible<S, C, F, G, I>
where
    F: Fn(&mut S) -> Option<C>,
    G: Fn(&S) -> I,
    I: Action<S, Command = C>,
{
    Invertible {
        forward,
        inverse,
        _marker: PhantomData,
    }
}

impl<S, C, F, G, I> Action<S> for Invertible<S, C, F, G, I>
where
    F: Fn(&mut S) -> Option<C>,
{
    type Command = C;

    fn run(&self, state: &mut S) -> Option<C> {
        (self.forward)(state)
    }
}

impl<S, C, F, G, I> Undoable<S> for Invertible<S, C, F, G, I>
where
    F: Fn(&mut S) -> Option<C>,
    G: Fn(&S) -> I,
    I: Action<S, Command = C>,
{
    type Inverse = I;

    fn inverse(&self, given: &S) -> I {
        (self.inverse)(given)
    }
}

// ============================================================================
// Composition
// ============================================================================

/// Two actions run back to back; see [`Action::then`]
#[derive(Debug, Clone)]
pub struct Chain<A, B> {
    first: A,
    second: B,
}

impl<A, B> Chain<A, B> {
    /// Chain `first` and `second`
    pub fn new(first: A, second: B) -> Self {
        Self { first, second }
    }

    /// The action that runs first
    pub fn first(&self) -> &A {
        &self.first
    }

    /// The action that runs second
    pub fn second(&self) -> &B {
        &self.second
    }
}

impl<S, A, B> Action<S> for Chain<A, B>
where
    A: Action<S>,
    B: Action<S, Command = A::Command>,
{
    type Command = A::Command;

    fn run(&self, state: &mut S) -> Option<Self::Command> {
        self.first.run(state);
        self.second.run(state)
    }
}

impl<S, A, B> Undoable<S> for Chain<A, B>
where
    S: Clone,
    A: Undoable<S>,
    B: Undoable<S, Command = A::Command>,
{
    type Inverse = Chain<B::Inverse, A::Inverse>;

    fn inverse(&self, given: &S) -> Self::Inverse {
        // `second` sees the state `first` leaves behind, so its inverse is
        // taken from a scratch copy advanced past `first`.
        let mut between = given.clone();
        self.first.run(&mut between);
        Chain::new(self.second.inverse(&between), self.first.inverse(given))
    }
}

/// An action on a part of the state, lifted onto the whole; see [`Action::on`]
pub struct Bound<W, P, A> {
    lens: Lens<W, P>,
    action: A,
}

impl<W, P, A> Bound<W, P, A> {
    /// Bind `action` to the part of `W` that `lens` focuses on
    pub fn new(lens: Lens<W, P>, action: A) -> Self {
        Self { lens, action }
    }

    /// The lifted action
    pub fn action(&self) -> &A {
        &self.action
    }
}

impl<W, P, A: Clone> Clone for Bound<W, P, A> {
    fn clone(&self) -> Self {
        Self {
            lens: self.lens.clone(),
            action: self.action.clone(),
        }
    }
}

impl<W, P, A: fmt::Debug> fmt::Debug for Bound<W, P, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bound")
            .field("lens", &self.lens)
            .field("action", &self.action)
            .finish()
    }
}

impl<W: 'static, P: 'static, A: Action<P>> Action<W> for Bound<W, P, A> {
    type Command = A::Command;

    fn run(&self, state: &mut W) -> Option<A::Command> {
        self.action.run(self.lens.get_mut(state))
    }

    fn name(&self) -> &'static str {
        self.action.name()
    }
}

impl<W: 'static, P: 'static, A: Undoable<P>> Undoable<W> for Bound<W, P, A> {
    type Inverse = Bound<W, P, A::Inverse>;

    fn inverse(&self, given: &W) -> Self::Inverse {
        Bound::new(
            self.lens.clone(),
            self.action.inverse(self.lens.get(given)),
        )
    }
}

// ============================================================================
// Scripts
// ============================================================================

/// An action defined by composing other actions
///
/// Wrap an implementor in [`Scripted`] to run or invert it.
///
/// ```
/// use unistore_core::action::{action_fn, Action, Script, Scripted};
///
/// struct Reset;
///
/// impl Script<Vec<i32>> for Reset {
///     type Body = Box<dyn Action<Vec<i32>, Command = ()>>;
///     fn body(&self) -> Self::Body {
///         Box::new(
///             action_fn(|v: &mut Vec<i32>| { v.clear(); None })
///                 .then(action_fn(|v: &mut Vec<i32>| { v.push(0); None })),
///         )
///     }
/// }
///
/// let mut v = vec![3, 4];
/// Scripted(Reset).run(&mut v);
/// assert_eq!(v, vec![0]);
/// ```
pub trait Script<S> {
    /// The composed action this script stands for
    type Body: Action<S>;

    /// Build the body
    fn body(&self) -> Self::Body;
}

/// Runs and inverts a [`Script`] exactly as its body
#[derive(Debug, Clone, Copy, Default)]
pub struct Scripted<T>(pub T);

impl<S, T: Script<S>> Action<S> for Scripted<T> {
    type Command = <T::Body as Action<S>>::Command;

    fn run(&self, state: &mut S) -> Option<Self::Command> {
        self.0.body().run(state)
    }

    fn name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

impl<S, T> Undoable<S> for Scripted<T>
where
    T: Script<S>,
    T::Body: Undoable<S>,
{
    type Inverse = <T::Body as Undoable<S>>::Inverse;

    fn inverse(&self, given: &S) -> Self::Inverse {
        self.0.body().inverse(given)
    }
}

impl<S, C> Action<S> for Box<dyn Action<S, Command = C>> {
    type Command = C;

    fn run(&self, state: &mut S) -> Option<C> {
        (**self).run(state)
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

/// Chain actions left to right: `chain![a, b, c]` is `a.then(b).then(c)`
#[macro_export]
macro_rules! chain {
    ($first:expr $(,)?) => {
        $first
    };
    ($first:expr, $second:expr $(, $rest:expr)* $(,)?) => {
        $crate::chain!($crate::action::Action::then($first, $second) $(, $rest)*)
    };
}
