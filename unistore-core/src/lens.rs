//! Fixed bidirectional accessors into a part of a larger state
//!
//! A [`Lens`] is the Rust stand-in for a writable key path: a pair of
//! accessors that borrow the same `Part` out of a `Whole`, once shared and
//! once mutably. Lenses are cheap to clone and compose with [`Lens::then`].
//!
//! # Example
//!
//! ```
//! use unistore_core::lens;
//! use unistore_core::lens::Lens;
//!
//! #[derive(Default)]
//! struct Editor { cursor: Cursor }
//! #[derive(Default)]
//! struct Cursor { line: usize }
//!
//! let cursor: Lens<Editor, Cursor> = lens!(Editor, cursor);
//! let line = cursor.then(lens!(Cursor, line));
//!
//! let mut editor = Editor::default();
//! *line.get_mut(&mut editor) = 4;
//! assert_eq!(*line.get(&editor), 4);
//! ```

use std::fmt;
use std::rc::Rc;

type Getter<W, P> = Rc<dyn Fn(&W) -> &P>;
type MutGetter<W, P> = Rc<dyn Fn(&mut W) -> &mut P>;

// Closures passed through these pick up the higher-ranked signature.
fn getter<W, P>(f: impl Fn(&W) -> &P + 'static) -> Getter<W, P> {
    Rc::new(f)
}

fn mut_getter<W, P>(f: impl Fn(&mut W) -> &mut P + 'static) -> MutGetter<W, P> {
    Rc::new(f)
}

/// Read/write accessor from `W` to one of its parts `P`
pub struct Lens<W, P> {
    get: Getter<W, P>,
    get_mut: MutGetter<W, P>,
}

impl<W: 'static, P: 'static> Lens<W, P> {
    /// Build a lens from a shared and a mutable accessor.
    ///
    /// Both accessors must point at the same part; the algebra relies on it
    /// when it inverts bound actions.
    pub fn new(
        get: impl Fn(&W) -> &P + 'static,
        get_mut: impl Fn(&mut W) -> &mut P + 'static,
    ) -> Self {
        Self {
            get: Rc::new(get),
            get_mut: Rc::new(get_mut),
        }
    }

    /// Borrow the part
    pub fn get<'a>(&self, whole: &'a W) -> &'a P {
        (self.get)(whole)
    }

    /// Borrow the part mutably
    pub fn get_mut<'a>(&self, whole: &'a mut W) -> &'a mut P {
        (self.get_mut)(whole)
    }

    /// Compose with a lens into the part, yielding a lens from `W` to `Q`
    pub fn then<Q: 'static>(&self, next: Lens<P, Q>) -> Lens<W, Q> {
        let outer_get = Rc::clone(&self.get);
        let outer_mut = Rc::clone(&self.get_mut);
        let inner_get = next.get;
        let inner_mut = next.get_mut;
        Lens {
            get: getter(move |w| inner_get(outer_get(w))),
            get_mut: mut_getter(move |w| inner_mut(outer_mut(w))),
        }
    }
}

impl<W: 'static> Lens<W, W> {
    /// The lens that focuses on the whole value
    pub fn identity() -> Self {
        Self::new(|w| w, |w| w)
    }
}

impl<W, P> Clone for Lens<W, P> {
    fn clone(&self) -> Self {
        Self {
            get: Rc::clone(&self.get),
            get_mut: Rc::clone(&self.get_mut),
        }
    }
}

impl<W, P> fmt::Debug for Lens<W, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lens")
            .field("whole", &std::any::type_name::<W>())
            .field("part", &std::any::type_name::<P>())
            .finish()
    }
}

/// Build a [`Lens`] from a type and a field path.
///
/// `lens!(AppState, settings.theme)` expands to a lens whose accessors borrow
/// `state.settings.theme`.
#[macro_export]
macro_rules! lens {
    ($whole:ty, $($field:tt).+) => {
        $crate::lens::Lens::new(
            |w: &$whole| &w.$($field).+,
            |w: &mut $whole| &mut w.$($field).+,
        )
    };
}
