//! Cross-thread entry point for actions
//!
//! The store itself is single-threaded. Async tasks and worker threads hold
//! an [`InboxSender`] instead and post actions to it; the thread that owns
//! the store moves them into the store with [`Store::pump`] or
//! [`Inbox::recv_into`], where each one becomes an ordinary `send`.
//!
//! # Example
//!
//! ```
//! use unistore_core::{inbox, Store};
//!
//! let store: Store<Vec<u32>> = Store::new(Vec::new(), vec![]);
//! let (tx, mut rx) = inbox::inbox();
//!
//! let worker = std::thread::spawn(move || {
//!     for n in 0..3 {
//!         tx.send(move |v: &mut Vec<u32>| { v.push(n); None });
//!     }
//! });
//! worker.join().unwrap();
//!
//! assert_eq!(store.pump(&mut rx), 3);
//! assert_eq!(*store.state(), vec![0, 1, 2]);
//! ```

use std::fmt;

use tokio::sync::mpsc;

use crate::action::{Action, BoxedAction};
use crate::store::Store;

type SendAction<S, C> = Box<dyn FnOnce(&mut S) -> Option<C> + Send>;

/// Create a connected sender and inbox
pub fn inbox<S, C>() -> (InboxSender<S, C>, Inbox<S, C>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (InboxSender { tx }, Inbox { rx })
}

/// `Send` + `Clone` handle for posting actions from any thread
pub struct InboxSender<S, C = ()> {
    tx: mpsc::UnboundedSender<(&'static str, SendAction<S, C>)>,
}

impl<S, C> InboxSender<S, C> {
    /// Post a closure action. Returns `false` if the inbox was dropped.
    pub fn send<F>(&self, action: F) -> bool
    where
        F: FnOnce(&mut S) -> Option<C> + Send + 'static,
    {
        self.tx
            .send((std::any::type_name::<F>(), Box::new(action)))
            .is_ok()
    }

    /// Post an [`Action`] value
    pub fn send_action<A>(&self, action: A) -> bool
    where
        A: Action<S, Command = C> + Send + 'static,
    {
        let name = action.name();
        self.tx
            .send((name, Box::new(move |state: &mut S| action.run(state))))
            .is_ok()
    }

    /// Whether the inbox is gone
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

impl<S, C> Clone for InboxSender<S, C> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<S, C> fmt::Debug for InboxSender<S, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InboxSender")
            .field("closed", &self.tx.is_closed())
            .finish()
    }
}

/// Receiving end, owned by the store's thread
pub struct Inbox<S, C = ()> {
    rx: mpsc::UnboundedReceiver<(&'static str, SendAction<S, C>)>,
}

impl<S: 'static, C: 'static> Inbox<S, C> {
    /// Take the next waiting action without blocking
    pub(crate) fn try_next(&mut self) -> Option<(&'static str, BoxedAction<S, C>)> {
        let (name, action) = self.rx.try_recv().ok()?;
        Some((name, action as BoxedAction<S, C>))
    }

    /// Wait for at least one action, then send everything waiting to `store`.
    ///
    /// Returns the number of actions sent, or `0` once every sender is gone.
    pub async fn recv_into(&mut self, store: &Store<S, C>) -> usize {
        let Some((name, action)) = self.rx.recv().await else {
            return 0;
        };
        store.send_named(name, action);
        1 + store.pump(self)
    }

    /// Stop accepting new actions; waiting ones can still be pumped
    pub fn close(&mut self) {
        self.rx.close();
    }
}

impl<S, C> fmt::Debug for Inbox<S, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Inbox").finish_non_exhaustive()
    }
}
