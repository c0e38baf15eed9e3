//! Core traits and types for unistore
//!
//! This crate provides a single-writer state store with an ordered pipeline
//! of services, following a Redux/Elm-inspired architecture.
//!
//! # Core Concepts
//!
//! - **Action**: a mutation of the state that may emit a command
//! - **Store**: owns the state and applies queued actions strictly in order
//! - **Service**: observes lifecycle points around every action and reacts to
//!   commands
//! - **Dependencies**: keyed environment injected into services at startup
//! - **Module**: a read/write view of one part of the state
//!
//! # Basic Example
//!
//! ```
//! use unistore_core::prelude::*;
//!
//! #[derive(Default)]
//! struct AppState {
//!     counter: i32,
//! }
//!
//! struct Increment;
//!
//! impl Action<AppState> for Increment {
//!     type Command = ();
//!     fn run(&self, state: &mut AppState) -> Option<()> {
//!         state.counter += 1;
//!         None
//!     }
//! }
//!
//! let store: Store<AppState> = Store::new(AppState::default(), vec![]);
//! store.send_action(Increment);
//! store.send_action(Increment.then(Increment));
//! assert_eq!(store.state().counter, 3);
//! ```
//!
//! # Re-entrancy
//!
//! Actions sent while the store is applying actions (from inside an action,
//! a service hook or a will-change observer) are queued and applied by the
//! drain that is already running, after everything queued before them. A
//! send never applies an action out of order and never nests one drain in
//! another.
//!
//! # Async work
//!
//! The store is `!Send`. Work that finishes on another task or thread comes
//! back through an [`inbox::InboxSender`]; the store's thread pumps the
//! inbox, turning each message into an ordinary send:
//!
//! ```ignore
//! let (tx, mut rx) = unistore_core::inbox::inbox();
//! tokio::spawn(async move {
//!     let user = fetch_user().await;
//!     tx.send(move |s: &mut AppState| { s.user = Some(user); None });
//! });
//! while rx.recv_into(&store).await > 0 {}
//! ```

pub mod action;
pub mod adapter;
pub mod dependency;
pub mod detail;
mod handle;
#[cfg(feature = "inbox")]
pub mod inbox;
pub mod inject;
pub mod lens;
pub mod module;
pub mod service;
pub mod store;
pub mod testing;
pub mod undo;

// Action algebra exports
pub use action::{
    action_fn, invertible, Action, BoxedAction, Bound, Chain, FnAction, Invertible, Script,
    Scripted, Undoable,
};
pub use lens::Lens;

// Environment and injection exports
pub use dependency::{Dependencies, Dependency, InternalFlags, ResolvedInternalFlags};
pub use inject::{inject, Injectable, Injected, Injector, Projected};

// Service exports
pub use adapter::{CommandAdapter, CommandRoute};
pub use detail::{Detail, DetailService, PropertyEvents};
pub use service::{LifecycleEvents, LoggingService, Service, StoreSlot};

// Store exports
pub use handle::StoreRef;
pub use module::Module;
pub use store::{Phase, Store};
pub use undo::{UndoSink, UndoStack};

// Inbox exports (requires "inbox" feature)
#[cfg(feature = "inbox")]
pub use inbox::{Inbox, InboxSender};

// Testing exports
pub use testing::{EventLog, Hook, LifecycleEvent, Recorder};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::action::{action_fn, invertible, Action, Script, Scripted, Undoable};
    pub use crate::adapter::{CommandAdapter, CommandRoute};
    pub use crate::dependency::{Dependencies, Dependency};
    pub use crate::detail::{Detail, DetailService, PropertyEvents};
    pub use crate::inject::{Injectable, Injected, Injector, Projected};
    pub use crate::lens::Lens;
    pub use crate::module::Module;
    pub use crate::service::{LoggingService, Service, StoreSlot};
    pub use crate::store::Store;
    pub use crate::undo::{UndoSink, UndoStack};
    pub use crate::StoreRef;
    pub use crate::{chain, lens};

    #[cfg(feature = "inbox")]
    pub use crate::inbox::{inbox, Inbox, InboxSender};
}
