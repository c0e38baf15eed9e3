//! unistore: a single-writer state store with ordered services
//!
//! Like Redux/Elm: all state lives in one store and changes only through
//! actions applied strictly in order. Services observe each action, react to
//! the command it emitted, and receive their collaborators by injection.
//!
//! # Example
//! ```ignore
//! use unistore::prelude::*;
//!
//! #[derive(CommandSet, Debug, Clone)]
//! enum AppCommand {
//!     Auth(AuthCommand),
//!     Sync(SyncCommand),
//! }
//!
//! #[derive(Injectable)]
//! struct SyncService {
//!     #[inject]
//!     base_url: Injected<ApiBaseUrl>,
//!     store: StoreSlot<AppState, SyncCommand>,
//! }
//!
//! let store = Store::initialize(
//!     Dependencies::new().with::<ApiBaseUrl>("https://example.com".into()),
//!     vec![Box::new(CommandAdapter::routed(SyncService::default()))],
//!     |_| AppState::default(),
//! );
//! ```

// Re-export everything from core
pub use unistore_core::*;

// Re-export derive macros
pub use unistore_macros::{CommandSet, Injectable};

/// Prelude for convenient imports
pub mod prelude {
    // Actions
    pub use unistore_core::{
        action_fn, chain, invertible, lens, Action, Lens, Script, Scripted, Undoable,
    };

    // Environment
    pub use unistore_core::{Dependencies, Dependency, Injected, Injector, Projected};

    // Services
    pub use unistore_core::{
        CommandAdapter, CommandRoute, Detail, DetailService, LoggingService, PropertyEvents,
        Service, StoreSlot,
    };

    // Store
    pub use unistore_core::{Module, Store, StoreRef, UndoSink, UndoStack};

    #[cfg(feature = "inbox")]
    pub use unistore_core::inbox::{inbox, Inbox, InboxSender};

    // Traits and derive macros share names
    pub use unistore_core::Injectable;
    pub use unistore_macros::{CommandSet, Injectable};
}
