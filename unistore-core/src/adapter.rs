//! Command adaptation between store levels
//!
//! A service written for a small command type can be registered with a store
//! whose command type is larger. The larger type is usually an enum with one
//! variant per sub-system; [`CommandRoute`] describes how to get a small
//! command out of a big one and how to put it back.
//!
//! # Example
//!
//! ```ignore
//! use unistore::prelude::*;
//!
//! #[derive(Debug, Clone, PartialEq)]
//! enum AuthCommand { LoggedIn }
//!
//! #[derive(Debug, Clone, PartialEq, CommandSet)]
//! enum AppCommand {
//!     Auth(AuthCommand),
//!     Sync(SyncCommand),
//! }
//!
//! let store: Store<App, AppCommand> = Store::new(
//!     App::default(),
//!     vec![Box::new(CommandAdapter::routed(AuthService::default()))],
//! );
//! ```

use std::fmt;
use std::marker::PhantomData;

use crate::action::BoxedAction;
use crate::handle::{Dispatch, StoreRef};
use crate::inject::{Injectable, Injector};
use crate::service::Service;

/// Routing between a composite command type and one of its parts
///
/// Derive it with `#[derive(CommandSet)]` on an enum whose variants each
/// wrap one command type.
pub trait CommandRoute<Small>: Sized {
    /// The part, if this command is one
    fn extract(&self) -> Option<&Small>;

    /// Wrap a part
    fn embed(small: Small) -> Self;
}

/// Every command type routes to itself
impl<C> CommandRoute<C> for C {
    fn extract(&self) -> Option<&C> {
        Some(self)
    }

    fn embed(small: C) -> C {
        small
    }
}

/// Runs a `Service<S, Small>` inside a store whose commands are `Big`
pub struct CommandAdapter<Svc, S, Small, Big> {
    inner: Svc,
    extract: fn(&Big) -> Option<&Small>,
    embed: fn(Small) -> Big,
    _state: PhantomData<fn(&mut S)>,
}

impl<Svc, S, Small, Big> CommandAdapter<Svc, S, Small, Big>
where
    Svc: Service<S, Small>,
{
    /// Adapt `inner` with explicit routing functions
    pub fn new(inner: Svc, extract: fn(&Big) -> Option<&Small>, embed: fn(Small) -> Big) -> Self {
        Self {
            inner,
            extract,
            embed,
            _state: PhantomData,
        }
    }

    /// Adapt `inner` using `Big`'s [`CommandRoute`] impl
    pub fn routed(inner: Svc) -> Self
    where
        Big: CommandRoute<Small>,
    {
        Self::new(
            inner,
            <Big as CommandRoute<Small>>::extract,
            <Big as CommandRoute<Small>>::embed,
        )
    }

    /// The wrapped service
    pub fn inner(&self) -> &Svc {
        &self.inner
    }

    /// The wrapped service, mutably
    pub fn inner_mut(&mut self) -> &mut Svc {
        &mut self.inner
    }

    /// Unwrap the service
    pub fn into_inner(self) -> Svc {
        self.inner
    }
}

impl<Svc: fmt::Debug, S, Small, Big> fmt::Debug for CommandAdapter<Svc, S, Small, Big> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandAdapter")
            .field("inner", &self.inner)
            .field("small", &std::any::type_name::<Small>())
            .field("big", &std::any::type_name::<Big>())
            .finish()
    }
}

impl<Svc, S, Small, Big> Injectable for CommandAdapter<Svc, S, Small, Big>
where
    Svc: Injectable + 'static,
{
    fn inject(&self, injector: &mut Injector<'_>) {
        injector.descend(&self.inner);
    }
}

impl<Svc, S, Small, Big> Service<S, Big> for CommandAdapter<Svc, S, Small, Big>
where
    Svc: Service<S, Small> + 'static,
    S: 'static,
    Small: 'static,
    Big: 'static,
{
    fn attach(&mut self, store: StoreRef<S, Big>) {
        self.inner.attach(StoreRef::from_dispatch(Forward {
            outer: store,
            embed: self.embed,
        }));
    }

    fn app_will_init(&mut self) {
        self.inner.app_will_init();
    }

    fn app_will_dispatch(&mut self) {
        self.inner.app_will_dispatch();
    }

    fn app_will_run_action(&mut self) {
        self.inner.app_will_run_action();
    }

    fn run(&mut self, command: Option<&Big>) {
        // A command meant for another part still counts as a step.
        let small = command.and_then(self.extract);
        self.inner.run(small);
    }

    fn app_did_dispatch(&mut self) {
        self.inner.app_did_dispatch();
    }

    fn app_will_shutdown(&mut self) {
        self.inner.app_will_shutdown();
    }

    fn name(&self) -> &'static str {
        self.inner.name()
    }
}

/// Handle backend that lifts a small store's sends into the big store
struct Forward<S, Small, Big> {
    outer: StoreRef<S, Big>,
    embed: fn(Small) -> Big,
}

impl<S: 'static, Small: 'static, Big: 'static> Dispatch<S, Small> for Forward<S, Small, Big> {
    fn send_boxed(&self, name: &'static str, action: BoxedAction<S, Small>) {
        let embed = self.embed;
        self.outer
            .send_named(name, Box::new(move |state: &mut S| action(state).map(embed)));
    }

    fn read(&self, f: &mut dyn FnMut(&S)) -> bool {
        self.outer.dispatch().read(f)
    }

    fn observe(&self, observer: Box<dyn FnMut()>) -> bool {
        self.outer.dispatch().observe(observer)
    }

    fn is_alive(&self) -> bool {
        self.outer.is_alive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::StoreSlot;
    use crate::testing::{EventLog, Hook, Recorder};
    use crate::Store;

    #[derive(Debug, Clone, PartialEq)]
    enum Auth {
        LoggedIn(u32),
    }

    #[derive(Debug, Clone, PartialEq)]
    enum Backup {
        Flush,
    }

    #[derive(Debug, Clone, PartialEq)]
    enum AppCommand {
        Auth(Auth),
        Backup(Backup),
    }

    impl CommandRoute<Auth> for AppCommand {
        fn extract(&self) -> Option<&Auth> {
            match self {
                AppCommand::Auth(auth) => Some(auth),
                _ => None,
            }
        }

        fn embed(small: Auth) -> Self {
            AppCommand::Auth(small)
        }
    }

    #[derive(Debug, Default, Clone, PartialEq)]
    struct App {
        user: Option<u32>,
        flushed: u32,
    }

    #[test]
    fn test_identity_route() {
        let command = Backup::Flush;
        assert_eq!(CommandRoute::<Backup>::extract(&command), Some(&Backup::Flush));
        assert_eq!(<Backup as CommandRoute<Backup>>::embed(Backup::Flush), Backup::Flush);
    }

    #[test]
    fn test_run_routes_or_passes_none() {
        let log: EventLog<Auth> = EventLog::new();
        let adapter: CommandAdapter<_, App, Auth, AppCommand> =
            CommandAdapter::routed(Recorder::new("auth", log.clone()));
        let store: Store<App, AppCommand> = Store::new(App::default(), vec![Box::new(adapter)]);

        store.send(|app: &mut App| {
            app.user = Some(7);
            Some(AppCommand::Auth(Auth::LoggedIn(7)))
        });
        store.send(|app: &mut App| {
            app.flushed += 1;
            Some(AppCommand::Backup(Backup::Flush))
        });
        store.send(|_app: &mut App| None);

        // every action reaches the inner service, foreign commands as None
        assert_eq!(log.count(Hook::Run), 3);
        assert_eq!(
            log.commands_for("auth"),
            vec![Some(Auth::LoggedIn(7)), None, None]
        );
    }

    #[test]
    fn test_every_hook_is_proxied() {
        let log: EventLog<Auth> = EventLog::new();
        let store: Store<App, AppCommand> = Store::new(
            App::default(),
            vec![Box::new(CommandAdapter::<_, App, Auth, AppCommand>::routed(
                Recorder::new("auth", log.clone()),
            ))],
        );
        store.send(|_app: &mut App| None);
        store.shut_down();

        assert_eq!(
            log.hooks(),
            vec![
                Hook::Attach,
                Hook::WillInit,
                Hook::WillDispatch,
                Hook::WillRunAction,
                Hook::Run,
                Hook::DidDispatch,
                Hook::WillShutdown,
            ]
        );
    }

    /// Logs a user in by sending a small-command action
    struct Login {
        store: StoreSlot<App, Auth>,
        seen: Vec<Auth>,
    }

    impl Injectable for Login {
        fn inject(&self, _injector: &mut Injector<'_>) {}
    }

    impl Service<App, Auth> for Login {
        fn attach(&mut self, store: StoreRef<App, Auth>) {
            self.store.attach(store);
        }

        fn app_will_init(&mut self) {
            self.store.get().send(|app: &mut App| {
                app.user = Some(1);
                Some(Auth::LoggedIn(1))
            });
        }

        fn run(&mut self, command: Option<&Auth>) {
            if let Some(command) = command {
                self.seen.push(command.clone());
            }
        }
    }

    fn auth_of(big: &AppCommand) -> Option<&Auth> {
        match big {
            AppCommand::Auth(auth) => Some(auth),
            _ => None,
        }
    }

    #[test]
    fn test_inner_sends_are_embedded() {
        let outer_log: EventLog<AppCommand> = EventLog::new();
        let store: Store<App, AppCommand> = Store::new(
            App::default(),
            vec![
                Box::new(Recorder::new("outer", outer_log.clone())),
                Box::new(CommandAdapter::<_, App, Auth, AppCommand>::new(
                    Login {
                        store: StoreSlot::new(),
                        seen: Vec::new(),
                    },
                    auth_of,
                    AppCommand::Auth,
                )),
            ],
        );

        assert_eq!(store.state().user, Some(1));
        assert_eq!(
            outer_log.commands_for("outer"),
            vec![Some(AppCommand::Auth(Auth::LoggedIn(1)))]
        );
    }

    #[test]
    fn test_forwarded_handle_reads_outer_state() {
        let store: Store<App, AppCommand> = Store::new(App::default(), vec![]);
        let small: StoreRef<App, Auth> = StoreRef::from_dispatch(Forward {
            outer: store.handle(),
            embed: AppCommand::Auth,
        });

        small.send(|app: &mut App| {
            app.flushed = 3;
            None
        });
        assert_eq!(small.with_state(|app| app.flushed), Some(3));
        assert!(small.is_alive());

        drop(store);
        assert!(!small.is_alive());
    }
}
