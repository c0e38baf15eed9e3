//! Tests for #[derive(CommandSet)] macro

use unistore::prelude::*;
use unistore::testing::{EventLog, Hook, Recorder};

#[derive(Debug, Clone, PartialEq)]
enum AuthCommand {
    LoggedIn(u32),
    LoggedOut,
}

#[derive(Debug, Clone, PartialEq)]
enum SyncCommand {
    Flush,
}

#[derive(CommandSet, Debug, Clone, PartialEq)]
enum AppCommand {
    Auth(AuthCommand),
    Sync(SyncCommand),
    #[command(skip)]
    Retry(SyncCommand),
    Quit,
}

#[test]
fn test_extract_and_embed() {
    let command = <AppCommand as CommandRoute<AuthCommand>>::embed(AuthCommand::LoggedOut);
    assert_eq!(command, AppCommand::Auth(AuthCommand::LoggedOut));

    assert_eq!(
        CommandRoute::<AuthCommand>::extract(&command),
        Some(&AuthCommand::LoggedOut)
    );
    assert_eq!(CommandRoute::<SyncCommand>::extract(&command), None);
}

#[test]
fn test_skipped_and_unit_variants_extract_nothing() {
    assert_eq!(
        CommandRoute::<SyncCommand>::extract(&AppCommand::Retry(SyncCommand::Flush)),
        None
    );
    assert_eq!(CommandRoute::<AuthCommand>::extract(&AppCommand::Quit), None);
    assert_eq!(
        CommandRoute::<SyncCommand>::extract(&AppCommand::Sync(SyncCommand::Flush)),
        Some(&SyncCommand::Flush)
    );
}

#[derive(Debug, Default)]
struct Session {
    user: Option<u32>,
    flushes: u32,
}

#[test]
fn test_routed_adapters_in_one_store() {
    let auth_log: EventLog<AuthCommand> = EventLog::new();
    let sync_log: EventLog<SyncCommand> = EventLog::new();

    let store: Store<Session, AppCommand> = Store::new(
        Session::default(),
        vec![
            Box::new(CommandAdapter::<_, Session, AuthCommand, AppCommand>::routed(
                Recorder::new("auth", auth_log.clone()),
            )),
            Box::new(CommandAdapter::<_, Session, SyncCommand, AppCommand>::routed(
                Recorder::new("sync", sync_log.clone()),
            )),
        ],
    );

    store.send(|s: &mut Session| {
        s.user = Some(42);
        Some(AppCommand::Auth(AuthCommand::LoggedIn(42)))
    });
    store.send(|s: &mut Session| {
        s.flushes += 1;
        Some(AppCommand::Sync(SyncCommand::Flush))
    });
    store.send(|_s: &mut Session| Some(AppCommand::Quit));

    assert_eq!(
        auth_log.commands_for("auth"),
        vec![Some(AuthCommand::LoggedIn(42)), None, None]
    );
    assert_eq!(
        sync_log.commands_for("sync"),
        vec![None, Some(SyncCommand::Flush), None]
    );
    assert_eq!(auth_log.count(Hook::WillRunAction), 3);
    assert_eq!(store.state().user, Some(42));
    assert_eq!(store.state().flushes, 1);
}
