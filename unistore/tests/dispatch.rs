//! End-to-end dispatch through the facade crate

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use unistore::prelude::*;
use unistore::testing::{EventLog, Hook, LifecycleEvent, Recorder};
use unistore::{assert_hook_order, count_events, InternalFlags, ResolvedInternalFlags};

#[derive(Debug, Clone, Default, PartialEq)]
struct Todo {
    title: String,
    done: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
struct AppState {
    todos: Vec<Todo>,
    filter: Option<bool>,
}

#[derive(Debug, Clone, PartialEq)]
enum Command {
    Added(usize),
    Toggled(usize),
}

struct AddTodo(&'static str);

impl Action<AppState> for AddTodo {
    type Command = Command;
    fn run(&self, state: &mut AppState) -> Option<Command> {
        state.todos.push(Todo {
            title: self.0.into(),
            done: false,
        });
        Some(Command::Added(state.todos.len() - 1))
    }
}

impl Undoable<AppState> for AddTodo {
    type Inverse = Truncate;
    fn inverse(&self, given: &AppState) -> Truncate {
        Truncate(given.todos.len())
    }
}

struct Truncate(usize);

impl Action<AppState> for Truncate {
    type Command = Command;
    fn run(&self, state: &mut AppState) -> Option<Command> {
        state.todos.truncate(self.0);
        None
    }
}

#[derive(Clone, Copy)]
struct SetDone(bool);

impl Action<bool> for SetDone {
    type Command = Command;
    fn run(&self, done: &mut bool) -> Option<Command> {
        *done = self.0;
        None
    }
}

impl Undoable<bool> for SetDone {
    type Inverse = SetDone;
    fn inverse(&self, given: &bool) -> SetDone {
        SetDone(*given)
    }
}

/// Toggles a todo whenever one is added, like an "auto-complete" rule
#[derive(Injectable, Default)]
struct AutoComplete {
    store: StoreSlot<AppState, Command>,
}

impl Service<AppState, Command> for AutoComplete {
    fn attach(&mut self, store: StoreRef<AppState, Command>) {
        self.store.attach(store);
    }

    fn run(&mut self, command: Option<&Command>) {
        if let Some(Command::Added(index)) = command {
            let index = *index;
            self.store.get().send(move |s: &mut AppState| {
                s.todos[index].done = true;
                Some(Command::Toggled(index))
            });
        }
    }
}

#[test]
fn test_services_react_within_the_same_drain() {
    let log: EventLog<Command> = EventLog::new();
    let drains = Rc::new(Cell::new(0));
    let store: Store<AppState, Command> = Store::new(
        AppState::default(),
        vec![
            Box::new(AutoComplete::default()),
            Box::new(Recorder::new("log", log.clone())),
        ],
    );
    let counter = Rc::clone(&drains);
    store.on_will_change(move || counter.set(counter.get() + 1));

    store.send_action(AddTodo("write docs"));

    assert!(store.state().todos[0].done);
    assert_eq!(drains.get(), 1);
    assert_eq!(
        log.commands_for("log"),
        vec![Some(Command::Added(0)), Some(Command::Toggled(0))]
    );
    assert_eq!(
        count_events!(log, LifecycleEvent { hook: Hook::Run, command: Some(_), .. }),
        2
    );
}

#[test]
fn test_hook_order_across_services() {
    let log: EventLog<Command> = EventLog::new();
    let store: Store<AppState, Command> = Store::new(
        AppState::default(),
        vec![
            Box::new(Recorder::new("first", log.clone())),
            Box::new(Recorder::new("second", log.clone())),
            Box::new(LoggingService::verbose("app")),
        ],
    );
    store.send_action(AddTodo("a"));
    store.shut_down();

    assert_hook_order!(log, Hook::WillInit, ["first", "second"]);
    assert_hook_order!(log, Hook::WillRunAction, ["first", "second"]);
    assert_hook_order!(log, Hook::Run, ["second", "first"]);
    assert_hook_order!(log, Hook::WillShutdown, ["second", "first"]);
}

#[test]
fn test_lens_bound_undo() {
    let store: Store<AppState, Command> = Store::new(AppState::default(), vec![]);
    let undo: Rc<RefCell<UndoStack<AppState, Command>>> = Rc::new(RefCell::new(UndoStack::new()));
    store.send_action(AddTodo("a"));

    let first_done = lens!(AppState, todos)
        .then(Lens::new(|t: &Vec<Todo>| &t[0], |t: &mut Vec<Todo>| &mut t[0]))
        .then(lens!(Todo, done));

    store.send_with_undo(SetDone(true).on(first_done.clone()), &undo);
    store.send_with_undo(AddTodo("b"), &undo);
    assert_eq!(store.state().todos.len(), 2);
    assert!(*first_done.get(&store.state()));

    let handle = store.handle();
    undo.borrow_mut().undo(&handle);
    undo.borrow_mut().undo(&handle);
    assert_eq!(store.state().todos.len(), 1);
    assert!(!store.state().todos[0].done);
}

#[test]
fn test_chain_sends_one_step() {
    let log: EventLog<Command> = EventLog::new();
    let store: Store<AppState, Command> = Store::new(
        AppState::default(),
        vec![Box::new(Recorder::new("log", log.clone()))],
    );

    store.send_action(chain![AddTodo("a"), AddTodo("b"), AddTodo("c")]);

    assert_eq!(store.state().todos.len(), 3);
    // one action, the last command
    assert_eq!(log.commands_for("log"), vec![Some(Command::Added(2))]);
}

#[test]
fn test_module_for_sub_state() {
    let store: Store<AppState, Command> = Store::new(AppState::default(), vec![]);
    let filter = store.map(lens!(AppState, filter));

    filter.send(|f| {
        *f = Some(true);
        None
    });
    assert_eq!(filter.state(), Some(Some(true)));
}

#[test]
fn test_flags_from_json_silence_shutdown_warning() {
    let flags = ResolvedInternalFlags::from_json(r#"{"warn_actions_after_shutdown": false}"#)
        .expect("valid flags");
    let store: Store<AppState, Command> = Store::initialize(
        Dependencies::new().with::<InternalFlags>(flags),
        vec![],
        |_| AppState::default(),
    );
    store.shut_down();
    store.send_action(AddTodo("late"));
    assert!(store.state().todos.is_empty());
    assert!(store.is_shut_down());
}
