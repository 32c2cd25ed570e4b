//! End-to-end flows across slices, combined reducers, selectors and effects

use std::cell::RefCell;
use std::rc::Rc;

use pretty_assertions::assert_eq;
use serde_json::json;

use crate::{
    combine_reducers, load_persisted, matches_action, matches_action_with, matches_any,
    persist_state, Action, CombineReducers, MemoryStorage, Record, SameValue, Slice,
    SliceBuilder, Store,
};

#[derive(Debug, Clone, PartialEq)]
struct Counter {
    value: i64,
}

#[derive(Debug, Clone, PartialEq)]
struct Todo {
    id: String,
    done: bool,
}

#[derive(Debug, Clone)]
struct TodoId {
    id: String,
}

fn counter_slice() -> Slice<Rc<Counter>> {
    SliceBuilder::new("counter", Rc::new(Counter { value: 0 }))
        .case("increment", |state: &Rc<Counter>| {
            Rc::new(Counter {
                value: state.value + 1,
            })
        })
        .case("decrement", |state: &Rc<Counter>| {
            Rc::new(Counter {
                value: state.value - 1,
            })
        })
        .case("reset", |_: &Rc<Counter>| Rc::new(Counter { value: 0 }))
        .build()
}

fn todos_slice() -> Slice<Rc<Vec<Todo>>> {
    SliceBuilder::new("todos", Rc::new(Vec::new()))
        .case_with_json("add", |state: &Rc<Vec<Todo>>, id: &String| {
            let mut todos = (**state).clone();
            todos.push(Todo {
                id: id.clone(),
                done: false,
            });
            Rc::new(todos)
        })
        .case_with("toggle", |state: &Rc<Vec<Todo>>, payload: &TodoId| {
            let todos = state
                .iter()
                .map(|todo| Todo {
                    done: if todo.id == payload.id {
                        !todo.done
                    } else {
                        todo.done
                    },
                    ..todo.clone()
                })
                .collect();
            Rc::new(todos)
        })
        .build()
}

#[test]
fn test_counter_listener_sequence() {
    let counter = counter_slice();
    let actions = counter.actions();
    let increment = actions.get::<()>("increment").unwrap();
    let decrement = actions.get::<()>("decrement").unwrap();
    let reset = actions.get::<()>("reset").unwrap();

    let store = Store::new(counter.reducer());
    let values = Rc::new(RefCell::new(Vec::new()));
    let seen = values.clone();
    store.subscribe_selector(
        |state: &Rc<Counter>| state.value,
        move |value: &i64| seen.borrow_mut().push(*value),
    );

    store.dispatch(increment.create()).unwrap();
    store.dispatch(increment.create()).unwrap();
    store.dispatch(decrement.create()).unwrap();
    store.dispatch(reset.create()).unwrap();

    assert_eq!(*values.borrow(), vec![1, 2, 1, 0]);
}

#[test]
fn test_combined_slices_in_one_store() {
    let counter = counter_slice();
    let todos = todos_slice();
    let add = todos.actions().get::<String>("add").unwrap();
    let increment = counter.actions().get::<()>("increment").unwrap();

    let store = Store::new(combine_reducers(
        CombineReducers::new()
            .field("counter", counter.reducer())
            .field("todos", todos.reducer()),
    ));

    let counter_changes = Rc::new(RefCell::new(0));
    let c = counter_changes.clone();
    store.subscribe_selector(
        |state: &Record| state.get::<Rc<Counter>>("counter").cloned(),
        move |_| *c.borrow_mut() += 1,
    );

    let before = store.get_state();
    store.dispatch(Action::new("nobody/listens")).unwrap();
    assert!(before.same_value(&store.get_state()));

    store.dispatch(add.with("write docs".to_string())).unwrap();
    assert_eq!(*counter_changes.borrow(), 0);

    store.dispatch(increment.create()).unwrap();
    assert_eq!(*counter_changes.borrow(), 1);

    let state = store.get_state();
    assert_eq!(state.get::<Rc<Counter>>("counter").unwrap().value, 1);
    assert_eq!(
        state.get::<Rc<Vec<Todo>>>("todos").unwrap().as_slice(),
        &[Todo {
            id: "write docs".to_string(),
            done: false,
        }]
    );
}

#[test]
fn test_effect_for_special_toggle() {
    let todos = todos_slice();
    let add = todos.actions().get::<String>("add").unwrap();
    let toggle = todos.actions().get::<TodoId>("toggle").unwrap();
    let store = Store::new(todos.reducer());

    let toggled = Rc::new(RefCell::new(Vec::new()));
    let t = toggled.clone();
    let creator = toggle.clone();
    store.subscribe_effect(
        matches_action_with(&toggle, |payload: &TodoId| payload.id == "special"),
        move |action, ctx| {
            let payload = creator
                .payload_of(action)
                .ok_or_else(|| anyhow::anyhow!("unexpected payload"))?;
            let done = ctx
                .get_state()
                .iter()
                .find(|todo| todo.id == payload.id)
                .map(|todo| todo.done);
            t.borrow_mut().push(done);
            Ok(())
        },
    );

    store.dispatch(add.with("special".to_string())).unwrap();
    store.dispatch(add.with("plain".to_string())).unwrap();
    store
        .dispatch(toggle.with(TodoId {
            id: "plain".to_string(),
        }))
        .unwrap();
    store
        .dispatch(toggle.with(TodoId {
            id: "special".to_string(),
        }))
        .unwrap();

    assert_eq!(*toggled.borrow(), vec![Some(true)]);
}

#[test]
fn test_effect_chains_follow_up_action() {
    let counter = counter_slice();
    let increment = counter.actions().get::<()>("increment").unwrap();
    let reset = counter.actions().get::<()>("reset").unwrap();
    let store = Store::new(counter.reducer());

    // wrap around at 3
    let follow_up = reset.clone();
    store.subscribe_effect(matches_action(&increment), move |_, ctx| {
        if ctx.get_state().value >= 3 {
            ctx.dispatch(follow_up.create())?;
        }
        Ok(())
    });

    let values = Rc::new(RefCell::new(Vec::new()));
    let seen = values.clone();
    store.subscribe_selector(
        |state: &Rc<Counter>| state.value,
        move |value: &i64| seen.borrow_mut().push(*value),
    );

    for _ in 0..4 {
        store.dispatch(increment.create()).unwrap();
    }
    assert_eq!(*values.borrow(), vec![1, 2, 3, 0, 1]);
}

#[test]
fn test_foreign_json_action_reaches_slice() {
    let todos = todos_slice();
    let store = Store::new(todos.reducer());
    let seen = Rc::new(RefCell::new(Vec::new()));

    let s = seen.clone();
    store.subscribe_effect(
        |action: &Action| action.meta().contains_key("source"),
        move |action, _| {
            s.borrow_mut().push(action.meta()["source"].clone());
            Ok(())
        },
    );

    let action = Action::from_json(json!({
        "type": "todos/add",
        "payload": "from-json",
        "source": "widget",
    }))
    .unwrap();
    store.dispatch(action).unwrap();

    assert_eq!(
        store.get_state().as_slice(),
        &[Todo {
            id: "from-json".to_string(),
            done: false,
        }]
    );
    assert_eq!(*seen.borrow(), vec![json!("widget")]);
}

#[test]
fn test_combined_store_resumes_from_persisted_counter() {
    let storage = Rc::new(MemoryStorage::new());
    let combined = || {
        combine_reducers(
            CombineReducers::new()
                .field("counter", counter_slice().reducer())
                .field("todos", todos_slice().reducer()),
        )
    };

    let first = Store::new(combined());
    first.subscribe_effect(
        matches_any(["counter/increment"]),
        persist_state(storage.clone(), "counter", |state: &Record| {
            state
                .get::<Rc<Counter>>("counter")
                .map(|counter| counter.value)
        }),
    );
    first.dispatch(Action::new("counter/increment")).unwrap();
    first.dispatch(Action::new("counter/increment")).unwrap();

    let value: i64 = load_persisted::<Option<i64>>(storage.as_ref(), "counter")
        .unwrap()
        .flatten()
        .unwrap();
    let preloaded = Record::new().with_field("counter", Rc::new(Counter { value }));

    let second = Store::builder(combined())
        .preloaded_state(preloaded)
        .build();
    second.dispatch(Action::new("counter/increment")).unwrap();

    let state = second.get_state();
    assert_eq!(state.get::<Rc<Counter>>("counter").unwrap().value, 3);
    assert!(state.get::<Rc<Vec<Todo>>>("todos").unwrap().is_empty());
}
