//! Reducers and reducer composition
//!
//! A reducer is a pure function `(previous state | uninitialized, action) -> next state`.
//! Called with `None` it returns the initial state; every later call transitions it.
//!
//! Two combinators build root reducers:
//! - [`create_reducer`]: handler table keyed by action discriminator
//! - [`combine_reducers`]: one sub-reducer per named field of a [`Record`]

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use crate::action::{Action, ActionCreator, Payload};
use crate::same_value::SameValue;

/// Shared handle to a pure state-transition function
pub struct Reducer<S> {
    reduce: Rc<dyn Fn(Option<&S>, &Action) -> S>,
}

impl<S> Reducer<S> {
    pub fn new<F>(reduce: F) -> Self
    where
        F: Fn(Option<&S>, &Action) -> S + 'static,
    {
        Self {
            reduce: Rc::new(reduce),
        }
    }

    /// Apply the reducer. `None` means the state is not initialized yet.
    pub fn reduce(&self, state: Option<&S>, action: &Action) -> S {
        (self.reduce)(state, action)
    }

    /// Seeding call: uninitialized state with the init action
    pub fn init(&self) -> S {
        self.reduce(None, &Action::init())
    }
}

impl<S> Clone for Reducer<S> {
    fn clone(&self) -> Self {
        Self {
            reduce: self.reduce.clone(),
        }
    }
}

type Handler<S> = Rc<dyn Fn(&S, &Action) -> S>;

/// Case handlers keyed by action discriminator
pub struct HandlerTable<S> {
    handlers: BTreeMap<String, Handler<S>>,
}

impl<S> HandlerTable<S> {
    pub fn new() -> Self {
        Self {
            handlers: BTreeMap::new(),
        }
    }

    /// Register `handler` for actions of `action_type`
    ///
    /// A later registration for the same discriminator replaces the earlier one.
    pub fn on<F>(mut self, action_type: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&S, &Action) -> S + 'static,
    {
        self.insert(action_type.into(), Rc::new(handler));
        self
    }

    /// Register a handler receiving the payload of actions built by `creator`
    ///
    /// Actions of the creator's type whose payload is missing or of another
    /// type leave the state untouched.
    pub fn on_action<P, F>(self, creator: &ActionCreator<P>, handler: F) -> Self
    where
        S: Clone,
        P: Payload,
        F: Fn(&S, &P) -> S + 'static,
    {
        let action_type = creator.action_type().to_string();
        self.on(action_type, move |state: &S, action: &Action| {
            match action.payload::<P>() {
                Some(payload) => handler(state, payload),
                None => {
                    log::warn!(
                        "Ignoring `{}`: payload is not a {}",
                        action.kind(),
                        std::any::type_name::<P>()
                    );
                    state.clone()
                }
            }
        })
    }

    pub(crate) fn insert(&mut self, action_type: String, handler: Handler<S>) {
        if self.handlers.insert(action_type.clone(), handler).is_some() {
            log::warn!(
                "Handler for `{}` registered twice, the later one wins",
                action_type
            );
        }
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    pub fn contains(&self, action_type: &str) -> bool {
        self.handlers.contains_key(action_type)
    }
}

impl<S> Default for HandlerTable<S> {
    fn default() -> Self {
        Self::new()
    }
}

/// Build a reducer from a handler table
///
/// Unknown discriminators return the previous state unchanged; for `Rc` states
/// this keeps the same allocation so identity-based change detection sees no change.
pub fn create_reducer<S>(initial_state: S, handlers: HandlerTable<S>) -> Reducer<S>
where
    S: Clone + 'static,
{
    let handlers = handlers.handlers;
    Reducer::new(move |state: Option<&S>, action: &Action| {
        let state = state.unwrap_or(&initial_state);
        match handlers.get(action.kind()) {
            Some(handler) => handler(state, action),
            None => state.clone(),
        }
    })
}

/// Shared aggregate of named, individually typed fields
///
/// Produced by [`combine_reducers`]. Cloning shares the underlying map; two
/// records are the [same value](SameValue) only when they share it.
#[derive(Clone, Default)]
pub struct Record {
    fields: Rc<BTreeMap<&'static str, Rc<dyn Any>>>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of this record with field `key` set to `value`
    ///
    /// Used to assemble preloaded state. `T` must be the exact state type of
    /// the sub-reducer combined under `key`, otherwise that reducer treats the
    /// field as uninitialized.
    pub fn with_field<T: Any>(&self, key: &'static str, value: T) -> Self {
        let mut fields = (*self.fields).clone();
        fields.insert(key, Rc::new(value) as Rc<dyn Any>);
        Self {
            fields: Rc::new(fields),
        }
    }

    /// Typed read of field `key`
    pub fn get<T: Any>(&self, key: &str) -> Option<&T> {
        self.fields
            .get(key)
            .and_then(|value| value.downcast_ref::<T>())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl SameValue for Record {
    fn same_value(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.fields, &other.fields)
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.keys()).finish()
    }
}

/// Type-erased field reducer. Returns `None` when the field kept its identity.
type FieldReducer = Box<dyn Fn(Option<&Rc<dyn Any>>, &Action) -> Option<Rc<dyn Any>>>;

/// Named sub-reducers making up a [`Record`] state
#[derive(Default)]
pub struct CombineReducers {
    fields: Vec<(&'static str, FieldReducer)>,
}

impl CombineReducers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add field `key` managed by `reducer`
    pub fn field<T>(mut self, key: &'static str, reducer: Reducer<T>) -> Self
    where
        T: SameValue + 'static,
    {
        let field: FieldReducer = Box::new(move |previous: Option<&Rc<dyn Any>>, action: &Action| {
            let previous = previous.and_then(|value| value.downcast_ref::<T>());
            let next = reducer.reduce(previous, action);
            match previous {
                Some(previous) if previous.same_value(&next) => None,
                _ => Some(Rc::new(next) as Rc<dyn Any>),
            }
        });

        if let Some(slot) = self.fields.iter_mut().find(|(name, _)| *name == key) {
            log::warn!("Field `{}` combined twice, the later reducer wins", key);
            slot.1 = field;
        } else {
            self.fields.push((key, field));
        }
        self
    }
}

/// Build a reducer over a [`Record`] whose fields map 1:1 to the sub-reducers
///
/// Every sub-reducer sees every action. A new record is only allocated when at
/// least one field changed; otherwise the previous record is returned as is.
pub fn combine_reducers(reducers: CombineReducers) -> Reducer<Record> {
    let fields = reducers.fields;
    Reducer::new(move |state: Option<&Record>, action: &Action| {
        let mut changed: Vec<(&'static str, Rc<dyn Any>)> = Vec::new();

        for (key, reduce) in &fields {
            let previous = state.and_then(|record| record.fields.get(key));
            if let Some(next) = reduce(previous, action) {
                changed.push((*key, next));
            }
        }

        match state {
            Some(previous) if changed.is_empty() => previous.clone(),
            _ => {
                let mut next = match state {
                    Some(previous) => (*previous.fields).clone(),
                    None => BTreeMap::new(),
                };
                next.extend(changed);
                Record {
                    fields: Rc::new(next),
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn counter() -> Reducer<i64> {
        create_reducer(
            0,
            HandlerTable::new()
                .on("inc", |state: &i64, _: &Action| state + 1)
                .on("dec", |state: &i64, _: &Action| state - 1),
        )
    }

    fn labels() -> Reducer<Rc<Vec<String>>> {
        let add: ActionCreator<String> = ActionCreator::new(Rc::from("labels/add"));
        create_reducer(
            Rc::new(Vec::new()),
            HandlerTable::new().on_action(&add, |state: &Rc<Vec<String>>, label: &String| {
                let mut next = (**state).clone();
                next.push(label.clone());
                Rc::new(next)
            }),
        )
    }

    #[test]
    fn test_create_reducer_initializes_and_transitions() {
        let reducer = counter();
        let state = reducer.init();
        assert_eq!(state, 0);

        let state = reducer.reduce(Some(&state), &Action::new("inc"));
        let state = reducer.reduce(Some(&state), &Action::new("inc"));
        let state = reducer.reduce(Some(&state), &Action::new("dec"));
        assert_eq!(state, 1);
    }

    #[test]
    fn test_create_reducer_unknown_action_keeps_identity() {
        let reducer = labels();
        let state = reducer.init();
        let next = reducer.reduce(Some(&state), &Action::new("unknown"));
        assert!(Rc::ptr_eq(&state, &next));
    }

    #[test]
    fn test_on_action_ignores_mistyped_payload() {
        let reducer = labels();
        let state = reducer.init();
        let next = reducer.reduce(Some(&state), &Action::with_payload("labels/add", 42u8));
        assert!(Rc::ptr_eq(&state, &next));

        let next = reducer.reduce(
            Some(&state),
            &Action::with_payload("labels/add", "bug".to_string()),
        );
        assert_eq!(*next, vec!["bug".to_string()]);
    }

    #[test]
    fn test_handler_table_last_registration_wins() {
        let table = HandlerTable::new()
            .on("set", |_: &i64, _: &Action| 1)
            .on("set", |_: &i64, _: &Action| 2);
        assert_eq!(table.len(), 1);

        let reducer = create_reducer(0, table);
        assert_eq!(reducer.reduce(None, &Action::new("set")), 2);
    }

    #[test]
    fn test_combine_reducers_seeds_every_field() {
        let reducer = combine_reducers(
            CombineReducers::new()
                .field("counter", counter())
                .field("labels", labels()),
        );
        let state = reducer.init();

        assert_eq!(state.keys().collect::<Vec<_>>(), vec!["counter", "labels"]);
        assert_eq!(state.get::<i64>("counter"), Some(&0));
        assert!(state.get::<Rc<Vec<String>>>("labels").unwrap().is_empty());
        assert_eq!(state.get::<String>("counter"), None);
    }

    #[test]
    fn test_combine_reducers_no_change_returns_same_record() {
        let reducer = combine_reducers(
            CombineReducers::new()
                .field("counter", counter())
                .field("labels", labels()),
        );
        let state = reducer.init();
        let next = reducer.reduce(Some(&state), &Action::new("noop"));
        assert!(state.same_value(&next));
    }

    #[test]
    fn test_combine_reducers_change_keeps_untouched_fields() {
        let reducer = combine_reducers(
            CombineReducers::new()
                .field("counter", counter())
                .field("labels", labels()),
        );
        let state = reducer.init();
        let next = reducer.reduce(Some(&state), &Action::new("inc"));

        assert!(!state.same_value(&next));
        assert_eq!(next.get::<i64>("counter"), Some(&1));
        let before = state.get::<Rc<Vec<String>>>("labels").unwrap();
        let after = next.get::<Rc<Vec<String>>>("labels").unwrap();
        assert!(Rc::ptr_eq(before, after));
    }

    #[test]
    fn test_combine_reducers_fans_out_to_all_fields() {
        let seen = Rc::new(std::cell::RefCell::new(Vec::new()));
        let spy = |name: &'static str| {
            let seen = seen.clone();
            Reducer::new(move |state: Option<&i64>, action: &Action| {
                seen.borrow_mut().push((name, action.kind().to_string()));
                state.copied().unwrap_or_default()
            })
        };
        let reducer =
            combine_reducers(CombineReducers::new().field("a", spy("a")).field("b", spy("b")));
        let state = reducer.init();
        reducer.reduce(Some(&state), &Action::new("anything"));

        assert_eq!(
            *seen.borrow(),
            vec![
                ("a", "@@store/INIT".to_string()),
                ("b", "@@store/INIT".to_string()),
                ("a", "anything".to_string()),
                ("b", "anything".to_string()),
            ]
        );
    }

    #[test]
    fn test_record_with_field_is_a_new_record() {
        let empty = Record::new();
        let record = empty.with_field("counter", 3i64);

        assert!(empty.is_empty());
        assert!(!empty.same_value(&record));
        assert_eq!(record.get::<i64>("counter"), Some(&3));

        let replaced = record.with_field("counter", 4i64);
        assert_eq!(record.get::<i64>("counter"), Some(&3));
        assert_eq!(replaced.get::<i64>("counter"), Some(&4));
    }

    #[test]
    fn test_combine_reducers_continues_from_assembled_record() {
        let reducer = combine_reducers(
            CombineReducers::new()
                .field("counter", counter())
                .field("labels", labels()),
        );
        let preloaded = Record::new().with_field("counter", 10i64);

        let next = reducer.reduce(Some(&preloaded), &Action::new("inc"));
        assert_eq!(next.get::<i64>("counter"), Some(&11));
        // missing field is seeded from its reducer
        assert!(next.get::<Rc<Vec<String>>>("labels").unwrap().is_empty());

        // wrongly typed field counts as uninitialized
        let mistyped = Record::new().with_field("counter", 10u8);
        let next = reducer.reduce(Some(&mistyped), &Action::new("inc"));
        assert_eq!(next.get::<i64>("counter"), Some(&1));
    }
}
