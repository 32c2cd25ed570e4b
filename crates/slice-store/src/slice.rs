//! Slices: named bundles of case reducers and their action creators
//!
//! Every case `case` of slice `name` answers to the discriminator
//! `"name/case"`. The slice's reducer is a [`create_reducer`] over those
//! discriminators, and [`SliceActions`] hands out the matching typed creators.

use std::any::{type_name, TypeId};
use std::collections::BTreeMap;
use std::rc::Rc;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::action::{Action, ActionCreator, Payload};
use crate::reducer::{create_reducer, HandlerTable, Reducer};

/// Discriminator for `case` in slice `name`
pub fn slice_action_type(name: &str, case: &str) -> String {
    format!("{}/{}", name, case)
}

#[derive(Debug, Clone)]
struct CaseEntry {
    action_type: Rc<str>,
    payload_type: TypeId,
    payload_name: &'static str,
}

/// Action creators generated for a slice, keyed by case name
#[derive(Debug, Clone, Default)]
pub struct SliceActions {
    cases: BTreeMap<String, CaseEntry>,
}

impl SliceActions {
    /// Typed creator for `case`
    ///
    /// Returns `None` if the case does not exist or its payload is not `P`.
    /// Payload-less cases use `P = ()`.
    pub fn get<P: Payload>(&self, case: &str) -> Option<ActionCreator<P>> {
        let entry = self.cases.get(case)?;
        if entry.payload_type != ActionCreator::<P>::payload_type() {
            log::warn!(
                "Case `{}` takes {}, not {}",
                entry.action_type,
                entry.payload_name,
                type_name::<P>()
            );
            return None;
        }
        Some(ActionCreator::new(entry.action_type.clone()))
    }

    /// Discriminator generated for `case`
    pub fn action_type(&self, case: &str) -> Option<&str> {
        self.cases.get(case).map(|entry| &*entry.action_type)
    }

    /// Case names in lexical order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.cases.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.cases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cases.is_empty()
    }
}

/// Builder collecting the name, initial state and case reducers of a slice
pub struct SliceBuilder<S> {
    name: String,
    initial_state: S,
    handlers: HandlerTable<S>,
    actions: SliceActions,
}

impl<S: Clone + 'static> SliceBuilder<S> {
    pub fn new(name: impl Into<String>, initial_state: S) -> Self {
        Self {
            name: name.into(),
            initial_state,
            handlers: HandlerTable::new(),
            actions: SliceActions::default(),
        }
    }

    /// Case reducer without payload
    pub fn case<F>(mut self, case: &str, reducer: F) -> Self
    where
        F: Fn(&S) -> S + 'static,
    {
        let action_type = self.register::<()>(case);
        self.handlers.insert(
            action_type,
            Rc::new(move |state: &S, _: &Action| reducer(state)),
        );
        self
    }

    /// Case reducer receiving a payload of type `P`
    pub fn case_with<P, F>(mut self, case: &str, reducer: F) -> Self
    where
        P: Payload,
        F: Fn(&S, &P) -> S + 'static,
    {
        let action_type = self.register::<P>(case);
        self.handlers.insert(
            action_type,
            Rc::new(move |state: &S, action: &Action| match action.payload::<P>() {
                Some(payload) => reducer(state, payload),
                None => {
                    log::warn!(
                        "Ignoring `{}`: payload is not a {}",
                        action.kind(),
                        type_name::<P>()
                    );
                    state.clone()
                }
            }),
        );
        self
    }

    /// Case reducer receiving a payload of type `P`, also from JSON actions
    ///
    /// Accepts a typed `P` payload as [`case_with`](Self::case_with) does, and
    /// additionally deserializes [`Value`] payloads, as produced by
    /// [`Action::from_json`]. Payloads that fail to deserialize leave state
    /// unchanged.
    pub fn case_with_json<P, F>(mut self, case: &str, reducer: F) -> Self
    where
        P: Payload + DeserializeOwned,
        F: Fn(&S, &P) -> S + 'static,
    {
        let action_type = self.register::<P>(case);
        self.handlers.insert(
            action_type,
            Rc::new(move |state: &S, action: &Action| {
                if let Some(payload) = action.payload::<P>() {
                    return reducer(state, payload);
                }
                let Some(raw) = action.payload::<Value>() else {
                    log::warn!(
                        "Ignoring `{}`: payload is not a {}",
                        action.kind(),
                        type_name::<P>()
                    );
                    return state.clone();
                };
                match serde_json::from_value::<P>(raw.clone()) {
                    Ok(payload) => reducer(state, &payload),
                    Err(e) => {
                        log::warn!(
                            "Ignoring `{}`: cannot read payload as {}: {}",
                            action.kind(),
                            type_name::<P>(),
                            e
                        );
                        state.clone()
                    }
                }
            }),
        );
        self
    }

    fn register<P: Payload>(&mut self, case: &str) -> String {
        let action_type = slice_action_type(&self.name, case);
        let entry = CaseEntry {
            action_type: Rc::from(action_type.as_str()),
            payload_type: ActionCreator::<P>::payload_type(),
            payload_name: type_name::<P>(),
        };
        self.actions.cases.insert(case.to_string(), entry);
        action_type
    }

    pub fn build(self) -> Slice<S> {
        create_slice(self)
    }
}

/// A named reducer together with its generated action creators
pub struct Slice<S> {
    name: String,
    reducer: Reducer<S>,
    actions: SliceActions,
}

impl<S> Slice<S> {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The slice reducer; reduces the slice's own sub-state only
    pub fn reducer(&self) -> Reducer<S> {
        self.reducer.clone()
    }

    pub fn actions(&self) -> &SliceActions {
        &self.actions
    }
}

/// Turn a [`SliceBuilder`] into a [`Slice`]
pub fn create_slice<S: Clone + 'static>(builder: SliceBuilder<S>) -> Slice<S> {
    let SliceBuilder {
        name,
        initial_state,
        handlers,
        actions,
    } = builder;

    if actions.is_empty() {
        log::debug!("Slice `{}` has no case reducers", name);
    }

    Slice {
        reducer: create_reducer(initial_state, handlers),
        name,
        actions,
    }
}
