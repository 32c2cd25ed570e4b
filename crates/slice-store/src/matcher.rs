//! Predicates for effect subscriptions
//!
//! ```rust,ignore
//! store.subscribe_effect(
//!     matches_action_with(&toggle, |todo: &TodoId| todo.id == "special"),
//!     move |action, ctx| {
//!         let Some(todo) = toggle.payload_of(action) else {
//!             return Ok(());
//!         };
//!         // ...
//!         Ok(())
//!     },
//! );
//! ```

use std::collections::BTreeSet;

use crate::action::{Action, ActionCreator, Payload};

/// Predicate true for every action produced by `creator`
pub fn matches_action<P: 'static>(
    creator: &ActionCreator<P>,
) -> impl Fn(&Action) -> bool + 'static {
    let creator = creator.clone();
    move |action: &Action| creator.matches(action)
}

/// Predicate true for actions produced by `creator` whose payload satisfies
/// `payload_predicate`
///
/// Actions of the right type but without a payload of type `P` never match.
pub fn matches_action_with<P, F>(
    creator: &ActionCreator<P>,
    payload_predicate: F,
) -> impl Fn(&Action) -> bool + 'static
where
    P: Payload,
    F: Fn(&P) -> bool + 'static,
{
    let creator = creator.clone();
    move |action: &Action| {
        creator
            .payload_of(action)
            .is_some_and(|payload| payload_predicate(payload))
    }
}

/// Predicate true for actions whose discriminator is one of `action_types`
pub fn matches_any<I, T>(action_types: I) -> impl Fn(&Action) -> bool + 'static
where
    I: IntoIterator<Item = T>,
    T: Into<String>,
{
    let action_types: BTreeSet<String> = action_types.into_iter().map(Into::into).collect();
    move |action: &Action| action_types.contains(action.kind())
}
