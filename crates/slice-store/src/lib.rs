//! # slice-store
//!
//! A synchronous, single-threaded application-state container following the
//! reducer/action/subscriber pattern, meant to be embedded in a host
//! environment.
//!
//! ## Building blocks
//!
//! - [`create_reducer`] / [`combine_reducers`]: build a root reducer from a
//!   handler table or from named sub-reducers
//! - [`SliceBuilder`] / [`create_slice`]: case reducers plus generated action
//!   creators sharing the `"<slice>/<case>"` namespace
//! - [`Store`]: owns the state and runs the dispatch cycle
//!   (reduce → selectors → effects)
//! - [`matches_action`] / [`matches_action_with`]: effect predicates built
//!   from action creators
//!
//! ## Usage
//!
//! ```rust
//! use std::rc::Rc;
//! use slice_store::{SliceBuilder, Store};
//!
//! let counter = SliceBuilder::new("counter", Rc::new(0i64))
//!     .case("increment", |value: &Rc<i64>| Rc::new(**value + 1))
//!     .case_with("add", |value: &Rc<i64>, amount: &i64| Rc::new(**value + amount))
//!     .build();
//! let increment = counter.actions().get::<()>("increment").unwrap();
//! let add = counter.actions().get::<i64>("add").unwrap();
//!
//! let store = Store::new(counter.reducer());
//! store.subscribe_selector(|value: &Rc<i64>| **value, |value| println!("value: {}", value));
//!
//! store.dispatch(increment.create())?;
//! store.dispatch(add.with(5))?;
//! assert_eq!(*store.get_state(), 6);
//! # Ok::<(), slice_store::StoreError>(())
//! ```
//!
//! ## Change detection
//!
//! Selectors are compared with [`SameValue`]: primitives by value, `Rc`/`Arc`
//! and [`Record`] by pointer. Reducers return the previous state unchanged
//! when an action does not concern them, so keeping aggregate state behind
//! `Rc` makes "nothing changed" cheap to detect.

mod action;
mod config;
mod error;
mod logging;
mod matcher;
mod persist;
mod reducer;
mod same_value;
mod slice;
mod store;
mod subscription;

#[cfg(test)]
mod scenario_tests;

pub use action::{Action, ActionCreator, Payload, INIT_ACTION_TYPE};
pub use config::{StoreConfig, DEFAULT_LOG_TARGET};
pub use error::StoreError;
pub use logging::{ActionLogger, LogActionLogger};
pub use matcher::{matches_action, matches_action_with, matches_any};
pub use persist::{load_persisted, persist_state, HostStorage, MemoryStorage};
pub use reducer::{
    combine_reducers, create_reducer, CombineReducers, HandlerTable, Record, Reducer,
};
pub use same_value::SameValue;
pub use slice::{create_slice, slice_action_type, Slice, SliceActions, SliceBuilder};
pub use store::{DispatchPhase, EffectContext, Store, StoreBuilder};
pub use subscription::Unsubscribe;
