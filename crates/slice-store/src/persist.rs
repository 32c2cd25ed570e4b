//! Host storage collaborator and a persisting effect
//!
//! The store never touches storage itself. Persistence is an effect like any
//! other: it runs after reduction and writes a projection of the new state.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::action::Action;
use crate::error::StoreError;
use crate::store::EffectContext;

/// Key/value storage provided by the host environment
pub trait HostStorage {
    fn get_item(&self, key: &str) -> anyhow::Result<Option<String>>;
    fn set_item(&self, key: &str, value: &str) -> anyhow::Result<()>;
    fn remove_item(&self, key: &str) -> anyhow::Result<()>;
}

/// In-memory storage, handy for tests and hosts without persistence
#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: RefCell<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.borrow().is_empty()
    }
}

impl HostStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(self.items.borrow().get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> anyhow::Result<()> {
        self.items
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> anyhow::Result<()> {
        self.items.borrow_mut().remove(key);
        Ok(())
    }
}

/// Effect writing `project(state)` as JSON under `key`
///
/// Subscribe it with whatever predicate decides which actions should persist.
pub fn persist_state<S, T, F>(
    storage: Rc<dyn HostStorage>,
    key: impl Into<String>,
    project: F,
) -> impl Fn(&Action, &EffectContext<'_, S>) -> anyhow::Result<()> + 'static
where
    S: Clone + 'static,
    T: Serialize + 'static,
    F: Fn(&S) -> T + 'static,
{
    let key = key.into();
    move |action: &Action, ctx: &EffectContext<'_, S>| {
        let value = serde_json::to_string(&project(&ctx.get_state()))?;
        storage.set_item(&key, &value)?;
        log::debug!("Persisted `{}` after `{}`", key, action.kind());
        Ok(())
    }
}

/// Read a value previously written by [`persist_state`]
pub fn load_persisted<T: DeserializeOwned>(
    storage: &dyn HostStorage,
    key: &str,
) -> Result<Option<T>, StoreError> {
    let Some(raw) = storage.get_item(key).map_err(StoreError::Storage)? else {
        return Ok(None);
    };
    let value = serde_json::from_str(&raw)?;
    Ok(Some(value))
}
