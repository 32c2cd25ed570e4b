//! The store and its dispatch pipeline
//!
//! ```text
//! dispatch(action)
//!     │
//!     ├─► ActionLogger (debug only)
//!     ├─► Reducing            reducer(state, action) → state
//!     ├─► NotifyingSelectors  selector(state) changed? → listener(value)
//!     └─► NotifyingEffects    predicate(action)? → effect(action, ctx)
//!                                                        └─► ctx.dispatch() (nested, depth-first)
//! ```
//!
//! Everything runs synchronously on the caller's stack. A dispatch from inside an
//! effect runs a complete nested cycle before the outer cycle visits its next
//! effect. Dispatching from a reducer, selector or listener is rejected.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;

use crate::action::Action;
use crate::config::StoreConfig;
use crate::error::StoreError;
use crate::logging::{ActionLogger, LogActionLogger};
use crate::reducer::Reducer;
use crate::same_value::SameValue;
use crate::subscription::{Registry, Unsubscribe};

/// Where the store currently is within a dispatch cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchPhase {
    Idle,
    Reducing,
    NotifyingSelectors,
    NotifyingEffects,
}

impl fmt::Display for DispatchPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let phase = match self {
            DispatchPhase::Idle => "idle",
            DispatchPhase::Reducing => "reducing",
            DispatchPhase::NotifyingSelectors => "notifying selectors",
            DispatchPhase::NotifyingEffects => "notifying effects",
        };
        f.write_str(phase)
    }
}

/// Restores the phase a dispatch started in, also when a callback panics
struct PhaseGuard<'a> {
    phase: &'a Cell<DispatchPhase>,
    restore: DispatchPhase,
}

impl<'a> PhaseGuard<'a> {
    fn enter(phase: &'a Cell<DispatchPhase>) -> Self {
        Self {
            restore: phase.get(),
            phase,
        }
    }

    fn set(&self, phase: DispatchPhase) {
        self.phase.set(phase);
    }
}

impl Drop for PhaseGuard<'_> {
    fn drop(&mut self) {
        self.phase.set(self.restore);
    }
}

trait SelectorSubscription<S> {
    fn notify(&self, state: &S);
}

struct Selection<S, T, Sel, L> {
    selector: Sel,
    listener: L,
    last_value: RefCell<T>,
    _state: PhantomData<fn(&S)>,
}

impl<S, T, Sel, L> SelectorSubscription<S> for Selection<S, T, Sel, L>
where
    T: SameValue,
    Sel: Fn(&S) -> T,
    L: Fn(&T),
{
    fn notify(&self, state: &S) {
        let next = (self.selector)(state);
        if self.last_value.borrow().same_value(&next) {
            return;
        }
        self.last_value.replace(next);
        let last_value = self.last_value.borrow();
        (self.listener)(&*last_value);
    }
}

type Predicate = Box<dyn Fn(&Action) -> bool>;
type Effect<S> = Box<dyn Fn(&Action, &EffectContext<'_, S>) -> anyhow::Result<()>>;

struct EffectSubscription<S> {
    predicate: Predicate,
    effect: Effect<S>,
}

/// Handed to effects: read the updated state, dispatch follow-up actions
pub struct EffectContext<'a, S> {
    store: &'a Store<S>,
}

impl<S: Clone + 'static> EffectContext<'_, S> {
    /// State after the reduction that triggered the effect (or after any nested
    /// dispatch the effect already made)
    pub fn get_state(&self) -> S {
        self.store.get_state()
    }

    /// Run a nested dispatch cycle to completion
    pub fn dispatch(&self, action: Action) -> Result<Action, StoreError> {
        self.store.dispatch(action)
    }

    /// Handle to the store, e.g. to register further subscriptions
    pub fn store(&self) -> &Store<S> {
        self.store
    }
}

struct StoreInner<S> {
    name: String,
    debug: bool,
    logger: Box<dyn ActionLogger>,
    reducer: Reducer<S>,
    state: RefCell<S>,
    phase: Cell<DispatchPhase>,
    selectors: Rc<Registry<Box<dyn SelectorSubscription<S>>>>,
    effects: Rc<Registry<EffectSubscription<S>>>,
}

/// Single-threaded state container
///
/// Owns the current state, the root reducer (fixed for the store's lifetime)
/// and the selector and effect registries. Cloning yields another handle to
/// the same store.
///
/// Effects should reach the store through their [`EffectContext`]; a store
/// handle captured inside one of its own subscriptions keeps the store alive.
pub struct Store<S> {
    inner: Rc<StoreInner<S>>,
}

impl<S: Clone + 'static> Store<S> {
    /// Create a store seeded by calling `reducer` with uninitialized state
    pub fn new(reducer: Reducer<S>) -> Self {
        Self::builder(reducer).build()
    }

    pub fn builder(reducer: Reducer<S>) -> StoreBuilder<S> {
        StoreBuilder::new(reducer)
    }

    /// Current state
    pub fn get_state(&self) -> S {
        self.inner.state.borrow().clone()
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn phase(&self) -> DispatchPhase {
        self.inner.phase.get()
    }

    /// Run one dispatch cycle: reduce, notify selectors, notify effects
    ///
    /// Returns the action once every phase has completed. The first failing
    /// effect ends the cycle with [`StoreError::Effect`]; the reduced state is
    /// kept.
    pub fn dispatch(&self, action: Action) -> Result<Action, StoreError> {
        let inner = &*self.inner;

        let phase = inner.phase.get();
        if matches!(
            phase,
            DispatchPhase::Reducing | DispatchPhase::NotifyingSelectors
        ) {
            log::warn!(
                "[{}] Rejected `{}` while {}",
                inner.name,
                action.kind(),
                phase
            );
            return Err(StoreError::DispatchInProgress { phase });
        }
        let guard = PhaseGuard::enter(&inner.phase);

        if inner.debug {
            inner.logger.log_action(&inner.name, &action);
        }

        guard.set(DispatchPhase::Reducing);
        let current = self.get_state();
        let next = inner.reducer.reduce(Some(&current), &action);
        inner.state.replace(next.clone());

        guard.set(DispatchPhase::NotifyingSelectors);
        for subscription in inner.selectors.snapshot() {
            if subscription.is_active() {
                subscription.value.notify(&next);
            }
        }

        guard.set(DispatchPhase::NotifyingEffects);
        let ctx = EffectContext { store: self };
        for subscription in inner.effects.snapshot() {
            if !subscription.is_active() || !(subscription.value.predicate)(&action) {
                continue;
            }
            (subscription.value.effect)(&action, &ctx).map_err(|source| {
                log::error!(
                    "[{}] Effect for `{}` failed: {:#}",
                    inner.name,
                    action.kind(),
                    source
                );
                StoreError::Effect {
                    action_type: action.kind().to_string(),
                    source,
                }
            })?;
        }

        Ok(action)
    }

    /// Watch `selector(state)` and call `listener` whenever it changes
    ///
    /// The selector is evaluated right away to seed the last seen value; the
    /// listener only fires on a later dispatch whose selection differs by
    /// [`SameValue`].
    pub fn subscribe_selector<T, Sel, L>(&self, selector: Sel, listener: L) -> Unsubscribe
    where
        T: SameValue + 'static,
        Sel: Fn(&S) -> T + 'static,
        L: Fn(&T) + 'static,
    {
        let seed = selector(&self.get_state());
        let selection: Box<dyn SelectorSubscription<S>> = Box::new(Selection {
            selector,
            listener,
            last_value: RefCell::new(seed),
            _state: PhantomData,
        });
        self.inner.selectors.insert(selection)
    }

    /// Run `effect` after every dispatch whose action satisfies `predicate`
    pub fn subscribe_effect<P, E>(&self, predicate: P, effect: E) -> Unsubscribe
    where
        P: Fn(&Action) -> bool + 'static,
        E: Fn(&Action, &EffectContext<'_, S>) -> anyhow::Result<()> + 'static,
    {
        self.inner.effects.insert(EffectSubscription {
            predicate: Box::new(predicate),
            effect: Box::new(effect),
        })
    }

    pub fn selector_count(&self) -> usize {
        self.inner.selectors.len()
    }

    pub fn effect_count(&self) -> usize {
        self.inner.effects.len()
    }
}

impl<S> Clone for Store<S> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<S> fmt::Debug for Store<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("name", &self.inner.name)
            .field("debug", &self.inner.debug)
            .field("phase", &self.inner.phase.get())
            .field("selectors", &self.inner.selectors.len())
            .field("effects", &self.inner.effects.len())
            .finish()
    }
}

/// Construction options for a [`Store`]
pub struct StoreBuilder<S> {
    reducer: Reducer<S>,
    config: StoreConfig,
    logger: Option<Box<dyn ActionLogger>>,
    preloaded_state: Option<S>,
}

impl<S: Clone + 'static> StoreBuilder<S> {
    pub fn new(reducer: Reducer<S>) -> Self {
        Self {
            reducer,
            config: StoreConfig::default(),
            logger: None,
            preloaded_state: None,
        }
    }

    pub fn config(mut self, config: StoreConfig) -> Self {
        self.config = config;
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.config.name = name.into();
        self
    }

    /// Log every dispatched action
    pub fn debug(mut self, debug: bool) -> Self {
        self.config.debug = debug;
        self
    }

    /// Replace the default `log`-based action logger
    pub fn logger(mut self, logger: impl ActionLogger + 'static) -> Self {
        self.logger = Some(Box::new(logger));
        self
    }

    /// Start from `state` instead of seeding through the reducer
    pub fn preloaded_state(mut self, state: S) -> Self {
        self.preloaded_state = Some(state);
        self
    }

    pub fn build(self) -> Store<S> {
        let StoreConfig {
            name,
            debug,
            log_target,
        } = self.config;

        let state = match self.preloaded_state {
            Some(state) => state,
            None => self.reducer.init(),
        };
        let logger = self
            .logger
            .unwrap_or_else(|| Box::new(LogActionLogger::new(log_target)));

        log::debug!("[{}] Store created (debug: {})", name, debug);

        Store {
            inner: Rc::new(StoreInner {
                name,
                debug,
                logger,
                reducer: self.reducer,
                state: RefCell::new(state),
                phase: Cell::new(DispatchPhase::Idle),
                selectors: Registry::new(),
                effects: Registry::new(),
            }),
        }
    }
}
