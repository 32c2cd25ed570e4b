//! Subscription registries owned by the store
//!
//! Notification loops iterate over a snapshot of the registry, so removing an
//! entry never shifts the position of the entries registered before it.
//! Removal also flags the entry inactive, which makes the loop in progress
//! skip it from that point on.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

pub(crate) struct Slot<T> {
    active: Cell<bool>,
    pub(crate) value: T,
}

impl<T> Slot<T> {
    pub(crate) fn is_active(&self) -> bool {
        self.active.get()
    }
}

type SubscriptionId = u64;

/// Ordered registry; registration order is notification order
pub(crate) struct Registry<T> {
    next_id: Cell<SubscriptionId>,
    entries: RefCell<Vec<(SubscriptionId, Rc<Slot<T>>)>>,
}

impl<T: 'static> Registry<T> {
    pub(crate) fn new() -> Rc<Self> {
        Rc::new(Self {
            next_id: Cell::new(0),
            entries: RefCell::new(Vec::new()),
        })
    }

    /// Append `value` and return the handle that removes it again
    pub(crate) fn insert(self: &Rc<Self>, value: T) -> Unsubscribe {
        let id = self.next_id.get();
        self.next_id.set(id + 1);

        let slot = Rc::new(Slot {
            active: Cell::new(true),
            value,
        });
        self.entries.borrow_mut().push((id, slot));

        let registry = Rc::downgrade(self);
        Unsubscribe::new(move || {
            if let Some(registry) = Weak::upgrade(&registry) {
                registry.remove(id);
            }
        })
    }
}

impl<T> Registry<T> {
    fn remove(&self, id: SubscriptionId) {
        let mut entries = self.entries.borrow_mut();
        if let Some(index) = entries.iter().position(|(entry_id, _)| *entry_id == id) {
            let (_, slot) = entries.remove(index);
            slot.active.set(false);
        }
    }

    /// Entries registered right now, in registration order
    pub(crate) fn snapshot(&self) -> Vec<Rc<Slot<T>>> {
        self.entries
            .borrow()
            .iter()
            .map(|(_, slot)| slot.clone())
            .collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.borrow().len()
    }
}

/// Handle returned by the subscribe operations
///
/// Dropping the handle keeps the subscription alive; call
/// [`unsubscribe`](Unsubscribe::unsubscribe) to remove it.
pub struct Unsubscribe {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl Unsubscribe {
    fn new(cancel: impl FnOnce() + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Remove the subscription. Safe to call from inside a notification.
    pub fn unsubscribe(mut self) {
        self.cancel_now();
    }

    /// Same as [`unsubscribe`](Unsubscribe::unsubscribe), for handles kept
    /// behind a shared reference. Calling it more than once is a no-op.
    pub fn cancel_now(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }

    pub fn is_active(&self) -> bool {
        self.cancel.is_some()
    }
}

impl fmt::Debug for Unsubscribe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Unsubscribe")
            .field("active", &self.is_active())
            .finish()
    }
}
