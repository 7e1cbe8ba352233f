//! Typed listener channels for continuous notifications
//!
//! Each notification kind has its own channel with a payload type of its
//! own: `coords` carries [`Coordinates`], `address` carries [`Address`] and
//! `error` carries [`LocationError`].

use crate::api::types::LocationError;
use crate::core::{Address, Coordinates};
use crate::processing::Outcome;
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::Rc;

/// Listener registration handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerHandle(u32);

impl ListenerHandle {
    fn new(id: u32) -> Self {
        ListenerHandle(id)
    }

    pub fn id(&self) -> u32 {
        self.0
    }
}

struct Channel<T> {
    listeners: RefCell<BTreeMap<ListenerHandle, Rc<dyn Fn(&T)>>>,
}

impl<T> Channel<T> {
    fn new() -> Self {
        Self {
            listeners: RefCell::new(BTreeMap::new()),
        }
    }

    fn subscribe(&self, handle: ListenerHandle, listener: Rc<dyn Fn(&T)>) {
        self.listeners.borrow_mut().insert(handle, listener);
    }

    fn remove(&self, handle: ListenerHandle) -> bool {
        self.listeners.borrow_mut().remove(&handle).is_some()
    }

    fn len(&self) -> usize {
        self.listeners.borrow().len()
    }

    fn clear(&self) {
        self.listeners.borrow_mut().clear();
    }

    // Listeners run on a snapshot so they may (un)subscribe while being called.
    fn emit(&self, payload: &T) {
        let snapshot: Vec<Rc<dyn Fn(&T)>> = self.listeners.borrow().values().cloned().collect();
        for listener in snapshot {
            listener(payload);
        }
    }
}

/// Publish/subscribe hub with one channel per notification kind
pub struct Notifier {
    counter: Cell<u32>,
    coords: Channel<Coordinates>,
    address: Channel<Address>,
    error: Channel<LocationError>,
}

impl Notifier {
    pub fn new() -> Self {
        Self {
            counter: Cell::new(0),
            coords: Channel::new(),
            address: Channel::new(),
            error: Channel::new(),
        }
    }

    fn next_handle(&self) -> ListenerHandle {
        self.counter.set(self.counter.get() + 1);
        ListenerHandle::new(self.counter.get())
    }

    /// Register a listener for new coordinates
    pub fn on_coords(&self, listener: impl Fn(&Coordinates) + 'static) -> ListenerHandle {
        let handle = self.next_handle();
        self.coords.subscribe(handle, Rc::new(listener));
        handle
    }

    /// Register a listener for resolved addresses
    pub fn on_address(&self, listener: impl Fn(&Address) + 'static) -> ListenerHandle {
        let handle = self.next_handle();
        self.address.subscribe(handle, Rc::new(listener));
        handle
    }

    /// Register a listener for classified errors
    pub fn on_error(&self, listener: impl Fn(&LocationError) + 'static) -> ListenerHandle {
        let handle = self.next_handle();
        self.error.subscribe(handle, Rc::new(listener));
        handle
    }

    /// Unregister a listener from whichever channel holds it
    pub fn remove(&self, handle: ListenerHandle) -> bool {
        self.coords.remove(handle) || self.address.remove(handle) || self.error.remove(handle)
    }

    /// Number of (coords, address, error) listeners
    pub fn listener_count(&self) -> (usize, usize, usize) {
        (self.coords.len(), self.address.len(), self.error.len())
    }

    pub fn clear(&self) {
        self.coords.clear();
        self.address.clear();
        self.error.clear();
    }

    pub fn emit_error(&self, error: &LocationError) {
        self.error.emit(error);
    }

    /// Announce a pipeline outcome: coordinates first, then the address
    pub fn dispatch(&self, outcome: &Outcome) {
        match outcome {
            Outcome::Reading {
                change: Some(change),
                ..
            } => {
                self.coords.emit(&change.coords);
                if let Some(address) = &change.address {
                    self.address.emit(address);
                }
            }
            Outcome::Reading { change: None, .. } => {}
            Outcome::Failure(error) => self.emit_error(error),
        }
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::Change;
    use crate::core::PositionSample;

    fn reading(address: Option<Address>) -> Outcome {
        let coords = Coordinates::new(1.0, 2.0, 3.0);
        Outcome::Reading {
            sample: Rc::new(PositionSample::new(0, coords.clone())),
            change: Some(Change { coords, address }),
        }
    }

    #[test]
    fn test_coords_before_address() {
        let notifier = Notifier::new();
        let order = Rc::new(RefCell::new(Vec::new()));

        let log = order.clone();
        notifier.on_address(move |_| log.borrow_mut().push("address"));
        let log = order.clone();
        notifier.on_coords(move |_| log.borrow_mut().push("coords"));

        notifier.dispatch(&reading(Some(Address::new().with("city", "Rome"))));
        assert_eq!(*order.borrow(), vec!["coords", "address"]);
    }

    #[test]
    fn test_unchanged_reading_is_silent() {
        let notifier = Notifier::new();
        let hits = Rc::new(Cell::new(0));
        let counter = hits.clone();
        notifier.on_coords(move |_| counter.set(counter.get() + 1));

        let outcome = Outcome::Reading {
            sample: Rc::new(PositionSample::new(0, Coordinates::new(0.0, 0.0, 0.0))),
            change: None,
        };
        notifier.dispatch(&outcome);
        assert_eq!(hits.get(), 0);
    }

    #[test]
    fn test_remove_listener() {
        let notifier = Notifier::new();
        let coords = notifier.on_coords(|_| {});
        let error = notifier.on_error(|_| {});
        assert_eq!(notifier.listener_count(), (1, 0, 1));

        assert!(notifier.remove(coords));
        assert!(!notifier.remove(coords));
        assert!(notifier.remove(error));
        assert_eq!(notifier.listener_count(), (0, 0, 0));
    }

    #[test]
    fn test_listener_can_unsubscribe_itself() {
        let notifier = Rc::new(Notifier::new());
        let hits = Rc::new(Cell::new(0));
        let slot: Rc<Cell<Option<ListenerHandle>>> = Rc::new(Cell::new(None));

        let (weak, counter, own) = (Rc::downgrade(&notifier), hits.clone(), slot.clone());
        let handle = notifier.on_error(move |_| {
            counter.set(counter.get() + 1);
            if let (Some(notifier), Some(handle)) = (weak.upgrade(), own.get()) {
                notifier.remove(handle);
            }
        });
        slot.set(Some(handle));

        notifier.emit_error(&LocationError::NotAllowed);
        notifier.emit_error(&LocationError::NotAllowed);
        assert_eq!(hits.get(), 1);
    }
}
