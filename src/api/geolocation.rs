//! Permission-gated, observable position source
//!
//! [`Geolocation`] wraps a [`LocationProvider`] behind a persisted permission
//! flag. Readings and failures from one-shot requests and from the single
//! continuous watch go through one [`Pipeline`]; its [`Outcome`] is handed to
//! the completion handle of the originating call and to the typed listeners.

use crate::api::callback::{ListenerHandle, Notifier};
use crate::api::completion::{Completer, Completion};
use crate::api::types::{AcquisitionError, LocationError};
use crate::core::{Address, Coordinates, PositionSample};
use crate::processing::{Outcome, Pipeline};
use crate::provider::{
    AcquisitionOptions, ErrorRecord, LocationProvider, ProviderAdapter, ProviderRevision, WatchId,
};
use crate::utils::{ConfigError, GeolocationConfig, PreferenceError, PreferenceStore};
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Mutable per-instance state
struct State {
    allowed: bool,
    options: AcquisitionOptions,
    pipeline: Pipeline,
    /// Handle of the registered watch, if any
    watch: Option<WatchId>,
    /// Bumped for every registration attempt
    watch_generation: u64,
    /// Generation whose callbacks are still honoured
    live_generation: Option<u64>,
    /// Watch completions waiting for the first reading
    watch_waiters: Vec<Completer>,
}

struct Inner {
    preference_key: String,
    state: RefCell<State>,
    provider: RefCell<Box<dyn LocationProvider>>,
    store: RefCell<Box<dyn PreferenceStore>>,
    notifier: Notifier,
}

impl Inner {
    fn process_reading(&self, sample: Rc<PositionSample>) -> Outcome {
        let outcome = self.state.borrow_mut().pipeline.reading(sample);
        self.notifier.dispatch(&outcome);
        outcome
    }

    fn process_failure(&self, record: &ErrorRecord) -> Outcome {
        let outcome = {
            let state = self.state.borrow();
            state.pipeline.failure(record, &state.options)
        };
        warn!(code = record.code, message = %record.message, "provider reported a failure");
        self.notifier.dispatch(&outcome);
        outcome
    }

    // Waiters are drained in the same borrow that caches the reading, so a
    // listener that stops or restarts the watch cannot steal or abandon them.
    fn process_watch_reading(&self, generation: u64, sample: Rc<PositionSample>) {
        let (outcome, waiters) = {
            let mut state = self.state.borrow_mut();
            if state.live_generation != Some(generation) {
                debug!(generation, "ignoring reading from a stopped watch");
                return;
            }
            let outcome = state.pipeline.reading(sample);
            (outcome, std::mem::take(&mut state.watch_waiters))
        };

        self.notifier.dispatch(&outcome);
        let result = outcome.completion();
        for waiter in waiters {
            waiter.complete(result.clone());
        }
    }

    fn process_watch_failure(&self, generation: u64, record: &ErrorRecord) {
        let (outcome, waiters) = {
            let mut state = self.state.borrow_mut();
            if state.live_generation != Some(generation) {
                debug!(generation, "ignoring failure from a stopped watch");
                return;
            }
            let outcome = state.pipeline.failure(record, &state.options);
            (outcome, std::mem::take(&mut state.watch_waiters))
        };

        warn!(code = record.code, message = %record.message, "provider reported a watch failure");
        self.notifier.dispatch(&outcome);
        let result = outcome.completion();
        for waiter in waiters {
            waiter.complete(result.clone());
        }
    }

    fn take_waiters(&self) -> Vec<Completer> {
        std::mem::take(&mut self.state.borrow_mut().watch_waiters)
    }

    fn reject_not_allowed(&self) -> Completion {
        debug!("location request blocked by permission gate");
        self.notifier.emit_error(&LocationError::NotAllowed);
        Completion::rejected(LocationError::NotAllowed.into())
    }

    fn stop_watching(&self) -> bool {
        let (watch, waiters) = {
            let mut state = self.state.borrow_mut();
            state.live_generation = None;
            (state.watch.take(), std::mem::take(&mut state.watch_waiters))
        };

        for waiter in waiters {
            waiter.complete(Err(AcquisitionError::Abandoned));
        }

        match watch {
            Some(id) => {
                self.provider.borrow_mut().clear_watch(id);
                info!(watch = id.id(), "stopped watching position");
                true
            }
            None => false,
        }
    }
}

enum WatchPlan {
    Denied,
    Joined(Completion),
    Register {
        options: AcquisitionOptions,
        generation: u64,
        completion: Completion,
    },
}

/// Position source gated by a persisted permission flag
pub struct Geolocation {
    inner: Rc<Inner>,
}

impl Geolocation {
    /// Create an instance over `provider`, reading the permission flag from `store`
    ///
    /// The provider revision in `config` is resolved once here; legacy
    /// providers receive their compatibility defaults before any call.
    pub fn initialize<P, S>(config: GeolocationConfig, provider: P, store: S) -> Result<Self, ConfigError>
    where
        P: LocationProvider + 'static,
        S: PreferenceStore + 'static,
    {
        config.validate()?;

        let mut provider = provider;
        let adapter = ProviderAdapter::resolve(config.revision, &mut provider);

        let allowed = match store.get_bool(&config.preference_key) {
            Ok(value) => value.unwrap_or(false),
            Err(e) => {
                warn!(error = %e, "could not read stored location permission, assuming denied");
                false
            }
        };

        info!(
            revision = ?adapter.revision(),
            allowed,
            "location source initialized"
        );

        let state = State {
            allowed,
            options: config.acquisition,
            pipeline: Pipeline::new(adapter),
            watch: None,
            watch_generation: 0,
            live_generation: None,
            watch_waiters: Vec::new(),
        };

        Ok(Self {
            inner: Rc::new(Inner {
                preference_key: config.preference_key,
                state: RefCell::new(state),
                provider: RefCell::new(Box::new(provider)),
                store: RefCell::new(Box::new(store)),
                notifier: Notifier::new(),
            }),
        })
    }

    /// Whether location access is currently allowed
    pub fn allowed(&self) -> bool {
        self.inner.state.borrow().allowed
    }

    /// Allow or revoke location access
    ///
    /// Revoking stops the active watch at once. The value is persisted
    /// synchronously; a storage failure is returned after the in-memory
    /// flag has already changed.
    pub fn set_allowed(&self, allowed: bool) -> Result<(), PreferenceError> {
        self.inner.state.borrow_mut().allowed = allowed;
        info!(allowed, "location permission changed");

        if !allowed {
            self.inner.stop_watching();
        }

        self.inner
            .store
            .borrow_mut()
            .set_bool(&self.inner.preference_key, allowed)
            .map_err(|e| {
                warn!(error = %e, "failed to persist location permission");
                e
            })
    }

    pub fn enable_high_accuracy(&self) -> bool {
        self.inner.state.borrow().options.enable_high_accuracy
    }

    /// Takes effect for the next acquisition call
    pub fn set_enable_high_accuracy(&self, enable: bool) {
        self.inner.state.borrow_mut().options.enable_high_accuracy = enable;
    }

    pub fn timeout(&self) -> Duration {
        self.inner.state.borrow().options.timeout()
    }

    /// Takes effect for the next acquisition call
    ///
    /// Timeouts are kept in whole milliseconds; sub-millisecond parts round
    /// up. A zero timeout is rejected and leaves the current one in place.
    pub fn set_timeout(&self, timeout: Duration) -> Result<(), ConfigError> {
        let timeout_ms = AcquisitionOptions::timeout_ms_from(timeout);
        if timeout_ms == 0 {
            return Err(ConfigError::InvalidParameter {
                parameter: "timeout".to_string(),
                value: format!("{:?}", timeout),
                reason: "must be greater than zero".to_string(),
            });
        }
        self.inner.state.borrow_mut().options.timeout_ms = timeout_ms;
        Ok(())
    }

    /// Options the next acquisition call will use
    pub fn options(&self) -> AcquisitionOptions {
        self.inner.state.borrow().options
    }

    /// Request a single reading
    ///
    /// Rejects with [`LocationError::NotAllowed`] without calling the
    /// provider while access is not allowed. Once issued, the request runs to
    /// completion even if access is revoked in the meantime.
    pub fn get_current_position(&self) -> Completion {
        let options = {
            let state = self.inner.state.borrow();
            state.allowed.then_some(state.options)
        };
        let Some(options) = options else {
            return self.inner.reject_not_allowed();
        };

        let (completer, completion) = Completion::channel();
        let completer = Rc::new(Cell::new(Some(completer)));

        let on_success = {
            let weak = Rc::downgrade(&self.inner);
            let completer = completer.clone();
            Box::new(move |sample: Rc<PositionSample>| {
                let result = match weak.upgrade() {
                    Some(inner) => inner.process_reading(sample).completion(),
                    None => Ok(sample),
                };
                if let Some(completer) = completer.take() {
                    completer.complete(result);
                }
            })
        };

        let on_failure = {
            let weak = Rc::downgrade(&self.inner);
            Box::new(move |record: ErrorRecord| {
                let Some(inner) = weak.upgrade() else {
                    return;
                };
                let result = inner.process_failure(&record).completion();
                if let Some(completer) = completer.take() {
                    completer.complete(result);
                }
            })
        };

        debug!(?options, "requesting current position");
        self.inner
            .provider
            .borrow_mut()
            .get_current_position(&options, on_success, on_failure);

        completion
    }

    /// Start the continuous watch
    ///
    /// The returned handle resolves with the first reading. While a watch is
    /// already active nothing is registered again: the handle resolves with
    /// the cached reading, or with the first one if none arrived yet.
    pub fn watch_position(&self) -> Completion {
        let plan = {
            let mut state = self.inner.state.borrow_mut();
            if !state.allowed {
                WatchPlan::Denied
            } else if state.live_generation.is_some() {
                match state.pipeline.last() {
                    Some(sample) => WatchPlan::Joined(Completion::resolved(sample.clone())),
                    None => {
                        let (completer, completion) = Completion::channel();
                        state.watch_waiters.push(completer);
                        WatchPlan::Joined(completion)
                    }
                }
            } else {
                state.watch_generation += 1;
                let generation = state.watch_generation;
                state.live_generation = Some(generation);

                let (completer, completion) = Completion::channel();
                state.watch_waiters.push(completer);
                WatchPlan::Register {
                    options: state.options,
                    generation,
                    completion,
                }
            }
        };

        match plan {
            WatchPlan::Denied => {
                self.inner.stop_watching();
                self.inner.reject_not_allowed()
            }
            WatchPlan::Joined(completion) => completion,
            WatchPlan::Register {
                options,
                generation,
                completion,
            } => {
                self.register_watch(options, generation);
                completion
            }
        }
    }

    fn register_watch(&self, options: AcquisitionOptions, generation: u64) {
        let on_success = {
            let weak: Weak<Inner> = Rc::downgrade(&self.inner);
            Box::new(move |sample: Rc<PositionSample>| {
                if let Some(inner) = weak.upgrade() {
                    inner.process_watch_reading(generation, sample);
                }
            })
        };

        let on_failure = {
            let weak: Weak<Inner> = Rc::downgrade(&self.inner);
            Box::new(move |record: ErrorRecord| {
                if let Some(inner) = weak.upgrade() {
                    inner.process_watch_failure(generation, &record);
                }
            })
        };

        let registered = self
            .inner
            .provider
            .borrow_mut()
            .watch_position(&options, on_success, on_failure);

        match registered {
            Ok(id) => {
                let mut state = self.inner.state.borrow_mut();
                if state.live_generation == Some(generation) {
                    state.watch = Some(id);
                    drop(state);
                    info!(watch = id.id(), ?options, "watching position");
                } else {
                    drop(state);
                    self.inner.provider.borrow_mut().clear_watch(id);
                }
            }
            Err(e) => {
                warn!(error = %e, "provider refused watch registration");
                {
                    let mut state = self.inner.state.borrow_mut();
                    if state.live_generation == Some(generation) {
                        state.live_generation = None;
                    }
                }
                for waiter in self.inner.take_waiters() {
                    waiter.complete(Err(AcquisitionError::Registration(e.clone())));
                }
            }
        }
    }

    /// Stop the continuous watch, if any. Safe to call repeatedly.
    pub fn stop_watching(&self) {
        self.inner.stop_watching();
    }

    pub fn is_watching(&self) -> bool {
        self.inner.state.borrow().watch.is_some()
    }

    /// The last cached reading
    pub fn last_position(&self) -> Option<Rc<PositionSample>> {
        self.inner.state.borrow().pipeline.last().cloned()
    }

    /// Alias of [`last_position`](Self::last_position)
    pub fn position(&self) -> Option<Rc<PositionSample>> {
        self.last_position()
    }

    fn with_last<T>(&self, f: impl FnOnce(&PositionSample) -> Option<T>) -> Option<T> {
        self.inner.state.borrow().pipeline.last().and_then(|sample| f(sample))
    }

    pub fn timestamp(&self) -> Option<u64> {
        self.with_last(|s| Some(s.timestamp_ms))
    }

    pub fn coords(&self) -> Option<Coordinates> {
        self.with_last(|s| Some(s.coords.clone()))
    }

    pub fn latitude(&self) -> Option<f64> {
        self.with_last(|s| Some(s.coords.latitude))
    }

    pub fn longitude(&self) -> Option<f64> {
        self.with_last(|s| Some(s.coords.longitude))
    }

    pub fn accuracy(&self) -> Option<f64> {
        self.with_last(|s| Some(s.coords.accuracy))
    }

    pub fn altitude(&self) -> Option<f64> {
        self.with_last(|s| s.coords.altitude)
    }

    pub fn altitude_accuracy(&self) -> Option<f64> {
        self.with_last(|s| s.coords.altitude_accuracy)
    }

    pub fn heading(&self) -> Option<f64> {
        self.with_last(|s| s.coords.heading)
    }

    pub fn speed(&self) -> Option<f64> {
        self.with_last(|s| s.coords.speed)
    }

    /// Address of the last reading; always `None` for modern providers
    pub fn address(&self) -> Option<Address> {
        self.inner.state.borrow().pipeline.address().cloned()
    }

    pub fn revision(&self) -> ProviderRevision {
        self.inner.state.borrow().pipeline.adapter().revision()
    }

    pub fn is_address_capable(&self) -> bool {
        self.inner.state.borrow().pipeline.adapter().is_address_capable()
    }

    pub fn on_coords(&self, listener: impl Fn(&Coordinates) + 'static) -> ListenerHandle {
        self.inner.notifier.on_coords(listener)
    }

    pub fn on_address(&self, listener: impl Fn(&Address) + 'static) -> ListenerHandle {
        self.inner.notifier.on_address(listener)
    }

    pub fn on_error(&self, listener: impl Fn(&LocationError) + 'static) -> ListenerHandle {
        self.inner.notifier.on_error(listener)
    }

    pub fn remove_listener(&self, handle: ListenerHandle) -> bool {
        self.inner.notifier.remove(handle)
    }

    /// Number of (coords, address, error) listeners
    pub fn listener_count(&self) -> (usize, usize, usize) {
        self.inner.notifier.listener_count()
    }

    /// Shutdown hook: stop the active watch
    pub fn teardown(&self) {
        if self.inner.stop_watching() {
            debug!("watch stopped during teardown");
        }
    }

    /// Disable location access: stop the watch and persist the revocation
    pub fn disable(&self) -> Result<(), PreferenceError> {
        self.teardown();
        self.set_allowed(false)
    }
}

impl Drop for Geolocation {
    fn drop(&mut self) {
        self.teardown();
    }
}
