//! Simulated location provider for testing and development

use crate::core::PositionSample;
use crate::provider::{
    AcquisitionOptions, ErrorRecord, FailureCallback, LocationProvider, ProviderError,
    ProviderResult, SuccessCallback, WatchId,
};
use std::cell::RefCell;
use std::collections::{BTreeMap, VecDeque};
use std::rc::Rc;

struct PendingRequest {
    on_success: SuccessCallback,
    on_failure: FailureCallback,
}

struct WatchEntry {
    id: WatchId,
    on_success: Rc<RefCell<SuccessCallback>>,
    on_failure: Rc<RefCell<FailureCallback>>,
    cleared: bool,
}

#[derive(Default)]
struct SimulatedState {
    next_watch_id: u32,
    pending: VecDeque<PendingRequest>,
    watches: Vec<WatchEntry>,
    settings: BTreeMap<String, String>,
    registration_failure: Option<ProviderError>,
    current_requests: Vec<AcquisitionOptions>,
    registrations: Vec<AcquisitionOptions>,
    cleared: Vec<WatchId>,
}

/// Scriptable provider that only calls back when told to
///
/// Clones share state, so a test keeps one clone to drive readings while the
/// other is owned by the [`crate::Geolocation`] instance.
#[derive(Clone, Default)]
pub struct SimulatedProvider {
    state: Rc<RefCell<SimulatedState>>,
}

impl SimulatedProvider {
    /// Create a provider with no settings and no pending requests
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-set a provider setting, as an application would before startup
    pub fn with_setting(self, name: &str, value: &str) -> Self {
        self.state
            .borrow_mut()
            .settings
            .insert(name.to_string(), value.to_string());
        self
    }

    /// Refuse the next watch registration with the given error
    pub fn fail_next_registration(&self, error: ProviderError) {
        self.state.borrow_mut().registration_failure = Some(error);
    }

    /// Answer the oldest outstanding one-shot request with a reading
    pub fn resolve_current(&self, sample: Rc<PositionSample>) -> bool {
        let request = self.state.borrow_mut().pending.pop_front();
        match request {
            Some(mut request) => {
                (request.on_success)(sample);
                true
            }
            None => false,
        }
    }

    /// Answer the oldest outstanding one-shot request with a failure
    pub fn reject_current(&self, error: ErrorRecord) -> bool {
        let request = self.state.borrow_mut().pending.pop_front();
        match request {
            Some(mut request) => {
                (request.on_failure)(error);
                true
            }
            None => false,
        }
    }

    /// Forget every outstanding one-shot request without answering it
    pub fn drop_pending(&self) -> usize {
        let dropped: Vec<PendingRequest> = self.state.borrow_mut().pending.drain(..).collect();
        dropped.len()
    }

    /// Deliver a reading to every active watch, returns the number reached
    pub fn push_position(&self, sample: Rc<PositionSample>) -> usize {
        self.deliver_position(sample, false)
    }

    /// Deliver a reading to every watch, including ones already cleared
    ///
    /// Mimics a provider whose callback was already queued when the watch
    /// was cleared.
    pub fn push_late_position(&self, sample: Rc<PositionSample>) -> usize {
        self.deliver_position(sample, true)
    }

    /// Deliver a failure to every active watch, returns the number reached
    pub fn push_error(&self, error: ErrorRecord) -> usize {
        let callbacks: Vec<Rc<RefCell<FailureCallback>>> = self
            .state
            .borrow()
            .watches
            .iter()
            .filter(|w| !w.cleared)
            .map(|w| w.on_failure.clone())
            .collect();

        for callback in &callbacks {
            let mut callback = callback.borrow_mut();
            (&mut *callback)(error.clone());
        }
        callbacks.len()
    }

    fn deliver_position(&self, sample: Rc<PositionSample>, include_cleared: bool) -> usize {
        let callbacks: Vec<Rc<RefCell<SuccessCallback>>> = self
            .state
            .borrow()
            .watches
            .iter()
            .filter(|w| include_cleared || !w.cleared)
            .map(|w| w.on_success.clone())
            .collect();

        for callback in &callbacks {
            let mut callback = callback.borrow_mut();
            (&mut *callback)(sample.clone());
        }
        callbacks.len()
    }

    /// Number of one-shot requests waiting for an answer
    pub fn pending_current_count(&self) -> usize {
        self.state.borrow().pending.len()
    }

    /// Total number of one-shot requests ever received
    pub fn current_request_count(&self) -> usize {
        self.state.borrow().current_requests.len()
    }

    /// Total number of successful watch registrations
    pub fn registration_count(&self) -> usize {
        self.state.borrow().registrations.len()
    }

    /// Number of watches registered and not cleared
    pub fn active_watch_count(&self) -> usize {
        self.state.borrow().watches.iter().filter(|w| !w.cleared).count()
    }

    /// Watch ids in the order they were cleared
    pub fn cleared_watches(&self) -> Vec<WatchId> {
        self.state.borrow().cleared.clone()
    }

    /// Options of the most recent one-shot request
    pub fn last_current_options(&self) -> Option<AcquisitionOptions> {
        self.state.borrow().current_requests.last().copied()
    }

    /// Options of the most recent watch registration
    pub fn last_watch_options(&self) -> Option<AcquisitionOptions> {
        self.state.borrow().registrations.last().copied()
    }
}

impl LocationProvider for SimulatedProvider {
    fn get_current_position(
        &mut self,
        options: &AcquisitionOptions,
        on_success: SuccessCallback,
        on_failure: FailureCallback,
    ) {
        let mut state = self.state.borrow_mut();
        state.current_requests.push(*options);
        state.pending.push_back(PendingRequest {
            on_success,
            on_failure,
        });
    }

    fn watch_position(
        &mut self,
        options: &AcquisitionOptions,
        on_success: SuccessCallback,
        on_failure: FailureCallback,
    ) -> ProviderResult<WatchId> {
        let mut state = self.state.borrow_mut();

        if let Some(error) = state.registration_failure.take() {
            return Err(error);
        }

        if options.timeout_ms == 0 {
            return Err(ProviderError::InvalidOptions {
                option: "timeout".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }

        state.next_watch_id += 1;
        let id = WatchId::new(state.next_watch_id);
        state.registrations.push(*options);
        state.watches.push(WatchEntry {
            id,
            on_success: Rc::new(RefCell::new(on_success)),
            on_failure: Rc::new(RefCell::new(on_failure)),
            cleared: false,
        });
        Ok(id)
    }

    fn clear_watch(&mut self, id: WatchId) {
        let mut state = self.state.borrow_mut();
        let mut found = false;
        for watch in state.watches.iter_mut().filter(|w| w.id == id && !w.cleared) {
            watch.cleared = true;
            found = true;
        }
        if found {
            state.cleared.push(id);
        }
    }

    fn setting(&self, name: &str) -> Option<String> {
        self.state.borrow().settings.get(name).cloned()
    }

    fn set_setting(&mut self, name: &str, value: &str) {
        self.state
            .borrow_mut()
            .settings
            .insert(name.to_string(), value.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Coordinates;
    use std::cell::Cell;

    fn sample(lat: f64, lon: f64) -> Rc<PositionSample> {
        Rc::new(PositionSample::new(1_000, Coordinates::new(lat, lon, 5.0)))
    }

    #[test]
    fn test_one_shot_requests_answer_in_order() {
        let mut provider = SimulatedProvider::new();
        let seen = Rc::new(RefCell::new(Vec::new()));

        for _ in 0..2 {
            let seen = seen.clone();
            provider.get_current_position(
                &AcquisitionOptions::default(),
                Box::new(move |s: Rc<PositionSample>| seen.borrow_mut().push(s.coords.latitude)),
                Box::new(|_| {}),
            );
        }
        assert_eq!(provider.pending_current_count(), 2);

        assert!(provider.resolve_current(sample(1.0, 0.0)));
        assert!(provider.resolve_current(sample(2.0, 0.0)));
        assert!(!provider.resolve_current(sample(3.0, 0.0)));
        assert_eq!(*seen.borrow(), vec![1.0, 2.0]);
        assert_eq!(provider.current_request_count(), 2);
    }

    #[test]
    fn test_cleared_watch_only_reached_by_late_delivery() {
        let mut provider = SimulatedProvider::new();
        let hits = Rc::new(Cell::new(0));
        let counter = hits.clone();

        let id = provider
            .watch_position(
                &AcquisitionOptions::default(),
                Box::new(move |_| counter.set(counter.get() + 1)),
                Box::new(|_| {}),
            )
            .unwrap();

        assert_eq!(provider.push_position(sample(1.0, 1.0)), 1);
        provider.clear_watch(id);
        provider.clear_watch(id);
        assert_eq!(provider.cleared_watches(), vec![id]);
        assert_eq!(provider.push_position(sample(1.0, 1.0)), 0);
        assert_eq!(provider.push_late_position(sample(1.0, 1.0)), 1);
        assert_eq!(hits.get(), 2);
    }

    #[test]
    fn test_registration_rejections() {
        let mut provider = SimulatedProvider::new();
        let zero_timeout = AcquisitionOptions {
            enable_high_accuracy: false,
            timeout_ms: 0,
        };
        let result = provider.watch_position(&zero_timeout, Box::new(|_| {}), Box::new(|_| {}));
        assert!(matches!(result, Err(ProviderError::InvalidOptions { .. })));

        provider.fail_next_registration(ProviderError::Unavailable("offline".to_string()));
        let result = provider.watch_position(
            &AcquisitionOptions::default(),
            Box::new(|_| {}),
            Box::new(|_| {}),
        );
        assert!(matches!(result, Err(ProviderError::Unavailable(_))));
        assert_eq!(provider.registration_count(), 0);
        assert_eq!(provider.active_watch_count(), 0);
    }

    #[test]
    fn test_settings() {
        let mut provider = SimulatedProvider::new().with_setting("accuracy", "low");
        assert_eq!(provider.setting("accuracy").as_deref(), Some("low"));
        assert_eq!(provider.setting("purpose"), None);

        provider.set_setting("purpose", "tracking");
        assert_eq!(provider.setting("purpose").as_deref(), Some("tracking"));
    }
}
