//! One-shot completion handles returned by acquisition calls

use crate::api::types::AcquisitionError;
use crate::core::PositionSample;
use futures_channel::oneshot;
use futures_util::FutureExt;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll};

/// Result delivered through a [`Completion`]
pub type CompletionResult = Result<Rc<PositionSample>, AcquisitionError>;

/// Resolves or rejects exactly once
///
/// Await it, or poll it without an executor through
/// [`try_result`](Self::try_result). A request dropped by the provider or by
/// `stop_watching` rejects with [`AcquisitionError::Abandoned`].
#[derive(Debug)]
pub struct Completion {
    receiver: oneshot::Receiver<CompletionResult>,
}

/// Sending half of a [`Completion`]
#[derive(Debug)]
pub(crate) struct Completer {
    sender: oneshot::Sender<CompletionResult>,
}

impl Completer {
    pub(crate) fn complete(self, result: CompletionResult) {
        // The caller may have dropped the handle; nobody is left to tell.
        let _ = self.sender.send(result);
    }
}

impl Completion {
    pub(crate) fn channel() -> (Completer, Completion) {
        let (sender, receiver) = oneshot::channel();
        (Completer { sender }, Completion { receiver })
    }

    /// A handle that is already resolved
    pub fn resolved(sample: Rc<PositionSample>) -> Self {
        let (completer, completion) = Self::channel();
        completer.complete(Ok(sample));
        completion
    }

    /// A handle that is already rejected
    pub fn rejected(error: AcquisitionError) -> Self {
        let (completer, completion) = Self::channel();
        completer.complete(Err(error));
        completion
    }

    /// Take the result if it is available, `None` while still pending
    pub fn try_result(&mut self) -> Option<CompletionResult> {
        match self.receiver.try_recv() {
            Ok(Some(result)) => Some(result),
            Ok(None) => None,
            Err(oneshot::Canceled) => Some(Err(AcquisitionError::Abandoned)),
        }
    }
}

impl Future for Completion {
    type Output = CompletionResult;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.receiver
            .poll_unpin(cx)
            .map(|received| received.unwrap_or(Err(AcquisitionError::Abandoned)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::LocationError;
    use crate::core::Coordinates;

    #[test]
    fn test_pending_then_resolved() {
        let (completer, mut completion) = Completion::channel();
        assert!(completion.try_result().is_none());

        let sample = Rc::new(PositionSample::new(7, Coordinates::new(1.0, 2.0, 3.0)));
        completer.complete(Ok(sample.clone()));
        let result = completion.try_result().unwrap().unwrap();
        assert!(Rc::ptr_eq(&result, &sample));
    }

    #[test]
    fn test_dropped_completer_abandons() {
        let (completer, completion) = Completion::channel();
        drop(completer);
        assert_eq!(
            completion.now_or_never(),
            Some(Err(AcquisitionError::Abandoned))
        );
    }

    #[test]
    fn test_rejected_is_ready() {
        let completion = Completion::rejected(LocationError::NotAllowed.into());
        assert_eq!(
            completion.now_or_never(),
            Some(Err(AcquisitionError::Location(LocationError::NotAllowed)))
        );
    }
}
