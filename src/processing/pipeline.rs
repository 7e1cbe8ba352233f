//! Single result pipeline shared by one-shot and continuous acquisition

use crate::api::types::{AcquisitionError, LocationError};
use crate::core::{Address, PositionSample};
use crate::processing::change::{Change, ChangeDetector};
use crate::processing::classifier::classify;
use crate::provider::{AcquisitionOptions, ErrorRecord, ProviderAdapter};
use std::rc::Rc;

/// Typed result of one provider callback
///
/// Completion handles and listeners both consume this value.
#[derive(Debug, Clone)]
pub enum Outcome {
    /// A reading arrived; `change` is `None` when it was already cached
    Reading {
        sample: Rc<PositionSample>,
        change: Option<Change>,
    },
    /// The provider reported a failure
    Failure(LocationError),
}

impl Outcome {
    /// Result to hand to the completion handle of the originating call
    pub fn completion(&self) -> Result<Rc<PositionSample>, AcquisitionError> {
        match self {
            Outcome::Reading { sample, .. } => Ok(sample.clone()),
            Outcome::Failure(error) => Err(error.clone().into()),
        }
    }
}

/// Change detection plus classification for one instance
#[derive(Debug)]
pub struct Pipeline {
    adapter: ProviderAdapter,
    detector: ChangeDetector,
}

impl Pipeline {
    pub fn new(adapter: ProviderAdapter) -> Self {
        Self {
            adapter,
            detector: ChangeDetector::new(),
        }
    }

    pub fn reading(&mut self, sample: Rc<PositionSample>) -> Outcome {
        let change = self.detector.observe(&sample, &self.adapter);
        Outcome::Reading { sample, change }
    }

    pub fn failure(&self, record: &ErrorRecord, options: &AcquisitionOptions) -> Outcome {
        Outcome::Failure(classify(record, options))
    }

    pub fn adapter(&self) -> &ProviderAdapter {
        &self.adapter
    }

    pub fn last(&self) -> Option<&Rc<PositionSample>> {
        self.detector.last()
    }

    pub fn address(&self) -> Option<&Address> {
        self.detector.address()
    }
}
