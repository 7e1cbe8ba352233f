//! Reading and failure processing

pub mod change;
pub mod classifier;
pub mod pipeline;

pub use change::{Change, ChangeDetector};
pub use classifier::classify;
pub use pipeline::{Outcome, Pipeline};
