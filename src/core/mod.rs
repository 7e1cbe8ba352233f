//! Core types and constants for the position source

pub mod types;
pub mod constants;

pub use types::*;
pub use constants::*;
