//! Prelude module for convenient imports
//!
//! This module re-exports commonly used types and traits for easy access.

pub use crate::{
  driver::{sequential_id, Driver, Leak, DOCUMENTED_PLAN},
  journal::{Console, Journal, Lifecycle, Recorder},
  model::{with_model, Model},
  publisher::{Callback, Publisher},
  strategy::{CaptureStrategy, ParseStrategyError},
};
