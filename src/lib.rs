//! # capture-cycles: reference cycles through stored callbacks
//!
//! A [`Model`] owns three single-slot [`Publisher`]s and wires callbacks into
//! them that reach back to the model itself. Depending on whether those
//! callbacks hold an `Rc` or a `Weak`, dropping the last external handle
//! either reclaims the model or leaks it.
//!
//! ## Quick Start
//!
//! ```rust
//! use capture_cycles::prelude::*;
//! use std::rc::Rc;
//!
//! let recorder = Recorder::new();
//! let mut driver = Driver::new(Rc::new(recorder.clone()));
//!
//! let leaks = driver.run(&DOCUMENTED_PLAN);
//!
//! assert_eq!(recorder.deinits(), vec!["C", "D", "E"]);
//! assert_eq!(leaks.len(), 2);
//! ```
//!
//! ## Key Concepts
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Publisher`] | Stores one escaping callback, fires it on demand |
//! | [`Model`] | Owns three publishers and wires self-capturing chains into them |
//! | [`CaptureStrategy`] | The five capture disciplines |
//! | [`Journal`] | Receives `received` and `deinit` events |
//! | [`Driver`] | Holds models from the outside and observes their reclamation |
//!
//! ## Feature Flags
//!
//! - **`cli`** (default): builds the `leak-demo` binary
//!
//! [`Publisher`]: publisher::Publisher
//! [`Model`]: model::Model
//! [`CaptureStrategy`]: strategy::CaptureStrategy
//! [`Journal`]: journal::Journal
//! [`Driver`]: driver::Driver

pub mod driver;
pub mod journal;
pub mod model;
pub mod prelude;
pub mod publisher;
pub mod strategy;

pub use prelude::*;
