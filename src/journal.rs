//! Life-cycle events and the sinks that receive them.
//!
//! Every externally observable effect of a [`Model`](crate::model::Model) is
//! a [`Lifecycle`] event handed to a [`Journal`]. [`Console`] prints the
//! canonical lines to stdout; [`Recorder`] keeps them in memory so tests can
//! assert on exactly what happened and in which order.

use std::{
  cell::RefCell,
  fmt::{Display, Formatter},
  rc::Rc,
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Lifecycle {
  /// The terminal callback of a wiring chain ran.
  Received { id: String, label: String },
  /// The model was reclaimed.
  Deinit { id: String },
}

impl Lifecycle {
  pub fn id(&self) -> &str {
    match self {
      Lifecycle::Received { id, .. } | Lifecycle::Deinit { id } => id,
    }
  }

  #[inline]
  pub fn is_deinit(&self) -> bool { matches!(self, Lifecycle::Deinit { .. }) }
}

impl Display for Lifecycle {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    match self {
      Lifecycle::Received { id, label } => write!(f, "{id} received {label}"),
      Lifecycle::Deinit { id } => write!(f, "{id} deinit"),
    }
  }
}

/// A sink for life-cycle events.
///
/// A journal must never hold a handle to a model, otherwise it would become
/// one more strong holder in the cycles being observed.
pub trait Journal {
  fn record(&self, event: Lifecycle);
}

impl<J: Journal + ?Sized> Journal for Rc<J> {
  #[inline]
  fn record(&self, event: Lifecycle) { (**self).record(event) }
}

/// Prints each event on its own stdout line.
#[derive(Clone, Copy, Debug, Default)]
pub struct Console;

impl Journal for Console {
  fn record(&self, event: Lifecycle) {
    tracing::debug!(id = event.id(), deinit = event.is_deinit(), "lifecycle");
    println!("{event}");
  }
}

/// Keeps every event in memory, in arrival order.
///
/// Clones share the same buffer.
#[derive(Clone, Debug, Default)]
pub struct Recorder(Rc<RefCell<Vec<Lifecycle>>>);

impl Recorder {
  pub fn new() -> Self { Self::default() }

  pub fn events(&self) -> Vec<Lifecycle> { self.0.borrow().clone() }

  /// The events rendered the way [`Console`] prints them.
  pub fn lines(&self) -> Vec<String> { self.0.borrow().iter().map(ToString::to_string).collect() }

  /// Ids of reclaimed models, in the order they were reclaimed.
  pub fn deinits(&self) -> Vec<String> {
    self.0.borrow().iter().filter(|e| e.is_deinit()).map(|e| e.id().to_owned()).collect()
  }

  pub fn deinit_count(&self, id: &str) -> usize {
    self.0.borrow().iter().filter(|e| e.is_deinit() && e.id() == id).count()
  }

  #[inline]
  pub fn len(&self) -> usize { self.0.borrow().len() }

  #[inline]
  pub fn is_empty(&self) -> bool { self.0.borrow().is_empty() }

  pub fn clear(&self) { self.0.borrow_mut().clear() }
}

impl Journal for Recorder {
  fn record(&self, event: Lifecycle) {
    tracing::trace!(%event, "recorded");
    self.0.borrow_mut().push(event);
  }
}
