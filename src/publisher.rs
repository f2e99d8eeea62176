//! Single-slot callback register.
//!
//! A [`Publisher`] stores at most one escaping callback and invokes it on
//! demand. It is the medium through which a [`Model`](crate::model::Model)
//! can end up owning a closure that owns the model back.

use std::{
  cell::RefCell,
  fmt::{Debug, Formatter},
};

/// An escaping, nullary callback stored for later invocation.
pub type Callback = Box<dyn FnMut()>;

enum Slot {
  Empty,
  Pending(Callback),
  /// The callback is out of the slot and running. `cancelled` is set when
  /// it is cancelled or taken before it returns.
  Firing { cancelled: bool },
}

pub struct Publisher {
  slot: RefCell<Slot>,
}

impl Default for Publisher {
  fn default() -> Self { Self { slot: RefCell::new(Slot::Empty) } }
}

impl Publisher {
  pub fn new() -> Self { Self::default() }

  /// Store `callback` as the pending callback, replacing the previous one.
  ///
  /// The callback is not invoked.
  pub fn execute(&self, callback: impl FnMut() + 'static) {
    let previous = std::mem::replace(&mut *self.slot.borrow_mut(), Slot::Pending(Box::new(callback)));
    // Drop outside the borrow: the old closure may own this publisher's owner.
    drop(previous);
  }

  /// Invoke the pending callback, or do nothing when the slot is empty or
  /// already firing.
  ///
  /// The slot keeps the callback, so firing again re-invokes it. If the
  /// callback stores a replacement into this same publisher while running,
  /// the replacement wins. If it cancels or takes itself, the slot ends up
  /// empty.
  pub fn accept(&self) {
    let mut callback = {
      let mut slot = self.slot.borrow_mut();
      match std::mem::replace(&mut *slot, Slot::Firing { cancelled: false }) {
        Slot::Pending(callback) => callback,
        idle => {
          *slot = idle;
          tracing::trace!("accept on a publisher with nothing to fire");
          return;
        }
      }
    };
    callback();
    let mut slot = self.slot.borrow_mut();
    match std::mem::replace(&mut *slot, Slot::Empty) {
      Slot::Firing { cancelled: false } => {
        *slot = Slot::Pending(callback);
        return;
      }
      Slot::Firing { cancelled: true } | Slot::Empty => {}
      replacement @ Slot::Pending(_) => *slot = replacement,
    }
    drop(slot);
    drop(callback);
  }

  /// Whether a callback is stored, counting one that is running right now.
  pub fn is_pending(&self) -> bool {
    matches!(*self.slot.borrow(), Slot::Pending(_) | Slot::Firing { cancelled: false })
  }

  /// Remove the pending callback and hand it to the caller.
  ///
  /// A running callback cannot be handed out: it is marked cancelled instead,
  /// so the slot is empty once it returns, and `None` is returned.
  pub fn take(&self) -> Option<Callback> {
    let mut slot = self.slot.borrow_mut();
    match std::mem::replace(&mut *slot, Slot::Empty) {
      Slot::Pending(callback) => Some(callback),
      Slot::Firing { .. } => {
        *slot = Slot::Firing { cancelled: true };
        None
      }
      Slot::Empty => None,
    }
  }

  /// Drop the pending callback. Returns whether one was stored.
  ///
  /// Cancelling a running callback counts: it is dropped as soon as it
  /// returns.
  pub fn cancel(&self) -> bool {
    let was_pending = self.is_pending();
    let callback = self.take();
    drop(callback);
    was_pending
  }
}

impl Debug for Publisher {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Publisher").field("is_pending", &self.is_pending()).finish()
  }
}
