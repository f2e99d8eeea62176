//! Harness that owns models from the outside.
//!
//! The driver is the only external strong holder of every model it spawns.
//! Alongside each strong handle it keeps a weak probe, so after
//! [`release`](Driver::release) it can still tell whether the model was
//! reclaimed or is being kept alive by its own callbacks.

use std::rc::{Rc, Weak};

use smallvec::SmallVec;

use crate::{
  journal::Journal,
  model::{with_model, Model},
  strategy::CaptureStrategy,
};

/// The documented scenario: five models, one per capture discipline.
pub const DOCUMENTED_PLAN: [(&str, CaptureStrategy); 5] = [
  ("A", CaptureStrategy::StrongSelf),
  ("B", CaptureStrategy::SingleGuardedSelf),
  ("C", CaptureStrategy::GuardAllLevels),
  ("D", CaptureStrategy::WeakSelf),
  ("E", CaptureStrategy::NestedFunctionHelper),
];

/// Id of the `index`-th model of a generated plan: `A`..`Z`, then `AA`,
/// `AB`, and so on.
pub fn sequential_id(index: usize) -> String {
  let mut id = Vec::new();
  let mut n = index + 1;
  while n > 0 {
    n -= 1;
    id.push(b'A' + (n % 26) as u8);
    n /= 26;
  }
  id.iter().rev().map(|&b| b as char).collect()
}

struct Slot {
  id: String,
  strategy: CaptureStrategy,
  held: Option<Rc<Model>>,
  probe: Weak<Model>,
}

/// A released model that is still alive.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Leak {
  pub id: String,
  pub strategy: CaptureStrategy,
  /// Strong handles currently owned by the model's own callbacks.
  pub strong_count: usize,
}

pub struct Driver {
  journal: Rc<dyn Journal>,
  slots: SmallVec<[Slot; 5]>,
}

impl Driver {
  pub fn new(journal: Rc<dyn Journal>) -> Self { Self { journal, slots: SmallVec::new() } }

  /// Construct a model, wire it with `strategy` and keep the only external
  /// handle to it. Returns the slot index.
  pub fn spawn(&mut self, id: impl Into<String>, strategy: CaptureStrategy) -> usize {
    let id = id.into();
    let model = Model::new(id.clone(), self.journal.clone());
    model.wire(strategy);
    let probe = Rc::downgrade(&model);
    self.slots.push(Slot { id, strategy, held: Some(model), probe });
    self.slots.len() - 1
  }

  #[inline]
  pub fn len(&self) -> usize { self.slots.len() }

  #[inline]
  pub fn is_empty(&self) -> bool { self.slots.is_empty() }

  /// The driver's own handle, if it still holds one.
  pub fn get(&self, index: usize) -> Option<&Rc<Model>> {
    self.slots.get(index).and_then(|slot| slot.held.as_ref())
  }

  /// Fire every model the driver still holds, in spawn order.
  pub fn publish_all(&self) {
    for slot in self.slots.iter() {
      if let Some(model) = &slot.held {
        model.publish_all();
      }
    }
  }

  /// Fire a single model. Returns `false` when the driver no longer holds it.
  pub fn publish(&self, index: usize) -> bool {
    match self.get(index) {
      Some(model) => {
        model.publish_all();
        true
      }
      None => false,
    }
  }

  /// Drop the driver's strong handle. Returns whether one was held.
  pub fn release(&mut self, index: usize) -> bool {
    let Some(slot) = self.slots.get_mut(index) else { return false };
    let Some(model) = slot.held.take() else { return false };
    tracing::debug!(id = %slot.id, strategy = %slot.strategy, "release");
    drop(model);
    true
  }

  pub fn release_all(&mut self) {
    for index in 0..self.slots.len() {
      self.release(index);
    }
  }

  /// Whether the model in `index` has not been reclaimed yet.
  pub fn is_alive(&self, index: usize) -> bool {
    self.slots.get(index).is_some_and(|slot| slot.probe.strong_count() > 0)
  }

  /// Released models that are still alive.
  pub fn leaks(&self) -> Vec<Leak> {
    self
      .slots
      .iter()
      .filter(|slot| slot.held.is_none() && slot.probe.strong_count() > 0)
      .map(|slot| Leak {
        id: slot.id.clone(),
        strategy: slot.strategy,
        strong_count: slot.probe.strong_count(),
      })
      .collect()
  }

  /// Break the cycle of every leaked model so it gets reclaimed.
  ///
  /// Returns how many models were reclaimed.
  pub fn reclaim(&mut self) -> usize {
    let mut reclaimed = 0;
    for slot in self.slots.iter().filter(|slot| slot.held.is_none()) {
      if with_model(&slot.probe, Model::reset).is_none() {
        continue;
      }
      if slot.probe.strong_count() == 0 {
        tracing::debug!(id = %slot.id, "reclaimed");
        reclaimed += 1;
      } else {
        tracing::warn!(id = %slot.id, "still alive after reset");
      }
    }
    reclaimed
  }

  /// Spawn every entry of `plan`, fire them all, then release them all.
  pub fn run(&mut self, plan: &[(&str, CaptureStrategy)]) -> Vec<Leak> {
    let first = self.slots.len();
    for (id, strategy) in plan {
      self.spawn(*id, *strategy);
    }
    for index in first..self.slots.len() {
      self.publish(index);
    }
    for index in first..self.slots.len() {
      self.release(index);
    }
    self.leaks()
  }
}

impl Drop for Driver {
  fn drop(&mut self) { self.release_all() }
}
