//! A model that wires callbacks into publishers it owns.
//!
//! Each `wire_*` method installs a three-level chain: the callback stored in
//! `a` installs one into `b`, which installs one into `c`, which logs. The
//! methods differ only in how each level reaches the model:
//!
//! | Method | Holds the model | Cycle after firing |
//! |---|---|---|
//! | [`wire_strong_self`](Model::wire_strong_self) | `Rc` at every level | yes |
//! | [`wire_single_guarded_self`](Model::wire_single_guarded_self) | `Weak` at `a`, then the upgraded `Rc` | yes |
//! | [`wire_guard_all_levels`](Model::wire_guard_all_levels) | `Weak`, upgraded per level | no |
//! | [`wire_weak_self`](Model::wire_weak_self) | `Weak`, read per access | no |
//! | [`wire_nested_function_helper`](Model::wire_nested_function_helper) | `Weak`, plus a non-capturing `fn` | no |
//!
//! A cycle here is `Model -> Publisher -> closure -> Rc<Model>`. Nothing
//! outside the model can reach it once the last external `Rc` is dropped, so
//! [`Drop`] never runs and the `deinit` line is never recorded.
//!
//! ```rust
//! use capture_cycles::prelude::*;
//! use std::rc::Rc;
//!
//! let recorder = Recorder::new();
//! let model = Model::new("D", Rc::new(recorder.clone()));
//! model.wire(CaptureStrategy::WeakSelf);
//! model.publish_all();
//! drop(model);
//!
//! assert_eq!(recorder.lines(), vec!["D received Weak self", "D deinit"]);
//! ```

use std::{
  fmt::{Debug, Formatter},
  rc::{Rc, Weak},
};

use crate::{
  journal::{Journal, Lifecycle},
  publisher::Publisher,
  strategy::CaptureStrategy,
};

pub struct Model {
  id: String,
  journal: Rc<dyn Journal>,
  a: Publisher,
  b: Publisher,
  c: Publisher,
}

impl Model {
  /// Create a model. The returned `Rc` is the only strong handle.
  pub fn new(id: impl Into<String>, journal: Rc<dyn Journal>) -> Rc<Self> {
    Rc::new(Model {
      id: id.into(),
      journal,
      a: Publisher::new(),
      b: Publisher::new(),
      c: Publisher::new(),
    })
  }

  #[inline]
  pub fn id(&self) -> &str { &self.id }

  #[inline]
  pub fn journal(&self) -> &Rc<dyn Journal> { &self.journal }

  #[inline]
  pub fn a(&self) -> &Publisher { &self.a }

  #[inline]
  pub fn b(&self) -> &Publisher { &self.b }

  #[inline]
  pub fn c(&self) -> &Publisher { &self.c }

  /// Record `"<id> received <label>"`.
  pub fn log(&self, label: &str) {
    self.journal.record(Lifecycle::Received { id: self.id.clone(), label: label.to_owned() });
  }

  /// Fire `a`, `b` and `c`, in that order, whether or not they hold a
  /// callback.
  pub fn publish_all(&self) {
    self.a.accept();
    self.b.accept();
    self.c.accept();
  }

  /// Drop every pending callback, breaking any cycle a wiring formed.
  ///
  /// Safe to call from inside a firing callback: that callback is dropped
  /// as soon as it returns. Returns how many callbacks were dropped.
  pub fn reset(&self) -> usize {
    let dropped = [&self.a, &self.b, &self.c].into_iter().filter(|p| p.cancel()).count();
    tracing::debug!(id = %self.id, dropped, "reset publishers");
    dropped
  }

  pub fn wire(self: &Rc<Self>, strategy: CaptureStrategy) {
    tracing::debug!(id = %self.id, %strategy, "wire");
    match strategy {
      CaptureStrategy::StrongSelf => self.wire_strong_self(),
      CaptureStrategy::SingleGuardedSelf => self.wire_single_guarded_self(),
      CaptureStrategy::GuardAllLevels => self.wire_guard_all_levels(),
      CaptureStrategy::WeakSelf => self.wire_weak_self(),
      CaptureStrategy::NestedFunctionHelper => self.wire_nested_function_helper(),
    }
  }

  /// Every level owns the model.
  ///
  /// `a` owns a closure that owns the model that owns `a`: the cycle exists
  /// as soon as this returns, fired or not.
  pub fn wire_strong_self(self: &Rc<Self>) {
    let label = CaptureStrategy::StrongSelf.label();
    let this = Rc::clone(self);
    self.a.execute(move || {
      let this_b = Rc::clone(&this);
      this.b.execute(move || {
        let this_c = Rc::clone(&this_b);
        this_b.c.execute(move || this_c.log(label));
      });
    });
  }

  /// `a` holds only a weak handle, but upgrades it once and lets the deeper
  /// closures capture the upgraded `Rc`.
  ///
  /// Before `a` fires there is no cycle. Firing stores a closure owning the
  /// model into `b`, and from then on the model leaks.
  pub fn wire_single_guarded_self(self: &Rc<Self>) {
    let label = CaptureStrategy::SingleGuardedSelf.label();
    let weak = Rc::downgrade(self);
    self.a.execute(move || {
      let Some(this) = weak.upgrade() else { return };
      let this_b = Rc::clone(&this);
      this.b.execute(move || {
        let this_c = Rc::clone(&this_b);
        this_b.c.execute(move || this_c.log(label));
      });
    });
  }

  /// Every level captures a `Weak` and upgrades it into a local that dies
  /// with the level's body. Deeper closures get a fresh `Weak`, never the
  /// local.
  pub fn wire_guard_all_levels(self: &Rc<Self>) {
    let label = CaptureStrategy::GuardAllLevels.label();
    let weak = Rc::downgrade(self);
    self.a.execute(move || {
      let Some(this) = weak.upgrade() else { return };
      let weak = Rc::downgrade(&this);
      this.b.execute(move || {
        let Some(this) = weak.upgrade() else { return };
        let weak = Rc::downgrade(&this);
        this.c.execute(move || {
          let Some(this) = weak.upgrade() else { return };
          this.log(label);
        });
      });
    });
  }

  /// Every access goes through the `Weak`; no level binds the model for
  /// longer than one expression.
  pub fn wire_weak_self(self: &Rc<Self>) {
    let label = CaptureStrategy::WeakSelf.label();
    let weak = Rc::downgrade(self);
    self.a.execute(move || {
      let weak_b = weak.clone();
      if let Some(this) = weak.upgrade() {
        this.b.execute(move || {
          let weak_c = weak_b.clone();
          if let Some(this) = weak_b.upgrade() {
            this.c.execute(move || {
              if let Some(this) = weak_c.upgrade() {
                this.log(label)
              }
            })
          }
        })
      }
    });
  }

  /// Like [`wire_weak_self`](Model::wire_weak_self) for `a` and `b`. At `c`
  /// the model is upgraded only for the duration of one call to a nested
  /// `fn` item, which cannot capture anything from its surroundings.
  pub fn wire_nested_function_helper(self: &Rc<Self>) {
    fn announce(model: &Model) { model.log(CaptureStrategy::NestedFunctionHelper.label()) }

    let weak = Rc::downgrade(self);
    self.a.execute(move || {
      let weak_b = weak.clone();
      if let Some(this) = weak.upgrade() {
        this.b.execute(move || {
          let weak_c = weak_b.clone();
          if let Some(this) = weak_b.upgrade() {
            this.c.execute(move || {
              let Some(this) = weak_c.upgrade() else { return };
              announce(&this);
            })
          }
        })
      }
    });
  }
}

impl Drop for Model {
  fn drop(&mut self) { self.journal.record(Lifecycle::Deinit { id: self.id.clone() }); }
}

impl Debug for Model {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Model")
      .field("id", &self.id)
      .field("a", &self.a)
      .field("b", &self.b)
      .field("c", &self.c)
      .finish()
  }
}

/// Upgrade `weak` and hand the model to `f`, doing nothing when the model is
/// gone.
pub fn with_model<R>(weak: &Weak<Model>, f: impl FnOnce(&Model) -> R) -> Option<R> {
  weak.upgrade().map(|model| f(&model))
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::journal::Recorder;

  fn model(id: &str) -> (Rc<Model>, Recorder) {
    let recorder = Recorder::new();
    (Model::new(id, Rc::new(recorder.clone())), recorder)
  }

  #[test]
  fn log_format() {
    let (m, recorder) = model("A");
    m.log("Strong self");
    assert_eq!(recorder.lines(), vec!["A received Strong self"]);
  }

  #[test]
  fn unwired_model_deinits() {
    let (m, recorder) = model("X");
    m.publish_all();
    drop(m);
    assert_eq!(recorder.lines(), vec!["X deinit"]);
  }

  #[test]
  fn every_strategy_logs_once_per_publish() {
    for strategy in CaptureStrategy::ALL {
      let (m, recorder) = model("M");
      m.wire(strategy);
      m.publish_all();
      assert_eq!(recorder.lines(), vec![format!("M received {}", strategy.label())]);
      m.reset();
    }
  }

  #[test]
  fn levels_fire_in_order() {
    let (m, recorder) = model("O");
    m.wire(CaptureStrategy::GuardAllLevels);
    assert!(m.a().is_pending());
    assert!(!m.b().is_pending());

    m.a().accept();
    assert!(m.b().is_pending());
    assert!(!m.c().is_pending());
    assert!(recorder.is_empty());

    m.b().accept();
    assert!(m.c().is_pending());
    assert!(recorder.is_empty());

    m.c().accept();
    assert_eq!(recorder.lines(), vec!["O received Guard all"]);
  }

  #[test]
  fn firing_out_of_order_logs_nothing() {
    let (m, recorder) = model("R");
    m.wire(CaptureStrategy::WeakSelf);
    m.c().accept();
    m.b().accept();
    m.a().accept();
    assert!(recorder.is_empty());

    m.publish_all();
    assert_eq!(recorder.lines(), vec!["R received Weak self"]);
  }

  #[test]
  fn strong_self_cycles_before_firing() {
    let (m, _recorder) = model("A");
    m.wire_strong_self();
    assert_eq!(Rc::strong_count(&m), 2);
    m.reset();
    assert_eq!(Rc::strong_count(&m), 1);
  }

  #[test]
  fn strong_self_leaks() {
    let (m, recorder) = model("A");
    m.wire_strong_self();
    m.publish_all();
    let probe = Rc::downgrade(&m);
    drop(m);

    assert_eq!(recorder.deinit_count("A"), 0);
    let leaked = probe.upgrade().unwrap();
    leaked.reset();
    drop(leaked);
    assert_eq!(recorder.deinit_count("A"), 1);
  }

  #[test]
  fn single_guard_leaks_once_fired() {
    let (m, recorder) = model("B");
    m.wire_single_guarded_self();
    assert_eq!(Rc::strong_count(&m), 1);

    m.publish_all();
    assert!(Rc::strong_count(&m) > 1);
    let probe = Rc::downgrade(&m);
    drop(m);

    assert_eq!(recorder.deinit_count("B"), 0);
    assert!(probe.upgrade().is_some());
    with_model(&probe, |m| m.reset());
    assert_eq!(recorder.deinit_count("B"), 1);
  }

  #[test]
  fn single_guard_unfired_deinits() {
    let (m, recorder) = model("B");
    m.wire_single_guarded_self();
    drop(m);
    assert_eq!(recorder.lines(), vec!["B deinit"]);
  }

  #[test]
  fn weak_disciplines_deinit_exactly_once() {
    for strategy in [
      CaptureStrategy::GuardAllLevels,
      CaptureStrategy::WeakSelf,
      CaptureStrategy::NestedFunctionHelper,
    ] {
      let (m, recorder) = model("W");
      m.wire(strategy);
      m.publish_all();
      assert_eq!(Rc::strong_count(&m), 1, "{strategy}");
      drop(m);
      assert_eq!(recorder.deinit_count("W"), 1, "{strategy}");
    }
  }

  #[test]
  fn detached_weak_callback_is_noop_after_deinit() {
    for strategy in [
      CaptureStrategy::SingleGuardedSelf,
      CaptureStrategy::GuardAllLevels,
      CaptureStrategy::WeakSelf,
      CaptureStrategy::NestedFunctionHelper,
    ] {
      let (m, recorder) = model("G");
      m.wire(strategy);
      let mut detached = m.a().take().unwrap();
      drop(m);
      assert_eq!(recorder.lines(), vec!["G deinit"]);

      detached();
      assert_eq!(recorder.len(), 1, "{strategy}");
    }
  }

  #[test]
  fn detached_terminal_callback_is_noop_after_deinit() {
    let (m, recorder) = model("T");
    m.wire(CaptureStrategy::NestedFunctionHelper);
    m.a().accept();
    m.b().accept();
    let mut terminal = m.c().take().unwrap();
    drop(m);

    terminal();
    assert_eq!(recorder.lines(), vec!["T deinit"]);
  }

  #[test]
  fn reset_counts_dropped_callbacks() {
    let (m, _recorder) = model("Z");
    assert_eq!(m.reset(), 0);
    m.wire(CaptureStrategy::WeakSelf);
    m.a().accept();
    assert_eq!(m.reset(), 2);
    assert!(!m.a().is_pending());
    assert!(!m.b().is_pending());
  }

  #[test]
  fn reset_from_own_callback_breaks_cycle() {
    let (m, recorder) = model("A");
    m.wire_strong_self();
    let Some(mut chain) = m.a().take() else { panic!("wiring left `a` empty") };
    let weak = Rc::downgrade(&m);
    m.a().execute(move || {
      chain();
      with_model(&weak, Model::reset);
    });

    m.publish_all();
    assert!(!m.a().is_pending());
    assert!(!m.b().is_pending());
    assert_eq!(Rc::strong_count(&m), 1);

    let probe = Rc::downgrade(&m);
    drop(m);
    assert!(probe.upgrade().is_none());
    assert_eq!(recorder.deinit_count("A"), 1);
  }

  #[test]
  fn journal_is_shared_with_caller() {
    let recorder = Recorder::new();
    let journal: Rc<dyn Journal> = Rc::new(recorder.clone());
    let m = Model::new("J", journal.clone());
    assert!(Rc::ptr_eq(m.journal(), &journal));

    m.journal().record(Lifecycle::Received { id: "J".into(), label: "direct".into() });
    assert_eq!(recorder.events(), vec![Lifecycle::Received { id: "J".into(), label: "direct".into() }]);
  }

  #[test]
  fn with_model_on_dropped_model() {
    let (m, _recorder) = model("Q");
    let weak = Rc::downgrade(&m);
    assert_eq!(with_model(&weak, |m| m.id().to_owned()), Some("Q".to_owned()));
    drop(m);
    assert_eq!(with_model(&weak, |m| m.id().to_owned()), None);
  }
}
