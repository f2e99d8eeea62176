//! The five capture disciplines, as data.

use std::{
  error::Error,
  fmt::{Display, Formatter},
  str::FromStr,
};

/// How each level of a wiring chain gets hold of its model.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CaptureStrategy {
  /// Every level captures the model strongly.
  StrongSelf,
  /// The first level upgrades its weak handle once, and the deeper levels
  /// capture that strong binding.
  SingleGuardedSelf,
  /// Every level captures a weak handle and upgrades it only for its own body.
  GuardAllLevels,
  /// Every level captures a weak handle and only ever reads through it.
  WeakSelf,
  /// Weak handles throughout; the last level hands the upgraded model to a
  /// named helper that captures nothing.
  NestedFunctionHelper,
}

impl CaptureStrategy {
  pub const ALL: [CaptureStrategy; 5] = [
    CaptureStrategy::StrongSelf,
    CaptureStrategy::SingleGuardedSelf,
    CaptureStrategy::GuardAllLevels,
    CaptureStrategy::WeakSelf,
    CaptureStrategy::NestedFunctionHelper,
  ];

  /// The label the terminal callback logs.
  pub fn label(self) -> &'static str {
    match self {
      CaptureStrategy::StrongSelf => "Strong self",
      CaptureStrategy::SingleGuardedSelf => "Single guard",
      CaptureStrategy::GuardAllLevels => "Guard all",
      CaptureStrategy::WeakSelf => "Weak self",
      CaptureStrategy::NestedFunctionHelper => "Nested function",
    }
  }

  /// Command-line name.
  pub fn name(self) -> &'static str {
    match self {
      CaptureStrategy::StrongSelf => "strong-self",
      CaptureStrategy::SingleGuardedSelf => "single-guard",
      CaptureStrategy::GuardAllLevels => "guard-all",
      CaptureStrategy::WeakSelf => "weak-self",
      CaptureStrategy::NestedFunctionHelper => "nested-function",
    }
  }

  /// Whether a fired chain keeps its model alive after every external handle
  /// is gone.
  pub fn leaks(self) -> bool {
    matches!(self, CaptureStrategy::StrongSelf | CaptureStrategy::SingleGuardedSelf)
  }
}

impl Display for CaptureStrategy {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result { f.write_str(self.name()) }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseStrategyError(String);

impl Display for ParseStrategyError {
  fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
    write!(f, "unknown capture strategy `{}`, expected one of: ", self.0)?;
    let names: Vec<_> = CaptureStrategy::ALL.iter().map(|s| s.name()).collect();
    f.write_str(&names.join(", "))
  }
}

impl Error for ParseStrategyError {}

impl FromStr for CaptureStrategy {
  type Err = ParseStrategyError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let wanted = s.trim();
    CaptureStrategy::ALL
      .into_iter()
      .find(|strategy| strategy.name().eq_ignore_ascii_case(wanted))
      .ok_or_else(|| ParseStrategyError(s.to_owned()))
  }
}

#[cfg(test)]
mod test {
  use super::*;

  #[test]
  fn names_round_trip() {
    for strategy in CaptureStrategy::ALL {
      assert_eq!(strategy.name().parse::<CaptureStrategy>(), Ok(strategy));
    }
    assert_eq!(" Weak-Self ".parse::<CaptureStrategy>(), Ok(CaptureStrategy::WeakSelf));
  }

  #[test]
  fn unknown_name_is_an_error() {
    let err = "unowned-self".parse::<CaptureStrategy>().unwrap_err();
    let message = err.to_string();
    assert!(message.starts_with("unknown capture strategy `unowned-self`"));
    assert!(message.ends_with("weak-self, nested-function"));
  }

  #[test]
  fn only_strong_disciplines_leak() {
    let leaking: Vec<_> = CaptureStrategy::ALL.into_iter().filter(|s| s.leaks()).collect();
    assert_eq!(leaking, vec![CaptureStrategy::StrongSelf, CaptureStrategy::SingleGuardedSelf]);
  }
}
