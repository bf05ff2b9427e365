//! Progress display for plan execution
//!
//! Uses `linya`, which draws to stderr and stays out of the way of stdout output.

use linya::{Bar, Progress};

/// Observer of plan execution
pub trait ActionObserver {
  /// An action is about to run
  fn started(&mut self, _index: usize, _description: &str) {}

  /// An action completed and its status was persisted
  fn finished(&mut self, _index: usize) {}
}

/// Observer that does nothing (tests, non-interactive runs)
#[derive(Debug, Default)]
pub struct Silent;

impl ActionObserver for Silent {}

/// Single bar advanced once per completed action
pub struct ActionProgress {
  progress: Progress,
  bar: Bar,
}

impl ActionProgress {
  pub fn new(total: usize, label: impl Into<String>) -> Self {
    let mut progress = Progress::new();
    let bar = progress.bar(total, label.into());
    Self { progress, bar }
  }
}

impl ActionObserver for ActionProgress {
  fn finished(&mut self, _index: usize) {
    self.progress.inc_and_draw(&self.bar, 1);
  }
}
