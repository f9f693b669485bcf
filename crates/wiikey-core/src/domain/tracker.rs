//! Edge detection between successive controller samples.

use crate::domain::guitar::{ControllerSample, GuitarControl};

/// One control whose state changed between two samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub control: GuitarControl,
    /// New state: `true` = pressed / engaged.
    pub pressed: bool,
}

/// Holds the last observed sample for one remote.
///
/// The baseline starts at [`ControllerSample::default`] (everything
/// released), so the first sample reports every control that is already
/// held as a press.
#[derive(Debug, Default)]
pub struct ControllerStateTracker {
    baseline: ControllerSample,
}

impl ControllerStateTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compares `sample` against the stored baseline and returns every
    /// control that flipped, in index order.
    ///
    /// `sample` always becomes the new baseline, even when nothing changed.
    pub fn observe(&mut self, sample: ControllerSample) -> Vec<Transition> {
        let before = self.baseline.controls();
        let transitions = GuitarControl::ALL
            .iter()
            .zip(sample.controls())
            .filter(|(control, now)| before[control.index()] != *now)
            .map(|(control, now)| Transition {
                control: *control,
                pressed: now,
            })
            .collect();
        self.baseline = sample;
        transitions
    }

    /// The sample the next call to [`observe`](Self::observe) diffs against.
    pub fn baseline(&self) -> ControllerSample {
        self.baseline
    }
}
