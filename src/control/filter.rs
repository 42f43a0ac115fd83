//! Change-threshold filter.
//!
//! Suppresses commands for samples that sit too close to the last value
//! that was actually sent. Threshold 0 passes everything; the stepper
//! uses 5 so attention jitter doesn't make the motor chatter.
//!
//! The control loop asks [`ChangeFilter::passes`] before writing and only
//! calls [`ChangeFilter::commit`] once the command is on the wire.

use super::mapping::AttentionSample;

/// Last attention value that passed the filter. `None` until the first sample.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterState {
    pub last_emitted: Option<u8>,
}

/// Whether `attention` differs enough from the last emitted value.
pub fn is_significant(state: &FilterState, attention: u8, threshold: u8) -> bool {
    match state.last_emitted {
        None => true,
        Some(last) => attention.abs_diff(last) >= threshold,
    }
}

/// Decide whether `attention` is significant against `state`.
///
/// Updates `state` only when the sample is accepted.
pub fn accept(state: &mut FilterState, attention: u8, threshold: u8) -> bool {
    let significant = is_significant(state, attention, threshold);
    if significant {
        state.last_emitted = Some(attention);
    }
    significant
}

/// Stateful gate owned by the control loop.
#[derive(Debug, Clone)]
pub struct ChangeFilter {
    threshold: u8,
    state: FilterState,
}

impl ChangeFilter {
    pub fn new(threshold: u8) -> Self {
        Self {
            threshold,
            state: FilterState::default(),
        }
    }

    /// Check without moving the reference.
    pub fn passes(&self, sample: AttentionSample) -> bool {
        is_significant(&self.state, sample.value(), self.threshold)
    }

    /// Record `sample` as the last value sent.
    pub fn commit(&mut self, sample: AttentionSample) {
        self.state.last_emitted = Some(sample.value());
    }

    /// Check and commit in one step.
    pub fn accept(&mut self, sample: AttentionSample) -> bool {
        accept(&mut self.state, sample.value(), self.threshold)
    }

    pub fn last_emitted(&self) -> Option<u8> {
        self.state.last_emitted
    }
}
