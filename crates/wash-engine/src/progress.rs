//! Progress hooks for the wash engine.
//!
//! The engine calls [`ProgressReporter::report`] at every checkpoint (loss
//! found, replacements found, before and after a split, pairing done).
//! Reporters only observe; nothing they do feeds back into matching.

use crate::ledger::Ledger;
use crate::lot::LotId;

/// Receives engine checkpoints.
pub trait ProgressReporter {
    /// `lots` is the current working set, `highlighted` the lots the
    /// checkpoint is about.
    fn report(&mut self, ledger: &Ledger, lots: &[LotId], message: &str, highlighted: &[LotId]);
}

/// Ignores every checkpoint.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullReporter;

impl ProgressReporter for NullReporter {
    fn report(&mut self, _ledger: &Ledger, _lots: &[LotId], _message: &str, _highlighted: &[LotId]) {}
}

/// Emits each checkpoint as a `debug` event.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl ProgressReporter for TracingReporter {
    fn report(&mut self, ledger: &Ledger, lots: &[LotId], message: &str, highlighted: &[LotId]) {
        let detail: Vec<String> = highlighted
            .iter()
            .filter_map(|id| ledger.get(*id).ok().map(|lot| format!("#{} {}", id, lot)))
            .collect();
        tracing::debug!(working = lots.len(), lots = ?detail, "{}", message);
    }
}
