//! Repetition controller for profiling.
//!
//! Re-runs a target's whole dependency closure several times in the same
//! process so that each repetition yields an independent timing sample.

use crate::core::engine::{Engine, RunSummary};
use crate::core::target::TargetId;
use crate::error::{Error, Result};
use crate::{mlog, mlog_error};

pub const DEFAULT_REPETITIONS: usize = 5;

/// Run `id` exactly `count` times, strictly in sequence.
///
/// Each repetition is a fresh `Engine::run`, so memoisation does not carry
/// over. A failure at repetition `k` stops before repetition `k + 1`.
pub fn repeat<C>(
    engine: &Engine<C>,
    id: &TargetId,
    count: usize,
    ctx: &mut C,
) -> Result<Vec<RunSummary>> {
    if count == 0 {
        return Err(Error::Configuration(format!(
            "Repetition count for '{}' must be positive",
            id
        )));
    }

    let mut samples = Vec::with_capacity(count);
    for k in 1..=count {
        mlog!("Repetition {}/{} of '{}'", k, count, id);
        match engine.run(id, ctx) {
            Ok(summary) => samples.push(summary),
            Err(e) => {
                mlog_error!(
                    "Repetition {}/{} of '{}' failed, skipping {} remaining",
                    k,
                    count,
                    id,
                    count - k
                );
                return Err(e);
            }
        }
    }
    Ok(samples)
}
