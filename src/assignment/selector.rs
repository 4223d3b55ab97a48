use super::curated::CuratedQueue;
use super::quota::QuotaTracker;
use crate::clip_store::AudioClip;
use anyhow::Result;
use rand::seq::IndexedRandom;
use serde::Deserialize;
use tracing::debug;

/// How the next clip for an annotator is picked.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentMode {
    /// Uniform draw from the clips the annotator is still eligible for.
    #[default]
    Random,
    /// Walk the fixed curated list.
    Curated,
}

/// Picks the next clip for an annotator, or None when nothing is left.
pub struct AssignmentSelector {
    quota_tracker: QuotaTracker,
    curated_queue: CuratedQueue,
}

impl AssignmentSelector {
    pub fn new(quota_tracker: QuotaTracker, curated_queue: CuratedQueue) -> AssignmentSelector {
        AssignmentSelector {
            quota_tracker,
            curated_queue,
        }
    }

    /// An empty outcome is expected pool exhaustion, not an error; only
    /// store failures surface as Err.
    pub fn select(&self, annotator_id: usize, mode: AssignmentMode) -> Result<Option<AudioClip>> {
        match mode {
            AssignmentMode::Random => {
                let candidates = self.quota_tracker.eligible_candidates(annotator_id)?;
                debug!(
                    "Annotator {} has {} eligible clips in the random pool",
                    annotator_id,
                    candidates.len()
                );
                Ok(candidates.choose(&mut rand::rng()).cloned())
            }
            AssignmentMode::Curated => self.curated_queue.next(annotator_id),
        }
    }
}
