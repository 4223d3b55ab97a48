use crate::clip_store::{AudioClip, ClipStore};
use anyhow::Result;
use std::sync::Arc;

/// Maximum number of independent annotations a single clip may receive.
pub const ANNOTATION_QUOTA: i64 = 3;

/// Read-only view over the clip store answering "may this annotator still
/// be given this clip?". Owns no state of its own; annotation counts and
/// facts live in the store.
pub struct QuotaTracker {
    clip_store: Arc<dyn ClipStore>,
    quota: i64,
}

impl QuotaTracker {
    pub fn new(clip_store: Arc<dyn ClipStore>) -> QuotaTracker {
        QuotaTracker {
            clip_store,
            quota: ANNOTATION_QUOTA,
        }
    }

    /// True iff the clip is under quota and the annotator has not
    /// annotated it yet.
    pub fn is_eligible(&self, clip: &AudioClip, annotator_id: usize) -> Result<bool> {
        if clip.annotated >= self.quota {
            return Ok(false);
        }
        Ok(!self.clip_store.annotation_exists(&clip.id, annotator_id)?)
    }

    /// Materializes every clip currently eligible for the annotator.
    pub fn eligible_candidates(&self, annotator_id: usize) -> Result<Vec<AudioClip>> {
        self.clip_store
            .find_eligible_candidates(annotator_id, self.quota)
    }
}
