use crate::clip_store::{AudioClip, ClipStore};
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

/// Reads the curated clip list: one media-relative file path per line,
/// blank lines and `#` comments ignored. The order of the file is the
/// order every curated annotator walks.
pub fn load_curated_list<P: AsRef<Path>>(path: P) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path.as_ref())
        .with_context(|| format!("Failed to read curated list {:?}", path.as_ref()))?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect())
}

/// Walks each annotator through the shared curated list exactly once.
///
/// Every annotator has a cursor into the list, created lazily at 0. A call
/// to [`CuratedQueue::next`] scans forward from the cursor, skips clips the
/// annotator already annotated, and persists the scan position so that the
/// same entry is never handed out twice to one annotator. Cursors live in
/// process memory only; a restart rewinds everyone to the list head.
pub struct CuratedQueue {
    clip_store: Arc<dyn ClipStore>,
    list: Vec<String>,
    cursors: Mutex<HashMap<usize, usize>>,
}

impl CuratedQueue {
    pub fn new(clip_store: Arc<dyn ClipStore>, list: Vec<String>) -> CuratedQueue {
        CuratedQueue {
            clip_store,
            list,
            cursors: Mutex::new(HashMap::new()),
        }
    }

    /// The next curated clip for this annotator, or None when the
    /// annotator has walked past the end of the list.
    ///
    /// The cursor guard is held across the scan: concurrent calls for the
    /// same annotator are serialized instead of both reading a stale
    /// cursor and double-serving an entry.
    pub fn next(&self, annotator_id: usize) -> Result<Option<AudioClip>> {
        let mut cursors = self.cursors.lock().unwrap();
        let mut position = *cursors.get(&annotator_id).unwrap_or(&0);

        let found = loop {
            let Some(file_path) = self.list.get(position) else {
                break None;
            };
            position += 1;

            let clip = match self.clip_store.find_by_path(file_path)? {
                Some(clip) => clip,
                None => {
                    warn!("Curated list entry {} has no registered clip", file_path);
                    continue;
                }
            };
            if self.clip_store.annotation_exists(&clip.id, annotator_id)? {
                debug!(
                    "Curated: annotator {} already annotated {}, skipping",
                    annotator_id, file_path
                );
                continue;
            }
            break Some(clip);
        };

        // The scan position, not the found index: once an entry has been
        // examined (served or skipped) it is never revisited.
        cursors.insert(annotator_id, position);
        Ok(found)
    }
}
