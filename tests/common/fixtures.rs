//! Test fixture creation for the clip database and media directory

use super::constants::*;
use annotation_server::clip_store::{ClipStore, SqliteClipStore};
use anyhow::Result;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// Minimal RIFF/WAVE header followed by a little silence; enough for
/// byte-level assertions without shipping a real recording.
pub const TEST_AUDIO_BYTES: &[u8] =
    b"RIFF\x24\x00\x00\x00WAVEfmt \x10\x00\x00\x00\x01\x00\x01\x00\x44\xac\x00\x00\
      \x88\x58\x01\x00\x02\x00\x10\x00data\x00\x00\x00\x00";

/// Creates a temporary media directory and clip database with the three
/// standard test clips registered.
/// Returns (temp_dir, clip_db_path, media_path).
pub fn create_test_clip_db() -> Result<(TempDir, PathBuf, PathBuf)> {
    let dir = TempDir::new()?;

    let media_path = dir.path().join("media");
    fs::create_dir_all(media_path.join("harbor"))?;
    fs::create_dir_all(media_path.join("market"))?;

    fs::write(media_path.join(CLIP_1_PATH), TEST_AUDIO_BYTES)?;
    fs::write(media_path.join(CLIP_2_PATH), TEST_AUDIO_BYTES)?;
    fs::write(media_path.join(CLIP_3_PATH), TEST_AUDIO_BYTES)?;

    let clip_db_path = dir.path().join("clips.db");
    let store = SqliteClipStore::new(&clip_db_path, &media_path)?;
    store.register_clip(CLIP_1_ID, CLIP_1_PATH)?;
    store.register_clip(CLIP_2_ID, CLIP_2_PATH)?;
    store.register_clip(CLIP_3_ID, CLIP_3_PATH)?;

    Ok((dir, clip_db_path, media_path))
}
