use super::models::{Annotation, AnnotationClass, AnnotationUpdate, AudioClip, NewAnnotation};
use anyhow::Result;
use std::path::PathBuf;

/// Storage of audio clips, their annotations and the label taxonomy.
pub trait ClipStore: Send + Sync {
    /// Registers a clip under the given id. Returns false when a clip with
    /// the same file path is already registered.
    fn register_clip(&self, id: &str, file_path: &str) -> Result<bool>;

    fn all_clips(&self) -> Result<Vec<AudioClip>>;

    /// Clips filtered by annotation status: Some(true) means at least one
    /// annotation, Some(false) means none, None means everything.
    fn clips_filtered(&self, annotated: Option<bool>) -> Result<Vec<AudioClip>>;

    /// Returns Ok(None) if the clip does not exist.
    fn get_clip(&self, id: &str) -> Result<Option<AudioClip>>;

    /// Looks a clip up by its media-relative file path.
    fn find_by_path(&self, file_path: &str) -> Result<Option<AudioClip>>;

    /// Clips still under `quota` annotations that `exclude_annotator` has
    /// not annotated yet. The random-pool candidate set.
    fn find_eligible_candidates(
        &self,
        exclude_annotator: usize,
        quota: i64,
    ) -> Result<Vec<AudioClip>>;

    /// Whether an annotation fact exists for (clip, annotator).
    fn annotation_exists(&self, clip_id: &str, annotator_id: usize) -> Result<bool>;

    /// Absolute filesystem path a clip's audio is expected at.
    fn clip_audio_path(&self, clip: &AudioClip) -> PathBuf;

    /// Inserts an annotation and bumps the clip's annotation count in one
    /// transaction. Returns Ok(None) when this annotator already annotated
    /// the clip.
    fn insert_annotation(&self, new: NewAnnotation) -> Result<Option<Annotation>>;

    /// Returns Ok(None) if the annotation does not exist.
    fn get_annotation(&self, id: &str) -> Result<Option<Annotation>>;

    /// Applies a partial update to an annotation owned by `annotator_id`.
    /// Returns Ok(None) when no such annotation exists for that annotator.
    fn update_annotation(
        &self,
        id: &str,
        annotator_id: usize,
        update: AnnotationUpdate,
    ) -> Result<Option<Annotation>>;

    fn annotations_for_clip(&self, clip_id: &str) -> Result<Vec<Annotation>>;

    /// All annotations on clips that have at least one annotation.
    fn all_annotations(&self) -> Result<Vec<Annotation>>;

    fn all_classes(&self) -> Result<Vec<AnnotationClass>>;

    fn class_names(&self) -> Result<Vec<String>>;

    /// Adds a class. Returns Ok(None) when the name is already taken.
    fn add_class(&self, name: &str) -> Result<Option<AnnotationClass>>;
}
