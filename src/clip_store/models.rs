use serde::{Deserialize, Serialize};

/// An audio clip registered for annotation.
///
/// `annotated` counts completed annotations and only ever grows; it is
/// bumped by [`super::ClipStore::insert_annotation`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AudioClip {
    pub id: String,
    /// Path relative to the media directory.
    pub file_path: String,
    pub annotated: i64,
}

impl AudioClip {
    /// File name without directories, as exposed to clients.
    pub fn basename(&self) -> &str {
        self.file_path
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(&self.file_path)
    }

    /// The identifier the AI prediction service knows this clip by:
    /// the basename with its extension stripped.
    pub fn recording_id(&self) -> &str {
        let name = self.basename();
        match name.rfind('.') {
            Some(0) | None => name,
            Some(dot) => &name[..dot],
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct Annotation {
    pub id: String,
    pub clip_id: String,
    pub annotated_by: usize,
    /// The submitted labels, opaque JSON.
    pub payload: serde_json::Value,
    pub ai_payload: Option<serde_json::Value>,
    pub interface_variant: Option<i64>,
    pub labeling_time_ms: Option<i64>,
    pub created: i64,
}

/// Fields of a new annotation submission.
#[derive(Clone, Debug, Deserialize)]
pub struct NewAnnotation {
    pub clip_id: String,
    pub annotated_by: usize,
    pub payload: serde_json::Value,
    pub ai_payload: Option<serde_json::Value>,
    pub interface_variant: Option<i64>,
    pub labeling_time_ms: Option<i64>,
}

/// Partial update of an annotation; absent fields are left untouched.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct AnnotationUpdate {
    pub payload: Option<serde_json::Value>,
    pub ai_payload: Option<serde_json::Value>,
    pub interface_variant: Option<i64>,
    pub labeling_time_ms: Option<i64>,
}

#[derive(Clone, Debug, Serialize)]
pub struct AnnotationClass {
    pub id: i64,
    pub name: String,
}
