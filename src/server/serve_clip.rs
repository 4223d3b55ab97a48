//! Clip delivery: the next assigned clip, and direct clip access by id.

use super::session::Session;
use super::state::{GuardedClipStore, ServerState};
use crate::assignment::AssignmentMode;
use crate::clip_store::AudioClip;
use crate::enrichment::Enrichment;
use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tokio::{fs::File, io::BufReader};
use tokio_util::io::ReaderStream;
use tracing::{debug, error, info};

pub const HEADER_CLIP_ID: &str = "X-Clip-Id";
pub const HEADER_CLIP_FILENAME: &str = "X-Clip-Filename";
pub const HEADER_CLIP_ANNOTATED: &str = "X-Clip-Annotated";
pub const HEADER_AI_CLASSES: &str = "X-Ai-Classes";
pub const HEADER_AI_REGIONS: &str = "X-Ai-Regions";
pub const HEADER_INTERFACE_VARIANT: &str = "X-Interface-Variant";

/// Pool exhaustion: expected, user-visible, not a server fault.
pub const EXHAUSTED_MESSAGE: &str =
    "No eligible audio clips found. You may have already annotated all available clips.";
/// A selected clip's backing file is gone: an operational problem.
pub const MISSING_FILE_MESSAGE: &str = "Audio clip file not found on server";

const STREAM_BUFFER_SIZE: usize = 4096 * 16;

/// Why the next clip could not be served. Every variant is a per-request
/// outcome, never fatal to the process.
#[derive(Debug, thiserror::Error)]
pub enum ServeClipError {
    /// Nothing left for this annotator. Expected, not logged as an error.
    #[error("no eligible clips available")]
    Exhausted,
    /// The selected clip has no backing file on disk.
    #[error("clip {0} backing file is missing")]
    MissingFile(String),
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl IntoResponse for ServeClipError {
    fn into_response(self) -> Response {
        match self {
            ServeClipError::Exhausted => json_error(StatusCode::NOT_FOUND, EXHAUSTED_MESSAGE),
            ServeClipError::MissingFile(_) => {
                json_error(StatusCode::NOT_FOUND, MISSING_FILE_MESSAGE)
            }
            ServeClipError::Storage(err) => {
                error!("Clip serving failed: {:#}", err);
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}

pub(super) fn json_error<S: AsRef<str>>(status: StatusCode, message: S) -> Response {
    (
        status,
        axum::Json(serde_json::json!({ "error": message.as_ref() })),
    )
        .into_response()
}

fn content_type_for(file_path: &str) -> &'static str {
    let extension = file_path
        .rsplit('.')
        .next()
        .map(|ext| ext.to_ascii_lowercase());
    match extension.as_deref() {
        Some("mp3") => "audio/mpeg",
        Some("ogg") => "audio/ogg",
        Some("flac") => "audio/flac",
        _ => "audio/wav",
    }
}

fn header_value_json<T: serde::Serialize>(value: &T) -> HeaderValue {
    serde_json::to_string(value)
        .ok()
        .and_then(|s| HeaderValue::from_str(&s).ok())
        .unwrap_or_else(|| HeaderValue::from_static("[]"))
}

#[derive(Deserialize)]
pub struct NextClipParams {
    #[serde(default)]
    pub mode: AssignmentMode,
}

/// Serves the next clip this annotator should label: audio bytes plus
/// metadata and AI pre-annotation headers.
pub async fn next_clip(
    session: Session,
    State(state): State<ServerState>,
    Query(params): Query<NextClipParams>,
) -> Response {
    let clip = match state.selector.select(session.user_id, params.mode) {
        Err(err) => return ServeClipError::Storage(err).into_response(),
        Ok(None) => {
            info!(
                "No clips left for user {} in {:?} mode",
                session.user_id, params.mode
            );
            return ServeClipError::Exhausted.into_response();
        }
        Ok(Some(clip)) => clip,
    };

    debug!(
        "Serving clip {} to user {} ({:?} mode)",
        clip.id, session.user_id, params.mode
    );

    let enrichment = match &state.enrichment {
        Some(client) => {
            client
                .fetch_or_default(&session.user_id.to_string(), clip.recording_id())
                .await
        }
        None => Enrichment::default(),
    };

    stream_clip(&state.clip_store, &clip, &enrichment).await
}

/// Serves a specific clip's audio by id, without assignment bookkeeping.
pub async fn get_clip_file(
    _session: Session,
    State(clip_store): State<GuardedClipStore>,
    Path(id): Path<String>,
) -> Response {
    let clip = match clip_store.get_clip(&id) {
        Ok(Some(clip)) => clip,
        Ok(None) => return json_error(StatusCode::NOT_FOUND, "Audio clip not found"),
        Err(err) => return ServeClipError::Storage(err).into_response(),
    };

    let path = clip_store.clip_audio_path(&clip);
    let buffer = match tokio::fs::read(&path).await {
        Ok(buffer) => buffer,
        Err(_) => {
            error!("Clip {} backing file {} is missing", clip.id, path.display());
            return ServeClipError::MissingFile(clip.id.clone()).into_response();
        }
    };

    // Sniff the real content type, fall back to the extension
    let content_type = infer::get(&buffer)
        .map(|kind| kind.mime_type())
        .filter(|mime| mime.starts_with("audio/"))
        .unwrap_or_else(|| content_type_for(&clip.file_path));

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename={}", clip.basename()),
        )
        .body(buffer.into())
        .unwrap()
}

async fn stream_clip(
    clip_store: &GuardedClipStore,
    clip: &AudioClip,
    enrichment: &Enrichment,
) -> Response {
    let path = clip_store.clip_audio_path(clip);
    let file = match File::open(&path).await {
        Ok(file) => file,
        Err(_) => {
            error!("Clip {} backing file {} is missing", clip.id, path.display());
            return ServeClipError::MissingFile(clip.id.clone()).into_response();
        }
    };
    let file_length = match file.metadata().await {
        Ok(metadata) => metadata.len(),
        Err(_) => return StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    };

    let file_reader = BufReader::with_capacity(STREAM_BUFFER_SIZE, file);
    let stream = ReaderStream::with_capacity(file_reader, STREAM_BUFFER_SIZE);

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type_for(&clip.file_path))
        .header(header::CONTENT_LENGTH, file_length)
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename={}", clip.basename()),
        )
        .header(HEADER_CLIP_ID, clip.id.clone())
        .header(HEADER_CLIP_FILENAME, clip.basename().to_string())
        .header(HEADER_CLIP_ANNOTATED, clip.annotated.to_string())
        .header(HEADER_AI_CLASSES, header_value_json(&enrichment.ai_classes))
        .header(HEADER_AI_REGIONS, header_value_json(&enrichment.ai_regions))
        .header(
            HEADER_INTERFACE_VARIANT,
            enrichment.interface_variant.to_string(),
        )
        .body(Body::from_stream(stream))
        .unwrap()
}
