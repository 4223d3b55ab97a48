use anyhow::Result;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, error};

use crate::assignment::{AssignmentSelector, CuratedQueue, QuotaTracker};
use crate::clip_store::{AnnotationUpdate, NewAnnotation};
use crate::user::auth::AuthTokenValue;
use crate::user::{RegisterError, UserStore};
use axum_extra::extract::cookie::{Cookie, SameSite};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;

use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{header::HeaderName, response, HeaderValue, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::serve_clip::{self, json_error};
use super::session::Session;
use super::state::*;
use super::{log_requests, RequestsLoggingLevel, ServerConfig};

#[derive(Serialize)]
struct ServerStats {
    pub uptime: String,
    pub hash: String,
    pub session_token: Option<String>,
}

fn format_uptime(duration: Duration) -> String {
    let total_seconds = duration.as_secs();

    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}d {:02}:{:02}:{:02}", days, hours, minutes, seconds)
}

#[derive(Deserialize, Debug)]
struct RegisterBody {
    pub handle: String,
    pub password: String,
}

#[derive(Deserialize)]
struct LoginBody {
    pub handle: String,
    pub password: String,
}

#[derive(Serialize)]
struct RegisterSuccessResponse {
    user_id: usize,
    token: String,
}

#[derive(Serialize)]
struct LoginSuccessResponse {
    token: String,
}

#[derive(Deserialize)]
struct AnnotatedFilterParams {
    annotated: Option<String>,
}

#[derive(Deserialize, Debug)]
struct SubmitAnnotationBody {
    pub clip_id: String,
    pub payload: serde_json::Value,
    pub ai_payload: Option<serde_json::Value>,
    pub interface_variant: Option<i64>,
    pub labeling_time_ms: Option<i64>,
}

#[derive(Deserialize, Debug)]
struct CreateClassBody {
    pub name: String,
}

async fn home(session: Option<Session>, State(state): State<ServerState>) -> impl IntoResponse {
    let stats = ServerStats {
        uptime: format_uptime(state.start_time.elapsed()),
        hash: state.hash.clone(),
        session_token: session.map(|s| s.token),
    };
    Json(stats)
}

fn session_cookie_response(status: StatusCode, token: &str, body: String) -> Response {
    let cookie_value = HeaderValue::from_str(&format!(
        "session_token={}; Path=/; HttpOnly",
        token
    ))
    .unwrap();
    response::Builder::new()
        .status(status)
        .header(axum::http::header::SET_COOKIE, cookie_value)
        .header(axum::http::header::CONTENT_TYPE, "application/json")
        .body(Body::from(body))
        .unwrap()
}

async fn register(
    State(user_manager): State<GuardedUserManager>,
    Json(body): Json<RegisterBody>,
) -> Response {
    if body.handle.trim().is_empty() || body.password.is_empty() {
        return json_error(StatusCode::BAD_REQUEST, "Handle and password are required");
    }

    match user_manager.register(body.handle.trim(), &body.password) {
        Ok(Ok((user_id, auth_token))) => {
            let response_body = serde_json::to_string(&RegisterSuccessResponse {
                user_id,
                token: auth_token.value.0.clone(),
            })
            .unwrap();
            session_cookie_response(StatusCode::CREATED, &auth_token.value.0, response_body)
        }
        Ok(Err(RegisterError::HandleTaken)) => {
            json_error(StatusCode::CONFLICT, "Handle already exists")
        }
        Err(err) => {
            error!("Registration failed: {:#}", err);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn login(
    State(user_manager): State<GuardedUserManager>,
    Json(body): Json<LoginBody>,
) -> Response {
    match user_manager.login(&body.handle, &body.password) {
        Ok(Some(auth_token)) => {
            let response_body = serde_json::to_string(&LoginSuccessResponse {
                token: auth_token.value.0.clone(),
            })
            .unwrap();
            session_cookie_response(StatusCode::CREATED, &auth_token.value.0, response_body)
        }
        Ok(None) => StatusCode::FORBIDDEN.into_response(),
        Err(err) => {
            error!("Login failed: {:#}", err);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn logout(State(user_manager): State<GuardedUserManager>, session: Session) -> Response {
    match user_manager.delete_auth_token(&AuthTokenValue(session.token)) {
        Ok(Some(_)) => {
            let cookie_value = Cookie::build(Cookie::new("session_token", ""))
                .path("/")
                .expires(time::OffsetDateTime::now_utc() - time::Duration::days(1)) // Expire it in the past
                .same_site(SameSite::Lax)
                .build();

            response::Builder::new()
                .status(StatusCode::OK)
                .header(axum::http::header::SET_COOKIE, cookie_value.to_string())
                .body(Body::empty())
                .unwrap()
        }
        Ok(None) => StatusCode::BAD_REQUEST.into_response(),
        Err(err) => {
            error!("Logout failed: {:#}", err);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn get_audio_clips(
    _session: Session,
    State(clip_store): State<GuardedClipStore>,
) -> Response {
    match clip_store.all_clips() {
        Ok(clips) => Json(clips).into_response(),
        Err(err) => {
            error!("Failed to list clips: {:#}", err);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

// "true"/"1" and "false"/"0" filter, anything else means no filter
fn parse_annotated_filter(raw: Option<&str>) -> Option<bool> {
    match raw {
        Some("true") | Some("1") => Some(true),
        Some("false") | Some("0") => Some(false),
        _ => None,
    }
}

async fn get_audio_clips_filtered(
    _session: Session,
    State(clip_store): State<GuardedClipStore>,
    Query(params): Query<AnnotatedFilterParams>,
) -> Response {
    match clip_store.clips_filtered(parse_annotated_filter(params.annotated.as_deref())) {
        Ok(clips) => Json(clips).into_response(),
        Err(err) => {
            error!("Failed to list filtered clips: {:#}", err);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn get_audio_clip(
    _session: Session,
    State(clip_store): State<GuardedClipStore>,
    Path(id): Path<String>,
) -> Response {
    let clip = match clip_store.get_clip(&id) {
        Ok(Some(clip)) => clip,
        Ok(None) => return json_error(StatusCode::NOT_FOUND, "Audio clip not found"),
        Err(err) => {
            error!("Failed to get clip {}: {:#}", id, err);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };
    match clip_store.annotations_for_clip(&id) {
        Ok(annotations) => Json(serde_json::json!({
            "id": clip.id,
            "file_path": clip.file_path,
            "annotated": clip.annotated,
            "annotations": annotations,
        }))
        .into_response(),
        Err(err) => {
            error!("Failed to get annotations for clip {}: {:#}", id, err);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn get_clip_annotations(
    _session: Session,
    State(clip_store): State<GuardedClipStore>,
    Path(id): Path<String>,
) -> Response {
    match clip_store.get_clip(&id) {
        Ok(Some(_)) => {}
        Ok(None) => return json_error(StatusCode::NOT_FOUND, "Audio clip not found"),
        Err(err) => {
            error!("Failed to get clip {}: {:#}", id, err);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    }
    match clip_store.annotations_for_clip(&id) {
        Ok(annotations) => Json(annotations).into_response(),
        Err(err) => {
            error!("Failed to get annotations for clip {}: {:#}", id, err);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn post_annotation(
    session: Session,
    State(clip_store): State<GuardedClipStore>,
    Json(body): Json<SubmitAnnotationBody>,
) -> Response {
    match clip_store.get_clip(&body.clip_id) {
        Ok(Some(_)) => {}
        Ok(None) => return json_error(StatusCode::NOT_FOUND, "Audio clip not found"),
        Err(err) => {
            error!("Failed to get clip {}: {:#}", body.clip_id, err);
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    }

    let new_annotation = NewAnnotation {
        clip_id: body.clip_id,
        annotated_by: session.user_id,
        payload: body.payload,
        ai_payload: body.ai_payload,
        interface_variant: body.interface_variant,
        labeling_time_ms: body.labeling_time_ms,
    };
    match clip_store.insert_annotation(new_annotation) {
        Ok(Some(annotation)) => (StatusCode::CREATED, Json(annotation)).into_response(),
        Ok(None) => json_error(
            StatusCode::CONFLICT,
            "You have already annotated this clip",
        ),
        Err(err) => {
            error!("Failed to insert annotation: {:#}", err);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn get_annotation(
    _session: Session,
    State(clip_store): State<GuardedClipStore>,
    Path(id): Path<String>,
) -> Response {
    match clip_store.get_annotation(&id) {
        Ok(Some(annotation)) => Json(annotation).into_response(),
        Ok(None) => json_error(StatusCode::NOT_FOUND, "Annotation not found"),
        Err(err) => {
            error!("Failed to get annotation {}: {:#}", id, err);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn put_annotation(
    session: Session,
    State(clip_store): State<GuardedClipStore>,
    Path(id): Path<String>,
    Json(update): Json<AnnotationUpdate>,
) -> Response {
    debug!("Updating annotation {}", id);
    match clip_store.update_annotation(&id, session.user_id, update) {
        Ok(Some(annotation)) => Json(annotation).into_response(),
        Ok(None) => json_error(StatusCode::NOT_FOUND, "Annotation not found"),
        Err(err) => {
            error!("Failed to update annotation {}: {:#}", id, err);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn get_all_annotations(
    _session: Session,
    State(clip_store): State<GuardedClipStore>,
) -> Response {
    match clip_store.all_annotations() {
        Ok(annotations) => Json(annotations).into_response(),
        Err(err) => {
            error!("Failed to list annotations: {:#}", err);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn get_classes(_session: Session, State(clip_store): State<GuardedClipStore>) -> Response {
    match clip_store.all_classes() {
        Ok(classes) => Json(classes).into_response(),
        Err(err) => {
            error!("Failed to list classes: {:#}", err);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn get_class_names(
    _session: Session,
    State(clip_store): State<GuardedClipStore>,
) -> Response {
    match clip_store.class_names() {
        Ok(names) => Json(names).into_response(),
        Err(err) => {
            error!("Failed to list class names: {:#}", err);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn post_class(
    _session: Session,
    State(clip_store): State<GuardedClipStore>,
    Json(body): Json<CreateClassBody>,
) -> Response {
    if body.name.trim().is_empty() {
        return json_error(StatusCode::BAD_REQUEST, "Class name is required");
    }
    match clip_store.add_class(body.name.trim()) {
        Ok(Some(class)) => (StatusCode::CREATED, Json(class)).into_response(),
        Ok(None) => json_error(StatusCode::CONFLICT, "Class name already exists"),
        Err(err) => {
            error!("Failed to add class: {:#}", err);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

impl ServerState {
    fn new(
        config: ServerConfig,
        clip_store: GuardedClipStore,
        user_manager: GuardedUserManager,
        selector: GuardedSelector,
        enrichment: OptionalEnrichment,
    ) -> ServerState {
        ServerState {
            config,
            start_time: Instant::now(),
            clip_store,
            user_manager,
            selector,
            enrichment,
            hash: env!("GIT_HASH").to_owned(),
        }
    }
}

/// Metadata headers the annotation frontend must be able to read
/// cross-origin.
const EXPOSED_HEADERS: [HeaderName; 6] = [
    HeaderName::from_static("x-clip-id"),
    HeaderName::from_static("x-clip-filename"),
    HeaderName::from_static("x-clip-annotated"),
    HeaderName::from_static("x-ai-classes"),
    HeaderName::from_static("x-ai-regions"),
    HeaderName::from_static("x-interface-variant"),
];

pub fn make_app(
    config: ServerConfig,
    clip_store: GuardedClipStore,
    user_store: Arc<dyn UserStore>,
    curated_list: Vec<String>,
    enrichment: OptionalEnrichment,
) -> Result<Router> {
    let user_manager = Arc::new(crate::user::UserManager::new(user_store));
    let selector = Arc::new(AssignmentSelector::new(
        QuotaTracker::new(clip_store.clone()),
        CuratedQueue::new(clip_store.clone(), curated_list),
    ));
    let state = ServerState::new(
        config.clone(),
        clip_store,
        user_manager,
        selector,
        enrichment,
    );

    let auth_routes: Router = Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", get(logout))
        .with_state(state.clone());

    let clip_routes: Router = Router::new()
        .route("/next", get(serve_clip::next_clip))
        .route("/{id}/file", get(serve_clip::get_clip_file))
        .with_state(state.clone());

    let audio_routes: Router = Router::new()
        .route("/", get(get_audio_clips))
        .route("/filter", get(get_audio_clips_filtered))
        .route("/{id}", get(get_audio_clip))
        .route("/{id}/annotations", get(get_clip_annotations))
        .with_state(state.clone());

    let annotation_routes: Router = Router::new()
        .route("/", post(post_annotation))
        .route("/all", get(get_all_annotations))
        .route("/{id}", get(get_annotation))
        .route("/{id}", put(put_annotation))
        .with_state(state.clone());

    let class_routes: Router = Router::new()
        .route("/", get(get_classes))
        .route("/", post(post_class))
        .route("/names", get(get_class_names))
        .with_state(state.clone());

    let home_router: Router = match config.frontend_dir_path {
        Some(frontend_path) => {
            let static_files_service =
                ServeDir::new(frontend_path).append_index_html_on_directories(true);
            Router::new().fallback_service(static_files_service)
        }
        None => Router::new()
            .route("/", get(home))
            .with_state(state.clone()),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers(EXPOSED_HEADERS);

    let mut app: Router = home_router
        .nest("/v1/auth", auth_routes)
        .nest("/v1/clip", clip_routes)
        .nest("/v1/audio", audio_routes)
        .nest("/v1/annotation", annotation_routes)
        .nest("/v1/classes", class_routes)
        .layer(cors);

    app = app.layer(middleware::from_fn_with_state(state.clone(), log_requests));

    Ok(app)
}

#[allow(clippy::too_many_arguments)]
pub async fn run_server(
    clip_store: GuardedClipStore,
    user_store: Arc<dyn UserStore>,
    curated_list: Vec<String>,
    enrichment: OptionalEnrichment,
    requests_logging_level: RequestsLoggingLevel,
    port: u16,
    frontend_dir_path: Option<String>,
) -> Result<()> {
    let config = ServerConfig {
        port,
        requests_logging_level,
        frontend_dir_path,
    };
    let app = make_app(config, clip_store, user_store, curated_list, enrichment)?;

    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port)).await?;

    Ok(axum::serve(listener, app).await?)
}
