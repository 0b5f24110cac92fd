//! HTTP route handlers
//!
//! Thin glue between axum extractors and the guarded store operations.
//! Upload checks the session before reading its body, so an anonymous client
//! is redirected to `/login` without the file ever being buffered.

use axum::Json;
use axum::body::Body;
use axum::extract::{Form, Multipart, Path, Query, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Redirect, Response};
use log::info;
use serde::Deserialize;
use serde_json::json;
use tokio_util::io::ReaderStream;

use crate::auth::{Session, authenticate, require_session};
use crate::error::handlers::{client_message, error_to_status, handle_error};
use crate::error::{ShelfError, UploadRejection};
use crate::server::AppState;
use crate::server::sessions::{clear_session_cookie, set_session_cookie};
use crate::storage::{Browse, DeleteOutcome, ResolvedFile, UploadRequest};

pub const LOGIN_ROUTE: &str = "/login";

#[derive(Debug, Deserialize)]
pub struct BrowseQuery {
    #[serde(default)]
    pub path: String,
    pub page: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl AppState {
    /// Turns an error into the client response, recording it first.
    pub fn reject(&self, err: ShelfError) -> Response {
        handle_error(&err, self.events.as_ref());
        match err {
            ShelfError::NotAuthenticated => Redirect::to(LOGIN_ROUTE).into_response(),
            err => (
                error_to_status(&err),
                Json(json!({ "status": "error", "error": client_message(&err) })),
            )
                .into_response(),
        }
    }

    async fn guarded(&self, headers: &HeaderMap) -> Result<Session, ShelfError> {
        let session = self.sessions.current(headers).await;
        require_session(&session)?;
        Ok(session)
    }
}

fn content_type_for(file: &ResolvedFile) -> &'static str {
    match file
        .path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("pdf") => "application/pdf",
        _ => "application/octet-stream",
    }
}

async fn stream_file(file: ResolvedFile) -> Result<Response, ShelfError> {
    let handle = tokio::fs::File::open(&file.path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ShelfError::Forbidden
        } else {
            ShelfError::IoFailure(e)
        }
    })?;

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(content_type_for(&file)),
    );
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(file.len));

    Ok((headers, Body::from_stream(ReaderStream::new(handle))).into_response())
}

/// `GET /?path=&page=`: stream a file or list a directory page.
pub async fn index(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<BrowseQuery>,
) -> Response {
    let session = state.sessions.current(&headers).await;

    let listing = match state.store.browse(&query.path) {
        Ok(Browse::File(file)) => {
            return stream_file(file)
                .await
                .unwrap_or_else(|err| state.reject(err));
        }
        Ok(Browse::Directory(listing)) => listing,
        Err(err) => return state.reject(err),
    };

    let page = query.page.unwrap_or(1).max(1);
    Json(json!({
        "path": query.path,
        "page": page,
        "items_per_page": state.items_per_page,
        "total_items": listing.entries.len(),
        "items": listing.page(page, state.items_per_page),
        "notice": listing.notice,
        "logged_in": session.is_logged_in(),
    }))
    .into_response()
}

/// `GET /view/{*path}`: stream a single file.
pub async fn view_file(State(state): State<AppState>, Path(path): Path<String>) -> Response {
    match state.store.read(&path) {
        Ok(file) => stream_file(file)
            .await
            .unwrap_or_else(|err| state.reject(err)),
        Err(err) => state.reject(err),
    }
}

/// `GET /search?q=`: filename search.
pub async fn search(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<SearchQuery>,
) -> Response {
    let session = state.sessions.current(&headers).await;
    let results = state.store.search(&query.q);
    Json(json!({
        "query": query.q.to_lowercase(),
        "results": results,
        "logged_in": session.is_logged_in(),
    }))
    .into_response()
}

/// `GET /upload`: folders offered as upload destinations.
pub async fn upload_form(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Err(err) = state.guarded(&headers).await {
        return state.reject(err);
    }
    Json(json!({ "subdirs": state.store.subdirectories(), "logged_in": true })).into_response()
}

/// `POST /upload`: multipart `file`, `path`, optional `new_path`.
pub async fn upload(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Response {
    let session = match state.guarded(&headers).await {
        Ok(session) => session,
        Err(err) => return state.reject(err),
    };

    let mut request = UploadRequest::default();
    let mut saw_file = false;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(err) => return err.into_response(),
        };

        let name = field.name().map(str::to_string);
        let outcome = match name.as_deref() {
            Some("file") => {
                request.filename = field.file_name().unwrap_or_default().to_string();
                saw_file = true;
                field.bytes().await.map(|bytes| request.bytes = bytes.to_vec())
            }
            Some("path") => field.text().await.map(|text| request.target_path = text),
            Some("new_path") => field.text().await.map(|text| request.new_folder = Some(text)),
            _ => Ok(()),
        };

        if let Err(err) = outcome {
            return err.into_response();
        }
    }

    if !saw_file {
        return state.reject(UploadRejection::MissingFile.into());
    }

    match state.store.write(&session, request) {
        Ok(stored) => {
            let redirect = format!("/?path={}", urlencoding::encode(&stored.directory));
            Json(json!({
                "status": "ok",
                "message": "File uploaded successfully",
                "file": stored,
                "redirect": redirect,
            }))
            .into_response()
        }
        Err(err) => state.reject(err),
    }
}

/// `POST /delete/{*path}`: remove a file or a whole folder.
pub async fn delete(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(path): Path<String>,
) -> Response {
    let session = state.sessions.current(&headers).await;

    match state.store.delete(&session, &path) {
        Ok(outcome) => {
            let message = match outcome {
                DeleteOutcome::FileRemoved => format!("File \"{}\" deleted successfully", path),
                DeleteOutcome::DirectoryRemoved => {
                    format!("Folder \"{}\" deleted successfully", path)
                }
                DeleteOutcome::Missing => "The item does not exist".to_string(),
            };
            Json(json!({ "status": "ok", "outcome": outcome, "message": message })).into_response()
        }
        Err(err) => state.reject(err),
    }
}

/// `GET /logs`: the audit trail.
pub async fn view_logs(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Err(err) = state.guarded(&headers).await {
        return state.reject(err);
    }

    let lines = state
        .events
        .lines()
        .unwrap_or_else(|e| vec![format!("Unable to read log file: {}", e)]);
    Json(json!({ "logs": lines, "logged_in": true })).into_response()
}

/// `GET /login`: report the current session state.
pub async fn login_status(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let session = state.sessions.current(&headers).await;
    Json(json!({
        "logged_in": session.is_logged_in(),
        "username": session.username(),
    }))
    .into_response()
}

/// `POST /login`: form `username`, `password`.
pub async fn login(State(state): State<AppState>, Form(form): Form<LoginForm>) -> Response {
    let session = match authenticate(&state.credentials, &form.username, &form.password) {
        Ok(session) => session,
        Err(err) => return state.reject(err),
    };

    let cookie = match state.sessions.insert(session).await.and_then(|sid| set_session_cookie(&sid)) {
        Ok(cookie) => cookie,
        Err(err) => return state.reject(err),
    };

    let mut headers = HeaderMap::new();
    headers.insert(header::SET_COOKIE, cookie);
    (
        StatusCode::OK,
        headers,
        Json(json!({ "status": "ok", "message": "Logged in successfully." })),
    )
        .into_response()
}

/// `GET|POST /logout`: end the session and go back to browsing.
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> Response {
    state.sessions.remove(&headers).await;
    info!("Session closed");

    let mut out = HeaderMap::new();
    out.insert(header::SET_COOKIE, clear_session_cookie());
    (out, Redirect::to("/")).into_response()
}

pub async fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "status": "error", "error": "Not found" })),
    )
        .into_response()
}
