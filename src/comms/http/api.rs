//! Handlers for `/api/*`.
//!
//! Errors come back as `{ "error", "message" }` with a status derived from
//! the [`AppError`] variant.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::warn;

use crate::aggregate::Summary;
use crate::assistant::catalog::SUGGESTED_QUESTIONS;
use crate::comms::state::CommsState;
use crate::error::AppError;
use crate::package::PackageDraft;
use crate::store::PackageFilter;

const STATS_TOP: usize = 5;

type AppState = State<Arc<CommsState>>;

// ── Request types ─────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub(super) struct CollectRequest {
    collector: String,
}

#[derive(Deserialize)]
pub(super) struct ReminderRequest {
    email: String,
    #[serde(alias = "name", default)]
    nombre: String,
}

#[derive(Deserialize)]
pub(super) struct RecipientQuery {
    #[serde(default)]
    query: String,
}

#[derive(Deserialize)]
pub(super) struct ChatRequest {
    question: String,
    session_id: Option<String>,
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn json_error(status: StatusCode, code: &str, msg: impl std::fmt::Display) -> Response {
    (status, Json(json!({ "error": code, "message": format!("{msg}") }))).into_response()
}

fn error_response(e: AppError) -> Response {
    let (status, code) = match &e {
        AppError::Validation(_) => (StatusCode::BAD_REQUEST, "validation"),
        AppError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
        AppError::Duplicate(_) => (StatusCode::CONFLICT, "duplicate"),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
    };
    if status.is_server_error() {
        warn!("request failed: {e}");
    }
    json_error(status, code, e)
}

fn respond<T: serde::Serialize>(status: StatusCode, result: Result<T, AppError>) -> Response {
    match result {
        Ok(body) => (status, Json(body)).into_response(),
        Err(e) => error_response(e),
    }
}

// ── Handlers ──────────────────────────────────────────────────────────────────

/// GET /api/health
pub(super) async fn health(State(state): AppState) -> Response {
    Json(json!({ "status": "ok", "name": state.name })).into_response()
}

/// GET /api/packages
pub(super) async fn list_packages(State(state): AppState, Query(filter): Query<PackageFilter>) -> Response {
    respond(StatusCode::OK, state.packages(filter).await)
}

/// POST /api/packages. Keys may use either spelling.
pub(super) async fn register(State(state): AppState, Json(body): Json<Value>) -> Response {
    let Value::Object(raw) = body else {
        return json_error(StatusCode::BAD_REQUEST, "validation", "expected a JSON object");
    };
    let result = match PackageDraft::from_raw(&raw) {
        Ok(draft) => state.desk.register(draft).await,
        Err(e) => Err(e),
    };
    respond(StatusCode::CREATED, result)
}

/// GET /api/packages/{code}
pub(super) async fn get_package(State(state): AppState, Path(code): Path<String>) -> Response {
    respond(StatusCode::OK, state.package(code).await)
}

/// POST /api/packages/{code}/collect
pub(super) async fn collect(
    State(state): AppState,
    Path(code): Path<String>,
    Json(req): Json<CollectRequest>,
) -> Response {
    respond(StatusCode::OK, state.collect(code, req.collector).await)
}

/// POST /api/reminders
pub(super) async fn remind(State(state): AppState, Json(req): Json<ReminderRequest>) -> Response {
    respond(StatusCode::OK, state.desk.remind(&req.email, &req.nombre).await)
}

/// GET /api/recipients?query=
pub(super) async fn recipients(State(state): AppState, Query(q): Query<RecipientQuery>) -> Response {
    let result = state.desk.find_recipients(&q.query).await.map(|found| json!({ "recipients": found }));
    respond(StatusCode::OK, result)
}

/// GET /api/stats
pub(super) async fn stats(State(state): AppState) -> Response {
    let result = state.packages(PackageFilter::default()).await.map(|records| Summary::from_records(&records, STATS_TOP));
    respond(StatusCode::OK, result)
}

/// POST /api/chat
pub(super) async fn chat(State(state): AppState, Json(req): Json<ChatRequest>) -> Response {
    respond(StatusCode::OK, state.chat(req.session_id.as_deref(), &req.question).await)
}

/// GET /api/chat/suggestions
pub(super) async fn suggestions() -> Response {
    Json(SUGGESTED_QUESTIONS).into_response()
}

/// GET /api/sessions/{id}
pub(super) async fn session(State(state): AppState, Path(id): Path<String>) -> Response {
    match state.sessions.get(&id).await {
        Some(conversation) => Json(conversation).into_response(),
        None => json_error(StatusCode::NOT_FOUND, "not_found", format!("session {id}")),
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use tower::ServiceExt;

    use super::*;
    use crate::assistant::Assistant;
    use crate::assistant::catalog::Catalog;
    use crate::assistant::session::SessionBook;
    use crate::desk::Desk;
    use crate::llm::LlmProvider;
    use crate::llm::providers::dummy::DummyProvider;
    use crate::notify::Dispatcher;
    use crate::notify::directory::DirectoryEntry;
    use crate::notify::outbox::Outbox;
    use crate::store::PackageStore;

    struct Fixture {
        _dir: tempfile::TempDir,
        outbox: Outbox,
        state: Arc<CommsState>,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let store = PackageStore::open(&dir.path().join("packages.db")).unwrap();
        let outbox = Outbox::new("Recepción".into());
        let dispatcher = Dispatcher::Outbox(outbox.clone());
        let assistant = Assistant::new(
            store.clone(),
            dispatcher.clone(),
            LlmProvider::Dummy(DummyProvider),
            Catalog::default(),
            PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/config/prompts")),
            50,
        );
        let state = Arc::new(CommsState::new(
            "recepcion-test".into(),
            Desk::new(store, dispatcher),
            assistant,
            SessionBook::new(20, 16),
        ));
        Fixture { _dir: dir, outbox, state }
    }

    async fn call(f: &Fixture, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let req = match body {
            Some(b) => builder.header("content-type", "application/json").body(Body::from(b.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();
        let resp = super::super::router(f.state.clone()).oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
        (status, value)
    }

    fn form(code: &str) -> Value {
        json!({
            "codigoRetiro": code,
            "sucursal": "Santiago",
            "recepcionista": "Rosa",
            "proveedor": "Starken",
            "tipoDocumento": "Factura",
            "numeroDocumento": "55",
            "destinatarioNombre": "Maria Lopez",
            "destinatarioEmail": "maria.lopez@example.cl",
            "medioNotificacion": "Email",
        })
    }

    #[tokio::test]
    async fn health_ok() {
        let f = fixture();
        let (status, body) = call(&f, "GET", "/api/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn register_fetch_and_collect() {
        let f = fixture();
        let (status, body) = call(&f, "POST", "/api/packages", Some(form("PK-251201-AB12"))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["pickup_code"], "PK-251201-AB12");
        assert_eq!(body["status"], "Notificado");
        assert_eq!(f.outbox.emails().len(), 1);

        let (status, _) = call(&f, "POST", "/api/packages", Some(form("PK-251201-AB12"))).await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, body) = call(&f, "GET", "/api/packages/pk-251201-ab12", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["destinatarioNombre"], "Maria Lopez");

        let (status, body) =
            call(&f, "POST", "/api/packages/PK-251201-AB12/collect", Some(json!({ "collector": "Pedro" }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["estado"], "Retirado");

        let (status, body) =
            call(&f, "POST", "/api/packages/PK-251201-AB12/collect", Some(json!({ "collector": "Pedro" }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "validation");
    }

    #[tokio::test]
    async fn register_rejects_missing_fields() {
        let f = fixture();
        let mut body = form("PK-251201-AB13");
        body.as_object_mut().unwrap().remove("destinatarioEmail");
        let (status, body) = call(&f, "POST", "/api/packages", Some(body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].as_str().unwrap().contains("destinatarioEmail"));

        let (status, _) = call(&f, "POST", "/api/packages", Some(json!([1, 2]))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn unknown_package_is_404() {
        let f = fixture();
        let (status, body) = call(&f, "GET", "/api/packages/PK-000000-0000", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "not_found");
    }

    #[tokio::test]
    async fn list_filters_and_stats() {
        let f = fixture();
        call(&f, "POST", "/api/packages", Some(form("PK-251201-AA01"))).await;
        let mut other = form("PK-251201-AA02");
        other["sucursal"] = json!("Temuco");
        call(&f, "POST", "/api/packages", Some(other)).await;

        let (_, all) = call(&f, "GET", "/api/packages", None).await;
        assert_eq!(all.as_array().unwrap().len(), 2);
        let (_, temuco) = call(&f, "GET", "/api/packages?branch=temuco", None).await;
        assert_eq!(temuco.as_array().unwrap().len(), 1);

        let (status, stats) = call(&f, "GET", "/api/stats", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(stats["total"], 2);
        assert_eq!(stats["notified"], 2);
    }

    #[tokio::test]
    async fn reminder_endpoint() {
        let f = fixture();
        let (status, body) =
            call(&f, "POST", "/api/reminders", Some(json!({ "email": "ana@example.cl", "nombre": "Ana" }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(f.outbox.emails()[0].to, "ana@example.cl");
    }

    #[tokio::test]
    async fn chat_keeps_a_session_log() {
        let f = fixture();
        let (status, body) = call(&f, "POST", "/api/chat", Some(json!({ "question": "dashboard" }))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["source"], "rules");
        let id = body["session_id"].as_str().unwrap().to_string();

        let (_, body) =
            call(&f, "POST", "/api/chat", Some(json!({ "question": "asdkjaslkdj", "session_id": id }))).await;
        assert_eq!(body["source"], "model");
        assert_eq!(body["reply"], "[echo] asdkjaslkdj");

        let (status, log) = call(&f, "GET", &format!("/api/sessions/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(log["turns"].as_array().unwrap().len(), 4);

        let (status, _) = call(&f, "GET", "/api/sessions/missing", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn empty_question_is_rejected() {
        let f = fixture();
        let (status, _) = call(&f, "POST", "/api/chat", Some(json!({ "question": "   " }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn recipient_search() {
        let f = fixture();
        f.outbox.add_directory_entry(DirectoryEntry::user("Juan Pérez", "jperez@empresa.cl"));
        f.outbox.add_directory_entry(DirectoryEntry::group("Cobranzas", "cobranzas@empresa.cl"));

        let (status, body) = call(&f, "GET", "/api/recipients?query=jp", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["recipients"][0]["email"], "jperez@empresa.cl");
        assert_eq!(body["recipients"][0]["type"], "user");

        let (_, body) = call(&f, "GET", "/api/recipients?query=j", None).await;
        assert!(body["recipients"].as_array().unwrap().is_empty());
        let (status, body) = call(&f, "GET", "/api/recipients", None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["recipients"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn suggestions_list() {
        let f = fixture();
        let (_, body) = call(&f, "GET", "/api/chat/suggestions", None).await;
        assert_eq!(body.as_array().unwrap().len(), SUGGESTED_QUESTIONS.len());
    }
}
