//! REST endpoints for interview research.
//!
//! Every research request runs the full pipeline once. Nothing is cached
//! between requests.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use tower_http::cors::CorsLayer;
use tracing::{error, info};

use crate::error::{Error, PipelineError};
use crate::pipeline::{CompositeResult, Orchestrator};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
}

/// Build the research router.
pub fn research_routes(orchestrator: Arc<Orchestrator>) -> Router {
    let state = AppState { orchestrator };

    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/interview-research", get(interview_research))
        .route(
            "/interview-research/company/{company_name}",
            get(company_research),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Bind `addr` and serve until the process exits.
pub async fn serve(orchestrator: Arc<Orchestrator>, addr: &str) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "Interview research API listening");
    axum::serve(listener, research_routes(orchestrator)).await
}

// ── Errors ──────────────────────────────────────────────────────────────

/// `{"detail": ...}` error body with a status code.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    detail: String,
}

impl ApiError {
    /// Not-found becomes 404 with its own message. Anything else is a 500
    /// whose detail is `context` followed by the error text.
    fn from_error(err: Error, context: &str) -> Self {
        match err {
            Error::Pipeline(PipelineError::NotFound(detail)) => Self {
                status: StatusCode::NOT_FOUND,
                detail,
            },
            other => {
                error!(error = %other, "Interview research request failed");
                Self {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    detail: format!("{context}: {other}"),
                }
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(serde_json::json!({ "detail": self.detail })),
        )
            .into_response()
    }
}

// ── Handlers ────────────────────────────────────────────────────────────

async fn root() -> impl IntoResponse {
    Json(serde_json::json!({ "message": "Interview Research API is running" }))
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "healthy" }))
}

/// GET /interview-research
async fn interview_research(
    State(state): State<AppState>,
) -> Result<Json<CompositeResult>, ApiError> {
    let result = selected(&state.orchestrator, || {
        "No interview emails found or research failed".to_string()
    })
    .await
    .map_err(|e| ApiError::from_error(e, "Error retrieving interview research"))?;
    Ok(Json(result))
}

/// GET /interview-research/company/{company_name}
///
/// Runs the same pipeline and only answers if the selected interview is
/// for `company_name` (case-insensitive).
async fn company_research(
    State(state): State<AppState>,
    Path(company_name): Path<String>,
) -> Result<Json<CompositeResult>, ApiError> {
    let context = format!("Error retrieving interview research for {company_name}");
    let result = selected(&state.orchestrator, || {
        format!("No research data found for company: {company_name}")
    })
    .await
    .map_err(|e| ApiError::from_error(e, &context))?;

    if !result
        .interview_info
        .company_name
        .eq_ignore_ascii_case(&company_name)
    {
        return Err(ApiError {
            status: StatusCode::NOT_FOUND,
            detail: format!("Research data not available for company: {company_name}"),
        });
    }
    Ok(Json(result))
}

async fn selected(
    orchestrator: &Orchestrator,
    not_found: impl FnOnce() -> String,
) -> Result<CompositeResult, Error> {
    orchestrator
        .run()
        .await?
        .ok_or_else(|| PipelineError::NotFound(not_found()).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MailError;
    use crate::mail::SourceRef;
    use crate::pipeline::MemorySink;
    use crate::pipeline::testing::{ScriptedLlm, StaticMail};
    use crate::pipeline::types::fixtures;
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use tower::ServiceExt;

    const ONE_RECORD: &str = r#"{"interview_emails":[{"company_name":"Acme Corp","role":"Backend Engineer","type":"TECH","interview_date":null,"skills":["Go"]}]}"#;

    fn router(mail: Arc<StaticMail>, llm: Arc<ScriptedLlm>) -> Router {
        let source = SourceRef {
            owner: "ArcadeAI".into(),
            name: "arcade-ai".into(),
        };
        let orchestrator =
            Orchestrator::new(mail, llm, source, 1).with_sink(Arc::new(MemorySink::new()));
        research_routes(Arc::new(orchestrator))
    }

    async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn root_and_health() {
        let app = router(StaticMail::with_bodies(&[]), ScriptedLlm::replying(&[]));
        let (status, body) = get_json(app.clone(), "/").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Interview Research API is running");

        let (status, body) = get_json(app, "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn research_returns_composite() {
        let bundle = fixtures::bundle_json("Acme Corp");
        let app = router(
            StaticMail::with_bodies(&["invite"]),
            ScriptedLlm::replying(&[ONE_RECORD, &bundle]),
        );
        let (status, body) = get_json(app, "/interview-research").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["interview_info"]["company_name"], "Acme Corp");
        assert_eq!(body["interview_info"]["type"], "TECH");
        assert_eq!(body["research_data"]["company_summary"]["industry"], "Software");
    }

    #[tokio::test]
    async fn research_without_result_is_404() {
        let app = router(
            StaticMail::with_bodies(&["newsletter"]),
            ScriptedLlm::replying(&[r#"{"interview_emails": []}"#]),
        );
        let (status, body) = get_json(app, "/interview-research").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["detail"], "No interview emails found or research failed");
    }

    #[tokio::test]
    async fn mail_error_is_500_with_message() {
        let app = router(
            StaticMail::failing(MailError::UnexpectedShape("missing `emails`".into())),
            ScriptedLlm::replying(&[]),
        );
        let (status, body) = get_json(app, "/interview-research").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        let detail = body["detail"].as_str().unwrap();
        assert!(detail.starts_with("Error retrieving interview research: "));
        assert!(detail.contains("missing `emails`"));
    }

    #[tokio::test]
    async fn company_match_is_case_insensitive() {
        let bundle = fixtures::bundle_json("Acme Corp");
        let app = router(
            StaticMail::with_bodies(&["invite"]),
            ScriptedLlm::replying(&[ONE_RECORD, &bundle]),
        );
        let (status, body) = get_json(app, "/interview-research/company/acme%20corp").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["interview_info"]["company_name"], "Acme Corp");
    }

    #[tokio::test]
    async fn company_mismatch_is_404() {
        let bundle = fixtures::bundle_json("Acme Corp");
        let app = router(
            StaticMail::with_bodies(&["invite"]),
            ScriptedLlm::replying(&[ONE_RECORD, &bundle]),
        );
        let (status, body) = get_json(app, "/interview-research/company/Globex").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["detail"], "Research data not available for company: Globex");
    }

    #[tokio::test]
    async fn company_without_result_is_404() {
        let app = router(
            StaticMail::with_bodies(&["newsletter"]),
            ScriptedLlm::replying(&[r#"{"interview_emails": []}"#]),
        );
        let (status, body) = get_json(app, "/interview-research/company/Globex").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["detail"], "No research data found for company: Globex");
    }
}
