//! HTTP surface: the page, the submit handlers, the admin view.

pub mod page;

use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use tower::limit::GlobalConcurrencyLimitLayer;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use tracing::error;
use uuid::Uuid;

use crate::config::{AppConfig, CompanyInfo};
use crate::error::{StorageError, ValidationError};
use crate::intake::{IntakeOutcome, IntakePipeline};
use crate::leads::{ContactForm, LeadStore};
use crate::notify::{DisabledNotifier, Notifier, SmtpNotifier};
use page::{Notice, NoticeKind, render_admin, render_page};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<IntakePipeline>,
    pub company: Arc<CompanyInfo>,
    /// Expose `/admin/leads` and the CSV download.
    pub show_leads: bool,
}

impl AppState {
    /// Wire store, notifier and pipeline from configuration.
    pub fn from_config(config: &AppConfig) -> Self {
        let notifier: Arc<dyn Notifier> = match &config.smtp {
            Some(smtp) => Arc::new(SmtpNotifier::new(smtp.clone(), config.leads_to.clone())),
            None => Arc::new(DisabledNotifier),
        };
        let store = LeadStore::new(config.leads_path.clone());
        Self {
            pipeline: Arc::new(IntakePipeline::new(store, notifier)),
            company: Arc::new(config.company.clone()),
            show_leads: config.show_leads,
        }
    }
}

/// Build the Axum router.
pub fn app_routes(state: AppState) -> Router {
    // Submissions are handled strictly one at a time. `Router::layer` wraps
    // each route on its own; the global limit shares one semaphore.
    let intake = Router::new()
        .route("/contact", post(submit_form))
        .route("/api/contact", post(submit_json))
        .layer(GlobalConcurrencyLimitLayer::new(1));

    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/admin/leads", get(admin_leads))
        .route("/admin/leads.csv", get(download_leads))
        .merge(intake)
        .layer(TraceLayer::new_for_http())
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .with_state(state)
}

// ── Health ──────────────────────────────────────────────────────────────

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "dockyard-leads"
    }))
}

// ── Page ────────────────────────────────────────────────────────────────

/// GET /
///
/// Each render issues a fresh session id for correlation.
async fn index(State(state): State<AppState>) -> Html<String> {
    let sid = Uuid::new_v4().to_string();
    Html(render_page(&state.company, &sid, None, &ContactForm::default()))
}

// ── Submission ──────────────────────────────────────────────────────────

/// HTTP status for a terminal outcome.
///
/// Spam gets a plain 200 so the response looks like any other.
fn outcome_status(outcome: &IntakeOutcome) -> StatusCode {
    match outcome {
        IntakeOutcome::Rejected(ValidationError::Spam) => StatusCode::OK,
        IntakeOutcome::Rejected(_) => StatusCode::UNPROCESSABLE_ENTITY,
        IntakeOutcome::Failed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        IntakeOutcome::NotificationSkipped { .. } | IntakeOutcome::Notified { .. } => {
            StatusCode::OK
        }
    }
}

fn session_id(form: &ContactForm) -> Option<String> {
    Some(form.sid.trim().to_string()).filter(|s| !s.is_empty())
}

/// POST /contact (form-urlencoded)
async fn submit_form(State(state): State<AppState>, Form(form): Form<ContactForm>) -> Response {
    let outcome = state.pipeline.submit(&form, session_id(&form)).await;
    let status = outcome_status(&outcome);

    let kind = match &outcome {
        IntakeOutcome::Rejected(ValidationError::Spam) => NoticeKind::Warning,
        IntakeOutcome::Rejected(_) | IntakeOutcome::Failed(_) => NoticeKind::Error,
        IntakeOutcome::NotificationSkipped { .. } | IntakeOutcome::Notified { .. } => {
            NoticeKind::Success
        }
    };
    let notice = Notice {
        kind,
        text: outcome.user_message(),
    };

    // Keep what the visitor typed unless it was recorded (or was a bot).
    let refill = match &outcome {
        IntakeOutcome::Rejected(ValidationError::Spam) => ContactForm::default(),
        o if o.is_recorded() => ContactForm::default(),
        _ => ContactForm {
            website: String::new(),
            ..form.clone()
        },
    };
    let sid = session_id(&form).unwrap_or_else(|| Uuid::new_v4().to_string());

    (
        status,
        Html(render_page(&state.company, &sid, Some(&notice), &refill)),
    )
        .into_response()
}

/// POST /api/contact (JSON)
async fn submit_json(State(state): State<AppState>, Json(form): Json<ContactForm>) -> Response {
    let outcome = state.pipeline.submit(&form, session_id(&form)).await;
    let status = outcome_status(&outcome);

    let body = match &outcome {
        IntakeOutcome::Rejected(e) => {
            let reason = match e {
                ValidationError::Spam => "flagged",
                other => other.code(),
            };
            serde_json::json!({
                "status": "rejected",
                "recorded": false,
                "reason": reason,
                "message": outcome.user_message(),
            })
        }
        IntakeOutcome::Failed(_) => serde_json::json!({
            "status": "failed",
            "recorded": false,
            "message": outcome.user_message(),
        }),
        IntakeOutcome::NotificationSkipped { .. } | IntakeOutcome::Notified { .. } => {
            serde_json::json!({
                "status": "stored",
                "recorded": true,
                "notified": matches!(outcome, IntakeOutcome::Notified { .. }),
                "message": outcome.user_message(),
            })
        }
    };

    (status, Json(body)).into_response()
}

// ── Admin ───────────────────────────────────────────────────────────────

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, "Not found").into_response()
}

fn storage_failure(e: StorageError) -> Response {
    error!(error = %e, "Failed to read lead store");
    (StatusCode::INTERNAL_SERVER_ERROR, "Could not read leads").into_response()
}

/// GET /admin/leads
async fn admin_leads(State(state): State<AppState>) -> Response {
    if !state.show_leads {
        return not_found();
    }
    let store = state.pipeline.store().clone();
    let rows = tokio::task::spawn_blocking(move || store.read_all())
        .await
        .unwrap_or_else(|e| Err(StorageError::Task(e.to_string())));
    match rows {
        Ok(rows) => Html(render_admin(&state.company, &rows)).into_response(),
        Err(e) => storage_failure(e),
    }
}

/// GET /admin/leads.csv
async fn download_leads(State(state): State<AppState>) -> Response {
    if !state.show_leads {
        return not_found();
    }
    let store = state.pipeline.store().clone();
    let bytes = tokio::task::spawn_blocking(move || store.raw_bytes())
        .await
        .unwrap_or_else(|e| Err(StorageError::Task(e.to_string())));
    match bytes {
        Ok(Some(bytes)) => (
            [
                (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
                (header::CONTENT_DISPOSITION, "attachment; filename=\"leads.csv\""),
            ],
            bytes,
        )
            .into_response(),
        Ok(None) => not_found(),
        Err(e) => storage_failure(e),
    }
}
