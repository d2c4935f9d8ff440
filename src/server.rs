//! HTTP surface: form relay, simulator and translation endpoints.

use crate::config::Config;
use crate::email::EmailClient;
use crate::forms::{self, ContactForm, FinancingRequest};
use crate::i18n::{LanguageRegistry, LanguageSession, MetricsReport};
use crate::loan::{LoanQuote, LoanQuoteRequest, RateBreakdown, RatePolicy};
use axum::{
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::error;

/// Shared state of the composition root.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub email: Arc<EmailClient>,
    pub session: Arc<LanguageSession>,
    pub policy: Arc<RatePolicy>,
}

/// `{success: true}` or `{success: false, error}`.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Envelope {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Envelope {
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
        }
    }
}

type EnvelopeError = (StatusCode, Json<Envelope>);

fn failure(status: StatusCode, error: impl Into<String>) -> EnvelopeError {
    (status, Json(Envelope::failure(error)))
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/contact", post(contact))
        .route("/api/financing-request", post(financing_request))
        .route("/api/quote", post(quote))
        .route("/api/translate", get(translate))
        .route("/api/languages", get(languages))
        .route("/api/language", get(current_language).put(change_language))
        .route("/api/i18n/metrics", get(i18n_metrics))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

// ==================== Form Relay ====================

/// Any failure, malformed body included, is reported as a 500 envelope.
async fn contact(State(state): State<AppState>, body: Bytes) -> (StatusCode, Json<Envelope>) {
    let result: anyhow::Result<()> = async {
        let form: ContactForm =
            serde_json::from_slice(&body).map_err(|e| anyhow::anyhow!("Invalid request body: {}", e))?;
        forms::relay_contact(
            &state.email,
            &state.config.notification_email,
            state.session.table(),
            &form,
            state.session.current_language().code(),
        )
        .await
    }
    .await;

    match result {
        Ok(()) => (StatusCode::OK, Json(Envelope::ok())),
        Err(e) => {
            error!("Contact form failed: {:#}", e);
            failure(StatusCode::INTERNAL_SERVER_ERROR, format!("{:#}", e))
        }
    }
}

async fn financing_request(
    State(state): State<AppState>,
    body: Bytes,
) -> (StatusCode, Json<Envelope>) {
    let result: anyhow::Result<()> = async {
        let request: FinancingRequest =
            serde_json::from_slice(&body).map_err(|e| anyhow::anyhow!("Invalid request body: {}", e))?;
        forms::relay_financing_request(
            &state.email,
            &state.config.notification_email,
            state.session.table(),
            &state.policy,
            &request,
            state.session.current_language().code(),
        )
        .await
    }
    .await;

    match result {
        Ok(()) => (StatusCode::OK, Json(Envelope::ok())),
        Err(e) => {
            error!("Financing request failed: {:#}", e);
            failure(StatusCode::INTERNAL_SERVER_ERROR, format!("{:#}", e))
        }
    }
}

// ==================== Simulator ====================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteResponse {
    pub success: bool,
    pub quote: LoanQuote,
    pub breakdown: RateBreakdown,
}

async fn quote(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<QuoteResponse>, EnvelopeError> {
    let request: LoanQuoteRequest = serde_json::from_slice(&body)
        .map_err(|e| failure(StatusCode::BAD_REQUEST, format!("Invalid request body: {}", e)))?;

    let (quote, breakdown) = state
        .policy
        .quote_with_breakdown(&request)
        .map_err(|e| failure(StatusCode::UNPROCESSABLE_ENTITY, e.to_string()))?;

    Ok(Json(QuoteResponse {
        success: true,
        quote,
        breakdown,
    }))
}

// ==================== Translations ====================

#[derive(Debug, Deserialize)]
pub struct TranslateParams {
    pub key: String,
    #[serde(default)]
    pub lang: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TranslateResponse {
    pub language: String,
    pub key: String,
    pub value: String,
}

async fn translate(
    State(state): State<AppState>,
    Query(params): Query<TranslateParams>,
) -> Json<TranslateResponse> {
    let language = params
        .lang
        .unwrap_or_else(|| state.session.current_language().code().to_string());
    let value = state.session.t_in(&language, &params.key).to_string();

    Json(TranslateResponse {
        language,
        key: params.key,
        value,
    })
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LanguageInfo {
    pub code: &'static str,
    pub name: &'static str,
    pub native_name: &'static str,
    pub is_default: bool,
}

async fn languages() -> Json<Vec<LanguageInfo>> {
    let languages = LanguageRegistry::get()
        .list_enabled()
        .into_iter()
        .map(|config| LanguageInfo {
            code: config.code,
            name: config.name,
            native_name: config.native_name,
            is_default: config.is_default,
        })
        .collect();
    Json(languages)
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LanguageState {
    pub language: String,
    pub transitioning: bool,
}

async fn current_language(State(state): State<AppState>) -> Json<LanguageState> {
    Json(LanguageState {
        language: state.session.current_language().code().to_string(),
        transitioning: state.session.is_transitioning(),
    })
}

#[derive(Debug, Deserialize)]
pub struct ChangeLanguage {
    pub language: String,
}

async fn change_language(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<LanguageState>, EnvelopeError> {
    let change: ChangeLanguage = serde_json::from_slice(&body)
        .map_err(|e| failure(StatusCode::BAD_REQUEST, format!("Invalid request body: {}", e)))?;

    let language = state
        .session
        .transition_to(&change.language)
        .await
        .map_err(|e| failure(StatusCode::BAD_REQUEST, e.to_string()))?;

    Ok(Json(LanguageState {
        language: language.code().to_string(),
        transitioning: state.session.is_transitioning(),
    }))
}

async fn i18n_metrics(State(state): State<AppState>) -> Json<MetricsReport> {
    Json(state.session.metrics().report())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i18n::MemoryPreferenceStore;
    use axum::body::Body;
    use axum::http::{header, Method, Request};
    use tower::ServiceExt;
    use wiremock::{
        matchers::{body_partial_json, method},
        Mock, MockServer, ResponseTemplate,
    };

    // ==================== Helper Functions ====================

    fn create_test_config(email_api_url: &str) -> Config {
        Config {
            port: 0,
            email_api_url: email_api_url.to_string(),
            email_api_key: "re_test_key".to_string(),
            email_from: "Site <noreply@example.com>".to_string(),
            email_timeout_secs: 5,
            notification_email: "team@example.com".to_string(),
            language_preference_path: "unused".to_string(),
            language_transition_ms: 0,
        }
    }

    fn create_state(email_api_url: &str) -> AppState {
        let config = create_test_config(email_api_url);
        AppState {
            email: Arc::new(EmailClient::new(&config).unwrap()),
            config: Arc::new(config),
            session: Arc::new(LanguageSession::new(Arc::new(MemoryPreferenceStore::new()))),
            policy: Arc::new(RatePolicy::standard()),
        }
    }

    async fn send(
        app: Router,
        method: Method,
        uri: &str,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, serde_json::Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = app.oneshot(builder.body(body).unwrap()).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, json)
    }

    async fn mock_email_api(expected_calls: u64) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": "msg"})))
            .expect(expected_calls)
            .mount(&server)
            .await;
        server
    }

    // ==================== Health & CORS Tests ====================

    #[tokio::test]
    async fn test_health() {
        let app = build_router(create_state("http://127.0.0.1:1"));
        let (status, json) = send(app, Method::GET, "/health", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "ok");
    }

    #[tokio::test]
    async fn test_cors_preflight() {
        let app = build_router(create_state("http://127.0.0.1:1"));
        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri("/api/contact")
                    .header(header::ORIGIN, "https://site.example")
                    .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert!(response.status().is_success());
        assert_eq!(
            response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
            "*"
        );
    }

    // ==================== Contact Tests ====================

    #[tokio::test]
    async fn test_contact_sends_two_emails() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(serde_json::json!({"to": ["team@example.com"]})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": "1"})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(body_partial_json(serde_json::json!({
                "to": ["marie@example.com"],
                "subject": "Nous avons bien reçu votre message"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": "2"})))
            .expect(1)
            .mount(&server)
            .await;

        let app = build_router(create_state(&server.uri()));
        let (status, json) = send(
            app,
            Method::POST,
            "/api/contact",
            Some(serde_json::json!({
                "name": "Marie",
                "email": "marie@example.com",
                "message": "Bonjour"
            })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json, serde_json::json!({"success": true}));
    }

    #[tokio::test]
    async fn test_contact_email_api_failure_is_500() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("upstream down"))
            .mount(&server)
            .await;

        let app = build_router(create_state(&server.uri()));
        let (status, json) = send(
            app,
            Method::POST,
            "/api/contact",
            Some(serde_json::json!({
                "name": "Marie",
                "email": "marie@example.com",
                "message": "Bonjour"
            })),
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["success"], false);
        assert!(json["error"].as_str().unwrap().contains("upstream down"));
    }

    #[tokio::test]
    async fn test_contact_malformed_body_is_500() {
        let server = mock_email_api(0).await;
        let app = build_router(create_state(&server.uri()));

        let (status, json) = send(
            app,
            Method::POST,
            "/api/contact",
            Some(serde_json::json!({"name": "Only a name"})),
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(json["error"].as_str().unwrap().contains("Invalid request body"));
    }

    #[tokio::test]
    async fn test_contact_invalid_email_sends_nothing() {
        let server = mock_email_api(0).await;
        let app = build_router(create_state(&server.uri()));

        let (status, json) = send(
            app,
            Method::POST,
            "/api/contact",
            Some(serde_json::json!({
                "name": "Marie",
                "email": "not-an-email",
                "message": "Bonjour"
            })),
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["success"], false);
    }

    // ==================== Financing Request Tests ====================

    #[tokio::test]
    async fn test_financing_request_sends_two_emails() {
        let server = mock_email_api(2).await;
        let app = build_router(create_state(&server.uri()));

        let (status, json) = send(
            app,
            Method::POST,
            "/api/financing-request",
            Some(serde_json::json!({
                "personal": {
                    "firstName": "Luca",
                    "lastName": "Rossi",
                    "email": "luca@example.com",
                    "phone": "+39 333 1234567"
                },
                "professional": { "employmentStatus": "self_employed" },
                "financing": { "category": "professional", "amount": 40000, "durationMonths": 48 },
                "language": "it"
            })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["success"], true);
    }

    // ==================== Quote Tests ====================

    #[tokio::test]
    async fn test_quote_endpoint() {
        let app = build_router(create_state("http://127.0.0.1:1"));
        let (status, json) = send(
            app,
            Method::POST,
            "/api/quote",
            Some(serde_json::json!({
                "amount": 25000,
                "durationMonths": 60,
                "category": "personal",
                "monthlyIncome": 3500,
                "hasGuarantee": "no"
            })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["quote"]["annualRatePercent"], 2.9);
        assert_eq!(json["quote"]["monthlyPayment"], 448.0);
        assert_eq!(json["breakdown"]["baseBasisPoints"], 290);
    }

    #[tokio::test]
    async fn test_quote_out_of_domain_is_422() {
        let app = build_router(create_state("http://127.0.0.1:1"));
        let (status, json) = send(
            app,
            Method::POST,
            "/api/quote",
            Some(serde_json::json!({"amount": 1000, "durationMonths": 0, "category": "auto"})),
        )
        .await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(json["success"], false);
        assert!(json["error"].as_str().unwrap().contains("Duration"));
    }

    #[tokio::test]
    async fn test_quote_malformed_body_is_400() {
        let app = build_router(create_state("http://127.0.0.1:1"));
        let (status, _) = send(
            app,
            Method::POST,
            "/api/quote",
            Some(serde_json::json!({"amount": "lots"})),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    // ==================== Translation Tests ====================

    #[tokio::test]
    async fn test_translate_explicit_language() {
        let app = build_router(create_state("http://127.0.0.1:1"));
        let (status, json) = send(app, Method::GET, "/api/translate?lang=de&key=nav.home", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["value"], "Startseite");
    }

    #[tokio::test]
    async fn test_translate_missing_key_echoes_key() {
        let app = build_router(create_state("http://127.0.0.1:1"));
        let (_, json) = send(app, Method::GET, "/api/translate?key=no.such.key", None).await;

        assert_eq!(json["language"], "fr");
        assert_eq!(json["value"], "no.such.key");
    }

    #[tokio::test]
    async fn test_languages_lists_eight() {
        let app = build_router(create_state("http://127.0.0.1:1"));
        let (_, json) = send(app, Method::GET, "/api/languages", None).await;

        let languages = json.as_array().unwrap();
        assert_eq!(languages.len(), 8);
        assert_eq!(languages[0]["code"], "fr");
        assert_eq!(languages[0]["isDefault"], true);
    }

    #[tokio::test]
    async fn test_change_language_then_translate() {
        let state = create_state("http://127.0.0.1:1");
        let app = build_router(state.clone());

        let (status, json) = send(
            app.clone(),
            Method::PUT,
            "/api/language",
            Some(serde_json::json!({"language": "es"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["language"], "es");

        let (_, json) = send(app.clone(), Method::GET, "/api/translate?key=nav.services", None).await;
        assert_eq!(json["value"], "Servicios");

        let (_, json) = send(app, Method::GET, "/api/language", None).await;
        assert_eq!(json["language"], "es");
        assert_eq!(state.session.current_language().code(), "es");
    }

    #[tokio::test]
    async fn test_change_language_unknown_is_400() {
        let app = build_router(create_state("http://127.0.0.1:1"));
        let (status, json) = send(
            app,
            Method::PUT,
            "/api/language",
            Some(serde_json::json!({"language": "tlh"})),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["error"].as_str().unwrap().contains("tlh"));
    }

    #[tokio::test]
    async fn test_i18n_metrics_counts_lookups() {
        let state = create_state("http://127.0.0.1:1");
        let app = build_router(state);

        send(app.clone(), Method::GET, "/api/translate?lang=pl&key=legal.warning", None).await;
        let (_, json) = send(app, Method::GET, "/api/i18n/metrics", None).await;

        assert_eq!(json["fallbacks"], 1);
    }
}
