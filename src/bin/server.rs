use std::env;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

use anyhow::{Context, Result};
use axum::{
    Router,
    extract::{Path, Query, Request, State},
    http::{StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Json, Response},
    routing::get,
};
use serde::{Deserialize, Serialize};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use loadboard_rs::search::{self, SearchCriteria};
use loadboard_rs::store;
use loadboard_rs::types::{CarrierRecord, EquipmentType, Load};
use loadboard_rs::{AuthError, Authenticator, FmcsaClient, VerifyError};

/// Server configuration, read once at startup
struct ServerConfig {
    port: u16,
    api_key: String,
    fmcsa_web_key: String,
    loads_file: String,
}

impl ServerConfig {
    fn from_env() -> Result<Self> {
        let api_key = env::var("LOADBOARD_API_KEY")
            .context("LOADBOARD_API_KEY environment variable is not set")?;
        let fmcsa_web_key = env::var("FMCSA_API_KEY")
            .context("FMCSA_API_KEY environment variable is not set")?;
        Ok(Self {
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            api_key,
            fmcsa_web_key,
            loads_file: env::var("LOADS_FILE").unwrap_or_else(|_| store::DEFAULT_LOADS_FILE.into()),
        })
    }
}

/// Application state shared across all requests
#[derive(Clone)]
struct AppState {
    auth: Arc<Authenticator>,
    fmcsa: Arc<FmcsaClient>,
    loads: Arc<Vec<Load>>,
    metrics: Arc<Metrics>,
}

/// Server metrics
struct Metrics {
    total_requests: AtomicU64,
    requests_in_flight: AtomicU64,
    start_time: Instant,
}

/// RAII guard for tracking in-flight requests
struct RequestGuard<'a>(&'a AtomicU64);

impl<'a> Drop for RequestGuard<'a> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::Relaxed);
    }
}

impl Metrics {
    fn track_request(&self) -> RequestGuard<'_> {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        self.requests_in_flight.fetch_add(1, Ordering::Relaxed);
        RequestGuard(&self.requests_in_flight)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing/logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "server=info,loadboard_rs=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Read configuration from environment
    let config = ServerConfig::from_env()?;

    let loads = store::load_loads_from_file(&config.loads_file)?;
    tracing::info!("Load board ready with {} loads", loads.len());

    let fmcsa = FmcsaClient::new(config.fmcsa_web_key.clone())
        .context("Failed to initialize FMCSA client")?;

    let app = build_app(
        Arc::new(Authenticator::new(config.api_key.clone())),
        Arc::new(fmcsa),
        Arc::new(loads),
    );

    // Bind server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Server listening on {}", addr);

    // Run server with graceful shutdown
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server shut down gracefully");
    Ok(())
}

/// Build the Axum application with routes and middleware
fn build_app(auth: Arc<Authenticator>, fmcsa: Arc<FmcsaClient>, loads: Arc<Vec<Load>>) -> Router {
    let metrics = Arc::new(Metrics {
        total_requests: AtomicU64::new(0),
        requests_in_flight: AtomicU64::new(0),
        start_time: Instant::now(),
    });

    let state = AppState {
        auth,
        fmcsa,
        loads,
        metrics,
    };

    // API key is checked before any handler on these routes
    let protected = Router::new()
        .route("/verify-carrier/:mc_number", get(verify_carrier))
        .route("/loads/search", get(search_loads))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_api_key,
        ));

    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .route("/api/metrics", get(get_metrics))
        .nest("/api/v1", protected)
        // Middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

/// Reject requests without a valid `Authorization: ApiKey <key>` header
async fn require_api_key(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let header_value = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());
    state.auth.authenticate(header_value)?;
    Ok(next.run(request).await)
}

/// Root endpoint - API information
async fn root(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "service": "Loadboard Freight API",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "operational",
        "loads_available": state.loads.len(),
        "endpoints": {
            "verify_carrier": "/api/v1/verify-carrier/{mc_number}",
            "search_loads": "/api/v1/loads/search"
        }
    }))
}

/// Health check endpoint
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

/// Verify a carrier's eligibility against the FMCSA registry
async fn verify_carrier(
    State(state): State<AppState>,
    Path(mc_number): Path<String>,
) -> Result<Json<CarrierVerificationResponse>, ApiError> {
    let _guard = state.metrics.track_request();

    tracing::info!("Verifying carrier MC {}", mc_number);

    let record = state.fmcsa.verify(&mc_number).await?;

    Ok(Json(CarrierVerificationResponse::from_record(record)))
}

#[derive(Serialize)]
struct CarrierVerificationResponse {
    mc_number: String,
    is_eligible: bool,
    status: loadboard_rs::CarrierStatus,
    company_name: Option<String>,
    safety_rating: Option<String>,
    operating_status: Option<String>,
    message: String,
}

impl CarrierVerificationResponse {
    fn from_record(record: CarrierRecord) -> Self {
        Self {
            is_eligible: record.is_eligible(),
            mc_number: record.mc_number,
            status: record.status,
            company_name: record.company_name,
            safety_rating: record.safety_rating,
            operating_status: record.operating_status,
            message: record.message,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    origin: Option<String>,
    destination: Option<String>,
    equipment_type: Option<String>,
    max_results: Option<usize>,
}

/// Search the load board with optional origin/destination/equipment filters
async fn search_loads(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<Load>>, ApiError> {
    let _guard = state.metrics.track_request();

    let equipment_type = params
        .equipment_type
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .map(|s| {
            s.parse::<EquipmentType>().map_err(|_| {
                ApiError::BadRequest(format!(
                    "Invalid equipment_type '{}'. Expected one of: Dry Van, Flatbed, Reefer",
                    s
                ))
            })
        })
        .transpose()?;

    let criteria = SearchCriteria::new(
        params.origin,
        params.destination,
        equipment_type,
        params.max_results,
    );

    let results = search::search(&criteria, &state.loads);
    tracing::info!(
        "Load search returned {} of {} loads (max {})",
        results.len(),
        state.loads.len(),
        criteria.max_results
    );

    Ok(Json(results))
}

/// Get server metrics
async fn get_metrics(State(state): State<AppState>) -> Json<MetricsResponse> {
    Json(MetricsResponse {
        total_requests: state.metrics.total_requests.load(Ordering::Relaxed),
        requests_in_flight: state.metrics.requests_in_flight.load(Ordering::Relaxed),
        uptime_seconds: state.metrics.start_time.elapsed().as_secs(),
    })
}

#[derive(Serialize)]
struct MetricsResponse {
    total_requests: u64,
    requests_in_flight: u64,
    uptime_seconds: u64,
}

/// API error types
enum ApiError {
    Unauthorized(String),
    BadRequest(String),
    BadGateway(String),
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        ApiError::Unauthorized(err.to_string())
    }
}

impl From<VerifyError> for ApiError {
    fn from(err: VerifyError) -> Self {
        match err {
            VerifyError::InvalidInput(_) => ApiError::BadRequest(err.to_string()),
            VerifyError::UpstreamUnavailable(_) => {
                tracing::error!("Upstream failure: {}", err);
                ApiError::BadGateway(err.to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::BadGateway(msg) => (StatusCode::BAD_GATEWAY, msg),
        };

        let body = Json(serde_json::json!({
            "success": false,
            "error": message
        }));

        (status, body).into_response()
    }
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, shutting down gracefully...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, shutting down gracefully...");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::Request as HttpRequest;
    use loadboard_rs::FmcsaConfig;
    use std::time::Duration;
    use tower::ServiceExt;

    const TEST_KEY: &str = "test-key";

    fn make_load(id: &str, origin: &str, destination: &str, equipment: EquipmentType) -> Load {
        Load {
            load_id: id.to_string(),
            origin: origin.to_string(),
            destination: destination.to_string(),
            pickup_datetime: "2025-09-01T08:00:00".to_string(),
            delivery_datetime: "2025-09-02T17:00:00".to_string(),
            equipment_type: equipment,
            loadboard_rate: 1850.0,
            notes: String::new(),
            weight: 42000,
            commodity_type: "General Freight".to_string(),
            num_of_pieces: 24,
            miles: 920,
            dimensions: "48x102".to_string(),
        }
    }

    fn test_app() -> Router {
        // FMCSA base points nowhere; tests that reach upstream use a tight timeout
        let fmcsa = FmcsaClient::with_config(FmcsaConfig {
            web_key: "test".to_string(),
            base_url: "http://192.0.2.1:9".to_string(),
            timeout: Duration::from_millis(200),
        })
        .unwrap();

        let loads = vec![
            make_load("L001", "Chicago, IL", "Dallas, TX", EquipmentType::DryVan),
            make_load("L002", "Atlanta, GA", "Miami, FL", EquipmentType::Reefer),
            make_load("L003", "Chicago, IL", "Denver, CO", EquipmentType::DryVan),
            make_load("L004", "Seattle, WA", "Portland, OR", EquipmentType::Flatbed),
            make_load("L005", "Chicago, IL", "Houston, TX", EquipmentType::Reefer),
            make_load("L006", "Chicago, IL", "Nashville, TN", EquipmentType::DryVan),
            make_load("L007", "Phoenix, AZ", "Las Vegas, NV", EquipmentType::DryVan),
            make_load("L008", "Chicago, IL", "Detroit, MI", EquipmentType::DryVan),
            make_load("L009", "Boston, MA", "New York, NY", EquipmentType::Reefer),
            make_load("L010", "Dallas, TX", "Chicago, IL", EquipmentType::Flatbed),
        ];

        build_app(
            Arc::new(Authenticator::new(TEST_KEY)),
            Arc::new(fmcsa),
            Arc::new(loads),
        )
    }

    fn get_request(uri: &str, auth_header: Option<&str>) -> HttpRequest<Body> {
        let mut builder = HttpRequest::builder().uri(uri);
        if let Some(value) = auth_header {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        builder.body(Body::empty()).unwrap()
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_missing_auth_is_401() {
        for uri in [
            "/api/v1/loads/search",
            "/api/v1/verify-carrier/123456",
        ] {
            let response = test_app().oneshot(get_request(uri, None)).await.unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "uri: {}", uri);
        }
    }

    #[tokio::test]
    async fn test_wrong_key_is_401() {
        let response = test_app()
            .oneshot(get_request("/api/v1/loads/search", Some("ApiKey nope")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = test_app()
            .oneshot(get_request(
                "/api/v1/loads/search",
                Some(&format!("Bearer {}", TEST_KEY)),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_auth_rejects_before_validation() {
        // Invalid MC number, but the missing key must win
        let response = test_app()
            .oneshot(get_request("/api/v1/verify-carrier/not-a-number", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_health_and_root_are_open() {
        let response = test_app().oneshot(get_request("/health", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = test_app().oneshot(get_request("/", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["loads_available"], 10);
    }

    #[tokio::test]
    async fn test_metrics_endpoint() {
        let response = test_app()
            .oneshot(get_request("/api/metrics", None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["requests_in_flight"], 0);
    }

    #[tokio::test]
    async fn test_search_with_filters() {
        let auth = format!("ApiKey {}", TEST_KEY);
        let response = test_app()
            .oneshot(get_request(
                "/api/v1/loads/search?origin=Chicago&equipment_type=Dry%20Van&max_results=3",
                Some(&auth),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json = body_json(response).await;
        let results = json.as_array().unwrap();
        assert_eq!(results.len(), 3);
        let ids: Vec<&str> = results
            .iter()
            .map(|l| l["load_id"].as_str().unwrap())
            .collect();
        assert_eq!(ids, vec!["L001", "L003", "L006"]);
    }

    #[tokio::test]
    async fn test_search_default_limit() {
        let auth = format!("ApiKey {}", TEST_KEY);
        let response = test_app()
            .oneshot(get_request("/api/v1/loads/search", Some(&auth)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json.as_array().unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_search_clamps_max_results() {
        let auth = format!("ApiKey {}", TEST_KEY);
        let response = test_app()
            .oneshot(get_request(
                "/api/v1/loads/search?max_results=500",
                Some(&auth),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        // Whole fixture is smaller than the ceiling
        assert_eq!(json.as_array().unwrap().len(), 10);
    }

    #[tokio::test]
    async fn test_invalid_equipment_type_is_400() {
        let auth = format!("ApiKey {}", TEST_KEY);
        let response = test_app()
            .oneshot(get_request(
                "/api/v1/loads/search?equipment_type=Hovercraft",
                Some(&auth),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["success"], false);
    }

    #[tokio::test]
    async fn test_invalid_mc_number_is_400() {
        let auth = format!("ApiKey {}", TEST_KEY);
        for mc in ["abc", "0"] {
            let response = test_app()
                .oneshot(get_request(
                    &format!("/api/v1/verify-carrier/{}", mc),
                    Some(&auth),
                ))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "mc: {}", mc);
        }
    }

    #[tokio::test]
    async fn test_unreachable_upstream_is_502() {
        let auth = format!("ApiKey {}", TEST_KEY);
        let response = test_app()
            .oneshot(get_request("/api/v1/verify-carrier/123456", Some(&auth)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let json = body_json(response).await;
        assert_eq!(json["success"], false);
    }
}
