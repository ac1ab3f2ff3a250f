use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderMap, HeaderName, Method,
    },
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde_json::{json, Value};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;
use uuid::Uuid;

use crate::auth::{Session, SessionProvider};
use crate::error::ApiError;
use crate::scoring::{self, Prediction, RankedFeature, SERVER_CONFIDENCE};

pub const MODEL_NAME: &str = "built-in-v1";

pub struct AppState {
    pub sessions: Arc<dyn SessionProvider>,
}

pub type SharedState = Arc<AppState>;

pub fn create_router(state: SharedState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            AUTHORIZATION,
            CONTENT_TYPE,
            HeaderName::from_static("x-client-info"),
            HeaderName::from_static("apikey"),
        ]);

    Router::new()
        .route("/health", get(health))
        .route("/feature-importance", get(feature_importance))
        .route("/predict", post(predict))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn serve(addr: SocketAddr, state: SharedState) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(address = %listener.local_addr()?, "scoring service listening");

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown signal received");
        })
        .await?;
    Ok(())
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "model": MODEL_NAME,
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

async fn feature_importance(
    State(state): State<SharedState>,
    headers: HeaderMap,
) -> Result<Json<Value>, ApiError> {
    authenticate(&state, &headers)?;
    let features: Vec<RankedFeature> = scoring::static_feature_importance();
    Ok(Json(json!({ "features": features })))
}

async fn predict(
    State(state): State<SharedState>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<Prediction>, ApiError> {
    let session = authenticate(&state, &headers)?;
    let body = body.map_err(|rejection| ApiError::Internal(rejection.body_text()))?;

    let payload: Value = serde_json::from_slice(&body).map_err(|err| ApiError::BadRequest {
        details: vec![scoring::FieldError {
            field: String::new(),
            message: format!("Malformed JSON body: {err}"),
        }],
    })?;
    let input = scoring::validate_request(&payload)
        .map_err(|details| ApiError::BadRequest { details })?;

    let prediction = {
        let mut rng = rand::thread_rng();
        scoring::predict(&input, SERVER_CONFIDENCE, &mut rng)
    };

    info!(
        request_id = %Uuid::new_v4(),
        user_id = %session.user.user_id,
        score = prediction.performance_score,
        category = %prediction.risk_level,
        "prediction served"
    );
    Ok(Json(prediction))
}

fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<Session, ApiError> {
    let header = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("Missing authorization header".into()))?;
    let token = header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))
        .unwrap_or(header)
        .trim();

    state
        .sessions
        .get_session(token)
        .ok_or_else(|| ApiError::Unauthorized("Invalid or expired token".into()))
}
