use std::sync::Arc;
use std::time::Duration;

use axum::{body::Body, http::Request, http::StatusCode, Router};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use workforce_pulse::auth::InMemorySessions;
use workforce_pulse::client::{
    ClientError, HealthMonitor, PredictionSource, Predictor, ScoringClient, ServiceStatus,
};
use workforce_pulse::models::PerformanceCategory;
use workforce_pulse::scoring::ScoringInput;
use workforce_pulse::server::{self, AppState};

const TOKEN: &str = "test-token";

fn app() -> Router {
    let sessions = InMemorySessions::new();
    sessions.insert_token(TOKEN, "dashboard@example.com");
    server::create_router(Arc::new(AppState {
        sessions: Arc::new(sessions),
    }))
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn predict_request(token: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/predict")
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn spawn_server() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app()).await.unwrap();
    });
    format!("http://{addr}")
}

async fn unused_endpoint() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

#[tokio::test]
async fn health_is_public() {
    let (status, body) = send(
        app(),
        Request::builder().uri("/health").body(Body::empty()).unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["model"], "built-in-v1");
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn predict_requires_a_known_token() {
    let (status, body) = send(app(), predict_request(None, "{}")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Missing authorization header");

    let (status, body) = send(app(), predict_request(Some("stale"), "{}")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid or expired token");
}

#[tokio::test]
async fn engaged_employee_is_a_high_performer() {
    let payload = json!({ "satisfaction": 5, "training": 100, "overtime": 0, "sickDays": 0 });
    let (status, body) = send(app(), predict_request(Some(TOKEN), &payload.to_string())).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["risk_level"], "High");
    assert_eq!(body["attrition_risk"], "Low");
    assert!(body["performance_score"].as_f64().unwrap() >= 80.0);
    assert!(body["recommendations"].as_array().unwrap().len() <= 5);
}

#[tokio::test]
async fn invalid_fields_are_enumerated() {
    let payload = json!({ "age": 15, "remote": "Sometimes", "satisfaction": 9 });
    let (status, body) = send(app(), predict_request(Some(TOKEN), &payload.to_string())).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid input data");
    let fields: Vec<&str> = body["details"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|d| d["field"].as_str())
        .collect();
    assert_eq!(fields, vec!["age", "remote", "satisfaction"]);
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() {
    let (status, body) = send(app(), predict_request(Some(TOKEN), "{not json")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["details"][0]["message"]
        .as_str()
        .unwrap()
        .starts_with("Malformed JSON body"));
}

#[tokio::test]
async fn feature_ranking_is_authenticated() {
    let request = |token: Option<&str>| {
        let mut builder = Request::builder().uri("/feature-importance");
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        builder.body(Body::empty()).unwrap()
    };

    let (status, _) = send(app(), request(None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(app(), request(Some(TOKEN))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["features"].as_array().unwrap().len(), 10);
    assert_eq!(body["features"][0]["feature"], "satisfaction");
}

#[tokio::test]
async fn wrong_method_is_rejected() {
    let (status, _) = send(
        app(),
        Request::builder().uri("/predict").body(Body::empty()).unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn client_talks_to_a_live_service() {
    let endpoint = spawn_server().await;
    let client = Arc::new(ScoringClient::new(endpoint.clone(), Some(TOKEN.to_string())).unwrap());

    assert_eq!(client.health().await, ServiceStatus::Online);
    assert_eq!(client.feature_importance().await.unwrap().len(), 10);

    let monitor = HealthMonitor::spawn(client.clone(), Duration::from_millis(50));
    assert_eq!(monitor.ready().await, ServiceStatus::Online);
    let predictor = Predictor::with_monitor(client, monitor);

    let input = ScoringInput {
        satisfaction: 5.0,
        training: 100.0,
        ..ScoringInput::default()
    };
    let outcome = predictor.predict(&input).await.unwrap();
    assert_eq!(outcome.source, PredictionSource::Service);
    assert_eq!(outcome.prediction.risk_level, PerformanceCategory::High);

    let invalid = ScoringInput {
        age: 12.0,
        ..ScoringInput::default()
    };
    match predictor.predict(&invalid).await {
        Err(ClientError::Validation(details)) => assert_eq!(details[0].field, "age"),
        other => panic!("expected validation error, got {other:?}"),
    }

    let stranger = ScoringClient::new(endpoint, Some("stale".to_string())).unwrap();
    assert!(matches!(
        stranger.predict(&input).await,
        Err(ClientError::Unauthorized(message)) if message == "Invalid or expired token"
    ));
}

#[tokio::test]
async fn offline_service_falls_back_to_simulation() {
    let endpoint = unused_endpoint().await;
    let client = Arc::new(ScoringClient::new(endpoint, Some(TOKEN.to_string())).unwrap());
    assert_eq!(client.health().await, ServiceStatus::Offline);

    let input = ScoringInput::default();

    let unmonitored = Predictor::new(client.clone());
    let outcome = unmonitored.predict(&input).await.unwrap();
    assert_eq!(outcome.source, PredictionSource::Simulation);

    let monitor = HealthMonitor::spawn(client.clone(), Duration::from_millis(50));
    assert_eq!(monitor.ready().await, ServiceStatus::Offline);
    let predictor = Predictor::with_monitor(client, monitor);
    assert_eq!(predictor.status(), ServiceStatus::Offline);

    let outcome = predictor.predict(&input).await.unwrap();
    assert_eq!(outcome.source, PredictionSource::Simulation);
    assert_eq!(outcome.prediction.performance_score, 81.0);
    assert_eq!(outcome.prediction.risk_level, PerformanceCategory::High);
}

#[tokio::test]
async fn offline_simulation_still_validates_input() {
    let endpoint = unused_endpoint().await;
    let client = Arc::new(ScoringClient::new(endpoint, Some(TOKEN.to_string())).unwrap());
    let invalid = ScoringInput {
        age: 12.0,
        satisfaction: 50.0,
        ..ScoringInput::default()
    };

    let unmonitored = Predictor::new(client.clone());
    match unmonitored.predict(&invalid).await {
        Err(ClientError::Validation(details)) => {
            let fields: Vec<&str> = details.iter().map(|d| d.field.as_str()).collect();
            assert_eq!(fields, vec!["age", "satisfaction"]);
        }
        other => panic!("expected validation error, got {other:?}"),
    }

    let monitor = HealthMonitor::spawn(client.clone(), Duration::from_millis(50));
    assert_eq!(monitor.ready().await, ServiceStatus::Offline);
    let predictor = Predictor::with_monitor(client, monitor);
    match predictor.predict(&invalid).await {
        Err(ClientError::Validation(details)) => assert_eq!(details[0].field, "age"),
        other => panic!("expected validation error, got {other:?}"),
    }
}
