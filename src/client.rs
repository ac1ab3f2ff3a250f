//! Dashboard-side access to the scoring service.
//!
//! [`HealthMonitor`] polls the service on a fixed interval; [`Predictor`]
//! switches to a local simulation of the same formula whenever the service
//! is known to be offline or cannot be reached.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::scoring::{
    self, FieldError, Prediction, RankedFeature, ScoringInput, SIMULATED_CONFIDENCE,
};

pub const HEALTH_POLL_INTERVAL: Duration = Duration::from_secs(30);
pub const HEALTH_TIMEOUT: Duration = Duration::from_secs(5);
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("scoring service unreachable: {0}")]
    Connectivity(String),
    #[error("invalid input data: {}", summarize_fields(.0))]
    Validation(Vec<FieldError>),
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("scoring service failed: {0}")]
    Server(String),
    #[error("unexpected response ({status}): {message}")]
    Unexpected { status: u16, message: String },
    #[error("failed to encode request: {0}")]
    Encode(#[from] serde_json::Error),
}

impl ClientError {
    pub fn is_connectivity(&self) -> bool {
        matches!(self, ClientError::Connectivity(_))
    }
}

fn summarize_fields(details: &[FieldError]) -> String {
    details
        .iter()
        .map(|d| format!("{}: {}", d.field, d.message))
        .collect::<Vec<_>>()
        .join("; ")
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() || err.is_connect() || err.is_request() {
            ClientError::Connectivity(err.to_string())
        } else {
            ClientError::Unexpected {
                status: err.status().map(|s| s.as_u16()).unwrap_or_default(),
                message: err.to_string(),
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceStatus {
    Checking,
    Online,
    Offline,
}

impl fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ServiceStatus::Checking => "checking",
            ServiceStatus::Online => "online",
            ServiceStatus::Offline => "offline",
        })
    }
}

#[derive(Debug, Deserialize)]
struct HealthBody {
    status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
    #[serde(default)]
    details: Vec<FieldError>,
}

#[derive(Debug, Deserialize)]
struct FeaturesBody {
    features: Vec<RankedFeature>,
}

#[derive(Debug, Clone)]
pub struct ScoringClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl ScoringClient {
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Online only when the service answers in time with `status: healthy`.
    pub async fn health(&self) -> ServiceStatus {
        let response = self
            .http
            .get(self.url("health"))
            .timeout(HEALTH_TIMEOUT)
            .send()
            .await;

        match response {
            Ok(response) if response.status().is_success() => {
                match response.json::<HealthBody>().await {
                    Ok(body) if body.status.as_deref() == Some("healthy") => ServiceStatus::Online,
                    _ => ServiceStatus::Offline,
                }
            }
            Ok(response) => {
                debug!(status = %response.status(), "health probe rejected");
                ServiceStatus::Offline
            }
            Err(err) => {
                debug!(error = %err, "health probe failed");
                ServiceStatus::Offline
            }
        }
    }

    pub async fn predict(&self, input: &ScoringInput) -> Result<Prediction, ClientError> {
        let response = self
            .authorized(self.http.post(self.url("predict")))
            .json(input)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }
        let prediction: Prediction = response.json().await?;
        if !prediction.success {
            return Err(ClientError::Server(
                "Prediction unavailable. Please fill all fields correctly.".into(),
            ));
        }
        Ok(prediction)
    }

    pub async fn feature_importance(&self) -> Result<Vec<RankedFeature>, ClientError> {
        let response = self
            .authorized(self.http.get(self.url("feature-importance")))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }
        Ok(response.json::<FeaturesBody>().await?.features)
    }
}

async fn error_from_response(response: reqwest::Response) -> ClientError {
    let status = response.status();
    let body = response.json::<ErrorBody>().await.ok();
    let message = body
        .as_ref()
        .and_then(|b| b.error.clone())
        .unwrap_or_else(|| status.to_string());

    match status {
        StatusCode::BAD_REQUEST => {
            ClientError::Validation(body.map(|b| b.details).unwrap_or_default())
        }
        StatusCode::UNAUTHORIZED => ClientError::Unauthorized(message),
        status if status.is_server_error() => ClientError::Server(message),
        status => ClientError::Unexpected {
            status: status.as_u16(),
            message,
        },
    }
}

/// Polls [`ScoringClient::health`] in the background. Dropping the monitor
/// stops the polling task.
#[derive(Debug)]
pub struct HealthMonitor {
    status: watch::Receiver<ServiceStatus>,
    task: JoinHandle<()>,
}

impl HealthMonitor {
    /// Probes immediately, then every `interval`.
    pub fn spawn(client: Arc<ScoringClient>, interval: Duration) -> Self {
        let (sender, status) = watch::channel(ServiceStatus::Checking);
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                let current = client.health().await;
                let previous = sender.send_replace(current);
                if previous != current {
                    info!(from = %previous, to = %current, "scoring service status changed");
                }
            }
        });
        Self { status, task }
    }

    pub fn status(&self) -> ServiceStatus {
        *self.status.borrow()
    }

    /// Waits until the first probe has completed.
    pub async fn ready(&self) -> ServiceStatus {
        let mut receiver = self.status.clone();
        receiver
            .wait_for(|status| *status != ServiceStatus::Checking)
            .await
            .map(|status| *status)
            .unwrap_or(ServiceStatus::Offline)
    }
}

impl Drop for HealthMonitor {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredictionSource {
    Service,
    Simulation,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PredictionOutcome {
    pub prediction: Prediction,
    pub source: PredictionSource,
}

/// Runs the scoring formula locally, as the service would, including its
/// request validation.
pub fn simulate(input: &ScoringInput) -> Result<Prediction, ClientError> {
    let input = scoring::validate_request(&serde_json::to_value(input)?)
        .map_err(ClientError::Validation)?;
    let mut rng = rand::thread_rng();
    Ok(scoring::predict(&input, SIMULATED_CONFIDENCE, &mut rng))
}

pub struct Predictor {
    client: Arc<ScoringClient>,
    monitor: Option<HealthMonitor>,
}

impl Predictor {
    pub fn new(client: Arc<ScoringClient>) -> Self {
        Self {
            client,
            monitor: None,
        }
    }

    pub fn with_monitor(client: Arc<ScoringClient>, monitor: HealthMonitor) -> Self {
        Self {
            client,
            monitor: Some(monitor),
        }
    }

    pub fn status(&self) -> ServiceStatus {
        self.monitor
            .as_ref()
            .map(HealthMonitor::status)
            .unwrap_or(ServiceStatus::Checking)
    }

    /// Validation, auth and server failures are returned as errors; only
    /// connectivity problems fall back to the simulation.
    pub async fn predict(&self, input: &ScoringInput) -> Result<PredictionOutcome, ClientError> {
        if self.status() == ServiceStatus::Offline {
            info!("scoring service offline; simulating locally");
            return simulated(input);
        }

        match self.client.predict(input).await {
            Ok(prediction) => Ok(PredictionOutcome {
                prediction,
                source: PredictionSource::Service,
            }),
            Err(err) if err.is_connectivity() => {
                warn!(error = %err, "scoring service unreachable; simulating locally");
                simulated(input)
            }
            Err(err) => Err(err),
        }
    }
}

fn simulated(input: &ScoringInput) -> Result<PredictionOutcome, ClientError> {
    Ok(PredictionOutcome {
        prediction: simulate(input)?,
        source: PredictionSource::Simulation,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PerformanceCategory;

    #[test]
    fn simulation_matches_the_formula() {
        let input = ScoringInput {
            satisfaction: 5.0,
            training: 100.0,
            ..ScoringInput::default()
        };
        let prediction = simulate(&input).unwrap();
        assert_eq!(prediction.performance_score, 100.0);
        assert_eq!(prediction.risk_level, PerformanceCategory::High);
        assert!((75.0..=90.0).contains(&prediction.confidence));
    }

    #[test]
    fn simulation_rejects_what_the_service_rejects() {
        let input = ScoringInput {
            age: 12.0,
            satisfaction: 50.0,
            ..ScoringInput::default()
        };
        match simulate(&input) {
            Err(ClientError::Validation(details)) => {
                let fields: Vec<&str> = details.iter().map(|d| d.field.as_str()).collect();
                assert_eq!(fields, vec!["age", "satisfaction"]);
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn validation_error_lists_fields() {
        let err = ClientError::Validation(vec![FieldError {
            field: "age".into(),
            message: "Number must be greater than or equal to 18".into(),
        }]);
        assert_eq!(
            err.to_string(),
            "invalid input data: age: Number must be greater than or equal to 18"
        );
        assert!(!err.is_connectivity());
        assert!(ClientError::Connectivity("refused".into()).is_connectivity());
    }

    #[test]
    fn base_url_is_trimmed() {
        let client = ScoringClient::new("http://127.0.0.1:8787/", None).unwrap();
        assert_eq!(client.url("health"), "http://127.0.0.1:8787/health");
    }
}
