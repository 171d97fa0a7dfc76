use std::{
    sync::atomic::{AtomicUsize, Ordering},
    time::Duration,
};

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use shared::{
    domain::{Coordinate, RideAssignment},
    error::AssignmentError,
    protocol::{ApiErrorBody, RideRequest, RideResponse},
};
use tracing::{debug, warn};
use url::Url;

pub const DEFAULT_RIDE_PATH: &str = "/ride";

#[async_trait]
pub trait RideBackend: Send + Sync {
    async fn assign(&self, pin: Coordinate) -> Result<RideAssignment, AssignmentError>;
}

/// Stand-in used when no ride API is configured.
pub struct MissingRideBackend;

#[async_trait]
impl RideBackend for MissingRideBackend {
    async fn assign(&self, pin: Coordinate) -> Result<RideAssignment, AssignmentError> {
        debug!(%pin, "ride requested without a configured backend");
        Err(AssignmentError::NotConfigured)
    }
}

pub struct HttpRideBackend {
    http: Client,
    endpoint: Url,
    auth_token: String,
}

impl HttpRideBackend {
    pub fn new(
        api_url: &str,
        ride_path: &str,
        auth_token: impl Into<String>,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            endpoint: ride_endpoint(api_url, ride_path)?,
            auth_token: auth_token.into(),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

pub fn ride_endpoint(api_url: &str, ride_path: &str) -> anyhow::Result<Url> {
    let mut base = Url::parse(api_url.trim())?;
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }
    Ok(base.join(ride_path.trim_start_matches('/'))?)
}

#[async_trait]
impl RideBackend for HttpRideBackend {
    async fn assign(&self, pin: Coordinate) -> Result<RideAssignment, AssignmentError> {
        let response = self
            .http
            .post(self.endpoint.clone())
            .header(reqwest::header::AUTHORIZATION, &self.auth_token)
            .json(&RideRequest::from(pin))
            .send()
            .await
            .map_err(|err| AssignmentError::Transport(err.to_string()))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(AssignmentError::Unauthorized);
        }
        if !status.is_success() {
            if let Ok(body) = response.json::<ApiErrorBody>().await {
                warn!(
                    status = status.as_u16(),
                    error = %body.error,
                    reference = body.reference.as_deref().unwrap_or("-"),
                    "ride API returned an error body"
                );
            }
            return Err(AssignmentError::Status {
                status: status.as_u16(),
            });
        }

        let ride: RideResponse = response
            .json()
            .await
            .map_err(|err| AssignmentError::Decode(err.to_string()))?;
        debug!(
            ride_id = ride.ride_id.as_deref().unwrap_or("-"),
            unicorn = %ride.unicorn.name,
            eta = ride.eta,
            "ride API assigned a unicorn"
        );
        Ok(ride.into())
    }
}

/// In-process fleet that hands out unicorns in rotation with a fixed ETA.
pub struct SimulatedRideBackend {
    fleet: Vec<String>,
    eta_seconds: u64,
    next: AtomicUsize,
}

impl SimulatedRideBackend {
    pub fn new(fleet: Vec<String>, eta_seconds: u64) -> Self {
        Self {
            fleet,
            eta_seconds,
            next: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl RideBackend for SimulatedRideBackend {
    async fn assign(&self, pin: Coordinate) -> Result<RideAssignment, AssignmentError> {
        if self.fleet.is_empty() {
            return Err(AssignmentError::Transport(
                "simulated fleet has no unicorns".to_string(),
            ));
        }
        let slot = self.next.fetch_add(1, Ordering::Relaxed) % self.fleet.len();
        let unicorn = &self.fleet[slot];
        debug!(%pin, unicorn = %unicorn, "simulated fleet assigned a unicorn");
        Ok(RideAssignment::new(unicorn.clone(), self.eta_seconds))
    }
}

#[cfg(test)]
#[path = "tests/backend_tests.rs"]
mod tests;
