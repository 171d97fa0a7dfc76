//! Wire format of the ride API (`POST /ride`).

use serde::{Deserialize, Serialize};

use crate::domain::{Coordinate, RideAssignment};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RideRequest {
    pub pickup_location: PickupLocation,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PickupLocation {
    pub latitude: f64,
    pub longitude: f64,
}

impl From<Coordinate> for RideRequest {
    fn from(pin: Coordinate) -> Self {
        Self {
            pickup_location: PickupLocation {
                latitude: pin.latitude,
                longitude: pin.longitude,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Unicorn {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RideResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ride_id: Option<String>,
    pub unicorn: Unicorn,
    pub eta: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rider: Option<String>,
}

impl From<RideResponse> for RideAssignment {
    fn from(value: RideResponse) -> Self {
        Self {
            unicorn_name: value.unicorn.name,
            eta_seconds: value.eta,
        }
    }
}

/// Error body returned by the ride API on non-2xx responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ApiErrorBody {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}
