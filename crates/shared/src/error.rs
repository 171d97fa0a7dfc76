use thiserror::Error;

/// Any failure to obtain a ride assignment.
///
/// Callers of the controller never see these; they are collapsed into a single
/// update-log entry. The variants exist for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssignmentError {
    #[error("no ride API is configured")]
    NotConfigured,
    #[error("ride API rejected the session token")]
    Unauthorized,
    #[error("ride API returned status {status}")]
    Status { status: u16 },
    #[error("ride API transport failure: {0}")]
    Transport(String),
    #[error("malformed ride API response: {0}")]
    Decode(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum CoordinateError {
    #[error("latitude {0} is outside [-90, 90]")]
    Latitude(f64),
    #[error("longitude {0} is outside [-180, 180]")]
    Longitude(f64),
}
