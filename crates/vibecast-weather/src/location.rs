//! Device location seam.

use std::future::Future;

use crate::error::LocationError;
use crate::types::Coordinates;

/// Where the device currently is. Any error sends the caller down the
/// last-known / default fallback chain.
pub trait LocationSource: Send + Sync {
    fn current_location(&self) -> impl Future<Output = Result<Coordinates, LocationError>> + Send;
}

/// No location service on this platform
#[derive(Debug, Clone, Copy, Default)]
pub struct Unavailable;

impl LocationSource for Unavailable {
    async fn current_location(&self) -> Result<Coordinates, LocationError> {
        Err(LocationError::ServiceUnavailable)
    }
}

/// Always reports the same coordinates
#[derive(Debug, Clone, Copy)]
pub struct FixedLocation(pub Coordinates);

impl LocationSource for FixedLocation {
    async fn current_location(&self) -> Result<Coordinates, LocationError> {
        if self.0.is_valid() {
            Ok(self.0)
        } else {
            Err(LocationError::Other(format!("invalid coordinates {}", self.0)))
        }
    }
}
