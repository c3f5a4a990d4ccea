//! Builders for the standard [`KvResult`] outcomes.

use tracing::{error, warn};

use super::result::{ErrorCode, KvResult, ResultDetail, ResultState, ServiceState};
use crate::transport::TransportError;

pub fn valid<T>(payload: T) -> KvResult<T> {
    KvResult::valid(payload)
}

/// The backend is disabled or unavailable; no remote call was made.
pub fn service_not_available<T>(
    default_payload: T,
    service: &str,
    state: ServiceState,
) -> KvResult<T> {
    KvResult::invalid(
        ResultState::Error,
        default_payload,
        ErrorCode::ServiceNotAvailable,
        Some(ResultDetail::ServiceNotAvailable { service: service.to_string(), state }),
    )
}

/// A node or key does not exist.
pub fn not_found<T>(default_payload: T, element: &str, identifier: &str) -> KvResult<T> {
    KvResult::invalid(
        ResultState::Warning,
        default_payload,
        ErrorCode::NotFound,
        Some(ResultDetail::ElementNotFound {
            element: element.to_string(),
            identifier: identifier.to_string(),
        }),
    )
}

/// The backend answered with a status the operation does not accept.
pub fn backend_http_error<T>(default_payload: T, status: u16, body: &str) -> KvResult<T> {
    warn!(status, body, "Backend responded with unexpected HTTP status");
    KvResult::invalid(
        ResultState::Error,
        default_payload,
        ErrorCode::from_http_status(status),
        Some(ResultDetail::Backend { status, body: body.to_string() }),
    )
}

/// The remote call itself failed.
pub fn transport_failure<T>(default_payload: T, failure: &TransportError) -> KvResult<T> {
    error!(status = ?failure.status, error = %failure, "Backend call failed");
    KvResult::invalid(
        ResultState::Error,
        default_payload,
        ErrorCode::from_transport_status(failure.status),
        Some(ResultDetail::Message(failure.message.clone())),
    )
}
