//! Non-throwing outcome type returned by every navigator and node manager operation.
//!
//! A [`KvResult`] always carries a payload. Valid results carry the real one;
//! warnings and errors carry a safe default of the same type, so a caller that
//! forgets to check [`KvResult::is_valid`] still gets a well-formed value.

use serde::Serialize;
use std::fmt;

/// Overall state of a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultState {
    Valid,
    Warning,
    Error,
}

impl fmt::Display for ResultState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResultState::Valid => write!(f, "valid"),
            ResultState::Warning => write!(f, "warning"),
            ResultState::Error => write!(f, "error"),
        }
    }
}

/// State of the backend service as seen by a navigator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceState {
    /// Backend enabled by configuration
    Active,
    /// Backend disabled by configuration
    NotConfigured,
    /// Backend enabled but currently unreachable or unhealthy
    TemporarilyUnavailable,
}

impl fmt::Display for ServiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceState::Active => write!(f, "ACTIVE"),
            ServiceState::NotConfigured => write!(f, "NOT_CONFIGURED"),
            ServiceState::TemporarilyUnavailable => write!(f, "TEMPORARILY_UNAVAILABLE"),
        }
    }
}

/// Machine-readable reason for a non-valid result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    ServiceNotAvailable,
    NotFound,
    BadRequest,
    Unauthorized,
    Forbidden,
    Conflict,
    RuntimeError,
}

impl ErrorCode {
    /// Map an HTTP status to an error code.
    pub fn from_http_status(status: u16) -> Self {
        match status {
            400 => ErrorCode::BadRequest,
            401 => ErrorCode::Unauthorized,
            403 => ErrorCode::Forbidden,
            404 => ErrorCode::NotFound,
            409 => ErrorCode::Conflict,
            502..=504 => ErrorCode::ServiceNotAvailable,
            _ => ErrorCode::RuntimeError,
        }
    }

    /// Map an optional transport status; no status means the backend was not reached.
    pub fn from_transport_status(status: Option<u16>) -> Self {
        status.map_or(ErrorCode::ServiceNotAvailable, Self::from_http_status)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorCode::ServiceNotAvailable => "service_not_available",
            ErrorCode::NotFound => "not_found",
            ErrorCode::BadRequest => "bad_request",
            ErrorCode::Unauthorized => "unauthorized",
            ErrorCode::Forbidden => "forbidden",
            ErrorCode::Conflict => "conflict",
            ErrorCode::RuntimeError => "runtime_error",
        };
        write!(f, "{}", name)
    }
}

/// Human-readable detail attached to a non-valid result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResultDetail {
    ServiceNotAvailable { service: String, state: ServiceState },
    ElementNotFound { element: String, identifier: String },
    Backend { status: u16, body: String },
    Message(String),
}

impl fmt::Display for ResultDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResultDetail::ServiceNotAvailable { service, state } => write!(
                f,
                "The service '{}' is not available due to '{}'. If this error persists contact your administrator.",
                service, state
            ),
            ResultDetail::ElementNotFound { element, identifier } => {
                write!(f, "The element '{}' identified by '{}' was not found.", element, identifier)
            }
            ResultDetail::Backend { status, body } => {
                write!(f, "Backend responded with HTTP status {}: {}", status, body)
            }
            ResultDetail::Message(message) => write!(f, "{}", message),
        }
    }
}

/// A non-valid result converted into a standard error.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("{state} ({code}): {}", .detail.as_ref().map(ToString::to_string).unwrap_or_default())]
pub struct KvError {
    pub state: ResultState,
    pub code: ErrorCode,
    pub detail: Option<ResultDetail>,
}

/// Outcome of one operation: a payload plus state, error code and detail.
#[derive(Debug, Clone, PartialEq)]
pub struct KvResult<T> {
    state: ResultState,
    payload: T,
    error_code: Option<ErrorCode>,
    detail: Option<ResultDetail>,
}

impl<T> KvResult<T> {
    pub fn valid(payload: T) -> Self {
        Self { state: ResultState::Valid, payload, error_code: None, detail: None }
    }

    /// A non-valid result. `state` must not be [`ResultState::Valid`]; a valid
    /// state is downgraded to an error so the code is never dropped.
    pub fn invalid(
        state: ResultState,
        default_payload: T,
        error_code: ErrorCode,
        detail: Option<ResultDetail>,
    ) -> Self {
        let state = if state == ResultState::Valid { ResultState::Error } else { state };
        Self { state, payload: default_payload, error_code: Some(error_code), detail }
    }

    pub fn is_valid(&self) -> bool {
        self.state == ResultState::Valid
    }

    pub fn state(&self) -> ResultState {
        self.state
    }

    pub fn payload(&self) -> &T {
        &self.payload
    }

    pub fn into_payload(self) -> T {
        self.payload
    }

    pub fn error_code(&self) -> Option<ErrorCode> {
        self.error_code
    }

    pub fn detail(&self) -> Option<&ResultDetail> {
        self.detail.as_ref()
    }

    /// Copy state, error code and detail onto a result with another payload.
    ///
    /// Used by composite operations to hand a failing step's outcome upwards
    /// unchanged.
    pub fn carry_over<U>(&self, payload: U) -> KvResult<U> {
        KvResult {
            state: self.state,
            payload,
            error_code: self.error_code,
            detail: self.detail.clone(),
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> KvResult<U> {
        KvResult {
            state: self.state,
            payload: f(self.payload),
            error_code: self.error_code,
            detail: self.detail,
        }
    }

    /// Convert into a standard `Result`, dropping the default payload of non-valid results.
    pub fn into_std_result(self) -> std::result::Result<T, KvError> {
        match self.error_code {
            None => Ok(self.payload),
            Some(code) => Err(KvError { state: self.state, code, detail: self.detail }),
        }
    }
}

impl<T> fmt::Display for KvResult<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.error_code, &self.detail) {
            (None, _) => write!(f, "{}", self.state),
            (Some(code), None) => write!(f, "{} ({})", self.state, code),
            (Some(code), Some(detail)) => write!(f, "{} ({}): {}", self.state, code, detail),
        }
    }
}
