//! Carrier adapter contract and the classified error it reports.
//!
//! Every carrier integration implements [`CarrierAdapter`]. Failures are
//! reported as [`RateError`], whose [`RateErrorKind`] says what went wrong and
//! whose [`ErrorStatus`] is the wire code handed back to callers.
//!
//! # Example
//!
//! ```rust,ignore
//! use freightline_core::{CanonicalRateRequest, CarrierAdapter, RateError};
//!
//! async fn cheapest(adapter: &dyn CarrierAdapter, req: CanonicalRateRequest) -> Result<f64, RateError> {
//!     let response = adapter.get_rates(req).await?;
//!     Ok(response
//!         .available_rates
//!         .iter()
//!         .map(|rate| rate.total_charges)
//!         .fold(f64::INFINITY, f64::min))
//! }
//! ```

use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

use crate::{CanonicalRateRequest, CanonicalRateResponse, CarrierId, ValidationError};

/// What class of failure occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RateErrorKind {
    /// Bad or missing input field, detected before any network call.
    Validation,
    /// Missing carrier endpoint or credentials.
    Configuration,
    /// Missing or unknown internal API key.
    Authentication,
    /// Network failure, timeout, non-2xx status or unreadable carrier payload.
    Transport,
    /// Carrier processed the request but flagged it as failed, or returned no usable rates.
    Business,
    /// Carrier explicitly reported temporary unavailability.
    Unavailable,
}

/// Status code surfaced to callers of the rating functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorStatus {
    Unauthenticated,
    InvalidArgument,
    FailedPrecondition,
    Internal,
    Unavailable,
}

impl ErrorStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unauthenticated => "unauthenticated",
            Self::InvalidArgument => "invalid-argument",
            Self::FailedPrecondition => "failed-precondition",
            Self::Internal => "internal",
            Self::Unavailable => "unavailable",
        }
    }
}

impl Display for ErrorStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured rating error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateError {
    kind: RateErrorKind,
    status: ErrorStatus,
    message: String,
    carrier: Option<CarrierId>,
}

impl RateError {
    fn with_status(kind: RateErrorKind, status: ErrorStatus, message: impl Into<String>) -> Self {
        Self {
            kind,
            status,
            message: message.into(),
            carrier: None,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::with_status(
            RateErrorKind::Validation,
            ErrorStatus::InvalidArgument,
            message,
        )
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::with_status(RateErrorKind::Configuration, ErrorStatus::Internal, message)
    }

    pub fn unauthenticated(message: impl Into<String>) -> Self {
        Self::with_status(
            RateErrorKind::Authentication,
            ErrorStatus::Unauthenticated,
            message,
        )
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::with_status(RateErrorKind::Transport, ErrorStatus::Internal, message)
    }

    pub fn business(message: impl Into<String>) -> Self {
        Self::with_status(
            RateErrorKind::Business,
            ErrorStatus::FailedPrecondition,
            message,
        )
    }

    /// A successful carrier exchange that produced nothing quotable.
    pub fn no_rates(carrier: CarrierId) -> Self {
        Self::with_status(
            RateErrorKind::Business,
            ErrorStatus::Internal,
            format!("No rates available from {}", carrier.display_name()),
        )
        .for_carrier(carrier)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::with_status(
            RateErrorKind::Unavailable,
            ErrorStatus::Unavailable,
            message,
        )
    }

    /// Aggregation-level precondition failure (for example: no carriers enabled).
    pub fn failed_precondition(message: impl Into<String>) -> Self {
        Self::business(message)
    }

    pub fn for_carrier(mut self, carrier: CarrierId) -> Self {
        self.carrier = Some(carrier);
        self
    }

    pub const fn kind(&self) -> RateErrorKind {
        self.kind
    }

    pub const fn status(&self) -> ErrorStatus {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn carrier(&self) -> Option<CarrierId> {
        self.carrier
    }

    pub const fn code(&self) -> &'static str {
        self.status.as_str()
    }
}

impl Display for RateError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code())
    }
}

impl std::error::Error for RateError {}

impl From<ValidationError> for RateError {
    fn from(error: ValidationError) -> Self {
        match error {
            ValidationError::MalformedXml { .. } => Self::transport(error.to_string()),
            other => Self::validation(other.to_string()),
        }
    }
}

pub type RateFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, RateError>> + Send + 'a>>;

/// Per-carrier rating contract.
///
/// One call runs validate, build, call, classify and normalize strictly in
/// sequence. Implementations hold no mutable state between calls, so a single
/// instance may serve concurrent requests.
///
/// # Errors
///
/// | Kind | When |
/// |------|------|
/// | `Validation` | request rejected before any I/O |
/// | `Configuration` | endpoint/credentials missing |
/// | `Transport` | network, timeout, HTTP >= 400, unparseable body |
/// | `Unavailable` | HTTP 503 |
/// | `Business` | carrier-reported failure, or zero rates |
pub trait CarrierAdapter: Send + Sync {
    /// Allow-list identifier this adapter answers for.
    fn id(&self) -> CarrierId;

    /// Rates the canonical request with this carrier.
    fn get_rates<'a>(&'a self, req: CanonicalRateRequest) -> RateFuture<'a, CanonicalRateResponse>;
}
