//! # Freightline Core
//!
//! Canonical rate model, carrier adapters and multi-carrier aggregation for
//! freight quoting.
//!
//! ## Overview
//!
//! - **Canonical domain models** for rate requests, quotes and billing breakdowns
//! - **Carrier adapters** for Canpar (SOAP), eShipPlus and Polaris Transportation (REST)
//! - **Aggregator** that rates every enabled carrier concurrently and merges by price
//! - **Classified errors** with stable wire codes for callers
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`adapters`] | Carrier adapters and their shared call/classify helpers |
//! | [`aggregator`] | Carrier registry and fan-out aggregation |
//! | [`auth`] | Internal API-key check |
//! | [`carrier`] | Carrier allow-list identifiers |
//! | [`config`] | Endpoints, credentials and enabled carriers |
//! | [`domain`] | Canonical request/response types |
//! | [`envelope`] | `{success, data}` response envelopes |
//! | [`error`] | Validation and configuration errors |
//! | [`fields`] | Optional-path access over carrier JSON |
//! | [`http_client`] | HTTP transport abstraction |
//! | [`rate_source`] | Adapter trait and classified rate errors |
//! | [`service`] | Callable rating operations |
//! | [`xml`] | XML tree for SOAP responses |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use freightline_core::{CarrierId, RatingConfig, RatingService};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let service = RatingService::from_config(RatingConfig::from_env()?);
//!     let payload = serde_json::json!({
//!         "origin": {"postalCode": "L4W5K9"},
//!         "destination": {"postalCode": "H4T1A3"},
//!         "items": [{"weight": 50}]
//!     });
//!
//!     let response = service.get_carrier_rates(CarrierId::Canpar, payload).await?;
//!     for rate in &response.data.available_rates {
//!         println!("{} {:.2} {}", rate.service_type, rate.total_charges, rate.currency);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐
//! │  CLI / Caller   │
//! └────────┬────────┘
//!          │
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │ Rating Service  │────▶│ API-key check    │
//! └────────┬────────┘     └──────────────────┘
//!          │
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │ Rate Aggregator │────▶│ Carrier Directory│
//! └────────┬────────┘     └──────────────────┘
//!          │ (concurrent)
//!          ▼
//! ┌─────────────────┐     ┌──────────────────┐
//! │ Carrier Adapter │────▶│ HTTP Client      │
//! └─────────────────┘     └──────────────────┘
//! ```
//!
//! ## Error Handling
//!
//! ```rust
//! use freightline_core::{RateError, RateErrorKind};
//!
//! fn should_alert(error: &RateError) -> bool {
//!     match error.kind() {
//!         RateErrorKind::Configuration => true,
//!         RateErrorKind::Transport | RateErrorKind::Unavailable => false,
//!         _ => false,
//!     }
//! }
//! ```
//!
//! ## Security
//!
//! - Caller API keys are removed from requests before any carrier call
//! - Carrier credentials never appear in logs; query-string credentials are cut from logged URLs
//! - Carrier error bodies reach callers only as a capped excerpt

pub mod adapters;
pub mod aggregator;
pub mod auth;
pub mod carrier;
pub mod config;
pub mod domain;
pub mod envelope;
pub mod error;
pub mod fields;
pub mod http_client;
pub mod rate_source;
pub mod service;
pub mod xml;

// Adapter implementations
pub use adapters::{CanparAdapter, EShipPlusAdapter, PolarisAdapter};

// Aggregation
pub use aggregator::{
    AggregateRequest, AggregatedRate, AggregatedRateResult, CarrierFailure, CarrierRegistry,
    CarrierResults, RateAggregator, RequestInfo, SourceCarrier,
};

// Authentication
pub use auth::{CallerAuthenticator, StaticApiKeys};

// Carrier identifiers
pub use carrier::CarrierId;

// Configuration
pub use config::{
    ApiOperation, CarrierApiConfig, CarrierConfigProvider, CarrierDirectory, EnabledCarrier,
    RatingConfig,
};

// Domain models
pub use domain::{
    Address, BillingDetail, CanonicalRateRequest, CanonicalRateResponse, FlexNumber,
    NormalizedItem, PackageItem, RateQuote, TimeWindow, UtcDateTime,
};

// Envelope types
pub use envelope::{ApiErrorBody, ApiErrorResponse, ApiResponse};

// Error types
pub use error::{ConfigError, ValidationError};

// HTTP client types
pub use http_client::{
    CannedHttpClient, HttpAuth, HttpClient, HttpError, HttpMethod, HttpRequest, HttpResponse,
    ReqwestHttpClient,
};

// Adapter contract
pub use rate_source::{CarrierAdapter, ErrorStatus, RateError, RateErrorKind, RateFuture};

// Service entry points
pub use service::RatingService;

// XML tree
pub use xml::XmlElement;
