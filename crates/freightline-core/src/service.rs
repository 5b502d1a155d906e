//! Callable rating operations.
//!
//! [`RatingService`] is the inbound surface: it authenticates the caller,
//! strips the caller's `apiKey` from the payload, and hands the rest to a
//! single adapter or to the aggregator.

use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::aggregator::{AggregateRequest, AggregatedRateResult, CarrierRegistry, RateAggregator};
use crate::auth::{CallerAuthenticator, StaticApiKeys};
use crate::config::{CarrierDirectory, RatingConfig};
use crate::domain::{CanonicalRateRequest, CanonicalRateResponse};
use crate::envelope::ApiResponse;
use crate::fields::text_at;
use crate::http_client::{HttpClient, ReqwestHttpClient};
use crate::rate_source::RateError;
use crate::{CarrierId, ValidationError};

#[derive(Clone)]
pub struct RatingService {
    registry: Arc<CarrierRegistry>,
    aggregator: RateAggregator,
    authenticator: Arc<dyn CallerAuthenticator>,
}

impl RatingService {
    pub fn new(
        registry: Arc<CarrierRegistry>,
        directory: Arc<dyn CarrierDirectory>,
        authenticator: Arc<dyn CallerAuthenticator>,
    ) -> Self {
        Self {
            aggregator: RateAggregator::new(registry.clone(), directory),
            registry,
            authenticator,
        }
    }

    /// Production wiring: reqwest transport, built-in adapters, keys and carriers from `config`.
    pub fn from_config(config: RatingConfig) -> Self {
        let http_client: Arc<dyn HttpClient> =
            Arc::new(ReqwestHttpClient::with_default_timeout_ms(config.http_timeout_ms));
        Self::with_http_client(config, http_client)
    }

    pub fn with_http_client(config: RatingConfig, http_client: Arc<dyn HttpClient>) -> Self {
        let authenticator = Arc::new(StaticApiKeys::new(config.api_keys.clone()));
        let config = Arc::new(config);
        let registry = Arc::new(CarrierRegistry::standard(http_client, config.clone()));
        Self::new(registry, config, authenticator)
    }

    pub fn registry(&self) -> &CarrierRegistry {
        &self.registry
    }

    /// Rates a canonical request with one carrier.
    pub async fn get_carrier_rates(
        &self,
        carrier: CarrierId,
        payload: Value,
    ) -> Result<ApiResponse<CanonicalRateResponse>, RateError> {
        self.authenticate(&payload)?;

        let mut request: CanonicalRateRequest =
            serde_json::from_value(payload).map_err(|error| {
                RateError::from(ValidationError::MalformedPayload {
                    reason: error.to_string(),
                })
            })?;
        request.take_api_key();

        let adapter = self.registry.get(carrier).ok_or_else(|| {
            RateError::configuration(format!("No adapter registered for {carrier}"))
                .for_carrier(carrier)
        })?;

        debug!(carrier = %carrier, items = request.items.len(), "rating single carrier");
        adapter.get_rates(request).await.map(ApiResponse::ok)
    }

    /// Rates an aggregate request with every carrier enabled for its company.
    pub async fn get_universal_rates(
        &self,
        payload: Value,
    ) -> Result<ApiResponse<AggregatedRateResult>, RateError> {
        self.authenticate(&payload)?;
        let request = AggregateRequest::from_value(&payload)?;
        self.aggregator.aggregate(request).await.map(ApiResponse::ok)
    }

    fn authenticate(&self, payload: &Value) -> Result<(), RateError> {
        let api_key = text_at(payload, &["apiKey"]);
        self.authenticator.authenticate(api_key.as_deref())
    }
}
