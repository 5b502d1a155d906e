//! Rating configuration: carrier endpoints, credentials and enabled carriers.
//!
//! Adapters and the aggregator only see the [`CarrierConfigProvider`] and
//! [`CarrierDirectory`] traits. [`RatingConfig`] implements both from a JSON
//! file and environment overrides.
//!
//! # Environment Variables
//!
//! | Variable | Meaning |
//! |----------|---------|
//! | `FREIGHTLINE_CONFIG` | path to the JSON config file |
//! | `FREIGHTLINE_API_KEYS` | comma-separated internal API keys (replaces `apiKeys`) |
//! | `FREIGHTLINE_HTTP_TIMEOUT_MS` | default transport timeout |

use std::collections::BTreeMap;
use std::env;
use std::fmt::{Display, Formatter};
use std::future::Future;
use std::path::Path;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

use crate::http_client::DEFAULT_TIMEOUT_MS;
use crate::rate_source::{RateError, RateFuture};
use crate::{CarrierId, ConfigError};

/// Carrier API operation a config entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiOperation {
    Rate,
}

impl ApiOperation {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Rate => "rate",
        }
    }
}

impl Display for ApiOperation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Endpoint and credentials for one carrier operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CarrierApiConfig {
    pub api_url: String,
    pub credentials: BTreeMap<String, String>,
}

impl CarrierApiConfig {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            credentials: BTreeMap::new(),
        }
    }

    pub fn with_credential(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.credentials.insert(name.into(), value.into());
        self
    }

    /// Non-blank credential under the first matching name.
    pub fn credential(&self, names: &[&str]) -> Option<&str> {
        names.iter().find_map(|name| {
            self.credentials
                .get(*name)
                .map(|value| value.trim())
                .filter(|value| !value.is_empty())
        })
    }

    /// Like [`credential`](Self::credential) but a missing value is a configuration error.
    pub fn require_credential(&self, carrier: CarrierId, names: &[&str]) -> Result<&str, RateError> {
        self.credential(names).ok_or_else(|| {
            RateError::configuration(format!(
                "{} credentials are missing '{}'",
                carrier.display_name(),
                names.first().copied().unwrap_or("credential")
            ))
            .for_carrier(carrier)
        })
    }

    pub fn require_api_url(&self, carrier: CarrierId) -> Result<&str, RateError> {
        let url = self.api_url.trim();
        if url.is_empty() {
            return Err(RateError::configuration(format!(
                "{} API URL is not configured",
                carrier.display_name()
            ))
            .for_carrier(carrier));
        }
        Ok(url)
    }
}

/// Enabled-carrier record, either company-specific or global.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnabledCarrier {
    /// Record identifier reported back in aggregation errors.
    pub id: String,
    /// Carrier system key, matched against the allow-list after upper-casing.
    pub carrier_key: String,
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_id: Option<String>,
}

impl EnabledCarrier {
    pub fn global(id: impl Into<String>, carrier_key: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            carrier_key: carrier_key.into(),
            name: name.into(),
            enabled: true,
            company_id: None,
        }
    }

    pub fn for_company(mut self, company_id: impl Into<String>) -> Self {
        self.company_id = Some(company_id.into());
        self
    }
}

fn default_enabled() -> bool {
    true
}

/// Resolves endpoint and credentials for a carrier operation.
pub trait CarrierConfigProvider: Send + Sync {
    fn carrier_api_config<'a>(
        &'a self,
        carrier: CarrierId,
        operation: ApiOperation,
    ) -> RateFuture<'a, CarrierApiConfig>;
}

/// Resolves which carriers a company may be quoted by.
pub trait CarrierDirectory: Send + Sync {
    fn enabled_carriers<'a>(
        &'a self,
        company_id: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<EnabledCarrier>, RateError>> + Send + 'a>>;
}

/// File/env backed configuration implementing both lookup traits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RatingConfig {
    pub api_keys: Vec<String>,
    pub http_timeout_ms: u64,
    /// Carrier key -> operation name -> endpoint config.
    pub carriers: BTreeMap<String, BTreeMap<String, CarrierApiConfig>>,
    pub enabled_carriers: Vec<EnabledCarrier>,
}

impl Default for RatingConfig {
    fn default() -> Self {
        Self {
            api_keys: Vec::new(),
            http_timeout_ms: DEFAULT_TIMEOUT_MS,
            carriers: BTreeMap::new(),
            enabled_carriers: Vec::new(),
        }
    }
}

impl RatingConfig {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// Loads `FREIGHTLINE_CONFIG` (if set) and applies environment overrides.
    pub fn from_env() -> Result<Self, ConfigError> {
        let base = match env::var("FREIGHTLINE_CONFIG") {
            Ok(path) if !path.trim().is_empty() => Self::from_path(path.trim())?,
            _ => Self::default(),
        };
        base.with_env_overrides()
    }

    pub fn with_env_overrides(mut self) -> Result<Self, ConfigError> {
        if let Ok(keys) = env::var("FREIGHTLINE_API_KEYS") {
            self.api_keys = keys
                .split(',')
                .map(str::trim)
                .filter(|key| !key.is_empty())
                .map(str::to_owned)
                .collect();
        }

        if let Ok(raw) = env::var("FREIGHTLINE_HTTP_TIMEOUT_MS") {
            self.http_timeout_ms = raw.trim().parse().map_err(|_| ConfigError::InvalidEnv {
                name: "FREIGHTLINE_HTTP_TIMEOUT_MS",
                value: raw.clone(),
            })?;
        }

        Ok(self)
    }

    pub fn with_carrier(
        mut self,
        carrier: CarrierId,
        operation: ApiOperation,
        config: CarrierApiConfig,
    ) -> Self {
        self.carriers
            .entry(carrier.as_str().to_owned())
            .or_default()
            .insert(operation.as_str().to_owned(), config);
        self
    }

    pub fn with_enabled_carrier(mut self, carrier: EnabledCarrier) -> Self {
        self.enabled_carriers.push(carrier);
        self
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_keys.push(key.into());
        self
    }

    /// Endpoint config for `carrier`, matching the carrier key case-insensitively.
    pub fn api_config(&self, carrier: CarrierId, operation: ApiOperation) -> Option<&CarrierApiConfig> {
        self.carriers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(carrier.as_str()))
            .and_then(|(_, operations)| operations.get(operation.as_str()))
    }

    /// Company-specific enabled records, or the global ones when the company has none.
    pub fn resolve_enabled(&self, company_id: &str) -> Vec<EnabledCarrier> {
        let company_specific = self
            .enabled_carriers
            .iter()
            .filter(|carrier| carrier.enabled && carrier.company_id.as_deref() == Some(company_id))
            .cloned()
            .collect::<Vec<_>>();

        if !company_specific.is_empty() {
            return company_specific;
        }

        self.enabled_carriers
            .iter()
            .filter(|carrier| carrier.enabled && carrier.company_id.is_none())
            .cloned()
            .collect()
    }
}

impl CarrierConfigProvider for RatingConfig {
    fn carrier_api_config<'a>(
        &'a self,
        carrier: CarrierId,
        operation: ApiOperation,
    ) -> RateFuture<'a, CarrierApiConfig> {
        Box::pin(async move {
            self.api_config(carrier, operation).cloned().ok_or_else(|| {
                RateError::configuration(format!(
                    "no '{operation}' configuration found for carrier {carrier}"
                ))
                .for_carrier(carrier)
            })
        })
    }
}

impl CarrierDirectory for RatingConfig {
    fn enabled_carriers<'a>(
        &'a self,
        company_id: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<EnabledCarrier>, RateError>> + Send + 'a>> {
        Box::pin(async move { Ok(self.resolve_enabled(company_id)) })
    }
}
