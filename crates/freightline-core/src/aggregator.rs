//! Multi-carrier rate aggregation.
//!
//! [`RateAggregator::aggregate`] resolves the carriers enabled for a company,
//! rates one shared canonical request with every one of them concurrently,
//! and merges whatever succeeded into a single price-sorted list. A failing
//! carrier only ever contributes an entry to the error summary.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::task::JoinSet;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::adapters::{CanparAdapter, EShipPlusAdapter, PolarisAdapter};
use crate::config::{CarrierConfigProvider, CarrierDirectory, EnabledCarrier};
use crate::domain::{
    Address, CanonicalRateRequest, CanonicalRateResponse, FlexNumber, PackageItem, RateQuote,
    TimeWindow, UtcDateTime,
};
use crate::fields::{as_number, as_text, bool_at, first_present, lookup, number_at, one_or_many, text_at};
use crate::http_client::HttpClient;
use crate::rate_source::{CarrierAdapter, RateError};
use crate::{CarrierId, ValidationError};

const DEFAULT_WEIGHT: f64 = 1.0;
const DEFAULT_DIMENSION: f64 = 12.0;
const DEFAULT_QUANTITY: f64 = 1.0;
const DEFAULT_FREIGHT_CLASS: &str = "50";

/// Carrier -> adapter lookup table. Adding a carrier is a registration, not a branch.
#[derive(Clone, Default)]
pub struct CarrierRegistry {
    adapters: HashMap<CarrierId, Arc<dyn CarrierAdapter>>,
}

impl CarrierRegistry {
    pub fn new(adapters: Vec<Arc<dyn CarrierAdapter>>) -> Self {
        let adapters = adapters
            .into_iter()
            .map(|adapter| (adapter.id(), adapter))
            .collect();
        Self { adapters }
    }

    /// Registry with every built-in adapter sharing one transport and config provider.
    pub fn standard(
        http_client: Arc<dyn HttpClient>,
        config: Arc<dyn CarrierConfigProvider>,
    ) -> Self {
        Self::new(vec![
            Arc::new(CanparAdapter::new(http_client.clone(), config.clone())),
            Arc::new(EShipPlusAdapter::new(http_client.clone(), config.clone())),
            Arc::new(PolarisAdapter::new(http_client, config)),
        ])
    }

    pub fn get(&self, carrier: CarrierId) -> Option<Arc<dyn CarrierAdapter>> {
        self.adapters.get(&carrier).cloned()
    }
}

/// Aggregation input: the company whose carriers are queried and the shared canonical request.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateRequest {
    pub company_id: String,
    pub request: CanonicalRateRequest,
}

impl AggregateRequest {
    pub fn new(company_id: impl Into<String>, request: CanonicalRateRequest) -> Self {
        Self {
            company_id: company_id.into(),
            request,
        }
    }

    /// Parses `{companyId, originAddress, destinationAddress, packages[], shipmentInfo}`,
    /// accepting the field spellings callers actually send.
    pub fn from_value(payload: &Value) -> Result<Self, RateError> {
        if !payload.is_object() {
            return Err(ValidationError::MalformedPayload {
                reason: String::from("aggregate request must be a JSON object"),
            }
            .into());
        }

        let company_id = text_at(payload, &["companyId", "company_id"]).ok_or_else(|| {
            RateError::from(ValidationError::MissingField {
                field: String::from("companyId"),
            })
        })?;

        let packages = one_or_many(first_present(payload, &["packages", "items"]));
        if packages.is_empty() {
            return Err(ValidationError::EmptyItems.into());
        }

        let info = lookup(payload, "shipmentInfo").unwrap_or(&Value::Null);
        let request = CanonicalRateRequest {
            origin: address_from(first_present(payload, &["originAddress", "origin"])),
            destination: address_from(first_present(payload, &["destinationAddress", "destination"])),
            items: packages.into_iter().map(package_from).collect(),
            shipment_date: text_at(info, &["shipmentDate", "shipDate", "pickupDate"]).unwrap_or_default(),
            pickup_window: window_from(info, "pickupWindow", "earliestPickup", "latestPickup"),
            delivery_window: window_from(info, "deliveryWindow", "earliestDelivery", "latestDelivery"),
            booking_reference_number: text_at(info, &["bookingReferenceNumber", "referenceNumber"])
                .unwrap_or_default(),
            booking_reference_number_type: text_at(info, &["bookingReferenceNumberType"])
                .unwrap_or_default(),
            shipment_bill_type: text_at(info, &["shipmentBillType"]).unwrap_or_default(),
            service_type: number_at(info, &["serviceType"])
                .filter(|code| *code >= 1.0 && code.fract() == 0.0)
                .map(|code| code as u32),
            api_key: None,
        };

        Ok(Self::new(company_id, request))
    }
}

fn address_from(value: Option<&Value>) -> Address {
    let Some(value) = value else {
        return Address::default();
    };
    let text = |paths: &[&str]| text_at(value, paths).unwrap_or_default();

    Address {
        postal_code: text(&["zipPostal", "zip", "postalCode", "postal_code"]),
        city: text(&["city"]),
        state: text(&["stateProv", "state", "province"]),
        country: text(&["country", "countryCode"]),
        company: text(&["companyName", "company", "name"]),
        contact: text(&["contactName", "contact", "attention"]),
        phone: text(&["phone", "phoneNumber"]),
        email: text(&["email"]),
        street: text(&["street", "address1", "addressLine1"]),
        street2: text(&["street2", "address2", "addressLine2"]),
    }
}

/// Package fields with fallback defaults. Zero counts as missing; unparseable text is
/// passed on so the adapter reports it against the right item.
fn package_from(value: &Value) -> PackageItem {
    PackageItem {
        weight: number_or_default(value, &["weight"], DEFAULT_WEIGHT),
        length: number_or_default(value, &["length"], DEFAULT_DIMENSION),
        width: number_or_default(value, &["width"], DEFAULT_DIMENSION),
        height: number_or_default(value, &["height"], DEFAULT_DIMENSION),
        packaging_quantity: number_or_default(
            value,
            &["packagingQuantity", "quantity", "pieces"],
            DEFAULT_QUANTITY,
        ),
        declared_value: number_at(value, &["declaredValue"]).map(FlexNumber::Number),
        freight_class: Some(FlexNumber::Text(
            text_at(value, &["freightClass", "class"])
                .unwrap_or_else(|| DEFAULT_FREIGHT_CLASS.to_owned()),
        )),
        description: text_at(value, &["description"]),
        stackable: bool_at(value, &["stackable"]),
    }
}

fn number_or_default(value: &Value, paths: &[&str], default: f64) -> Option<FlexNumber> {
    let supplied = first_present(value, paths).map(|raw| match as_number(raw) {
        Some(number) => FlexNumber::Number(number),
        None => as_text(raw).map_or(FlexNumber::Number(default), FlexNumber::Text),
    });

    match supplied {
        Some(FlexNumber::Number(number)) if number == 0.0 => Some(FlexNumber::Number(default)),
        Some(other) => Some(other),
        None => Some(FlexNumber::Number(default)),
    }
}

fn window_from(info: &Value, nested: &str, earliest: &str, latest: &str) -> TimeWindow {
    let nested_earliest = format!("{nested}.earliest");
    let nested_latest = format!("{nested}.latest");
    let defaults = TimeWindow::default();
    TimeWindow::new(
        text_at(info, &[earliest, nested_earliest.as_str()]).unwrap_or(defaults.earliest),
        text_at(info, &[latest, nested_latest.as_str()]).unwrap_or(defaults.latest),
    )
}

/// Identity of the carrier a merged rate came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceCarrier {
    /// Enabled-carrier record id.
    pub id: String,
    pub system: String,
    pub name: String,
}

/// A rate annotated with its originating carrier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedRate {
    #[serde(flatten)]
    pub quote: RateQuote,
    pub source_carrier_system: String,
    pub source_carrier: SourceCarrier,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarrierFailure {
    pub carrier: String,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarrierResults {
    pub successful: usize,
    pub failed: usize,
    pub errors: Vec<CarrierFailure>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestInfo {
    pub request_id: String,
    pub company_id: String,
    pub carriers_queried: Vec<String>,
    pub timestamp: UtcDateTime,
}

/// Merged outcome of one aggregation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedRateResult {
    pub available_rates: Vec<AggregatedRate>,
    pub carrier_results: CarrierResults,
    pub request_info: RequestInfo,
}

/// Fans one request out to every enabled carrier and merges the results.
#[derive(Clone)]
pub struct RateAggregator {
    registry: Arc<CarrierRegistry>,
    directory: Arc<dyn CarrierDirectory>,
}

type Outcome = Result<CanonicalRateResponse, RateError>;

impl RateAggregator {
    pub fn new(registry: Arc<CarrierRegistry>, directory: Arc<dyn CarrierDirectory>) -> Self {
        Self {
            registry,
            directory,
        }
    }

    pub async fn aggregate(&self, request: AggregateRequest) -> Result<AggregatedRateResult, RateError> {
        let request_id = Uuid::new_v4().to_string();
        let span = info_span!("aggregate", request_id = %request_id, company_id = %request.company_id);
        self.run(request_id, request).instrument(span).await
    }

    async fn run(
        &self,
        request_id: String,
        request: AggregateRequest,
    ) -> Result<AggregatedRateResult, RateError> {
        let enabled = self.directory.enabled_carriers(&request.company_id).await?;
        if enabled.is_empty() {
            return Err(RateError::failed_precondition(format!(
                "No carriers enabled for company {}",
                request.company_id
            )));
        }

        let mut outcomes: Vec<Option<Outcome>> = vec![None; enabled.len()];
        let mut tasks = JoinSet::new();

        for (index, record) in enabled.iter().enumerate() {
            let key = record.carrier_key.trim().to_ascii_uppercase();
            let adapter = key
                .parse::<CarrierId>()
                .ok()
                .and_then(|carrier| self.registry.get(carrier));

            let Some(adapter) = adapter else {
                outcomes[index] = Some(Err(RateError::failed_precondition(format!(
                    "Carrier {key} is not supported"
                ))));
                continue;
            };

            let shared = request.request.clone();
            let span = info_span!("carrier", carrier = %adapter.id(), record = %record.id);
            tasks.spawn(
                async move {
                    let outcome = adapter.get_rates(shared).await;
                    (index, outcome)
                }
                .instrument(span),
            );
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, outcome)) => outcomes[index] = Some(outcome),
                Err(error) => warn!(error = %error, "carrier task did not complete"),
            }
        }

        let result = merge(request_id, &request.company_id, &enabled, outcomes);
        info!(
            successful = result.carrier_results.successful,
            failed = result.carrier_results.failed,
            rates = result.available_rates.len(),
            "aggregation completed"
        );
        Ok(result)
    }
}

fn merge(
    request_id: String,
    company_id: &str,
    enabled: &[EnabledCarrier],
    outcomes: Vec<Option<Outcome>>,
) -> AggregatedRateResult {
    let mut available_rates = Vec::new();
    let mut errors = Vec::new();
    let mut successful = 0;

    for (record, outcome) in enabled.iter().zip(outcomes) {
        let system = record.carrier_key.trim().to_ascii_uppercase();
        match outcome {
            Some(Ok(response)) => {
                successful += 1;
                let source = SourceCarrier {
                    id: record.id.clone(),
                    system: system.clone(),
                    name: record.name.clone(),
                };
                available_rates.extend(response.available_rates.into_iter().map(|quote| {
                    AggregatedRate {
                        quote,
                        source_carrier_system: system.clone(),
                        source_carrier: source.clone(),
                    }
                }));
            }
            Some(Err(error)) => {
                warn!(carrier = %system, record = %record.id, error = %error, "carrier rating failed");
                errors.push(CarrierFailure {
                    carrier: record.id.clone(),
                    error: error.message().to_owned(),
                });
            }
            None => errors.push(CarrierFailure {
                carrier: record.id.clone(),
                error: format!("{system} rate call did not complete"),
            }),
        }
    }

    sort_by_price(&mut available_rates);

    AggregatedRateResult {
        available_rates,
        carrier_results: CarrierResults {
            successful,
            failed: errors.len(),
            errors,
        },
        request_info: RequestInfo {
            request_id,
            company_id: company_id.to_owned(),
            carriers_queried: enabled
                .iter()
                .map(|record| record.carrier_key.trim().to_ascii_uppercase())
                .collect(),
            timestamp: UtcDateTime::now(),
        },
    }
}

/// Ascending by total. Unpriced rates go last and keep their relative order.
pub fn sort_by_price(rates: &mut [AggregatedRate]) {
    rates.sort_by(|left, right| compare_price(left.quote.priced_total(), right.quote.priced_total()));
}

fn compare_price(left: Option<f64>, right: Option<f64>) -> Ordering {
    match (left, right) {
        (Some(left), Some(right)) => left.total_cmp(&right),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
