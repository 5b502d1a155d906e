//! Polaris Transportation REST rating adapter.
//!
//! Polaris authenticates with an `APIKey` query parameter, so the request URL
//! carries a credential and is only ever logged without its query string.

use std::sync::Arc;

use serde_json::{json, Value};

use crate::adapters::common::{
    classify_http_status, execute_carrier_call, json_error_message, require_field, resolve_items,
    synthesize_quote_id, FieldRule, ItemRules,
};
use crate::config::{ApiOperation, CarrierConfigProvider};
use crate::domain::{
    currency_or, format_date, parse_date_prefix, push_charge, Address, CanonicalRateRequest,
    CanonicalRateResponse, NormalizedItem, RateQuote, TimeWindow, UtcDateTime,
};
use crate::fields::{lookup, number_at, one_or_many, text_at};
use crate::http_client::{HttpAuth, HttpClient, HttpRequest, HttpResponse};
use crate::rate_source::{CarrierAdapter, RateError, RateFuture};
use crate::CarrierId;

pub const REQUEST_TIMEOUT_MS: u64 = 30_000;

/// Transit days assumed when the carrier omits `ServiceDays`.
pub const DEFAULT_TRANSIT_DAYS: u32 = 5;

const INVALID_API_KEY: &str = "INVALID API KEY";

const ITEM_RULES: ItemRules = ItemRules {
    weight: FieldRule::Required,
    length: FieldRule::DefaultTo(48.0),
    width: FieldRule::DefaultTo(48.0),
    height: FieldRule::DefaultTo(40.0),
    quantity: FieldRule::DefaultTo(1.0),
    declared_value: FieldRule::Optional(0.0),
    require_freight_class: false,
    max_quantity: u32::MAX,
};

/// Canonical request after Polaris validation and skid defaulting.
#[derive(Debug, Clone, PartialEq)]
pub struct PolarisShipment {
    pub origin: Address,
    pub destination: Address,
    pub items: Vec<NormalizedItem>,
    pub shipment_date: String,
    pub pickup_window: TimeWindow,
    pub delivery_window: TimeWindow,
    pub booking_reference: String,
    pub booking_reference_type: String,
    pub shipment_bill_type: String,
}

impl PolarisShipment {
    /// Weight of every skid times its piece count.
    pub fn total_weight(&self) -> f64 {
        self.items
            .iter()
            .map(|item| item.weight * f64::from(item.packaging_quantity))
            .sum()
    }
}

/// Validates a canonical request for Polaris. Only postal codes and weights are mandatory.
pub fn validate_request(req: &CanonicalRateRequest) -> Result<PolarisShipment, RateError> {
    require_field(&req.origin.postal_code, "origin postal code")?;
    require_field(&req.destination.postal_code, "destination postal code")?;
    let items = resolve_items(&req.items, &ITEM_RULES)?;

    let shipment_date = if req.shipment_date.trim().is_empty() {
        UtcDateTime::now().date_string()
    } else {
        format_date(parse_date_prefix(&req.shipment_date)?)
    };

    Ok(PolarisShipment {
        origin: req.origin.clone(),
        destination: req.destination.clone(),
        items,
        shipment_date,
        pickup_window: req.pickup_window.clone(),
        delivery_window: req.delivery_window.clone(),
        booking_reference: req.booking_reference_number.clone(),
        booking_reference_type: req.booking_reference_number_type.clone(),
        shipment_bill_type: req.shipment_bill_type.clone(),
    })
}

/// Builds the nested `RateRequest` body.
pub fn build_request_body(shipment: &PolarisShipment) -> Value {
    let skids = shipment
        .items
        .iter()
        .map(|item| {
            json!({
                "Pieces": item.packaging_quantity,
                "Weight": item.weight,
                "Length": item.length,
                "Width": item.width,
                "Height": item.height,
                "Description": item.description.clone().unwrap_or_default(),
                "Declared_Value": item.declared_value,
            })
        })
        .collect::<Vec<_>>();

    json!({
        "RateRequest": {
            "Origin": place(&shipment.origin),
            "Destination": place(&shipment.destination),
            "Shipment_Date": shipment.shipment_date,
            "Weight_Unit": "LBS",
            "Dimension_Unit": "IN",
            "Total_Weight": shipment.total_weight(),
            "Skids": skids,
        }
    })
}

fn place(address: &Address) -> Value {
    json!({
        "PostalCode": address.compact_postal_code(),
        "City": address.city,
        "Province": address.state,
        "Country": address.country,
    })
}

/// Classifies a Polaris HTTP response and returns the rate payload, unwrapped from `Rate_API_Response` when present.
pub fn classify_response(response: &HttpResponse) -> Result<Value, RateError> {
    let carrier = CarrierId::Polaristransportation;
    let parsed = serde_json::from_str::<Value>(&response.body);

    classify_http_status(
        carrier,
        response,
        parsed.as_ref().ok().and_then(json_error_message),
    )?;

    let body = parsed.map_err(|error| {
        RateError::transport(format!("Polaris returned an unreadable response: {error}"))
            .for_carrier(carrier)
    })?;
    let payload = lookup(&body, "Rate_API_Response").unwrap_or(&body).clone();

    let message = text_at(&payload, &["Message"]);
    let flagged = text_at(&payload, &["Error"]).is_some_and(|flag| flag.eq_ignore_ascii_case("Y"));
    let bad_key = message
        .as_deref()
        .is_some_and(|text| text.eq_ignore_ascii_case(INVALID_API_KEY));

    if flagged || bad_key {
        let detail = message.unwrap_or_else(|| String::from("request rejected without a message"));
        return Err(RateError::business(format!("Polaris API error: {detail}")).for_carrier(carrier));
    }

    Ok(payload)
}

/// Maps the rate payload into the canonical response.
///
/// A rate is built only when `Error` is `N` and `Total_Charge` is positive;
/// anything else yields an empty rate list.
pub fn normalize_response(payload: &Value, shipment: &PolarisShipment) -> CanonicalRateResponse {
    let quotable = text_at(payload, &["Error"]).is_some_and(|flag| flag.eq_ignore_ascii_case("N"))
        && number_at(payload, &["Total_Charge"]).is_some_and(|total| total > 0.0);

    let available_rates = if quotable {
        vec![rate_from_payload(payload, shipment)]
    } else {
        Vec::new()
    };

    CanonicalRateResponse {
        booking_reference: shipment.booking_reference.clone(),
        booking_reference_type: shipment.booking_reference_type.clone(),
        shipment_bill_type: shipment.shipment_bill_type.clone(),
        shipment_date: shipment.shipment_date.clone(),
        pickup_window: shipment.pickup_window.clone(),
        delivery_window: shipment.delivery_window.clone(),
        origin: shipment.origin.clone(),
        destination: shipment.destination.clone(),
        items: shipment.items.clone(),
        available_rates,
    }
}

fn rate_from_payload(payload: &Value, shipment: &PolarisShipment) -> RateQuote {
    let carrier = CarrierId::Polaristransportation;
    let freight_charges = number_at(payload, &["Freight_Charge", "Base_Charge"]).unwrap_or(0.0);
    let fuel_charges = number_at(payload, &["Fuel_Surcharge", "Fuel_Charge"]).unwrap_or(0.0);

    let mut billing_details = Vec::new();
    push_charge(&mut billing_details, "Freight", Some(freight_charges), Some("Freight"));
    push_charge(&mut billing_details, "Fuel Surcharge", Some(fuel_charges), Some("Fuel"));

    let mut accessorial_charges = 0.0;
    for service in one_or_many(lookup(payload, "Additional_Services")) {
        let amount = number_at(service, &["Charge", "Amount"]).unwrap_or(0.0);
        if amount == 0.0 {
            continue;
        }
        accessorial_charges += amount;
        let name = text_at(service, &["Description", "Service", "Name", "Code"])
            .unwrap_or_else(|| String::from("Additional Service"));
        push_charge(&mut billing_details, name, Some(amount), Some("Accessorial"));
    }

    push_charge(
        &mut billing_details,
        text_at(payload, &["Tax_Code"]).unwrap_or_else(|| String::from("Tax")),
        number_at(payload, &["Tax_Charge"]),
        Some("Tax"),
    );

    let billed_weight = number_at(payload, &["Billed_Weight", "Total_Weight"])
        .unwrap_or_else(|| shipment.total_weight());

    RateQuote {
        quote_id: text_at(payload, &["Quote_Number", "Quote_ID"])
            .unwrap_or_else(|| synthesize_quote_id(carrier)),
        carrier_name: carrier.display_name().to_owned(),
        carrier_scac: text_at(payload, &["SCAC"]).unwrap_or_else(|| String::from("PLRS")),
        carrier_key: carrier.as_str().to_owned(),
        service_mode: String::from("LTL"),
        service_type: text_at(payload, &["Service_Type", "Service"])
            .unwrap_or_else(|| String::from("Standard")),
        transit_time: number_at(payload, &["ServiceDays"])
            .filter(|days| *days >= 0.0)
            .map_or(DEFAULT_TRANSIT_DAYS, |days| days.round() as u32),
        estimated_delivery_date: text_at(payload, &["Delivery_Date", "Estimated_Delivery_Date"])
            .and_then(|raw| parse_date_prefix(&raw).ok())
            .map(format_date),
        guaranteed_service: false,
        guarantee_charge: 0.0,
        freight_charges,
        fuel_charges,
        service_charges: 0.0,
        accessorial_charges,
        total_charges: number_at(payload, &["Total_Charge"]).unwrap_or(0.0),
        currency: currency_or(
            text_at(payload, &["Currency"]).as_deref(),
            carrier.default_currency(),
        ),
        billing_details,
        billed_weight,
        rated_weight: number_at(payload, &["Rated_Weight"]).unwrap_or(billed_weight),
    }
}

/// Polaris Transportation REST rating adapter.
#[derive(Clone)]
pub struct PolarisAdapter {
    http_client: Arc<dyn HttpClient>,
    config: Arc<dyn CarrierConfigProvider>,
}

impl PolarisAdapter {
    pub fn new(http_client: Arc<dyn HttpClient>, config: Arc<dyn CarrierConfigProvider>) -> Self {
        Self {
            http_client,
            config,
        }
    }

    async fn rate(&self, req: CanonicalRateRequest) -> Result<CanonicalRateResponse, RateError> {
        let carrier = CarrierId::Polaristransportation;
        let shipment = validate_request(&req)?;
        let body = build_request_body(&shipment);

        let config = self
            .config
            .carrier_api_config(carrier, ApiOperation::Rate)
            .await?;
        let api_url = config.require_api_url(carrier)?;
        let auth = HttpAuth::QueryParam {
            name: String::from("APIKey"),
            value: config.require_credential(carrier, &["apiKey", "secret"])?.to_owned(),
        };

        let request = HttpRequest::post(api_url)
            .with_auth(&auth)
            .with_header("Content-Type", "application/json")
            .with_header("Accept", "application/json")
            .with_body(body.to_string())
            .with_timeout_ms(REQUEST_TIMEOUT_MS);

        let response = execute_carrier_call(self.http_client.as_ref(), carrier, request).await?;
        let payload = classify_response(&response)?;
        let normalized = normalize_response(&payload, &shipment);

        if normalized.available_rates.is_empty() {
            return Err(RateError::no_rates(carrier));
        }
        Ok(normalized)
    }
}

impl CarrierAdapter for PolarisAdapter {
    fn id(&self) -> CarrierId {
        CarrierId::Polaristransportation
    }

    fn get_rates<'a>(&'a self, req: CanonicalRateRequest) -> RateFuture<'a, CanonicalRateResponse> {
        Box::pin(self.rate(req))
    }
}
