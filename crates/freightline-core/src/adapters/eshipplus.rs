//! eShipPlus REST rating adapter.
//!
//! The carrier's rate payload is already a list of priced options, so
//! normalization is mostly a field rename with `Costs.*` fallbacks.

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde_json::{json, Map, Value};

use crate::adapters::common::{
    classify_http_status, execute_carrier_call, json_error_message, require_field, resolve_items,
    synthesize_quote_id, FieldRule, ItemRules,
};
use crate::config::{ApiOperation, CarrierApiConfig, CarrierConfigProvider};
use crate::domain::{
    currency_or, format_date, parse_date_prefix, push_charge, Address, CanonicalRateRequest,
    CanonicalRateResponse, NormalizedItem, RateQuote, TimeWindow, UtcDateTime,
};
use crate::fields::{as_number, bool_at, lookup, number_at, one_or_many, text_at};
use crate::http_client::{HttpAuth, HttpClient, HttpRequest, HttpResponse};
use crate::rate_source::{CarrierAdapter, RateError, RateFuture};
use crate::CarrierId;

pub const REQUEST_TIMEOUT_MS: u64 = 30_000;

const AUTH_HEADER: &str = "eShipPlusAuth";

const BOOKING_REFERENCE_TYPES: &[(i64, &str)] = &[(2, "Shipment")];
const SHIPMENT_BILL_TYPES: &[(i64, &str)] = &[(0, "DefaultLogisticsPlus")];
const DEFAULT_BOOKING_REFERENCE_TYPE: i64 = 2;
const DEFAULT_SHIPMENT_BILL_TYPE: i64 = 0;

const ITEM_RULES: ItemRules = ItemRules {
    weight: FieldRule::Required,
    length: FieldRule::Required,
    width: FieldRule::Required,
    height: FieldRule::Required,
    quantity: FieldRule::DefaultTo(1.0),
    declared_value: FieldRule::Optional(0.0),
    require_freight_class: true,
    max_quantity: u32::MAX,
};

/// Canonical request after eShipPlus validation.
#[derive(Debug, Clone, PartialEq)]
pub struct EShipPlusShipment {
    pub origin: Address,
    pub destination: Address,
    pub items: Vec<NormalizedItem>,
    pub shipment_date: String,
    pub pickup_window: TimeWindow,
    pub delivery_window: TimeWindow,
    pub booking_reference: String,
    pub booking_reference_type: i64,
    pub shipment_bill_type: i64,
}

/// Validates a canonical request for eShipPlus, which needs complete addresses and fully described items.
pub fn validate_request(req: &CanonicalRateRequest) -> Result<EShipPlusShipment, RateError> {
    for (label, address) in [("origin", &req.origin), ("destination", &req.destination)] {
        require_field(&address.postal_code, &format!("{label} postal code"))?;
        require_field(&address.street, &format!("{label} street"))?;
        require_field(&address.city, &format!("{label} city"))?;
        require_field(&address.state, &format!("{label} state"))?;
        require_field(&address.country, &format!("{label} country"))?;
        require_field(&address.contact, &format!("{label} contact"))?;
    }
    let items = resolve_items(&req.items, &ITEM_RULES)?;

    let shipment_date = if req.shipment_date.trim().is_empty() {
        UtcDateTime::now().date_string()
    } else {
        format_date(parse_date_prefix(&req.shipment_date)?)
    };

    Ok(EShipPlusShipment {
        origin: req.origin.clone(),
        destination: req.destination.clone(),
        items,
        shipment_date,
        pickup_window: req.pickup_window.or_default_bounds(&TimeWindow::default()),
        delivery_window: req.delivery_window.or_default_bounds(&TimeWindow::default()),
        booking_reference: req.booking_reference_number.trim().to_owned(),
        booking_reference_type: enum_code(
            &req.booking_reference_number_type,
            BOOKING_REFERENCE_TYPES,
            DEFAULT_BOOKING_REFERENCE_TYPE,
        ),
        shipment_bill_type: enum_code(
            &req.shipment_bill_type,
            SHIPMENT_BILL_TYPES,
            DEFAULT_SHIPMENT_BILL_TYPE,
        ),
    })
}

/// Builds the flat JSON rate body.
pub fn build_request_body(shipment: &EShipPlusShipment) -> Value {
    let items = shipment
        .items
        .iter()
        .map(|item| {
            json!({
                "Weight": item.weight,
                "PackagingQuantity": item.packaging_quantity,
                "Length": item.length,
                "Width": item.width,
                "Height": item.height,
                "FreightClass": freight_class_value(item.freight_class.as_deref()),
                "Description": item.description.clone().unwrap_or_default(),
                "DeclaredValue": item.declared_value,
                "Stackable": item.stackable,
            })
        })
        .collect::<Vec<_>>();

    json!({
        "Origin": location(&shipment.origin),
        "Destination": location(&shipment.destination),
        "Items": items,
        "ShipmentDate": format!("{}T00:00:00", shipment.shipment_date),
        "EarliestPickup": { "Time": shipment.pickup_window.earliest },
        "LatestPickup": { "Time": shipment.pickup_window.latest },
        "EarliestDelivery": { "Time": shipment.delivery_window.earliest },
        "LatestDelivery": { "Time": shipment.delivery_window.latest },
        "BookingReferenceNumber": shipment.booking_reference,
        "BookingReferenceNumberType": shipment.booking_reference_type,
        "ShipmentBillType": shipment.shipment_bill_type,
    })
}

fn location(address: &Address) -> Value {
    json!({
        "Description": address.company,
        "Street": address.street,
        "StreetExtra": address.street2,
        "PostalCode": address.postal_code.trim(),
        "City": address.city,
        "State": address.state,
        "Country": { "Code": address.country.trim().to_ascii_uppercase() },
        "Contact": address.contact,
        "Phone": address.phone,
        "Email": address.email,
    })
}

fn freight_class_value(class: Option<&str>) -> Value {
    match class {
        Some(raw) => raw
            .trim()
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map_or_else(|| Value::String(raw.trim().to_owned()), Value::Number),
        None => Value::Null,
    }
}

/// `eShipPlusAuth` header value: the stored value verbatim, or base64 of the credential object.
pub fn auth_header_value(config: &CarrierApiConfig) -> Result<String, RateError> {
    if let Some(token) = config.credential(&[AUTH_HEADER, "authToken"]) {
        return Ok(token.to_owned());
    }

    let carrier = CarrierId::Eshipplus;
    let mut fields = Map::new();
    for (stored, wire) in [
        ("accessCode", "AccessCode"),
        ("username", "Username"),
        ("password", "Password"),
        ("accessKey", "AccessKey"),
    ] {
        let value = config.require_credential(carrier, &[stored])?;
        fields.insert(wire.to_owned(), Value::String(value.to_owned()));
    }

    Ok(STANDARD.encode(Value::Object(fields).to_string()))
}

/// Classifies an eShipPlus HTTP response and returns the parsed body on success.
pub fn classify_response(response: &HttpResponse) -> Result<Value, RateError> {
    let carrier = CarrierId::Eshipplus;
    let parsed = serde_json::from_str::<Value>(&response.body);

    classify_http_status(
        carrier,
        response,
        parsed.as_ref().ok().and_then(json_error_message),
    )?;

    let body = parsed.map_err(|error| {
        RateError::transport(format!("eShipPlus returned an unreadable response: {error}"))
            .for_carrier(carrier)
    })?;

    if bool_at(&body, &["ContainsErrorMessage"]).unwrap_or(false) {
        let detail = json_error_message(&body)
            .unwrap_or_else(|| String::from("request rejected without a message"));
        return Err(RateError::business(format!("eShipPlus API error: {detail}")).for_carrier(carrier));
    }

    Ok(body)
}

/// Maps the carrier body into the canonical response, preserving rate order.
pub fn normalize_response(body: &Value, shipment: &EShipPlusShipment) -> CanonicalRateResponse {
    let available_rates = one_or_many(lookup(body, "AvailableRates"))
        .into_iter()
        .map(rate_from_value)
        .collect();

    CanonicalRateResponse {
        booking_reference: text_at(body, &["BookingReferenceNumber"])
            .unwrap_or_else(|| shipment.booking_reference.clone()),
        booking_reference_type: enum_label(
            lookup(body, "BookingReferenceNumberType"),
            BOOKING_REFERENCE_TYPES,
            shipment.booking_reference_type,
        ),
        shipment_bill_type: enum_label(
            lookup(body, "ShipmentBillType"),
            SHIPMENT_BILL_TYPES,
            shipment.shipment_bill_type,
        ),
        shipment_date: text_at(body, &["ShipmentDate"])
            .and_then(|raw| parse_date_prefix(&raw).ok())
            .map_or_else(|| shipment.shipment_date.clone(), format_date),
        pickup_window: shipment.pickup_window.clone(),
        delivery_window: shipment.delivery_window.clone(),
        origin: shipment.origin.clone(),
        destination: shipment.destination.clone(),
        items: shipment.items.clone(),
        available_rates,
    }
}

fn rate_from_value(rate: &Value) -> RateQuote {
    let carrier = CarrierId::Eshipplus;
    let charge = |name: &str| {
        let nested = format!("Costs.{name}");
        number_at(rate, &[name, nested.as_str()]).unwrap_or(0.0)
    };

    let freight_charges = charge("FreightCharges");
    let fuel_charges = charge("FuelCharges");
    let service_charges = charge("ServiceCharges");
    let accessorial_charges = charge("AccessorialCharges");

    let mut billing_details = one_or_many(lookup(rate, "BillingDetails"))
        .into_iter()
        .filter_map(|detail| {
            let amount = number_at(detail, &["AmountDue", "Amount"])?;
            let name = text_at(detail, &["Description", "Name"])?;
            Some((name, amount, text_at(detail, &["Category", "Type"])))
        })
        .fold(Vec::new(), |mut details, (name, amount, kind)| {
            push_charge(&mut details, name, Some(amount), kind.as_deref());
            details
        });

    if billing_details.is_empty() {
        push_charge(&mut billing_details, "Freight", Some(freight_charges), Some("Freight"));
        push_charge(&mut billing_details, "Fuel Surcharge", Some(fuel_charges), Some("Fuel"));
        push_charge(&mut billing_details, "Service", Some(service_charges), Some("Service"));
        push_charge(
            &mut billing_details,
            "Accessorials",
            Some(accessorial_charges),
            Some("Accessorial"),
        );
    }

    let billed_weight = number_at(rate, &["BilledWeight"]).unwrap_or(0.0);

    RateQuote {
        quote_id: text_at(rate, &["QuoteId", "RateId"])
            .unwrap_or_else(|| synthesize_quote_id(carrier)),
        carrier_name: text_at(rate, &["CarrierName", "Carrier.Name"])
            .unwrap_or_else(|| carrier.display_name().to_owned()),
        carrier_scac: text_at(rate, &["CarrierScac", "Scac", "Carrier.Scac"]).unwrap_or_default(),
        carrier_key: text_at(rate, &["CarrierKey"]).unwrap_or_else(|| carrier.as_str().to_owned()),
        service_mode: text_at(rate, &["ServiceMode", "Mode"]).unwrap_or_else(|| String::from("LTL")),
        service_type: text_at(rate, &["ServiceType", "ServiceLevel"])
            .unwrap_or_else(|| String::from("Standard")),
        transit_time: number_at(rate, &["TransitTime", "TransitDays"])
            .filter(|days| *days >= 0.0)
            .map_or(0, |days| days.round() as u32),
        estimated_delivery_date: text_at(rate, &["EstimatedDeliveryDate"])
            .and_then(|raw| parse_date_prefix(&raw).ok())
            .map(format_date),
        guaranteed_service: bool_at(rate, &["GuaranteedService", "IsGuaranteed"]).unwrap_or(false),
        guarantee_charge: charge("GuaranteeCharge"),
        freight_charges,
        fuel_charges,
        service_charges,
        accessorial_charges,
        total_charges: charge("TotalCharges"),
        currency: currency_or(
            text_at(rate, &["Currency", "Costs.Currency"]).as_deref(),
            carrier.default_currency(),
        ),
        billing_details,
        billed_weight,
        rated_weight: number_at(rate, &["RatedWeight"]).unwrap_or(billed_weight),
    }
}

/// Caller's enum spelling to the carrier's integer code: known label, numeric passthrough, else default.
fn enum_code(raw: &str, known: &[(i64, &str)], default: i64) -> i64 {
    let trimmed = raw.trim();
    known
        .iter()
        .find(|(_, label)| label.eq_ignore_ascii_case(trimmed))
        .map(|(code, _)| *code)
        .or_else(|| trimmed.parse::<i64>().ok())
        .unwrap_or(default)
}

/// Carrier integer code back to its label; unknown integers pass through as text.
fn enum_label(value: Option<&Value>, known: &[(i64, &str)], fallback: i64) -> String {
    let code = match value {
        Some(Value::String(text)) if text.trim().parse::<i64>().is_err() => {
            return text.trim().to_owned();
        }
        Some(other) => as_number(other).map_or(fallback, |number| number as i64),
        None => fallback,
    };
    known
        .iter()
        .find(|(known_code, _)| *known_code == code)
        .map_or_else(|| code.to_string(), |(_, label)| (*label).to_owned())
}

/// eShipPlus REST rating adapter.
#[derive(Clone)]
pub struct EShipPlusAdapter {
    http_client: Arc<dyn HttpClient>,
    config: Arc<dyn CarrierConfigProvider>,
}

impl EShipPlusAdapter {
    pub fn new(http_client: Arc<dyn HttpClient>, config: Arc<dyn CarrierConfigProvider>) -> Self {
        Self {
            http_client,
            config,
        }
    }

    async fn rate(&self, req: CanonicalRateRequest) -> Result<CanonicalRateResponse, RateError> {
        let carrier = CarrierId::Eshipplus;
        let shipment = validate_request(&req)?;
        let body = build_request_body(&shipment);

        let config = self
            .config
            .carrier_api_config(carrier, ApiOperation::Rate)
            .await?;
        let api_url = config.require_api_url(carrier)?;
        let auth = HttpAuth::Header {
            name: AUTH_HEADER.to_owned(),
            value: auth_header_value(&config)?,
        };

        let request = HttpRequest::post(api_url)
            .with_header("Content-Type", "application/json")
            .with_auth(&auth)
            .with_body(body.to_string())
            .with_timeout_ms(REQUEST_TIMEOUT_MS);

        let response = execute_carrier_call(self.http_client.as_ref(), carrier, request).await?;
        let parsed = classify_response(&response)?;
        let normalized = normalize_response(&parsed, &shipment);

        if normalized.available_rates.is_empty() {
            return Err(RateError::no_rates(carrier));
        }
        Ok(normalized)
    }
}

impl CarrierAdapter for EShipPlusAdapter {
    fn id(&self) -> CarrierId {
        CarrierId::Eshipplus
    }

    fn get_rates<'a>(&'a self, req: CanonicalRateRequest) -> RateFuture<'a, CanonicalRateResponse> {
        Box::pin(self.rate(req))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RatingConfig;
    use crate::domain::{BillingDetail, PackageItem};
    use crate::http_client::CannedHttpClient;
    use crate::rate_source::{ErrorStatus, RateErrorKind};

    fn full_address(postal: &str) -> Address {
        Address {
            postal_code: postal.to_owned(),
            city: String::from("Columbus"),
            state: String::from("OH"),
            country: String::from("us"),
            company: String::from("Acme"),
            contact: String::from("Dana"),
            street: String::from("1 Main St"),
            ..Address::default()
        }
    }

    fn request() -> CanonicalRateRequest {
        CanonicalRateRequest::new(
            full_address("43215"),
            full_address("60601"),
            vec![
                PackageItem::new(500.0, 48.0, 40.0, 30.0).with_freight_class("70"),
                PackageItem::new(120.0, 20.0, 20.0, 20.0)
                    .with_freight_class("92.5")
                    .with_quantity(2),
            ],
        )
        .with_shipment_date("2026-10-20")
    }

    fn config() -> Arc<RatingConfig> {
        Arc::new(RatingConfig::default().with_carrier(
            CarrierId::Eshipplus,
            ApiOperation::Rate,
            CarrierApiConfig::new("https://eship.test/rate").with_credential(AUTH_HEADER, "token-1"),
        ))
    }

    #[test]
    fn missing_contact_is_named_in_the_error() {
        let mut req = request();
        req.destination.contact.clear();
        let error = validate_request(&req).expect_err("contact required");
        assert_eq!(error.message(), "Missing destination contact");
        assert_eq!(error.kind(), RateErrorKind::Validation);
    }

    #[test]
    fn missing_freight_class_names_the_item() {
        let mut req = request();
        req.items[1].freight_class = None;
        let error = validate_request(&req).expect_err("class required");
        assert_eq!(error.message(), "Invalid Freight Class for item 2");
    }

    #[test]
    fn enum_spellings_map_to_carrier_codes() {
        assert_eq!(enum_code("Shipment", BOOKING_REFERENCE_TYPES, 2), 2);
        assert_eq!(enum_code("5", BOOKING_REFERENCE_TYPES, 2), 5);
        assert_eq!(enum_code("", SHIPMENT_BILL_TYPES, 0), 0);
        assert_eq!(enum_label(Some(&json!(2)), BOOKING_REFERENCE_TYPES, 2), "Shipment");
        assert_eq!(enum_label(Some(&json!(0)), SHIPMENT_BILL_TYPES, 0), "DefaultLogisticsPlus");
        assert_eq!(enum_label(Some(&json!(3)), SHIPMENT_BILL_TYPES, 0), "3");
    }

    #[test]
    fn body_is_flat_json_with_time_windows() {
        let shipment = validate_request(&request()).expect("valid");
        let body = build_request_body(&shipment);

        assert_eq!(body["Origin"]["Country"]["Code"], "US");
        assert_eq!(body["Items"].as_array().map(Vec::len), Some(2));
        assert_eq!(body["Items"][1]["PackagingQuantity"], 2);
        assert_eq!(body["Items"][1]["FreightClass"], 92.5);
        assert_eq!(body["EarliestPickup"]["Time"], "09:00");
        assert_eq!(body["ShipmentDate"], "2026-10-20T00:00:00");
        assert_eq!(body["BookingReferenceNumberType"], 2);
    }

    #[test]
    fn auth_header_is_encoded_from_credential_parts() {
        let config = CarrierApiConfig::new("https://eship.test")
            .with_credential("accessCode", "AC")
            .with_credential("username", "u")
            .with_credential("password", "p")
            .with_credential("accessKey", "key");
        let header = auth_header_value(&config).expect("complete credentials");
        let decoded = STANDARD.decode(header).expect("base64");
        let value: Value = serde_json::from_slice(&decoded).expect("json");
        assert_eq!(value["AccessCode"], "AC");
        assert_eq!(value["AccessKey"], "key");

        let partial = CarrierApiConfig::new("https://eship.test").with_credential("username", "u");
        assert_eq!(
            auth_header_value(&partial).expect_err("incomplete").kind(),
            RateErrorKind::Configuration
        );
    }

    #[test]
    fn error_flag_is_a_business_failure() {
        let body = json!({
            "ContainsErrorMessage": true,
            "Messages": [{"Text": "Invalid access key"}]
        });
        let error = classify_response(&HttpResponse::ok(body.to_string())).expect_err("flagged");
        assert_eq!(error.kind(), RateErrorKind::Business);
        assert_eq!(error.status(), ErrorStatus::FailedPrecondition);
        assert!(error.message().contains("Invalid access key"));
    }

    #[test]
    fn http_error_prefers_carrier_message() {
        let response = HttpResponse::new(400, json!({"ErrorMessage": "bad postal code"}).to_string());
        let error = classify_response(&response).expect_err("400");
        assert_eq!(error.kind(), RateErrorKind::Transport);
        assert!(error.message().contains("400"));
        assert!(error.message().contains("bad postal code"));
    }

    #[test]
    fn charges_fall_back_to_costs_and_details_are_rebuilt() {
        let shipment = validate_request(&request()).expect("valid");
        let body = json!({
            "BookingReferenceNumberType": 2,
            "ShipmentBillType": 0,
            "AvailableRates": [{
                "CarrierName": "Estes",
                "CarrierScac": "EXLA",
                "TransitTime": "3",
                "Costs": {"FreightCharges": 200.0, "FuelCharges": 30.5, "TotalCharges": 230.5}
            }]
        });

        let normalized = normalize_response(&body, &shipment);
        let rate = &normalized.available_rates[0];
        assert_eq!(normalized.booking_reference_type, "Shipment");
        assert_eq!(normalized.shipment_bill_type, "DefaultLogisticsPlus");
        assert_eq!(rate.freight_charges, 200.0);
        assert_eq!(rate.total_charges, 230.5);
        assert_eq!(rate.transit_time, 3);
        assert_eq!(rate.currency, "USD");
        assert_eq!(
            rate.billing_details.iter().map(|d| d.name.as_str()).collect::<Vec<_>>(),
            vec!["Freight", "Fuel Surcharge"]
        );
    }

    #[test]
    fn carrier_billing_details_are_kept_as_sent() {
        let shipment = validate_request(&request()).expect("valid");
        let body = json!({"AvailableRates": [{
            "TotalCharges": 99.0,
            "Currency": "cad",
            "BillingDetails": [
                {"Description": "Line Haul", "AmountDue": 90.0, "Category": "Freight"},
                {"Description": "Fuel", "AmountDue": "9.00", "Category": "Fuel"}
            ]
        }]});
        let rate = &normalize_response(&body, &shipment).available_rates[0];
        assert_eq!(rate.currency, "CAD");
        assert_eq!(rate.billing_details[0], BillingDetail::new("Line Haul", 90.0).with_kind("Freight"));
        assert_eq!(rate.billing_details[1].amount, 9.0);
    }

    #[tokio::test]
    async fn end_to_end_preserves_every_rate_in_order() {
        let body = json!({
            "ContainsErrorMessage": false,
            "AvailableRates": [
                {"QuoteId": "q-1", "TotalCharges": 310.0},
                {"QuoteId": "q-2", "TotalCharges": 280.0},
                {"QuoteId": "q-3", "TotalCharges": 295.0}
            ]
        });
        let client = Arc::new(CannedHttpClient::responding(HttpResponse::ok(body.to_string())));
        let adapter = EShipPlusAdapter::new(client.clone(), config());

        let response = adapter.get_rates(request()).await.expect("rates");
        assert_eq!(
            response.available_rates.iter().map(|r| r.quote_id.as_str()).collect::<Vec<_>>(),
            vec!["q-1", "q-2", "q-3"]
        );
        assert!(response.available_rates.iter().all(|r| r.currency == "USD"));

        let sent = &client.recorded_requests()[0];
        assert_eq!(sent.headers.get("eshipplusauth").map(String::as_str), Some("token-1"));
        assert_eq!(sent.timeout_ms, Some(REQUEST_TIMEOUT_MS));
    }

    #[tokio::test]
    async fn empty_rate_list_is_no_rates() {
        let body = json!({"ContainsErrorMessage": false, "AvailableRates": []});
        let client = Arc::new(CannedHttpClient::responding(HttpResponse::ok(body.to_string())));
        let adapter = EShipPlusAdapter::new(client, config());

        let error = adapter.get_rates(request()).await.expect_err("empty");
        assert_eq!(error.status(), ErrorStatus::Internal);
    }

    #[tokio::test]
    async fn validation_failures_never_reach_the_network() {
        let client = Arc::new(CannedHttpClient::status(200, "{}"));
        let adapter = EShipPlusAdapter::new(client.clone(), config());
        let mut req = request();
        req.items[0].weight = None;

        let error = adapter.get_rates(req).await.expect_err("weight required");
        assert_eq!(error.message(), "Invalid Weight for item 1");
        assert!(client.recorded_requests().is_empty());
    }
}
