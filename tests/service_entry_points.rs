//! The two callable rating operations, wired from a configuration file.

mod support;

use std::io::Write;
use std::sync::Arc;

use freightline_core::{
    CannedHttpClient, CarrierId, ConfigError, ErrorStatus, HttpResponse, RatingConfig,
    RatingService,
};
use serde_json::{json, Value};

use support::fixture_path;

fn config() -> RatingConfig {
    RatingConfig::from_path(fixture_path("rating_config.json")).expect("fixture config loads")
}

fn service_answering(body: &str) -> (RatingService, Arc<CannedHttpClient>) {
    let client = Arc::new(CannedHttpClient::responding(HttpResponse::ok(body)));
    (RatingService::with_http_client(config(), client.clone()), client)
}

fn shipment(api_key: &str) -> Value {
    json!({
        "apiKey": api_key,
        "origin": {"postalCode": "L4W 5K9", "city": "Mississauga", "state": "ON", "country": "CA"},
        "destination": {"postalCode": "H4T 1A3", "city": "Montreal", "state": "QC", "country": "CA"},
        "items": [{"weight": "52", "length": 12, "width": 12, "height": 12}],
        "shipmentDate": "2026-10-20"
    })
}

fn aggregate(api_key: &str, company: &str) -> Value {
    json!({
        "apiKey": api_key,
        "companyId": company,
        "originAddress": {
            "zipPostal": "L4W5K9", "city": "Mississauga", "stateProv": "ON", "country": "CA",
            "companyName": "Northwind", "contactName": "Shipping", "street": "1 Dock Rd"
        },
        "destinationAddress": {
            "zipPostal": "H4T1A3", "city": "Montreal", "stateProv": "QC", "country": "CA",
            "companyName": "Contoso", "contactName": "Receiving", "street": "9 Quai St"
        },
        "packages": [{"weight": 450, "length": 48, "width": 40, "height": 40, "freightClass": "70"}],
        "shipmentInfo": {"shipmentDate": "2026-10-20"}
    })
}

// =============================================================================
// Configuration
// =============================================================================

#[test]
fn fixture_configuration_resolves_enabled_carriers_per_company() {
    let config = config();
    assert_eq!(config.api_keys, vec!["fixture-key"]);
    assert_eq!(config.http_timeout_ms, 15_000);

    let acme = config.resolve_enabled("acme");
    assert_eq!(
        acme.iter().map(|record| record.id.as_str()).collect::<Vec<_>>(),
        vec!["acme-eship", "acme-polaris"]
    );

    let other = config.resolve_enabled("globex");
    assert_eq!(
        other.iter().map(|record| record.id.as_str()).collect::<Vec<_>>(),
        vec!["global-canpar", "global-polaris"]
    );
}

#[test]
fn unreadable_configuration_names_the_file() {
    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    write!(file, "{{\"apiKeys\": [").expect("write");

    let error = RatingConfig::from_path(file.path()).expect_err("truncated json");
    assert!(matches!(error, ConfigError::Parse { .. }));
    assert!(error.to_string().contains(&file.path().display().to_string()));
}

// =============================================================================
// getCarrierRates
// =============================================================================

#[tokio::test]
async fn single_carrier_rating_returns_the_success_envelope() {
    let (service, client) = service_answering(support::CANPAR_RATE);

    let response = service
        .get_carrier_rates(CarrierId::Canpar, shipment("fixture-key"))
        .await
        .expect("rated");

    let value = serde_json::to_value(&response).expect("serialize");
    assert_eq!(value["success"], true);
    assert_eq!(value["data"]["availableRates"][0]["carrierScac"], "CANP");
    assert_eq!(value["data"]["items"][0]["weight"], json!(52.0));

    let sent = &client.recorded_requests()[0];
    assert_eq!(sent.url, "https://canpar.test/canshipws/services/CanparRatingService");
    assert!(!sent.body.as_deref().unwrap_or_default().contains("fixture-key"));
}

#[tokio::test]
async fn missing_and_unknown_keys_are_unauthenticated() {
    let (service, client) = service_answering(support::POLARIS_RATE);

    let mut anonymous = shipment("");
    if let Some(fields) = anonymous.as_object_mut() {
        fields.remove("apiKey");
    }
    let missing = service
        .get_carrier_rates(CarrierId::Polaristransportation, anonymous)
        .await
        .expect_err("no key");
    assert_eq!(missing.status(), ErrorStatus::Unauthenticated);
    assert_eq!(missing.message(), "API key is required");

    let unknown = service
        .get_carrier_rates(CarrierId::Polaristransportation, shipment("guess"))
        .await
        .expect_err("wrong key");
    assert_eq!(unknown.message(), "Invalid API key");
    assert!(client.recorded_requests().is_empty());
}

#[tokio::test]
async fn carrier_validation_reaches_the_caller_as_invalid_argument() {
    let (service, client) = service_answering(support::ESHIPPLUS_RATES);

    let error = service
        .get_carrier_rates(CarrierId::Eshipplus, shipment("fixture-key"))
        .await
        .expect_err("eShipPlus needs street and contact");

    assert_eq!(error.status(), ErrorStatus::InvalidArgument);
    assert!(error.message().starts_with("Missing origin"));
    assert!(client.recorded_requests().is_empty());
}

#[tokio::test]
async fn carrier_style_payloads_rate_like_camel_case_ones() {
    let (service, client) = service_answering(support::ESHIPPLUS_RATES);
    let address = |postal: &str, city: &str, state: &str| {
        json!({
            "PostalCode": postal, "City": city, "State": state, "Country": "US",
            "Street": "100 Freight Way", "Contact": "Dock Manager"
        })
    };
    let payload = json!({
        "apiKey": "fixture-key",
        "Origin": address("60601", "Chicago", "IL"),
        "Destination": address("30301", "Atlanta", "GA"),
        "Items": [
            {"Weight": 500, "Length": 48, "Width": 40, "Height": 48, "FreightClass": "70"},
            {"Weight": "250", "Length": 40, "Width": 40, "Height": 40, "FreightClass": 85, "PackagingQuantity": 2}
        ],
        "ShipmentDate": "2026-10-20"
    });

    let response = service
        .get_carrier_rates(CarrierId::Eshipplus, payload)
        .await
        .expect("rated");

    assert!(response.success);
    assert_eq!(response.data.available_rates.len(), 2);
    assert_eq!(response.data.items.len(), 2);
    assert_eq!(response.data.items[1].packaging_quantity, 2);

    let sent = client.recorded_requests();
    let body: Value =
        serde_json::from_str(sent[0].body.as_deref().unwrap_or_default()).expect("json body");
    assert_eq!(body["Items"].as_array().map(Vec::len), Some(2));
    assert_eq!(body["Items"][1]["Weight"], json!(250.0));
}

// =============================================================================
// getUniversalRates
// =============================================================================

#[tokio::test]
async fn universal_rating_reports_partial_failures_without_failing() {
    let (service, _client) = service_answering(support::POLARIS_RATE);

    let response = service
        .get_universal_rates(aggregate("fixture-key", "acme"))
        .await
        .expect("aggregated");

    let data = &response.data;
    assert!(response.success);
    assert_eq!(data.request_info.carriers_queried, vec!["ESHIPPLUS", "POLARISTRANSPORTATION"]);
    assert_eq!(data.carrier_results.successful, 1);
    assert_eq!(data.carrier_results.failed, 1);
    assert_eq!(data.carrier_results.errors[0].carrier, "acme-eship");
    assert_eq!(data.available_rates[0].source_carrier.id, "acme-polaris");
}

#[tokio::test]
async fn universal_rating_checks_the_key_before_the_payload_shape() {
    let (service, _client) = service_answering("{}");

    let error = service
        .get_universal_rates(json!(["not", "an", "object"]))
        .await
        .expect_err("malformed");
    assert_eq!(error.status(), ErrorStatus::Unauthenticated);

    let error = service
        .get_universal_rates(json!({"apiKey": "fixture-key", "packages": [{"weight": 1}]}))
        .await
        .expect_err("no company");
    assert_eq!(error.status(), ErrorStatus::InvalidArgument);
}

#[tokio::test]
async fn universal_rating_serializes_camel_case() {
    let (service, _client) = service_answering(support::POLARIS_RATE);

    let response = service
        .get_universal_rates(aggregate("fixture-key", "globex"))
        .await
        .expect("aggregated");
    let value = serde_json::to_value(&response).expect("serialize");

    assert_eq!(value["data"]["requestInfo"]["companyId"], "globex");
    assert!(value["data"]["carrierResults"]["errors"].is_array());
    assert_eq!(value["data"]["availableRates"][0]["sourceCarrier"]["system"], "POLARISTRANSPORTATION");
}
