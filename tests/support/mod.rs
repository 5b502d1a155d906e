//! Shared fixtures for the integration suites.

#![allow(dead_code)]

use std::sync::Arc;

use freightline_core::{
    Address, ApiOperation, CanonicalRateRequest, CanparAdapter, CannedHttpClient, CarrierAdapter,
    CarrierApiConfig, CarrierId, EShipPlusAdapter, HttpResponse, PackageItem, PolarisAdapter,
    RatingConfig,
};

pub const CANPAR_RATE: &str = include_str!("../fixtures/canpar_rate_response.xml");
pub const ESHIPPLUS_RATES: &str = include_str!("../fixtures/eshipplus_rate_response.json");
pub const POLARIS_RATE: &str = include_str!("../fixtures/polaris_rate_response.json");

pub fn fixture_path(name: &str) -> String {
    format!("{}/../../tests/fixtures/{name}", env!("CARGO_MANIFEST_DIR"))
}

pub fn address(postal: &str, city: &str, state: &str, country: &str) -> Address {
    Address {
        postal_code: postal.to_owned(),
        city: city.to_owned(),
        state: state.to_owned(),
        country: country.to_owned(),
        company: String::from("Northwind Traders"),
        contact: String::from("Receiving"),
        street: String::from("100 Dock Rd"),
        ..Address::default()
    }
}

/// A request complete enough for every carrier's validation rules.
pub fn full_request() -> CanonicalRateRequest {
    CanonicalRateRequest::new(
        address("L4W 5K9", "Mississauga", "ON", "CA"),
        address("H4T 1A3", "Montreal", "QC", "CA"),
        vec![PackageItem::new(500.0, 48.0, 40.0, 36.0)
            .with_freight_class("70")
            .with_quantity(1)],
    )
    .with_shipment_date("2026-10-20")
}

pub fn carrier_config() -> RatingConfig {
    RatingConfig::default()
        .with_carrier(
            CarrierId::Canpar,
            ApiOperation::Rate,
            CarrierApiConfig::new("https://canpar.test/rate")
                .with_credential("username", "rates@example.com")
                .with_credential("password", "secret")
                .with_credential("accountNumber", "46000041"),
        )
        .with_carrier(
            CarrierId::Eshipplus,
            ApiOperation::Rate,
            CarrierApiConfig::new("https://eshipplus.test/rate")
                .with_credential("eShipPlusAuth", "token"),
        )
        .with_carrier(
            CarrierId::Polaristransportation,
            ApiOperation::Rate,
            CarrierApiConfig::new("https://polaris.test/rate").with_credential("apiKey", "pk"),
        )
}

pub fn adapter_for(carrier: CarrierId, client: Arc<CannedHttpClient>) -> Arc<dyn CarrierAdapter> {
    let config = Arc::new(carrier_config());
    match carrier {
        CarrierId::Canpar => Arc::new(CanparAdapter::new(client, config)),
        CarrierId::Eshipplus => Arc::new(EShipPlusAdapter::new(client, config)),
        CarrierId::Polaristransportation => Arc::new(PolarisAdapter::new(client, config)),
    }
}

pub fn canned(response: HttpResponse) -> Arc<CannedHttpClient> {
    Arc::new(CannedHttpClient::responding(response))
}

pub fn success_body(carrier: CarrierId) -> &'static str {
    match carrier {
        CarrierId::Canpar => CANPAR_RATE,
        CarrierId::Eshipplus => ESHIPPLUS_RATES,
        CarrierId::Polaristransportation => POLARIS_RATE,
    }
}
