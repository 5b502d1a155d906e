//! Canpar SOAP rating adapter.
//!
//! One `rateShipment` call rates exactly one service type, so a successful
//! response always normalizes to a single [`RateQuote`].

use std::sync::Arc;

use crate::adapters::common::{
    classify_http_status, execute_carrier_call, require_field, resolve_items,
    synthesize_quote_id, FieldRule, ItemRules,
};
use crate::config::{ApiOperation, CarrierApiConfig, CarrierConfigProvider};
use crate::domain::{
    format_date, parse_date_prefix, push_charge, Address, CanonicalRateRequest,
    CanonicalRateResponse, NormalizedItem, RateQuote, TimeWindow, UtcDateTime,
};
use crate::http_client::{HttpClient, HttpRequest, HttpResponse};
use crate::rate_source::{CarrierAdapter, RateError, RateFuture};
use crate::xml::{leaf, XmlElement};
use crate::CarrierId;

const SOAP_ACTION: &str = "rateShipment";
const NS_SOAPENV: &str = "http://schemas.xmlsoap.org/soap/envelope/";
const NS_WS: &str = "http://ws.onlinerating.canshipws.canpar.com";
const NS_XSD: &str = "http://dto.canshipws.canpar.com/xsd";

const DEFAULT_SERVICE_TYPE: u32 = 1;

/// Each piece becomes its own `<packages>` element, so the line quantity is bounded.
pub const MAX_PIECES: u32 = 100;

const ITEM_RULES: ItemRules = ItemRules {
    weight: FieldRule::DefaultTo(1.0),
    length: FieldRule::DefaultTo(10.0),
    width: FieldRule::DefaultTo(10.0),
    height: FieldRule::DefaultTo(10.0),
    quantity: FieldRule::DefaultTo(1.0),
    declared_value: FieldRule::Optional(0.0),
    require_freight_class: false,
    max_quantity: MAX_PIECES,
};

/// Accessorial charge elements of a rated shipment and their billing labels.
pub const ACCESSORIAL_CHARGES: [(&str, &str); 17] = [
    ("carbon_surcharge", "Carbon Surcharge"),
    ("cod_charge", "COD Charge"),
    ("cos_charge", "Chain of Signature"),
    ("dg_charge", "Dangerous Goods"),
    ("dv_charge", "Declared Value"),
    ("ea_charge", "Extended Area"),
    ("handling_charge", "Handling"),
    ("lift_gate_charge", "Liftgate"),
    ("over_length_charge", "Over Length"),
    ("over_size_charge", "Oversize"),
    ("over_weight_charge", "Overweight"),
    ("premium_charge", "Premium Service"),
    ("ra_charge", "Residential Delivery"),
    ("rural_charge", "Rural Area"),
    ("sr_charge", "Signature Required"),
    ("xc_charge", "Extra Care"),
    ("nsr_charge", "No Signature Required"),
];

const RETURN_PATH: [&str; 4] = ["Envelope", "Body", "rateShipmentResponse", "return"];
const FAULT_PATH: [&str; 3] = ["Envelope", "Body", "Fault"];
const SHIPMENT_PATH: [&str; 2] = ["processShipmentResult", "shipment"];

/// Canpar service name for a service-type code.
pub fn service_name(code: u32) -> String {
    match code {
        1 | 5 => String::from("Canpar Ground"),
        2 => String::from("Canpar Select"),
        3 => String::from("Canpar Overnight"),
        4 => String::from("Canpar USA"),
        6 => String::from("Canpar International"),
        other => format!("Service {other}"),
    }
}

/// Canonical request after Canpar validation and defaulting.
#[derive(Debug, Clone, PartialEq)]
pub struct CanparShipment {
    pub origin: Address,
    pub destination: Address,
    pub items: Vec<NormalizedItem>,
    pub shipping_date: String,
    pub service_type: u32,
    pub pickup_window: TimeWindow,
    pub delivery_window: TimeWindow,
    pub booking_reference: String,
    pub booking_reference_type: String,
    pub shipment_bill_type: String,
}

/// Credentials required by the Canpar rating service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanparCredentials {
    pub username: String,
    pub password: String,
    pub account_number: String,
}

impl CanparCredentials {
    pub fn from_config(config: &CarrierApiConfig) -> Result<Self, RateError> {
        let carrier = CarrierId::Canpar;
        Ok(Self {
            username: config
                .require_credential(carrier, &["username", "userId"])?
                .to_owned(),
            password: config.require_credential(carrier, &["password"])?.to_owned(),
            account_number: config
                .require_credential(carrier, &["accountNumber", "shipperNumber"])?
                .to_owned(),
        })
    }
}

/// Validates a canonical request for Canpar. Missing dimensions and weights are defaulted, never rejected.
pub fn validate_request(req: &CanonicalRateRequest) -> Result<CanparShipment, RateError> {
    require_field(&req.origin.postal_code, "origin postal code")?;
    require_field(&req.destination.postal_code, "destination postal code")?;
    let items = resolve_items(&req.items, &ITEM_RULES)?;

    let shipping_date = if req.shipment_date.trim().is_empty() {
        UtcDateTime::now().date_string()
    } else {
        format_date(parse_date_prefix(&req.shipment_date)?)
    };

    let service_type = match req.service_type {
        Some(0) => return Err(RateError::validation("Invalid service type 0")),
        Some(code) => code,
        None => DEFAULT_SERVICE_TYPE,
    };

    Ok(CanparShipment {
        origin: req.origin.clone(),
        destination: req.destination.clone(),
        items,
        shipping_date,
        service_type,
        pickup_window: req.pickup_window.clone(),
        delivery_window: req.delivery_window.clone(),
        booking_reference: req.booking_reference_number.clone(),
        booking_reference_type: req.booking_reference_number_type.clone(),
        shipment_bill_type: req.shipment_bill_type.clone(),
    })
}

/// Builds the `rateShipment` SOAP envelope. Each package line is repeated per piece.
pub fn build_rate_envelope(shipment: &CanparShipment, credentials: &CanparCredentials) -> String {
    let packages = shipment
        .items
        .iter()
        .flat_map(|item| std::iter::repeat(item).take(item.packaging_quantity as usize))
        .map(|item| {
            format!(
                "<xsd:packages>{}{}{}{}{}</xsd:packages>",
                leaf("xsd:declared_value", item.declared_value),
                leaf("xsd:height", item.height),
                leaf("xsd:length", item.length),
                leaf("xsd:reported_weight", item.weight),
                leaf("xsd:width", item.width),
            )
        })
        .collect::<String>();

    format!(
        concat!(
            r#"<soapenv:Envelope xmlns:soapenv="{soapenv}" xmlns:ws="{ws}" xmlns:xsd="{xsd}">"#,
            "<soapenv:Header/>",
            "<soapenv:Body>",
            "<ws:rateShipment>",
            "<ws:request>",
            "<xsd:apply_association_discount>false</xsd:apply_association_discount>",
            "<xsd:apply_individual_discount>false</xsd:apply_individual_discount>",
            "<xsd:apply_invoice_discount>false</xsd:apply_invoice_discount>",
            "{password}",
            "<xsd:shipment>",
            "<xsd:delivery_address>{delivery}</xsd:delivery_address>",
            "<xsd:dimention_unit>I</xsd:dimention_unit>",
            "{packages}",
            "<xsd:pickup_address>{pickup}</xsd:pickup_address>",
            "<xsd:reported_weight_unit>L</xsd:reported_weight_unit>",
            "{service_type}",
            "{shipper_num}",
            "{shipping_date}",
            "</xsd:shipment>",
            "{user_id}",
            "</ws:request>",
            "</ws:rateShipment>",
            "</soapenv:Body>",
            "</soapenv:Envelope>"
        ),
        soapenv = NS_SOAPENV,
        ws = NS_WS,
        xsd = NS_XSD,
        password = leaf("xsd:password", &credentials.password),
        delivery = address_fields(&shipment.destination),
        packages = packages,
        pickup = address_fields(&shipment.origin),
        service_type = leaf("xsd:service_type", shipment.service_type),
        shipper_num = leaf("xsd:shipper_num", &credentials.account_number),
        shipping_date = leaf(
            "xsd:shipping_date",
            format!("{}T00:00:00", shipment.shipping_date)
        ),
        user_id = leaf("xsd:user_id", &credentials.username),
    )
}

fn address_fields(address: &Address) -> String {
    let country = if address.country.trim().is_empty() {
        "CA"
    } else {
        address.country.trim()
    };
    [
        leaf("xsd:address_line_1", &address.street),
        leaf("xsd:address_line_2", &address.street2),
        leaf("xsd:attention", &address.contact),
        leaf("xsd:city", &address.city),
        leaf("xsd:country", country),
        leaf("xsd:email", &address.email),
        leaf("xsd:name", &address.company),
        leaf("xsd:phone", &address.phone),
        leaf("xsd:postal_code", address.compact_postal_code()),
        leaf("xsd:province", &address.state),
    ]
    .concat()
}

/// Classifies a Canpar HTTP response and returns the SOAP `return` element on success.
///
/// An `error` element marked `xsi:nil="true"` is Canpar's null and means no error.
pub fn classify_response(response: &HttpResponse) -> Result<XmlElement, RateError> {
    let carrier = CarrierId::Canpar;
    let parsed = XmlElement::parse(&response.body);

    let fault = parsed
        .as_ref()
        .ok()
        .and_then(|root| root.at(&FAULT_PATH))
        .map(|fault| fault.text_or(&["faultstring"], "SOAP fault"));

    classify_http_status(carrier, response, fault.clone())?;

    let root = parsed.map_err(|error| {
        RateError::transport(format!("Canpar returned an unreadable SOAP response: {error}"))
            .for_carrier(carrier)
    })?;

    if let Some(fault) = fault {
        return Err(RateError::business(format!("Canpar SOAP fault: {fault}")).for_carrier(carrier));
    }

    let result = root.at(&RETURN_PATH).ok_or_else(|| {
        RateError::transport("Canpar response is missing rateShipmentResponse/return")
            .for_carrier(carrier)
    })?;

    if let Some(error) = result.child("error") {
        if !error.is_nil() && !error.text.trim().is_empty() {
            return Err(RateError::business(format!("Canpar API error: {}", error.text.trim()))
                .for_carrier(carrier));
        }
    }

    Ok(result.clone())
}

/// Maps the SOAP `return` element into the canonical response.
pub fn normalize_response(result: &XmlElement, shipment: &CanparShipment) -> CanonicalRateResponse {
    let available_rates = result
        .at(&SHIPMENT_PATH)
        .map(|rated| vec![rate_from_shipment(rated)])
        .unwrap_or_default();

    CanonicalRateResponse {
        booking_reference: shipment.booking_reference.clone(),
        booking_reference_type: shipment.booking_reference_type.clone(),
        shipment_bill_type: shipment.shipment_bill_type.clone(),
        shipment_date: shipment.shipping_date.clone(),
        pickup_window: shipment.pickup_window.clone(),
        delivery_window: shipment.delivery_window.clone(),
        origin: shipment.origin.clone(),
        destination: shipment.destination.clone(),
        items: shipment.items.clone(),
        available_rates,
    }
}

fn rate_from_shipment(rated: &XmlElement) -> RateQuote {
    let carrier = CarrierId::Canpar;
    let charge = |name: &str| rated.number_or(&[name], 0.0);

    let freight_charges = charge("freight_charge");
    let fuel_charges = charge("fuel_surcharge");

    let mut billing_details = Vec::new();
    push_charge(&mut billing_details, "Freight", Some(freight_charges), Some("Freight"));
    push_charge(&mut billing_details, "Fuel Surcharge", Some(fuel_charges), Some("Fuel"));

    let mut accessorial_charges = 0.0;
    for (field, label) in ACCESSORIAL_CHARGES {
        let amount = charge(field);
        accessorial_charges += amount;
        push_charge(&mut billing_details, label, Some(amount), Some("Accessorial"));
    }

    for slot in 1..=2 {
        let amount = charge(&format!("tax_charge_{slot}"));
        let label = rated.text_or(&[format!("tax_code_{slot}").as_str()], &format!("Tax {slot}"));
        push_charge(&mut billing_details, label, Some(amount), Some("Tax"));
    }

    let service_code = rated
        .number_at(&["service_type"])
        .filter(|code| *code >= 0.0)
        .map_or(DEFAULT_SERVICE_TYPE, |code| code as u32);

    // Canpar reports a single weight; billed and rated share it.
    let billed_weight = charge("billed_weight");

    RateQuote {
        quote_id: synthesize_quote_id(carrier),
        carrier_name: String::from("Canpar"),
        carrier_scac: String::from("CANP"),
        carrier_key: carrier.as_str().to_owned(),
        service_mode: String::from("Parcel"),
        service_type: service_name(service_code),
        transit_time: rated
            .number_at(&["transit_time"])
            .filter(|days| *days >= 0.0)
            .map_or(0, |days| days.round() as u32),
        estimated_delivery_date: rated
            .text_at(&["estimated_delivery_date"])
            .and_then(|raw| parse_date_prefix(raw).ok())
            .map(format_date),
        guaranteed_service: false,
        guarantee_charge: 0.0,
        freight_charges,
        fuel_charges,
        service_charges: 0.0,
        accessorial_charges,
        total_charges: charge("total"),
        currency: carrier.default_currency().to_owned(),
        billing_details,
        billed_weight,
        rated_weight: billed_weight,
    }
}

/// Canpar SOAP rating adapter.
#[derive(Clone)]
pub struct CanparAdapter {
    http_client: Arc<dyn HttpClient>,
    config: Arc<dyn CarrierConfigProvider>,
}

impl CanparAdapter {
    pub fn new(http_client: Arc<dyn HttpClient>, config: Arc<dyn CarrierConfigProvider>) -> Self {
        Self {
            http_client,
            config,
        }
    }

    async fn rate(&self, req: CanonicalRateRequest) -> Result<CanonicalRateResponse, RateError> {
        let carrier = CarrierId::Canpar;
        let shipment = validate_request(&req)?;

        let config = self
            .config
            .carrier_api_config(carrier, ApiOperation::Rate)
            .await?;
        let api_url = config.require_api_url(carrier)?;
        let credentials = CanparCredentials::from_config(&config)?;

        let request = HttpRequest::post(api_url)
            .with_header("Content-Type", "text/xml; charset=utf-8")
            .with_header("SOAPAction", SOAP_ACTION)
            .with_body(build_rate_envelope(&shipment, &credentials));

        let response = execute_carrier_call(self.http_client.as_ref(), carrier, request).await?;
        let result = classify_response(&response)?;
        let normalized = normalize_response(&result, &shipment);

        if normalized.available_rates.is_empty() {
            return Err(RateError::no_rates(carrier));
        }
        Ok(normalized)
    }
}

impl CarrierAdapter for CanparAdapter {
    fn id(&self) -> CarrierId {
        CarrierId::Canpar
    }

    fn get_rates<'a>(&'a self, req: CanonicalRateRequest) -> RateFuture<'a, CanonicalRateResponse> {
        Box::pin(self.rate(req))
    }
}
