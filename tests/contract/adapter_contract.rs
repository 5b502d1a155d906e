//! Behaviour every carrier adapter must share, checked against all three.

#[path = "../support/mod.rs"]
mod support;

use freightline_core::adapters::canpar::ACCESSORIAL_CHARGES;
use freightline_core::{
    CannedHttpClient, CarrierAdapter, CarrierId, ErrorStatus, HttpError, HttpResponse,
    PackageItem, RateErrorKind,
};
use serde_json::json;
use std::sync::Arc;

use support::{adapter_for, canned, full_request, success_body};

#[tokio::test]
async fn every_adapter_answers_for_its_own_carrier() {
    for carrier in CarrierId::ALL {
        let adapter = adapter_for(carrier, canned(HttpResponse::ok(success_body(carrier))));
        assert_eq!(adapter.id(), carrier);
    }
}

#[tokio::test]
async fn every_adapter_normalizes_a_recorded_response() {
    for carrier in CarrierId::ALL {
        let adapter = adapter_for(carrier, canned(HttpResponse::ok(success_body(carrier))));
        let response = adapter
            .get_rates(full_request())
            .await
            .unwrap_or_else(|error| panic!("{carrier} should rate: {error}"));

        assert!(!response.available_rates.is_empty(), "{carrier} returned no rates");
        for rate in &response.available_rates {
            assert!(rate.total_charges > 0.0, "{carrier} rate without a total");
            assert!(!rate.quote_id.is_empty(), "{carrier} rate without a quote id");
            assert_eq!(rate.currency.len(), 3, "{carrier} currency is not ISO-4217 shaped");
        }
        assert_eq!(response.origin.postal_code, "L4W 5K9");
        assert_eq!(response.items.len(), 1);
    }
}

#[tokio::test]
async fn http_500_is_a_transport_error_naming_the_status() {
    for carrier in CarrierId::ALL {
        let adapter = adapter_for(carrier, canned(HttpResponse::new(500, "upstream exploded")));
        let error = adapter.get_rates(full_request()).await.expect_err("500 must fail");

        assert_eq!(error.kind(), RateErrorKind::Transport, "{carrier}");
        assert_eq!(error.status(), ErrorStatus::Internal, "{carrier}");
        assert!(error.message().contains("500"), "{carrier}: {}", error.message());
        assert_eq!(error.carrier(), Some(carrier));
    }
}

#[tokio::test]
async fn http_503_is_reported_as_unavailable() {
    for carrier in CarrierId::ALL {
        let adapter = adapter_for(carrier, canned(HttpResponse::new(503, "")));
        let error = adapter.get_rates(full_request()).await.expect_err("503 must fail");
        assert_eq!(error.status(), ErrorStatus::Unavailable, "{carrier}");
    }
}

#[tokio::test]
async fn network_failures_and_timeouts_are_transport_errors() {
    for carrier in CarrierId::ALL {
        let client = Arc::new(CannedHttpClient::failing(HttpError::timeout(
            "operation timed out",
        )));
        let adapter = adapter_for(carrier, client);
        let error = adapter.get_rates(full_request()).await.expect_err("timeout");
        assert_eq!(error.kind(), RateErrorKind::Transport, "{carrier}");
    }
}

#[tokio::test]
async fn invalid_requests_fail_before_any_network_call() {
    for carrier in CarrierId::ALL {
        let client = canned(HttpResponse::ok(success_body(carrier)));
        let adapter = adapter_for(carrier, client.clone());

        let mut request = full_request();
        request.origin.postal_code.clear();
        let error = adapter.get_rates(request).await.expect_err("postal code required");

        assert_eq!(error.status(), ErrorStatus::InvalidArgument, "{carrier}");
        assert!(client.recorded_requests().is_empty(), "{carrier} called the network");
    }
}

#[tokio::test]
async fn empty_item_lists_are_rejected_everywhere() {
    for carrier in CarrierId::ALL {
        let client = canned(HttpResponse::ok(success_body(carrier)));
        let adapter = adapter_for(carrier, client.clone());

        let mut request = full_request();
        request.items.clear();
        let error = adapter.get_rates(request).await.expect_err("items required");
        assert_eq!(error.kind(), RateErrorKind::Validation, "{carrier}");
        assert!(client.recorded_requests().is_empty());
    }
}

#[tokio::test]
async fn carrier_business_flags_become_failed_precondition() {
    let cases = [
        (
            CarrierId::Canpar,
            concat!(
                r#"<soapenv:Envelope xmlns:soapenv="http://schemas.xmlsoap.org/soap/envelope/">"#,
                "<soapenv:Body><ns:rateShipmentResponse xmlns:ns=\"http://ws.onlinerating.canshipws.canpar.com\">",
                "<ns:return><ax:error xmlns:ax=\"http://dto.canshipws.canpar.com/xsd\">Invalid postal code</ax:error>",
                "</ns:return></ns:rateShipmentResponse></soapenv:Body></soapenv:Envelope>"
            )
            .to_owned(),
        ),
        (
            CarrierId::Eshipplus,
            json!({"ContainsErrorMessage": true, "Messages": [{"Text": "Invalid postal code"}]})
                .to_string(),
        ),
        (
            CarrierId::Polaristransportation,
            json!({"Rate_API_Response": {"Error": "Y", "Message": "Invalid postal code"}})
                .to_string(),
        ),
    ];

    for (carrier, body) in cases {
        let adapter = adapter_for(carrier, canned(HttpResponse::ok(body)));
        let error = adapter.get_rates(full_request()).await.expect_err("flagged");

        assert_eq!(error.kind(), RateErrorKind::Business, "{carrier}");
        assert_eq!(error.status(), ErrorStatus::FailedPrecondition, "{carrier}");
        assert!(error.message().contains("Invalid postal code"), "{carrier}");
    }
}

#[tokio::test]
async fn unparseable_success_bodies_are_transport_errors() {
    for carrier in CarrierId::ALL {
        let adapter = adapter_for(carrier, canned(HttpResponse::ok("<<not a document")));
        let error = adapter.get_rates(full_request()).await.expect_err("garbage");
        assert_eq!(error.kind(), RateErrorKind::Transport, "{carrier}");
    }
}

#[tokio::test]
async fn canpar_nil_error_element_is_success() {
    let adapter = adapter_for(CarrierId::Canpar, canned(HttpResponse::ok(support::CANPAR_RATE)));
    let response = adapter.get_rates(full_request()).await.expect("nil error is no error");

    let rate = &response.available_rates[0];
    assert_eq!(rate.carrier_scac, "CANP");
    assert_eq!(rate.currency, "CAD");
    assert_eq!(rate.total_charges, 54.59);
    assert_eq!(rate.freight_charges, 38.2);
    assert_eq!(rate.billed_weight, 52.0);
    assert_eq!(rate.rated_weight, rate.billed_weight);
    assert!(rate.billing_details.iter().any(|d| d.name == "HST" && d.amount == 6.28));
    assert!(rate.billing_details.iter().any(|d| d.name == "Handling" && d.amount == 4.0));
}

#[tokio::test]
async fn canpar_maps_all_seventeen_accessorials() {
    let charges = ACCESSORIAL_CHARGES
        .iter()
        .enumerate()
        .map(|(index, (field, _))| format!("<ax:{field}>{}.00</ax:{field}>", index + 1))
        .collect::<String>();
    let body = support::CANPAR_RATE.replace("<ax:handling_charge>4.00</ax:handling_charge>", "")
        .replace("<ax:ra_charge>0.00</ax:ra_charge>", &charges);

    let adapter = adapter_for(CarrierId::Canpar, canned(HttpResponse::ok(body)));
    let response = adapter.get_rates(full_request()).await.expect("rated");
    let rate = &response.available_rates[0];

    assert_eq!(ACCESSORIAL_CHARGES.len(), 17);
    for (_, label) in ACCESSORIAL_CHARGES {
        assert!(
            rate.billing_details.iter().any(|detail| detail.name == label),
            "missing accessorial {label}"
        );
    }
    // 1 + 2 + ... + 17
    assert_eq!(rate.accessorial_charges, 153.0);
}

#[tokio::test]
async fn canpar_repeats_packages_per_piece() {
    let client = canned(HttpResponse::ok(support::CANPAR_RATE));
    let adapter = adapter_for(CarrierId::Canpar, client.clone());

    let mut request = full_request();
    request.items = vec![PackageItem::new(20.0, 10.0, 10.0, 10.0).with_quantity(4)];
    adapter.get_rates(request).await.expect("rated");

    let sent = client.recorded_requests();
    let body = sent[0].body.as_deref().unwrap_or_default();
    assert_eq!(body.matches("<xsd:packages>").count(), 4);
    assert_eq!(sent[0].headers.get("soapaction").map(String::as_str), Some("rateShipment"));
}

#[tokio::test]
async fn eshipplus_keeps_every_carrier_rate_in_received_order() {
    let adapter = adapter_for(CarrierId::Eshipplus, canned(HttpResponse::ok(support::ESHIPPLUS_RATES)));
    let response = adapter.get_rates(full_request()).await.expect("rated");

    let ids = response
        .available_rates
        .iter()
        .map(|rate| rate.quote_id.as_str())
        .collect::<Vec<_>>();
    assert_eq!(ids, vec!["ESP-1001", "ESP-1002"]);
    assert_eq!(response.booking_reference_type, "Shipment");
}

#[tokio::test]
async fn polaris_zero_total_means_no_rates() {
    let body = json!({"Rate_API_Response": {"Error": "N", "Message": "", "Total_Charge": "0.00"}});
    let adapter = adapter_for(
        CarrierId::Polaristransportation,
        canned(HttpResponse::ok(body.to_string())),
    );

    let error = adapter.get_rates(full_request()).await.expect_err("nothing quotable");
    assert_eq!(error.kind(), RateErrorKind::Business);
    assert_eq!(error.status(), ErrorStatus::Internal);
}

#[tokio::test]
async fn polaris_credentials_travel_in_the_query_string_only() {
    let client = canned(HttpResponse::ok(support::POLARIS_RATE));
    let adapter = adapter_for(CarrierId::Polaristransportation, client.clone());
    let response = adapter.get_rates(full_request()).await.expect("rated");

    let rate = &response.available_rates[0];
    assert_eq!(rate.quote_id, "PQ-77841");
    assert_eq!(rate.accessorial_charges, 45.0);
    assert!(rate.billing_details.iter().all(|d| d.name != "Appointment"));

    let sent = &client.recorded_requests()[0];
    assert!(sent.url.contains("APIKey=pk"));
    assert!(!sent.body.as_deref().unwrap_or_default().contains("pk\""));
}
