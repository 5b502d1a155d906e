use serde::{Deserialize, Serialize};

use crate::domain::{Address, PackageItem};
use crate::fields::{lenient_opt_string, lenient_opt_u32, lenient_string};

/// Time-of-day window (`HH:MM` strings) for pickup or delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TimeWindow {
    #[serde(alias = "Earliest", deserialize_with = "lenient_string")]
    pub earliest: String,
    #[serde(alias = "Latest", deserialize_with = "lenient_string")]
    pub latest: String,
}

impl TimeWindow {
    pub fn new(earliest: impl Into<String>, latest: impl Into<String>) -> Self {
        Self {
            earliest: earliest.into(),
            latest: latest.into(),
        }
    }

    /// Fills blank bounds from `fallback`.
    pub fn or_default_bounds(&self, fallback: &TimeWindow) -> Self {
        Self {
            earliest: non_blank_or(&self.earliest, &fallback.earliest),
            latest: non_blank_or(&self.latest, &fallback.latest),
        }
    }
}

impl Default for TimeWindow {
    fn default() -> Self {
        Self::new("09:00", "17:00")
    }
}

/// The single carrier-agnostic request every adapter consumes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CanonicalRateRequest {
    #[serde(alias = "Origin")]
    pub origin: Address,
    #[serde(alias = "Destination")]
    pub destination: Address,
    #[serde(alias = "Items")]
    pub items: Vec<PackageItem>,
    #[serde(alias = "ShipmentDate", deserialize_with = "lenient_string")]
    pub shipment_date: String,
    #[serde(alias = "PickupWindow")]
    pub pickup_window: TimeWindow,
    #[serde(alias = "DeliveryWindow")]
    pub delivery_window: TimeWindow,
    #[serde(alias = "BookingReferenceNumber", deserialize_with = "lenient_string")]
    pub booking_reference_number: String,
    #[serde(alias = "BookingReferenceNumberType", deserialize_with = "lenient_string")]
    pub booking_reference_number_type: String,
    #[serde(alias = "ShipmentBillType", deserialize_with = "lenient_string")]
    pub shipment_bill_type: String,
    /// Canpar service code; other carriers ignore it.
    #[serde(
        alias = "ServiceType",
        deserialize_with = "lenient_opt_u32",
        skip_serializing_if = "Option::is_none"
    )]
    pub service_type: Option<u32>,
    /// Caller credential for internal authentication. Never forwarded to a carrier.
    #[serde(deserialize_with = "lenient_opt_string", skip_serializing)]
    pub api_key: Option<String>,
}

impl CanonicalRateRequest {
    pub fn new(origin: Address, destination: Address, items: Vec<PackageItem>) -> Self {
        Self {
            origin,
            destination,
            items,
            ..Self::default()
        }
    }

    pub fn with_shipment_date(mut self, shipment_date: impl Into<String>) -> Self {
        self.shipment_date = shipment_date.into();
        self
    }

    pub fn with_service_type(mut self, service_type: u32) -> Self {
        self.service_type = Some(service_type);
        self
    }

    /// Removes and returns the caller API key so the remaining request is safe to forward.
    pub fn take_api_key(&mut self) -> Option<String> {
        self.api_key.take()
    }
}

fn non_blank_or(value: &str, fallback: &str) -> String {
    if value.trim().is_empty() {
        fallback.to_owned()
    } else {
        value.trim().to_owned()
    }
}
