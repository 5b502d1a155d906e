use serde::{Deserialize, Serialize};

use crate::domain::{Address, NormalizedItem, TimeWindow};
use crate::ValidationError;

/// One line of a rate's charge breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillingDetail {
    pub name: String,
    pub amount: f64,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

impl BillingDetail {
    pub fn new(name: impl Into<String>, amount: f64) -> Self {
        Self {
            name: name.into(),
            amount,
            kind: None,
        }
    }

    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }
}

/// Appends a billing row unless the amount is absent, zero or not finite.
pub fn push_charge(
    details: &mut Vec<BillingDetail>,
    name: impl Into<String>,
    amount: Option<f64>,
    kind: Option<&str>,
) {
    let Some(amount) = amount.filter(|value| value.is_finite() && *value != 0.0) else {
        return;
    };

    let mut detail = BillingDetail::new(name, amount);
    if let Some(kind) = kind {
        detail = detail.with_kind(kind);
    }
    details.push(detail);
}

/// One priced service option in canonical form.
///
/// `total_charges` is the carrier's own total. It is never rebuilt from
/// `billing_details`, whose rows may not cover every component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateQuote {
    pub quote_id: String,
    pub carrier_name: String,
    pub carrier_scac: String,
    pub carrier_key: String,
    pub service_mode: String,
    pub service_type: String,
    pub transit_time: u32,
    pub estimated_delivery_date: Option<String>,
    pub guaranteed_service: bool,
    pub guarantee_charge: f64,
    pub freight_charges: f64,
    pub fuel_charges: f64,
    pub service_charges: f64,
    pub accessorial_charges: f64,
    pub total_charges: f64,
    pub currency: String,
    pub billing_details: Vec<BillingDetail>,
    pub billed_weight: f64,
    pub rated_weight: f64,
}

impl RateQuote {
    /// Total usable for ordering; unpriced rates (zero, negative, NaN) yield `None`.
    pub fn priced_total(&self) -> Option<f64> {
        Some(self.total_charges).filter(|total| total.is_finite() && *total > 0.0)
    }
}

/// Normalized carrier response returned by every adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalRateResponse {
    pub booking_reference: String,
    pub booking_reference_type: String,
    pub shipment_bill_type: String,
    pub shipment_date: String,
    pub pickup_window: TimeWindow,
    pub delivery_window: TimeWindow,
    pub origin: Address,
    pub destination: Address,
    pub items: Vec<NormalizedItem>,
    pub available_rates: Vec<RateQuote>,
}

/// Normalizes an ISO currency code (`cad` -> `CAD`).
pub fn validate_currency_code(input: &str) -> Result<String, ValidationError> {
    let normalized = input.trim().to_ascii_uppercase();
    let is_valid = normalized.len() == 3 && normalized.chars().all(|ch| ch.is_ascii_alphabetic());

    if !is_valid {
        return Err(ValidationError::InvalidCurrency {
            value: input.to_owned(),
        });
    }

    Ok(normalized)
}

/// Carrier-reported currency when it is a valid code, otherwise `default`.
pub fn currency_or(reported: Option<&str>, default: &str) -> String {
    reported
        .and_then(|code| validate_currency_code(code).ok())
        .unwrap_or_else(|| default.to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validates_currency() {
        assert_eq!(validate_currency_code("usd").expect("must normalize"), "USD");
        assert!(matches!(
            validate_currency_code("USDT"),
            Err(ValidationError::InvalidCurrency { .. })
        ));
        assert_eq!(currency_or(Some("??"), "CAD"), "CAD");
        assert_eq!(currency_or(None, "USD"), "USD");
    }

    #[test]
    fn push_charge_skips_zero_and_missing_amounts() {
        let mut details = Vec::new();
        push_charge(&mut details, "Freight", Some(120.0), Some("Freight"));
        push_charge(&mut details, "Fuel", Some(0.0), None);
        push_charge(&mut details, "Liftgate", None, None);
        push_charge(&mut details, "Discount", Some(-5.0), None);

        assert_eq!(details.len(), 2);
        assert_eq!(details[0].kind.as_deref(), Some("Freight"));
        assert_eq!(details[1].amount, -5.0);
    }

    #[test]
    fn billing_kind_serializes_as_type() {
        let detail = BillingDetail::new("Fuel", 3.5).with_kind("Fuel");
        let json = serde_json::to_value(&detail).expect("serialize");
        assert_eq!(json["type"], "Fuel");
    }
}
