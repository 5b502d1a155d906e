//! # Domain Models
//!
//! Canonical, carrier-agnostic types for freight rating.
//!
//! ## Models
//!
//! | Type | Description |
//! |------|-------------|
//! | [`CanonicalRateRequest`] | The single request shape every adapter consumes |
//! | [`Address`] | Origin/destination record |
//! | [`PackageItem`] | Package line as supplied by the caller |
//! | [`NormalizedItem`] | Package line after validation and defaulting |
//! | [`TimeWindow`] | Pickup/delivery window |
//! | [`CanonicalRateResponse`] | Normalized adapter output |
//! | [`RateQuote`] | One priced service option |
//! | [`BillingDetail`] | Charge breakdown row |
//! | [`UtcDateTime`] | UTC timestamp |
//!
//! Requests are deliberately lenient at the serde layer (numbers may arrive
//! as strings, fields may be missing); strictness lives in each adapter's
//! validator because required fields differ per carrier.

mod address;
mod item;
mod rate;
mod request;
mod timestamp;

pub use address::Address;
pub use item::{FlexNumber, NormalizedItem, PackageItem};
pub use rate::{
    currency_or, push_charge, validate_currency_code, BillingDetail, CanonicalRateResponse,
    RateQuote,
};
pub use request::{CanonicalRateRequest, TimeWindow};
pub use timestamp::{format_date, parse_date_prefix, UtcDateTime};
