//! Pieces shared by every carrier adapter: the HTTP call with its diagnostic
//! logging, status classification, item validation and quote-id synthesis.

use std::time::Instant;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::domain::{FlexNumber, NormalizedItem, PackageItem};
use crate::fields::{as_text, lookup, one_or_many};
use crate::http_client::{HttpClient, HttpError, HttpRequest, HttpResponse};
use crate::rate_source::RateError;
use crate::{CarrierId, UtcDateTime, ValidationError};

/// Longest carrier body excerpt that may reach an external caller.
pub const CLIENT_EXCERPT_LIMIT: usize = 1024;

/// Chunk size for debug dumps of request/response bodies.
pub const LOG_CHUNK_CHARS: usize = 4000;

/// Executes one carrier call. Only transport failures are errors here; status
/// interpretation is left to the caller so error bodies can be inspected.
pub async fn execute_carrier_call(
    http_client: &dyn HttpClient,
    carrier: CarrierId,
    request: HttpRequest,
) -> Result<HttpResponse, RateError> {
    let url = request.redacted_url().to_owned();
    if let Some(body) = request.body.as_deref() {
        log_body_chunks(carrier, "request", body);
    }

    let started = Instant::now();
    let result = http_client.execute(request).await;
    let elapsed_ms = started.elapsed().as_millis().min(u128::from(u64::MAX)) as u64;

    match result {
        Ok(response) => {
            info!(
                carrier = %carrier,
                url = %url,
                status = response.status,
                elapsed_ms,
                "carrier rate call completed"
            );
            log_body_chunks(carrier, "response", &response.body);
            Ok(response)
        }
        Err(error) => {
            warn!(carrier = %carrier, url = %url, elapsed_ms, error = %error, "carrier rate call failed");
            Err(transport_failure(carrier, &error))
        }
    }
}

pub fn transport_failure(carrier: CarrierId, error: &HttpError) -> RateError {
    let message = if error.timed_out() {
        format!("{} API request timed out: {}", carrier.display_name(), error.message())
    } else {
        format!("{} API request failed: {}", carrier.display_name(), error.message())
    };
    RateError::transport(message).for_carrier(carrier)
}

/// Rejects HTTP >= 400. 503 is reported as unavailable, everything else as a transport error.
///
/// `carrier_message` is the message extracted from the body, if any; without
/// one the client-facing detail is a capped excerpt of the raw body. The full
/// body is only ever logged.
pub fn classify_http_status(
    carrier: CarrierId,
    response: &HttpResponse,
    carrier_message: Option<String>,
) -> Result<(), RateError> {
    if response.status < 400 {
        return Ok(());
    }

    warn!(
        carrier = %carrier,
        status = response.status,
        body = %response.body,
        "carrier returned an error status"
    );

    let detail = carrier_message.unwrap_or_else(|| excerpt(&response.body, CLIENT_EXCERPT_LIMIT));
    let message = if detail.trim().is_empty() {
        format!("{} API error: HTTP {}", carrier.display_name(), response.status)
    } else {
        format!(
            "{} API error: HTTP {} - {}",
            carrier.display_name(),
            response.status,
            detail.trim()
        )
    };

    let error = if response.status == 503 {
        RateError::unavailable(message)
    } else {
        RateError::transport(message)
    };
    Err(error.for_carrier(carrier))
}

/// Best-effort message from a JSON error body: `Messages[].Text`, `ErrorMessage`, `error`, `Message`.
pub fn json_error_message(body: &Value) -> Option<String> {
    let texts = one_or_many(lookup(body, "Messages"))
        .into_iter()
        .filter_map(|message| lookup(message, "Text").and_then(as_text))
        .collect::<Vec<_>>();
    if !texts.is_empty() {
        return Some(texts.join("; "));
    }

    ["ErrorMessage", "error", "Message", "message"]
        .iter()
        .find_map(|key| match lookup(body, key) {
            Some(Value::Object(nested)) => nested.get("message").and_then(as_text),
            Some(other) => as_text(other),
            None => None,
        })
}

/// Truncates to at most `limit` characters without splitting a code point.
pub fn excerpt(body: &str, limit: usize) -> String {
    match body.char_indices().nth(limit) {
        Some((cut, _)) => format!("{}...", &body[..cut]),
        None => body.to_owned(),
    }
}

/// Dumps a body at debug level in fixed-size chunks so log sinks with line limits keep all of it.
pub fn log_body_chunks(carrier: CarrierId, label: &str, body: &str) {
    let chars = body.chars().collect::<Vec<_>>();
    let total = chars.len().div_ceil(LOG_CHUNK_CHARS).max(1);
    for (index, chunk) in chars.chunks(LOG_CHUNK_CHARS).enumerate() {
        debug!(
            carrier = %carrier,
            label,
            chunk = index + 1,
            total,
            body = %chunk.iter().collect::<String>(),
            "carrier payload"
        );
    }
}

/// `{CARRIER}_{unix millis}_{random}` for carriers that do not supply a quote id.
pub fn synthesize_quote_id(carrier: CarrierId) -> String {
    let suffix = std::iter::repeat_with(fastrand::alphanumeric)
        .take(9)
        .collect::<String>()
        .to_ascii_lowercase();
    format!(
        "{}_{}_{}",
        carrier.as_str(),
        UtcDateTime::now().unix_millis(),
        suffix
    )
}

/// How a numeric package field is treated when absent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldRule {
    /// Absent, blank or non-positive values fail validation.
    Required,
    /// Absent, blank or zero values take the default; unparseable or negative values still fail.
    DefaultTo(f64),
    /// Like `DefaultTo` but zero is a legitimate value (declared value).
    Optional(f64),
}

/// Per-adapter validation policy for package lines.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ItemRules {
    pub weight: FieldRule,
    pub length: FieldRule,
    pub width: FieldRule,
    pub height: FieldRule,
    pub quantity: FieldRule,
    pub declared_value: FieldRule,
    pub require_freight_class: bool,
    /// Largest whole piece count accepted for one package line.
    pub max_quantity: u32,
}

/// Validates and defaults every package line, naming the field and 1-based index on failure.
pub fn resolve_items(items: &[PackageItem], rules: &ItemRules) -> Result<Vec<NormalizedItem>, RateError> {
    if items.is_empty() {
        return Err(ValidationError::EmptyItems.into());
    }

    items
        .iter()
        .enumerate()
        .map(|(offset, item)| resolve_item(item, offset + 1, rules))
        .collect()
}

fn resolve_item(
    item: &PackageItem,
    index: usize,
    rules: &ItemRules,
) -> Result<NormalizedItem, RateError> {
    let weight = resolve_field(item.weight.as_ref(), rules.weight, "Weight", index)?;
    let length = resolve_field(item.length.as_ref(), rules.length, "Length", index)?;
    let width = resolve_field(item.width.as_ref(), rules.width, "Width", index)?;
    let height = resolve_field(item.height.as_ref(), rules.height, "Height", index)?;
    let quantity = resolve_field(
        item.packaging_quantity.as_ref(),
        rules.quantity,
        "Quantity",
        index,
    )?;
    if quantity.fract() != 0.0
        || quantity < 1.0
        || quantity > f64::from(rules.max_quantity)
    {
        return Err(invalid_field("Quantity", index));
    }
    let declared_value = resolve_field(
        item.declared_value.as_ref(),
        rules.declared_value,
        "Declared Value",
        index,
    )?;

    let freight_class = item
        .freight_class
        .as_ref()
        .map(ToString::to_string)
        .filter(|class| !class.is_empty());
    if rules.require_freight_class && freight_class.is_none() {
        return Err(invalid_field("Freight Class", index));
    }

    Ok(NormalizedItem {
        weight,
        length,
        width,
        height,
        packaging_quantity: quantity as u32,
        declared_value,
        freight_class,
        description: item
            .description
            .as_ref()
            .map(|text| text.trim().to_owned())
            .filter(|text| !text.is_empty()),
        stackable: item.stackable.unwrap_or(false),
    })
}

fn resolve_field(
    value: Option<&FlexNumber>,
    rule: FieldRule,
    field: &'static str,
    index: usize,
) -> Result<f64, RateError> {
    let supplied = value.filter(|number| !number.is_blank());

    let Some(raw) = supplied else {
        return match rule {
            FieldRule::Required => Err(invalid_field(field, index)),
            FieldRule::DefaultTo(default) | FieldRule::Optional(default) => Ok(default),
        };
    };

    let number = raw.value().ok_or_else(|| invalid_field(field, index))?;
    if number < 0.0 {
        return Err(invalid_field(field, index));
    }

    match rule {
        FieldRule::Required if number == 0.0 => Err(invalid_field(field, index)),
        FieldRule::DefaultTo(default) if number == 0.0 => Ok(default),
        _ => Ok(number),
    }
}

fn invalid_field(field: &'static str, index: usize) -> RateError {
    ValidationError::InvalidItemField { field, index }.into()
}

/// Fails with `Missing {label}` when `value` is blank.
pub fn require_field(value: &str, label: &str) -> Result<(), RateError> {
    if value.trim().is_empty() {
        return Err(ValidationError::MissingField {
            field: label.to_owned(),
        }
        .into());
    }
    Ok(())
}
