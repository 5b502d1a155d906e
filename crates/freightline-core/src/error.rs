use thiserror::Error;

/// Validation and contract errors exposed by `freightline-core`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("invalid carrier '{value}', expected one of ESHIPPLUS, CANPAR, POLARISTRANSPORTATION")]
    InvalidCarrier { value: String },

    #[error("timestamp must be RFC3339 UTC (suffix Z): '{value}'")]
    TimestampNotUtc { value: String },

    #[error("date must be formatted as YYYY-MM-DD: '{value}'")]
    InvalidDate { value: String },

    #[error("currency must be a 3-letter uppercase ISO code: '{value}'")]
    InvalidCurrency { value: String },

    #[error("Missing {field}")]
    MissingField { field: String },

    #[error("Invalid {field} for item {index}")]
    InvalidItemField { field: &'static str, index: usize },

    #[error("At least one item is required")]
    EmptyItems,

    #[error("malformed request payload: {reason}")]
    MalformedPayload { reason: String },

    #[error("xml document is malformed: {reason}")]
    MalformedXml { reason: String },
}

/// Errors raised while loading rating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid value for {name}: '{value}'")]
    InvalidEnv { name: &'static str, value: String },
}
