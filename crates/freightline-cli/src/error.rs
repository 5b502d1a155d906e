use freightline_core::{ConfigError, RateError, RateErrorKind};
use thiserror::Error;

/// CLI-level error categories mapped to exit codes.
#[derive(Debug, Error)]
pub enum CliError {
    /// Classified rating failure; rendered as an error envelope on stdout.
    #[error(transparent)]
    Rate(#[from] RateError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("invalid request document: {0}")]
    Request(String),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Rate(error) => Self::rate_exit_code(error),
            Self::Config(_) => 9,
            Self::Request(_) => 2,
            Self::Serialization(_) => 4,
            Self::Io(_) => 10,
        }
    }

    pub const fn rate_exit_code(error: &RateError) -> u8 {
        match error.kind() {
            RateErrorKind::Validation => 2,
            RateErrorKind::Authentication => 6,
            RateErrorKind::Configuration => 9,
            RateErrorKind::Business => 5,
            RateErrorKind::Transport | RateErrorKind::Unavailable => 7,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use freightline_core::CarrierId;

    #[test]
    fn rate_errors_map_to_distinct_exit_codes() {
        assert_eq!(CliError::from(RateError::validation("Missing origin")).exit_code(), 2);
        assert_eq!(CliError::from(RateError::unauthenticated("Invalid API key")).exit_code(), 6);
        assert_eq!(CliError::from(RateError::no_rates(CarrierId::Canpar)).exit_code(), 5);
        assert_eq!(CliError::from(RateError::unavailable("HTTP 503")).exit_code(), 7);
    }

    #[test]
    fn local_failures_keep_their_own_codes() {
        assert_eq!(CliError::Request("empty".to_owned()).exit_code(), 2);
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        assert_eq!(CliError::from(io).exit_code(), 10);
    }
}
