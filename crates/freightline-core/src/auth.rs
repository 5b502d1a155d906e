use std::collections::BTreeSet;

use crate::rate_source::RateError;

/// Checks the internal API key a caller presents with a rating request.
pub trait CallerAuthenticator: Send + Sync {
    fn authenticate(&self, api_key: Option<&str>) -> Result<(), RateError>;
}

/// Fixed set of accepted keys. An empty set disables the check.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticApiKeys {
    keys: BTreeSet<String>,
}

impl StaticApiKeys {
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keys: keys
                .into_iter()
                .map(Into::into)
                .map(|key| key.trim().to_owned())
                .filter(|key| !key.is_empty())
                .collect(),
        }
    }

    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn is_enforced(&self) -> bool {
        !self.keys.is_empty()
    }
}

impl CallerAuthenticator for StaticApiKeys {
    fn authenticate(&self, api_key: Option<&str>) -> Result<(), RateError> {
        if !self.is_enforced() {
            return Ok(());
        }

        match api_key.map(str::trim).filter(|key| !key.is_empty()) {
            None => Err(RateError::unauthenticated("API key is required")),
            Some(key) if self.keys.contains(key) => Ok(()),
            Some(_) => Err(RateError::unauthenticated("Invalid API key")),
        }
    }
}
