use serde::{Deserialize, Serialize};

use crate::fields::lenient_string;

/// Shipping address shared by canonical requests and responses.
///
/// Every field is optional at the serde layer; each carrier adapter decides
/// which ones it requires.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Address {
    #[serde(alias = "PostalCode", deserialize_with = "lenient_string")]
    pub postal_code: String,
    #[serde(alias = "City", deserialize_with = "lenient_string")]
    pub city: String,
    #[serde(alias = "State", deserialize_with = "lenient_string")]
    pub state: String,
    #[serde(alias = "Country", deserialize_with = "lenient_string")]
    pub country: String,
    #[serde(alias = "Company", deserialize_with = "lenient_string")]
    pub company: String,
    #[serde(alias = "Contact", deserialize_with = "lenient_string")]
    pub contact: String,
    #[serde(alias = "Phone", deserialize_with = "lenient_string")]
    pub phone: String,
    #[serde(alias = "Email", deserialize_with = "lenient_string")]
    pub email: String,
    #[serde(alias = "Street", deserialize_with = "lenient_string")]
    pub street: String,
    #[serde(alias = "Street2", deserialize_with = "lenient_string")]
    pub street2: String,
}

impl Address {
    pub fn with_postal_code(postal_code: impl Into<String>) -> Self {
        Self {
            postal_code: postal_code.into(),
            ..Self::default()
        }
    }

    /// Postal code upper-cased with interior whitespace removed (`k1a 0b1` -> `K1A0B1`).
    pub fn compact_postal_code(&self) -> String {
        self.postal_code
            .chars()
            .filter(|ch| !ch.is_whitespace())
            .collect::<String>()
            .to_ascii_uppercase()
    }
}
