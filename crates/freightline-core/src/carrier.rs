use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ValidationError;

/// Carriers that the aggregator is allowed to dispatch to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CarrierId {
    Eshipplus,
    Canpar,
    Polaristransportation,
}

impl CarrierId {
    pub const ALL: [Self; 3] = [Self::Eshipplus, Self::Canpar, Self::Polaristransportation];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Eshipplus => "ESHIPPLUS",
            Self::Canpar => "CANPAR",
            Self::Polaristransportation => "POLARISTRANSPORTATION",
        }
    }

    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Eshipplus => "eShipPlus",
            Self::Canpar => "Canpar",
            Self::Polaristransportation => "Polaris Transportation",
        }
    }

    /// Currency assumed when the carrier response does not state one.
    pub const fn default_currency(self) -> &'static str {
        match self {
            Self::Eshipplus => "USD",
            Self::Canpar | Self::Polaristransportation => "CAD",
        }
    }
}

impl Display for CarrierId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CarrierId {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "ESHIPPLUS" => Ok(Self::Eshipplus),
            "CANPAR" => Ok(Self::Canpar),
            "POLARISTRANSPORTATION" | "POLARIS" => Ok(Self::Polaristransportation),
            other => Err(ValidationError::InvalidCarrier {
                value: other.to_owned(),
            }),
        }
    }
}
