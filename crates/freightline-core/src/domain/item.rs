use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::fields::{lenient_opt_string, parse_numeric_text};

/// Numeric field as callers actually send it: a JSON number or a numeric string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FlexNumber {
    Number(f64),
    Text(String),
}

impl FlexNumber {
    /// Finite numeric value, or `None` when the text does not parse.
    pub fn value(&self) -> Option<f64> {
        match self {
            Self::Number(number) if number.is_finite() => Some(*number),
            Self::Number(_) => None,
            Self::Text(text) => parse_numeric_text(text),
        }
    }

    /// True for empty or whitespace-only text, which callers use to mean "not supplied".
    pub fn is_blank(&self) -> bool {
        matches!(self, Self::Text(text) if text.trim().is_empty())
    }
}

impl From<f64> for FlexNumber {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl Display for FlexNumber {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(number) => write!(f, "{number}"),
            Self::Text(text) => f.write_str(text.trim()),
        }
    }
}

/// One package line of a canonical rate request, exactly as the caller supplied it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PackageItem {
    #[serde(alias = "Weight", skip_serializing_if = "Option::is_none")]
    pub weight: Option<FlexNumber>,
    #[serde(alias = "Length", skip_serializing_if = "Option::is_none")]
    pub length: Option<FlexNumber>,
    #[serde(alias = "Width", skip_serializing_if = "Option::is_none")]
    pub width: Option<FlexNumber>,
    #[serde(alias = "Height", skip_serializing_if = "Option::is_none")]
    pub height: Option<FlexNumber>,
    #[serde(alias = "PackagingQuantity", skip_serializing_if = "Option::is_none")]
    pub packaging_quantity: Option<FlexNumber>,
    #[serde(alias = "DeclaredValue", skip_serializing_if = "Option::is_none")]
    pub declared_value: Option<FlexNumber>,
    #[serde(alias = "FreightClass", skip_serializing_if = "Option::is_none")]
    pub freight_class: Option<FlexNumber>,
    #[serde(
        alias = "Description",
        deserialize_with = "lenient_opt_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<String>,
    #[serde(alias = "Stackable", skip_serializing_if = "Option::is_none")]
    pub stackable: Option<bool>,
}

impl PackageItem {
    pub fn new(weight: f64, length: f64, width: f64, height: f64) -> Self {
        Self {
            weight: Some(weight.into()),
            length: Some(length.into()),
            width: Some(width.into()),
            height: Some(height.into()),
            packaging_quantity: Some(1.0.into()),
            ..Self::default()
        }
    }

    pub fn with_quantity(mut self, quantity: u32) -> Self {
        self.packaging_quantity = Some(f64::from(quantity).into());
        self
    }

    pub fn with_freight_class(mut self, freight_class: impl Into<String>) -> Self {
        self.freight_class = Some(FlexNumber::Text(freight_class.into()));
        self
    }

    pub fn with_declared_value(mut self, declared_value: f64) -> Self {
        self.declared_value = Some(declared_value.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Package line after adapter validation and defaulting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedItem {
    pub weight: f64,
    pub length: f64,
    pub width: f64,
    pub height: f64,
    pub packaging_quantity: u32,
    pub declared_value: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub freight_class: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub stackable: bool,
}
