//! Type-safe debtor identifier.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use snafu::Snafu;

/// Errors that can occur when parsing a CUIT.
#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
pub enum CuitError {
    #[snafu(display("invalid cuit: '{value}' - must be exactly 11 numeric digits"))]
    InvalidCuit { value: String },
}

/// An 11-digit Argentine national tax identifier.
///
/// Only the format is validated (length and digits). Check-digit
/// validation is out of scope for this pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Cuit(String);

impl Cuit {
    /// Create a new CUIT, validating the format.
    pub fn new(value: impl Into<String>) -> Result<Self, CuitError> {
        let value = value.into();
        if value.len() != 11 || !value.bytes().all(|b| b.is_ascii_digit()) {
            return Err(CuitError::InvalidCuit { value });
        }
        Ok(Self(value))
    }

    /// Create a new CUIT without validation.
    ///
    /// # Panics
    ///
    /// Panics if the value is not 11 numeric digits.
    pub fn new_unchecked(value: impl Into<String>) -> Self {
        Self::new(value).expect("cuit must be valid")
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Cuit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for Cuit {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Cuit {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Cuit::new(value).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_cuit() {
        let cuit = Cuit::new("20003905528").unwrap();
        assert_eq!(cuit.as_str(), "20003905528");
    }

    #[test]
    fn test_rejects_short_cuit() {
        assert!(Cuit::new("2000390552").is_err());
    }

    #[test]
    fn test_rejects_non_numeric_cuit() {
        assert!(Cuit::new("20-00390552").is_err());
        assert!(Cuit::new("2000390552a").is_err());
    }

    #[test]
    fn test_serde_round_trip() {
        let cuit = Cuit::new_unchecked("20003905528");
        let encoded = serde_json::to_string(&cuit).unwrap();
        assert_eq!(encoded, "\"20003905528\"");
        let decoded: Cuit = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, cuit);
    }

    #[test]
    fn test_serde_rejects_invalid() {
        assert!(serde_json::from_str::<Cuit>("\"not-a-cuit\"").is_err());
    }
}
