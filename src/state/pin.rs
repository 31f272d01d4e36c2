use std::{fmt, str::FromStr};

use rand::Rng;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Number of digits in a session PIN.
pub const PIN_LEN: usize = 6;

/// Short numeric code players type to join a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Pin([u8; PIN_LEN]);

/// Reasons a string is not a valid PIN.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PinError {
    #[error("PIN must be exactly {PIN_LEN} characters long")]
    WrongLength,
    #[error("PIN must only contain digits")]
    NotNumeric,
}

impl Pin {
    /// Draw a random PIN.
    pub fn random() -> Self {
        let mut rng = rand::rng();
        let mut digits = [0u8; PIN_LEN];
        for digit in &mut digits {
            *digit = b'0' + rng.random_range(0..10);
        }
        Self(digits)
    }

    /// Borrow the PIN as a string slice.
    pub fn as_str(&self) -> &str {
        // Only ASCII digits are ever stored.
        std::str::from_utf8(&self.0).unwrap_or_default()
    }
}

impl FromStr for Pin {
    type Err = PinError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let bytes = value.trim().as_bytes();
        if bytes.len() != PIN_LEN {
            return Err(PinError::WrongLength);
        }
        if !bytes.iter().all(u8::is_ascii_digit) {
            return Err(PinError::NotNumeric);
        }

        let mut digits = [0u8; PIN_LEN];
        digits.copy_from_slice(bytes);
        Ok(Self(digits))
    }
}

impl fmt::Display for Pin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Pin {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Pin {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_pins_are_well_formed() {
        for _ in 0..100 {
            let pin = Pin::random();
            let text = pin.to_string();
            assert_eq!(text.len(), PIN_LEN);
            assert_eq!(text.parse::<Pin>().unwrap(), pin);
        }
    }

    #[test]
    fn malformed_pins_are_rejected() {
        assert_eq!("12345".parse::<Pin>(), Err(PinError::WrongLength));
        assert_eq!("1234567".parse::<Pin>(), Err(PinError::WrongLength));
        assert_eq!("12a456".parse::<Pin>(), Err(PinError::NotNumeric));
        assert_eq!("004200".parse::<Pin>().unwrap().as_str(), "004200");
    }

    #[test]
    fn serializes_as_a_string() {
        let pin: Pin = "123456".parse().unwrap();
        assert_eq!(serde_json::to_string(&pin).unwrap(), "\"123456\"");
    }
}
