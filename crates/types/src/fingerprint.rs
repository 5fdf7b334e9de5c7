//! Content fingerprints for single-issuance records.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const FINGERPRINT_DOMAIN: &[u8] = b"CERTLEDGER_CERTIFICATE_FINGERPRINT";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FingerprintParseError {
    #[error("Invalid fingerprint hex: {0}")]
    InvalidHex(String),

    #[error("Invalid fingerprint length: expected 32 bytes, got {0}")]
    InvalidLength(usize),
}

/// Deterministic SHA-256 digest of a record's identifying fields.
///
/// Serialized as lowercase hex so it can key JSON maps.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    /// Digest an ordered list of fields.
    ///
    /// Each field is length-prefixed, so `("ab", "c")` and `("a", "bc")`
    /// produce different fingerprints.
    pub fn of_fields<'a>(fields: impl IntoIterator<Item = &'a str>) -> Self {
        let mut h = Sha256::new();
        h.update(FINGERPRINT_DOMAIN);
        for field in fields {
            h.update((field.len() as u64).to_le_bytes());
            h.update(field.as_bytes());
        }
        Self(h.finalize().into())
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Fingerprint({})", self.to_hex())
    }
}

impl FromStr for Fingerprint {
    type Err = FingerprintParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = hex::decode(s).map_err(|e| FingerprintParseError::InvalidHex(e.to_string()))?;
        let len = bytes.len();
        let array: [u8; 32] = bytes
            .try_into()
            .map_err(|_| FingerprintParseError::InvalidLength(len))?;
        Ok(Self(array))
    }
}

impl Serialize for Fingerprint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Fingerprint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        encoded.parse().map_err(serde::de::Error::custom)
    }
}
