use ciborium::value::Value as CborValue;

use crate::passkey::errors::PasskeyError;

use super::super::auth_data::AuthenticatorData;

/// Attestation statement formats registered for WebAuthn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttestationFormat {
    Packed,
    Tpm,
    AndroidKey,
    AndroidSafetynet,
    FidoU2f,
    Apple,
    None,
}

impl AttestationFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Packed => "packed",
            Self::Tpm => "tpm",
            Self::AndroidKey => "android-key",
            Self::AndroidSafetynet => "android-safetynet",
            Self::FidoU2f => "fido-u2f",
            Self::Apple => "apple",
            Self::None => "none",
        }
    }
}

impl std::str::FromStr for AttestationFormat {
    type Err = PasskeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "packed" => Ok(Self::Packed),
            "tpm" => Ok(Self::Tpm),
            "android-key" => Ok(Self::AndroidKey),
            "android-safetynet" => Ok(Self::AndroidSafetynet),
            "fido-u2f" => Ok(Self::FidoU2f),
            "apple" => Ok(Self::Apple),
            "none" => Ok(Self::None),
            other => Err(PasskeyError::Format(format!(
                "Unsupported attestation format: {other}"
            ))),
        }
    }
}

/// Decoded CBOR attestation object.
///
/// Only the top-level map is decoded eagerly; `authData` stays raw and is
/// parsed on demand through [`AttestationObject::auth_data`].
#[derive(Debug, Clone, PartialEq)]
pub struct AttestationObject {
    pub fmt: AttestationFormat,
    /// Format-specific statement, opaque to this crate
    pub att_stmt: Vec<(CborValue, CborValue)>,
    pub raw_auth_data: Vec<u8>,
}

impl AttestationObject {
    pub fn from_cbor(attestation_bytes: &[u8]) -> Result<Self, PasskeyError> {
        let attestation_cbor: CborValue = ciborium::de::from_reader(attestation_bytes)
            .map_err(|e| PasskeyError::Format(format!("Invalid CBOR data: {e}")))?;

        let CborValue::Map(map) = attestation_cbor else {
            return Err(PasskeyError::Format(
                "Invalid attestation format".to_string(),
            ));
        };

        let mut fmt = None;
        let mut auth_data = None;
        let mut att_stmt = None;

        for (key, value) in map {
            if let CborValue::Text(k) = key {
                match (k.as_str(), value) {
                    ("fmt", CborValue::Text(f)) => fmt = Some(f),
                    ("authData", CborValue::Bytes(data)) => auth_data = Some(data),
                    ("attStmt", CborValue::Map(stmt)) => att_stmt = Some(stmt),
                    (other, _) => {
                        tracing::debug!("Ignoring attestation object member: {}", other);
                    }
                }
            }
        }

        match (fmt, auth_data, att_stmt) {
            (Some(f), Some(d), Some(s)) => {
                let fmt = f.parse::<AttestationFormat>()?;
                tracing::debug!(
                    "Attestation format: {}, auth data: {} bytes, statement entries: {}",
                    fmt.as_str(),
                    d.len(),
                    s.len()
                );
                Ok(Self {
                    fmt,
                    att_stmt: s,
                    raw_auth_data: d,
                })
            }
            _ => Err(PasskeyError::Format(
                "Missing required attestation data".to_string(),
            )),
        }
    }

    pub fn auth_data(&self) -> Result<AuthenticatorData<'_>, PasskeyError> {
        AuthenticatorData::parse(&self.raw_auth_data)
    }
}
