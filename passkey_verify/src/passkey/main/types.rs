use serde::{Deserialize, Serialize};

use crate::passkey::errors::PasskeyError;

/// Credential as serialized by `PublicKeyCredential.toJSON()` in the browser.
///
/// Every binary member is base64url without padding. The response carries the
/// union of the registration and login members; which ones are present
/// depends on the ceremony.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PublicKeyCredentialJson {
    pub id: String,
    pub raw_id: String,
    #[serde(rename = "type")]
    pub type_: String,
    #[serde(default)]
    pub authenticator_attachment: Option<String>,
    #[serde(default)]
    pub client_extension_results: serde_json::Value,
    pub response: AuthenticatorResponseJson,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatorResponseJson {
    #[serde(rename = "clientDataJSON")]
    pub client_data_json: String,
    #[serde(default)]
    pub authenticator_data: Option<String>,

    // Registration (attestation) members
    #[serde(default)]
    pub attestation_object: Option<String>,
    #[serde(default)]
    pub public_key: Option<String>,
    #[serde(default)]
    pub public_key_algorithm: Option<i64>,
    #[serde(default)]
    pub transports: Vec<String>,

    // Login (assertion) members
    #[serde(default)]
    pub signature: Option<String>,
    #[serde(default)]
    pub user_handle: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthenticatorAttachment {
    Platform,
    CrossPlatform,
}

impl AuthenticatorAttachment {
    /// Unknown values are dropped rather than rejected, so newer browsers keep working
    pub(super) fn from_wire(value: Option<&str>) -> Option<Self> {
        match value? {
            "platform" => Some(Self::Platform),
            "cross-platform" => Some(Self::CrossPlatform),
            other => {
                tracing::warn!("Ignoring unknown authenticatorAttachment: {}", other);
                None
            }
        }
    }
}

/// The ceremony a client data blob was produced for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CeremonyType {
    /// Registration, `navigator.credentials.create()`
    Create,
    /// Authentication, `navigator.credentials.get()`
    Get,
}

impl CeremonyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "webauthn.create",
            Self::Get => "webauthn.get",
        }
    }
}

impl std::str::FromStr for CeremonyType {
    type Err = PasskeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "webauthn.create" => Ok(Self::Create),
            "webauthn.get" => Ok(Self::Get),
            other => Err(PasskeyError::UnknownCeremonyType(other.to_string())),
        }
    }
}

/// Parsed `clientDataJSON`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientData {
    pub type_: CeremonyType,
    /// base64url challenge as echoed by the browser
    pub challenge: String,
    pub origin: String,
    pub cross_origin: bool,
    pub top_origin: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WebAuthnClientData {
    #[serde(rename = "type")]
    type_: Option<String>,
    challenge: Option<String>,
    origin: Option<String>,
    #[serde(default)]
    cross_origin: Option<bool>,
    #[serde(default)]
    top_origin: Option<String>,
}

impl ClientData {
    /// Parse the raw UTF-8 JSON bytes exactly as the browser delivered them
    pub fn from_bytes(raw_data: &[u8]) -> Result<Self, PasskeyError> {
        let data_str = std::str::from_utf8(raw_data)
            .map_err(|e| PasskeyError::InvalidEncoding(format!("Invalid UTF-8: {e}")))?;

        let data: WebAuthnClientData = serde_json::from_str(data_str)
            .map_err(|e| PasskeyError::InvalidEncoding(format!("Invalid JSON: {e}")))?;

        let type_ = data
            .type_
            .ok_or_else(|| PasskeyError::ClientData("Missing type".into()))?
            .parse::<CeremonyType>()?;

        Ok(Self {
            type_,
            challenge: data
                .challenge
                .ok_or_else(|| PasskeyError::ClientData("Missing challenge".into()))?,
            origin: data
                .origin
                .ok_or_else(|| PasskeyError::ClientData("Missing origin".into()))?,
            cross_origin: data.cross_origin.unwrap_or(false),
            top_origin: data.top_origin,
        })
    }
}
