use ring::digest;
use subtle::ConstantTimeEq;

use crate::passkey::errors::PasskeyError;
use crate::utils::base64url_decode;

use super::attestation::AttestationObject;
use super::auth_data::AuthenticatorData;
use super::cose::CoseAlgorithm;
use super::types::{AuthenticatorAttachment, CeremonyType, ClientData, PublicKeyCredentialJson};
use super::verify::{PublicKey, verify_signature};

const PUBLIC_KEY_CREDENTIAL_TYPE: &str = "public-key";

/// Registration response with every binary member decoded.
///
/// Only the client data is parsed up front, since its `type` decides the
/// variant. Authenticator data and the attestation object are parsed from the
/// raw bytes whenever they are asked for.
#[derive(Debug, Clone)]
pub struct AttestationCredential {
    pub id: String,
    pub raw_id: Vec<u8>,
    pub authenticator_attachment: Option<AuthenticatorAttachment>,
    pub client_extension_results: serde_json::Value,
    pub client_data: ClientData,
    pub raw_client_data: Vec<u8>,
    pub raw_auth_data: Vec<u8>,
    pub raw_attestation_object: Vec<u8>,
    /// DER SubjectPublicKeyInfo, absent on older browsers
    pub public_key: Option<Vec<u8>>,
    pub public_key_algorithm: Option<i64>,
    pub transports: Vec<String>,
}

impl AttestationCredential {
    pub fn auth_data(&self) -> Result<AuthenticatorData<'_>, PasskeyError> {
        AuthenticatorData::parse(&self.raw_auth_data)
    }

    pub fn attestation(&self) -> Result<AttestationObject, PasskeyError> {
        AttestationObject::from_cbor(&self.raw_attestation_object)
    }

    /// AAGUID of the authenticator model that created the credential
    pub fn aaguid(&self) -> Result<[u8; 16], PasskeyError> {
        let auth_data = self.auth_data()?;
        let attested = auth_data.attested_credential_data.ok_or_else(|| {
            PasskeyError::AuthenticatorData("No attested credential data".to_string())
        })?;
        Ok(*attested.aaguid)
    }
}

/// Login response with every binary member decoded
#[derive(Debug, Clone)]
pub struct AssertionCredential {
    pub id: String,
    pub raw_id: Vec<u8>,
    pub authenticator_attachment: Option<AuthenticatorAttachment>,
    pub client_extension_results: serde_json::Value,
    pub client_data: ClientData,
    pub raw_client_data: Vec<u8>,
    pub raw_auth_data: Vec<u8>,
    /// DER for ECDSA, raw for Ed25519 and RSA
    pub signature: Vec<u8>,
    pub user_handle: Option<Vec<u8>>,
}

impl AssertionCredential {
    pub fn auth_data(&self) -> Result<AuthenticatorData<'_>, PasskeyError> {
        AuthenticatorData::parse(&self.raw_auth_data)
    }

    pub fn verify_signature(&self, public_key: &PublicKey) -> Result<bool, PasskeyError> {
        verify_signature(self, public_key)
    }
}

#[derive(Debug, Clone)]
pub enum AuthnPublicKeyCredential {
    Attestation(AttestationCredential),
    Assertion(AssertionCredential),
}

impl AuthnPublicKeyCredential {
    /// Decode a browser credential.
    ///
    /// Fails with `InvalidEncoding` on bad base64url or client data, and with
    /// `UnknownCeremonyType` when the client data type is neither
    /// `webauthn.create` nor `webauthn.get`.
    pub fn from_json(wire: &PublicKeyCredentialJson) -> Result<Self, PasskeyError> {
        if wire.type_ != PUBLIC_KEY_CREDENTIAL_TYPE {
            return Err(PasskeyError::Format(format!(
                "Invalid credential type: {}",
                wire.type_
            )));
        }

        let raw_id = base64url_decode(&wire.raw_id)?;
        let id_bytes = base64url_decode(&wire.id)?;
        if id_bytes != raw_id {
            return Err(PasskeyError::Format(
                "Credential id does not match rawId".to_string(),
            ));
        }

        let response = &wire.response;
        let raw_client_data = base64url_decode(&response.client_data_json)?;
        let client_data = ClientData::from_bytes(&raw_client_data)?;
        let authenticator_attachment =
            AuthenticatorAttachment::from_wire(wire.authenticator_attachment.as_deref());
        let raw_auth_data = response
            .authenticator_data
            .as_deref()
            .map(base64url_decode)
            .transpose()?;

        tracing::debug!(
            "Decoding {} credential {}",
            client_data.type_.as_str(),
            wire.id
        );

        let credential = match client_data.type_ {
            CeremonyType::Create => {
                let attestation_b64 = response.attestation_object.as_deref().ok_or_else(|| {
                    PasskeyError::Format("Missing attestationObject".to_string())
                })?;
                let raw_attestation_object = base64url_decode(attestation_b64)?;

                let attestation = AttestationObject::from_cbor(&raw_attestation_object)?;
                let raw_auth_data = match raw_auth_data {
                    Some(data) if data != attestation.raw_auth_data => {
                        tracing::error!(
                            "authenticatorData differs from attestation object authData"
                        );
                        return Err(PasskeyError::Format(
                            "authenticatorData does not match attestationObject authData"
                                .to_string(),
                        ));
                    }
                    Some(data) => data,
                    None => {
                        tracing::debug!("authenticatorData absent, using attestation object");
                        attestation.raw_auth_data
                    }
                };

                let public_key = response
                    .public_key
                    .as_deref()
                    .map(base64url_decode)
                    .transpose()?;

                Self::Attestation(AttestationCredential {
                    id: wire.id.clone(),
                    raw_id,
                    authenticator_attachment,
                    client_extension_results: wire.client_extension_results.clone(),
                    client_data,
                    raw_client_data,
                    raw_auth_data,
                    raw_attestation_object,
                    public_key,
                    public_key_algorithm: response.public_key_algorithm,
                    transports: response.transports.clone(),
                })
            }
            CeremonyType::Get => {
                let raw_auth_data = raw_auth_data.ok_or_else(|| {
                    PasskeyError::Format("Missing authenticatorData".to_string())
                })?;
                let signature_b64 = response
                    .signature
                    .as_deref()
                    .ok_or_else(|| PasskeyError::Format("Missing signature".to_string()))?;
                let signature = base64url_decode(signature_b64)?;
                let user_handle = response
                    .user_handle
                    .as_deref()
                    .map(base64url_decode)
                    .transpose()?;

                Self::Assertion(AssertionCredential {
                    id: wire.id.clone(),
                    raw_id,
                    authenticator_attachment,
                    client_extension_results: wire.client_extension_results.clone(),
                    client_data,
                    raw_client_data,
                    raw_auth_data,
                    signature,
                    user_handle,
                })
            }
        };

        Ok(credential)
    }

    pub fn from_json_str(json: &str) -> Result<Self, PasskeyError> {
        let wire: PublicKeyCredentialJson = serde_json::from_str(json)
            .map_err(|e| PasskeyError::InvalidEncoding(format!("Invalid credential JSON: {e}")))?;
        Self::from_json(&wire)
    }

    pub fn id(&self) -> &str {
        match self {
            Self::Attestation(c) => &c.id,
            Self::Assertion(c) => &c.id,
        }
    }

    pub fn raw_id(&self) -> &[u8] {
        match self {
            Self::Attestation(c) => &c.raw_id,
            Self::Assertion(c) => &c.raw_id,
        }
    }

    pub fn authenticator_attachment(&self) -> Option<AuthenticatorAttachment> {
        match self {
            Self::Attestation(c) => c.authenticator_attachment,
            Self::Assertion(c) => c.authenticator_attachment,
        }
    }

    pub fn client_data(&self) -> &ClientData {
        match self {
            Self::Attestation(c) => &c.client_data,
            Self::Assertion(c) => &c.client_data,
        }
    }

    pub fn raw_client_data(&self) -> &[u8] {
        match self {
            Self::Attestation(c) => &c.raw_client_data,
            Self::Assertion(c) => &c.raw_client_data,
        }
    }

    pub fn raw_auth_data(&self) -> &[u8] {
        match self {
            Self::Attestation(c) => &c.raw_auth_data,
            Self::Assertion(c) => &c.raw_auth_data,
        }
    }

    pub fn auth_data(&self) -> Result<AuthenticatorData<'_>, PasskeyError> {
        AuthenticatorData::parse(self.raw_auth_data())
    }

    pub fn as_attestation(&self) -> Option<&AttestationCredential> {
        match self {
            Self::Attestation(c) => Some(c),
            Self::Assertion(_) => None,
        }
    }

    pub fn as_assertion(&self) -> Option<&AssertionCredential> {
        match self {
            Self::Assertion(c) => Some(c),
            Self::Attestation(_) => None,
        }
    }
}

/// True for a registration (`webauthn.create`) credential
pub fn is_attestation(cred: &AuthnPublicKeyCredential) -> bool {
    cred.client_data().type_ == CeremonyType::Create
}

/// True for a login (`webauthn.get`) credential
pub fn is_assertion(cred: &AuthnPublicKeyCredential) -> bool {
    cred.client_data().type_ == CeremonyType::Get
}

/// Import the public key of a newly registered credential.
///
/// Uses the SPKI `publicKey` member with `publicKeyAlgorithm` when the browser
/// sent them, otherwise the COSE key from the attested credential data.
pub fn get_public_key(cred: &AttestationCredential) -> Result<PublicKey, PasskeyError> {
    if let Some(alg) = cred.public_key_algorithm {
        let algorithm = CoseAlgorithm::from_i64(alg)?;
        if let Some(spki) = cred.public_key.as_deref() {
            return PublicKey::from_spki(spki, algorithm);
        }
    }

    tracing::debug!("No SPKI public key in response, using COSE key from authenticator data");
    let auth_data = cred.auth_data()?;
    let attested = auth_data.attested_credential_data.ok_or_else(|| {
        PasskeyError::AuthenticatorData("No attested credential data".to_string())
    })?;
    let cose_key = attested.public_key()?;

    if let Some(alg) = cred.public_key_algorithm {
        if cose_key.alg().is_some_and(|key_alg| key_alg != alg) {
            return Err(PasskeyError::Crypto(format!(
                "publicKeyAlgorithm {alg} does not match COSE key algorithm"
            )));
        }
    }

    PublicKey::from_cose(&cose_key)
}

/// Compare SHA-256(`rp_id`) with the credential's rpIdHash in constant time.
///
/// Returns false when the authenticator data cannot be parsed.
pub fn verify_rp_id_hash(cred: &AuthnPublicKeyCredential, rp_id: &str) -> bool {
    let auth_data = match cred.auth_data() {
        Ok(auth_data) => auth_data,
        Err(e) => {
            tracing::warn!("Cannot check rpIdHash: {}", e);
            return false;
        }
    };

    let expected = digest::digest(&digest::SHA256, rp_id.as_bytes());
    let matched: bool = auth_data.rp_id_hash.ct_eq(expected.as_ref()).into();
    if !matched {
        tracing::warn!("rpIdHash does not match relying party {}", rp_id);
    }
    matched
}
