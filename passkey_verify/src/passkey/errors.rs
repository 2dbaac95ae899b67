use thiserror::Error;

use crate::utils::UtilError;

/// Errors that can occur while decoding or verifying a WebAuthn credential.
///
/// Every parsing failure is final for the verification attempt it belongs to.
/// A signature that simply does not match is not an error; the verifier reports
/// it as `Ok(false)`.
#[derive(Debug, Error)]
pub enum PasskeyError {
    /// DER signature violates the SEQUENCE/INTEGER tag or length rules
    #[error("Malformed signature: {0}")]
    MalformedSignature(String),

    /// A computed byte range runs past the end of the available buffer
    #[error("Truncated buffer: {0}")]
    TruncatedBuffer(String),

    /// COSE algorithm identifier or key type with no supported mapping
    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// Client data `type` is neither "webauthn.create" nor "webauthn.get"
    #[error("Unknown ceremony type: {0}")]
    UnknownCeremonyType(String),

    /// base64url, UTF-8 or JSON decoding failure on a wire field
    #[error("Invalid encoding: {0}")]
    InvalidEncoding(String),

    /// String is not a canonical hyphenated UUID
    #[error("Invalid UUID format: {0}")]
    InvalidFormat(String),

    /// Byte buffer has the wrong length for the requested conversion
    #[error("Invalid length: {0}")]
    InvalidLength(String),

    /// Client data JSON is missing a required member
    #[error("Invalid client data: {0}")]
    ClientData(String),

    /// Authenticator data is structurally invalid
    #[error("Invalid authenticator data: {0}")]
    AuthenticatorData(String),

    /// Credential, CBOR structure or attestation statement does not have the expected shape
    #[error("Invalid format: {0}")]
    Format(String),

    /// Public key material could not be imported
    #[error("Crypto error: {0}")]
    Crypto(String),

    /// AAGUID dataset could not be loaded or fetched
    #[error("Registry error: {0}")]
    Registry(String),
}

impl From<UtilError> for PasskeyError {
    fn from(e: UtilError) -> Self {
        PasskeyError::InvalidEncoding(e.to_string())
    }
}
