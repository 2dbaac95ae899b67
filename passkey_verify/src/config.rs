//! Central configuration for the passkey_verify crate

use std::sync::LazyLock;

/// Default upper bound for `credentialIdLength`, as set by WebAuthn Level 3
pub(crate) const DEFAULT_MAX_CREDENTIAL_ID_LENGTH: usize = 1023;

/// Optional path to an extra AAGUID dataset merged over the bundled one
///
/// The file uses the same shape as the community `combined_aaguid.json`.
pub(crate) static PASSKEY_AAGUID_JSON: LazyLock<Option<String>> =
    LazyLock::new(|| std::env::var("PASSKEY_AAGUID_JSON").ok());

/// Upper bound accepted for the credential ID inside attested credential data
pub(crate) static PASSKEY_MAX_CREDENTIAL_ID_LENGTH: LazyLock<usize> = LazyLock::new(|| {
    parse_max_credential_id_length(std::env::var("PASSKEY_MAX_CREDENTIAL_ID_LENGTH").ok())
});

fn parse_max_credential_id_length(value: Option<String>) -> usize {
    match value {
        None => DEFAULT_MAX_CREDENTIAL_ID_LENGTH,
        Some(v) => match v.parse::<usize>() {
            Ok(n) if n > 0 && n <= u16::MAX as usize => n,
            _ => {
                tracing::warn!(
                    "Invalid PASSKEY_MAX_CREDENTIAL_ID_LENGTH: {}. Using default {}",
                    v,
                    DEFAULT_MAX_CREDENTIAL_ID_LENGTH
                );
                DEFAULT_MAX_CREDENTIAL_ID_LENGTH
            }
        },
    }
}
