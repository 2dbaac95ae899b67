//! Conversion between the 16-byte binary UUID form and its canonical
//! hyphenated string (8-4-4-4-12), as used for AAGUIDs.

use uuid::Uuid;

use crate::passkey::errors::PasskeyError;

const UUID_STR_LEN: usize = 36;
const HYPHEN_POSITIONS: [usize; 4] = [8, 13, 18, 23];

/// Parse a canonical hyphenated UUID string into its 16 bytes.
///
/// Hex digits may be upper or lower case. Simple, braced and URN forms are rejected.
pub fn parse_uuid(uuid: &str) -> Result<[u8; 16], PasskeyError> {
    if uuid.len() != UUID_STR_LEN {
        return Err(PasskeyError::InvalidFormat(format!(
            "UUID must be {} characters, got {}",
            UUID_STR_LEN,
            uuid.len()
        )));
    }

    let bytes = uuid.as_bytes();
    for (i, b) in bytes.iter().enumerate() {
        let is_hyphen_slot = HYPHEN_POSITIONS.contains(&i);
        if is_hyphen_slot != (*b == b'-') {
            return Err(PasskeyError::InvalidFormat(format!(
                "Unexpected character at position {i} in UUID"
            )));
        }
    }

    let parsed = Uuid::try_parse(uuid)
        .map_err(|e| PasskeyError::InvalidFormat(format!("Invalid UUID: {e}")))?;
    Ok(*parsed.as_bytes())
}

/// Render 16 bytes as a lowercase canonical UUID string.
pub fn stringify_uuid(bytes: &[u8]) -> Result<String, PasskeyError> {
    let uuid = Uuid::from_slice(bytes).map_err(|_| {
        PasskeyError::InvalidLength(format!("UUID must be 16 bytes, got {}", bytes.len()))
    })?;
    Ok(uuid.hyphenated().to_string())
}
