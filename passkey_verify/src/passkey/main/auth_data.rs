use uuid::Uuid;

use crate::config::PASSKEY_MAX_CREDENTIAL_ID_LENGTH;
use crate::passkey::errors::PasskeyError;

use super::cose::CoseKey;

const RP_ID_HASH_LEN: usize = 32;
const FLAGS_OFFSET: usize = 32;
const SIGN_COUNT_OFFSET: usize = 33;
/// rpIdHash (32) + flags (1) + signCount (4)
const FIXED_HEADER_LEN: usize = 37;
const AAGUID_LEN: usize = 16;
const CREDENTIAL_ID_LENGTH_LEN: usize = 2;

/// Flags for AuthenticatorData as defined in WebAuthn Level 3
mod auth_data_flags {
    /// User Present (UP) - Bit 0
    pub(super) const UP: u8 = 1 << 0;
    /// User Verified (UV) - Bit 2
    pub(super) const UV: u8 = 1 << 2;
    /// Backup Eligibility (BE) - Bit 3
    pub(super) const BE: u8 = 1 << 3;
    /// Backup State (BS) - Bit 4
    pub(super) const BS: u8 = 1 << 4;
    /// Attested Credential Data Present - Bit 6
    pub(super) const AT: u8 = 1 << 6;
    /// Extension Data Present - Bit 7
    pub(super) const ED: u8 = 1 << 7;
}

/// The flags byte of authenticator data, unpacked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AuthenticatorDataFlags {
    pub user_present: bool,
    pub user_verified: bool,
    pub backup_eligibility: bool,
    pub backup_state: bool,
    pub attested_credential_data: bool,
    pub extension_data: bool,
}

impl From<u8> for AuthenticatorDataFlags {
    fn from(flags: u8) -> Self {
        Self {
            user_present: flags & auth_data_flags::UP != 0,
            user_verified: flags & auth_data_flags::UV != 0,
            backup_eligibility: flags & auth_data_flags::BE != 0,
            backup_state: flags & auth_data_flags::BS != 0,
            attested_credential_data: flags & auth_data_flags::AT != 0,
            extension_data: flags & auth_data_flags::ED != 0,
        }
    }
}

/// Credential created during registration, present when the AT flag is set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttestedCredentialData<'a> {
    pub aaguid: &'a [u8; 16],
    pub credential_id_length: u16,
    pub credential_id: &'a [u8],
    /// COSE_Key encoded credential public key
    pub credential_public_key: &'a [u8],
}

impl AttestedCredentialData<'_> {
    /// AAGUID in canonical hyphenated form
    pub fn aaguid_string(&self) -> String {
        Uuid::from_bytes(*self.aaguid).hyphenated().to_string()
    }

    pub fn public_key(&self) -> Result<CoseKey, PasskeyError> {
        CoseKey::decode(self.credential_public_key)
    }
}

/// AuthenticatorData structure as defined in WebAuthn Level 3
/// https://www.w3.org/TR/webauthn-3/#sctn-authenticator-data
///
/// A view over the raw bytes: every field borrows from the buffer it was
/// parsed from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatorData<'a> {
    /// SHA-256 hash of the RP ID (32 bytes)
    pub rp_id_hash: &'a [u8; 32],
    pub flags: AuthenticatorDataFlags,
    pub raw_flags: u8,
    /// Signature counter, 32-bit unsigned big-endian integer
    pub sign_count: u32,
    pub attested_credential_data: Option<AttestedCredentialData<'a>>,
    /// Raw CBOR extension outputs, present when the ED flag is set
    pub extensions: Option<&'a [u8]>,
    /// The complete buffer, as signed by the authenticator
    pub raw: &'a [u8],
}

impl<'a> AuthenticatorData<'a> {
    /// Parse authenticator data
    /// Format (minimum 37 bytes):
    /// - RP ID Hash (32 bytes)
    /// - Flags (1 byte)
    /// - Counter (4 bytes)
    /// - Optional: Attested Credential Data
    /// - Optional: Extensions
    pub fn parse(data: &'a [u8]) -> Result<Self, PasskeyError> {
        let header = slice_at(data, 0, FIXED_HEADER_LEN, "authenticator data header")?;

        let rp_id_hash: &[u8; 32] = header[..RP_ID_HASH_LEN]
            .try_into()
            .map_err(|_| PasskeyError::TruncatedBuffer("rpIdHash".to_string()))?;
        let raw_flags = header[FLAGS_OFFSET];
        let flags = AuthenticatorDataFlags::from(raw_flags);
        let sign_count = u32::from_be_bytes([
            header[SIGN_COUNT_OFFSET],
            header[SIGN_COUNT_OFFSET + 1],
            header[SIGN_COUNT_OFFSET + 2],
            header[SIGN_COUNT_OFFSET + 3],
        ]);

        let mut pos = FIXED_HEADER_LEN;

        let attested_credential_data = if flags.attested_credential_data {
            let (attested, next) = parse_attested_credential_data(data, pos)?;
            pos = next;
            Some(attested)
        } else {
            None
        };

        let extensions = if flags.extension_data {
            if pos >= data.len() {
                return Err(PasskeyError::TruncatedBuffer(
                    "ED flag set but no extension data follows".to_string(),
                ));
            }
            let ext = &data[pos..];
            pos = data.len();
            Some(ext)
        } else {
            None
        };

        if pos != data.len() {
            tracing::error!(
                "Authenticator data has {} unexpected trailing bytes",
                data.len() - pos
            );
            return Err(PasskeyError::AuthenticatorData(format!(
                "{} unexpected trailing bytes",
                data.len() - pos
            )));
        }

        let auth_data = Self {
            rp_id_hash,
            flags,
            raw_flags,
            sign_count,
            attested_credential_data,
            extensions,
            raw: data,
        };

        tracing::debug!(
            "Parsed authenticator data: flags={:02x}, sign_count={}, attested={}, extensions={}",
            raw_flags,
            sign_count,
            auth_data.attested_credential_data.is_some(),
            auth_data.extensions.is_some()
        );

        Ok(auth_data)
    }

    /// Check if user was present during the ceremony
    pub fn is_user_present(&self) -> bool {
        self.flags.user_present
    }

    /// Check if user was verified by the authenticator
    pub fn is_user_verified(&self) -> bool {
        self.flags.user_verified
    }

    /// Check if the credential may be backed up (synced passkey)
    pub fn is_backup_eligible(&self) -> bool {
        self.flags.backup_eligibility
    }

    /// Check if this credential is backed up
    pub fn is_backed_up(&self) -> bool {
        self.flags.backup_state
    }

    pub fn has_attested_credential_data(&self) -> bool {
        self.flags.attested_credential_data
    }

    pub fn has_extension_data(&self) -> bool {
        self.flags.extension_data
    }
}

/// Bounds-checked `data[start..start + len]`
fn slice_at<'a>(
    data: &'a [u8],
    start: usize,
    len: usize,
    what: &str,
) -> Result<&'a [u8], PasskeyError> {
    start
        .checked_add(len)
        .filter(|end| *end <= data.len())
        .map(|end| &data[start..end])
        .ok_or_else(|| {
            PasskeyError::TruncatedBuffer(format!(
                "{what} needs bytes {start}..{}, buffer has {}",
                start.saturating_add(len),
                data.len()
            ))
        })
}

fn parse_attested_credential_data(
    data: &[u8],
    start: usize,
) -> Result<(AttestedCredentialData<'_>, usize), PasskeyError> {
    let mut pos = start;

    let aaguid: &[u8; 16] = slice_at(data, pos, AAGUID_LEN, "aaguid")?
        .try_into()
        .map_err(|_| PasskeyError::TruncatedBuffer("aaguid".to_string()))?;
    pos += AAGUID_LEN;

    let len_bytes = slice_at(data, pos, CREDENTIAL_ID_LENGTH_LEN, "credentialIdLength")?;
    let credential_id_length = u16::from_be_bytes([len_bytes[0], len_bytes[1]]);
    pos += CREDENTIAL_ID_LENGTH_LEN;

    if credential_id_length == 0
        || credential_id_length as usize > *PASSKEY_MAX_CREDENTIAL_ID_LENGTH
    {
        tracing::error!("Invalid credential ID length: {}", credential_id_length);
        return Err(PasskeyError::AuthenticatorData(format!(
            "Invalid credential ID length: {credential_id_length}"
        )));
    }

    let credential_id = slice_at(data, pos, credential_id_length as usize, "credentialId")?;
    pos += credential_id.len();

    if pos >= data.len() {
        return Err(PasskeyError::TruncatedBuffer(
            "credential public key missing".to_string(),
        ));
    }

    // The key's own CBOR encoding tells where it ends and extensions begin
    let (_, key_len) = CoseKey::decode_prefix(&data[pos..])?;
    let credential_public_key = &data[pos..pos + key_len];
    pos += key_len;

    Ok((
        AttestedCredentialData {
            aaguid,
            credential_id_length,
            credential_id,
            credential_public_key,
        },
        pos,
    ))
}
