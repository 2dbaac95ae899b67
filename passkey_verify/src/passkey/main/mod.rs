mod aaguid;
mod asn1;
mod attestation;
mod auth_data;
mod cose;
mod credential;
#[cfg(test)]
pub(crate) mod test_utils;
mod types;
mod uuid_codec;
mod verify;

pub use aaguid::{
    AAGUID_URL, AaguidKey, AaguidRegistry, AuthenticatorInfo, aaguid_registry,
    fetch_aaguid_registry,
};
pub use asn1::der_to_raw_signature;
pub use attestation::{AttestationFormat, AttestationObject, verify_none_attestation};
pub use auth_data::{AttestedCredentialData, AuthenticatorData, AuthenticatorDataFlags};
pub use cose::{CoseAlgorithm, CoseKey};
pub use credential::{
    AssertionCredential, AttestationCredential, AuthnPublicKeyCredential, get_public_key,
    is_assertion, is_attestation, verify_rp_id_hash,
};
pub use types::{
    AuthenticatorAttachment, AuthenticatorResponseJson, CeremonyType, ClientData,
    PublicKeyCredentialJson,
};
pub use uuid_codec::{parse_uuid, stringify_uuid};
pub use verify::{PublicKey, verify_signature};
