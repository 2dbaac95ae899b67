mod errors;
mod main;

pub use errors::PasskeyError;

pub use main::{
    AAGUID_URL, AaguidKey, AaguidRegistry, AssertionCredential, AttestationCredential,
    AttestationFormat, AttestationObject, AttestedCredentialData, AuthenticatorAttachment,
    AuthenticatorData, AuthenticatorDataFlags, AuthenticatorInfo, AuthenticatorResponseJson,
    AuthnPublicKeyCredential, CeremonyType, ClientData, CoseAlgorithm, CoseKey, PublicKey,
    PublicKeyCredentialJson, aaguid_registry, der_to_raw_signature, fetch_aaguid_registry,
    get_public_key, is_assertion, is_attestation, parse_uuid, stringify_uuid,
    verify_none_attestation, verify_rp_id_hash, verify_signature,
};
