//! passkey_verify - Server-side WebAuthn credential decoding and verification
//!
//! This crate turns the JSON a browser produces from `PublicKeyCredential.toJSON()`
//! into typed registration (attestation) and login (assertion) credentials, parses
//! the binary structures they carry, and verifies assertion signatures.
//!
//! Challenge storage, relying-party policy and transport concerns are left to the
//! caller.

mod config;
mod passkey;
mod utils;

pub use passkey::{
    AaguidKey, AaguidRegistry, AssertionCredential, AttestationCredential, AttestationFormat,
    AttestationObject, AttestedCredentialData, AuthenticatorAttachment, AuthenticatorData,
    AuthenticatorDataFlags, AuthenticatorInfo, AuthenticatorResponseJson,
    AuthnPublicKeyCredential, CeremonyType, ClientData, CoseAlgorithm, CoseKey, PasskeyError,
    PublicKey, PublicKeyCredentialJson, aaguid_registry, der_to_raw_signature,
    fetch_aaguid_registry, get_public_key, is_assertion, is_attestation, parse_uuid,
    stringify_uuid, verify_none_attestation, verify_rp_id_hash, verify_signature,
};

pub use passkey::AAGUID_URL;
