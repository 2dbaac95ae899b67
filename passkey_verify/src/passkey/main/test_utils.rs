//! Test utilities for passkey module tests
//!
//! Builders for the binary structures an authenticator produces (authenticator
//! data, COSE keys, CBOR attestation objects, DER signatures) and for the wire
//! JSON a browser sends, plus freshly generated signing keys.

use ciborium::value::Value as CborValue;
use ring::digest;
use ring::rand::SystemRandom;
use ring::signature::{
    ECDSA_P256_SHA256_ASN1_SIGNING, EcdsaKeyPair, Ed25519KeyPair, KeyPair,
};
use serde_json::json;

use crate::utils::base64url_encode;

pub(crate) const TEST_RP_ID: &str = "example.com";
pub(crate) const TEST_ORIGIN: &str = "https://example.com";

pub(crate) const FLAG_UP: u8 = 0x01;
pub(crate) const FLAG_UV: u8 = 0x04;
pub(crate) const FLAG_BE: u8 = 0x08;
pub(crate) const FLAG_BS: u8 = 0x10;
pub(crate) const FLAG_AT: u8 = 0x40;
pub(crate) const FLAG_ED: u8 = 0x80;

pub(crate) const GPM_AAGUID: [u8; 16] = [
    234, 155, 141, 102, 77, 1, 29, 33, 60, 228, 182, 180, 140, 181, 117, 212,
];

/// DER prefix of a P-256 SubjectPublicKeyInfo, followed by the 65-byte point
const P256_SPKI_PREFIX: [u8; 26] = [
    0x30, 0x59, 0x30, 0x13, 0x06, 0x07, 0x2a, 0x86, 0x48, 0xce, 0x3d, 0x02, 0x01, 0x06, 0x08,
    0x2a, 0x86, 0x48, 0xce, 0x3d, 0x03, 0x01, 0x07, 0x03, 0x42, 0x00,
];

/// DER prefix of an Ed25519 SubjectPublicKeyInfo, followed by the 32-byte key
const ED25519_SPKI_PREFIX: [u8; 12] = [
    0x30, 0x2a, 0x30, 0x05, 0x06, 0x03, 0x2b, 0x65, 0x70, 0x03, 0x21, 0x00,
];

pub(crate) fn hex_to_bytes(hex: &str) -> Vec<u8> {
    (0..hex.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&hex[i..i + 2], 16).unwrap())
        .collect()
}

pub(crate) fn sha256(data: &[u8]) -> Vec<u8> {
    digest::digest(&digest::SHA256, data).as_ref().to_vec()
}

fn der_integer(component: &[u8]) -> Vec<u8> {
    let first_non_zero = component
        .iter()
        .position(|b| *b != 0)
        .unwrap_or(component.len() - 1);
    let trimmed = &component[first_non_zero..];

    let mut out = vec![0x02];
    if trimmed[0] & 0x80 != 0 {
        out.push((trimmed.len() + 1) as u8);
        out.push(0x00);
    } else {
        out.push(trimmed.len() as u8);
    }
    out.extend_from_slice(trimmed);
    out
}

/// Encode two big-endian scalars as a minimal DER ECDSA signature
pub(crate) fn encode_der_signature(r: &[u8], s: &[u8]) -> Vec<u8> {
    let r = der_integer(r);
    let s = der_integer(s);
    let mut out = vec![0x30, (r.len() + s.len()) as u8];
    out.extend_from_slice(&r);
    out.extend_from_slice(&s);
    out
}

pub(crate) fn cbor_bytes(value: &CborValue) -> Vec<u8> {
    let mut out = Vec::new();
    ciborium::ser::into_writer(value, &mut out).unwrap();
    out
}

pub(crate) fn ec2_cose_key(x: &[u8], y: &[u8]) -> Vec<u8> {
    cbor_bytes(&CborValue::Map(vec![
        (CborValue::Integer(1i64.into()), CborValue::Integer(2i64.into())),
        (CborValue::Integer(3i64.into()), CborValue::Integer((-7i64).into())),
        (CborValue::Integer((-1i64).into()), CborValue::Integer(1i64.into())),
        (CborValue::Integer((-2i64).into()), CborValue::Bytes(x.to_vec())),
        (CborValue::Integer((-3i64).into()), CborValue::Bytes(y.to_vec())),
    ]))
}

pub(crate) fn okp_cose_key(x: &[u8]) -> Vec<u8> {
    cbor_bytes(&CborValue::Map(vec![
        (CborValue::Integer(1i64.into()), CborValue::Integer(1i64.into())),
        (CborValue::Integer(3i64.into()), CborValue::Integer((-8i64).into())),
        (CborValue::Integer((-1i64).into()), CborValue::Integer(6i64.into())),
        (CborValue::Integer((-2i64).into()), CborValue::Bytes(x.to_vec())),
    ]))
}

pub(crate) fn extensions_cbor() -> Vec<u8> {
    cbor_bytes(&CborValue::Map(vec![(
        CborValue::Text("credProtect".to_string()),
        CborValue::Integer(2i64.into()),
    )]))
}

/// Attested credential data: aaguid, 2-byte length, credential id, COSE key
pub(crate) struct AttestedFixture {
    pub(crate) aaguid: [u8; 16],
    pub(crate) credential_id: Vec<u8>,
    pub(crate) cose_key: Vec<u8>,
}

pub(crate) fn build_auth_data(
    rp_id: &str,
    flags: u8,
    counter: u32,
    attested: Option<&AttestedFixture>,
    extensions: Option<&[u8]>,
) -> Vec<u8> {
    let mut data = Vec::new();
    data.extend_from_slice(&sha256(rp_id.as_bytes()));
    data.push(flags);
    data.extend_from_slice(&counter.to_be_bytes());
    if let Some(a) = attested {
        data.extend_from_slice(&a.aaguid);
        data.extend_from_slice(&(a.credential_id.len() as u16).to_be_bytes());
        data.extend_from_slice(&a.credential_id);
        data.extend_from_slice(&a.cose_key);
    }
    if let Some(ext) = extensions {
        data.extend_from_slice(ext);
    }
    data
}

pub(crate) fn build_attestation_object(
    fmt: &str,
    att_stmt: Vec<(CborValue, CborValue)>,
    auth_data: &[u8],
) -> Vec<u8> {
    cbor_bytes(&CborValue::Map(vec![
        (
            CborValue::Text("fmt".to_string()),
            CborValue::Text(fmt.to_string()),
        ),
        (
            CborValue::Text("attStmt".to_string()),
            CborValue::Map(att_stmt),
        ),
        (
            CborValue::Text("authData".to_string()),
            CborValue::Bytes(auth_data.to_vec()),
        ),
    ]))
}

pub(crate) fn client_data_json(type_: &str, challenge: &str) -> Vec<u8> {
    json!({
        "type": type_,
        "challenge": challenge,
        "origin": TEST_ORIGIN,
        "crossOrigin": false,
    })
    .to_string()
    .into_bytes()
}

/// Freshly generated P-256 key pair
pub(crate) struct EcdsaFixture {
    pub(crate) key_pair: EcdsaKeyPair,
    rng: SystemRandom,
}

impl EcdsaFixture {
    pub(crate) fn generate() -> Self {
        let rng = SystemRandom::new();
        let pkcs8 = EcdsaKeyPair::generate_pkcs8(&ECDSA_P256_SHA256_ASN1_SIGNING, &rng).unwrap();
        let key_pair =
            EcdsaKeyPair::from_pkcs8(&ECDSA_P256_SHA256_ASN1_SIGNING, pkcs8.as_ref(), &rng)
                .unwrap();
        Self { key_pair, rng }
    }

    pub(crate) fn point(&self) -> &[u8] {
        self.key_pair.public_key().as_ref()
    }

    pub(crate) fn spki(&self) -> Vec<u8> {
        let mut out = P256_SPKI_PREFIX.to_vec();
        out.extend_from_slice(self.point());
        out
    }

    pub(crate) fn cose_key(&self) -> Vec<u8> {
        let point = self.point();
        ec2_cose_key(&point[1..33], &point[33..65])
    }

    /// DER-encoded signature, as an authenticator returns it
    pub(crate) fn sign(&self, message: &[u8]) -> Vec<u8> {
        self.key_pair
            .sign(&self.rng, message)
            .unwrap()
            .as_ref()
            .to_vec()
    }
}

/// Freshly generated Ed25519 key pair
pub(crate) struct Ed25519Fixture {
    pub(crate) key_pair: Ed25519KeyPair,
}

impl Ed25519Fixture {
    pub(crate) fn generate() -> Self {
        let rng = SystemRandom::new();
        let pkcs8 = Ed25519KeyPair::generate_pkcs8(&rng).unwrap();
        let key_pair = Ed25519KeyPair::from_pkcs8(pkcs8.as_ref()).unwrap();
        Self { key_pair }
    }

    pub(crate) fn spki(&self) -> Vec<u8> {
        let mut out = ED25519_SPKI_PREFIX.to_vec();
        out.extend_from_slice(self.key_pair.public_key().as_ref());
        out
    }

    pub(crate) fn cose_key(&self) -> Vec<u8> {
        okp_cose_key(self.key_pair.public_key().as_ref())
    }

    pub(crate) fn sign(&self, message: &[u8]) -> Vec<u8> {
        self.key_pair.sign(message).as_ref().to_vec()
    }
}

pub(crate) fn signed_payload(auth_data: &[u8], client_data: &[u8]) -> Vec<u8> {
    let mut message = auth_data.to_vec();
    message.extend_from_slice(&sha256(client_data));
    message
}

/// Wire JSON of a login response
pub(crate) fn assertion_json(
    auth_data: &[u8],
    client_data: &[u8],
    signature: &[u8],
    user_handle: Option<&[u8]>,
) -> serde_json::Value {
    json!({
        "id": base64url_encode(b"credential-0001"),
        "rawId": base64url_encode(b"credential-0001"),
        "type": "public-key",
        "authenticatorAttachment": "platform",
        "clientExtensionResults": {},
        "response": {
            "authenticatorData": base64url_encode(auth_data),
            "clientDataJSON": base64url_encode(client_data),
            "signature": base64url_encode(signature),
            "userHandle": user_handle.map(base64url_encode),
        }
    })
}

/// Wire JSON of a registration response
pub(crate) fn attestation_json(
    attestation_object: &[u8],
    auth_data: &[u8],
    client_data: &[u8],
    spki: &[u8],
    algorithm: i64,
) -> serde_json::Value {
    json!({
        "id": base64url_encode(b"credential-0001"),
        "rawId": base64url_encode(b"credential-0001"),
        "type": "public-key",
        "authenticatorAttachment": "cross-platform",
        "clientExtensionResults": { "credProps": { "rk": true } },
        "response": {
            "attestationObject": base64url_encode(attestation_object),
            "authenticatorData": base64url_encode(auth_data),
            "clientDataJSON": base64url_encode(client_data),
            "publicKey": base64url_encode(spki),
            "publicKeyAlgorithm": algorithm,
            "transports": ["internal", "hybrid"],
        }
    })
}
