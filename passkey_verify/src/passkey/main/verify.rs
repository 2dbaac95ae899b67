use ring::digest;
use ring::signature::{
    ECDSA_P256_SHA256_FIXED, ED25519, RSA_PKCS1_2048_8192_SHA256, RsaPublicKeyComponents,
    UnparsedPublicKey,
};
use x509_parser::prelude::FromDer;
use x509_parser::x509::SubjectPublicKeyInfo;

use crate::passkey::errors::PasskeyError;

use super::asn1::{P256_COMPONENT_LEN, der_to_raw_signature};
use super::cose::{CoseAlgorithm, CoseKey};
use super::credential::AssertionCredential;

const P256_CURVE: i64 = 1;
const ED25519_CURVE: i64 = 6;
const ED25519_KEY_LEN: usize = 32;
/// 0x04 || x || y
const P256_POINT_LEN: usize = 1 + 2 * P256_COMPONENT_LEN;

#[derive(Debug, Clone, PartialEq, Eq)]
enum KeyMaterial {
    /// Uncompressed EC point, raw Ed25519 key, or PKCS#1 RSAPublicKey DER
    Raw(Vec<u8>),
    RsaComponents { n: Vec<u8>, e: Vec<u8> },
}

/// A credential public key imported for one verification algorithm
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKey {
    algorithm: CoseAlgorithm,
    material: KeyMaterial,
}

impl PublicKey {
    /// Import a DER SubjectPublicKeyInfo, as sent in the registration response's
    /// `publicKey` member.
    pub fn from_spki(spki: &[u8], algorithm: CoseAlgorithm) -> Result<Self, PasskeyError> {
        let (rest, info) = SubjectPublicKeyInfo::from_der(spki)
            .map_err(|e| PasskeyError::Crypto(format!("Invalid SubjectPublicKeyInfo: {e}")))?;
        if !rest.is_empty() {
            return Err(PasskeyError::Crypto(format!(
                "{} trailing bytes after SubjectPublicKeyInfo",
                rest.len()
            )));
        }

        let key_bytes = info.subject_public_key.data.to_vec();

        let expected_key_type = match algorithm {
            CoseAlgorithm::Es256 => oid_registry::OID_KEY_TYPE_EC_PUBLIC_KEY,
            CoseAlgorithm::EdDsa => oid_registry::OID_SIG_ED25519,
            CoseAlgorithm::Rs256 => oid_registry::OID_PKCS1_RSAENCRYPTION,
        };
        if info.algorithm.algorithm != expected_key_type {
            tracing::error!(
                "SubjectPublicKeyInfo key type {} does not match {}",
                info.algorithm.algorithm,
                algorithm.name()
            );
            return Err(PasskeyError::Crypto(format!(
                "Key type does not match algorithm {}",
                algorithm.name()
            )));
        }

        check_key_length(algorithm, &key_bytes)?;

        Ok(Self {
            algorithm,
            material: KeyMaterial::Raw(key_bytes),
        })
    }

    /// Import the COSE_Key embedded in attested credential data
    pub fn from_cose(key: &CoseKey) -> Result<Self, PasskeyError> {
        let algorithm = key.algorithm()?;

        let material = match (algorithm, key) {
            (CoseAlgorithm::Es256, CoseKey::Ec2 { crv, x, y, .. }) => {
                if *crv != P256_CURVE {
                    return Err(PasskeyError::UnsupportedAlgorithm(format!(
                        "EC2 curve {crv}"
                    )));
                }
                if x.len() != P256_COMPONENT_LEN || y.len() != P256_COMPONENT_LEN {
                    return Err(PasskeyError::Crypto(
                        "Invalid P-256 coordinate length".to_string(),
                    ));
                }
                let mut point = Vec::with_capacity(P256_POINT_LEN);
                point.push(0x04); // Uncompressed point format
                point.extend_from_slice(x);
                point.extend_from_slice(y);
                KeyMaterial::Raw(point)
            }
            (CoseAlgorithm::EdDsa, CoseKey::Okp { crv, x, .. }) => {
                if *crv != ED25519_CURVE {
                    return Err(PasskeyError::UnsupportedAlgorithm(format!(
                        "OKP curve {crv}"
                    )));
                }
                check_key_length(algorithm, x)?;
                KeyMaterial::Raw(x.clone())
            }
            (CoseAlgorithm::Rs256, CoseKey::Rsa { n, e, .. }) => KeyMaterial::RsaComponents {
                n: n.clone(),
                e: e.clone(),
            },
            (algorithm, _) => {
                return Err(PasskeyError::Crypto(format!(
                    "COSE key type does not match algorithm {}",
                    algorithm.name()
                )));
            }
        };

        Ok(Self {
            algorithm,
            material,
        })
    }

    pub fn algorithm(&self) -> CoseAlgorithm {
        self.algorithm
    }

    /// Check `signature` over `message`.
    ///
    /// ECDSA signatures arrive DER encoded and are converted to `r || s` first;
    /// Ed25519 and PKCS#1 v1.5 signatures are used as-is.
    pub(super) fn verify(&self, message: &[u8], signature: &[u8]) -> Result<bool, PasskeyError> {
        let result = match (self.algorithm, &self.material) {
            (CoseAlgorithm::Es256, KeyMaterial::Raw(point)) => {
                let raw_signature = der_to_raw_signature(signature)?;
                UnparsedPublicKey::new(&ECDSA_P256_SHA256_FIXED, point)
                    .verify(message, &raw_signature)
            }
            (CoseAlgorithm::EdDsa, KeyMaterial::Raw(key)) => {
                UnparsedPublicKey::new(&ED25519, key).verify(message, signature)
            }
            (CoseAlgorithm::Rs256, KeyMaterial::Raw(der)) => {
                UnparsedPublicKey::new(&RSA_PKCS1_2048_8192_SHA256, der).verify(message, signature)
            }
            (CoseAlgorithm::Rs256, KeyMaterial::RsaComponents { n, e }) => {
                RsaPublicKeyComponents {
                    n: n.as_slice(),
                    e: e.as_slice(),
                }
                .verify(&RSA_PKCS1_2048_8192_SHA256, message, signature)
            }
            (algorithm, KeyMaterial::RsaComponents { .. }) => {
                return Err(PasskeyError::UnsupportedAlgorithm(format!(
                    "{} with RSA key components",
                    algorithm.name()
                )));
            }
        };

        Ok(result.is_ok())
    }
}

fn check_key_length(algorithm: CoseAlgorithm, key: &[u8]) -> Result<(), PasskeyError> {
    let valid = match algorithm {
        CoseAlgorithm::Es256 => key.len() == P256_POINT_LEN && key[0] == 0x04,
        CoseAlgorithm::EdDsa => key.len() == ED25519_KEY_LEN,
        CoseAlgorithm::Rs256 => !key.is_empty(),
    };
    if valid {
        Ok(())
    } else {
        Err(PasskeyError::Crypto(format!(
            "Invalid {} public key of {} bytes",
            algorithm.name(),
            key.len()
        )))
    }
}

/// Verify an assertion signature with the credential's stored public key.
///
/// The signed payload is rebuilt from the raw bytes the browser delivered:
/// `authenticatorData || SHA-256(clientDataJSON)`. A signature that does not
/// match returns `Ok(false)`; malformed DER and unsupported keys are errors.
pub fn verify_signature(
    cred: &AssertionCredential,
    public_key: &PublicKey,
) -> Result<bool, PasskeyError> {
    let client_data_hash = digest::digest(&digest::SHA256, &cred.raw_client_data);

    let mut signed_data =
        Vec::with_capacity(cred.raw_auth_data.len() + client_data_hash.as_ref().len());
    signed_data.extend_from_slice(&cred.raw_auth_data);
    signed_data.extend_from_slice(client_data_hash.as_ref());

    tracing::debug!(
        "Verifying {} signature: signed data {} bytes, signature {} bytes",
        public_key.algorithm().name(),
        signed_data.len(),
        cred.signature.len()
    );

    let verified = public_key.verify(&signed_data, &cred.signature)?;
    if verified {
        tracing::info!("Signature verification successful");
    } else {
        tracing::warn!("Signature verification failed");
    }
    Ok(verified)
}
