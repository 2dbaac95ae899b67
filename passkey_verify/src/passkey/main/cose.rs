use ciborium::value::{Integer, Value as CborValue};

use crate::passkey::errors::PasskeyError;

// COSE_Key labels (RFC 9052 / RFC 9053)
const LABEL_KTY: i64 = 1;
const LABEL_ALG: i64 = 3;
const LABEL_CRV_OR_N: i64 = -1;
const LABEL_X_OR_E: i64 = -2;
const LABEL_Y: i64 = -3;

const KTY_OKP: i64 = 1;
const KTY_EC2: i64 = 2;
const KTY_RSA: i64 = 3;

const CRV_P256: i64 = 1;
const CRV_ED25519: i64 = 6;

/// COSE algorithm identifiers this crate can verify
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoseAlgorithm {
    /// ECDSA w/ SHA-256 on P-256 (-7)
    Es256,
    /// EdDSA, used with Ed25519 (-8)
    EdDsa,
    /// RSASSA-PKCS1-v1_5 w/ SHA-256 (-257)
    Rs256,
}

impl CoseAlgorithm {
    pub fn from_i64(alg: i64) -> Result<Self, PasskeyError> {
        match alg {
            -7 => Ok(Self::Es256),
            -8 => Ok(Self::EdDsa),
            -257 => Ok(Self::Rs256),
            other => Err(PasskeyError::UnsupportedAlgorithm(format!(
                "COSE algorithm {other}"
            ))),
        }
    }

    pub fn as_i64(&self) -> i64 {
        match self {
            Self::Es256 => -7,
            Self::EdDsa => -8,
            Self::Rs256 => -257,
        }
    }

    /// WebCrypto algorithm name the verifier dispatches on
    pub fn name(&self) -> &'static str {
        match self {
            Self::Es256 => "ECDSA",
            Self::EdDsa => "Ed25519",
            Self::Rs256 => "RSASSA-PKCS1-v1_5",
        }
    }
}

/// Credential public key as carried in attested credential data
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoseKey {
    Ec2 {
        alg: Option<i64>,
        crv: i64,
        x: Vec<u8>,
        y: Vec<u8>,
    },
    Okp {
        alg: Option<i64>,
        crv: i64,
        x: Vec<u8>,
    },
    Rsa {
        alg: Option<i64>,
        n: Vec<u8>,
        e: Vec<u8>,
    },
}

impl CoseKey {
    /// Decode a COSE_Key from the front of `data`.
    ///
    /// Returns the key and the number of bytes it occupied; anything after that
    /// belongs to the caller (authenticator extensions, usually).
    pub fn decode_prefix(data: &[u8]) -> Result<(Self, usize), PasskeyError> {
        let mut reader = data;
        let value: CborValue = ciborium::de::from_reader(&mut reader).map_err(|e| match e {
            ciborium::de::Error::Io(io) if io.kind() == std::io::ErrorKind::UnexpectedEof => {
                PasskeyError::TruncatedBuffer(format!(
                    "public key CBOR ends early, {} bytes available",
                    data.len()
                ))
            }
            e => {
                tracing::error!("Invalid public key CBOR: {}", e);
                PasskeyError::Format(format!("Invalid public key CBOR: {e}"))
            }
        })?;
        let consumed = data.len() - reader.len();
        Ok((Self::from_cbor(value)?, consumed))
    }

    /// Decode a COSE_Key that must span all of `data`
    pub fn decode(data: &[u8]) -> Result<Self, PasskeyError> {
        let (key, consumed) = Self::decode_prefix(data)?;
        if consumed != data.len() {
            return Err(PasskeyError::Format(format!(
                "{} trailing bytes after COSE key",
                data.len() - consumed
            )));
        }
        Ok(key)
    }

    fn from_cbor(value: CborValue) -> Result<Self, PasskeyError> {
        let CborValue::Map(entries) = value else {
            return Err(PasskeyError::Format(
                "COSE key is not a CBOR map".to_string(),
            ));
        };

        let mut kty = None;
        let mut alg = None;
        let mut crv_or_n = None;
        let mut x_or_e = None;
        let mut y = None;

        for (key, value) in entries {
            let CborValue::Integer(label) = key else {
                continue;
            };
            match integer_to_i64(label)? {
                LABEL_KTY => kty = Some(expect_int(value, "kty")?),
                LABEL_ALG => alg = Some(expect_int(value, "alg")?),
                LABEL_CRV_OR_N => crv_or_n = Some(value),
                LABEL_X_OR_E => x_or_e = Some(expect_bytes(value, "x")?),
                LABEL_Y => y = Some(value),
                _ => {}
            }
        }

        let missing = |name: &str| PasskeyError::Format(format!("COSE key is missing {name}"));

        match kty.ok_or_else(|| missing("kty"))? {
            KTY_EC2 => {
                let crv = expect_int(crv_or_n.ok_or_else(|| missing("crv"))?, "crv")?;
                let y = expect_bytes(y.ok_or_else(|| missing("y"))?, "y")?;
                Ok(Self::Ec2 {
                    alg,
                    crv,
                    x: x_or_e.ok_or_else(|| missing("x"))?,
                    y,
                })
            }
            KTY_OKP => {
                let crv = expect_int(crv_or_n.ok_or_else(|| missing("crv"))?, "crv")?;
                Ok(Self::Okp {
                    alg,
                    crv,
                    x: x_or_e.ok_or_else(|| missing("x"))?,
                })
            }
            KTY_RSA => {
                let n = expect_bytes(crv_or_n.ok_or_else(|| missing("n"))?, "n")?;
                Ok(Self::Rsa {
                    alg,
                    n,
                    e: x_or_e.ok_or_else(|| missing("e"))?,
                })
            }
            other => Err(PasskeyError::UnsupportedAlgorithm(format!(
                "COSE key type {other}"
            ))),
        }
    }

    /// The `alg` member, if the authenticator included one
    pub fn alg(&self) -> Option<i64> {
        match self {
            Self::Ec2 { alg, .. } | Self::Okp { alg, .. } | Self::Rsa { alg, .. } => *alg,
        }
    }

    /// Algorithm this key verifies with, taken from `alg` or inferred from the curve
    pub fn algorithm(&self) -> Result<CoseAlgorithm, PasskeyError> {
        if let Some(alg) = self.alg() {
            return CoseAlgorithm::from_i64(alg);
        }
        match self {
            Self::Ec2 { crv: CRV_P256, .. } => Ok(CoseAlgorithm::Es256),
            Self::Okp {
                crv: CRV_ED25519, ..
            } => Ok(CoseAlgorithm::EdDsa),
            Self::Rsa { .. } => Ok(CoseAlgorithm::Rs256),
            _ => Err(PasskeyError::UnsupportedAlgorithm(
                "COSE key without alg on an unsupported curve".to_string(),
            )),
        }
    }
}

pub(super) fn integer_to_i64(i: Integer) -> Result<i64, PasskeyError> {
    i64::try_from(i)
        .map_err(|_| PasskeyError::Format("CBOR integer out of i64 range".to_string()))
}

fn expect_int(value: CborValue, name: &str) -> Result<i64, PasskeyError> {
    match value {
        CborValue::Integer(i) => integer_to_i64(i),
        _ => Err(PasskeyError::Format(format!(
            "COSE key {name} must be an integer"
        ))),
    }
}

fn expect_bytes(value: CborValue, name: &str) -> Result<Vec<u8>, PasskeyError> {
    match value {
        CborValue::Bytes(b) => Ok(b),
        _ => Err(PasskeyError::Format(format!(
            "COSE key {name} must be a byte string"
        ))),
    }
}
