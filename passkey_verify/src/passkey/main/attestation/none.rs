use crate::passkey::errors::PasskeyError;

use super::core::{AttestationFormat, AttestationObject};

/// Check a `none` attestation statement.
///
/// There is nothing to verify cryptographically. The statement must be empty
/// and the authenticator data must carry a credential with a usable COSE key.
pub fn verify_none_attestation(attestation: &AttestationObject) -> Result<(), PasskeyError> {
    if attestation.fmt != AttestationFormat::None {
        return Err(PasskeyError::Format(format!(
            "Expected none attestation, got {}",
            attestation.fmt.as_str()
        )));
    }

    if !attestation.att_stmt.is_empty() {
        tracing::error!(
            "none attestation carries {} statement entries",
            attestation.att_stmt.len()
        );
        return Err(PasskeyError::Format(
            "attStmt must be empty for none attestation".to_string(),
        ));
    }

    let auth_data = attestation.auth_data()?;
    let attested = auth_data.attested_credential_data.ok_or_else(|| {
        PasskeyError::AuthenticatorData("No attested credential data".to_string())
    })?;

    let key = attested.public_key()?;
    let algorithm = key.algorithm()?;

    tracing::debug!(
        "none attestation accepted: aaguid {}, {} key",
        attested.aaguid_string(),
        algorithm.name()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::passkey::main::test_utils::{
        AttestedFixture, FLAG_AT, FLAG_UP, TEST_RP_ID, build_attestation_object,
        build_auth_data, cbor_bytes, ec2_cose_key,
    };
    use ciborium::value::Value as CborValue;

    fn attested_auth_data(cose_key: Vec<u8>) -> Vec<u8> {
        let fixture = AttestedFixture {
            aaguid: [0; 16],
            credential_id: vec![0x42; 32],
            cose_key,
        };
        build_auth_data(TEST_RP_ID, FLAG_UP | FLAG_AT, 0, Some(&fixture), None)
    }

    fn decode(fmt: &str, stmt: Vec<(CborValue, CborValue)>, auth_data: &[u8]) -> AttestationObject {
        AttestationObject::from_cbor(&build_attestation_object(fmt, stmt, auth_data)).unwrap()
    }

    #[test]
    fn test_valid_none_attestation() {
        let auth_data = attested_auth_data(ec2_cose_key(&[0x01; 32], &[0x02; 32]));
        assert!(verify_none_attestation(&decode("none", vec![], &auth_data)).is_ok());
    }

    #[test]
    fn test_other_format_is_rejected() {
        let auth_data = attested_auth_data(ec2_cose_key(&[0x01; 32], &[0x02; 32]));
        let result = verify_none_attestation(&decode("packed", vec![], &auth_data));
        assert!(matches!(result, Err(PasskeyError::Format(msg)) if msg.contains("packed")));
    }

    #[test]
    fn test_non_empty_statement_is_rejected() {
        let auth_data = attested_auth_data(ec2_cose_key(&[0x01; 32], &[0x02; 32]));
        let stmt = vec![(
            CborValue::Text("sig".to_string()),
            CborValue::Bytes(vec![0x00]),
        )];
        assert!(matches!(
            verify_none_attestation(&decode("none", stmt, &auth_data)),
            Err(PasskeyError::Format(_))
        ));
    }

    #[test]
    fn test_missing_attested_credential_data() {
        let auth_data = build_auth_data(TEST_RP_ID, FLAG_UP, 0, None, None);
        assert!(matches!(
            verify_none_attestation(&decode("none", vec![], &auth_data)),
            Err(PasskeyError::AuthenticatorData(_))
        ));
    }

    #[test]
    fn test_unsupported_key_algorithm() {
        let cose_key = cbor_bytes(&CborValue::Map(vec![
            (CborValue::Integer(1i64.into()), CborValue::Integer(2i64.into())),
            (CborValue::Integer(3i64.into()), CborValue::Integer((-35i64).into())),
            (CborValue::Integer((-1i64).into()), CborValue::Integer(2i64.into())),
            (CborValue::Integer((-2i64).into()), CborValue::Bytes(vec![0x01; 48])),
            (CborValue::Integer((-3i64).into()), CborValue::Bytes(vec![0x02; 48])),
        ]));
        let auth_data = attested_auth_data(cose_key);
        assert!(matches!(
            verify_none_attestation(&decode("none", vec![], &auth_data)),
            Err(PasskeyError::UnsupportedAlgorithm(_))
        ));
    }
}
