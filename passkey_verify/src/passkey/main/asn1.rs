//! DER decoding of ECDSA signatures.
//!
//! WebAuthn authenticators encode ES256 signatures as
//! `SEQUENCE { INTEGER r, INTEGER s }`, while the fixed-width verifier wants
//! the raw `r || s` concatenation with each component left-padded to the
//! P-256 field size.

use crate::passkey::errors::PasskeyError;

const TAG_SEQUENCE: u8 = 0x30;
const TAG_INTEGER: u8 = 0x02;

/// Size in bytes of one P-256 signature component
pub(super) const P256_COMPONENT_LEN: usize = 32;

/// Convert a DER `SEQUENCE { INTEGER r, INTEGER s }` into the 64-byte `r || s` form.
pub fn der_to_raw_signature(der: &[u8]) -> Result<[u8; 64], PasskeyError> {
    let mut reader = DerReader::new(der);

    let tag = reader.read_byte()?;
    if tag != TAG_SEQUENCE {
        return Err(PasskeyError::MalformedSignature(format!(
            "Expected SEQUENCE tag 0x30, got 0x{tag:02x}"
        )));
    }

    let seq_len = reader.read_length()?;
    if seq_len != reader.remaining() {
        return Err(PasskeyError::MalformedSignature(format!(
            "SEQUENCE length {} does not match remaining {} bytes",
            seq_len,
            reader.remaining()
        )));
    }

    let r = reader.read_integer("r")?;
    let s = reader.read_integer("s")?;

    if reader.remaining() != 0 {
        return Err(PasskeyError::MalformedSignature(format!(
            "{} trailing bytes after INTEGER(s)",
            reader.remaining()
        )));
    }

    let mut raw = [0u8; 64];
    raw[..P256_COMPONENT_LEN].copy_from_slice(&to_fixed_width(&normalize_integer(r), "r")?);
    raw[P256_COMPONENT_LEN..].copy_from_slice(&to_fixed_width(&normalize_integer(s), "s")?);
    Ok(raw)
}

struct DerReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> DerReader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn read_byte(&mut self) -> Result<u8, PasskeyError> {
        let b = *self
            .data
            .get(self.pos)
            .ok_or_else(|| PasskeyError::MalformedSignature("DER truncated".to_string()))?;
        self.pos += 1;
        Ok(b)
    }

    fn read_slice(&mut self, len: usize) -> Result<&'a [u8], PasskeyError> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|end| *end <= self.data.len())
            .ok_or_else(|| {
                PasskeyError::MalformedSignature(format!(
                    "DER element of {} bytes exceeds remaining {} bytes",
                    len,
                    self.remaining()
                ))
            })?;
        let slice = &self.data[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    /// Short form (< 0x80) is the length itself; long form gives the count of
    /// big-endian length bytes that follow.
    fn read_length(&mut self) -> Result<usize, PasskeyError> {
        let first = self.read_byte()?;
        if first & 0x80 == 0 {
            return Ok(first as usize);
        }

        let n = (first & 0x7f) as usize;
        if n == 0 || n > std::mem::size_of::<u32>() {
            return Err(PasskeyError::MalformedSignature(format!(
                "Invalid DER length prefix 0x{first:02x}"
            )));
        }

        let len = self
            .read_slice(n)?
            .iter()
            .fold(0usize, |acc, b| (acc << 8) | *b as usize);
        Ok(len)
    }

    fn read_integer(&mut self, name: &str) -> Result<&'a [u8], PasskeyError> {
        let tag = self.read_byte().map_err(|_| {
            PasskeyError::MalformedSignature(format!("DER truncated before INTEGER({name})"))
        })?;
        if tag != TAG_INTEGER {
            return Err(PasskeyError::MalformedSignature(format!(
                "Expected INTEGER tag 0x02 for {name}, got 0x{tag:02x}"
            )));
        }
        let len = self.read_length()?;
        if len == 0 {
            return Err(PasskeyError::MalformedSignature(format!(
                "Empty INTEGER({name})"
            )));
        }
        self.read_slice(len)
    }
}

/// Two's-complement normalization of an INTEGER body.
///
/// A leading zero in front of a byte with the high bit clear carries no
/// information and is dropped; a body whose high bit is set gets a zero
/// prepended so it reads as a positive magnitude.
fn normalize_integer(bytes: &[u8]) -> Vec<u8> {
    match bytes {
        [0x00, second, ..] if second & 0x80 == 0 => bytes[1..].to_vec(),
        [first, ..] if first & 0x80 != 0 => {
            let mut padded = Vec::with_capacity(bytes.len() + 1);
            padded.push(0x00);
            padded.extend_from_slice(bytes);
            padded
        }
        _ => bytes.to_vec(),
    }
}

/// Left-pad to exactly 32 bytes.
///
/// Excess leading zeros are dropped; any non-zero byte beyond the component
/// size fails closed instead of being truncated away.
fn to_fixed_width(bytes: &[u8], name: &str) -> Result<[u8; P256_COMPONENT_LEN], PasskeyError> {
    let mut value = bytes;
    while value.len() > P256_COMPONENT_LEN {
        match value.split_first() {
            Some((0x00, rest)) => value = rest,
            _ => {
                return Err(PasskeyError::MalformedSignature(format!(
                    "INTEGER({name}) is {} bytes, longer than {P256_COMPONENT_LEN}",
                    bytes.len()
                )));
            }
        }
    }

    let mut out = [0u8; P256_COMPONENT_LEN];
    out[P256_COMPONENT_LEN - value.len()..].copy_from_slice(value);
    Ok(out)
}
