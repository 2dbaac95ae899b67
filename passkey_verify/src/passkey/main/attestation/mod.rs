mod core;
mod none;

pub use self::core::{AttestationFormat, AttestationObject};
pub use none::verify_none_attestation;
