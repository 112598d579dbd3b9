//! Host key fingerprint verification
//!
//! The control plane publishes the expected fingerprint of the SSH
//! endpoint's host key as a hex-with-colons digest. The digest algorithm
//! is implied by the string length: SHA-1 and MD5 are the two formats in
//! the wild. An empty string means no pinning is configured.

use md5::Md5;
use russh::keys::{PublicKey, PublicKeyBase64};
use sha1::{Digest, Sha1};

use super::error::SshError;

/// Length of a SHA-1 digest rendered as colon-separated hex (20 bytes).
pub const SHA1_FINGERPRINT_LENGTH: usize = 59;

/// Length of an MD5 digest rendered as colon-separated hex (16 bytes).
pub const MD5_FINGERPRINT_LENGTH: usize = 47;

/// Verifies a presented host key against an expected fingerprint string.
///
/// Injected into the connection handler as a plain value so the policy
/// is testable without a network connection. When host validation is
/// skipped the handler simply carries no verifier.
#[derive(Debug, Clone)]
pub struct HostKeyVerifier {
    expected: String,
}

impl HostKeyVerifier {
    pub fn new(expected: impl Into<String>) -> Self {
        Self {
            expected: expected.into(),
        }
    }

    /// Classify the expected fingerprint by length and compare it with
    /// the fingerprint of the presented key.
    pub fn verify(&self, key: &PublicKey) -> Result<(), SshError> {
        match self.expected.len() {
            0 => Ok(()),
            SHA1_FINGERPRINT_LENGTH => self.compare(sha1_fingerprint(key)),
            MD5_FINGERPRINT_LENGTH => self.compare(md5_fingerprint(key)),
            _ => Err(SshError::InvalidFingerprintFormat(self.expected.clone())),
        }
    }

    fn compare(&self, actual: String) -> Result<(), SshError> {
        if actual == self.expected {
            Ok(())
        } else {
            Err(SshError::HostKeyMismatch {
                expected: self.expected.clone(),
                actual,
            })
        }
    }
}

/// SHA-1 fingerprint of a public key's wire encoding, as colon-separated
/// lowercase hex.
pub fn sha1_fingerprint(key: &PublicKey) -> String {
    hex_colon(&Sha1::digest(key.public_key_bytes()))
}

/// MD5 fingerprint of a public key's wire encoding, as colon-separated
/// lowercase hex.
pub fn md5_fingerprint(key: &PublicKey) -> String {
    hex_colon(&Md5::digest(key.public_key_bytes()))
}

fn hex_colon(digest: &[u8]) -> String {
    digest
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect::<Vec<_>>()
        .join(":")
}
