//! SSH Error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SshError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Host fingerprint does not match: expected {expected}, got {actual}")]
    HostKeyMismatch { expected: String, actual: String },

    #[error("Invalid fingerprint format: {0:?}")]
    InvalidFingerprintFormat(String),

    #[error("Failed to open session channel: {0}")]
    SessionAllocationFailed(String),

    #[error("Failed to put terminal into raw mode: {0}")]
    RawModeFailed(String),

    #[error("PTY allocation failed: {0}")]
    PtyAllocationFailed(String),

    #[error("Failed to start remote shell: {0}")]
    ShellStartFailed(String),
}

impl From<russh::Error> for SshError {
    fn from(err: russh::Error) -> Self {
        SshError::ConnectionFailed(err.to_string())
    }
}

impl SshError {
    /// Host key problems are security relevant and must never be
    /// reported as ordinary transport failures.
    pub fn is_host_key_failure(&self) -> bool {
        matches!(
            self,
            SshError::HostKeyMismatch { .. } | SshError::InvalidFingerprintFormat(_)
        )
    }
}
