//! SSH session engine
//!
//! Connects to the platform's SSH proxy as `cf:<app-guid>/<instance>`
//! with a bearer-token credential, verifies the endpoint's host key
//! against the control-plane fingerprint, and runs a single interactive
//! shell channel with PTY allocation, raw-terminal management, and live
//! resize propagation.

mod client;
mod error;
mod fingerprint;
mod resize;
mod session;
mod terminal;

pub use client::{connect, container_user, ClientHandler};
pub use error::SshError;
pub use fingerprint::{
    md5_fingerprint, sha1_fingerprint, HostKeyVerifier, MD5_FINGERPRINT_LENGTH,
    SHA1_FINGERPRINT_LENGTH,
};
pub use resize::ResizeTracker;
pub use session::{InteractiveSession, SessionCommand};
pub use terminal::{dimensions, Dimensions, RawModeGuard};
