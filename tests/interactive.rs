//! Connection establishment tests against an in-process SSH server.
//!
//! The server accepts password "bearer token" for user "cf:app-guid/2"
//! and records every authentication attempt, so the tests can assert
//! that host key rejection happens before any credential is sent.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use russh::keys::ssh_key::rand_core::OsRng;
use russh::keys::ssh_key::Algorithm;
use russh::keys::{PrivateKey, PublicKey};
use russh::server::{self, Auth};
use tokio::net::TcpListener;

use cf_ssh::ssh::{self, md5_fingerprint, sha1_fingerprint, HostKeyVerifier, SshError};

const USER: &str = "cf:app-guid/2";
const TOKEN: &str = "bearer token";

struct TestHandler {
    auth_attempts: Arc<AtomicUsize>,
}

impl server::Handler for TestHandler {
    type Error = russh::Error;

    async fn auth_password(&mut self, user: &str, password: &str) -> Result<Auth, Self::Error> {
        self.auth_attempts.fetch_add(1, Ordering::SeqCst);
        if user == USER && password == TOKEN {
            Ok(Auth::Accept)
        } else {
            Ok(Auth::Reject {
                proceed_with_methods: None,
                partial_success: false,
            })
        }
    }
}

struct TestServer {
    addr: SocketAddr,
    host_key: PublicKey,
    auth_attempts: Arc<AtomicUsize>,
}

impl TestServer {
    async fn start() -> Self {
        let key = PrivateKey::random(&mut OsRng, Algorithm::Ed25519)
            .expect("failed to generate host key");
        let host_key = key.public_key().clone();

        let config = Arc::new(server::Config {
            auth_rejection_time: Duration::from_millis(5),
            auth_rejection_time_initial: Some(Duration::ZERO),
            keys: vec![key],
            ..Default::default()
        });

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind test server");
        let addr = listener.local_addr().expect("no local addr");

        let auth_attempts = Arc::new(AtomicUsize::new(0));
        let attempts = auth_attempts.clone();

        tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    break;
                };
                let handler = TestHandler {
                    auth_attempts: attempts.clone(),
                };
                let config = config.clone();
                tokio::spawn(async move {
                    if let Ok(session) = server::run_stream(config, stream, handler).await {
                        let _ = session.await;
                    }
                });
            }
        });

        Self {
            addr,
            host_key,
            auth_attempts,
        }
    }

    fn endpoint(&self) -> String {
        self.addr.to_string()
    }

    fn attempts(&self) -> usize {
        self.auth_attempts.load(Ordering::SeqCst)
    }
}

#[tokio::test]
async fn connects_with_matching_sha1_fingerprint() {
    let server = TestServer::start().await;
    let verifier = HostKeyVerifier::new(sha1_fingerprint(&server.host_key));

    let result = ssh::connect(&server.endpoint(), Some(verifier), USER, TOKEN).await;

    assert!(result.is_ok(), "connect failed: {:?}", result.err());
    assert_eq!(server.attempts(), 1);
}

#[tokio::test]
async fn connects_with_matching_md5_fingerprint() {
    let server = TestServer::start().await;
    let verifier = HostKeyVerifier::new(md5_fingerprint(&server.host_key));

    let result = ssh::connect(&server.endpoint(), Some(verifier), USER, TOKEN).await;

    assert!(result.is_ok(), "connect failed: {:?}", result.err());
}

#[tokio::test]
async fn connects_with_no_pinned_fingerprint() {
    let server = TestServer::start().await;
    let verifier = HostKeyVerifier::new("");

    let result = ssh::connect(&server.endpoint(), Some(verifier), USER, TOKEN).await;

    assert!(result.is_ok(), "connect failed: {:?}", result.err());
}

#[tokio::test]
async fn mismatched_fingerprint_fails_before_authenticating() {
    let server = TestServer::start().await;
    let other_key = PrivateKey::random(&mut OsRng, Algorithm::Ed25519)
        .expect("failed to generate key")
        .public_key()
        .clone();
    let verifier = HostKeyVerifier::new(sha1_fingerprint(&other_key));

    let Err(err) = ssh::connect(&server.endpoint(), Some(verifier), USER, TOKEN).await else {
        panic!("connect should have failed");
    };

    assert!(matches!(err, SshError::HostKeyMismatch { .. }), "{err:?}");
    assert_eq!(server.attempts(), 0, "credential must not be sent");
}

#[tokio::test]
async fn malformed_fingerprint_fails_before_authenticating() {
    let server = TestServer::start().await;
    let verifier = HostKeyVerifier::new("garbage");

    let Err(err) = ssh::connect(&server.endpoint(), Some(verifier), USER, TOKEN).await else {
        panic!("connect should have failed");
    };

    assert!(matches!(err, SshError::InvalidFingerprintFormat(_)), "{err:?}");
    assert_eq!(server.attempts(), 0);
}

#[tokio::test]
async fn skipping_host_validation_never_consults_the_key() {
    let server = TestServer::start().await;

    // No verifier at all: even a key that would mismatch is accepted.
    let result = ssh::connect(&server.endpoint(), None, USER, TOKEN).await;

    assert!(result.is_ok(), "connect failed: {:?}", result.err());
    assert_eq!(server.attempts(), 1);
}

#[tokio::test]
async fn rejected_credential_is_an_authentication_failure() {
    let server = TestServer::start().await;
    let verifier = HostKeyVerifier::new(sha1_fingerprint(&server.host_key));

    let Err(err) = ssh::connect(&server.endpoint(), Some(verifier), USER, "bearer wrong").await
    else {
        panic!("connect should have failed");
    };

    assert!(matches!(err, SshError::AuthenticationFailed(_)), "{err:?}");
    assert_eq!(server.attempts(), 1);
}
