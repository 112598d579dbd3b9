//! Connection establishment against the application SSH endpoint

use std::net::ToSocketAddrs;
use std::sync::Arc;

use russh::client;
use russh::keys::PublicKey;
use tracing::{debug, info};

use super::error::SshError;
use super::fingerprint::HostKeyVerifier;

/// SSH identity for an application container instance.
///
/// The SSH proxy routes `cf:<app-guid>/<instance-index>` to the
/// container running that instance.
pub fn container_user(app_guid: &str, instance: u32) -> String {
    format!("cf:{app_guid}/{instance}")
}

/// russh client callbacks.
///
/// Carries the host key verification strategy for one connection
/// attempt: `Some` pins the endpoint to the control-plane fingerprint,
/// `None` means the caller explicitly skipped host validation and the
/// presented key is accepted without being inspected.
pub struct ClientHandler {
    verifier: Option<HostKeyVerifier>,
}

impl ClientHandler {
    pub fn new(verifier: Option<HostKeyVerifier>) -> Self {
        Self { verifier }
    }
}

impl client::Handler for ClientHandler {
    type Error = SshError;

    async fn check_server_key(
        &mut self,
        server_public_key: &PublicKey,
    ) -> Result<bool, Self::Error> {
        match &self.verifier {
            Some(verifier) => {
                verifier.verify(server_public_key)?;
                debug!("host key fingerprint verified");
                Ok(true)
            }
            None => {
                debug!("host key validation skipped");
                Ok(true)
            }
        }
    }
}

/// Perform exactly one connection and authentication attempt against
/// `endpoint` (host:port), authenticating with the bearer token as the
/// password secret.
///
/// Host key failures surface as [`SshError::HostKeyMismatch`] or
/// [`SshError::InvalidFingerprintFormat`]; they abort the handshake
/// before any credential is sent. Nothing is retried here; the
/// operator decides whether to re-invoke.
pub async fn connect(
    endpoint: &str,
    verifier: Option<HostKeyVerifier>,
    username: &str,
    token: &str,
) -> Result<client::Handle<ClientHandler>, SshError> {
    info!("connecting to SSH endpoint {}", endpoint);

    let socket_addr = endpoint
        .to_socket_addrs()
        .map_err(|e| SshError::ConnectionFailed(format!("failed to resolve {endpoint}: {e}")))?
        .next()
        .ok_or_else(|| SshError::ConnectionFailed(format!("no address found for {endpoint}")))?;

    let config = client::Config::default();
    let handler = ClientHandler::new(verifier);

    let mut handle = client::connect(Arc::new(config), socket_addr, handler).await?;

    debug!("SSH handshake completed, authenticating as {}", username);

    let authenticated = handle
        .authenticate_password(username, token)
        .await
        .map_err(|e| SshError::AuthenticationFailed(e.to_string()))?;

    if !authenticated.success() {
        return Err(SshError::AuthenticationFailed(
            "credential rejected by server".to_string(),
        ));
    }

    info!("authenticated to {} as {}", endpoint, username);

    Ok(handle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn container_user_encodes_guid_and_instance() {
        assert_eq!(container_user("app-guid", 2), "cf:app-guid/2");
    }

    #[test]
    fn container_user_defaults_to_instance_zero() {
        assert_eq!(container_user("0123-abcd", 0), "cf:0123-abcd/0");
    }
}
