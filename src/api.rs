//! Control-plane collaborators
//!
//! The session engine needs three things it does not own: the target
//! app's GUID, the SSH endpoint metadata from `/v2/info`, and a bearer
//! token to present as the password. [`ControlPlane`] is the seam; the
//! shipped implementation shells out to the `cf` CLI the operator is
//! already logged in with.

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

/// Application identity as known to the cloud controller.
#[derive(Debug, Clone)]
pub struct App {
    pub name: String,
    pub guid: String,
}

/// SSH endpoint metadata published by `/v2/info`.
#[derive(Debug, Clone)]
pub struct SshInfo {
    /// host:port of the SSH proxy.
    pub endpoint: String,
    /// Expected host key fingerprint; empty when the platform does not
    /// publish one.
    pub host_key_fingerprint: String,
}

/// Bearer credential presented as the SSH password. Used exactly once
/// per invocation and never persisted.
#[derive(Debug, Clone)]
pub struct Credential {
    pub token: String,
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Failed to look up app {name}: {reason}")]
    AppLookupFailed { name: String, reason: String },

    #[error("Failed to get SSH endpoint info: {0}")]
    EndpointInfoFailed(String),

    #[error("Failed to get credential: {0}")]
    CredentialFailed(String),
}

/// Everything the session engine obtains from the control plane.
#[async_trait]
pub trait ControlPlane {
    async fn app(&self, name: &str) -> Result<App, ApiError>;
    async fn ssh_info(&self) -> Result<SshInfo, ApiError>;
    async fn credential(&self) -> Result<Credential, ApiError>;
}

/// Control plane backed by the `cf` CLI's existing login session.
pub struct CfCli {
    binary: String,
}

impl CfCli {
    pub fn new() -> Self {
        Self {
            binary: "cf".to_string(),
        }
    }

    /// Use a specific cf binary (for testing).
    pub fn with_binary(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    async fn output(&self, args: &[&str]) -> Result<String, String> {
        debug!("running {} {}", self.binary, args.join(" "));
        let output = Command::new(&self.binary)
            .args(args)
            .output()
            .await
            .map_err(|e| format!("failed to run {}: {}", self.binary, e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(format!(
                "{} {} failed: {}",
                self.binary,
                args.join(" "),
                stderr.trim()
            ));
        }

        String::from_utf8(output.stdout).map_err(|e| format!("non-utf8 output: {e}"))
    }
}

impl Default for CfCli {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Deserialize)]
struct InfoResponse {
    #[serde(default)]
    app_ssh_endpoint: Option<String>,
    #[serde(default)]
    app_ssh_host_key_fingerprint: Option<String>,
}

#[async_trait]
impl ControlPlane for CfCli {
    async fn app(&self, name: &str) -> Result<App, ApiError> {
        let stdout = self
            .output(&["app", name, "--guid"])
            .await
            .map_err(|reason| ApiError::AppLookupFailed {
                name: name.to_string(),
                reason,
            })?;

        let guid = stdout.trim().to_string();
        if guid.is_empty() {
            return Err(ApiError::AppLookupFailed {
                name: name.to_string(),
                reason: "empty guid".to_string(),
            });
        }

        Ok(App {
            name: name.to_string(),
            guid,
        })
    }

    async fn ssh_info(&self) -> Result<SshInfo, ApiError> {
        let stdout = self
            .output(&["curl", "/v2/info"])
            .await
            .map_err(ApiError::EndpointInfoFailed)?;

        let info: InfoResponse =
            serde_json::from_str(&stdout).map_err(|e| ApiError::EndpointInfoFailed(e.to_string()))?;

        let endpoint = info.app_ssh_endpoint.ok_or_else(|| {
            ApiError::EndpointInfoFailed("SSH is not enabled on this platform".to_string())
        })?;

        Ok(SshInfo {
            endpoint,
            host_key_fingerprint: info.app_ssh_host_key_fingerprint.unwrap_or_default(),
        })
    }

    async fn credential(&self) -> Result<Credential, ApiError> {
        let stdout = self
            .output(&["oauth-token"])
            .await
            .map_err(ApiError::CredentialFailed)?;

        // Older cf versions print banner lines before the token; the
        // token is the last non-empty line ("bearer ...").
        let token = stdout
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .next_back()
            .ok_or_else(|| ApiError::CredentialFailed("no token in output".to_string()))?;

        Ok(Credential {
            token: token.to_string(),
        })
    }
}
