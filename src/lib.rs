//! Interactive SSH access to Cloud Foundry application containers
//!
//! Given an app name, looks up the app GUID, the platform's SSH
//! endpoint and host key fingerprint, and a bearer token from the
//! control plane, then opens a single interactive shell channel inside
//! the selected container instance.

pub mod api;
pub mod cli;
pub mod ssh;

use thiserror::Error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use api::ControlPlane;
use ssh::HostKeyVerifier;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Api(#[from] api::ApiError),

    #[error(transparent)]
    Ssh(#[from] ssh::SshError),
}

/// Initialize logging to stderr. Quiet by default so log lines don't
/// tear the interactive session; override with RUST_LOG.
pub fn init_logging() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// One invocation: resolve the target through the control plane,
/// establish the connection, and run the interactive session to
/// completion. Returns the remote shell's exit status.
///
/// Every failure aborts the remaining steps and surfaces verbatim;
/// nothing is retried here.
pub async fn run(opts: &cli::Options, control_plane: &dyn ControlPlane) -> Result<u32, Error> {
    let app = control_plane.app(&opts.app_name).await?;
    let info = control_plane.ssh_info().await?;
    let credential = control_plane.credential().await?;

    let verifier = if opts.skip_host_validation {
        None
    } else {
        Some(HostKeyVerifier::new(info.host_key_fingerprint.clone()))
    };

    let username = ssh::container_user(&app.guid, opts.instance);
    let handle = ssh::connect(&info.endpoint, verifier, &username, &credential.token).await?;

    let status = ssh::InteractiveSession::new(handle).run().await?;
    Ok(status)
}
