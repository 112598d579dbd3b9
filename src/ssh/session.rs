//! Interactive terminal session over an established connection
//!
//! Turns an authenticated connection into an interactive shell: opens
//! the session channel, allocates a remote PTY, switches the local
//! terminal to raw mode, and relays I/O until the remote shell exits.
//! The raw-mode snapshot is restored exactly once on every exit path
//! via the guard's scoped release.

use russh::client::Handle;
use russh::{ChannelMsg, Pty};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::sync::mpsc;
use tracing::{debug, info};

use super::client::ClientHandler;
use super::error::SshError;
use super::resize;
use super::terminal::{self, Dimensions, RawModeGuard};

/// Commands sent to the session by its background activities.
#[derive(Debug)]
pub enum SessionCommand {
    /// Local keystrokes bound for the remote shell's stdin.
    Data(Vec<u8>),
    /// The local terminal changed dimensions.
    Resize(Dimensions),
}

/// Terminal modes for the remote PTY: local echo on, 115200 baud both
/// directions. Mirrors what the SSH proxy expects from the cf CLI.
const TERMINAL_MODES: &[(Pty, u32)] = &[
    (Pty::ECHO, 1),
    (Pty::TTY_OP_ISPEED, 115200),
    (Pty::TTY_OP_OSPEED, 115200),
];

/// One interactive shell session. Exclusively owns the connection's
/// shell channel for its lifetime; at most one per invocation.
pub struct InteractiveSession {
    handle: Handle<ClientHandler>,
}

impl InteractiveSession {
    pub fn new(handle: Handle<ClientHandler>) -> Self {
        Self { handle }
    }

    /// Run the shell to completion and return its exit status.
    ///
    /// Each setup step fails with its own error and aborts the rest;
    /// anything already acquired (channel, raw terminal) is released on
    /// the way out.
    pub async fn run(self) -> Result<u32, SshError> {
        let mut channel = self
            .handle
            .channel_open_session()
            .await
            .map_err(|e| SshError::SessionAllocationFailed(e.to_string()))?;

        let dims = terminal::dimensions();
        debug!("local terminal is {}x{}", dims.width, dims.height);

        // From here on the guard's Drop restores the terminal on every
        // exit path, including the PTY/shell failures below.
        let _raw_guard = RawModeGuard::enter()?;

        channel
            .request_pty(
                true,
                "xterm",
                u32::from(dims.width),
                u32::from(dims.height),
                0,
                0,
                TERMINAL_MODES,
            )
            .await
            .map_err(|e| SshError::PtyAllocationFailed(e.to_string()))?;

        channel
            .request_shell(true)
            .await
            .map_err(|e| SshError::ShellStartFailed(e.to_string()))?;

        info!("remote shell started");

        let (cmd_tx, mut cmd_rx) = mpsc::channel::<SessionCommand>(1024);
        tokio::spawn(relay_stdin(cmd_tx.clone()));
        tokio::spawn(resize::propagate(dims, cmd_tx));

        let mut stdout = tokio::io::stdout();
        let mut stderr = tokio::io::stderr();
        let mut exit_status = None;

        loop {
            tokio::select! {
                Some(cmd) = cmd_rx.recv() => match cmd {
                    SessionCommand::Data(data) => {
                        if channel.data(&data[..]).await.is_err() {
                            break;
                        }
                    }
                    SessionCommand::Resize(d) => {
                        let result = channel
                            .window_change(u32::from(d.width), u32::from(d.height), 0, 0)
                            .await;
                        if let Err(e) = result {
                            // Not fatal; the shell keeps its old size.
                            debug!("window-change request failed: {}", e);
                        }
                    }
                },

                msg = channel.wait() => match msg {
                    Some(ChannelMsg::Data { data }) => {
                        if stdout.write_all(&data).await.is_err() {
                            break;
                        }
                        let _ = stdout.flush().await;
                    }
                    Some(ChannelMsg::ExtendedData { data, ext }) => {
                        if ext == 1 {
                            let _ = stderr.write_all(&data).await;
                            let _ = stderr.flush().await;
                        }
                    }
                    Some(ChannelMsg::ExitStatus { exit_status: status }) => {
                        debug!("remote shell exited with status {}", status);
                        exit_status = Some(status);
                    }
                    Some(ChannelMsg::Eof) | Some(ChannelMsg::Close) | None => break,
                    Some(_) => {}
                },

                else => break,
            }
        }

        info!("session closed");

        // _raw_guard drops here, strictly after the session wait.
        Ok(exit_status.unwrap_or(0))
    }
}

/// Background relay of local stdin into the session. Errors are not
/// surfaced individually; the relay simply stops when either side
/// closes.
async fn relay_stdin(commands: mpsc::Sender<SessionCommand>) {
    let mut stdin = tokio::io::stdin();
    let mut buf = [0u8; 4096];
    loop {
        match stdin.read(&mut buf).await {
            Ok(0) | Err(_) => break,
            Ok(n) => {
                if commands
                    .send(SessionCommand::Data(buf[..n].to_vec()))
                    .await
                    .is_err()
                {
                    break;
                }
            }
        }
    }
    debug!("stdin relay stopped");
}
