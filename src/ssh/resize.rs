//! Terminal resize propagation
//!
//! Keeps the remote PTY's dimensions synchronized with the local
//! terminal for the lifetime of a session. On Unix this subscribes to
//! SIGWINCH; elsewhere (or when signal registration fails) it falls
//! back to a fixed-interval poll that synthesizes a resize check on
//! every tick. A window-change request is only sent when the measured
//! dimensions actually differ from the last value sent.

use std::time::Duration;

use tokio::sync::mpsc;
use tracing::debug;

use super::session::SessionCommand;
use super::terminal::{self, Dimensions};

const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Source of "the terminal may have been resized" events.
///
/// Both variants present the same interface so the propagator is
/// written once against the abstraction.
enum ChangeNotifier {
    #[cfg(unix)]
    Signal(tokio::signal::unix::Signal),
    Poll(tokio::time::Interval),
}

impl ChangeNotifier {
    /// Pick the platform's best notification source.
    fn subscribe() -> Self {
        #[cfg(unix)]
        {
            use tokio::signal::unix::{signal, SignalKind};
            match signal(SignalKind::window_change()) {
                Ok(sig) => return ChangeNotifier::Signal(sig),
                Err(e) => {
                    debug!("SIGWINCH unavailable, polling for resizes: {}", e);
                }
            }
        }
        ChangeNotifier::Poll(tokio::time::interval(POLL_INTERVAL))
    }

    /// Wait for the next resize check. Returns false when the
    /// notification source is closed.
    async fn changed(&mut self) -> bool {
        match self {
            #[cfg(unix)]
            ChangeNotifier::Signal(sig) => sig.recv().await.is_some(),
            ChangeNotifier::Poll(interval) => {
                interval.tick().await;
                true
            }
        }
    }
}

/// Remembers the last dimensions sent for a session and yields a value
/// only when a new reading differs.
#[derive(Debug)]
pub struct ResizeTracker {
    last_sent: Dimensions,
}

impl ResizeTracker {
    pub fn new(initial: Dimensions) -> Self {
        Self { last_sent: initial }
    }

    /// Record a reading; `Some` means a window-change request is due.
    pub fn observe(&mut self, current: Dimensions) -> Option<Dimensions> {
        if current == self.last_sent {
            None
        } else {
            self.last_sent = current;
            Some(current)
        }
    }
}

/// Background activity for one session: forward dimension changes as
/// [`SessionCommand::Resize`] until the notifier closes or the session's
/// command channel is gone. Session teardown never waits for this task.
pub(super) async fn propagate(initial: Dimensions, commands: mpsc::Sender<SessionCommand>) {
    let mut notifier = ChangeNotifier::subscribe();
    let mut tracker = ResizeTracker::new(initial);

    while notifier.changed().await {
        if let Some(dims) = tracker.observe(terminal::dimensions()) {
            debug!("terminal resized to {}x{}", dims.width, dims.height);
            if commands.send(SessionCommand::Resize(dims)).await.is_err() {
                break;
            }
        }
    }
}
