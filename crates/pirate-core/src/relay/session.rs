//! Relay session state machine.
//!
//! One [`RelaySession`] spans exactly one relay invocation:
//!
//! ```text
//!   Idle ──begin()──▶ Active ──finish(end)──▶ Closing ──close()──▶ Closed
//!                        ▲  │
//!                        └──┘ read events that do not end the session
//! ```
//!
//! No state is re-enterable.  A closed session cannot be restarted; the relay
//! creates a fresh one per call.
//!
//! The session never performs I/O.  It tells the caller what to do with each
//! chunk (see [`SerialStep`] and [`InputAction`]) and the caller moves bytes.

use thiserror::Error;
use tracing::trace;

use super::marker::MarkerScanner;
use super::{DETACH, EOT};

/// Lifecycle state of a relay session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayState {
    Idle,
    Active,
    Closing,
    Closed,
}

/// How a relay session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The remote printed the completion marker.
    MarkerSeen,
    /// The local user pressed Ctrl-] (no EOF is sent to the remote).
    Detached,
    /// Local input reached end-of-file; one EOT was sent to the remote.
    LocalClosed,
    /// The serial peer hung up without printing the marker.
    RemoteClosed,
    /// The relay was disabled and never opened a device or began a session.
    Disabled,
}

/// What the caller must do after a chunk arrives from the serial side.
///
/// The caller invokes the ready callback first if `fire_ready`, then writes the
/// chunk to local output, then appends CRLF and finishes the session if
/// `marker_seen`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SerialStep {
    /// First data of the session: the ready callback must run now.
    pub fire_ready: bool,
    /// The completion marker is present in the trailing window.
    pub marker_seen: bool,
}

/// Classification of one chunk read from local input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputAction {
    /// Zero bytes read: send one EOT to the remote and end the session.
    LocalClosed,
    /// The chunk contains Ctrl-]: end the session, forward nothing.
    Detach,
    /// The chunk is exactly one Ctrl-D: send one EOT and keep relaying.
    RemoteEof,
    /// Forward the chunk to the remote verbatim.
    Forward,
}

/// Errors from driving the session outside its allowed transitions.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("relay session cannot start from state {0:?}")]
    NotIdle(RelayState),
}

/// Bookkeeping for one relay invocation.
#[derive(Debug, Clone)]
pub struct RelaySession {
    state: RelayState,
    scanner: MarkerScanner,
    ready_fired: bool,
    end: Option<SessionEnd>,
}

impl RelaySession {
    /// Creates an idle session watching for the default completion marker.
    pub fn new() -> Self {
        Self {
            state: RelayState::Idle,
            scanner: MarkerScanner::default(),
            ready_fired: false,
            end: None,
        }
    }

    /// `Idle → Active`.
    pub fn begin(&mut self) -> Result<(), SessionError> {
        if self.state != RelayState::Idle {
            return Err(SessionError::NotIdle(self.state));
        }
        self.transition(RelayState::Active);
        Ok(())
    }

    /// Records a chunk received from the serial side.
    ///
    /// An empty chunk changes nothing.  `fire_ready` is true at most once per
    /// session, on the first non-empty chunk.
    pub fn on_serial_data(&mut self, data: &[u8]) -> SerialStep {
        if data.is_empty() {
            return SerialStep::default();
        }

        let fire_ready = !self.ready_fired;
        self.ready_fired = true;
        let marker_seen = self.scanner.push(data);

        SerialStep {
            fire_ready,
            marker_seen,
        }
    }

    /// Classifies a chunk read from local input.
    ///
    /// Detach takes priority over everything else in the chunk.  Only a chunk
    /// consisting of a single EOT is treated as an EOF request; an EOT mixed
    /// with other bytes is forwarded as data.
    pub fn classify_input(chunk: &[u8]) -> InputAction {
        if chunk.is_empty() {
            InputAction::LocalClosed
        } else if chunk.contains(&DETACH) {
            InputAction::Detach
        } else if chunk == [EOT] {
            InputAction::RemoteEof
        } else {
            InputAction::Forward
        }
    }

    /// `Active → Closing`, recording why the session ended.
    ///
    /// Only the first reason is kept.
    pub fn finish(&mut self, end: SessionEnd) {
        if self.end.is_none() {
            self.end = Some(end);
        }
        if self.state == RelayState::Active {
            self.transition(RelayState::Closing);
        }
    }

    /// `→ Closed` after cleanup.  Returns the recorded end reason, if any.
    pub fn close(&mut self) -> Option<SessionEnd> {
        if self.state != RelayState::Closed {
            self.transition(RelayState::Closed);
        }
        self.end
    }

    pub fn state(&self) -> RelayState {
        self.state
    }

    fn transition(&mut self, next: RelayState) {
        trace!(from = ?self.state, to = ?next, "relay session transition");
        self.state = next;
    }
}

impl Default for RelaySession {
    fn default() -> Self {
        Self::new()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
