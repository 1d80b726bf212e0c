//! Streaming sentinel detection.
//!
//! The remote shell signals completion by printing [`DONE_MARKER`].  Serial
//! reads are arbitrary chunks, so the marker can be split across two reads
//! (`"__PIRATE_"` then `"DONE__"`).  [`MarkerScanner`] keeps a short trailing
//! window of received bytes and searches that instead of each chunk.
//!
//! The window is bounded to `marker.len() + 1024` bytes.  It exists only to
//! catch a straddling marker and is never a transcript of the session.

/// Sentinel printed by the remote side when its shell exits.
pub const DONE_MARKER: &[u8] = b"__PIRATE_DONE__";

/// Extra bytes retained beyond the marker length.
const WINDOW_SLACK: usize = 1024;

/// Rolling-window search for a fixed byte sequence.
#[derive(Debug, Clone)]
pub struct MarkerScanner {
    marker: &'static [u8],
    window: Vec<u8>,
    capacity: usize,
}

impl MarkerScanner {
    /// Creates a scanner for `marker` with an empty window.
    pub fn new(marker: &'static [u8]) -> Self {
        let capacity = marker.len() + WINDOW_SLACK;
        Self {
            marker,
            window: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Appends `data` to the window and reports whether the marker is in it.
    ///
    /// Oldest bytes are discarded once the window exceeds its capacity.
    pub fn push(&mut self, data: &[u8]) -> bool {
        self.window.extend_from_slice(data);
        if self.window.len() > self.capacity {
            let excess = self.window.len() - self.capacity;
            self.window.drain(..excess);
        }
        self.found()
    }

    /// Returns `true` if the marker currently appears anywhere in the window.
    pub fn found(&self) -> bool {
        !self.marker.is_empty()
            && self
                .window
                .windows(self.marker.len())
                .any(|w| w == self.marker)
    }

    /// Maximum number of bytes the window retains.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of bytes currently retained.
    pub fn len(&self) -> usize {
        self.window.len()
    }

    /// Returns `true` if nothing has been retained yet.
    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }
}

impl Default for MarkerScanner {
    fn default() -> Self {
        Self::new(DONE_MARKER)
    }
}
