//! Typing-speed pacing.
//!
//! Keystrokes are spaced evenly according to a words-per-minute figure, using
//! the usual typing-test convention of five characters per word.  The delay is
//! applied after every keystroke group, including the last one.

use std::time::Duration;

/// Slowest accepted typing speed; lower values are clamped up to this.
pub const MIN_WPM: u32 = 10;
/// Fastest accepted typing speed; higher values are clamped down to this.
pub const MAX_WPM: u32 = 1000;
/// Average word length assumed when converting WPM to keystrokes.
pub const CHARS_PER_WORD: u32 = 5;

/// Clamps `wpm` into `[MIN_WPM, MAX_WPM]`.
pub fn clamp_wpm(wpm: u32) -> u32 {
    wpm.clamp(MIN_WPM, MAX_WPM)
}

/// Returns the pause between keystroke groups for a typing speed.
///
/// `60 / (wpm × 5)` seconds, after clamping `wpm`.
///
/// ```rust
/// use std::time::Duration;
/// use pirate_core::keystroke_delay;
///
/// assert_eq!(keystroke_delay(1), Duration::from_secs_f64(1.2));
/// assert_eq!(keystroke_delay(5000), Duration::from_secs_f64(0.012));
/// ```
pub fn keystroke_delay(wpm: u32) -> Duration {
    let wpm = clamp_wpm(wpm);
    Duration::from_secs_f64(60.0 / f64::from(wpm * CHARS_PER_WORD))
}
