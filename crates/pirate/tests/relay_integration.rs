//! End-to-end tests for the serial relay loop.
//!
//! The serial link, the local input and the local output are all
//! `UnixStream` pairs: the relay gets one end, the test drives the other.
//! Terminal handling and SIGINT forwarding are switched off so the tests can
//! run in parallel without a TTY.

use std::io::{ErrorKind, Read, Write};
use std::os::fd::OwnedFd;
use std::os::unix::net::UnixStream;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

use pirate::infrastructure::serial_console::{
    RelayError, SerialConsole, SerialOptions, StdioOptions,
};
use pirate::infrastructure::storage::config::PirateConfig;
use pirate_core::SessionEnd;

// ── Helpers ──────────────────────────────────────────────────────────────────

/// Test-side ends of the three streams.
struct Harness {
    remote: UnixStream,
    keyboard: UnixStream,
    screen: UnixStream,
}

/// Relay-side ends, ready to hand to `stdio_with`.
struct RelayEnds {
    link: UnixStream,
    options: StdioOptions,
}

fn harness() -> (Harness, RelayEnds) {
    let (link, remote) = UnixStream::pair().unwrap();
    let (input, keyboard) = UnixStream::pair().unwrap();
    let (output, screen) = UnixStream::pair().unwrap();
    let options = StdioOptions {
        input: Some(OwnedFd::from(input)),
        output: Some(OwnedFd::from(output)),
        manage_tty: false,
        forward_sigint: false,
        ..Default::default()
    };
    (
        Harness {
            remote,
            keyboard,
            screen,
        },
        RelayEnds { link, options },
    )
}

fn console(options: SerialOptions) -> SerialConsole {
    SerialConsole::new(options, &PirateConfig::default())
}

/// Runs the relay on its own thread and hands the link back when it ends.
fn spawn_relay(
    mut console: SerialConsole,
    ends: RelayEnds,
) -> thread::JoinHandle<(Result<SessionEnd, RelayError>, UnixStream)> {
    thread::spawn(move || {
        let RelayEnds { mut link, options } = ends;
        let result = console.stdio_with(&mut link, options);
        (result, link)
    })
}

fn read_exact_n(stream: &mut UnixStream, n: usize) -> Vec<u8> {
    let mut buf = vec![0u8; n];
    stream.read_exact(&mut buf).unwrap();
    buf
}

/// Everything still unread on `stream`, without waiting for more.
fn read_pending(stream: &mut UnixStream) -> Vec<u8> {
    stream.set_nonblocking(true).unwrap();
    let mut out = Vec::new();
    let mut buf = [0u8; 256];
    loop {
        match stream.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => out.extend_from_slice(&buf[..n]),
            Err(e) if e.kind() == ErrorKind::WouldBlock => break,
            Err(e) => panic!("unexpected read error: {e}"),
        }
    }
    out
}

// ── Remote → local ───────────────────────────────────────────────────────────

#[test]
fn test_marker_ends_session_with_one_crlf() {
    // Arrange
    let (mut h, ends) = harness();
    h.remote.write_all(b"$ exit\r\n__PIRATE_DONE__").unwrap();

    // Act
    let (result, _link) = spawn_relay(console(SerialOptions::default()), ends)
        .join()
        .unwrap();

    // Assert
    assert_eq!(result.unwrap(), SessionEnd::MarkerSeen);
    let mut screen = Vec::new();
    h.screen.read_to_end(&mut screen).unwrap();
    assert_eq!(screen, b"$ exit\r\n__PIRATE_DONE__\r\n");
}

#[test]
fn test_marker_split_across_reads_is_detected() {
    // Arrange
    let (mut h, ends) = harness();
    let relay = spawn_relay(console(SerialOptions::default()), ends);

    // Act: second half only goes out after the first has been relayed
    h.remote.write_all(b"__PIRATE_").unwrap();
    assert_eq!(read_exact_n(&mut h.screen, 9), b"__PIRATE_");
    h.remote.write_all(b"DONE__").unwrap();
    let (result, _link) = relay.join().unwrap();

    // Assert
    assert_eq!(result.unwrap(), SessionEnd::MarkerSeen);
    let mut rest = Vec::new();
    h.screen.read_to_end(&mut rest).unwrap();
    assert_eq!(rest, b"DONE__\r\n");
}

#[test]
fn test_ready_callback_fires_once_per_session() {
    // Arrange
    let (mut h, ends) = harness();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let options = SerialOptions {
        on_ready: Some(Box::new(move || -> anyhow::Result<()> {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })),
        ..Default::default()
    };
    let relay = spawn_relay(console(options), ends);

    // Act: two separate reads before the marker
    h.remote.write_all(b"one").unwrap();
    read_exact_n(&mut h.screen, 3);
    h.remote.write_all(b"two").unwrap();
    read_exact_n(&mut h.screen, 3);
    h.remote.write_all(b"__PIRATE_DONE__").unwrap();
    let (result, _link) = relay.join().unwrap();

    // Assert
    assert_eq!(result.unwrap(), SessionEnd::MarkerSeen);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn test_failing_ready_callback_does_not_stop_relay() {
    // Arrange
    let (mut h, ends) = harness();
    let options = SerialOptions {
        on_ready: Some(Box::new(|| -> anyhow::Result<()> {
            anyhow::bail!("banner failed")
        })),
        ..Default::default()
    };
    h.remote.write_all(b"hi__PIRATE_DONE__").unwrap();

    // Act
    let (result, _link) = spawn_relay(console(options), ends).join().unwrap();

    // Assert
    assert_eq!(result.unwrap(), SessionEnd::MarkerSeen);
    let mut screen = Vec::new();
    h.screen.read_to_end(&mut screen).unwrap();
    assert_eq!(screen, b"hi__PIRATE_DONE__\r\n");
}

// ── Local → remote ───────────────────────────────────────────────────────────

#[test]
fn test_typed_input_is_forwarded_verbatim() {
    // Arrange
    let (mut h, ends) = harness();
    let relay = spawn_relay(console(SerialOptions::default()), ends);

    // Act
    h.keyboard.write_all(b"echo hi\n").unwrap();
    let forwarded = read_exact_n(&mut h.remote, 8);
    h.remote.write_all(b"hi\r\n__PIRATE_DONE__").unwrap();
    let (result, _link) = relay.join().unwrap();

    // Assert
    assert_eq!(forwarded, b"echo hi\n");
    assert_eq!(result.unwrap(), SessionEnd::MarkerSeen);
}

#[test]
fn test_detach_sends_nothing_to_remote() {
    // Arrange
    let (mut h, ends) = harness();
    h.keyboard.write_all(b"ls\x1d").unwrap();

    // Act
    let (result, _link) = spawn_relay(console(SerialOptions::default()), ends)
        .join()
        .unwrap();

    // Assert
    assert_eq!(result.unwrap(), SessionEnd::Detached);
    assert!(read_pending(&mut h.remote).is_empty());
}

#[test]
fn test_end_of_input_sends_single_eot() {
    // Arrange
    let (mut h, ends) = harness();
    drop(h.keyboard);

    // Act
    let (result, _link) = spawn_relay(console(SerialOptions::default()), ends)
        .join()
        .unwrap();

    // Assert
    assert_eq!(result.unwrap(), SessionEnd::LocalClosed);
    assert_eq!(read_pending(&mut h.remote), vec![0x04]);
}

#[test]
fn test_lone_ctrl_d_is_forwarded_and_relay_continues() {
    // Arrange
    let (mut h, ends) = harness();
    let relay = spawn_relay(console(SerialOptions::default()), ends);

    // Act
    h.keyboard.write_all(&[0x04]).unwrap();
    let first = read_exact_n(&mut h.remote, 1);
    h.keyboard.write_all(&[0x1D]).unwrap();
    let (result, _link) = relay.join().unwrap();

    // Assert
    assert_eq!(first, vec![0x04]);
    assert_eq!(result.unwrap(), SessionEnd::Detached);
    assert!(read_pending(&mut h.remote).is_empty());
}

// ── Lifecycle ────────────────────────────────────────────────────────────────

#[test]
fn test_caller_owned_link_stays_open() {
    // Arrange
    let (mut h, ends) = harness();
    h.keyboard.write_all(&[0x1D]).unwrap();

    // Act
    let (result, mut link) = spawn_relay(console(SerialOptions::default()), ends)
        .join()
        .unwrap();
    link.write_all(b"still here").unwrap();

    // Assert
    assert_eq!(result.unwrap(), SessionEnd::Detached);
    assert_eq!(read_exact_n(&mut h.remote, 10), b"still here");
}

#[test]
fn test_disabled_console_returns_without_relaying() {
    // Arrange
    let (mut h, ends) = harness();
    let options = SerialOptions {
        disabled: Some(true),
        ..Default::default()
    };
    h.keyboard.write_all(b"ignored").unwrap();

    // Act
    let (result, _link) = spawn_relay(console(options), ends).join().unwrap();

    // Assert
    assert_eq!(result.unwrap(), SessionEnd::Disabled);
    assert!(read_pending(&mut h.remote).is_empty());
}

#[test]
fn test_console_is_reusable_across_sessions() {
    // Arrange
    let mut console = console(SerialOptions::default());
    let (mut first, first_ends) = harness();
    let (mut second, second_ends) = harness();
    first.remote.write_all(b"__PIRATE_DONE__").unwrap();
    second.keyboard.write_all(&[0x1D]).unwrap();

    // Act
    let RelayEnds { mut link, options } = first_ends;
    let first_end = console.stdio_with(&mut link, options).unwrap();
    let RelayEnds { mut link, options } = second_ends;
    let second_end = console.stdio_with(&mut link, options).unwrap();

    // Assert
    assert_eq!(first_end, SessionEnd::MarkerSeen);
    assert_eq!(second_end, SessionEnd::Detached);
    let mut screen = Vec::new();
    first.screen.read_to_end(&mut screen).unwrap();
    assert_eq!(screen, b"__PIRATE_DONE__\r\n");
    assert!(read_pending(&mut second.remote).is_empty());
}

#[test]
fn test_remote_hangup_ends_session() {
    // Arrange
    let (h, ends) = harness();
    let Harness {
        remote,
        keyboard: _keyboard,
        mut screen,
    } = h;
    drop(remote);

    // Act
    let (result, _link) = spawn_relay(console(SerialOptions::default()), ends)
        .join()
        .unwrap();

    // Assert
    assert_eq!(result.unwrap(), SessionEnd::RemoteClosed);
    let mut rest = Vec::new();
    screen.read_to_end(&mut rest).unwrap();
    assert!(rest.is_empty());
}

#[test]
fn test_output_before_hangup_is_relayed() {
    // Arrange
    let (h, ends) = harness();
    let Harness {
        mut remote,
        keyboard: _keyboard,
        mut screen,
    } = h;
    remote.write_all(b"logout\r\n").unwrap();
    drop(remote);

    // Act
    let (result, _link) = spawn_relay(console(SerialOptions::default()), ends)
        .join()
        .unwrap();

    // Assert
    assert_eq!(result.unwrap(), SessionEnd::RemoteClosed);
    let mut rest = Vec::new();
    screen.read_to_end(&mut rest).unwrap();
    assert_eq!(rest, b"logout\r\n");
}
