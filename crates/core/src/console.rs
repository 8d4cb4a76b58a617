//! Console input for the interactive loops.
//!
//! Lines are read on a dedicated thread and delivered over a channel, so the
//! session loop can wait for the next line and for an interrupt at the same
//! time. A closed channel means the input has ended.

use std::io::{self, BufRead};
use std::thread;
use tokio::sync::mpsc;
use tracing::warn;

/// Lines typed by the user, without their line terminators.
pub type ConsoleLines = mpsc::Receiver<String>;

/// Starts a thread that forwards every stdin line to the returned receiver.
///
/// The thread exits when stdin reaches end-of-file, a read fails, or the
/// receiver is dropped.
pub fn spawn_stdin_reader() -> io::Result<ConsoleLines> {
    let (tx, rx) = mpsc::channel(16);
    thread::Builder::new()
        .name("stdin-reader".to_string())
        .spawn(move || {
            for line in io::stdin().lock().lines() {
                match line {
                    Ok(line) => {
                        if tx.blocking_send(line).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        warn!(error = %e, "Failed to read from stdin");
                        break;
                    }
                }
            }
        })?;
    Ok(rx)
}

/// A finished input stream holding the lines of `script`.
#[cfg(test)]
pub(crate) fn scripted(script: &str) -> ConsoleLines {
    let lines: Vec<&str> = script.lines().collect();
    let (tx, rx) = mpsc::channel(lines.len().max(1));
    for line in lines {
        tx.try_send(line.to_string())
            .expect("channel sized to hold the whole script");
    }
    rx
}
