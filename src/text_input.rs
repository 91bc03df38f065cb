//! Typed input source for text mode.
//!
//! A blocking stdin reader runs in `spawn_blocking` and feeds lines into
//! an mpsc channel; the session loop polls it without blocking so mode
//! switches stay responsive.

use tokio::sync::mpsc;
use tracing::debug;

/// Lines typed by the user, queued until the session loop polls them.
pub struct TextInputSource {
    rx: mpsc::Receiver<String>,
}

impl TextInputSource {
    /// Spawn the stdin reader.
    ///
    /// The reader thread lives for the process lifetime; switching to
    /// voice mode simply stops polling the queue (a pending line typed in
    /// text mode is dropped on switch by draining).
    pub fn spawn() -> Self {
        let (tx, rx) = mpsc::channel(8);
        tokio::task::spawn_blocking(move || {
            let stdin = std::io::stdin();
            let mut line = String::new();
            loop {
                line.clear();
                match std::io::BufRead::read_line(&mut stdin.lock(), &mut line) {
                    Ok(0) => break, // EOF
                    Ok(_) => {
                        // Empty lines are forwarded: interactive prompts
                        // treat bare Enter as "keep the current value".
                        let trimmed = line.trim();
                        if tx.blocking_send(trimmed.to_owned()).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        debug!("stdin read error: {e}");
                        break;
                    }
                }
            }
        });
        Self { rx }
    }

    /// Build a source from an existing channel (used by tests to script
    /// typed input).
    pub fn from_channel(rx: mpsc::Receiver<String>) -> Self {
        Self { rx }
    }

    /// Take the next queued line, if any.
    pub fn poll(&mut self) -> Option<String> {
        self.rx.try_recv().ok()
    }

    /// Wait up to `timeout` for the next typed line (used by interactive
    /// configuration prompts, regardless of input mode).
    pub async fn next_line(&mut self, timeout: std::time::Duration) -> Option<String> {
        tokio::time::timeout(timeout, self.rx.recv()).await.ok()?
    }

    /// Drop any queued lines (called when switching to voice mode).
    pub fn drain(&mut self) {
        while self.rx.try_recv().is_ok() {}
    }
}
