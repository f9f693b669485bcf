//! Capture-file replay.
//!
//! A capture file holds one inbound frame per line as hex bytes.  Bytes may
//! be separated by spaces or run together; `#` starts a comment.
//!
//! ```text
//! # status: extension present, battery 0xC8
//! A1 20 00 00 02 00 00 C8
//! a12200001600
//! ```
//!
//! Replaying pushes the frames into a link's inbound queue one after another
//! and then drops the sender, which the session sees as a channel closure.

use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Error type for capture files.
#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("I/O error reading capture {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("line {line}: invalid hex {token:?}")]
    BadHex { line: usize, token: String },
}

/// Parses capture text into frames.  Blank and comment-only lines are skipped.
///
/// # Errors
///
/// Returns [`ReplayError::BadHex`] for the first line that is not an even
/// number of hex digits.
pub fn parse_capture(text: &str) -> Result<Vec<Vec<u8>>, ReplayError> {
    let mut frames = Vec::new();
    for (i, raw) in text.lines().enumerate() {
        let content = raw.split('#').next().unwrap_or("");
        let digits: String = content.chars().filter(|c| !c.is_whitespace()).collect();
        if digits.is_empty() {
            continue;
        }
        let bad = || ReplayError::BadHex {
            line: i + 1,
            token: content.trim().to_string(),
        };
        if digits.len() % 2 != 0 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(bad());
        }
        let frame = (0..digits.len())
            .step_by(2)
            .map(|at| u8::from_str_radix(&digits[at..at + 2], 16).map_err(|_| bad()))
            .collect::<Result<Vec<u8>, _>>()?;
        frames.push(frame);
    }
    Ok(frames)
}

/// Reads and parses a capture file.
///
/// # Errors
///
/// Returns [`ReplayError::Io`] if the file cannot be read, or
/// [`ReplayError::BadHex`] if its content is malformed.
pub async fn load_capture(path: &Path) -> Result<Vec<Vec<u8>>, ReplayError> {
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| ReplayError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    let frames = parse_capture(&text)?;
    info!(path = %path.display(), frames = frames.len(), "capture loaded");
    Ok(frames)
}

/// Spawns a task that feeds `frames` into `inbound`, waiting `interval`
/// between frames, then closes the channel by dropping the sender.
pub fn spawn_replay(
    frames: Vec<Vec<u8>>,
    inbound: mpsc::Sender<Vec<u8>>,
    interval: Duration,
) -> JoinHandle<usize> {
    tokio::spawn(async move {
        let mut sent = 0;
        for frame in frames {
            if inbound.send(frame).await.is_err() {
                debug!("replay target closed early");
                break;
            }
            sent += 1;
            if !interval.is_zero() {
                tokio::time::sleep(interval).await;
            }
        }
        sent
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
