//! Channel implementations for the `FrameSink` seam.
//!
//! The real Bluetooth link is provided by the platform and is outside this
//! crate.  What lives here:
//!
//! - [`ChannelFrameSink`] / [`channel_link`] – an in-memory link backed by
//!   Tokio mpsc queues.  The far end gets the sender for inbound frames and
//!   the receiver for outbound frames.
//! - [`LoggingFrameSink`] – accepts every frame and logs it as hex.
//! - [`replay`] – reads a capture file and pushes its frames into a link.

pub mod replay;

use std::fmt::Write as _;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tracing::debug;
use wiikey_core::RemoteIdentity;

use crate::application::run_session::{ChannelError, FrameSink, RemoteLink};

/// Outbound sink that forwards frames into an mpsc queue.
#[derive(Debug, Clone)]
pub struct ChannelFrameSink {
    tx: mpsc::Sender<Vec<u8>>,
}

impl ChannelFrameSink {
    pub fn new(tx: mpsc::Sender<Vec<u8>>) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl FrameSink for ChannelFrameSink {
    async fn send(&self, frame: Vec<u8>) -> Result<(), ChannelError> {
        self.tx.send(frame).await.map_err(|_| ChannelError::Closed)
    }
}

/// Outbound sink that accepts and logs every frame.
#[derive(Debug, Clone, Copy)]
pub struct LoggingFrameSink {
    identity: RemoteIdentity,
}

impl LoggingFrameSink {
    pub fn new(identity: RemoteIdentity) -> Self {
        Self { identity }
    }
}

#[async_trait]
impl FrameSink for LoggingFrameSink {
    async fn send(&self, frame: Vec<u8>) -> Result<(), ChannelError> {
        debug!(identity = %self.identity, frame = %hex(&frame), "outbound");
        Ok(())
    }
}

/// The far end of an in-memory link: what a transport (or a test) holds.
pub struct LinkEnds {
    /// Push raw inbound frames here.  Dropping it closes the channel.
    pub inbound: mpsc::Sender<Vec<u8>>,
    /// Frames the session sent to the remote.
    pub outbound: mpsc::Receiver<Vec<u8>>,
}

/// Creates a [`RemoteLink`] and its far end, both queues `depth` deep.
pub fn channel_link(identity: RemoteIdentity, depth: usize) -> (RemoteLink, LinkEnds) {
    let (inbound_tx, inbound_rx) = mpsc::channel(depth);
    let (outbound_tx, outbound_rx) = mpsc::channel(depth);
    let link = RemoteLink::new(
        identity,
        inbound_rx,
        Arc::new(ChannelFrameSink::new(outbound_tx)),
    );
    let ends = LinkEnds {
        inbound: inbound_tx,
        outbound: outbound_rx,
    };
    (link, ends)
}

/// Formats bytes as space-separated upper-case hex, e.g. `A2 11 F0`.
pub fn hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 3);
    for (i, b) in bytes.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        let _ = write!(out, "{b:02X}");
    }
    out
}

// ── Tests ─────────────────────────────────────────────────────────────────────
