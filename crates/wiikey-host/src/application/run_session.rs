//! Per-remote session loop.
//!
//! One Tokio task per connected remote.  The task owns the remote's
//! [`RemoteSession`] outright and processes one input at a time, either an
//! inbound frame from the link or a [`SessionCommand`] from the manager, so a
//! single remote's frames are always handled strictly in arrival order.
//!
//! # Loop shape (for beginners)
//!
//! ```text
//! greeting (LED frame) ──► sink
//! loop {
//!     select! {
//!         frame   = inbound.recv()  -> decode, advance, send replies, inject keys
//!         command = commands.recv() -> LEDs / rumble / disconnect
//!     }
//! }
//! close ──► SessionEvent::Closed
//! ```
//!
//! The dispatch toggle and the mapping table are both read fresh for every
//! frame, so flipping dispatch or reloading the mapping file takes effect on
//! the very next report without restarting the session.
//!
//! # Events
//!
//! All sessions share one event queue.  `StatusChanged` is offered with
//! `try_send` and dropped (with a warning) when the queue is full, so a slow
//! front end never stalls key dispatch.  `Opened` and `Closed` are awaited;
//! whoever holds the receiver must keep draining it while sessions close.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, error, info, warn};
use wiikey_core::{
    encode_output_report, KeyDispatch, LedSet, OutputReport, RemoteIdentity, RemoteSession,
    ReportError, SessionId, SharedMappingTable,
};

use crate::application::inject_keys::InjectKeysUseCase;

// ── Transport seam ────────────────────────────────────────────────────────────

/// Errors from the outbound half of a remote's channel.
#[derive(Debug, Error)]
pub enum ChannelError {
    /// The channel to the remote has been closed.
    #[error("channel closed")]
    Closed,
    /// The transport failed to send.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// The report could not be encoded; nothing was sent.
    #[error("cannot encode report: {0}")]
    Encode(#[from] ReportError),
}

/// Outbound half of a remote's channel.
///
/// `send` is fire-and-forget: it returns once the frame is handed to the
/// transport and never waits for the remote to reply.
#[async_trait]
pub trait FrameSink: Send + Sync {
    async fn send(&self, frame: Vec<u8>) -> Result<(), ChannelError>;
}

/// An open channel to one remote, as handed over by the transport.
pub struct RemoteLink {
    pub identity: RemoteIdentity,
    /// Raw inbound frames in arrival order.  `None` from `recv` means the
    /// channel closed.
    pub inbound: mpsc::Receiver<Vec<u8>>,
    pub sink: Arc<dyn FrameSink>,
}

impl RemoteLink {
    pub fn new(
        identity: RemoteIdentity,
        inbound: mpsc::Receiver<Vec<u8>>,
        sink: Arc<dyn FrameSink>,
    ) -> Self {
        Self {
            identity,
            inbound,
            sink,
        }
    }
}

// ── Commands and events ───────────────────────────────────────────────────────

/// Operator commands delivered to a running session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    SetLeds(LedSet),
    SetRumble(bool),
    Disconnect,
}

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// The transport closed the channel (inbound ended or a send failed).
    ChannelClosed,
    /// The operator asked for a disconnect, or the manager went away.
    Disconnected,
}

/// Lifecycle and status notifications for a front end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    Opened {
        identity: RemoteIdentity,
        session_id: SessionId,
    },
    StatusChanged {
        identity: RemoteIdentity,
        battery_level: u8,
        low_battery: bool,
        extension_present: bool,
    },
    Closed {
        identity: RemoteIdentity,
        session_id: SessionId,
        reason: CloseReason,
    },
}

/// Shared collaborators every session task needs.
#[derive(Clone)]
pub struct SessionContext {
    pub mappings: Arc<SharedMappingTable>,
    pub dispatch_enabled: Arc<AtomicBool>,
    pub injector: Arc<InjectKeysUseCase>,
    pub events: mpsc::Sender<SessionEvent>,
    /// LED pattern sent as soon as the session opens.
    pub initial_leds: LedSet,
}

// ── Session loop ──────────────────────────────────────────────────────────────

/// Runs one remote until its channel closes or it is told to disconnect.
///
/// Returns the reason the session ended.  Once this returns, no further key
/// events are injected for the remote.
pub async fn run_session(
    mut link: RemoteLink,
    mut commands: mpsc::Receiver<SessionCommand>,
    ctx: SessionContext,
) -> CloseReason {
    let mut session = RemoteSession::new(link.identity);
    let identity = session.identity();
    let session_id = session.session_id();
    info!(%identity, session = %session_id, "session opened");
    let _ = ctx
        .events
        .send(SessionEvent::Opened {
            identity,
            session_id,
        })
        .await;

    let greeting = session.greeting(ctx.initial_leds);
    let mut reason = match send_or_skip(link.sink.as_ref(), &greeting).await {
        Ok(()) => None,
        Err(_) => Some(CloseReason::ChannelClosed),
    };

    while reason.is_none() {
        tokio::select! {
            frame = link.inbound.recv() => {
                let Some(frame) = frame else {
                    reason = Some(CloseReason::ChannelClosed);
                    break;
                };
                let enabled = ctx.dispatch_enabled.load(Ordering::Relaxed);
                let mappings = ctx.mappings.snapshot();
                let dispatch = KeyDispatch::from_enabled(enabled);
                let output = session.handle_frame(&frame, dispatch, &mappings);

                if output.status_changed {
                    publish_status(
                        &ctx.events,
                        SessionEvent::StatusChanged {
                            identity,
                            battery_level: session.battery_level(),
                            low_battery: session.low_battery(),
                            extension_present: session.extension_present(),
                        },
                    );
                }

                if send_all(link.sink.as_ref(), &output.outbound).await.is_err() {
                    reason = Some(CloseReason::ChannelClosed);
                    break;
                }
                ctx.injector.inject_all(&output.key_events);
            }
            command = commands.recv() => {
                let report = match command {
                    Some(SessionCommand::SetLeds(leds)) => session.set_leds(leds),
                    Some(SessionCommand::SetRumble(on)) => session.set_rumble(on),
                    Some(SessionCommand::Disconnect) | None => {
                        reason = Some(CloseReason::Disconnected);
                        break;
                    }
                };
                if send_or_skip(link.sink.as_ref(), &report).await.is_err() {
                    reason = Some(CloseReason::ChannelClosed);
                }
            }
        }
    }

    let reason = reason.unwrap_or(CloseReason::ChannelClosed);
    // Senders observe the closure before the Closed event goes out.
    commands.close();
    link.inbound.close();
    session.close();
    info!(%identity, session = %session_id, ?reason, "session closed");
    let _ = ctx
        .events
        .send(SessionEvent::Closed {
            identity,
            session_id,
            reason,
        })
        .await;
    reason
}

/// Offers a status event without waiting for queue space.
fn publish_status(events: &mpsc::Sender<SessionEvent>, event: SessionEvent) {
    match events.try_send(event) {
        Ok(()) | Err(TrySendError::Closed(_)) => {}
        Err(TrySendError::Full(event)) => warn!(?event, "event queue full, status update dropped"),
    }
}

/// Sends every report in order.  Stops at the first transport failure.
async fn send_all(sink: &dyn FrameSink, reports: &[OutputReport]) -> Result<(), ChannelError> {
    for report in reports {
        send_or_skip(sink, report).await?;
    }
    Ok(())
}

/// Like [`send_report`], but an unencodable report is logged and skipped;
/// only transport failures are returned.
async fn send_or_skip(sink: &dyn FrameSink, report: &OutputReport) -> Result<(), ChannelError> {
    match send_report(sink, report).await {
        Err(ChannelError::Encode(e)) => {
            error!(error = %e, ?report, "outbound report dropped");
            Ok(())
        }
        result => result,
    }
}

async fn send_report(sink: &dyn FrameSink, report: &OutputReport) -> Result<(), ChannelError> {
    let frame = encode_output_report(report)?;
    debug!(
        report_id = %format_args!("0x{:02X}", report.report_id()),
        len = frame.len(),
        "send"
    );
    sink.send(frame).await.map_err(|e| {
        debug!(error = %e, "send failed");
        e
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::inject_keys::MockKeyInjector;
    use std::sync::Mutex;

    #[derive(Default)]
    struct CollectingSink {
        frames: Mutex<Vec<Vec<u8>>>,
        closed: bool,
    }

    #[async_trait]
    impl FrameSink for CollectingSink {
        async fn send(&self, frame: Vec<u8>) -> Result<(), ChannelError> {
            if self.closed {
                return Err(ChannelError::Closed);
            }
            self.frames.lock().unwrap().push(frame);
            Ok(())
        }
    }

    fn identity() -> RemoteIdentity {
        RemoteIdentity::from_octets([0x00, 0x19, 0x1D, 0xAA, 0xBB, 0xCC])
    }

    fn context(injector: MockKeyInjector) -> (SessionContext, mpsc::Receiver<SessionEvent>) {
        let (events, rx) = mpsc::channel(16);
        let ctx = SessionContext {
            mappings: Arc::new(SharedMappingTable::default()),
            dispatch_enabled: Arc::new(AtomicBool::new(true)),
            injector: Arc::new(InjectKeysUseCase::new(Arc::new(injector))),
            events,
            initial_leds: LedSet::ALL,
        };
        (ctx, rx)
    }

    #[tokio::test]
    async fn test_session_sends_greeting_and_closes_with_channel() {
        // Arrange
        let (ctx, mut events) = context(MockKeyInjector::new());
        let sink = Arc::new(CollectingSink::default());
        let (inbound_tx, inbound_rx) = mpsc::channel(4);
        let (_cmd_tx, cmd_rx) = mpsc::channel(4);
        let link = RemoteLink::new(identity(), inbound_rx, sink.clone());

        // Act – closing the inbound side ends the session
        drop(inbound_tx);
        let reason = run_session(link, cmd_rx, ctx).await;

        // Assert
        assert_eq!(reason, CloseReason::ChannelClosed);
        assert_eq!(*sink.frames.lock().unwrap(), vec![vec![0xA2, 0x11, 0xF0]]);
        assert!(matches!(events.recv().await, Some(SessionEvent::Opened { .. })));
        assert!(matches!(
            events.recv().await,
            Some(SessionEvent::Closed {
                reason: CloseReason::ChannelClosed,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_disconnect_command_ends_session() {
        let (ctx, _events) = context(MockKeyInjector::new());
        let sink = Arc::new(CollectingSink::default());
        let (_inbound_tx, inbound_rx) = mpsc::channel(4);
        let (cmd_tx, cmd_rx) = mpsc::channel(4);
        let link = RemoteLink::new(identity(), inbound_rx, sink);

        cmd_tx.send(SessionCommand::Disconnect).await.unwrap();
        let reason = run_session(link, cmd_rx, ctx).await;

        assert_eq!(reason, CloseReason::Disconnected);
    }

    #[tokio::test]
    async fn test_failed_greeting_closes_session_without_injecting() {
        let mut injector = MockKeyInjector::new();
        injector.expect_key_down().never();
        let (ctx, _events) = context(injector);
        let sink = Arc::new(CollectingSink {
            closed: true,
            ..CollectingSink::default()
        });
        let (inbound_tx, inbound_rx) = mpsc::channel(4);
        let (_cmd_tx, cmd_rx) = mpsc::channel(4);
        inbound_tx.send(vec![0xA1, 0x20, 0, 0, 0x02, 0, 0, 0x80]).await.unwrap();
        let link = RemoteLink::new(identity(), inbound_rx, sink);

        assert_eq!(run_session(link, cmd_rx, ctx).await, CloseReason::ChannelClosed);
    }

    #[tokio::test]
    async fn test_rumble_command_is_folded_into_later_led_frame() {
        // Arrange
        let (ctx, _events) = context(MockKeyInjector::new());
        let sink = Arc::new(CollectingSink::default());
        let (_inbound_tx, inbound_rx) = mpsc::channel(4);
        let (cmd_tx, cmd_rx) = mpsc::channel(4);
        let link = RemoteLink::new(identity(), inbound_rx, sink.clone());

        // Act
        cmd_tx.send(SessionCommand::SetRumble(true)).await.unwrap();
        cmd_tx.send(SessionCommand::SetLeds(LedSet([true, false, false, false]))).await.unwrap();
        cmd_tx.send(SessionCommand::Disconnect).await.unwrap();
        run_session(link, cmd_rx, ctx).await;

        // Assert
        assert_eq!(
            *sink.frames.lock().unwrap(),
            vec![vec![0xA2, 0x11, 0xF0], vec![0xA2, 0x10, 0x01], vec![0xA2, 0x11, 0x11]]
        );
    }

    #[tokio::test]
    async fn test_unmapped_remote_never_reaches_injector() {
        let mut injector = MockKeyInjector::new();
        injector.expect_key_down().never();
        injector.expect_key_up().never();
        let (ctx, _events) = context(injector);
        let sink = Arc::new(CollectingSink::default());
        let (inbound_tx, inbound_rx) = mpsc::channel(8);
        let (_cmd_tx, cmd_rx) = mpsc::channel(4);
        for frame in [
            vec![0xA1, 0x20, 0, 0, 0x02, 0, 0, 0x80],
            vec![0xA1, 0x22, 0, 0, 0x16, 0x00],
            vec![0xA1, 0x22, 0, 0, 0x16, 0x00],
            vec![0xA1, 0x32, 0, 0, 0, 0, 0, 0x00, 0xFF, 0xEF],
        ] {
            inbound_tx.send(frame).await.unwrap();
        }
        drop(inbound_tx);
        let link = RemoteLink::new(identity(), inbound_rx, sink.clone());

        run_session(link, cmd_rx, ctx).await;

        // greeting + step 1 + step 2 + mode 0x32
        assert_eq!(sink.frames.lock().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_unencodable_report_is_rejected_before_sending() {
        // Arrange
        let sink = CollectingSink::default();
        let report = OutputReport::WriteRegister {
            address: 0xA400F0,
            data: vec![0; 17],
        };

        // Act
        let result = send_report(&sink, &report).await;

        // Assert
        assert!(matches!(
            result,
            Err(ChannelError::Encode(ReportError::PayloadTooLong { len: 17, max: 16 }))
        ));
        assert!(sink.frames.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unencodable_report_is_skipped_by_send_all() {
        // Arrange
        let sink = CollectingSink::default();
        let reports = [
            OutputReport::WriteRegister {
                address: 0xA400F0,
                data: vec![0; 17],
            },
            OutputReport::SetRumble(true),
        ];

        // Act
        let result = send_all(&sink, &reports).await;

        // Assert
        assert!(result.is_ok());
        assert_eq!(*sink.frames.lock().unwrap(), vec![vec![0xA2, 0x10, 0x01]]);
    }
}
