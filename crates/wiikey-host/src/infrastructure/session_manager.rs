//! SessionManager: registry of connected remotes and their session tasks.
//!
//! Each accepted [`RemoteLink`] gets its own Tokio task running
//! [`run_session`].  The manager keeps one command sender per identity, so at
//! most one live session exists per remote, and routes LED, rumble and
//! disconnect commands to it.  Lifecycle and status events from every task
//! are funnelled into the single receiver returned by [`SessionManager::new`].

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::info;
use wiikey_core::{LedSet, RemoteIdentity, SharedMappingTable};

use crate::application::inject_keys::InjectKeysUseCase;
use crate::application::run_session::{
    run_session, CloseReason, RemoteLink, SessionCommand, SessionContext, SessionEvent,
};

/// Substring (case-insensitive) a device name must contain to be accepted.
const SUPPORTED_NAME_FRAGMENT: &str = "nintendo";

const EVENT_QUEUE_DEPTH: usize = 64;
const COMMAND_QUEUE_DEPTH: usize = 16;

/// Error type for session registry operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ManagerError {
    #[error("remote {0} already has a live session")]
    DuplicateIdentity(RemoteIdentity),
    #[error("no live session for remote {0}")]
    UnknownRemote(RemoteIdentity),
    #[error("session for remote {0} has already closed")]
    Closed(RemoteIdentity),
}

/// Session settings shared by every remote.
#[derive(Debug, Clone)]
pub struct ManagerConfig {
    pub initial_leds: LedSet,
    pub dispatch_enabled: bool,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            initial_leds: LedSet::ALL,
            dispatch_enabled: false,
        }
    }
}

struct SessionHandle {
    generation: u64,
    commands: mpsc::Sender<SessionCommand>,
    task: JoinHandle<CloseReason>,
}

#[derive(Default)]
struct Registry {
    next_generation: u64,
    sessions: HashMap<RemoteIdentity, SessionHandle>,
}

/// The session manager.
pub struct SessionManager {
    registry: Arc<Mutex<Registry>>,
    context: SessionContext,
}

impl SessionManager {
    /// Creates a new manager and returns it together with the event receiver.
    pub fn new(
        config: ManagerConfig,
        mappings: Arc<SharedMappingTable>,
        injector: Arc<InjectKeysUseCase>,
    ) -> (Self, mpsc::Receiver<SessionEvent>) {
        let (events, rx) = mpsc::channel(EVENT_QUEUE_DEPTH);
        let context = SessionContext {
            mappings,
            dispatch_enabled: Arc::new(AtomicBool::new(config.dispatch_enabled)),
            injector,
            events,
            initial_leds: config.initial_leds,
        };
        let mgr = Self {
            registry: Arc::new(Mutex::new(Registry::default())),
            context,
        };
        (mgr, rx)
    }

    /// `true` if a device with this advertised name should be driven.
    pub fn is_supported_device_name(name: &str) -> bool {
        name.to_ascii_lowercase().contains(SUPPORTED_NAME_FRAGMENT)
    }

    pub fn dispatch_enabled(&self) -> bool {
        self.context.dispatch_enabled.load(Ordering::Relaxed)
    }

    /// Flips the key-dispatch toggle for every session.  Takes effect on the
    /// next inbound frame of each remote.
    pub fn set_dispatch_enabled(&self, enabled: bool) {
        self.context.dispatch_enabled.store(enabled, Ordering::Relaxed);
        info!(enabled, "key dispatch toggled");
    }

    /// Starts a session for `link`.
    ///
    /// # Errors
    ///
    /// Returns [`ManagerError::DuplicateIdentity`] if the remote already has a
    /// live session.  The new link is dropped in that case.
    pub fn connect(&self, link: RemoteLink) -> Result<(), ManagerError> {
        let identity = link.identity;
        let mut registry = self.lock();
        if let Some(existing) = registry.sessions.get(&identity) {
            if !existing.commands.is_closed() {
                return Err(ManagerError::DuplicateIdentity(identity));
            }
        }

        let generation = registry.next_generation;
        registry.next_generation += 1;

        let (commands, command_rx) = mpsc::channel(COMMAND_QUEUE_DEPTH);
        let ctx = self.context.clone();
        let registry_ref = Arc::clone(&self.registry);
        let task = tokio::spawn(async move {
            let reason = run_session(link, command_rx, ctx).await;
            let mut registry = registry_ref.lock().unwrap_or_else(|e| e.into_inner());
            if registry
                .sessions
                .get(&identity)
                .is_some_and(|h| h.generation == generation)
            {
                registry.sessions.remove(&identity);
            }
            reason
        });

        registry.sessions.insert(
            identity,
            SessionHandle {
                generation,
                commands,
                task,
            },
        );
        Ok(())
    }

    /// Starts a session only if `device_name` passes the name filter.
    ///
    /// Returns `Ok(false)` (and drops the link) for unsupported devices.
    ///
    /// # Errors
    ///
    /// See [`connect`](Self::connect).
    pub fn accept_device(&self, device_name: &str, link: RemoteLink) -> Result<bool, ManagerError> {
        if !Self::is_supported_device_name(device_name) {
            info!(device_name, "ignoring unsupported device");
            return Ok(false);
        }
        self.connect(link).map(|()| true)
    }

    /// Identities with a live session, in address order.
    pub fn connected(&self) -> Vec<RemoteIdentity> {
        let registry = self.lock();
        let mut ids: Vec<RemoteIdentity> = registry
            .sessions
            .iter()
            .filter(|(_, h)| !h.commands.is_closed())
            .map(|(id, _)| *id)
            .collect();
        ids.sort();
        ids
    }

    /// Sets a remote's player LEDs.
    ///
    /// # Errors
    ///
    /// Returns [`ManagerError::UnknownRemote`] or [`ManagerError::Closed`].
    pub async fn set_leds(
        &self,
        identity: RemoteIdentity,
        leds: LedSet,
    ) -> Result<(), ManagerError> {
        self.send_command(identity, SessionCommand::SetLeds(leds)).await
    }

    /// Turns a remote's rumble motor on or off.
    ///
    /// # Errors
    ///
    /// Returns [`ManagerError::UnknownRemote`] or [`ManagerError::Closed`].
    pub async fn set_rumble(&self, identity: RemoteIdentity, on: bool) -> Result<(), ManagerError> {
        self.send_command(identity, SessionCommand::SetRumble(on)).await
    }

    /// Tears a remote's session down as if its channel had closed.
    ///
    /// # Errors
    ///
    /// Returns [`ManagerError::UnknownRemote`] or [`ManagerError::Closed`].
    pub async fn disconnect(&self, identity: RemoteIdentity) -> Result<(), ManagerError> {
        self.send_command(identity, SessionCommand::Disconnect).await
    }

    /// Disconnects every remote and waits for all session tasks to finish.
    ///
    /// Each session awaits queue space for its `Closed` event, so the event
    /// receiver must keep being drained until this returns.
    pub async fn shutdown(&self) {
        let handles: Vec<SessionHandle> = {
            let mut registry = self.lock();
            registry.sessions.drain().map(|(_, h)| h).collect()
        };
        for handle in handles {
            let _ = handle.commands.send(SessionCommand::Disconnect).await;
            let _ = handle.task.await;
        }
    }

    async fn send_command(
        &self,
        identity: RemoteIdentity,
        command: SessionCommand,
    ) -> Result<(), ManagerError> {
        let sender = self
            .lock()
            .sessions
            .get(&identity)
            .map(|h| h.commands.clone())
            .ok_or(ManagerError::UnknownRemote(identity))?;
        sender
            .send(command)
            .await
            .map_err(|_| ManagerError::Closed(identity))
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(|e| e.into_inner())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
