// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Supervised gateway connection.

use std::fmt;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use uuid::Uuid;

use crate::command::{ControlCommand, WireCommand};
use crate::error::{Error, ModuleError};
use crate::module::Module;
use crate::protocol::{ClockSlot, CommandQueue, Receiver, ReceiverExit, Sender, Transport};
use crate::registry::ModuleRegistry;
use crate::types::{ModuleAddress, ModuleType, SystemClock};

use super::{
    ConnectionConfig, ConnectionState, DiscoveryListener, StateCell, StateListener, StateSnapshot,
};

/// Identifier of one session attempt, used to correlate traces.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Creates a new random identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let short = &self.0.to_string()[..8];
        write!(f, "SessionId({short}...)")
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// State shared between the host handle and the supervisor task.
struct Shared {
    config: RwLock<ConnectionConfig>,
    state: Arc<StateCell>,
    queue: CommandQueue,
    registry: Arc<ModuleRegistry>,
    clock: ClockSlot,
}

struct Supervisor {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Connection to a Domintell gateway.
///
/// [`start`](Self::start) spawns a supervisor task that opens a session,
/// keeps it alive with `HELLO` probes and reconnects after the session
/// ends. Only a refused login stops it for good.
///
/// Commands are queued at any time and forwarded while the session is
/// online. Modules are created on first sight and kept until
/// [`stop`](Self::stop).
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
///
/// use domintell_lib::command::Command;
/// use domintell_lib::session::{Connection, ConnectionConfig, ConnectionState};
/// use domintell_lib::types::{Channel, ModuleAddress, ModuleType};
///
/// # async fn example() -> domintell_lib::Result<()> {
/// let connection = Connection::new(
///     ConnectionConfig::new("192.168.1.20"),
///     Arc::new(|state: ConnectionState, message: Option<&str>| {
///         println!("{state} {}", message.unwrap_or_default());
///     }),
///     Arc::new(domintell_lib::session::NoopListener),
/// );
/// connection.start()?;
///
/// let relay = connection.resolve_module(ModuleType::Bir, ModuleAddress::from_hex("1A2B3")?)?;
/// relay.execute(Command::On, Some(Channel::new(1)?))?;
///
/// connection.stop().await;
/// # Ok(())
/// # }
/// ```
pub struct Connection {
    shared: Arc<Shared>,
    supervisor: Mutex<Option<Supervisor>>,
}

impl Connection {
    /// Creates a stopped connection.
    #[must_use]
    pub fn new(
        config: ConnectionConfig,
        state_listener: Arc<dyn StateListener>,
        discovery_listener: Arc<dyn DiscoveryListener>,
    ) -> Self {
        let queue = CommandQueue::with_capacity(config.queue_capacity);
        let registry = Arc::new(ModuleRegistry::new(queue.clone(), discovery_listener));
        Self {
            shared: Arc::new(Shared {
                config: RwLock::new(config),
                state: Arc::new(StateCell::new(state_listener)),
                queue,
                registry,
                clock: ClockSlot::default(),
            }),
            supervisor: Mutex::new(None),
        }
    }

    /// Starts the supervisor.
    ///
    /// Does nothing if it is already running. Must be called within a Tokio
    /// runtime.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidConfiguration` if the host or port is
    /// missing; the state is then `ERROR`.
    pub fn start(&self) -> Result<(), Error> {
        let config = self.shared.config.read().clone();
        if !config.is_valid() {
            self.shared
                .state
                .publish(ConnectionState::Error, Some("Invalid parameters.".to_string()));
            return Err(Error::InvalidConfiguration(format!(
                "host '{}' port {}",
                config.host, config.port
            )));
        }

        let mut supervisor = self.supervisor.lock();
        if supervisor.as_ref().is_some_and(|s| !s.handle.is_finished()) {
            tracing::debug!("Connection already running");
            return Ok(());
        }

        tracing::info!(host = %config.host, port = config.port, "Starting connection");
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(supervise(Arc::clone(&self.shared), cancel.clone()));
        *supervisor = Some(Supervisor { cancel, handle });
        Ok(())
    }

    /// Stops the supervisor and waits for the session to be torn down.
    ///
    /// Queued commands, known modules and the last clock are discarded, so
    /// a later [`start`](Self::start) begins from scratch.
    pub async fn stop(&self) {
        let supervisor = self.supervisor.lock().take();
        if let Some(supervisor) = supervisor {
            tracing::info!("Stopping connection");
            supervisor.cancel.cancel();
            if let Err(e) = supervisor.handle.await {
                tracing::warn!(error = %e, "Supervisor task failed");
            }
        }

        self.shared.queue.clear();
        self.shared.registry.clear();
        *self.shared.clock.write() = None;
    }

    /// Returns true while the supervisor task runs.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.supervisor
            .lock()
            .as_ref()
            .is_some_and(|s| !s.handle.is_finished())
    }

    /// Queues a raw frame for the gateway.
    pub fn enqueue_command(&self, command: impl WireCommand) {
        self.shared.queue.push(command);
    }

    /// Asks every module to describe itself.
    ///
    /// Answers arrive as info records and as discovery of modules not seen
    /// yet.
    pub fn trigger_discovery(&self) {
        self.shared.queue.push(ControlCommand::AppInfo);
    }

    /// Returns true if the session is online.
    #[must_use]
    pub fn is_online(&self) -> bool {
        self.shared.state.is_online()
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.shared.state.state()
    }

    /// Returns the current state with its message.
    #[must_use]
    pub fn state_snapshot(&self) -> StateSnapshot {
        self.shared.state.current()
    }

    /// Subscribes to state changes.
    #[must_use]
    pub fn subscribe_state(&self) -> watch::Receiver<StateSnapshot> {
        self.shared.state.subscribe()
    }

    /// Returns the last clock broadcast by the master.
    #[must_use]
    pub fn last_known_remote_clock(&self) -> Option<SystemClock> {
        *self.shared.clock.read()
    }

    /// Returns the module for a key, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns `ModuleError::VariantMismatch` if another variant is cached
    /// at this key.
    pub fn resolve_module(
        &self,
        module_type: ModuleType,
        address: ModuleAddress,
    ) -> Result<Arc<Module>, ModuleError> {
        self.shared.registry.resolve(module_type, address)
    }

    /// Returns the module registry.
    #[must_use]
    pub fn registry(&self) -> &Arc<ModuleRegistry> {
        &self.shared.registry
    }

    /// Returns the outbound command queue.
    #[must_use]
    pub fn queue(&self) -> &CommandQueue {
        &self.shared.queue
    }

    /// Replaces the configuration.
    ///
    /// A running session keeps its socket; the next reconnect, probe and
    /// session use the new values. The queue capacity is fixed at
    /// construction.
    pub fn set_config(&self, config: ConnectionConfig) {
        *self.shared.config.write() = config;
    }

    /// Returns a copy of the configuration.
    #[must_use]
    pub fn config(&self) -> ConnectionConfig {
        self.shared.config.read().clone()
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        if let Some(supervisor) = self.supervisor.get_mut().take() {
            // The task tears the session down on its own
            supervisor.cancel.cancel();
        }
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("config", &*self.shared.config.read())
            .field("state", &self.shared.state.current())
            .field("modules", &self.shared.registry.len())
            .field("running", &self.is_running())
            .finish()
    }
}

/// How a session attempt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionEnd {
    Retry,
    Fatal,
    Cancelled,
}

async fn supervise(shared: Arc<Shared>, cancel: CancellationToken) {
    tracing::debug!("Supervisor started");
    while !cancel.is_cancelled() {
        let session = SessionId::new();
        let span = tracing::info_span!("session", %session);
        let end = run_session(&shared, &cancel).instrument(span).await;

        match end {
            SessionEnd::Fatal => {
                let config = shared.config.read().clone();
                tracing::warn!(
                    host = %config.host,
                    port = config.port,
                    "Unable to connect to Domintell system, please check the configuration"
                );
                break;
            }
            SessionEnd::Cancelled => break,
            SessionEnd::Retry => {
                let delay = shared.config.read().reconnect_delay;
                tracing::debug!(?delay, "Waiting to reconnect");
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => break,
                    () = tokio::time::sleep(delay) => {}
                }
            }
        }
    }
    tracing::debug!("Supervisor stopped");
}

/// Runs one session attempt, from opening the socket to teardown.
async fn run_session(shared: &Shared, cancel: &CancellationToken) -> SessionEnd {
    let config = shared.config.read().clone();

    let transport = tokio::select! {
        biased;
        () = cancel.cancelled() => return SessionEnd::Cancelled,
        opened = Transport::open(&config.host, config.port, config.read_timeout) => opened,
    };
    let transport = match transport {
        Ok(transport) => Arc::new(transport),
        Err(e) => {
            tracing::debug!(error = %e, "Unable to open the gateway socket");
            shared.state.publish(ConnectionState::Error, Some(e.to_string()));
            return SessionEnd::Retry;
        }
    };
    shared.state.publish(ConnectionState::Initializing, None);

    let mut session = ActiveSession::spawn(shared, transport, &config);
    // Published before LOGIN so the gateway's answer cannot be overwritten
    shared.state.publish(ConnectionState::StartingSession, None);
    session.sender.login().await;

    let exit = session.wait(shared, cancel).await;
    let end = match exit {
        ReceiverExit::Fatal => SessionEnd::Fatal,
        ReceiverExit::Cancelled => SessionEnd::Cancelled,
        ReceiverExit::Error | ReceiverExit::SessionClosed => {
            if shared.state.state() == ConnectionState::Error {
                tracing::debug!("Connection error, cleaning up before reconnecting");
            } else {
                tracing::info!("Receiver stopped, cleaning up before reconnecting");
            }
            SessionEnd::Retry
        }
    };

    session.teardown(shared, end == SessionEnd::Fatal).await;
    end
}

/// Tasks and socket of a running session.
struct ActiveSession {
    sender: Sender,
    sender_task: JoinHandle<()>,
    receiver_task: Option<JoinHandle<ReceiverExit>>,
    session_cancel: CancellationToken,
    transport: Arc<Transport>,
}

impl ActiveSession {
    fn spawn(shared: &Shared, transport: Arc<Transport>, config: &ConnectionConfig) -> Self {
        // Not a child of the supervisor token: only teardown stops the
        // tasks, so LOGOUT still goes out when the connection is stopped
        let session_cancel = CancellationToken::new();
        let sender = Sender::new(
            Arc::clone(&transport),
            Arc::clone(&shared.state),
            shared.queue.clone(),
            config.message_delay,
        );
        let receiver = Receiver::new(
            Arc::clone(&transport),
            Arc::clone(&shared.state),
            Arc::clone(&shared.registry),
            Arc::clone(&shared.clock),
        );

        let receiver_task = tokio::spawn(receiver.run(session_cancel.clone()).in_current_span());
        let sender_task = tokio::spawn(sender.clone().run(session_cancel.clone()).in_current_span());

        Self {
            sender,
            sender_task,
            receiver_task: Some(receiver_task),
            session_cancel,
            transport,
        }
    }

    /// Waits for the receiver to stop, probing the gateway meanwhile.
    async fn wait(&mut self, shared: &Shared, cancel: &CancellationToken) -> ReceiverExit {
        let Some(receiver_task) = self.receiver_task.as_mut() else {
            return ReceiverExit::Cancelled;
        };

        let exit = loop {
            let ping_interval = shared.config.read().ping_interval;
            tokio::select! {
                biased;
                () = cancel.cancelled() => return ReceiverExit::Cancelled,
                joined = &mut *receiver_task => {
                    break joined.unwrap_or_else(|e| {
                        tracing::warn!(error = %e, "Receiver task failed");
                        ReceiverExit::Error
                    });
                }
                () = tokio::time::sleep(ping_interval) => self.sender.hello().await,
            }
        };
        self.receiver_task = None;
        exit
    }

    /// Logs out, stops both tasks and closes the socket, in that order.
    ///
    /// A fatal session keeps `FATAL` as its last published state.
    async fn teardown(self, shared: &Shared, fatal: bool) {
        if !fatal {
            shared.state.publish(ConnectionState::Stopping, None);
        }

        if !self.sender_task.is_finished() {
            self.sender.logout().await;
        }
        self.session_cancel.cancel();

        if let Err(e) = self.sender_task.await {
            tracing::warn!(error = %e, "Sender task failed");
        }
        if let Some(receiver_task) = self.receiver_task
            && let Err(e) = receiver_task.await
        {
            tracing::warn!(error = %e, "Receiver task failed");
        }

        drop(self.sender);
        let peer = self.transport.peer_addr();
        drop(self.transport);
        tracing::debug!(%peer, "Socket closed");

        if !fatal {
            shared.state.publish(ConnectionState::Offline, None);
        }
    }
}
