//! Per-call lifecycle: owns both legs of a relay pair and tears them down together.

use crate::{
    error::RelayError,
    session::CallSession,
    translator::{Action, CallFlow, RelayStats, Translator},
    upstream::{Leg, LegEvent, UpstreamConnector},
};
use serde::Serialize;
use std::{fmt, future, sync::Arc};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Where a call is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayState {
    /// Telephony socket accepted; no backend yet.
    Init,
    /// Fetching a signed URL and opening the backend socket.
    ConnectingUpstream,
    /// Both legs are open and relaying.
    Active,
    /// A terminal event arrived; both legs are being closed.
    Closing,
    Closed,
}

impl RelayState {
    /// Whether `next` is a legal successor of this state.
    pub fn can_transition_to(self, next: RelayState) -> bool {
        use RelayState::*;
        matches!(
            (self, next),
            (Init, ConnectingUpstream)
                | (ConnectingUpstream, Active)
                | (Init | ConnectingUpstream | Active, Closing)
                | (Closing, Closed)
        )
    }
}

/// Why a call ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseReason {
    /// The telephony platform sent `stop`.
    TelephonyStop,
    /// The telephony socket closed.
    TelephonyClosed,
    /// The telephony socket failed.
    TelephonyError(String),
    /// The backend socket closed.
    BackendClosed,
    /// The backend socket failed.
    BackendError(String),
    /// The backend leg could not be set up.
    SetupFailed(String),
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CloseReason::TelephonyStop => write!(f, "telephony stream stopped"),
            CloseReason::TelephonyClosed => write!(f, "telephony socket closed"),
            CloseReason::TelephonyError(e) => write!(f, "telephony socket error: {}", e),
            CloseReason::BackendClosed => write!(f, "backend socket closed"),
            CloseReason::BackendError(e) => write!(f, "backend socket error: {}", e),
            CloseReason::SetupFailed(e) => write!(f, "backend setup failed: {}", e),
        }
    }
}

/// What is left of a call once both legs are closed.
#[derive(Debug, Clone)]
pub struct RelaySummary {
    pub reason: CloseReason,
    pub session: CallSession,
    pub stats: RelayStats,
}

type PendingConnect = JoinHandle<Result<Leg, RelayError>>;

/// Drives one call from accept to teardown.
struct Coordinator {
    state: RelayState,
    translator: Translator,
    connector: Arc<dyn UpstreamConnector>,
    telephony: Leg,
    backend: Option<Leg>,
    pending: Option<PendingConnect>,
}

/// Relays one telephony connection to the AI backend until either side ends the call.
///
/// Inbound calls connect upstream immediately; outbound calls wait for the
/// telephony `start` event. Whatever ends the call, both legs are closed.
pub async fn run_relay(
    translator: Translator,
    connector: Arc<dyn UpstreamConnector>,
    telephony: Leg,
) -> RelaySummary {
    let mut coordinator = Coordinator {
        state: RelayState::Init,
        translator,
        connector,
        telephony,
        backend: None,
        pending: None,
    };
    if coordinator.translator.flow() == CallFlow::Inbound {
        coordinator.connect_upstream();
    }
    let reason = coordinator.relay().await;
    coordinator.shutdown(reason)
}

impl Coordinator {
    async fn relay(&mut self) -> CloseReason {
        loop {
            tokio::select! {
                event = self.telephony.events.recv() => {
                    if let Some(reason) = self.on_telephony(event) {
                        return reason;
                    }
                }
                joined = wait_pending(&mut self.pending), if self.pending.is_some() => {
                    self.pending = None;
                    if let Some(reason) = self.on_upstream_ready(joined) {
                        return reason;
                    }
                }
                event = recv_backend(&mut self.backend), if self.backend.is_some() => {
                    if let Some(reason) = self.on_backend(event) {
                        return reason;
                    }
                }
            }
        }
    }

    fn on_telephony(&mut self, event: Option<LegEvent>) -> Option<CloseReason> {
        match event {
            Some(LegEvent::Text(text)) => {
                let backend_open = self.backend.is_some();
                match self.translator.on_telephony_frame(&text, backend_open) {
                    Ok(Some(action)) => self.apply(action),
                    Ok(None) => None,
                    Err(e) => {
                        warn!(error = %e, "Dropping telephony message.");
                        None
                    }
                }
            }
            Some(LegEvent::Error(e)) => {
                error!(error = %e, "Telephony socket error.");
                Some(CloseReason::TelephonyError(e))
            }
            Some(LegEvent::Closed) | None => Some(CloseReason::TelephonyClosed),
        }
    }

    fn on_backend(&mut self, event: Option<LegEvent>) -> Option<CloseReason> {
        match event {
            Some(LegEvent::Text(text)) => match self.translator.on_backend_frame(&text) {
                Ok(Some(action)) => self.apply(action),
                Ok(None) => None,
                Err(e) => {
                    warn!(error = %e, "Dropping backend message.");
                    None
                }
            },
            Some(LegEvent::Error(e)) => {
                error!(error = %e, "Backend socket error.");
                Some(CloseReason::BackendError(e))
            }
            Some(LegEvent::Closed) | None => {
                info!("Disconnected from the AI backend.");
                Some(CloseReason::BackendClosed)
            }
        }
    }

    fn on_upstream_ready(
        &mut self,
        joined: Result<Result<Leg, RelayError>, tokio::task::JoinError>,
    ) -> Option<CloseReason> {
        let leg = match joined {
            Ok(Ok(leg)) => leg,
            Ok(Err(e)) => {
                error!(error = %e, "Failed to connect to the AI backend.");
                return Some(CloseReason::SetupFailed(e.to_string()));
            }
            Err(e) => {
                error!(error = %e, "Upstream connect task did not complete.");
                return Some(CloseReason::SetupFailed(e.to_string()));
            }
        };
        self.transition(RelayState::Active);
        info!("Connected to the AI backend.");
        if let Some(initiation) = self.translator.initiation_message() {
            if let Err(e) = send_json(&leg, &initiation) {
                return Some(CloseReason::BackendError(e.to_string()));
            }
        }
        self.backend = Some(leg);
        None
    }

    fn apply(&mut self, action: Action) -> Option<CloseReason> {
        match action {
            Action::ToBackend(command) => {
                let leg = self.backend.as_ref()?;
                send_json(leg, &command)
                    .err()
                    .map(|e| CloseReason::BackendError(e.to_string()))
            }
            Action::ToTelephony(command) => send_json(&self.telephony, &command)
                .err()
                .map(|e| CloseReason::TelephonyError(e.to_string())),
            Action::ConnectUpstream => {
                self.connect_upstream();
                None
            }
            Action::CloseBackend => Some(CloseReason::TelephonyStop),
        }
    }

    /// Starts the backend connection unless one is already open or opening.
    fn connect_upstream(&mut self) {
        if self.backend.is_some() || self.pending.is_some() {
            debug!("Backend connection already requested; ignoring.");
            return;
        }
        self.transition(RelayState::ConnectingUpstream);
        let connector = self.connector.clone();
        self.pending = Some(tokio::spawn(async move { connector.connect().await }));
    }

    /// The single teardown path for every way a call can end.
    fn shutdown(mut self, reason: CloseReason) -> RelaySummary {
        self.transition(RelayState::Closing);
        info!(%reason, "Closing relay.");

        if let Some(pending) = self.pending.take() {
            pending.abort();
        }
        if let Some(backend) = self.backend.take() {
            backend.close();
        }
        self.telephony.close();

        self.transition(RelayState::Closed);
        let stats = self.translator.stats();
        info!(?stats, "Relay closed.");
        RelaySummary {
            reason,
            session: self.translator.session().clone(),
            stats,
        }
    }

    fn transition(&mut self, next: RelayState) {
        if self.state.can_transition_to(next) {
            debug!(from = ?self.state, to = ?next, "Relay state change.");
            self.state = next;
        } else {
            warn!(from = ?self.state, to = ?next, "Ignoring invalid relay state change.");
        }
    }
}

fn send_json<T: Serialize>(leg: &Leg, message: &T) -> Result<(), RelayError> {
    let text = serde_json::to_string(message)?;
    leg.send_text(text)
}

async fn wait_pending(
    pending: &mut Option<PendingConnect>,
) -> Result<Result<Leg, RelayError>, tokio::task::JoinError> {
    match pending {
        Some(handle) => handle.await,
        None => future::pending().await,
    }
}

async fn recv_backend(backend: &mut Option<Leg>) -> Option<LegEvent> {
    match backend {
        Some(leg) => leg.events.recv().await,
        None => future::pending().await,
    }
}
