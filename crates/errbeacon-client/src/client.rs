//! Telemetry client
//!
//! One-time initialization, capture entry points and the host error trap.
//! Every path is best-effort: a disabled or misconfigured forwarder turns
//! all captures into no-ops, and delivery failures are logged at debug
//! level and otherwise swallowed.

use std::sync::{Arc, Mutex, MutexGuard, Weak};

use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use errbeacon_core::config::{sanitize, DeliveryConfig};
use errbeacon_core::event::HostEvent;
use errbeacon_core::ports::{
    DeliveryResponse, ErrorTrap, HostRuntime, SettingsProvider, Transport,
};
use errbeacon_core::report::ReportPayload;
use errbeacon_core::scope::{Breadcrumb, ScopeContext, UserIdentity};
use errbeacon_core::severity::{classify, Severity};

use crate::dsn::Dsn;
use crate::transport::HttpTransport;

/// Live delivery session, present only after a successful init.
struct Session {
    config: DeliveryConfig,
    transport: Arc<dyn Transport>,
    scope: ScopeContext,
    previous_trap: Option<ErrorTrap>,
}

#[derive(Default)]
struct ClientState {
    /// Whether init has run, successfully or not. Later calls are no-ops.
    attempted: bool,
    session: Option<Session>,
}

/// Builds a shared [`TelemetryClient`].
pub struct TelemetryClientBuilder {
    settings: Arc<dyn SettingsProvider>,
    host: Arc<dyn HostRuntime>,
    transport_override: Option<Arc<dyn Transport>>,
}

impl TelemetryClientBuilder {
    /// Replaces the HTTP transport built from the DSN. Used by tests to
    /// observe deliveries.
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport_override = Some(transport);
        self
    }

    pub fn build(self) -> Arc<TelemetryClient> {
        Arc::new_cyclic(|weak| TelemetryClient {
            self_weak: weak.clone(),
            settings: self.settings,
            host: self.host,
            transport_override: self.transport_override,
            state: Mutex::new(ClientState::default()),
        })
    }
}

/// The forwarder client. Shared behind an [`Arc`]; all state sits behind
/// one mutex which is never held across an await point.
pub struct TelemetryClient {
    /// Back-reference for the error trap, set at construction.
    self_weak: Weak<TelemetryClient>,
    settings: Arc<dyn SettingsProvider>,
    host: Arc<dyn HostRuntime>,
    transport_override: Option<Arc<dyn Transport>>,
    state: Mutex<ClientState>,
}

impl TelemetryClient {
    pub fn builder(
        settings: Arc<dyn SettingsProvider>,
        host: Arc<dyn HostRuntime>,
    ) -> TelemetryClientBuilder {
        TelemetryClientBuilder {
            settings,
            host,
            transport_override: None,
        }
    }

    fn lock_state(&self) -> Option<MutexGuard<'_, ClientState>> {
        self.state.lock().ok()
    }

    /// Initializes the forwarder once per process.
    ///
    /// The first call reads and sanitizes the settings; when delivery is
    /// disabled, the DSN is invalid or the transport cannot be built, the
    /// forwarder stays silently inert. Every call made while a session is
    /// active records the triggering host event as a breadcrumb, so
    /// repeated init calls extend the trail instead of resetting state.
    pub fn init(&self, event: Option<&HostEvent>) {
        let Some(mut state) = self.lock_state() else {
            return;
        };

        if state.attempted {
            if let (Some(session), Some(event)) = (state.session.as_mut(), event) {
                if session.config.auto_hook {
                    session.scope.add_breadcrumb(event_breadcrumb(event));
                }
            }
            return;
        }
        state.attempted = true;

        let raw = self.settings.raw_config();
        let Some(config) = sanitize(&raw) else {
            debug!("telemetry delivery disabled or unconfigured");
            return;
        };

        let transport: Arc<dyn Transport> = match &self.transport_override {
            Some(transport) => transport.clone(),
            None => match Dsn::parse(&config.dsn) {
                Ok(dsn) => match HttpTransport::new(&dsn) {
                    Ok(transport) => Arc::new(transport),
                    Err(err) => {
                        warn!(error = %err, "could not build delivery transport");
                        return;
                    }
                },
                Err(err) => {
                    warn!(error = %err, "invalid DSN, telemetry stays disabled");
                    return;
                }
            },
        };

        let mut scope = ScopeContext::for_config(&config);
        let mut previous_trap = None;
        if config.auto_hook {
            if let Some(event) = event {
                scope.add_breadcrumb(event_breadcrumb(event));
            }
            previous_trap = self.host.install_error_trap(self.error_trap());
        }

        state.session = Some(Session {
            config,
            transport,
            scope,
            previous_trap,
        });
    }

    pub fn is_initialized(&self) -> bool {
        self.lock_state()
            .map(|s| s.session.is_some())
            .unwrap_or(false)
    }

    /// Records the acting user on the live scope. Dropped when no session
    /// is active or PII delivery is disabled.
    pub fn set_identity(&self, user: UserIdentity) {
        if let Some(mut state) = self.lock_state() {
            if let Some(session) = state.session.as_mut() {
                session.scope.set_identity(user);
            }
        }
    }

    /// Appends a breadcrumb to the live scope.
    pub fn add_breadcrumb(&self, crumb: Breadcrumb) {
        if let Some(mut state) = self.lock_state() {
            if let Some(session) = state.session.as_mut() {
                session.scope.add_breadcrumb(crumb);
            }
        }
    }

    /// Forwards a typed error. Skipped when the error's type label is on
    /// the ignore list.
    pub async fn capture_exception(&self, error_type: &str, error: &(dyn std::error::Error)) {
        let prepared = {
            let Some(state) = self.lock_state() else {
                return;
            };
            let Some(session) = state.session.as_ref() else {
                return;
            };
            if session
                .config
                .ignore_exceptions
                .iter()
                .any(|ignored| ignored == error_type)
            {
                debug!(error_type, "skipping ignored exception type");
                return;
            }

            let mut extra = Map::new();
            let mut causes = Vec::new();
            let mut source = error.source();
            while let Some(cause) = source {
                causes.push(Value::String(cause.to_string()));
                source = cause.source();
            }
            if !causes.is_empty() {
                extra.insert("causes".into(), Value::Array(causes));
            }

            let payload =
                ReportPayload::exception(error_type, error.to_string(), session.scope.snapshot())
                    .with_extra(extra);
            prepare(session, &payload)
        };
        deliver(prepared).await;
    }

    /// Forwards a log message at the given level, with optional named
    /// context blocks. Silently dropped when message logging is disabled.
    pub async fn capture_message(
        &self,
        level: Severity,
        message: &str,
        context: Map<String, Value>,
    ) {
        let prepared = {
            let Some(state) = self.lock_state() else {
                return;
            };
            let Some(session) = state.session.as_ref() else {
                return;
            };
            if !session.config.log_messages_enabled {
                debug!("message logging disabled, dropping capture");
                return;
            }

            let mut snapshot = session.scope.snapshot();
            for (name, value) in context {
                let mut block = Map::new();
                block.insert("value".into(), value);
                snapshot.contexts.insert(name, block);
            }

            let payload = ReportPayload::message(level, message, snapshot);
            prepare(session, &payload)
        };
        deliver(prepared).await;
    }

    /// Reads the host runtime's final recorded error and forwards it at
    /// its classified severity. Ensures initialization first, so this can
    /// run from a shutdown path before anything else touched the client.
    pub async fn capture_last_host_error(&self, event: Option<&HostEvent>) {
        self.init(event);
        let Some(last) = self.host.last_error() else {
            return;
        };

        let prepared = {
            let Some(state) = self.lock_state() else {
                return;
            };
            let Some(session) = state.session.as_ref() else {
                return;
            };

            let mut snapshot = session.scope.snapshot();
            let mut block = Map::new();
            block.insert("code".into(), json!(last.code));
            block.insert("file".into(), json!(last.file));
            block.insert("line".into(), json!(last.line));
            snapshot.contexts.insert("host_error".into(), block);

            let payload = ReportPayload::last_error(classify(last.code), &last.message, snapshot);
            prepare(session, &payload)
        };
        deliver(prepared).await;
    }

    /// Forwards a raised host error and chains to the previously installed
    /// trap. Always answers `false`, leaving the host's own error handling
    /// untouched regardless of delivery outcome.
    pub async fn handle_host_error(&self, code: u32, message: &str, file: &str, line: u32) -> bool {
        if self.host.error_reporting_mask() & code == 0 {
            return false;
        }
        self.init(None);

        let (prepared, previous) = {
            let Some(state) = self.lock_state() else {
                return false;
            };
            let Some(session) = state.session.as_ref() else {
                return false;
            };
            let previous = session.previous_trap.clone();

            let selected = session
                .config
                .error_type_mask
                .map(|mask| mask as u32 & code != 0)
                .unwrap_or(true);
            if !selected {
                (None, previous)
            } else {
                let mut snapshot = session.scope.snapshot();
                let mut block = Map::new();
                block.insert("code".into(), json!(code));
                block.insert("file".into(), json!(file));
                block.insert("line".into(), json!(line));
                snapshot.contexts.insert("host_error".into(), block);

                let payload = ReportPayload::message(classify(code), message, snapshot);
                (prepare(session, &payload), previous)
            }
        };
        deliver(prepared).await;

        if let Some(previous) = previous {
            previous(code, message, file, line);
        }
        false
    }

    /// Synchronous trap handed to the host runtime. Delivery is spawned on
    /// the ambient runtime so the host is never blocked on network I/O.
    pub fn error_trap(&self) -> ErrorTrap {
        let client = self.self_weak.clone();
        Arc::new(move |code, message, file, line| {
            let Some(client) = client.upgrade() else {
                return false;
            };
            let message = message.to_string();
            let file = file.to_string();
            if let Ok(handle) = tokio::runtime::Handle::try_current() {
                handle.spawn(async move {
                    client.handle_host_error(code, &message, &file, line).await;
                });
            }
            false
        })
    }

    /// Sends a synthetic exception and reports the raw outcome. Unlike the
    /// capture paths this propagates failures, since it exists to verify
    /// connectivity.
    pub async fn send_test_report(&self) -> anyhow::Result<DeliveryResponse> {
        self.init(None);
        let (event, transport) = {
            let Some(state) = self.lock_state() else {
                anyhow::bail!("client state unavailable");
            };
            let Some(session) = state.session.as_ref() else {
                anyhow::bail!("telemetry is disabled or misconfigured");
            };
            let payload = ReportPayload::exception(
                "errbeacon_test",
                "test report from errbeacon",
                session.scope.snapshot(),
            );
            (payload.to_event(&session.config), session.transport.clone())
        };
        transport.send(&event).await
    }

    /// Sanitized configuration of the live session, if any.
    pub fn active_config(&self) -> Option<DeliveryConfig> {
        self.lock_state()?.session.as_ref().map(|s| s.config.clone())
    }
}

fn event_breadcrumb(event: &HostEvent) -> Breadcrumb {
    let message = event.name.clone().unwrap_or_else(|| "host event".into());
    Breadcrumb::new(Severity::Info, "host.event", message).with_data(event.breadcrumb_data())
}

struct PreparedDelivery {
    event: Value,
    transport: Arc<dyn Transport>,
    sample_rate: Option<f64>,
}

/// Renders the payload and captures everything delivery needs, so the
/// state lock can be released before any await.
fn prepare(session: &Session, payload: &ReportPayload) -> Option<PreparedDelivery> {
    Some(PreparedDelivery {
        event: payload.to_event(&session.config),
        transport: session.transport.clone(),
        sample_rate: session.config.sample_rate,
    })
}

/// Applies the sampling decision and performs one best-effort send.
async fn deliver(prepared: Option<PreparedDelivery>) {
    let Some(prepared) = prepared else {
        return;
    };
    if let Some(rate) = prepared.sample_rate {
        if rand::random::<f64>() >= rate {
            debug!(rate, "event dropped by sampling");
            return;
        }
    }
    match prepared.transport.send(&prepared.event).await {
        Ok(response) if response.is_success() => {
            debug!(status = response.status, "event delivered");
        }
        Ok(response) => {
            debug!(status = response.status, "remote service rejected event");
        }
        Err(err) => {
            debug!(error = %err, "event delivery failed");
        }
    }
}
