/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

//! Channel-keyed diagnostics.
//!
//! Components call [`emit_event`] with a `&'static str` channel id. Events go
//! to the sender installed for the current thread, falling back to the
//! process-wide sender; with neither installed they are dropped. A
//! [`DiagnosticsState`] owns the receiving end and folds events into counts.

use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::OnceLock;

use crossbeam_channel::{Receiver, Sender, unbounded};
use serde_json::{Value, json};

pub const CHANNEL_STARTUP_CONFIG_SNAPSHOT: &str = "startup.config.snapshot";

pub const CHANNEL_SESSION_LOGIN_SUCCEEDED: &str = "session.login.succeeded";
pub const CHANNEL_SESSION_LOGIN_FAILED: &str = "session.login.failed";
pub const CHANNEL_SESSION_LOGOUT: &str = "session.logout";
pub const CHANNEL_SESSION_RESTORE_SUCCEEDED: &str = "session.restore.succeeded";
pub const CHANNEL_SESSION_RESTORE_REJECTED: &str = "session.restore.rejected";
pub const CHANNEL_SESSION_PERSIST_FAILED: &str = "session.persist.failed";

pub const CHANNEL_GUARD_REDIRECT_LOGIN: &str = "guard.redirect.login";
pub const CHANNEL_GUARD_ROLE_DENIED: &str = "guard.role.denied";

pub const CHANNEL_WIZARD_STEP_ADVANCED: &str = "wizard.step.advanced";
pub const CHANNEL_WIZARD_STEP_RETREATED: &str = "wizard.step.retreated";
pub const CHANNEL_WIZARD_STEP_BLOCKED: &str = "wizard.step.blocked";
pub const CHANNEL_WIZARD_INTENT_IGNORED: &str = "wizard.intent.ignored";
pub const CHANNEL_WIZARD_CREATE_SUCCEEDED: &str = "wizard.create.succeeded";
pub const CHANNEL_WIZARD_CREATE_FAILED: &str = "wizard.create.failed";

pub const CHANNEL_GEO_LOOKUP_ISSUED: &str = "geo.lookup.issued";
pub const CHANNEL_GEO_LOOKUP_FAILED: &str = "geo.lookup.failed";
pub const CHANNEL_GEO_RESPONSE_STALE: &str = "geo.response.stale";

pub const CHANNEL_UPLOAD_SUCCEEDED: &str = "upload.succeeded";
pub const CHANNEL_UPLOAD_FAILED: &str = "upload.failed";

pub const CHANNEL_API_GEO_RESPONSE: &str = "api.geo.response";
pub const CHANNEL_API_CREATE_RESPONSE: &str = "api.create.response";
pub const CHANNEL_API_UPLOAD_REQUEST: &str = "api.upload.request";
pub const CHANNEL_API_UPLOAD_RESPONSE: &str = "api.upload.response";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DiagnosticEvent {
    MessageSent {
        channel_id: &'static str,
        byte_len: usize,
    },
    MessageReceived {
        channel_id: &'static str,
        latency_us: u64,
    },
}

impl DiagnosticEvent {
    pub fn channel_id(&self) -> &'static str {
        match self {
            Self::MessageSent { channel_id, .. } | Self::MessageReceived { channel_id, .. } => {
                channel_id
            },
        }
    }
}

static GLOBAL_DIAGNOSTICS_TX: OnceLock<Sender<DiagnosticEvent>> = OnceLock::new();

thread_local! {
    static THREAD_DIAGNOSTICS_TX: RefCell<Option<Sender<DiagnosticEvent>>> =
        const { RefCell::new(None) };
}

/// Install the process-wide sink. Only the first call wins.
pub fn install_global_sender(sender: Sender<DiagnosticEvent>) {
    let _ = GLOBAL_DIAGNOSTICS_TX.set(sender);
}

/// Route events emitted on this thread to `sender`, overriding the global
/// sink. Tests use this to keep their counters isolated.
pub fn install_thread_sender(sender: Sender<DiagnosticEvent>) {
    THREAD_DIAGNOSTICS_TX.with(|slot| *slot.borrow_mut() = Some(sender));
}

pub fn clear_thread_sender() {
    THREAD_DIAGNOSTICS_TX.with(|slot| *slot.borrow_mut() = None);
}

pub fn emit_event(event: DiagnosticEvent) {
    let unsent = THREAD_DIAGNOSTICS_TX.with(|slot| match slot.borrow().as_ref() {
        Some(tx) => {
            let _ = tx.send(event);
            None
        },
        None => Some(event),
    });
    if let (Some(event), Some(tx)) = (unsent, GLOBAL_DIAGNOSTICS_TX.get()) {
        let _ = tx.send(event);
    }
}

/// Shorthand for the common "something happened on this channel" event.
pub fn emit_signal(channel_id: &'static str, byte_len: usize) {
    emit_event(DiagnosticEvent::MessageSent {
        channel_id,
        byte_len,
    });
}

#[derive(Clone, Debug, Default)]
pub struct DiagnosticGraph {
    pub message_counts: HashMap<&'static str, u64>,
    pub message_bytes_sent: HashMap<&'static str, u64>,
    pub message_latency_us: HashMap<&'static str, u64>,
}

pub struct DiagnosticsState {
    event_tx: Sender<DiagnosticEvent>,
    event_rx: Receiver<DiagnosticEvent>,
    diagnostic_graph: DiagnosticGraph,
    total_events: u64,
}

impl Default for DiagnosticsState {
    fn default() -> Self {
        Self::new()
    }
}

impl DiagnosticsState {
    pub fn new() -> Self {
        let (event_tx, event_rx) = unbounded();
        Self {
            event_tx,
            event_rx,
            diagnostic_graph: DiagnosticGraph::default(),
            total_events: 0,
        }
    }

    pub fn sender(&self) -> Sender<DiagnosticEvent> {
        self.event_tx.clone()
    }

    pub fn install_for_current_thread(&self) {
        install_thread_sender(self.sender());
    }

    /// Fold every pending event into the counters.
    pub fn drain(&mut self) -> usize {
        let mut drained = 0;
        while let Ok(event) = self.event_rx.try_recv() {
            self.record(&event);
            drained += 1;
        }
        drained
    }

    fn record(&mut self, event: &DiagnosticEvent) {
        let graph = &mut self.diagnostic_graph;
        self.total_events += 1;
        *graph.message_counts.entry(event.channel_id()).or_default() += 1;
        match event {
            DiagnosticEvent::MessageSent {
                channel_id,
                byte_len,
            } => {
                *graph.message_bytes_sent.entry(channel_id).or_default() += *byte_len as u64;
            },
            DiagnosticEvent::MessageReceived {
                channel_id,
                latency_us,
            } => {
                *graph.message_latency_us.entry(channel_id).or_default() += latency_us;
            },
        }
    }

    pub fn channel_count(&self, channel_id: &str) -> u64 {
        self.diagnostic_graph
            .message_counts
            .get(channel_id)
            .copied()
            .unwrap_or(0)
    }

    pub fn graph(&self) -> &DiagnosticGraph {
        &self.diagnostic_graph
    }

    pub fn snapshot_json(&self) -> Value {
        let mut channels: Vec<_> = self.diagnostic_graph.message_counts.iter().collect();
        channels.sort_by_key(|(channel, _)| **channel);
        let channels: serde_json::Map<String, Value> = channels
            .into_iter()
            .map(|(channel, count)| ((*channel).to_string(), json!(count)))
            .collect();
        json!({
            "total_events": self.total_events,
            "channels": channels,
        })
    }
}
