//! Mock ports for integration tests.
//!
//! A switchable link, a per-endpoint scripted HTTP transport that records
//! every request, and an event sink that keeps the full event history.

use std::cell::Cell;
use std::collections::VecDeque;
use std::rc::Rc;

use mohnnode::app::events::AppEvent;
use mohnnode::app::ports::{ConnectivityPort, EventSink};
use mohnnode::error::TransportError;
use mohnnode::protocol::transport::{HttpResponse, HttpTransport};

pub type Reply = Result<HttpResponse, TransportError>;

pub fn ok(json: &str) -> Reply {
    Ok(HttpResponse {
        status: 200,
        body: json.as_bytes().to_vec(),
    })
}

#[allow(dead_code)]
pub fn status(code: u16) -> Reply {
    Ok(HttpResponse {
        status: code,
        body: Vec::new(),
    })
}

// ── Link ──────────────────────────────────────────────────────

/// Connectivity flag shared between the test and the transport.
#[derive(Clone)]
pub struct SharedLink(Rc<Cell<bool>>);

#[allow(dead_code)]
impl SharedLink {
    pub fn up() -> Self {
        Self(Rc::new(Cell::new(true)))
    }

    pub fn down() -> Self {
        Self(Rc::new(Cell::new(false)))
    }

    pub fn set(&self, up: bool) {
        self.0.set(up);
    }
}

impl ConnectivityPort for SharedLink {
    fn is_connected(&self) -> bool {
        self.0.get()
    }

    fn signal_strength(&self) -> Option<i8> {
        self.0.get().then_some(-58)
    }
}

// ── Transport ─────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Heartbeat,
    Arena,
    Egg,
}

impl Endpoint {
    fn of(url: &str) -> Self {
        if url.ends_with("/api/node/heartbeat") {
            Self::Heartbeat
        } else if url.ends_with("/api/node/arena-tick") {
            Self::Arena
        } else if url.ends_with("/api/node/generate-egg") {
            Self::Egg
        } else {
            panic!("unexpected endpoint {url}")
        }
    }
}

/// Replies from per-endpoint queues; falls back to the endpoint default
/// once a queue is empty.
pub struct ScriptedTransport {
    pub heartbeat: VecDeque<Reply>,
    pub arena: VecDeque<Reply>,
    pub egg: VecDeque<Reply>,
    pub heartbeat_default: Reply,
    pub arena_default: Reply,
    pub egg_default: Reply,
    pub requests: Vec<(Endpoint, serde_json::Value)>,
    /// Simulates the link dropping while an arena request is in flight.
    pub drop_link_on_arena: Option<SharedLink>,
}

#[allow(dead_code)]
impl ScriptedTransport {
    /// Heartbeats succeed with 1 XP, eggs are never awarded, arena ticks
    /// time out.
    pub fn new() -> Self {
        Self {
            heartbeat: VecDeque::new(),
            arena: VecDeque::new(),
            egg: VecDeque::new(),
            heartbeat_default: ok(r#"{"success":true,"xpEarned":1}"#),
            arena_default: Err(TransportError::Timeout),
            egg_default: ok(r#"{"success":true,"eggId":"","eggType":""}"#),
            requests: Vec::new(),
            drop_link_on_arena: None,
        }
    }

    pub fn count(&self, endpoint: Endpoint) -> usize {
        self.requests.iter().filter(|(e, _)| *e == endpoint).count()
    }

    pub fn last(&self, endpoint: Endpoint) -> Option<&serde_json::Value> {
        self.requests
            .iter()
            .rev()
            .find(|(e, _)| *e == endpoint)
            .map(|(_, body)| body)
    }
}

impl HttpTransport for ScriptedTransport {
    fn post_json(&mut self, url: &str, body: &[u8], _timeout_ms: u32) -> Reply {
        let endpoint = Endpoint::of(url);
        let json = serde_json::from_slice(body).unwrap_or(serde_json::Value::Null);
        self.requests.push((endpoint, json));
        match endpoint {
            Endpoint::Heartbeat => self
                .heartbeat
                .pop_front()
                .unwrap_or_else(|| self.heartbeat_default.clone()),
            Endpoint::Arena => {
                if let Some(link) = &self.drop_link_on_arena {
                    link.set(false);
                    return Err(TransportError::Io);
                }
                self.arena
                    .pop_front()
                    .unwrap_or_else(|| self.arena_default.clone())
            }
            Endpoint::Egg => self
                .egg
                .pop_front()
                .unwrap_or_else(|| self.egg_default.clone()),
        }
    }
}

// ── Event sink ────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}
