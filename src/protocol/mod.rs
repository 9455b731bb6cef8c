//! Heartbeat protocol client.
//!
//! Three request/response exchanges with the game backend, each a JSON
//! `POST`.  Every failure (link down, timeout, non-200, malformed body) is
//! folded into `success = false` and logged; nothing here panics or
//! blocks past the configured timeout.
//!
//! ```text
//!   NodeService ──▶ HeartbeatClient ──▶ HttpTransport ──▶ backend
//!                   │ encode (wire)                        │
//!                   ◀── decode (wire) ◀────────────────────┘
//! ```

pub mod transport;
pub mod wire;

use log::{info, warn};

use crate::app::ports::{ConnectivityPort, GeoFix};
use crate::config::{self, NodeConfig};
use crate::creature::GameMode;
use crate::error::{ProtocolError, TransportError};

use transport::HttpTransport;
use wire::{ArenaOutcome, ArenaTickBody, CheckEggBody, EggAward, HeartbeatAck, HeartbeatBody};

pub const FIRMWARE_VERSION: &str = env!("CARGO_PKG_VERSION");

// ───────────────────────────────────────────────────────────────
// Server-issued commands
// ───────────────────────────────────────────────────────────────

/// Fixed vocabulary of commands a heartbeat reply may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameCommand {
    Evolve,
    Feed,
    Play,
    ArenaStart,
    ArenaStop,
}

impl GameCommand {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "evolve" => Some(Self::Evolve),
            "feed" => Some(Self::Feed),
            "play" => Some(Self::Play),
            "arena_start" => Some(Self::ArenaStart),
            "arena_stop" => Some(Self::ArenaStop),
            _ => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Evolve => "evolve",
            Self::Feed => "feed",
            Self::Play => "play",
            Self::ArenaStart => "arena_start",
            Self::ArenaStop => "arena_stop",
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Requests and results
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
pub struct HeartbeatRequest<'a> {
    pub node_id: &'a str,
    pub owner_id: &'a str,
    pub game_mode: GameMode,
    pub consecutive_heartbeats: u32,
    pub location: Option<GeoFix>,
    pub uptime_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HeartbeatResult {
    pub success: bool,
    pub xp_earned: u32,
    pub game_command: Option<GameCommand>,
    pub failure: Option<ProtocolError>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ArenaResult {
    pub success: bool,
    pub won: bool,
    pub xp_earned: u32,
    pub damage_taken: u16,
    pub opponent_name: String,
    pub failure: Option<ProtocolError>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EggCheckResult {
    pub success: bool,
    /// Empty unless an egg was awarded.
    pub egg_id: String,
    pub egg_type: String,
    pub failure: Option<ProtocolError>,
}

impl EggCheckResult {
    pub fn awarded(&self) -> bool {
        self.success && !self.egg_id.is_empty()
    }
}

// ───────────────────────────────────────────────────────────────
// Client
// ───────────────────────────────────────────────────────────────

pub struct HeartbeatClient<T: HttpTransport> {
    transport: T,
    heartbeat_url: String,
    arena_url: String,
    egg_url: String,
    timeout_ms: u32,
}

impl<T: HttpTransport> HeartbeatClient<T> {
    pub fn new(transport: T, config: &NodeConfig) -> Self {
        Self {
            transport,
            heartbeat_url: config.endpoint(config::HEARTBEAT_PATH),
            arena_url: config.endpoint(config::ARENA_TICK_PATH),
            egg_url: config.endpoint(config::CHECK_EGG_PATH),
            timeout_ms: config.http_timeout_ms,
        }
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn send_heartbeat(
        &mut self,
        link: &impl ConnectivityPort,
        req: &HeartbeatRequest<'_>,
    ) -> HeartbeatResult {
        let body = HeartbeatBody {
            node_id: req.node_id,
            owner_id: req.owner_id,
            game_mode: req.game_mode.as_i64(),
            consecutive_heartbeats: req.consecutive_heartbeats,
            lat: req.location.map(|f| f.lat),
            lon: req.location.map(|f| f.lon),
            firmware_version: FIRMWARE_VERSION,
            rssi: link.signal_strength(),
            uptime_secs: req.uptime_secs,
        };
        let url = self.heartbeat_url.clone();
        match self.exchange(link, &url, &body, wire::decode_heartbeat) {
            Ok(HeartbeatAck {
                xp_earned,
                game_command,
            }) => {
                info!(
                    "Heartbeat: ok (+{} XP, command={:?})",
                    xp_earned,
                    game_command.map(GameCommand::as_str)
                );
                HeartbeatResult {
                    success: true,
                    xp_earned,
                    game_command,
                    failure: None,
                }
            }
            Err(e) => {
                warn!("Heartbeat: failed ({})", e);
                HeartbeatResult {
                    failure: Some(e),
                    ..HeartbeatResult::default()
                }
            }
        }
    }

    pub fn send_arena_tick(
        &mut self,
        link: &impl ConnectivityPort,
        node_id: &str,
        creature_id: &str,
    ) -> ArenaResult {
        let body = ArenaTickBody {
            node_id,
            creature_id,
        };
        let url = self.arena_url.clone();
        match self.exchange(link, &url, &body, wire::decode_arena) {
            Ok(ArenaOutcome {
                won,
                xp_earned,
                damage_taken,
                opponent_name,
            }) => ArenaResult {
                success: true,
                won,
                xp_earned,
                damage_taken,
                opponent_name,
                failure: None,
            },
            Err(e) => {
                warn!("Arena: tick failed ({})", e);
                ArenaResult {
                    failure: Some(e),
                    ..ArenaResult::default()
                }
            }
        }
    }

    pub fn send_check_egg(
        &mut self,
        link: &impl ConnectivityPort,
        node_id: &str,
        heartbeats: u32,
    ) -> EggCheckResult {
        let body = CheckEggBody {
            node_id,
            heartbeat_count: heartbeats,
        };
        let url = self.egg_url.clone();
        match self.exchange(link, &url, &body, wire::decode_egg) {
            Ok(EggAward { egg_id, egg_type }) => EggCheckResult {
                success: true,
                egg_id,
                egg_type,
                failure: None,
            },
            Err(e) => {
                warn!("Egg: check failed ({})", e);
                EggCheckResult {
                    failure: Some(e),
                    ..EggCheckResult::default()
                }
            }
        }
    }

    /// Serialize, send, decode.  Fails fast without touching the transport
    /// while the link is down.
    fn exchange<B, R>(
        &mut self,
        link: &impl ConnectivityPort,
        url: &str,
        body: &B,
        decode: fn(u16, &[u8]) -> Result<R, ProtocolError>,
    ) -> Result<R, ProtocolError>
    where
        B: serde::Serialize,
    {
        if !link.is_connected() {
            return Err(TransportError::NotConnected.into());
        }
        let json = serde_json::to_vec(body).map_err(|_| ProtocolError::Malformed)?;
        let response = self.transport.post_json(url, &json, self.timeout_ms)?;
        decode(response.status, &response.body)
    }
}
