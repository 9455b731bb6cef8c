//! JSON wire format of the game backend.
//!
//! Requests are serialized from borrowed structs.  Replies are decoded
//! defensively: missing or `null` fields take defaults, fields of the wrong
//! type read as their default, fractional numbers truncate, negative or
//! oversized numbers are clamped, unknown fields are ignored.  Anything that is not
//! a 200 with a JSON object body is an error.

use log::warn;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::GameCommand;
use crate::error::ProtocolError;

// ───────────────────────────────────────────────────────────────
// Requests
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeartbeatBody<'a> {
    pub node_id: &'a str,
    pub owner_id: &'a str,
    pub game_mode: i64,
    pub consecutive_heartbeats: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lon: Option<f64>,
    pub firmware_version: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rssi: Option<i8>,
    pub uptime_secs: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArenaTickBody<'a> {
    pub node_id: &'a str,
    pub creature_id: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckEggBody<'a> {
    pub node_id: &'a str,
    pub heartbeat_count: u32,
}

// ───────────────────────────────────────────────────────────────
// Replies (raw)
// ───────────────────────────────────────────────────────────────

/// Any JSON number, truncated and saturated to `i64`; anything else is 0.
fn lenient_int<'de, D: Deserializer<'de>>(d: D) -> Result<i64, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::Number(n) => n
            .as_i64()
            .unwrap_or_else(|| n.as_f64().map_or(0, |f| f as i64)),
        _ => 0,
    })
}

fn lenient_bool<'de, D: Deserializer<'de>>(d: D) -> Result<Option<bool>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::Bool(b) => Some(b),
        _ => None,
    })
}

fn lenient_str<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(d)? {
        Value::String(s) => Some(s),
        _ => None,
    })
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct HeartbeatReply {
    #[serde(deserialize_with = "lenient_bool")]
    success: Option<bool>,
    #[serde(deserialize_with = "lenient_int")]
    xp_earned: i64,
    #[serde(deserialize_with = "lenient_str")]
    game_command: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ArenaReply {
    #[serde(deserialize_with = "lenient_bool")]
    success: Option<bool>,
    #[serde(deserialize_with = "lenient_bool")]
    won: Option<bool>,
    #[serde(deserialize_with = "lenient_int")]
    xp_earned: i64,
    #[serde(deserialize_with = "lenient_int")]
    damage_taken: i64,
    #[serde(deserialize_with = "lenient_str")]
    opponent_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct EggReply {
    #[serde(deserialize_with = "lenient_bool")]
    success: Option<bool>,
    #[serde(deserialize_with = "lenient_str")]
    egg_id: Option<String>,
    #[serde(deserialize_with = "lenient_str")]
    egg_type: Option<String>,
}

// ───────────────────────────────────────────────────────────────
// Replies (decoded)
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeartbeatAck {
    pub xp_earned: u32,
    pub game_command: Option<GameCommand>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArenaOutcome {
    pub won: bool,
    pub xp_earned: u32,
    pub damage_taken: u16,
    pub opponent_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EggAward {
    /// Empty when no egg was awarded this time.
    pub egg_id: String,
    pub egg_type: String,
}

fn clamp_u32(v: i64) -> u32 {
    v.clamp(0, u32::MAX as i64) as u32
}

fn clamp_u16(v: i64) -> u16 {
    v.clamp(0, u16::MAX as i64) as u16
}

fn parse_body<'de, R: Deserialize<'de>>(status: u16, body: &'de [u8]) -> Result<R, ProtocolError> {
    if status != 200 {
        return Err(ProtocolError::HttpStatus(status));
    }
    serde_json::from_slice(body).map_err(|_| ProtocolError::Malformed)
}

fn check_flag(success: Option<bool>) -> Result<(), ProtocolError> {
    match success {
        Some(false) => Err(ProtocolError::Rejected),
        _ => Ok(()),
    }
}

pub fn decode_heartbeat(status: u16, body: &[u8]) -> Result<HeartbeatAck, ProtocolError> {
    let reply: HeartbeatReply = parse_body(status, body)?;
    check_flag(reply.success)?;
    let game_command = match reply.game_command.as_deref() {
        None | Some("") => None,
        Some(raw) => {
            let parsed = GameCommand::parse(raw);
            if parsed.is_none() {
                warn!("Protocol: ignoring unknown game command '{}'", raw);
            }
            parsed
        }
    };
    Ok(HeartbeatAck {
        xp_earned: clamp_u32(reply.xp_earned),
        game_command,
    })
}

pub fn decode_arena(status: u16, body: &[u8]) -> Result<ArenaOutcome, ProtocolError> {
    let reply: ArenaReply = parse_body(status, body)?;
    check_flag(reply.success)?;
    Ok(ArenaOutcome {
        won: reply.won.unwrap_or(false),
        xp_earned: clamp_u32(reply.xp_earned),
        damage_taken: clamp_u16(reply.damage_taken),
        opponent_name: reply.opponent_name.unwrap_or_default(),
    })
}

pub fn decode_egg(status: u16, body: &[u8]) -> Result<EggAward, ProtocolError> {
    let reply: EggReply = parse_body(status, body)?;
    check_flag(reply.success)?;
    Ok(EggAward {
        egg_id: reply.egg_id.unwrap_or_default(),
        egg_type: reply.egg_type.unwrap_or_default(),
    })
}
