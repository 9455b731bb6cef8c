//! What survives a power cycle, and what a damaged store falls back to.

use mohnnode::adapters::nvs::NvsStore;
use mohnnode::app::commands::AppCommand;
use mohnnode::app::events::AppEvent;
use mohnnode::app::ports::{PersistencePort, ns};
use mohnnode::capabilities::DeviceCapabilities;
use mohnnode::config::{self, CONFIG_KEY, NodeConfig};
use mohnnode::creature::store as record;
use mohnnode::creature::{CreatureState, Element, GameMode};
use mohnnode::identity::NodeIdentity;

use crate::harness::{Harness, MAC};
use crate::mock_ports::{Endpoint, ok};

#[test]
fn creature_survives_reboot() {
    let mut h = Harness::new();
    h.transport()
        .heartbeat
        .push_back(ok(r#"{"success":true,"xpEarned":40}"#));
    h.heartbeat();
    h.heartbeat();
    h.command(AppCommand::SetGameMode(GameMode::Hibernation));
    let before = h.state().clone();
    let node_id = h.node.identity().node_id.clone();

    let h = h.reboot(12345);

    assert!(matches!(
        h.sink.events[0],
        AppEvent::Started { hatched: false, .. }
    ));
    assert_eq!(h.node.identity().node_id, node_id);
    let after = h.state();
    assert_eq!(after.id, before.id);
    assert_eq!(after.element, before.element);
    assert_eq!(after.total_xp, 41);
    assert_eq!(after.level, before.level);
    assert_eq!(after.stage, before.stage);
    assert_eq!(after.heartbeats, 2);
    assert_eq!(after.consecutive_heartbeats, 2);
    assert_eq!(after.combat, before.combat);
    assert_eq!(after.game_mode, GameMode::Hibernation);
}

#[test]
fn knocked_out_arena_record_boots_idle() {
    let mut store = NvsStore::new();
    let mut state = CreatureState::fresh("cr_ko0000000001", "Mohn", Element::Shadow);
    state.combat.hp = 0;
    state.game_mode = GameMode::Arena;
    record::save(&mut store, &state).unwrap();

    let h = Harness::boot(NodeConfig::default(), DeviceCapabilities::nano_pod(), store, 1);
    assert_eq!(h.node.creature().game_mode(), GameMode::Idle);
    assert!(h.node.creature().is_knocked_out());
}

#[test]
fn owner_pairing_is_reported() {
    let mut store = NvsStore::new();
    let mut identity = NodeIdentity::load_or_create(&mut store, &MAC);
    identity.set_owner(&mut store, "owner_42").unwrap();

    let mut h = Harness::boot(NodeConfig::default(), DeviceCapabilities::nano_pod(), store, 1);
    assert!(h.node.identity().is_paired());
    h.heartbeat();
    let body = h.transport().last(Endpoint::Heartbeat).cloned().unwrap();
    assert_eq!(body["ownerId"], "owner_42");
}

#[test]
fn stored_config_drives_cadence() {
    let mut store = NvsStore::new();
    let tuned = NodeConfig {
        heartbeat_interval_ms: 60_000,
        egg_hatch_heartbeats: 2,
        ..NodeConfig::default()
    };
    config::save_config(&mut store, &tuned).unwrap();

    let loaded = config::load_config(&store);
    assert_eq!(loaded, tuned);

    let mut h = Harness::boot(loaded, DeviceCapabilities::nano_pod(), store, 1);
    h.tick_at(0);
    h.tick_at(60_000);
    assert_eq!(h.transport().count(Endpoint::Heartbeat), 2);
    assert_eq!(h.transport().count(Endpoint::Egg), 1);
}

#[test]
fn corrupt_config_falls_back_to_defaults() {
    let mut store = NvsStore::new();
    store.put_str(ns::NODE, CONFIG_KEY, "{not json").unwrap();
    assert_eq!(config::load_config(&store), NodeConfig::default());

    store
        .put_str(ns::NODE, CONFIG_KEY, r#"{"heartbeat_interval_ms": 5}"#)
        .unwrap();
    assert_eq!(config::load_config(&store), NodeConfig::default());
}

#[test]
fn invalid_config_is_not_saved() {
    let mut store = NvsStore::new();
    let bad = NodeConfig {
        egg_hatch_heartbeats: 0,
        ..NodeConfig::default()
    };
    assert!(config::save_config(&mut store, &bad).is_err());
    assert_eq!(store.key_count(ns::NODE), 0);
}
