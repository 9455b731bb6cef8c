//! Creature record persistence.
//!
//! One scalar per key in the `mohngame` namespace.  A record exists iff
//! `cr_id` is non-empty.  Values read back are clamped into their invariants
//! by [`Creature::new`](super::Creature::new).

use log::{info, warn};

use super::{Combat, CreatureState, Element, GameMode, Mood, Stage};
use crate::app::ports::{PersistencePort, ns};
use crate::error::StorageError;

pub mod keys {
    pub const ID: &str = "cr_id";
    pub const NAME: &str = "cr_name";
    pub const ELEMENT: &str = "cr_elem";
    pub const LEVEL: &str = "level";
    pub const STAGE: &str = "stage";
    pub const TOTAL_XP: &str = "total_xp";
    pub const HEARTBEATS: &str = "heartbeats";
    pub const CONSECUTIVE: &str = "consec_hb";
    pub const HUNGER: &str = "hunger";
    pub const HAPPINESS: &str = "happiness";
    pub const ENERGY: &str = "energy";
    pub const HP: &str = "hp";
    pub const MAX_HP: &str = "max_hp";
    pub const WINS: &str = "wins";
    pub const LOSSES: &str = "losses";
    pub const GAME_MODE: &str = "game_mode";
}

/// Unsigned record fields; stored values saturate into `0..=MAX`.
trait StoredInt: TryFrom<i64> {
    const MAX: i64;
}

impl StoredInt for u8 {
    const MAX: i64 = u8::MAX as i64;
}

impl StoredInt for u16 {
    const MAX: i64 = u16::MAX as i64;
}

impl StoredInt for u32 {
    const MAX: i64 = u32::MAX as i64;
}

fn int_field<T: StoredInt>(store: &impl PersistencePort, key: &str, default: T) -> T {
    store
        .get_i64(ns::GAME, key)
        .and_then(|v| T::try_from(v.clamp(0, T::MAX)).ok())
        .unwrap_or(default)
}

/// Read the stored record, or `None` when no creature has been created.
pub fn load(store: &impl PersistencePort) -> Option<CreatureState> {
    let id = store.get_str(ns::GAME, keys::ID).filter(|id| !id.is_empty())?;
    let name = store.str_or(ns::GAME, keys::NAME, "");
    let element = store
        .get_i64(ns::GAME, keys::ELEMENT)
        .and_then(Element::from_i64)
        .unwrap_or(Element::Flame);

    let mut state = CreatureState::fresh(&id, &name, element);
    state.level = int_field(store, keys::LEVEL, 1u8);
    state.stage = store
        .get_i64(ns::GAME, keys::STAGE)
        .and_then(Stage::from_i64)
        .unwrap_or(Stage::Egg);
    state.total_xp = int_field(store, keys::TOTAL_XP, 0u32);
    state.heartbeats = int_field(store, keys::HEARTBEATS, 0u32);
    state.consecutive_heartbeats = int_field(store, keys::CONSECUTIVE, 0u32);
    state.mood = Mood {
        hunger: int_field(store, keys::HUNGER, state.mood.hunger),
        happiness: int_field(store, keys::HAPPINESS, state.mood.happiness),
        energy: int_field(store, keys::ENERGY, state.mood.energy),
    };
    state.combat = Combat {
        hp: int_field(store, keys::HP, state.combat.hp),
        max_hp: int_field(store, keys::MAX_HP, state.combat.max_hp),
        wins: int_field(store, keys::WINS, 0u32),
        losses: int_field(store, keys::LOSSES, 0u32),
    };
    state.game_mode = store
        .get_i64(ns::GAME, keys::GAME_MODE)
        .and_then(GameMode::from_i64)
        .unwrap_or(GameMode::Idle);
    state.clamp_invariants();
    Some(state)
}

/// Write every field.  Stops at the first failing key.
pub fn save(store: &mut impl PersistencePort, state: &CreatureState) -> Result<(), StorageError> {
    store.put_str(ns::GAME, keys::ID, &state.id)?;
    store.put_str(ns::GAME, keys::NAME, &state.name)?;
    let ints: [(&str, i64); 14] = [
        (keys::ELEMENT, state.element.as_i64()),
        (keys::LEVEL, state.level as i64),
        (keys::STAGE, state.stage.as_i64()),
        (keys::TOTAL_XP, state.total_xp as i64),
        (keys::HEARTBEATS, state.heartbeats as i64),
        (keys::CONSECUTIVE, state.consecutive_heartbeats as i64),
        (keys::HUNGER, state.mood.hunger as i64),
        (keys::HAPPINESS, state.mood.happiness as i64),
        (keys::ENERGY, state.mood.energy as i64),
        (keys::HP, state.combat.hp as i64),
        (keys::MAX_HP, state.combat.max_hp as i64),
        (keys::WINS, state.combat.wins as i64),
        (keys::LOSSES, state.combat.losses as i64),
        (keys::GAME_MODE, state.game_mode.as_i64()),
    ];
    for (key, value) in ints {
        store.put_i64(ns::GAME, key, value)?;
    }
    Ok(())
}

/// Best-effort save: failures are logged and play continues.
pub fn persist(store: &mut impl PersistencePort, state: &CreatureState) -> bool {
    match save(store, state) {
        Ok(()) => true,
        Err(e) => {
            warn!("Creature: save failed ({}), continuing in memory", e);
            false
        }
    }
}

/// Load the stored creature or hatch a new egg and persist it.
pub fn load_or_create(
    store: &mut impl PersistencePort,
    fresh_id: impl FnOnce() -> heapless::String<16>,
    name: &str,
    element: Element,
) -> (CreatureState, bool) {
    if let Some(state) = load(store) {
        info!(
            "Creature: loaded {} ({:?}, level {}, {} XP)",
            state.id, state.stage, state.level, state.total_xp
        );
        return (state, false);
    }
    let id = fresh_id();
    let state = CreatureState::fresh(&id, name, element);
    info!("Creature: hatched new egg {}", state.id);
    persist(store, &state);
    (state, true)
}
