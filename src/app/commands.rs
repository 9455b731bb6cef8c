//! Inbound commands to the application service.
//!
//! These represent actions requested by the outside world (button, BLE,
//! serial console) that the [`NodeService`](super::service::NodeService)
//! applies immediately, outside the periodic cadence.

use crate::creature::GameMode;

/// Commands that external adapters can send into the application core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppCommand {
    Feed,
    Play,
    Rest,

    /// Local toggle: Idle → Hibernation → Arena → Idle.
    CycleGameMode,

    SetGameMode(GameMode),

    /// Immediate arena tick (only in Arena mode).
    Attack,

    /// Immediate heartbeat cycle instead of waiting for the interval.
    TriggerHeartbeat,

    /// Wipe every namespace and restart with a fresh identity.
    FactoryReset,
}

/// What the caller must do after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandOutcome {
    Applied,
    /// Not valid in the current state; nothing changed.
    Ignored,
    /// Persistence was wiped; the device must reboot.
    RestartRequired,
}
