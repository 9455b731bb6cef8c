//! A booted node wired to mock ports, with a manually driven clock.

use mohnnode::adapters::nvs::NvsStore;
use mohnnode::app::commands::{AppCommand, CommandOutcome};
use mohnnode::app::service::{BootInfo, NodeService};
use mohnnode::capabilities::DeviceCapabilities;
use mohnnode::config::NodeConfig;
use mohnnode::creature::CreatureState;
use mohnnode::status::StatusPattern;

use crate::mock_ports::{RecordingSink, ScriptedTransport, SharedLink};

pub const MAC: [u8; 6] = [0xDE, 0xAD, 0xBE, 0xEF, 0xCA, 0xFE];

pub struct Harness {
    pub node: NodeService<ScriptedTransport>,
    pub store: NvsStore,
    pub link: SharedLink,
    pub sink: RecordingSink,
    pub now: u64,
}

#[allow(dead_code)]
impl Harness {
    pub fn new() -> Self {
        Self::boot(NodeConfig::default(), DeviceCapabilities::nano_pod(), NvsStore::new(), 1)
    }

    pub fn with_caps(caps: DeviceCapabilities) -> Self {
        Self::boot(NodeConfig::default(), caps, NvsStore::new(), 1)
    }

    pub fn boot(config: NodeConfig, caps: DeviceCapabilities, mut store: NvsStore, nonce: u64) -> Self {
        let mut sink = RecordingSink::new();
        let node = NodeService::boot(
            config,
            caps,
            ScriptedTransport::new(),
            BootInfo { mac: MAC, nonce },
            0,
            &mut store,
            &mut sink,
        );
        Self {
            node,
            store,
            link: SharedLink::up(),
            sink,
            now: 0,
        }
    }

    /// Boot again on the same store, as after a power cycle.
    pub fn reboot(self, nonce: u64) -> Self {
        let config = self.node.config().clone();
        let caps = *self.node.capabilities();
        Self::boot(config, caps, self.store, nonce)
    }

    pub fn transport(&mut self) -> &mut ScriptedTransport {
        self.node.transport_mut()
    }

    pub fn state(&self) -> &CreatureState {
        self.node.creature().state()
    }

    pub fn tick_at(&mut self, now_ms: u64) -> StatusPattern {
        self.now = now_ms;
        self.node
            .tick(now_ms, &mut self.store, &self.link, &mut self.sink)
    }

    pub fn command(&mut self, cmd: AppCommand) -> CommandOutcome {
        self.now += 1;
        self.node
            .handle_command(cmd, self.now, &mut self.store, &self.link, &mut self.sink)
    }

    /// One immediate heartbeat cycle.
    pub fn heartbeat(&mut self) {
        assert_eq!(self.command(AppCommand::TriggerHeartbeat), CommandOutcome::Applied);
    }
}
