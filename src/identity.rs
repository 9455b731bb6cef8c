//! Node and creature identity.
//!
//! The node id is derived from the factory MAC on first boot and persisted
//! under `mohnnode/node_id`; the owner id is written by pairing and is
//! empty until then.  Creature ids are a short SHA-256 digest of the node
//! id and a hardware nonce, so a factory reset always yields a new one.

use core::fmt::Write as _;

use log::{info, warn};

use crate::app::ports::{PersistencePort, ns};
use crate::error::StorageError;

pub const NODE_ID_KEY: &str = "node_id";
pub const OWNER_ID_KEY: &str = "owner_id";

pub type NodeId = heapless::String<32>;
pub type OwnerId = heapless::String<64>;

/// Copy `s` into a bounded string, cutting at a char boundary if needed.
pub fn truncated<const N: usize>(s: &str) -> heapless::String<N> {
    let mut out = heapless::String::new();
    for c in s.chars() {
        if out.push(c).is_err() {
            break;
        }
    }
    out
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeIdentity {
    pub node_id: NodeId,
    pub owner_id: OwnerId,
}

impl NodeIdentity {
    /// `mohn_` followed by the low four MAC bytes in hex.
    pub fn node_id_from_mac(mac: &[u8; 6]) -> NodeId {
        let mut id = NodeId::new();
        let _ = write!(
            id,
            "mohn_{:02x}{:02x}{:02x}{:02x}",
            mac[2], mac[3], mac[4], mac[5]
        );
        id
    }

    /// Load the stored identity, generating and persisting the node id on
    /// first boot.  A failed write is logged; the generated id is still
    /// used for this session.
    pub fn load_or_create(store: &mut impl PersistencePort, mac: &[u8; 6]) -> Self {
        let node_id = match store.get_str(ns::NODE, NODE_ID_KEY) {
            Some(stored) if !stored.is_empty() => truncated(&stored),
            _ => {
                let fresh = Self::node_id_from_mac(mac);
                info!("Identity: first boot, node id {}", fresh);
                if let Err(e) = store.put_str(ns::NODE, NODE_ID_KEY, &fresh) {
                    warn!("Identity: could not persist node id: {}", e);
                }
                fresh
            }
        };
        let owner_id = truncated(&store.str_or(ns::NODE, OWNER_ID_KEY, ""));
        Self { node_id, owner_id }
    }

    pub fn is_paired(&self) -> bool {
        !self.owner_id.is_empty()
    }

    pub fn set_owner(&mut self, store: &mut impl PersistencePort, owner: &str) -> Result<(), StorageError> {
        store.put_str(ns::NODE, OWNER_ID_KEY, owner)?;
        self.owner_id = truncated(owner);
        info!("Identity: paired to owner {}", self.owner_id);
        Ok(())
    }
}

/// `cr_` + 12 hex chars of SHA-256(node id ‖ nonce).
pub fn creature_id(node_id: &str, nonce: u64) -> heapless::String<16> {
    let mut input = Vec::with_capacity(node_id.len() + 8);
    input.extend_from_slice(node_id.as_bytes());
    input.extend_from_slice(&nonce.to_le_bytes());
    let digest = hmac_sha256::Hash::hash(&input);

    let mut id = heapless::String::new();
    let _ = id.push_str("cr_");
    for byte in &digest[..6] {
        let _ = write!(id, "{:02x}", byte);
    }
    id
}
