//! Port allocation for localnet nodes.

use serde::{Deserialize, Serialize};

/// Default base port for the node JSON-RPC server.
pub const DEFAULT_RPC_PORT: u16 = 3030;
/// Default base port for the node peer-to-peer listener.
pub const DEFAULT_NETWORK_PORT: u16 = 24567;

/// Default offset between nodes for port allocation.
pub const DEFAULT_PORT_OFFSET: u16 = 1;

/// Address every node binds its listeners to.
pub const LISTEN_HOST: &str = "0.0.0.0";

/// Address other nodes use to reach the boot node.
pub const BOOT_NODE_HOST: &str = "127.0.0.1";

/// Port allocation strategy for assigning ports to nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortAllocationStrategy {
    /// Base port for RPC.
    pub rpc_base: u16,
    /// Base port for the network listener.
    pub network_base: u16,
    /// Offset between consecutive nodes.
    pub node_offset: u16,
}

impl Default for PortAllocationStrategy {
    fn default() -> Self {
        Self {
            rpc_base: DEFAULT_RPC_PORT,
            network_base: DEFAULT_NETWORK_PORT,
            node_offset: DEFAULT_PORT_OFFSET,
        }
    }
}

impl PortAllocationStrategy {
    /// Allocate ports for the node with the given id, or `None` if either
    /// port would fall past 65535.
    pub fn allocate(&self, node_id: usize) -> Option<NodePorts> {
        let offset = u16::try_from(node_id)
            .ok()?
            .checked_mul(self.node_offset)?;
        Some(NodePorts {
            rpc: self.rpc_base.checked_add(offset)?,
            network: self.network_base.checked_add(offset)?,
        })
    }

    /// The address joining nodes dial to reach the boot node.
    ///
    /// Always the network base port, which is node 0's port under every strategy.
    pub fn boot_node_address(&self, public_key: &str) -> String {
        format!("{public_key}@{BOOT_NODE_HOST}:{}", self.network_base)
    }
}

/// All ports allocated to a single node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodePorts {
    /// JSON-RPC port (3030 for node 0).
    pub rpc: u16,
    /// Peer-to-peer port (24567 for node 0).
    pub network: u16,
}

impl NodePorts {
    /// RPC listen address as written into `config.json`.
    pub fn rpc_listen_address(&self) -> String {
        format!("{LISTEN_HOST}:{}", self.rpc)
    }

    /// Network listen address as written into `config.json`.
    pub fn network_listen_address(&self) -> String {
        format!("{LISTEN_HOST}:{}", self.network)
    }
}
