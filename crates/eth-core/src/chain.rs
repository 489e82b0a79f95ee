use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::EthError;

/// An EIP-155 chain id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChainId(pub u64);

/// A well-known network and its chain id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Network {
    pub chain_id: ChainId,
    pub name: &'static str,
    pub is_testnet: bool,
}

impl ChainId {
    pub const MAINNET: ChainId = ChainId(1);
    pub const ROPSTEN: ChainId = ChainId(3);
    pub const RINKEBY: ChainId = ChainId(4);
    pub const GOERLI: ChainId = ChainId(5);
    pub const KOVAN: ChainId = ChainId(42);
    pub const SEPOLIA: ChainId = ChainId(11_155_111);

    pub fn value(&self) -> u64 {
        self.0
    }

    /// The known network for this id, if any.
    pub fn network(&self) -> Option<&'static Network> {
        NETWORKS.iter().find(|n| n.chain_id == *self)
    }
}

const NETWORKS: &[Network] = &[
    Network { chain_id: ChainId::MAINNET, name: "mainnet", is_testnet: false },
    Network { chain_id: ChainId::ROPSTEN, name: "ropsten", is_testnet: true },
    Network { chain_id: ChainId::RINKEBY, name: "rinkeby", is_testnet: true },
    Network { chain_id: ChainId::GOERLI, name: "goerli", is_testnet: true },
    Network { chain_id: ChainId::KOVAN, name: "kovan", is_testnet: true },
    Network { chain_id: ChainId::SEPOLIA, name: "sepolia", is_testnet: true },
];

/// All networks with a registered name.
pub fn known_networks() -> &'static [Network] {
    NETWORKS
}

impl From<u64> for ChainId {
    fn from(id: u64) -> Self {
        ChainId(id)
    }
}

impl From<ChainId> for u64 {
    fn from(id: ChainId) -> Self {
        id.0
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.network() {
            Some(network) => write!(f, "{} ({})", network.name, self.0),
            None => write!(f, "{}", self.0),
        }
    }
}

impl FromStr for ChainId {
    type Err = EthError;

    /// Accepts a network name (case-insensitive), a decimal id or a `0x` id.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(network) = NETWORKS.iter().find(|n| n.name.eq_ignore_ascii_case(s)) {
            return Ok(network.chain_id);
        }

        let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
            Some(hex_digits) => u64::from_str_radix(hex_digits, 16),
            None => s.parse::<u64>(),
        };
        parsed
            .map(ChainId)
            .map_err(|e| EthError::InvalidChainId(format!("{s}: {e}")))
    }
}
