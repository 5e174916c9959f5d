use alloy_primitives::aliases::B32;
use beacon_primitives::{DomainType, Epoch, Slot};

pub const FAR_FUTURE_EPOCH: Epoch = u64::MAX;
pub const GENESIS_SLOT: Slot = 0;
pub const GENESIS_EPOCH: Epoch = 0;

pub const DEPOSIT_CONTRACT_TREE_DEPTH: u64 = 32;
pub const MAX_RANDOM_BYTE: u64 = 255;

pub const DOMAIN_BEACON_PROPOSER: DomainType = B32::new([0x00, 0x00, 0x00, 0x00]);
pub const DOMAIN_BEACON_ATTESTER: DomainType = B32::new([0x01, 0x00, 0x00, 0x00]);
pub const DOMAIN_RANDAO: DomainType = B32::new([0x02, 0x00, 0x00, 0x00]);
pub const DOMAIN_DEPOSIT: DomainType = B32::new([0x03, 0x00, 0x00, 0x00]);
pub const DOMAIN_VOLUNTARY_EXIT: DomainType = B32::new([0x04, 0x00, 0x00, 0x00]);

// Capacities of the SSZ lists and vectors backing the state and block body.
// A configuration may lower the protocol values but never exceed these.
pub const HISTORICAL_VECTOR_CAPACITY: u64 = 65536;
pub const SLASHINGS_VECTOR_CAPACITY: u64 = 8192;
pub const ETH1_DATA_VOTES_CAPACITY: u64 = 2048;
pub const EPOCH_ATTESTATIONS_CAPACITY: u64 = 4096;
