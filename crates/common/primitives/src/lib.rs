use alloy_primitives::{aliases::B32, B256};

pub type CommitteeIndex = u64; // committee index at a slot
pub type DepositIndex = u64; // position in the deposit contract tree
pub type Domain = B256; // signature domain
pub type DomainType = B32; // domain type
pub type Epoch = u64; // epoch number
pub type Gwei = u64; // amount in gwei
pub type Root = B256; // hash tree root
pub type Slot = u64; // slot number
pub type ValidatorIndex = u64; // validator registry index
pub type Version = B32; // fork version number
