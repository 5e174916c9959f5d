use alloy_primitives::B256;
use beacon_primitives::{CommitteeIndex, Slot};
use serde::{Deserialize, Serialize};
use ssz_derive::{Decode, Encode};
use tree_hash_derive::TreeHash;

use crate::checkpoint::Checkpoint;

#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize, Encode, Decode, TreeHash)]
pub struct AttestationData {
    pub slot: Slot,
    pub index: CommitteeIndex,

    /// LMD GHOST vote
    pub beacon_block_root: B256,

    /// FFG vote
    pub source: Checkpoint,
    pub target: Checkpoint,
}

impl AttestationData {
    /// Check if ``self`` and ``other`` are slashable according to Casper FFG rules.
    pub fn is_slashable_with(&self, other: &AttestationData) -> bool {
        // Double vote
        (self != other && self.target.epoch == other.target.epoch)
            // Surround vote
            || (self.source.epoch < other.source.epoch && other.target.epoch < self.target.epoch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(source_epoch: u64, target_epoch: u64, root: u8) -> AttestationData {
        AttestationData {
            slot: target_epoch * 8,
            index: 0,
            beacon_block_root: B256::repeat_byte(root),
            source: Checkpoint {
                epoch: source_epoch,
                root: B256::ZERO,
            },
            target: Checkpoint {
                epoch: target_epoch,
                root: B256::ZERO,
            },
        }
    }

    #[rstest::rstest]
    #[case::double_vote(data(1, 3, 1), data(1, 3, 2), true)]
    #[case::identical(data(1, 3, 1), data(1, 3, 1), false)]
    #[case::surround(data(1, 5, 1), data(2, 4, 1), true)]
    #[case::surrounded_is_checked_one_way(data(2, 4, 1), data(1, 5, 1), false)]
    #[case::disjoint(data(1, 2, 1), data(2, 3, 1), false)]
    fn test_is_slashable_with(
        #[case] first: AttestationData,
        #[case] second: AttestationData,
        #[case] expected: bool,
    ) {
        assert_eq!(first.is_slashable_with(&second), expected);
    }
}
