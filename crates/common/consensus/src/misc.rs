use alloy_primitives::B256;
use beacon_primitives::{Domain, DomainType, Epoch, Slot, ValidatorIndex, Version};
use ethereum_hashing::hash_fixed;
use tree_hash::TreeHash;

use crate::{config::Config, fork_data::ForkData, signing_data::SigningData};

/// Return the epoch number at ``slot``.
pub fn compute_epoch_at_slot(config: &Config, slot: Slot) -> Epoch {
    slot / config.slots_per_epoch
}

/// Return the start slot of ``epoch``.
pub fn compute_start_slot_at_epoch(config: &Config, epoch: Epoch) -> Slot {
    epoch * config.slots_per_epoch
}

/// Return the epoch during which validator activations and exits initiated in ``epoch`` take
/// effect.
pub fn compute_activation_exit_epoch(config: &Config, epoch: Epoch) -> Epoch {
    epoch + 1 + config.max_seed_lookahead
}

pub fn compute_fork_data_root(current_version: Version, genesis_validators_root: B256) -> B256 {
    ForkData {
        current_version,
        genesis_validators_root,
    }
    .tree_hash_root()
}

/// Return the domain for the ``domain_type`` and ``fork_version``.
pub fn compute_domain(
    domain_type: DomainType,
    fork_version: Version,
    genesis_validators_root: B256,
) -> Domain {
    let fork_data_root = compute_fork_data_root(fork_version, genesis_validators_root);
    let mut domain = [0u8; 32];
    domain[..4].copy_from_slice(domain_type.as_slice());
    domain[4..].copy_from_slice(&fork_data_root[..28]);
    B256::from(domain)
}

pub fn compute_signing_root<SSZObject: TreeHash>(ssz_object: &SSZObject, domain: Domain) -> B256 {
    SigningData {
        object_root: ssz_object.tree_hash_root(),
        domain,
    }
    .tree_hash_root()
}

/// Return the shuffled index corresponding to ``seed`` (and ``index_count``).
///
/// Swap-or-not shuffle with ``rounds`` rounds. Returns `None` when ``index`` is out of range.
pub fn compute_shuffled_index(
    mut index: usize,
    index_count: usize,
    seed: B256,
    rounds: u64,
) -> Option<usize> {
    if index >= index_count || rounds > u8::MAX as u64 {
        return None;
    }
    let count = index_count as u64;
    let mut buffer = [0u8; 37];
    buffer[..32].copy_from_slice(seed.as_slice());

    for round in 0..rounds as u8 {
        buffer[32] = round;
        let pivot_hash = hash_fixed(&buffer[..33]);
        let mut pivot_bytes = [0u8; 8];
        pivot_bytes.copy_from_slice(&pivot_hash[..8]);
        let pivot = u64::from_le_bytes(pivot_bytes) % count;

        let flip = ((pivot + count - index as u64) % count) as usize;
        let position = index.max(flip);
        buffer[33..].copy_from_slice(&((position / 256) as u32).to_le_bytes());
        let source = hash_fixed(&buffer);
        let byte = source[(position % 256) / 8];
        let bit = (byte >> (position % 8)) & 1;

        if bit == 1 {
            index = flip;
        }
    }
    Some(index)
}

/// Return the committee corresponding to ``indices``, ``seed``, ``index``, and committee
/// ``count``.
pub fn compute_committee(
    indices: &[ValidatorIndex],
    seed: B256,
    index: u64,
    count: u64,
    rounds: u64,
) -> Option<Vec<ValidatorIndex>> {
    if count == 0 || index >= count {
        return None;
    }
    let total = indices.len() as u64;
    let start = (total * index / count) as usize;
    let end = (total * (index + 1) / count) as usize;
    (start..end)
        .map(|i| {
            compute_shuffled_index(i, indices.len(), seed, rounds).map(|shuffled| indices[shuffled])
        })
        .collect()
}

pub fn xor(left: B256, right: B256) -> B256 {
    left ^ right
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::constants::DOMAIN_VOLUNTARY_EXIT;

    #[test]
    fn test_shuffle_is_permutation() {
        let seed = B256::from(hash_fixed(b"shuffle"));
        for count in [1usize, 2, 7, 100, 333] {
            let shuffled: HashSet<usize> = (0..count)
                .map(|i| compute_shuffled_index(i, count, seed, 90).unwrap())
                .collect();
            assert_eq!(shuffled.len(), count);
            assert!(shuffled.iter().all(|&i| i < count));
        }
    }

    #[test]
    fn test_shuffle_depends_on_seed() {
        let first: Vec<usize> = (0..64)
            .map(|i| compute_shuffled_index(i, 64, B256::repeat_byte(1), 10).unwrap())
            .collect();
        let second: Vec<usize> = (0..64)
            .map(|i| compute_shuffled_index(i, 64, B256::repeat_byte(2), 10).unwrap())
            .collect();
        assert_ne!(first, second);
    }

    #[test]
    fn test_shuffle_rejects_out_of_range_index() {
        assert_eq!(compute_shuffled_index(5, 5, B256::ZERO, 90), None);
        assert_eq!(compute_shuffled_index(0, 0, B256::ZERO, 90), None);
    }

    #[test]
    fn test_committees_partition_indices() {
        let indices: Vec<u64> = (100..200).collect();
        let seed = B256::repeat_byte(7);
        let mut seen = vec![];
        for index in 0..6 {
            seen.extend(compute_committee(&indices, seed, index, 6, 10).unwrap());
        }
        seen.sort();
        assert_eq!(seen, indices);
    }

    #[test]
    fn test_compute_domain_layout() {
        let version = Version::new([0, 0, 0, 1]);
        let root = B256::repeat_byte(0xab);
        let domain = compute_domain(DOMAIN_VOLUNTARY_EXIT, version, root);
        let fork_data_root = compute_fork_data_root(version, root);

        assert_eq!(&domain[..4], DOMAIN_VOLUNTARY_EXIT.as_slice());
        assert_eq!(&domain[4..], &fork_data_root[..28]);
    }

    #[test]
    fn test_epoch_boundaries() {
        let config = Config::minimal();
        assert_eq!(compute_epoch_at_slot(&config, 7), 0);
        assert_eq!(compute_epoch_at_slot(&config, 8), 1);
        assert_eq!(compute_start_slot_at_epoch(&config, 3), 24);
        assert_eq!(compute_activation_exit_epoch(&config, 10), 15);
    }
}
