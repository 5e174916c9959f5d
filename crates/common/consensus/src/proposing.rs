use alloy_primitives::B256;
use beacon_primitives::{Epoch, Slot, ValidatorIndex};
use ethereum_hashing::hash_fixed;
use rayon::prelude::*;

use crate::{
    config::Config,
    constants::{DOMAIN_BEACON_PROPOSER, MAX_RANDOM_BYTE},
    errors::ProposerSelectionError,
    meta::{EffectiveBalances, EpochSeed, ProposingMeta},
    misc::{compute_epoch_at_slot, compute_shuffled_index, compute_start_slot_at_epoch},
};

/// Return from ``indices`` a random index sampled by effective balance.
///
/// Candidates are visited in shuffled order and each is accepted with probability
/// ``effective_balance / MAX_EFFECTIVE_BALANCE``. The loop has no iteration cap: it ends as soon
/// as any candidate with a non-zero balance is accepted, which happens with probability one.
pub fn compute_proposer_index<E: EffectiveBalances + ?Sized>(
    config: &Config,
    balances: &E,
    indices: &[ValidatorIndex],
    seed: B256,
) -> Result<ValidatorIndex, ProposerSelectionError> {
    if indices.is_empty() {
        return Err(ProposerSelectionError::EmptyCandidateSet);
    }

    let total = indices.len();
    let mut preimage = [0u8; 40];
    preimage[..32].copy_from_slice(seed.as_slice());
    let mut random_bytes = [0u8; 32];

    let mut i: usize = 0;
    loop {
        let position = compute_shuffled_index(i % total, total, seed, config.shuffle_round_count)
            .ok_or(ProposerSelectionError::UnableToShuffle {
                position: i % total,
                count: total,
            })?;
        let candidate_index = indices[position];

        if i % 32 == 0 {
            preimage[32..].copy_from_slice(&((i / 32) as u64).to_le_bytes());
            random_bytes = hash_fixed(&preimage);
        }
        let random_byte = random_bytes[i % 32] as u64;

        let effective_balance = balances
            .effective_balance(candidate_index)
            .ok_or(ProposerSelectionError::UnknownValidator(candidate_index))?;

        if effective_balance * MAX_RANDOM_BYTE >= config.max_effective_balance * random_byte {
            return Ok(candidate_index);
        }

        i += 1;
    }
}

/// Seed that selects the proposer of ``slot``.
pub fn proposer_seed<M: EpochSeed + ?Sized>(config: &Config, meta: &M, slot: Slot) -> B256 {
    let epoch = compute_epoch_at_slot(config, slot);
    let mut preimage = [0u8; 40];
    preimage[..32].copy_from_slice(meta.get_seed(epoch, DOMAIN_BEACON_PROPOSER).as_slice());
    preimage[32..].copy_from_slice(&slot.to_le_bytes());
    B256::from(hash_fixed(&preimage))
}

/// Return the beacon proposer index at ``slot``.
pub fn get_beacon_proposer_index<M: ProposingMeta + ?Sized>(
    config: &Config,
    meta: &M,
    slot: Slot,
) -> Result<ValidatorIndex, ProposerSelectionError> {
    let epoch = compute_epoch_at_slot(config, slot);
    let indices = meta.get_active_validator_indices(epoch);
    compute_proposer_index(config, meta, &indices, proposer_seed(config, meta, slot))
}

/// Proposers of every slot in ``epoch``, in slot order.
pub fn get_proposer_lookahead<M: ProposingMeta + Sync + ?Sized>(
    config: &Config,
    meta: &M,
    epoch: Epoch,
) -> Result<Vec<ValidatorIndex>, ProposerSelectionError> {
    let indices = meta.get_active_validator_indices(epoch);
    let start_slot = compute_start_slot_at_epoch(config, epoch);
    (start_slot..start_slot + config.slots_per_epoch)
        .into_par_iter()
        .map(|slot| {
            let seed = proposer_seed(config, meta, slot);
            compute_proposer_index(config, meta, &indices, seed)
        })
        .collect()
}
