use std::{borrow::BorrowMut, cmp::min};

use alloy_primitives::B256;
use tracing::debug;
use tree_hash::TreeHash;

use super::DepositProcessor;
use crate::{
    bls,
    config::Config,
    constants::{DEPOSIT_CONTRACT_TREE_DEPTH, DOMAIN_DEPOSIT},
    deposit::Deposit,
    deposit_data::DepositData,
    errors::{BlockProcessingError, DepositInvalid, IntoWithIndex, OperationError},
    helpers::is_valid_merkle_branch,
    meta::DepositMeta,
    misc::{compute_domain, compute_signing_root},
    phase0::{beacon_state::BeaconState, state_meta::StateMeta},
};

/// Credit ``data`` to its validator, registering a new one if the proof of possession verifies.
/// A deposit with a bad proof of possession for an unknown key is ignored.
pub fn apply_deposit<M: DepositMeta + ?Sized>(
    config: &Config,
    meta: &mut M,
    data: &DepositData,
) -> anyhow::Result<()> {
    if let Some(index) = meta.validator_index(&data.pubkey) {
        meta.increase_balance(index, data.amount)?;
        debug!(index, amount = data.amount, "topped up validator");
        return Ok(());
    }

    // Fork-agnostic domain since deposits are valid across forks
    let domain = compute_domain(DOMAIN_DEPOSIT, config.genesis_fork_version, B256::ZERO);
    let signing_root = compute_signing_root(&data.message(), domain);
    if !bls::verify(&data.pubkey, signing_root, &data.signature) {
        debug!(pubkey = ?data.pubkey, "skipped deposit with invalid proof of possession");
        return Ok(());
    }

    let index = meta.add_new_validator(
        data.pubkey.clone(),
        data.withdrawal_credentials,
        data.amount,
    )?;
    debug!(index, amount = data.amount, "onboarded validator");
    Ok(())
}

pub fn process_deposit<M: DepositMeta + ?Sized>(
    config: &Config,
    meta: &mut M,
    deposit: &Deposit,
) -> Result<(), OperationError<DepositInvalid>> {
    let deposit_index = meta.deposit_index();
    verify!(
        is_valid_merkle_branch(
            deposit.data.tree_hash_root(),
            &deposit.proof,
            // Add 1 for the List length mix-in
            DEPOSIT_CONTRACT_TREE_DEPTH + 1,
            deposit_index,
            meta.deposit_root(),
        ),
        DepositInvalid::BadMerkleProof(deposit_index)
    );

    // Deposits must be processed in order
    meta.increment_deposit_index();
    apply_deposit(config, meta, &deposit.data)?;
    Ok(())
}

/// Process ``deposits`` in order. The block must include every pending deposit, up to
/// ``MAX_DEPOSITS``.
pub fn process_deposits<M: DepositMeta + ?Sized>(
    config: &Config,
    meta: &mut M,
    deposits: &[Deposit],
) -> Result<(), BlockProcessingError> {
    let expected = min(
        config.max_deposits,
        meta.deposit_count().saturating_sub(meta.deposit_index()),
    );
    let found = deposits.len() as u64;
    if found != expected {
        return Err(BlockProcessingError::DepositCountInvalid { expected, found });
    }

    for (index, deposit) in deposits.iter().enumerate() {
        process_deposit(config, meta, deposit).map_err(|err| err.into_with_index(index))?;
    }
    Ok(())
}

impl<S: BorrowMut<BeaconState>> DepositProcessor for StateMeta<'_, S> {
    fn process_deposits(
        &mut self,
        config: &Config,
        deposits: &[Deposit],
    ) -> Result<(), BlockProcessingError> {
        process_deposits(config, self, deposits)
    }
}
