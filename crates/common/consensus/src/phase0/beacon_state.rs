use std::cmp::max;

use alloy_primitives::B256;
use anyhow::{anyhow, ensure};
use beacon_primitives::{
    CommitteeIndex, Domain, DomainType, Epoch, Gwei, Slot, ValidatorIndex,
};
use ethereum_hashing::hash_fixed;
use serde::{Deserialize, Serialize};
use ssz_derive::{Decode, Encode};
use ssz_types::{
    typenum::{U1099511627776, U16777216, U2048, U4, U4096, U65536, U8192},
    BitVector, FixedVector, VariableList,
};
use tracing::debug;
use tree_hash_derive::TreeHash;

use super::state_meta::StateMeta;
use crate::{
    beacon_block_header::BeaconBlockHeader,
    checkpoint::Checkpoint,
    config::Config,
    constants::{DOMAIN_BEACON_ATTESTER, FAR_FUTURE_EPOCH, GENESIS_EPOCH},
    errors::ProposerSelectionError,
    eth_1_data::Eth1Data,
    fork::Fork,
    helpers::get_validator_from_deposit,
    misc::{
        compute_activation_exit_epoch, compute_committee, compute_domain, compute_epoch_at_slot,
    },
    pending_attestation::PendingAttestation,
    proposing,
    pubkey::PubKey,
    validator::Validator,
};

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize, Encode, Decode, TreeHash)]
pub struct BeaconState {
    // Versioning
    pub genesis_time: u64,
    pub genesis_validators_root: B256,
    pub slot: Slot,
    pub fork: Fork,

    // History
    pub latest_block_header: BeaconBlockHeader,
    pub block_roots: FixedVector<B256, U8192>,
    pub state_roots: FixedVector<B256, U8192>,
    pub historical_roots: VariableList<B256, U16777216>,

    // Eth1
    pub eth1_data: Eth1Data,
    pub eth1_data_votes: VariableList<Eth1Data, U2048>,
    pub eth1_deposit_index: u64,

    // Registry
    pub validators: VariableList<Validator, U1099511627776>,
    #[serde(deserialize_with = "ssz_types::serde_utils::quoted_u64_var_list::deserialize")]
    pub balances: VariableList<Gwei, U1099511627776>,

    // Randomness
    pub randao_mixes: FixedVector<B256, U65536>,

    // Slashings
    #[serde(deserialize_with = "ssz_types::serde_utils::quoted_u64_fixed_vec::deserialize")]
    pub slashings: FixedVector<Gwei, U8192>,

    // Attestations
    pub previous_epoch_attestations: VariableList<PendingAttestation, U4096>,
    pub current_epoch_attestations: VariableList<PendingAttestation, U4096>,

    // Finality
    pub justification_bits: BitVector<U4>,
    pub previous_justified_checkpoint: Checkpoint,
    pub current_justified_checkpoint: Checkpoint,
    pub finalized_checkpoint: Checkpoint,
}

impl BeaconState {
    /// Return the current epoch.
    pub fn get_current_epoch(&self, config: &Config) -> Epoch {
        compute_epoch_at_slot(config, self.slot)
    }

    /// Return the previous epoch (unless the current epoch is ``GENESIS_EPOCH``).
    pub fn get_previous_epoch(&self, config: &Config) -> Epoch {
        let current_epoch = self.get_current_epoch(config);
        if current_epoch == GENESIS_EPOCH {
            GENESIS_EPOCH
        } else {
            current_epoch - 1
        }
    }

    /// Return the randao mix at a recent ``epoch``.
    pub fn get_randao_mix(&self, config: &Config, epoch: Epoch) -> B256 {
        self.randao_mixes[(epoch % config.epochs_per_historical_vector) as usize]
    }

    pub fn set_randao_mix(&mut self, config: &Config, epoch: Epoch, mix: B256) {
        self.randao_mixes[(epoch % config.epochs_per_historical_vector) as usize] = mix;
    }

    /// Return the sequence of active validator indices at ``epoch``.
    pub fn get_active_validator_indices(&self, epoch: Epoch) -> Vec<ValidatorIndex> {
        self.validators
            .iter()
            .enumerate()
            .filter_map(|(i, v)| v.is_active(epoch).then_some(i as ValidatorIndex))
            .collect()
    }

    /// Return the validator churn limit at ``epoch``.
    pub fn get_validator_churn_limit(&self, config: &Config, epoch: Epoch) -> u64 {
        let active_validator_count = self.get_active_validator_indices(epoch).len() as u64;
        max(
            config.min_per_epoch_churn_limit,
            active_validator_count / config.churn_limit_quotient,
        )
    }

    /// Return the seed at ``epoch``.
    pub fn get_seed(&self, config: &Config, epoch: Epoch, domain_type: DomainType) -> B256 {
        let mix = self.get_randao_mix(
            config,
            epoch + config.epochs_per_historical_vector - config.min_seed_lookahead - 1,
        );
        let epoch_with_index =
            [domain_type.as_slice(), &epoch.to_le_bytes(), mix.as_slice()].concat();
        B256::from(hash_fixed(&epoch_with_index))
    }

    /// Return the number of committees in each slot for the given ``epoch``.
    pub fn get_committee_count_per_slot(&self, config: &Config, epoch: Epoch) -> u64 {
        (self.get_active_validator_indices(epoch).len() as u64
            / config.slots_per_epoch
            / config.target_committee_size)
            .clamp(1, config.max_committees_per_slot)
    }

    /// Return the beacon committee at ``slot`` for ``index``.
    pub fn get_beacon_committee(
        &self,
        config: &Config,
        slot: Slot,
        index: CommitteeIndex,
    ) -> anyhow::Result<Vec<ValidatorIndex>> {
        let epoch = compute_epoch_at_slot(config, slot);
        let committees_per_slot = self.get_committee_count_per_slot(config, epoch);
        ensure!(
            index < committees_per_slot,
            "committee index {index} is not below committee count {committees_per_slot}"
        );
        compute_committee(
            &self.get_active_validator_indices(epoch),
            self.get_seed(config, epoch, DOMAIN_BEACON_ATTESTER),
            (slot % config.slots_per_epoch) * committees_per_slot + index,
            committees_per_slot * config.slots_per_epoch,
            config.shuffle_round_count,
        )
        .ok_or_else(|| anyhow!("committee {index} at slot {slot} is out of range"))
    }

    /// Return the beacon proposer index at ``slot``.
    pub fn get_beacon_proposer_index(
        &self,
        config: &Config,
        slot: Slot,
    ) -> Result<ValidatorIndex, ProposerSelectionError> {
        proposing::get_beacon_proposer_index(config, &StateMeta::new(config, self), slot)
    }

    /// Return the combined effective balance of the ``indices``.
    /// ``EFFECTIVE_BALANCE_INCREMENT`` Gwei minimum to avoid divisions by zero.
    pub fn get_total_balance(&self, config: &Config, indices: &[ValidatorIndex]) -> Gwei {
        max(
            config.effective_balance_increment,
            indices
                .iter()
                .filter_map(|&index| self.validators.get(index as usize))
                .map(|validator| validator.effective_balance)
                .sum(),
        )
    }

    /// Return the signature domain (fork version concatenated with domain type) of a message.
    pub fn get_domain(&self, domain_type: DomainType, epoch: Epoch) -> Domain {
        compute_domain(
            domain_type,
            self.fork.version_at(epoch),
            self.genesis_validators_root,
        )
    }

    /// Increase the validator balance at index ``index`` by ``delta``.
    pub fn increase_balance(&mut self, index: ValidatorIndex, delta: Gwei) -> anyhow::Result<()> {
        let balance = self
            .balances
            .get_mut(index as usize)
            .ok_or_else(|| anyhow!("no balance for validator {index}"))?;
        *balance = balance.saturating_add(delta);
        Ok(())
    }

    /// Decrease the validator balance at index ``index`` by ``delta`` with underflow protection.
    pub fn decrease_balance(&mut self, index: ValidatorIndex, delta: Gwei) -> anyhow::Result<()> {
        let balance = self
            .balances
            .get_mut(index as usize)
            .ok_or_else(|| anyhow!("no balance for validator {index}"))?;
        *balance = balance.saturating_sub(delta);
        Ok(())
    }

    /// First epoch with room under the churn limit for an exit initiated at ``current_epoch``.
    pub fn compute_exit_queue_epoch(&self, config: &Config, current_epoch: Epoch) -> Epoch {
        let mut exit_queue_epoch = self
            .validators
            .iter()
            .map(|v| v.exit_epoch)
            .filter(|&exit_epoch| exit_epoch != FAR_FUTURE_EPOCH)
            .fold(
                compute_activation_exit_epoch(config, current_epoch),
                max,
            );
        let exit_queue_churn = self
            .validators
            .iter()
            .filter(|v| v.exit_epoch == exit_queue_epoch)
            .count() as u64;
        if exit_queue_churn >= self.get_validator_churn_limit(config, current_epoch) {
            exit_queue_epoch += 1;
        }
        exit_queue_epoch
    }

    /// Initiate the exit of the validator with index ``index``. Does nothing if an exit is already
    /// scheduled.
    pub fn initiate_validator_exit(
        &mut self,
        config: &Config,
        current_epoch: Epoch,
        index: ValidatorIndex,
    ) -> anyhow::Result<()> {
        let exit_epoch = self
            .validators
            .get(index as usize)
            .ok_or_else(|| anyhow!("validator {index} is not in the registry"))?
            .exit_epoch;
        if exit_epoch != FAR_FUTURE_EPOCH {
            return Ok(());
        }

        let exit_queue_epoch = self.compute_exit_queue_epoch(config, current_epoch);
        let validator = self
            .validators
            .get_mut(index as usize)
            .ok_or_else(|| anyhow!("validator {index} is not in the registry"))?;
        validator.exit_epoch = exit_queue_epoch;
        validator.withdrawable_epoch =
            exit_queue_epoch.saturating_add(config.min_validator_withdrawability_delay);
        debug!(index, exit_epoch = exit_queue_epoch, "queued validator exit");
        Ok(())
    }

    /// Slash the validator with index ``slashed_index``.
    pub fn slash_validator(
        &mut self,
        config: &Config,
        slashed_index: ValidatorIndex,
        whistleblower_index: Option<ValidatorIndex>,
    ) -> anyhow::Result<()> {
        let epoch = self.get_current_epoch(config);
        self.initiate_validator_exit(config, epoch, slashed_index)?;

        let validator = self
            .validators
            .get_mut(slashed_index as usize)
            .ok_or_else(|| anyhow!("validator {slashed_index} is not in the registry"))?;
        validator.slashed = true;
        validator.withdrawable_epoch = max(
            validator.withdrawable_epoch,
            epoch + config.epochs_per_slashings_vector,
        );
        let effective_balance = validator.effective_balance;

        let slashings_index = (epoch % config.epochs_per_slashings_vector) as usize;
        self.slashings[slashings_index] =
            self.slashings[slashings_index].saturating_add(effective_balance);
        self.decrease_balance(
            slashed_index,
            effective_balance / config.min_slashing_penalty_quotient,
        )?;

        let proposer_index = self.get_beacon_proposer_index(config, self.slot)?;
        let whistleblower_index = whistleblower_index.unwrap_or(proposer_index);
        let whistleblower_reward = effective_balance / config.whistleblower_reward_quotient;
        let proposer_reward = whistleblower_reward / config.proposer_reward_quotient;
        self.increase_balance(proposer_index, proposer_reward)?;
        self.increase_balance(whistleblower_index, whistleblower_reward - proposer_reward)?;

        debug!(
            slashed_index,
            proposer_index, whistleblower_index, effective_balance, "slashed validator"
        );
        Ok(())
    }

    /// Append a validator built from a deposit to the registry and return its index.
    pub fn add_validator_to_registry(
        &mut self,
        config: &Config,
        pubkey: PubKey,
        withdrawal_credentials: B256,
        amount: Gwei,
    ) -> anyhow::Result<ValidatorIndex> {
        let index = self.validators.len() as ValidatorIndex;
        ensure!(
            self.balances.len() as u64 == index,
            "registry has {index} validators but {} balances",
            self.balances.len()
        );
        self.validators
            .push(get_validator_from_deposit(
                config,
                pubkey,
                withdrawal_credentials,
                amount,
            ))
            .map_err(|err| anyhow!("Couldn't push to validators {err:?}"))?;
        self.balances
            .push(amount)
            .map_err(|err| anyhow!("Couldn't push to balances {err:?}"))?;
        Ok(index)
    }
}
