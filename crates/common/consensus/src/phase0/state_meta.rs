use std::borrow::{Borrow, BorrowMut};

use alloy_primitives::B256;
use anyhow::anyhow;
use beacon_primitives::{
    CommitteeIndex, DepositIndex, Domain, DomainType, Epoch, Gwei, Root, Slot, ValidatorIndex,
    Version,
};
use tree_hash::TreeHash;

use super::beacon_state::BeaconState;
use crate::{
    beacon_block_header::BeaconBlockHeader,
    checkpoint::Checkpoint,
    config::Config,
    errors::ProposerSelectionError,
    eth_1_data::Eth1Data,
    meta::{
        ActiveIndices, Balance, BalanceDeltas, BeaconCommittees, CommitteeCount, Deltas,
        Depositing, Deposits, EffectiveBalances, EpochAttestations, EpochSeed, Eth1Voting, Exits,
        Finality, LatestHeader, LatestHeaderUpdate, Onboarding, Proposers, Pubkeys, Randao,
        Randomness, RegistrySize, SlashedIndices, Slasher, Validators, Versioning,
    },
    pending_attestation::PendingAttestation,
    proposing,
    pubkey::PubKey,
    validator::Validator,
};

/// The beacon state seen through its capabilities, under a fixed configuration.
///
/// `S` is either `&BeaconState` for read-only use or `&mut BeaconState` (or an owned state) when
/// the write capabilities are needed.
pub struct StateMeta<'c, S> {
    config: &'c Config,
    state: S,
}

impl<'c, S: Borrow<BeaconState>> StateMeta<'c, S> {
    pub fn new(config: &'c Config, state: S) -> Self {
        Self { config, state }
    }

    pub fn config(&self) -> &'c Config {
        self.config
    }

    pub fn state(&self) -> &BeaconState {
        self.state.borrow()
    }

    pub fn into_inner(self) -> S {
        self.state
    }
}

impl<S: BorrowMut<BeaconState>> StateMeta<'_, S> {
    pub fn state_mut(&mut self) -> &mut BeaconState {
        self.state.borrow_mut()
    }
}

impl<S: Borrow<BeaconState>> Versioning for StateMeta<'_, S> {
    fn current_slot(&self) -> Slot {
        self.state().slot
    }

    fn current_epoch(&self) -> Epoch {
        self.state().get_current_epoch(self.config)
    }

    fn previous_epoch(&self) -> Epoch {
        self.state().get_previous_epoch(self.config)
    }

    fn current_version(&self) -> Version {
        self.state().fork.current_version
    }

    fn get_domain(&self, domain_type: DomainType, message_epoch: Epoch) -> Domain {
        self.state().get_domain(domain_type, message_epoch)
    }
}

impl<S: Borrow<BeaconState>> RegistrySize for StateMeta<'_, S> {
    fn is_valid_index(&self, index: ValidatorIndex) -> bool {
        index < self.validator_count()
    }

    fn validator_count(&self) -> u64 {
        self.state().validators.len() as u64
    }
}

impl<S: Borrow<BeaconState>> Validators for StateMeta<'_, S> {
    fn validator(&self, index: ValidatorIndex) -> Option<&Validator> {
        self.state().validators.get(index as usize)
    }
}

impl<S: Borrow<BeaconState>> Pubkeys for StateMeta<'_, S> {
    fn pubkey(&self, index: ValidatorIndex) -> Option<&PubKey> {
        self.validator(index).map(|validator| &validator.pubkey)
    }

    fn validator_index(&self, pubkey: &PubKey) -> Option<ValidatorIndex> {
        self.state()
            .validators
            .iter()
            .position(|validator| validator.pubkey == *pubkey)
            .map(|index| index as ValidatorIndex)
    }
}

impl<S: BorrowMut<BeaconState>> Balance for StateMeta<'_, S> {
    fn get_balance(&self, index: ValidatorIndex) -> anyhow::Result<Gwei> {
        self.state()
            .balances
            .get(index as usize)
            .copied()
            .ok_or_else(|| anyhow!("no balance for validator {index}"))
    }

    fn increase_balance(&mut self, index: ValidatorIndex, delta: Gwei) -> anyhow::Result<()> {
        self.state_mut().increase_balance(index, delta)
    }

    fn decrease_balance(&mut self, index: ValidatorIndex, delta: Gwei) -> anyhow::Result<()> {
        self.state_mut().decrease_balance(index, delta)
    }
}

impl<S: BorrowMut<BeaconState>> BalanceDeltas for StateMeta<'_, S> {
    fn apply_deltas(&mut self, deltas: &Deltas) -> anyhow::Result<()> {
        let state = self.state_mut();
        anyhow::ensure!(
            deltas.rewards.len() == state.balances.len()
                && deltas.penalties.len() == state.balances.len(),
            "deltas cover {} validators, registry has {}",
            deltas.rewards.len(),
            state.balances.len()
        );
        for (index, (reward, penalty)) in deltas.rewards.iter().zip(&deltas.penalties).enumerate()
        {
            state.increase_balance(index as ValidatorIndex, *reward)?;
            state.decrease_balance(index as ValidatorIndex, *penalty)?;
        }
        Ok(())
    }
}

impl<S: Borrow<BeaconState>> EffectiveBalances for StateMeta<'_, S> {
    fn effective_balance(&self, index: ValidatorIndex) -> Option<Gwei> {
        self.validator(index).map(|validator| validator.effective_balance)
    }

    fn sum_effective_balance_of(&self, indices: &[ValidatorIndex]) -> Gwei {
        self.state().get_total_balance(self.config, indices)
    }
}

impl<S: Borrow<BeaconState>> Finality for StateMeta<'_, S> {
    fn finalized_checkpoint(&self) -> Checkpoint {
        self.state().finalized_checkpoint
    }

    fn current_justified_checkpoint(&self) -> Checkpoint {
        self.state().current_justified_checkpoint
    }

    fn previous_justified_checkpoint(&self) -> Checkpoint {
        self.state().previous_justified_checkpoint
    }
}

impl<S: Borrow<BeaconState>> SlashedIndices for StateMeta<'_, S> {
    fn is_slashed(&self, index: ValidatorIndex) -> bool {
        self.validator(index).is_some_and(|validator| validator.slashed)
    }

    fn filter_unslashed(&self, indices: &[ValidatorIndex]) -> Vec<ValidatorIndex> {
        indices
            .iter()
            .copied()
            .filter(|&index| !self.is_slashed(index))
            .collect()
    }
}

impl<S: BorrowMut<BeaconState>> Slasher for StateMeta<'_, S> {
    fn slash_validator(
        &mut self,
        index: ValidatorIndex,
        whistleblower: Option<ValidatorIndex>,
    ) -> anyhow::Result<()> {
        let config = self.config;
        self.state_mut().slash_validator(config, index, whistleblower)
    }
}

impl<S: BorrowMut<BeaconState>> Exits for StateMeta<'_, S> {
    fn initiate_validator_exit(
        &mut self,
        current_epoch: Epoch,
        index: ValidatorIndex,
    ) -> anyhow::Result<()> {
        let config = self.config;
        self.state_mut()
            .initiate_validator_exit(config, current_epoch, index)
    }
}

impl<S: Borrow<BeaconState>> ActiveIndices for StateMeta<'_, S> {
    fn is_active(&self, index: ValidatorIndex, epoch: Epoch) -> bool {
        self.validator(index)
            .is_some_and(|validator| validator.is_active(epoch))
    }

    fn get_active_validator_indices(&self, epoch: Epoch) -> Vec<ValidatorIndex> {
        self.state().get_active_validator_indices(epoch)
    }
}

impl<S: Borrow<BeaconState>> EpochSeed for StateMeta<'_, S> {
    fn get_seed(&self, epoch: Epoch, domain_type: DomainType) -> B256 {
        self.state().get_seed(self.config, epoch, domain_type)
    }
}

impl<S: Borrow<BeaconState>> Proposers for StateMeta<'_, S> {
    fn get_beacon_proposer_index(
        &self,
        slot: Slot,
    ) -> Result<ValidatorIndex, ProposerSelectionError> {
        proposing::get_beacon_proposer_index(self.config, self, slot)
    }
}

impl<S: Borrow<BeaconState>> CommitteeCount for StateMeta<'_, S> {
    fn get_committee_count_per_slot(&self, epoch: Epoch) -> u64 {
        self.state().get_committee_count_per_slot(self.config, epoch)
    }
}

impl<S: Borrow<BeaconState>> BeaconCommittees for StateMeta<'_, S> {
    fn get_beacon_committee(
        &self,
        slot: Slot,
        index: CommitteeIndex,
    ) -> anyhow::Result<Vec<ValidatorIndex>> {
        self.state().get_beacon_committee(self.config, slot, index)
    }
}

impl<S: BorrowMut<BeaconState>> EpochAttestations for StateMeta<'_, S> {
    fn append_current_epoch_attestation(
        &mut self,
        attestation: PendingAttestation,
    ) -> anyhow::Result<()> {
        self.state_mut()
            .current_epoch_attestations
            .push(attestation)
            .map_err(|err| anyhow!("Couldn't push to current epoch attestations {err:?}"))
    }

    fn append_previous_epoch_attestation(
        &mut self,
        attestation: PendingAttestation,
    ) -> anyhow::Result<()> {
        self.state_mut()
            .previous_epoch_attestations
            .push(attestation)
            .map_err(|err| anyhow!("Couldn't push to previous epoch attestations {err:?}"))
    }
}

impl<S: Borrow<BeaconState>> Randomness for StateMeta<'_, S> {
    fn get_randao_mix(&self, epoch: Epoch) -> B256 {
        self.state().get_randao_mix(self.config, epoch)
    }
}

impl<S: BorrowMut<BeaconState>> Randao for StateMeta<'_, S> {
    fn set_randao_mix(&mut self, epoch: Epoch, mix: B256) {
        let config = self.config;
        self.state_mut().set_randao_mix(config, epoch, mix);
    }
}

impl<S: BorrowMut<BeaconState>> Eth1Voting for StateMeta<'_, S> {
    fn eth1_data(&self) -> &Eth1Data {
        &self.state().eth1_data
    }

    fn count_eth1_votes(&self, vote: &Eth1Data) -> u64 {
        self.state()
            .eth1_data_votes
            .iter()
            .filter(|&existing| existing == vote)
            .count() as u64
    }

    fn push_eth1_vote(&mut self, vote: Eth1Data) -> anyhow::Result<()> {
        self.state_mut()
            .eth1_data_votes
            .push(vote)
            .map_err(|err| anyhow!("Couldn't push to eth1 data votes {err:?}"))
    }

    fn set_eth1_data(&mut self, data: Eth1Data) {
        self.state_mut().eth1_data = data;
    }
}

impl<S: Borrow<BeaconState>> Deposits for StateMeta<'_, S> {
    fn deposit_index(&self) -> DepositIndex {
        self.state().eth1_deposit_index
    }

    fn deposit_count(&self) -> u64 {
        self.state().eth1_data.deposit_count
    }

    fn deposit_root(&self) -> Root {
        self.state().eth1_data.deposit_root
    }
}

impl<S: BorrowMut<BeaconState>> Depositing for StateMeta<'_, S> {
    fn increment_deposit_index(&mut self) {
        self.state_mut().eth1_deposit_index += 1;
    }
}

impl<S: BorrowMut<BeaconState>> Onboarding for StateMeta<'_, S> {
    fn add_new_validator(
        &mut self,
        pubkey: PubKey,
        withdrawal_credentials: B256,
        amount: Gwei,
    ) -> anyhow::Result<ValidatorIndex> {
        let config = self.config;
        self.state_mut()
            .add_validator_to_registry(config, pubkey, withdrawal_credentials, amount)
    }
}

impl<S: Borrow<BeaconState>> LatestHeader for StateMeta<'_, S> {
    fn latest_header_slot(&self) -> Slot {
        self.state().latest_block_header.slot
    }

    /// Slot processing fills in the header's state root before the next block is applied.
    fn latest_header_root(&self) -> Root {
        self.state().latest_block_header.tree_hash_root()
    }
}

impl<S: BorrowMut<BeaconState>> LatestHeaderUpdate for StateMeta<'_, S> {
    fn update_latest_header(&mut self, header: BeaconBlockHeader) {
        self.state_mut().latest_block_header = header;
    }
}
