//! Narrow views of the beacon state.
//!
//! Every processor states the smallest set of capabilities it needs, so it can be driven by the
//! real state as well as by hand-built fakes, and cannot reach state outside its declared
//! authority. The role traits at the bottom are unions of the primitive capabilities and are
//! implemented for every type that provides the union.

#[cfg(test)]
pub mod fakes;

use alloy_primitives::B256;
use beacon_primitives::{
    CommitteeIndex, DepositIndex, Domain, DomainType, Epoch, Gwei, Root, Slot, ValidatorIndex,
    Version,
};

use crate::{
    beacon_block_header::BeaconBlockHeader, checkpoint::Checkpoint, errors::ProposerSelectionError,
    eth_1_data::Eth1Data, pending_attestation::PendingAttestation, pubkey::PubKey,
    validator::Validator,
};

pub trait Versioning {
    fn current_slot(&self) -> Slot;
    fn current_epoch(&self) -> Epoch;
    fn previous_epoch(&self) -> Epoch;
    fn current_version(&self) -> Version;
    /// Signature domain of ``domain_type`` for a message of ``message_epoch``.
    fn get_domain(&self, domain_type: DomainType, message_epoch: Epoch) -> Domain;
}

pub trait RegistrySize {
    fn is_valid_index(&self, index: ValidatorIndex) -> bool;
    fn validator_count(&self) -> u64;
}

pub trait Validators {
    fn validator(&self, index: ValidatorIndex) -> Option<&Validator>;
}

pub trait Pubkeys {
    fn pubkey(&self, index: ValidatorIndex) -> Option<&PubKey>;
    /// Registry position of ``pubkey``. Scans the registry.
    fn validator_index(&self, pubkey: &PubKey) -> Option<ValidatorIndex>;
}

/// Raw balances. Updates saturate instead of overflowing or going below zero.
pub trait Balance {
    fn get_balance(&self, index: ValidatorIndex) -> anyhow::Result<Gwei>;
    fn increase_balance(&mut self, index: ValidatorIndex, delta: Gwei) -> anyhow::Result<()>;
    fn decrease_balance(&mut self, index: ValidatorIndex, delta: Gwei) -> anyhow::Result<()>;
}

/// Per-validator rewards and penalties, as produced by epoch processing.
#[derive(Debug, Default, PartialEq, Eq, Clone)]
pub struct Deltas {
    pub rewards: Vec<Gwei>,
    pub penalties: Vec<Gwei>,
}

impl Deltas {
    pub fn new(validator_count: usize) -> Self {
        Self {
            rewards: vec![0; validator_count],
            penalties: vec![0; validator_count],
        }
    }
}

pub trait BalanceDeltas {
    fn apply_deltas(&mut self, deltas: &Deltas) -> anyhow::Result<()>;
}

pub trait EffectiveBalances {
    fn effective_balance(&self, index: ValidatorIndex) -> Option<Gwei>;
    /// Combined effective balance of ``indices``, never below one balance increment.
    fn sum_effective_balance_of(&self, indices: &[ValidatorIndex]) -> Gwei;
}

pub trait Finality {
    fn finalized_checkpoint(&self) -> Checkpoint;
    fn current_justified_checkpoint(&self) -> Checkpoint;
    fn previous_justified_checkpoint(&self) -> Checkpoint;
}

pub trait SlashedIndices {
    fn is_slashed(&self, index: ValidatorIndex) -> bool;
    fn filter_unslashed(&self, indices: &[ValidatorIndex]) -> Vec<ValidatorIndex>;
}

pub trait Slasher {
    /// Slash ``index``, rewarding the block proposer and ``whistleblower`` (the proposer when
    /// absent).
    fn slash_validator(
        &mut self,
        index: ValidatorIndex,
        whistleblower: Option<ValidatorIndex>,
    ) -> anyhow::Result<()>;
}

pub trait Exits {
    /// Queue the exit of ``index`` as seen from ``current_epoch``. Does nothing if the exit is
    /// already scheduled.
    fn initiate_validator_exit(
        &mut self,
        current_epoch: Epoch,
        index: ValidatorIndex,
    ) -> anyhow::Result<()>;
}

pub trait ActiveIndices {
    fn is_active(&self, index: ValidatorIndex, epoch: Epoch) -> bool;
    /// Active validators at ``epoch``, in registry order. Scans the registry.
    fn get_active_validator_indices(&self, epoch: Epoch) -> Vec<ValidatorIndex>;
}

pub trait EpochSeed {
    fn get_seed(&self, epoch: Epoch, domain_type: DomainType) -> B256;
}

pub trait Proposers {
    fn get_beacon_proposer_index(
        &self,
        slot: Slot,
    ) -> Result<ValidatorIndex, ProposerSelectionError>;
}

pub trait CommitteeCount {
    fn get_committee_count_per_slot(&self, epoch: Epoch) -> u64;
}

pub trait BeaconCommittees {
    fn get_beacon_committee(
        &self,
        slot: Slot,
        index: CommitteeIndex,
    ) -> anyhow::Result<Vec<ValidatorIndex>>;
}

pub trait EpochAttestations {
    fn append_current_epoch_attestation(
        &mut self,
        attestation: PendingAttestation,
    ) -> anyhow::Result<()>;
    fn append_previous_epoch_attestation(
        &mut self,
        attestation: PendingAttestation,
    ) -> anyhow::Result<()>;
}

pub trait Randomness {
    fn get_randao_mix(&self, epoch: Epoch) -> B256;
}

pub trait Randao {
    fn set_randao_mix(&mut self, epoch: Epoch, mix: B256);
}

pub trait Eth1Voting {
    fn eth1_data(&self) -> &Eth1Data;
    fn count_eth1_votes(&self, vote: &Eth1Data) -> u64;
    fn push_eth1_vote(&mut self, vote: Eth1Data) -> anyhow::Result<()>;
    fn set_eth1_data(&mut self, data: Eth1Data);
}

pub trait Deposits {
    fn deposit_index(&self) -> DepositIndex;
    fn deposit_count(&self) -> u64;
    fn deposit_root(&self) -> Root;
}

pub trait Depositing {
    fn increment_deposit_index(&mut self);
}

pub trait Onboarding {
    fn add_new_validator(
        &mut self,
        pubkey: PubKey,
        withdrawal_credentials: B256,
        amount: Gwei,
    ) -> anyhow::Result<ValidatorIndex>;
}

pub trait LatestHeader {
    fn latest_header_slot(&self) -> Slot;
    fn latest_header_root(&self) -> Root;
}

pub trait LatestHeaderUpdate {
    fn update_latest_header(&mut self, header: BeaconBlockHeader);
}

macro_rules! capability_role {
    ($(#[$attr:meta])* $role:ident: $first:ident $(+ $rest:ident)*) => {
        $(#[$attr])*
        pub trait $role: $first $(+ $rest)* {}

        impl<T: $first $(+ $rest)* + ?Sized> $role for T {}
    };
}

capability_role!(
    /// What the block header check needs.
    HeaderMeta: Versioning + LatestHeader + LatestHeaderUpdate + Proposers + SlashedIndices
);
capability_role!(RandaoMeta: Versioning + Proposers + Pubkeys + Randomness + Randao);
capability_role!(Eth1VoteMeta: Eth1Voting);
capability_role!(ProposerSlashingMeta: Versioning + RegistrySize + Validators + Slasher);
capability_role!(AttesterSlashingMeta: Versioning + Validators + Pubkeys + Slasher);
capability_role!(
    AttestationMeta: Versioning
        + Finality
        + CommitteeCount
        + BeaconCommittees
        + Pubkeys
        + Proposers
        + EpochAttestations
);
capability_role!(DepositMeta: Deposits + Depositing + Pubkeys + Balance + Onboarding);
capability_role!(
    /// What voluntary exit processing needs.
    VoluntaryExitMeta: Versioning + RegistrySize + Validators + Exits
);
capability_role!(
    /// What proposer selection needs.
    ProposingMeta: Versioning + ActiveIndices + EffectiveBalances + EpochSeed
);
