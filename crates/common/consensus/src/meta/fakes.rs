//! Hand-built capability providers for exercising processors without a full state.

use std::cmp::max;

use alloy_primitives::B256;
use anyhow::anyhow;
use beacon_primitives::{Domain, DomainType, Epoch, Gwei, Slot, ValidatorIndex, Version};
use ethereum_hashing::hash_fixed;

use super::{
    ActiveIndices, EffectiveBalances, EpochSeed, Exits, RegistrySize, Validators, Versioning,
};
use crate::{
    attestation::Attestation,
    attester_slashing::AttesterSlashing,
    beacon_block_header::BeaconBlockHeader,
    block_processing::{
        AttestationProcessor, AttesterSlashingProcessor, DepositProcessor, Eth1VoteProcessor,
        HeaderProcessor, ProposerSlashingProcessor, RandaoProcessor, VoluntaryExitProcessor,
    },
    config::Config,
    constants::GENESIS_EPOCH,
    deposit::Deposit,
    errors::BlockProcessingError,
    eth_1_data::Eth1Data,
    misc::{compute_domain, compute_epoch_at_slot},
    proposer_slashing::ProposerSlashing,
    signature::BlsSignature,
    validator::Validator,
    voluntary_exit::SignedVoluntaryExit,
};

type BalanceLookup = Box<dyn Fn(ValidatorIndex) -> Option<Gwei> + Send + Sync>;

/// Clock and fork of a state sitting at ``current_slot``.
#[derive(Debug, Clone)]
pub struct FakeVersioning {
    pub current_slot: Slot,
    pub current_epoch: Epoch,
    pub current_version: Version,
    pub genesis_validators_root: B256,
}

impl FakeVersioning {
    pub fn at_slot(config: &Config, current_slot: Slot) -> Self {
        Self {
            current_slot,
            current_epoch: compute_epoch_at_slot(config, current_slot),
            current_version: config.genesis_fork_version,
            genesis_validators_root: B256::repeat_byte(0x42),
        }
    }
}

impl Versioning for FakeVersioning {
    fn current_slot(&self) -> Slot {
        self.current_slot
    }

    fn current_epoch(&self) -> Epoch {
        self.current_epoch
    }

    fn previous_epoch(&self) -> Epoch {
        max(self.current_epoch, GENESIS_EPOCH + 1) - 1
    }

    fn current_version(&self) -> Version {
        self.current_version
    }

    fn get_domain(&self, domain_type: DomainType, _message_epoch: Epoch) -> Domain {
        compute_domain(
            domain_type,
            self.current_version,
            self.genesis_validators_root,
        )
    }
}

pub struct FakeEffectiveBalances {
    lookup: BalanceLookup,
}

impl FakeEffectiveBalances {
    pub fn new(lookup: impl Fn(ValidatorIndex) -> Option<Gwei> + Send + Sync + 'static) -> Self {
        Self {
            lookup: Box::new(lookup),
        }
    }
}

impl EffectiveBalances for FakeEffectiveBalances {
    fn effective_balance(&self, index: ValidatorIndex) -> Option<Gwei> {
        (self.lookup)(index)
    }

    fn sum_effective_balance_of(&self, indices: &[ValidatorIndex]) -> Gwei {
        max(
            1_000_000_000,
            indices
                .iter()
                .filter_map(|&index| self.effective_balance(index))
                .sum(),
        )
    }
}

/// Everything proposer selection reads: a fixed active set, per-validator balances and a seed
/// that depends only on the epoch and domain.
pub struct FakeProposing {
    pub versioning: FakeVersioning,
    pub active_indices: Vec<ValidatorIndex>,
    pub balances: FakeEffectiveBalances,
}

impl FakeProposing {
    /// ``count`` active validators, all with effective balance ``balance``.
    pub fn uniform(count: u64, balance: Gwei) -> Self {
        Self {
            versioning: FakeVersioning::at_slot(&Config::minimal(), 0),
            active_indices: (0..count).collect(),
            balances: FakeEffectiveBalances::new(move |index| (index < count).then_some(balance)),
        }
    }
}

impl Versioning for FakeProposing {
    fn current_slot(&self) -> Slot {
        self.versioning.current_slot()
    }

    fn current_epoch(&self) -> Epoch {
        self.versioning.current_epoch()
    }

    fn previous_epoch(&self) -> Epoch {
        self.versioning.previous_epoch()
    }

    fn current_version(&self) -> Version {
        self.versioning.current_version()
    }

    fn get_domain(&self, domain_type: DomainType, message_epoch: Epoch) -> Domain {
        self.versioning.get_domain(domain_type, message_epoch)
    }
}

impl ActiveIndices for FakeProposing {
    fn is_active(&self, index: ValidatorIndex, _epoch: Epoch) -> bool {
        self.active_indices.contains(&index)
    }

    fn get_active_validator_indices(&self, _epoch: Epoch) -> Vec<ValidatorIndex> {
        self.active_indices.clone()
    }
}

impl EffectiveBalances for FakeProposing {
    fn effective_balance(&self, index: ValidatorIndex) -> Option<Gwei> {
        self.balances.effective_balance(index)
    }

    fn sum_effective_balance_of(&self, indices: &[ValidatorIndex]) -> Gwei {
        self.balances.sum_effective_balance_of(indices)
    }
}

impl EpochSeed for FakeProposing {
    fn get_seed(&self, epoch: Epoch, domain_type: DomainType) -> B256 {
        B256::from(hash_fixed(
            &[domain_type.as_slice(), &epoch.to_le_bytes()].concat(),
        ))
    }
}

/// A registry that records exit requests instead of running the exit queue.
#[derive(Debug, Clone)]
pub struct FakeExitRegistry {
    pub versioning: FakeVersioning,
    pub validators: Vec<Validator>,
    pub exit_delay: Epoch,
    pub initiated: Vec<(Epoch, ValidatorIndex)>,
}

impl FakeExitRegistry {
    pub fn new(versioning: FakeVersioning, validators: Vec<Validator>) -> Self {
        Self {
            versioning,
            validators,
            exit_delay: 5,
            initiated: vec![],
        }
    }
}

impl Versioning for FakeExitRegistry {
    fn current_slot(&self) -> Slot {
        self.versioning.current_slot()
    }

    fn current_epoch(&self) -> Epoch {
        self.versioning.current_epoch()
    }

    fn previous_epoch(&self) -> Epoch {
        self.versioning.previous_epoch()
    }

    fn current_version(&self) -> Version {
        self.versioning.current_version()
    }

    fn get_domain(&self, domain_type: DomainType, message_epoch: Epoch) -> Domain {
        self.versioning.get_domain(domain_type, message_epoch)
    }
}

impl RegistrySize for FakeExitRegistry {
    fn is_valid_index(&self, index: ValidatorIndex) -> bool {
        (index as usize) < self.validators.len()
    }

    fn validator_count(&self) -> u64 {
        self.validators.len() as u64
    }
}

impl Validators for FakeExitRegistry {
    fn validator(&self, index: ValidatorIndex) -> Option<&Validator> {
        self.validators.get(index as usize)
    }
}

impl Exits for FakeExitRegistry {
    fn initiate_validator_exit(
        &mut self,
        current_epoch: Epoch,
        index: ValidatorIndex,
    ) -> anyhow::Result<()> {
        let validator = self
            .validators
            .get_mut(index as usize)
            .ok_or_else(|| anyhow!("validator {index} is not in the registry"))?;
        validator.exit_epoch = current_epoch + self.exit_delay;
        self.initiated.push((current_epoch, index));
        Ok(())
    }
}

/// Pipeline stage names, in the order the block processor runs them.
pub const STAGES: [&str; 8] = [
    "header",
    "randao",
    "eth1_vote",
    "proposer_slashings",
    "attester_slashings",
    "attestations",
    "deposits",
    "voluntary_exits",
];

/// Records which pipeline stages ran and fails at ``fail_at``.
#[derive(Debug, Default)]
pub struct RecordingProcessor {
    pub stages: Vec<&'static str>,
    pub fail_at: Option<&'static str>,
}

impl RecordingProcessor {
    pub fn failing_at(stage: &'static str) -> Self {
        Self {
            stages: vec![],
            fail_at: Some(stage),
        }
    }

    fn record(&mut self, stage: &'static str) -> Result<(), BlockProcessingError> {
        self.stages.push(stage);
        if self.fail_at == Some(stage) {
            return Err(anyhow!("{stage} rejected").into());
        }
        Ok(())
    }
}

impl HeaderProcessor for RecordingProcessor {
    fn process_header(
        &mut self,
        _config: &Config,
        _header: &BeaconBlockHeader,
    ) -> Result<(), BlockProcessingError> {
        self.record("header")
    }
}

impl RandaoProcessor for RecordingProcessor {
    fn process_randao(
        &mut self,
        _config: &Config,
        _reveal: &BlsSignature,
    ) -> Result<(), BlockProcessingError> {
        self.record("randao")
    }
}

impl Eth1VoteProcessor for RecordingProcessor {
    fn process_eth1_vote(
        &mut self,
        _config: &Config,
        _vote: &Eth1Data,
    ) -> Result<(), BlockProcessingError> {
        self.record("eth1_vote")
    }
}

impl ProposerSlashingProcessor for RecordingProcessor {
    fn process_proposer_slashings(
        &mut self,
        _config: &Config,
        _slashings: &[ProposerSlashing],
    ) -> Result<(), BlockProcessingError> {
        self.record("proposer_slashings")
    }
}

impl AttesterSlashingProcessor for RecordingProcessor {
    fn process_attester_slashings(
        &mut self,
        _config: &Config,
        _slashings: &[AttesterSlashing],
    ) -> Result<(), BlockProcessingError> {
        self.record("attester_slashings")
    }
}

impl AttestationProcessor for RecordingProcessor {
    fn process_attestations(
        &mut self,
        _config: &Config,
        _attestations: &[Attestation],
    ) -> Result<(), BlockProcessingError> {
        self.record("attestations")
    }
}

impl DepositProcessor for RecordingProcessor {
    fn process_deposits(
        &mut self,
        _config: &Config,
        _deposits: &[Deposit],
    ) -> Result<(), BlockProcessingError> {
        self.record("deposits")
    }
}

impl VoluntaryExitProcessor for RecordingProcessor {
    fn process_voluntary_exits(
        &mut self,
        _config: &Config,
        _exits: &[SignedVoluntaryExit],
    ) -> Result<(), BlockProcessingError> {
        self.record("voluntary_exits")
    }
}
