//! Block processing: one processor per block stage, run in a fixed order by
//! [`BlockProcessFeature::process`].

pub mod attestations;
pub mod attester_slashing;
pub mod deposits;
pub mod eth1;
pub mod exits;
pub mod header;
pub mod proposer_slashing;
pub mod randao;

use alloy_primitives::B256;
use beacon_primitives::{Root, Slot, Version};
use tracing::{debug, trace};
use tree_hash::TreeHash;

use crate::{
    attestation::Attestation,
    attester_slashing::AttesterSlashing,
    beacon_block_header::BeaconBlockHeader,
    bls,
    config::Config,
    constants::DOMAIN_BEACON_PROPOSER,
    deposit::Deposit,
    errors::BlockProcessingError,
    eth_1_data::Eth1Data,
    misc::{compute_domain, compute_epoch_at_slot, compute_signing_root},
    operations::OperationList,
    phase0::{beacon_block::SignedBeaconBlock, beacon_state::BeaconState, state_meta::StateMeta},
    proposer_slashing::ProposerSlashing,
    pubkey::PubKey,
    signature::BlsSignature,
    voluntary_exit::SignedVoluntaryExit,
};

pub trait HeaderProcessor {
    fn process_header(
        &mut self,
        config: &Config,
        header: &BeaconBlockHeader,
    ) -> Result<(), BlockProcessingError>;
}

pub trait RandaoProcessor {
    fn process_randao(
        &mut self,
        config: &Config,
        reveal: &BlsSignature,
    ) -> Result<(), BlockProcessingError>;
}

pub trait Eth1VoteProcessor {
    fn process_eth1_vote(
        &mut self,
        config: &Config,
        vote: &Eth1Data,
    ) -> Result<(), BlockProcessingError>;
}

pub trait ProposerSlashingProcessor {
    fn process_proposer_slashings(
        &mut self,
        config: &Config,
        slashings: &[ProposerSlashing],
    ) -> Result<(), BlockProcessingError>;
}

pub trait AttesterSlashingProcessor {
    fn process_attester_slashings(
        &mut self,
        config: &Config,
        slashings: &[AttesterSlashing],
    ) -> Result<(), BlockProcessingError>;
}

pub trait AttestationProcessor {
    fn process_attestations(
        &mut self,
        config: &Config,
        attestations: &[Attestation],
    ) -> Result<(), BlockProcessingError>;
}

pub trait DepositProcessor {
    fn process_deposits(
        &mut self,
        config: &Config,
        deposits: &[Deposit],
    ) -> Result<(), BlockProcessingError>;
}

pub trait VoluntaryExitProcessor {
    fn process_voluntary_exits(
        &mut self,
        config: &Config,
        exits: &[SignedVoluntaryExit],
    ) -> Result<(), BlockProcessingError>;
}

/// Everything needed to apply a whole block.
pub trait BlockProcessor:
    HeaderProcessor
    + RandaoProcessor
    + Eth1VoteProcessor
    + ProposerSlashingProcessor
    + AttesterSlashingProcessor
    + AttestationProcessor
    + DepositProcessor
    + VoluntaryExitProcessor
{
}

impl<T> BlockProcessor for T where
    T: HeaderProcessor
        + RandaoProcessor
        + Eth1VoteProcessor
        + ProposerSlashingProcessor
        + AttesterSlashingProcessor
        + AttestationProcessor
        + DepositProcessor
        + VoluntaryExitProcessor
        + ?Sized
{
}

/// A signed block as input to block processing.
#[derive(Debug, Clone, Copy)]
pub struct BlockProcessFeature<'a> {
    block: &'a SignedBeaconBlock,
}

impl<'a> BlockProcessFeature<'a> {
    pub fn new(block: &'a SignedBeaconBlock) -> Self {
        Self { block }
    }

    pub fn slot(&self) -> Slot {
        self.block.message.slot
    }

    pub fn state_root(&self) -> Root {
        self.block.message.state_root
    }

    pub fn parent_root(&self) -> Root {
        self.block.message.parent_root
    }

    /// Hash tree root of the block message. Recomputed on every call.
    pub fn block_root(&self) -> Root {
        self.block.message.tree_hash_root()
    }

    pub fn signature(&self) -> &'a BlsSignature {
        &self.block.signature
    }

    /// Check the post-state root declared by the block against ``expected``.
    pub fn verify_state_root(&self, expected: Root) -> bool {
        self.state_root() == expected
    }

    /// Verify the block signature by ``pubkey`` under the proposer domain of ``fork_version``.
    pub fn verify_signature(
        &self,
        pubkey: &PubKey,
        fork_version: Version,
        genesis_validators_root: B256,
    ) -> bool {
        let domain = compute_domain(DOMAIN_BEACON_PROPOSER, fork_version, genesis_validators_root);
        let signing_root = compute_signing_root(&self.block.message, domain);
        bls::verify(pubkey, signing_root, self.signature())
    }

    /// Check every operation list of the body against its configured limit.
    pub fn verify_structure(&self, config: &Config) -> Result<(), BlockProcessingError> {
        let body = &self.block.message.body;
        body.proposer_slashings.verify_limit(config)?;
        body.attester_slashings.verify_limit(config)?;
        body.attestations.verify_limit(config)?;
        body.deposits.verify_limit(config)?;
        body.voluntary_exits.verify_limit(config)?;
        Ok(())
    }

    /// Run every block stage against ``processor``, stopping at the first failure. Stages that
    /// already ran keep their effects.
    pub fn process<P: BlockProcessor + ?Sized>(
        &self,
        config: &Config,
        processor: &mut P,
    ) -> Result<(), BlockProcessingError> {
        self.verify_structure(config)?;

        let block = &self.block.message;
        let body = &block.body;
        let slot = block.slot;

        trace!(slot, "processing block header");
        processor.process_header(config, &block.header())?;
        trace!(slot, "processing randao reveal");
        processor.process_randao(config, &body.randao_reveal)?;
        trace!(slot, "processing eth1 vote");
        processor.process_eth1_vote(config, &body.eth1_data)?;
        trace!(slot, count = body.proposer_slashings.len(), "processing proposer slashings");
        processor.process_proposer_slashings(config, &body.proposer_slashings)?;
        trace!(slot, count = body.attester_slashings.len(), "processing attester slashings");
        processor.process_attester_slashings(config, &body.attester_slashings)?;
        trace!(slot, count = body.attestations.len(), "processing attestations");
        processor.process_attestations(config, &body.attestations)?;
        trace!(slot, count = body.deposits.len(), "processing deposits");
        processor.process_deposits(config, &body.deposits)?;
        trace!(slot, count = body.voluntary_exits.len(), "processing voluntary exits");
        processor.process_voluntary_exits(config, &body.voluntary_exits)?;
        Ok(())
    }
}

/// Apply ``signed_block`` to ``state``, which must already sit at the block's slot.
///
/// With ``validate_result`` the block signature is checked before and the declared state root
/// after processing. On error the state may be partially modified and must be discarded.
pub fn state_transition(
    config: &Config,
    state: &mut BeaconState,
    signed_block: &SignedBeaconBlock,
    validate_result: bool,
) -> Result<(), BlockProcessingError> {
    let block = BlockProcessFeature::new(signed_block);
    block.verify_structure(config)?;

    if validate_result {
        let proposer = state
            .validators
            .get(signed_block.message.proposer_index as usize)
            .ok_or(BlockProcessingError::BlockSignatureInvalid)?;
        let fork_version = state
            .fork
            .version_at(compute_epoch_at_slot(config, block.slot()));
        if !block.verify_signature(&proposer.pubkey, fork_version, state.genesis_validators_root) {
            debug!(slot = block.slot(), "rejected block with invalid signature");
            return Err(BlockProcessingError::BlockSignatureInvalid);
        }
    }

    block
        .process(config, &mut StateMeta::new(config, &mut *state))
        .inspect_err(|error| debug!(slot = block.slot(), %error, "rejected block"))?;

    if validate_result {
        let computed = state.tree_hash_root();
        if !block.verify_state_root(computed) {
            debug!(slot = block.slot(), %computed, "block state root mismatch");
            return Err(BlockProcessingError::StateRootMismatch {
                block: block.state_root(),
                computed,
            });
        }
    }
    Ok(())
}
