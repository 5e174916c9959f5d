use std::fmt;

use alloy_primitives::B256;
use beacon_primitives::{CommitteeIndex, Epoch, Slot, ValidatorIndex};
use thiserror::Error;

use crate::checkpoint::Checkpoint;

/// Operation list carried by a block body.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum OperationKind {
    ProposerSlashing,
    AttesterSlashing,
    Attestation,
    Deposit,
    Transfer,
    VoluntaryExit,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OperationKind::ProposerSlashing => "proposer slashings",
            OperationKind::AttesterSlashing => "attester slashings",
            OperationKind::Attestation => "attestations",
            OperationKind::Deposit => "deposits",
            OperationKind::Transfer => "transfers",
            OperationKind::VoluntaryExit => "voluntary exits",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error, PartialEq, Eq, Clone, Copy)]
pub enum ProposerSelectionError {
    #[error("cannot select a proposer from an empty candidate set")]
    EmptyCandidateSet,
    #[error("unable to shuffle candidate position {position} of {count}")]
    UnableToShuffle { position: usize, count: usize },
    #[error("candidate {0} is not in the registry")]
    UnknownValidator(ValidatorIndex),
}

/// Outcome of processing a single operation: either the operation itself is invalid, or the
/// state could not serve the request.
#[derive(Debug, Error)]
pub enum OperationError<T> {
    #[error("{0}")]
    Invalid(T),
    #[error(transparent)]
    Proposer(#[from] ProposerSelectionError),
    #[error(transparent)]
    State(#[from] anyhow::Error),
}

impl<T> OperationError<T> {
    pub fn invalid(reason: T) -> Self {
        OperationError::Invalid(reason)
    }

    /// Reason the operation was rejected, if it was.
    pub fn reason(&self) -> Option<&T> {
        match self {
            OperationError::Invalid(reason) => Some(reason),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum BlockProcessingError {
    #[error("block carries {len} {kind}, at most {limit} allowed")]
    StructuralLimitExceeded {
        kind: OperationKind,
        len: usize,
        limit: usize,
    },
    #[error("invalid block header: {0}")]
    HeaderInvalid(HeaderInvalid),
    #[error("block signature does not verify under the proposer key")]
    BlockSignatureInvalid,
    #[error("randao reveal does not verify under the proposer key")]
    RandaoSignatureInvalid,
    #[error("proposer slashing {index} is invalid: {reason}")]
    ProposerSlashingInvalid {
        index: usize,
        reason: ProposerSlashingInvalid,
    },
    #[error("attester slashing {index} is invalid: {reason}")]
    AttesterSlashingInvalid {
        index: usize,
        reason: AttesterSlashingInvalid,
    },
    #[error("attestation {index} is invalid: {reason}")]
    AttestationInvalid {
        index: usize,
        reason: AttestationInvalid,
    },
    #[error("deposit {index} is invalid: {reason}")]
    DepositInvalid { index: usize, reason: DepositInvalid },
    #[error("block must carry {expected} deposits, found {found}")]
    DepositCountInvalid { expected: u64, found: u64 },
    #[error("voluntary exit {index} is invalid: {reason}")]
    ExitInvalid { index: usize, reason: ExitInvalid },
    #[error("block declares state root {block}, computed {computed}")]
    StateRootMismatch { block: B256, computed: B256 },
    #[error(transparent)]
    ProposerSelection(#[from] ProposerSelectionError),
    #[error(transparent)]
    State(#[from] anyhow::Error),
}

/// Attach the position of a failed operation in its block list.
pub trait IntoWithIndex {
    fn into_with_index(self, index: usize) -> BlockProcessingError;
}

macro_rules! impl_into_with_index {
    ($reason:ident, $variant:ident) => {
        impl IntoWithIndex for OperationError<$reason> {
            fn into_with_index(self, index: usize) -> BlockProcessingError {
                match self {
                    OperationError::Invalid(reason) => {
                        BlockProcessingError::$variant { index, reason }
                    }
                    OperationError::Proposer(error) => BlockProcessingError::ProposerSelection(error),
                    OperationError::State(error) => BlockProcessingError::State(error),
                }
            }
        }
    };
}

impl_into_with_index!(ProposerSlashingInvalid, ProposerSlashingInvalid);
impl_into_with_index!(AttesterSlashingInvalid, AttesterSlashingInvalid);
impl_into_with_index!(AttestationInvalid, AttestationInvalid);
impl_into_with_index!(DepositInvalid, DepositInvalid);
impl_into_with_index!(ExitInvalid, ExitInvalid);

impl From<OperationError<HeaderInvalid>> for BlockProcessingError {
    fn from(error: OperationError<HeaderInvalid>) -> Self {
        match error {
            OperationError::Invalid(reason) => BlockProcessingError::HeaderInvalid(reason),
            OperationError::Proposer(error) => BlockProcessingError::ProposerSelection(error),
            OperationError::State(error) => BlockProcessingError::State(error),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum HeaderInvalid {
    #[error("block slot {block_slot} does not match state slot {state_slot}")]
    StateSlotMismatch { block_slot: Slot, state_slot: Slot },
    #[error("block slot {block_slot} is not newer than latest header slot {latest_slot}")]
    OlderThanLatestBlockHeader { block_slot: Slot, latest_slot: Slot },
    #[error("block proposer {block} is not the expected proposer {expected}")]
    ProposerIndexMismatch {
        block: ValidatorIndex,
        expected: ValidatorIndex,
    },
    #[error("parent root {block} does not match latest header root {state}")]
    ParentBlockRootMismatch { state: B256, block: B256 },
    #[error("proposer {0} is slashed")]
    ProposerSlashed(ValidatorIndex),
}

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ProposerSlashingInvalid {
    #[error("proposer {0} is not in the registry")]
    ProposerUnknown(ValidatorIndex),
    #[error("header slots differ: {0} and {1}")]
    ProposalSlotMismatch(Slot, Slot),
    #[error("header proposers differ: {0} and {1}")]
    ProposerIndexMismatch(ValidatorIndex, ValidatorIndex),
    #[error("headers are identical")]
    ProposalsIdentical,
    #[error("proposer {0} is not slashable")]
    ProposerNotSlashable(ValidatorIndex),
    #[error("signature of header {0} is invalid")]
    BadProposalSignature(u8),
}

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum IndexedAttestationInvalid {
    #[error("attesting indices are empty")]
    IndicesEmpty,
    #[error("attesting indices are not sorted and unique at position {0}")]
    BadValidatorIndicesOrdering(usize),
    #[error("attester {0} is not in the registry")]
    UnknownValidator(ValidatorIndex),
    #[error("aggregate signature is invalid")]
    BadSignature,
}

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum AttesterSlashingInvalid {
    #[error("attestations are not slashable")]
    NotSlashable,
    #[error("first attestation is invalid: {0}")]
    IndexedAttestation1Invalid(IndexedAttestationInvalid),
    #[error("second attestation is invalid: {0}")]
    IndexedAttestation2Invalid(IndexedAttestationInvalid),
    #[error("no attester in both attestations is slashable")]
    NoSlashableIndices,
}

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum AttestationInvalid {
    #[error("target epoch {target} is neither previous {previous} nor current {current}")]
    BadTargetEpoch {
        target: Epoch,
        previous: Epoch,
        current: Epoch,
    },
    #[error("target epoch {target} does not contain slot epoch {slot_epoch}")]
    TargetEpochSlotMismatch { target: Epoch, slot_epoch: Epoch },
    #[error("included at slot {state} before slot {earliest}")]
    IncludedTooEarly { state: Slot, earliest: Slot },
    #[error("included at slot {state} after slot {latest}")]
    IncludedTooLate { state: Slot, latest: Slot },
    #[error("committee index {index} is not below committee count {count}")]
    BadCommitteeIndex {
        index: CommitteeIndex,
        count: u64,
    },
    #[error("aggregation bitfield has length {bitfield_len}, committee has {committee_len}")]
    BadAggregationBitfieldLength {
        committee_len: usize,
        bitfield_len: usize,
    },
    #[error("source {attestation:?} does not match justified checkpoint {state:?}")]
    WrongJustifiedCheckpoint {
        state: Checkpoint,
        attestation: Checkpoint,
        is_current: bool,
    },
    #[error("{0}")]
    BadIndexedAttestation(IndexedAttestationInvalid),
}

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum DepositInvalid {
    #[error("merkle proof does not verify against the deposit root at index {0}")]
    BadMerkleProof(u64),
}

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ExitInvalid {
    #[error("validator {0} is not in the registry")]
    InvalidIndex(ValidatorIndex),
    #[error("validator {index} is not active at epoch {epoch}")]
    NotActive { index: ValidatorIndex, epoch: Epoch },
    #[error("validator {index} already exits at epoch {exit_epoch}")]
    AlreadyExited {
        index: ValidatorIndex,
        exit_epoch: Epoch,
    },
    #[error("exit is valid from epoch {exit_epoch}, current epoch is {current_epoch}")]
    TooEarly {
        current_epoch: Epoch,
        exit_epoch: Epoch,
    },
    #[error("validator may exit from epoch {earliest_exit_epoch}, current epoch is {current_epoch}")]
    TooSoon {
        current_epoch: Epoch,
        earliest_exit_epoch: Epoch,
    },
    #[error("exit signature is invalid")]
    BadSignature,
}
