use std::borrow::BorrowMut;

use anyhow::anyhow;
use itertools::Itertools;
use rayon::prelude::*;
use ssz_types::VariableList;
use tracing::debug;

use super::AttestationProcessor;
use crate::{
    attestation::Attestation,
    bls::SignatureSet,
    config::Config,
    errors::{
        AttestationInvalid, BlockProcessingError, IndexedAttestationInvalid, IntoWithIndex,
        OperationError,
    },
    helpers::indexed_attestation_signature_set,
    indexed_attestation::IndexedAttestation,
    meta::AttestationMeta,
    misc::compute_epoch_at_slot,
    pending_attestation::PendingAttestation,
    phase0::{beacon_state::BeaconState, state_meta::StateMeta},
};

/// An attestation that passed every check except its signature.
#[derive(Debug, Clone)]
pub struct CheckedAttestation {
    pub pending: PendingAttestation,
    pub is_current_epoch: bool,
    pub signature_set: SignatureSet,
}

/// Run the checks of ``process_attestation`` that do not involve the signature, and build the
/// pending attestation to record.
pub fn check_attestation<M: AttestationMeta + ?Sized>(
    config: &Config,
    meta: &M,
    attestation: &Attestation,
) -> Result<CheckedAttestation, OperationError<AttestationInvalid>> {
    let data = &attestation.data;
    let current_epoch = meta.current_epoch();
    let previous_epoch = meta.previous_epoch();
    verify!(
        data.target.epoch == previous_epoch || data.target.epoch == current_epoch,
        AttestationInvalid::BadTargetEpoch {
            target: data.target.epoch,
            previous: previous_epoch,
            current: current_epoch,
        }
    );

    let slot_epoch = compute_epoch_at_slot(config, data.slot);
    verify!(
        data.target.epoch == slot_epoch,
        AttestationInvalid::TargetEpochSlotMismatch {
            target: data.target.epoch,
            slot_epoch,
        }
    );

    let state_slot = meta.current_slot();
    let earliest = data.slot + config.min_attestation_inclusion_delay;
    verify!(
        earliest <= state_slot,
        AttestationInvalid::IncludedTooEarly {
            state: state_slot,
            earliest,
        }
    );
    let latest = data.slot + config.slots_per_epoch;
    verify!(
        state_slot <= latest,
        AttestationInvalid::IncludedTooLate {
            state: state_slot,
            latest,
        }
    );

    let count = meta.get_committee_count_per_slot(data.target.epoch);
    verify!(
        data.index < count,
        AttestationInvalid::BadCommitteeIndex {
            index: data.index,
            count,
        }
    );

    let committee = meta.get_beacon_committee(data.slot, data.index)?;
    verify!(
        attestation.aggregation_bits.len() == committee.len(),
        AttestationInvalid::BadAggregationBitfieldLength {
            committee_len: committee.len(),
            bitfield_len: attestation.aggregation_bits.len(),
        }
    );

    let is_current_epoch = data.target.epoch == current_epoch;
    let justified = if is_current_epoch {
        meta.current_justified_checkpoint()
    } else {
        meta.previous_justified_checkpoint()
    };
    verify!(
        data.source == justified,
        AttestationInvalid::WrongJustifiedCheckpoint {
            state: justified,
            attestation: data.source,
            is_current: is_current_epoch,
        }
    );

    let attesting_indices: Vec<_> = committee
        .iter()
        .enumerate()
        .filter_map(|(i, &index)| {
            attestation
                .aggregation_bits
                .get(i)
                .ok()
                .filter(|&bit| bit)
                .map(|_| index)
        })
        .unique()
        .sorted()
        .collect();
    let indexed_attestation = IndexedAttestation {
        attesting_indices: VariableList::new(attesting_indices)
            .map_err(|err| anyhow!("Couldn't build attesting indices {err:?}"))?,
        data: data.clone(),
        signature: attestation.signature.clone(),
    };
    let signature_set =
        indexed_attestation_signature_set(meta, &indexed_attestation).map_err(|reason| {
            OperationError::invalid(AttestationInvalid::BadIndexedAttestation(reason))
        })?;

    let proposer_index = meta.get_beacon_proposer_index(state_slot)?;
    Ok(CheckedAttestation {
        pending: PendingAttestation {
            aggregation_bits: attestation.aggregation_bits.clone(),
            data: data.clone(),
            inclusion_delay: state_slot - data.slot,
            proposer_index,
        },
        is_current_epoch,
        signature_set,
    })
}

/// Process ``attestations`` in order.
///
/// The non-signature checks run sequentially up to the first failing attestation. The signatures
/// of the attestations before it are then verified in parallel. Pending attestations are recorded
/// for every attestation before the first failure, and that failure is reported with its index,
/// exactly as if each attestation had been fully processed in turn.
pub fn process_attestations<M: AttestationMeta + ?Sized>(
    config: &Config,
    meta: &mut M,
    attestations: &[Attestation],
) -> Result<(), BlockProcessingError> {
    let mut checked = Vec::with_capacity(attestations.len());
    let mut check_failure = None;
    for (index, attestation) in attestations.iter().enumerate() {
        match check_attestation(config, &*meta, attestation) {
            Ok(attestation) => checked.push(attestation),
            Err(err) => {
                check_failure = Some(err.into_with_index(index));
                break;
            }
        }
    }

    let signature_failure = checked
        .par_iter()
        .position_first(|attestation| !attestation.signature_set.verify());
    let valid_count = signature_failure.unwrap_or(checked.len());

    for attestation in checked.into_iter().take(valid_count) {
        if attestation.is_current_epoch {
            meta.append_current_epoch_attestation(attestation.pending)?;
        } else {
            meta.append_previous_epoch_attestation(attestation.pending)?;
        }
    }
    debug!(count = valid_count, "processed attestations");

    if let Some(index) = signature_failure {
        return Err(BlockProcessingError::AttestationInvalid {
            index,
            reason: AttestationInvalid::BadIndexedAttestation(
                IndexedAttestationInvalid::BadSignature,
            ),
        });
    }
    match check_failure {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

impl<S: BorrowMut<BeaconState>> AttestationProcessor for StateMeta<'_, S> {
    fn process_attestations(
        &mut self,
        config: &Config,
        attestations: &[Attestation],
    ) -> Result<(), BlockProcessingError> {
        process_attestations(config, self, attestations)
    }
}
