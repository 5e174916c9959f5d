use std::{borrow::BorrowMut, collections::BTreeSet};

use beacon_primitives::ValidatorIndex;
use tracing::debug;

use super::AttesterSlashingProcessor;
use crate::{
    attester_slashing::AttesterSlashing,
    config::Config,
    errors::{AttesterSlashingInvalid, BlockProcessingError, IntoWithIndex, OperationError},
    helpers::is_valid_indexed_attestation,
    meta::AttesterSlashingMeta,
    phase0::{beacon_state::BeaconState, state_meta::StateMeta},
};

/// Slash every validator that signed both conflicting attestations and can still be slashed.
/// Returns the slashed indices in ascending order.
pub fn process_attester_slashing<M: AttesterSlashingMeta + ?Sized>(
    meta: &mut M,
    attester_slashing: &AttesterSlashing,
) -> Result<Vec<ValidatorIndex>, OperationError<AttesterSlashingInvalid>> {
    let attestation_1 = &attester_slashing.attestation_1;
    let attestation_2 = &attester_slashing.attestation_2;

    verify!(
        attestation_1.data.is_slashable_with(&attestation_2.data),
        AttesterSlashingInvalid::NotSlashable
    );
    is_valid_indexed_attestation(meta, attestation_1).map_err(|reason| {
        OperationError::invalid(AttesterSlashingInvalid::IndexedAttestation1Invalid(reason))
    })?;
    is_valid_indexed_attestation(meta, attestation_2).map_err(|reason| {
        OperationError::invalid(AttesterSlashingInvalid::IndexedAttestation2Invalid(reason))
    })?;

    let indices_1: BTreeSet<ValidatorIndex> =
        attestation_1.attesting_indices.iter().copied().collect();
    let indices_2: BTreeSet<ValidatorIndex> =
        attestation_2.attesting_indices.iter().copied().collect();

    let current_epoch = meta.current_epoch();
    let mut slashed = vec![];
    for &index in indices_1.intersection(&indices_2) {
        let slashable = meta
            .validator(index)
            .is_some_and(|validator| validator.is_slashable(current_epoch));
        if slashable {
            meta.slash_validator(index, None)?;
            slashed.push(index);
        }
    }
    verify!(
        !slashed.is_empty(),
        AttesterSlashingInvalid::NoSlashableIndices
    );
    Ok(slashed)
}

pub fn process_attester_slashings<M: AttesterSlashingMeta + ?Sized>(
    meta: &mut M,
    attester_slashings: &[AttesterSlashing],
) -> Result<(), BlockProcessingError> {
    for (index, attester_slashing) in attester_slashings.iter().enumerate() {
        let slashed = process_attester_slashing(meta, attester_slashing)
            .map_err(|err| err.into_with_index(index))?;
        debug!(?slashed, "processed attester slashing");
    }
    Ok(())
}

impl<S: BorrowMut<BeaconState>> AttesterSlashingProcessor for StateMeta<'_, S> {
    fn process_attester_slashings(
        &mut self,
        _config: &Config,
        slashings: &[AttesterSlashing],
    ) -> Result<(), BlockProcessingError> {
        process_attester_slashings(self, slashings)
    }
}
