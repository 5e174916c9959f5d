use std::borrow::BorrowMut;

use tracing::debug;

use super::ProposerSlashingProcessor;
use crate::{
    bls,
    config::Config,
    constants::DOMAIN_BEACON_PROPOSER,
    errors::{BlockProcessingError, IntoWithIndex, OperationError, ProposerSlashingInvalid},
    meta::ProposerSlashingMeta,
    misc::{compute_epoch_at_slot, compute_signing_root},
    phase0::{beacon_state::BeaconState, state_meta::StateMeta},
    proposer_slashing::ProposerSlashing,
};

pub fn process_proposer_slashing<M: ProposerSlashingMeta + ?Sized>(
    config: &Config,
    meta: &mut M,
    proposer_slashing: &ProposerSlashing,
) -> Result<(), OperationError<ProposerSlashingInvalid>> {
    let header_1 = &proposer_slashing.signed_header_1.message;
    let header_2 = &proposer_slashing.signed_header_2.message;

    verify!(
        header_1.slot == header_2.slot,
        ProposerSlashingInvalid::ProposalSlotMismatch(header_1.slot, header_2.slot)
    );
    verify!(
        header_1.proposer_index == header_2.proposer_index,
        ProposerSlashingInvalid::ProposerIndexMismatch(
            header_1.proposer_index,
            header_2.proposer_index
        )
    );
    verify!(header_1 != header_2, ProposerSlashingInvalid::ProposalsIdentical);

    let index = header_1.proposer_index;
    verify!(
        meta.is_valid_index(index),
        ProposerSlashingInvalid::ProposerUnknown(index)
    );
    let proposer = meta
        .validator(index)
        .ok_or(OperationError::invalid(ProposerSlashingInvalid::ProposerUnknown(index)))?;
    verify!(
        proposer.is_slashable(meta.current_epoch()),
        ProposerSlashingInvalid::ProposerNotSlashable(index)
    );

    for (number, signed_header) in [
        (1, &proposer_slashing.signed_header_1),
        (2, &proposer_slashing.signed_header_2),
    ] {
        let domain = meta.get_domain(
            DOMAIN_BEACON_PROPOSER,
            compute_epoch_at_slot(config, signed_header.message.slot),
        );
        let signing_root = compute_signing_root(&signed_header.message, domain);
        verify!(
            bls::verify(&proposer.pubkey, signing_root, &signed_header.signature),
            ProposerSlashingInvalid::BadProposalSignature(number)
        );
    }

    meta.slash_validator(index, None)?;
    Ok(())
}

pub fn process_proposer_slashings<M: ProposerSlashingMeta + ?Sized>(
    config: &Config,
    meta: &mut M,
    proposer_slashings: &[ProposerSlashing],
) -> Result<(), BlockProcessingError> {
    for (index, proposer_slashing) in proposer_slashings.iter().enumerate() {
        process_proposer_slashing(config, meta, proposer_slashing)
            .map_err(|err| err.into_with_index(index))?;
        debug!(
            proposer_index = proposer_slashing.signed_header_1.message.proposer_index,
            "processed proposer slashing"
        );
    }
    Ok(())
}

impl<S: BorrowMut<BeaconState>> ProposerSlashingProcessor for StateMeta<'_, S> {
    fn process_proposer_slashings(
        &mut self,
        config: &Config,
        slashings: &[ProposerSlashing],
    ) -> Result<(), BlockProcessingError> {
        process_proposer_slashings(config, self, slashings)
    }
}
