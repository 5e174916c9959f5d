use std::borrow::BorrowMut;

use alloy_primitives::B256;
use tracing::debug;

use super::HeaderProcessor;
use crate::{
    beacon_block_header::BeaconBlockHeader,
    config::Config,
    errors::{BlockProcessingError, HeaderInvalid, OperationError},
    meta::HeaderMeta,
    phase0::{beacon_state::BeaconState, state_meta::StateMeta},
};

/// Check ``header`` against the state and make it the latest block header.
pub fn process_block_header<M: HeaderMeta + ?Sized>(
    meta: &mut M,
    header: &BeaconBlockHeader,
) -> Result<(), OperationError<HeaderInvalid>> {
    let state_slot = meta.current_slot();
    verify!(
        header.slot == state_slot,
        HeaderInvalid::StateSlotMismatch {
            block_slot: header.slot,
            state_slot,
        }
    );

    let latest_slot = meta.latest_header_slot();
    verify!(
        header.slot > latest_slot,
        HeaderInvalid::OlderThanLatestBlockHeader {
            block_slot: header.slot,
            latest_slot,
        }
    );

    let expected = meta.get_beacon_proposer_index(header.slot)?;
    verify!(
        header.proposer_index == expected,
        HeaderInvalid::ProposerIndexMismatch {
            block: header.proposer_index,
            expected,
        }
    );

    let latest_root = meta.latest_header_root();
    verify!(
        header.parent_root == latest_root,
        HeaderInvalid::ParentBlockRootMismatch {
            state: latest_root,
            block: header.parent_root,
        }
    );

    // State root is filled in by the next slot processing
    meta.update_latest_header(BeaconBlockHeader {
        state_root: B256::ZERO,
        ..header.clone()
    });

    verify!(
        !meta.is_slashed(header.proposer_index),
        HeaderInvalid::ProposerSlashed(header.proposer_index)
    );
    Ok(())
}

impl<S: BorrowMut<BeaconState>> HeaderProcessor for StateMeta<'_, S> {
    fn process_header(
        &mut self,
        _config: &Config,
        header: &BeaconBlockHeader,
    ) -> Result<(), BlockProcessingError> {
        process_block_header(self, header)?;
        debug!(
            slot = header.slot,
            proposer_index = header.proposer_index,
            "processed block header"
        );
        Ok(())
    }
}
