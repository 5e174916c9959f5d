use std::borrow::BorrowMut;

use anyhow::anyhow;
use tracing::debug;

use super::VoluntaryExitProcessor;
use crate::{
    bls,
    config::Config,
    constants::{DOMAIN_VOLUNTARY_EXIT, FAR_FUTURE_EPOCH},
    errors::{BlockProcessingError, ExitInvalid, IntoWithIndex, OperationError},
    meta::VoluntaryExitMeta,
    misc::compute_signing_root,
    phase0::{beacon_state::BeaconState, state_meta::StateMeta},
    voluntary_exit::SignedVoluntaryExit,
};

/// Validate ``signed_voluntary_exit`` and queue the validator's exit.
pub fn process_voluntary_exit<M: VoluntaryExitMeta + ?Sized>(
    config: &Config,
    meta: &mut M,
    signed_voluntary_exit: &SignedVoluntaryExit,
) -> Result<(), OperationError<ExitInvalid>> {
    let voluntary_exit = &signed_voluntary_exit.message;
    let index = voluntary_exit.validator_index;

    verify!(meta.is_valid_index(index), ExitInvalid::InvalidIndex(index));
    let validator = meta
        .validator(index)
        .ok_or_else(|| anyhow!("validator {index} is within the registry but missing"))?;

    // Verify the validator is active
    let current_epoch = meta.current_epoch();
    verify!(
        validator.is_active(current_epoch),
        ExitInvalid::NotActive {
            index,
            epoch: current_epoch,
        }
    );

    // Verify exit has not been initiated
    verify!(
        validator.exit_epoch == FAR_FUTURE_EPOCH,
        ExitInvalid::AlreadyExited {
            index,
            exit_epoch: validator.exit_epoch,
        }
    );

    // Exits must specify an epoch when they become valid; they are not valid before then
    verify!(
        current_epoch >= voluntary_exit.epoch,
        ExitInvalid::TooEarly {
            current_epoch,
            exit_epoch: voluntary_exit.epoch,
        }
    );

    // Verify the validator has been active long enough
    let earliest_exit_epoch = validator
        .activation_epoch
        .saturating_add(config.shard_committee_period);
    verify!(
        current_epoch >= earliest_exit_epoch,
        ExitInvalid::TooSoon {
            current_epoch,
            earliest_exit_epoch,
        }
    );

    let domain = meta.get_domain(DOMAIN_VOLUNTARY_EXIT, voluntary_exit.epoch);
    let signing_root = compute_signing_root(voluntary_exit, domain);
    verify!(
        bls::verify(&validator.pubkey, signing_root, &signed_voluntary_exit.signature),
        ExitInvalid::BadSignature
    );

    meta.initiate_validator_exit(current_epoch, index)?;
    debug!(index, current_epoch, "initiated voluntary exit");
    Ok(())
}

/// Process ``voluntary_exits`` in order, stopping at the first invalid one. Exits processed before
/// it stay applied.
pub fn process_voluntary_exits<M: VoluntaryExitMeta + ?Sized>(
    config: &Config,
    meta: &mut M,
    voluntary_exits: &[SignedVoluntaryExit],
) -> Result<(), BlockProcessingError> {
    for (index, signed_voluntary_exit) in voluntary_exits.iter().enumerate() {
        process_voluntary_exit(config, meta, signed_voluntary_exit)
            .map_err(|err| err.into_with_index(index))?;
    }
    Ok(())
}

impl<S: BorrowMut<BeaconState>> VoluntaryExitProcessor for StateMeta<'_, S> {
    fn process_voluntary_exits(
        &mut self,
        config: &Config,
        exits: &[SignedVoluntaryExit],
    ) -> Result<(), BlockProcessingError> {
        process_voluntary_exits(config, self, exits)
    }
}
