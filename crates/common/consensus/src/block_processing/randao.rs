use std::borrow::BorrowMut;

use alloy_primitives::B256;
use anyhow::anyhow;
use ethereum_hashing::hash_fixed;

use super::RandaoProcessor;
use crate::{
    bls,
    config::Config,
    constants::DOMAIN_RANDAO,
    errors::BlockProcessingError,
    meta::RandaoMeta,
    misc::{compute_signing_root, xor},
    phase0::{beacon_state::BeaconState, state_meta::StateMeta},
    signature::BlsSignature,
};

/// Verify the proposer's reveal of the current epoch and mix it into the randao mix.
pub fn process_randao<M: RandaoMeta + ?Sized>(
    meta: &mut M,
    reveal: &BlsSignature,
) -> Result<(), BlockProcessingError> {
    let epoch = meta.current_epoch();
    let proposer_index = meta.get_beacon_proposer_index(meta.current_slot())?;
    let pubkey = meta
        .pubkey(proposer_index)
        .ok_or_else(|| anyhow!("proposer {proposer_index} is not in the registry"))?;

    let signing_root = compute_signing_root(&epoch, meta.get_domain(DOMAIN_RANDAO, epoch));
    if !bls::verify(pubkey, signing_root, reveal) {
        return Err(BlockProcessingError::RandaoSignatureInvalid);
    }

    let mix = xor(
        meta.get_randao_mix(epoch),
        B256::from(hash_fixed(&reveal.signature)),
    );
    meta.set_randao_mix(epoch, mix);
    Ok(())
}

impl<S: BorrowMut<BeaconState>> RandaoProcessor for StateMeta<'_, S> {
    fn process_randao(
        &mut self,
        _config: &Config,
        reveal: &BlsSignature,
    ) -> Result<(), BlockProcessingError> {
        process_randao(self, reveal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        meta::Randomness,
        test_utils::{genesis_state, keypair, sign},
    };

    #[test]
    fn test_reveal_is_mixed_in() {
        let config = Config::minimal();
        let mut state = genesis_state(&config, 16);
        state.slot = 19;
        let epoch = 2;
        let proposer_index = state.get_beacon_proposer_index(&config, 19).unwrap();
        let reveal = sign(
            &keypair(proposer_index).0,
            &epoch,
            state.get_domain(DOMAIN_RANDAO, epoch),
        );
        let previous_mix = state.get_randao_mix(&config, epoch);

        let mut meta = StateMeta::new(&config, &mut state);
        process_randao(&mut meta, &reveal).unwrap();

        let expected = xor(previous_mix, B256::from(hash_fixed(&reveal.signature)));
        assert_eq!(meta.get_randao_mix(epoch), expected);
        assert_eq!(meta.get_randao_mix(epoch + 1), previous_mix);
    }

    #[test]
    fn test_reveal_must_come_from_proposer() {
        let config = Config::minimal();
        let mut state = genesis_state(&config, 16);
        state.slot = 19;
        let proposer_index = state.get_beacon_proposer_index(&config, 19).unwrap();
        let reveal = sign(
            &keypair((proposer_index + 1) % 16).0,
            &2u64,
            state.get_domain(DOMAIN_RANDAO, 2),
        );
        let previous_mixes = state.randao_mixes.clone();

        let result = process_randao(&mut StateMeta::new(&config, &mut state), &reveal);

        assert!(matches!(
            result,
            Err(BlockProcessingError::RandaoSignatureInvalid)
        ));
        assert_eq!(state.randao_mixes, previous_mixes);
    }

    #[test]
    fn test_reveal_must_sign_current_epoch() {
        let config = Config::minimal();
        let mut state = genesis_state(&config, 16);
        state.slot = 19;
        let proposer_index = state.get_beacon_proposer_index(&config, 19).unwrap();
        let reveal = sign(
            &keypair(proposer_index).0,
            &1u64,
            state.get_domain(DOMAIN_RANDAO, 1),
        );

        assert!(matches!(
            process_randao(&mut StateMeta::new(&config, &mut state), &reveal),
            Err(BlockProcessingError::RandaoSignatureInvalid)
        ));
    }
}
