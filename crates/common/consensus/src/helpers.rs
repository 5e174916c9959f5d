use std::cmp::min;

use alloy_primitives::B256;
use beacon_primitives::Gwei;
use ethereum_hashing::hash32_concat;

use crate::{
    bls::SignatureSet,
    config::Config,
    constants::{DOMAIN_BEACON_ATTESTER, FAR_FUTURE_EPOCH},
    errors::IndexedAttestationInvalid,
    indexed_attestation::IndexedAttestation,
    meta::{Pubkeys, Versioning},
    misc::compute_signing_root,
    pubkey::PubKey,
    validator::Validator,
};

/// Check if ``leaf`` at ``index`` verifies against the Merkle ``root`` and ``branch``.
pub fn is_valid_merkle_branch(
    leaf: B256,
    branch: &[B256],
    depth: u64,
    index: u64,
    root: B256,
) -> bool {
    if branch.len() < depth as usize {
        return false;
    }
    let mut value = leaf;
    for (i, node) in branch.iter().enumerate().take(depth as usize) {
        value = if (index >> i) & 1 == 1 {
            B256::from(hash32_concat(node.as_slice(), value.as_slice()))
        } else {
            B256::from(hash32_concat(value.as_slice(), node.as_slice()))
        };
    }
    value == root
}

pub fn get_validator_from_deposit(
    config: &Config,
    pubkey: PubKey,
    withdrawal_credentials: B256,
    amount: Gwei,
) -> Validator {
    let effective_balance = min(
        amount - amount % config.effective_balance_increment,
        config.max_effective_balance,
    );
    Validator {
        pubkey,
        withdrawal_credentials,
        effective_balance,
        slashed: false,
        activation_eligibility_epoch: FAR_FUTURE_EPOCH,
        activation_epoch: FAR_FUTURE_EPOCH,
        exit_epoch: FAR_FUTURE_EPOCH,
        withdrawable_epoch: FAR_FUTURE_EPOCH,
    }
}

/// Everything but the signature check of ``is_valid_indexed_attestation``: the attesting
/// indices must be non-empty, sorted, unique and known. Returns the signature check to run.
pub fn indexed_attestation_signature_set<M: Versioning + Pubkeys + ?Sized>(
    meta: &M,
    indexed_attestation: &IndexedAttestation,
) -> Result<SignatureSet, IndexedAttestationInvalid> {
    let indices = &indexed_attestation.attesting_indices;
    if indices.is_empty() {
        return Err(IndexedAttestationInvalid::IndicesEmpty);
    }
    if let Some(position) = indices.windows(2).position(|pair| pair[0] >= pair[1]) {
        return Err(IndexedAttestationInvalid::BadValidatorIndicesOrdering(
            position + 1,
        ));
    }
    let pubkeys = indices
        .iter()
        .map(|&index| {
            meta.pubkey(index)
                .cloned()
                .ok_or(IndexedAttestationInvalid::UnknownValidator(index))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let domain = meta.get_domain(
        DOMAIN_BEACON_ATTESTER,
        indexed_attestation.data.target.epoch,
    );
    Ok(SignatureSet {
        pubkeys,
        signing_root: compute_signing_root(&indexed_attestation.data, domain),
        signature: indexed_attestation.signature.clone(),
    })
}

/// Check if ``indexed_attestation`` is not empty, has sorted and unique indices and has a valid
/// aggregate signature.
pub fn is_valid_indexed_attestation<M: Versioning + Pubkeys + ?Sized>(
    meta: &M,
    indexed_attestation: &IndexedAttestation,
) -> Result<(), IndexedAttestationInvalid> {
    let signature_set = indexed_attestation_signature_set(meta, indexed_attestation)?;
    if !signature_set.verify() {
        return Err(IndexedAttestationInvalid::BadSignature);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::deposit_proof;

    #[test]
    fn test_merkle_branch() {
        let leaves: Vec<B256> = (0..5u8).map(B256::repeat_byte).collect();
        let (root, proof) = deposit_proof(&leaves, 3);

        assert!(is_valid_merkle_branch(leaves[3], &proof, 33, 3, root));
        assert!(!is_valid_merkle_branch(leaves[2], &proof, 33, 3, root));
        assert!(!is_valid_merkle_branch(leaves[3], &proof, 33, 2, root));
        assert!(!is_valid_merkle_branch(leaves[3], &proof[..10], 33, 3, root));
    }

    #[rstest::rstest]
    #[case(32_000_000_000, 32_000_000_000)]
    #[case(33_500_000_000, 32_000_000_000)]
    #[case(17_999_999_999, 17_000_000_000)]
    #[case(999_999_999, 0)]
    fn test_deposit_effective_balance(#[case] amount: Gwei, #[case] expected: Gwei) {
        let validator =
            get_validator_from_deposit(&Config::mainnet(), PubKey::default(), B256::ZERO, amount);
        assert_eq!(validator.effective_balance, expected);
        assert_eq!(validator.activation_epoch, FAR_FUTURE_EPOCH);
    }
}
