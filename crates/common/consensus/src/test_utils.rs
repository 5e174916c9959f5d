use alloy_primitives::B256;
use beacon_primitives::{Domain, Gwei, Slot, ValidatorIndex};
use blst::min_pk::{AggregateSignature, SecretKey, Signature};
use ethereum_hashing::{hash32_concat, hash_fixed};
use ssz_types::{BitVector, FixedVector};
use tree_hash::TreeHash;

use crate::{
    beacon_block_header::BeaconBlockHeader,
    bls::DST,
    config::Config,
    constants::{DEPOSIT_CONTRACT_TREE_DEPTH, DOMAIN_BEACON_PROPOSER, DOMAIN_DEPOSIT, DOMAIN_RANDAO},
    deposit::Deposit,
    deposit_data::DepositData,
    eth_1_data::Eth1Data,
    fork::Fork,
    misc::{compute_domain, compute_epoch_at_slot, compute_signing_root},
    phase0::{
        beacon_block::{BeaconBlock, SignedBeaconBlock},
        beacon_block_body::BeaconBlockBody,
        beacon_state::BeaconState,
    },
    pubkey::PubKey,
    signature::BlsSignature,
    validator::Validator,
};

pub const GWEI_PER_ETH: Gwei = 1_000_000_000;

pub fn keypair(seed: u64) -> (SecretKey, PubKey) {
    let secret_key = SecretKey::key_gen(&hash_fixed(&seed.to_le_bytes()), &[]).unwrap();
    let pubkey = PubKey::from(secret_key.sk_to_pk().to_bytes());
    (secret_key, pubkey)
}

pub fn sign_root(secret_key: &SecretKey, root: B256) -> BlsSignature {
    BlsSignature::from(secret_key.sign(root.as_slice(), DST, &[]).to_bytes())
}

pub fn sign<T: TreeHash>(secret_key: &SecretKey, object: &T, domain: Domain) -> BlsSignature {
    sign_root(secret_key, compute_signing_root(object, domain))
}

pub fn aggregate(signatures: impl IntoIterator<Item = BlsSignature>) -> BlsSignature {
    let signatures: Vec<Signature> = signatures
        .into_iter()
        .map(|signature| Signature::from_bytes(&signature.signature).unwrap())
        .collect();
    let signatures: Vec<&Signature> = signatures.iter().collect();
    let aggregate = AggregateSignature::aggregate(&signatures, true).unwrap();
    BlsSignature::from(aggregate.to_signature().to_bytes())
}

/// Validator ``seed`` with a 32 ETH balance, active from genesis.
pub fn active_validator(config: &Config, seed: u64) -> Validator {
    Validator {
        pubkey: keypair(seed).1,
        withdrawal_credentials: B256::repeat_byte(seed as u8),
        effective_balance: config.max_effective_balance,
        slashed: false,
        activation_eligibility_epoch: 0,
        activation_epoch: 0,
        exit_epoch: u64::MAX,
        withdrawable_epoch: u64::MAX,
    }
}

/// State at slot zero with ``validator_count`` active validators whose keys are
/// ``keypair(index)``.
pub fn genesis_state(config: &Config, validator_count: u64) -> BeaconState {
    let validators: Vec<Validator> = (0..validator_count)
        .map(|index| active_validator(config, index))
        .collect();
    let balances = vec![config.max_effective_balance; validators.len()];

    BeaconState {
        genesis_time: 1_606_824_023,
        genesis_validators_root: B256::repeat_byte(0x42),
        slot: 0,
        fork: Fork {
            previous_version: config.genesis_fork_version,
            current_version: config.genesis_fork_version,
            epoch: 0,
        },
        latest_block_header: BeaconBlockHeader {
            body_root: BeaconBlockBody::default().tree_hash_root(),
            ..BeaconBlockHeader::default()
        },
        block_roots: FixedVector::from_elem(B256::ZERO),
        state_roots: FixedVector::from_elem(B256::ZERO),
        historical_roots: Default::default(),
        eth1_data: Eth1Data::default(),
        eth1_data_votes: Default::default(),
        eth1_deposit_index: 0,
        validators: validators.into(),
        balances: balances.into(),
        randao_mixes: FixedVector::from_elem(B256::repeat_byte(0x11)),
        slashings: FixedVector::from_elem(0),
        previous_epoch_attestations: Default::default(),
        current_epoch_attestations: Default::default(),
        justification_bits: BitVector::new(),
        previous_justified_checkpoint: Default::default(),
        current_justified_checkpoint: Default::default(),
        finalized_checkpoint: Default::default(),
    }
}

/// The part of slot processing a block relies on: seal the latest header with the current state
/// root, then move to ``slot``.
pub fn advance_to_slot(state: &mut BeaconState, slot: Slot) {
    if state.latest_block_header.state_root == B256::ZERO {
        state.latest_block_header.state_root = state.tree_hash_root();
    }
    state.slot = slot;
}

/// Unsigned block for the current slot of ``state``, built on its latest header, carrying a valid
/// randao reveal from the expected proposer.
pub fn block_for(config: &Config, state: &BeaconState, body: BeaconBlockBody) -> BeaconBlock {
    let proposer_index = state.get_beacon_proposer_index(config, state.slot).unwrap();
    let epoch = compute_epoch_at_slot(config, state.slot);
    let randao_reveal = sign(
        &keypair(proposer_index).0,
        &epoch,
        state.get_domain(DOMAIN_RANDAO, epoch),
    );
    BeaconBlock {
        slot: state.slot,
        proposer_index,
        parent_root: state.latest_block_header.tree_hash_root(),
        state_root: B256::ZERO,
        body: BeaconBlockBody {
            randao_reveal,
            ..body
        },
    }
}

pub fn sign_block(config: &Config, state: &BeaconState, block: BeaconBlock) -> SignedBeaconBlock {
    let epoch = compute_epoch_at_slot(config, block.slot);
    let signature = sign(
        &keypair(block.proposer_index).0,
        &block,
        state.get_domain(DOMAIN_BEACON_PROPOSER, epoch),
    );
    SignedBeaconBlock {
        message: block,
        signature,
    }
}

/// Deposit data for key ``seed`` with a valid proof of possession.
pub fn deposit_data(config: &Config, seed: u64, amount: Gwei) -> DepositData {
    let (secret_key, pubkey) = keypair(seed);
    let mut data = DepositData {
        pubkey,
        withdrawal_credentials: B256::repeat_byte(seed as u8),
        amount,
        signature: BlsSignature::default(),
    };
    let domain = compute_domain(DOMAIN_DEPOSIT, config.genesis_fork_version, B256::ZERO);
    data.signature = sign(&secret_key, &data.message(), domain);
    data
}

/// Root of the deposit tree over ``leaves`` (with the length mix-in) and the branch of leaf
/// ``index``.
pub fn deposit_proof(leaves: &[B256], index: usize) -> (B256, Vec<B256>) {
    let depth = DEPOSIT_CONTRACT_TREE_DEPTH as usize;
    let mut zero_hashes = vec![B256::ZERO];
    for level in 0..depth {
        let zero = zero_hashes[level];
        zero_hashes.push(B256::from(hash32_concat(zero.as_slice(), zero.as_slice())));
    }

    let mut proof = Vec::with_capacity(depth + 1);
    let mut layer = leaves.to_vec();
    let mut position = index;
    for zero in zero_hashes.iter().take(depth) {
        proof.push(layer.get(position ^ 1).copied().unwrap_or(*zero));
        layer = layer
            .chunks(2)
            .map(|pair| {
                let right = pair.get(1).copied().unwrap_or(*zero);
                B256::from(hash32_concat(pair[0].as_slice(), right.as_slice()))
            })
            .collect();
        position /= 2;
    }
    let tree_root = layer.first().copied().unwrap_or(zero_hashes[depth]);

    let mut length = [0u8; 32];
    length[..8].copy_from_slice(&(leaves.len() as u64).to_le_bytes());
    let length = B256::from(length);
    proof.push(length);

    let root = B256::from(hash32_concat(tree_root.as_slice(), length.as_slice()));
    (root, proof)
}

/// Commit ``data`` to the eth1 data of a state that has not processed any deposit yet and return
/// the matching deposits.
pub fn commit_deposits(state: &mut BeaconState, data: Vec<DepositData>) -> Vec<Deposit> {
    assert_eq!(state.eth1_deposit_index, 0);
    let leaves: Vec<B256> = data.iter().map(|data| data.tree_hash_root()).collect();
    let mut root = B256::ZERO;
    let deposits = data
        .into_iter()
        .enumerate()
        .map(|(index, data)| {
            let (deposit_root, proof) = deposit_proof(&leaves, index);
            root = deposit_root;
            Deposit {
                proof: proof.into(),
                data,
            }
        })
        .collect();
    state.eth1_data.deposit_root = root;
    state.eth1_data.deposit_count = leaves.len() as u64;
    deposits
}

/// Index of a validator other than ``excluded`` that is active at genesis.
pub fn other_validator(excluded: ValidatorIndex, validator_count: u64) -> ValidatorIndex {
    (excluded + 1) % validator_count
}
