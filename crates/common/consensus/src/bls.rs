use alloy_primitives::B256;
use blst::{
    min_pk::{PublicKey, Signature},
    BLST_ERROR,
};

use crate::{pubkey::PubKey, signature::BlsSignature};

/// Ciphersuite of the proof-of-possession scheme used by the beacon chain.
pub const DST: &[u8] = b"BLS_SIG_BLS12381G2_XMD:SHA-256_SSWU_RO_POP_";

fn decode_pubkey(pubkey: &PubKey) -> Option<PublicKey> {
    PublicKey::key_validate(&pubkey.inner).ok()
}

fn decode_signature(signature: &BlsSignature) -> Option<Signature> {
    Signature::from_bytes(&signature.signature).ok()
}

/// Verify ``signature`` over ``signing_root`` by ``pubkey``. Malformed keys or signatures never
/// verify.
pub fn verify(pubkey: &PubKey, signing_root: B256, signature: &BlsSignature) -> bool {
    let (Some(public_key), Some(signature)) = (decode_pubkey(pubkey), decode_signature(signature))
    else {
        return false;
    };
    signature.verify(true, signing_root.as_slice(), DST, &[], &public_key, false)
        == BLST_ERROR::BLST_SUCCESS
}

/// Verify an aggregate ``signature`` of all ``pubkeys`` over the same ``signing_root``.
pub fn fast_aggregate_verify(
    pubkeys: &[PubKey],
    signing_root: B256,
    signature: &BlsSignature,
) -> bool {
    if pubkeys.is_empty() {
        return false;
    }
    let Some(signature) = decode_signature(signature) else {
        return false;
    };
    let Some(public_keys) = pubkeys.iter().map(decode_pubkey).collect::<Option<Vec<_>>>() else {
        return false;
    };
    let public_keys: Vec<&PublicKey> = public_keys.iter().collect();
    signature.fast_aggregate_verify(true, signing_root.as_slice(), DST, &public_keys)
        == BLST_ERROR::BLST_SUCCESS
}

/// A deferred signature check: everything needed to verify one (aggregate) signature.
#[derive(Debug, Clone)]
pub struct SignatureSet {
    pub pubkeys: Vec<PubKey>,
    pub signing_root: B256,
    pub signature: BlsSignature,
}

impl SignatureSet {
    pub fn single(pubkey: PubKey, signing_root: B256, signature: BlsSignature) -> Self {
        Self {
            pubkeys: vec![pubkey],
            signing_root,
            signature,
        }
    }

    pub fn verify(&self) -> bool {
        match self.pubkeys.as_slice() {
            [pubkey] => verify(pubkey, self.signing_root, &self.signature),
            pubkeys => fast_aggregate_verify(pubkeys, self.signing_root, &self.signature),
        }
    }
}
