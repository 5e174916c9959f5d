use serde::{Deserialize, Serialize};
use ssz_derive::{Decode, Encode};
use ssz_types::{typenum, FixedVector};
use tree_hash_derive::TreeHash;

/// Compressed BLS12-381 public key.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Serialize, Deserialize, Encode, Decode, TreeHash)]
#[serde(transparent)]
pub struct PubKey {
    #[serde(with = "ssz_types::serde_utils::hex_fixed_vec")]
    pub inner: FixedVector<u8, typenum::U48>,
}

impl Default for PubKey {
    fn default() -> Self {
        Self {
            inner: FixedVector::from_elem(0),
        }
    }
}

impl From<[u8; 48]> for PubKey {
    fn from(bytes: [u8; 48]) -> Self {
        Self {
            inner: FixedVector::from(bytes.to_vec()),
        }
    }
}
