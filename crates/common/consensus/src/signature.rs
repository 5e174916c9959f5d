use serde::{Deserialize, Serialize};
use ssz_derive::{Decode, Encode};
use ssz_types::{typenum, FixedVector};
use tree_hash_derive::TreeHash;

/// Compressed BLS12-381 signature.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize, Encode, Decode, TreeHash)]
#[serde(transparent)]
pub struct BlsSignature {
    #[serde(with = "ssz_types::serde_utils::hex_fixed_vec")]
    pub signature: FixedVector<u8, typenum::U96>,
}

impl Default for BlsSignature {
    /// The point-at-infinity encoding, used for unsigned messages.
    fn default() -> Self {
        let mut bytes = vec![0u8; 96];
        bytes[0] = 0xc0;
        Self {
            signature: FixedVector::from(bytes),
        }
    }
}

impl From<[u8; 96]> for BlsSignature {
    fn from(bytes: [u8; 96]) -> Self {
        Self {
            signature: FixedVector::from(bytes.to_vec()),
        }
    }
}
