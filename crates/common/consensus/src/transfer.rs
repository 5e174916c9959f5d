use beacon_primitives::{Gwei, Slot, ValidatorIndex};
use serde::{Deserialize, Serialize};
use ssz_derive::{Decode, Encode};
use tree_hash_derive::TreeHash;

use crate::{pubkey::PubKey, signature::BlsSignature};

/// Balance transfer between validators. Transfers are disabled on every supported network, the
/// type only exists so that the bounded operation list can be checked.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize, Encode, Decode, TreeHash)]
pub struct Transfer {
    pub sender: ValidatorIndex,
    pub recipient: ValidatorIndex,
    pub amount: Gwei,
    pub fee: Gwei,
    /// Inclusion slot
    pub slot: Slot,
    /// Withdrawal pubkey of the sender
    pub pubkey: PubKey,
    pub signature: BlsSignature,
}
