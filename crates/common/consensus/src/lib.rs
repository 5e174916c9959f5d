#[macro_use]
mod macros;

pub mod attestation;
pub mod attestation_data;
pub mod attester_slashing;
pub mod beacon_block_header;
pub mod block_processing;
pub mod bls;
pub mod checkpoint;
pub mod config;
pub mod constants;
pub mod deposit;
pub mod deposit_data;
pub mod deposit_message;
pub mod errors;
pub mod eth_1_data;
pub mod fork;
pub mod fork_data;
pub mod helpers;
pub mod indexed_attestation;
pub mod meta;
pub mod misc;
pub mod operations;
pub mod pending_attestation;
pub mod phase0;
pub mod proposer_slashing;
pub mod proposing;
pub mod pubkey;
pub mod signature;
pub mod signing_data;
pub mod transfer;
pub mod validator;
pub mod voluntary_exit;

#[cfg(test)]
mod test_utils;
