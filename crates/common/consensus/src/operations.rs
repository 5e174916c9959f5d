use ssz_types::{
    typenum::{U128, U16, U2},
    VariableList,
};

use crate::{
    attestation::Attestation,
    attester_slashing::AttesterSlashing,
    config::Config,
    deposit::Deposit,
    errors::{BlockProcessingError, OperationKind},
    proposer_slashing::ProposerSlashing,
    transfer::Transfer,
    voluntary_exit::SignedVoluntaryExit,
};

pub type ProposerSlashings = VariableList<ProposerSlashing, U16>;
pub type AttesterSlashings = VariableList<AttesterSlashing, U2>;
pub type Attestations = VariableList<Attestation, U128>;
pub type Deposits = VariableList<Deposit, U16>;
pub type Transfers = VariableList<Transfer, U16>;
pub type VoluntaryExits = VariableList<SignedVoluntaryExit, U16>;

/// A bounded list of block operations. The configured limit may be lower than the SSZ capacity
/// of the list, so it is checked separately before processing. Lists longer than the capacity
/// never get this far: SSZ decoding rejects them.
pub trait OperationList {
    const KIND: OperationKind;

    fn limit(config: &Config) -> usize;

    fn operation_count(&self) -> usize;

    fn verify_limit(&self, config: &Config) -> Result<(), BlockProcessingError> {
        let len = self.operation_count();
        let limit = Self::limit(config);
        if len > limit {
            return Err(BlockProcessingError::StructuralLimitExceeded {
                kind: Self::KIND,
                len,
                limit,
            });
        }
        Ok(())
    }
}

macro_rules! impl_operation_list {
    ($list:ty, $kind:ident, $limit:ident) => {
        impl OperationList for $list {
            const KIND: OperationKind = OperationKind::$kind;

            fn limit(config: &Config) -> usize {
                config.$limit as usize
            }

            fn operation_count(&self) -> usize {
                self.len()
            }
        }
    };
}

impl_operation_list!(ProposerSlashings, ProposerSlashing, max_proposer_slashings);
impl_operation_list!(AttesterSlashings, AttesterSlashing, max_attester_slashings);
impl_operation_list!(Attestations, Attestation, max_attestations);
impl_operation_list!(Deposits, Deposit, max_deposits);
impl_operation_list!(Transfers, Transfer, max_transfers);
impl_operation_list!(VoluntaryExits, VoluntaryExit, max_voluntary_exits);

#[cfg(test)]
mod tests {
    use beacon_primitives::ValidatorIndex;
    use ssz::{Decode, Encode};

    use super::*;
    use crate::{
        phase0::beacon_block_body::BeaconBlockBody, pubkey::PubKey, signature::BlsSignature,
        voluntary_exit::VoluntaryExit,
    };

    fn exits(count: u64) -> VoluntaryExits {
        (0..count)
            .map(|validator_index| SignedVoluntaryExit {
                message: VoluntaryExit {
                    epoch: 0,
                    validator_index,
                },
                signature: BlsSignature::default(),
            })
            .collect::<Vec<_>>()
            .into()
    }

    #[test]
    fn test_limit_follows_config() {
        let mut config = Config::minimal();
        config.max_voluntary_exits = 2;

        assert!(exits(2).verify_limit(&config).is_ok());
        assert!(matches!(
            exits(3).verify_limit(&config),
            Err(BlockProcessingError::StructuralLimitExceeded {
                kind: OperationKind::VoluntaryExit,
                len: 3,
                limit: 2,
            })
        ));
    }

    #[test]
    fn test_body_over_capacity_fails_to_decode() {
        let config = Config::mainnet();
        let body = BeaconBlockBody {
            voluntary_exits: exits(config.max_voluntary_exits),
            ..Default::default()
        };
        let mut bytes = body.as_ssz_bytes();
        let decoded = BeaconBlockBody::from_ssz_bytes(&bytes).unwrap();
        assert!(decoded.voluntary_exits.verify_limit(&config).is_ok());

        // Exits are the trailing list of the body, so one more element extends it in place
        bytes.extend(exits(1)[0].as_ssz_bytes());

        assert!(BeaconBlockBody::from_ssz_bytes(&bytes).is_err());
    }

    #[test]
    fn test_transfers_are_disabled() {
        let transfer = |sender: ValidatorIndex| Transfer {
            sender,
            recipient: sender + 1,
            amount: 1,
            fee: 0,
            slot: 0,
            pubkey: PubKey::default(),
            signature: BlsSignature::default(),
        };
        let empty = Transfers::empty();
        let one: Transfers = vec![transfer(0)].into();

        assert!(empty.verify_limit(&Config::mainnet()).is_ok());
        assert!(one.verify_limit(&Config::mainnet()).is_err());
        assert!(one.verify_limit(&Config::minimal()).is_err());
    }
}
