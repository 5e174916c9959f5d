use std::path::Path;

use alloy_primitives::aliases::B32;
use anyhow::{ensure, Context};
use beacon_primitives::{Epoch, Gwei, Version};
use serde::{Deserialize, Serialize};

use crate::constants::{
    EPOCH_ATTESTATIONS_CAPACITY, ETH1_DATA_VOTES_CAPACITY, HISTORICAL_VECTOR_CAPACITY,
    SLASHINGS_VECTOR_CAPACITY,
};

/// Protocol parameters consumed by the state transition.
///
/// Keys follow the consensus-spec preset files, so a preset YAML can be loaded directly.
/// Missing keys fall back to the mainnet value.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "SCREAMING_SNAKE_CASE")]
pub struct Config {
    // Time
    pub slots_per_epoch: u64,
    pub min_seed_lookahead: Epoch,
    pub max_seed_lookahead: Epoch,
    pub min_attestation_inclusion_delay: u64,
    pub epochs_per_eth1_voting_period: u64,
    pub shard_committee_period: Epoch,
    pub min_validator_withdrawability_delay: Epoch,

    // Misc
    pub shuffle_round_count: u64,
    pub target_committee_size: u64,
    pub max_committees_per_slot: u64,
    pub min_per_epoch_churn_limit: u64,
    pub churn_limit_quotient: u64,

    // Gwei values
    pub max_effective_balance: Gwei,
    pub effective_balance_increment: Gwei,

    // State list lengths
    pub epochs_per_historical_vector: u64,
    pub epochs_per_slashings_vector: u64,

    // Rewards and penalties
    pub min_slashing_penalty_quotient: u64,
    pub whistleblower_reward_quotient: u64,
    pub proposer_reward_quotient: u64,

    // Max operations per block
    pub max_proposer_slashings: u64,
    pub max_attester_slashings: u64,
    pub max_attestations: u64,
    pub max_deposits: u64,
    pub max_transfers: u64,
    pub max_voluntary_exits: u64,

    // Fork
    pub genesis_fork_version: Version,
}

impl Default for Config {
    fn default() -> Self {
        Self::mainnet()
    }
}

impl Config {
    pub fn mainnet() -> Self {
        Self {
            slots_per_epoch: 32,
            min_seed_lookahead: 1,
            max_seed_lookahead: 4,
            min_attestation_inclusion_delay: 1,
            epochs_per_eth1_voting_period: 64,
            shard_committee_period: 256,
            min_validator_withdrawability_delay: 256,
            shuffle_round_count: 90,
            target_committee_size: 128,
            max_committees_per_slot: 64,
            min_per_epoch_churn_limit: 4,
            churn_limit_quotient: 65536,
            max_effective_balance: 32_000_000_000,
            effective_balance_increment: 1_000_000_000,
            epochs_per_historical_vector: 65536,
            epochs_per_slashings_vector: 8192,
            min_slashing_penalty_quotient: 128,
            whistleblower_reward_quotient: 512,
            proposer_reward_quotient: 8,
            max_proposer_slashings: 16,
            max_attester_slashings: 2,
            max_attestations: 128,
            max_deposits: 16,
            max_transfers: 0,
            max_voluntary_exits: 16,
            genesis_fork_version: B32::new([0x00, 0x00, 0x00, 0x00]),
        }
    }

    pub fn minimal() -> Self {
        Self {
            slots_per_epoch: 8,
            epochs_per_eth1_voting_period: 4,
            shard_committee_period: 64,
            shuffle_round_count: 10,
            target_committee_size: 4,
            max_committees_per_slot: 4,
            min_per_epoch_churn_limit: 2,
            churn_limit_quotient: 32,
            epochs_per_historical_vector: 64,
            epochs_per_slashings_vector: 64,
            genesis_fork_version: B32::new([0x00, 0x00, 0x00, 0x01]),
            ..Self::mainnet()
        }
    }

    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        let config: Config = serde_yaml::from_str(yaml).context("failed to parse config")?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_yaml_str(&yaml)
    }

    /// Check the values against each other and against the capacities of the state containers.
    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(self.slots_per_epoch > 0, "SLOTS_PER_EPOCH must be non-zero");
        ensure!(
            self.target_committee_size > 0 && self.max_committees_per_slot > 0,
            "committee sizing parameters must be non-zero"
        );
        ensure!(
            self.shuffle_round_count <= u8::MAX as u64,
            "SHUFFLE_ROUND_COUNT {} does not fit a round byte",
            self.shuffle_round_count
        );
        ensure!(
            self.churn_limit_quotient > 0
                && self.min_slashing_penalty_quotient > 0
                && self.whistleblower_reward_quotient > 0
                && self.proposer_reward_quotient > 0,
            "quotients must be non-zero"
        );
        ensure!(
            self.effective_balance_increment > 0
                && self.max_effective_balance >= self.effective_balance_increment,
            "MAX_EFFECTIVE_BALANCE must be at least one EFFECTIVE_BALANCE_INCREMENT"
        );
        ensure!(
            self.min_seed_lookahead < self.epochs_per_historical_vector,
            "MIN_SEED_LOOKAHEAD must be below EPOCHS_PER_HISTORICAL_VECTOR"
        );
        ensure!(
            self.epochs_per_historical_vector > 0
                && self.epochs_per_historical_vector <= HISTORICAL_VECTOR_CAPACITY,
            "EPOCHS_PER_HISTORICAL_VECTOR must be in 1..={HISTORICAL_VECTOR_CAPACITY}"
        );
        ensure!(
            self.epochs_per_slashings_vector > 0
                && self.epochs_per_slashings_vector <= SLASHINGS_VECTOR_CAPACITY,
            "EPOCHS_PER_SLASHINGS_VECTOR must be in 1..={SLASHINGS_VECTOR_CAPACITY}"
        );
        ensure!(
            self.epochs_per_eth1_voting_period * self.slots_per_epoch <= ETH1_DATA_VOTES_CAPACITY,
            "eth1 voting period exceeds {ETH1_DATA_VOTES_CAPACITY} votes"
        );
        ensure!(
            self.max_attestations * self.slots_per_epoch <= EPOCH_ATTESTATIONS_CAPACITY,
            "MAX_ATTESTATIONS per epoch exceeds {EPOCH_ATTESTATIONS_CAPACITY}"
        );
        for (name, value, capacity) in [
            ("MAX_PROPOSER_SLASHINGS", self.max_proposer_slashings, 16),
            ("MAX_ATTESTER_SLASHINGS", self.max_attester_slashings, 2),
            ("MAX_ATTESTATIONS", self.max_attestations, 128),
            ("MAX_DEPOSITS", self.max_deposits, 16),
            ("MAX_TRANSFERS", self.max_transfers, 16),
            ("MAX_VOLUNTARY_EXITS", self.max_voluntary_exits, 16),
        ] {
            ensure!(
                value <= capacity,
                "{name} is {value}, block body holds at most {capacity}"
            );
        }
        Ok(())
    }

    /// Slots that make up one eth1 voting period.
    pub fn slots_per_eth1_voting_period(&self) -> u64 {
        self.epochs_per_eth1_voting_period * self.slots_per_epoch
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_are_valid() {
        Config::mainnet().validate().unwrap();
        Config::minimal().validate().unwrap();
    }

    #[test]
    fn test_yaml_overrides_mainnet_defaults() {
        let config = Config::from_yaml_str(
            "SLOTS_PER_EPOCH: 8\nSHUFFLE_ROUND_COUNT: 10\nGENESIS_FORK_VERSION: '0x00000001'\nUNUSED_KEY: 12\n",
        )
        .unwrap();

        assert_eq!(config.slots_per_epoch, 8);
        assert_eq!(config.shuffle_round_count, 10);
        assert_eq!(config.genesis_fork_version, B32::new([0, 0, 0, 1]));
        assert_eq!(config.max_effective_balance, 32_000_000_000);
        assert_eq!(config.max_voluntary_exits, 16);
    }

    #[rstest::rstest]
    #[case("EPOCHS_PER_HISTORICAL_VECTOR: 131072\n")]
    #[case("MAX_VOLUNTARY_EXITS: 17\n")]
    #[case("SLOTS_PER_EPOCH: 0\n")]
    #[case("SHUFFLE_ROUND_COUNT: 300\n")]
    #[case("EPOCHS_PER_ETH1_VOTING_PERIOD: 128\n")]
    fn test_rejects_values_beyond_capacity(#[case] yaml: &str) {
        assert!(Config::from_yaml_str(yaml).is_err());
    }
}
