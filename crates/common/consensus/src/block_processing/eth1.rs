use std::borrow::BorrowMut;

use tracing::debug;

use super::Eth1VoteProcessor;
use crate::{
    config::Config,
    errors::BlockProcessingError,
    eth_1_data::Eth1Data,
    meta::Eth1VoteMeta,
    phase0::{beacon_state::BeaconState, state_meta::StateMeta},
};

/// Record the block's eth1 vote and adopt it once it has a majority of the voting period.
pub fn process_eth1_data<M: Eth1VoteMeta + ?Sized>(
    config: &Config,
    meta: &mut M,
    vote: &Eth1Data,
) -> Result<(), BlockProcessingError> {
    meta.push_eth1_vote(vote.clone())?;
    if meta.count_eth1_votes(vote) * 2 > config.slots_per_eth1_voting_period() {
        debug!(
            deposit_count = vote.deposit_count,
            block_hash = %vote.block_hash,
            "adopted eth1 data"
        );
        meta.set_eth1_data(vote.clone());
    }
    Ok(())
}

impl<S: BorrowMut<BeaconState>> Eth1VoteProcessor for StateMeta<'_, S> {
    fn process_eth1_vote(
        &mut self,
        config: &Config,
        vote: &Eth1Data,
    ) -> Result<(), BlockProcessingError> {
        process_eth1_data(config, self, vote)
    }
}

#[cfg(test)]
mod tests {
    use alloy_primitives::B256;

    use super::*;
    use crate::{meta::Eth1Voting, test_utils::genesis_state};

    #[test]
    fn test_vote_is_adopted_past_half_of_period() {
        let config = Config::minimal();
        let mut state = genesis_state(&config, 4);
        let mut meta = StateMeta::new(&config, &mut state);
        let vote = Eth1Data {
            deposit_root: B256::repeat_byte(1),
            deposit_count: 12,
            block_hash: B256::repeat_byte(2),
        };
        let half = config.slots_per_eth1_voting_period() / 2;

        for _ in 0..half {
            process_eth1_data(&config, &mut meta, &vote).unwrap();
        }
        assert_eq!(meta.eth1_data(), &Eth1Data::default());

        process_eth1_data(&config, &mut meta, &vote).unwrap();
        assert_eq!(meta.eth1_data(), &vote);
        assert_eq!(meta.count_eth1_votes(&vote), half + 1);
    }
}
