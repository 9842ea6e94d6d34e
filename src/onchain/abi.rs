//! Contract bindings for the JackpotGame and BondingCurve contracts.
//!
//! We define minimal ABIs covering just the events and view functions the
//! herald needs. Topic0 hashes come from the generated `SIGNATURE_HASH`
//! constants and are used in `eth_getLogs` filters.

use alloy::primitives::B256;
use alloy::sol;
use alloy::sol_types::SolEvent;

use crate::onchain::types::EventKind;

sol! {
    #[sol(rpc)]
    interface IJackpotGame {
        event JackpotWon(address indexed winner, uint256 amount, string guess);
        event SocialAnnouncement(string announcementType, string message);
        event NewPlayer(address indexed player);
        event HintRequested(address indexed player, uint256 hintIndex);
        event HintAdded(uint256 index);

        function getGameStats() external view returns (
            uint256 totalGuesses,
            uint256 uniquePlayers,
            uint256 totalWinners,
            uint256 currentJackpot
        );
        function jackpotAmount() external view returns (uint256);
        function hintCount() external view returns (uint256);
        function emitGameUpdate(string message) external;
    }

    #[sol(rpc)]
    interface IBondingCurve {
        function getPoolInfo() external view returns (uint256 virtualS, uint256 actualS);
        function getCurrentPrice() external view returns (uint256);
    }
}

/// keccak256 of the event signature for each watched kind.
pub fn topic_for(kind: EventKind) -> B256 {
    match kind {
        EventKind::JackpotWon => IJackpotGame::JackpotWon::SIGNATURE_HASH,
        EventKind::SocialAnnouncement => IJackpotGame::SocialAnnouncement::SIGNATURE_HASH,
        EventKind::NewPlayer => IJackpotGame::NewPlayer::SIGNATURE_HASH,
        EventKind::HintRequested => IJackpotGame::HintRequested::SIGNATURE_HASH,
        EventKind::HintAdded => IJackpotGame::HintAdded::SIGNATURE_HASH,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::keccak256;

    #[test]
    fn test_topics_match_signatures() {
        let checks = [
            (EventKind::JackpotWon, "JackpotWon(address,uint256,string)"),
            (EventKind::SocialAnnouncement, "SocialAnnouncement(string,string)"),
            (EventKind::NewPlayer, "NewPlayer(address)"),
            (EventKind::HintRequested, "HintRequested(address,uint256)"),
            (EventKind::HintAdded, "HintAdded(uint256)"),
        ];
        for (kind, sig) in checks {
            assert_eq!(topic_for(kind), keccak256(sig.as_bytes()), "{sig}");
        }
    }

    #[test]
    fn test_topics_are_distinct() {
        let mut topics: Vec<B256> = EventKind::ALL.iter().map(|k| topic_for(*k)).collect();
        topics.sort();
        topics.dedup();
        assert_eq!(topics.len(), EventKind::ALL.len());
    }
}
