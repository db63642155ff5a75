//! Recover the agent ID minted by a registration transaction.

use alloy::primitives::U256;
use alloy::sol_types::SolEvent;

use crate::blockchain::types::{BlockchainError, BlockchainResult, TransactionOutcome};
use crate::contracts::abi::IIdentityRegistry::Registered;

/// Agent ID from the first `Registered` event in the receipt.
///
/// Logs from other contracts in the same transaction are skipped. If more
/// than one `Registered` event is present the first one, in receipt order,
/// wins.
pub fn extract_registered_id(outcome: &TransactionOutcome) -> BlockchainResult<U256> {
    outcome
        .logs
        .iter()
        .filter(|log| log.topics().first() == Some(&Registered::SIGNATURE_HASH))
        .find_map(|log| Registered::decode_log(log).ok())
        .map(|decoded| decoded.data.agentId)
        .ok_or(BlockchainError::EventNotFound {
            event: "Registered",
            tx_hash: outcome.tx_hash,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{Address, Log, LogData, TxHash, B256};

    fn registered_log(agent_id: u64) -> Log {
        let event = Registered {
            agentId: U256::from(agent_id),
            tokenURI: format!("https://api.aliasai.io/agent/{}.json", agent_id),
            owner: Address::repeat_byte(0x11),
        };
        Log {
            address: Address::repeat_byte(0x80),
            data: event.encode_log_data(),
        }
    }

    fn transfer_log() -> Log {
        // ERC-721 Transfer emitted alongside registration.
        let topic0 = alloy::primitives::keccak256("Transfer(address,address,uint256)");
        Log {
            address: Address::repeat_byte(0x80),
            data: LogData::new_unchecked(
                vec![topic0, B256::ZERO, B256::repeat_byte(0x11), B256::with_last_byte(9)],
                Default::default(),
            ),
        }
    }

    fn outcome(logs: Vec<Log>) -> TransactionOutcome {
        TransactionOutcome {
            tx_hash: TxHash::repeat_byte(0x42),
            success: true,
            gas_used: 180_000,
            block_number: Some(1),
            logs,
        }
    }

    #[test]
    fn test_single_registered_event() {
        let id = extract_registered_id(&outcome(vec![transfer_log(), registered_log(377)])).unwrap();
        assert_eq!(id, U256::from(377));
    }

    #[test]
    fn test_missing_event() {
        let err = extract_registered_id(&outcome(vec![transfer_log()])).unwrap_err();
        match err {
            BlockchainError::EventNotFound { event, tx_hash } => {
                assert_eq!(event, "Registered");
                assert_eq!(tx_hash, TxHash::repeat_byte(0x42));
            }
            other => panic!("expected EventNotFound, got {other}"),
        }
    }

    #[test]
    fn test_first_match_wins() {
        let id = extract_registered_id(&outcome(vec![registered_log(5), registered_log(6)])).unwrap();
        assert_eq!(id, U256::from(5));
    }
}
