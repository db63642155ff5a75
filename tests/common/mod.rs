//! Simulated chain endpoint shared by the integration tests.
#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use alloy::consensus::{Transaction, TxEnvelope};
use alloy::eips::eip2718::Decodable2718;
use alloy::primitives::{address, keccak256, Address, Bytes, Log, TxHash, U256};
use alloy::rpc::types::TransactionRequest;
use alloy::sol_types::abi::TokenSeq;
use alloy::sol_types::{SolCall, SolEvent, SolType, SolValue};

use erc8004_validator::blockchain::{BlockchainError, BlockchainResult, ChainRpc, TransactionOutcome};
use erc8004_validator::config::{resolve_config, AppConfig, ResolvedConfig};
use erc8004_validator::contracts::abi::IIdentityRegistry;

/// Well-known development key (first Anvil account).
pub const TEST_PRIVATE_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
pub const TEST_ADDRESS: Address = address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266");

pub const IDENTITY_REGISTRY: Address = address!("1000000000000000000000000000000000000001");
pub const VALIDATION_REGISTRY: Address = address!("1000000000000000000000000000000000000002");
pub const STAKING_VALIDATOR: Address = address!("1000000000000000000000000000000000000003");
pub const STAKE_TOKEN: Address = address!("1000000000000000000000000000000000000004");

pub const CHAIN_ID: u64 = 11_155_111;

pub type Selector = [u8; 4];

/// Something the endpoint observed, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    Sent {
        selector: Selector,
        to: Address,
        nonce: u64,
        gas_limit: u64,
        tx_hash: TxHash,
    },
    ReceiptPoll(TxHash),
    Call(Selector),
}

/// A transaction the endpoint accepted.
#[derive(Debug, Clone)]
pub struct SentTx {
    pub selector: Selector,
    pub to: Address,
    pub nonce: u64,
    pub gas_limit: u64,
    pub input: Bytes,
}

pub struct MockState {
    pub chain_id: u64,
    pub balance: U256,
    pub nonce: u64,
    /// Pending count reported regardless of what was sent (a lagging node).
    pub frozen_nonce: Option<u64>,
    /// eth_call results by selector.
    pub call_responses: HashMap<Selector, Bytes>,
    /// Logs attached to receipts of transactions with this selector.
    pub receipt_logs: HashMap<Selector, Vec<Log>>,
    /// Transactions with these selectors revert.
    pub reverting: HashSet<Selector>,
    /// Broadcasts with these selectors are rejected by the node.
    pub rejected: HashSet<Selector>,
    /// When false no receipt ever appears.
    pub mining: bool,
    /// Chain ID reads that fail before the endpoint answers.
    pub connect_failures: u32,
    pub block_number: u64,
    pub sent: HashMap<TxHash, SentTx>,
    pub journal: Vec<Event>,
}

/// In-memory [`ChainRpc`] with scripted responses.
pub struct MockChain {
    pub state: Mutex<MockState>,
}

impl MockChain {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState {
                chain_id: CHAIN_ID,
                balance: U256::from(10u64).pow(U256::from(18u64)),
                nonce: 0,
                frozen_nonce: None,
                call_responses: HashMap::new(),
                receipt_logs: HashMap::new(),
                reverting: HashSet::new(),
                rejected: HashSet::new(),
                mining: true,
                connect_failures: 0,
                block_number: 100,
                sent: HashMap::new(),
                journal: Vec::new(),
            }),
        }
    }

    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    pub fn with<T>(&self, f: impl FnOnce(&mut MockState) -> T) -> T {
        let mut state = self.state.lock().unwrap();
        f(&mut state)
    }

    /// Script the return data of a read method.
    pub fn respond<C: SolCall, V: SolValue>(&self, value: V)
    where
        for<'a> <V::SolType as SolType>::Token<'a>: TokenSeq<'a>,
    {
        self.with(|s| {
            s.call_responses
                .insert(C::SELECTOR, Bytes::from(value.abi_encode_params()));
        });
    }

    pub fn revert<C: SolCall>(&self) {
        self.with(|s| {
            s.reverting.insert(C::SELECTOR);
        });
    }

    pub fn reject<C: SolCall>(&self) {
        self.with(|s| {
            s.rejected.insert(C::SELECTOR);
        });
    }

    pub fn emit_on<C: SolCall>(&self, logs: Vec<Log>) {
        self.with(|s| {
            s.receipt_logs.insert(C::SELECTOR, logs);
        });
    }

    pub fn set_mining(&self, mining: bool) {
        self.with(|s| s.mining = mining);
    }

    pub fn journal(&self) -> Vec<Event> {
        self.with(|s| s.journal.clone())
    }

    /// Selectors of accepted transactions, in broadcast order.
    pub fn sent_selectors(&self) -> Vec<Selector> {
        self.journal()
            .into_iter()
            .filter_map(|e| match e {
                Event::Sent { selector, .. } => Some(selector),
                _ => None,
            })
            .collect()
    }

    pub fn sent_tx(&self, tx_hash: TxHash) -> Option<SentTx> {
        self.with(|s| s.sent.get(&tx_hash).cloned())
    }

    pub fn receipt_polls(&self) -> usize {
        self.journal()
            .iter()
            .filter(|e| matches!(e, Event::ReceiptPoll(_)))
            .count()
    }

    pub fn calls(&self) -> usize {
        self.journal()
            .iter()
            .filter(|e| matches!(e, Event::Call(_)))
            .count()
    }
}

fn selector_of(input: &[u8]) -> Selector {
    let mut selector = [0u8; 4];
    if input.len() >= 4 {
        selector.copy_from_slice(&input[..4]);
    }
    selector
}

fn rpc_error(operation: &'static str, reason: &str) -> BlockchainError {
    BlockchainError::Rpc {
        endpoint: "mock://chain".to_string(),
        operation,
        reason: reason.to_string(),
    }
}

impl ChainRpc for MockChain {
    fn endpoint(&self) -> &str {
        "mock://chain"
    }

    async fn chain_id(&self) -> BlockchainResult<u64> {
        self.with(|s| {
            if s.connect_failures > 0 {
                s.connect_failures -= 1;
                Err(rpc_error("eth_chainId", "connection refused"))
            } else {
                Ok(s.chain_id)
            }
        })
    }

    async fn block_number(&self) -> BlockchainResult<u64> {
        Ok(self.with(|s| s.block_number))
    }

    async fn balance(&self, _address: Address) -> BlockchainResult<U256> {
        Ok(self.with(|s| s.balance))
    }

    async fn transaction_count(&self, _address: Address) -> BlockchainResult<u64> {
        Ok(self.with(|s| s.frozen_nonce.unwrap_or(s.nonce)))
    }

    async fn call(&self, request: TransactionRequest) -> BlockchainResult<Bytes> {
        let input = request.input.input().cloned().unwrap_or_default();
        let selector = selector_of(&input);
        self.with(|s| {
            s.journal.push(Event::Call(selector));
            s.call_responses
                .get(&selector)
                .cloned()
                .ok_or_else(|| rpc_error("eth_call", "execution reverted"))
        })
    }

    async fn send_raw_transaction(&self, raw: Bytes) -> BlockchainResult<TxHash> {
        let envelope = TxEnvelope::decode_2718(&mut raw.as_ref())
            .map_err(|e| rpc_error("eth_sendRawTransaction", &e.to_string()))?;
        let input = envelope.input().clone();
        let selector = selector_of(&input);
        let tx_hash = keccak256(&raw);

        self.with(|s| {
            if s.rejected.contains(&selector) {
                return Err(rpc_error("eth_sendRawTransaction", "insufficient funds for gas"));
            }
            let sent = SentTx {
                selector,
                to: envelope.to().unwrap_or_default(),
                nonce: envelope.nonce(),
                gas_limit: envelope.gas_limit(),
                input,
            };
            s.journal.push(Event::Sent {
                selector,
                to: sent.to,
                nonce: sent.nonce,
                gas_limit: sent.gas_limit,
                tx_hash,
            });
            s.nonce = s.nonce.max(sent.nonce + 1);
            s.sent.insert(tx_hash, sent);
            Ok(tx_hash)
        })
    }

    async fn transaction_receipt(&self, tx_hash: TxHash) -> BlockchainResult<Option<TransactionOutcome>> {
        self.with(|s| {
            s.journal.push(Event::ReceiptPoll(tx_hash));
            if !s.mining {
                return Ok(None);
            }
            let Some(sent) = s.sent.get(&tx_hash) else {
                return Ok(None);
            };
            s.block_number += 1;
            Ok(Some(TransactionOutcome {
                tx_hash,
                success: !s.reverting.contains(&sent.selector),
                gas_used: 21_000,
                block_number: Some(s.block_number),
                logs: s.receipt_logs.get(&sent.selector).cloned().unwrap_or_default(),
            }))
        })
    }
}

/// `Registered` log as the identity registry emits it.
pub fn registered_log(agent_id: u64, token_uri: &str, owner: Address) -> Log {
    let event = IIdentityRegistry::Registered {
        agentId: U256::from(agent_id),
        tokenURI: token_uri.to_string(),
        owner,
    };
    Log {
        address: IDENTITY_REGISTRY,
        data: event.encode_log_data(),
    }
}

/// Environment for a complete configuration pointing at the mock addresses.
pub fn test_env() -> HashMap<&'static str, String> {
    HashMap::from([
        ("ERC8004_RPC_URL", "http://127.0.0.1:8545".to_string()),
        ("ERC8004_IDENTITY_REGISTRY", IDENTITY_REGISTRY.to_string()),
        ("ERC8004_VALIDATION_REGISTRY", VALIDATION_REGISTRY.to_string()),
        ("ERC8004_STAKING_VALIDATOR", STAKING_VALIDATOR.to_string()),
        ("ERC8004_STAKE_TOKEN", STAKE_TOKEN.to_string()),
        ("ERC8004_ADMIN_PRIVATE_KEY", TEST_PRIVATE_KEY.to_string()),
    ])
}

/// Resolved configuration with fast polling and no stage delay.
pub fn test_config() -> ResolvedConfig {
    let env = test_env();
    let mut config = AppConfig::default();
    config.network.receipt_poll_interval_ms = 10;
    config.network.connect_retry_delay_ms = 10;
    config.workflow.stage_delay_secs = 0;
    config.workflow.receipt_timeout_secs = 5;
    resolve_config(config, |key| env.get(key).cloned()).unwrap()
}

/// `n` whole tokens in base units.
pub fn tokens(n: u64) -> U256 {
    U256::from(n) * U256::from(10u64).pow(U256::from(18u64))
}
