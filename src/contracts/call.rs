//! Read-only contract calls.

use alloy::network::TransactionBuilder;
use alloy::rpc::types::TransactionRequest;

use crate::blockchain::client::ChainRpc;
use crate::blockchain::types::{BlockchainError, BlockchainResult};
use crate::contracts::{ContractEndpoint, ContractMethod, Mutability};

/// Execute a read method with `eth_call` and decode its return value.
///
/// No transaction is created and no nonce is consumed.
pub async fn read<R, C>(rpc: &R, endpoint: &ContractEndpoint, call: &C) -> BlockchainResult<C::Return>
where
    R: ChainRpc,
    C: ContractMethod,
{
    let method = C::SIGNATURE;
    if C::MUTABILITY != Mutability::Read {
        return Err(BlockchainError::InvalidArgument(format!(
            "{} is a write method and must be submitted as a transaction",
            method
        )));
    }
    if C::CONTRACT != endpoint.kind {
        return Err(BlockchainError::InvalidArgument(format!(
            "{} belongs to {}, not {}",
            method, C::CONTRACT, endpoint.kind
        )));
    }

    let request = TransactionRequest::default()
        .with_to(endpoint.address)
        .with_input(call.abi_encode());

    let data = rpc
        .call(request)
        .await
        .map_err(|e| BlockchainError::CallFailed {
            method,
            reason: e.to_string(),
        })?;

    C::abi_decode_returns(&data).map_err(|e| BlockchainError::AbiDecode {
        method,
        reason: e.to_string(),
    })
}
