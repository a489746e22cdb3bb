// Copyright (c) Zefchain Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use alloy_primitives::{Address, Bytes, B256, U256, U64};
use alloy_sol_types::{sol, SolCall, SolEvent as _};
use epic_nft_core::provider::MintedEvent;
use serde::{Deserialize, Serialize};
use thiserror::Error;

sol! {
    /// The deployed Epic NFT contract.
    function makeAnEpicNFT() external;
    function totalMinted() external view returns (uint256);
    function totalSupply() external view returns (uint256);

    event NewEpicNFTMinted(address sender, uint256 tokenId);
}

#[derive(Debug, Error)]
pub enum EthereumServiceError {
    /// The node answered with a JSON-RPC error object
    #[error("JSON-RPC error {code}: {message}")]
    JsonRpcError { code: i64, message: String },

    /// `serde_json` error
    #[error(transparent)]
    JsonError(#[from] serde_json::Error),

    /// Return data or log data that does not match the contract ABI
    #[error(transparent)]
    AbiError(#[from] alloy_sol_types::Error),

    #[error("transaction {0} was reverted")]
    TransactionReverted(B256),

    #[error("Event parsing error")]
    EventParsingError,
}

/// The subset of a transaction receipt needed to confirm a mint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionReceipt {
    pub transaction_hash: B256,
    pub block_number: Option<U64>,
    /// `1` on success and `0` on failure. Absent before the Byzantium fork.
    #[serde(default)]
    pub status: Option<U64>,
}

impl TransactionReceipt {
    pub fn is_reverted(&self) -> bool {
        self.status.is_some_and(|status| status.is_zero())
    }
}

/// A log entry, as returned by `eth_getLogs`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Log {
    pub address: Address,
    pub topics: Vec<B256>,
    pub data: Bytes,
    pub block_number: Option<U64>,
    pub transaction_hash: Option<B256>,
    /// Set when the log was removed by a chain reorganization.
    #[serde(default)]
    pub removed: bool,
}

/// Decodes the `uint256` returned by the view function `T`. Empty data means the call
/// returned nothing, typically because no contract is deployed at the address.
pub fn parse_uint256<T>(data: &[u8]) -> Result<Option<U256>, EthereumServiceError>
where
    T: SolCall<Return = U256>,
{
    if data.is_empty() {
        return Ok(None);
    }
    Ok(Some(T::abi_decode_returns(data)?))
}

/// Returns whether `log` carries a `NewEpicNFTMinted` event.
pub fn is_minted_log(log: &Log) -> bool {
    log.topics.first() == Some(&NewEpicNFTMinted::SIGNATURE_HASH)
}

/// Decodes a `NewEpicNFTMinted(address,uint256)` log.
pub fn parse_minted_log(log: &Log) -> Result<MintedEvent, EthereumServiceError> {
    if !is_minted_log(log) {
        return Err(EthereumServiceError::EventParsingError);
    }
    let event = NewEpicNFTMinted::decode_raw_log(log.topics.iter().copied(), &log.data)?;
    Ok(MintedEvent {
        from: event.sender,
        token_id: event.tokenId,
    })
}
