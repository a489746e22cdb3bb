// Copyright (c) Zefchain Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Compiled-in settings of the minting page, overridable by the embedding page.

use std::{fmt, str::FromStr};

use alloy_primitives::{address, Address};
use serde::{Deserialize, Serialize};

use crate::{time::Duration, MintError};

/// The identifier of an EVM network, as reported by `eth_chainId`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ChainId(pub u64);

impl ChainId {
    /// The Rinkeby test network.
    pub const RINKEBY: ChainId = ChainId(4);
}

impl FromStr for ChainId {
    type Err = MintError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        let parsed = match trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
        {
            Some(hex) => u64::from_str_radix(hex, 16),
            None => trimmed.parse(),
        };
        parsed
            .map(ChainId)
            .map_err(|_| MintError::InvalidChainId(value.to_string()))
    }
}

impl TryFrom<String> for ChainId {
    type Error = MintError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ChainId> for String {
    fn from(chain_id: ChainId) -> Self {
        chain_id.to_string()
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Settings of the minting page.
///
/// Every field can be overridden individually when deserializing; missing fields keep
/// their default value.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MintConfig {
    /// The address of the deployed NFT contract.
    pub contract_address: Address,
    /// The only network the page accepts.
    pub chain_id: ChainId,
    /// The human-readable name of `chain_id`.
    pub network_name: String,
    /// The block explorer used to link to mint transactions.
    pub explorer_url: String,
    /// The marketplace used to link to minted assets.
    pub marketplace_url: String,
    /// The collection page on the marketplace.
    pub collection_url: String,
    /// The social profile credited in the footer.
    pub social_handle: String,
    /// How often receipts and contract events are polled.
    pub poll_interval_ms: u64,
}

impl Default for MintConfig {
    fn default() -> Self {
        Self {
            contract_address: address!("93ad3eeb4ae2c2e47b5ae5e0ccc8c859212cc5d4"),
            chain_id: ChainId::RINKEBY,
            network_name: "Rinkeby".to_string(),
            explorer_url: "https://rinkeby.etherscan.io".to_string(),
            marketplace_url: "https://testnets.opensea.io".to_string(),
            collection_url: "https://testnets.opensea.io/collection/jonnienft-v3".to_string(),
            social_handle: "JonnieLappen".to_string(),
            poll_interval_ms: 4000,
        }
    }
}

impl MintConfig {
    /// The explorer page of a transaction.
    pub fn transaction_url(&self, hash: impl fmt::Display) -> String {
        format!("{}/tx/{hash}", self.explorer_url.trim_end_matches('/'))
    }

    /// The marketplace page of a minted token.
    pub fn asset_url(&self, token_id: impl fmt::Display) -> String {
        format!(
            "{}/assets/{}/{token_id}",
            self.marketplace_url.trim_end_matches('/'),
            self.contract_address,
        )
    }

    pub fn social_url(&self) -> String {
        format!("https://twitter.com/{}", self.social_handle)
    }

    /// The host name of the explorer, for link captions.
    pub fn explorer_host(&self) -> &str {
        let url = self.explorer_url.trim_end_matches('/');
        url.split_once("://").map_or(url, |(_, host)| host)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}
