// Copyright (c) Zefchain Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

//! The collaborators of the minting controller: the wallet, the contract and the page.

use alloy_primitives::{Address, B256, U256};
use futures::Stream;
use serde::Serialize;

use crate::{state::Notification, task::MaybeSend, view::View};

/// An account-holding wallet, typically injected into the page by a browser extension.
#[cfg_attr(not(web), trait_variant::make(Send))]
pub trait WalletProvider {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Asks the user to authorize the page. This may open the wallet's own UI.
    async fn request_accounts(&self) -> Result<Vec<Address>, Self::Error>;

    /// Returns the accounts the page is already authorized for, without prompting.
    async fn accounts(&self) -> Result<Vec<Address>, Self::Error>;

    /// Returns the chain id of the active network, as reported by the wallet.
    async fn chain_id(&self) -> Result<String, Self::Error>;
}

/// The read-only methods of the NFT contract.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ReadMethod {
    TotalMinted,
    TotalSupply,
}

/// The contract's notification that a token was minted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MintedEvent {
    pub from: Address,
    pub token_id: U256,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmedTransaction {
    pub hash: B256,
    pub block_number: Option<u64>,
}

/// The deployed NFT contract.
#[cfg_attr(not(web), trait_variant::make(Send))]
pub trait ContractProxy {
    type Error: std::error::Error + Send + Sync + 'static;

    /// The mint events delivered after a subscription. Dropping the stream ends the
    /// subscription.
    type Events: Stream<Item = Result<MintedEvent, Self::Error>> + Unpin + MaybeSend + 'static;

    /// Calls a read-only method. Returns `None` if the contract returned no data.
    async fn read(&self, method: ReadMethod) -> Result<Option<U256>, Self::Error>;

    /// Submits a mint transaction signed by `from`, returning its hash.
    async fn mint(&self, from: Address) -> Result<B256, Self::Error>;

    /// Waits until the transaction `hash` is included in a block.
    async fn confirm(&self, hash: B256) -> Result<ConfirmedTransaction, Self::Error>;

    async fn subscribe_minted(&self) -> Result<Self::Events, Self::Error>;
}

/// The page the controller drives.
pub trait Frontend {
    /// Shows a message the user has to acknowledge.
    fn notify(&self, notification: &Notification);

    /// Called after every state change.
    fn render(&self, view: &View);
}
