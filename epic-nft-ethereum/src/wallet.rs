// Copyright (c) Zefchain Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use std::sync::Arc;

use alloy_primitives::Address;
use epic_nft_core::{
    task::{MaybeSend, MaybeSync},
    WalletProvider,
};
use serde_json::json;

use crate::client::{request, JsonRpcClient};

/// The account methods of an [EIP-1193](https://eips.ethereum.org/EIPS/eip-1193) wallet.
pub struct Eip1193Wallet<C> {
    client: Arc<C>,
}

impl<C> Clone for Eip1193Wallet<C> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
        }
    }
}

impl<C> Eip1193Wallet<C> {
    pub fn new(client: Arc<C>) -> Self {
        Self { client }
    }
}

impl<C> WalletProvider for Eip1193Wallet<C>
where
    C: JsonRpcClient + MaybeSend + MaybeSync,
{
    type Error = C::Error;

    async fn request_accounts(&self) -> Result<Vec<Address>, Self::Error> {
        request(&*self.client, "eth_requestAccounts", json!([])).await
    }

    async fn accounts(&self) -> Result<Vec<Address>, Self::Error> {
        request(&*self.client, "eth_accounts", json!([])).await
    }

    async fn chain_id(&self) -> Result<String, Self::Error> {
        request(&*self.client, "eth_chainId", json!([])).await
    }
}
