// Copyright (c) Zefchain Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use std::{collections::VecDeque, sync::Arc};

use alloy_primitives::{Address, Bytes, B256, U256, U64};
use alloy_sol_types::{SolCall as _, SolEvent as _};
use epic_nft_core::{
    provider::{ConfirmedTransaction, MintedEvent, ReadMethod},
    task::{self, BoxStream, MaybeSend, MaybeSync},
    time::{timer, Duration},
    ContractProxy,
};
use serde_json::json;

use crate::{
    client::{get_block_id, request, JsonRpcClient},
    common::{
        is_minted_log, makeAnEpicNFTCall, parse_minted_log, parse_uint256, totalMintedCall,
        totalSupplyCall, Log, NewEpicNFTMinted, TransactionReceipt,
    },
};

/// The Epic NFT contract deployed at `address`, reached through `client`.
pub struct EpicNftContract<C> {
    client: Arc<C>,
    address: Address,
    poll_interval: Duration,
}

impl<C> Clone for EpicNftContract<C> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            address: self.address,
            poll_interval: self.poll_interval,
        }
    }
}

impl<C> EpicNftContract<C> {
    /// Creates a proxy polling receipts and logs every `poll_interval`.
    pub fn new(client: Arc<C>, address: Address, poll_interval: Duration) -> Self {
        Self {
            client,
            address,
            poll_interval,
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }
}

impl<C> EpicNftContract<C>
where
    C: JsonRpcClient + MaybeSend + MaybeSync,
{
    /// Runs a call without creating a transaction, against the latest block.
    async fn non_executive_call(&self, data: Vec<u8>) -> Result<Bytes, C::Error> {
        let call = json!({ "to": self.address, "data": Bytes::from(data) });
        request(&*self.client, "eth_call", json!([call, get_block_id(None)])).await
    }
}

/// The progress of a subscription to `NewEpicNFTMinted` events.
struct LogPoller<C> {
    client: Arc<C>,
    address: Address,
    poll_interval: Duration,
    next_block: u64,
    pending: VecDeque<MintedEvent>,
}

impl<C> LogPoller<C>
where
    C: JsonRpcClient + MaybeSend + MaybeSync,
{
    /// Fetches the events of the blocks produced since the last poll.
    async fn poll(&mut self) -> Result<(), C::Error> {
        let latest = request::<_, U64>(&*self.client, "eth_blockNumber", json!([]))
            .await?
            .to::<u64>();
        if latest < self.next_block {
            return Ok(());
        }
        let filter = json!({
            "address": self.address,
            "topics": [NewEpicNFTMinted::SIGNATURE_HASH],
            "fromBlock": get_block_id(Some(self.next_block)),
            "toBlock": get_block_id(Some(latest)),
        });
        let logs = request::<_, Vec<Log>>(&*self.client, "eth_getLogs", json!([filter])).await?;
        tracing::debug!(
            from = self.next_block,
            to = latest,
            count = logs.len(),
            "fetched contract logs"
        );
        for log in logs.iter().filter(|log| !log.removed && is_minted_log(log)) {
            match parse_minted_log(log) {
                Ok(event) => self.pending.push_back(event),
                Err(error) => tracing::warn!(%error, ?log, "ignoring malformed mint event"),
            }
        }
        self.next_block = latest + 1;
        Ok(())
    }

    async fn next_event(mut self) -> (Result<MintedEvent, C::Error>, Self) {
        loop {
            if let Some(event) = self.pending.pop_front() {
                return (Ok(event), self);
            }
            timer::sleep(self.poll_interval).await;
            if let Err(error) = self.poll().await {
                return (Err(error), self);
            }
        }
    }
}

impl<C> ContractProxy for EpicNftContract<C>
where
    C: JsonRpcClient + MaybeSend + MaybeSync + 'static,
{
    type Error = C::Error;
    type Events = BoxStream<'static, Result<MintedEvent, C::Error>>;

    async fn read(&self, method: ReadMethod) -> Result<Option<U256>, Self::Error> {
        let value = match method {
            ReadMethod::TotalMinted => {
                let output = self.non_executive_call(totalMintedCall {}.abi_encode()).await?;
                parse_uint256::<totalMintedCall>(&output)?
            }
            ReadMethod::TotalSupply => {
                let output = self.non_executive_call(totalSupplyCall {}.abi_encode()).await?;
                parse_uint256::<totalSupplyCall>(&output)?
            }
        };
        Ok(value)
    }

    async fn mint(&self, from: Address) -> Result<B256, Self::Error> {
        let transaction = json!({
            "from": from,
            "to": self.address,
            "data": Bytes::from(makeAnEpicNFTCall {}.abi_encode()),
        });
        request(&*self.client, "eth_sendTransaction", json!([transaction])).await
    }

    async fn confirm(&self, hash: B256) -> Result<ConfirmedTransaction, Self::Error> {
        loop {
            let receipt = request::<_, Option<TransactionReceipt>>(
                &*self.client,
                "eth_getTransactionReceipt",
                json!([hash]),
            )
            .await?;
            match receipt {
                Some(receipt) if receipt.is_reverted() => {
                    return Err(crate::EthereumServiceError::TransactionReverted(hash).into());
                }
                Some(receipt) => {
                    return Ok(ConfirmedTransaction {
                        hash: receipt.transaction_hash,
                        block_number: receipt.block_number.map(|number| number.to::<u64>()),
                    });
                }
                None => {
                    tracing::trace!(%hash, "transaction not mined yet");
                    timer::sleep(self.poll_interval).await;
                }
            }
        }
    }

    async fn subscribe_minted(&self) -> Result<Self::Events, Self::Error> {
        let current = request::<_, U64>(&*self.client, "eth_blockNumber", json!([]))
            .await?
            .to::<u64>();
        tracing::debug!(block = current, contract = %self.address, "polling mint events");
        let poller = LogPoller {
            client: self.client.clone(),
            address: self.address,
            poll_interval: self.poll_interval,
            next_block: current + 1,
            pending: VecDeque::new(),
        };
        let events = futures::stream::unfold(poller, |poller| async move {
            Some(poller.next_event().await)
        });
        Ok(task::boxed(events))
    }
}
