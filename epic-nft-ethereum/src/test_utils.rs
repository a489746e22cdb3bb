// Copyright (c) Zefchain Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex},
};

use alloy_primitives::{Address, U256};
use alloy_sol_types::SolEvent as _;
use epic_nft_core::time::Duration;
use serde_json::{json, Value};

use crate::{
    client::JsonRpcClient,
    common::{EthereumServiceError, NewEpicNFTMinted},
    EpicNftContract,
};

/// A JSON-RPC node answering from a script of canned responses.
///
/// Responses of a method are consumed in order, and the last one keeps being returned.
#[derive(Default)]
pub struct MockTransport {
    responses: Mutex<HashMap<String, VecDeque<Result<Value, (i64, String)>>>>,
    requests: Mutex<Vec<(String, Value)>>,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queues a successful result for `method`.
    pub fn respond(&self, method: &str, result: Value) -> &Self {
        self.push(method, Ok(result))
    }

    /// Queues an error response for `method`.
    pub fn fail(&self, method: &str, code: i64, message: &str) -> &Self {
        self.push(method, Err((code, message.to_string())))
    }

    fn push(&self, method: &str, response: Result<Value, (i64, String)>) -> &Self {
        self.responses
            .lock()
            .unwrap()
            .entry(method.to_string())
            .or_default()
            .push_back(response);
        self
    }

    /// The requests received so far, in order.
    pub fn requests(&self) -> Vec<(String, Value)> {
        self.requests.lock().unwrap().clone()
    }

    /// The parameters of every request for `method`.
    pub fn params_of(&self, method: &str) -> Vec<Value> {
        self.requests()
            .into_iter()
            .filter(|(name, _)| name == method)
            .map(|(_, params)| params)
            .collect()
    }
}

impl JsonRpcClient for MockTransport {
    type Error = EthereumServiceError;

    async fn request_raw(&self, method: &str, params: Value) -> Result<Value, Self::Error> {
        self.requests
            .lock()
            .unwrap()
            .push((method.to_string(), params));
        let mut responses = self.responses.lock().unwrap();
        let queue = responses
            .get_mut(method)
            .ok_or_else(|| EthereumServiceError::JsonRpcError {
                code: -32601,
                message: format!("the method {method} does not exist/is not available"),
            })?;
        let response = if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        };
        match response {
            Some(Ok(result)) => Ok(result),
            Some(Err((code, message))) => Err(EthereumServiceError::JsonRpcError { code, message }),
            None => Ok(Value::Null),
        }
    }
}

/// A contract at a fixed address, polling every millisecond.
pub fn mock_contract(transport: &Arc<MockTransport>) -> EpicNftContract<MockTransport> {
    EpicNftContract::new(
        transport.clone(),
        Address::repeat_byte(0x93),
        Duration::from_millis(1),
    )
}

/// The JSON form of a `NewEpicNFTMinted` log emitted in `block`.
pub fn minted_log(sender: Address, token_id: u64, block: u64) -> Value {
    let mut data = sender.into_word().to_vec();
    data.extend_from_slice(&U256::from(token_id).to_be_bytes::<32>());
    json!({
        "address": Address::repeat_byte(0x93),
        "topics": [NewEpicNFTMinted::SIGNATURE_HASH],
        "data": alloy_primitives::Bytes::from(data),
        "blockNumber": format!("{block:#x}"),
        "transactionHash": null,
        "removed": false,
    })
}

/// A uint256 return value, as returned by `eth_call`.
pub fn encoded_uint(value: u64) -> Value {
    json!(alloy_primitives::Bytes::from(U256::from(value).to_be_bytes::<32>().to_vec()))
}
