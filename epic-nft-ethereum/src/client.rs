// Copyright (c) Zefchain Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::common::EthereumServiceError;

/// A connection to an Ethereum node able to answer JSON-RPC requests.
///
/// Implementors only forward a method and its positional parameters; the typed helpers of
/// this crate take care of encoding and decoding.
#[cfg_attr(not(web), trait_variant::make(Send))]
pub trait JsonRpcClient {
    type Error: From<EthereumServiceError> + std::error::Error + Send + Sync + 'static;

    /// Sends `method` with `params` and returns the `result` member of the response.
    async fn request_raw(&self, method: &str, params: Value) -> Result<Value, Self::Error>;
}

/// Sends a request and deserializes its result into `R`.
pub async fn request<C, R>(client: &C, method: &str, params: Value) -> Result<R, C::Error>
where
    C: JsonRpcClient + ?Sized,
    R: DeserializeOwned,
{
    tracing::trace!(method, %params, "JSON-RPC request");
    let result = client.request_raw(method, params).await?;
    serde_json::from_value(result).map_err(|error| EthereumServiceError::from(error).into())
}

/// The block parameter of a request: a hexadecimal number, or `latest` when not given.
pub fn get_block_id(block_number: Option<u64>) -> Value {
    match block_number {
        None => Value::from("latest"),
        Some(number) => Value::from(format!("{number:#x}")),
    }
}
