// Copyright (c) Zefchain Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

//! The wallet object injected into the page by browser extensions.

use epic_nft_ethereum::{EthereumServiceError, JsonRpcClient};
use serde::Serialize as _;
use serde_json::Value;
use wasm_bindgen::{closure::Closure, prelude::*, JsCast as _};

#[wasm_bindgen]
extern "C" {
    /// An [EIP-1193](https://eips.ethereum.org/EIPS/eip-1193) provider.
    #[wasm_bindgen(typescript_type = "EIP1193Provider")]
    #[derive(Clone, Debug)]
    pub type Ethereum;

    #[wasm_bindgen(catch, method)]
    async fn request(this: &Ethereum, args: JsValue) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(method)]
    fn on(this: &Ethereum, event: &str, listener: &js_sys::Function);

    #[wasm_bindgen(method, js_name = "removeListener")]
    fn remove_listener(this: &Ethereum, event: &str, listener: &js_sys::Function);
}

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// The wallet rejected the request, for instance because the user declined it.
    #[error("{message} (code {code})")]
    Rejected { code: i64, message: String },

    #[error(transparent)]
    Ethereum(#[from] EthereumServiceError),

    #[error("failed to convert a JavaScript value: {0}")]
    Conversion(String),
}

impl From<JsValue> for ProviderError {
    fn from(value: JsValue) -> Self {
        let field = |name: &str| js_sys::Reflect::get(&value, &JsValue::from_str(name)).ok();
        let code = field("code").and_then(|code| code.as_f64());
        let message = field("message").and_then(|message| message.as_string());
        match (code, message) {
            (Some(code), Some(message)) => ProviderError::Rejected {
                code: code as i64,
                message,
            },
            (None, Some(message)) => ProviderError::Conversion(message),
            _ => ProviderError::Conversion(format!("{value:?}")),
        }
    }
}

impl From<serde_wasm_bindgen::Error> for ProviderError {
    fn from(error: serde_wasm_bindgen::Error) -> Self {
        ProviderError::Conversion(error.to_string())
    }
}

/// Parameters are passed to the wallet as plain objects rather than `Map`s.
static REQUEST_SERIALIZER: serde_wasm_bindgen::Serializer =
    serde_wasm_bindgen::Serializer::json_compatible();

/// The `window.ethereum` object, used as a JSON-RPC client.
#[derive(Clone, Debug)]
pub struct InjectedProvider {
    ethereum: Ethereum,
}

impl InjectedProvider {
    /// Returns the provider injected into `window`, if any.
    pub fn detect() -> Option<Self> {
        let window = web_sys::window()?;
        let ethereum = js_sys::Reflect::get(&window, &JsValue::from_str("ethereum")).ok()?;
        if ethereum.is_undefined() || ethereum.is_null() {
            tracing::info!("make sure you have MetaMask installed");
            return None;
        }
        tracing::info!("found the ethereum object");
        Some(Self {
            ethereum: ethereum.unchecked_into(),
        })
    }

    /// Calls `listener` on every `event` until the returned guard is dropped.
    pub fn subscribe(
        &self,
        event: &'static str,
        listener: impl FnMut(JsValue) + 'static,
    ) -> EventListener {
        let closure = Closure::<dyn FnMut(JsValue)>::new(listener);
        self.ethereum.on(event, closure.as_ref().unchecked_ref());
        EventListener {
            ethereum: self.ethereum.clone(),
            event,
            closure,
        }
    }
}

/// A listener registered on the provider, removed when dropped.
pub struct EventListener {
    ethereum: Ethereum,
    event: &'static str,
    closure: Closure<dyn FnMut(JsValue)>,
}

impl Drop for EventListener {
    fn drop(&mut self) {
        tracing::debug!(event = self.event, "removing provider listener");
        self.ethereum
            .remove_listener(self.event, self.closure.as_ref().unchecked_ref());
    }
}

#[derive(serde::Serialize)]
struct RequestArguments<'a> {
    method: &'a str,
    params: &'a Value,
}

impl JsonRpcClient for InjectedProvider {
    type Error = ProviderError;

    async fn request_raw(&self, method: &str, params: Value) -> Result<Value, Self::Error> {
        let arguments = RequestArguments {
            method,
            params: &params,
        }
        .serialize(&REQUEST_SERIALIZER)?;
        let result = self.ethereum.request(arguments).await?;
        tracing::trace!(method, "wallet request complete");
        if result.is_undefined() || result.is_null() {
            return Ok(Value::Null);
        }
        Ok(serde_wasm_bindgen::from_value(result)?)
    }
}
