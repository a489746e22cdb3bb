// Copyright (c) Zefchain Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
# `epic-nft-web`

The JavaScript bindings of the Epic NFT minting page.

It is compiled to Wasm and drives the `window.ethereum` object injected by wallet
extensions. The page itself is rendered into a host element chosen with [`App::attach`].
*/

#![cfg(target_arch = "wasm32")]
// Some bindings need to be async for the generated code to return a `Promise`.
#![allow(clippy::unused_async)]

mod frontend;
mod provider;
mod render;

use std::sync::Arc;

use alloy_primitives::Address;
use epic_nft_core::{controller::Providers, ConnectOutcome, MintConfig, MintController, MintError};
use epic_nft_ethereum::{Eip1193Wallet, EpicNftContract};
use wasm_bindgen::{closure::Closure, prelude::*, JsCast as _};
use web_sys::Element;

pub use crate::{
    frontend::BrowserFrontend,
    provider::{EventListener, InjectedProvider, ProviderError},
};

type JsResult<T> = Result<T, JsError>;

type Controller = MintController<
    Eip1193Wallet<InjectedProvider>,
    EpicNftContract<InjectedProvider>,
    BrowserFrontend,
>;

/// The click handler dispatching the actions of the page's buttons.
struct ClickListener {
    root: Element,
    closure: Closure<dyn FnMut(web_sys::Event)>,
}

impl Drop for ClickListener {
    fn drop(&mut self) {
        let _ = self
            .root
            .remove_event_listener_with_callback("click", self.closure.as_ref().unchecked_ref());
    }
}

/// The minting page.
#[wasm_bindgen]
pub struct App {
    controller: Controller,
    frontend: BrowserFrontend,
    _provider_listeners: Vec<EventListener>,
    click_listener: Option<ClickListener>,
}

#[wasm_bindgen]
impl App {
    /// Creates the page. `options` may override any field of the default configuration.
    ///
    /// # Errors
    /// If the options cannot be deserialized.
    #[wasm_bindgen(constructor)]
    pub fn new(options: JsValue) -> JsResult<App> {
        let config = if options.is_undefined() || options.is_null() {
            MintConfig::default()
        } else {
            serde_wasm_bindgen::from_value::<MintConfig>(options)?
        };
        let frontend = BrowserFrontend::default();
        let provider = InjectedProvider::detect().map(Arc::new);
        let providers = provider.as_ref().map(|provider| Providers {
            wallet: Eip1193Wallet::new(provider.clone()),
            contract: EpicNftContract::new(
                provider.clone(),
                config.contract_address,
                config.poll_interval(),
            ),
        });
        let controller = MintController::new(config, providers, frontend.clone());
        let provider_listeners = provider
            .map(|provider| Self::listen_to_provider(&provider, &controller))
            .unwrap_or_default();
        Ok(App {
            controller,
            frontend,
            _provider_listeners: provider_listeners,
            click_listener: None,
        })
    }

    /// Renders the page into the element with the id `root_id` and handles its buttons.
    ///
    /// # Errors
    /// If there is no such element.
    #[wasm_bindgen]
    pub fn attach(&mut self, root_id: &str) -> JsResult<()> {
        let root = web_sys::window()
            .and_then(|window| window.document())
            .and_then(|document| document.get_element_by_id(root_id))
            .ok_or_else(|| JsError::new(&format!("no element with id {root_id:?}")))?;
        let controller = self.controller.clone();
        let closure = Closure::<dyn FnMut(web_sys::Event)>::new(move |event: web_sys::Event| {
            let action = event
                .target()
                .and_then(|target| target.dyn_into::<Element>().ok())
                .and_then(|target| target.closest("[data-action]").ok().flatten())
                .and_then(|button| button.get_attribute("data-action"));
            let controller = controller.clone();
            match action.as_deref() {
                Some(render::CONNECT_ACTION) => wasm_bindgen_futures::spawn_local(async move {
                    if let ConnectOutcome::Rejected(error) = controller.connect_wallet().await {
                        tracing::debug!(%error, "connection rejected");
                    }
                }),
                Some(render::MINT_ACTION) => wasm_bindgen_futures::spawn_local(async move {
                    if let Err(error) = controller.ask_contract_to_mint_nft().await {
                        tracing::debug!(%error, "mint failed");
                    }
                }),
                _ => {}
            }
        });
        root.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref())
            .map_err(|error| JsError::new(&format!("failed to listen to clicks: {error:?}")))?;
        self.frontend.set_root(root.clone());
        self.click_listener = Some(ClickListener { root, closure });
        self.render();
        Ok(())
    }

    /// Runs the connection and network checks of a freshly loaded page, and returns the
    /// resulting view.
    ///
    /// # Errors
    /// If the view cannot be converted to JavaScript.
    #[wasm_bindgen]
    pub async fn mount(&self) -> JsResult<JsValue> {
        let outcome = self.controller.mount().await;
        tracing::debug!(?outcome, "mounted");
        self.render();
        self.view()
    }

    /// Asks the wallet to connect an account.
    ///
    /// # Errors
    /// If no wallet is installed or the user declined the request.
    #[wasm_bindgen(js_name = connectWallet)]
    pub async fn connect_wallet(&self) -> JsResult<String> {
        match self.controller.connect_wallet().await {
            ConnectOutcome::Connected { account, .. } => Ok(account.to_string()),
            ConnectOutcome::Rejected(error) => Err(error.into()),
            ConnectOutcome::ProviderMissing => Err(MintError::ProviderMissing.into()),
        }
    }

    /// Mints a token and returns the explorer URL of the transaction.
    ///
    /// # Errors
    /// If the transaction could not be sent or was reverted.
    #[wasm_bindgen]
    pub async fn mint(&self) -> JsResult<String> {
        let receipt = self.controller.ask_contract_to_mint_nft().await?;
        Ok(receipt.transaction_url)
    }

    /// Returns what the page currently shows.
    ///
    /// # Errors
    /// If the view cannot be converted to JavaScript.
    #[wasm_bindgen]
    pub fn view(&self) -> JsResult<JsValue> {
        Ok(frontend::view_to_js(&self.controller.view())?)
    }

    /// Calls `callback` with the new view after every change.
    #[wasm_bindgen(js_name = onChange)]
    pub fn on_change(&self, callback: js_sys::Function) {
        self.frontend.set_on_change(callback);
    }
}

impl App {
    fn listen_to_provider(
        provider: &InjectedProvider,
        controller: &Controller,
    ) -> Vec<EventListener> {
        let on_chain_changed = {
            let controller = controller.clone();
            move |chain_id: JsValue| {
                let Some(chain_id) = chain_id.as_string() else {
                    tracing::warn!(?chain_id, "unexpected chain id");
                    return;
                };
                let controller = controller.clone();
                wasm_bindgen_futures::spawn_local(async move {
                    if let Err(error) = controller.handle_chain_changed(&chain_id).await {
                        tracing::warn!(%error, "failed to handle the network change");
                    }
                });
            }
        };
        let on_accounts_changed = {
            let controller = controller.clone();
            move |accounts: JsValue| {
                let accounts = match serde_wasm_bindgen::from_value::<Vec<Address>>(accounts) {
                    Ok(accounts) => accounts,
                    Err(error) => {
                        tracing::warn!(%error, "unexpected account list");
                        return;
                    }
                };
                let controller = controller.clone();
                wasm_bindgen_futures::spawn_local(async move {
                    if let Err(error) = controller.handle_accounts_changed(&accounts).await {
                        tracing::warn!(%error, "failed to handle the account change");
                    }
                });
            }
        };
        vec![
            provider.subscribe("chainChanged", on_chain_changed),
            provider.subscribe("accountsChanged", on_accounts_changed),
        ]
    }

    fn render(&self) {
        use epic_nft_core::Frontend as _;

        self.frontend.render(&self.controller.view());
    }
}

impl Drop for App {
    fn drop(&mut self) {
        self.controller.shutdown();
    }
}

#[wasm_bindgen(start)]
pub fn main() {
    use tracing_subscriber::{
        prelude::__tracing_subscriber_SubscriberExt as _, util::SubscriberInitExt as _,
    };

    std::panic::set_hook(Box::new(console_error_panic_hook::hook));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .without_time()
                .with_writer(tracing_web::MakeWebConsoleWriter::new()),
        )
        .with(
            tracing_web::performance_layer()
                .with_details_from_fields(tracing_subscriber::fmt::format::Pretty::default()),
        )
        .init();
}
