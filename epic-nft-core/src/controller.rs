// Copyright (c) Zefchain Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

//! The controller of the minting page: it connects the wallet, checks the network, mints
//! tokens and keeps a [`MintState`] in sync with the contract.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use alloy_primitives::{Address, U256};
use futures::StreamExt as _;
use serde::Serialize;

use crate::{
    provider::{
        ConfirmedTransaction, ContractProxy, Frontend, MintedEvent, ReadMethod, WalletProvider,
    },
    state::{Counters, MintState, NetworkStatus, Notification, StateEvent},
    task::{MaybeSend, MaybeSync, TaskGuard},
    view::View,
    ChainId, MintConfig, MintError,
};

/// The wallet and the contract, which are only available when a wallet is installed.
pub struct Providers<W, C> {
    pub wallet: W,
    pub contract: C,
}

/// The result of looking for an already authorized account.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConnectionStatus {
    Connected(Address),
    NotAuthorized,
    ProviderMissing,
}

/// The result of an explicit connection request.
#[derive(Debug)]
pub enum ConnectOutcome {
    Connected {
        account: Address,
        network: NetworkStatus,
    },
    Rejected(MintError),
    ProviderMissing,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ListenerStatus {
    Listening,
    /// The wallet is not on the expected network.
    Skipped,
}

/// The result of the checks performed when the page is mounted.
#[derive(Debug)]
pub struct MountOutcome {
    pub connection: Result<ConnectionStatus, MintError>,
    pub network: Result<NetworkStatus, MintError>,
    /// Set if the listener was started after both checks succeeded.
    pub listener: Option<Result<ListenerStatus, MintError>>,
}

/// A confirmed mint transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MintReceipt {
    pub transaction: ConfirmedTransaction,
    pub transaction_url: String,
}

/// Drives the minting page. Clones share the same state.
pub struct MintController<W, C, F> {
    inner: Arc<Inner<W, C, F>>,
}

impl<W, C, F> Clone for MintController<W, C, F> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

struct Inner<W, C, F> {
    config: MintConfig,
    providers: Option<Providers<W, C>>,
    frontend: F,
    state: Mutex<MintState>,
    /// The task forwarding contract events. Dropping it ends the subscription.
    listener: Mutex<Option<TaskGuard>>,
}

impl<W, C, F: Frontend> Inner<W, C, F> {
    fn state(&self) -> MutexGuard<'_, MintState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn listener(&self) -> MutexGuard<'_, Option<TaskGuard>> {
        self.listener.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn update(&self, event: StateEvent) {
        self.apply_locked(self.state(), event);
    }

    /// Applies `event` to the already locked state. The page is notified and rendered
    /// after the lock is released.
    fn apply_locked(&self, mut state: MutexGuard<'_, MintState>, event: StateEvent) {
        let notification = state.apply(event);
        let view = View::new(&state, &self.config);
        drop(state);
        if let Some(notification) = notification {
            self.notify(&notification);
        }
        self.frontend.render(&view);
    }

    fn notify(&self, notification: &Notification) {
        tracing::debug!(%notification, "notifying the user");
        self.frontend.notify(notification);
    }
}

/// Keeps the state in [`MintPhase::Mining`](crate::MintPhase::Mining) while alive, and
/// returns it to idle when dropped without a confirmation.
struct MiningGuard<'a, W, C, F: Frontend> {
    inner: &'a Inner<W, C, F>,
    armed: bool,
}

impl<'a, W, C, F: Frontend> MiningGuard<'a, W, C, F> {
    fn start(inner: &'a Inner<W, C, F>) -> Result<Self, MintError> {
        let state = inner.state();
        if state.is_mining() {
            return Err(MintError::MintInProgress);
        }
        inner.apply_locked(state, StateEvent::MintSubmitted);
        Ok(Self { inner, armed: true })
    }

    fn confirm(mut self, transaction_url: String) {
        self.armed = false;
        self.inner.update(StateEvent::MintConfirmed { transaction_url });
    }
}

impl<W, C, F: Frontend> Drop for MiningGuard<'_, W, C, F> {
    fn drop(&mut self) {
        if self.armed {
            self.inner.update(StateEvent::MiningAborted);
        }
    }
}

impl<W, C, F> MintController<W, C, F>
where
    W: WalletProvider + MaybeSend + MaybeSync + 'static,
    C: ContractProxy + MaybeSend + MaybeSync + 'static,
    F: Frontend + MaybeSend + MaybeSync + 'static,
{
    /// Creates a controller. `providers` is `None` when no wallet is installed.
    pub fn new(config: MintConfig, providers: Option<Providers<W, C>>, frontend: F) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                providers,
                frontend,
                state: Mutex::new(MintState::default()),
                listener: Mutex::new(None),
            }),
        }
    }

    pub fn config(&self) -> &MintConfig {
        &self.inner.config
    }

    /// Returns a snapshot of the current state.
    pub fn state(&self) -> MintState {
        self.inner.state().clone()
    }

    pub fn view(&self) -> View {
        View::new(&self.inner.state(), &self.inner.config)
    }

    /// Whether contract events are currently being listened to.
    pub fn is_listening(&self) -> bool {
        self.inner.listener().is_some()
    }

    fn providers(&self) -> Result<&Providers<W, C>, MintError> {
        self.inner
            .providers
            .as_ref()
            .ok_or(MintError::ProviderMissing)
    }

    /// Runs the checks of a freshly loaded page: the connection check and the network
    /// check run concurrently, and the listener is started once both succeeded.
    pub async fn mount(&self) -> MountOutcome {
        let (connection, network) = futures::join!(
            self.check_if_wallet_is_connected(),
            self.check_correct_network()
        );
        match &connection {
            Ok(status) => tracing::debug!(?status, "connection check complete"),
            Err(error) => tracing::warn!(%error, "failed to check the wallet connection"),
        }
        match &network {
            Ok(status) => tracing::debug!(?status, "network check complete"),
            Err(MintError::ProviderMissing) => {}
            Err(error) => tracing::warn!(%error, "failed to check the network"),
        }
        let listener = match (&connection, &network) {
            (Ok(ConnectionStatus::Connected(_)), Ok(NetworkStatus::Correct))
                if !self.is_listening() =>
            {
                Some(self.setup_event_listener().await)
            }
            _ => None,
        };
        MountOutcome {
            connection,
            network,
            listener,
        }
    }

    /// Looks for an account the page is already authorized for, without prompting the
    /// user, and starts listening to the contract if one is found.
    pub async fn check_if_wallet_is_connected(&self) -> Result<ConnectionStatus, MintError> {
        let Some(providers) = self.inner.providers.as_ref() else {
            tracing::info!("no wallet provider found, make sure a wallet extension is installed");
            return Ok(ConnectionStatus::ProviderMissing);
        };
        let accounts = providers
            .wallet
            .accounts()
            .await
            .map_err(MintError::wallet)?;
        let Some(&account) = accounts.first() else {
            tracing::info!("no authorized account found");
            return Ok(ConnectionStatus::NotAuthorized);
        };
        tracing::info!(%account, "found an authorized account");
        self.inner.update(StateEvent::AccountAuthorized(account));
        if let Err(error) = self.setup_event_listener().await {
            tracing::warn!(%error, "failed to set up the event listener");
        }
        Ok(ConnectionStatus::Connected(account))
    }

    /// Compares the wallet's network with the configured one, warning the user on a
    /// mismatch.
    pub async fn check_correct_network(&self) -> Result<NetworkStatus, MintError> {
        let providers = self.providers()?;
        let chain_id = providers
            .wallet
            .chain_id()
            .await
            .map_err(MintError::wallet)?;
        self.record_chain_id(&chain_id)
    }

    fn record_chain_id(&self, chain_id: &str) -> Result<NetworkStatus, MintError> {
        let actual = chain_id.parse::<ChainId>()?;
        tracing::info!(%actual, "connected to chain");
        self.inner.update(StateEvent::ChainChecked {
            actual,
            expected: self.inner.config.chain_id,
            network_name: self.inner.config.network_name.clone(),
        });
        Ok(self.inner.state().network)
    }

    /// Asks the wallet to authorize the page.
    pub async fn connect_wallet(&self) -> ConnectOutcome {
        let Some(providers) = self.inner.providers.as_ref() else {
            self.inner.notify(&Notification::InstallWallet);
            return ConnectOutcome::ProviderMissing;
        };
        match self.request_connection(providers).await {
            Ok((account, network)) => ConnectOutcome::Connected { account, network },
            Err(error) => {
                tracing::warn!(%error, "failed to connect the wallet");
                self.inner.update(StateEvent::Failed(error.to_string()));
                ConnectOutcome::Rejected(error)
            }
        }
    }

    async fn request_connection(
        &self,
        providers: &Providers<W, C>,
    ) -> Result<(Address, NetworkStatus), MintError> {
        let chain_id = providers
            .wallet
            .chain_id()
            .await
            .map_err(MintError::wallet)?;
        let network = self.record_chain_id(&chain_id)?;
        let accounts = providers
            .wallet
            .request_accounts()
            .await
            .map_err(MintError::wallet)?;
        let account = *accounts.first().ok_or(MintError::NoAccounts)?;
        tracing::info!(%account, "connected");
        self.inner.update(StateEvent::AccountAuthorized(account));
        if let Err(error) = self.setup_event_listener().await {
            tracing::warn!(%error, "failed to set up the event listener");
        }
        Ok((account, network))
    }

    /// Subscribes to the contract's mint events and reads the counters, unless the
    /// wallet is on the wrong network. A previous subscription is released.
    pub async fn setup_event_listener(&self) -> Result<ListenerStatus, MintError> {
        let providers = self.providers()?;
        if !self.inner.state().network.is_correct() {
            tracing::debug!("not on the expected network, not listening to mint events");
            return Ok(ListenerStatus::Skipped);
        }
        let events = providers
            .contract
            .subscribe_minted()
            .await
            .map_err(MintError::contract)?;
        let listener = TaskGuard::spawn(Self::listen(Arc::downgrade(&self.inner), events));
        if self.inner.listener().replace(listener).is_some() {
            tracing::debug!("released the previous mint event subscription");
        }
        tracing::info!("listening to mint events");
        if let Err(error) = self.refresh_counters().await {
            tracing::warn!(%error, "failed to read the contract counters");
            self.inner.update(StateEvent::Failed(error.to_string()));
        }
        Ok(ListenerStatus::Listening)
    }

    async fn listen(inner: Weak<Inner<W, C, F>>, mut events: C::Events) {
        while let Some(event) = events.next().await {
            let Some(inner) = inner.upgrade() else {
                break;
            };
            let controller = MintController { inner };
            match event {
                Ok(event) => controller.on_minted(event).await,
                Err(error) => tracing::warn!(%error, "failed to receive a mint event"),
            }
        }
        tracing::debug!("mint event stream ended");
    }

    async fn on_minted(&self, event: MintedEvent) {
        tracing::info!(from = %event.from, token_id = %event.token_id, "token minted");
        self.inner.update(StateEvent::TokenMinted {
            token_id: event.token_id,
            asset_url: self.inner.config.asset_url(event.token_id),
        });
        if let Err(error) = self.refresh_counters().await {
            tracing::warn!(%error, "failed to refresh the contract counters");
        }
    }

    /// Reads the number of minted tokens and the supply cap from the contract.
    ///
    /// A counter that could not be read keeps its previous value; the first failure is
    /// returned after the other counter was stored.
    pub async fn refresh_counters(&self) -> Result<Counters, MintError> {
        let providers = self.providers()?;
        let (minted, supply) = futures::join!(
            providers.contract.read(ReadMethod::TotalMinted),
            providers.contract.read(ReadMethod::TotalSupply),
        );
        let minted = Self::counter(minted);
        let supply = Self::counter(supply);
        tracing::debug!(?minted, ?supply, "read the contract counters");
        self.inner.update(StateEvent::CountersRead {
            minted: minted.as_ref().ok().copied().flatten(),
            supply: supply.as_ref().ok().copied().flatten(),
        });
        minted?;
        supply?;
        Ok(self.inner.state().counters)
    }

    fn counter(result: Result<Option<U256>, C::Error>) -> Result<Option<u64>, MintError> {
        match result.map_err(MintError::contract)? {
            None => Ok(None),
            Some(value) => u64::try_from(value)
                .map(Some)
                .map_err(|_| MintError::CounterOverflow(value)),
        }
    }

    /// Mints a token for the connected account and waits for its confirmation.
    ///
    /// The state is in the mining phase for the whole call, whatever its outcome.
    pub async fn ask_contract_to_mint_nft(&self) -> Result<MintReceipt, MintError> {
        let providers = self.providers()?;
        let account = self.inner.state().account.ok_or(MintError::NotConnected)?;
        let mining = MiningGuard::start(&self.inner)?;
        match self.submit_mint(providers, account).await {
            Ok(receipt) => {
                tracing::info!(url = %receipt.transaction_url, "mined");
                mining.confirm(receipt.transaction_url.clone());
                Ok(receipt)
            }
            Err(error) => {
                tracing::warn!(%error, "failed to mint");
                drop(mining);
                self.inner.update(StateEvent::Failed(error.to_string()));
                Err(error)
            }
        }
    }

    async fn submit_mint(
        &self,
        providers: &Providers<W, C>,
        account: Address,
    ) -> Result<MintReceipt, MintError> {
        tracing::info!(%account, "asking the wallet to pay for the mint transaction");
        let hash = providers
            .contract
            .mint(account)
            .await
            .map_err(MintError::contract)?;
        tracing::info!(%hash, "mining, please wait");
        let transaction = providers
            .contract
            .confirm(hash)
            .await
            .map_err(MintError::contract)?;
        Ok(MintReceipt {
            transaction_url: self.inner.config.transaction_url(transaction.hash),
            transaction,
        })
    }

    /// Handles the wallet switching networks.
    pub async fn handle_chain_changed(&self, chain_id: &str) -> Result<NetworkStatus, MintError> {
        self.providers()?;
        let network = self.record_chain_id(chain_id)?;
        if !network.is_correct() {
            if self.inner.listener().take().is_some() {
                tracing::info!("stopped listening to mint events after a network change");
            }
        } else if self.inner.state().account.is_some() {
            self.setup_event_listener().await?;
        }
        Ok(network)
    }

    /// Handles the wallet switching accounts. An empty list leaves the current account in
    /// place, since the page has no disconnected mode once connected.
    pub async fn handle_accounts_changed(
        &self,
        accounts: &[Address],
    ) -> Result<ConnectionStatus, MintError> {
        self.providers()?;
        let Some(&account) = accounts.first() else {
            tracing::info!("the wallet no longer exposes any account");
            return Ok(ConnectionStatus::NotAuthorized);
        };
        if self.inner.state().account == Some(account) {
            return Ok(ConnectionStatus::Connected(account));
        }
        tracing::info!(%account, "switched account");
        self.inner.update(StateEvent::AccountAuthorized(account));
        if !self.is_listening() {
            self.setup_event_listener().await?;
        }
        Ok(ConnectionStatus::Connected(account))
    }

    /// Stops listening to contract events.
    pub fn shutdown(&self) {
        if self.inner.listener().take().is_some() {
            tracing::debug!("released the mint event subscription");
        }
    }
}

#[cfg(test)]
#[path = "unit_tests/controller_tests.rs"]
mod tests;
