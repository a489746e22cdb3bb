// Copyright (c) Zefchain Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

//! In-memory wallet, contract and page used to test the controller.

use std::sync::{Arc, Mutex, MutexGuard};

use alloy_primitives::{Address, B256, U256};
use futures::channel::{mpsc, oneshot};

use crate::{
    controller::{MintController, Providers},
    provider::{
        ConfirmedTransaction, ContractProxy, Frontend, MintedEvent, ReadMethod, WalletProvider,
    },
    state::Notification,
    task::{self, BoxStream},
    time::{timer, Duration, Instant},
    view::View,
    MintConfig,
};

#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct FakeError(pub String);

#[derive(Default)]
struct FakeWalletState {
    authorized: Vec<Address>,
    grantable: Vec<Address>,
    chain_id: String,
    rejecting: bool,
    requests: usize,
}

/// A wallet extension whose answers are set by the test.
#[derive(Clone, Default)]
pub struct FakeWallet(Arc<Mutex<FakeWalletState>>);

impl FakeWallet {
    pub fn new(chain_id: &str) -> Self {
        let wallet = Self::default();
        wallet.set_chain_id(chain_id);
        wallet
    }

    fn lock(&self) -> MutexGuard<'_, FakeWalletState> {
        self.0.lock().unwrap()
    }

    /// Marks `account` as already authorized, so no prompt is needed.
    pub fn authorize(&self, account: Address) {
        let mut state = self.lock();
        state.authorized.push(account);
        state.grantable.push(account);
    }

    /// Sets the accounts the user grants when prompted.
    pub fn grant(&self, accounts: Vec<Address>) {
        self.lock().grantable = accounts;
    }

    /// Makes the user decline every prompt.
    pub fn reject_requests(&self) {
        self.lock().rejecting = true;
    }

    pub fn set_chain_id(&self, chain_id: &str) {
        self.lock().chain_id = chain_id.to_string();
    }

    /// The number of times the user was prompted.
    pub fn request_count(&self) -> usize {
        self.lock().requests
    }
}

impl WalletProvider for FakeWallet {
    type Error = FakeError;

    async fn request_accounts(&self) -> Result<Vec<Address>, FakeError> {
        let mut state = self.lock();
        state.requests += 1;
        if state.rejecting {
            return Err(FakeError("User rejected the request.".to_string()));
        }
        state.authorized = state.grantable.clone();
        Ok(state.authorized.clone())
    }

    async fn accounts(&self) -> Result<Vec<Address>, FakeError> {
        Ok(self.lock().authorized.clone())
    }

    async fn chain_id(&self) -> Result<String, FakeError> {
        Ok(self.lock().chain_id.clone())
    }
}

#[derive(Default)]
struct FakeContractState {
    minted: Option<U256>,
    supply: Option<U256>,
    read_error: Option<String>,
    mint_error: Option<String>,
    confirm_error: Option<String>,
    held_confirmation: Option<oneshot::Receiver<()>>,
    subscribers: Vec<mpsc::UnboundedSender<Result<MintedEvent, FakeError>>>,
    mints: Vec<Address>,
}

/// A deployed NFT contract whose answers are set by the test.
#[derive(Clone, Default)]
pub struct FakeContract(Arc<Mutex<FakeContractState>>);

impl FakeContract {
    pub fn new(minted: u64, supply: u64) -> Self {
        let contract = Self::default();
        contract.set_counters(Some(minted), Some(supply));
        contract
    }

    fn lock(&self) -> MutexGuard<'_, FakeContractState> {
        self.0.lock().unwrap()
    }

    pub fn set_counters(&self, minted: Option<u64>, supply: Option<u64>) {
        let mut state = self.lock();
        state.minted = minted.map(U256::from);
        state.supply = supply.map(U256::from);
    }

    pub fn fail_reads(&self, message: &str) {
        self.lock().read_error = Some(message.to_string());
    }

    pub fn fail_mints(&self, message: &str) {
        self.lock().mint_error = Some(message.to_string());
    }

    pub fn fail_confirmations(&self, message: &str) {
        self.lock().confirm_error = Some(message.to_string());
    }

    /// Makes the next confirmation wait until the returned sender fires or is dropped.
    pub fn hold_confirmation(&self) -> oneshot::Sender<()> {
        let (sender, receiver) = oneshot::channel();
        self.lock().held_confirmation = Some(receiver);
        sender
    }

    /// Delivers a mint event to every live subscription.
    pub fn emit(&self, event: MintedEvent) {
        for subscriber in &self.lock().subscribers {
            let _ = subscriber.unbounded_send(Ok(event));
        }
    }

    /// The number of subscriptions that were not released yet.
    pub fn active_subscriptions(&self) -> usize {
        self.lock()
            .subscribers
            .iter()
            .filter(|subscriber| !subscriber.is_closed())
            .count()
    }

    /// The accounts that submitted a mint transaction.
    pub fn mints(&self) -> Vec<Address> {
        self.lock().mints.clone()
    }

    pub fn transaction_hash(index: usize) -> B256 {
        B256::left_padding_from(&(index as u64 + 1).to_be_bytes())
    }
}

impl ContractProxy for FakeContract {
    type Error = FakeError;
    type Events = BoxStream<'static, Result<MintedEvent, FakeError>>;

    async fn read(&self, method: ReadMethod) -> Result<Option<U256>, FakeError> {
        let state = self.lock();
        if let Some(message) = &state.read_error {
            return Err(FakeError(message.clone()));
        }
        Ok(match method {
            ReadMethod::TotalMinted => state.minted,
            ReadMethod::TotalSupply => state.supply,
        })
    }

    async fn mint(&self, from: Address) -> Result<B256, FakeError> {
        let mut state = self.lock();
        if let Some(message) = &state.mint_error {
            return Err(FakeError(message.clone()));
        }
        state.mints.push(from);
        Ok(Self::transaction_hash(state.mints.len() - 1))
    }

    async fn confirm(&self, hash: B256) -> Result<ConfirmedTransaction, FakeError> {
        let held = self.lock().held_confirmation.take();
        if let Some(held) = held {
            let _ = held.await;
        }
        if let Some(message) = &self.lock().confirm_error {
            return Err(FakeError(message.clone()));
        }
        Ok(ConfirmedTransaction {
            hash,
            block_number: Some(1),
        })
    }

    async fn subscribe_minted(&self) -> Result<Self::Events, FakeError> {
        let (sender, receiver) = mpsc::unbounded();
        self.lock().subscribers.push(sender);
        Ok(task::boxed(receiver))
    }
}

/// A page that records what it is asked to show.
#[derive(Clone, Default)]
pub struct RecordingFrontend {
    notifications: Arc<Mutex<Vec<Notification>>>,
    views: Arc<Mutex<Vec<View>>>,
}

impl RecordingFrontend {
    pub fn notifications(&self) -> Vec<Notification> {
        self.notifications.lock().unwrap().clone()
    }

    pub fn render_count(&self) -> usize {
        self.views.lock().unwrap().len()
    }

    pub fn last_view(&self) -> Option<View> {
        self.views.lock().unwrap().last().cloned()
    }
}

impl Frontend for RecordingFrontend {
    fn notify(&self, notification: &Notification) {
        self.notifications.lock().unwrap().push(notification.clone());
    }

    fn render(&self, view: &View) {
        self.views.lock().unwrap().push(view.clone());
    }
}

pub type TestController = MintController<FakeWallet, FakeContract, RecordingFrontend>;

/// Creates a controller with the default configuration. `None` simulates a browser
/// without a wallet extension.
pub fn make_controller(
    providers: Option<(FakeWallet, FakeContract)>,
) -> (TestController, RecordingFrontend) {
    let frontend = RecordingFrontend::default();
    let providers = providers.map(|(wallet, contract)| Providers { wallet, contract });
    let controller = MintController::new(MintConfig::default(), providers, frontend.clone());
    (controller, frontend)
}

/// Waits until `condition` holds, panicking after a few seconds.
pub async fn wait_until(mut condition: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !condition() {
        assert!(Instant::now() < deadline, "condition not reached in time");
        timer::sleep(Duration::from_millis(5)).await;
    }
}
