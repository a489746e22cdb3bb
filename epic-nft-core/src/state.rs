// Copyright (c) Zefchain Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

//! The observable state of the minting page and its transition function.

use std::fmt;

use alloy_primitives::{Address, U256};
use serde::Serialize;

use crate::ChainId;

/// Whether the wallet is on the network the contract is deployed to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum NetworkStatus {
    /// The network has not been checked yet, or could not be checked.
    #[default]
    Unknown,
    Correct,
    Wrong { actual: ChainId },
}

impl NetworkStatus {
    pub fn is_correct(&self) -> bool {
        matches!(self, NetworkStatus::Correct)
    }

    pub fn is_wrong(&self) -> bool {
        matches!(self, NetworkStatus::Wrong { .. })
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum MintPhase {
    #[default]
    Idle,
    /// A mint transaction was submitted and is not confirmed yet.
    Mining,
}

/// The contract counters, as last read. `None` means no data was received.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Counters {
    pub minted: Option<u64>,
    pub supply: Option<u64>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MintState {
    /// The authorized wallet account, if any.
    pub account: Option<Address>,
    pub network: NetworkStatus,
    pub phase: MintPhase,
    /// The explorer link of the last confirmed mint transaction.
    pub transaction_url: Option<String>,
    pub counters: Counters,
    /// The last failure worth showing to the user.
    pub error: Option<String>,
}

/// Something that happened to the controller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StateEvent {
    AccountAuthorized(Address),
    ChainChecked {
        actual: ChainId,
        expected: ChainId,
        network_name: String,
    },
    MintSubmitted,
    MintConfirmed {
        transaction_url: String,
    },
    /// The mint flow ended without a confirmation.
    MiningAborted,
    CountersRead {
        minted: Option<u64>,
        supply: Option<u64>,
    },
    TokenMinted {
        token_id: U256,
        asset_url: String,
    },
    Failed(String),
}

/// A blocking message for the user.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Notification {
    WrongNetwork { network_name: String },
    InstallWallet,
    Minted { token_id: U256, asset_url: String },
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notification::WrongNetwork { network_name } => {
                write!(f, "You are not connected to the {network_name} Test Network!")
            }
            Notification::InstallWallet => write!(f, "Get MetaMask!"),
            Notification::Minted { asset_url, .. } => write!(
                f,
                "Hey there! We've minted your NFT and sent it to your wallet. \
                 It may be blank right now. It can take a max of 10 min to show up on OpenSea. \
                 Here's the link: {asset_url}"
            ),
        }
    }
}

impl MintState {
    pub fn is_mining(&self) -> bool {
        self.phase == MintPhase::Mining
    }

    /// Applies `event`, returning the notification the user must see, if any.
    pub fn apply(&mut self, event: StateEvent) -> Option<Notification> {
        match event {
            StateEvent::AccountAuthorized(account) => {
                self.account = Some(account);
                self.error = None;
            }
            StateEvent::ChainChecked {
                actual,
                expected,
                network_name,
            } => {
                if actual == expected {
                    self.network = NetworkStatus::Correct;
                } else {
                    self.network = NetworkStatus::Wrong { actual };
                    return Some(Notification::WrongNetwork { network_name });
                }
            }
            StateEvent::MintSubmitted => {
                self.phase = MintPhase::Mining;
                self.transaction_url = None;
                self.error = None;
            }
            StateEvent::MintConfirmed { transaction_url } => {
                self.phase = MintPhase::Idle;
                self.transaction_url = Some(transaction_url);
            }
            StateEvent::MiningAborted => self.phase = MintPhase::Idle,
            StateEvent::CountersRead { minted, supply } => {
                if minted.is_some() {
                    self.counters.minted = minted;
                }
                if supply.is_some() {
                    self.counters.supply = supply;
                }
            }
            StateEvent::TokenMinted {
                token_id,
                asset_url,
            } => return Some(Notification::Minted { token_id, asset_url }),
            StateEvent::Failed(message) => self.error = Some(message),
        }
        None
    }
}

#[cfg(test)]
#[path = "unit_tests/state_tests.rs"]
mod tests;
