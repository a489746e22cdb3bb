// Copyright (c) Zefchain Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
# `epic-nft-core`

This crate contains the platform-independent logic of the Epic NFT minting page: connecting
a browser wallet, verifying that it is on the expected network, and minting a token through
the deployed contract.

All state lives in a [`MintState`] updated by a pure transition function, so that the
controller can be exercised without a browser. The wallet, the contract and the page are
reached through the traits of the [`provider`] module.
*/

pub mod config;
pub mod controller;
mod error;
pub mod provider;
pub mod state;
pub mod task;
pub mod time;
pub mod view;

#[cfg(with_testing)]
#[path = "unit_tests/test_utils.rs"]
pub mod test_utils;

pub use config::{ChainId, MintConfig};
pub use controller::{
    ConnectOutcome, ConnectionStatus, ListenerStatus, MintController, MintReceipt, MountOutcome,
};
pub use error::MintError;
pub use provider::{ContractProxy, Frontend, WalletProvider};
pub use state::{Counters, MintPhase, MintState, NetworkStatus, Notification, StateEvent};
pub use view::View;
