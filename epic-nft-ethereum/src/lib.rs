// Copyright (c) Zefchain Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

//! This module provides access to an EIP-1193 wallet and to the Epic NFT contract through
//! Ethereum JSON-RPC requests.

pub mod client;
pub mod common;
pub mod contract;
pub mod wallet;

/// Helper types for tests.
#[cfg(with_testing)]
pub mod test_utils;

pub use client::JsonRpcClient;
pub use common::EthereumServiceError;
pub use contract::EpicNftContract;
pub use wallet::Eip1193Wallet;
