// Copyright (c) Zefchain Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use alloy_primitives::U256;

use crate::ChainId;

type BoxedError = Box<dyn std::error::Error + Send + Sync>;

/// Errors surfaced by the minting controller.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum MintError {
    #[error("no wallet provider is installed")]
    ProviderMissing,
    #[error("no wallet account is connected")]
    NotConnected,
    #[error("the wallet did not return any account")]
    NoAccounts,
    #[error("a mint transaction is already in progress")]
    MintInProgress,
    #[error("connected to chain {actual}, expected chain {expected}")]
    WrongNetwork { expected: ChainId, actual: ChainId },
    #[error("invalid chain id: {0:?}")]
    InvalidChainId(String),
    #[error("counter value {0} does not fit in 64 bits")]
    CounterOverflow(U256),
    #[error("wallet request failed: {0}")]
    Wallet(#[source] BoxedError),
    #[error("contract call failed: {0}")]
    Contract(#[source] BoxedError),
}

impl MintError {
    pub(crate) fn wallet(error: impl std::error::Error + Send + Sync + 'static) -> Self {
        MintError::Wallet(Box::new(error))
    }

    pub(crate) fn contract(error: impl std::error::Error + Send + Sync + 'static) -> Self {
        MintError::Contract(Box::new(error))
    }
}
