// Copyright (c) Zefchain Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use alloy_primitives::{Address, U256};

use super::*;

fn chain_checked(actual: u64) -> StateEvent {
    StateEvent::ChainChecked {
        actual: ChainId(actual),
        expected: ChainId::RINKEBY,
        network_name: "Rinkeby".to_string(),
    }
}

#[test]
fn test_chain_check() {
    let mut state = MintState::default();
    assert_eq!(state.network, NetworkStatus::Unknown);

    assert_eq!(state.apply(chain_checked(4)), None);
    assert_eq!(state.network, NetworkStatus::Correct);

    let notification = state.apply(chain_checked(1));
    assert_eq!(
        notification,
        Some(Notification::WrongNetwork {
            network_name: "Rinkeby".to_string()
        })
    );
    assert_eq!(
        state.network,
        NetworkStatus::Wrong {
            actual: ChainId(1)
        }
    );
}

#[test]
fn test_mint_lifecycle() {
    let mut state = MintState {
        transaction_url: Some("https://rinkeby.etherscan.io/tx/0x01".to_string()),
        error: Some("previous failure".to_string()),
        ..MintState::default()
    };

    assert_eq!(state.apply(StateEvent::MintSubmitted), None);
    assert!(state.is_mining());
    assert_eq!(state.transaction_url, None);
    assert_eq!(state.error, None);

    state.apply(StateEvent::MintConfirmed {
        transaction_url: "https://rinkeby.etherscan.io/tx/0x02".to_string(),
    });
    assert_eq!(state.phase, MintPhase::Idle);
    assert_eq!(
        state.transaction_url.as_deref(),
        Some("https://rinkeby.etherscan.io/tx/0x02")
    );

    state.apply(StateEvent::MintSubmitted);
    state.apply(StateEvent::MiningAborted);
    assert_eq!(state.phase, MintPhase::Idle);
    assert_eq!(state.transaction_url, None);
}

#[test]
fn test_counters_keep_known_values() {
    let mut state = MintState::default();
    state.apply(StateEvent::CountersRead {
        minted: Some(0),
        supply: Some(50),
    });
    assert_eq!(
        state.counters,
        Counters {
            minted: Some(0),
            supply: Some(50)
        }
    );

    state.apply(StateEvent::CountersRead {
        minted: Some(1),
        supply: None,
    });
    assert_eq!(
        state.counters,
        Counters {
            minted: Some(1),
            supply: Some(50)
        }
    );
}

#[test]
fn test_minted_notification() {
    let mut state = MintState {
        account: Some(Address::repeat_byte(1)),
        ..MintState::default()
    };
    let before = state.clone();
    let notification = state.apply(StateEvent::TokenMinted {
        token_id: U256::from(12),
        asset_url: "https://testnets.opensea.io/assets/0xabc/12".to_string(),
    });
    assert_eq!(state, before);
    let notification = notification.unwrap();
    assert!(notification
        .to_string()
        .ends_with("Here's the link: https://testnets.opensea.io/assets/0xabc/12"));
}

#[test]
fn test_failures_are_visible_until_next_success() {
    let mut state = MintState::default();
    state.apply(StateEvent::Failed("User rejected the request.".to_string()));
    assert_eq!(state.error.as_deref(), Some("User rejected the request."));
    state.apply(StateEvent::AccountAuthorized(Address::repeat_byte(2)));
    assert_eq!(state.error, None);
}
