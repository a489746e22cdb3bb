// Copyright (c) Zefchain Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use alloy_primitives::{Address, U256};
use assert_matches::assert_matches;

use super::*;
use crate::{
    state::MintPhase,
    test_utils::{make_controller, wait_until, FakeContract, FakeWallet},
    view::CallToAction,
};

fn account() -> Address {
    Address::repeat_byte(0xab)
}

fn wrong_network() -> Notification {
    Notification::WrongNetwork {
        network_name: "Rinkeby".to_string(),
    }
}

/// A wallet on the target network that already authorized `account()`.
fn connected_providers() -> (FakeWallet, FakeContract) {
    let wallet = FakeWallet::new("0x4");
    wallet.authorize(account());
    (wallet, FakeContract::new(3, 50))
}

#[test_log::test(tokio::test)]
async fn test_mount_without_provider() {
    let (controller, frontend) = make_controller(None);

    let outcome = controller.mount().await;

    assert_matches!(outcome.connection, Ok(ConnectionStatus::ProviderMissing));
    assert_matches!(outcome.network, Err(MintError::ProviderMissing));
    assert_matches!(outcome.listener, None);
    assert_eq!(controller.state(), MintState::default());
    assert!(frontend.notifications().is_empty());
    assert_eq!(frontend.render_count(), 0);
    assert!(!controller.is_listening());
}

#[test_log::test(tokio::test)]
async fn test_mount_with_authorized_account() {
    let (wallet, contract) = connected_providers();
    let (controller, frontend) = make_controller(Some((wallet, contract.clone())));

    let outcome = controller.mount().await;

    assert_matches!(outcome.connection, Ok(ConnectionStatus::Connected(a)) if a == account());
    assert_matches!(outcome.network, Ok(NetworkStatus::Correct));
    let state = controller.state();
    assert_eq!(state.account, Some(account()));
    assert_eq!(state.network, NetworkStatus::Correct);
    assert_eq!(
        state.counters,
        Counters {
            minted: Some(3),
            supply: Some(50)
        }
    );
    assert!(controller.is_listening());
    assert_eq!(contract.active_subscriptions(), 1);
    assert!(frontend.notifications().is_empty());

    let view = frontend.last_view().unwrap();
    assert_eq!(view, controller.view());
    assert_eq!(
        view.call_to_action,
        CallToAction::Mint {
            label: "Mint NFT".to_string(),
            enabled: true
        }
    );
    assert_eq!(view.counters.as_deref(), Some("3/50 NFTs minted so far"));
}

#[test_log::test(tokio::test)]
async fn test_mount_on_wrong_network() {
    let wallet = FakeWallet::new("0x1");
    wallet.authorize(account());
    let contract = FakeContract::new(3, 50);
    let (controller, frontend) = make_controller(Some((wallet, contract.clone())));

    let outcome = controller.mount().await;

    assert_matches!(
        outcome.network,
        Ok(NetworkStatus::Wrong { actual }) if actual == ChainId(1)
    );
    assert_matches!(outcome.listener, None);
    assert_eq!(frontend.notifications(), vec![wrong_network()]);
    assert!(!controller.is_listening());
    assert_eq!(contract.active_subscriptions(), 0);
    assert_eq!(controller.state().counters, Counters::default());

    let view = controller.view();
    assert_eq!(view.call_to_action, CallToAction::Hidden);
    assert!(view.wrong_network.is_some());
}

#[test_log::test(tokio::test)]
async fn test_invalid_chain_id() {
    let wallet = FakeWallet::new("rinkeby");
    let (controller, frontend) = make_controller(Some((wallet, FakeContract::new(0, 50))));

    assert_matches!(
        controller.check_correct_network().await,
        Err(MintError::InvalidChainId(chain_id)) if chain_id == "rinkeby"
    );
    assert_eq!(controller.state().network, NetworkStatus::Unknown);
    assert!(frontend.notifications().is_empty());
}

#[test_log::test(tokio::test)]
async fn test_connection_check_is_idempotent() {
    let (wallet, contract) = connected_providers();
    let (controller, _frontend) = make_controller(Some((wallet, contract.clone())));
    controller.mount().await;
    let state = controller.state();

    for _ in 0..2 {
        assert_matches!(
            controller.check_if_wallet_is_connected().await,
            Ok(ConnectionStatus::Connected(_))
        );
        assert_eq!(controller.state(), state);
    }
    wait_until(|| contract.active_subscriptions() == 1).await;
}

#[test_log::test(tokio::test)]
async fn test_connection_check_without_authorization() {
    let wallet = FakeWallet::new("0x4");
    let contract = FakeContract::new(0, 50);
    let (controller, _frontend) = make_controller(Some((wallet.clone(), contract)));

    assert_matches!(
        controller.check_if_wallet_is_connected().await,
        Ok(ConnectionStatus::NotAuthorized)
    );
    assert_eq!(controller.state().account, None);
    assert_eq!(wallet.request_count(), 0);
}

#[test_log::test(tokio::test)]
async fn test_connect_without_provider() {
    let (controller, frontend) = make_controller(None);

    assert_matches!(controller.connect_wallet().await, ConnectOutcome::ProviderMissing);
    assert_eq!(frontend.notifications(), vec![Notification::InstallWallet]);
    assert_eq!(controller.state(), MintState::default());
}

#[test_log::test(tokio::test)]
async fn test_connect_wallet() {
    let wallet = FakeWallet::new("0x4");
    wallet.grant(vec![account(), Address::repeat_byte(0xcd)]);
    let contract = FakeContract::new(7, 50);
    let (controller, frontend) = make_controller(Some((wallet.clone(), contract.clone())));

    let outcome = controller.mount().await;
    assert_matches!(outcome.connection, Ok(ConnectionStatus::NotAuthorized));
    assert_eq!(
        controller.view().call_to_action,
        CallToAction::Connect {
            label: "Connect to Wallet".to_string()
        }
    );

    assert_matches!(
        controller.connect_wallet().await,
        ConnectOutcome::Connected { account: a, network: NetworkStatus::Correct } if a == account()
    );
    assert_eq!(wallet.request_count(), 1);
    assert_eq!(controller.state().account, Some(account()));
    assert_eq!(controller.state().counters.minted, Some(7));
    assert!(controller.is_listening());
    assert!(frontend.notifications().is_empty());
}

#[test_log::test(tokio::test)]
async fn test_connect_rejected() {
    let wallet = FakeWallet::new("0x4");
    wallet.reject_requests();
    let (controller, frontend) = make_controller(Some((wallet, FakeContract::new(0, 50))));
    controller.mount().await;

    assert_matches!(
        controller.connect_wallet().await,
        ConnectOutcome::Rejected(MintError::Wallet(_))
    );
    let state = controller.state();
    assert_eq!(state.account, None);
    assert_eq!(
        state.error.as_deref(),
        Some("wallet request failed: User rejected the request.")
    );
    assert_eq!(frontend.last_view().unwrap().error, state.error);
    assert!(!controller.is_listening());
}

#[test_log::test(tokio::test)]
async fn test_connect_without_granted_account() {
    let wallet = FakeWallet::new("0x4");
    let (controller, _frontend) = make_controller(Some((wallet, FakeContract::new(0, 50))));

    assert_matches!(
        controller.connect_wallet().await,
        ConnectOutcome::Rejected(MintError::NoAccounts)
    );
}

#[test_log::test(tokio::test)]
async fn test_connect_on_wrong_network_warns() {
    let wallet = FakeWallet::new("0x1");
    wallet.grant(vec![account()]);
    let contract = FakeContract::new(0, 50);
    let (controller, frontend) = make_controller(Some((wallet, contract.clone())));

    assert_matches!(
        controller.connect_wallet().await,
        ConnectOutcome::Connected { network: NetworkStatus::Wrong { .. }, .. }
    );
    assert_eq!(frontend.notifications(), vec![wrong_network()]);
    assert_eq!(controller.state().account, Some(account()));
    assert!(!controller.is_listening());
    assert_eq!(contract.active_subscriptions(), 0);
}

#[test_log::test(tokio::test)]
async fn test_repeated_connections_keep_one_subscription() {
    let (wallet, contract) = connected_providers();
    let (controller, _frontend) = make_controller(Some((wallet, contract.clone())));
    controller.mount().await;

    for _ in 0..3 {
        assert_matches!(controller.connect_wallet().await, ConnectOutcome::Connected { .. });
    }

    wait_until(|| contract.active_subscriptions() == 1).await;
    assert!(controller.is_listening());
}

#[test_log::test(tokio::test)]
async fn test_mint() -> anyhow::Result<()> {
    let (wallet, contract) = connected_providers();
    let (controller, frontend) = make_controller(Some((wallet, contract.clone())));
    controller.mount().await;
    let release = contract.hold_confirmation();

    let mint = tokio::spawn({
        let controller = controller.clone();
        async move { controller.ask_contract_to_mint_nft().await }
    });
    wait_until(|| controller.state().is_mining()).await;
    assert_eq!(controller.state().transaction_url, None);
    assert_eq!(
        frontend.last_view().unwrap().call_to_action,
        CallToAction::Mint {
            label: "Minting NFT...".to_string(),
            enabled: false
        }
    );

    release.send(()).unwrap();
    let receipt = mint.await??;

    let hash = FakeContract::transaction_hash(0);
    assert_eq!(receipt.transaction.hash, hash);
    assert_eq!(
        receipt.transaction_url,
        format!("https://rinkeby.etherscan.io/tx/{hash}")
    );
    let state = controller.state();
    assert_eq!(state.phase, MintPhase::Idle);
    assert_eq!(state.transaction_url, Some(receipt.transaction_url));
    assert_eq!(contract.mints(), vec![account()]);
    Ok(())
}

#[test_log::test(tokio::test)]
async fn test_rejected_mint_returns_to_idle() {
    let (wallet, contract) = connected_providers();
    contract.fail_mints("User denied transaction signature.");
    let (controller, _frontend) = make_controller(Some((wallet, contract)));
    controller.mount().await;

    assert_matches!(
        controller.ask_contract_to_mint_nft().await,
        Err(MintError::Contract(_))
    );
    let state = controller.state();
    assert_eq!(state.phase, MintPhase::Idle);
    assert_eq!(state.transaction_url, None);
    assert!(state.error.is_some());
}

#[test_log::test(tokio::test)]
async fn test_failed_confirmation_returns_to_idle() {
    let (wallet, contract) = connected_providers();
    contract.fail_confirmations("transaction reverted");
    let (controller, frontend) = make_controller(Some((wallet, contract.clone())));
    controller.mount().await;

    assert_matches!(
        controller.ask_contract_to_mint_nft().await,
        Err(MintError::Contract(_))
    );
    assert_eq!(controller.state().phase, MintPhase::Idle);
    assert_eq!(controller.state().transaction_url, None);
    assert_eq!(contract.mints().len(), 1);
    assert_matches!(
        frontend.last_view().unwrap().call_to_action,
        CallToAction::Mint { enabled: true, .. }
    );
}

#[test_log::test(tokio::test)]
async fn test_concurrent_mint_is_rejected() -> anyhow::Result<()> {
    let (wallet, contract) = connected_providers();
    let (controller, _frontend) = make_controller(Some((wallet, contract.clone())));
    controller.mount().await;
    let release = contract.hold_confirmation();

    let first = tokio::spawn({
        let controller = controller.clone();
        async move { controller.ask_contract_to_mint_nft().await }
    });
    wait_until(|| controller.state().is_mining()).await;

    assert_matches!(
        controller.ask_contract_to_mint_nft().await,
        Err(MintError::MintInProgress)
    );
    assert!(controller.state().is_mining());

    drop(release);
    first.await??;
    assert_eq!(contract.mints().len(), 1);
    Ok(())
}

#[test_log::test(tokio::test(flavor = "multi_thread", worker_threads = 4))]
async fn test_simultaneous_mints_submit_one_transaction() -> anyhow::Result<()> {
    const ATTEMPTS: usize = 16;
    let (wallet, contract) = connected_providers();
    let (controller, _frontend) = make_controller(Some((wallet, contract.clone())));
    controller.mount().await;
    let release = contract.hold_confirmation();

    let attempts = (0..ATTEMPTS)
        .map(|_| {
            let controller = controller.clone();
            tokio::spawn(async move { controller.ask_contract_to_mint_nft().await })
        })
        .collect::<Vec<_>>();
    wait_until(|| {
        attempts.iter().filter(|attempt| attempt.is_finished()).count() == ATTEMPTS - 1
    })
    .await;
    assert_eq!(contract.mints().len(), 1);
    assert!(controller.state().is_mining());

    drop(release);
    let mut minted = 0;
    for attempt in attempts {
        match attempt.await? {
            Ok(_) => minted += 1,
            Err(error) => assert_matches!(error, MintError::MintInProgress),
        }
    }
    assert_eq!(minted, 1);
    assert_eq!(contract.mints().len(), 1);
    Ok(())
}

#[test_log::test(tokio::test)]
async fn test_mint_requires_connection() {
    let wallet = FakeWallet::new("0x4");
    let contract = FakeContract::new(0, 50);
    let (controller, _frontend) = make_controller(Some((wallet, contract.clone())));
    controller.mount().await;

    assert_matches!(
        controller.ask_contract_to_mint_nft().await,
        Err(MintError::NotConnected)
    );
    assert_eq!(controller.state().phase, MintPhase::Idle);
    assert!(contract.mints().is_empty());

    let (controller, _frontend) = make_controller(None);
    assert_matches!(
        controller.ask_contract_to_mint_nft().await,
        Err(MintError::ProviderMissing)
    );
}

#[test_log::test(tokio::test)]
async fn test_minted_event_notifies_once() {
    let (wallet, contract) = connected_providers();
    let (controller, frontend) = make_controller(Some((wallet, contract.clone())));
    controller.mount().await;

    contract.set_counters(Some(4), Some(50));
    contract.emit(MintedEvent {
        from: account(),
        token_id: U256::from(3),
    });

    wait_until(|| controller.state().counters.minted == Some(4)).await;
    let notifications = frontend.notifications();
    assert_eq!(notifications.len(), 1);
    let Notification::Minted {
        token_id,
        asset_url,
    } = &notifications[0]
    else {
        panic!("unexpected notification: {:?}", notifications[0]);
    };
    assert_eq!(*token_id, U256::from(3));
    assert_eq!(asset_url, &controller.config().asset_url(3));
    assert!(asset_url.contains(&controller.config().contract_address.to_string()));
    assert!(asset_url.ends_with("/3"));
}

#[test_log::test(tokio::test)]
async fn test_zero_counters_are_recorded() {
    let (wallet, _) = connected_providers();
    let (controller, _frontend) = make_controller(Some((wallet, FakeContract::new(0, 0))));
    controller.mount().await;

    assert_eq!(
        controller.state().counters,
        Counters {
            minted: Some(0),
            supply: Some(0)
        }
    );
    assert_eq!(
        controller.view().counters.as_deref(),
        Some("0/0 NFTs minted so far")
    );
}

#[test_log::test(tokio::test)]
async fn test_missing_counter_data() {
    let (wallet, contract) = connected_providers();
    contract.set_counters(None, Some(50));
    let (controller, _frontend) = make_controller(Some((wallet, contract)));
    controller.mount().await;

    assert_eq!(
        controller.state().counters,
        Counters {
            minted: None,
            supply: Some(50)
        }
    );
    assert_eq!(controller.view().counters, None);
}

#[test_log::test(tokio::test)]
async fn test_counter_read_failure_is_visible() {
    let (wallet, contract) = connected_providers();
    contract.fail_reads("execution reverted");
    let (controller, _frontend) = make_controller(Some((wallet, contract)));

    let outcome = controller.mount().await;

    assert!(controller.is_listening());
    assert_eq!(controller.state().counters, Counters::default());
    assert_eq!(
        controller.state().error.as_deref(),
        Some("contract call failed: execution reverted")
    );
    assert_matches!(outcome.connection, Ok(ConnectionStatus::Connected(_)));
}

#[test_log::test(tokio::test)]
async fn test_network_change() -> anyhow::Result<()> {
    let wallet = FakeWallet::new("0x1");
    wallet.authorize(account());
    let contract = FakeContract::new(1, 50);
    let (controller, frontend) = make_controller(Some((wallet, contract.clone())));
    controller.mount().await;
    assert!(!controller.is_listening());

    assert_eq!(
        controller.handle_chain_changed("0x4").await?,
        NetworkStatus::Correct
    );
    assert!(controller.is_listening());
    assert_eq!(controller.state().counters.supply, Some(50));

    assert_matches!(
        controller.handle_chain_changed("0x5").await?,
        NetworkStatus::Wrong { .. }
    );
    assert!(!controller.is_listening());
    wait_until(|| contract.active_subscriptions() == 0).await;
    assert_eq!(frontend.notifications(), vec![wrong_network(), wrong_network()]);
    Ok(())
}

#[test_log::test(tokio::test)]
async fn test_account_change() -> anyhow::Result<()> {
    let (wallet, contract) = connected_providers();
    let (controller, _frontend) = make_controller(Some((wallet, contract)));
    controller.mount().await;
    let other = Address::repeat_byte(0xcd);

    assert_eq!(
        controller.handle_accounts_changed(&[other]).await?,
        ConnectionStatus::Connected(other)
    );
    assert_eq!(controller.state().account, Some(other));

    assert_eq!(
        controller.handle_accounts_changed(&[]).await?,
        ConnectionStatus::NotAuthorized
    );
    assert_eq!(controller.state().account, Some(other));
    Ok(())
}

#[test_log::test(tokio::test)]
async fn test_subscription_is_released() {
    let (wallet, contract) = connected_providers();
    let (controller, _frontend) = make_controller(Some((wallet.clone(), contract.clone())));
    controller.mount().await;
    assert_eq!(contract.active_subscriptions(), 1);

    controller.shutdown();
    assert!(!controller.is_listening());
    wait_until(|| contract.active_subscriptions() == 0).await;

    let (controller, _frontend) = make_controller(Some((wallet, contract.clone())));
    controller.mount().await;
    assert_eq!(contract.active_subscriptions(), 1);
    drop(controller);
    wait_until(|| contract.active_subscriptions() == 0).await;
}
